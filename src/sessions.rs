//! Session registry — in-memory map of open registration flows with idle
//! expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::controller::RegistrationController;
use crate::host::CloseSignal;

/// How often the idle sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// A flow plus the close signal its host reports through.
#[derive(Clone)]
pub struct SessionHandle {
    pub controller: Arc<RegistrationController>,
    pub close_signal: Arc<CloseSignal>,
}

struct Entry {
    handle: SessionHandle,
    last_seen: DateTime<Utc>,
}

/// Open flows keyed by session id.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Entry>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        })
    }

    /// Register a session and return its new id.
    pub async fn insert(&self, handle: SessionHandle) -> Uuid {
        let id = Uuid::new_v4();
        let step = handle.controller.step();
        self.sessions.write().await.insert(
            id,
            Entry {
                handle,
                last_seen: Utc::now(),
            },
        );
        info!(session_id = %id, step = %step, "Registration session opened");
        id
    }

    /// Look up a session, refreshing its idle timer.
    pub async fn get(&self, id: Uuid) -> Option<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&id)?;
        entry.last_seen = Utc::now();
        Some(entry.handle.clone())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drop sessions idle for longer than the timeout. Returns how many were
    /// removed.
    pub async fn expire_idle(&self) -> usize {
        self.expire_idle_at(Utc::now()).await
    }

    async fn expire_idle_at(&self, now: DateTime<Utc>) -> usize {
        let idle = self.idle_timeout;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, entry| {
            // Clock skew (last_seen in the future) keeps the session.
            let keep = (now - entry.last_seen)
                .to_std()
                .map_or(true, |age| age <= idle);
            if !keep {
                debug!(session_id = %id, "Expiring idle registration session");
            }
            keep
        });
        let removed = before - sessions.len();
        if removed > 0 {
            info!(removed, remaining = sessions.len(), "Expired idle registration sessions");
        }
        removed
    }
}

/// Spawn a background task that periodically drops idle sessions.
pub fn spawn_expiry_task(store: Arc<SessionStore>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            store.expire_idle().await;
        }
    })
}
