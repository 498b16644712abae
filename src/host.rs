//! Capabilities offered by the mini-app host.

use std::sync::atomic::{AtomicBool, Ordering};

/// The hosting mini-app shell.
pub trait MiniAppHost: Send + Sync {
    /// Close the mini-app. Called once, when registration succeeds.
    fn close(&self);
}

/// Host whose "close" is carried back to the front-end in the flow view;
/// the page closes the mini-app itself when it sees the flag.
#[derive(Debug, Default)]
pub struct CloseSignal {
    requested: AtomicBool,
}

impl CloseSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}

impl MiniAppHost for CloseSignal {
    fn close(&self) {
        self.requested.store(true, Ordering::Release);
    }
}
