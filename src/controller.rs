//! Registration flow controller — runs a [`FlowState`] against the remote
//! registration service.
//!
//! The state lives behind a mutex that is only held for synchronous
//! transitions, never across a service call. The flow's `submitting` flag
//! keeps a second submission out while one is in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{info, warn};

use crate::api::{RegistrationApi, StatusRequest};
use crate::error::FlowError;
use crate::flow::{
    Command, Event, Field, FieldErrors, FieldValues, FlowConfig, FlowState, LinkParams, Reply,
    SessionContext, Step,
};
use crate::host::MiniAppHost;

/// A field the front-end should render for the active step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name: Field,
    pub label: &'static str,
}

/// Snapshot of a flow for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowView {
    pub step: Step,
    pub fields: Vec<FieldDescriptor>,
    pub values: FieldValues,
    pub errors: FieldErrors,
    pub consent: bool,
    pub consent_required: bool,
    pub submitting: bool,
    pub can_submit: bool,
    pub can_go_back: bool,
}

/// Drives one registration flow.
pub struct RegistrationController {
    state: Mutex<FlowState>,
    api: Arc<dyn RegistrationApi>,
    host: Option<Arc<dyn MiniAppHost>>,
    closed: AtomicBool,
}

fn lock(state: &Mutex<FlowState>) -> MutexGuard<'_, FlowState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the in-flight flag if a submission is dropped before its reply
/// is applied.
struct InFlight<'a> {
    state: &'a Mutex<FlowState>,
    armed: bool,
}

impl InFlight<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            lock(self.state).release_submission();
        }
    }
}

impl RegistrationController {
    /// Open a flow from the entry link.
    ///
    /// A link missing required identifiers yields an invalid-link flow with
    /// no service calls. Otherwise the status check runs (when the variant
    /// has one); a failed check is treated as a new user.
    pub async fn open(
        config: FlowConfig,
        params: &LinkParams,
        api: Arc<dyn RegistrationApi>,
        host: Option<Arc<dyn MiniAppHost>>,
    ) -> Self {
        let state = match SessionContext::from_link(params, &config) {
            None => {
                info!("Entry link is missing required identifiers");
                FlowState::invalid_link(config)
            }
            Some(session) if config.status_check => {
                let request = StatusRequest {
                    chat_id: session.chat_id().to_string(),
                    phone: session.phone().map(String::from),
                };
                match api.check_status(&request).await {
                    Ok(status) if !status.is_new() => {
                        info!(chat_id = %session.chat_id(), state = %status.state, "Chat already registered");
                        FlowState::already_registered(config, session)
                    }
                    Ok(_) => FlowState::start(config, session),
                    Err(e) => {
                        warn!(chat_id = %session.chat_id(), error = %e, "Status check failed, treating chat as new");
                        FlowState::start(config, session)
                    }
                }
            }
            Some(session) => FlowState::start(config, session),
        };

        Self {
            state: Mutex::new(state),
            api,
            host,
            closed: AtomicBool::new(false),
        }
    }

    pub fn step(&self) -> Step {
        lock(&self.state).step()
    }

    /// Current snapshot for rendering.
    pub fn view(&self) -> FlowView {
        let state = lock(&self.state);
        FlowView {
            step: state.step(),
            fields: state
                .active_fields()
                .into_iter()
                .map(|name| FieldDescriptor {
                    name,
                    label: name.label(),
                })
                .collect(),
            values: state.values().clone(),
            errors: state.errors().clone(),
            consent: state.consent(),
            consent_required: state.consent_required(),
            submitting: state.is_submitting(),
            can_submit: state.can_submit(),
            can_go_back: state.can_go_back(),
        }
    }

    fn apply(&self, event: Event) -> Result<FlowView, FlowError> {
        lock(&self.state).handle(event)?;
        Ok(self.view())
    }

    pub fn edit(&self, field: Field, value: impl Into<String>) -> Result<FlowView, FlowError> {
        self.apply(Event::Edit {
            field,
            value: value.into(),
        })
    }

    pub fn set_consent(&self, accepted: bool) -> Result<FlowView, FlowError> {
        self.apply(Event::SetConsent(accepted))
    }

    pub fn back(&self) -> Result<FlowView, FlowError> {
        self.apply(Event::Back)
    }

    /// Submit the active step.
    ///
    /// Local validation failures return `Ok` with errors in the view and
    /// make no call. While a submission is in flight this fails with
    /// [`FlowError::SubmissionInFlight`].
    pub async fn submit(&self) -> Result<FlowView, FlowError> {
        let command = lock(&self.state).handle(Event::Submit)?;
        let Some(command) = command else {
            return Ok(self.view());
        };

        let mut in_flight = InFlight {
            state: &self.state,
            armed: true,
        };

        let reply = match command {
            Command::SendCode(request) => Reply::CodeSent(self.api.send_code(&request).await),
            Command::CheckCode(request) => Reply::CodeChecked(self.api.check_code(&request).await),
            Command::Register(request) => Reply::Registered(self.api.register(&request).await),
            Command::CloseHost => {
                drop(in_flight);
                self.close_host();
                return Ok(self.view());
            }
        };

        let follow_up = {
            let mut state = lock(&self.state);
            in_flight.disarm();
            state.handle(Event::Reply(reply))?
        };

        if let Some(Command::CloseHost) = follow_up {
            self.close_host();
        }
        Ok(self.view())
    }

    fn close_host(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        match &self.host {
            Some(host) => {
                info!("Registration complete, closing mini-app");
                host.close();
            }
            None => info!("Registration complete"),
        }
    }
}
