//! Flow state machine — the single place where registration steps change.
//!
//! The controller turns user actions into [`Event`]s, feeds them to
//! [`FlowState::handle`], runs whatever [`Command`] comes back against the
//! registration service, and feeds the outcome back in as [`Event::Reply`].

use tracing::{debug, info, warn};

use super::field::{Field, FieldErrors, FieldValues, fields_for};
use super::session::SessionContext;
use super::step::Step;
use super::validation::validate;
use super::variant::{FlowConfig, PhoneSource};
use crate::api::{ApiReply, CheckCodeRequest, RegistrationRequest, SendCodeRequest};
use crate::error::{ApiError, FlowError};

/// Email verification carried from the email step into later calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub email: String,
    pub request_id: Option<String>,
}

/// Outcome of the remote call issued for the active step.
#[derive(Debug)]
pub enum Reply {
    CodeSent(Result<ApiReply<Option<String>>, ApiError>),
    CodeChecked(Result<ApiReply<()>, ApiError>),
    Registered(Result<ApiReply<()>, ApiError>),
}

impl Reply {
    /// The step whose submission this reply answers.
    fn answers(&self) -> Step {
        match self {
            Self::CodeSent(_) => Step::CollectingEmail,
            Self::CodeChecked(_) => Step::CollectingCode,
            Self::Registered(_) => Step::CollectingProfile,
        }
    }
}

/// Everything that can happen to a flow.
#[derive(Debug)]
pub enum Event {
    Edit { field: Field, value: String },
    SetConsent(bool),
    Submit,
    Back,
    Reply(Reply),
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SendCode(SendCodeRequest),
    CheckCode(CheckCodeRequest),
    Register(RegistrationRequest),
    /// Registration finished; ask the host to close the mini-app.
    CloseHost,
}

/// State of one registration flow.
#[derive(Debug, Clone)]
pub struct FlowState {
    config: FlowConfig,
    session: Option<SessionContext>,
    step: Step,
    verification: Option<Verification>,
    values: FieldValues,
    errors: FieldErrors,
    consent: bool,
    submitting: bool,
}

impl FlowState {
    fn with_step(config: FlowConfig, session: Option<SessionContext>, step: Step) -> Self {
        Self {
            config,
            session,
            step,
            verification: None,
            values: FieldValues::new(),
            errors: FieldErrors::new(),
            consent: false,
            submitting: false,
        }
    }

    /// A flow opened from a link that lacks required identifiers.
    pub fn invalid_link(config: FlowConfig) -> Self {
        Self::with_step(config, None, Step::InvalidLink)
    }

    /// A flow whose chat the service already knows.
    pub fn already_registered(config: FlowConfig, session: SessionContext) -> Self {
        Self::with_step(config, Some(session), Step::AlreadyRegistered)
    }

    /// A flow at the first input step of its variant.
    pub fn start(config: FlowConfig, session: SessionContext) -> Self {
        let first = if config.verify_email {
            Step::CollectingEmail
        } else {
            Step::CollectingProfile
        };
        Self::with_step(config, Some(session), first)
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&SessionContext> {
        self.session.as_ref()
    }

    pub fn verification(&self) -> Option<&Verification> {
        self.verification.as_ref()
    }

    pub fn values(&self) -> &FieldValues {
        &self.values
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn consent(&self) -> bool {
        self.consent
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Fields the active step collects.
    pub fn active_fields(&self) -> Vec<Field> {
        fields_for(self.step, &self.config)
    }

    /// Whether the active step is gated on the consent flag.
    pub fn consent_required(&self) -> bool {
        self.step == Step::CollectingProfile && self.config.consent_required
    }

    /// Whether the submit control should be enabled right now.
    pub fn can_submit(&self) -> bool {
        !self.submitting
            && !self.step.is_terminal()
            && (!self.consent_required() || self.consent)
            && validate(&self.active_fields(), &self.values).is_empty()
    }

    pub fn can_go_back(&self) -> bool {
        !self.submitting && self.step.allows_back()
    }

    /// Clear the in-flight flag without a reply; used when a submission is
    /// abandoned before its reply could be applied.
    pub fn release_submission(&mut self) {
        if self.submitting {
            debug!(step = %self.step, "Releasing abandoned submission");
            self.submitting = false;
        }
    }

    /// Apply `event`, returning the command to run, if any.
    pub fn handle(&mut self, event: Event) -> Result<Option<Command>, FlowError> {
        match event {
            Event::Reply(reply) => self.apply_reply(reply),
            Event::Edit { field, value } => {
                self.ensure_accepting_input()?;
                if !self.active_fields().contains(&field) {
                    return Err(FlowError::UnknownField {
                        field,
                        step: self.step,
                    });
                }
                self.values.set(field, value);
                Ok(None)
            }
            Event::SetConsent(accepted) => {
                self.ensure_accepting_input()?;
                self.consent = accepted;
                Ok(None)
            }
            Event::Back => {
                self.ensure_accepting_input()?;
                if !self.step.allows_back() {
                    return Err(FlowError::BackNotAllowed { step: self.step });
                }
                self.verification = None;
                self.values.clear(Field::Code);
                self.transition(Step::CollectingEmail);
                Ok(None)
            }
            Event::Submit => self.submit(),
        }
    }

    /// User actions are refused on terminal steps and while a submission is
    /// in flight.
    fn ensure_accepting_input(&self) -> Result<(), FlowError> {
        if self.step.is_terminal() {
            return Err(FlowError::TerminalStep { step: self.step });
        }
        if self.submitting {
            return Err(FlowError::SubmissionInFlight);
        }
        Ok(())
    }

    fn submit(&mut self) -> Result<Option<Command>, FlowError> {
        self.ensure_accepting_input()?;
        if self.consent_required() && !self.consent {
            return Err(FlowError::ConsentRequired);
        }

        self.errors.clear();
        let errors = validate(&self.active_fields(), &self.values);
        if !errors.is_empty() {
            debug!(step = %self.step, invalid = errors.len(), "Submission blocked by validation");
            self.errors = errors;
            return Ok(None);
        }

        let command = self.command_for_step();
        self.submitting = true;
        info!(step = %self.step, "Submitting step");
        Ok(Some(command))
    }

    fn value(&self, field: Field) -> String {
        self.values.filled(field).unwrap_or_default().to_string()
    }

    fn command_for_step(&self) -> Command {
        let request_id = self
            .verification
            .as_ref()
            .and_then(|v| v.request_id.clone());

        match self.step {
            Step::CollectingEmail => Command::SendCode(SendCodeRequest {
                email: self.value(Field::Email),
            }),
            Step::CollectingCode => Command::CheckCode(CheckCodeRequest {
                request_id,
                code: self.value(Field::Code),
            }),
            _ => {
                let email = match (&self.verification, self.config.verify_email) {
                    (Some(v), true) => v.email.clone(),
                    _ => self.value(Field::Email),
                };
                let phone = match self.config.phone_source {
                    PhoneSource::Form => Some(self.value(Field::Phone)),
                    PhoneSource::QueryRequired | PhoneSource::QueryOptional => self
                        .session
                        .as_ref()
                        .and_then(|s| s.phone())
                        .map(String::from),
                };
                Command::Register(RegistrationRequest {
                    company_name: self.value(Field::CompanyName),
                    first_name: self.value(Field::FirstName),
                    last_name: self.value(Field::LastName),
                    username: self.value(Field::Username),
                    email,
                    chat_id: self
                        .session
                        .as_ref()
                        .map(|s| s.chat_id().to_string())
                        .unwrap_or_default(),
                    phone,
                    request_id,
                })
            }
        }
    }

    fn apply_reply(&mut self, reply: Reply) -> Result<Option<Command>, FlowError> {
        if !self.submitting || reply.answers() != self.step {
            return Err(FlowError::UnexpectedReply);
        }
        self.submitting = false;

        match reply {
            Reply::CodeSent(result) => {
                if let Some(request_id) = self.accepted(result) {
                    self.verification = Some(Verification {
                        email: self.value(Field::Email),
                        request_id,
                    });
                    self.values.clear(Field::Code);
                    self.transition(Step::CollectingCode);
                }
                Ok(None)
            }
            Reply::CodeChecked(result) => {
                if self.accepted(result).is_some() {
                    self.transition(Step::CollectingProfile);
                }
                Ok(None)
            }
            Reply::Registered(result) => {
                if self.accepted(result).is_some() {
                    self.transition(Step::Success);
                    return Ok(Some(Command::CloseHost));
                }
                Ok(None)
            }
        }
    }

    /// Unwrap an accepted reply; otherwise record field errors (or just log
    /// when the failure carries none) and return `None`.
    fn accepted<T>(&mut self, result: Result<ApiReply<T>, ApiError>) -> Option<T> {
        match result {
            Ok(ApiReply::Accepted(value)) => Some(value),
            Ok(ApiReply::Rejected(errors)) => {
                self.errors = FieldErrors::from_server(errors.iter(), &self.active_fields());
                info!(step = %self.step, fields = self.errors.len(), "Service rejected submission");
                None
            }
            Err(e) => {
                // No user-visible message for transport failures.
                warn!(step = %self.step, error = %e, "Submission failed");
                None
            }
        }
    }

    fn transition(&mut self, to: Step) {
        debug_assert!(
            self.step.can_transition_to(to),
            "invalid transition {} -> {}",
            self.step,
            to
        );
        info!(from = %self.step, to = %to, "Registration step changed");
        self.step = to;
        self.errors.clear();
    }
}
