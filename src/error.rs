//! Error types for signup-flow.

use crate::flow::{Field, Step};

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Failures talking to the remote registration service that carry no
/// field-error map.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Service responded with {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Could not decode service response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Events the flow refuses to apply in its current state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("Flow already finished in step {step}")]
    TerminalStep { step: Step },

    #[error("A submission is already in flight")]
    SubmissionInFlight,

    #[error("Cannot go back from step {step}")]
    BackNotAllowed { step: Step },

    #[error("Consent is required before submitting")]
    ConsentRequired,

    #[error("Field {field} is not part of step {step}")]
    UnknownField { field: Field, step: Step },

    #[error("Reply arrived with no submission in flight")]
    UnexpectedReply,
}
