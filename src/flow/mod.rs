//! Registration flow — steps, fields, validation and the state machine that
//! ties them together.
//!
//! A flow starts from the identifiers in the entry link, optionally verifies
//! the user's email with a one-time code, and ends with a profile
//! submission. Every revision of the form is one [`FlowConfig`].

pub mod field;
pub mod session;
pub mod state;
pub mod step;
pub mod validation;
pub mod variant;

pub use field::{Field, FieldErrors, FieldValues, fields_for};
pub use session::{LinkParams, SessionContext};
pub use state::{Command, Event, FlowState, Reply, Verification};
pub use step::Step;
pub use variant::{FlowConfig, PhoneSource};
