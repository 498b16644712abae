//! Registration steps and the transitions allowed between them.

use serde::{Deserialize, Serialize};

/// The steps of the registration flow.
///
/// Input steps progress CollectingEmail → CollectingCode → CollectingProfile
/// → Success. AlreadyRegistered and InvalidLink are entered only when the
/// flow is opened and never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    CollectingEmail,
    CollectingCode,
    CollectingProfile,
    AlreadyRegistered,
    InvalidLink,
    Success,
}

impl Step {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: Step) -> bool {
        use Step::*;
        matches!(
            (self, target),
            (CollectingEmail, CollectingCode)
                | (CollectingCode, CollectingProfile)
                | (CollectingCode, CollectingEmail)
                | (CollectingProfile, Success)
        )
    }

    /// Whether this step is terminal (no transition leaves it).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::AlreadyRegistered | Self::InvalidLink | Self::Success
        )
    }

    /// Whether the back action is offered from this step.
    pub fn allows_back(&self) -> bool {
        matches!(self, Self::CollectingCode)
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::CollectingEmail => "collecting_email",
            Self::CollectingCode => "collecting_code",
            Self::CollectingProfile => "collecting_profile",
            Self::AlreadyRegistered => "already_registered",
            Self::InvalidLink => "invalid_link",
            Self::Success => "success",
        };
        write!(f, "{s}")
    }
}
