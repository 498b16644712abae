//! Flow variants — one configuration covering every revision of the form.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Where the phone number comes from, if anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhoneSource {
    /// Taken from the `phone` query parameter; the link is invalid without it.
    QueryRequired,
    /// Taken from the `phone` query parameter when present.
    QueryOptional,
    /// Entered on the profile form and shape-checked.
    Form,
}

/// Step configuration for one flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Ask the service whether the chat is already registered before
    /// showing any input step.
    pub status_check: bool,
    /// Collect and verify the email (email → code) before the profile form.
    /// When off, email is a field of the profile form.
    pub verify_email: bool,
    /// Require the consent flag before the profile form can be submitted.
    pub consent_required: bool,
    pub phone_source: PhoneSource,
}

impl FlowConfig {
    /// The single-form revision: every profile field typed by the user,
    /// phone included. The chat id still comes from the link.
    pub fn classic() -> Self {
        Self {
            status_check: false,
            verify_email: false,
            consent_required: false,
            phone_source: PhoneSource::Form,
        }
    }

    /// Single form, phone supplied by the bot link.
    pub fn linked() -> Self {
        Self {
            status_check: false,
            verify_email: false,
            consent_required: false,
            phone_source: PhoneSource::QueryRequired,
        }
    }

    /// Status check, email verification and consent.
    pub fn verified() -> Self {
        Self {
            status_check: true,
            verify_email: true,
            consent_required: true,
            phone_source: PhoneSource::QueryOptional,
        }
    }

    /// Whether the link must carry a phone number.
    pub fn requires_query_phone(&self) -> bool {
        self.phone_source == PhoneSource::QueryRequired
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self::verified()
    }
}

impl std::str::FromStr for FlowConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" => Ok(Self::classic()),
            "linked" => Ok(Self::linked()),
            "verified" => Ok(Self::verified()),
            other => Err(ConfigError::InvalidValue {
                key: "SIGNUP_VARIANT".into(),
                message: format!("unknown variant '{other}' (expected classic, linked or verified)"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_presets() {
        assert_eq!("classic".parse::<FlowConfig>().unwrap(), FlowConfig::classic());
        assert_eq!(" Linked ".parse::<FlowConfig>().unwrap(), FlowConfig::linked());
        assert_eq!("VERIFIED".parse::<FlowConfig>().unwrap(), FlowConfig::verified());
    }

    #[test]
    fn parse_unknown_variant_fails() {
        let err = "wizard".parse::<FlowConfig>().unwrap_err();
        assert!(err.to_string().contains("wizard"));
    }

    #[test]
    fn default_is_verified() {
        let config = FlowConfig::default();
        assert!(config.status_check);
        assert!(config.verify_email);
        assert!(config.consent_required);
        assert!(!config.requires_query_phone());
    }

    #[test]
    fn linked_requires_phone() {
        assert!(FlowConfig::linked().requires_query_phone());
        assert!(!FlowConfig::classic().requires_query_phone());
    }
}
