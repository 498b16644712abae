//! Session context — identifiers carried by the entry link.

use serde::{Deserialize, Serialize};

use super::variant::FlowConfig;

/// Raw query parameters of the entry link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LinkParams {
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Identifiers scoping one registration attempt. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionContext {
    chat_id: String,
    phone: Option<String>,
}

impl SessionContext {
    /// Build the context, or `None` when an identifier the variant needs is
    /// missing. Empty and whitespace-only values count as missing.
    pub fn from_link(params: &LinkParams, config: &FlowConfig) -> Option<Self> {
        let non_empty = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };

        let chat_id = non_empty(&params.chat_id)?;
        let phone = non_empty(&params.phone);
        if config.requires_query_phone() && phone.is_none() {
            return None;
        }

        Some(Self { chat_id, phone })
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }
}
