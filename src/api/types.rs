//! Wire types for the remote registration service.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Body of the status-check call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusRequest {
    pub chat_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Registration state reported by the status check.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegistrationStatus {
    #[serde(default)]
    pub state: String,
}

impl RegistrationStatus {
    pub const NEW: &'static str = "new";

    pub fn new_user() -> Self {
        Self {
            state: Self::NEW.to_string(),
        }
    }

    /// Whether the chat has not been registered yet.
    pub fn is_new(&self) -> bool {
        self.state == Self::NEW
    }
}

/// Body of the code-send call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendCodeRequest {
    pub email: String,
}

/// Body of the code-check call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckCodeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub code: String,
}

/// Body of the final registration call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationRequest {
    pub company_name: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub chat_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// What the service said about a submission it understood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiReply<T> {
    /// Truthy `status`.
    Accepted(T),
    /// Falsy `status`, or an error response carrying a field map.
    Rejected(ServerErrors),
}

/// Field-keyed error messages as sent by the service.
///
/// Values may be a single message or a list of messages; only the first is
/// kept. A key whose value carries no text (null, an object, an empty list)
/// still marks its field, with an empty message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerErrors(BTreeMap<String, String>);

impl ServerErrors {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ServerErrors {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<'de> Deserialize<'de> for ServerErrors {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Message {
            One(String),
            Many(Vec<String>),
            Other(Value),
        }

        // Anything but an object (null, an empty PHP-style array) is no errors.
        let raw = Value::deserialize(deserializer)?;
        let Value::Object(map) = raw else {
            return Ok(Self::default());
        };

        let mut errors = BTreeMap::new();
        for (key, value) in map {
            let message = match serde_json::from_value::<Message>(value) {
                Ok(Message::One(s)) => Some(s),
                Ok(Message::Many(list)) => Some(list.into_iter().next().unwrap_or_default()),
                Ok(Message::Other(_)) => Some(String::new()),
                Err(_) => None,
            };
            if let Some(message) = message {
                errors.insert(key, message);
            }
        }
        Ok(Self(errors))
    }
}

/// The `{status, data, errors}` envelope shared by the service's endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub status: Value,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub errors: ServerErrors,
}

impl Envelope {
    /// Accepted when `status` is truthy, otherwise rejected with `errors`.
    pub fn into_reply<T>(self, accept: impl FnOnce(Value) -> T) -> ApiReply<T> {
        if is_truthy(&self.status) {
            ApiReply::Accepted(accept(self.data))
        } else {
            ApiReply::Rejected(self.errors)
        }
    }
}

/// Truthiness as the service's browser clients judge it.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Pull `request_id` out of a code-send `data` payload.
pub fn request_id_from(data: &Value) -> Option<String> {
    match data.get("request_id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
