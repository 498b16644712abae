//! Form fields, entered values and per-field error messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::step::Step;
use super::variant::{FlowConfig, PhoneSource};

/// Every field the flow ever asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Email,
    Code,
    CompanyName,
    FirstName,
    LastName,
    Username,
    Phone,
}

impl Field {
    /// Parse a wire name as used by the registration service.
    pub fn from_wire(name: &str) -> Option<Field> {
        match name {
            "email" => Some(Self::Email),
            "code" => Some(Self::Code),
            "company_name" => Some(Self::CompanyName),
            "first_name" => Some(Self::FirstName),
            "last_name" => Some(Self::LastName),
            "username" => Some(Self::Username),
            "phone" => Some(Self::Phone),
            _ => None,
        }
    }

    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Code => "code",
            Self::CompanyName => "company_name",
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::Username => "username",
            Self::Phone => "phone",
        }
    }

    /// Label shown next to the input.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Email => "Email",
            Self::Code => "Код подтверждения",
            Self::CompanyName => "Компания",
            Self::FirstName => "Имя",
            Self::LastName => "Фамилия",
            Self::Username => "Логин",
            Self::Phone => "Телефон",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Fields collected on `step` under `config`, in display order.
///
/// Terminal steps collect nothing.
pub fn fields_for(step: Step, config: &FlowConfig) -> Vec<Field> {
    match step {
        Step::CollectingEmail => vec![Field::Email],
        Step::CollectingCode => vec![Field::Code],
        Step::CollectingProfile => {
            let mut fields = vec![Field::CompanyName];
            if !config.verify_email {
                fields.push(Field::Email);
            }
            fields.extend([Field::FirstName, Field::LastName, Field::Username]);
            if config.phone_source == PhoneSource::Form {
                fields.push(Field::Phone);
            }
            fields
        }
        Step::AlreadyRegistered | Step::InvalidLink | Step::Success => Vec::new(),
    }
}

/// Values typed by the user, keyed by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldValues(BTreeMap<Field, String>);

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.0.insert(field, value.into());
    }

    /// The raw value, or "" when the field was never touched.
    pub fn get(&self, field: Field) -> &str {
        self.0.get(&field).map(String::as_str).unwrap_or("")
    }

    /// The trimmed value, `None` when blank.
    pub fn filled(&self, field: Field) -> Option<&str> {
        let value = self.get(field).trim();
        (!value.is_empty()).then_some(value)
    }

    pub fn clear(&mut self, field: Field) {
        self.0.remove(&field);
    }
}

/// Per-field error messages for the active step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a service error map onto the fields of the active step.
    ///
    /// Keys that do not name one of `allowed` are dropped.
    pub fn from_server<'a, I>(errors: I, allowed: &[Field]) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut mapped = Self::new();
        for (key, message) in errors {
            match Field::from_wire(key).filter(|f| allowed.contains(f)) {
                Some(field) => mapped.insert(field, message),
                None => debug!(key, message, "Dropping service error for field outside the active step"),
            }
        }
        mapped
    }

    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}
