//! Client-side validation run before any submission reaches the network.

use std::sync::LazyLock;

use regex::Regex;

use super::field::{Field, FieldErrors, FieldValues};

/// Message for a blank required field.
pub const REQUIRED: &str = "Обязательное поле";
/// Message for a malformed email or phone.
pub const INVALID_FORMAT: &str = "Неверный формат";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$")
        .expect("email pattern is valid")
});

// Digits with the usual mask punctuation, e.g. +7 (701) 123-45-67.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9][0-9 ()\-]*$").expect("phone pattern is valid"));

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// 10 to 15 digits once mask punctuation is stripped.
pub fn is_valid_phone(value: &str) -> bool {
    if !PHONE_RE.is_match(value) {
        return false;
    }
    let digits = value.chars().filter(char::is_ascii_digit).count();
    (10..=15).contains(&digits)
}

/// Validate `fields` of `values`; the result is empty when all pass.
pub fn validate(fields: &[Field], values: &FieldValues) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for &field in fields {
        let Some(value) = values.filled(field) else {
            errors.insert(field, REQUIRED);
            continue;
        };
        let well_formed = match field {
            Field::Email => is_valid_email(value),
            Field::Phone => is_valid_phone(value),
            _ => true,
        };
        if !well_formed {
            errors.insert(field, INVALID_FORMAT);
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_emails() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.kz"));
    }

    #[test]
    fn accepts_dotless_domains() {
        assert!(is_valid_email("user@localhost"));
        assert!(is_valid_email("user@example"));
        assert!(!is_valid_email("user@-example"));
    }

    #[test]
    fn rejects_malformed_emails() {
        assert!(!is_valid_email("user"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("us er@example.com"));
    }

    #[test]
    fn phone_shapes() {
        assert!(is_valid_phone("+7 (701) 123-45-67"));
        assert!(is_valid_phone("87011234567"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("+7 701 abc 45 67"));
        assert!(!is_valid_phone("1234567890123456"));
    }

    #[test]
    fn blank_fields_are_required() {
        let mut values = FieldValues::new();
        values.set(Field::CompanyName, "  ");
        let errors = validate(&[Field::CompanyName, Field::Username], &values);
        assert_eq!(errors.get(Field::CompanyName), Some(REQUIRED));
        assert_eq!(errors.get(Field::Username), Some(REQUIRED));
    }

    #[test]
    fn malformed_email_reports_format() {
        let mut values = FieldValues::new();
        values.set(Field::Email, "not-an-email");
        let errors = validate(&[Field::Email], &values);
        assert_eq!(errors.get(Field::Email), Some(INVALID_FORMAT));
    }

    #[test]
    fn valid_values_pass() {
        let mut values = FieldValues::new();
        values.set(Field::Email, "a@b.kz");
        values.set(Field::Code, "1234");
        assert!(validate(&[Field::Email, Field::Code], &values).is_empty());
    }
}
