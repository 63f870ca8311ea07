//! Field rules shared by the request payloads.

pub mod sort;

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::auth::roles;
use crate::types::{DeviceType, NamedEnum, RateType, SortDirection};

pub use sort::{Sortable, SortFields, SortOrder};

static PHONE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(0[1-9][0-9]{8}|(\+84[1-9][0-9]{8}))$").expect("valid phone pattern"));

fn error(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Owned(message));
    err
}

/// Local ten-digit numbers or the +84 international form
pub fn validate_phone_number(value: &str) -> Result<(), ValidationError> {
    if PHONE_NUMBER.is_match(value) {
        Ok(())
    } else {
        Err(error("phone_number", format!("Invalid phone number: '{}'", value)))
    }
}

pub fn validate_roles(value: &HashSet<String>) -> Result<(), ValidationError> {
    let has_allowed = value.iter().any(|r| roles::ALL.contains(&r.as_str()));
    let has_invalid = value.iter().any(|r| !roles::ALL.contains(&r.as_str()));

    if has_allowed && !has_invalid {
        Ok(())
    } else {
        Err(error(
            "roles",
            format!("Invalid value(s) provided. Accepted roles are: {}", roles::ALL.join(", ")),
        ))
    }
}

fn value_of_enum<E: NamedEnum>(value: &str) -> Result<(), ValidationError> {
    match E::from_name(value) {
        Some(_) => Ok(()),
        None => Err(error(
            "value_of_enum",
            format!(
                "Invalid value: '{}'. Accepted values for {} are: {}",
                value,
                E::TYPE_NAME,
                E::names().join(", ")
            ),
        )),
    }
}

pub fn validate_device_type(value: &str) -> Result<(), ValidationError> {
    value_of_enum::<DeviceType>(value)
}

pub fn validate_rate_type(value: &str) -> Result<(), ValidationError> {
    value_of_enum::<RateType>(value)
}

pub fn validate_sort_direction(value: &str) -> Result<(), ValidationError> {
    value_of_enum::<SortDirection>(value)
}

/// Flatten validator output into `camelCaseField -> message`, one message per
/// field.
pub fn field_errors(errors: &ValidationErrors) -> HashMap<String, String> {
    let mut out = HashMap::new();
    collect(errors, "", &mut out);
    out
}

fn collect(errors: &ValidationErrors, prefix: &str, out: &mut HashMap<String, String>) {
    for (field, kind) in errors.errors() {
        let name = if prefix.is_empty() {
            to_camel_case(field)
        } else {
            format!("{}.{}", prefix, to_camel_case(field))
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                if let Some(first) = errs.first() {
                    let message = first
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({})", first.code));
                    out.insert(name, message);
                }
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, &name, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(inner, &format!("{}[{}]", name, index), out);
                }
            }
        }
    }
}

pub fn to_camel_case(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper = false;
    for c in snake.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_local_and_international_phone_numbers() {
        assert!(validate_phone_number("0912345678").is_ok());
        assert!(validate_phone_number("+84912345678").is_ok());
        assert!(validate_phone_number("123456789").is_err());
        assert!(validate_phone_number("0012345678").is_err());
        assert!(validate_phone_number("+8401234567").is_err());
    }

    #[test]
    fn phone_numbers_accept_ascii_digits_only() {
        assert!(validate_phone_number("09\u{0661}\u{0662}\u{0663}\u{0664}\u{0665}\u{0666}\u{0667}\u{0668}").is_err());
        assert!(validate_phone_number("+849\u{FF11}2345678").is_err());
    }

    #[test]
    fn roles_must_be_known_and_non_empty() {
        let set = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<HashSet<_>>();
        assert!(validate_roles(&set(&["ROLE_USER"])).is_ok());
        assert!(validate_roles(&set(&["ROLE_USER", "ROLE_ADMIN"])).is_ok());
        assert!(validate_roles(&set(&[])).is_err());
        assert!(validate_roles(&set(&["ROLE_USER", "ROLE_ROOT"])).is_err());
    }

    #[test]
    fn enum_values_report_accepted_names() {
        let err = validate_rate_type("SHINY").unwrap_err();
        assert_eq!(
            err.message.unwrap(),
            "Invalid value: 'SHINY'. Accepted values for RateType are: NEW, LIKENEW, USED, BROKEN"
        );
        assert!(validate_sort_direction("DESC").is_ok());
    }

    #[test]
    fn camel_cases_field_names() {
        assert_eq!(to_camel_case("user_name"), "userName");
        assert_eq!(to_camel_case("devices_id"), "devicesId");
        assert_eq!(to_camel_case("id"), "id");
    }
}
