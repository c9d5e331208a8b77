/// Request validation glue
///
/// Request DTOs derive `validator::Validate`; handlers call [`validate`]
/// and get per-field details back as a 400.

use std::borrow::Cow;

use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{ApiError, ValidationErrorDetail};

/// Flattens validator output into response details, sorted by field
pub fn validation_details(errors: &ValidationErrors) -> Vec<ValidationErrorDetail> {
    let mut details: Vec<ValidationErrorDetail> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| ValidationErrorDetail {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field)),
            })
        })
        .collect();

    details.sort_by(|a, b| a.field.cmp(&b.field));
    details
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::ValidationError(validation_details(&errors))
    }
}

pub fn validate<T: Validate>(req: &T) -> Result<(), ApiError> {
    req.validate().map_err(ApiError::from)
}

/// Phone numbers: optional leading `+`, then 7 to 15 digits with optional
/// spaces, dashes or parentheses
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let phone = phone.trim();
    let body = phone.strip_prefix('+').unwrap_or(phone);

    let digits = body.chars().filter(char::is_ascii_digit).count();
    let allowed = body
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')'));

    if allowed && (7..=15).contains(&digits) {
        Ok(())
    } else {
        let mut error = ValidationError::new("phone");
        error.message = Some(Cow::Borrowed("Invalid phone number"));
        Err(error)
    }
}

/// Lowercases and trims an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Sample {
        #[validate(email(message = "Invalid email format"))]
        email: String,

        #[validate(custom(function = "validate_phone"))]
        phone: String,
    }

    #[test]
    fn test_validate_collects_field_details() {
        let sample = Sample {
            email: "not-an-email".to_string(),
            phone: String::new(),
        };

        match validate(&sample) {
            Err(ApiError::ValidationError(details)) => {
                assert_eq!(details.len(), 2);
                assert_eq!(details[0].field, "email");
                assert_eq!(details[0].message, "Invalid email format");
                assert_eq!(details[1].field, "phone");
                assert_eq!(details[1].message, "Invalid phone number");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_request_passes() {
        let sample = Sample {
            email: "shopper@example.com".to_string(),
            phone: "08030000000".to_string(),
        };
        assert!(validate(&sample).is_ok());
    }

    #[test]
    fn test_phone_formats() {
        assert!(validate_phone("+2348030000000").is_ok());
        assert!(validate_phone("(555) 123-4567").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("call me").is_err());
        assert!(validate_phone("+1 234 567 890 123 456 7").is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Shopper@Example.COM "), "shopper@example.com");
    }
}
