//! Patient demographics captured at confirmation.
//!
//! [`PatientForm`] holds what was typed; [`PatientInfo`] is what a bill is allowed to contain.
//! The only way from one to the other is [`PatientForm::validate`], which reports every failing
//! field at once rather than stopping at the first.

use crate::error::FieldError;
use bloodtest_types::{EmailAddress, NonEmptyText, TextError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Validated patient details as stored on a bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInfo {
    pub name: NonEmptyText,
    pub email: EmailAddress,
    pub phone: NonEmptyText,
    pub date_of_birth: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<NonEmptyText>,
}

/// Raw patient form input. Every field except `address` is required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    /// `YYYY-MM-DD`
    pub date_of_birth: String,
    pub address: String,
}

fn required(
    field: &'static str,
    value: &str,
    errors: &mut Vec<FieldError>,
) -> Option<NonEmptyText> {
    match NonEmptyText::new(value) {
        Ok(text) => Some(text),
        Err(_) => {
            errors.push(FieldError {
                field,
                message: "this field is required".into(),
            });
            None
        }
    }
}

/// Parses a `YYYY-MM-DD` form value, recording a field error on failure.
pub(crate) fn parse_form_date(
    field: &'static str,
    value: &str,
    errors: &mut Vec<FieldError>,
) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        errors.push(FieldError {
            field,
            message: "this field is required".into(),
        });
        return None;
    }
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.push(FieldError {
                field,
                message: format!("'{value}' is not a date (expected YYYY-MM-DD)"),
            });
            None
        }
    }
}

impl PatientForm {
    /// Validates the form against `today`.
    ///
    /// A date of birth after `today` is rejected.
    ///
    /// # Errors
    ///
    /// Returns every failing field, in form order.
    pub fn validate(&self, today: NaiveDate) -> Result<PatientInfo, Vec<FieldError>> {
        let mut errors = Vec::new();

        let name = required("name", &self.name, &mut errors);

        let email = match EmailAddress::parse(&self.email) {
            Ok(email) => Some(email),
            Err(TextError::Empty) => {
                errors.push(FieldError {
                    field: "email",
                    message: "this field is required".into(),
                });
                None
            }
            Err(e) => {
                errors.push(FieldError {
                    field: "email",
                    message: e.to_string(),
                });
                None
            }
        };

        let phone = required("phone", &self.phone, &mut errors);

        let date_of_birth = parse_form_date("dateOfBirth", &self.date_of_birth, &mut errors)
            .and_then(|dob| {
                if dob > today {
                    errors.push(FieldError {
                        field: "dateOfBirth",
                        message: "date of birth cannot be in the future".into(),
                    });
                    None
                } else {
                    Some(dob)
                }
            });

        let address = NonEmptyText::new(&self.address).ok();

        match (name, email, phone, date_of_birth) {
            (Some(name), Some(email), Some(phone), Some(date_of_birth)) if errors.is_empty() => {
                Ok(PatientInfo {
                    name,
                    email,
                    phone,
                    date_of_birth,
                    address,
                })
            }
            _ => Err(errors),
        }
    }
}
