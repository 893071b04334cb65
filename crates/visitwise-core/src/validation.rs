//! Input validation
//!
//! Validators accumulate every problem they find so a form can show each
//! message next to its field. The integrity zomes call the same field
//! validators, so a record that passes here passes on the DHT.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::calendar::parse_date;
use crate::error::VisitwiseError;
use crate::model::{Amount, MediaItem, Patient, Payment, ReminderPreferences, Visit};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_NOTES_LEN: usize = 2000;
pub const MAX_AGE: u32 = 150;
/// Upper bound for any single charge or payment
pub const MAX_AMOUNT: Amount = 10_000_000;
/// 100 MiB
pub const MAX_MEDIA_BYTES: u64 = 100 * 1024 * 1024;

/// Validation error with detailed context
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub code: ValidationErrorCode,
}

/// Specific validation error codes for programmatic handling
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ValidationErrorCode {
    Required,
    InvalidFormat,
    OutOfRange,
    TooLong,
    TooShort,
    InvalidCharacters,
    DuplicateValue,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result that can accumulate multiple errors
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn add_error(&mut self, field: &str, message: &str, code: ValidationErrorCode) {
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.to_string(),
            code,
        });
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
    }

    /// First message for a field, for inline display
    pub fn error_for(&self, field: &str) -> Option<&ValidationError> {
        self.errors.iter().find(|e| e.field == field)
    }

    pub fn into_result(self) -> crate::Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(VisitwiseError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

pub fn validate_name(name: &str) -> ValidationResult {
    let mut result = ValidationResult::new();
    let trimmed = name.trim();

    if trimmed.is_empty() {
        result.add_error("name", "Name is required", ValidationErrorCode::Required);
    } else if trimmed.chars().count() > MAX_NAME_LEN {
        result.add_error(
            "name",
            &format!("Name must be at most {} characters", MAX_NAME_LEN),
            ValidationErrorCode::TooLong,
        );
    }

    result
}

/// Phone numbers: optional leading `+`, digits, spaces, hyphens and
/// parentheses; 7-15 digits in total
pub fn validate_phone(phone: &str) -> ValidationResult {
    let mut result = ValidationResult::new();
    let trimmed = phone.trim();

    if trimmed.is_empty() {
        return result;
    }

    let body = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if !body
        .chars()
        .all(|c| c.is_ascii_digit() || c == ' ' || c == '-' || c == '(' || c == ')')
    {
        result.add_error(
            "phone",
            "Phone may only contain digits, spaces, hyphens and parentheses",
            ValidationErrorCode::InvalidCharacters,
        );
        return result;
    }

    let digits = body.chars().filter(|c| c.is_ascii_digit()).count();
    if digits < 7 {
        result.add_error("phone", "Phone number is too short", ValidationErrorCode::TooShort);
    } else if digits > 15 {
        result.add_error("phone", "Phone number is too long", ValidationErrorCode::TooLong);
    }

    result
}

pub fn validate_age(age: Option<u32>) -> ValidationResult {
    let mut result = ValidationResult::new();
    if let Some(age) = age {
        if age > MAX_AGE {
            result.add_error(
                "age",
                &format!("Age must be between 0 and {}", MAX_AGE),
                ValidationErrorCode::OutOfRange,
            );
        }
    }
    result
}

/// Charges may be zero (the patient default then applies)
pub fn validate_charge(charge: Amount, field: &str) -> ValidationResult {
    let mut result = ValidationResult::new();
    if charge > MAX_AMOUNT {
        result.add_error(
            field,
            &format!("Charge cannot exceed {}", MAX_AMOUNT),
            ValidationErrorCode::OutOfRange,
        );
    }
    result
}

/// Payments must be at least 1
pub fn validate_payment_amount(amount: Amount) -> ValidationResult {
    let mut result = ValidationResult::new();
    if amount < 1 {
        result.add_error("amount", "Amount must be at least 1", ValidationErrorCode::OutOfRange);
    } else if amount > MAX_AMOUNT {
        result.add_error(
            "amount",
            &format!("Amount cannot exceed {}", MAX_AMOUNT),
            ValidationErrorCode::OutOfRange,
        );
    }
    result
}

pub fn validate_date_string(date: &str, field: &str) -> ValidationResult {
    let mut result = ValidationResult::new();
    if date.trim().is_empty() {
        result.add_error(field, "Date is required", ValidationErrorCode::Required);
    } else if parse_date(date).is_err() {
        result.add_error(
            field,
            "Date must be a valid YYYY-MM-DD day",
            ValidationErrorCode::InvalidFormat,
        );
    }
    result
}

pub fn validate_notes(notes: Option<&str>) -> ValidationResult {
    let mut result = ValidationResult::new();
    if let Some(notes) = notes {
        if notes.chars().count() > MAX_NOTES_LEN {
            result.add_error(
                "notes",
                &format!("Notes must be at most {} characters", MAX_NOTES_LEN),
                ValidationErrorCode::TooLong,
            );
        }
    }
    result
}

pub fn validate_url(url: &str, field: &str) -> ValidationResult {
    let mut result = ValidationResult::new();
    let trimmed = url.trim();
    if trimmed.is_empty() {
        result.add_error(field, "URL is required", ValidationErrorCode::Required);
    } else if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
        result.add_error(field, "URL must start with http:// or https://", ValidationErrorCode::InvalidFormat);
    }
    result
}

pub fn validate_reminders(reminders: &ReminderPreferences) -> ValidationResult {
    let mut result = ValidationResult::new();

    if reminders.days_of_week.iter().any(|d| *d > 6) {
        result.add_error(
            "reminders.days_of_week",
            "Days of week must be 0 (Sunday) to 6 (Saturday)",
            ValidationErrorCode::OutOfRange,
        );
    }

    match reminders.time.as_deref() {
        Some(time) if !is_valid_time(time) => {
            result.add_error("reminders.time", "Time must be HH:MM", ValidationErrorCode::InvalidFormat);
        }
        None if reminders.enabled => {
            result.add_error(
                "reminders.time",
                "Reminder time is required when reminders are enabled",
                ValidationErrorCode::Required,
            );
        }
        _ => {}
    }

    result
}

fn is_valid_time(time: &str) -> bool {
    let Some((hours, minutes)) = time.split_once(':') else {
        return false;
    };
    if hours.len() != 2 || minutes.len() != 2 {
        return false;
    }
    matches!(
        (hours.parse::<u32>(), minutes.parse::<u32>()),
        (Ok(h), Ok(m)) if h < 24 && m < 60
    )
}

pub fn validate_patient(patient: &Patient) -> ValidationResult {
    let mut result = validate_name(&patient.name);
    result.merge(validate_age(patient.age));
    if let Some(phone) = &patient.phone {
        result.merge(validate_phone(phone));
    }
    if let Some(link) = patient.maps_link.as_deref().filter(|l| !l.trim().is_empty()) {
        result.merge(validate_url(link, "maps_link"));
    }
    result.merge(validate_charge(patient.charge_per_visit, "charge_per_visit"));
    result.merge(validate_notes(patient.notes.as_deref()));
    result.merge(validate_reminders(&patient.reminders));
    result
}

pub fn validate_visit(visit: &Visit) -> ValidationResult {
    let mut result = ValidationResult::new();
    if visit.patient_id.trim().is_empty() {
        result.add_error("patient_id", "Visit must belong to a patient", ValidationErrorCode::Required);
    }
    result.merge(validate_charge(visit.charge, "charge"));
    result.merge(validate_notes(visit.notes.as_deref()));
    result
}

pub fn validate_payment(payment: &Payment) -> ValidationResult {
    let mut result = ValidationResult::new();
    if payment.patient_id.trim().is_empty() {
        result.add_error("patient_id", "Payment must belong to a patient", ValidationErrorCode::Required);
    }
    result.merge(validate_payment_amount(payment.amount));
    result.merge(validate_notes(payment.notes.as_deref()));
    result
}

pub fn validate_media_size(size_bytes: u64) -> ValidationResult {
    let mut result = ValidationResult::new();
    if size_bytes == 0 {
        result.add_error("size_bytes", "File is empty", ValidationErrorCode::OutOfRange);
    } else if size_bytes > MAX_MEDIA_BYTES {
        result.add_error("size_bytes", "File is larger than 100 MB", ValidationErrorCode::OutOfRange);
    }
    result
}

pub fn validate_media(item: &MediaItem) -> ValidationResult {
    let mut result = ValidationResult::new();
    if item.patient_id.trim().is_empty() {
        result.add_error("patient_id", "Media must belong to a patient", ValidationErrorCode::Required);
    }
    if item.file_name.trim().is_empty() {
        result.add_error("file_name", "File name is required", ValidationErrorCode::Required);
    }
    result.merge(validate_url(&item.url, "url"));
    result.merge(validate_media_size(item.size_bytes));
    result
}
