//! Form validation shared by the storefront and admin forms.
//!
//! Validation runs before any remote call. Errors are collected per field in
//! [`FieldErrors`] so templates can render them next to the offending input.

use crate::types::{Email, EmailError, Price, PriceError};

/// Minimum password length accepted by sign-up and sign-in forms.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Inclusive bounds for a review rating.
pub const RATING_RANGE: core::ops::RangeInclusive<u8> = 1..=5;

/// A single field failed validation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("This field is required")]
    Required,

    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("Rating must be between 1 and 5")]
    RatingOutOfRange,

    #[error("Must be a whole number")]
    NotAnInteger,

    #[error("Invalid email address")]
    Email(#[from] EmailError),

    #[error("Invalid price: {0}")]
    Price(#[from] PriceError),
}

/// Validation errors keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: Vec<(&'static str, ValidationError)>,
}

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for `field`. Only the first error per field is kept.
    pub fn push(&mut self, field: &'static str, error: ValidationError) {
        if self.get(field).is_none() {
            self.errors.push((field, error));
        }
    }

    /// Unwrap a field result, recording the error and returning `None` on
    /// failure.
    pub fn check<T>(&mut self, field: &'static str, result: Result<T, ValidationError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.push(field, e);
                None
            }
        }
    }

    /// Message for `field`, if it failed.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<String> {
        self.errors
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, e)| e.to_string())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of failing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterate `(field, error)` pairs in the order they were recorded.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ValidationError)> {
        self.errors.iter().map(|(f, e)| (*f, e))
    }
}

/// Trimmed, non-empty text.
///
/// # Errors
///
/// Returns [`ValidationError::Required`] for blank input.
pub fn required(value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required);
    }
    Ok(value.to_owned())
}

/// Trimmed text, or `None` when blank.
#[must_use]
pub fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

/// A well-formed email address.
///
/// # Errors
///
/// Returns [`ValidationError::Required`] for blank input and
/// [`ValidationError::Email`] for malformed addresses.
pub fn email(value: &str) -> Result<Email, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required);
    }
    Ok(Email::parse(value)?)
}

/// A password of at least [`MIN_PASSWORD_LENGTH`] characters.
///
/// Passwords are not trimmed.
///
/// # Errors
///
/// Returns [`ValidationError::PasswordTooShort`] for short passwords.
pub fn password(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Required);
    }
    if value.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LENGTH,
        });
    }
    Ok(())
}

/// A review rating in `1..=5`.
///
/// # Errors
///
/// Returns [`ValidationError::RatingOutOfRange`] for anything else.
pub fn rating(value: &str) -> Result<u8, ValidationError> {
    value
        .trim()
        .parse::<u8>()
        .ok()
        .filter(|r| RATING_RANGE.contains(r))
        .ok_or(ValidationError::RatingOutOfRange)
}

/// A required non-negative price.
///
/// # Errors
///
/// Returns an error for blank, non-numeric or negative input.
pub fn price(value: &str) -> Result<Price, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required);
    }
    Ok(Price::parse(value)?)
}

/// An optional non-negative price. Blank input is `None`.
///
/// # Errors
///
/// Returns an error for non-numeric or negative input.
pub fn optional_price(value: &str) -> Result<Option<Price>, ValidationError> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(Price::parse(value)?))
}

/// An optional non-negative whole number. Blank input is `None`.
///
/// # Errors
///
/// Returns [`ValidationError::NotAnInteger`] for anything else.
pub fn optional_count(value: &str) -> Result<Option<u32>, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<u32>()
        .map(Some)
        .map_err(|_| ValidationError::NotAnInteger)
}
