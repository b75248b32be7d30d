//! Request handlers, one module per audience

pub mod health;
pub mod auth;
pub mod provider;
pub mod consumer;
pub mod moderator;
pub mod public;
pub mod uploads;

use chrono::{NaiveDate, Utc};

use core_kernel::{EmailAddress, PhoneNumber};

use crate::error::ApiError;
use crate::state::AppState;

/// Normalizes a phone number with the configured default country code
pub(crate) fn parse_phone(state: &AppState, raw: &str) -> Result<PhoneNumber, ApiError> {
    Ok(PhoneNumber::parse(raw, &state.config.default_country_code)?)
}

pub(crate) fn parse_email(raw: &str) -> Result<EmailAddress, ApiError> {
    Ok(EmailAddress::parse(raw)?)
}

/// Blank optional text is treated as absent
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}
