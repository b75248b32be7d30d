//! Contact value objects
//!
//! Phone numbers and email addresses are the login identities of every
//! account, so they are normalized once at the edge and compared by value
//! everywhere else.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised while parsing contact details
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContactError {
    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
}

/// A phone number normalized to `+<country code><subscriber number>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parses and normalizes a phone number
    ///
    /// Spaces, dashes, dots and parentheses are ignored. A bare 10-digit
    /// number (optionally with a single leading trunk `0`) gets
    /// `default_country_code` prepended. Numbers with a leading `+` must carry
    /// 8 to 15 digits in total.
    ///
    /// # Arguments
    ///
    /// * `raw` - The number as typed by the user
    /// * `default_country_code` - Country code without `+`, e.g. `"91"`
    pub fn parse(raw: &str, default_country_code: &str) -> Result<Self, ContactError> {
        let trimmed = raw.trim();
        let has_plus = trimmed.starts_with('+');
        let body = if has_plus { &trimmed[1..] } else { trimmed };

        let mut digits = String::with_capacity(body.len());
        for c in body.chars() {
            match c {
                '0'..='9' => digits.push(c),
                ' ' | '-' | '.' | '(' | ')' => {}
                _ => return Err(ContactError::InvalidPhone(raw.to_string())),
            }
        }

        let normalized = if has_plus {
            digits
        } else {
            let local = match digits.len() {
                11 if digits.starts_with('0') => &digits[1..],
                _ => digits.as_str(),
            };
            if local.len() != 10 {
                return Err(ContactError::InvalidPhone(raw.to_string()));
            }
            format!("{}{}", default_country_code, local)
        };

        if !(8..=15).contains(&normalized.len()) || normalized.starts_with('0') {
            return Err(ContactError::InvalidPhone(raw.to_string()));
        }

        Ok(Self(format!("+{}", normalized)))
    }

    /// Wraps an already-normalized number loaded from storage
    pub fn from_normalized(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the number with all but the last four digits masked
    pub fn masked(&self) -> String {
        let visible = self.0.len().saturating_sub(4);
        self.0
            .chars()
            .enumerate()
            .map(|(i, c)| if i > 2 && i < visible { '*' } else { c })
            .collect()
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A lower-cased email address with a minimal shape check
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Parses an email address
    ///
    /// Requires exactly one `@`, a non-empty local part, and a domain that
    /// contains a dot not at either end. Whitespace is rejected.
    pub fn parse(raw: &str) -> Result<Self, ContactError> {
        let value = raw.trim().to_lowercase();
        let invalid = || ContactError::InvalidEmail(raw.to_string());

        if value.len() > 254 || value.chars().any(char::is_whitespace) {
            return Err(invalid());
        }

        let (local, domain) = value.split_once('@').ok_or_else(invalid)?;
        if local.is_empty() || domain.contains('@') {
            return Err(invalid());
        }
        if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
            return Err(invalid());
        }

        Ok(Self(value))
    }

    /// Wraps an already-normalized address loaded from storage
    pub fn from_normalized(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_number_gets_country_code() {
        let phone = PhoneNumber::parse("98765 43210", "91").unwrap();
        assert_eq!(phone.as_str(), "+919876543210");
    }

    #[test]
    fn test_trunk_zero_is_dropped() {
        let phone = PhoneNumber::parse("09876543210", "91").unwrap();
        assert_eq!(phone.as_str(), "+919876543210");
    }

    #[test]
    fn test_international_number_kept() {
        let phone = PhoneNumber::parse("+1 (415) 555-0100", "91").unwrap();
        assert_eq!(phone.as_str(), "+14155550100");
    }

    #[test]
    fn test_invalid_phone_rejected() {
        assert!(PhoneNumber::parse("12345", "91").is_err());
        assert!(PhoneNumber::parse("98765abc10", "91").is_err());
        assert!(PhoneNumber::parse("+", "91").is_err());
    }

    #[test]
    fn test_masked_phone() {
        let phone = PhoneNumber::from_normalized("+919876543210");
        assert_eq!(phone.masked(), "+91******3210");
    }

    #[test]
    fn test_email_is_lowercased() {
        let email = EmailAddress::parse("  Office@Example.School ").unwrap();
        assert_eq!(email.as_str(), "office@example.school");
    }

    #[test]
    fn test_invalid_email_rejected() {
        assert!(EmailAddress::parse("no-at-sign.com").is_err());
        assert!(EmailAddress::parse("@example.com").is_err());
        assert!(EmailAddress::parse("a@b@example.com").is_err());
        assert!(EmailAddress::parse("a@localhost").is_err());
        assert!(EmailAddress::parse("a b@example.com").is_err());
    }
}
