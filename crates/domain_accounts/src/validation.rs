//! Account and member validation rules
//!
//! # Rules
//!
//! - Names are required and at most 120 characters
//! - Member references are required, at most 64 characters, and use only
//!   letters, digits and `-`, `_`, `/`, `.`
//! - Logo URLs, when present, must be http(s) or a relative `/uploads/` path

use crate::consumer::Consumer;
use crate::error::AccountError;
use crate::member::Member;
use crate::provider::Provider;

pub const MAX_NAME_LEN: usize = 120;
pub const MAX_REFERENCE_LEN: usize = 64;
pub const MAX_NOTES_LEN: usize = 1000;

/// Result of a validation pass
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    /// Non-fatal issues
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
        self.is_valid = false;
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Converts into a `Result`, joining all errors
    pub fn into_result(self) -> Result<(), AccountError> {
        if self.is_valid {
            Ok(())
        } else {
            Err(AccountError::validation_failed(self.errors))
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

/// Validator for accounts and member records
pub struct AccountValidator;

impl AccountValidator {
    pub fn validate_provider(provider: &Provider) -> ValidationResult {
        let mut result = ValidationResult::ok();
        Self::check_name("Provider name", &provider.name, &mut result);

        if let Some(ref logo_url) = provider.logo_url {
            if !Self::is_acceptable_url(logo_url) {
                result.add_error("Logo URL must be an http(s) URL or an uploaded file path");
            }
        }
        if provider.address.as_deref().map_or(true, |a| a.trim().is_empty()) {
            result.add_warning("Provider has no address");
        }
        result
    }

    pub fn validate_consumer(consumer: &Consumer) -> ValidationResult {
        let mut result = ValidationResult::ok();
        Self::check_name("Consumer name", &consumer.name, &mut result);
        result
    }

    pub fn validate_member(member: &Member) -> ValidationResult {
        let mut result = ValidationResult::ok();
        Self::check_name("Member name", &member.name, &mut result);
        Self::check_reference(&member.reference, &mut result);

        if let Some(ref notes) = member.notes {
            if notes.chars().count() > MAX_NOTES_LEN {
                result.add_error(format!("Notes must be at most {MAX_NOTES_LEN} characters"));
            }
        }
        result
    }

    /// Validates only a name; used by moderator creation
    pub fn validate_name(label: &str, name: &str) -> ValidationResult {
        let mut result = ValidationResult::ok();
        Self::check_name(label, name, &mut result);
        result
    }

    fn check_name(label: &str, name: &str, result: &mut ValidationResult) {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            result.add_error(format!("{label} is required"));
        } else if trimmed.chars().count() > MAX_NAME_LEN {
            result.add_error(format!("{label} must be at most {MAX_NAME_LEN} characters"));
        }
    }

    fn check_reference(reference: &str, result: &mut ValidationResult) {
        if reference.is_empty() {
            result.add_error("Member reference is required");
            return;
        }
        if reference.chars().count() > MAX_REFERENCE_LEN {
            result.add_error(format!(
                "Member reference must be at most {MAX_REFERENCE_LEN} characters"
            ));
        }
        if !reference
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/' | '.'))
        {
            result.add_error("Member reference may only contain letters, digits and - _ / .");
        }
    }

    fn is_acceptable_url(url: &str) -> bool {
        url.starts_with("https://") || url.starts_with("http://") || url.starts_with("/uploads/")
    }
}
