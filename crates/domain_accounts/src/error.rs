//! Accounts domain errors

use thiserror::Error;

use core_kernel::{ContactError, PortError};

/// Errors that can occur in the accounts domain
#[derive(Debug, Error)]
pub enum AccountError {
    /// Account with the given identity was not found
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// An account with the same phone or email already exists
    #[error("Duplicate account: {0}")]
    DuplicateAccount(String),

    /// Member record not found
    #[error("Member not found: {0}")]
    MemberNotFound(String),

    /// Invalid contact details
    #[error(transparent)]
    Contact(#[from] ContactError),

    /// Account or member validation failed
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Provider is unverified, or does not own the claimed member
    #[error("Provider not available: {0}")]
    ProviderUnavailable(String),

    /// The consumer's phone does not match the member's contact phone
    #[error("Membership claim rejected: {0}")]
    ClaimRejected(String),

    /// The consumer already holds this membership
    #[error("Membership already claimed")]
    AlreadyClaimed,

    /// Account has been deactivated
    #[error("Account is inactive")]
    InactiveAccount,

    /// One-time password was wrong or expired
    #[error("Invalid or expired verification code")]
    InvalidCode,
}

impl AccountError {
    /// Creates a ValidationFailed error from validation errors
    pub fn validation_failed(errors: Vec<String>) -> Self {
        AccountError::ValidationFailed(errors.join("; "))
    }
}

impl From<AccountError> for PortError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::AccountNotFound(id) => PortError::not_found("Account", id),
            AccountError::MemberNotFound(id) => PortError::not_found("Member", id),
            AccountError::ProviderUnavailable(id) => PortError::not_found("Provider", id),
            AccountError::DuplicateAccount(msg) => PortError::conflict(msg),
            AccountError::AlreadyClaimed => PortError::conflict("Membership already claimed"),
            AccountError::Contact(e) => PortError::validation(e.to_string()),
            AccountError::ValidationFailed(msg) => PortError::validation(msg),
            AccountError::ClaimRejected(msg) => PortError::forbidden(msg),
            AccountError::InactiveAccount => PortError::forbidden("Account is inactive"),
            AccountError::InvalidCode => PortError::Unauthorized {
                message: "Invalid or expired verification code".to_string(),
            },
        }
    }
}
