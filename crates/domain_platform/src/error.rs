//! Platform domain errors

use thiserror::Error;

use core_kernel::{ContactError, PortError};

#[derive(Debug, Error)]
pub enum PlatformError {
    /// Policy slugs are lower-case letters, digits and hyphens
    #[error("Invalid policy slug: {0}")]
    InvalidSlug(String),

    #[error("Policy not found: {0}")]
    PolicyNotFound(String),

    #[error("Query not found: {0}")]
    QueryNotFound(String),

    #[error("Query {0} is already resolved")]
    AlreadyResolved(String),

    #[error(transparent)]
    Contact(#[from] ContactError),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

impl From<PlatformError> for PortError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::InvalidSlug(slug) => {
                PortError::validation_field(format!("Invalid policy slug: {}", slug), "slug")
            }
            PlatformError::PolicyNotFound(slug) => PortError::not_found("Policy", slug),
            PlatformError::QueryNotFound(id) => PortError::not_found("Query", id),
            e @ PlatformError::AlreadyResolved(_) => PortError::conflict(e.to_string()),
            PlatformError::Contact(e) => PortError::validation(e.to_string()),
            PlatformError::ValidationFailed(msg) => PortError::validation(msg),
        }
    }
}
