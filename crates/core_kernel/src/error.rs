//! Kernel value errors

use thiserror::Error;

use crate::contact::ContactError;
use crate::money::MoneyError;

/// Failure to build one of the kernel's value types from outside input
#[derive(Debug, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error(transparent)]
    Money(#[from] MoneyError),

    #[error(transparent)]
    Contact(#[from] ContactError),

    #[error("Invalid {kind} id: {value}")]
    InvalidIdentifier { kind: &'static str, value: String },

    #[error("Unknown role: {0}")]
    UnknownRole(String),
}
