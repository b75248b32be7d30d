//! Billing domain errors

use thiserror::Error;

use core_kernel::{MoneyError, PortError};

/// Errors that can occur in the billing domain
#[derive(Debug, Error)]
pub enum BillingError {
    /// Fee plan not found
    #[error("Fee plan not found: {0}")]
    FeePlanNotFound(String),

    /// Order not found
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// The fee plan has already been paid
    #[error("Fee plan {0} is already paid")]
    AlreadyPaid(String),

    /// A paid fee plan can no longer be changed
    #[error("Fee plan {0} is paid and can no longer be changed")]
    NotEditable(String),

    /// The order reached a terminal state
    #[error("Order {0} is closed")]
    OrderClosed(String),

    /// Invalid amount for a fee plan or order
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Money arithmetic failed
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// Fee plan validation failed
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// The caller may not act on this fee plan
    #[error("Not permitted: {0}")]
    NotPermitted(String),

    /// The gateway returned data that does not match our order
    #[error("Gateway mismatch: {0}")]
    GatewayMismatch(String),
}

impl From<BillingError> for PortError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::FeePlanNotFound(id) => PortError::not_found("FeePlan", id),
            BillingError::OrderNotFound(id) => PortError::not_found("Order", id),
            e @ (BillingError::AlreadyPaid(_)
            | BillingError::NotEditable(_)
            | BillingError::OrderClosed(_)) => PortError::conflict(e.to_string()),
            e @ (BillingError::InvalidAmount(_) | BillingError::Money(_)) => {
                PortError::validation_field(e.to_string(), "amount")
            }
            BillingError::ValidationFailed(msg) => PortError::validation(msg),
            BillingError::NotPermitted(msg) => PortError::forbidden(msg),
            BillingError::GatewayMismatch(msg) => PortError::Transformation { message: msg },
        }
    }
}
