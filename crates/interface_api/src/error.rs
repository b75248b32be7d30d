//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use core_kernel::{ContactError, PortError};
use domain_accounts::AccountError;
use domain_billing::BillingError;
use domain_platform::PlatformError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Upstream service failed: {0}")]
    BadGateway(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ApiError {
    pub fn unauthorized() -> Self {
        ApiError::Unauthorized("Sign in to continue".to_string())
    }

    /// Maps an error from a flow that calls a hosted service
    ///
    /// Authentication failures there are our credentials being rejected,
    /// not the caller's, so they surface as 502 instead of 401.
    pub fn from_upstream(err: PortError) -> Self {
        match err {
            PortError::Unauthorized { message } => {
                error!(%message, "Hosted service rejected our credentials");
                ApiError::BadGateway("Upstream service rejected the request".to_string())
            }
            other => other.into(),
        }
    }

    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ApiError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            ApiError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
            ApiError::BadGateway(_) => (StatusCode::BAD_GATEWAY, "bad_gateway"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            ApiError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.parts();
        let message = match self {
            ApiError::Internal(detail) | ApiError::Database(detail) => {
                error!(error = error_type, %detail, "Request failed");
                "Something went wrong, please try again".to_string()
            }
            ApiError::BadGateway(message) => {
                warn!(%message, "Upstream failure");
                message
            }
            ApiError::NotFound(m)
            | ApiError::BadRequest(m)
            | ApiError::Unauthorized(m)
            | ApiError::Forbidden(m)
            | ApiError::Conflict(m)
            | ApiError::Validation(m)
            | ApiError::PayloadTooLarge(m) => m,
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { entity_type, .. } => {
                ApiError::NotFound(format!("{} not found", entity_type))
            }
            PortError::Validation { message, field } => match field {
                Some(field) => ApiError::Validation(format!("{}: {}", field, message)),
                None => ApiError::Validation(message),
            },
            PortError::Conflict { message } => ApiError::Conflict(message),
            PortError::Forbidden { message } => ApiError::Forbidden(message),
            PortError::Unauthorized { message } => ApiError::Unauthorized(message),
            PortError::ServiceUnavailable { service } if service == "postgres" => {
                ApiError::Database("connection pool exhausted".to_string())
            }
            e @ (PortError::Connection { .. }
            | PortError::Timeout { .. }
            | PortError::RateLimited { .. }
            | PortError::ServiceUnavailable { .. }
            | PortError::Transformation { .. }) => ApiError::BadGateway(e.to_string()),
            e @ PortError::Internal { .. } => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        PortError::from(err).into()
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        PortError::from(err).into()
    }
}

impl From<PlatformError> for ApiError {
    fn from(err: PlatformError) -> Self {
        PortError::from(err).into()
    }
}

impl From<ContactError> for ApiError {
    fn from(err: ContactError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let reason = errs
                    .iter()
                    .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| "is invalid".to_string());
                format!("{} {}", field, reason)
            })
            .collect();
        messages.sort();
        ApiError::Validation(messages.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_errors_map_to_status() {
        let cases = [
            (PortError::not_found("FeePlan", "FEE-1"), StatusCode::NOT_FOUND),
            (PortError::validation("bad"), StatusCode::UNPROCESSABLE_ENTITY),
            (PortError::conflict("exists"), StatusCode::CONFLICT),
            (PortError::forbidden("no"), StatusCode::FORBIDDEN),
            (
                PortError::Timeout {
                    operation: "create_order".to_string(),
                    duration_ms: 15000,
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                PortError::ServiceUnavailable {
                    service: "postgres".to_string(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (PortError::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (port_error, expected) in cases {
            let api_error = ApiError::from(port_error);
            assert_eq!(api_error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_not_found_hides_identifier() {
        match ApiError::from(PortError::not_found("Member", "MEM-123")) {
            ApiError::NotFound(message) => assert_eq!(message, "Member not found"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_upstream_credentials_are_not_a_401() {
        let err = ApiError::from_upstream(PortError::Unauthorized {
            message: "bad key".to_string(),
        });
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);

        let err = ApiError::from_upstream(PortError::conflict("paid"));
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_invalid_code_is_unauthorized() {
        let err = ApiError::from(AccountError::InvalidCode);
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}
