//! Shared port vocabulary
//!
//! Each domain crate declares its own port traits (`MemberPort`,
//! `FeePlanPort`, `OtpPort`, ...) on top of the two marker traits here, and
//! every port method fails with `PortError`. Postgres repositories, hosted
//! services and in-memory mocks therefore all fail the same way, and
//! `interface_api` needs a single mapping from `PortError` to HTTP status.

use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum PortError {
    #[error("Not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Uniqueness clash or a state that forbids the change
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Signed in, but the record belongs to someone else
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// Bad credentials, either the caller's or ours at a hosted service
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("Timeout after {duration_ms}ms: {operation}")]
    Timeout { operation: String, duration_ms: u64 },

    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Service unavailable: {service}")]
    ServiceUnavailable { service: String },

    /// A stored row or upstream payload could not be mapped to a domain value
    #[error("Transformation error: {message}")]
    Transformation { message: String },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },
}

impl PortError {
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: None,
        }
    }

    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        PortError::Conflict {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        PortError::Forbidden {
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Classifies a failed response from a hosted service (OTP, gateway)
    ///
    /// 400/422 become `Validation`, 401/403 `Unauthorized`, 404 `NotFound`,
    /// 409 `Conflict`, 429 `RateLimited` and any 5xx `ServiceUnavailable`.
    /// Other codes are treated as internal faults.
    pub fn from_http_status(status: u16, service: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 | 422 => PortError::validation(message),
            401 | 403 => PortError::Unauthorized { message },
            404 => PortError::not_found(service, message),
            409 => PortError::conflict(message),
            429 => PortError::RateLimited { retry_after_secs: 1 },
            500..=599 => PortError::ServiceUnavailable {
                service: service.to_string(),
            },
            _ => PortError::internal(format!("{} returned {}: {}", service, status, message)),
        }
    }

    /// Worth retrying later; the request itself was fine
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PortError::Connection { .. }
                | PortError::Timeout { .. }
                | PortError::RateLimited { .. }
                | PortError::ServiceUnavailable { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, PortError::Conflict { .. })
    }
}

/// Every port is shared across handlers as `Arc<dyn Port>`
pub trait DomainPort: Send + Sync + 'static {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    Healthy,
    /// Reachable but answering with errors
    Degraded,
    Unhealthy,
}

/// One adapter's answer to a readiness probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub adapter_id: String,
    pub status: AdapterHealth,
    pub latency_ms: u64,
    pub message: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl HealthCheckResult {
    /// For adapters with nothing remote to probe
    pub fn healthy(adapter_id: impl Into<String>) -> Self {
        Self {
            adapter_id: adapter_id.into(),
            status: AdapterHealth::Healthy,
            latency_ms: 0,
            message: None,
            checked_at: Utc::now(),
        }
    }

    /// Records a probe that began at `started`
    pub fn timed(
        adapter_id: impl Into<String>,
        started: Instant,
        status: AdapterHealth,
        message: Option<String>,
    ) -> Self {
        Self {
            adapter_id: adapter_id.into(),
            status,
            latency_ms: started.elapsed().as_millis() as u64,
            message,
            checked_at: Utc::now(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == AdapterHealth::Healthy
    }
}

#[async_trait::async_trait]
pub trait HealthCheckable: Send + Sync {
    async fn health_check(&self) -> HealthCheckResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hosted_service_statuses() {
        let cases: [(u16, fn(&PortError) -> bool); 6] = [
            (422, |e| matches!(e, PortError::Validation { .. })),
            (401, |e| matches!(e, PortError::Unauthorized { .. })),
            (404, PortError::is_not_found),
            (409, PortError::is_conflict),
            (429, PortError::is_transient),
            (502, PortError::is_transient),
        ];
        for (status, check) in cases {
            assert!(check(&PortError::from_http_status(status, "gateway", "x")), "{}", status);
        }
        assert!(matches!(
            PortError::from_http_status(418, "gateway", "teapot"),
            PortError::Internal { .. }
        ));
    }

    #[test]
    fn test_not_found_message_names_the_record() {
        let error = PortError::not_found("Member", "0190c2a4");
        assert_eq!(error.to_string(), "Not found: Member with id 0190c2a4");
        assert!(!error.is_transient());
    }

    #[test]
    fn test_timed_result() {
        let result = HealthCheckResult::timed(
            "hosted-otp",
            Instant::now(),
            AdapterHealth::Degraded,
            Some("Service responded with 500".to_string()),
        );
        assert!(!result.is_healthy());
        assert_eq!(result.adapter_id, "hosted-otp");
    }
}
