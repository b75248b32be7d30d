//! Hosted OTP adapter
//!
//! Talks to a Twilio-Verify-style REST service:
//!
//! - `POST {base_url}/Verifications` with `To` and `Channel` starts a
//!   verification and sends the SMS
//! - `POST {base_url}/VerificationCheck` with `To` and `Code` checks it
//!
//! Bodies are form-encoded and requests authenticate with HTTP basic auth
//! (`account_sid:auth_token`).
//!
//! # Error Handling
//!
//! - 404 on check -> `Ok(false)` (no pending verification, or it expired)
//! - other non-success statuses -> `PortError::from_http_status`
//! - timeouts -> `PortError::Timeout`

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use core_kernel::{
    AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PhoneNumber, PortError,
};

use crate::otp::{OtpDispatch, OtpPort, OtpStatus};

const SERVICE: &str = "otp-service";

#[derive(Debug, Clone)]
pub struct HostedOtpConfig {
    /// Service URL, e.g. `https://verify.twilio.com/v2/Services/VA123`
    pub base_url: String,
    pub account_sid: String,
    pub auth_token: String,
    pub timeout_secs: u64,
}

impl Default for HostedOtpConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            account_sid: String::new(),
            auth_token: String::new(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize)]
struct VerificationResponse {
    status: String,
    #[serde(default)]
    channel: Option<String>,
}

/// OTP port backed by a hosted verification service
#[derive(Debug, Clone)]
pub struct HostedOtpAdapter {
    config: HostedOtpConfig,
    client: reqwest::Client,
}

impl HostedOtpAdapter {
    pub fn new(config: HostedOtpConfig) -> Result<Self, PortError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PortError::internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn post_form(
        &self,
        operation: &str,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<reqwest::Response, PortError> {
        self.client
            .post(self.url(path))
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(form)
            .send()
            .await
            .map_err(|e| self.map_transport_error(operation, e))
    }

    fn map_transport_error(&self, operation: &str, err: reqwest::Error) -> PortError {
        if err.is_timeout() {
            PortError::Timeout {
                operation: operation.to_string(),
                duration_ms: self.config.timeout_secs * 1000,
            }
        } else {
            PortError::Connection {
                message: format!("{} request failed: {}", SERVICE, err),
                source: Some(Box::new(err)),
            }
        }
    }

    async fn error_from_response(response: reqwest::Response) -> PortError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        warn!(status, "Verification service returned an error");
        PortError::from_http_status(status, SERVICE, body)
    }
}

impl DomainPort for HostedOtpAdapter {}

#[async_trait]
impl HealthCheckable for HostedOtpAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        let result = self
            .client
            .get(&self.config.base_url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .send()
            .await;
        let (status, message) = match result {
            Ok(resp) if resp.status().is_success() => (AdapterHealth::Healthy, None),
            Ok(resp) => (
                AdapterHealth::Degraded,
                Some(format!("Service responded with {}", resp.status())),
            ),
            Err(e) => (AdapterHealth::Unhealthy, Some(e.to_string())),
        };
        HealthCheckResult::timed("hosted-otp", start, status, message)
    }
}

#[async_trait]
impl OtpPort for HostedOtpAdapter {
    #[instrument(skip(self, phone), fields(phone = %phone.masked()))]
    async fn send_code(&self, phone: &PhoneNumber) -> Result<OtpDispatch, PortError> {
        let response = self
            .post_form(
                "send_code",
                "Verifications",
                &[("To", phone.as_str()), ("Channel", "sms")],
            )
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let body: VerificationResponse = response.json().await.map_err(|e| {
            PortError::Transformation {
                message: format!("Unexpected verification response: {}", e),
            }
        })?;
        debug!(status = %body.status, "Verification started");

        Ok(OtpDispatch {
            phone: phone.clone(),
            status: OtpStatus::from_service(&body.status),
            channel: body.channel.unwrap_or_else(|| "sms".to_string()),
        })
    }

    #[instrument(skip(self, phone, code), fields(phone = %phone.masked()))]
    async fn check_code(&self, phone: &PhoneNumber, code: &str) -> Result<bool, PortError> {
        let response = self
            .post_form(
                "check_code",
                "VerificationCheck",
                &[("To", phone.as_str()), ("Code", code.trim())],
            )
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!("No pending verification");
            return Ok(false);
        }
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let body: VerificationResponse = response.json().await.map_err(|e| {
            PortError::Transformation {
                message: format!("Unexpected verification response: {}", e),
            }
        })?;
        Ok(OtpStatus::from_service(&body.status) == OtpStatus::Approved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn adapter(server: &MockServer) -> HostedOtpAdapter {
        HostedOtpAdapter::new(HostedOtpConfig {
            base_url: server.url("/v2/Services/VA1"),
            account_sid: "AC1".to_string(),
            auth_token: "secret".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    fn phone() -> PhoneNumber {
        PhoneNumber::from_normalized("+919876543210")
    }

    #[tokio::test]
    async fn test_send_code_posts_form() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v2/Services/VA1/Verifications")
                .header_exists("authorization")
                .x_www_form_urlencoded_tuple("To", "+919876543210")
                .x_www_form_urlencoded_tuple("Channel", "sms");
            then.status(201)
                .json_body(serde_json::json!({"status": "pending", "channel": "sms"}));
        });

        let dispatch = adapter(&server).send_code(&phone()).await.unwrap();

        mock.assert();
        assert_eq!(dispatch.status, OtpStatus::Pending);
        assert_eq!(dispatch.channel, "sms");
    }

    #[tokio::test]
    async fn test_check_code_approved() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/v2/Services/VA1/VerificationCheck")
                .x_www_form_urlencoded_tuple("Code", "123456");
            then.status(200)
                .json_body(serde_json::json!({"status": "approved", "valid": true}));
        });

        assert!(adapter(&server).check_code(&phone(), "123456").await.unwrap());
    }

    #[tokio::test]
    async fn test_check_code_pending_is_false() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v2/Services/VA1/VerificationCheck");
            then.status(200)
                .json_body(serde_json::json!({"status": "pending", "valid": false}));
        });

        assert!(!adapter(&server).check_code(&phone(), "000000").await.unwrap());
    }

    #[tokio::test]
    async fn test_check_code_not_found_is_false() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v2/Services/VA1/VerificationCheck");
            then.status(404).body("not found");
        });

        assert!(!adapter(&server).check_code(&phone(), "123456").await.unwrap());
    }

    #[tokio::test]
    async fn test_send_code_maps_errors() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v2/Services/VA1/Verifications");
            then.status(429);
        });

        let err = adapter(&server).send_code(&phone()).await.unwrap_err();
        assert!(matches!(err, PortError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn test_bad_credentials_are_unauthorized() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v2/Services/VA1/Verifications");
            then.status(401).body("bad credentials");
        });

        let err = adapter(&server).send_code(&phone()).await.unwrap_err();
        assert!(matches!(err, PortError::Unauthorized { .. }));
    }
}
