//! One-time password verification port
//!
//! Login and registration prove phone ownership with a code sent by SMS.
//! Code issuance and checking are delegated to a verification service; the
//! platform never stores codes itself.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable, PhoneNumber, PortError};

/// State of a verification as reported by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpStatus {
    Pending,
    Approved,
    Canceled,
}

impl OtpStatus {
    pub fn from_service(value: &str) -> Self {
        match value {
            "approved" => OtpStatus::Approved,
            "canceled" | "expired" => OtpStatus::Canceled,
            _ => OtpStatus::Pending,
        }
    }
}

/// Receipt for a dispatched code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpDispatch {
    pub phone: PhoneNumber,
    pub status: OtpStatus,
    pub channel: String,
}

/// Port for sending and checking one-time passwords
#[async_trait]
pub trait OtpPort: DomainPort + HealthCheckable {
    /// Sends a fresh code to the phone
    async fn send_code(&self, phone: &PhoneNumber) -> Result<OtpDispatch, PortError>;

    /// Checks a code; `Ok(false)` means wrong, expired or never requested
    async fn check_code(&self, phone: &PhoneNumber, code: &str) -> Result<bool, PortError>;
}

/// Development adapter accepting one configured code
///
/// A code must still be requested before it can be checked, and a
/// successful check consumes the request.
#[derive(Debug, Clone)]
pub struct FixedCodeOtp {
    code: String,
    pending: Arc<RwLock<HashSet<String>>>,
}

impl FixedCodeOtp {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            pending: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Whether a code is outstanding for the phone
    pub async fn is_pending(&self, phone: &PhoneNumber) -> bool {
        self.pending.read().await.contains(phone.as_str())
    }
}

impl DomainPort for FixedCodeOtp {}

#[async_trait]
impl HealthCheckable for FixedCodeOtp {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult::healthy("fixed-code-otp")
    }
}

#[async_trait]
impl OtpPort for FixedCodeOtp {
    async fn send_code(&self, phone: &PhoneNumber) -> Result<OtpDispatch, PortError> {
        self.pending.write().await.insert(phone.as_str().to_string());
        tracing::debug!(phone = %phone.masked(), "Issued fixed verification code");
        Ok(OtpDispatch {
            phone: phone.clone(),
            status: OtpStatus::Pending,
            channel: "sms".to_string(),
        })
    }

    async fn check_code(&self, phone: &PhoneNumber, code: &str) -> Result<bool, PortError> {
        let mut pending = self.pending.write().await;
        if !pending.contains(phone.as_str()) || code.trim() != self.code {
            return Ok(false);
        }
        pending.remove(phone.as_str());
        Ok(true)
    }
}
