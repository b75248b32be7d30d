//! Sign-in DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::Role;
use domain_accounts::{OtpStatus, ProviderCategory};

#[derive(Debug, Deserialize, Validate)]
pub struct OtpRequest {
    #[validate(length(min = 1, max = 20, message = "is required"))]
    pub phone: String,
}

#[derive(Debug, Serialize)]
pub struct OtpResponse {
    /// Masked destination, e.g. `+91******3210`
    pub phone: String,
    pub status: OtpStatus,
    pub channel: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 20, message = "is required"))]
    pub phone: String,
    #[validate(length(min = 4, max = 10, message = "must be 4 to 10 digits"))]
    pub code: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterProviderRequest {
    #[validate(length(min = 1, max = 120, message = "must be 1 to 120 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 20, message = "is required"))]
    pub phone: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 4, max = 10, message = "must be 4 to 10 digits"))]
    pub code: String,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub address: Option<String>,
    pub category: Option<ProviderCategory>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterConsumerRequest {
    #[validate(length(min = 1, max = 120, message = "must be 1 to 120 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 20, message = "is required"))]
    pub phone: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 4, max = 10, message = "must be 4 to 10 digits"))]
    pub code: String,
}

/// Returned on sign-in; the same token is also set as the session cookie
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub account_id: Uuid,
    pub role: Role,
    pub name: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}
