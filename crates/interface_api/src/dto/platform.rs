//! Policy, support query and upload DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{EmailAddress, ModeratorId, PhoneNumber, QueryId, Role};
use domain_platform::{Policy, QueryStatus, SupportQuery};

#[derive(Debug, Serialize)]
pub struct PolicyResponse {
    pub slug: String,
    pub title: String,
    pub body: String,
    pub updated_at: DateTime<Utc>,
}

impl From<Policy> for PolicyResponse {
    fn from(p: Policy) -> Self {
        Self {
            slug: p.slug,
            title: p.title,
            body: p.body,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertPolicyRequest {
    #[validate(length(min = 1, max = 200, message = "must be 1 to 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "is required"))]
    pub body: String,
}

/// Contact form
#[derive(Debug, Deserialize, Validate)]
pub struct ContactRequest {
    #[validate(length(min = 1, max = 120, message = "must be 1 to 120 characters"))]
    pub name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, max = 20, message = "must be 1 to 20 characters"))]
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 200, message = "must be 1 to 200 characters"))]
    pub subject: String,
    #[validate(length(min = 1, max = 5000, message = "must be 1 to 5000 characters"))]
    pub message: String,
}

/// `?status=OPEN|RESOLVED`
#[derive(Debug, Default, Deserialize)]
pub struct QueryListParams {
    pub status: Option<QueryStatus>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResolveQueryRequest {
    #[validate(length(min = 1, max = 5000, message = "must be 1 to 5000 characters"))]
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub id: QueryId,
    pub raised_by_role: Option<Role>,
    pub raised_by_id: Option<Uuid>,
    pub name: String,
    pub email: EmailAddress,
    pub phone: Option<PhoneNumber>,
    pub subject: String,
    pub message: String,
    pub status: QueryStatus,
    pub response: Option<String>,
    pub resolved_by: Option<ModeratorId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SupportQuery> for QueryResponse {
    fn from(q: SupportQuery) -> Self {
        Self {
            id: q.id,
            raised_by_role: q.raised_by_role,
            raised_by_id: q.raised_by_id,
            name: q.name,
            email: q.email,
            phone: q.phone,
            subject: q.subject,
            message: q.message,
            status: q.status,
            response: q.response,
            resolved_by: q.resolved_by,
            created_at: q.created_at,
            updated_at: q.updated_at,
        }
    }
}

/// Acknowledgement returned to the contact form
#[derive(Debug, Serialize)]
pub struct QueryReceipt {
    pub id: QueryId,
    pub status: QueryStatus,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
    pub content_type: String,
    pub size: usize,
}
