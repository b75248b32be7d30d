//! Support queries raised through the contact form

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{EmailAddress, ModeratorId, PhoneNumber, QueryId, Role};

use crate::error::PlatformError;

pub const MAX_SUBJECT_LEN: usize = 200;
pub const MAX_MESSAGE_LEN: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryStatus {
    Open,
    Resolved,
}

impl QueryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryStatus::Open => "OPEN",
            QueryStatus::Resolved => "RESOLVED",
        }
    }

    pub fn from_db(value: &str) -> Self {
        match value {
            "RESOLVED" => QueryStatus::Resolved,
            _ => QueryStatus::Open,
        }
    }
}

impl std::str::FromStr for QueryStatus {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "OPEN" => Ok(QueryStatus::Open),
            "RESOLVED" => Ok(QueryStatus::Resolved),
            other => Err(PlatformError::ValidationFailed(format!(
                "Unknown query status: {}",
                other
            ))),
        }
    }
}

/// A support request
///
/// Anyone may raise one; when the sender is signed in, their role and
/// account id are attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportQuery {
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

impl SupportQuery {
    pub fn new(
        name: impl Into<String>,
        email: EmailAddress,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<Self, PlatformError> {
        let name = name.into().trim().to_string();
        let subject = subject.into().trim().to_string();
        let message = message.into().trim().to_string();

        let mut errors = Vec::new();
        if name.is_empty() || name.chars().count() > 120 {
            errors.push("Name must be 1 to 120 characters".to_string());
        }
        if subject.is_empty() || subject.chars().count() > MAX_SUBJECT_LEN {
            errors.push(format!("Subject must be 1 to {} characters", MAX_SUBJECT_LEN));
        }
        if message.is_empty() || message.chars().count() > MAX_MESSAGE_LEN {
            errors.push(format!("Message must be 1 to {} characters", MAX_MESSAGE_LEN));
        }
        if !errors.is_empty() {
            return Err(PlatformError::ValidationFailed(errors.join("; ")));
        }

        let now = Utc::now();
        Ok(Self {
            id: QueryId::new(),
            raised_by_role: None,
            raised_by_id: None,
            name,
            email,
            phone: None,
            subject,
            message,
            status: QueryStatus::Open,
            response: None,
            resolved_by: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn with_phone(mut self, phone: PhoneNumber) -> Self {
        self.phone = Some(phone);
        self
    }

    /// Attaches the signed-in sender
    pub fn raised_by(mut self, role: Role, account_id: Uuid) -> Self {
        self.raised_by_role = Some(role);
        self.raised_by_id = Some(account_id);
        self
    }

    pub fn is_open(&self) -> bool {
        self.status == QueryStatus::Open
    }

    /// Closes the query with a moderator's response
    pub fn resolve(
        &mut self,
        moderator: ModeratorId,
        response: impl Into<String>,
    ) -> Result<(), PlatformError> {
        if !self.is_open() {
            return Err(PlatformError::AlreadyResolved(self.id.to_string()));
        }
        let response = response.into().trim().to_string();
        if response.is_empty() {
            return Err(PlatformError::ValidationFailed(
                "Response is required".to_string(),
            ));
        }

        self.status = QueryStatus::Resolved;
        self.response = Some(response);
        self.resolved_by = Some(moderator);
        self.updated_at = Utc::now();
        Ok(())
    }
}
