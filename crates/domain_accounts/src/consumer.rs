//! Consumers - payers and guardians

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ConsumerId, EmailAddress, PhoneNumber};

/// An end-user account that pays fees on behalf of claimed members
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consumer {
    pub id: ConsumerId,
    pub name: String,
    /// Verified by OTP at registration
    pub phone: PhoneNumber,
    pub email: Option<EmailAddress>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Consumer {
    pub fn new(name: impl Into<String>, phone: PhoneNumber) -> Self {
        let now = Utc::now();
        Self {
            id: ConsumerId::new(),
            name: name.into().trim().to_string(),
            phone,
            email: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_email(mut self, email: EmailAddress) -> Self {
        self.email = Some(email);
        self
    }

    pub fn apply(&mut self, update: ConsumerUpdate) {
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(email) = update.email {
            self.email = Some(email);
        }
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConsumerUpdate {
    pub name: Option<String>,
    pub email: Option<EmailAddress>,
}
