//! Members - people owing fees to a provider

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{EmailAddress, MemberId, PhoneNumber, ProviderId};

/// A person on a provider's roll
///
/// The contact phone is the number a consumer must have verified to claim
/// this member (usually the guardian's).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub provider_id: ProviderId,
    pub name: String,
    pub phone: PhoneNumber,
    pub email: Option<EmailAddress>,
    /// Roll number or member code, unique within the provider
    pub reference: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    pub fn new(
        provider_id: ProviderId,
        name: impl Into<String>,
        phone: PhoneNumber,
        reference: impl AsRef<str>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: MemberId::new(),
            provider_id,
            name: name.into().trim().to_string(),
            phone,
            email: None,
            reference: normalize_reference(reference.as_ref()),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_email(mut self, email: EmailAddress) -> Self {
        self.email = Some(email);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Whether this member belongs to the given provider
    pub fn is_owned_by(&self, provider_id: ProviderId) -> bool {
        self.provider_id == provider_id
    }

    pub fn apply(&mut self, update: MemberUpdate) {
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(phone) = update.phone {
            self.phone = phone;
        }
        if let Some(email) = update.email {
            self.email = Some(email);
        }
        if let Some(reference) = update.reference {
            self.reference = normalize_reference(&reference);
        }
        if let Some(notes) = update.notes {
            self.notes = Some(notes);
        }
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemberUpdate {
    pub name: Option<String>,
    pub phone: Option<PhoneNumber>,
    pub email: Option<EmailAddress>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

/// References compare case-insensitively, so they are stored upper-cased
pub fn normalize_reference(reference: &str) -> String {
    reference.trim().to_uppercase()
}
