//! Moderators - platform staff

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{EmailAddress, ModeratorId, PhoneNumber};

/// A platform administrator
///
/// Moderators cannot sign themselves up; an existing moderator creates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Moderator {
    pub id: ModeratorId,
    pub name: String,
    pub phone: PhoneNumber,
    pub email: EmailAddress,
    pub is_active: bool,
    pub created_by: Option<ModeratorId>,
    pub created_at: DateTime<Utc>,
}

impl Moderator {
    pub fn new(
        name: impl Into<String>,
        phone: PhoneNumber,
        email: EmailAddress,
        created_by: Option<ModeratorId>,
    ) -> Self {
        Self {
            id: ModeratorId::new(),
            name: name.into().trim().to_string(),
            phone,
            email,
            is_active: true,
            created_by,
            created_at: Utc::now(),
        }
    }
}
