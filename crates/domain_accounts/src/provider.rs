//! Payment providers - institutions that collect fees

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{EmailAddress, PhoneNumber, ProviderId};

/// Kind of institution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderCategory {
    School,
    College,
    Coaching,
    Society,
    Club,
    Other,
}

impl ProviderCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderCategory::School => "SCHOOL",
            ProviderCategory::College => "COLLEGE",
            ProviderCategory::Coaching => "COACHING",
            ProviderCategory::Society => "SOCIETY",
            ProviderCategory::Club => "CLUB",
            ProviderCategory::Other => "OTHER",
        }
    }

    /// Parses the stored representation, falling back to `Other`
    pub fn from_db(value: &str) -> Self {
        match value {
            "SCHOOL" => ProviderCategory::School,
            "COLLEGE" => ProviderCategory::College,
            "COACHING" => ProviderCategory::Coaching,
            "SOCIETY" => ProviderCategory::Society,
            "CLUB" => ProviderCategory::Club,
            _ => ProviderCategory::Other,
        }
    }
}

/// An institution collecting fees from its members
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: ProviderId,
    pub name: String,
    pub phone: PhoneNumber,
    pub email: EmailAddress,
    pub address: Option<String>,
    pub category: ProviderCategory,
    pub logo_url: Option<String>,
    /// Set by a moderator once the institution has been checked
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Provider {
    /// Creates a new, unverified provider
    pub fn new(name: impl Into<String>, phone: PhoneNumber, email: EmailAddress) -> Self {
        let now = Utc::now();
        Self {
            id: ProviderId::new(),
            name: name.into().trim().to_string(),
            phone,
            email,
            address: None,
            category: ProviderCategory::Other,
            logo_url: None,
            verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_category(mut self, category: ProviderCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Applies a profile update in place
    pub fn apply(&mut self, update: ProviderUpdate) {
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(address) = update.address {
            self.address = Some(address);
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(logo_url) = update.logo_url {
            self.logo_url = Some(logo_url);
        }
        self.updated_at = Utc::now();
    }
}

/// Profile fields a provider may change; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct ProviderUpdate {
    pub name: Option<String>,
    pub email: Option<EmailAddress>,
    pub address: Option<String>,
    pub category: Option<ProviderCategory>,
    pub logo_url: Option<String>,
}

/// Query parameters for listing providers
#[derive(Debug, Clone, Default)]
pub struct ProviderQuery {
    /// Case-insensitive substring match on the name
    pub search: Option<String>,
    /// Filter by verification flag
    pub verified: Option<bool>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ProviderQuery {
    /// Verified providers only, as shown to consumers
    pub fn verified() -> Self {
        Self {
            verified: Some(true),
            ..Default::default()
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Adds pagination to the query
    pub fn paginate(mut self, limit: u32, offset: u32) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    /// Whether a provider satisfies the filters (used by in-memory adapters)
    pub fn matches(&self, provider: &Provider) -> bool {
        if let Some(verified) = self.verified {
            if provider.verified != verified {
                return false;
            }
        }
        if let Some(ref term) = self.search {
            if !provider.name.to_lowercase().contains(&term.to_lowercase()) {
                return false;
            }
        }
        true
    }
}
