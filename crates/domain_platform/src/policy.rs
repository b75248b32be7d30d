//! Platform policy documents (terms, privacy, refunds)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ModeratorId, PolicyId};

use crate::error::PlatformError;

pub const MAX_SLUG_LEN: usize = 64;
pub const MAX_TITLE_LEN: usize = 200;

/// A public policy page, addressed by slug
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub id: PolicyId,
    pub slug: String,
    pub title: String,
    /// Markdown body
    pub body: String,
    pub updated_by: Option<ModeratorId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Policy {
    pub fn new(
        slug: &str,
        title: impl Into<String>,
        body: impl Into<String>,
        updated_by: Option<ModeratorId>,
    ) -> Result<Self, PlatformError> {
        let slug = validate_slug(slug)?;
        let title = title.into().trim().to_string();
        let body = body.into();
        validate_content(&title, &body)?;

        let now = Utc::now();
        Ok(Self {
            id: PolicyId::new(),
            slug,
            title,
            body,
            updated_by,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replaces the content, keeping identity and creation time
    pub fn revise(
        &mut self,
        title: impl Into<String>,
        body: impl Into<String>,
        moderator: ModeratorId,
    ) -> Result<(), PlatformError> {
        let title = title.into().trim().to_string();
        let body = body.into();
        validate_content(&title, &body)?;

        self.title = title;
        self.body = body;
        self.updated_by = Some(moderator);
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Normalizes and checks a slug
pub fn validate_slug(slug: &str) -> Result<String, PlatformError> {
    let slug = slug.trim();
    let valid = !slug.is_empty()
        && slug.len() <= MAX_SLUG_LEN
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(slug.to_string())
    } else {
        Err(PlatformError::InvalidSlug(slug.to_string()))
    }
}

fn validate_content(title: &str, body: &str) -> Result<(), PlatformError> {
    if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
        return Err(PlatformError::ValidationFailed(format!(
            "Policy title must be 1 to {} characters",
            MAX_TITLE_LEN
        )));
    }
    if body.trim().is_empty() {
        return Err(PlatformError::ValidationFailed(
            "Policy body is required".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_rules() {
        assert_eq!(validate_slug(" refund-policy ").unwrap(), "refund-policy");
        assert!(validate_slug("terms2").is_ok());
        assert!(validate_slug("Terms").is_err());
        assert!(validate_slug("-terms").is_err());
        assert!(validate_slug("privacy_policy").is_err());
        assert!(validate_slug("").is_err());
    }

    #[test]
    fn test_revise_keeps_identity() {
        let mut policy = Policy::new("terms", "Terms of use", "v1", None).unwrap();
        let id = policy.id;
        let moderator = ModeratorId::new();

        policy.revise("Terms of Use", "v2", moderator).unwrap();
        assert_eq!(policy.id, id);
        assert_eq!(policy.body, "v2");
        assert_eq!(policy.updated_by, Some(moderator));
    }

    #[test]
    fn test_blank_body_rejected() {
        assert!(matches!(
            Policy::new("terms", "Terms", "  ", None),
            Err(PlatformError::ValidationFailed(_))
        ));
    }
}
