//! Platform roles

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// The three kinds of account that can hold a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// An institution collecting fees
    Provider,
    /// A payer or guardian paying on behalf of members
    Consumer,
    /// Platform staff
    Moderator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Provider => "provider",
            Role::Consumer => "consumer",
            Role::Moderator => "moderator",
        }
    }

    /// Whether accounts of this role may sign themselves up
    pub fn self_registration(&self) -> bool {
        !matches!(self, Role::Moderator)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "provider" => Ok(Role::Provider),
            "consumer" => Ok(Role::Consumer),
            "moderator" => Ok(Role::Moderator),
            other => Err(CoreError::UnknownRole(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [Role::Provider, Role::Consumer, Role::Moderator] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_role_parse_is_case_insensitive() {
        assert_eq!("Provider".parse::<Role>().unwrap(), Role::Provider);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_moderators_cannot_self_register() {
        assert!(Role::Provider.self_registration());
        assert!(Role::Consumer.self_registration());
        assert!(!Role::Moderator.self_registration());
    }
}
