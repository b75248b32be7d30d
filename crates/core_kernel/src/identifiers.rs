//! Entity identifiers
//!
//! One newtype per table so a `MemberId` cannot stand in for a `ConsumerId`.
//! Every identifier is a UUID v7 and renders as the bare hyphenated UUID, the
//! same text used in JSON bodies, URL paths and database columns.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CoreError;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident => $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Human label used in error messages and logs
            pub const KIND: &'static str = $kind;

            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0.hyphenated(), f)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| CoreError::InvalidIdentifier {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

entity_id!(
    /// An institution collecting fees
    ProviderId => "provider"
);
entity_id!(ConsumerId => "consumer");
entity_id!(ModeratorId => "moderator");
entity_id!(
    /// A student or resident on a provider's roll
    MemberId => "member"
);
entity_id!(
    /// A consumer's claim on a member
    MembershipId => "membership"
);
entity_id!(FeePlanId => "fee plan");
entity_id!(
    /// A hosted-checkout order, one per payment attempt
    OrderId => "order"
);
entity_id!(TransactionId => "transaction");
entity_id!(PolicyId => "policy");
entity_id!(QueryId => "support query");
