//! Memberships - a consumer's claim on a member record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ConsumerId, MemberId, MembershipId};

use crate::consumer::Consumer;
use crate::error::AccountError;
use crate::member::Member;
use crate::provider::Provider;

/// Links a consumer to a member so the consumer can see and pay its fees
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub id: MembershipId,
    pub consumer_id: ConsumerId,
    pub member_id: MemberId,
    pub created_at: DateTime<Utc>,
}

impl Membership {
    /// Checks a claim and builds the membership
    ///
    /// A consumer may only claim a member of a verified provider, and only
    /// when the member's contact phone equals the consumer's own
    /// OTP-verified phone.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::ProviderUnavailable` when the provider is not
    /// verified or does not own the member, and `AccountError::ClaimRejected`
    /// when the phones differ
    pub fn authorize_claim(
        consumer: &Consumer,
        member: &Member,
        provider: &Provider,
    ) -> Result<Self, AccountError> {
        if !provider.verified || member.provider_id != provider.id {
            return Err(AccountError::ProviderUnavailable(provider.id.to_string()));
        }
        if consumer.phone != member.phone {
            return Err(AccountError::ClaimRejected(format!(
                "member {} is registered to a different phone number",
                member.reference
            )));
        }

        Ok(Self {
            id: MembershipId::new(),
            consumer_id: consumer.id,
            member_id: member.id,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{EmailAddress, PhoneNumber};

    fn phone(n: &str) -> PhoneNumber {
        PhoneNumber::from_normalized(n)
    }

    fn provider(verified: bool) -> Provider {
        let mut provider = Provider::new(
            "Sunrise School",
            phone("+919800000001"),
            EmailAddress::from_normalized("office@sunrise.edu"),
        );
        provider.verified = verified;
        provider
    }

    #[test]
    fn test_claim_with_matching_phone() {
        let school = provider(true);
        let consumer = Consumer::new("Ravi", phone("+919876543210"));
        let member = Member::new(school.id, "Asha", phone("+919876543210"), "R-1");

        let membership = Membership::authorize_claim(&consumer, &member, &school).unwrap();
        assert_eq!(membership.consumer_id, consumer.id);
        assert_eq!(membership.member_id, member.id);
    }

    #[test]
    fn test_claim_with_other_phone_is_rejected() {
        let school = provider(true);
        let consumer = Consumer::new("Ravi", phone("+919876543210"));
        let member = Member::new(school.id, "Asha", phone("+919811111111"), "R-1");

        let result = Membership::authorize_claim(&consumer, &member, &school);
        assert!(matches!(result, Err(AccountError::ClaimRejected(_))));
    }

    #[test]
    fn test_claim_on_unverified_provider_is_rejected() {
        let school = provider(false);
        let consumer = Consumer::new("Ravi", phone("+919876543210"));
        let member = Member::new(school.id, "Asha", phone("+919876543210"), "R-1");

        let result = Membership::authorize_claim(&consumer, &member, &school);
        assert!(matches!(result, Err(AccountError::ProviderUnavailable(_))));
    }

    #[test]
    fn test_claim_through_another_provider_is_rejected() {
        let school = provider(true);
        let other = provider(true);
        let consumer = Consumer::new("Ravi", phone("+919876543210"));
        let member = Member::new(other.id, "Asha", phone("+919876543210"), "R-1");

        let result = Membership::authorize_claim(&consumer, &member, &school);
        assert!(matches!(result, Err(AccountError::ProviderUnavailable(_))));
    }
}
