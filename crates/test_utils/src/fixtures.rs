//! Pre-built Test Fixtures
//!
//! Ready-to-use accounts and values. Phone numbers are already normalized so
//! fixtures can be compared directly against stored entities.

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use core_kernel::{EmailAddress, Money, PhoneNumber, ProviderId};
use domain_accounts::{Consumer, Member, Moderator, Provider, ProviderCategory};

/// Fixture for money values
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// A typical monthly tuition fee
    pub fn tuition() -> Money {
        Money::inr(dec!(4500.00))
    }

    /// An amount with paise
    pub fn with_paise() -> Money {
        Money::inr(dec!(1250.75))
    }

    /// Below the gateway's minimum order amount of one rupee
    pub fn below_gateway_minimum() -> Money {
        Money::inr(dec!(0.50))
    }
}

/// Fixture for contact details
pub struct ContactFixtures;

impl ContactFixtures {
    pub fn provider_phone() -> PhoneNumber {
        PhoneNumber::from_normalized("+919800000001")
    }

    pub fn guardian_phone() -> PhoneNumber {
        PhoneNumber::from_normalized("+919800000002")
    }

    pub fn other_phone() -> PhoneNumber {
        PhoneNumber::from_normalized("+919800000003")
    }

    pub fn moderator_phone() -> PhoneNumber {
        PhoneNumber::from_normalized("+919800000009")
    }

    pub fn provider_email() -> EmailAddress {
        EmailAddress::from_normalized("office@greenfield.school")
    }
}

/// Fixture for dates
pub struct DateFixtures;

impl DateFixtures {
    pub fn term_due() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 30).unwrap()
    }

    pub fn day_after_term_due() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, 1).unwrap()
    }
}

/// Fixture for accounts
pub struct AccountFixtures;

impl AccountFixtures {
    /// A verified school
    pub fn provider() -> Provider {
        let mut provider = Provider::new(
            "Greenfield Public School",
            ContactFixtures::provider_phone(),
            ContactFixtures::provider_email(),
        )
        .with_category(ProviderCategory::School)
        .with_address("12 Lake Road, Pune");
        provider.verified = true;
        provider
    }

    /// A guardian account whose phone matches `member`
    pub fn consumer() -> Consumer {
        Consumer::new("Meera Iyer", ContactFixtures::guardian_phone())
    }

    pub fn moderator() -> Moderator {
        Moderator::new(
            "Platform Admin",
            ContactFixtures::moderator_phone(),
            EmailAddress::from_normalized("admin@feebook.in"),
            None,
        )
    }

    /// A student reachable on the guardian phone
    pub fn member(provider_id: ProviderId) -> Member {
        Member::new(
            provider_id,
            "Arjun Iyer",
            ContactFixtures::guardian_phone(),
            "gps-2026-041",
        )
    }
}
