//! Property-based test data generators

use fake::faker::name::en::Name;
use fake::Fake;
use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::{Money, PhoneNumber, ProviderId};
use domain_accounts::Member;

/// Ten-digit Indian mobile numbers as a user would type them
pub fn local_mobile_number() -> impl Strategy<Value = String> {
    "[6-9][0-9]{9}"
}

/// The same numbers with separators and an optional country prefix
pub fn formatted_mobile_number() -> impl Strategy<Value = (String, String)> {
    (local_mobile_number(), prop::bool::ANY).prop_map(|(digits, with_prefix)| {
        let spaced = format!("{} {} {}", &digits[..3], &digits[3..6], &digits[6..]);
        let typed = if with_prefix { format!("+91 {}", spaced) } else { spaced };
        (typed, format!("+91{}", digits))
    })
}

/// Positive rupee amounts with at most two decimal places
pub fn fee_amount() -> impl Strategy<Value = Money> {
    (1i64..10_000_000).prop_map(|paise| Money::inr(Decimal::new(paise, 2)))
}

/// A member with a random name, phone and roll number
pub fn fake_member(provider_id: ProviderId) -> Member {
    let name: String = Name().fake();
    let digits: u64 = (6_000_000_000u64..9_999_999_999).fake();
    let roll: u32 = (1..9999).fake();
    Member::new(
        provider_id,
        name,
        PhoneNumber::from_normalized(format!("+91{}", digits)),
        format!("ROLL-{:04}", roll),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::PhoneNumber;

    #[test]
    fn test_fake_member_is_valid() {
        let member = fake_member(ProviderId::new());
        assert!(!member.name.is_empty());
        assert_eq!(member.phone.as_str().len(), 13);
        assert!(member.reference.starts_with("ROLL-"));
    }

    proptest! {
        #[test]
        fn prop_formatted_numbers_normalize((typed, normalized) in formatted_mobile_number()) {
            let phone = PhoneNumber::parse(&typed, "91").unwrap();
            prop_assert_eq!(phone.as_str(), normalized.as_str());
        }

        #[test]
        fn prop_fee_amounts_are_minor_exact(amount in fee_amount()) {
            prop_assert!(amount.is_positive());
            prop_assert!(amount.is_minor_exact());
        }
    }
}
