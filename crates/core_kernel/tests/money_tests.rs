//! Fee amount rules

use core_kernel::{CoreError, Currency, Money, MoneyError};
use rust_decimal_macros::dec;

#[test]
fn test_zero_and_negative_fees_are_not_chargeable() {
    for amount in [dec!(0), dec!(-250)] {
        assert!(matches!(
            Money::inr(amount).ensure_chargeable(),
            Err(MoneyError::NotPositive(_))
        ));
    }
}

#[test]
fn test_error_messages_show_the_amount() {
    let err = Money::inr(dec!(0)).ensure_chargeable().unwrap_err();
    assert_eq!(err.to_string(), "₹ 0.00 must be greater than zero");

    let err = Money::inr(dec!(99.999)).ensure_chargeable().unwrap_err();
    assert_eq!(err.to_string(), "₹ 99.999 has more than 2 decimal places");
}

#[test]
fn test_gateway_amounts_round_trip_through_paise() {
    let fee = Money::inr(dec!(4500.75));
    let paise = fee.to_minor().unwrap();
    assert_eq!(paise, 450075);
    assert_eq!(Money::from_minor(paise, Currency::INR), fee);
}

#[test]
fn test_totals_stay_in_one_currency() {
    let tuition = Money::inr(dec!(4500));
    let bus = Money::inr(dec!(750.50));
    assert_eq!(tuition.checked_add(&bus).unwrap().amount(), dec!(5250.50));

    let abroad = Money::new(dec!(10), Currency::USD);
    assert_eq!(
        tuition.checked_add(&abroad),
        Err(MoneyError::CurrencyMismatch(Currency::INR, Currency::USD))
    );
}

#[test]
fn test_stored_currency_codes() {
    assert_eq!(" inr ".parse::<Currency>(), Ok(Currency::INR));
    assert_eq!(Currency::USD.to_string(), "USD");

    let err: CoreError = "JPY".parse::<Currency>().unwrap_err().into();
    assert_eq!(err.to_string(), "Unsupported currency: JPY");
}
