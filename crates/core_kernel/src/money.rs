//! Fee amounts
//!
//! Amounts are decimal major units (rupees) as entered by a provider. The
//! payment gateway speaks integer minor units (paise), so every amount that
//! can be charged must convert to paise without rounding.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Billing currency, as an ISO 4217 code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    INR,
    USD,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::INR => "INR",
            Currency::USD => "USD",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::INR => "₹",
            Currency::USD => "$",
        }
    }

    /// Digits after the decimal point in one minor unit (paise, cents)
    pub fn minor_digits(&self) -> u32 {
        2
    }

    fn minor_factor(&self) -> Decimal {
        Decimal::from(10_i64.pow(self.minor_digits()))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        match code.as_str() {
            "INR" => Ok(Currency::INR),
            "USD" => Ok(Currency::USD),
            _ => Err(MoneyError::UnsupportedCurrency(code)),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    #[error("Cannot combine {0} with {1}")]
    CurrencyMismatch(Currency, Currency),

    #[error("{0} must be greater than zero")]
    NotPositive(String),

    #[error("{amount} has more than {digits} decimal places")]
    SubMinorPrecision { amount: String, digits: u32 },

    #[error("{0} is too large to charge")]
    Overflow(String),
}

/// An amount in a currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    pub fn inr(amount: Decimal) -> Self {
        Self::new(amount, Currency::INR)
    }

    /// Amount from integer minor units, as reported by the gateway
    pub fn from_minor(minor: i64, currency: Currency) -> Self {
        Self::new(Decimal::from(minor) / currency.minor_factor(), currency)
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// No precision beyond the currency's minor unit
    pub fn is_minor_exact(&self) -> bool {
        self.amount.round_dp(self.currency.minor_digits()) == self.amount
    }

    /// Checks that the amount can be billed and collected online
    pub fn ensure_chargeable(&self) -> Result<(), MoneyError> {
        if !self.is_positive() {
            return Err(MoneyError::NotPositive(self.to_string()));
        }
        if !self.is_minor_exact() {
            return Err(MoneyError::SubMinorPrecision {
                amount: self.to_string(),
                digits: self.currency.minor_digits(),
            });
        }
        Ok(())
    }

    /// Converts a chargeable amount to integer minor units
    pub fn to_minor(&self) -> Result<i64, MoneyError> {
        self.ensure_chargeable()?;
        self.amount
            .checked_mul(self.currency.minor_factor())
            .and_then(|minor| minor.to_i64())
            .ok_or_else(|| MoneyError::Overflow(self.to_string()))
    }

    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch(self.currency, other.currency));
        }
        self.amount
            .checked_add(other.amount)
            .map(|sum| Money::new(sum, self.currency))
            .ok_or_else(|| MoneyError::Overflow(self.to_string()))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.currency.minor_digits().max(self.amount.scale()) as usize;
        write!(f, "{} {:.*}", self.currency.symbol(), digits, self.amount)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn minor_units_survive_conversion(minor in 1i64..10_000_000_000i64) {
            let money = Money::from_minor(minor, Currency::INR);
            prop_assert_eq!(money.to_minor(), Ok(minor));
        }
    }
}
