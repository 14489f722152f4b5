//! Money and currency value objects.
//!
//! Amounts are decimal, never floating point. A `Money` is always positive;
//! the direction of movement is carried by the entity that owns it (a refund
//! of 500 USD holds `Money { 500, USD }`, not `-500`).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::ValidationError;

/// ISO-4217 style currency code, uppercase, three letters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    /// Parses and validates a currency code.
    pub fn new(code: impl Into<String>) -> Result<Self, ValidationError> {
        let code = code.into();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::invalid_format(
                "currency",
                "expected a three-letter ISO code",
            ));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    /// US dollars, the platform default.
    pub fn usd() -> Self {
        Self("USD".to_string())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A positive amount of a single currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Creates a money value. The amount must be strictly positive.
    pub fn new(amount: Decimal, currency: Currency) -> Result<Self, ValidationError> {
        if amount <= Decimal::ZERO {
            return Err(ValidationError::invalid_format(
                "amount",
                "must be greater than zero",
            ));
        }
        Ok(Self { amount, currency })
    }

    /// Returns the decimal amount.
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the currency.
    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    /// Checks whether two money values share a currency.
    pub fn same_currency(&self, other: &Money) -> bool {
        self.currency == other.currency
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn currency_uppercases_and_validates() {
        let c = Currency::new("usd").unwrap();
        assert_eq!(c.as_str(), "USD");
        assert!(Currency::new("US").is_err());
        assert!(Currency::new("DOLLARS").is_err());
        assert!(Currency::new("U$D").is_err());
    }

    #[test]
    fn money_rejects_zero_and_negative() {
        assert!(Money::new(Decimal::ZERO, Currency::usd()).is_err());
        assert!(Money::new(dec("-1"), Currency::usd()).is_err());
    }

    #[test]
    fn money_accepts_positive_decimals() {
        let m = Money::new(dec("2500.00"), Currency::usd()).unwrap();
        assert_eq!(m.amount(), dec("2500.00"));
        assert_eq!(m.currency().as_str(), "USD");
    }

    #[test]
    fn same_currency_compares_codes() {
        let a = Money::new(dec("1"), Currency::usd()).unwrap();
        let b = Money::new(dec("2"), Currency::usd()).unwrap();
        let c = Money::new(dec("2"), Currency::new("EUR").unwrap()).unwrap();
        assert!(a.same_currency(&b));
        assert!(!a.same_currency(&c));
    }

    #[test]
    fn money_display_includes_currency() {
        let m = Money::new(dec("10.50"), Currency::usd()).unwrap();
        assert_eq!(m.to_string(), "10.50 USD");
    }
}
