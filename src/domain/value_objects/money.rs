//! Monetary amount value object

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::entity::ValueObject;
use crate::domain::DomainResult;
use crate::shared::DomainError;

/// Non-negative amount with two decimal places in a single ISO 4217
/// currency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: String,
}

impl ValueObject for Money {}

impl Money {
    /// Largest amount whose cent value fits in an `i64`.
    pub const MAX_AMOUNT: Decimal = Decimal::from_parts(u32::MAX, u32::MAX >> 1, 0, false, 2);

    pub fn new(amount: Decimal, currency: &str) -> DomainResult<Self> {
        let currency = normalize_currency(currency)?;
        let amount = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(DomainError::validation(format!(
                "amount must not be negative, got {}",
                amount
            )));
        }
        if amount > Self::MAX_AMOUNT {
            return Err(DomainError::validation(format!(
                "amount {} exceeds the supported maximum",
                amount
            )));
        }
        Ok(Self {
            amount: amount.abs(),
            currency,
        })
    }

    pub fn zero(currency: &str) -> DomainResult<Self> {
        Self::new(Decimal::ZERO, currency)
    }

    pub fn from_cents(cents: i64, currency: &str) -> DomainResult<Self> {
        Self::new(Decimal::new(cents, 2), currency)
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn add(&self, other: &Money) -> DomainResult<Money> {
        self.ensure_same_currency(other, "add")?;
        let sum = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| DomainError::validation("amount overflow"))?;
        Money::new(sum, &self.currency)
    }

    pub fn subtract(&self, other: &Money) -> DomainResult<Money> {
        self.ensure_same_currency(other, "subtract")?;
        if other.amount > self.amount {
            return Err(DomainError::validation(format!(
                "cannot subtract {} from {}: result would be negative",
                other, self
            )));
        }
        Money::new(self.amount - other.amount, &self.currency)
    }

    pub fn multiply(&self, factor: Decimal) -> DomainResult<Money> {
        if factor.is_sign_negative() && !factor.is_zero() {
            return Err(DomainError::validation(format!(
                "cannot multiply money by negative factor {}",
                factor
            )));
        }
        let product = self
            .amount
            .checked_mul(factor)
            .ok_or_else(|| DomainError::validation("amount overflow"))?;
        Money::new(product, &self.currency)
    }

    /// Amount in minor units, for payment gateways and integer storage.
    pub fn to_cents(&self) -> i64 {
        // bounded by MAX_AMOUNT at construction
        (self.amount * Decimal::ONE_HUNDRED)
            .trunc()
            .to_i64()
            .unwrap_or(i64::MAX)
    }

    fn ensure_same_currency(&self, other: &Money, op: &str) -> DomainResult<()> {
        if self.currency != other.currency {
            return Err(DomainError::validation(format!(
                "cannot {} {} and {}: currency mismatch",
                op, self.currency, other.currency
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} {}", self.amount, self.currency)
    }
}

fn normalize_currency(code: &str) -> DomainResult<String> {
    let code = code.trim();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(DomainError::validation(format!(
            "currency must be a 3-letter code, got '{}'",
            code
        )));
    }
    Ok(code.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd(cents: i64) -> Money {
        Money::from_cents(cents, "USD").unwrap()
    }

    #[test]
    fn amount_is_rounded_to_two_decimals() {
        let m = Money::new(Decimal::new(10005, 3), "USD").unwrap();
        assert_eq!(m.amount(), Decimal::new(1001, 2));

        let m = Money::new(Decimal::new(10004, 3), "USD").unwrap();
        assert_eq!(m.amount(), Decimal::new(1000, 2));
    }

    #[test]
    fn currency_is_validated_and_normalized() {
        assert_eq!(Money::zero("usd").unwrap().currency(), "USD");
        assert!(Money::zero("US").is_err());
        assert!(Money::zero("U5D").is_err());
        assert!(Money::zero("EURO").is_err());
    }

    #[test]
    fn negative_amount_is_rejected() {
        assert!(Money::new(Decimal::new(-1, 2), "USD").is_err());
        // rounds to zero
        assert!(Money::new(Decimal::new(-1, 3), "USD").unwrap().is_zero());
    }

    #[test]
    fn add_requires_matching_currency() {
        let five = Money::new(Decimal::from(5), "USD").unwrap();
        let three_eur = Money::new(Decimal::from(3), "EUR").unwrap();
        let err = five.add(&three_eur).unwrap_err();
        assert!(err.to_string().contains("currency mismatch"));

        let three_usd = Money::new(Decimal::from(3), "USD").unwrap();
        assert_eq!(five.add(&three_usd).unwrap(), usd(800));
    }

    #[test]
    fn subtract_never_goes_negative() {
        assert_eq!(usd(500).subtract(&usd(200)).unwrap(), usd(300));
        assert!(usd(200).subtract(&usd(500)).is_err());
        assert!(usd(500)
            .subtract(&Money::from_cents(100, "EUR").unwrap())
            .is_err());
    }

    #[test]
    fn multiply_by_hours() {
        let rate = usd(5000);
        assert_eq!(rate.multiply(Decimal::from(2)).unwrap(), usd(10000));
        assert_eq!(rate.multiply(Decimal::new(15, 1)).unwrap(), usd(7500));
        assert!(rate.multiply(Decimal::from(-1)).is_err());
    }

    #[test]
    fn cents_conversion() {
        assert_eq!(usd(12345).to_cents(), 12345);
        assert_eq!(Money::new(Decimal::new(1001, 2), "USD").unwrap().to_cents(), 1001);
    }

    #[test]
    fn display_uses_two_decimals() {
        assert_eq!(Money::new(Decimal::from(100), "USD").unwrap().to_string(), "100.00 USD");
    }
}
