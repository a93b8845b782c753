//! Type-safe price representation using decimal arithmetic.
//!
//! The store sells in Vietnamese dong only. VND has no minor unit, so prices
//! are whole numbers in practice, but the hosted `numeric` columns may carry
//! a fractional part and we keep full precision until display.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// Prices cannot be negative.
    #[error("price cannot be negative")]
    Negative,
    /// The input is not a number.
    #[error("price is not a number")]
    NotANumber,
}

/// A non-negative amount in Vietnamese dong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero dong.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// ISO 4217 currency code for every price in the store.
    pub const CURRENCY_CODE: &'static str = "VND";

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] for amounts below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount))
    }

    /// Create a price from a whole number of dong.
    #[must_use]
    pub fn from_dong(dong: u64) -> Self {
        Self(Decimal::from(dong))
    }

    /// Parse a price from form input such as `"299000"` or `"299000.50"`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a number or is negative.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let amount = s
            .trim()
            .parse::<Decimal>()
            .map_err(|_| PriceError::NotANumber)?;
        Self::new(amount)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether this price is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Format for display, e.g. `1.299.000 ₫`.
    ///
    /// Rounds to whole dong and groups thousands with dots, matching the
    /// `vi-VN` locale.
    #[must_use]
    pub fn display(&self) -> String {
        let whole = self
            .0
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .trunc()
            .to_string();
        format!("{} ₫", group_thousands(&whole))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// Percentage saved against an original (compare-at) price.
///
/// Computes `round((1 - price / original) * 100)`, rounding halves away from
/// zero. Returns `None` when there is no positive discount to show.
///
/// ```
/// use digimart_core::{Price, discount_percent};
///
/// let pct = discount_percent(Price::from_dong(100_000), Price::from_dong(150_000));
/// assert_eq!(pct, Some(33));
/// ```
#[must_use]
pub fn discount_percent(price: Price, original: Price) -> Option<u32> {
    if original.0 <= Decimal::ZERO || price.0 >= original.0 {
        return None;
    }

    let pct = (Decimal::ONE - price.0 / original.0) * Decimal::ONE_HUNDRED;
    pct.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .filter(|p| *p > 0)
}

fn group_thousands(digits: &str) -> String {
    let (sign, digits) = digits
        .strip_prefix('-')
        .map_or(("", digits), |rest| ("-", rest));

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push_str(sign);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Price::from_dong(0).display(), "0 ₫");
        assert_eq!(Price::from_dong(999).display(), "999 ₫");
        assert_eq!(Price::from_dong(1_000).display(), "1.000 ₫");
        assert_eq!(Price::from_dong(299_000).display(), "299.000 ₫");
        assert_eq!(Price::from_dong(1_299_000).display(), "1.299.000 ₫");
    }

    #[test]
    fn test_display_rounds_fraction() {
        assert_eq!(Price::parse("1499.5").unwrap().display(), "1.500 ₫");
        assert_eq!(Price::parse("1499.49").unwrap().display(), "1.499 ₫");
    }

    #[test]
    fn test_new_rejects_negative() {
        assert_eq!(Price::new(Decimal::from(-1)), Err(PriceError::Negative));
        assert!(Price::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_parse() {
        assert_eq!(Price::parse(" 299000 ").unwrap(), Price::from_dong(299_000));
        assert_eq!(Price::parse("abc"), Err(PriceError::NotANumber));
        assert_eq!(Price::parse("-5"), Err(PriceError::Negative));
    }

    #[test]
    fn test_times_and_sum() {
        let unit = Price::from_dong(50_000);
        assert_eq!(unit.times(3), Price::from_dong(150_000));
        let total: Price = [unit, Price::from_dong(70_000)].into_iter().sum();
        assert_eq!(total, Price::from_dong(120_000));
    }

    #[test]
    fn test_discount_percent() {
        assert_eq!(
            discount_percent(Price::from_dong(100_000), Price::from_dong(150_000)),
            Some(33)
        );
        assert_eq!(
            discount_percent(Price::from_dong(299_000), Price::from_dong(499_000)),
            Some(40)
        );
    }

    #[test]
    fn test_discount_rounds_half_up() {
        // 1 - 87.5/100 = 12.5%
        assert_eq!(
            discount_percent(Price::parse("87.5").unwrap(), Price::from_dong(100)),
            Some(13)
        );
    }

    #[test]
    fn test_no_discount() {
        assert_eq!(
            discount_percent(Price::from_dong(100), Price::from_dong(100)),
            None
        );
        assert_eq!(
            discount_percent(Price::from_dong(200), Price::from_dong(100)),
            None
        );
        assert_eq!(discount_percent(Price::from_dong(0), Price::ZERO), None);
    }

    #[test]
    fn test_serde_accepts_numbers() {
        let p: Price = serde_json::from_str("299000").unwrap();
        assert_eq!(p, Price::from_dong(299_000));
    }
}
