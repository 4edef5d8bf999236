//! Amount type for handling monetary values.
//!
//! This module provides the `Amount` type which wraps `Decimal`. Amounts are parsed from user
//! input that may include a dollar sign and commas, and are always displayed as `$1,234.50`.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::de::Visitor;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

/// Represents a dollar amount.
///
/// Amounts are stored and serialized exactly (as a decimal string such as `"50.00"`). When
/// deserializing, both strings and JSON numbers are accepted so that documents which store
/// amounts as plain numbers can be read.
///
/// # Examples
///
/// ```
/// # use budgetmaster::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("$1,250.5").unwrap();
/// assert_eq!(amount.to_string(), "$1,250.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }
}

/// An error that can occur when parsing strings into `Amount` values.
pub struct AmountError(rust_decimal::Error);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Amount::default());
        }

        // "-$50.00", "$50.00", "-50.00" and "50.00" are all accepted
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let digits = unsigned.strip_prefix('$').unwrap_or(unsigned).replace(',', "");

        let value = Decimal::from_str(&digits).map_err(AmountError)?;
        Ok(Amount(if negative { -value } else { value }))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let num = self.0.abs().round_dp(2);
        write!(
            f,
            "{sign}${}",
            format_num::format_num!(",.2", num.to_f64().unwrap_or_default())
        )
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AmountVisitor)
    }
}

struct AmountVisitor;

impl Visitor<'_> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal amount as a string or number")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Amount::from_str(v).map_err(E::custom)
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(Amount(Decimal::from(v)))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(Amount(Decimal::from(v)))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Decimal::from_f64(v)
            .map(Amount)
            .ok_or_else(|| E::custom(format!("{v} cannot be represented as an amount")))
    }
}

// Arithmetic saturates at `Decimal::MAX`/`Decimal::MIN` instead of panicking on overflow.
impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, a| acc + a)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amt(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_with_dollar_sign() {
        assert_eq!(amt("$50.00").value(), Decimal::new(5000, 2));
    }

    #[test]
    fn test_parse_negative_with_dollar_sign() {
        assert_eq!(amt("-$50.00").value(), Decimal::new(-5000, 2));
    }

    #[test]
    fn test_parse_empty_string_is_zero() {
        assert!(amt("").is_zero());
        assert!(amt("   ").is_zero());
    }

    #[test]
    fn test_parse_with_commas() {
        assert_eq!(amt("$1,234,567.89").value(), Decimal::new(123456789, 2));
        assert_eq!(amt("1,000").value(), Decimal::from(1000));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(Amount::from_str("fifty").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(amt("50").to_string(), "$50.00");
        assert_eq!(amt("-50.5").to_string(), "-$50.50");
        assert_eq!(amt("60000").to_string(), "$60,000.00");
        assert_eq!(Amount::ZERO.to_string(), "$0.00");
    }

    #[test]
    fn test_equality_ignores_scale() {
        assert_eq!(amt("50"), amt("$50.00"));
    }

    #[test]
    fn test_serialize_exact_string() {
        let json = serde_json::to_string(&amt("50.00")).unwrap();
        assert_eq!(json, "\"50.00\"");
    }

    #[test]
    fn test_deserialize_string_and_numbers() {
        let a: Amount = serde_json::from_str("\"$1,000.25\"").unwrap();
        assert_eq!(a.value(), Decimal::new(100025, 2));
        let b: Amount = serde_json::from_str("50").unwrap();
        assert_eq!(b.value(), Decimal::from(50));
        let c: Amount = serde_json::from_str("12.5").unwrap();
        assert_eq!(c.value(), Decimal::new(125, 1));
        assert!(serde_json::from_str::<Amount>("true").is_err());
    }

    #[test]
    fn test_positive_negative_zero() {
        assert!(amt("0.01").is_positive());
        assert!(!Amount::ZERO.is_positive());
        assert!(!Amount::ZERO.is_negative());
        assert!(amt("-1").is_negative());
    }

    #[test]
    fn test_sum() {
        let total: Amount = [amt("10.10"), amt("20.20"), amt("-0.30")].iter().sum();
        assert_eq!(total, amt("30.00"));
    }

    #[test]
    fn test_arithmetic_saturates() {
        let max = Amount::new(Decimal::MAX);
        let min = Amount::new(Decimal::MIN);
        assert_eq!(max + max, max);
        assert_eq!(min - max, min);
        assert_eq!(min + min, min);

        let mut total = max;
        total += amt("1");
        assert_eq!(total, max);

        let total: Amount = [max, max, amt("5")].iter().sum();
        assert_eq!(total, max);
    }
}
