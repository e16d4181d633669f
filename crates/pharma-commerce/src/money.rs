//! Money type for representing monetary values.
//!
//! Uses cents-based integer representation to avoid floating-point
//! precision issues that plague monetary calculations. The storefront sells
//! in a single currency (BDT), so no currency tag is carried.

use crate::CommerceError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

/// Display symbol for the store currency.
pub const CURRENCY_SYMBOL: &str = "\u{09f3}";

/// A monetary value in poisha (hundredths of a taka).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Money {
    /// Amount in hundredths.
    pub amount_cents: i64,
}

impl Money {
    /// Create a new Money value from cents.
    pub const fn new(amount_cents: i64) -> Self {
        Self { amount_cents }
    }

    /// Create a zero amount.
    pub const fn zero() -> Self {
        Self::new(0)
    }

    /// Parse a decimal string exactly, rounding half-up to two places.
    ///
    /// ```
    /// use pharma_commerce::money::Money;
    /// assert_eq!(Money::parse("49.995").unwrap().amount_cents, 5000);
    /// assert_eq!(Money::parse("12").unwrap().amount_cents, 1200);
    /// ```
    pub fn parse(input: &str) -> Result<Self, CommerceError> {
        let amount = parse_decimal(input)?;
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(CommerceError::Validation(format!(
                "amount must not be negative: {}",
                input.trim()
            )));
        }
        Self::from_decimal(amount)
    }

    /// Round an exact amount (in taka) half-up to whole poisha.
    pub fn from_decimal(amount: Decimal) -> Result<Self, CommerceError> {
        amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.to_i64())
            .map(Self::new)
            .ok_or_else(|| CommerceError::Validation(format!("amount out of range: {}", amount)))
    }

    /// Create a Money value from a float, via its shortest text form.
    pub fn from_f64(amount: f64) -> Result<Self, CommerceError> {
        Self::from_decimal(decimal_from_f64(amount)?)
    }

    /// Check if this is zero.
    pub fn is_zero(&self) -> bool {
        self.amount_cents == 0
    }

    /// Check if this is positive.
    pub fn is_positive(&self) -> bool {
        self.amount_cents > 0
    }

    /// The exact amount in taka.
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.amount_cents, 2)
    }

    /// Format as a display string (e.g., "৳49.99").
    pub fn display(&self) -> String {
        format!("{}{}", CURRENCY_SYMBOL, self.display_amount())
    }

    /// Format as a display string without symbol (e.g., "49.99").
    pub fn display_amount(&self) -> String {
        let sign = if self.amount_cents < 0 { "-" } else { "" };
        let abs = self.amount_cents.unsigned_abs();
        format!("{}{}.{:02}", sign, abs / 100, abs % 100)
    }

    /// Multiply by a quantity, saturating instead of wrapping.
    pub fn multiply(&self, factor: i64) -> Money {
        Money::new(self.amount_cents.saturating_mul(factor))
    }

    /// Clamp into `[0, max]`.
    pub fn clamp_to(&self, max: Money) -> Money {
        Money::new(self.amount_cents.clamp(0, max.amount_cents.max(0)))
    }
}

/// Parse a plain decimal such as `"12.345"`, `".5"` or `"-3"` without rounding.
///
/// Exponents and anything that is not a digit, a single point or a leading
/// sign are rejected with [`CommerceError::Validation`].
pub fn parse_decimal(input: &str) -> Result<Decimal, CommerceError> {
    let invalid = || CommerceError::Validation(format!("not a valid amount: {:?}", input));
    let trimmed = input.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
    if (whole.is_empty() && frac.is_empty())
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !frac.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }

    let whole = if whole.is_empty() { "0" } else { whole };
    let text = if frac.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, frac)
    };
    let value = Decimal::from_str(&text).map_err(|_| invalid())?;
    Ok(if negative { -value } else { value })
}

/// A float as the decimal it prints as, so `0.285` stays `0.285`.
pub fn decimal_from_f64(value: f64) -> Result<Decimal, CommerceError> {
    if !value.is_finite() {
        return Err(CommerceError::Validation(format!("not a valid amount: {}", value)));
    }
    parse_decimal(&format!("{}", value))
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money::new(self.amount_cents.saturating_add(other.amount_cents))
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money::new(self.amount_cents.saturating_sub(other.amount_cents))
    }
}

impl Mul<i64> for Money {
    type Output = Money;

    fn mul(self, factor: i64) -> Money {
        self.multiply(factor)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}
