//! Discount descriptors attached to catalog items.

use crate::money::{decimal_from_f64, parse_decimal, Money, CURRENCY_SYMBOL};
use crate::CommerceError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A percentage, kept exactly as given (`12.5`, `0.005`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Percent(Decimal);

impl Percent {
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Shorthand for whole-hundredth values: `from_hundredths(1250)` is 12.5%.
    pub fn from_hundredths(hundredths: i64) -> Self {
        Self(Decimal::new(hundredths, 2))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Parse "12.5" style input without rounding.
    pub fn parse(input: &str) -> Result<Self, CommerceError> {
        parse_decimal(input).map(Self)
    }

    pub fn from_f64(value: f64) -> Result<Self, CommerceError> {
        decimal_from_f64(value).map(Self)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// What the discount takes off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "UPPERCASE")]
pub enum DiscountValue {
    /// Percentage of the base price.
    Percent(Percent),
    /// Fixed amount in taka off the base price, unrounded.
    Flat(Decimal),
    /// A kind the server sent that we do not know. Never discounts.
    Unrecognized,
}

impl DiscountValue {
    /// Whether the value would take anything off.
    pub fn is_positive(&self) -> bool {
        match self {
            DiscountValue::Percent(p) => p.value() > Decimal::ZERO,
            DiscountValue::Flat(amount) => *amount > Decimal::ZERO,
            DiscountValue::Unrecognized => false,
        }
    }
}

/// Discount settings of a catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountDescriptor {
    /// Master switch.
    pub active: bool,
    /// Amount or percentage.
    pub value: DiscountValue,
    /// First day the discount applies (inclusive).
    pub window_start: Option<NaiveDate>,
    /// Last day the discount applies (inclusive).
    pub window_end: Option<NaiveDate>,
}

impl Default for DiscountDescriptor {
    fn default() -> Self {
        Self::none()
    }
}

impl DiscountDescriptor {
    /// A descriptor that never applies.
    pub fn none() -> Self {
        Self {
            active: false,
            value: DiscountValue::Unrecognized,
            window_start: None,
            window_end: None,
        }
    }

    /// Create a validated descriptor.
    ///
    /// Bounds are checked here only; descriptors read back from the server
    /// are trusted as-is.
    pub fn new(
        active: bool,
        value: DiscountValue,
        window_start: Option<NaiveDate>,
        window_end: Option<NaiveDate>,
    ) -> Result<Self, CommerceError> {
        match value {
            DiscountValue::Percent(p) if p.value() < Decimal::ZERO || p.value() > Decimal::ONE_HUNDRED => {
                return Err(CommerceError::Validation(format!(
                    "percent discount must be between 0 and 100, got {}",
                    p
                )));
            }
            DiscountValue::Flat(amount) if amount < Decimal::ZERO => {
                return Err(CommerceError::Validation(format!(
                    "flat discount must not be negative, got {}",
                    amount
                )));
            }
            _ => {}
        }
        Ok(Self {
            active,
            value,
            window_start,
            window_end,
        })
    }

    /// Active percentage discount with no window.
    pub fn percent(value: Percent) -> Result<Self, CommerceError> {
        Self::new(true, DiscountValue::Percent(value), None, None)
    }

    /// Active flat discount with no window.
    pub fn flat(value: Money) -> Result<Self, CommerceError> {
        Self::new(true, DiscountValue::Flat(value.to_decimal()), None, None)
    }

    /// Restrict to a date window.
    pub fn between(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.window_start = start;
        self.window_end = end;
        self
    }

    /// Whether `day` falls inside the window. Missing bounds are open.
    pub fn in_window(&self, day: NaiveDate) -> bool {
        self.window_start.map_or(true, |start| day >= start)
            && self.window_end.map_or(true, |end| day <= end)
    }

    /// Active, positive, and in window on `day`.
    pub fn is_effective(&self, day: NaiveDate) -> bool {
        self.active && self.value.is_positive() && self.in_window(day)
    }

    /// Short label such as "10% OFF" or "৳20 OFF", when effective.
    pub fn badge(&self, day: NaiveDate) -> Option<String> {
        if !self.is_effective(day) {
            return None;
        }
        match self.value {
            DiscountValue::Percent(p) => Some(format!("{}% OFF", p)),
            DiscountValue::Flat(amount) => Some(format!("{}{} OFF", CURRENCY_SYMBOL, amount.normalize())),
            DiscountValue::Unrecognized => None,
        }
    }
}
