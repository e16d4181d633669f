//! Final unit price computation.

use super::discount::{DiscountDescriptor, DiscountValue};
use crate::money::Money;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Exact amount `value` takes off `base`, clamped to `[0, base]`.
///
/// Nothing is rounded here. An amount too large to compute takes nothing off.
fn exact_discount(base: Decimal, value: &DiscountValue) -> Decimal {
    let off = match value {
        DiscountValue::Percent(p) => base
            .checked_mul(p.value())
            .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::ZERO),
        DiscountValue::Flat(amount) => *amount,
        DiscountValue::Unrecognized => Decimal::ZERO,
    };
    off.max(Decimal::ZERO).min(base)
}

/// Price of one unit after applying `discount` on `as_of`.
///
/// Total: an ineffective or unknown discount leaves `base` unchanged, and the
/// result always lies in `[0, base]`. The discount is applied at full
/// precision and only the final price is rounded, half-up to the poisha.
pub fn compute_final_price(base: Money, discount: &DiscountDescriptor, as_of: NaiveDate) -> Money {
    if !discount.is_effective(as_of) || !base.is_positive() {
        return base;
    }
    let base_exact = base.to_decimal();
    let off = exact_discount(base_exact, &discount.value);
    Money::from_decimal(base_exact - off)
        .map(|price| price.clamp_to(base))
        .unwrap_or(base)
}

/// How much `discount` takes off `base` on `as_of`, after rounding the final
/// price. Zero when the discount is not effective. Never more than `base`.
pub fn discount_amount(base: Money, discount: &DiscountDescriptor, as_of: NaiveDate) -> Money {
    base - compute_final_price(base, discount, as_of)
}

/// A priced unit, as shown next to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub base: Money,
    pub final_price: Money,
    pub badge: Option<String>,
}

impl PriceQuote {
    pub fn new(base: Money, discount: &DiscountDescriptor, as_of: NaiveDate) -> Self {
        Self {
            base,
            final_price: compute_final_price(base, discount, as_of),
            badge: discount.badge(as_of),
        }
    }

    /// Amount saved per unit.
    pub fn savings(&self) -> Money {
        self.base - self.final_price
    }

    pub fn has_discount(&self) -> bool {
        self.final_price < self.base
    }
}
