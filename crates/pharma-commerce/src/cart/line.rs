//! Cart lines and the in-memory cart.

use crate::ids::ProductId;
use crate::money::Money;
use crate::CommerceError;
use serde::{Deserialize, Serialize};

fn too_large(quantity: impl std::fmt::Display) -> CommerceError {
    CommerceError::Validation(format!("quantity {} is too large", quantity))
}

/// Coerce a requested quantity to at least one.
///
/// Quantities are never truncated; one that does not fit a `u32` is refused.
pub fn normalize_quantity(quantity: i64) -> Result<u32, CommerceError> {
    u32::try_from(quantity.max(1)).map_err(|_| too_large(quantity))
}

/// One product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub base_unit_price: Money,
    /// Unit price after discount, fixed when the line was priced.
    pub final_unit_price: Money,
    /// Always `final_unit_price * quantity`.
    pub line_total: Money,
}

impl CartLine {
    pub fn new(
        product_id: ProductId,
        name: impl Into<String>,
        quantity: u32,
        base_unit_price: Money,
        final_unit_price: Money,
    ) -> Self {
        let mut line = Self {
            product_id,
            name: name.into(),
            quantity: quantity.max(1),
            base_unit_price,
            final_unit_price,
            line_total: Money::zero(),
        };
        line.update_total();
        line
    }

    /// Set quantity (clamped to at least one) and recompute the total.
    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity.max(1);
        self.update_total();
    }

    /// Replace both unit prices and recompute the total.
    pub fn reprice(&mut self, base_unit_price: Money, final_unit_price: Money) {
        self.base_unit_price = base_unit_price;
        self.final_unit_price = final_unit_price;
        self.update_total();
    }

    /// Base price times quantity.
    pub fn base_total(&self) -> Money {
        self.base_unit_price * i64::from(self.quantity)
    }

    fn update_total(&mut self) {
        self.line_total = self.final_unit_price * i64::from(self.quantity);
    }
}

/// Totals across the whole cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CartAggregates {
    /// Sum of base price times quantity.
    pub subtotal: Money,
    /// Sum of line totals.
    pub grand_total: Money,
    /// `subtotal - grand_total`.
    pub saved: Money,
}

/// The cart contents, keyed by product.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    pub fn line(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.product_id == product_id)
    }

    pub fn line_mut(&mut self, product_id: &ProductId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| &l.product_id == product_id)
    }

    /// Add `quantity` to an existing line at its stored price.
    ///
    /// Returns false when there is no line for the product. A sum that
    /// overflows leaves the line unchanged.
    pub fn increment(&mut self, product_id: &ProductId, quantity: u32) -> Result<bool, CommerceError> {
        let Some(line) = self.line_mut(product_id) else {
            return Ok(false);
        };
        let summed = line
            .quantity
            .checked_add(quantity)
            .ok_or_else(|| too_large(u64::from(line.quantity) + u64::from(quantity)))?;
        line.set_quantity(summed);
        Ok(true)
    }

    /// Insert a line, merging into an existing one for the same product.
    pub fn insert(&mut self, line: CartLine) -> Result<(), CommerceError> {
        if !self.increment(&line.product_id, line.quantity)? {
            self.lines.push(line);
        }
        Ok(())
    }

    /// Remove the line for a product. Returns whether one was there.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| &l.product_id != product_id);
        self.lines.len() < before
    }

    /// Set a line's quantity. Returns false when there is no such line.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) -> bool {
        match self.line_mut(product_id) {
            Some(line) => {
                line.set_quantity(quantity);
                true
            }
            None => false,
        }
    }

    /// Drop every line whose product appears in `settled`.
    pub fn remove_settled(&mut self, settled: &[CartLine]) {
        self.lines
            .retain(|l| !settled.iter().any(|s| s.product_id == l.product_id));
    }

    /// Totals summed from the stored line values.
    pub fn aggregates(&self) -> CartAggregates {
        let subtotal: Money = self.lines.iter().map(CartLine::base_total).sum();
        let grand_total: Money = self.lines.iter().map(|l| l.line_total).sum();
        CartAggregates {
            subtotal,
            grand_total,
            saved: subtotal - grand_total,
        }
    }

    /// Get total item count (sum of quantities).
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
