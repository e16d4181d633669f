//! Admin input for creating or editing a medicine.

use super::CatalogItem;
use crate::ids::ProductId;
use crate::money::Money;
use crate::pricing::{DiscountDescriptor, DiscountValue};
use crate::CommerceError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The editable fields of a medicine.
///
/// Build one with [`MedicineDraft::new`] or start from a listed item with
/// [`MedicineDraft::from_item`], then call [`MedicineDraft::validate`]
/// before sending it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicineDraft {
    pub name: String,
    pub category: String,
    pub price: Money,
    pub buy_price: Money,
    pub stock: u32,
    pub expiry: Option<NaiveDate>,
    pub discount: DiscountDescriptor,
}

impl MedicineDraft {
    pub fn new(name: impl Into<String>, category: impl Into<String>, price: Money, buy_price: Money) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            price,
            buy_price,
            stock: 0,
            expiry: None,
            discount: DiscountDescriptor::none(),
        }
    }

    /// The current values of a listed item.
    pub fn from_item(item: &CatalogItem) -> Self {
        Self {
            name: item.name.clone(),
            category: item.category.clone(),
            price: item.base_price,
            buy_price: item.buy_price,
            stock: item.stock,
            expiry: item.expiry,
            discount: item.discount.clone(),
        }
    }

    pub fn with_stock(mut self, stock: u32) -> Self {
        self.stock = stock;
        self
    }

    pub fn with_expiry(mut self, expiry: NaiveDate) -> Self {
        self.expiry = Some(expiry);
        self
    }

    pub fn with_discount(mut self, discount: DiscountDescriptor) -> Self {
        self.discount = discount;
        self
    }

    /// Check the draft the way the back office form does.
    ///
    /// An inactive discount is not checked beyond what
    /// [`DiscountDescriptor::new`] already enforced.
    pub fn validate(&self) -> Result<(), CommerceError> {
        let invalid = |message: &str| Err(CommerceError::Validation(message.to_string()));
        if self.name.trim().is_empty() {
            return invalid("medicine name is required");
        }
        if self.category.trim().is_empty() {
            return invalid("category is required");
        }
        if !self.price.is_positive() {
            return invalid("price must be greater than zero");
        }
        if self.buy_price.amount_cents < 0 {
            return invalid("buy price must not be negative");
        }
        if self.buy_price > self.price {
            return invalid("buy price cannot be greater than the selling price");
        }

        let discount = &self.discount;
        if !discount.active {
            return Ok(());
        }
        if !discount.value.is_positive() {
            return invalid("an active discount needs a positive value");
        }
        if let DiscountValue::Flat(amount) = discount.value {
            if amount > self.price.to_decimal() {
                return invalid("flat discount cannot be greater than the selling price");
            }
        }
        if let (Some(start), Some(end)) = (discount.window_start, discount.window_end) {
            if start > end {
                return invalid("discount start date cannot be after its end date");
            }
        }
        Ok(())
    }

    /// The item this draft describes, as it will be listed under `id`.
    pub fn to_item(&self, id: ProductId) -> CatalogItem {
        CatalogItem {
            id,
            name: self.name.trim().to_string(),
            category: self.category.trim().to_string(),
            base_price: self.price,
            buy_price: self.buy_price,
            stock: self.stock,
            discount: self.discount.clone(),
            expiry: self.expiry,
        }
    }
}
