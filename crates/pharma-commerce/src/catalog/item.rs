//! Catalog item snapshot.

use crate::ids::ProductId;
use crate::money::Money;
use crate::pricing::{compute_final_price, DiscountDescriptor, PriceQuote};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A medicine as listed by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    /// Selling price before discount.
    pub base_price: Money,
    /// What the pharmacy paid per unit.
    pub buy_price: Money,
    pub stock: u32,
    #[serde(default)]
    pub discount: DiscountDescriptor,
    pub expiry: Option<NaiveDate>,
}

impl CatalogItem {
    /// Create an item with no discount, zero buy price and no expiry.
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, base_price: Money) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: String::new(),
            base_price,
            buy_price: Money::zero(),
            stock: 0,
            discount: DiscountDescriptor::none(),
            expiry: None,
        }
    }

    pub fn with_discount(mut self, discount: DiscountDescriptor) -> Self {
        self.discount = discount;
        self
    }

    pub fn with_stock(mut self, stock: u32) -> Self {
        self.stock = stock;
        self
    }

    /// Unit price after any discount effective on `as_of`.
    pub fn final_price(&self, as_of: NaiveDate) -> Money {
        compute_final_price(self.base_price, &self.discount, as_of)
    }

    /// Badge text for the listing, if a discount is effective.
    pub fn badge(&self, as_of: NaiveDate) -> Option<String> {
        self.discount.badge(as_of)
    }

    pub fn quote(&self, as_of: NaiveDate) -> PriceQuote {
        PriceQuote::new(self.base_price, &self.discount, as_of)
    }

    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Expired once the expiry date has passed. Items without one never expire.
    pub fn is_expired(&self, as_of: NaiveDate) -> bool {
        self.expiry.is_some_and(|d| d < as_of)
    }

    /// Profit per unit at the price effective on `as_of`. May be negative.
    pub fn unit_margin(&self, as_of: NaiveDate) -> i64 {
        self.final_price(as_of).amount_cents - self.buy_price.amount_cents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::Percent;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[test]
    fn test_final_price_and_badge() {
        let item = CatalogItem::new("7", "Napa 500mg", Money::new(1000)).with_discount(
            DiscountDescriptor::percent(Percent::from_hundredths(2000))
                .unwrap()
                .between(Some(day(1)), Some(day(10))),
        );

        assert_eq!(item.final_price(day(5)), Money::new(800));
        assert_eq!(item.badge(day(5)).as_deref(), Some("20% OFF"));
        assert_eq!(item.final_price(day(11)), Money::new(1000));
        assert_eq!(item.badge(day(11)), None);
    }

    #[test]
    fn test_stock_and_expiry() {
        let mut item = CatalogItem::new("1", "Seclo 20", Money::new(700));
        assert!(!item.in_stock());
        item = item.with_stock(3);
        assert!(item.in_stock());

        assert!(!item.is_expired(day(1)));
        item.expiry = Some(day(10));
        assert!(!item.is_expired(day(10)));
        assert!(item.is_expired(day(11)));
    }

    #[test]
    fn test_unit_margin() {
        let mut item = CatalogItem::new("1", "Seclo 20", Money::new(700));
        item.buy_price = Money::new(550);
        assert_eq!(item.unit_margin(day(1)), 150);
    }
}
