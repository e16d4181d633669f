//! Shopping cart.

mod line;
mod store;

pub use line::{normalize_quantity, Cart, CartAggregates, CartLine};
pub use store::{CartStore, RepricePolicy};
