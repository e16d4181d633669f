//! Discount-aware pricing.
//!
//! Pure functions only: nothing here touches the network or the clock. The
//! evaluation date is always passed in.

mod discount;
mod engine;

pub use discount::{DiscountDescriptor, DiscountValue, Percent};
pub use engine::{compute_final_price, discount_amount, PriceQuote};
