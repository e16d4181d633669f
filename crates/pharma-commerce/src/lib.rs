//! Commerce core for the pharmacy storefront.
//!
//! - **Pricing**: discount descriptors and the final unit price
//! - **Cart**: a durable cart that prices lines through the pricing engine
//! - **Orders**: order snapshots, the cancellation workflow, checkout
//! - **Dashboard**: cached back-office collections with optimistic admin actions
//!
//! Remote services are reached only through the traits in [`remote`], so
//! everything here runs against in-memory fakes in tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use pharma_commerce::prelude::*;
//!
//! let cart = CartStore::new(cache, "cart", remote.catalog.clone(), clock.clone());
//! cart.add_item(&ProductId::new("42"), 2).await?;
//! println!("Total: {}", cart.aggregates()?.grand_total);
//!
//! let orders = OrderService::new(remote.orders.clone());
//! let order = orders.checkout(&cart, Some(&actor), &contact).await?;
//! ```

pub mod error;
pub mod ids;
pub mod money;

pub mod cart;
pub mod catalog;
pub mod dashboard;
pub mod orders;
pub mod pricing;
pub mod remote;
pub mod session;

#[cfg(test)]
mod test_support;

pub use error::CommerceError;
pub use ids::*;
pub use money::Money;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CommerceError;
    pub use crate::ids::*;
    pub use crate::money::Money;

    pub use crate::pricing::{compute_final_price, DiscountDescriptor, DiscountValue, Percent, PriceQuote};

    pub use crate::catalog::{CatalogItem, MedicineDraft};

    pub use crate::cart::{Cart, CartAggregates, CartLine, CartStore, RepricePolicy};

    pub use crate::orders::{CancelReason, Order, OrderLine, OrderService, OrderStatus, ReasonPreset};

    pub use crate::dashboard::{Collection, Dashboard, Loaded, MedicineProfit, ProfitReport};

    pub use crate::remote::{
        AnalyticsApi, AnalyticsOverview, CatalogApi, OrderPayload, OrdersApi, Remote, TopSelling,
        User, UsersApi,
    };

    pub use crate::session::{Actor, CustomerContact, Role};
}
