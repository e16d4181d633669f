//! Contracts for the remote services.
//!
//! Transport, authentication and payload shape are the implementor's
//! concern; by the time a value crosses one of these traits it is already in
//! canonical form. A list endpoint that answers with something other than a
//! list returns [`CommerceError::MalformedPayload`].

use crate::catalog::{CatalogItem, MedicineDraft};
use crate::ids::{OrderId, ProductId, UserId};
use crate::money::Money;
use crate::orders::{Order, OrderLine, OrderStatus};
use crate::session::{CustomerContact, Role};
use crate::CommerceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default number of rows for the top-selling report.
pub const DEFAULT_TOP_SELLING_LIMIT: u32 = 5;

/// Medicine catalog.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn fetch_item(&self, id: &ProductId) -> Result<CatalogItem, CommerceError>;

    async fn list_items(&self) -> Result<Vec<CatalogItem>, CommerceError>;

    /// Admin only. The server assigns the id.
    async fn create_item(&self, draft: &MedicineDraft) -> Result<CatalogItem, CommerceError>;

    /// Admin only. Replaces every editable field.
    async fn update_item(&self, id: &ProductId, draft: &MedicineDraft) -> Result<CatalogItem, CommerceError>;

    /// Admin only.
    async fn delete_item(&self, id: &ProductId) -> Result<(), CommerceError>;
}

/// Order service.
#[async_trait]
pub trait OrdersApi: Send + Sync {
    async fn create(&self, payload: &OrderPayload) -> Result<Order, CommerceError>;

    async fn get(&self, id: &OrderId) -> Result<Order, CommerceError>;

    async fn list_mine(&self, user_id: &UserId) -> Result<Vec<Order>, CommerceError>;

    async fn list_all(&self) -> Result<Vec<Order>, CommerceError>;

    async fn list_cancel_requests(&self) -> Result<Vec<Order>, CommerceError>;

    async fn set_status(&self, id: &OrderId, status: OrderStatus) -> Result<Order, CommerceError>;

    async fn request_cancel(
        &self,
        id: &OrderId,
        user_id: &UserId,
        reason: &str,
    ) -> Result<Order, CommerceError>;

    async fn approve_cancel(&self, id: &OrderId, admin_id: &UserId) -> Result<Order, CommerceError>;

    async fn reject_cancel(&self, id: &OrderId, admin_id: &UserId) -> Result<Order, CommerceError>;
}

/// User administration.
#[async_trait]
pub trait UsersApi: Send + Sync {
    async fn list(&self) -> Result<Vec<User>, CommerceError>;

    async fn delete(&self, id: &UserId) -> Result<(), CommerceError>;
}

/// Sales analytics.
#[async_trait]
pub trait AnalyticsApi: Send + Sync {
    async fn overview(&self) -> Result<AnalyticsOverview, CommerceError>;

    async fn top_selling(&self, limit: u32) -> Result<Vec<TopSelling>, CommerceError>;
}

/// The four collaborators, shared.
#[derive(Clone)]
pub struct Remote {
    pub catalog: Arc<dyn CatalogApi>,
    pub orders: Arc<dyn OrdersApi>,
    pub users: Arc<dyn UsersApi>,
    pub analytics: Arc<dyn AnalyticsApi>,
}

impl Remote {
    /// Use one backend for every collaborator.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: CatalogApi + OrdersApi + UsersApi + AnalyticsApi + 'static,
    {
        Self {
            catalog: backend.clone(),
            orders: backend.clone(),
            users: backend.clone(),
            analytics: backend,
        }
    }
}

impl std::fmt::Debug for Remote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Remote").finish_non_exhaustive()
    }
}

/// A registered user as listed in the back office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Role,
}

/// Headline figures for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsOverview {
    pub total_revenue: Money,
    pub total_profit: Money,
    pub total_units_sold: u64,
    pub total_orders: u64,
    pub pending_orders: u64,
    pub delivered_orders: u64,
    pub cancelled_orders: u64,
}

/// One row of the top-selling report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopSelling {
    pub medicine_name: String,
    pub total_qty: u64,
    pub total_revenue: Money,
}

/// One requested product in a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemPayload {
    pub medicine_id: ProductId,
    pub quantity: u32,
}

/// Body of a create-order request.
///
/// Prices are not sent; the server prices the order itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub user_id: UserId,
    pub items: Vec<OrderItemPayload>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
}

impl OrderPayload {
    /// Missing contact fields are sent as empty strings.
    pub fn new(user_id: UserId, lines: &[OrderLine], customer: CustomerContact) -> Self {
        Self {
            user_id,
            items: lines
                .iter()
                .map(|l| OrderItemPayload {
                    medicine_id: l.product_id.clone(),
                    quantity: l.quantity,
                })
                .collect(),
            customer_name: customer.name.unwrap_or_default(),
            customer_phone: customer.phone.unwrap_or_default(),
            customer_email: customer.email.unwrap_or_default(),
        }
    }

    /// The contact details as sent.
    pub fn contact(&self) -> CustomerContact {
        let some = |s: &String| Some(s.clone()).filter(|s| !s.trim().is_empty());
        CustomerContact {
            name: some(&self.customer_name),
            phone: some(&self.customer_phone),
            email: some(&self.customer_email),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_wire_shape() {
        let line = OrderLine {
            product_id: ProductId::new("12"),
            name: "Napa".into(),
            quantity: 3,
            unit_price: Money::new(100),
            line_total: Money::new(300),
        };
        let payload = OrderPayload::new(
            UserId::new("5"),
            &[line],
            CustomerContact {
                name: Some("Rahim".into()),
                phone: Some("01700000000".into()),
                email: None,
            },
        );

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["userId"], "5");
        assert_eq!(json["items"][0]["medicineId"], "12");
        assert_eq!(json["items"][0]["quantity"], 3);
        assert_eq!(json["customerName"], "Rahim");
        assert_eq!(json["customerPhone"], "01700000000");
        assert_eq!(json["customerEmail"], "");
        assert_eq!(payload.contact().email, None);
    }
}
