//! The commerce collaborator traits over the REST API.

use crate::{normalize, ClientRequestBuilder, FetchClient};
use async_trait::async_trait;
use pharma_commerce::catalog::{CatalogItem, MedicineDraft};
use pharma_commerce::orders::{Order, OrderStatus};
use pharma_commerce::remote::{
    AnalyticsApi, AnalyticsOverview, CatalogApi, OrderPayload, OrdersApi, TopSelling, User,
    UsersApi,
};
use pharma_commerce::money::Money;
use pharma_commerce::pricing::DiscountValue;
use pharma_commerce::{CommerceError, OrderId, ProductId, UserId};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tracing::{debug, warn};

fn number(amount: Decimal) -> Value {
    amount.to_f64().map_or(Value::Null, |n| json!(n))
}

fn taka(amount: Money) -> Value {
    number(amount.to_decimal())
}

/// Body of a create or update medicine request. An inactive discount is
/// sent with an empty type and a zero value.
fn medicine_body(draft: &MedicineDraft) -> Value {
    let discount = &draft.discount;
    let (kind, value) = match discount.value {
        DiscountValue::Percent(p) if discount.active => ("PERCENT", number(p.value())),
        DiscountValue::Flat(amount) if discount.active => ("FLAT", number(amount)),
        _ => ("", json!(0)),
    };
    let date = |d: Option<chrono::NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
    json!({
        "name": draft.name.trim(),
        "category": draft.category.trim(),
        "price": taka(draft.price),
        "buyPrice": taka(draft.buy_price),
        "quantity": draft.stock,
        "expiryDate": date(draft.expiry),
        "discountActive": discount.active,
        "discountType": kind,
        "discountValue": value,
        "discountStart": if discount.active { date(discount.window_start) } else { String::new() },
        "discountEnd": if discount.active { date(discount.window_end) } else { String::new() },
    })
}

/// REST implementation of every collaborator.
///
/// ```rust,ignore
/// let backend = Arc::new(RestBackend::new(client));
/// let remote = Remote::from_backend(backend);
/// ```
#[derive(Debug, Clone)]
pub struct RestBackend {
    client: FetchClient,
}

impl RestBackend {
    pub fn new(client: FetchClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &FetchClient {
        &self.client
    }

    /// Send, fail on non-2xx, read the body as loose JSON.
    async fn call(&self, request: ClientRequestBuilder<'_>) -> Result<Value, CommerceError> {
        let method = request.builder.method.as_str();
        let path = request.builder.path.clone();

        let result = match request.send().await {
            Ok(response) => response.error_for_status(),
            Err(e) => Err(e),
        };
        match result.and_then(|response| response.value()) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(method, path = %path, error = %e, "api call failed");
                Err(e.into())
            }
        }
    }

    /// Some mutation endpoints answer with a message instead of the order;
    /// fetch it then.
    async fn order_or_refetch(&self, id: &OrderId, value: Value) -> Result<Order, CommerceError> {
        match normalize::order(&value) {
            Ok(order) => Ok(order),
            Err(e) => {
                debug!(order_id = %id, reason = %e, "mutation reply is not an order, refetching");
                self.get(id).await
            }
        }
    }
}

#[async_trait]
impl CatalogApi for RestBackend {
    async fn fetch_item(&self, id: &ProductId) -> Result<CatalogItem, CommerceError> {
        let value = self.call(self.client.get(format!("/medicines/{}", id))).await?;
        normalize::catalog_item(&value)
    }

    async fn list_items(&self) -> Result<Vec<CatalogItem>, CommerceError> {
        let value = self.call(self.client.get("/medicines")).await?;
        normalize::catalog_items(&value)
    }

    async fn create_item(&self, draft: &MedicineDraft) -> Result<CatalogItem, CommerceError> {
        let request = self.client.post("/medicines").json(&medicine_body(draft))?;
        let value = self.call(request).await?;
        normalize::catalog_item(&value)
    }

    async fn update_item(&self, id: &ProductId, draft: &MedicineDraft) -> Result<CatalogItem, CommerceError> {
        let request = self
            .client
            .put(format!("/medicines/{}", id))
            .json(&medicine_body(draft))?;
        let value = self.call(request).await?;
        match normalize::catalog_item(&value) {
            Ok(item) => Ok(item),
            Err(e) => {
                debug!(product_id = %id, reason = %e, "update reply is not a medicine, refetching");
                self.fetch_item(id).await
            }
        }
    }

    async fn delete_item(&self, id: &ProductId) -> Result<(), CommerceError> {
        self.call(self.client.delete(format!("/medicines/{}", id))).await?;
        Ok(())
    }
}

#[async_trait]
impl OrdersApi for RestBackend {
    async fn create(&self, payload: &OrderPayload) -> Result<Order, CommerceError> {
        let request = self.client.post("/orders").json(payload)?;
        let value = self.call(request).await?;
        normalize::order(&value)
    }

    async fn get(&self, id: &OrderId) -> Result<Order, CommerceError> {
        let value = self.call(self.client.get(format!("/orders/{}", id))).await?;
        normalize::order(&value)
    }

    async fn list_mine(&self, user_id: &UserId) -> Result<Vec<Order>, CommerceError> {
        let value = self
            .call(self.client.get(format!("/orders/history/{}", user_id)))
            .await?;
        normalize::orders(&value)
    }

    async fn list_all(&self) -> Result<Vec<Order>, CommerceError> {
        let value = self.call(self.client.get("/orders")).await?;
        normalize::orders(&value)
    }

    async fn list_cancel_requests(&self) -> Result<Vec<Order>, CommerceError> {
        let value = self.call(self.client.get("/orders/cancel-requests")).await?;
        normalize::orders(&value)
    }

    async fn set_status(&self, id: &OrderId, status: OrderStatus) -> Result<Order, CommerceError> {
        let request = self
            .client
            .patch(format!("/orders/{}/status", id))
            .query("status", status.as_str());
        let value = self.call(request).await?;
        self.order_or_refetch(id, value).await
    }

    async fn request_cancel(
        &self,
        id: &OrderId,
        user_id: &UserId,
        reason: &str,
    ) -> Result<Order, CommerceError> {
        let request = self
            .client
            .post(format!("/orders/{}/cancel-request", id))
            .json(&json!({ "userId": user_id, "reason": reason }))?;
        let value = self.call(request).await?;
        self.order_or_refetch(id, value).await
    }

    async fn approve_cancel(&self, id: &OrderId, admin_id: &UserId) -> Result<Order, CommerceError> {
        let request = self
            .client
            .patch(format!("/orders/{}/cancel/approve", id))
            .query("adminId", admin_id);
        let value = self.call(request).await?;
        self.order_or_refetch(id, value).await
    }

    async fn reject_cancel(&self, id: &OrderId, admin_id: &UserId) -> Result<Order, CommerceError> {
        let request = self
            .client
            .patch(format!("/orders/{}/cancel/reject", id))
            .query("adminId", admin_id);
        let value = self.call(request).await?;
        self.order_or_refetch(id, value).await
    }
}

#[async_trait]
impl UsersApi for RestBackend {
    async fn list(&self) -> Result<Vec<User>, CommerceError> {
        let value = self.call(self.client.get("/admin/users")).await?;
        normalize::users(&value)
    }

    async fn delete(&self, id: &UserId) -> Result<(), CommerceError> {
        self.call(self.client.delete(format!("/admin/users/{}", id))).await?;
        Ok(())
    }
}

#[async_trait]
impl AnalyticsApi for RestBackend {
    async fn overview(&self) -> Result<AnalyticsOverview, CommerceError> {
        let value = self.call(self.client.get("/admin/analytics/overview")).await?;
        normalize::overview(&value)
    }

    async fn top_selling(&self, limit: u32) -> Result<Vec<TopSelling>, CommerceError> {
        let request = self
            .client
            .get("/admin/analytics/top-selling")
            .query("limit", limit);
        let value = self.call(request).await?;
        normalize::top_selling(&value)
    }
}
