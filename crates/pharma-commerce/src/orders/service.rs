//! Customer-side order operations.

use super::order::{Order, OrderLine};
use super::reason::CancelReason;
use crate::cart::CartStore;
use crate::ids::OrderId;
use crate::remote::{OrderPayload, OrdersApi};
use crate::session::{Actor, CustomerContact};
use crate::CommerceError;
use std::sync::Arc;
use tracing::{info, warn};

/// Places and tracks a customer's orders.
pub struct OrderService {
    orders: Arc<dyn OrdersApi>,
}

impl std::fmt::Debug for OrderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderService").finish_non_exhaustive()
    }
}

impl OrderService {
    pub fn new(orders: Arc<dyn OrdersApi>) -> Self {
        Self { orders }
    }

    /// Turn the cart into a PENDING order.
    ///
    /// Requires a signed-in actor and a non-empty cart. Once the server has
    /// accepted the order, the ordered lines are removed from the cart; a
    /// failure there is logged and does not undo the checkout.
    pub async fn checkout(
        &self,
        cart: &CartStore,
        actor: Option<&Actor>,
        contact: &CustomerContact,
    ) -> Result<Order, CommerceError> {
        let actor =
            actor.ok_or_else(|| CommerceError::Unauthorized("sign in to place an order".into()))?;
        let snapshot = cart.lines()?;
        if snapshot.is_empty() {
            return Err(CommerceError::Validation("cart is empty".into()));
        }

        let lines: Vec<OrderLine> = snapshot.iter().map(OrderLine::from).collect();
        let payload = OrderPayload::new(actor.user_id.clone(), &lines, contact.clone());
        let order = self.orders.create(&payload).await?;
        info!(
            order_id = %order.id,
            user_id = %actor.user_id,
            lines = lines.len(),
            total = %order.total_amount,
            "Order placed"
        );

        if let Err(e) = cart.settle(&snapshot).await {
            warn!(order_id = %order.id, error = %e, "Order placed but cart could not be fully cleared");
        }
        Ok(order)
    }

    /// The actor's own orders.
    pub async fn history(&self, actor: &Actor) -> Result<Vec<Order>, CommerceError> {
        self.orders.list_mine(&actor.user_id).await
    }

    pub async fn get(&self, id: &OrderId) -> Result<Order, CommerceError> {
        self.orders.get(id).await
    }

    /// Ask for `order` to be cancelled.
    ///
    /// State and ownership are checked locally first; nothing is sent for an
    /// order that cannot be cancelled. Returns the server's copy. A reply
    /// that is not CANCEL_REQUESTED means the server refused, and comes back
    /// as [`CommerceError::InvalidState`] carrying the server's status.
    pub async fn request_cancel(
        &self,
        actor: &Actor,
        order: &Order,
        reason: &CancelReason,
    ) -> Result<Order, CommerceError> {
        if order.user_id != actor.user_id && !actor.is_admin() {
            return Err(CommerceError::Unauthorized(format!(
                "order {} belongs to another customer",
                order.id
            )));
        }
        order.ensure_can_request_cancel()?;

        let confirmed = self
            .orders
            .request_cancel(&order.id, &actor.user_id, reason.as_str())
            .await?;
        if !confirmed.is_cancel_pending() {
            warn!(order_id = %order.id, status = %confirmed.status, "Server did not accept the cancel request");
            return Err(CommerceError::InvalidState {
                action: "request cancellation of",
                status: confirmed.status.as_str().to_string(),
            });
        }
        info!(order_id = %order.id, reason = %reason, "Cancellation requested");
        Ok(confirmed)
    }

    /// Fetch an order by id, then [`OrderService::request_cancel`] it.
    pub async fn request_cancel_by_id(
        &self,
        actor: &Actor,
        id: &OrderId,
        reason: &CancelReason,
    ) -> Result<Order, CommerceError> {
        let order = self.get(id).await?;
        self.request_cancel(actor, &order, reason).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::OrderStatus;
    use crate::test_support::{clock, item, order, FakeBackend, FlakyStore};
    use crate::ids::ProductId;
    use crate::money::Money;
    use pharma_cache::Cache;
    use std::sync::atomic::Ordering;

    fn service(backend: &Arc<FakeBackend>) -> OrderService {
        OrderService::new(backend.clone())
    }

    fn cart(backend: &Arc<FakeBackend>, cache: Cache) -> CartStore {
        CartStore::new(cache, "cart", backend.clone(), clock())
    }

    fn contact() -> CustomerContact {
        CustomerContact {
            name: Some("Karim".into()),
            phone: Some("01711111111".into()),
            email: Some("karim@example.com".into()),
        }
    }

    #[tokio::test]
    async fn test_checkout_places_order_and_empties_cart() {
        let backend = FakeBackend::new().with_item(item("P1", 2000));
        let cart = cart(&backend, Cache::in_memory());
        cart.add_item(&ProductId::new("P1"), 2).await.unwrap();

        let placed = service(&backend)
            .checkout(&cart, Some(&Actor::customer("7")), &contact())
            .await
            .unwrap();

        assert_eq!(placed.status, OrderStatus::Pending);
        assert_eq!(placed.total_amount, Money::new(4000));
        assert!(cart.lines().unwrap().is_empty());

        let sent = backend.created.lock().unwrap()[0].clone();
        assert_eq!(sent.user_id.as_str(), "7");
        assert_eq!(sent.items[0].quantity, 2);
        assert_eq!(sent.contact(), contact());
        assert_eq!(placed.customer, contact());
    }

    #[tokio::test]
    async fn test_checkout_guards() {
        let backend = FakeBackend::new().with_item(item("P1", 2000));
        let cart = cart(&backend, Cache::in_memory());
        let svc = service(&backend);

        let empty = svc.checkout(&cart, Some(&Actor::customer("7")), &contact()).await;
        assert!(matches!(empty, Err(CommerceError::Validation(_))));

        cart.add_item(&ProductId::new("P1"), 1).await.unwrap();
        let anonymous = svc.checkout(&cart, None, &contact()).await;
        assert!(matches!(anonymous, Err(CommerceError::Unauthorized(_))));
        assert_eq!(backend.calls("create"), 0);
    }

    #[tokio::test]
    async fn test_failed_create_keeps_cart() {
        let backend = FakeBackend::new().with_item(item("P1", 2000));
        let cart = cart(&backend, Cache::in_memory());
        cart.add_item(&ProductId::new("P1"), 1).await.unwrap();

        backend.set_failing(true);
        let err = service(&backend)
            .checkout(&cart, Some(&Actor::customer("7")), &contact())
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Remote { status: 500, .. }));
        assert_eq!(cart.item_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_checkout_succeeds_when_cart_cannot_be_cleared() {
        let flaky = FlakyStore::new();
        let backend = FakeBackend::new().with_item(item("P1", 2000));
        let cart = cart(&backend, Cache::new(flaky.clone()));
        cart.add_item(&ProductId::new("P1"), 1).await.unwrap();

        flaky.fail_delete.store(true, Ordering::SeqCst);
        flaky.fail_set.store(true, Ordering::SeqCst);
        let placed = service(&backend)
            .checkout(&cart, Some(&Actor::customer("7")), &contact())
            .await;
        assert!(placed.is_ok());
    }

    #[tokio::test]
    async fn test_request_cancel_validates_before_network() {
        let backend = FakeBackend::new().with_order(order("O1", "7", OrderStatus::Delivered));
        let svc = service(&backend);
        let delivered = backend.stored_order("O1").unwrap();

        let err = svc
            .request_cancel(&Actor::customer("7"), &delivered, &CancelReason::new("Changed my mind").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::InvalidState { .. }));
        assert_eq!(backend.calls("request_cancel"), 0);
    }

    #[tokio::test]
    async fn test_request_cancel_on_pending() {
        let backend = FakeBackend::new().with_order(order("O1", "7", OrderStatus::Pending));
        let svc = service(&backend);

        let updated = svc
            .request_cancel_by_id(
                &Actor::customer("7"),
                &OrderId::new("O1"),
                &CancelReason::new("Ordered by mistake").unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(updated.status, OrderStatus::CancelRequested);
        assert_eq!(updated.cancel_reason.as_deref(), Some("Ordered by mistake"));
    }

    #[tokio::test]
    async fn test_request_cancel_refused_by_server_surfaces_its_status() {
        let backend = FakeBackend::new().with_order(order("O1", "7", OrderStatus::Paid));
        backend.ignore_cancel_requests.store(true, Ordering::SeqCst);

        let err = service(&backend)
            .request_cancel_by_id(
                &Actor::customer("7"),
                &OrderId::new("O1"),
                &CancelReason::new("Ordered by mistake").unwrap(),
            )
            .await
            .unwrap_err();

        match err {
            CommerceError::InvalidState { status, .. } => assert_eq!(status, "PAID"),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(backend.calls("request_cancel"), 1);
        assert_eq!(backend.stored_order("O1").unwrap().status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn test_cannot_cancel_someone_elses_order() {
        let backend = FakeBackend::new().with_order(order("O1", "7", OrderStatus::Pending));
        let theirs = backend.stored_order("O1").unwrap();
        let err = service(&backend)
            .request_cancel(&Actor::customer("8"), &theirs, &CancelReason::new("Not mine at all").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_history_lists_only_mine() {
        let backend = FakeBackend::new()
            .with_order(order("O1", "7", OrderStatus::Pending))
            .with_order(order("O2", "8", OrderStatus::Paid))
            .with_order(order("O3", "7", OrderStatus::Delivered));

        let mine = service(&backend).history(&Actor::customer("7")).await.unwrap();
        let ids: Vec<_> = mine.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["O1", "O3"]);
    }
}
