//! Admin actions with optimistic cache updates.
//!
//! When an action touches both the cancel-request list and the order list,
//! the cancel-request list is always entered first.

use super::{Collection, Dashboard};
use crate::catalog::{CatalogItem, MedicineDraft};
use crate::ids::{OrderId, ProductId, UserId};
use crate::orders::{Order, OrderStatus};
use crate::CommerceError;
use tracing::{info, warn};

fn replace_order(list: &[Order], updated: &Order) -> Vec<Order> {
    list.iter()
        .map(|o| if o.id == updated.id { updated.clone() } else { o.clone() })
        .collect()
}

fn without_order(list: &[Order], id: &OrderId) -> Vec<Order> {
    list.iter().filter(|o| &o.id != id).cloned().collect()
}

fn replace_item(list: &[CatalogItem], updated: &CatalogItem) -> Vec<CatalogItem> {
    list.iter()
        .map(|i| if i.id == updated.id { updated.clone() } else { i.clone() })
        .collect()
}

impl Dashboard {
    /// Find an order in the caches, or ask the server for it.
    async fn locate_order(&self, id: &OrderId) -> Result<Order, CommerceError> {
        for collection in [&self.cancel_requests, &self.orders] {
            if let Some(snapshot) = collection.cached().await {
                if let Some(order) = snapshot.data.iter().find(|o| &o.id == id) {
                    return Ok(order.clone());
                }
            }
        }
        self.remote.orders.get(id).await
    }

    /// Fold the server's copy of an order back into the order list.
    async fn reconcile_order(&self, confirmed: &Order) {
        self.orders.update(|list| replace_order(list, confirmed)).await;
        if !confirmed.is_cancel_pending() {
            self.cancel_requests
                .update(|list| without_order(list, &confirmed.id))
                .await;
        }
    }

    /// Approve a pending cancellation.
    ///
    /// The order leaves the cancel-request list and shows as CANCELLED right
    /// away. Stock changes on the server, so inventory is invalidated once
    /// the approval is confirmed.
    pub async fn approve_cancel(&self, id: &OrderId) -> Result<Order, CommerceError> {
        let mut approved = self.locate_order(id).await?;
        approved.approve_cancel(&self.admin, self.clock.now())?;

        let orders = self.remote.orders.clone();
        let admin_id = self.admin.user_id.clone();
        let confirmed = self
            .cancel_requests
            .mutate_optimistic(
                |list| without_order(list, id),
                || {
                    self.orders.mutate_optimistic(
                        |list| replace_order(list, &approved),
                        || async move { orders.approve_cancel(id, &admin_id).await },
                    )
                },
            )
            .await?;

        info!(order_id = %id, admin_id = %self.admin.user_id, "Cancellation approved");
        self.reconcile_order(&confirmed).await;
        self.invalidate(Collection::Inventory).await;
        self.invalidate(Collection::Overview).await;
        Ok(confirmed)
    }

    /// Reject a pending cancellation; the order returns to its prior status.
    pub async fn reject_cancel(&self, id: &OrderId) -> Result<Order, CommerceError> {
        let mut restored = self.locate_order(id).await?;
        restored.reject_cancel(&self.admin)?;

        let orders = self.remote.orders.clone();
        let admin_id = self.admin.user_id.clone();
        let confirmed = self
            .cancel_requests
            .mutate_optimistic(
                |list| without_order(list, id),
                || {
                    self.orders.mutate_optimistic(
                        |list| replace_order(list, &restored),
                        || async move { orders.reject_cancel(id, &admin_id).await },
                    )
                },
            )
            .await?;

        info!(order_id = %id, admin_id = %self.admin.user_id, status = %confirmed.status, "Cancellation rejected");
        self.reconcile_order(&confirmed).await;
        self.invalidate(Collection::Overview).await;
        Ok(confirmed)
    }

    /// Set an order's status directly, outside the cancellation workflow.
    ///
    /// Only PENDING, PAID and DELIVERED can be set, and cancelled orders
    /// cannot be changed. A pending cancel request leaves the cancel-request
    /// list right away. This is an admin escape hatch; it is logged but
    /// not otherwise audited.
    pub async fn force_set_status(&self, id: &OrderId, status: OrderStatus) -> Result<Order, CommerceError> {
        let mut forced = self.locate_order(id).await?;
        let was_cancel_pending = forced.is_cancel_pending();
        forced.force_set_status(&self.admin, status)?;

        let orders = self.remote.orders.clone();
        let commit = || {
            self.orders.mutate_optimistic(
                |list| replace_order(list, &forced),
                || async move { orders.set_status(id, status).await },
            )
        };
        // A forced status always ends a pending cancel request.
        let confirmed = if was_cancel_pending {
            self.cancel_requests
                .mutate_optimistic(|list| without_order(list, id), commit)
                .await?
        } else {
            commit().await?
        };

        self.reconcile_order(&confirmed).await;
        self.invalidate(Collection::Overview).await;
        Ok(confirmed)
    }

    /// Delete a user account.
    pub async fn delete_user(&self, id: &UserId) -> Result<(), CommerceError> {
        if id == &self.admin.user_id {
            return Err(CommerceError::Validation("admins cannot delete themselves".into()));
        }
        let users = self.remote.users.clone();
        self.users
            .mutate_optimistic(
                |list| list.iter().filter(|u| &u.id != id).cloned().collect(),
                || async move { users.delete(id).await },
            )
            .await?;
        info!(user_id = %id, admin_id = %self.admin.user_id, "User deleted");
        Ok(())
    }

    /// Add a medicine to the catalog.
    ///
    /// The server assigns the id, so nothing is shown until it confirms;
    /// inventory is then refetched.
    pub async fn create_medicine(&self, draft: &MedicineDraft) -> Result<CatalogItem, CommerceError> {
        draft.validate()?;
        let created = self.remote.catalog.create_item(draft).await?;
        info!(product_id = %created.id, admin_id = %self.admin.user_id, name = %created.name, "Medicine created");

        self.refresh_inventory("create").await;
        Ok(created)
    }

    /// Replace a medicine's editable fields.
    ///
    /// The cached inventory shows the edit right away and rolls back if the
    /// server refuses it.
    pub async fn update_medicine(&self, id: &ProductId, draft: &MedicineDraft) -> Result<CatalogItem, CommerceError> {
        draft.validate()?;
        let edited = draft.to_item(id.clone());

        let catalog = self.remote.catalog.clone();
        let confirmed = self
            .inventory
            .mutate_optimistic(
                |list| replace_item(list, &edited),
                || async move { catalog.update_item(id, draft).await },
            )
            .await?;
        info!(product_id = %id, admin_id = %self.admin.user_id, "Medicine updated");

        self.refresh_inventory("update").await;
        Ok(confirmed)
    }

    /// Delete a medicine from the catalog.
    ///
    /// The list drops it immediately; once the server confirms, inventory
    /// is refetched.
    pub async fn delete_medicine(&self, id: &ProductId) -> Result<(), CommerceError> {
        let catalog = self.remote.catalog.clone();
        self.inventory
            .mutate_optimistic(
                |list| list.iter().filter(|i| &i.id != id).cloned().collect(),
                || async move { catalog.delete_item(id).await },
            )
            .await?;
        info!(product_id = %id, admin_id = %self.admin.user_id, "Medicine deleted");

        self.refresh_inventory("delete").await;
        Ok(())
    }

    /// Refetch inventory after a confirmed catalog change. Figures on the
    /// overview depend on prices and stock, so it goes stale too. A failed
    /// refetch is logged and left for the next read.
    async fn refresh_inventory(&self, after: &'static str) {
        self.invalidate(Collection::Overview).await;
        self.invalidate(Collection::Inventory).await;
        if let Err(e) = self.inventory(true).await {
            warn!(error = %e, after, "Inventory refetch failed");
        }
    }
}
