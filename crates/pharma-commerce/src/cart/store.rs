//! Durable cart.

use super::line::{normalize_quantity, Cart, CartAggregates, CartLine};
use crate::ids::ProductId;
use crate::remote::CatalogApi;
use crate::CommerceError;
use pharma_cache::{Cache, CacheError, Clock, Record};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// What happens to a line's price when its product is added again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepricePolicy {
    /// Keep the price captured when the line was created.
    #[default]
    Snapshot,
    /// Look the product up again and re-price the whole line. Falls back to
    /// the stored price when the lookup fails.
    OnAdd,
}

/// The customer's cart, persisted on every change.
///
/// The durable store is the only source of truth: every operation reads the
/// stored cart, changes it and writes it back, one operation at a time.
pub struct CartStore {
    record: Record<Cart>,
    catalog: Arc<dyn CatalogApi>,
    clock: Arc<dyn Clock>,
    policy: RepricePolicy,
    writes: Mutex<()>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("key", &self.record.key())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    pub fn new(
        cache: Cache,
        key: impl Into<String>,
        catalog: Arc<dyn CatalogApi>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            record: Record::new(cache, key, clock.clone()),
            catalog,
            clock,
            policy: RepricePolicy::default(),
            writes: Mutex::new(()),
        }
    }

    pub fn with_policy(mut self, policy: RepricePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> RepricePolicy {
        self.policy
    }

    /// Read the stored cart.
    ///
    /// A cart that no longer decodes is discarded and read as empty.
    pub fn load(&self) -> Result<Cart, CommerceError> {
        match self.record.get_or_default() {
            Ok(cart) => Ok(cart),
            Err(CacheError::SerializeError(e)) => {
                warn!(key = self.record.key(), error = %e, "Discarding unreadable cart");
                if let Err(e) = self.record.delete() {
                    warn!(key = self.record.key(), error = %e, "Could not remove unreadable cart");
                }
                Ok(Cart::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn lines(&self) -> Result<Vec<CartLine>, CommerceError> {
        Ok(self.load()?.lines)
    }

    pub fn aggregates(&self) -> Result<CartAggregates, CommerceError> {
        Ok(self.load()?.aggregates())
    }

    pub fn item_count(&self) -> Result<u64, CommerceError> {
        Ok(self.load()?.item_count())
    }

    /// Add `quantity` of a product. Quantities below one count as one.
    ///
    /// A new line is priced from the catalog as of today. An existing line
    /// grows at the price it already carries, so it succeeds even while the
    /// catalog is unreachable.
    pub async fn add_item(&self, product_id: &ProductId, quantity: i64) -> Result<CartLine, CommerceError> {
        let quantity = normalize_quantity(quantity)?;
        let _turn = self.writes.lock().await;
        let mut cart = self.load()?;
        let today = self.clock.today();

        if cart.line(product_id).is_some() {
            if self.policy == RepricePolicy::OnAdd {
                match self.catalog.fetch_item(product_id).await {
                    Ok(item) => {
                        if let Some(line) = cart.line_mut(product_id) {
                            line.reprice(item.base_price, item.final_price(today));
                        }
                    }
                    Err(e) => debug!(%product_id, error = %e, "Re-price lookup failed, keeping stored price"),
                }
            }
            cart.increment(product_id, quantity)?;
        } else {
            let item = self
                .catalog
                .fetch_item(product_id)
                .await
                .map_err(|e| CommerceError::CatalogLookup {
                    product_id: product_id.to_string(),
                    reason: e.to_string(),
                })?;
            let final_price = item.final_price(today);
            cart.insert(CartLine::new(
                product_id.clone(),
                item.name,
                quantity,
                item.base_price,
                final_price,
            ))?;
        }

        self.save(&cart)?;
        let line = cart
            .line(product_id)
            .cloned()
            .ok_or_else(|| CommerceError::Storage(format!("line {} vanished after add", product_id)))?;
        debug!(%product_id, quantity = line.quantity, total = %line.line_total, "Cart line updated");
        Ok(line)
    }

    /// Remove a product's line. Removing a missing product does nothing.
    pub async fn remove_item(&self, product_id: &ProductId) -> Result<(), CommerceError> {
        let _turn = self.writes.lock().await;
        self.remove_locked(product_id)
    }

    /// Set a line's quantity, clamped to at least one.
    ///
    /// Returns the updated line, or `None` when the product is not in the cart.
    pub async fn update_quantity(
        &self,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<Option<CartLine>, CommerceError> {
        let _turn = self.writes.lock().await;
        let mut cart = self.load()?;
        if !cart.set_quantity(product_id, normalize_quantity(quantity)?) {
            return Ok(None);
        }
        self.save(&cart)?;
        Ok(cart.line(product_id).cloned())
    }

    /// Empty the cart.
    pub async fn clear(&self) -> Result<(), CommerceError> {
        let _turn = self.writes.lock().await;
        self.clear_locked()
    }

    /// Drop the lines that were just ordered.
    ///
    /// Lines added after the snapshot was taken stay. If the bulk write
    /// fails, each ordered line is removed on its own; the error reports how
    /// many could not be.
    pub async fn settle(&self, ordered: &[CartLine]) -> Result<(), CommerceError> {
        let _turn = self.writes.lock().await;
        let bulk = self.load().and_then(|mut cart| {
            cart.remove_settled(ordered);
            if cart.is_empty() {
                self.clear_locked()
            } else {
                self.save(&cart)
            }
        });

        let Err(e) = bulk else {
            info!(lines = ordered.len(), "Cart settled after checkout");
            return Ok(());
        };

        warn!(error = %e, "Bulk cart settle failed, removing ordered lines one by one");
        let failed = ordered
            .iter()
            .filter(|line| match self.remove_locked(&line.product_id) {
                Ok(()) => false,
                Err(e) => {
                    warn!(product_id = %line.product_id, error = %e, "Could not remove ordered line");
                    true
                }
            })
            .count();

        if failed == 0 {
            Ok(())
        } else {
            Err(CommerceError::Storage(format!(
                "{} of {} ordered lines are still in the cart",
                failed,
                ordered.len()
            )))
        }
    }

    fn remove_locked(&self, product_id: &ProductId) -> Result<(), CommerceError> {
        let mut cart = self.load()?;
        if cart.remove(product_id) {
            self.save(&cart)?;
        }
        Ok(())
    }

    fn clear_locked(&self) -> Result<(), CommerceError> {
        if let Err(e) = self.record.delete() {
            warn!(key = self.record.key(), error = %e, "Cart delete failed, writing an empty cart");
            self.save(&Cart::default())?;
        }
        Ok(())
    }

    fn save(&self, cart: &Cart) -> Result<(), CommerceError> {
        self.record.save(cart)?;
        Ok(())
    }
}
