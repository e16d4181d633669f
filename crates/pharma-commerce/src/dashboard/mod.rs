//! Back-office dashboard state.
//!
//! One [`Dashboard`] per process holds five time-boxed collections
//! (inventory, orders, cancel requests, users, analytics overview). Reads
//! are served from cache while fresh; admin actions update the cache first
//! and roll back if the server refuses. The profit report is computed from
//! the cached inventory and order lists.

mod actions;
mod profit;

pub use profit::{counts_as_sale, profit_report, MedicineProfit, ProfitReport};

use crate::catalog::CatalogItem;
use crate::orders::Order;
use crate::remote::{AnalyticsOverview, Remote, TopSelling, User, DEFAULT_TOP_SELLING_LIMIT};
use crate::session::Actor;
use crate::CommerceError;
use pharma_cache::{Clock, Snapshot, TimedCollection, DEFAULT_TTL};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// The cached collections, for targeted invalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Inventory,
    Orders,
    CancelRequests,
    Users,
    Overview,
}

/// Result of a dashboard read.
///
/// A list endpoint that answered with the wrong shape yields empty data and
/// a `warning` instead of an error, so the view can still render.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub snapshot: Snapshot<T>,
    pub warning: Option<CommerceError>,
}

impl<T> Loaded<T> {
    pub fn data(&self) -> &T {
        &self.snapshot.data
    }
}

/// Cached back-office state for one admin.
pub struct Dashboard {
    admin: Actor,
    remote: Remote,
    clock: Arc<dyn Clock>,
    inventory: TimedCollection<Vec<CatalogItem>>,
    orders: TimedCollection<Vec<Order>>,
    cancel_requests: TimedCollection<Vec<Order>>,
    users: TimedCollection<Vec<User>>,
    overview: TimedCollection<AnalyticsOverview>,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("admin", &self.admin.user_id)
            .field("ttl", &self.inventory.ttl())
            .finish_non_exhaustive()
    }
}

impl Dashboard {
    /// Build a dashboard for `admin`, with the default 60 second TTL.
    pub fn new(admin: Actor, remote: Remote, clock: Arc<dyn Clock>) -> Result<Self, CommerceError> {
        Self::with_ttl(admin, remote, clock, DEFAULT_TTL)
    }

    pub fn with_ttl(
        admin: Actor,
        remote: Remote,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Result<Self, CommerceError> {
        admin.require_admin("opening the dashboard")?;
        Ok(Self {
            inventory: TimedCollection::new("inventory", ttl, clock.clone()),
            orders: TimedCollection::new("orders", ttl, clock.clone()),
            cancel_requests: TimedCollection::new("cancel-requests", ttl, clock.clone()),
            users: TimedCollection::new("users", ttl, clock.clone()),
            overview: TimedCollection::new("analytics-overview", ttl, clock.clone()),
            admin,
            remote,
            clock,
        })
    }

    pub fn admin(&self) -> &Actor {
        &self.admin
    }

    pub async fn inventory(&self, force: bool) -> Result<Loaded<Vec<CatalogItem>>, CommerceError> {
        let catalog = self.remote.catalog.clone();
        self.load(&self.inventory, force, || async move { catalog.list_items().await })
            .await
    }

    pub async fn orders(&self, force: bool) -> Result<Loaded<Vec<Order>>, CommerceError> {
        let orders = self.remote.orders.clone();
        self.load(&self.orders, force, || async move { orders.list_all().await })
            .await
    }

    pub async fn cancel_requests(&self, force: bool) -> Result<Loaded<Vec<Order>>, CommerceError> {
        let orders = self.remote.orders.clone();
        self.load(&self.cancel_requests, force, || async move {
            orders.list_cancel_requests().await
        })
        .await
    }

    pub async fn users(&self, force: bool) -> Result<Loaded<Vec<User>>, CommerceError> {
        let users = self.remote.users.clone();
        self.load(&self.users, force, || async move { users.list().await })
            .await
    }

    pub async fn overview(&self, force: bool) -> Result<Loaded<AnalyticsOverview>, CommerceError> {
        let analytics = self.remote.analytics.clone();
        self.load(&self.overview, force, || async move { analytics.overview().await })
            .await
    }

    /// Best sellers, straight from the server. Not cached.
    pub async fn top_selling(&self, limit: Option<u32>) -> Result<Vec<TopSelling>, CommerceError> {
        let limit = limit.unwrap_or(DEFAULT_TOP_SELLING_LIMIT).max(1);
        self.remote.analytics.top_selling(limit).await
    }

    /// Force the next read of `which` to refetch.
    pub async fn invalidate(&self, which: Collection) {
        match which {
            Collection::Inventory => self.inventory.invalidate().await,
            Collection::Orders => self.orders.invalidate().await,
            Collection::CancelRequests => self.cancel_requests.invalidate().await,
            Collection::Users => self.users.invalidate().await,
            Collection::Overview => self.overview.invalidate().await,
        }
    }

    pub async fn invalidate_all(&self) {
        for which in [
            Collection::Inventory,
            Collection::Orders,
            Collection::CancelRequests,
            Collection::Users,
            Collection::Overview,
        ] {
            self.invalidate(which).await;
        }
    }

    async fn load<T, F, Fut>(
        &self,
        collection: &TimedCollection<T>,
        force: bool,
        fetch: F,
    ) -> Result<Loaded<T>, CommerceError>
    where
        T: Default + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, CommerceError>>,
    {
        match collection.get(force, fetch).await {
            Ok(snapshot) => Ok(Loaded {
                snapshot,
                warning: None,
            }),
            Err(CommerceError::MalformedPayload(message)) => {
                warn!(collection = collection.name(), %message, "Unusable payload, showing nothing");
                Ok(Loaded {
                    snapshot: Snapshot {
                        data: Arc::new(T::default()),
                        fetched_at: self.clock.now(),
                    },
                    warning: Some(CommerceError::MalformedPayload(message)),
                })
            }
            Err(e) => Err(e),
        }
    }
}
