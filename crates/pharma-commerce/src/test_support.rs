//! In-memory collaborators for unit tests.

use crate::catalog::{CatalogItem, MedicineDraft};
use crate::ids::{OrderId, ProductId, UserId};
use crate::money::Money;
use crate::orders::{Order, OrderLine, OrderStatus};
use crate::remote::{
    AnalyticsApi, AnalyticsOverview, CatalogApi, OrderPayload, OrdersApi, Remote, TopSelling,
    User, UsersApi,
};
use crate::session::Role;
use crate::CommerceError;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use pharma_cache::{CacheError, KvStore, ManualClock, MemoryStore};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 15, 10, 0, 0).unwrap()))
}

pub fn item(id: &str, cents: i64) -> CatalogItem {
    CatalogItem::new(id, format!("Medicine {}", id), Money::new(cents)).with_stock(10)
}

pub fn order(id: &str, user: &str, status: OrderStatus) -> Order {
    let mut order = Order::new(
        id,
        user,
        vec![OrderLine {
            product_id: ProductId::new("P1"),
            name: "Medicine P1".into(),
            quantity: 1,
            unit_price: Money::new(1000),
            line_total: Money::new(1000),
        }],
    );
    order.status = status;
    order
}

fn remote_failure() -> CommerceError {
    CommerceError::Remote {
        status: 500,
        message: "injected failure".into(),
    }
}

/// One fake server behind all four collaborator traits.
#[derive(Default)]
pub struct FakeBackend {
    pub items: Mutex<HashMap<ProductId, CatalogItem>>,
    pub orders: Mutex<Vec<Order>>,
    pub users: Mutex<Vec<User>>,
    pub overview: Mutex<AnalyticsOverview>,
    pub created: Mutex<Vec<OrderPayload>>,
    /// Every read and write fails with a 500 while set.
    pub fail: AtomicBool,
    /// List endpoints answer with a non-list body while set.
    pub malformed: AtomicBool,
    /// Cancel requests are answered with the order unchanged while set.
    pub ignore_cancel_requests: AtomicBool,
    /// Writes wait here until notified while set.
    pub hold_writes: AtomicBool,
    pub release: Notify,
    pub calls: Mutex<HashMap<&'static str, usize>>,
    next_order: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn remote(self: &Arc<Self>) -> Remote {
        Remote::from_backend(self.clone())
    }

    pub fn with_item(self: Arc<Self>, item: CatalogItem) -> Arc<Self> {
        self.items.lock().unwrap().insert(item.id.clone(), item);
        self
    }

    pub fn with_order(self: Arc<Self>, order: Order) -> Arc<Self> {
        self.orders.lock().unwrap().push(order);
        self
    }

    pub fn with_user(self: Arc<Self>, id: &str, role: Role) -> Arc<Self> {
        self.users.lock().unwrap().push(User {
            id: UserId::new(id),
            name: format!("User {}", id),
            email: format!("user{}@example.com", id),
            phone: None,
            role,
        });
        self
    }

    pub fn set_failing(&self, on: bool) {
        self.fail.store(on, Ordering::SeqCst);
    }

    pub fn calls(&self, name: &'static str) -> usize {
        self.calls.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    pub fn stored_order(&self, id: &str) -> Option<Order> {
        self.orders
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.id.as_str() == id)
            .cloned()
    }

    fn enter(&self, name: &'static str) -> Result<(), CommerceError> {
        *self.calls.lock().unwrap().entry(name).or_insert(0) += 1;
        if self.fail.load(Ordering::SeqCst) {
            Err(remote_failure())
        } else {
            Ok(())
        }
    }

    async fn enter_write(&self, name: &'static str) -> Result<(), CommerceError> {
        if self.hold_writes.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        self.enter(name)
    }

    fn list_guard(&self, name: &'static str) -> Result<(), CommerceError> {
        self.enter(name)?;
        if self.malformed.load(Ordering::SeqCst) {
            return Err(CommerceError::MalformedPayload(format!("{} did not return a list", name)));
        }
        Ok(())
    }

    fn with_stored_order<F>(&self, id: &OrderId, f: F) -> Result<Order, CommerceError>
    where
        F: FnOnce(&mut Order) -> Result<(), CommerceError>,
    {
        let mut orders = self.orders.lock().unwrap();
        let order = orders
            .iter_mut()
            .find(|o| &o.id == id)
            .ok_or_else(|| CommerceError::Remote {
                status: 404,
                message: format!("order {} not found", id),
            })?;
        f(order)?;
        Ok(order.clone())
    }
}

#[async_trait]
impl CatalogApi for FakeBackend {
    async fn fetch_item(&self, id: &ProductId) -> Result<CatalogItem, CommerceError> {
        self.enter("fetch_item")?;
        self.items
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| CommerceError::Remote {
                status: 404,
                message: format!("medicine {} not found", id),
            })
    }

    async fn list_items(&self) -> Result<Vec<CatalogItem>, CommerceError> {
        self.list_guard("list_items")?;
        let mut items: Vec<_> = self.items.lock().unwrap().values().cloned().collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(items)
    }

    async fn create_item(&self, draft: &MedicineDraft) -> Result<CatalogItem, CommerceError> {
        self.enter_write("create_item").await?;
        let mut items = self.items.lock().unwrap();
        let id = ProductId::new(format!("P{}", items.len() + 100));
        let item = draft.to_item(id.clone());
        items.insert(id, item.clone());
        Ok(item)
    }

    async fn update_item(&self, id: &ProductId, draft: &MedicineDraft) -> Result<CatalogItem, CommerceError> {
        self.enter_write("update_item").await?;
        let mut items = self.items.lock().unwrap();
        if !items.contains_key(id) {
            return Err(CommerceError::Remote {
                status: 404,
                message: format!("medicine {} not found", id),
            });
        }
        let item = draft.to_item(id.clone());
        items.insert(id.clone(), item.clone());
        Ok(item)
    }

    async fn delete_item(&self, id: &ProductId) -> Result<(), CommerceError> {
        self.enter_write("delete_item").await?;
        self.items.lock().unwrap().remove(id);
        Ok(())
    }
}

#[async_trait]
impl OrdersApi for FakeBackend {
    async fn create(&self, payload: &OrderPayload) -> Result<Order, CommerceError> {
        self.enter_write("create").await?;
        let items = self.items.lock().unwrap();
        let lines = payload
            .items
            .iter()
            .map(|req| {
                let unit_price = items
                    .get(&req.medicine_id)
                    .map(|i| i.base_price)
                    .unwrap_or_default();
                OrderLine {
                    product_id: req.medicine_id.clone(),
                    name: req.medicine_id.to_string(),
                    quantity: req.quantity,
                    unit_price,
                    line_total: unit_price * i64::from(req.quantity),
                }
            })
            .collect();
        let n = self.next_order.fetch_add(1, Ordering::SeqCst) + 1;
        let mut order = Order::new(format!("N{}", n), payload.user_id.clone(), lines);
        order.customer = payload.contact();
        self.created.lock().unwrap().push(payload.clone());
        self.orders.lock().unwrap().push(order.clone());
        Ok(order)
    }

    async fn get(&self, id: &OrderId) -> Result<Order, CommerceError> {
        self.enter("get")?;
        self.with_stored_order(id, |_| Ok(()))
    }

    async fn list_mine(&self, user_id: &UserId) -> Result<Vec<Order>, CommerceError> {
        self.list_guard("list_mine")?;
        Ok(self
            .orders
            .lock()
            .unwrap()
            .iter()
            .filter(|o| &o.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Order>, CommerceError> {
        self.list_guard("list_all")?;
        Ok(self.orders.lock().unwrap().clone())
    }

    async fn list_cancel_requests(&self) -> Result<Vec<Order>, CommerceError> {
        self.list_guard("list_cancel_requests")?;
        Ok(self
            .orders
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.is_cancel_pending())
            .cloned()
            .collect())
    }

    async fn set_status(&self, id: &OrderId, status: OrderStatus) -> Result<Order, CommerceError> {
        self.enter_write("set_status").await?;
        self.with_stored_order(id, |o| {
            o.status = status;
            Ok(())
        })
    }

    async fn request_cancel(
        &self,
        id: &OrderId,
        _user_id: &UserId,
        reason: &str,
    ) -> Result<Order, CommerceError> {
        self.enter_write("request_cancel").await?;
        if self.ignore_cancel_requests.load(Ordering::SeqCst) {
            return self.with_stored_order(id, |_| Ok(()));
        }
        self.with_stored_order(id, |o| {
            o.pre_cancel_status = Some(o.status);
            o.status = OrderStatus::CancelRequested;
            o.cancel_reason = Some(reason.to_string());
            Ok(())
        })
    }

    async fn approve_cancel(&self, id: &OrderId, _admin_id: &UserId) -> Result<Order, CommerceError> {
        self.enter_write("approve_cancel").await?;
        let order = self.with_stored_order(id, |o| {
            o.status = OrderStatus::Cancelled;
            Ok(())
        })?;
        let mut items = self.items.lock().unwrap();
        for line in &order.lines {
            if let Some(item) = items.get_mut(&line.product_id) {
                item.stock += line.quantity;
            }
        }
        Ok(order)
    }

    async fn reject_cancel(&self, id: &OrderId, _admin_id: &UserId) -> Result<Order, CommerceError> {
        self.enter_write("reject_cancel").await?;
        self.with_stored_order(id, |o| {
            o.status = o.pre_cancel_status.take().unwrap_or(OrderStatus::Pending);
            o.cancel_reason = None;
            Ok(())
        })
    }
}

#[async_trait]
impl UsersApi for FakeBackend {
    async fn list(&self) -> Result<Vec<User>, CommerceError> {
        self.list_guard("list_users")?;
        Ok(self.users.lock().unwrap().clone())
    }

    async fn delete(&self, id: &UserId) -> Result<(), CommerceError> {
        self.enter_write("delete_user").await?;
        self.users.lock().unwrap().retain(|u| &u.id != id);
        Ok(())
    }
}

#[async_trait]
impl AnalyticsApi for FakeBackend {
    async fn overview(&self) -> Result<AnalyticsOverview, CommerceError> {
        self.enter("overview")?;
        Ok(self.overview.lock().unwrap().clone())
    }

    async fn top_selling(&self, limit: u32) -> Result<Vec<TopSelling>, CommerceError> {
        self.list_guard("top_selling")?;
        Ok((0..limit.min(3))
            .map(|i| TopSelling {
                medicine_name: format!("Medicine {}", i),
                total_qty: u64::from(10 - i),
                total_revenue: Money::new(1000 * i64::from(10 - i)),
            })
            .collect())
    }
}

/// A store whose writes and deletes can be made to fail.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    pub fail_set: AtomicBool,
    pub fail_delete: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl KvStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        if self.fail_set.load(Ordering::SeqCst) {
            return Err(CacheError::StoreError("disk full".into()));
        }
        self.inner.set(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(CacheError::StoreError("read-only".into()));
        }
        self.inner.delete(key)
    }
}
