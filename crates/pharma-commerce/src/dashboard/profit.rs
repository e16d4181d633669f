//! Per-medicine profit over settled orders.

use super::Dashboard;
use crate::catalog::CatalogItem;
use crate::ids::ProductId;
use crate::money::Money;
use crate::orders::{Order, OrderStatus};
use crate::CommerceError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sales, cost and profit of one medicine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicineProfit {
    pub product_id: ProductId,
    pub name: String,
    pub category: String,
    pub units_sold: u64,
    /// What customers paid, at the prices on their orders.
    pub revenue: Money,
    /// Units sold at the current buy price.
    pub cost: Money,
    /// Revenue minus cost. Negative when sold below cost.
    pub profit: Money,
    /// Margin per unit at today's price. `None` once delisted.
    pub unit_margin: Option<Money>,
    pub in_stock: bool,
    pub expired: bool,
}

impl MedicineProfit {
    fn empty(product_id: ProductId, name: String) -> Self {
        Self {
            product_id,
            name,
            category: String::new(),
            units_sold: 0,
            revenue: Money::zero(),
            cost: Money::zero(),
            profit: Money::zero(),
            unit_margin: None,
            in_stock: false,
            expired: false,
        }
    }

    fn describe(&mut self, item: &CatalogItem, as_of: NaiveDate) {
        self.name = item.name.clone();
        self.category = item.category.clone();
        self.unit_margin = Some(Money::new(item.unit_margin(as_of)));
        self.in_stock = item.in_stock();
        self.expired = item.is_expired(as_of);
    }
}

/// Rows sorted by profit, highest first, with their totals.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfitReport {
    pub rows: Vec<MedicineProfit>,
    pub units_sold: u64,
    pub revenue: Money,
    pub cost: Money,
    pub profit: Money,
}

/// Only PAID and DELIVERED orders are sales. Pending ones may still fall
/// through and cancel requests may still be approved.
pub fn counts_as_sale(status: OrderStatus) -> bool {
    matches!(status, OrderStatus::Paid | OrderStatus::Delivered)
}

/// Aggregate order lines per medicine.
///
/// Cost uses each medicine's buy price from `inventory`; lines for a
/// medicine no longer listed cost nothing. With `include_unsold`, listed
/// medicines without sales get a zero row too.
pub fn profit_report(
    inventory: &[CatalogItem],
    orders: &[Order],
    as_of: NaiveDate,
    include_unsold: bool,
) -> ProfitReport {
    let listed: HashMap<&ProductId, &CatalogItem> = inventory.iter().map(|i| (&i.id, i)).collect();
    let mut rows: HashMap<ProductId, MedicineProfit> = HashMap::new();

    for line in orders
        .iter()
        .filter(|o| counts_as_sale(o.status))
        .flat_map(|o| o.lines.iter())
        .filter(|l| l.quantity > 0)
    {
        let row = rows
            .entry(line.product_id.clone())
            .or_insert_with(|| MedicineProfit::empty(line.product_id.clone(), line.name.clone()));
        let buy_price = listed
            .get(&line.product_id)
            .map_or(Money::zero(), |item| item.buy_price);
        let cost = buy_price.multiply(i64::from(line.quantity));

        row.units_sold += u64::from(line.quantity);
        row.revenue = row.revenue + line.line_total;
        row.cost = row.cost + cost;
    }

    if include_unsold {
        for item in inventory {
            rows.entry(item.id.clone())
                .or_insert_with(|| MedicineProfit::empty(item.id.clone(), item.name.clone()));
        }
    }

    let mut report = ProfitReport::default();
    for (id, mut row) in rows {
        if let Some(item) = listed.get(&id) {
            row.describe(item, as_of);
        }
        row.profit = row.revenue - row.cost;
        report.units_sold += row.units_sold;
        report.revenue = report.revenue + row.revenue;
        report.cost = report.cost + row.cost;
        report.rows.push(row);
    }
    report.profit = report.revenue - report.cost;
    report
        .rows
        .sort_by(|a, b| b.profit.cmp(&a.profit).then_with(|| a.name.cmp(&b.name)));
    report
}

impl Dashboard {
    /// Profit per medicine, from the cached inventory and order list.
    pub async fn profit_report(&self, force: bool, include_unsold: bool) -> Result<ProfitReport, CommerceError> {
        let inventory = self.inventory(force).await?;
        let orders = self.orders(force).await?;
        let today = self.clock.now().date_naive();
        Ok(profit_report(inventory.data(), orders.data(), today, include_unsold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::OrderLine;
    use crate::session::Actor;
    use crate::test_support::{clock, item, order, FakeBackend};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn line(product: &str, quantity: u32, unit_cents: i64) -> OrderLine {
        OrderLine {
            product_id: ProductId::new(product),
            name: format!("Medicine {}", product),
            quantity,
            unit_price: Money::new(unit_cents),
            line_total: Money::new(unit_cents * i64::from(quantity)),
        }
    }

    fn sale(id: &str, status: OrderStatus, lines: Vec<OrderLine>) -> Order {
        let mut o = order(id, "7", status);
        o.lines = lines;
        o
    }

    fn stocked(id: &str, price: i64, buy: i64) -> CatalogItem {
        let mut i = item(id, price);
        i.buy_price = Money::new(buy);
        i
    }

    #[test]
    fn test_profit_per_medicine() {
        let inventory = vec![stocked("P1", 1000, 700), stocked("P2", 500, 450)];
        let orders = vec![
            sale("O1", OrderStatus::Paid, vec![line("P1", 2, 1000), line("P2", 1, 500)]),
            sale("O2", OrderStatus::Delivered, vec![line("P1", 1, 900)]),
            sale("O3", OrderStatus::Cancelled, vec![line("P1", 5, 1000)]),
            sale("O4", OrderStatus::Pending, vec![line("P2", 5, 500)]),
            sale("O5", OrderStatus::CancelRequested, vec![line("P2", 5, 500)]),
        ];

        let report = profit_report(&inventory, &orders, day(15), false);
        assert_eq!(report.rows.len(), 2);

        let p1 = &report.rows[0];
        assert_eq!(p1.product_id, ProductId::new("P1"));
        assert_eq!(p1.units_sold, 3);
        assert_eq!(p1.revenue, Money::new(2900));
        assert_eq!(p1.cost, Money::new(2100));
        assert_eq!(p1.profit, Money::new(800));
        assert_eq!(p1.unit_margin, Some(Money::new(300)));

        let p2 = &report.rows[1];
        assert_eq!(p2.profit, Money::new(50));
        assert_eq!(report.revenue, Money::new(3400));
        assert_eq!(report.profit, Money::new(850));
        assert_eq!(report.units_sold, 4);
    }

    #[test]
    fn test_delisted_and_unsold_medicines() {
        let mut expired = stocked("P2", 500, 600).with_stock(0);
        expired.expiry = Some(day(1));
        let inventory = vec![stocked("P1", 1000, 700), expired];
        let orders = vec![sale("O1", OrderStatus::Paid, vec![line("P9", 1, 300)])];

        let report = profit_report(&inventory, &orders, day(15), false);
        assert_eq!(report.rows.len(), 1);
        let gone = &report.rows[0];
        assert_eq!(gone.name, "Medicine P9");
        assert_eq!(gone.cost, Money::zero());
        assert_eq!(gone.unit_margin, None);

        let report = profit_report(&inventory, &orders, day(15), true);
        assert_eq!(report.rows.len(), 3);
        let p2 = report
            .rows
            .iter()
            .find(|r| r.product_id == ProductId::new("P2"))
            .unwrap();
        assert_eq!(p2.units_sold, 0);
        assert_eq!(p2.unit_margin, Some(Money::new(-100)));
        assert!(p2.expired);
        assert!(!p2.in_stock);
        assert_eq!(report.profit, Money::new(300));
    }

    #[tokio::test]
    async fn test_dashboard_report_reads_cached_lists() {
        let backend = FakeBackend::new()
            .with_item(stocked("P1", 1000, 700))
            .with_order(order("O1", "7", OrderStatus::Delivered));
        let dash = Dashboard::new(Actor::admin("1"), backend.remote(), clock()).unwrap();

        let report = dash.profit_report(false, false).await.unwrap();
        assert_eq!(report.rows[0].profit, Money::new(300));
        dash.profit_report(false, false).await.unwrap();
        assert_eq!(backend.calls("list_items"), 1);
        assert_eq!(backend.calls("list_all"), 1);
    }
}
