//! Back-office commands.

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use dialoguer::Confirm;

use pharma_commerce::catalog::{CatalogItem, MedicineDraft};
use pharma_commerce::dashboard::{Dashboard, Loaded};
use pharma_commerce::money::{parse_decimal, Money};
use pharma_commerce::orders::OrderStatus;
use pharma_commerce::pricing::{DiscountDescriptor, DiscountValue, Percent};
use pharma_commerce::{OrderId, ProductId, UserId};

use super::orders::{print_order, print_order_table};
use super::{AdminArgs, AdminCommand, MedicineFields};
use crate::context::Context;
use crate::output::truncate;

/// Run the admin command.
pub async fn run(args: AdminArgs, ctx: &Context) -> Result<()> {
    let dashboard = ctx.dashboard(ctx.remote()?)?;

    match args.command {
        AdminCommand::Analytics => analytics(&dashboard, ctx).await,
        AdminCommand::TopSelling { limit } => top_selling(&dashboard, limit, ctx).await,
        AdminCommand::Inventory => inventory(&dashboard, ctx).await,
        AdminCommand::Orders => {
            let loaded = dashboard.orders(false).await?;
            report_warning(&loaded, ctx);
            list_orders("All orders", loaded.data(), ctx);
            Ok(())
        }
        AdminCommand::CancelRequests => {
            let loaded = dashboard.cancel_requests(false).await?;
            report_warning(&loaded, ctx);
            list_orders("Cancel requests", loaded.data(), ctx);
            Ok(())
        }
        AdminCommand::Approve { id } => {
            let order = dashboard.approve_cancel(&OrderId::new(id)).await?;
            show_result("Cancellation approved", &order, ctx);
            Ok(())
        }
        AdminCommand::Reject { id } => {
            let order = dashboard.reject_cancel(&OrderId::new(id)).await?;
            show_result("Cancellation rejected", &order, ctx);
            Ok(())
        }
        AdminCommand::SetStatus { id, status } => {
            let status: OrderStatus = status.into();
            let order = dashboard
                .force_set_status(&OrderId::new(id), status)
                .await?;
            show_result(&format!("Status set to {}", status), &order, ctx);
            Ok(())
        }
        AdminCommand::Users => users(&dashboard, ctx).await,
        AdminCommand::DeleteUser { id, yes } => {
            if !confirm(&format!("Delete user {}?", id), yes, ctx)? {
                return Ok(());
            }
            dashboard.delete_user(&UserId::new(&id)).await?;
            ctx.output.success(&format!("User {} deleted", id));
            Ok(())
        }
        AdminCommand::AddMedicine { fields } => {
            let draft = new_draft(fields)?;
            let item = dashboard.create_medicine(&draft).await?;
            show_medicine(&format!("Medicine {} created", item.id), &item, ctx);
            Ok(())
        }
        AdminCommand::UpdateMedicine { id, fields } => {
            let id = ProductId::new(id);
            let current = dashboard
                .inventory(false)
                .await?
                .data()
                .iter()
                .find(|i| i.id == id)
                .cloned()
                .ok_or_else(|| anyhow!("Medicine {} is not in the inventory", id))?;
            let draft = apply_fields(MedicineDraft::from_item(&current), fields)?;
            let item = dashboard.update_medicine(&id, &draft).await?;
            show_medicine(&format!("Medicine {} updated", id), &item, ctx);
            Ok(())
        }
        AdminCommand::Profit { all } => profit(&dashboard, all, ctx).await,
        AdminCommand::DeleteMedicine { id, yes } => {
            if !confirm(&format!("Delete medicine {}?", id), yes, ctx)? {
                return Ok(());
            }
            dashboard.delete_medicine(&ProductId::new(&id)).await?;
            ctx.output.success(&format!("Medicine {} deleted", id));
            Ok(())
        }
    }
}

/// A draft for a new medicine; name, category and both prices are required.
fn new_draft(fields: MedicineFields) -> Result<MedicineDraft> {
    let required = [
        ("--name", fields.name.is_some()),
        ("--category", fields.category.is_some()),
        ("--price", fields.price.is_some()),
        ("--buy-price", fields.buy_price.is_some()),
    ];
    if let Some((flag, _)) = required.iter().find(|(_, given)| !given) {
        bail!("{} is required", flag);
    }
    apply_fields(MedicineDraft::new("", "", Money::zero(), Money::zero()), fields)
}

/// Overwrite the fields that were given on the command line.
///
/// Any discount flag switches the discount on; unset discount flags keep
/// the current value and window.
fn apply_fields(mut draft: MedicineDraft, fields: MedicineFields) -> Result<MedicineDraft> {
    if let Some(name) = fields.name {
        draft.name = name;
    }
    if let Some(category) = fields.category {
        draft.category = category;
    }
    if let Some(price) = fields.price {
        draft.price = Money::parse(&price)?;
    }
    if let Some(buy_price) = fields.buy_price {
        draft.buy_price = Money::parse(&buy_price)?;
    }
    if let Some(stock) = fields.stock {
        draft.stock = stock;
    }
    if let Some(expiry) = fields.expiry {
        draft.expiry = Some(expiry);
    }

    if fields.no_discount {
        draft.discount = DiscountDescriptor::none();
        return Ok(draft);
    }
    let value = match (fields.percent_off, fields.flat_off) {
        (Some(percent), _) => Some(DiscountValue::Percent(Percent::parse(&percent)?)),
        (None, Some(flat)) => Some(DiscountValue::Flat(parse_decimal(&flat)?)),
        (None, None) => None,
    };
    if value.is_some() || fields.discount_from.is_some() || fields.discount_until.is_some() {
        let current = &draft.discount;
        draft.discount = DiscountDescriptor::new(
            true,
            value.unwrap_or(current.value),
            fields.discount_from.or(current.window_start),
            fields.discount_until.or(current.window_end),
        )?;
    }
    Ok(draft)
}

fn show_medicine(message: &str, item: &CatalogItem, ctx: &Context) {
    if ctx.output.is_json() {
        ctx.output.json(item);
        return;
    }
    let today = Utc::now().date_naive();
    ctx.output.success(message);
    ctx.output.kv("Name", &item.name);
    ctx.output.kv("Category", &item.category);
    ctx.output.kv("Price", &item.base_price.to_string());
    ctx.output.kv("Final", &item.final_price(today).to_string());
    ctx.output.kv("Buy price", &item.buy_price.to_string());
    ctx.output.kv("Stock", &item.stock.to_string());
    if let Some(badge) = item.badge(today) {
        ctx.output.kv("Discount", &badge);
    }
    if let Some(expiry) = item.expiry {
        ctx.output.kv("Expiry", &expiry.to_string());
    }
}

fn confirm(prompt: &str, yes: bool, ctx: &Context) -> Result<bool> {
    if yes || ctx.output.is_json() {
        return Ok(true);
    }
    let confirmed = Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?;
    if !confirmed {
        ctx.output.warn("Nothing deleted");
    }
    Ok(confirmed)
}

fn report_warning<T>(loaded: &Loaded<T>, ctx: &Context) {
    if let Some(warning) = &loaded.warning {
        ctx.output.warn(&format!("Server sent an unexpected shape: {}", warning));
    }
}

fn show_result(message: &str, order: &pharma_commerce::orders::Order, ctx: &Context) {
    if ctx.output.is_json() {
        ctx.output.json(order);
        return;
    }
    ctx.output.success(message);
    print_order(order, ctx);
}

fn list_orders(title: &str, orders: &[pharma_commerce::orders::Order], ctx: &Context) {
    if ctx.output.is_json() {
        ctx.output.json(&orders);
        return;
    }
    ctx.output.header(title);
    if orders.is_empty() {
        ctx.output.info("Nothing here.");
        return;
    }
    print_order_table(orders, ctx);
}

async fn analytics(dashboard: &Dashboard, ctx: &Context) -> Result<()> {
    let loaded = dashboard.overview(false).await?;
    report_warning(&loaded, ctx);
    let overview = loaded.data();

    if ctx.output.is_json() {
        ctx.output.json(overview);
        return Ok(());
    }
    ctx.output.header("Sales overview");
    ctx.output.kv("Revenue", &overview.total_revenue.to_string());
    ctx.output.kv("Profit", &overview.total_profit.to_string());
    ctx.output.kv("Units sold", &overview.total_units_sold.to_string());
    ctx.output.kv("Orders", &overview.total_orders.to_string());
    ctx.output.kv("Pending", &overview.pending_orders.to_string());
    ctx.output.kv("Delivered", &overview.delivered_orders.to_string());
    ctx.output.kv("Cancelled", &overview.cancelled_orders.to_string());
    Ok(())
}

async fn top_selling(dashboard: &Dashboard, limit: Option<u32>, ctx: &Context) -> Result<()> {
    let rows = dashboard.top_selling(limit).await?;

    if ctx.output.is_json() {
        ctx.output.json(&rows);
        return Ok(());
    }
    ctx.output.header("Top selling");
    let widths = [4, 28, 8, 12];
    ctx.output.table_row(&["#", "MEDICINE", "QTY", "REVENUE"], &widths);
    for (rank, row) in rows.iter().enumerate() {
        ctx.output.table_row(
            &[
                &(rank + 1).to_string(),
                &truncate(&row.medicine_name, 28),
                &row.total_qty.to_string(),
                &row.total_revenue.to_string(),
            ],
            &widths,
        );
    }
    Ok(())
}

async fn inventory(dashboard: &Dashboard, ctx: &Context) -> Result<()> {
    let loaded = dashboard.inventory(false).await?;
    report_warning(&loaded, ctx);
    let items = loaded.data();

    if ctx.output.is_json() {
        ctx.output.json(items);
        return Ok(());
    }

    let today = Utc::now().date_naive();
    ctx.output.header("Inventory");
    let widths = [6, 26, 14, 10, 10, 12, 6];
    ctx.output.table_row(
        &["ID", "MEDICINE", "CATEGORY", "PRICE", "FINAL", "DISCOUNT", "STOCK"],
        &widths,
    );
    for item in items {
        let stock = if item.is_expired(today) {
            format!("{} exp", item.stock)
        } else {
            item.stock.to_string()
        };
        ctx.output.table_row(
            &[
                item.id.as_str(),
                &truncate(&item.name, 26),
                &truncate(&item.category, 14),
                &item.base_price.to_string(),
                &item.final_price(today).to_string(),
                item.badge(today).as_deref().unwrap_or("-"),
                &stock,
            ],
            &widths,
        );
    }
    Ok(())
}

async fn profit(dashboard: &Dashboard, include_unsold: bool, ctx: &Context) -> Result<()> {
    let report = dashboard.profit_report(false, include_unsold).await?;

    if ctx.output.is_json() {
        ctx.output.json(&report);
        return Ok(());
    }
    ctx.output.header("Profit by medicine");
    if report.rows.is_empty() {
        ctx.output.info("No paid or delivered orders yet.");
        return Ok(());
    }
    let widths = [6, 26, 6, 12, 12, 12, 10, 8];
    ctx.output.table_row(
        &["ID", "MEDICINE", "SOLD", "REVENUE", "COST", "PROFIT", "MARGIN", "NOTE"],
        &widths,
    );
    for row in &report.rows {
        let margin = row.unit_margin.map_or_else(|| "-".to_string(), |m| m.to_string());
        let note = match (row.unit_margin.is_some(), row.expired, row.in_stock) {
            (false, _, _) => "delisted",
            (true, true, _) => "expired",
            (true, false, false) => "out",
            (true, false, true) => "",
        };
        ctx.output.table_row(
            &[
                row.product_id.as_str(),
                &truncate(&row.name, 26),
                &row.units_sold.to_string(),
                &row.revenue.to_string(),
                &row.cost.to_string(),
                &row.profit.to_string(),
                &margin,
                note,
            ],
            &widths,
        );
    }
    ctx.output.kv("Units sold", &report.units_sold.to_string());
    ctx.output.kv("Revenue", &report.revenue.to_string());
    ctx.output.kv("Cost", &report.cost.to_string());
    ctx.output.kv("Profit", &report.profit.to_string());
    Ok(())
}

async fn users(dashboard: &Dashboard, ctx: &Context) -> Result<()> {
    let loaded = dashboard.users(false).await?;
    report_warning(&loaded, ctx);
    let users = loaded.data();

    if ctx.output.is_json() {
        ctx.output.json(users);
        return Ok(());
    }
    ctx.output.header("Users");
    let widths = [6, 24, 28, 14, 8];
    ctx.output
        .table_row(&["ID", "NAME", "EMAIL", "PHONE", "ROLE"], &widths);
    for user in users {
        ctx.output.table_row(
            &[
                user.id.as_str(),
                &truncate(&user.name, 24),
                &truncate(&user.email, 28),
                user.phone.as_deref().unwrap_or("-"),
                user.role.as_str(),
            ],
            &widths,
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn listed() -> MedicineDraft {
        MedicineDraft::new("Napa 500mg", "Pain relief", Money::new(1000), Money::new(700))
            .with_stock(40)
            .with_discount(DiscountDescriptor::percent(Percent::from_hundredths(1000)).unwrap())
    }

    #[test]
    fn test_new_draft_requires_prices() {
        let fields = MedicineFields {
            name: Some("Seclo 20".into()),
            category: Some("Gastric".into()),
            price: Some("7.50".into()),
            ..Default::default()
        };
        let err = new_draft(fields).unwrap_err();
        assert!(err.to_string().contains("--buy-price"));
    }

    #[test]
    fn test_new_draft_parses_amounts() {
        let fields = MedicineFields {
            name: Some("Seclo 20".into()),
            category: Some("Gastric".into()),
            price: Some("7.50".into()),
            buy_price: Some("5.5".into()),
            flat_off: Some("0.75".into()),
            ..Default::default()
        };
        let draft = new_draft(fields).unwrap();
        assert_eq!(draft.price, Money::new(750));
        assert_eq!(draft.buy_price, Money::new(550));
        assert!(draft.discount.active);
        assert_eq!(draft.discount.value, DiscountValue::Flat(parse_decimal("0.75").unwrap()));
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_update_keeps_unset_fields() {
        let until = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        let fields = MedicineFields {
            stock: Some(5),
            discount_until: Some(until),
            ..Default::default()
        };
        let draft = apply_fields(listed(), fields).unwrap();
        assert_eq!(draft.name, "Napa 500mg");
        assert_eq!(draft.stock, 5);
        assert_eq!(draft.discount.value, DiscountValue::Percent(Percent::from_hundredths(1000)));
        assert_eq!(draft.discount.window_end, Some(until));
    }

    #[test]
    fn test_no_discount_and_bad_percent() {
        let off = MedicineFields {
            no_discount: true,
            ..Default::default()
        };
        assert!(!apply_fields(listed(), off).unwrap().discount.active);

        let too_much = MedicineFields {
            percent_off: Some("120".into()),
            ..Default::default()
        };
        assert!(apply_fields(listed(), too_much).is_err());
    }
}
