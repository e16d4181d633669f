//! Customer order commands.

use anyhow::{bail, Result};
use chrono::Local;
use dialoguer::{Input, Select};

use pharma_commerce::orders::{CancelReason, Order, ReasonPreset};
use pharma_commerce::OrderId;

use super::{OrdersArgs, OrdersCommand, PresetArg};
use crate::context::Context;
use crate::output::{status_badge, truncate};

/// Run the orders command.
pub async fn run(args: OrdersArgs, ctx: &Context) -> Result<()> {
    match args.command.unwrap_or(OrdersCommand::List) {
        OrdersCommand::List => list_orders(ctx).await,
        OrdersCommand::Show { id } => show_order(&id, ctx).await,
        OrdersCommand::Cancel { id, preset, reason } => {
            cancel_order(&id, preset, reason.as_deref(), ctx).await
        }
    }
}

async fn list_orders(ctx: &Context) -> Result<()> {
    let actor = ctx.customer()?;
    let remote = ctx.remote()?;

    let spinner = ctx.output.spinner("Loading orders...");
    let fetched = ctx.orders(&remote).history(&actor).await;
    spinner.finish_and_clear();
    let mut orders = fetched?;
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    if ctx.output.is_json() {
        ctx.output.json(&orders);
        return Ok(());
    }

    ctx.output.header("Your orders");
    if orders.is_empty() {
        ctx.output.info("No orders yet.");
        return Ok(());
    }
    print_order_table(&orders, ctx);
    Ok(())
}

async fn show_order(id: &str, ctx: &Context) -> Result<()> {
    ctx.customer()?;
    let remote = ctx.remote()?;
    let order = ctx.orders(&remote).get(&OrderId::new(id)).await?;

    if ctx.output.is_json() {
        ctx.output.json(&order);
        return Ok(());
    }
    print_order(&order, ctx);
    Ok(())
}

async fn cancel_order(
    id: &str,
    preset: Option<PresetArg>,
    detail: Option<&str>,
    ctx: &Context,
) -> Result<()> {
    let actor = ctx.customer()?;
    let reason = match (preset, detail) {
        (Some(preset), detail) => CancelReason::compose(preset.into(), detail.unwrap_or(""))?,
        (None, Some(text)) => CancelReason::new(text)?,
        (None, None) if ctx.output.is_json() => bail!("--preset or --reason is required"),
        (None, None) => prompt_reason()?,
    };

    let remote = ctx.remote()?;
    let spinner = ctx.output.spinner("Sending cancel request...");
    let sent = ctx
        .orders(&remote)
        .request_cancel_by_id(&actor, &OrderId::new(id), &reason)
        .await;
    spinner.finish_and_clear();
    let order = sent?;

    if ctx.output.is_json() {
        ctx.output.json(&order);
        return Ok(());
    }
    ctx.output.success(&format!(
        "Cancellation of order {} requested: {}",
        order.id, reason
    ));
    Ok(())
}

fn prompt_reason() -> Result<CancelReason> {
    let labels: Vec<&str> = ReasonPreset::ALL.iter().map(|p| p.label()).collect();
    let choice = Select::new()
        .with_prompt("Why do you want to cancel?")
        .items(&labels)
        .default(0)
        .interact()?;
    let preset = ReasonPreset::ALL[choice];

    let detail: String = Input::new()
        .with_prompt(if preset == ReasonPreset::Other {
            "Tell us more"
        } else {
            "Anything to add? (optional)"
        })
        .allow_empty(preset != ReasonPreset::Other)
        .interact_text()?;
    Ok(CancelReason::compose(preset, &detail)?)
}

/// Orders as a table, newest first as given.
pub fn print_order_table(orders: &[Order], ctx: &Context) {
    let widths = [8, 18, 16, 6, 12];
    ctx.output
        .table_row(&["ORDER", "PLACED", "STATUS", "ITEMS", "TOTAL"], &widths);
    for order in orders {
        ctx.output.table_row(
            &[
                order.id.as_str(),
                &placed_at(order),
                &status_badge(order.status),
                &order.item_count().to_string(),
                &order.total_amount.to_string(),
            ],
            &widths,
        );
    }
}

/// One order with its lines.
pub fn print_order(order: &Order, ctx: &Context) {
    ctx.output.header(&format!("Order {}", order.id));
    ctx.output.kv("Status", &status_badge(order.status));
    ctx.output.kv("Placed", &placed_at(order));
    if let Some(name) = &order.customer.name {
        ctx.output.kv("Customer", name);
    }
    if let Some(reason) = &order.cancel_reason {
        ctx.output.kv("Cancel reason", reason);
    }
    if let Some(at) = order.cancel_requested_at {
        ctx.output
            .kv("Cancel requested", &at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string());
    }

    println!();
    let widths = [28, 5, 12, 12];
    ctx.output.table_row(&["MEDICINE", "QTY", "UNIT", "TOTAL"], &widths);
    for line in &order.lines {
        ctx.output.table_row(
            &[
                &truncate(&line.name, 28),
                &line.quantity.to_string(),
                &line.unit_price.to_string(),
                &line.line_total.to_string(),
            ],
            &widths,
        );
    }
    println!();
    ctx.output.kv("Total", &order.total_amount.to_string());
}

fn placed_at(order: &Order) -> String {
    order
        .created_at
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}
