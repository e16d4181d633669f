//! Cart commands.

use anyhow::Result;
use dialoguer::Confirm;

use pharma_commerce::cart::CartStore;
use pharma_commerce::ProductId;

use super::{CartArgs, CartCommand};
use crate::context::Context;
use crate::output::truncate;

/// Run the cart command.
pub async fn run(args: CartArgs, ctx: &Context) -> Result<()> {
    let remote = ctx.remote()?;
    let cart = ctx.cart(&remote)?;

    match args.command.unwrap_or(CartCommand::Show) {
        CartCommand::Show => show_cart(&cart, ctx),
        CartCommand::Add {
            product_id,
            quantity,
        } => {
            let spinner = ctx.output.spinner("Looking up medicine...");
            let added = cart.add_item(&ProductId::new(product_id), quantity).await;
            spinner.finish_and_clear();
            let line = added?;
            ctx.output.success(&format!(
                "{} x{} in cart ({} each)",
                line.name, line.quantity, line.final_unit_price
            ));
            show_cart(&cart, ctx)
        }
        CartCommand::Set {
            product_id,
            quantity,
        } => {
            match cart.update_quantity(&ProductId::new(&product_id), quantity).await? {
                Some(line) => ctx
                    .output
                    .success(&format!("{} set to {}", line.name, line.quantity)),
                None => ctx.output.warn(&format!("{} is not in the cart", product_id)),
            }
            show_cart(&cart, ctx)
        }
        CartCommand::Remove { product_id } => {
            cart.remove_item(&ProductId::new(&product_id)).await?;
            ctx.output.success(&format!("Removed {}", product_id));
            show_cart(&cart, ctx)
        }
        CartCommand::Clear { yes } => {
            if !yes && !ctx.output.is_json() {
                let confirmed = Confirm::new()
                    .with_prompt("Empty the cart?")
                    .default(false)
                    .interact()?;
                if !confirmed {
                    ctx.output.warn("Cart left as is");
                    return Ok(());
                }
            }
            cart.clear().await?;
            ctx.output.success("Cart emptied");
            Ok(())
        }
    }
}

fn show_cart(cart: &CartStore, ctx: &Context) -> Result<()> {
    let lines = cart.lines()?;
    let totals = cart.aggregates()?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "lines": lines,
            "itemCount": cart.item_count()?,
            "totals": totals,
        }));
        return Ok(());
    }

    ctx.output.header("Cart");
    if lines.is_empty() {
        ctx.output.info("Your cart is empty.");
        return Ok(());
    }

    let widths = [8, 28, 5, 12, 12];
    ctx.output
        .table_row(&["ID", "MEDICINE", "QTY", "UNIT", "TOTAL"], &widths);
    for line in &lines {
        let unit = if line.final_unit_price < line.base_unit_price {
            format!("{} (was {})", line.final_unit_price, line.base_unit_price)
        } else {
            line.final_unit_price.to_string()
        };
        ctx.output.table_row(
            &[
                line.product_id.as_str(),
                &truncate(&line.name, 28),
                &line.quantity.to_string(),
                &unit,
                &line.line_total.to_string(),
            ],
            &widths,
        );
    }

    println!();
    ctx.output.kv("Items", &cart.item_count()?.to_string());
    ctx.output.kv("Subtotal", &totals.subtotal.to_string());
    if totals.saved.is_positive() {
        ctx.output.kv("You save", &totals.saved.to_string());
    }
    ctx.output.kv("Grand total", &totals.grand_total.to_string());
    Ok(())
}
