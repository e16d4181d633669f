//! Checkout command.

use anyhow::Result;
use dialoguer::Confirm;

use super::orders::print_order;
use super::CheckoutArgs;
use crate::context::Context;

/// Run the checkout command.
pub async fn run(args: CheckoutArgs, ctx: &Context) -> Result<()> {
    let actor = ctx.actor()?;
    let remote = ctx.remote()?;
    let cart = ctx.cart(&remote)?;
    let orders = ctx.orders(&remote);

    let totals = cart.aggregates()?;
    if !args.yes && !ctx.output.is_json() && !cart.lines()?.is_empty() {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Place order for {} item(s), {}?",
                cart.item_count()?,
                totals.grand_total
            ))
            .default(true)
            .interact()?;
        if !confirmed {
            ctx.output.warn("Checkout cancelled");
            return Ok(());
        }
    }

    let spinner = ctx.output.spinner("Placing order...");
    let placed = orders.checkout(&cart, actor.as_ref(), &ctx.contact()).await;
    spinner.finish_and_clear();
    let order = placed?;

    if ctx.output.is_json() {
        ctx.output.json(&order);
        return Ok(());
    }

    ctx.output.success(&format!("Order {} placed", order.id));
    print_order(&order, ctx);
    Ok(())
}
