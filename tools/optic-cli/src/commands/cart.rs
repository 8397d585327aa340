//! Storefront cart commands.

use anyhow::{bail, Result};
use serde_json::json;

use optic_commerce::cart::{Cart, CartService};
use optic_commerce::prescription::{EntryMethod, EyeglassesEvent, EyeglassesWizard};
use optic_commerce::{LineId, MerchandiseId};

use super::{walk, CartArgs, CartCommand};
use crate::context::Context;

pub async fn run(args: CartArgs, ctx: &Context) -> Result<()> {
    let service = ctx.cart_service()?;

    match args.command {
        CartCommand::Show { first_time } => {
            let cart = service.load_or_create().await?;
            print_cart(ctx, &service, &cart, first_time);
        }
        CartCommand::AddLens { variant, keys } => {
            let engine = ctx.engine()?;
            let lens = engine.finish(&walk(&engine, &keys)?)?;
            let wizard = EyeglassesWizard::for_lens(&lens)
                .apply(EyeglassesEvent::Choose(EntryMethod::Deferred))?;
            let request = wizard.line_request(&lens, MerchandiseId::new(variant))?;

            service.load_or_create().await?;
            let cart = service.add_request(request).await?;
            ctx.output
                .success(&format!("Added lens at {}", lens.total.display()));
            print_cart(ctx, &service, &cart, false);
        }
        CartCommand::Update { line, quantity } => {
            service.load_or_create().await?;
            let cart = service.update_line_item(LineId::new(line), quantity).await?;
            ctx.output.success("Cart updated");
            print_cart(ctx, &service, &cart, false);
        }
        CartCommand::Remove { line } => {
            service.load_or_create().await?;
            let cart = service.remove_line_item(LineId::new(line)).await?;
            ctx.output.success("Line removed");
            print_cart(ctx, &service, &cart, false);
        }
        CartCommand::Checkout => {
            let cart = service.load_or_create().await?;
            if cart.is_empty() {
                bail!("Cart is empty");
            }
            let url = service.complete_checkout_handoff().await?;
            if ctx.output.is_json() {
                ctx.output.json(&json!({ "checkout_url": url }));
            } else {
                ctx.output.success("Continue to checkout:");
                println!("  {}", url);
            }
        }
    }
    Ok(())
}

fn print_cart(ctx: &Context, service: &CartService, cart: &Cart, first_time: bool) {
    let totals = service.display_totals(first_time);
    let donation = service.donation_status();

    if ctx.output.is_json() {
        ctx.output
            .json(&json!({ "cart": cart, "totals": totals, "donation": donation }));
        return;
    }

    ctx.output.header(&format!("Cart {}", cart.id));
    if cart.is_empty() {
        ctx.output.info("Cart is empty");
    }
    for line in &cart.lines {
        let kind = line
            .focal_product_type()
            .map(|k| k.as_str())
            .unwrap_or("-");
        ctx.output.table_row(
            &[
                line.id.as_str(),
                &line.title,
                kind,
                &format!("x{}", line.quantity),
                &line.unit_price.display(),
            ],
            &[36, 24, 14, 4, 10],
        );
    }

    if let Some(totals) = totals {
        ctx.output.kv("Subtotal", &totals.subtotal.display());
        if totals.has_discount() {
            ctx.output.kv("First-time discount", &format!("-{}", totals.discount.display()));
        }
        if let Some(tax) = totals.tax {
            ctx.output.kv("Tax", &tax.display());
        }
        ctx.output.kv("Estimated total", &totals.estimated_total.display());
    }

    if let Some(status) = donation {
        if status.should_offer_donation() {
            ctx.output
                .info("This order qualifies for a donated pair. Add the donation item to include it.");
        }
    }
}
