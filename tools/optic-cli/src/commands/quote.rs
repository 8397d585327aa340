//! Price a complete configuration and show the attributes it would carry.

use anyhow::Result;
use serde_json::json;

use optic_commerce::attributes::{AttributeSerializer, FocalProductType};

use super::{walk, QuoteArgs};
use crate::context::Context;
use crate::output::format_delta;

pub fn run(args: QuoteArgs, ctx: &Context) -> Result<()> {
    let engine = ctx.engine()?;
    let lens = engine.finish(&walk(&engine, &args.keys)?)?;

    let mut attributes = AttributeSerializer::lens(&lens);
    for attribute in [
        AttributeSerializer::focal_product_type(FocalProductType::Eyeglasses),
        AttributeSerializer::price_override(lens.total),
    ] {
        attributes.push(attribute.key, attribute.value);
    }

    if ctx.output.is_json() {
        ctx.output.json(&json!({ "lens": lens, "attributes": attributes }));
        return Ok(());
    }

    ctx.output.header("Lens configuration");
    ctx.output.table_row(&["Frame", "", &engine.base_price().display()], &[20, 28, 12]);
    for step in &lens.steps {
        ctx.output
            .table_row(&[&step.step, &step.label, &format_delta(&step.price_delta)], &[20, 28, 12]);
    }
    ctx.output.kv("Total", &lens.total.display());
    if lens.multifocal {
        ctx.output.kv("Prescription", "requires ADD for both eyes");
    }

    ctx.output.header("Cart attributes");
    for attribute in attributes.iter() {
        ctx.output.kv(&attribute.key, &attribute.value);
    }
    Ok(())
}
