//! Show the next step of a partial configuration.

use anyhow::Result;
use serde_json::json;

use super::{walk, OptionsArgs};
use crate::context::Context;
use crate::output::format_delta;

pub fn run(args: OptionsArgs, ctx: &Context) -> Result<()> {
    let engine = ctx.engine()?;
    let path = walk(&engine, &args.keys)?;
    let total = engine.price(&path)?;
    let step = engine.step_after(&path);

    if ctx.output.is_json() {
        ctx.output.json(&json!({ "path": path, "total": total, "next": step }));
        return Ok(());
    }

    match step {
        Some(step) => {
            ctx.output.header(&format!("Step {}: {}", step.index + 1, step.name));
            for choice in &step.choices {
                ctx.output.table_row(
                    &[&choice.key, &choice.label, &format_delta(&choice.price_delta)],
                    &[24, 28, 12],
                );
            }
            ctx.output.kv("Price so far", &total.display());
        }
        None => {
            ctx.output.success("Configuration complete");
            ctx.output.kv("Total", &total.display());
        }
    }
    Ok(())
}
