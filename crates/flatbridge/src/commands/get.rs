//! `get`: read one path.

use flatbridge_core::{RpcInterface, SerializedNode};

use crate::cli::{GetArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub fn handle(rpc: &RpcInterface, args: &GetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (value, node) = rpc.inspect(&args.path)?;
    let unit = match node {
        SerializedNode::Leaf(leaf) => leaf.unit,
        _ => None,
    };

    let out = output::render_single(
        &global.output,
        &value,
        |v| {
            let text = if v.is_object() || v.is_array() {
                serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
            } else {
                output::wire_text(v)
            };
            match &unit {
                Some(unit) => format!("{text} {unit}"),
                None => text,
            }
        },
        output::wire_text,
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
