//! `props` and `paths`: the flattened view of the whole tree.

use tabled::Tabled;

use flatbridge_core::{RpcInterface, SerializedLeaf};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Table rows ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct PropRow {
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Unit")]
    unit: String,
    #[tabled(rename = "Access")]
    access: &'static str,
}

impl PropRow {
    fn new(path: &str, leaf: &SerializedLeaf) -> Self {
        let value = match &leaf.parameters {
            Some(params) => {
                let names: Vec<&str> = params.keys().map(String::as_str).collect();
                format!("({})", names.join(", "))
            }
            None => output::wire_text(&leaf.value),
        };
        Self {
            path: path.to_owned(),
            kind: leaf.type_tag.to_string(),
            value,
            unit: leaf.unit.clone().unwrap_or_default(),
            access: if leaf.readonly { "ro" } else { "rw" },
        }
    }
}

#[derive(Tabled)]
struct PathRow {
    #[tabled(rename = "Path")]
    path: String,
}

// ── Handlers ─────────────────────────────────────────────────────────

pub fn handle_props(rpc: &RpcInterface, global: &GlobalOpts) -> Result<(), CliError> {
    let props = rpc.get_props();
    let out = output::render_map(&global.output, &props, PropRow::new, |path, leaf| {
        format!("{path}={}", output::wire_text(&leaf.value))
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub fn handle_paths(rpc: &RpcInterface, global: &GlobalOpts) -> Result<(), CliError> {
    let paths: Vec<String> = rpc.get_props().into_keys().collect();
    let out = output::render_list(
        &global.output,
        &paths,
        |p| PathRow { path: p.clone() },
        String::clone,
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
