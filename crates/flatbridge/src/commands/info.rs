//! `info`: what the service reports about itself.

use std::fmt::Write as _;

use indexmap::IndexMap;
use serde::Serialize;

use flatbridge_core::RpcInterface;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct InfoReport<'a> {
    version: String,
    name: String,
    info: &'a IndexMap<String, String>,
}

fn detail(report: &InfoReport<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "version  {}", report.version);
    let _ = write!(out, "name     {}", report.name);
    for (key, value) in report.info {
        let _ = write!(out, "\n{key}: {value}");
    }
    out
}

pub fn handle(rpc: &RpcInterface, global: &GlobalOpts) -> Result<(), CliError> {
    let report = InfoReport {
        version: rpc.version(),
        name: rpc.name(),
        info: rpc.info(),
    };
    let out = output::render_single(&global.output, &report, detail, |r| r.name.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}
