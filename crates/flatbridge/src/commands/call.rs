//! `call`: invoke a method member.

use serde_json::Value as Json;

use flatbridge_core::RpcInterface;

use crate::cli::{CallArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub fn handle(rpc: &RpcInterface, args: &CallArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let wire: Vec<Json> = args.args.iter().map(|a| output::parse_wire(a)).collect();
    let result = rpc.remote_call(&args.path, &wire)?;

    let out = output::render_single(&global.output, &result, output::wire_text, output::wire_text)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
