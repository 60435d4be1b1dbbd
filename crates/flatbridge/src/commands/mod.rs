//! Command dispatch: CLI args -> `RpcInterface` calls -> output formatting.

pub mod call;
pub mod config_cmd;
pub mod get;
pub mod info;
pub mod props;
pub mod set;

use std::sync::Arc;

use tracing::debug;

use flatbridge_config::{Config, load_tree};
use flatbridge_core::{DataService, NotificationBridge, RpcInterface};

use crate::cli::{Command, GlobalOpts};
use crate::demo;
use crate::error::CliError;

/// Build the remote surface over the tree named by `--tree`, the config's
/// `tree` key, or the built-in demo service, in that order.
pub fn build_interface(global: &GlobalOpts, config: &Config) -> Result<RpcInterface, CliError> {
    let bridge_config = config.to_bridge_config()?;

    let (root, enums) = match global.tree.as_ref().or(config.tree.as_ref()) {
        Some(path) => {
            debug!(path = %path.display(), "loading tree definition");
            load_tree(path)?
        }
        None => {
            debug!("no tree definition given, serving the demo service");
            demo::service_tree()?
        }
    };

    let service =
        DataService::with_capacity(root, bridge_config.event_capacity).with_enums(enums)?;
    let bridge = NotificationBridge::new(Arc::new(service));
    Ok(RpcInterface::new(bridge, bridge_config))
}

/// Dispatch a tree-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    rpc: &RpcInterface,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Props => props::handle_props(rpc, global),
        Command::Paths => props::handle_paths(rpc, global),
        Command::Get(args) => get::handle(rpc, &args, global),
        Command::Set(args) => set::handle(rpc, &args, global).await,
        Command::Call(args) => call::handle(rpc, &args, global),
        Command::Info => info::handle(rpc, global),
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
