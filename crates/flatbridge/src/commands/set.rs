//! `set`: write one path and report what observers were told.

use std::fmt::Write as _;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value as Json;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

use flatbridge_core::{ChannelObserver, Notification, RpcInterface};

use crate::cli::{GlobalOpts, SetArgs};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct SetReport {
    path: String,
    value: Json,
    notifications: Vec<Notification>,
}

fn detail(report: &SetReport) -> String {
    let mut out = format!("{} = {}", report.path, output::wire_text(&report.value));
    if report.notifications.is_empty() {
        out.push_str("\n(no notifications)");
    }
    for notification in &report.notifications {
        match notification {
            Notification::Change { name, value } => {
                let _ = write!(out, "\nnotify {name} = {}", output::wire_text(value));
            }
            Notification::Message(message) => {
                let _ = write!(out, "\nmessage {message}");
            }
        }
    }
    out
}

/// Collect whatever arrives until the channel stays quiet for `wait`.
async fn drain(rx: &mut UnboundedReceiver<Notification>, wait: Duration) -> Vec<Notification> {
    let mut received = Vec::new();
    while let Ok(Some(notification)) = tokio::time::timeout(wait, rx.recv()).await {
        received.push(notification);
    }
    received
}

pub async fn handle(
    rpc: &RpcInterface,
    args: &SetArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (observer, mut rx) = ChannelObserver::new();
    let bridge = rpc.bridge();
    bridge.register(observer);
    bridge.start();

    let wire = output::parse_wire(&args.value);
    debug!(path = %args.path, value = %wire, "setting parameter");
    let written = rpc.set_param(&args.path, &wire);

    let notifications = drain(&mut rx, Duration::from_millis(args.wait_ms)).await;
    bridge.shutdown().await;
    written?;

    let report = SetReport {
        path: args.path.clone(),
        value: rpc.get_param(&args.path)?,
        notifications,
    };
    let out = output::render_single(&global.output, &report, detail, |r| {
        output::wire_text(&r.value)
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
