// ── Remote operations ──
//
// The flat, string-addressed surface a transport exposes to the legacy
// client. Every call takes textual paths and wire values; nothing here
// hands out references into the tree.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value as Json;
use tracing::{debug, warn};

use crate::bridge::NotificationBridge;
use crate::coerce;
use crate::config::{BridgeConfig, WritePolicy};
use crate::error::BridgeError;
use crate::flatten::{FlatMap, flatten};
use crate::path::AccessPath;
use crate::resolve::{self, Resolved, WriteOutcome};
use crate::service::DataService;
use crate::snapshot::{SerializedNode, serialize_method, serialize_value};

/// Remote-facing facade over a service and its notification bridge.
#[derive(Debug, Clone)]
pub struct RpcInterface {
    service: Arc<DataService>,
    bridge: NotificationBridge,
    config: BridgeConfig,
}

impl RpcInterface {
    pub fn new(bridge: NotificationBridge, config: BridgeConfig) -> Self {
        Self {
            service: Arc::clone(bridge.service()),
            bridge,
            config,
        }
    }

    pub fn service(&self) -> &Arc<DataService> {
        &self.service
    }

    pub fn bridge(&self) -> &NotificationBridge {
        &self.bridge
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    // ── Discovery ────────────────────────────────────────────────────

    pub fn version(&self) -> String {
        format!("flatbridge v{}", env!("CARGO_PKG_VERSION"))
    }

    /// Configured service name, or the class name of the root object.
    pub fn name(&self) -> String {
        self.config
            .service_name
            .clone()
            .unwrap_or_else(|| self.service.class_name())
    }

    pub fn info(&self) -> &IndexMap<String, String> {
        &self.config.info
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Flattened snapshot of the whole tree.
    pub fn get_props(&self) -> FlatMap {
        flatten(&self.service.snapshot())
    }

    /// Read-coerced value at `path`.
    ///
    /// Objects come back in full serialized form and methods as their
    /// `name(arg, ...)` signature.
    pub fn get_param(&self, path: &str) -> Result<Json, BridgeError> {
        self.read_at(path, |target, _| wire_value(&target))
    }

    /// Serialized node at `path`, with type tag and metadata.
    pub fn describe(&self, path: &str) -> Result<SerializedNode, BridgeError> {
        self.read_at(path, |target, stored| describe_target(&target, stored))
    }

    /// [`get_param`](Self::get_param) and [`describe`](Self::describe)
    /// together, from one resolution of `path`.
    pub fn inspect(&self, path: &str) -> Result<(Json, SerializedNode), BridgeError> {
        self.read_at(path, |target, stored| {
            (wire_value(&target), describe_target(&target, stored))
        })
    }

    /// Resolve `path` once under the read lock and hand the target, and
    /// whether it is stored in the tree, to `f`.
    fn read_at<R>(
        &self,
        path: &str,
        f: impl FnOnce(Resolved<'_>, bool) -> R,
    ) -> Result<R, BridgeError> {
        let path = AccessPath::parse(path)?;
        self.service.read(|root| -> Result<R, BridgeError> {
            let (target, stored) = resolve::resolve_with_origin(root, &path)?;
            Ok(f(target, stored))
        })
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Coerce and store `value` at `path`.
    ///
    /// Writes to computed attributes are dropped silently. Any other
    /// failure is handled according to the configured [`WritePolicy`].
    pub fn set_param(&self, path: &str, value: &Json) -> Result<(), BridgeError> {
        let result = AccessPath::parse(path).and_then(|p| self.service.set_wire(&p, value));
        match result {
            Ok(WriteOutcome::Assigned { .. }) => Ok(()),
            Ok(WriteOutcome::ReadOnly) => {
                debug!(path, "write to read-only target ignored");
                Ok(())
            }
            Err(e) => match self.config.write_policy {
                WritePolicy::LogAndIgnore => {
                    warn!(path, error = %e, "set_param failed, ignoring");
                    Ok(())
                }
                WritePolicy::Surface => Err(e),
            },
        }
    }

    /// Invoke the method at `path` with positional wire arguments.
    pub fn remote_call(&self, path: &str, args: &[Json]) -> Result<Json, BridgeError> {
        let path = AccessPath::parse(path)?;
        let args: Vec<_> = args.iter().map(coerce::plain).collect();
        let result = self.service.call(&path, &args)?;
        Ok(coerce::to_wire(&result))
    }

    // ── Notifications ────────────────────────────────────────────────

    /// Push a free-form message to every observer.
    pub fn emit(&self, message: impl Into<String>) {
        self.bridge.emit(message);
    }
}

fn wire_value(target: &Resolved<'_>) -> Json {
    match target {
        Resolved::Value(v) => coerce::to_wire(v),
        Resolved::Method(m) => Json::String(m.signature()),
    }
}

fn describe_target(target: &Resolved<'_>, stored: bool) -> SerializedNode {
    match target {
        Resolved::Value(v) => serialize_value(v, !stored, None),
        Resolved::Method(m) => serialize_method(m),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::{DataObject, EnumRegistry, Quantity, Value};

    fn rpc(policy: WritePolicy) -> RpcInterface {
        let enums = EnumRegistry::new();
        let mode = enums.register("Mode", ["OFF", "ON"]).unwrap();
        let root = DataObject::new("Device")
            .with_value("mode", mode.at(0).unwrap())
            .with_value("gain", Quantity::new(2.0, "dB"))
            .with_property("uptime", |_| Value::Int(42))
            .with_method("add", ["a", "b"], |args| match args {
                [Value::Int(a), Value::Int(b)] => Ok(Value::Int(a + b)),
                _ => Ok(Value::None),
            });
        let bridge = NotificationBridge::new(Arc::new(DataService::new(root)));
        let config = BridgeConfig {
            write_policy: policy,
            ..BridgeConfig::default()
        };
        RpcInterface::new(bridge, config)
    }

    #[test]
    fn mode_and_gain_scenario() {
        let rpc = rpc(WritePolicy::Surface);
        let props: Vec<_> = rpc
            .get_props()
            .into_iter()
            .filter(|(_, leaf)| leaf.type_tag != crate::model::TypeTag::Method)
            .map(|(k, leaf)| (k, leaf.value))
            .collect();
        assert_eq!(
            props,
            vec![
                ("mode".to_owned(), json!("OFF")),
                ("gain".to_owned(), json!(2.0)),
                ("uptime".to_owned(), json!(42)),
            ]
        );

        rpc.set_param("mode", &json!(1)).unwrap();
        assert_eq!(rpc.get_param("mode").unwrap(), json!("ON"));

        rpc.set_param("gain", &json!(7.5)).unwrap();
        assert_eq!(rpc.get_param("gain").unwrap(), json!(7.5));
        let gain = rpc.describe("gain").unwrap();
        assert_eq!(gain.as_leaf().unwrap().unit.as_deref(), Some("dB"));
    }

    #[test]
    fn write_policy_decides_error_visibility() {
        let quiet = rpc(WritePolicy::LogAndIgnore);
        assert!(quiet.set_param("mode", &json!(2)).is_ok());
        assert!(quiet.set_param("no such thing", &json!(1)).is_ok());
        assert_eq!(quiet.get_param("mode").unwrap(), json!("OFF"));

        let loud = rpc(WritePolicy::Surface);
        assert!(matches!(
            loud.set_param("mode", &json!(2)),
            Err(BridgeError::OrdinalOutOfRange { .. })
        ));
        assert!(matches!(
            loud.set_param("missing", &json!(1)),
            Err(BridgeError::PathNotFound { .. })
        ));
    }

    #[test]
    fn computed_writes_are_silent_under_either_policy() {
        let rpc = rpc(WritePolicy::Surface);
        rpc.set_param("uptime", &json!(0)).unwrap();
        assert_eq!(rpc.get_param("uptime").unwrap(), json!(42));
        assert!(rpc.describe("uptime").unwrap().readonly());
    }

    #[test]
    fn methods_are_discoverable_and_callable() {
        let rpc = rpc(WritePolicy::Surface);
        assert_eq!(rpc.get_param("add").unwrap(), json!("add(a, b)"));
        assert_eq!(rpc.remote_call("add", &[json!(2), json!(3)]).unwrap(), json!(5));
        assert!(matches!(
            rpc.remote_call("gain", &[]),
            Err(BridgeError::NotCallable { .. })
        ));
    }

    #[test]
    fn inspect_evaluates_getters_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let root = DataObject::new("Device").with_property("reading", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Quantity::new(3.3, "volt").into()
        });
        let bridge = NotificationBridge::new(Arc::new(DataService::new(root)));
        let rpc = RpcInterface::new(bridge, BridgeConfig::default());

        let node = rpc.describe("reading").unwrap();
        assert!(node.readonly());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let (value, node) = rpc.inspect("reading").unwrap();
        assert_eq!(value, json!(3.3));
        assert_eq!(node.as_leaf().unwrap().unit.as_deref(), Some("volt"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn discovery() {
        let rpc = rpc(WritePolicy::default());
        assert_eq!(rpc.name(), "Device");
        assert!(rpc.version().starts_with("flatbridge v"));
        assert!(rpc.info().is_empty());
    }
}
