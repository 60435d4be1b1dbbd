// ── Data service ──
//
// Owns a service tree and is its single write entry point. Readers get a
// consistent view for the duration of one closure; every write resolves,
// coerces and assigns inside one write-lock critical section. Change
// events are handed to a broadcast channel after the lock is released.

use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value as Json;
use tokio::sync::broadcast;
use tracing::debug;

use crate::coerce::{self, WritePlan};
use crate::error::BridgeError;
use crate::model::{DataObject, EnumRegistry, Member, Value};
use crate::path::AccessPath;
use crate::resolve::{self, Resolved, Slot, WriteOutcome};
use crate::snapshot::{self, SerializedNode};

const DEFAULT_EVENT_CAPACITY: usize = 256;

// ── ChangeEvent ─────────────────────────────────────────────────────

/// A value stored somewhere in the tree changed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// Path of the attribute that was assigned (a slider change is
    /// reported at `<slider>.value`).
    pub path: AccessPath,
    pub value: Value,
    /// Serialized form of what was replaced; `None` for new mapping keys.
    pub previous: Option<SerializedNode>,
}

// ── DataService ─────────────────────────────────────────────────────

/// Thread-safe owner of a service tree.
pub struct DataService {
    root: RwLock<DataObject>,
    enums: Arc<EnumRegistry>,
    event_tx: broadcast::Sender<Arc<ChangeEvent>>,
}

impl DataService {
    pub fn new(root: DataObject) -> Self {
        Self::with_capacity(root, DEFAULT_EVENT_CAPACITY)
    }

    /// Like [`new`](Self::new) with an explicit change-event buffer size.
    pub fn with_capacity(root: DataObject, event_capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(event_capacity.max(1));
        Self {
            root: RwLock::new(root),
            enums: Arc::new(EnumRegistry::new()),
            event_tx,
        }
    }

    /// Attach the registry the tree's enum types were declared in.
    ///
    /// Every enum value stored in the tree must belong to a type registered
    /// there with the same members, otherwise the tree is refused.
    pub fn with_enums(mut self, enums: Arc<EnumRegistry>) -> Result<Self, BridgeError> {
        self.read(|root| check_object(root, &enums))?;
        self.enums = enums;
        Ok(self)
    }

    pub fn enums(&self) -> &Arc<EnumRegistry> {
        &self.enums
    }

    pub fn class_name(&self) -> String {
        self.read(|root| root.class_name().to_owned())
    }

    /// Run `f` against a consistent view of the tree.
    pub fn read<R>(&self, f: impl FnOnce(&DataObject) -> R) -> R {
        let guard = self.root.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Fresh serialized copy of the whole tree.
    pub fn snapshot(&self) -> SerializedNode {
        self.read(|root| snapshot::serialize_object(root, false))
    }

    /// Subscribe to change events. Only changes made after this call are
    /// delivered.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<ChangeEvent>> {
        self.event_tx.subscribe()
    }

    /// Store a native value at `path`. Computed targets are left alone and
    /// reported as [`WriteOutcome::ReadOnly`].
    pub fn set_value(&self, path: &AccessPath, value: Value) -> Result<WriteOutcome, BridgeError> {
        let (outcome, event) = {
            let mut root = self.root.write().unwrap_or_else(PoisonError::into_inner);
            commit(&mut root, path, value)?
        };
        self.publish(event);
        Ok(outcome)
    }

    /// Coerce a wire value against the current target and store it.
    ///
    /// Resolution, coercion and assignment happen under one write lock, so
    /// the value coerced against is the value replaced.
    pub fn set_wire(&self, path: &AccessPath, wire: &Json) -> Result<WriteOutcome, BridgeError> {
        let (outcome, event) = {
            let mut root = self.root.write().unwrap_or_else(PoisonError::into_inner);
            match coerce::prepare_write(&root, path, wire)? {
                WritePlan::Assign { path, value } => commit(&mut root, &path, value)?,
                WritePlan::Skip { reason } => {
                    debug!(path = %path, %reason, "write skipped");
                    (WriteOutcome::ReadOnly, None)
                }
            }
        };
        self.publish(event);
        Ok(outcome)
    }

    /// Invoke the method at `path` with positional arguments.
    ///
    /// The tree lock is released before the handler runs.
    pub fn call(&self, path: &AccessPath, args: &[Value]) -> Result<Value, BridgeError> {
        let method = self.read(|root| -> Result<_, BridgeError> {
            match resolve::resolve(root, path)? {
                Resolved::Method(m) => Ok(m),
                Resolved::Value(_) => Err(BridgeError::NotCallable {
                    path: path.to_string(),
                }),
            }
        })?;
        debug!(path = %path, args = args.len(), "invoking method");
        method.call(args)
    }

    fn publish(&self, event: Option<ChangeEvent>) {
        if let Some(event) = event {
            // No subscribers is fine.
            let _ = self.event_tx.send(Arc::new(event));
        }
    }
}

impl std::fmt::Debug for DataService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataService")
            .field("enums", &self.enums.len())
            .field("subscribers", &self.event_tx.receiver_count())
            .finish_non_exhaustive()
    }
}

fn check_object(object: &DataObject, enums: &EnumRegistry) -> Result<(), BridgeError> {
    object.members().try_for_each(|(_, member)| match member {
        Member::Value(value) => check_value(value, enums),
        Member::Property(_) | Member::Method(_) => Ok(()),
    })
}

fn check_value(value: &Value, enums: &EnumRegistry) -> Result<(), BridgeError> {
    match value {
        Value::Enum(member) => enums.verify(member.descriptor()),
        Value::List(items) => items.iter().try_for_each(|v| check_value(v, enums)),
        Value::Dict(map) => map.values().try_for_each(|v| check_value(v, enums)),
        Value::Object(object) => check_object(object, enums),
        Value::Slider(slider) => check_value(&slider.value, enums),
        Value::None
        | Value::Bool(_)
        | Value::Int(_)
        | Value::Float(_)
        | Value::Str(_)
        | Value::Quantity(_) => Ok(()),
    }
}

/// Assign inside an already-held write lock and build the change event.
fn commit(
    root: &mut DataObject,
    path: &AccessPath,
    value: Value,
) -> Result<(WriteOutcome, Option<ChangeEvent>), BridgeError> {
    let previous = {
        let (parent, last) = resolve::resolve_parent(root, path)?;
        if parent.is_detached() {
            return Ok((WriteOutcome::ReadOnly, None));
        }
        match parent.slot(last) {
            Some(Slot::Stored(current)) => Some(snapshot::serialize_value(&current, false, None)),
            Some(Slot::Computed | Slot::Method) => return Ok((WriteOutcome::ReadOnly, None)),
            None => None,
        }
    };

    let outcome = resolve::assign(root, path, value.clone())?;
    let event = match outcome {
        WriteOutcome::Assigned { .. } => {
            debug!(path = %path, "value assigned");
            Some(ChangeEvent {
                path: path.clone(),
                value,
                previous,
            })
        }
        WriteOutcome::ReadOnly => None,
    };
    Ok((outcome, event))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::{EnumDescriptor, NumberSlider, Quantity};

    fn path(text: &str) -> AccessPath {
        AccessPath::parse(text).unwrap()
    }

    fn service() -> DataService {
        let enums = Arc::new(EnumRegistry::new());
        let mode = enums.register("Mode", ["OFF", "ON"]).unwrap();
        let panel = DataObject::new("Panel").with_value(
            "slider",
            NumberSlider::new(Quantity::new(1.0, "V"), 0.0, 5.0, 0.1),
        );
        let root = DataObject::new("Device")
            .with_value("mode", mode.at(0).unwrap())
            .with_value("panel", panel)
            .with_property("status", |o| match o.value("mode") {
                Some(Value::Enum(m)) => Value::from(format!("mode is {m}")),
                _ => Value::None,
            })
            .with_method("double", ["x"], |args| match args {
                [Value::Int(x)] => Ok(Value::Int(x * 2)),
                _ => Err(BridgeError::Invocation {
                    path: "double".into(),
                    message: "expected an int".into(),
                }),
            });
        DataService::new(root).with_enums(enums).unwrap()
    }

    #[test]
    fn wire_writes_emit_change_events() {
        let service = service();
        let mut rx = service.subscribe();

        service.set_wire(&path("mode"), &json!(1)).unwrap();

        let event = rx.try_recv().unwrap();
        assert_eq!(event.path, path("mode"));
        assert_eq!(coerce::to_wire(&event.value), json!("ON"));
        let previous = event.previous.as_ref().and_then(SerializedNode::as_leaf).unwrap();
        assert_eq!(previous.value, json!("OFF"));
    }

    #[test]
    fn slider_events_are_reported_at_inner_value() {
        let service = service();
        let mut rx = service.subscribe();

        service.set_wire(&path("panel.slider"), &json!(3.0)).unwrap();

        let event = rx.try_recv().unwrap();
        assert_eq!(event.path, path("panel.slider.value"));
        assert_eq!(event.value, Value::Quantity(Quantity::new(3.0, "V")));
    }

    #[test]
    fn computed_writes_change_nothing() {
        let service = service();
        let mut rx = service.subscribe();
        let before = service.snapshot();

        let outcome = service.set_wire(&path("status"), &json!("hacked")).unwrap();

        assert_eq!(outcome, WriteOutcome::ReadOnly);
        assert_eq!(service.snapshot(), before);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn calls_methods_outside_the_lock() {
        let service = service();
        assert_eq!(service.call(&path("double"), &[Value::Int(21)]).unwrap(), Value::Int(42));
        assert!(matches!(
            service.call(&path("mode"), &[]),
            Err(BridgeError::NotCallable { .. })
        ));
    }

    #[test]
    fn trees_with_unregistered_enums_are_refused() {
        let enums = Arc::new(EnumRegistry::new());
        enums.register("Mode", ["OFF", "ON"]).unwrap();

        let stray = EnumDescriptor::new("Speed", ["SLOW", "FAST"]).unwrap();
        let nested = DataObject::new("Motor").with_value("speed", vec![stray.at(1).unwrap()]);
        let root = DataObject::new("Device").with_value("motor", nested);
        assert_eq!(
            DataService::new(root).with_enums(Arc::clone(&enums)).unwrap_err(),
            BridgeError::UnknownEnum {
                name: "Speed".into()
            }
        );

        let reordered = EnumDescriptor::new("Mode", ["ON", "OFF"]).unwrap();
        let root = DataObject::new("Device").with_value(
            "slider",
            NumberSlider::new(reordered.at(0).unwrap(), 0.0, 1.0, 1.0),
        );
        assert_eq!(
            DataService::new(root).with_enums(enums).unwrap_err(),
            BridgeError::EnumRedefined {
                name: "Mode".into()
            }
        );
    }

    #[test]
    fn native_writes_bypass_coercion() {
        let service = service();
        service.set_value(&path("panel.slider.max"), Value::Float(10.0)).unwrap();
        let max = service.read(|root| {
            resolve::resolve(root, &path("panel.slider.max")).unwrap().into_value()
        });
        assert_eq!(max, Some(Value::Float(10.0)));
    }
}
