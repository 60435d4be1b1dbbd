// ── Value coercion ──
//
// Conversion between wire primitives (JSON scalars) and native values.
//
// Read direction: enum members become their declared name, quantities
// become their bare magnitude, sliders become their inner scalar.
//
// Write direction is driven by the value currently stored at the
// target: an integer written over an enum member selects the member at
// that ordinal, a number written over a quantity keeps the current
// unit, and a write aimed at a slider is redirected to its `.value`.

use serde_json::Value as Json;
use tracing::warn;

use crate::error::BridgeError;
use crate::model::{DataObject, EnumMember, TypeTag, Value};
use crate::path::{AccessPath, Segment};
use crate::resolve::{Slot, resolve_parent};
use crate::snapshot::{SerializedNode, serialize_object};

// ── Read direction ──────────────────────────────────────────────────

/// Native value as the legacy client sees it.
pub fn to_wire(value: &Value) -> Json {
    match value {
        Value::None => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::from(*i),
        Value::Float(f) => Json::from(*f),
        Value::Str(s) => Json::String(s.clone()),
        Value::Enum(member) => Json::String(member.name().to_owned()),
        Value::Quantity(q) => Json::from(q.magnitude),
        Value::Slider(slider) => to_wire(&slider.value),
        Value::List(items) => Json::Array(items.iter().map(to_wire).collect()),
        Value::Dict(map) => Json::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), to_wire(v)))
                .collect(),
        ),
        Value::Object(obj) => serde_json::to_value(serialize_object(obj, false)).unwrap_or_else(
            |e| {
                warn!(class = obj.class_name(), error = %e, "failed to serialize object");
                Json::Null
            },
        ),
    }
}

/// Read-coerce a changed value for publication.
///
/// `previous` is the serialized form of what the value replaced. It
/// only matters when the new value lost its rich type on the way in,
/// e.g. a bare ordinal stored where an enum used to be.
pub fn notification_value(value: &Value, previous: Option<&SerializedNode>) -> Json {
    let hint = previous.and_then(SerializedNode::as_leaf);
    match (value, hint) {
        (Value::Int(i), Some(leaf)) if leaf.type_tag == TypeTag::Enum => leaf
            .enum_members
            .as_ref()
            .and_then(|members| usize::try_from(*i).ok().and_then(|i| members.get(i)))
            .map_or_else(|| Json::from(*i), |name| Json::String(name.clone())),
        _ => to_wire(value),
    }
}

// ── Write direction ─────────────────────────────────────────────────

/// Plain conversion with no target type to guide it.
///
/// Used for untyped targets (`None`, new mapping keys) and for call
/// arguments.
pub fn plain(wire: &Json) -> Value {
    match wire {
        Json::Null => Value::None,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => n
            .as_i64()
            .map(Value::Int)
            .or_else(|| n.as_f64().map(Value::Float))
            .unwrap_or(Value::None),
        Json::String(s) => Value::Str(s.clone()),
        Json::Array(items) => Value::List(items.iter().map(plain).collect()),
        Json::Object(map) => Value::Dict(map.iter().map(|(k, v)| (k.clone(), plain(v))).collect()),
    }
}

/// Coerce `wire` into the native kind of `current`.
///
/// For a slider the result is the new *inner* value; callers address it
/// at `<path>.value`.
pub fn from_wire(wire: &Json, current: &Value) -> Result<Value, BridgeError> {
    match current {
        Value::Enum(member) => enum_from_wire(wire, member),
        Value::Quantity(q) => number(wire, TypeTag::Quantity).map(|m| Value::Quantity(q.with_magnitude(m))),
        Value::Slider(slider) => from_wire(wire, &slider.value),
        Value::Int(_) => wire
            .as_i64()
            .map(Value::Int)
            .ok_or_else(|| mismatch(TypeTag::Int, wire)),
        Value::Float(_) => number(wire, TypeTag::Float).map(Value::Float),
        Value::Bool(_) => wire
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| mismatch(TypeTag::Bool, wire)),
        Value::Str(_) => wire
            .as_str()
            .map(Value::from)
            .ok_or_else(|| mismatch(TypeTag::Str, wire)),
        Value::List(_) if wire.is_array() => Ok(plain(wire)),
        Value::Dict(_) if wire.is_object() => Ok(plain(wire)),
        Value::None => Ok(plain(wire)),
        Value::List(_) | Value::Dict(_) | Value::Object(_) => {
            Err(mismatch(current.type_tag(), wire))
        }
    }
}

fn enum_from_wire(wire: &Json, current: &EnumMember) -> Result<Value, BridgeError> {
    let descriptor = current.descriptor();

    if let Some(name) = wire.as_str() {
        return descriptor.member(name).map(Value::Enum).ok_or_else(|| {
            BridgeError::mismatch(
                format!("member of {}", descriptor.name()),
                format!("'{name}'"),
            )
        });
    }

    let ordinal = wire
        .as_i64()
        .or_else(|| wire.as_u64().map(|_| i64::MAX))
        .ok_or_else(|| mismatch(TypeTag::Enum, wire))?;
    usize::try_from(ordinal)
        .ok()
        .and_then(|i| descriptor.at(i))
        .map(Value::Enum)
        .ok_or_else(|| BridgeError::OrdinalOutOfRange {
            enum_name: descriptor.name().to_owned(),
            ordinal,
            len: descriptor.len(),
        })
}

fn number(wire: &Json, target: TypeTag) -> Result<f64, BridgeError> {
    wire.as_f64().ok_or_else(|| mismatch(target, wire))
}

fn mismatch(target: TypeTag, wire: &Json) -> BridgeError {
    BridgeError::mismatch(target.as_ref(), wire_kind(wire))
}

fn wire_kind(wire: &Json) -> &'static str {
    match wire {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(n) if n.is_f64() => "float",
        Json::Number(_) => "int",
        Json::String(_) => "str",
        Json::Array(_) => "list",
        Json::Object(_) => "dict",
    }
}

// ── Write planning ──────────────────────────────────────────────────

/// Why a write was dropped without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    /// Target is a getter-backed property.
    Computed,
    /// Target is a method.
    Method,
    /// Target sits inside the result of a getter.
    Detached,
}

/// What a `set_param` amounts to once resolved and coerced.
#[derive(Debug, Clone, PartialEq)]
pub enum WritePlan {
    Assign { path: AccessPath, value: Value },
    Skip { reason: SkipReason },
}

/// Resolve the target of a write and coerce `wire` against it.
///
/// Resolves once, without evaluating the attribute being written, and
/// branches on what is stored there.
pub fn prepare_write(
    root: &DataObject,
    path: &AccessPath,
    wire: &Json,
) -> Result<WritePlan, BridgeError> {
    let (parent, last) = resolve_parent(root, path)?;
    if parent.is_detached() {
        return Ok(WritePlan::Skip {
            reason: SkipReason::Detached,
        });
    }

    match parent.slot(last) {
        Some(Slot::Computed) => Ok(WritePlan::Skip {
            reason: SkipReason::Computed,
        }),
        Some(Slot::Method) => Ok(WritePlan::Skip {
            reason: SkipReason::Method,
        }),
        Some(Slot::Stored(current)) => match current.as_ref() {
            Value::Slider(slider) => Ok(WritePlan::Assign {
                path: path.join(Segment::attribute("value"))?,
                value: from_wire(wire, &slider.value)?,
            }),
            other => Ok(WritePlan::Assign {
                path: path.clone(),
                value: from_wire(wire, other)?,
            }),
        },
        None if parent.type_tag() == TypeTag::Dict && matches!(last, Segment::Key(_)) => {
            Ok(WritePlan::Assign {
                path: path.clone(),
                value: plain(wire),
            })
        }
        None => Err(BridgeError::PathNotFound {
            prefix: path.to_string(),
        }),
    }
}
