// ── Tree flattening ──
//
// Turns a nested snapshot into the flat `path -> leaf` mapping the
// legacy client works with. Only leaves get a path of their own, with
// one exception: a slider whose inner value is a scalar is emitted as a
// single leaf at the slider's path, carrying its bounds.
//
// Paths are built from segments, never by string concatenation, so each
// key renders back to exactly one node.

use indexmap::IndexMap;
use serde_json::Value as Json;
use tracing::warn;

use crate::model::TypeTag;
use crate::path::{AccessPath, Segment};
use crate::snapshot::{SerializedLeaf, SerializedNode};

/// Flat view of a snapshot, in tree order.
pub type FlatMap = IndexMap<String, SerializedLeaf>;

/// Flatten a snapshot. The root node itself never gets a path; for an
/// object root its members appear at top level (`mode`, `panel.slider`).
pub fn flatten(node: &SerializedNode) -> FlatMap {
    let mut out = FlatMap::new();
    descend(None, node, &mut out);
    out
}

fn descend(prefix: Option<&AccessPath>, node: &SerializedNode, out: &mut FlatMap) {
    match node {
        SerializedNode::Leaf(leaf) => {
            if let Some(path) = prefix {
                emit(path, leaf.clone(), out);
            }
        }
        SerializedNode::Sequence { items, .. } => {
            for (i, child) in items.iter().enumerate() {
                child_at(prefix, Segment::Index(i), child, out);
            }
        }
        SerializedNode::Mapping { items, .. } => {
            for (key, child) in items {
                child_at(prefix, Segment::key(key.as_str()), child, out);
            }
        }
        SerializedNode::Object { members, .. } => {
            for (name, child) in members {
                child_at(prefix, Segment::attribute(name.as_str()), child, out);
            }
        }
        SerializedNode::Widget {
            value,
            limits,
            readonly,
            doc,
        } => match (prefix, value.as_leaf()) {
            (Some(path), Some(inner)) => {
                let leaf = SerializedLeaf {
                    type_tag: TypeTag::Slider,
                    limits: Some(*limits),
                    readonly: *readonly,
                    doc: doc.clone(),
                    ..inner.clone()
                };
                emit(path, leaf, out);
            }
            _ => descend(prefix, value, out),
        },
    }
}

fn child_at(
    prefix: Option<&AccessPath>,
    segment: Segment,
    child: &SerializedNode,
    out: &mut FlatMap,
) {
    let path = match prefix {
        Some(parent) => parent.join(segment),
        None => AccessPath::single(segment),
    };
    match path {
        Ok(path) => descend(Some(&path), child, out),
        Err(e) => warn!(
            parent = prefix.map(ToString::to_string).unwrap_or_default(),
            error = %e,
            "skipping unaddressable member"
        ),
    }
}

fn emit(path: &AccessPath, mut leaf: SerializedLeaf, out: &mut FlatMap) {
    if leaf.type_tag == TypeTag::Method {
        let name = path.last().as_attribute().unwrap_or_default();
        let parameters = leaf
            .parameters
            .as_ref()
            .map(|p| p.keys().map(String::as_str).collect::<Vec<_>>().join(", "))
            .unwrap_or_default();
        leaf.value = Json::String(format!("{name}({parameters})"));
    }
    out.insert(path.to_string(), leaf);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::{DataObject, EnumDescriptor, NumberSlider, Quantity, Value};
    use crate::snapshot::serialize_object;

    fn device() -> DataObject {
        let mode = EnumDescriptor::new("Mode", ["OFF", "ON"]).unwrap();
        let mut gains = IndexMap::new();
        gains.insert("left".to_owned(), Value::Float(0.5));
        gains.insert("right".to_owned(), Value::Float(0.75));
        let panel = DataObject::new("Panel")
            .with_value(
                "slider",
                NumberSlider::new(Quantity::new(1.0, "V"), 0.0, 5.0, 0.1),
            )
            .with_value("gains", Value::Dict(gains));
        DataObject::new("Device")
            .with_value("mode", mode.at(0).unwrap())
            .with_value("gain", Quantity::new(2.0, "dB"))
            .with_value("panel", panel)
            .with_value("channels", vec![Value::from(1), Value::from(vec![2, 3])])
            .with_method("ramp", ["target", "seconds"], |_| Ok(Value::None))
    }

    fn values(flat: &FlatMap) -> Vec<(&str, Json)> {
        flat.iter()
            .map(|(k, leaf)| (k.as_str(), leaf.value.clone()))
            .collect()
    }

    #[test]
    fn container_naming_rules() {
        let flat = flatten(&serialize_object(&device(), false));
        assert_eq!(
            values(&flat),
            vec![
                ("mode", json!("OFF")),
                ("gain", json!(2.0)),
                ("panel.slider", json!(1.0)),
                ("panel.gains[\"left\"]", json!(0.5)),
                ("panel.gains[\"right\"]", json!(0.75)),
                ("channels[0]", json!(1)),
                ("channels[1][0]", json!(2)),
                ("channels[1][1]", json!(3)),
                ("ramp", json!("ramp(target, seconds)")),
            ]
        );
    }

    #[test]
    fn slider_leaf_keeps_unit_and_bounds() {
        let flat = flatten(&serialize_object(&device(), false));
        let slider = &flat["panel.slider"];
        assert_eq!(slider.type_tag, TypeTag::Slider);
        assert_eq!(slider.unit.as_deref(), Some("V"));
        assert_eq!(slider.limits.map(|l| l.max), Some(5.0));
    }

    #[test]
    fn flattening_is_idempotent() {
        let tree = device();
        let first = flatten(&serialize_object(&tree, false));
        let second = flatten(&serialize_object(&tree, false));
        assert_eq!(first, second);
    }

    #[test]
    fn unaddressable_keys_are_skipped() {
        let mut map = IndexMap::new();
        map.insert("ok".to_owned(), Value::Int(1));
        map.insert("say \"hi\"".to_owned(), Value::Int(2));
        let tree = DataObject::new("Device").with_value("labels", Value::Dict(map));

        let flat = flatten(&serialize_object(&tree, false));
        assert_eq!(flat.keys().collect::<Vec<_>>(), ["labels[\"ok\"]"]);
    }

    #[test]
    fn empty_containers_emit_nothing() {
        let tree = DataObject::new("Device")
            .with_value("items", Value::List(vec![]))
            .with_value("nested", DataObject::new("Empty"));
        assert!(flatten(&serialize_object(&tree, false)).is_empty());
    }
}
