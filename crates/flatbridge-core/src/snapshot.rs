// ── Serialized snapshots ──
//
// A `SerializedNode` is a detached, wire-ready copy of (part of) a
// service tree. Snapshots are produced fresh for every read request and
// never cached: they reflect the tree at the moment of the call.
//
// Leaves already carry read-coerced wire values (enum names, bare
// magnitudes); units and enum member lists ride alongside as metadata.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value as Json;

use crate::coerce;
use crate::model::{DataObject, Member, Method, NumberSlider, TypeTag, Value};

// ── SerializedLeaf ──────────────────────────────────────────────────

/// One addressable wire value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SerializedLeaf {
    #[serde(rename = "type")]
    pub type_tag: TypeTag,
    /// Primitive wire value (number, string, bool or null).
    pub value: Json,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Declared member names, for enum leaves.
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_members: Option<Vec<String>>,
    /// Parameter name -> annotated type name, in call order, for method
    /// leaves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<IndexMap<String, Option<String>>>,
    /// Bounds, for flattened slider widgets.
    #[serde(flatten)]
    pub limits: Option<SliderLimits>,
    pub readonly: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl SerializedLeaf {
    fn scalar(value: &Value, readonly: bool, doc: Option<&str>) -> Self {
        let unit = match value {
            Value::Quantity(q) => Some(q.unit.clone()),
            _ => None,
        };
        let enum_members = match value {
            Value::Enum(m) => Some(m.descriptor().members().to_vec()),
            _ => None,
        };
        Self {
            type_tag: value.type_tag(),
            value: coerce::to_wire(value),
            unit,
            enum_members,
            parameters: None,
            limits: None,
            readonly,
            doc: doc.map(str::to_owned),
        }
    }

    fn method(method: &Method) -> Self {
        Self {
            type_tag: TypeTag::Method,
            value: Json::Null,
            unit: None,
            enum_members: None,
            parameters: Some(
                method
                    .parameters()
                    .iter()
                    .map(|p| (p.name.clone(), p.annotation.as_ref().map(ToString::to_string)))
                    .collect(),
            ),
            limits: None,
            readonly: true,
            doc: method.doc().map(str::to_owned),
        }
    }
}

/// Bounds of a number slider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SliderLimits {
    pub min: f64,
    pub max: f64,
    pub step_size: f64,
}

impl From<&NumberSlider> for SliderLimits {
    fn from(s: &NumberSlider) -> Self {
        Self {
            min: s.min,
            max: s.max,
            step_size: s.step_size,
        }
    }
}

// ── SerializedNode ──────────────────────────────────────────────────

/// Recursive serialized form of a tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum SerializedNode {
    Leaf(SerializedLeaf),
    Sequence {
        items: Vec<SerializedNode>,
        readonly: bool,
        doc: Option<String>,
    },
    Mapping {
        items: IndexMap<String, SerializedNode>,
        readonly: bool,
        doc: Option<String>,
    },
    Object {
        class_name: String,
        members: IndexMap<String, SerializedNode>,
        readonly: bool,
        doc: Option<String>,
    },
    Widget {
        value: Box<SerializedNode>,
        limits: SliderLimits,
        readonly: bool,
        doc: Option<String>,
    },
}

impl SerializedNode {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Self::Leaf(leaf) => leaf.type_tag,
            Self::Sequence { .. } => TypeTag::List,
            Self::Mapping { .. } => TypeTag::Dict,
            Self::Object { .. } => TypeTag::Object,
            Self::Widget { .. } => TypeTag::Slider,
        }
    }

    pub fn readonly(&self) -> bool {
        match self {
            Self::Leaf(leaf) => leaf.readonly,
            Self::Sequence { readonly, .. }
            | Self::Mapping { readonly, .. }
            | Self::Object { readonly, .. }
            | Self::Widget { readonly, .. } => *readonly,
        }
    }

    pub fn as_leaf(&self) -> Option<&SerializedLeaf> {
        match self {
            Self::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }
}

/// Wire shape of container nodes: `{"type": ..., "value": ..., ...}`.
#[derive(Serialize)]
#[serde(tag = "type")]
enum WireNode<'a> {
    #[serde(rename = "list")]
    List {
        value: &'a [SerializedNode],
        readonly: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        doc: Option<&'a str>,
    },
    #[serde(rename = "dict")]
    Dict {
        value: &'a IndexMap<String, SerializedNode>,
        readonly: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        doc: Option<&'a str>,
    },
    #[serde(rename = "DataService")]
    Object {
        name: &'a str,
        value: &'a IndexMap<String, SerializedNode>,
        readonly: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        doc: Option<&'a str>,
    },
    #[serde(rename = "NumberSlider")]
    Slider {
        value: &'a SerializedNode,
        #[serde(flatten)]
        limits: SliderLimits,
        readonly: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        doc: Option<&'a str>,
    },
}

impl Serialize for SerializedNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Leaf(leaf) => leaf.serialize(serializer),
            Self::Sequence {
                items,
                readonly,
                doc,
            } => WireNode::List {
                value: items,
                readonly: *readonly,
                doc: doc.as_deref(),
            }
            .serialize(serializer),
            Self::Mapping {
                items,
                readonly,
                doc,
            } => WireNode::Dict {
                value: items,
                readonly: *readonly,
                doc: doc.as_deref(),
            }
            .serialize(serializer),
            Self::Object {
                class_name,
                members,
                readonly,
                doc,
            } => WireNode::Object {
                name: class_name,
                value: members,
                readonly: *readonly,
                doc: doc.as_deref(),
            }
            .serialize(serializer),
            Self::Widget {
                value,
                limits,
                readonly,
                doc,
            } => WireNode::Slider {
                value,
                limits: *limits,
                readonly: *readonly,
                doc: doc.as_deref(),
            }
            .serialize(serializer),
        }
    }
}

// ── Serialization from the native tree ──────────────────────────────

/// Serialize an object and everything below it. Property getters run.
pub fn serialize_object(obj: &DataObject, readonly: bool) -> SerializedNode {
    let members = obj
        .members()
        .map(|(name, member)| (name.to_owned(), serialize_member(obj, member, readonly)))
        .collect();
    SerializedNode::Object {
        class_name: obj.class_name().to_owned(),
        members,
        readonly,
        doc: obj.doc().map(str::to_owned),
    }
}

/// Serialize one member of `owner`. Properties are evaluated and marked
/// read-only; methods become signature leaves.
pub fn serialize_member(owner: &DataObject, member: &Member, readonly: bool) -> SerializedNode {
    match member {
        Member::Value(v) => serialize_value(v, readonly, None),
        Member::Property(p) => serialize_value(&p.get(owner), true, p.doc()),
        Member::Method(m) => serialize_method(m),
    }
}

/// Serialize a method as a signature leaf. Nothing is invoked.
pub fn serialize_method(method: &Method) -> SerializedNode {
    SerializedNode::Leaf(SerializedLeaf::method(method))
}

/// Serialize a detached value.
pub fn serialize_value(value: &Value, readonly: bool, doc: Option<&str>) -> SerializedNode {
    let doc_owned = || doc.map(str::to_owned);
    match value {
        Value::List(items) => SerializedNode::Sequence {
            items: items
                .iter()
                .map(|v| serialize_value(v, readonly, None))
                .collect(),
            readonly,
            doc: doc_owned(),
        },
        Value::Dict(map) => SerializedNode::Mapping {
            items: map
                .iter()
                .map(|(k, v)| (k.clone(), serialize_value(v, readonly, None)))
                .collect(),
            readonly,
            doc: doc_owned(),
        },
        Value::Object(obj) => serialize_object(obj, readonly),
        Value::Slider(slider) => SerializedNode::Widget {
            value: Box::new(serialize_value(&slider.value, readonly, None)),
            limits: SliderLimits::from(slider),
            readonly,
            doc: doc_owned(),
        },
        scalar => SerializedNode::Leaf(SerializedLeaf::scalar(scalar, readonly, doc)),
    }
}
