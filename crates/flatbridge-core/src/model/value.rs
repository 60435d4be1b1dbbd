// ── Native values ──
//
// The closed set of value kinds a service tree can hold. Dispatch on
// node kind happens by matching on `Value`, never by inspecting types
// at runtime.

use indexmap::IndexMap;

use super::enums::EnumMember;
use super::object::DataObject;
use super::quantity::Quantity;
use super::slider::NumberSlider;
use super::tag::TypeTag;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Enum(EnumMember),
    Quantity(Quantity),
    List(Vec<Value>),
    Dict(IndexMap<String, Value>),
    Object(DataObject),
    Slider(NumberSlider),
}

impl Value {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Self::None => TypeTag::None,
            Self::Bool(_) => TypeTag::Bool,
            Self::Int(_) => TypeTag::Int,
            Self::Float(_) => TypeTag::Float,
            Self::Str(_) => TypeTag::Str,
            Self::Enum(_) => TypeTag::Enum,
            Self::Quantity(_) => TypeTag::Quantity,
            Self::List(_) => TypeTag::List,
            Self::Dict(_) => TypeTag::Dict,
            Self::Object(_) => TypeTag::Object,
            Self::Slider(_) => TypeTag::Slider,
        }
    }

    /// Numeric view of plain numbers (not quantities).
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&DataObject> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }
}

// ── Conversions ─────────────────────────────────────────────────────

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<EnumMember> for Value {
    fn from(m: EnumMember) -> Self {
        Self::Enum(m)
    }
}

impl From<Quantity> for Value {
    fn from(q: Quantity) -> Self {
        Self::Quantity(q)
    }
}

impl From<NumberSlider> for Value {
    fn from(s: NumberSlider) -> Self {
        Self::Slider(s)
    }
}

impl From<DataObject> for Value {
    fn from(o: DataObject) -> Self {
        Self::Object(o)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::None, Into::into)
    }
}
