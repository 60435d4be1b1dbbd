// ── Type tags ──
//
// The closed set of node kinds every serialized node carries. The
// spellings are the ones the legacy client already understands.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Kind of a native value or serialized node.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum TypeTag {
    #[serde(rename = "NoneType")]
    #[strum(serialize = "NoneType")]
    None,
    #[serde(rename = "bool")]
    #[strum(serialize = "bool")]
    Bool,
    #[serde(rename = "int")]
    #[strum(serialize = "int")]
    Int,
    #[serde(rename = "float")]
    #[strum(serialize = "float")]
    Float,
    #[serde(rename = "str")]
    #[strum(serialize = "str")]
    Str,
    Enum,
    Quantity,
    #[serde(rename = "list")]
    #[strum(serialize = "list")]
    List,
    #[serde(rename = "dict")]
    #[strum(serialize = "dict")]
    Dict,
    #[serde(rename = "DataService")]
    #[strum(serialize = "DataService")]
    Object,
    #[serde(rename = "NumberSlider")]
    #[strum(serialize = "NumberSlider")]
    Slider,
    #[serde(rename = "method")]
    #[strum(serialize = "method")]
    Method,
}

impl TypeTag {
    /// Containers whose scalar surface is a nested `value` field.
    ///
    /// Such nodes are readable as a whole at their own path, while writes
    /// are redirected to `<path>.value`.
    pub fn is_composite_widget(self) -> bool {
        matches!(self, Self::Slider)
    }
}
