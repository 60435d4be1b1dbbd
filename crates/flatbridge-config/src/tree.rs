// ── Tree definition files ──
//
// A tree file declares the enum types a service uses and the initial
// contents of its root object, as TOML or JSON:
//
//     name = "Device"
//
//     [enums]
//     Mode = ["OFF", "ON"]
//
//     [members]
//     mode = { kind = "enum", type = "Mode", value = "OFF" }
//     gain = { kind = "quantity", magnitude = 2.0, unit = "dB" }
//     label = "bench supply"
//
// Plain scalars and arrays map directly; tables without a `kind` become
// mappings. Enum types are registered in declaration order, which fixes
// their ordinals for the lifetime of the process.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value as Json;
use tracing::debug;

use flatbridge_core::coerce;
use flatbridge_core::path::is_identifier;
use flatbridge_core::{BridgeError, DataObject, EnumRegistry, NumberSlider, Quantity, Value};

use crate::ConfigError;

// ── Definition types ────────────────────────────────────────────────

/// Top level of a tree file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TreeDefinition {
    /// Class name of the root object.
    #[serde(default = "default_root_name")]
    pub name: String,
    #[serde(default)]
    pub doc: Option<String>,
    /// Enum types, name -> members in declaration order.
    #[serde(default)]
    pub enums: IndexMap<String, Vec<String>>,
    #[serde(default)]
    pub members: IndexMap<String, ValueSpec>,
}

fn default_root_name() -> String {
    "DataService".into()
}

/// One value in a tree file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ValueSpec {
    Tagged(TaggedSpec),
    Array(Vec<ValueSpec>),
    Plain(Json),
}

/// Values that need more than a bare scalar to describe.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaggedSpec {
    Enum {
        #[serde(rename = "type")]
        enum_type: String,
        /// Member name or ordinal.
        value: Json,
    },
    Quantity {
        magnitude: f64,
        unit: String,
    },
    Slider {
        value: Box<ValueSpec>,
        min: f64,
        max: f64,
        #[serde(default = "default_step_size")]
        step_size: f64,
    },
    Object {
        class: String,
        #[serde(default)]
        doc: Option<String>,
        #[serde(default)]
        members: IndexMap<String, ValueSpec>,
    },
    List {
        #[serde(default)]
        items: Vec<ValueSpec>,
    },
    Dict {
        #[serde(default)]
        items: IndexMap<String, ValueSpec>,
    },
}

fn default_step_size() -> f64 {
    1.0
}

// ── Parsing ─────────────────────────────────────────────────────────

impl TreeDefinition {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read a `.toml` or `.json` tree file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let parse: fn(&str) -> Result<Self, ConfigError> = match extension.as_deref() {
            Some("toml") => Self::from_toml_str,
            Some("json") => Self::from_json_str,
            _ => {
                return Err(ConfigError::UnsupportedFormat {
                    path: path.to_path_buf(),
                });
            }
        };
        let text = std::fs::read_to_string(path)?;
        parse(&text)
    }

    /// Register the declared enums and build the root object.
    pub fn build(&self, registry: &EnumRegistry) -> Result<DataObject, ConfigError> {
        for (name, members) in &self.enums {
            registry.register(name, members.iter().map(String::as_str))?;
        }

        let mut root = build_object(&self.name, &self.members, registry, "members")?;
        if let Some(doc) = &self.doc {
            root = root.with_doc(doc.as_str());
        }
        debug!(
            class = %self.name,
            members = root.len(),
            enums = self.enums.len(),
            "tree definition built"
        );
        Ok(root)
    }
}

/// Load a tree file into a fresh registry.
pub fn load_tree(path: &Path) -> Result<(DataObject, Arc<EnumRegistry>), ConfigError> {
    let definition = TreeDefinition::from_path(path)?;
    let registry = Arc::new(EnumRegistry::new());
    let root = definition.build(&registry)?;
    Ok((root, registry))
}

// ── Building ────────────────────────────────────────────────────────

fn build_object(
    class: &str,
    members: &IndexMap<String, ValueSpec>,
    registry: &EnumRegistry,
    at: &str,
) -> Result<DataObject, ConfigError> {
    let mut object = DataObject::new(class);
    for (name, spec) in members {
        if !is_identifier(name) {
            return Err(ConfigError::Validation {
                field: format!("{at}.{name}"),
                reason: "member names must be identifiers".into(),
            });
        }
        let value = build_value(spec, registry, &format!("{at}.{name}"))?;
        object = object.with_value(name.as_str(), value);
    }
    Ok(object)
}

fn build_value(spec: &ValueSpec, registry: &EnumRegistry, at: &str) -> Result<Value, ConfigError> {
    match spec {
        ValueSpec::Plain(json) => Ok(coerce::plain(json)),
        ValueSpec::Array(items) => build_list(items, registry, at),
        ValueSpec::Tagged(tagged) => build_tagged(tagged, registry, at),
    }
}

fn build_list(items: &[ValueSpec], registry: &EnumRegistry, at: &str) -> Result<Value, ConfigError> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| build_value(item, registry, &format!("{at}[{i}]")))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::List)
}

fn build_tagged(spec: &TaggedSpec, registry: &EnumRegistry, at: &str) -> Result<Value, ConfigError> {
    match spec {
        TaggedSpec::Enum { enum_type, value } => {
            let descriptor = registry.get(enum_type).ok_or_else(|| BridgeError::UnknownEnum {
                name: enum_type.clone(),
            })?;
            let first = descriptor.at(0).ok_or_else(|| ConfigError::Validation {
                field: at.to_owned(),
                reason: format!("enum {enum_type} has no members"),
            })?;
            Ok(coerce::from_wire(value, &Value::Enum(first))?)
        }
        TaggedSpec::Quantity { magnitude, unit } => {
            Ok(Value::Quantity(Quantity::new(*magnitude, unit.as_str())))
        }
        TaggedSpec::Slider {
            value,
            min,
            max,
            step_size,
        } => {
            if min > max {
                return Err(ConfigError::Validation {
                    field: at.to_owned(),
                    reason: format!("slider min {min} is greater than max {max}"),
                });
            }
            let inner = build_value(value, registry, &format!("{at}.value"))?;
            if !matches!(inner, Value::Int(_) | Value::Float(_) | Value::Quantity(_)) {
                return Err(ConfigError::Validation {
                    field: format!("{at}.value"),
                    reason: format!("slider value must be numeric, got {}", inner.type_tag()),
                });
            }
            Ok(Value::Slider(NumberSlider::new(inner, *min, *max, *step_size)))
        }
        TaggedSpec::Object {
            class,
            doc,
            members,
        } => {
            let mut object = build_object(class, members, registry, at)?;
            if let Some(doc) = doc {
                object = object.with_doc(doc.as_str());
            }
            Ok(Value::Object(object))
        }
        TaggedSpec::List { items } => build_list(items, registry, at),
        TaggedSpec::Dict { items } => items
            .iter()
            .map(|(key, item)| {
                build_value(item, registry, &format!("{at}[\"{key}\"]")).map(|v| (key.clone(), v))
            })
            .collect::<Result<IndexMap<_, _>, _>>()
            .map(Value::Dict),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use flatbridge_core::TypeTag;

    const DEVICE: &str = r#"
name = "Device"
doc = "Bench power supply"

[enums]
Mode = ["OFF", "ON", "AUTO"]

[members]
mode = { kind = "enum", type = "Mode", value = "ON" }
gain = { kind = "quantity", magnitude = 2.0, unit = "dB" }
label = "bench"
channels = [1, 2, 3]
limits = { low = 0.5, high = 4.5 }

[members.panel]
kind = "object"
class = "Panel"

[members.panel.members.slider]
kind = "slider"
value = { kind = "quantity", magnitude = 1.0, unit = "V" }
min = 0.0
max = 5.0
step_size = 0.1
"#;

    #[test]
    fn builds_tree_from_toml() {
        let registry = EnumRegistry::new();
        let root = TreeDefinition::from_toml_str(DEVICE)
            .unwrap()
            .build(&registry)
            .unwrap();

        assert_eq!(root.class_name(), "Device");
        assert_eq!(root.doc(), Some("Bench power supply"));
        let names: Vec<_> = root.members().map(|(n, _)| n).collect();
        assert_eq!(names, ["mode", "gain", "label", "channels", "limits", "panel"]);

        assert_eq!(coerce::to_wire(root.value("mode").unwrap()), json!("ON"));
        assert_eq!(root.value("gain").unwrap().type_tag(), TypeTag::Quantity);
        assert_eq!(root.value("limits").unwrap().type_tag(), TypeTag::Dict);
        let panel = root.value("panel").unwrap().as_object().unwrap();
        assert_eq!(panel.value("slider").unwrap().type_tag(), TypeTag::Slider);
        assert_eq!(registry.get("Mode").unwrap().len(), 3);
    }

    #[test]
    fn builds_tree_from_json() {
        let text = json!({
            "name": "Rig",
            "enums": {"Range": ["LOW", "HIGH"]},
            "members": {
                "range": {"kind": "enum", "type": "Range", "value": 1},
                "items": {"kind": "list", "items": [
                    {"kind": "object", "class": "Probe", "members": {"id": 7}}
                ]}
            }
        })
        .to_string();

        let root = TreeDefinition::from_json_str(&text)
            .unwrap()
            .build(&EnumRegistry::new())
            .unwrap();

        assert_eq!(coerce::to_wire(root.value("range").unwrap()), json!("HIGH"));
        let Some(Value::List(items)) = root.value("items") else {
            panic!("expected list");
        };
        assert_eq!(items[0].type_tag(), TypeTag::Object);
    }

    #[test]
    fn rejects_unknown_enum_types() {
        let text = r#"
[members]
mode = { kind = "enum", type = "Missing", value = 0 }
"#;
        let err = TreeDefinition::from_toml_str(text)
            .unwrap()
            .build(&EnumRegistry::new())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Tree(BridgeError::UnknownEnum { .. })));
    }

    #[test]
    fn rejects_out_of_range_enum_ordinals() {
        let text = r#"
[enums]
Mode = ["OFF", "ON"]

[members]
mode = { kind = "enum", type = "Mode", value = 5 }
"#;
        let err = TreeDefinition::from_toml_str(text)
            .unwrap()
            .build(&EnumRegistry::new())
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Tree(BridgeError::OrdinalOutOfRange { .. })
        ));
    }

    #[test]
    fn rejects_non_identifier_member_names() {
        let text = r#"
[members]
"bad name" = 1
"#;
        let err = TreeDefinition::from_toml_str(text)
            .unwrap()
            .build(&EnumRegistry::new())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn rejects_inverted_slider_bounds() {
        let text = r#"
[members.s]
kind = "slider"
value = 1.0
min = 5.0
max = 0.0
"#;
        let err = TreeDefinition::from_toml_str(text)
            .unwrap()
            .build(&EnumRegistry::new())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }
}
