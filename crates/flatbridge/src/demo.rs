//! Built-in demo service, served when neither `--tree` nor the config
//! names a definition file.
//!
//! Tree files only carry stored values, so this is also where a computed
//! property and callable methods can be tried out.

use std::sync::Arc;

use indexmap::IndexMap;

use flatbridge_core::{
    BridgeError, DataObject, EnumRegistry, NumberSlider, Quantity, TypeTag, Value,
};

/// A small bench power supply.
pub fn service_tree() -> Result<(DataObject, Arc<EnumRegistry>), BridgeError> {
    let enums = Arc::new(EnumRegistry::new());
    let mode = enums.register("OutputMode", ["OFF", "ON", "STANDBY"])?;
    let range = enums.register("Range", ["LOW", "MID", "HIGH"])?;

    let channel = |label: &str| -> Result<DataObject, BridgeError> {
        let low = range
            .at(0)
            .ok_or_else(|| BridgeError::Internal("Range has no members".into()))?;
        Ok(DataObject::new("Channel")
            .with_value("label", label)
            .with_value("gain", Quantity::new(0.0, "dB"))
            .with_value("range", low))
    };

    let mut calibration = IndexMap::new();
    calibration.insert("offset".to_owned(), Value::Float(0.0));
    calibration.insert("scale".to_owned(), Value::Float(1.0));

    let panel = DataObject::new("Panel")
        .with_doc("Front panel controls")
        .with_value(
            "brightness",
            NumberSlider::new(Quantity::new(50.0, "percent"), 0.0, 100.0, 5.0),
        )
        .with_value("calibration", Value::Dict(calibration));

    let off = mode
        .at(0)
        .ok_or_else(|| BridgeError::Internal("OutputMode has no members".into()))?;

    let root = DataObject::new("PowerSupply")
        .with_doc("Bench power supply")
        .with_value("mode", off)
        .with_value("voltage", Quantity::new(5.0, "volt"))
        .with_value("current", Quantity::new(0.5, "ampere"))
        .with_value("enabled", false)
        .with_value("panel", panel)
        .with_value("channels", vec![channel("A")?, channel("B")?])
        .with_property("power", |o| {
            let magnitude = |name: &str| match o.value(name) {
                Some(Value::Quantity(q)) => q.magnitude,
                _ => 0.0,
            };
            Quantity::new(magnitude("voltage") * magnitude("current"), "watt").into()
        })
        .with_member_doc("power", "Output power, voltage times current")
        .with_method(
            "scale",
            [("value", TypeTag::Float), ("factor", TypeTag::Float)],
            |args| match args {
                [a, b] => match (a.as_f64(), b.as_f64()) {
                    (Some(a), Some(b)) => Ok(Value::Float(a * b)),
                    _ => Err(BridgeError::Invocation {
                        path: "scale".into(),
                        message: "both arguments must be numbers".into(),
                    }),
                },
                _ => Ok(Value::None),
            },
        )
        .with_method("identify", Vec::<String>::new(), |_| {
            Ok(Value::from("flatbridge demo power supply"))
        })
        .with_member_doc("identify", "Identification string");

    Ok((root, enums))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use flatbridge_core::{BridgeConfig, DataService, NotificationBridge, RpcInterface};
    use serde_json::json;

    use super::*;

    fn demo() -> RpcInterface {
        let (root, enums) = service_tree().unwrap();
        let service = Arc::new(DataService::new(root).with_enums(enums).unwrap());
        RpcInterface::new(NotificationBridge::new(service), BridgeConfig::default())
    }

    #[test]
    fn demo_exposes_every_leaf_kind() {
        let props = demo().get_props();
        assert_eq!(props["mode"].value, json!("OFF"));
        assert_eq!(props["voltage"].unit.as_deref(), Some("volt"));
        assert_eq!(props["panel.brightness"].value, json!(50.0));
        assert_eq!(props["panel.calibration[\"scale\"]"].value, json!(1.0));
        assert_eq!(props["channels[1].label"].value, json!("B"));
        assert_eq!(props["power"].value, json!(2.5));
        assert!(props["power"].readonly);
        assert!(props.contains_key("identify"));
        assert_eq!(
            props["scale"].parameters.as_ref().unwrap()["factor"].as_deref(),
            Some("float")
        );
    }

    #[test]
    fn demo_methods_are_callable() {
        let rpc = demo();
        assert_eq!(
            rpc.remote_call("scale", &[json!(2), json!(1.5)]).unwrap(),
            json!(3.0)
        );
        assert_eq!(
            rpc.remote_call("identify", &[]).unwrap(),
            json!("flatbridge demo power supply")
        );
    }
}
