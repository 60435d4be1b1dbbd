// ── Runtime bridge configuration ──
//
// These types describe how a bridge behaves once running. They never
// touch disk: the CLI (or any other host) builds a `BridgeConfig`
// and hands it in.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// What `set_param` does with a write that fails to resolve or coerce.
///
/// Legacy clients treat writes as fire-and-forget, so the historical
/// behavior is to log the failure and report success.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum WritePolicy {
    /// Log a warning and return `Ok(())`.
    #[default]
    LogAndIgnore,
    /// Return the error to the caller.
    Surface,
}

/// Configuration for one bridged service.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    /// Name reported by `name()`. Falls back to the root class name.
    pub service_name: Option<String>,
    pub write_policy: WritePolicy,
    /// Buffer size of the change-event channel. Slow bridges that fall
    /// further behind than this skip events (and log how many).
    pub event_capacity: usize,
    /// Free-form key/value pairs returned by `info()`.
    pub info: IndexMap<String, String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            service_name: None,
            write_policy: WritePolicy::default(),
            event_capacity: 256,
            info: IndexMap::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn write_policy_spellings() {
        assert_eq!(WritePolicy::from_str("surface").unwrap(), WritePolicy::Surface);
        assert_eq!(WritePolicy::LogAndIgnore.to_string(), "log-and-ignore");
        assert_eq!(
            serde_json::from_str::<WritePolicy>("\"log-and-ignore\"").unwrap(),
            WritePolicy::LogAndIgnore
        );
    }
}
