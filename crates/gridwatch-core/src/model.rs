// ── Device model ──
//
// Devices are supplied once at startup by the server-rendered page state
// and are never mutated by the core. The directory preserves the
// server's ordering, which breaks ties when feeds are name-sorted.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Stable identifier of a camera/monitor device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A camera/monitor entity, read-only from the core's perspective.
///
/// Only the fields the core consumes are typed; everything else the
/// server includes rides along in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    #[serde(default)]
    pub enable: bool,
    /// Whether the feed starts muted.
    #[serde(default = "default_muted")]
    pub muted: bool,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

fn default_muted() -> bool {
    true
}

/// The full device directory, keyed by id, in server order.
pub type DeviceDirectory = IndexMap<DeviceId, Device>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_parses_server_state() {
        let device: Device = serde_json::from_str(
            r#"{"id": "cam1", "name": "Front", "enable": true, "extra_field": 7}"#,
        )
        .unwrap();

        assert_eq!(device.id, DeviceId::from("cam1"));
        assert_eq!(device.name, "Front");
        assert!(device.enable);
        assert!(device.muted);
        assert_eq!(device.extra["extra_field"], 7);
    }

    #[test]
    fn disabled_by_default() {
        let device: Device = serde_json::from_str(r#"{"id": "cam1", "name": "Front"}"#).unwrap();
        assert!(!device.enable);
    }
}
