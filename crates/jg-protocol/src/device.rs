use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// The exact combination of tags on one physical device.
///
/// Ordered so two instances carrying the same tags compare equal
/// regardless of the order the site reported them in.
pub type TagSet = BTreeSet<String>;

/// One device physically connected to a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedDevice {
    /// Tags attached to the device: one device-class tag plus any
    /// auxiliary tags (room, group, greenhouse, ...).
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ConnectedDevice {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// Deduplicated, order-independent view of the tags.
    pub fn tag_set(&self) -> TagSet {
        self.tags.iter().cloned().collect()
    }
}

/// Connected devices of a site, keyed by instance id.
pub type ConnectedDevices = BTreeMap<String, ConnectedDevice>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_set_ignores_order_and_duplicates() {
        let a = ConnectedDevice::new(["Light", "livingroom"]);
        let b = ConnectedDevice::new(["livingroom", "Light", "Light"]);
        assert_eq!(a.tag_set(), b.tag_set());
        assert_eq!(a.tag_set().len(), 2);
    }

    #[test]
    fn deserialize_connected_devices() {
        let json = r#"{
            "d1": {"tags": ["Light", "livingroom"]},
            "d2": {"tags": ["Window"], "vendor": "acme"}
        }"#;
        let devices: ConnectedDevices = serde_json::from_str(json).unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices["d1"].tags, vec!["Light", "livingroom"]);
        assert_eq!(devices["d2"].tags, vec!["Window"]);
    }

    #[test]
    fn missing_tags_defaults_to_empty() {
        let device: ConnectedDevice = serde_json::from_str("{}").unwrap();
        assert!(device.tags.is_empty());
    }
}
