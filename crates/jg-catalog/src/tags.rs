//! Site tag resolution: which auxiliary tags accompany which device class.

use std::collections::{BTreeMap, BTreeSet};

use jg_protocol::device::{ConnectedDevices, TagSet};

use crate::vocabulary::Vocabulary;

/// Device-class tag → auxiliary tags observed alongside it on site.
pub type TagDeviceMap = BTreeMap<String, BTreeSet<String>>;

/// Tag inventory derived from one request's connected devices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteTags {
    pub tag_device: TagDeviceMap,
    /// Distinct tag combinations, one per physically distinct device kind.
    pub tag_sets: BTreeSet<TagSet>,
}

impl SiteTags {
    /// Device classes with at least one connected instance.
    pub fn available_classes(&self) -> BTreeSet<String> {
        self.tag_device.keys().cloned().collect()
    }

    pub fn is_available(&self, class: &str) -> bool {
        self.tag_device.contains_key(class)
    }

    /// Auxiliary tags seen with `class`, empty when the class is absent.
    pub fn aux_tags(&self, class: &str) -> impl Iterator<Item = &str> {
        self.tag_device
            .get(class)
            .into_iter()
            .flat_map(|tags| tags.iter().map(String::as_str))
    }

    /// Whether any connected device carries `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag_sets.iter().any(|set| set.contains(tag))
    }

    /// Whether some connected device carries every tag in `selector`.
    pub fn admits(&self, selector: &TagSet) -> bool {
        self.tag_sets.iter().any(|set| selector.is_subset(set))
    }
}

/// Partition every distinct connected tag set into class tags and auxiliary
/// tags, accumulating the auxiliary tags per class.
///
/// The result does not depend on the order devices are listed in.
pub fn resolve_tags(connected: &ConnectedDevices, vocabulary: &Vocabulary) -> SiteTags {
    let tag_sets: BTreeSet<TagSet> = connected.values().map(|d| d.tag_set()).collect();

    let mut tag_device = TagDeviceMap::new();
    for set in &tag_sets {
        let (class_tags, aux_tags): (Vec<&String>, Vec<&String>) =
            set.iter().partition(|tag| vocabulary.contains(tag));

        for class in class_tags {
            tag_device
                .entry(class.clone())
                .or_default()
                .extend(aux_tags.iter().map(|t| (*t).clone()));
        }
    }

    tracing::debug!(
        devices = connected.len(),
        tag_sets = tag_sets.len(),
        classes = tag_device.len(),
        "site tags resolved"
    );

    SiteTags {
        tag_device,
        tag_sets,
    }
}
