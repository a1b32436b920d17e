//! Remembered connected-device configuration per site.
//!
//! A request with an empty `connected_devices` map reuses the last
//! configuration seen for its site; a non-empty one replaces it.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use jg_protocol::device::ConnectedDevices;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct SiteStore {
    sites: Arc<RwLock<HashMap<String, ConnectedDevices>>>,
}

impl SiteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with `devices` for `site_id`.
    pub fn with_site(site_id: impl Into<String>, devices: ConnectedDevices) -> Self {
        let mut sites = HashMap::new();
        sites.insert(site_id.into(), devices);
        Self {
            sites: Arc::new(RwLock::new(sites)),
        }
    }

    /// Read a site file (JSON object of instance id → `{tags}`).
    pub fn load_site_file(path: impl AsRef<Path>) -> anyhow::Result<ConnectedDevices> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Devices to use for this request, remembering non-empty input.
    ///
    /// Each branch is a single critical section, so concurrent requests on
    /// the same site see either the old or the new configuration whole.
    pub async fn resolve(&self, site_id: &str, connected: ConnectedDevices) -> ConnectedDevices {
        if connected.is_empty() {
            let sites = self.sites.read().await;
            let remembered = sites.get(site_id).cloned().unwrap_or_default();
            tracing::debug!(site_id, devices = remembered.len(), "reusing remembered devices");
            remembered
        } else {
            let mut sites = self.sites.write().await;
            sites.insert(site_id.to_string(), connected.clone());
            connected
        }
    }

    pub async fn get(&self, site_id: &str) -> Option<ConnectedDevices> {
        self.sites.read().await.get(site_id).cloned()
    }

    pub async fn site_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sites.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}
