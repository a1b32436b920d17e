use serde::{Deserialize, Serialize};

use crate::device::ConnectedDevices;
use crate::scenario::ScenarioRecord;

/// Site id used when a request does not name one.
pub const DEFAULT_SITE_ID: &str = "default";

/// Body of `POST /generate_joi_code`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Free-text automation request, in any language the translator accepts.
    pub sentence: String,
    /// Requested model name. Ignored: the server pins its model.
    #[serde(default)]
    pub model: String,
    /// Devices on site. Empty means "reuse the remembered configuration".
    #[serde(default)]
    pub connected_devices: ConnectedDevices,
    /// Wall-clock time at the site, `YYYY-MM-DDTHH:MM:SS`.
    pub current_time: String,
    /// Extra user context forwarded verbatim to the generator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_params: Option<serde_json::Map<String, serde_json::Value>>,
    /// Which remembered site configuration to read or overwrite.
    #[serde(default = "default_site_id")]
    pub site_id: String,
}

fn default_site_id() -> String {
    DEFAULT_SITE_ID.to_string()
}

/// Response of `POST /generate_joi_code`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Validated scenarios, possibly empty.
    pub code: Vec<ScenarioRecord>,
    pub log: GenerationLog,
}

/// Timing and trace information returned with every response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationLog {
    /// Total wall-clock duration, e.g. `"1.234 seconds"`.
    pub response_time: String,
    /// Generation-only duration, same format.
    pub inference_time: String,
    /// Sentence actually sent to retrieval and generation.
    pub translated_sentence: String,
    /// Device classes offered to the generator.
    pub mapped_devices: Vec<String>,
}

/// Format a duration the way the response log reports it.
pub fn format_seconds(duration: std::time::Duration) -> String {
    format!("{:.3} seconds", duration.as_secs_f64())
}
