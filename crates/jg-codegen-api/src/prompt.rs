//! Generator prompt assembly.

use serde_json::{Map, Value};

/// System and user messages sent to the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    /// Grammar rules followed by the offered device documents, then the
    /// request itself. `other_params` is appended as pretty JSON when
    /// non-empty.
    pub fn build(
        grammar: &str,
        service_doc: &str,
        current_time: &str,
        sentence: &str,
        other_params: Option<&Map<String, Value>>,
    ) -> Self {
        let system = format!("{grammar}\n<DEVICES>\n{service_doc}\n</DEVICES>");

        let mut user = format!("Current Time: {current_time}\n\nGenerate JOI Lang code for \"{sentence}\"");
        if let Some(params) = other_params.filter(|p| !p.is_empty()) {
            let pretty = serde_json::to_string_pretty(params).unwrap_or_else(|_| "{}".to_string());
            user.push_str(&format!("\n\n<USER_INFO>\n{pretty}\n</USER_INFO>"));
        }

        Self { system, user }
    }
}
