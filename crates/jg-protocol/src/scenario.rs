use serde::{Deserialize, Serialize};

/// `period` value for a scenario that runs exactly once.
pub const PERIOD_ONCE: i64 = -1;

/// `period` value for a scenario that runs continuously.
pub const PERIOD_CONTINUOUS: i64 = 0;

/// One independently triggerable unit of generated automation logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    /// Scenario name (synthesized as `ScenarioN` when the generator omits it).
    pub name: String,
    /// Five-field cron expression; empty when not time-triggered.
    #[serde(default)]
    pub cron: String,
    /// Polling interval in milliseconds (`-1` once, `0` continuous).
    pub period: i64,
    /// Scenario body, newline-terminated.
    pub code: String,
}

impl ScenarioRecord {
    pub fn new(
        name: impl Into<String>,
        cron: impl Into<String>,
        period: i64,
        code: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            cron: cron.into(),
            period,
            code: code.into(),
        }
    }

    /// Stand-in emitted when the generator output could not be parsed at all.
    pub fn placeholder() -> Self {
        Self::new(default_name(0), "", PERIOD_ONCE, "")
    }

    pub fn is_time_triggered(&self) -> bool {
        !self.cron.trim().is_empty()
    }

    pub fn is_one_shot(&self) -> bool {
        self.period == PERIOD_ONCE
    }
}

/// Name given to the scenario at `index` (0-based) when none is supplied.
pub fn default_name(index: usize) -> String {
    format!("Scenario{}", index + 1)
}
