//! Router configuration parameters
//!
//! Cycle timings and the analysis-mode switch.  The first four fields can be
//! changed at runtime by the host through `SETTINGS {json}`; the rest are
//! station constants fixed at construction.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Longest duration the host may set for any cylinder timing.
pub const MAX_DURATION_MS: u32 = 60_000;

/// Core router configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    // --- Host-tunable ---
    /// Minimum time the push cylinder stays extended (ms)
    pub push_time_ms: u32,
    /// Time allowed for the riser to lift the part (ms)
    pub riser_time_ms: u32,
    /// Time the ejection cylinder stays extended (ms)
    pub ejection_time_ms: u32,
    /// Whether raised parts are handed to the analysis controller
    pub analysis_mode: bool,

    // --- Station constants ---
    /// Wait between sensor trigger and push (ms)
    pub sensor_delay_ms: u32,
    /// Fail-open deadline for an analysis verdict (ms)
    pub analysis_timeout_ms: u32,
    /// Settle time after lowering before the next cycle (ms)
    pub cycle_delay_ms: u32,
    /// Presence sensor settle interval (ms)
    pub debounce_ms: u32,
    /// Period of the unsolicited `STATE` report (ms)
    pub status_interval_ms: u32,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            push_time_ms: 3000,
            riser_time_ms: 3000,
            ejection_time_ms: 1000,
            analysis_mode: true,

            sensor_delay_ms: 300,
            analysis_timeout_ms: 10_000,
            cycle_delay_ms: 1000,
            debounce_ms: 50,
            status_interval_ms: 1000,
        }
    }
}

impl RouterConfig {
    /// Apply a single field update.  Returns `true` if the value changed.
    pub fn apply(&mut self, update: ConfigUpdate) -> bool {
        let changed = self.get(update.field()) != update;
        match update {
            ConfigUpdate::PushTime(ms) => self.push_time_ms = ms,
            ConfigUpdate::RiserTime(ms) => self.riser_time_ms = ms,
            ConfigUpdate::EjectionTime(ms) => self.ejection_time_ms = ms,
            ConfigUpdate::AnalysisMode(on) => self.analysis_mode = on,
        }
        changed
    }

    /// Current value of a host-tunable field.
    pub fn get(&self, field: ConfigField) -> ConfigUpdate {
        match field {
            ConfigField::PushTime => ConfigUpdate::PushTime(self.push_time_ms),
            ConfigField::RiserTime => ConfigUpdate::RiserTime(self.riser_time_ms),
            ConfigField::EjectionTime => ConfigUpdate::EjectionTime(self.ejection_time_ms),
            ConfigField::AnalysisMode => ConfigUpdate::AnalysisMode(self.analysis_mode),
        }
    }

    /// Range-check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for field in ConfigField::ALL {
            self.get(field).validate()?;
        }
        if self.status_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "status_interval_ms must be > 0",
            ));
        }
        if self.analysis_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "analysis_timeout_ms must be > 0",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Field-level updates
// ---------------------------------------------------------------------------

/// The host-tunable fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    PushTime,
    RiserTime,
    EjectionTime,
    AnalysisMode,
}

impl ConfigField {
    pub const ALL: [ConfigField; 4] = [
        Self::PushTime,
        Self::RiserTime,
        Self::EjectionTime,
        Self::AnalysisMode,
    ];

    /// Key used on the wire.
    pub fn key(self) -> &'static str {
        match self {
            Self::PushTime => "pushTime",
            Self::RiserTime => "riserTime",
            Self::EjectionTime => "ejectionTime",
            Self::AnalysisMode => "analysisMode",
        }
    }
}

/// A single `(field, value)` change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigUpdate {
    PushTime(u32),
    RiserTime(u32),
    EjectionTime(u32),
    AnalysisMode(bool),
}

impl ConfigUpdate {
    pub fn field(self) -> ConfigField {
        match self {
            Self::PushTime(_) => ConfigField::PushTime,
            Self::RiserTime(_) => ConfigField::RiserTime,
            Self::EjectionTime(_) => ConfigField::EjectionTime,
            Self::AnalysisMode(_) => ConfigField::AnalysisMode,
        }
    }

    pub fn validate(self) -> Result<(), ConfigError> {
        match self {
            Self::PushTime(ms) if ms > MAX_DURATION_MS => Err(ConfigError::ValidationFailed(
                "pushTime must be 0–60000 ms",
            )),
            Self::RiserTime(ms) if ms > MAX_DURATION_MS => Err(ConfigError::ValidationFailed(
                "riserTime must be 0–60000 ms",
            )),
            Self::EjectionTime(ms) if ms > MAX_DURATION_MS => Err(
                ConfigError::ValidationFailed("ejectionTime must be 0–60000 ms"),
            ),
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Host settings patch
// ---------------------------------------------------------------------------

/// Body of a `SETTINGS {json}` line.  Absent keys leave the field untouched;
/// unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub push_time: Option<u32>,
    pub riser_time: Option<u32>,
    pub ejection_time: Option<u32>,
    pub analysis_mode: Option<bool>,
}

impl SettingsPatch {
    /// Parse the JSON body of a `SETTINGS` line.
    pub fn from_json(body: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(body).map_err(|_| ConfigError::Malformed)
    }

    /// Validate every present field, then return the updates.
    ///
    /// All-or-nothing: one bad field rejects the whole patch.
    pub fn into_updates(self) -> Result<heapless::Vec<ConfigUpdate, 4>, ConfigError> {
        let candidates = [
            self.push_time.map(ConfigUpdate::PushTime),
            self.riser_time.map(ConfigUpdate::RiserTime),
            self.ejection_time.map(ConfigUpdate::EjectionTime),
            self.analysis_mode.map(ConfigUpdate::AnalysisMode),
        ];

        let mut updates = heapless::Vec::new();
        for update in candidates.into_iter().flatten() {
            update.validate()?;
            // Capacity equals the number of candidate fields.
            let _ = updates.push(update);
        }
        if updates.is_empty() {
            return Err(ConfigError::Empty);
        }
        Ok(updates)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The settings body is not valid JSON or has wrong value types.
    Malformed,
    /// The settings body carried no recognised keys.
    Empty,
    /// A field failed range validation.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed settings"),
            Self::Empty => write!(f, "no recognised settings"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}
