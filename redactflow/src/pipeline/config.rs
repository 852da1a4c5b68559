//! Runner configuration.

use serde::{Deserialize, Serialize};

/// When the runner emits a `Started` marker before a stage.
///
/// A start marker for stage `i` carries progress `i/n`, the same value
/// as the completion of stage `i - 1`. Emitting it only for the first
/// stage yields exactly `0/n, 1/n, ..., n/n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartMarkerPolicy {
    /// Only completions are reported.
    Never,
    /// A marker before the first stage, then completions.
    #[default]
    FirstStage,
    /// A marker before every stage.
    EveryStage,
}

impl StartMarkerPolicy {
    /// Returns true if a marker is due before stage `index`.
    #[must_use]
    pub fn emits(self, index: usize) -> bool {
        match self {
            Self::Never => false,
            Self::FirstStage => index == 0,
            Self::EveryStage => true,
        }
    }
}

/// Configuration for [`PipelineRunner`](super::PipelineRunner).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    /// Start marker policy.
    pub start_markers: StartMarkerPolicy,
}

impl RunnerConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the start marker policy.
    #[must_use]
    pub fn with_start_markers(mut self, policy: StartMarkerPolicy) -> Self {
        self.start_markers = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_emits() {
        assert!(!StartMarkerPolicy::Never.emits(0));
        assert!(StartMarkerPolicy::FirstStage.emits(0));
        assert!(!StartMarkerPolicy::FirstStage.emits(1));
        assert!(StartMarkerPolicy::EveryStage.emits(3));
    }

    #[test]
    fn test_config_deserialize() {
        let config: RunnerConfig = serde_json::from_str(r#"{"start_markers": "every_stage"}"#).unwrap();
        assert_eq!(config.start_markers, StartMarkerPolicy::EveryStage);

        let config: RunnerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RunnerConfig::default());

        assert!(serde_json::from_str::<RunnerConfig>(r#"{"delay_ms": 1500}"#).is_err());
    }
}
