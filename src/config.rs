//! Solver configuration.
//!
//! Configuration is read once, before a solve starts, from JSON:
//!
//! ```
//! use sigmar_solver::config::SolverConfig;
//! use sigmar_solver::engine::TerminalRule;
//!
//! let config = SolverConfig::from_json_str(r#"{
//!     "heuristic_weights": { "remaining_elements_factor": 0.5, "metal_marbles_penalty": 1.5 },
//!     "interrupt": {
//!         "enabled": true,
//!         "condition_set": { "variable": "elapsed_time", "operator": ">", "value": 30 }
//!     },
//!     "terminal": "empty_or_lone_gold"
//! }"#).unwrap();
//!
//! assert_eq!(config.heuristic_weights.salt_marbles_reward, 0.0);
//! assert!(config.interrupt.enabled);
//! assert_eq!(config.terminal, TerminalRule::EmptyOrLoneGold);
//! ```
//!
//! Unknown keys are ignored. A missing `heuristic_weights` section means the
//! tuned defaults; a present section with missing keys means those weights
//! have no effect.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::TerminalRule;
use crate::heuristics::HeuristicWeights;
use crate::interrupt::InterruptConfig;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Everything a solve needs besides the board.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SolverConfig {
    #[serde(default)]
    pub heuristic_weights: HeuristicWeights,

    #[serde(default)]
    pub interrupt: InterruptConfig,

    #[serde(default)]
    pub terminal: TerminalRule,
}

impl SolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and validates configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns error if the file can't be read, isn't valid JSON, or fails
    /// [`SolverConfig::validate`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Parses and validates configuration from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: SolverConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Replaces the interrupt policy with one read from its own JSON file.
    pub fn with_interrupt_file(mut self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let interrupt: InterruptConfig = serde_json::from_str(&contents)?;
        interrupt.validate()?;
        self.interrupt = interrupt;
        Ok(self)
    }

    pub fn with_weights(mut self, weights: HeuristicWeights) -> Self {
        self.heuristic_weights = weights;
        self
    }

    pub fn with_interrupt(mut self, interrupt: InterruptConfig) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Adds a wall-clock limit only when no interrupt policy is enabled.
    pub fn with_default_time_limit(mut self, seconds: f64) -> Self {
        if !self.interrupt.enabled {
            self.interrupt = self.interrupt.with_time_limit(seconds);
        }
        self
    }

    pub fn with_terminal(mut self, terminal: TerminalRule) -> Self {
        self.terminal = terminal;
        self
    }

    /// Checks the values serde cannot: finite weights and a usable interrupt tree.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for name in HeuristicWeights::NAMES {
            let value = self.heuristic_weights.get(name).unwrap_or_default();
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "heuristic weight {} is not a finite number",
                    name
                )));
            }
        }
        self.interrupt.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interrupt::{Comparison, Condition, Statistic};
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = SolverConfig::default();
        assert_eq!(config.heuristic_weights, HeuristicWeights::default());
        assert!(!config.interrupt.enabled);
        assert_eq!(config.terminal, TerminalRule::Empty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = SolverConfig::from_json_str("{}").unwrap();
        assert_eq!(config, SolverConfig::default());
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let json = r#"{
            "grid_radius": 5,
            "heuristic_weights": { "locked_marbles_penalty": 0.3, "bonus": 1 }
        }"#;
        let config = SolverConfig::from_json_str(json).unwrap();
        assert_eq!(config.heuristic_weights.locked_marbles_penalty, 0.3);
        assert_eq!(config.heuristic_weights.remaining_elements_factor, 0.0);
    }

    #[test]
    fn test_invalid_json() {
        let err = SolverConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_enabled_interrupt_without_tree_rejected() {
        let err =
            SolverConfig::from_json_str(r#"{ "interrupt": { "enabled": true } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_default_time_limit_keeps_configured_policy() {
        let config = SolverConfig::new().with_default_time_limit(60.0);
        assert!(config.interrupt.enabled);
        assert_eq!(
            config.interrupt.condition_set,
            Some(Condition::leaf(Statistic::ElapsedTime, Comparison::Greater, 60.0))
        );

        let own = InterruptConfig::new(Condition::leaf(
            Statistic::Iteration,
            Comparison::Greater,
            5.0,
        ));
        let config = SolverConfig::new()
            .with_interrupt(own.clone())
            .with_default_time_limit(60.0);
        assert_eq!(config.interrupt, own);
    }

    #[test]
    fn test_load_missing_file() {
        let err = SolverConfig::load("/definitely/not/here/solver.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "heuristic_weights": {{ "salt_marbles_reward": 2.0 }}, "terminal": "empty" }}"#
        )
        .unwrap();
        let config = SolverConfig::load(file.path()).unwrap();
        assert_eq!(config.heuristic_weights.salt_marbles_reward, 2.0);
    }

    #[test]
    fn test_with_interrupt_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "enabled": true, "condition_set": {{ "logic": "AND", "conditions": [
                {{ "variable": "iteration", "operator": ">", "value": 500 }}
            ] }} }}"#
        )
        .unwrap();
        let config = SolverConfig::new().with_interrupt_file(file.path()).unwrap();
        assert!(config.interrupt.enabled);
        assert_eq!(
            config.interrupt.condition_set,
            Some(Condition::all(vec![Condition::leaf(
                Statistic::Iteration,
                Comparison::Greater,
                500.0
            )]))
        );
    }
}
