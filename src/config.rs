//! Session configuration loaded from JSON or the environment.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::LearnError;
use crate::types::{LearnMode, StudySetAnswerMode, DEFAULT_CORRECT_DELAY_MS, DEFAULT_ROUND_CAPACITY};

/// Per-session configuration supplied by the data layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LearnConfig {
    pub mode: LearnMode,
    pub answer_mode: StudySetAnswerMode,
    /// Terms scheduled per round
    pub round_capacity: usize,
    /// Round number shown for the first round
    pub start_round: u32,
    /// How long a correct status stays visible before the question completes
    pub correct_delay_ms: u64,
    /// Fixed RNG seed for reproducible rounds
    pub seed: Option<u64>,
}

impl Default for LearnConfig {
    fn default() -> Self {
        Self {
            mode: LearnMode::Learn,
            answer_mode: StudySetAnswerMode::Definition,
            round_capacity: DEFAULT_ROUND_CAPACITY,
            start_round: 0,
            correct_delay_ms: DEFAULT_CORRECT_DELAY_MS,
            seed: None,
        }
    }
}

impl LearnConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let mode = std::env::var("LEARN_MODE")
            .ok()
            .and_then(|value| LearnMode::from_str(&value))
            .unwrap_or(defaults.mode);

        let answer_mode = std::env::var("LEARN_ANSWER_MODE")
            .ok()
            .and_then(|value| StudySetAnswerMode::from_str(&value))
            .unwrap_or(defaults.answer_mode);

        let round_capacity = std::env::var("LEARN_ROUND_CAPACITY")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(defaults.round_capacity);

        let start_round = std::env::var("LEARN_START_ROUND")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(defaults.start_round);

        let correct_delay_ms = std::env::var("LEARN_CORRECT_DELAY_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(defaults.correct_delay_ms);

        let seed = std::env::var("LEARN_SEED")
            .ok()
            .and_then(|value| value.parse::<u64>().ok());

        Self {
            mode,
            answer_mode,
            round_capacity,
            start_round,
            correct_delay_ms,
            seed,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, LearnError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LearnError> {
        if self.round_capacity == 0 {
            return Err(LearnError::InvalidConfig(
                "roundCapacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn correct_delay(&self) -> Duration {
        Duration::from_millis(self.correct_delay_ms)
    }
}
