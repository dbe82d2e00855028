//! Error types for the learn session.

use thiserror::Error;

use crate::types::SessionPhase;

#[derive(Debug, Error)]
pub enum LearnError {
    #[error("{operation} is not allowed while the session is {phase:?}")]
    InvalidPhase {
        operation: &'static str,
        phase: SessionPhase,
    },
    #[error("question {got} does not match the current question {expected}")]
    QuestionMismatch { expected: usize, got: usize },
    #[error("session already completed")]
    SessionCompleted,

    #[error("no question at cursor {cursor} (timeline has {timeline_len})")]
    NoActiveQuestion { cursor: usize, timeline_len: usize },
    #[error("familiar term {term_id} has no appearance round")]
    MissingAppearance { term_id: String },

    #[error("duplicate term id: {0}")]
    DuplicateTerm(String),
    #[error("unknown term id: {0}")]
    UnknownTerm(String),
    #[error("round number overflows after round {round}")]
    RoundOverflow { round: u32 },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl LearnError {
    /// Scheduling bugs that leave the session corrupted. Callers should
    /// discard the session instead of retrying.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            LearnError::NoActiveQuestion { .. } | LearnError::MissingAppearance { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invariant_classification() {
        assert!(LearnError::NoActiveQuestion { cursor: 3, timeline_len: 3 }.is_invariant_violation());
        assert!(LearnError::MissingAppearance { term_id: "t1".into() }.is_invariant_violation());
        assert!(!LearnError::SessionCompleted.is_invariant_violation());
        assert!(!LearnError::QuestionMismatch { expected: 0, got: 1 }.is_invariant_violation());
        assert!(!LearnError::RoundOverflow { round: u32::MAX }.is_invariant_violation());
    }

    #[test]
    fn test_error_messages() {
        let err = LearnError::InvalidPhase {
            operation: "next_round",
            phase: SessionPhase::Presenting,
        };
        assert_eq!(
            err.to_string(),
            "next_round is not allowed while the session is Presenting"
        );
        assert_eq!(
            LearnError::QuestionMismatch { expected: 2, got: 0 }.to_string(),
            "question 0 does not match the current question 2"
        );
    }
}
