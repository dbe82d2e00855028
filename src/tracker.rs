//! Correctness Tracker
//!
//! Owns the per-term mastery state and its transition rules:
//!
//! - Unstudied only before the first presentation
//! - Choice answers need two correct grades (→ Familiar → Mastered)
//! - Recall answers and overrides master in one step
//! - Mastered is terminal

use tracing::warn;

use crate::types::{Correctness, QuestionKind};

/// Mutable learning progress of one term
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TermProgress {
    pub correctness: Correctness,
    pub incorrect_count: u32,
    /// Round in which the term was first scheduled
    pub appeared_in_round: Option<u32>,
}

impl TermProgress {
    pub fn is_mastered(&self) -> bool {
        self.correctness == Correctness::Mastered
    }
}

/// Apply a correct answer. Returns the new state.
pub fn record_correct(progress: &mut TermProgress, kind: QuestionKind) -> Correctness {
    if progress.is_mastered() {
        warn!("ignoring correct grade for a mastered term");
        return progress.correctness;
    }
    progress.correctness = match (kind, progress.correctness) {
        (QuestionKind::Choice, Correctness::Familiar) => Correctness::Mastered,
        (QuestionKind::Choice, _) => Correctness::Familiar,
        (QuestionKind::Write, _) => Correctness::Mastered,
    };
    progress.correctness
}

/// Apply a wrong answer.
pub fn record_incorrect(progress: &mut TermProgress) -> Correctness {
    if progress.is_mastered() {
        warn!("ignoring incorrect grade for a mastered term");
        return progress.correctness;
    }
    progress.correctness = Correctness::Missed;
    progress.incorrect_count += 1;
    progress.correctness
}

/// Force mastery after a contested miss or a positive self-grade.
pub fn override_to_correct(progress: &mut TermProgress) -> Correctness {
    progress.correctness = Correctness::Mastered;
    progress.correctness
}

/// Undo the miss count of a grade the learner successfully contested.
pub fn retract_miss(progress: &mut TermProgress) {
    progress.incorrect_count = progress.incorrect_count.saturating_sub(1);
}
