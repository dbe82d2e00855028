//! Round Scheduler
//!
//! Decides which studiable terms appear in a round. Tiers, highest first:
//!
//! 1. Missed terms
//! 2. Familiar terms whose cool-down has elapsed
//! 3. Unstudied terms
//! 4. Familiar terms still cooling down (filler)
//!
//! The concatenation is cut to the round capacity. Unstudied terms picked
//! for the round get their appearance round stamped here and nowhere else.

use rand::Rng;
use tracing::{debug, error, warn};

use crate::choices::{build_choices, resolve_answer_mode};
use crate::config::LearnConfig;
use crate::error::LearnError;
use crate::registry::TermRegistry;
use crate::tracker::TermProgress;
use crate::types::{Correctness, Question, TermIndex, FAMILIAR_COOLDOWN_ROUNDS};

/// Output of one scheduling pass
#[derive(Debug, Clone)]
pub struct RoundPlan {
    pub round: u32,
    /// One question per selected term, in selection order
    pub timeline: Vec<Question>,
}

impl RoundPlan {
    pub fn terms_this_round(&self) -> usize {
        self.timeline.len()
    }

    /// Nothing left to study
    pub fn is_completed(&self) -> bool {
        self.timeline.is_empty()
    }
}

/// Pick the terms of `round` in priority order.
pub fn select_round_terms(
    registry: &TermRegistry,
    progress: &[TermProgress],
    round: u32,
    capacity: usize,
) -> Result<Vec<TermIndex>, LearnError> {
    let mut missed = Vec::new();
    let mut due = Vec::new();
    let mut unstudied = Vec::new();
    let mut cooling = Vec::new();

    for &idx in registry.studiable() {
        let p = &progress[idx.0];
        match p.correctness {
            Correctness::Missed => missed.push(idx),
            Correctness::Unstudied => unstudied.push(idx),
            Correctness::Familiar => {
                let appeared = p.appeared_in_round.ok_or_else(|| {
                    let term_id = registry.term(idx).id.clone();
                    error!(term_id = %term_id, round, "familiar term was never stamped");
                    LearnError::MissingAppearance { term_id }
                })?;
                if round.saturating_sub(appeared) >= FAMILIAR_COOLDOWN_ROUNDS {
                    due.push(idx);
                } else {
                    cooling.push(idx);
                }
            }
            Correctness::Mastered => {}
        }
    }

    debug!(
        round,
        missed = missed.len(),
        due = due.len(),
        unstudied = unstudied.len(),
        cooling = cooling.len(),
        "round candidates"
    );

    Ok(missed
        .into_iter()
        .chain(due)
        .chain(unstudied)
        .chain(cooling)
        .take(capacity)
        .collect())
}

/// Build the next round.
///
/// `previous_round` is the session's current round number; it is kept
/// as-is for the first round of a session and incremented otherwise.
/// Appearance stamps are written into `progress`.
pub fn schedule_round<R: Rng + ?Sized>(
    registry: &TermRegistry,
    progress: &mut [TermProgress],
    config: &LearnConfig,
    previous_round: u32,
    is_first_round: bool,
    rng: &mut R,
) -> Result<RoundPlan, LearnError> {
    let round = if is_first_round {
        previous_round
    } else {
        previous_round.checked_add(1).ok_or_else(|| {
            warn!(round = previous_round, "round number exhausted");
            LearnError::RoundOverflow {
                round: previous_round,
            }
        })?
    };

    let selected = select_round_terms(registry, progress, round, config.round_capacity)?;

    for &idx in &selected {
        let p = &mut progress[idx.0];
        if p.correctness == Correctness::Unstudied {
            p.appeared_in_round = Some(round);
        }
    }

    let kind = config.mode.question_kind();
    let timeline = selected
        .into_iter()
        .map(|term| {
            let answer_mode = resolve_answer_mode(config.answer_mode, rng);
            let choices = build_choices(registry, term, answer_mode, rng);
            Question {
                term,
                answer_mode,
                kind,
                choices,
            }
        })
        .collect();

    Ok(RoundPlan { round, timeline })
}
