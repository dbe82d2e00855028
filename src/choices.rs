//! Choice Builder
//!
//! Picks up to three wrong answers for a term and shuffles them together
//! with the target. Recorded distractors for the answer direction come
//! first; the rest is padded from the term pool in registry order.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::registry::TermRegistry;
use crate::types::{AnswerMode, StudySetAnswerMode, TermIndex, DISTRACTOR_TARGET, MAX_CHOICES};

/// Resolve the direction of one question. `Both` flips a fair coin.
pub fn resolve_answer_mode<R: Rng + ?Sized>(setting: StudySetAnswerMode, rng: &mut R) -> AnswerMode {
    match setting.fixed() {
        Some(mode) => mode,
        None => {
            if rng.gen_bool(0.5) {
                AnswerMode::Definition
            } else {
                AnswerMode::Word
            }
        }
    }
}

/// Wrong answers for `term` in `mode`, at most [`DISTRACTOR_TARGET`].
pub fn select_distractors(registry: &TermRegistry, term: TermIndex, mode: AnswerMode) -> Vec<TermIndex> {
    let recorded: Vec<TermIndex> = registry.term(term).distractors_for(mode).collect();

    // pool order, not record order
    let mut distractors: Vec<TermIndex> = registry
        .terms()
        .map(|(idx, _)| idx)
        .filter(|idx| recorded.contains(idx))
        .take(DISTRACTOR_TARGET)
        .collect();

    if distractors.len() < DISTRACTOR_TARGET {
        let missing = DISTRACTOR_TARGET - distractors.len();
        let padding: Vec<TermIndex> = registry
            .terms()
            .map(|(idx, _)| idx)
            .filter(|idx| *idx != term && !recorded.contains(idx))
            .take(missing)
            .collect();
        distractors.extend(padding);
    }

    distractors
}

/// Ordered choices for one question. Always contains `term`.
pub fn build_choices<R: Rng + ?Sized>(
    registry: &TermRegistry,
    term: TermIndex,
    mode: AnswerMode,
    rng: &mut R,
) -> Vec<TermIndex> {
    let mut choices = Vec::with_capacity(MAX_CHOICES);
    choices.push(term);
    choices.extend(select_distractors(registry, term, mode));
    choices.shuffle(rng);
    choices.truncate(MAX_CHOICES);
    choices
}
