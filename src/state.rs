//! Session State Machine
//!
//! [`SessionState`] is an immutable snapshot of one learn session. Every
//! transition validates against the current snapshot and returns a new
//! one; a rejected call leaves the old snapshot untouched. Terms are held
//! in a shared [`TermRegistry`] arena and addressed by [`TermIndex`], and
//! their progress lives in a vector parallel to that arena.
//!
//! Phases:
//!
//! - `Presenting`: a question is shown
//! - `Graded`: an outcome was applied, completion pending
//! - `BetweenRounds`: a round summary is available
//! - `Completed`: every studiable term is mastered (terminal)

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, error, info};

use crate::config::LearnConfig;
use crate::deferred::PendingCompletion;
use crate::error::LearnError;
use crate::feedback::FeedbackBank;
use crate::registry::{Term, TermRegistry};
use crate::scheduler::schedule_round;
use crate::tracker::{self, TermProgress};
use crate::types::{AnswerStatus, Question, RoundSummary, SessionPhase, TermIndex};

#[derive(Debug, Clone)]
pub struct SessionState {
    registry: Arc<TermRegistry>,
    config: LearnConfig,
    progress: Vec<TermProgress>,
    special_characters: Vec<char>,
    feedback_bank: FeedbackBank,

    current_round: u32,
    round_timeline: Vec<Question>,
    terms_this_round: usize,
    /// Cursor into the timeline
    round_counter: usize,
    /// Terms of this round answered correctly
    round_progress: usize,

    answered: Option<TermIndex>,
    status: Option<AnswerStatus>,
    prev_term_was_incorrect: bool,
    /// The current miss pushed a retry onto the timeline
    retry_appended: bool,

    round_summary: Option<RoundSummary>,
    completed: bool,
    has_missed_terms: bool,

    pending: Option<PendingCompletion>,
    next_ticket: u64,
}

impl SessionState {
    /// Create a session and schedule its first round.
    pub fn initialize<R: Rng + ?Sized>(
        registry: Arc<TermRegistry>,
        config: LearnConfig,
        rng: &mut R,
    ) -> Result<Self, LearnError> {
        config.validate()?;

        let special_characters = registry.special_characters(config.answer_mode);
        let mut state = Self {
            progress: vec![TermProgress::default(); registry.len()],
            special_characters,
            feedback_bank: FeedbackBank::default(),
            current_round: config.start_round,
            round_timeline: Vec::new(),
            terms_this_round: 0,
            round_counter: 0,
            round_progress: 0,
            answered: None,
            status: None,
            prev_term_was_incorrect: false,
            retry_appended: false,
            round_summary: None,
            completed: false,
            has_missed_terms: false,
            pending: None,
            next_ticket: 0,
            registry,
            config,
        };
        state.start_round(true, rng)?;
        Ok(state)
    }

    // ==================== Views ====================

    pub fn phase(&self) -> SessionPhase {
        if self.completed {
            SessionPhase::Completed
        } else if self.round_summary.is_some() {
            SessionPhase::BetweenRounds
        } else if self.status.is_some() {
            SessionPhase::Graded
        } else {
            SessionPhase::Presenting
        }
    }

    pub fn registry(&self) -> &Arc<TermRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &LearnConfig {
        &self.config
    }

    pub fn term(&self, idx: TermIndex) -> &Term {
        self.registry.term(idx)
    }

    pub fn progress(&self, idx: TermIndex) -> &TermProgress {
        &self.progress[idx.0]
    }

    pub fn progress_by_id(&self, id: &str) -> Option<&TermProgress> {
        self.registry.index_of(id).map(|idx| self.progress(idx))
    }

    pub fn current_question(&self) -> Option<&Question> {
        if self.completed {
            return None;
        }
        self.round_timeline.get(self.round_counter)
    }

    pub fn round_timeline(&self) -> &[Question] {
        &self.round_timeline
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn terms_this_round(&self) -> usize {
        self.terms_this_round
    }

    pub fn round_counter(&self) -> usize {
        self.round_counter
    }

    pub fn round_progress(&self) -> usize {
        self.round_progress
    }

    pub fn answered(&self) -> Option<TermIndex> {
        self.answered
    }

    pub fn status(&self) -> Option<AnswerStatus> {
        self.status
    }

    pub fn prev_term_was_incorrect(&self) -> bool {
        self.prev_term_was_incorrect
    }

    pub fn round_summary(&self) -> Option<&RoundSummary> {
        self.round_summary.as_ref()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn has_missed_terms(&self) -> bool {
        self.has_missed_terms
    }

    pub fn pending(&self) -> Option<PendingCompletion> {
        self.pending
    }

    pub fn feedback_bank(&self) -> &FeedbackBank {
        &self.feedback_bank
    }

    pub fn special_characters(&self) -> &[char] {
        &self.special_characters
    }

    /// Number of studiable terms
    pub fn num_terms(&self) -> usize {
        self.registry.studiable().len()
    }

    pub fn mastered_count(&self) -> usize {
        self.registry
            .studiable()
            .iter()
            .filter(|idx| self.progress[idx.0].is_mastered())
            .count()
    }

    /// Studiable terms answered at least once
    pub fn studied_count(&self) -> usize {
        self.registry
            .studiable()
            .iter()
            .filter(|idx| self.progress[idx.0].correctness.is_studied())
            .count()
    }

    // ==================== Transitions ====================

    /// Grade the current question as correct. The question completes when
    /// the returned ticket is passed to [`complete_pending`](Self::complete_pending).
    pub fn answer_correctly(&self, index: usize) -> Result<(Self, PendingCompletion), LearnError> {
        let question = self.require_presenting("answer_correctly", index)?;
        let (term, kind) = (question.term, question.kind);

        let mut next = self.clone();
        tracker::record_correct(&mut next.progress[term.0], kind);
        next.answered = Some(term);
        next.status = Some(AnswerStatus::Correct);
        next.prev_term_was_incorrect = false;

        let pending = PendingCompletion {
            ticket: next.next_ticket,
            delay: self.config.correct_delay(),
        };
        next.next_ticket += 1;
        next.pending = Some(pending);
        Ok((next, pending))
    }

    /// Grade the current question as wrong. The term is re-asked later in
    /// the round unless this is the round's last outstanding term.
    pub fn answer_incorrectly(&self, index: usize) -> Result<Self, LearnError> {
        let question = self.require_presenting("answer_incorrectly", index)?.clone();

        let mut next = self.clone();
        next.miss(question);
        next.status = Some(AnswerStatus::Incorrect);
        Ok(next)
    }

    /// Move on after the learner has seen the correct answer.
    pub fn acknowledge_incorrect(&self) -> Result<Self, LearnError> {
        self.require_status("acknowledge_incorrect", AnswerStatus::Incorrect)?;

        let mut next = self.clone();
        next.complete_question(false);
        Ok(next)
    }

    /// Contest an auto-graded miss: the term is mastered and the retry
    /// added by the miss is dropped.
    pub fn override_correct(&self) -> Result<Self, LearnError> {
        self.require_status("override_correct", AnswerStatus::Incorrect)?;
        let term = self.require_current_question()?.term;

        let mut next = self.clone();
        let progress = &mut next.progress[term.0];
        tracker::retract_miss(progress);
        tracker::override_to_correct(progress);
        if next.retry_appended {
            next.round_timeline.pop();
        }
        next.prev_term_was_incorrect = false;
        next.complete_question(true);
        Ok(next)
    }

    /// The learner asked to see the answer.
    pub fn answer_unknown_partial(&self, index: usize) -> Result<Self, LearnError> {
        self.require_presenting("answer_unknown_partial", index)?;

        let mut next = self.clone();
        next.status = Some(AnswerStatus::UnknownPartial);
        Ok(next)
    }

    /// Self-grade after "don't know": knew it after all.
    pub fn correct_from_unknown(&self) -> Result<Self, LearnError> {
        self.require_status("correct_from_unknown", AnswerStatus::UnknownPartial)?;
        let term = self.require_current_question()?.term;

        let mut next = self.clone();
        tracker::override_to_correct(&mut next.progress[term.0]);
        next.answered = Some(term);
        next.prev_term_was_incorrect = false;
        next.complete_question(true);
        Ok(next)
    }

    /// Self-grade after "don't know": did not know it.
    pub fn incorrect_from_unknown(&self) -> Result<Self, LearnError> {
        self.require_status("incorrect_from_unknown", AnswerStatus::UnknownPartial)?;
        let question = self.require_current_question()?.clone();

        let mut next = self.clone();
        next.miss(question);
        next.complete_question(false);
        Ok(next)
    }

    /// Run the deferred completion for `ticket`. `None` when the ticket is
    /// stale or was cancelled.
    pub fn complete_pending(&self, ticket: u64) -> Option<Self> {
        match self.pending {
            Some(pending) if pending.ticket == ticket => {
                let mut next = self.clone();
                next.complete_question(true);
                Some(next)
            }
            _ => None,
        }
    }

    pub fn cancel_pending(&self) -> Self {
        let mut next = self.clone();
        next.pending = None;
        next
    }

    /// Schedule the next round. Only valid between rounds.
    pub fn next_round<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Self, LearnError> {
        match self.phase() {
            SessionPhase::BetweenRounds => {}
            SessionPhase::Completed => return Err(LearnError::SessionCompleted),
            phase => {
                return Err(LearnError::InvalidPhase {
                    operation: "next_round",
                    phase,
                })
            }
        }

        let mut next = self.clone();
        next.start_round(false, rng)?;
        Ok(next)
    }

    pub fn with_feedback_bank(&self, bank: FeedbackBank) -> Self {
        let mut next = self.clone();
        next.feedback_bank = bank;
        next
    }

    // ==================== Internals ====================

    fn require_current_question(&self) -> Result<&Question, LearnError> {
        self.round_timeline.get(self.round_counter).ok_or_else(|| {
            error!(
                cursor = self.round_counter,
                timeline_len = self.round_timeline.len(),
                "no question at cursor"
            );
            LearnError::NoActiveQuestion {
                cursor: self.round_counter,
                timeline_len: self.round_timeline.len(),
            }
        })
    }

    fn require_presenting(&self, operation: &'static str, index: usize) -> Result<&Question, LearnError> {
        match self.phase() {
            SessionPhase::Presenting => {}
            SessionPhase::Completed => return Err(LearnError::SessionCompleted),
            phase => return Err(LearnError::InvalidPhase { operation, phase }),
        }
        if index != self.round_counter {
            return Err(LearnError::QuestionMismatch {
                expected: self.round_counter,
                got: index,
            });
        }
        self.require_current_question()
    }

    fn require_status(&self, operation: &'static str, status: AnswerStatus) -> Result<(), LearnError> {
        let phase = self.phase();
        match phase {
            SessionPhase::Completed => Err(LearnError::SessionCompleted),
            SessionPhase::Graded if self.status == Some(status) && self.pending.is_none() => Ok(()),
            _ => Err(LearnError::InvalidPhase { operation, phase }),
        }
    }

    fn is_last_question(&self) -> bool {
        self.round_progress + 1 >= self.terms_this_round
    }

    fn miss(&mut self, question: Question) {
        let term = question.term;
        tracker::record_incorrect(&mut self.progress[term.0]);
        self.retry_appended = !self.is_last_question();
        if self.retry_appended {
            self.round_timeline.push(question);
        }
        self.answered = Some(term);
        self.prev_term_was_incorrect = true;
    }

    fn complete_question(&mut self, correct: bool) {
        self.pending = None;
        self.retry_appended = false;

        if self.mastered_count() == self.num_terms() {
            self.completed = true;
            self.has_missed_terms = self.any_missed();
            info!(
                round = self.current_round,
                has_missed_terms = self.has_missed_terms,
                "learn session completed"
            );
            return;
        }

        if self.is_last_question() {
            let mut terms_this_round: Vec<TermIndex> = Vec::with_capacity(self.terms_this_round);
            for question in &self.round_timeline {
                if !terms_this_round.contains(&question.term) {
                    terms_this_round.push(question.term);
                }
            }
            self.round_summary = Some(RoundSummary {
                round: self.current_round,
                terms_this_round,
                progress: self.studied_count(),
                total_terms: self.num_terms(),
            });
            self.status = None;
            info!(round = self.current_round, "round finished");
            return;
        }

        self.round_counter += 1;
        if correct {
            self.round_progress += 1;
        }
        self.answered = None;
        self.status = None;
        debug!(
            cursor = self.round_counter,
            round_progress = self.round_progress,
            "next question"
        );
    }

    fn start_round<R: Rng + ?Sized>(&mut self, is_first: bool, rng: &mut R) -> Result<(), LearnError> {
        let plan = schedule_round(
            &self.registry,
            &mut self.progress,
            &self.config,
            self.current_round,
            is_first,
            rng,
        )?;

        self.current_round = plan.round;
        self.terms_this_round = plan.terms_this_round();
        self.completed = plan.is_completed();
        self.round_timeline = plan.timeline;
        self.round_counter = 0;
        self.round_progress = 0;
        self.answered = None;
        self.status = None;
        self.retry_appended = false;
        self.round_summary = None;
        self.pending = None;
        self.has_missed_terms = self.any_missed();

        info!(
            round = self.current_round,
            terms = self.terms_this_round,
            completed = self.completed,
            "round scheduled"
        );
        Ok(())
    }

    fn any_missed(&self) -> bool {
        self.registry
            .studiable()
            .iter()
            .any(|idx| self.progress[idx.0].incorrect_count > 0)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::registry::TermInput;
    use crate::types::Correctness;

    fn setup(n: usize, capacity: usize) -> (SessionState, ChaCha8Rng) {
        let registry = TermRegistry::new(
            (0..n)
                .map(|i| TermInput::new(format!("t{i}"), format!("w{i}"), format!("d{i}")))
                .collect(),
        )
        .unwrap();
        let config = LearnConfig {
            round_capacity: capacity,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let state = SessionState::initialize(Arc::new(registry), config, &mut rng).unwrap();
        (state, rng)
    }

    fn answer_right(state: &SessionState) -> SessionState {
        let (graded, pending) = state.answer_correctly(state.round_counter()).unwrap();
        graded.complete_pending(pending.ticket).unwrap()
    }

    #[test]
    fn test_initialize_schedules_first_round() {
        let (state, _) = setup(3, 7);
        assert_eq!(state.phase(), SessionPhase::Presenting);
        assert_eq!(state.current_round(), 0);
        assert_eq!(state.terms_this_round(), 3);
        assert_eq!(state.round_timeline().len(), 3);
        assert!(state.current_question().is_some());
    }

    #[test]
    fn test_empty_study_set_completes_immediately() {
        let (state, _) = setup(0, 7);
        assert!(state.is_completed());
        assert!(!state.has_missed_terms());
        assert!(state.current_question().is_none());
    }

    #[test]
    fn test_correct_answer_is_graded_eagerly() {
        let (state, _) = setup(3, 7);
        let term = state.current_question().unwrap().term;
        let (graded, pending) = state.answer_correctly(0).unwrap();

        assert_eq!(graded.progress(term).correctness, Correctness::Familiar);
        assert_eq!(graded.phase(), SessionPhase::Graded);
        assert_eq!(graded.status(), Some(AnswerStatus::Correct));
        assert_eq!(graded.round_counter(), 0);
        assert_eq!(pending.delay, std::time::Duration::from_millis(1000));
        // 原状态不变
        assert_eq!(state.progress(term).correctness, Correctness::Unstudied);

        let done = graded.complete_pending(pending.ticket).unwrap();
        assert_eq!(done.round_counter(), 1);
        assert_eq!(done.round_progress(), 1);
        assert_eq!(done.status(), None);
    }

    #[test]
    fn test_cannot_answer_twice_before_completion() {
        let (state, _) = setup(3, 7);
        let (graded, _) = state.answer_correctly(0).unwrap();
        assert!(matches!(
            graded.answer_correctly(0),
            Err(LearnError::InvalidPhase { phase: SessionPhase::Graded, .. })
        ));
    }

    #[test]
    fn test_stale_ticket_is_noop() {
        let (state, _) = setup(3, 7);
        let (graded, pending) = state.answer_correctly(0).unwrap();
        assert!(graded.complete_pending(pending.ticket + 1).is_none());
        assert!(graded.cancel_pending().complete_pending(pending.ticket).is_none());
    }

    #[test]
    fn test_wrong_index_rejected() {
        let (state, _) = setup(3, 7);
        let err = state.answer_incorrectly(2).unwrap_err();
        assert!(matches!(err, LearnError::QuestionMismatch { expected: 0, got: 2 }));
    }

    #[test]
    fn test_incorrect_appends_retry() {
        let (state, _) = setup(3, 7);
        let term = state.current_question().unwrap().term;

        let missed = state.answer_incorrectly(0).unwrap();
        assert_eq!(missed.round_timeline().len(), 4);
        assert_eq!(missed.round_timeline()[3].term, term);
        assert_eq!(missed.progress(term).correctness, Correctness::Missed);
        assert_eq!(missed.progress(term).incorrect_count, 1);
        assert!(missed.prev_term_was_incorrect());

        let next = missed.acknowledge_incorrect().unwrap();
        assert_eq!(next.round_counter(), 1);
        assert_eq!(next.round_progress(), 0);
        assert_eq!(next.phase(), SessionPhase::Presenting);
    }

    #[test]
    fn test_last_outstanding_miss_does_not_append() {
        let (state, _) = setup(1, 7);
        let missed = state.answer_incorrectly(0).unwrap();
        assert_eq!(missed.round_timeline().len(), 1);

        let summary_state = missed.acknowledge_incorrect().unwrap();
        assert_eq!(summary_state.phase(), SessionPhase::BetweenRounds);
        let summary = summary_state.round_summary().unwrap();
        assert_eq!(summary.terms_this_round.len(), 1);
        assert_eq!(summary.progress, 1);
    }

    #[test]
    fn test_override_drops_retry_and_masters() {
        let (state, _) = setup(3, 7);
        let term = state.current_question().unwrap().term;
        let missed = state.answer_incorrectly(0).unwrap();

        let overridden = missed.override_correct().unwrap();
        assert_eq!(overridden.round_timeline().len(), 3);
        assert_eq!(overridden.progress(term).correctness, Correctness::Mastered);
        assert_eq!(overridden.progress(term).incorrect_count, 0);
        assert_eq!(overridden.round_progress(), 1);
        assert!(!overridden.prev_term_was_incorrect());
    }

    #[test]
    fn test_unknown_partial_flow() {
        let (state, _) = setup(3, 7);
        let term = state.current_question().unwrap().term;

        let unknown = state.answer_unknown_partial(0).unwrap();
        assert_eq!(unknown.status(), Some(AnswerStatus::UnknownPartial));
        assert_eq!(unknown.progress(term).correctness, Correctness::Unstudied);
        assert!(unknown.acknowledge_incorrect().is_err());

        let knew = unknown.correct_from_unknown().unwrap();
        assert_eq!(knew.progress(term).correctness, Correctness::Mastered);
        assert_eq!(knew.round_counter(), 1);

        let didnt = unknown.incorrect_from_unknown().unwrap();
        assert_eq!(didnt.progress(term).correctness, Correctness::Missed);
        assert_eq!(didnt.round_timeline().len(), 4);
        assert_eq!(didnt.round_counter(), 1);
    }

    #[test]
    fn test_next_round_only_between_rounds() {
        let (state, mut rng) = setup(2, 7);
        assert!(matches!(
            state.next_round(&mut rng),
            Err(LearnError::InvalidPhase { operation: "next_round", .. })
        ));

        let state = answer_right(&state);
        let state = answer_right(&state);
        assert_eq!(state.phase(), SessionPhase::BetweenRounds);

        let next = state.next_round(&mut rng).unwrap();
        assert_eq!(next.current_round(), 1);
        assert_eq!(next.phase(), SessionPhase::Presenting);
        assert!(next.round_summary().is_none());
    }

    #[test]
    fn test_cursor_past_timeline_is_invariant_violation() {
        let (mut state, _) = setup(2, 7);
        state.round_counter = state.round_timeline.len();
        assert!(state.current_question().is_none());

        let err = state.answer_correctly(2).unwrap_err();
        assert!(matches!(
            err,
            LearnError::NoActiveQuestion { cursor: 2, timeline_len: 2 }
        ));
        assert!(err.is_invariant_violation());

        // 评分之后游标越界同样报错
        let (graded, _) = setup(2, 7);
        let mut graded = graded.answer_unknown_partial(0).unwrap();
        graded.round_counter = 5;
        let err = graded.correct_from_unknown().unwrap_err();
        assert!(matches!(err, LearnError::NoActiveQuestion { cursor: 5, .. }));
        assert_eq!(graded.progress(TermIndex(0)).correctness, Correctness::Unstudied);
    }

    #[test]
    fn test_completed_rejects_everything() {
        let config = LearnConfig {
            mode: crate::types::LearnMode::Review,
            ..Default::default()
        };
        let registry = TermRegistry::new(vec![TermInput::new("a", "a", "A")]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let state = SessionState::initialize(Arc::new(registry), config, &mut rng).unwrap();

        let done = answer_right(&state);
        assert!(done.is_completed());
        assert!(matches!(done.answer_incorrectly(0), Err(LearnError::SessionCompleted)));
        assert!(matches!(done.next_round(&mut rng), Err(LearnError::SessionCompleted)));
    }
}
