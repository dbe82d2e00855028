//! Learn session controller
//!
//! Owns the current [`SessionState`] snapshot and the RNG, swaps in the
//! snapshot returned by each transition, and logs what happened.

use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::LearnConfig;
use crate::deferred::PendingCompletion;
use crate::error::LearnError;
use crate::feedback::FeedbackBank;
use crate::registry::{TermInput, TermRegistry};
use crate::state::SessionState;
use crate::types::{Question, SessionPhase};

pub struct LearnSession {
    id: Uuid,
    state: SessionState,
    rng: ChaCha8Rng,
}

impl LearnSession {
    /// Start a session over every term in `terms`.
    pub fn new(terms: Vec<TermInput>, config: LearnConfig) -> Result<Self, LearnError> {
        Self::with_registry(Arc::new(TermRegistry::new(terms)?), config)
    }

    pub fn with_registry(registry: Arc<TermRegistry>, config: LearnConfig) -> Result<Self, LearnError> {
        let seed = config.seed.unwrap_or_else(|| {
            use std::time::{SystemTime, UNIX_EPOCH};
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(42)
        });
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let id = Uuid::new_v4();

        info!(
            session_id = %id,
            terms = registry.studiable().len(),
            pool = registry.len(),
            mode = ?config.mode,
            answer_mode = ?config.answer_mode,
            "starting learn session"
        );
        let state = SessionState::initialize(registry, config, &mut rng)?;

        Ok(Self { id, state, rng })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current snapshot
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.state.current_question()
    }

    pub fn answer_correctly(&mut self, index: usize) -> Result<PendingCompletion, LearnError> {
        let (next, pending) = self.state.answer_correctly(index)?;
        self.log_grade("correct", &next);
        self.state = next;
        Ok(pending)
    }

    pub fn answer_incorrectly(&mut self, index: usize) -> Result<(), LearnError> {
        let next = self.state.answer_incorrectly(index)?;
        self.log_grade("incorrect", &next);
        self.state = next;
        Ok(())
    }

    pub fn acknowledge_incorrect(&mut self) -> Result<(), LearnError> {
        self.state = self.state.acknowledge_incorrect()?;
        Ok(())
    }

    pub fn override_correct(&mut self) -> Result<(), LearnError> {
        let next = self.state.override_correct()?;
        self.log_grade("override", &next);
        self.state = next;
        Ok(())
    }

    pub fn answer_unknown_partial(&mut self, index: usize) -> Result<(), LearnError> {
        self.state = self.state.answer_unknown_partial(index)?;
        Ok(())
    }

    pub fn correct_from_unknown(&mut self) -> Result<(), LearnError> {
        let next = self.state.correct_from_unknown()?;
        self.log_grade("correct_from_unknown", &next);
        self.state = next;
        Ok(())
    }

    pub fn incorrect_from_unknown(&mut self) -> Result<(), LearnError> {
        let next = self.state.incorrect_from_unknown()?;
        self.log_grade("incorrect_from_unknown", &next);
        self.state = next;
        Ok(())
    }

    /// Finish a correctly answered question once its delay has passed.
    /// Returns `false` when the ticket was already cancelled or superseded.
    pub fn complete_pending(&mut self, pending: PendingCompletion) -> bool {
        match self.state.complete_pending(pending.ticket) {
            Some(next) => {
                self.state = next;
                true
            }
            None => {
                debug!(session_id = %self.id, ticket = pending.ticket, "ignoring stale completion");
                false
            }
        }
    }

    pub fn cancel_pending(&mut self) {
        if self.state.pending().is_some() {
            self.state = self.state.cancel_pending();
        }
    }

    pub fn next_round(&mut self) -> Result<(), LearnError> {
        self.state = self.state.next_round(&mut self.rng)?;
        Ok(())
    }

    pub fn set_feedback_bank(&mut self, correct: Vec<String>, incorrect: Vec<String>) {
        self.state = self
            .state
            .with_feedback_bank(FeedbackBank::new(correct, incorrect));
    }

    /// Cancel anything still pending and hand back the final snapshot.
    pub fn teardown(mut self) -> SessionState {
        self.cancel_pending();
        info!(session_id = %self.id, completed = self.state.is_completed(), "learn session closed");
        self.state
    }

    fn log_grade(&self, outcome: &'static str, next: &SessionState) {
        let Some(question) = self.state.current_question() else {
            return;
        };
        let progress = next.progress(question.term);
        debug!(
            session_id = %self.id,
            round = self.state.current_round(),
            cursor = self.state.round_counter(),
            term_id = %next.term(question.term).id,
            outcome,
            correctness = ?progress.correctness,
            incorrect_count = progress.incorrect_count,
            "graded"
        );
    }
}

impl std::fmt::Debug for LearnSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LearnSession")
            .field("id", &self.id)
            .field("phase", &self.state.phase())
            .field("round", &self.state.current_round())
            .finish()
    }
}
