//! Common Types and Constants
//!
//! Shared data structures used by the registry, scheduler and session.

use serde::{Deserialize, Serialize};

// ==================== Constants ====================

/// Default number of terms scheduled per round
pub const DEFAULT_ROUND_CAPACITY: usize = 7;

/// Rounds a familiar term waits before it is tested again
pub const FAMILIAR_COOLDOWN_ROUNDS: u32 = 2;

/// Upper bound on choices shown for one question (target included)
pub const MAX_CHOICES: usize = 4;

/// Wrong answers wanted per question
pub const DISTRACTOR_TARGET: usize = MAX_CHOICES - 1;

/// Delay between a correct answer and the next question
pub const DEFAULT_CORRECT_DELAY_MS: u64 = 1000;

// ==================== Term Types ====================

/// Position of a term inside the [`TermRegistry`](crate::registry::TermRegistry) arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermIndex(pub usize);

/// Per-term mastery marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Correctness {
    /// Most recent attempt was wrong
    Missed = -1,
    #[default]
    Unstudied = 0,
    /// Answered correctly once, waiting for confirmation
    Familiar = 1,
    /// Terminal
    Mastered = 2,
}

impl Correctness {
    pub fn is_studied(self) -> bool {
        self != Correctness::Unstudied
    }
}

// ==================== Mode Types ====================

/// Which side of a term is the answer for one question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerMode {
    /// Prompt with the definition, answer with the word
    Word,
    /// Prompt with the word, answer with the definition
    Definition,
}

/// Answer direction configured for a study set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StudySetAnswerMode {
    Word,
    #[default]
    Definition,
    /// Pick a direction at random for every question
    Both,
}

impl StudySetAnswerMode {
    pub fn fixed(self) -> Option<AnswerMode> {
        match self {
            StudySetAnswerMode::Word => Some(AnswerMode::Word),
            StudySetAnswerMode::Definition => Some(AnswerMode::Definition),
            StudySetAnswerMode::Both => None,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "word" => Some(StudySetAnswerMode::Word),
            "definition" => Some(StudySetAnswerMode::Definition),
            "both" => Some(StudySetAnswerMode::Both),
            _ => None,
        }
    }
}

/// Study mode of a learn session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LearnMode {
    /// Multiple choice, two correct answers to master
    #[default]
    Learn,
    /// Recall, one correct answer masters
    Review,
}

impl LearnMode {
    pub fn question_kind(self) -> QuestionKind {
        match self {
            LearnMode::Learn => QuestionKind::Choice,
            LearnMode::Review => QuestionKind::Write,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "learn" => Some(LearnMode::Learn),
            "review" => Some(LearnMode::Review),
            _ => None,
        }
    }
}

/// How a question is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionKind {
    Choice,
    Write,
}

// ==================== Session Types ====================

/// Transient grading status shown by the rendering layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerStatus {
    Correct,
    Incorrect,
    UnknownPartial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// A question is shown and awaits an answer
    Presenting,
    /// An outcome was applied; waiting for the question to complete
    Graded,
    /// A round summary is available
    BetweenRounds,
    Completed,
}

/// One study interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub term: TermIndex,
    pub answer_mode: AnswerMode,
    pub kind: QuestionKind,
    /// Target plus distractors, shuffled
    pub choices: Vec<TermIndex>,
}

/// Shown between rounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSummary {
    pub round: u32,
    /// Distinct terms of the round, in first-asked order
    pub terms_this_round: Vec<TermIndex>,
    /// Studiable terms answered at least once
    pub progress: usize,
    pub total_terms: usize,
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correctness_numeric_values() {
        assert_eq!(Correctness::Missed as i8, -1);
        assert_eq!(Correctness::Unstudied as i8, 0);
        assert_eq!(Correctness::Familiar as i8, 1);
        assert_eq!(Correctness::Mastered as i8, 2);
        assert!(!Correctness::Unstudied.is_studied());
        assert!(Correctness::Missed.is_studied());
    }

    #[test]
    fn test_answer_mode_from_str() {
        assert_eq!(StudySetAnswerMode::from_str("Word"), Some(StudySetAnswerMode::Word));
        assert_eq!(StudySetAnswerMode::from_str("DEFINITION"), Some(StudySetAnswerMode::Definition));
        assert_eq!(StudySetAnswerMode::from_str("both"), Some(StudySetAnswerMode::Both));
        assert_eq!(StudySetAnswerMode::from_str("either"), None);
        assert_eq!(StudySetAnswerMode::Both.fixed(), None);
        assert_eq!(StudySetAnswerMode::Word.fixed(), Some(AnswerMode::Word));
    }

    #[test]
    fn test_learn_mode_question_kind() {
        assert_eq!(LearnMode::Learn.question_kind(), QuestionKind::Choice);
        assert_eq!(LearnMode::Review.question_kind(), QuestionKind::Write);
        assert_eq!(LearnMode::from_str("review"), Some(LearnMode::Review));
        assert_eq!(LearnMode::from_str(""), None);
    }

    #[test]
    fn test_constants() {
        assert_eq!(DISTRACTOR_TARGET, 3);
        assert!(FAMILIAR_COOLDOWN_ROUNDS >= 1);
        assert!(DEFAULT_ROUND_CAPACITY > 0);
    }
}
