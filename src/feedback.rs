//! Feedback bank: remarks the rendering layer may show after grading.
//! The session stores them and never picks one itself.

use serde::{Deserialize, Serialize};

const CORRECT: &[&str] = &[
    "Awesome!",
    "Nice work!",
    "Perfect!",
    "You got it!",
    "Great job!",
    "Keep it up!",
    "Nailed it!",
];

const INCORRECT: &[&str] = &[
    "Not quite, you'll get it next time.",
    "No worries, you're still learning.",
    "Almost! Take another look.",
    "Mistakes help you remember.",
    "Keep going, practice makes perfect.",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackBank {
    pub correct: Vec<String>,
    pub incorrect: Vec<String>,
}

impl FeedbackBank {
    pub fn new(correct: Vec<String>, incorrect: Vec<String>) -> Self {
        Self { correct, incorrect }
    }
}

impl Default for FeedbackBank {
    fn default() -> Self {
        Self {
            correct: CORRECT.iter().map(|s| s.to_string()).collect(),
            incorrect: INCORRECT.iter().map(|s| s.to_string()).collect(),
        }
    }
}
