//! Term Registry
//!
//! Arena of every term in the study set. Terms are addressed by
//! [`TermIndex`]; the stable string id is only used at the boundary with
//! the data-access layer. Content and distractor relations never change
//! after construction.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::LearnError;
use crate::types::{AnswerMode, StudySetAnswerMode, TermIndex};

// ==================== Input Types ====================

/// Distractor record as supplied by the data layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistractorInput {
    /// Term shown as the wrong answer
    pub distracting_id: String,
    /// Answer direction this distractor is meant for
    #[serde(rename = "type")]
    pub mode: AnswerMode,
}

/// Term record as supplied by the data layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermInput {
    pub id: String,
    pub word: String,
    pub definition: String,
    #[serde(default)]
    pub distractors: Vec<DistractorInput>,
}

impl TermInput {
    pub fn new(id: impl Into<String>, word: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            word: word.into(),
            definition: definition.into(),
            distractors: Vec::new(),
        }
    }

    pub fn with_distractor(mut self, distracting_id: impl Into<String>, mode: AnswerMode) -> Self {
        self.distractors.push(DistractorInput {
            distracting_id: distracting_id.into(),
            mode,
        });
        self
    }
}

// ==================== Registry ====================

/// Resolved distractor relation: `distracting` competes with the owning term
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Distractor {
    pub distracting: TermIndex,
    pub mode: AnswerMode,
}

#[derive(Debug, Clone)]
pub struct Term {
    pub id: String,
    pub word: String,
    pub definition: String,
    pub distractors: Vec<Distractor>,
}

impl Term {
    /// Text of the answer side for `mode`
    pub fn answer(&self, mode: AnswerMode) -> &str {
        match mode {
            AnswerMode::Word => &self.word,
            AnswerMode::Definition => &self.definition,
        }
    }

    /// Text of the prompt side for `mode`
    pub fn prompt(&self, mode: AnswerMode) -> &str {
        match mode {
            AnswerMode::Word => &self.definition,
            AnswerMode::Definition => &self.word,
        }
    }

    pub fn distractors_for(&self, mode: AnswerMode) -> impl Iterator<Item = TermIndex> + '_ {
        self.distractors
            .iter()
            .filter(move |d| d.mode == mode)
            .map(|d| d.distracting)
    }
}

#[derive(Debug, Clone)]
pub struct TermRegistry {
    terms: Vec<Term>,
    by_id: HashMap<String, TermIndex>,
    studiable: Vec<TermIndex>,
}

impl TermRegistry {
    /// Build a registry where every term is studied.
    pub fn new(terms: Vec<TermInput>) -> Result<Self, LearnError> {
        Self::build(terms, None)
    }

    /// Build a registry from the whole pool, studying only `studiable_ids`.
    /// The rest of the pool still serves as distractors.
    pub fn with_studiable(terms: Vec<TermInput>, studiable_ids: &[String]) -> Result<Self, LearnError> {
        Self::build(terms, Some(studiable_ids))
    }

    fn build(inputs: Vec<TermInput>, studiable_ids: Option<&[String]>) -> Result<Self, LearnError> {
        let mut by_id = HashMap::with_capacity(inputs.len());
        for (i, input) in inputs.iter().enumerate() {
            if by_id.insert(input.id.clone(), TermIndex(i)).is_some() {
                return Err(LearnError::DuplicateTerm(input.id.clone()));
            }
        }

        let terms = inputs
            .into_iter()
            .map(|input| {
                let mut seen = HashSet::new();
                let distractors = input
                    .distractors
                    .iter()
                    .filter_map(|d| match by_id.get(&d.distracting_id) {
                        Some(&idx) if d.distracting_id != input.id => Some(Distractor {
                            distracting: idx,
                            mode: d.mode,
                        }),
                        Some(_) => None,
                        None => {
                            warn!(
                                term_id = %input.id,
                                distracting_id = %d.distracting_id,
                                "dropping distractor for unknown term"
                            );
                            None
                        }
                    })
                    .filter(|d| seen.insert((d.distracting, d.mode)))
                    .collect();
                Term {
                    id: input.id,
                    word: input.word,
                    definition: input.definition,
                    distractors,
                }
            })
            .collect::<Vec<_>>();

        let studiable = match studiable_ids {
            None => (0..terms.len()).map(TermIndex).collect(),
            Some(ids) => {
                let mut out = Vec::with_capacity(ids.len());
                let mut seen = HashSet::new();
                for id in ids {
                    let idx = *by_id
                        .get(id)
                        .ok_or_else(|| LearnError::UnknownTerm(id.clone()))?;
                    if seen.insert(idx) {
                        out.push(idx);
                    }
                }
                out
            }
        };

        Ok(Self {
            terms,
            by_id,
            studiable,
        })
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn term(&self, idx: TermIndex) -> &Term {
        &self.terms[idx.0]
    }

    pub fn get(&self, idx: TermIndex) -> Option<&Term> {
        self.terms.get(idx.0)
    }

    pub fn index_of(&self, id: &str) -> Option<TermIndex> {
        self.by_id.get(id).copied()
    }

    pub fn terms(&self) -> impl Iterator<Item = (TermIndex, &Term)> {
        self.terms.iter().enumerate().map(|(i, t)| (TermIndex(i), t))
    }

    /// Terms being studied, in study-set order
    pub fn studiable(&self) -> &[TermIndex] {
        &self.studiable
    }

    /// Distinct non-ASCII characters found on the answer sides, in
    /// first-seen order.
    pub fn special_characters(&self, answer_mode: StudySetAnswerMode) -> Vec<char> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for &idx in &self.studiable {
            let term = self.term(idx);
            let sides: Vec<&str> = match answer_mode.fixed() {
                Some(mode) => vec![term.answer(mode)],
                None => vec![term.word.as_str(), term.definition.as_str()],
            };
            for c in sides.into_iter().flat_map(str::chars) {
                if is_special_char(c) && seen.insert(c) {
                    out.push(c);
                }
            }
        }
        out
    }
}

fn is_special_char(c: char) -> bool {
    !(c.is_ascii_alphanumeric() || c.is_ascii_punctuation() || c.is_whitespace())
}

// ==================== Tests ====================
