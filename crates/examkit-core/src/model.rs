//! Core data model types for examkit.
//!
//! Field names on the wire follow the exam backend (`tipo`, `enunciado`,
//! `alternativas`, `resposta`, ...); the Rust names describe what the
//! fields mean.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::InvalidQuestion;

/// Letter labels for multiple-choice options, by position.
pub const CHOICE_LABELS: [char; 5] = ['a', 'b', 'c', 'd', 'e'];

/// Number of empty choices a new multiple-choice question starts with.
pub const DEFAULT_CHOICE_COUNT: usize = 4;

/// Submitted answers keyed by question position (0-based).
pub type AnswerSheet = BTreeMap<usize, String>;

/// The three supported question types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionKind {
    #[serde(rename = "multipla_escolha", alias = "multiple_choice")]
    MultipleChoice,
    #[serde(rename = "verdadeiro_falso", alias = "true_false")]
    TrueFalse,
    #[serde(rename = "dissertativa", alias = "essay")]
    Essay,
}

impl QuestionKind {
    /// Objective questions have a single machine-checkable answer.
    pub fn is_objective(self) -> bool {
        !matches!(self, QuestionKind::Essay)
    }

    /// Authoring-file name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "multiple_choice",
            QuestionKind::TrueFalse => "true_false",
            QuestionKind::Essay => "essay",
        }
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "multiple_choice" | "multipla_escolha" | "mc" => Ok(QuestionKind::MultipleChoice),
            "true_false" | "verdadeiro_falso" | "tf" => Ok(QuestionKind::TrueFalse),
            "essay" | "dissertativa" => Ok(QuestionKind::Essay),
            other => Err(format!("unknown question kind: {other}")),
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::MultipleChoice => write!(f, "multiple choice"),
            QuestionKind::TrueFalse => write!(f, "true/false"),
            QuestionKind::Essay => write!(f, "essay"),
        }
    }
}

/// Answer domain of a true/false question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruthValue {
    True,
    False,
}

impl TruthValue {
    /// Canonical stored form, as submitted by the grading flow.
    pub fn as_str(self) -> &'static str {
        match self {
            TruthValue::True => "verdadeiro",
            TruthValue::False => "falso",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TruthValue::True => "Verdadeiro",
            TruthValue::False => "Falso",
        }
    }
}

impl FromStr for TruthValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "verdadeiro" | "true" => Ok(TruthValue::True),
            "falso" | "false" => Ok(TruthValue::False),
            other => Err(format!("unknown truth value: {other}")),
        }
    }
}

/// Position of a letter label (`a..e`, any case) among the choices.
pub fn choice_index(label: &str) -> Option<usize> {
    let mut chars = label.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => CHOICE_LABELS
            .iter()
            .position(|l| *l == c.to_ascii_lowercase()),
        _ => None,
    }
}

/// A single exam question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "tipo")]
    pub kind: QuestionKind,
    #[serde(rename = "enunciado", default)]
    pub prompt: String,
    /// Only populated for multiple-choice questions.
    #[serde(rename = "alternativas", default)]
    pub choices: Vec<String>,
    /// A choice letter, a truth value, or an essay's model answer.
    #[serde(rename = "resposta", default)]
    pub correct_answer: String,
}

impl Question {
    /// A blank question with type-appropriate defaults.
    pub fn new(kind: QuestionKind) -> Self {
        let choices = match kind {
            QuestionKind::MultipleChoice => vec![String::new(); DEFAULT_CHOICE_COUNT],
            _ => Vec::new(),
        };
        Self {
            kind,
            prompt: String::new(),
            choices,
            correct_answer: String::new(),
        }
    }

    pub fn multiple_choice(
        prompt: impl Into<String>,
        choices: Vec<String>,
        correct: impl Into<String>,
    ) -> Self {
        Self {
            kind: QuestionKind::MultipleChoice,
            prompt: prompt.into(),
            choices,
            correct_answer: correct.into(),
        }
    }

    pub fn true_false(prompt: impl Into<String>, correct: TruthValue) -> Self {
        Self {
            kind: QuestionKind::TrueFalse,
            prompt: prompt.into(),
            choices: Vec::new(),
            correct_answer: correct.as_str().to_string(),
        }
    }

    pub fn essay(prompt: impl Into<String>, model_answer: impl Into<String>) -> Self {
        Self {
            kind: QuestionKind::Essay,
            prompt: prompt.into(),
            choices: Vec::new(),
            correct_answer: model_answer.into(),
        }
    }

    /// Check that the question is complete enough to be saved.
    pub fn validate(&self) -> Result<(), InvalidQuestion> {
        if self.prompt.trim().is_empty() {
            return Err(InvalidQuestion::EmptyPrompt);
        }

        match self.kind {
            QuestionKind::MultipleChoice => {
                if self.choices.is_empty() {
                    return Err(InvalidQuestion::NoChoices);
                }
                if self.choices.len() > CHOICE_LABELS.len() {
                    return Err(InvalidQuestion::TooManyChoices {
                        count: self.choices.len(),
                        max: CHOICE_LABELS.len(),
                    });
                }
                if let Some(i) = self.choices.iter().position(|c| c.trim().is_empty()) {
                    return Err(InvalidQuestion::EmptyChoice {
                        choice: CHOICE_LABELS[i],
                    });
                }
                if self.correct_answer.trim().is_empty() {
                    return Err(InvalidQuestion::MissingCorrectAnswer);
                }
                match choice_index(self.correct_answer.trim()) {
                    Some(i) if i < self.choices.len() => Ok(()),
                    _ => Err(InvalidQuestion::AnswerOutOfRange {
                        answer: self.correct_answer.clone(),
                    }),
                }
            }
            QuestionKind::TrueFalse => {
                if self.correct_answer.trim().is_empty() {
                    return Err(InvalidQuestion::MissingCorrectAnswer);
                }
                self.correct_answer
                    .trim()
                    .parse::<TruthValue>()
                    .map(|_| ())
                    .map_err(|_| InvalidQuestion::NotATruthValue {
                        answer: self.correct_answer.clone(),
                    })
            }
            QuestionKind::Essay => Ok(()),
        }
    }

    /// The options a grading front end offers for this question.
    ///
    /// Essay questions are never auto-scored and only offer a skip, which
    /// records an empty answer.
    pub fn answer_options(&self) -> Vec<AnswerOption> {
        match self.kind {
            QuestionKind::MultipleChoice => self
                .choices
                .iter()
                .zip(CHOICE_LABELS)
                .map(|(text, letter)| AnswerOption {
                    value: letter.to_string(),
                    label: format!("{}) {}", letter.to_ascii_uppercase(), text),
                })
                .collect(),
            QuestionKind::TrueFalse => [TruthValue::True, TruthValue::False]
                .into_iter()
                .map(|v| AnswerOption {
                    value: v.as_str().to_string(),
                    label: v.label().to_string(),
                })
                .collect(),
            QuestionKind::Essay => vec![AnswerOption {
                value: String::new(),
                label: "Skip (graded manually)".to_string(),
            }],
        }
    }
}

/// One selectable answer as presented to the student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOption {
    /// The text recorded as the answer when this option is picked.
    pub value: String,
    pub label: String,
}

/// Stable identity of a question slot inside a composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuestionId(Uuid);

impl QuestionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for QuestionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An exam as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exam {
    /// Assigned by the backend on first save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "titulo", default)]
    pub title: String,
    #[serde(rename = "cabecalho", default)]
    pub header: String,
    /// Order defines both authoring and grading presentation order.
    #[serde(rename = "questoes", default)]
    pub questions: Vec<Question>,
}


/// Body of an exam create or update request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamPayload {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "cabecalho")]
    pub header: String,
    #[serde(rename = "questoes")]
    pub questions: Vec<Question>,
}

impl ExamPayload {
    pub fn into_exam(self, id: Option<String>) -> Exam {
        Exam {
            id,
            title: self.title,
            header: self.header,
            questions: self.questions,
        }
    }
}
