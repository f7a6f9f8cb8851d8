//! Error types for exam composition, grading and backend access.
//!
//! `BackendError` classifies failures of the external backend so the
//! composition store and the grading session can decide which `ExamError`
//! to surface without string matching.

use thiserror::Error;

/// A question that cannot be saved or used for grading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidQuestion {
    #[error("prompt is empty")]
    EmptyPrompt,

    #[error("multiple-choice question has no choices")]
    NoChoices,

    #[error("multiple-choice question has {count} choices, at most {max} are allowed")]
    TooManyChoices { count: usize, max: usize },

    /// `choice` is the letter label of the empty entry.
    #[error("choice ({choice}) is empty")]
    EmptyChoice { choice: char },

    #[error("correct answer is empty")]
    MissingCorrectAnswer,

    #[error("correct answer '{answer}' does not match any choice")]
    AnswerOutOfRange { answer: String },

    #[error("'{answer}' is not a true/false answer")]
    NotATruthValue { answer: String },
}

/// Errors that can occur when talking to the exam backend.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The requested exam or bank entry does not exist (or is not visible
    /// to the caller).
    #[error("not found: {0}")]
    NotFound(String),

    /// The backend answered with a non-success status.
    #[error("backend rejected request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// The response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// Errors surfaced by the composition store and the grading session.
///
/// Every variant is terminal for the single action that produced it; the
/// in-memory exam or session is left exactly as it was before the action.
#[derive(Debug, Error)]
pub enum ExamError {
    /// A question failed validation. Never reaches the backend.
    #[error("question {} is invalid: {source}", position + 1)]
    InvalidQuestion {
        position: usize,
        #[source]
        source: InvalidQuestion,
    },

    /// The student name was empty after trimming.
    #[error("student name must not be empty")]
    EmptyStudentName,

    #[error("question index {index} is out of range (exam has {len} questions)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("choice index {index} is out of range (question has {len} choices)")]
    ChoiceOutOfRange { index: usize, len: usize },

    /// Choices were edited on a true/false or essay question.
    #[error("question {} is not multiple choice", position + 1)]
    NotMultipleChoice { position: usize },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("backend call failed: {0}")]
    Transport(#[source] BackendError),

    /// Submission of a completed session failed; the session stays completed.
    #[error("scoring unavailable: {0}")]
    ScoringUnavailable(#[source] BackendError),

    /// The requested action is not legal in the current session phase.
    #[error("cannot {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },
}

impl ExamError {
    /// Returns `true` for errors caught locally before any backend call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ExamError::InvalidQuestion { .. } | ExamError::EmptyStudentName
        )
    }
}

impl From<BackendError> for ExamError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotFound(what) => ExamError::NotFound(what),
            other => ExamError::Transport(other),
        }
    }
}
