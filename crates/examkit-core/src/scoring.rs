//! Objective scoring of a completed answer sheet.
//!
//! Every objective question is worth one point. Essay questions are left
//! out of both the numerator and the denominator.

use serde::{Deserialize, Serialize};

use crate::model::{AnswerSheet, Question, QuestionKind, TruthValue};

/// Result of grading one student's answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeSummary {
    #[serde(rename = "nome_aluno")]
    pub student_name: String,
    #[serde(rename = "acertos")]
    pub correct_count: u32,
    #[serde(rename = "total_questoes")]
    pub total_objective: u32,
}

impl GradeSummary {
    /// Fraction of objective questions answered correctly, or `None` when
    /// the exam has no objective questions.
    pub fn fraction(&self) -> Option<f64> {
        if self.total_objective == 0 {
            None
        } else {
            Some(self.correct_count as f64 / self.total_objective as f64)
        }
    }
}

/// How a single question fared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Correct,
    Incorrect,
    /// Objective question with no recorded answer.
    Unanswered,
    /// Essay question, left for the instructor.
    ManualReview,
}

/// Per-question outcome, keyed by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub position: usize,
    pub outcome: Outcome,
}

/// Answer comparison: equal after lowering case on both sides.
pub fn answers_match(submitted: &str, correct: &str) -> bool {
    submitted.to_lowercase() == correct.to_lowercase()
}

/// Whether `submitted` is the right answer to `question`.
///
/// True/false answers are compared as truth values, so `True`, `true` and
/// `verdadeiro` are all the same answer. Anything that does not parse falls
/// back to [`answers_match`].
pub fn is_correct(question: &Question, submitted: &str) -> bool {
    if question.kind == QuestionKind::TrueFalse {
        let parsed = (
            submitted.parse::<TruthValue>(),
            question.correct_answer.parse::<TruthValue>(),
        );
        if let (Ok(given), Ok(expected)) = parsed {
            return given == expected;
        }
    }
    answers_match(submitted, &question.correct_answer)
}

/// Classify every question of the exam against the answer sheet.
pub fn breakdown(questions: &[Question], answers: &AnswerSheet) -> Vec<QuestionOutcome> {
    questions
        .iter()
        .enumerate()
        .map(|(position, question)| {
            let outcome = if !question.kind.is_objective() {
                Outcome::ManualReview
            } else {
                match answers.get(&position) {
                    None => Outcome::Unanswered,
                    Some(a) if is_correct(question, a) => Outcome::Correct,
                    Some(_) => Outcome::Incorrect,
                }
            };
            QuestionOutcome { position, outcome }
        })
        .collect()
}

/// Score an answer sheet against the exam's questions.
///
/// Pure and deterministic: the same inputs always give the same summary.
pub fn score(
    student_name: &str,
    questions: &[Question],
    answers: &AnswerSheet,
) -> GradeSummary {
    let outcomes = breakdown(questions, answers);
    let total_objective = outcomes
        .iter()
        .filter(|o| o.outcome != Outcome::ManualReview)
        .count() as u32;
    let correct_count = outcomes
        .iter()
        .filter(|o| o.outcome == Outcome::Correct)
        .count() as u32;

    GradeSummary {
        student_name: student_name.to_string(),
        correct_count,
        total_objective,
    }
}
