//! Grading session state machine.
//!
//! Walks one student through an exam's questions strictly in order:
//!
//! ```text
//! CollectingName -> Presenting(0) -> ... -> Presenting(n-1) -> Completed -> Submitted
//!        ^                                                                      |
//!        +------------------------------ grade_another -------------------------+
//! ```
//!
//! An exam without questions jumps from `CollectingName` straight to a
//! terminal completion that is never submitted. Illegal actions return
//! [`ExamError::InvalidTransition`] and leave the session untouched.

use std::sync::Arc;

use crate::error::ExamError;
use crate::model::{AnswerOption, AnswerSheet, Exam, Question};
use crate::scoring::GradeSummary;
use crate::traits::{ExamBackend, GradeRequest};

/// Where the session currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    CollectingName,
    /// Showing the question at this position.
    Presenting(usize),
    /// All questions answered. `no_questions` marks the terminal state of
    /// an empty exam, which is never submitted.
    Completed { no_questions: bool },
    Submitted(GradeSummary),
}

impl Phase {
    fn describe(&self) -> &'static str {
        match self {
            Phase::CollectingName => "collecting the student name",
            Phase::Presenting(_) => "presenting questions",
            Phase::Completed {
                no_questions: true,
            } => "finished (exam has no questions)",
            Phase::Completed { .. } => "completed",
            Phase::Submitted(_) => "submitted",
        }
    }
}

/// The question currently in front of the student.
#[derive(Debug, Clone)]
pub struct PresentedQuestion<'a> {
    pub position: usize,
    pub total: usize,
    pub question: &'a Question,
    pub options: Vec<AnswerOption>,
}

/// One student's pass through one exam.
#[derive(Debug, Clone)]
pub struct GradingSession {
    exam_id: String,
    exam: Arc<Exam>,
    student_name: String,
    answers: AnswerSheet,
    phase: Phase,
}

impl GradingSession {
    pub fn new(exam_id: impl Into<String>, exam: Arc<Exam>) -> Self {
        Self {
            exam_id: exam_id.into(),
            exam,
            student_name: String::new(),
            answers: AnswerSheet::new(),
            phase: Phase::CollectingName,
        }
    }

    /// Fetch the exam fresh from the backend and start collecting a name.
    pub async fn open(backend: &dyn ExamBackend, exam_id: &str) -> Result<Self, ExamError> {
        let exam = backend.fetch_exam(exam_id).await?;
        tracing::debug!(exam_id, questions = exam.questions.len(), "exam loaded for grading");
        Ok(Self::new(exam_id, Arc::new(exam)))
    }

    pub fn exam_id(&self) -> &str {
        &self.exam_id
    }

    pub fn exam(&self) -> &Arc<Exam> {
        &self.exam
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn student_name(&self) -> &str {
        &self.student_name
    }

    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    pub fn total(&self) -> usize {
        self.exam.questions.len()
    }

    /// Position of the question being presented, or of the next one to be.
    pub fn current_index(&self) -> usize {
        match self.phase {
            Phase::Presenting(i) => i,
            _ => self.answers.len(),
        }
    }

    pub fn summary(&self) -> Option<&GradeSummary> {
        match &self.phase {
            Phase::Submitted(summary) => Some(summary),
            _ => None,
        }
    }

    pub fn current(&self) -> Option<PresentedQuestion<'_>> {
        let Phase::Presenting(position) = self.phase else {
            return None;
        };
        let question = self.exam.questions.get(position)?;
        Some(PresentedQuestion {
            position,
            total: self.total(),
            question,
            options: question.answer_options(),
        })
    }

    /// Accept the student's name and present the first question.
    pub fn start(&mut self, student_name: &str) -> Result<&Phase, ExamError> {
        self.expect_phase("start", |p| matches!(p, Phase::CollectingName))?;

        let name = student_name.trim();
        if name.is_empty() {
            return Err(ExamError::EmptyStudentName);
        }
        self.student_name = name.to_string();

        self.phase = if self.exam.questions.is_empty() {
            tracing::info!(exam_id = %self.exam_id, "exam has no questions to grade");
            Phase::Completed { no_questions: true }
        } else {
            tracing::info!(exam_id = %self.exam_id, student = %self.student_name, "grading started");
            Phase::Presenting(0)
        };
        Ok(&self.phase)
    }

    /// Record the answer to the presented question and move on.
    pub fn answer(&mut self, answer: impl Into<String>) -> Result<&Phase, ExamError> {
        let Phase::Presenting(position) = self.phase else {
            return Err(self.invalid("answer"));
        };

        self.answers.insert(position, answer.into());
        tracing::debug!(position, "answer recorded");

        let next = position + 1;
        self.phase = if next < self.total() {
            Phase::Presenting(next)
        } else {
            tracing::info!(exam_id = %self.exam_id, answered = self.answers.len(), "all questions answered");
            Phase::Completed {
                no_questions: false,
            }
        };
        Ok(&self.phase)
    }

    /// Skip the presented question, recording an empty answer.
    pub fn skip(&mut self) -> Result<&Phase, ExamError> {
        self.answer(String::new())
    }

    /// Send the completed answer sheet to the backend for scoring.
    ///
    /// On failure the session stays `Completed` and may be submitted again.
    pub async fn submit(&mut self, backend: &dyn ExamBackend) -> Result<GradeSummary, ExamError> {
        self.expect_phase("submit", |p| {
            matches!(
                p,
                Phase::Completed {
                    no_questions: false
                }
            )
        })?;

        let request = GradeRequest::from_sheet(&self.student_name, &self.answers);
        let summary = backend
            .grade_exam(&self.exam_id, &request)
            .await
            .map_err(|e| {
                tracing::warn!(exam_id = %self.exam_id, "grade submission failed: {e}");
                ExamError::ScoringUnavailable(e)
            })?;

        tracing::info!(
            exam_id = %self.exam_id,
            student = %summary.student_name,
            correct = summary.correct_count,
            total = summary.total_objective,
            "grade received"
        );
        self.phase = Phase::Submitted(summary.clone());
        Ok(summary)
    }

    /// Reset for the next student on the same exam.
    pub fn grade_another(&mut self) -> Result<(), ExamError> {
        self.expect_phase("grade another", |p| {
            matches!(
                p,
                Phase::Submitted(_)
                    | Phase::Completed {
                        no_questions: true
                    }
            )
        })?;
        self.student_name.clear();
        self.answers.clear();
        self.phase = Phase::CollectingName;
        Ok(())
    }

    fn expect_phase(
        &self,
        action: &'static str,
        allowed: impl Fn(&Phase) -> bool,
    ) -> Result<(), ExamError> {
        if allowed(&self.phase) {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> ExamError {
        ExamError::InvalidTransition {
            action,
            phase: self.phase.describe(),
        }
    }
}
