//! The exam backend contract.
//!
//! Persistence, the question bank and result storage live behind this
//! trait. Implemented by `examkit-client` for HTTP and in-memory backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::bank::BankQuestion;
use crate::error::BackendError;
use crate::model::{AnswerSheet, Exam, ExamPayload, Question};
use crate::scoring::GradeSummary;

/// Trait for backends that store exams, bank questions and grades.
///
/// Each call is treated as atomic: callers issue one request, await one
/// response, and only then change their own state.
#[async_trait]
pub trait ExamBackend: Send + Sync {
    /// Human-readable backend name (e.g. "http").
    fn name(&self) -> &str;

    /// Fetch an exam for editing or grading.
    async fn fetch_exam(&self, exam_id: &str) -> Result<Exam, BackendError>;

    /// Create an exam and return its newly assigned id.
    async fn create_exam(&self, payload: &ExamPayload) -> Result<String, BackendError>;

    /// Replace an existing exam's contents.
    async fn update_exam(&self, exam_id: &str, payload: &ExamPayload)
        -> Result<(), BackendError>;

    async fn delete_exam(&self, exam_id: &str) -> Result<(), BackendError>;

    /// List the reusable questions owned by `owner_id`.
    async fn list_bank_questions(&self, owner_id: &str)
        -> Result<Vec<BankQuestion>, BackendError>;

    /// Persist one question into the bank.
    async fn save_bank_question(&self, question: &Question) -> Result<(), BackendError>;

    /// Submit a completed grading session for scoring and result storage.
    async fn grade_exam(
        &self,
        exam_id: &str,
        request: &GradeRequest,
    ) -> Result<GradeSummary, BackendError>;
}

/// Body of a grade submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeRequest {
    #[serde(rename = "nome_aluno")]
    pub student_name: String,
    /// Answers in question order.
    #[serde(rename = "respostas")]
    pub answers: Vec<String>,
}

impl GradeRequest {
    /// Build a request from an answer sheet whose positions are contiguous
    /// from 0. Any gap ends the list.
    pub fn from_sheet(student_name: &str, sheet: &AnswerSheet) -> Self {
        let answers = (0..)
            .map_while(|i| sheet.get(&i).cloned())
            .collect();
        Self {
            student_name: student_name.to_string(),
            answers,
        }
    }

    pub fn to_sheet(&self) -> AnswerSheet {
        self.answers.iter().cloned().enumerate().collect()
    }
}
