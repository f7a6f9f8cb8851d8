//! In-process backend.
//!
//! Holds exams, the question bank and received grades in memory. Used for
//! grading exam files locally and as a test double.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use examkit_core::bank::BankQuestion;
use examkit_core::error::BackendError;
use examkit_core::model::{Exam, ExamPayload, Question};
use examkit_core::scoring::{score, GradeSummary};
use examkit_core::traits::{ExamBackend, GradeRequest};

/// Backend that never leaves the process.
pub struct InMemoryBackend {
    owner: String,
    exams: Mutex<HashMap<String, Exam>>,
    bank: Mutex<Vec<BankQuestion>>,
    graded: Mutex<Vec<(String, GradeSummary)>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl InMemoryBackend {
    /// `owner` is recorded on every question saved to the bank.
    pub fn new(owner: &str) -> Self {
        Self {
            owner: owner.to_string(),
            exams: Mutex::new(HashMap::new()),
            bank: Mutex::new(Vec::new()),
            graded: Mutex::new(Vec::new()),
        }
    }

    /// Store an exam under the given id, replacing any existing one.
    pub fn insert_exam(&self, exam_id: &str, exam: Exam) {
        let mut exam = exam;
        exam.id = Some(exam_id.to_string());
        lock(&self.exams).insert(exam_id.to_string(), exam);
    }

    /// Add a bank entry directly, bypassing validation.
    pub fn insert_bank_question(&self, entry: BankQuestion) {
        lock(&self.bank).push(entry);
    }

    pub fn exam_count(&self) -> usize {
        lock(&self.exams).len()
    }

    /// Grades received so far, as `(exam_id, summary)` pairs.
    pub fn graded(&self) -> Vec<(String, GradeSummary)> {
        lock(&self.graded).clone()
    }
}

#[async_trait]
impl ExamBackend for InMemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch_exam(&self, exam_id: &str) -> Result<Exam, BackendError> {
        lock(&self.exams)
            .get(exam_id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("exam {exam_id}")))
    }

    async fn create_exam(&self, payload: &ExamPayload) -> Result<String, BackendError> {
        let id = Uuid::new_v4().to_string();
        let exam = payload.clone().into_exam(Some(id.clone()));
        lock(&self.exams).insert(id.clone(), exam);
        debug!(exam_id = %id, "exam created in memory");
        Ok(id)
    }

    async fn update_exam(&self, exam_id: &str, payload: &ExamPayload) -> Result<(), BackendError> {
        let mut exams = lock(&self.exams);
        let slot = exams
            .get_mut(exam_id)
            .ok_or_else(|| BackendError::NotFound(format!("exam {exam_id}")))?;
        *slot = payload.clone().into_exam(Some(exam_id.to_string()));
        Ok(())
    }

    async fn delete_exam(&self, exam_id: &str) -> Result<(), BackendError> {
        lock(&self.exams)
            .remove(exam_id)
            .map(|_| ())
            .ok_or_else(|| BackendError::NotFound(format!("exam {exam_id}")))
    }

    async fn list_bank_questions(&self, owner_id: &str) -> Result<Vec<BankQuestion>, BackendError> {
        Ok(lock(&self.bank)
            .iter()
            .filter(|entry| entry.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn save_bank_question(&self, question: &Question) -> Result<(), BackendError> {
        if question.prompt.trim().is_empty() || question.correct_answer.trim().is_empty() {
            return Err(BackendError::Rejected {
                status: 400,
                message: "prompt and answer are required".into(),
            });
        }
        let entry = BankQuestion {
            bank_id: Uuid::new_v4().to_string(),
            owner_id: self.owner.clone(),
            question: question.clone(),
        };
        lock(&self.bank).push(entry);
        Ok(())
    }

    async fn grade_exam(
        &self,
        exam_id: &str,
        request: &GradeRequest,
    ) -> Result<GradeSummary, BackendError> {
        let exam = self.fetch_exam(exam_id).await?;
        let summary = score(&request.student_name, &exam.questions, &request.to_sheet());
        lock(&self.graded).push((exam_id.to_string(), summary.clone()));
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use examkit_core::model::TruthValue;

    fn payload() -> ExamPayload {
        ExamPayload {
            title: "Quiz".into(),
            header: String::new(),
            questions: vec![
                Question::multiple_choice("Pick", vec!["x".into(), "y".into()], "b"),
                Question::true_false("Sky is blue", TruthValue::True),
                Question::essay("Explain", "Because"),
            ],
        }
    }

    #[tokio::test]
    async fn create_fetch_update_delete() {
        let backend = InMemoryBackend::new("t@example.com");
        let id = backend.create_exam(&payload()).await.unwrap();

        let fetched = backend.fetch_exam(&id).await.unwrap();
        assert_eq!(fetched.id.as_deref(), Some(id.as_str()));
        assert_eq!(fetched.questions.len(), 3);

        let mut changed = payload();
        changed.title = "Renamed".into();
        backend.update_exam(&id, &changed).await.unwrap();
        assert_eq!(backend.fetch_exam(&id).await.unwrap().title, "Renamed");
        assert_eq!(backend.exam_count(), 1);

        backend.delete_exam(&id).await.unwrap();
        assert!(matches!(
            backend.fetch_exam(&id).await,
            Err(BackendError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_unknown_exam_is_not_found() {
        let backend = InMemoryBackend::new("t");
        let err = backend.update_exam("ghost", &payload()).await.unwrap_err();
        assert!(matches!(err, BackendError::NotFound(_)));
    }

    #[tokio::test]
    async fn bank_is_scoped_to_owner() {
        let backend = InMemoryBackend::new("a@example.com");
        backend
            .save_bank_question(&Question::essay("Explain", "Because"))
            .await
            .unwrap();

        assert_eq!(
            backend.list_bank_questions("a@example.com").await.unwrap().len(),
            1
        );
        assert!(backend
            .list_bank_questions("b@example.com")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn bank_rejects_incomplete_question() {
        let backend = InMemoryBackend::new("a");
        let err = backend
            .save_bank_question(&Question::essay("Explain", "  "))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Rejected { status: 400, .. }));
    }

    #[tokio::test]
    async fn grading_scores_objective_questions() {
        let backend = InMemoryBackend::new("t");
        backend.insert_exam("e1", payload().into_exam(None));

        let request = GradeRequest {
            student_name: "Ana".into(),
            answers: vec!["B".into(), "falso".into(), "anything".into()],
        };
        let summary = backend.grade_exam("e1", &request).await.unwrap();
        assert_eq!(summary.correct_count, 1);
        assert_eq!(summary.total_objective, 2);
        assert_eq!(backend.graded(), vec![("e1".to_string(), summary)]);
    }
}
