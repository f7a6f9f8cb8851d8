//! Exam composition store.
//!
//! Holds the exclusive in-memory copy of an exam being authored. Each
//! question slot carries a stable [`QuestionId`] so callers can keep
//! referring to a question while others are added or removed around it.

use std::ops::Range;

use crate::bank::{import_from_bank, BankQuestion};
use crate::error::{ExamError, InvalidQuestion};
use crate::model::{
    Exam, ExamPayload, Question, QuestionId, QuestionKind, TruthValue, CHOICE_LABELS,
};
use crate::traits::ExamBackend;

/// A mutable part of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionField {
    Prompt,
    /// One multiple-choice entry, by position.
    Choice(usize),
    CorrectAnswer,
}

/// What an explicit save did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The exam was new; the backend assigned this id.
    Created(String),
    Updated,
}

#[derive(Debug, Clone)]
struct Slot {
    id: QuestionId,
    question: Question,
}

impl Slot {
    fn new(question: Question) -> Self {
        Self {
            id: QuestionId::new(),
            question,
        }
    }
}

/// An exam under construction.
#[derive(Debug, Clone, Default)]
pub struct ExamComposer {
    exam_id: Option<String>,
    title: String,
    header: String,
    slots: Vec<Slot>,
}

impl ExamComposer {
    /// Start a new, unsaved exam.
    pub fn new(title: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            exam_id: None,
            title: title.into(),
            header: header.into(),
            slots: Vec::new(),
        }
    }

    /// Open an existing exam for editing.
    pub fn from_exam(exam: Exam) -> Self {
        Self {
            exam_id: exam.id,
            title: exam.title,
            header: exam.header,
            slots: exam.questions.into_iter().map(Slot::new).collect(),
        }
    }

    /// Fetch an exam from the backend and open it for editing.
    pub async fn open(backend: &dyn ExamBackend, exam_id: &str) -> Result<Self, ExamError> {
        let exam = backend.fetch_exam(exam_id).await?;
        let mut composer = Self::from_exam(exam);
        // The backend may omit the id from the body.
        composer.exam_id.get_or_insert_with(|| exam_id.to_string());
        Ok(composer)
    }

    pub fn exam_id(&self) -> Option<&str> {
        self.exam_id.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_header(&mut self, header: impl Into<String>) {
        self.header = header.into();
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.slots.iter().map(|s| &s.question)
    }

    pub fn question(&self, index: usize) -> Option<&Question> {
        self.slots.get(index).map(|s| &s.question)
    }

    pub fn id_at(&self, index: usize) -> Option<QuestionId> {
        self.slots.get(index).map(|s| s.id)
    }

    /// Current position of the question with this id.
    pub fn position_of(&self, id: QuestionId) -> Option<usize> {
        self.slots.iter().position(|s| s.id == id)
    }

    /// Append a blank question of `kind` and return its position.
    pub fn add_question(&mut self, kind: QuestionKind) -> usize {
        self.slots.push(Slot::new(Question::new(kind)));
        let index = self.slots.len() - 1;
        tracing::debug!(index, %kind, "question added");
        index
    }

    /// Append an already-authored question and return its position.
    pub fn push_question(&mut self, question: Question) -> usize {
        self.slots.push(Slot::new(question));
        self.slots.len() - 1
    }

    /// Add one empty choice to a multiple-choice question, up to the number
    /// of available letter labels. Returns the new choice's position.
    pub fn push_choice(&mut self, index: usize) -> Result<usize, ExamError> {
        let question = self.slot_mut(index)?;
        if question.kind != QuestionKind::MultipleChoice {
            return Err(ExamError::NotMultipleChoice { position: index });
        }
        if question.choices.len() >= CHOICE_LABELS.len() {
            return Err(ExamError::InvalidQuestion {
                position: index,
                source: InvalidQuestion::TooManyChoices {
                    count: question.choices.len() + 1,
                    max: CHOICE_LABELS.len(),
                },
            });
        }
        question.choices.push(String::new());
        Ok(question.choices.len() - 1)
    }

    /// Set the prompt, one choice, or the correct answer of the question at
    /// `index`.
    pub fn update_field(
        &mut self,
        index: usize,
        field: QuestionField,
        value: impl Into<String>,
    ) -> Result<(), ExamError> {
        let question = self.slot_mut(index)?;
        match field {
            QuestionField::Prompt => question.prompt = value.into(),
            QuestionField::CorrectAnswer => {
                question.correct_answer = canonical_answer(question.kind, value.into())
            }
            QuestionField::Choice(choice) => {
                let len = question.choices.len();
                let slot = question
                    .choices
                    .get_mut(choice)
                    .ok_or(ExamError::ChoiceOutOfRange { index: choice, len })?;
                *slot = value.into();
            }
        }
        Ok(())
    }

    /// Like [`update_field`](Self::update_field), addressing the question
    /// by identity.
    pub fn update_field_by_id(
        &mut self,
        id: QuestionId,
        field: QuestionField,
        value: impl Into<String>,
    ) -> Result<(), ExamError> {
        let index = self.require_position(id)?;
        self.update_field(index, field, value)
    }

    /// Delete the question at `index`; later questions shift down by one.
    pub fn remove_question(&mut self, index: usize) -> Result<Question, ExamError> {
        if index >= self.slots.len() {
            return Err(ExamError::IndexOutOfRange {
                index,
                len: self.slots.len(),
            });
        }
        let removed = self.slots.remove(index);
        tracing::debug!(index, id = %removed.id, "question removed");
        Ok(removed.question)
    }

    pub fn remove_by_id(&mut self, id: QuestionId) -> Result<Question, ExamError> {
        let index = self.require_position(id)?;
        self.remove_question(index)
    }

    /// Append copies of the selected bank entries, in selection order.
    /// Returns the positions they now occupy.
    pub fn import_selected(&mut self, selected: &[BankQuestion]) -> Range<usize> {
        let start = self.slots.len();
        self.slots
            .extend(selected.iter().map(|entry| Slot::new(import_from_bank(entry))));
        tracing::info!(count = selected.len(), "imported questions from bank");
        start..self.slots.len()
    }

    /// Validate every question, reporting the first failure.
    pub fn validate(&self) -> Result<(), ExamError> {
        for (position, slot) in self.slots.iter().enumerate() {
            slot.question
                .validate()
                .map_err(|source| ExamError::InvalidQuestion { position, source })?;
        }
        Ok(())
    }

    pub fn to_save_payload(&self) -> ExamPayload {
        ExamPayload {
            title: self.title.clone(),
            header: self.header.clone(),
            questions: self.questions().cloned().collect(),
        }
    }

    /// The exam as it would look after saving.
    pub fn to_exam(&self) -> Exam {
        self.to_save_payload().into_exam(self.exam_id.clone())
    }

    /// Validate, then create or update the exam on the backend.
    ///
    /// An exam without an id is created and adopts the returned id, so the
    /// next save becomes an update. On any error the composer is unchanged.
    pub async fn save(&mut self, backend: &dyn ExamBackend) -> Result<SaveOutcome, ExamError> {
        self.validate()?;
        let payload = self.to_save_payload();

        match self.exam_id.clone() {
            Some(id) => {
                backend.update_exam(&id, &payload).await?;
                tracing::info!(exam_id = %id, questions = payload.questions.len(), "exam updated");
                Ok(SaveOutcome::Updated)
            }
            None => {
                let id = backend.create_exam(&payload).await?;
                tracing::info!(exam_id = %id, questions = payload.questions.len(), "exam created");
                self.exam_id = Some(id.clone());
                Ok(SaveOutcome::Created(id))
            }
        }
    }

    /// Copy the question at `index` into the question bank.
    pub async fn save_to_bank(
        &self,
        index: usize,
        backend: &dyn ExamBackend,
    ) -> Result<(), ExamError> {
        let question = self.question(index).ok_or(ExamError::IndexOutOfRange {
            index,
            len: self.slots.len(),
        })?;
        let invalid = |source| ExamError::InvalidQuestion {
            position: index,
            source,
        };
        if question.prompt.trim().is_empty() {
            return Err(invalid(InvalidQuestion::EmptyPrompt));
        }
        if question.correct_answer.trim().is_empty() {
            return Err(invalid(InvalidQuestion::MissingCorrectAnswer));
        }
        backend.save_bank_question(question).await?;
        tracing::info!(index, "question saved to bank");
        Ok(())
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut Question, ExamError> {
        let len = self.slots.len();
        self.slots
            .get_mut(index)
            .map(|s| &mut s.question)
            .ok_or(ExamError::IndexOutOfRange { index, len })
    }

    fn require_position(&self, id: QuestionId) -> Result<usize, ExamError> {
        self.position_of(id)
            .ok_or_else(|| ExamError::NotFound(format!("question {id}")))
    }
}

/// True/false answers are stored in their canonical form so they compare
/// equal to what the grading flow submits.
pub(crate) fn canonical_answer(kind: QuestionKind, answer: String) -> String {
    if kind != QuestionKind::TrueFalse {
        return answer;
    }
    match answer.trim().parse::<TruthValue>() {
        Ok(value) => value.as_str().to_string(),
        Err(_) => answer,
    }
}
