//! Question bank entries and their conversion into exam questions.

use serde::{Deserialize, Serialize};

use crate::model::Question;

/// A reusable question persisted in an instructor's personal bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankQuestion {
    /// Stable identity of the entry in the bank.
    #[serde(rename = "id_questao")]
    pub bank_id: String,
    /// The authoring user.
    #[serde(rename = "user_email")]
    pub owner_id: String,
    #[serde(flatten)]
    pub question: Question,
}

impl BankQuestion {
    /// First `max_chars` characters of the prompt, for pick lists.
    pub fn preview(&self, max_chars: usize) -> String {
        let mut chars = self.question.prompt.chars();
        let head: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }
}

/// Copy a bank entry into a fresh, ownerless question.
///
/// The result shares nothing with the bank entry: editing one never
/// affects the other.
pub fn import_from_bank(entry: &BankQuestion) -> Question {
    entry.question.clone()
}
