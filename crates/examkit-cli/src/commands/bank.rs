//! The `examkit bank` commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use examkit_client::config::{create_backend, load_config_from};
use examkit_core::bank::BankQuestion;
use examkit_core::parser;
use examkit_core::ExamComposer;

const PREVIEW_CHARS: usize = 60;

pub async fn list(owner: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let owner = owner
        .or(config.owner.clone())
        .context("no bank owner: pass --owner or set `owner` in the config")?;
    let backend = create_backend(&config)?;

    let bank = backend.list_bank_questions(&owner).await?;
    if bank.is_empty() {
        println!("No questions in the bank for {owner}.");
        return Ok(());
    }

    println!("{}", bank_table(&bank));
    println!("{} question(s)", bank.len());
    Ok(())
}

pub async fn save(exam_path: PathBuf, number: usize, config_path: Option<PathBuf>) -> Result<()> {
    anyhow::ensure!(number >= 1, "question numbers start at 1");

    let config = load_config_from(config_path.as_deref())?;
    let backend = create_backend(&config)?;

    let composer = ExamComposer::from_exam(parser::parse_exam_file(&exam_path)?);
    composer.save_to_bank(number - 1, backend.as_ref()).await?;

    println!("Saved question {number} to the bank");
    Ok(())
}

fn bank_table(bank: &[BankQuestion]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Id", "Kind", "Prompt", "Answer"]);

    for entry in bank {
        table.add_row(vec![
            Cell::new(&entry.bank_id),
            Cell::new(entry.question.kind),
            Cell::new(entry.preview(PREVIEW_CHARS)),
            Cell::new(&entry.question.correct_answer),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use examkit_core::model::{Question, TruthValue};

    #[test]
    fn table_lists_every_entry() {
        let bank = vec![
            BankQuestion {
                bank_id: "q1".into(),
                owner_id: "o".into(),
                question: Question::true_false("Ice floats", TruthValue::True),
            },
            BankQuestion {
                bank_id: "q2".into(),
                owner_id: "o".into(),
                question: Question::essay("x".repeat(100), ""),
            },
        ];
        let rendered = bank_table(&bank).to_string();
        assert!(rendered.contains("q1"));
        assert!(rendered.contains("true/false"));
        assert!(rendered.contains("verdadeiro"));
        assert!(rendered.contains("..."));
    }
}
