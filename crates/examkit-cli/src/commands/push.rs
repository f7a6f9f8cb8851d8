//! The `examkit push` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use examkit_client::config::{create_backend, load_config_from};
use examkit_core::bank::BankQuestion;
use examkit_core::parser;
use examkit_core::{ExamComposer, SaveOutcome};

pub async fn execute(
    exam_path: PathBuf,
    id: Option<String>,
    bank_ids: Option<String>,
    owner: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let backend = create_backend(&config)?;

    let mut exam = parser::parse_exam_file(&exam_path)?;
    if id.is_some() {
        exam.id = id;
    }
    let mut composer = ExamComposer::from_exam(exam);

    if let Some(ids) = &bank_ids {
        let owner = owner
            .or(config.owner.clone())
            .context("--bank needs an owner: pass --owner or set `owner` in the config")?;
        let bank = backend.list_bank_questions(&owner).await?;
        let selected = select_from_bank(&bank, ids)?;
        let range = composer.import_selected(&selected);
        println!(
            "Imported {} bank question(s) as questions {}-{}",
            range.len(),
            range.start + 1,
            range.end
        );
    }

    match composer.save(backend.as_ref()).await? {
        SaveOutcome::Created(id) => {
            println!("Created exam {id} ({} questions)", composer.len());
            println!("Update it later with: examkit push --exam {} --id {id}", exam_path.display());
        }
        SaveOutcome::Updated => {
            let id = composer.exam_id().unwrap_or_default();
            println!("Updated exam {id} ({} questions)", composer.len());
        }
    }

    Ok(())
}

/// Pick bank entries by id, in the order the ids were given.
fn select_from_bank(bank: &[BankQuestion], ids: &str) -> Result<Vec<BankQuestion>> {
    ids.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            bank.iter()
                .find(|entry| entry.bank_id == id)
                .cloned()
                .with_context(|| format!("bank question '{id}' not found"))
        })
        .collect()
}
