//! The `examkit pull` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use examkit_client::config::{create_backend, load_config_from};
use examkit_core::parser;

pub async fn execute(id: String, output: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let backend = create_backend(&config)?;

    let exam = backend
        .fetch_exam(&id)
        .await
        .with_context(|| format!("failed to fetch exam {id}"))?;
    let rendered = parser::to_toml_string(&exam)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!(
                "Saved \"{}\" ({} questions) to {}",
                exam.title,
                exam.questions.len(),
                path.display()
            );
        }
        None => print!("{rendered}"),
    }

    Ok(())
}
