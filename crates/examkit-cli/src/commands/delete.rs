//! The `examkit delete` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use examkit_client::config::{create_backend, load_config_from};

pub async fn execute(id: String, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let backend = create_backend(&config)?;

    backend
        .delete_exam(&id)
        .await
        .with_context(|| format!("failed to delete exam {id}"))?;
    println!("Deleted exam {id}");

    Ok(())
}
