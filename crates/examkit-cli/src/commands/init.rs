//! The `examkit init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("examkit.toml").exists() {
        println!("examkit.toml already exists, skipping.");
    } else {
        std::fs::write("examkit.toml", SAMPLE_CONFIG)?;
        println!("Created examkit.toml");
    }

    std::fs::create_dir_all("exams")?;
    let example_path = std::path::Path::new("exams/example.toml");
    if example_path.exists() {
        println!("exams/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_EXAM)?;
        println!("Created exams/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit examkit.toml with your server address and owner");
    println!("  2. Run: examkit validate --exam exams/example.toml");
    println!("  3. Run: examkit grade --exam exams/example.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# examkit configuration

owner = "prof@example.com"
results_dir = "./examkit-results"

[backend]
type = "http"
base_url = "http://localhost:8080"
auth_token = "${EXAMKIT_TOKEN}"
timeout_secs = 30
"#;

const EXAMPLE_EXAM: &str = r#"[exam]
title = "Example Quiz"
header = """
Name: ______________________
Date: ____/____/______
"""

[[questions]]
kind = "multiple_choice"
prompt = "Which planet is closest to the Sun?"
choices = ["Venus", "Mercury", "Mars", "Earth"]
answer = "b"

[[questions]]
kind = "true_false"
prompt = "Water boils at 100 degrees Celsius at sea level."
answer = "verdadeiro"

[[questions]]
kind = "essay"
prompt = "Describe the water cycle in your own words."
answer = "Evaporation, condensation, precipitation, collection."
"#;
