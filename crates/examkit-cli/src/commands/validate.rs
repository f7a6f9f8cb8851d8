//! The `examkit validate` command.

use std::path::PathBuf;

use anyhow::Result;

use examkit_core::parser::{self, Severity};

pub fn execute(exam_path: PathBuf) -> Result<()> {
    let exams = if exam_path.is_dir() {
        parser::load_exam_directory(&exam_path)?
    } else {
        vec![parser::parse_exam_file(&exam_path)?]
    };

    let mut warnings = 0;
    let mut errors = 0;

    for exam in &exams {
        let objective = exam.questions.iter().filter(|q| q.kind.is_objective()).count();
        println!(
            "Exam: {} ({} questions, {} auto-scored)",
            exam.title,
            exam.questions.len(),
            objective
        );

        for issue in parser::validate_exam(exam) {
            let prefix = issue
                .position
                .map(|p| format!("  [q{}]", p + 1))
                .unwrap_or_else(|| "  ".to_string());
            match issue.severity {
                Severity::Error => {
                    errors += 1;
                    println!("{prefix} ERROR: {}", issue.message);
                }
                Severity::Warning => {
                    warnings += 1;
                    println!("{prefix} WARNING: {}", issue.message);
                }
            }
        }
    }

    if errors > 0 {
        anyhow::bail!("{errors} error(s) and {warnings} warning(s) found");
    }
    if warnings == 0 {
        println!("All exams valid.");
    } else {
        println!("\n{warnings} warning(s) found.");
    }

    Ok(())
}
