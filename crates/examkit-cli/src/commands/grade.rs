//! The `examkit grade` command.
//!
//! Walks students through an exam one question at a time on the terminal,
//! submits each completed answer sheet and archives a grade record.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use examkit_client::config::{create_backend, load_config_from};
use examkit_client::InMemoryBackend;
use examkit_core::model::{AnswerOption, Exam, QuestionKind, TruthValue};
use examkit_core::parser::{self, Severity};
use examkit_core::report::GradeRecord;
use examkit_core::traits::ExamBackend;
use examkit_core::{ExamError, GradingSession, Phase};

type Input = Lines<BufReader<Stdin>>;

/// Parse an exam file and refuse it if it has any validation errors.
fn load_local_exam(path: &Path) -> Result<Exam> {
    let exam = parser::parse_exam_file(path)?;
    let errors: Vec<String> = parser::validate_exam(&exam)
        .into_iter()
        .filter(|issue| matches!(issue.severity, Severity::Error))
        .map(|issue| match issue.position {
            Some(p) => format!("[q{}] {}", p + 1, issue.message),
            None => issue.message,
        })
        .collect();
    if !errors.is_empty() {
        anyhow::bail!(
            "{} has {} invalid question(s): {}; run `examkit validate` for details",
            path.display(),
            errors.len(),
            errors.join("; ")
        );
    }
    Ok(exam)
}

pub async fn execute(
    exam_path: Option<PathBuf>,
    exam_id: Option<String>,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let results_dir = output.unwrap_or_else(|| config.results_dir.clone());

    let (backend, exam_id): (Box<dyn ExamBackend>, String) = match (exam_path, exam_id) {
        (Some(path), _) => {
            let exam = load_local_exam(&path)?;
            let id = exam.id.clone().unwrap_or_else(|| "local".to_string());
            let local = InMemoryBackend::new(config.owner.as_deref().unwrap_or("local"));
            local.insert_exam(&id, exam);
            (Box::new(local), id)
        }
        (None, Some(id)) => (create_backend(&config)?, id),
        (None, None) => anyhow::bail!("pass --exam or --id"),
    };

    let mut session = GradingSession::open(backend.as_ref(), &exam_id)
        .await
        .with_context(|| format!("failed to load exam {exam_id}"))?;
    tracing::debug!(exam_id = %exam_id, backend = backend.name(), "grading session opened");
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", session.exam().title);
    if !session.exam().header.trim().is_empty() {
        println!("{}", session.exam().header.trim_end());
    }

    loop {
        let Some(name) = ask(&mut input, "\nStudent name: ").await? else {
            break;
        };
        match session.start(&name) {
            Ok(_) => {}
            Err(ExamError::EmptyStudentName) => {
                println!("Please enter a name.");
                continue;
            }
            Err(e) => return Err(e.into()),
        }

        if !answer_questions(&mut session, &mut input).await? {
            break;
        }

        if matches!(session.phase(), Phase::Completed { no_questions: true }) {
            println!("This exam has no questions to grade.");
            break;
        }
        if !submit_with_retry(&mut session, backend.as_ref(), &mut input).await? {
            break;
        }
        record_result(&session, &results_dir)?;

        let again = ask(&mut input, "Grade another student? [y/N] ").await?;
        if !again.is_some_and(|a| is_yes(&a)) {
            break;
        }
        session.grade_another()?;
    }

    Ok(())
}

/// Present questions until the session completes. Returns `false` if the
/// input ran out first.
async fn answer_questions(session: &mut GradingSession, input: &mut Input) -> Result<bool> {
    while let Some(presented) = session.current() {
        println!(
            "\nQuestion {}/{} ({})",
            presented.position + 1,
            presented.total,
            presented.question.kind
        );
        println!("{}", presented.question.prompt);
        for (i, option) in presented.options.iter().enumerate() {
            println!("  {}. {}", i + 1, option.label);
        }

        let kind = presented.question.kind;
        let options = presented.options;
        let answer = loop {
            let Some(raw) = ask(input, "> ").await? else {
                return Ok(false);
            };
            match resolve_answer(kind, &options, &raw) {
                Some(answer) => break answer,
                None => println!("Pick one of 1-{}.", options.len()),
            }
        };
        session.answer(answer)?;
    }
    Ok(true)
}

/// Submit, offering a retry while scoring is unavailable. Returns `false`
/// if the operator gave up.
async fn submit_with_retry(
    session: &mut GradingSession,
    backend: &dyn ExamBackend,
    input: &mut Input,
) -> Result<bool> {
    loop {
        match session.submit(backend).await {
            Ok(summary) => {
                let pct = summary
                    .fraction()
                    .map(|f| format!(" ({:.0}%)", f * 100.0))
                    .unwrap_or_default();
                println!(
                    "\n{}: {}/{} correct{pct}",
                    summary.student_name, summary.correct_count, summary.total_objective
                );
                return Ok(true);
            }
            Err(ExamError::ScoringUnavailable(e)) => {
                println!("Could not submit answers: {e}");
                let retry = ask(input, "Retry? [y/N] ").await?;
                if !retry.is_some_and(|r| is_yes(&r)) {
                    return Ok(false);
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn record_result(session: &GradingSession, results_dir: &Path) -> Result<()> {
    let Some(record) = GradeRecord::from_session(session) else {
        return Ok(());
    };
    let pending = record.pending_review();
    if !pending.is_empty() {
        let numbers: Vec<String> = pending.iter().map(|p| (p + 1).to_string()).collect();
        println!("Essay questions to mark by hand: {}", numbers.join(", "));
    }
    let path = results_dir.join(format!("grade-{}.json", record.id));
    record.save_json(&path)?;
    eprintln!("Result saved to: {}", path.display());
    Ok(())
}

/// Map what the operator typed onto the recorded answer: an option number,
/// an option value, or a truth word. Essay questions always record an empty
/// answer.
fn resolve_answer(kind: QuestionKind, options: &[AnswerOption], raw: &str) -> Option<String> {
    if kind == QuestionKind::Essay {
        return Some(String::new());
    }

    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(n) = raw.parse::<usize>() {
        return options.get(n.checked_sub(1)?).map(|o| o.value.clone());
    }
    if kind == QuestionKind::TrueFalse {
        if let Ok(value) = raw.parse::<TruthValue>() {
            return Some(value.as_str().to_string());
        }
    }
    options
        .iter()
        .find(|o| o.value.eq_ignore_ascii_case(raw))
        .map(|o| o.value.clone())
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

async fn ask(input: &mut Input, prompt: &str) -> Result<Option<String>> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    Ok(input.next_line().await?)
}
