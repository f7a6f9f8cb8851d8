//! TOML exam file parser.
//!
//! Loads exams from authoring files and directories, writes them back out,
//! and validates them for reporting.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::composer::canonical_answer;
use crate::model::{Exam, Question, QuestionKind};

/// Intermediate TOML structure for exam files.
#[derive(Debug, Serialize, Deserialize)]
struct TomlExamFile {
    exam: TomlExamHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TomlExamHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    title: String,
    #[serde(default)]
    header: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct TomlQuestion {
    kind: String,
    prompt: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    choices: Vec<String>,
    #[serde(default)]
    answer: String,
}

/// Parse a single TOML file into an `Exam`.
pub fn parse_exam_file(path: &Path) -> Result<Exam> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read exam file: {}", path.display()))?;

    parse_exam_str(&content, path)
}

/// Parse a TOML string into an `Exam` (useful for testing).
pub fn parse_exam_str(content: &str, source_path: &Path) -> Result<Exam> {
    let parsed: TomlExamFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let questions = parsed
        .questions
        .into_iter()
        .enumerate()
        .map(|(i, q)| {
            let kind: QuestionKind = q.kind.parse().map_err(|e: String| {
                anyhow::anyhow!("{}: question {}: {}", source_path.display(), i + 1, e)
            })?;
            Ok(Question {
                kind,
                prompt: q.prompt,
                choices: q.choices,
                correct_answer: canonical_answer(kind, q.answer),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Exam {
        id: parsed.exam.id,
        title: parsed.exam.title,
        header: parsed.exam.header,
        questions,
    })
}

/// Load all `.toml` exam files from a directory (recursively).
pub fn load_exam_directory(dir: &Path) -> Result<Vec<Exam>> {
    let mut exams = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();

    for path in paths {
        if path.is_dir() {
            exams.extend(load_exam_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_exam_file(&path) {
                Ok(exam) => exams.push(exam),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(exams)
}

/// Render an exam in the authoring file format.
pub fn to_toml_string(exam: &Exam) -> Result<String> {
    let file = TomlExamFile {
        exam: TomlExamHeader {
            id: exam.id.clone(),
            title: exam.title.clone(),
            header: exam.header.clone(),
        },
        questions: exam
            .questions
            .iter()
            .map(|q| TomlQuestion {
                kind: q.kind.as_str().to_string(),
                prompt: q.prompt.clone(),
                choices: q.choices.clone(),
                answer: q.correct_answer.clone(),
            })
            .collect(),
    };
    toml::to_string_pretty(&file).context("failed to serialize exam as TOML")
}

/// How serious a validation finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The exam cannot be saved as is.
    Error,
    Warning,
}

/// A finding from exam validation.
#[derive(Debug, Clone)]
pub struct ExamIssue {
    /// The question position (if applicable).
    pub position: Option<usize>,
    pub severity: Severity,
    pub message: String,
}

/// Validate an exam, collecting every issue instead of stopping at the first.
pub fn validate_exam(exam: &Exam) -> Vec<ExamIssue> {
    let mut issues = Vec::new();

    if exam.title.trim().is_empty() {
        issues.push(ExamIssue {
            position: None,
            severity: Severity::Warning,
            message: "title is empty".into(),
        });
    }

    if exam.questions.is_empty() {
        issues.push(ExamIssue {
            position: None,
            severity: Severity::Warning,
            message: "exam has no questions; grading will end immediately".into(),
        });
    } else if !exam.questions.iter().any(|q| q.kind.is_objective()) {
        issues.push(ExamIssue {
            position: None,
            severity: Severity::Warning,
            message: "exam has only essay questions; nothing will be auto-scored".into(),
        });
    }

    for (position, question) in exam.questions.iter().enumerate() {
        if let Err(e) = question.validate() {
            issues.push(ExamIssue {
                position: Some(position),
                severity: Severity::Error,
                message: e.to_string(),
            });
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[exam]
title = "Geography Quiz"
header = """
Name:
Date:
"""

[[questions]]
kind = "multiple_choice"
prompt = "What is the capital of France?"
choices = ["Paris", "Lyon", "Nice", "Lille"]
answer = "a"

[[questions]]
kind = "true_false"
prompt = "The Nile is in Africa."
answer = "True"

[[questions]]
kind = "essay"
prompt = "Describe the water cycle."
answer = "Evaporation, condensation, precipitation."
"#;

    #[test]
    fn parse_valid_toml() {
        let exam = parse_exam_str(VALID_TOML, &PathBuf::from("quiz.toml")).unwrap();
        assert_eq!(exam.title, "Geography Quiz");
        assert!(exam.id.is_none());
        assert_eq!(exam.questions.len(), 3);
        assert_eq!(exam.questions[0].kind, QuestionKind::MultipleChoice);
        assert_eq!(exam.questions[0].choices.len(), 4);
        assert_eq!(exam.questions[1].correct_answer, "verdadeiro");
        assert_eq!(exam.questions[2].kind, QuestionKind::Essay);
        assert!(validate_exam(&exam).is_empty());
    }

    #[test]
    fn parse_backend_kind_names() {
        let toml = r#"
[exam]
id = "abc"
title = "T"

[[questions]]
kind = "verdadeiro_falso"
prompt = "x"
answer = "falso"
"#;
        let exam = parse_exam_str(toml, &PathBuf::from("t.toml")).unwrap();
        assert_eq!(exam.id.as_deref(), Some("abc"));
        assert_eq!(exam.questions[0].kind, QuestionKind::TrueFalse);
    }

    #[test]
    fn parse_unknown_kind() {
        let toml = r#"
[exam]
title = "T"

[[questions]]
kind = "matching"
prompt = "x"
"#;
        let err = parse_exam_str(toml, &PathBuf::from("t.toml")).unwrap_err();
        assert!(err.to_string().contains("unknown question kind"));
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_exam_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn toml_round_trip_preserves_exam() {
        let exam = parse_exam_str(VALID_TOML, &PathBuf::from("quiz.toml")).unwrap();
        let rendered = to_toml_string(&exam).unwrap();
        let reparsed = parse_exam_str(&rendered, &PathBuf::from("out.toml")).unwrap();
        assert_eq!(reparsed, exam);
    }

    #[test]
    fn validate_collects_every_issue() {
        let toml = r#"
[exam]
title = ""

[[questions]]
kind = "multiple_choice"
prompt = ""
choices = ["a", "b"]
answer = "a"

[[questions]]
kind = "multiple_choice"
prompt = "Pick"
choices = ["a", "b"]
answer = "c"
"#;
        let exam = parse_exam_str(toml, &PathBuf::from("t.toml")).unwrap();
        let issues = validate_exam(&exam);
        assert!(issues
            .iter()
            .any(|i| i.position.is_none() && i.message.contains("title")));
        let errors: Vec<_> = issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .collect();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].position, Some(0));
        assert!(errors[1].message.contains("does not match any choice"));
    }

    #[test]
    fn validate_warns_on_essay_only_exam() {
        let exam = Exam {
            id: None,
            title: "T".into(),
            header: String::new(),
            questions: vec![Question::essay("Discuss", "")],
        };
        let issues = validate_exam(&exam);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn load_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("quiz.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "not toml [").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let exams = load_exam_directory(dir.path()).unwrap();
        assert_eq!(exams.len(), 1);
        assert_eq!(exams[0].title, "Geography Quiz");
    }
}
