//! Grade records with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scoring::{breakdown, GradeSummary, Outcome, QuestionOutcome};
use crate::session::GradingSession;

/// The archived result of one grading session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeRecord {
    /// Unique record identifier.
    pub id: Uuid,
    pub exam_id: String,
    pub exam_title: String,
    pub summary: GradeSummary,
    /// Per-question outcomes, in exam order.
    pub outcomes: Vec<QuestionOutcome>,
    pub graded_at: DateTime<Utc>,
}

impl GradeRecord {
    /// Build a record from a submitted session. Returns `None` if the
    /// session has not been scored yet.
    pub fn from_session(session: &GradingSession) -> Option<Self> {
        let summary = session.summary()?.clone();
        Some(Self {
            id: Uuid::new_v4(),
            exam_id: session.exam_id().to_string(),
            exam_title: session.exam().title.clone(),
            summary,
            outcomes: breakdown(&session.exam().questions, session.answers()),
            graded_at: Utc::now(),
        })
    }

    /// Essay positions the instructor still has to mark by hand.
    pub fn pending_review(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .filter(|o| o.outcome == Outcome::ManualReview)
            .map(|o| o.position)
            .collect()
    }

    /// Save the record as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize grade record")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write grade record to {}", path.display()))?;
        Ok(())
    }

    /// Load a record from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read grade record from {}", path.display()))?;
        let record: GradeRecord =
            serde_json::from_str(&content).context("failed to parse grade record JSON")?;
        Ok(record)
    }
}
