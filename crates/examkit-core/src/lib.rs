//! examkit-core: exam composition and sequential grading.
//!
//! This crate defines the question model, the composition store with its
//! question-bank reuse, the grading session state machine, and the scoring
//! rules the rest of examkit builds on.

pub mod bank;
pub mod composer;
pub mod error;
pub mod model;
pub mod parser;
pub mod report;
pub mod scoring;
pub mod session;
pub mod traits;

pub use composer::{ExamComposer, QuestionField, SaveOutcome};
pub use error::{BackendError, ExamError, InvalidQuestion};
pub use session::{GradingSession, Phase};
pub use traits::{ExamBackend, GradeRequest};
