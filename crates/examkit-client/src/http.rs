//! HTTP exam backend.
//!
//! Speaks the exam server's JSON API:
//!
//! | operation            | request                          |
//! |----------------------|----------------------------------|
//! | fetch exam           | `GET /api/provas/{id}`           |
//! | create exam          | `POST /api/provas`               |
//! | update exam          | `PUT /api/provas/{id}`           |
//! | delete exam          | `DELETE /api/provas/{id}`        |
//! | list bank questions  | `GET /api/questoes?owner={id}`   |
//! | save bank question   | `POST /api/questoes`             |
//! | grade exam           | `POST /api/provas/{id}/corrigir` |

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::instrument;

use examkit_core::bank::BankQuestion;
use examkit_core::error::BackendError;
use examkit_core::model::{Exam, ExamPayload, Question};
use examkit_core::scoring::GradeSummary;
use examkit_core::traits::{ExamBackend, GradeRequest};

/// Client for a remote exam server.
pub struct HttpBackend {
    base_url: String,
    auth_token: Option<String>,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: &str, auth_token: Option<String>, timeout_secs: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token,
            timeout_secs,
            client,
        })
    }

    fn exam_url(&self, exam_id: &str) -> String {
        format!("{}/api/provas/{}", self.base_url, exam_id)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, BackendError> {
        let request = match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout(self.timeout_secs)
            } else {
                BackendError::Network(e.to_string())
            }
        })
    }
}

/// Response to a create request; the server echoes the payload plus `id`.
#[derive(Deserialize)]
struct Created {
    id: String,
}

/// `{"success": true}` or `{"error": "..."}`.
#[derive(Deserialize)]
struct Ack {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GradeResponse {
    Graded(GradeSummary),
    Failed { error: String },
}

/// Map non-success statuses to `BackendError`, using the server's
/// `{"error": ...}` message when there is one.
async fn check_status(response: Response, what: &str) -> Result<Response, BackendError> {
    let status = response.status().as_u16();
    if status < 400 {
        return Ok(response);
    }
    if status == 404 {
        return Err(BackendError::NotFound(what.to_string()));
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Ack>(&body)
        .ok()
        .and_then(|ack| ack.error)
        .unwrap_or(body);
    Err(BackendError::Rejected { status, message })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    response
        .json::<T>()
        .await
        .map_err(|e| BackendError::Decode(e.to_string()))
}

fn ack_to_result(ack: Ack, status: u16) -> Result<(), BackendError> {
    match ack.error {
        Some(message) => Err(BackendError::Rejected { status, message }),
        None if ack.success => Ok(()),
        None => Err(BackendError::Rejected {
            status,
            message: "server did not confirm the request".into(),
        }),
    }
}

#[async_trait]
impl ExamBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self))]
    async fn fetch_exam(&self, exam_id: &str) -> Result<Exam, BackendError> {
        let response = self.send(self.client.get(self.exam_url(exam_id))).await?;
        let response = check_status(response, &format!("exam {exam_id}")).await?;
        let mut exam: Exam = decode(response).await?;
        exam.id.get_or_insert_with(|| exam_id.to_string());
        Ok(exam)
    }

    #[instrument(skip(self, payload), fields(questions = payload.questions.len()))]
    async fn create_exam(&self, payload: &ExamPayload) -> Result<String, BackendError> {
        let url = format!("{}/api/provas", self.base_url);
        let response = self.send(self.client.post(url).json(payload)).await?;
        let response = check_status(response, "exam collection").await?;
        let created: Created = decode(response).await?;
        Ok(created.id)
    }

    #[instrument(skip(self, payload), fields(questions = payload.questions.len()))]
    async fn update_exam(&self, exam_id: &str, payload: &ExamPayload) -> Result<(), BackendError> {
        let response = self
            .send(self.client.put(self.exam_url(exam_id)).json(payload))
            .await?;
        let response = check_status(response, &format!("exam {exam_id}")).await?;
        let status = response.status().as_u16();
        ack_to_result(decode(response).await?, status)
    }

    #[instrument(skip(self))]
    async fn delete_exam(&self, exam_id: &str) -> Result<(), BackendError> {
        let response = self.send(self.client.delete(self.exam_url(exam_id))).await?;
        check_status(response, &format!("exam {exam_id}")).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_bank_questions(&self, owner_id: &str) -> Result<Vec<BankQuestion>, BackendError> {
        let url = Url::parse_with_params(
            &format!("{}/api/questoes", self.base_url),
            &[("owner", owner_id)],
        )
        .map_err(|e| BackendError::Network(format!("invalid URL: {e}")))?;
        let response = self.send(self.client.get(url)).await?;
        let response = check_status(response, "question bank").await?;
        decode(response).await
    }

    #[instrument(skip(self, question), fields(kind = %question.kind))]
    async fn save_bank_question(&self, question: &Question) -> Result<(), BackendError> {
        let url = format!("{}/api/questoes", self.base_url);
        let response = self.send(self.client.post(url).json(question)).await?;
        let response = check_status(response, "question bank").await?;
        let status = response.status().as_u16();
        ack_to_result(decode(response).await?, status)
    }

    #[instrument(skip(self, request), fields(answers = request.answers.len()))]
    async fn grade_exam(
        &self,
        exam_id: &str,
        request: &GradeRequest,
    ) -> Result<GradeSummary, BackendError> {
        let url = format!("{}/corrigir", self.exam_url(exam_id));
        let response = self.send(self.client.post(url).json(request)).await?;
        let response = check_status(response, &format!("exam {exam_id}")).await?;
        let status = response.status().as_u16();
        match decode(response).await? {
            GradeResponse::Graded(summary) => Ok(summary),
            GradeResponse::Failed { error } => Err(BackendError::Rejected {
                status,
                message: error,
            }),
        }
    }
}
