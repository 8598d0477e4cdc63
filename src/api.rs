use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::source::Source;

pub const NO_ANSWER: &str = "No answer from server.";
const UNKNOWN_DETAIL: &str = "Unknown error occurred";

#[derive(Debug, Serialize)]
pub struct QueryRequest {
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_ids: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub sources: Option<Vec<Source>>,
}

impl QueryResponse {
    /// Answer text, or the fallback when the server sent none.
    pub fn answer_text(&self) -> &str {
        match self.answer.as_deref() {
            Some(answer) if !answer.is_empty() => answer,
            _ => NO_ANSWER,
        }
    }

    pub fn into_parts(self) -> (String, Vec<Source>) {
        let answer = self.answer_text().to_string();
        (answer, self.sources.unwrap_or_default())
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<Value>,
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("HTTP error! status: {}, message: {}", .status.as_u16(), .detail.as_deref().unwrap_or(UNKNOWN_DETAIL))]
    Http {
        status: StatusCode,
        detail: Option<String>,
    },

    #[error("Could not connect to the server.")]
    Transport(#[source] reqwest::Error),

    #[error("Invalid response from server: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Client for the `/query` endpoint. Cheap to clone; each submission task
/// gets its own copy.
#[derive(Clone)]
pub struct QueryClient {
    client: Client,
    base_url: String,
    doc_ids: Option<Vec<i64>>,
}

impl QueryClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            doc_ids: None,
        }
    }

    /// Restrict answers to the given document ids.
    pub fn with_doc_ids(mut self, doc_ids: Vec<i64>) -> Self {
        self.doc_ids = if doc_ids.is_empty() { None } else { Some(doc_ids) };
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/query", self.base_url)
    }

    pub async fn query(&self, question: &str) -> Result<QueryResponse, QueryError> {
        let request = QueryRequest {
            question: question.to_string(),
            doc_ids: self.doc_ids.clone(),
        };

        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            .map_err(QueryError::Transport)?;

        let status = response.status();
        let body = response.bytes().await.map_err(QueryError::Transport)?;

        if !status.is_success() {
            return Err(QueryError::Http {
                status,
                detail: error_detail(&body),
            });
        }

        serde_json::from_slice(&body).map_err(QueryError::Decode)
    }
}

/// Best-effort `detail` extraction from an error body.
fn error_detail(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    match parsed.detail? {
        Value::Null => None,
        Value::String(detail) => Some(detail),
        other => Some(other.to_string()),
    }
}
