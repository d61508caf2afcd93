//! Push delivery via Firebase Cloud Messaging (HTTP v1 API).

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use fittogether_common::config::ServiceCredentials;
use fittogether_common::types::InvalidRecord;

use crate::message::PushMessage;

/// Failure of a single delivery attempt.
///
/// `Display` yields the human-readable message that is recorded on the
/// notification record.
#[derive(Debug, Error)]
pub enum PushError {
    /// The provider answered with an error body.
    #[error("{message}")]
    Rejected {
        status: StatusCode,
        code: Option<String>,
        message: String,
    },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed push provider response: {0}")]
    MalformedResponse(String),

    /// The record could not be turned into a message; nothing was sent.
    #[error(transparent)]
    InvalidMessage(#[from] InvalidRecord),
}

/// Anything that can deliver a push message and hand back the provider's id.
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, message: &PushMessage) -> Result<String, PushError>;
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// FCM HTTP v1 client.
pub struct FcmClient {
    http: reqwest::Client,
    endpoint: String,
    credentials: ServiceCredentials,
}

impl FcmClient {
    pub fn new(http: reqwest::Client, base_url: &str, credentials: ServiceCredentials) -> Self {
        let endpoint = format!(
            "{}/v1/projects/{}/messages:send",
            base_url.trim_end_matches('/'),
            credentials.project_id
        );
        Self {
            http,
            endpoint,
            credentials,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PushSender for FcmClient {
    async fn send(&self, message: &PushMessage) -> Result<String, PushError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.credentials.access_token)
            .json(&serde_json::json!({ "message": message }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(rejection(status, &body));
        }

        let parsed: SendResponse = serde_json::from_str(&body)
            .map_err(|e| PushError::MalformedResponse(e.to_string()))?;
        Ok(parsed.name)
    }
}

/// Turn an FCM error response into a `PushError::Rejected`.
fn rejection(status: StatusCode, body: &str) -> PushError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let code = parsed.as_ref().and_then(|e| e.error.status.clone());
    let message = parsed
        .and_then(|e| e.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
        });

    PushError::Rejected {
        status,
        code,
        message,
    }
}
