//! Chat-completions HTTP client for the external route solver.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wastetrack_core::PlanError;

use crate::config::SolverConfig;

/// Transport-level failures talking to the solver service.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("solver returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected reply envelope: {0}")]
    Envelope(String),
}

impl From<SolverError> for PlanError {
    fn from(err: SolverError) -> Self {
        match err {
            SolverError::Timeout(limit) => PlanError::SolverTimeout(limit),
            SolverError::Envelope(detail) => PlanError::MalformedSolverResponse(detail),
            other => PlanError::SolverUnavailable(other.to_string()),
        }
    }
}

/// HTTP client for an OpenAI-compatible chat-completions endpoint.
pub struct SolverClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
    pub(crate) model: String,
    pub(crate) temperature: f64,
    pub(crate) timeout: Duration,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl SolverClient {
    pub fn new(config: &SolverConfig) -> Result<Self> {
        let mut builder = Client::builder().timeout(config.timeout);
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build().context("Failed to create solver HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            timeout: config.timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one system + user exchange and return the assistant's text.
    pub async fn complete(&self, system: &str, prompt: &str) -> Result<String, SolverError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.temperature,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = self.api_key.as_deref() {
            builder = builder.bearer_auth(key);
        }

        tracing::debug!("Requesting route from solver model {}", self.model);
        let response = builder.send().await.map_err(|err| self.classify(err))?;

        let status = response.status();
        let body = response.text().await.map_err(|err| self.classify(err))?;
        if !status.is_success() {
            return Err(SolverError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: ChatResponse = serde_json::from_str(&body)
            .map_err(|err| SolverError::Envelope(format!("body is not a chat completion: {err}")))?;
        envelope
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| SolverError::Envelope("reply has no message content".to_string()))
    }

    fn classify(&self, err: reqwest::Error) -> SolverError {
        if err.is_timeout() {
            SolverError::Timeout(self.timeout)
        } else {
            SolverError::Transport(err)
        }
    }
}
