use crate::config::AppConfig;
use crate::domain::ports::TextService;
use crate::utils::error::{ConstraintError, Result, ServiceErrorKind};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound for a single backoff sleep.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
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
    content: Option<String>,
}

/// OpenAI-compatible Chat Completions client.
pub struct OpenAiService {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl OpenAiService {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let service = &config.service;
        let client = Client::builder()
            .timeout(Duration::from_secs(service.timeout_seconds))
            .build()
            .map_err(|e| ConstraintError::ConfigError {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", service.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: service.model.clone(),
            max_tokens: service.max_tokens,
            retry_attempts: service.retry_attempts.max(1),
            retry_delay: Duration::from_millis(service.retry_delay_ms),
        })
    }

    async fn send_once(&self, instruction: &str, user_text: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: instruction,
                },
                ChatMessage {
                    role: "user",
                    content: user_text,
                },
            ],
            temperature: 0.0,
            max_tokens: self.max_tokens,
        };

        tracing::debug!("Making API request to: {}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ConstraintError::from_status(status, &text));
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                ConstraintError::service(
                    ServiceErrorKind::InvalidResponse,
                    "completion has no message content",
                )
            })
    }
}

#[async_trait]
impl TextService for OpenAiService {
    async fn complete(&self, instruction: &str, user_text: &str) -> Result<String> {
        let mut delay = self.retry_delay;
        let mut attempt = 1;
        loop {
            match self.send_once(instruction, user_text).await {
                Ok(reply) => return Ok(reply),
                Err(e) if e.is_retryable() && attempt < self.retry_attempts => {
                    tracing::warn!(
                        "🔁 Attempt {}/{} failed: {}. Retrying in {:?}",
                        attempt,
                        self.retry_attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    delay = next_delay(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn next_delay(delay: Duration) -> Duration {
    delay.saturating_mul(2).min(MAX_RETRY_DELAY)
}
