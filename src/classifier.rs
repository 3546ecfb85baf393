//! Classification client.
//!
//! Sends extracted text to an OpenAI-compatible chat completion endpoint and
//! turns the single-word answer into a category name that is safe to use as a
//! directory. Transient failures (network errors, non-success statuses) are
//! retried with a fixed delay; malformed responses are not.

use crate::config::OrganizerConfig;
use crate::extractor::truncate_chars;
use regex::Regex;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

const SYSTEM_PROMPT: &str = "You are an assistant that organizes files into directories. \
Reply with a single category name and nothing else.";

/// Longest category name created from a classifier answer.
const MAX_CATEGORY_CHARS: usize = 64;

static UNSAFE_CATEGORY_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[/\\\x00-\x1f\x7f:*?"<>|]"#).expect("valid category regex"));

/// A failed request that is worth retrying.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Classification failed after multiple retries due to API issues ({attempts} attempts, last error: {last_error})")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("Malformed classifier response: {0}")]
    MalformedResponse(String),

    #[error("Classifier returned an unusable category name: {0:?}")]
    InvalidCategory(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Body of a chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Delivers a request and returns the raw response body.
pub trait Transport {
    fn send(&self, request: &ChatRequest) -> Result<String, TransportError>;
}

/// HTTPS transport with bearer authorization.
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl HttpTransport {
    pub fn new(config: &OrganizerConfig, api_key: String) -> Result<Self, ClassifyError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ClassifyError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
        })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &ChatRequest) -> Result<String, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: truncate_chars(&body, 200).to_string(),
            });
        }

        Ok(body)
    }
}

/// Asks the remote service for a category per piece of text.
pub struct ClassifierClient {
    transport: Box<dyn Transport>,
    model: String,
    max_retries: u32,
    retry_delay: Duration,
    max_request_chars: usize,
}

impl ClassifierClient {
    pub fn new(transport: Box<dyn Transport>, config: &OrganizerConfig) -> Self {
        Self {
            transport,
            model: config.model.clone(),
            max_retries: config.max_retries,
            retry_delay: config.retry_delay(),
            max_request_chars: config.max_request_chars,
        }
    }

    /// Overrides the delay slept before each retry.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Classifies one piece of text.
    ///
    /// `known_categories` is shown to the model so it can reuse an existing
    /// directory; the answer may also be a new name.
    pub fn classify(
        &self,
        filename: &str,
        text: &str,
        known_categories: &[String],
    ) -> Result<String, ClassifyError> {
        let request = self.build_request(filename, text, known_categories);
        let body = self.send_with_retry(&request)?;
        let answer = parse_response(&body)?;
        tracing::debug!("Classifier answered {:?} for {}", answer, filename);
        sanitize_category(&answer, known_categories)
    }

    pub fn build_request(
        &self,
        filename: &str,
        text: &str,
        known_categories: &[String],
    ) -> ChatRequest {
        let categories = if known_categories.is_empty() {
            "None".to_string()
        } else {
            known_categories.join(", ")
        };
        let text = truncate_chars(text, self.max_request_chars);

        let prompt = format!(
            "Filename: {filename}\n\
             Content:\n\"\"\"\n{text}\n\"\"\"\n\
             Existing categories: {categories}\n\
             Should this file belong to an existing category or should a new one be created? \
             Answer with one word: an existing category name, or a new category name."
        );

        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt,
                },
            ],
            temperature: 0.0,
        }
    }

    fn send_with_retry(&self, request: &ChatRequest) -> Result<String, ClassifyError> {
        let attempts = self.max_retries + 1;
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            if attempt > 1 {
                std::thread::sleep(self.retry_delay);
            }

            match self.transport.send(request) {
                Ok(body) => return Ok(body),
                Err(e) => {
                    tracing::warn!(
                        "Classification request failed (attempt {}/{}): {}",
                        attempt,
                        attempts,
                        e
                    );
                    last_error = e.to_string();
                }
            }
        }

        Err(ClassifyError::RetriesExhausted {
            attempts,
            last_error,
        })
    }
}

/// Extracts the trimmed answer text from a chat completion body.
pub fn parse_response(body: &str) -> Result<String, ClassifyError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| ClassifyError::MalformedResponse(e.to_string()))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| ClassifyError::MalformedResponse("no answer in response".to_string()))
}

/// Turns a raw answer into a category usable as a path below the base.
///
/// An answer naming a known category (case-insensitively) maps to that
/// category, which may be a nested relative path. Anything else is reduced to
/// a single path segment.
pub fn sanitize_category(raw: &str, known_categories: &[String]) -> Result<String, ClassifyError> {
    let line = raw
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("");
    let unquoted = line
        .trim_matches(|c| matches!(c, '"' | '\'' | '`' | '*'))
        .trim();
    let unquoted = strip_label(unquoted);

    if let Some(known) = find_known(unquoted, known_categories) {
        return Ok(known);
    }

    let bare = unquoted
        .trim_end_matches(|c| matches!(c, '.' | ',' | ';' | ':' | '!' | '?'))
        .trim();
    if let Some(known) = find_known(bare, known_categories) {
        return Ok(known);
    }

    let replaced = UNSAFE_CATEGORY_CHARS.replace_all(bare, "_");
    let cleaned = truncate_chars(replaced.trim_matches(|c| c == '.' || c == ' '), MAX_CATEGORY_CHARS)
        .trim_end_matches(|c| c == '.' || c == ' ');

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_') {
        return Err(ClassifyError::InvalidCategory(raw.to_string()));
    }

    Ok(cleaned.to_string())
}

fn strip_label(answer: &str) -> &str {
    const LABEL: &str = "category:";
    match answer.get(..LABEL.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(LABEL) => answer[LABEL.len()..].trim(),
        _ => answer,
    }
}

fn find_known(candidate: &str, known_categories: &[String]) -> Option<String> {
    if candidate.is_empty() {
        return None;
    }
    known_categories
        .iter()
        .find(|known| known.as_str() == candidate)
        .or_else(|| {
            known_categories
                .iter()
                .find(|known| known.eq_ignore_ascii_case(candidate))
        })
        .cloned()
}
