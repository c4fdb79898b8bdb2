//! AI-assisted deck generation.
//!
//! A [`DeckGenerator`] turns a topic into question/answer pairs. The default
//! implementation calls a Gemini-style `generateContent` endpoint and asks for
//! a JSON array matching a fixed schema. Each call is a single attempt: there
//! is no retry and no partial result.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::config::GeneratorConfig;
use crate::error::{Error, Result};

/// A generated question/answer pair, before ids and flags are assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedCard {
    /// Front side.
    pub question: String,
    /// Back side.
    pub answer: String,
}

/// Source of generated cards.
#[async_trait]
pub trait DeckGenerator: Send + Sync {
    /// Generate cards about `topic`.
    ///
    /// # Errors
    ///
    /// Returns a generation error on empty input, transport failure, or a
    /// response that does not contain at least one valid pair.
    async fn generate(&self, topic: &str) -> Result<Vec<GeneratedCard>>;
}

/// Client for the Gemini `generateContent` API.
#[derive(Debug, Clone)]
pub struct GeminiGenerator {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    card_count: usize,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiGenerator {
    /// Build a generator from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.resolved_api_key(),
            card_count: config.card_count,
        })
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    fn prompt(&self, topic: &str) -> String {
        format!(
            "Create {} flashcards for studying the topic \"{topic}\". \
             Each card has a short question and a concise answer. \
             Reply with a JSON array of objects with \"question\" and \"answer\" fields.",
            self.card_count
        )
    }

    fn request_body(&self, topic: &str) -> serde_json::Value {
        json!({
            "contents": [{ "parts": [{ "text": self.prompt(topic) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "question": { "type": "STRING" },
                            "answer": { "type": "STRING" }
                        },
                        "required": ["question", "answer"]
                    }
                }
            }
        })
    }
}

#[async_trait]
impl DeckGenerator for GeminiGenerator {
    async fn generate(&self, topic: &str) -> Result<Vec<GeneratedCard>> {
        let topic = validate_topic(topic)?;

        let mut request = self
            .client
            .post(self.generate_url())
            .json(&self.request_body(topic));
        if let Some(key) = &self.api_key {
            request = request.header("x-goog-api-key", key);
        }

        debug!("Requesting cards for '{topic}' from {}", self.model);
        let response = request
            .send()
            .await
            .map_err(|e| Error::generation(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::generation(format!("HTTP {status}: {body}")));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::generation(format!("unexpected response body: {e}")))?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .ok_or_else(|| Error::generation("response contained no candidates"))?;

        let cards = parse_cards(&text)?;
        info!("Generated {} cards for '{topic}'", cards.len());
        Ok(cards)
    }
}

/// Reject blank topics before any request is made.
///
/// # Errors
///
/// Returns a generation error if the topic is empty or whitespace.
pub fn validate_topic(topic: &str) -> Result<&str> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(Error::generation("topic must not be empty"));
    }
    Ok(topic)
}

/// Parse the model's text output into cards.
///
/// Accepts a bare JSON array or one wrapped in a fenced code block. Extra
/// fields on each object are ignored.
///
/// # Errors
///
/// Returns a generation error if the text is not an array of
/// `{question, answer}` objects or the array is empty.
pub fn parse_cards(text: &str) -> Result<Vec<GeneratedCard>> {
    let cards: Vec<GeneratedCard> = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| Error::generation(format!("malformed card list: {e}")))?;

    if cards.is_empty() {
        return Err(Error::generation("no cards were generated"));
    }
    Ok(cards)
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
