use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;

const TEMPERATURE: f64 = 0.6;
const TOP_P: f64 = 0.95;
const TOP_K: u32 = 40;
const MAX_OUTPUT_TOKENS: u32 = 8192;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub const SOURCES_HEADER: &str = "--- Sources ---";

/// Outcome of one call to the text service. Built once at the gateway
/// boundary so callers never inspect raw provider payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayResponse {
    Text(String),
    Empty,
    Fault(String),
}

impl GatewayResponse {
    /// Blank text is `Empty`.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.trim().is_empty() {
            GatewayResponse::Empty
        } else {
            GatewayResponse::Text(text)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub title: String,
    pub url: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// One outbound call, no retries. Must not fail: every fault is folded
    /// into `GatewayResponse::Fault`.
    async fn generate(&self, prompt: &str, topic: &str) -> GatewayResponse;
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(client: Client, api_key: String, model: String, base_url: String) -> Self {
        tracing::info!(%model, "initializing Gemini client");
        Self {
            client,
            api_key,
            model,
            base_url,
        }
    }

    pub fn from_config(client: Client, config: &crate::config::Config) -> Self {
        Self::new(
            client,
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
            config.gemini_base_url.clone(),
        )
    }

    async fn generate_content(&self, contents: &str) -> Result<JsonValue> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        let res = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_payload(contents))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Gemini API Error {}: {}", status, text).into());
        }

        Ok(res.json().await?)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str, topic: &str) -> GatewayResponse {
        let contents = enhance_prompt(prompt, topic);
        tracing::debug!(topic, "generating content with Gemini");

        match self.generate_content(&contents).await {
            Ok(body) => {
                let response = parse_generation(&body);
                if let GatewayResponse::Fault(reason) = &response {
                    tracing::error!(%reason, "Gemini returned an unusable response");
                }
                response
            }
            Err(e) => {
                tracing::error!(error = ?e, "Error generating content");
                GatewayResponse::Fault(e.to_string())
            }
        }
    }
}

pub fn enhance_prompt(prompt: &str, topic: &str) -> String {
    let topic = if topic.trim().is_empty() {
        "General"
    } else {
        topic.trim()
    };
    format!(
        "Topic: {}\n\n{}\n\nNote: Please use search to find accurate and up-to-date information.",
        topic, prompt
    )
}

fn request_payload(contents: &str) -> JsonValue {
    serde_json::json!({
        "contents": [
            {"role": "user", "parts": [{"text": contents}]}
        ],
        "tools": [{"google_search": {}}],
        "generationConfig": {
            "temperature": TEMPERATURE,
            "topP": TOP_P,
            "topK": TOP_K,
            "maxOutputTokens": MAX_OUTPUT_TOKENS,
            "responseModalities": ["TEXT"]
        }
    })
}

/// Text of the first candidate, with a sources section appended when the
/// answer was grounded in web results.
pub fn parse_generation(body: &JsonValue) -> GatewayResponse {
    let Some(candidate) = body
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
    else {
        if let Some(reason) = body
            .get("promptFeedback")
            .and_then(|f| f.get("blockReason"))
            .and_then(|r| r.as_str())
        {
            return GatewayResponse::Fault(format!("prompt blocked: {}", reason));
        }
        return GatewayResponse::Empty;
    };

    let text: String = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
                .collect()
        })
        .unwrap_or_default();

    match GatewayResponse::from_text(text) {
        GatewayResponse::Text(text) => {
            let sources = grounding_sources(candidate);
            if sources.is_empty() {
                GatewayResponse::Text(text)
            } else {
                GatewayResponse::Text(format!("{}\n{}", text, render_sources(&sources)))
            }
        }
        other => other,
    }
}

fn grounding_sources(candidate: &JsonValue) -> Vec<Reference> {
    candidate
        .get("groundingMetadata")
        .and_then(|m| m.get("groundingChunks"))
        .and_then(|c| c.as_array())
        .map(|chunks| {
            chunks
                .iter()
                .filter_map(|chunk| {
                    let (source, fallback) = if let Some(web) = chunk.get("web") {
                        (web, "Web Source")
                    } else {
                        (chunk.get("retrievedContext")?, "Retrieved Context")
                    };
                    let url = source.get("uri")?.as_str()?.to_string();
                    let title = source
                        .get("title")
                        .and_then(|t| t.as_str())
                        .filter(|t| !t.is_empty())
                        .unwrap_or(fallback)
                        .to_string();
                    Some(Reference { title, url })
                })
                .collect()
        })
        .unwrap_or_default()
}

pub fn render_sources(sources: &[Reference]) -> String {
    let mut out = SOURCES_HEADER.to_string();
    for source in sources {
        out.push_str(&format!("\n- [{}]({})", source.title, source.url));
    }
    out
}
