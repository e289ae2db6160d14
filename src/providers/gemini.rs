//! Gemini generateContent client
//!
//! Wire types for the v1beta generateContent endpoint plus a thin client.
//! A single round trip per call; no retry, no streaming. The response body
//! is kept as raw JSON so the proxy can pass it through untouched.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::conversation::{Part, Role};

use super::ProviderError;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Literal substituted when the upstream response carries no text part.
pub const NO_REPLY_FALLBACK: &str = "Sorry, no reply from Gemini.";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// One conversation turn in wire shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInstruction {
    pub parts: Vec<Part>,
}

impl SystemInstruction {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![Part::text(text)],
        }
    }
}

/// Tool declaration. Only search augmentation is declared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub google_search: Value,
}

impl Tool {
    pub fn google_search() -> Self {
        Self {
            google_search: json!({}),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<SystemInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
}

impl GenerateContentRequest {
    /// Wrap a bare text prompt into a single-turn request.
    pub fn single_turn(prompt: &str, system_instruction: &str) -> Self {
        Self {
            contents: vec![Content {
                role: Role::User,
                parts: vec![Part::text(prompt)],
            }],
            system_instruction: Some(SystemInstruction::from_text(system_instruction)),
            tools: None,
        }
    }
}

/// First candidate's first text part, with the legacy `response.text`
/// shape as a secondary path. An empty text part counts as no reply.
pub fn extract_reply(raw: &Value) -> Option<String> {
    raw.pointer("/candidates/0/content/parts/0/text")
        .or_else(|| raw.pointer("/response/text"))
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: API_BASE.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Point the client at a different endpoint, for tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Forward a request body and return the raw response JSON. The body
    /// is posted as-is, so structured prompts reach the upstream intact.
    pub async fn generate(
        &self,
        request: &(impl Serialize + Sync),
    ) -> Result<Value, ProviderError> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self.client.post(&url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, "Gemini API error");
            return Err(ProviderError::UpstreamStatus { status, body });
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_turn_shape() {
        let request = GenerateContentRequest::single_turn("Hi", "Be helpful.");
        assert_eq!(request.contents.len(), 1);
        assert_eq!(request.contents[0].role, Role::User);
        assert_eq!(request.contents[0].parts[0].as_text(), Some("Hi"));
        assert!(request.tools.is_none());
    }

    #[test]
    fn test_request_wire_shape() {
        let mut request = GenerateContentRequest::single_turn("Hi", "Be helpful.");
        request.tools = Some(vec![Tool::google_search()]);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "Be helpful.");
        assert_eq!(json["tools"][0]["google_search"], json!({}));
    }

    #[test]
    fn test_extract_reply_candidate_path() {
        let raw = json!({
            "candidates": [
                { "content": { "role": "model", "parts": [{ "text": "Yes, worldwide." }] } }
            ]
        });
        assert_eq!(extract_reply(&raw).as_deref(), Some("Yes, worldwide."));
    }

    #[test]
    fn test_extract_reply_legacy_path() {
        let raw = json!({ "response": { "text": "hi" } });
        assert_eq!(extract_reply(&raw).as_deref(), Some("hi"));
    }

    #[test]
    fn test_extract_reply_absent() {
        assert!(extract_reply(&json!({ "candidates": [] })).is_none());
        assert!(extract_reply(&json!({})).is_none());
    }

    #[test]
    fn test_extract_reply_empty_text_falls_back() {
        let raw = json!({
            "candidates": [
                { "content": { "role": "model", "parts": [{ "text": "" }] } }
            ]
        });
        assert!(extract_reply(&raw).is_none());
        assert!(extract_reply(&json!({ "response": { "text": "" } })).is_none());
    }
}
