//! API routes
//!
//! The proxy adapter lives here: it accepts a bare text prompt or a
//! pre-structured request, attaches the server-held credential, forwards
//! to the upstream generative API, and normalizes the outcome into
//! `{reply, raw}` or a JSON error body.

use axum::{
    extract::rejection::JsonRejection,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::prompt;
use crate::providers::gemini::{extract_reply, GenerateContentRequest, NO_REPLY_FALLBACK};
use crate::providers::ProviderError;
use crate::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// A bare text prompt, or a structured request already assembled by the
/// widget. Structured requests are kept as raw JSON and forwarded
/// unchanged, so fields this crate does not model (generation config,
/// safety settings, unknown part kinds) survive the trip upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prompt {
    Text(String),
    Structured(Value),
}

#[derive(Debug, Deserialize)]
pub struct ChatProxyRequest {
    #[serde(default)]
    pub prompt: Option<Prompt>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatProxyResponse {
    pub reply: String,
    /// Untouched upstream response body, for diagnostics.
    pub raw: Value,
}

/// Request-terminal error taxonomy for the proxy endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing prompt in request body")]
    MissingPrompt,

    #[error("Only POST requests are allowed")]
    MethodNotAllowed,

    #[error("Server API key not configured")]
    MissingCredential,

    #[error("Gemini API error")]
    Upstream { details: String },

    #[error("Internal server error")]
    Internal { details: String },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingPrompt => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::MissingCredential => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            ApiError::Upstream { details } | ApiError::Internal { details } => {
                Some(details.clone())
            }
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
            details: self.details(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::UpstreamStatus { body, .. } => ApiError::Upstream { details: body },
            other => ApiError::Internal {
                details: other.to_string(),
            },
        }
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatProxyRequest>, JsonRejection>,
) -> Result<Json<ChatProxyResponse>, ApiError> {
    let Json(request) = payload.map_err(|_| ApiError::MissingPrompt)?;
    let prompt = request.prompt.ok_or(ApiError::MissingPrompt)?;

    // Absent credential is a configuration failure, not an upstream one.
    let gemini = state.gemini.as_ref().ok_or(ApiError::MissingCredential)?;

    let request = match prompt {
        Prompt::Text(text) => serde_json::to_value(GenerateContentRequest::single_turn(
            &text,
            prompt::DEFAULT_SYSTEM_INSTRUCTION,
        ))
        .map_err(|e| ApiError::Internal {
            details: e.to_string(),
        })?,
        // forwarded unchanged; only the presence of `contents` is checked
        Prompt::Structured(value) => {
            if value.get("contents").is_none() {
                return Err(ApiError::MissingPrompt);
            }
            value
        }
    };

    let raw = gemini.generate(&request).await?;
    let reply = extract_reply(&raw).unwrap_or_else(|| NO_REPLY_FALLBACK.to_string());

    Ok(Json(ChatProxyResponse { reply, raw }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat).fallback(method_not_allowed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_accepts_plain_text() {
        let request: ChatProxyRequest =
            serde_json::from_str(r#"{"prompt": "Do you ship internationally?"}"#).unwrap();
        match request.prompt {
            Some(Prompt::Text(text)) => assert_eq!(text, "Do you ship internationally?"),
            other => panic!("expected text prompt, got {other:?}"),
        }
    }

    #[test]
    fn test_prompt_accepts_structured_payload() {
        let raw = r#"{
            "prompt": {
                "contents": [{ "role": "user", "parts": [{ "text": "hi" }] }],
                "systemInstruction": { "parts": [{ "text": "Be brief." }] },
                "tools": [{ "google_search": {} }]
            }
        }"#;
        let request: ChatProxyRequest = serde_json::from_str(raw).unwrap();
        match request.prompt {
            Some(Prompt::Structured(value)) => {
                assert_eq!(value["contents"][0]["role"], "user");
                assert_eq!(value["systemInstruction"]["parts"][0]["text"], "Be brief.");
                assert!(value["tools"].is_array());
            }
            other => panic!("expected structured prompt, got {other:?}"),
        }
    }

    #[test]
    fn test_structured_prompt_keeps_unmodeled_fields() {
        // generation config and non-text parts pass through untouched
        let raw = r#"{
            "prompt": {
                "contents": [{ "role": "user", "parts": [{ "functionCall": { "name": "lookup" } }] }],
                "generationConfig": { "temperature": 0.2 },
                "safetySettings": [{ "category": "HARM_CATEGORY_HARASSMENT", "threshold": "BLOCK_NONE" }]
            }
        }"#;
        let request: ChatProxyRequest = serde_json::from_str(raw).unwrap();
        match request.prompt {
            Some(Prompt::Structured(value)) => {
                assert_eq!(value["generationConfig"]["temperature"], 0.2);
                assert_eq!(
                    value["contents"][0]["parts"][0]["functionCall"]["name"],
                    "lookup"
                );
                assert_eq!(value["safetySettings"][0]["threshold"], "BLOCK_NONE");
            }
            other => panic!("expected structured prompt, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_prompt_field() {
        let request: ChatProxyRequest = serde_json::from_str("{}").unwrap();
        assert!(request.prompt.is_none());
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(ApiError::MissingPrompt.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::MethodNotAllowed.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            ApiError::MissingCredential.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Upstream {
                details: "x".into()
            }
            .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::Internal {
                details: "x".into()
            }
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upstream_error_carries_body() {
        let provider_err = ProviderError::UpstreamStatus {
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            body: "overloaded".into(),
        };
        let api_err = ApiError::from(provider_err);
        assert_eq!(api_err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(api_err.details().as_deref(), Some("overloaded"));
    }

    #[test]
    fn test_error_body_shape() {
        let err = ApiError::Upstream {
            details: "upstream said no".into(),
        };
        let body = serde_json::to_value(ErrorBody {
            error: err.to_string(),
            details: err.details(),
        })
        .unwrap();
        assert_eq!(body["error"], "Gemini API error");
        assert_eq!(body["details"], "upstream said no");

        let bare = serde_json::to_value(ErrorBody {
            error: ApiError::MissingPrompt.to_string(),
            details: None,
        })
        .unwrap();
        assert!(bare.get("details").is_none());
    }
}
