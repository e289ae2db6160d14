//! Conversation controller
//!
//! Owns the widget state machine (setup vs. chatting), the append-only
//! message history, the pending image attachment, and the persona that
//! shapes every outgoing request. Replies and failures both land in the
//! transcript; `send_message` never returns an error to the caller.

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config::{PersonaConfig, PersonaStore, PersonaStoreError};
use crate::conversation::{Message, Part};
use crate::prompt;
use crate::providers::gemini::{Content, GenerateContentRequest, SystemInstruction, Tool};

/// Greeting shown at the top of the chat view unless suppressed.
pub const GREETING: &str =
    "Hello! I'm running with your custom settings. Ask me anything about your business.";

/// Text part synthesized when an image is sent without any typed text.
const ANALYZE_IMAGE_PROMPT: &str = "Analyze this image.";

/// Reply substituted when the proxy answers 200 without a reply field.
const EMPTY_REPLY_FALLBACK: &str = "Sorry, I couldn't process that request.";

/// Error shown when the proxy answers non-2xx without an error field.
const UNKNOWN_API_ERROR: &str = "Something went wrong with the API.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetState {
    Setup,
    Chatting,
}

/// Behavioral switches covering the deltas between widget revisions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerOptions {
    /// Embedded in a third-party page: start chatting, no way back to setup.
    pub embed_mode: bool,
    pub suppress_greeting: bool,
    /// Write persona edits through to the durable store.
    pub persist_config: bool,
}

/// An image the user has attached but not yet sent.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Error message from a non-success proxy response, shown verbatim.
    #[error("{0}")]
    Api(String),

    #[error("Request failed: {0}")]
    Network(String),
}

/// Seam between the controller and the proxy endpoint.
#[async_trait]
pub trait ReplyTransport: Send + Sync {
    async fn send(&self, request: &GenerateContentRequest) -> Result<String, TransportError>;
}

/// Transport that posts `{"prompt": <structured>}` to the proxy adapter.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ReplyTransport for HttpTransport {
    async fn send(&self, request: &GenerateContentRequest) -> Result<String, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "prompt": request }))
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if status.is_success() {
            Ok(body
                .get("reply")
                .and_then(Value::as_str)
                .unwrap_or(EMPTY_REPLY_FALLBACK)
                .to_string())
        } else {
            Err(TransportError::Api(
                body.get("error")
                    .and_then(Value::as_str)
                    .unwrap_or(UNKNOWN_API_ERROR)
                    .to_string(),
            ))
        }
    }
}

pub struct ConversationController {
    state: WidgetState,
    history: Vec<Message>,
    persona: PersonaConfig,
    pending_image: Option<Attachment>,
    busy: bool,
    session_id: Uuid,
    options: ControllerOptions,
    transport: Arc<dyn ReplyTransport>,
    store: Option<PersonaStore>,
}

impl ConversationController {
    /// The persona passed here should already have its precedence resolved
    /// (URL overrides over stored record over defaults).
    pub fn new(
        persona: PersonaConfig,
        options: ControllerOptions,
        transport: Arc<dyn ReplyTransport>,
    ) -> Self {
        let state = if options.embed_mode {
            WidgetState::Chatting
        } else {
            WidgetState::Setup
        };

        Self {
            state,
            history: Vec::new(),
            persona,
            pending_image: None,
            busy: false,
            session_id: Uuid::new_v4(),
            options,
            transport,
            store: None,
        }
    }

    pub fn with_store(mut self, store: PersonaStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn state(&self) -> WidgetState {
        self.state
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn persona(&self) -> &PersonaConfig {
        &self.persona
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn pending_attachment(&self) -> Option<&Attachment> {
        self.pending_image.as_ref()
    }

    pub fn greeting(&self) -> Option<&'static str> {
        if self.options.suppress_greeting {
            None
        } else {
            Some(GREETING)
        }
    }

    /// Setup -> Chatting. No side effect beyond the view switch.
    pub fn preview(&mut self) {
        if self.state == WidgetState::Setup {
            self.state = WidgetState::Chatting;
        }
    }

    /// Chatting -> Setup. Suppressed entirely in embed mode: the hosted
    /// chat must not expose a way back to configuration.
    pub fn edit_config(&mut self) {
        if self.state == WidgetState::Chatting && !self.options.embed_mode {
            self.state = WidgetState::Setup;
        }
    }

    pub fn attach_image(&mut self, mime_type: impl Into<String>, data: Vec<u8>) {
        self.pending_image = Some(Attachment {
            mime_type: mime_type.into(),
            data,
        });
    }

    pub fn clear_attachment(&mut self) {
        self.pending_image = None;
    }

    /// Replace the persona and, if configured, write it through to the
    /// durable store. Future turns pick up the new persona; past turns are
    /// untouched.
    pub async fn update_persona(
        &mut self,
        persona: PersonaConfig,
    ) -> Result<(), PersonaStoreError> {
        self.persona = persona;

        if self.options.persist_config {
            if let Some(store) = &self.store {
                store.save(&self.persona).await?;
            }
        }
        Ok(())
    }

    /// Send a user turn. A no-op outside the chatting state, while busy,
    /// or when there is neither trimmed text nor a pending attachment.
    ///
    /// The user message is appended before the network call resolves; the
    /// outcome (reply or error text) is appended as a model message after.
    pub async fn send_message(&mut self, input: &str) {
        if self.state != WidgetState::Chatting || self.busy {
            return;
        }
        let text = input.trim();
        if text.is_empty() && self.pending_image.is_none() {
            return;
        }

        self.busy = true;

        let mut parts = Vec::new();
        if let Some(attachment) = self.pending_image.take() {
            parts.push(Part::inline_data(
                attachment.mime_type,
                BASE64.encode(&attachment.data),
            ));
        }
        if text.is_empty() {
            parts.push(Part::text(ANALYZE_IMAGE_PROMPT));
        } else {
            parts.push(Part::text(text));
        }

        self.history.push(Message::user(parts));
        tracing::debug!(session = %self.session_id, turns = self.history.len(), "sending message");

        let request = self.build_request();
        let reply = match self.transport.send(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(session = %self.session_id, error = %e, "send failed");
                e.to_string()
            }
        };

        self.history.push(Message::model_text(reply));
        self.busy = false;
    }

    /// Full history in wire shape plus the freshly synthesized system
    /// instruction and the search tool declaration.
    fn build_request(&self) -> GenerateContentRequest {
        let contents = self
            .history
            .iter()
            .map(|m| Content {
                role: m.role,
                parts: m.parts.clone(),
            })
            .collect();

        GenerateContentRequest {
            contents,
            system_instruction: Some(SystemInstruction::from_text(prompt::system_instruction(
                &self.persona,
            ))),
            tools: Some(vec![Tool::google_search()]),
        }
    }
}
