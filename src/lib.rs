//! Widgetlet - embeddable AI chat-widget generator
//!
//! A persona (purpose, knowledge base, Q&A pairs) drives a chat widget
//! backed by the Gemini API. The crate ships the proxy adapter that holds
//! the API credential, the conversation controller that owns widget state
//! and prompt assembly, and the generator for the snippet third-party
//! sites paste in to embed the widget.

use std::sync::Arc;

pub mod config;
pub mod controller;
pub mod conversation;
pub mod embed;
pub mod prompt;
pub mod providers;
pub mod routes;

use config::Config;
use providers::gemini::GeminiClient;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Present only when the server-held API credential is configured.
    pub gemini: Option<Arc<GeminiClient>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let gemini = config
            .gemini_api_key
            .clone()
            .map(|key| Arc::new(GeminiClient::new(key, config.model.clone())));

        Self { config, gemini }
    }
}
