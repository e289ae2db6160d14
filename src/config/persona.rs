//! Persona configuration and its durable store
//!
//! The persona shapes the system instruction sent with every request. It
//! is persisted as a single JSON record, read once at startup and written
//! on every edit. Precedence when building a controller:
//! launch-param overrides > stored record > built-in defaults.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersonaConfig {
    /// Role the bot should play.
    pub purpose: String,
    /// Free-form knowledge base text (website content, company info).
    pub knowledge_base: String,
    /// Custom Q&A pairs appended to the knowledge base.
    pub qna: String,
    pub location: Option<String>,
    /// Target site for the embed snippet.
    pub website_url: Option<String>,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            purpose: "Act as a friendly, knowledgeable, and concise customer service \
                      representative."
                .into(),
            knowledge_base: "Company Name: OmniCorp. Products: AI Assistants, Drones, \
                             Premium Coffee. Hours: Mon-Fri 9am-5pm. Shipping: Free over \
                             $50. Returns: 30 days, unused items only."
                .into(),
            qna: "Q: Do you offer discounts? A: We offer a 10% discount for first-time \
                  buyers. Q: Can I track my order? A: Yes, a tracking link is emailed \
                  after purchase."
                .into(),
            location: None,
            website_url: None,
        }
    }
}

/// Envelope written to disk alongside the persona itself.
#[derive(Debug, Serialize, Deserialize)]
struct StoredPersona {
    persona: PersonaConfig,
    saved_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum PersonaStoreError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// One JSON record at a fixed path, playing the role browser storage does
/// for the hosted widget.
#[derive(Debug, Clone)]
pub struct PersonaStore {
    path: PathBuf,
}

impl PersonaStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join("persona.json"),
        }
    }

    /// Load the stored persona. A missing file is not an error.
    pub async fn load(&self) -> Result<Option<PersonaConfig>, PersonaStoreError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PersonaStoreError::Io(e.to_string())),
        };

        let stored: StoredPersona =
            serde_json::from_str(&content).map_err(|e| PersonaStoreError::Parse(e.to_string()))?;
        Ok(Some(stored.persona))
    }

    /// Overwrite the stored record with the given persona.
    pub async fn save(&self, persona: &PersonaConfig) -> Result<(), PersonaStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PersonaStoreError::Io(e.to_string()))?;
        }

        let stored = StoredPersona {
            persona: persona.clone(),
            saved_at: Utc::now(),
        };
        let content = serde_json::to_string_pretty(&stored)
            .map_err(|e| PersonaStoreError::Parse(e.to_string()))?;

        fs::write(&self.path, content)
            .await
            .map_err(|e| PersonaStoreError::Io(e.to_string()))
    }
}
