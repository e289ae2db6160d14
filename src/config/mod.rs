//! Application configuration

pub mod persona;

use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use persona::{PersonaConfig, PersonaStore, PersonaStoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Server-held credential for the upstream generative API. Absence is
    /// a configuration failure surfaced per request, not a startup abort.
    pub gemini_api_key: Option<String>,
    /// Upstream model name.
    pub model: String,
    /// Origin the embed snippet points its iframe at.
    pub public_origin: String,
}

/// Optional TOML file layer. Every field is optional; env vars win.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    host: Option<String>,
    port: Option<u16>,
    model: Option<String>,
    public_origin: Option<String>,
}

impl Config {
    /// Resolve configuration: built-in defaults, then the TOML file named
    /// by `WIDGETLET_CONFIG` (if any), then environment variables.
    /// The API key is only ever read from the environment.
    pub fn from_env() -> anyhow::Result<Self> {
        let file = match env::var("WIDGETLET_CONFIG") {
            Ok(path) => Self::load_file(Path::new(&path))?,
            Err(_) => FileConfig::default(),
        };

        Ok(Self {
            host: env::var("HOST")
                .ok()
                .or(file.host)
                .unwrap_or_else(|| "127.0.0.1".into()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .or(file.port)
                .unwrap_or(3000),
            gemini_api_key: env::var("GEMINI_API_KEY").ok(),
            model: env::var("WIDGETLET_MODEL")
                .ok()
                .or(file.model)
                .unwrap_or_else(|| crate::providers::gemini::DEFAULT_MODEL.into()),
            public_origin: env::var("WIDGETLET_ORIGIN")
                .ok()
                .or(file.public_origin)
                .unwrap_or_else(|| "http://localhost:3000".into()),
        })
    }

    fn load_file(path: &Path) -> anyhow::Result<FileConfig> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}
