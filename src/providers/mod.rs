//! Upstream generative API integration

pub mod gemini;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Upstream returned {status}")]
    UpstreamStatus {
        status: reqwest::StatusCode,
        body: String,
    },
}
