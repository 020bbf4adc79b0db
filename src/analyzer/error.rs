//! Error types for the analyzer.

use thiserror::Error;

use super::Provider;

/// Errors surfaced to callers of the analyzer.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The catalog has no repair with at least one issue, so the simulation
    /// strategy has nothing to draw from.
    #[error("no repair data available")]
    EmptyCatalog,

    /// The provider was selected without the credentials it needs.
    #[error("provider {0} selected but its credentials are not configured")]
    MissingCredentials(Provider),

    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Failures of a remote provider. These never reach the caller; the
/// selector logs them and falls back to simulation.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("response contained no answer")]
    EmptyResponse,

    #[error("failed to parse diagnosis: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{0} integration is not implemented")]
    NotImplemented(Provider),
}
