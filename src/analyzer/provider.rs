//! Provider detection.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Prefix every well-formed OpenAI secret key starts with.
pub const OPENAI_KEY_PREFIX: &str = "sk-";

/// Analysis strategy backing the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI vision chat completions.
    OpenAi,
    /// Google Cloud Vision (placeholder, defers to simulation).
    Google,
    /// Randomized catalog-driven simulation.
    Simulation,
}

impl Provider {
    /// Pick the provider for the given credentials.
    ///
    /// Priority: a well-formed OpenAI key, then a complete Google project +
    /// credentials pair, then simulation.
    pub fn detect(credentials: &ProviderCredentials) -> Self {
        if credentials.has_openai_key() {
            Provider::OpenAi
        } else if credentials.has_google_credentials() {
            Provider::Google
        } else {
            Provider::Simulation
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Google => "google",
            Provider::Simulation => "simulation",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credentials that decide which provider is available.
#[derive(Clone, Default)]
pub struct ProviderCredentials {
    pub openai_api_key: Option<String>,
    pub google_project: Option<String>,
    pub google_credentials: Option<PathBuf>,
}

impl ProviderCredentials {
    /// The configured OpenAI key, if it is non-empty and carries the
    /// expected prefix.
    pub fn openai_key(&self) -> Option<&str> {
        self.openai_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| key.starts_with(OPENAI_KEY_PREFIX))
    }

    pub fn has_openai_key(&self) -> bool {
        self.openai_key().is_some()
    }

    pub fn has_google_credentials(&self) -> bool {
        let project = self
            .google_project
            .as_deref()
            .is_some_and(|p| !p.trim().is_empty());
        let credentials = self
            .google_credentials
            .as_ref()
            .is_some_and(|p| !p.as_os_str().is_empty());
        project && credentials
    }
}

// Keys must never end up in logs.
impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("google_project", &self.google_project)
            .field("google_credentials", &self.google_credentials)
            .finish()
    }
}
