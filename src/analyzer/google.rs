//! Google Cloud Vision strategy.
//!
//! Not integrated yet: every call reports [`ProviderError::NotImplemented`]
//! and the selector answers with a simulated result instead.

use std::path::PathBuf;

use tracing::info;

use super::error::ProviderError;
use super::types::{AnalysisInput, AnalysisResult};
use super::Provider;

#[derive(Debug, Clone)]
pub struct GoogleVisionBackend {
    project: String,
    credentials: PathBuf,
}

impl GoogleVisionBackend {
    pub fn new(project: impl Into<String>, credentials: impl Into<PathBuf>) -> Self {
        Self {
            project: project.into(),
            credentials: credentials.into(),
        }
    }

    // TODO: call images:annotate with label + object localization and map the
    // annotations onto catalog repairs.
    pub async fn analyze(&self, _input: &AnalysisInput) -> Result<AnalysisResult, ProviderError> {
        info!(
            project = %self.project,
            credentials = %self.credentials.display(),
            "Google Vision not yet implemented, using simulation"
        );
        Err(ProviderError::NotImplemented(Provider::Google))
    }
}
