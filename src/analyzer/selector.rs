//! Provider dispatch with simulation fallback.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::error::{AnalysisError, ProviderError};
use super::google::GoogleVisionBackend;
use super::openai::{OpenAiConfig, OpenAiVisionBackend};
use super::provider::{Provider, ProviderCredentials};
use super::simulation::{RandomSource, SimulationBackend, SimulationConfig};
use super::types::{AnalysisInput, AnalysisResult, AnalyzeOptions};
use crate::catalog::RepairCatalog;

/// Everything the selector needs to build its strategies.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerConfig {
    pub credentials: ProviderCredentials,
    pub openai: OpenAiConfig,
    pub simulation: SimulationConfig,
}

enum Strategy {
    OpenAi(OpenAiVisionBackend),
    Google(GoogleVisionBackend),
    Simulation,
}

/// Answers analysis requests with the provider chosen at construction.
///
/// Remote provider failures are logged and answered with a simulated result
/// for the same call. The only error `analyze` returns is
/// [`AnalysisError::EmptyCatalog`].
pub struct AnalysisSelector {
    strategy: Strategy,
    simulation: SimulationBackend,
}

impl AnalysisSelector {
    /// Build the selector for an already-detected provider.
    pub fn new(
        provider: Provider,
        catalog: Arc<RepairCatalog>,
        config: AnalyzerConfig,
    ) -> Result<Self, AnalysisError> {
        let strategy = match provider {
            Provider::OpenAi => {
                let key = config
                    .credentials
                    .openai_key()
                    .ok_or(AnalysisError::MissingCredentials(provider))?;
                Strategy::OpenAi(OpenAiVisionBackend::new(key, config.openai, &catalog)?)
            }
            Provider::Google => {
                let credentials = &config.credentials;
                match (&credentials.google_project, &credentials.google_credentials) {
                    (Some(project), Some(path)) if credentials.has_google_credentials() => {
                        Strategy::Google(GoogleVisionBackend::new(project.clone(), path.clone()))
                    }
                    _ => return Err(AnalysisError::MissingCredentials(provider)),
                }
            }
            Provider::Simulation => Strategy::Simulation,
        };

        let simulation = SimulationBackend::new(Arc::clone(&catalog), config.simulation);

        info!(
            "AI analyzer initialized with provider: {} ({} repairs)",
            provider,
            catalog.len()
        );

        Ok(Self {
            strategy,
            simulation,
        })
    }

    /// Detect the provider from `config` and build the selector.
    pub fn from_config(
        catalog: Arc<RepairCatalog>,
        config: AnalyzerConfig,
    ) -> Result<Self, AnalysisError> {
        let provider = Provider::detect(&config.credentials);
        Self::new(provider, catalog, config)
    }

    /// Replace the random source used by the simulation strategy.
    pub fn with_random_source(mut self, random: RandomSource) -> Self {
        self.simulation = self.simulation.with_random_source(random);
        self
    }

    pub fn provider(&self) -> Provider {
        match self.strategy {
            Strategy::OpenAi(_) => Provider::OpenAi,
            Strategy::Google(_) => Provider::Google,
            Strategy::Simulation => Provider::Simulation,
        }
    }

    /// Analyze an image and/or description.
    pub async fn analyze(
        &self,
        input: &AnalysisInput,
        options: &AnalyzeOptions,
    ) -> Result<AnalysisResult, AnalysisError> {
        let provider = self.provider();
        debug!("Analyzing with {} provider", provider);

        let outcome = match &self.strategy {
            Strategy::OpenAi(backend) => backend.analyze(input, options).await,
            Strategy::Google(backend) => backend.analyze(input).await,
            Strategy::Simulation => return self.simulation.analyze().await,
        };

        match outcome {
            Ok(result) => Ok(result),
            Err(ProviderError::NotImplemented(_)) => {
                debug!("{} is a placeholder, answering with simulation", provider);
                self.simulation.analyze().await
            }
            Err(e) => {
                warn!("{} analysis failed, falling back to simulation: {}", provider, e);
                self.simulation.analyze().await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn catalog() -> Arc<RepairCatalog> {
        Arc::new(
            RepairCatalog::from_json(
                r#"{"repairs": {"faucet": {"name": "Faucet", "category": "water",
                    "issues": [{"id": "leak", "name": "Leaking", "riskScore": 2}]}}}"#,
            )
            .unwrap(),
        )
    }

    fn instant() -> AnalyzerConfig {
        AnalyzerConfig {
            simulation: SimulationConfig::instant(),
            ..Default::default()
        }
    }

    #[test]
    fn test_openai_without_key_is_rejected() {
        let err = AnalysisSelector::new(Provider::OpenAi, catalog(), instant())
            .err()
            .unwrap();
        assert!(matches!(
            err,
            AnalysisError::MissingCredentials(Provider::OpenAi)
        ));
    }

    #[test]
    fn test_google_without_credentials_is_rejected() {
        let err = AnalysisSelector::new(Provider::Google, catalog(), instant())
            .err()
            .unwrap();
        assert!(matches!(
            err,
            AnalysisError::MissingCredentials(Provider::Google)
        ));
    }

    #[test]
    fn test_from_config_detects_provider() {
        let selector = AnalysisSelector::from_config(catalog(), instant()).unwrap();
        assert_eq!(selector.provider(), Provider::Simulation);

        let mut config = instant();
        config.credentials.openai_api_key = Some("sk-test".to_string());
        let selector = AnalysisSelector::from_config(catalog(), config).unwrap();
        assert_eq!(selector.provider(), Provider::OpenAi);
    }

    #[tokio::test]
    async fn test_google_defers_to_simulation() {
        let mut config = instant();
        config.credentials.google_project = Some("fixo".to_string());
        config.credentials.google_credentials = Some(PathBuf::from("/tmp/creds.json"));

        let selector = AnalysisSelector::from_config(catalog(), config).unwrap();
        assert_eq!(selector.provider(), Provider::Google);

        let result = selector
            .analyze(&AnalysisInput::from_description("leak"), &AnalyzeOptions::default())
            .await
            .unwrap();
        assert_eq!(result.provider, Provider::Simulation);
        assert_eq!(result.detection.object.name, "Faucet");
        assert!(result.analysis_id.starts_with("analysis-"));
        assert!(result.analysis_id.len() > "analysis-".len());
        assert!(!result.timestamp.to_rfc3339().is_empty());
        assert!(!result.recommendations.safety_warnings.is_empty());
    }

    #[tokio::test]
    async fn test_empty_catalog_surfaces_error() {
        let selector = AnalysisSelector::from_config(
            Arc::new(RepairCatalog::default()),
            instant(),
        )
        .unwrap();
        let err = selector
            .analyze(&AnalysisInput::default(), &AnalyzeOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyCatalog));
    }
}
