//! Repair diagnosis analyzer.
//!
//! Provides a single `analyze` entry point over three interchangeable
//! strategies:
//! - OpenAI: vision chat completions over HTTP
//! - Google: Cloud Vision placeholder, always defers to simulation
//! - Simulation: random draw from the reference catalog
//!
//! # Architecture
//!
//! [`Provider::detect`] picks the strategy once from explicit
//! [`ProviderCredentials`]. The [`AnalysisSelector`] holds the chosen strategy
//! for the life of the process, dispatches every call to it and normalizes
//! the output into [`AnalysisResult`]. Remote failures degrade to simulation
//! for the same call.
//!
//! # Example
//!
//! ```ignore
//! use fixo_analyzer::analyzer::{AnalysisInput, AnalysisSelector, AnalyzeOptions};
//!
//! let selector = AnalysisSelector::from_config(catalog, config)?;
//! let input = AnalysisInput::from_image(data_url).with_description("drips at night");
//! let result = selector.analyze(&input, &AnalyzeOptions::default()).await?;
//! println!("{}: {}", result.detection.object.name, result.detection.issue.name);
//! ```

mod error;
mod google;
mod openai;
mod provider;
pub mod safety;
mod selector;
mod simulation;
mod types;

pub use error::{AnalysisError, ProviderError};
pub use google::GoogleVisionBackend;
pub use openai::{
    normalize, parse_diagnosis, AnalysisPrompt, OpenAiConfig, OpenAiVisionBackend, RawDiagnosis,
    DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_SECS,
    FALLBACK_CATEGORY, FALLBACK_RISK_SCORE,
};
pub use provider::{Provider, ProviderCredentials, OPENAI_KEY_PREFIX};
pub use selector::{AnalysisSelector, AnalyzerConfig};
pub use simulation::{
    RandomSource, SimulationBackend, SimulationConfig, DEFAULT_MAX_DELAY_MS, DEFAULT_MIN_DELAY_MS,
};
pub use types::{
    new_analysis_id, slugify, AnalysisInput, AnalysisResult, AnalyzeOptions, DetectedIssue,
    DetectedObject, Detection, Recommendations,
};
