//! Configuration management for FIXO using the prefer crate.
//!
//! Resolution order: built-in defaults, then the config file, then
//! environment variables. API keys are only read from the environment.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analyzer::{
    AnalyzerConfig, OpenAiConfig, ProviderCredentials, SimulationConfig, DEFAULT_BASE_URL,
    DEFAULT_MAX_DELAY_MS, DEFAULT_MAX_TOKENS, DEFAULT_MIN_DELAY_MS, DEFAULT_MODEL,
    DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_SECS,
};

/// Default catalog filename inside the data directory.
pub const DEFAULT_CATALOG_FILENAME: &str = "repairs.json";

/// Errors from invalid configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: String, value: String },
    #[error("simulation delay bounds are inverted: min {min_ms} ms > max {max_ms} ms")]
    InvertedDelay { min_ms: u64, max_ms: u64 },
    #[error("temperature must be between 0 and 2, got {0}")]
    Temperature(f32),
    #[error("max_tokens must be positive")]
    MaxTokens,
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Catalog filename (relative to `data_dir` unless `catalog_override` is set).
    pub catalog_filename: String,
    /// Explicit catalog path.
    pub catalog_override: Option<PathBuf>,
    /// OpenAI secret key.
    pub openai_api_key: Option<String>,
    /// OpenAI-compatible API base URL.
    pub openai_base_url: String,
    /// Vision model name.
    pub openai_model: String,
    /// Completion token limit.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Google Cloud project ID.
    pub google_project: Option<String>,
    /// Google application credentials file.
    pub google_credentials: Option<PathBuf>,
    /// Simulation latency lower bound in milliseconds.
    pub simulation_min_delay_ms: u64,
    /// Simulation latency upper bound in milliseconds.
    pub simulation_max_delay_ms: u64,
    /// HTTP request timeout in seconds.
    pub request_timeout: u64,
}

impl Default for Settings {
    fn default() -> Self {
        // ~/.local/share/fixo on Linux; falls back to home, then CWD
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fixo");

        Self {
            data_dir,
            catalog_filename: DEFAULT_CATALOG_FILENAME.to_string(),
            catalog_override: None,
            openai_api_key: None,
            openai_base_url: DEFAULT_BASE_URL.to_string(),
            openai_model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            google_project: None,
            google_credentials: None,
            simulation_min_delay_ms: DEFAULT_MIN_DELAY_MS,
            simulation_max_delay_ms: DEFAULT_MAX_DELAY_MS,
            request_timeout: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Full path to the reference catalog.
    pub fn catalog_path(&self) -> PathBuf {
        self.catalog_override
            .clone()
            .unwrap_or_else(|| self.data_dir.join(&self.catalog_filename))
    }

    /// Apply environment overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("OPENAI_API_KEY") {
            self.openai_api_key = Some(key);
        }
        if let Some(model) = get("OPENAI_MODEL") {
            self.openai_model = model;
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            self.openai_base_url = url;
        }
        if let Some(tokens) = parse_var(&get, "OPENAI_MAX_TOKENS")? {
            self.max_tokens = tokens;
        }
        if let Some(temperature) = parse_var(&get, "OPENAI_TEMPERATURE")? {
            self.temperature = temperature;
        }
        if let Some(project) = get("GOOGLE_CLOUD_PROJECT") {
            self.google_project = Some(project);
        }
        if let Some(path) = get("GOOGLE_APPLICATION_CREDENTIALS") {
            self.google_credentials = Some(PathBuf::from(path));
        }
        if let Some(path) = get("FIXO_CATALOG_PATH") {
            self.catalog_override = Some(PathBuf::from(shellexpand::tilde(&path).as_ref()));
        }
        if let Some(ms) = parse_var(&get, "FIXO_SIMULATION_MIN_DELAY_MS")? {
            self.simulation_min_delay_ms = ms;
        }
        if let Some(ms) = parse_var(&get, "FIXO_SIMULATION_MAX_DELAY_MS")? {
            self.simulation_max_delay_ms = ms;
        }
        if let Some(secs) = parse_var(&get, "FIXO_REQUEST_TIMEOUT")? {
            self.request_timeout = secs;
        }
        Ok(())
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulation_min_delay_ms > self.simulation_max_delay_ms {
            return Err(ConfigError::InvertedDelay {
                min_ms: self.simulation_min_delay_ms,
                max_ms: self.simulation_max_delay_ms,
            });
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Temperature(self.temperature));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::MaxTokens);
        }
        Ok(())
    }

    pub fn provider_credentials(&self) -> ProviderCredentials {
        ProviderCredentials {
            openai_api_key: self.openai_api_key.clone(),
            google_project: self.google_project.clone(),
            google_credentials: self.google_credentials.clone(),
        }
    }

    /// Build the explicit configuration handed to the analyzer.
    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            credentials: self.provider_credentials(),
            openai: OpenAiConfig {
                base_url: self.openai_base_url.clone(),
                model: self.openai_model.clone(),
                max_tokens: self.max_tokens,
                temperature: self.temperature,
                timeout: Duration::from_secs(self.request_timeout),
            },
            simulation: SimulationConfig {
                min_delay: Duration::from_millis(self.simulation_min_delay_ms),
                max_delay: Duration::from_millis(self.simulation_max_delay_ms),
            },
        }
    }
}

fn parse_var<T, G>(get: &G, name: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    let Some(value) = get(name) else {
        return Ok(None);
    };
    let parsed = value.trim().parse::<T>();
    match parsed {
        Ok(parsed) => Ok(Some(parsed)),
        Err(_) => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            value,
        }),
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Target directory for data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Catalog file, relative to the config file unless absolute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_credentials: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulation_min_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulation_max_delay_ms: Option<u64>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,

    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate.
    /// Automatically discovers fixo config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("fixo").await {
            Ok(pref_config) => {
                let target: Option<String> = pref_config.get("target").ok();
                let catalog: Option<String> = pref_config.get("catalog").ok();
                let openai_base_url: Option<String> =
                    pref_config.get("openai_base_url").ok();
                let openai_model: Option<String> = pref_config.get("openai_model").ok();
                let max_tokens: Option<u32> = pref_config.get("max_tokens").ok();
                let temperature: Option<f32> = pref_config.get("temperature").ok();
                let google_project: Option<String> =
                    pref_config.get("google_project").ok();
                let google_credentials: Option<String> =
                    pref_config.get("google_credentials").ok();
                let simulation_min_delay_ms: Option<u64> =
                    pref_config.get("simulation_min_delay_ms").ok();
                let simulation_max_delay_ms: Option<u64> =
                    pref_config.get("simulation_max_delay_ms").ok();
                let request_timeout: Option<u64> = pref_config.get("request_timeout").ok();

                let source_path = pref_config.source_path().cloned();

                Config {
                    target,
                    catalog,
                    openai_base_url,
                    openai_model,
                    max_tokens,
                    temperature,
                    google_project,
                    google_credentials,
                    simulation_min_delay_ms,
                    simulation_max_delay_ms,
                    request_timeout,
                    source_path,
                }
            }
            Err(_) => {
                // No config file found, use defaults
                Self::default()
            }
        }
    }

    /// Load configuration from a specific JSON file.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path).await?;
        let mut config: Config = serde_json::from_str(&contents)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Directory of the config file, if it was loaded from one.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to `base_dir` or start with `~`.
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref target) = self.target {
            settings.data_dir = self.resolve_path(target, base_dir);
        }
        if let Some(ref catalog) = self.catalog {
            settings.catalog_override = Some(self.resolve_path(catalog, base_dir));
        }
        if let Some(ref url) = self.openai_base_url {
            settings.openai_base_url = url.clone();
        }
        if let Some(ref model) = self.openai_model {
            settings.openai_model = model.clone();
        }
        if let Some(tokens) = self.max_tokens {
            settings.max_tokens = tokens;
        }
        if let Some(temperature) = self.temperature {
            settings.temperature = temperature;
        }
        if let Some(ref project) = self.google_project {
            settings.google_project = Some(project.clone());
        }
        if let Some(ref credentials) = self.google_credentials {
            settings.google_credentials = Some(self.resolve_path(credentials, base_dir));
        }
        if let Some(ms) = self.simulation_min_delay_ms {
            settings.simulation_min_delay_ms = ms;
        }
        if let Some(ms) = self.simulation_max_delay_ms {
            settings.simulation_max_delay_ms = ms;
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Explicit catalog path (--catalog flag).
    pub catalog_path: Option<PathBuf>,
}

/// Load settings: defaults, config file, environment, then CLI overrides.
pub async fn load_settings_with_options(options: LoadOptions) -> Result<Settings, ConfigError> {
    let config = match &options.config_path {
        Some(path) => Config::load_from_path(path).await?,
        None => Config::load().await,
    };

    let mut settings = Settings::default();

    // Relative paths resolve against the config file's directory, falling back to CWD
    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    config.apply_to_settings(&mut settings, &base_dir);
    settings.apply_env()?;

    if let Some(catalog) = options.catalog_path {
        settings.catalog_override = Some(catalog);
    }

    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.max_tokens, 1000);
        assert_eq!(settings.temperature, 0.7);
        assert_eq!(settings.simulation_min_delay_ms, 1500);
        assert_eq!(settings.simulation_max_delay_ms, 2500);
        assert!(settings.catalog_path().ends_with("fixo/repairs.json"));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = Settings::default();
        settings
            .apply_env_from(env(&[
                ("OPENAI_API_KEY", "sk-live"),
                ("OPENAI_MAX_TOKENS", "500"),
                ("OPENAI_TEMPERATURE", "0.2"),
                ("GOOGLE_CLOUD_PROJECT", "fixo"),
                ("FIXO_CATALOG_PATH", "/srv/fixo/repairs.json"),
                ("FIXO_SIMULATION_MAX_DELAY_MS", "3000"),
            ]))
            .unwrap();

        assert_eq!(settings.openai_api_key.as_deref(), Some("sk-live"));
        assert_eq!(settings.max_tokens, 500);
        assert_eq!(settings.temperature, 0.2);
        assert_eq!(settings.google_project.as_deref(), Some("fixo"));
        assert_eq!(
            settings.catalog_path(),
            PathBuf::from("/srv/fixo/repairs.json")
        );
        assert_eq!(settings.simulation_max_delay_ms, 3000);
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let mut settings = Settings::default();
        settings
            .apply_env_from(env(&[("OPENAI_API_KEY", "  "), ("OPENAI_MODEL", "")]))
            .unwrap();
        assert!(settings.openai_api_key.is_none());
        assert_eq!(settings.openai_model, DEFAULT_MODEL);
    }

    #[test]
    fn test_invalid_numeric_env() {
        let mut settings = Settings::default();
        let err = settings
            .apply_env_from(env(&[("OPENAI_MAX_TOKENS", "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref name, .. } if name == "OPENAI_MAX_TOKENS"));
    }

    #[test]
    fn test_validate_rejects_inverted_delay() {
        let settings = Settings {
            simulation_min_delay_ms: 3000,
            simulation_max_delay_ms: 1000,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvertedDelay { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_temperature() {
        let settings = Settings {
            temperature: 3.5,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(ConfigError::Temperature(_))));
    }

    #[test]
    fn test_apply_config_resolves_relative_paths() {
        let config = Config {
            target: Some("data".to_string()),
            catalog: Some("catalog/repairs.json".to_string()),
            google_credentials: Some("/abs/creds.json".to_string()),
            max_tokens: Some(256),
            ..Default::default()
        };
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, Path::new("/etc/fixo"));

        assert_eq!(settings.data_dir, PathBuf::from("/etc/fixo/data"));
        assert_eq!(
            settings.catalog_path(),
            PathBuf::from("/etc/fixo/catalog/repairs.json")
        );
        assert_eq!(
            settings.google_credentials,
            Some(PathBuf::from("/abs/creds.json"))
        );
        assert_eq!(settings.max_tokens, 256);
    }

    #[test]
    fn test_analyzer_config() {
        let settings = Settings {
            openai_api_key: Some("sk-abc".to_string()),
            simulation_min_delay_ms: 10,
            simulation_max_delay_ms: 20,
            request_timeout: 5,
            ..Default::default()
        };
        let config = settings.analyzer_config();
        assert!(config.credentials.has_openai_key());
        assert_eq!(config.openai.timeout, Duration::from_secs(5));
        assert_eq!(config.simulation.min_delay, Duration::from_millis(10));
        assert_eq!(config.simulation.max_delay, Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixo.json");
        std::fs::write(&path, r#"{"openai_model": "gpt-4o-mini", "catalog": "repairs.json"}"#)
            .unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        assert_eq!(config.openai_model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(config.base_dir(), Some(dir.path().to_path_buf()));
    }
}
