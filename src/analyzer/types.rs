//! Shared analysis result schema.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::Provider;
use crate::catalog::StepRecord;

/// Length of the random suffix of an analysis ID.
const ID_SUFFIX_LEN: usize = 9;
const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Normalized output of every strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub analysis_id: String,
    pub timestamp: DateTime<Utc>,
    pub provider: Provider,
    pub detection: Detection,
    pub recommendations: Recommendations,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub object: DetectedObject,
    pub issue: DetectedIssue,
}

/// What the photo or description shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub id: String,
    pub name: String,
    pub category: String,
    pub confidence: f64,
}

/// The problem found on the object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedIssue {
    pub id: String,
    pub name: String,
    pub description: String,
    pub confidence: f64,
    /// 1 = trivial, 10 = dangerous.
    pub risk_score: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendations {
    pub difficulty: String,
    pub time_estimate: String,
    pub required_tools: Vec<String>,
    pub steps: Vec<StepRecord>,
    pub safety_warnings: Vec<String>,
}

/// What the caller wants analyzed.
///
/// `image` is a data URL (`data:image/jpeg;base64,...`) or a remote image URL.
#[derive(Debug, Clone, Default)]
pub struct AnalysisInput {
    pub image: Option<String>,
    pub description: Option<String>,
}

impl AnalysisInput {
    pub fn from_image(image: impl Into<String>) -> Self {
        Self {
            image: Some(image.into()),
            description: None,
        }
    }

    pub fn from_description(description: impl Into<String>) -> Self {
        Self {
            image: None,
            description: Some(description.into()),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// True when neither an image nor a non-blank description is present.
    pub fn is_empty(&self) -> bool {
        self.image.is_none()
            && self
                .description
                .as_deref()
                .map_or(true, |d| d.trim().is_empty())
    }
}

/// Per-call overrides of the configured provider settings.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Derive an identifier from a display name: lowercase, spaces become hyphens.
pub fn slugify(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// Generate an analysis ID of the form `analysis-<unix millis>-<suffix>`.
pub fn new_analysis_id<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> String {
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("analysis-{}-{}", now.timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Kitchen Faucet"), "kitchen-faucet");
        assert_eq!(slugify("WC"), "wc");
        assert_eq!(slugify("Door  Hinge"), "door--hinge");
    }

    #[test]
    fn test_analysis_id_format() {
        let mut rng = StdRng::seed_from_u64(7);
        let now = Utc::now();
        let id = new_analysis_id(&mut rng, now);

        let prefix = format!("analysis-{}-", now.timestamp_millis());
        assert!(id.starts_with(&prefix));
        let suffix = &id[prefix.len()..];
        assert_eq!(suffix.len(), ID_SUFFIX_LEN);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_input_is_empty() {
        assert!(AnalysisInput::default().is_empty());
        assert!(AnalysisInput::from_description("   ").is_empty());
        assert!(!AnalysisInput::from_description("dripping tap").is_empty());
        assert!(!AnalysisInput::from_image("data:image/png;base64,AAAA").is_empty());
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = AnalysisResult {
            analysis_id: "analysis-1-abc".to_string(),
            timestamp: Utc::now(),
            provider: Provider::Simulation,
            detection: Detection {
                object: DetectedObject {
                    id: "faucet".to_string(),
                    name: "Faucet".to_string(),
                    category: "water".to_string(),
                    confidence: 0.9,
                },
                issue: DetectedIssue {
                    id: "leak".to_string(),
                    name: "Leaking".to_string(),
                    description: String::new(),
                    confidence: 0.85,
                    risk_score: 2,
                },
            },
            recommendations: Recommendations::default(),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["analysisId"], "analysis-1-abc");
        assert_eq!(json["provider"], "simulation");
        assert_eq!(json["detection"]["issue"]["riskScore"], 2);
        assert!(json["recommendations"]["safetyWarnings"].is_array());
        assert!(json["timestamp"].as_str().is_some_and(|t| !t.is_empty()));
    }
}
