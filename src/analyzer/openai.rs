//! OpenAI vision strategy.
//!
//! Sends the image (and optional description) to an OpenAI-compatible chat
//! completions endpoint, asks for a JSON diagnosis and normalizes the answer
//! into [`AnalysisResult`].

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;
use url::Url;

use super::error::{AnalysisError, ProviderError};
use super::safety::safety_warnings;
use super::types::{
    new_analysis_id, slugify, AnalysisInput, AnalysisResult, AnalyzeOptions, DetectedIssue,
    DetectedObject, Detection, Recommendations,
};
use super::Provider;
use crate::catalog::{RepairCatalog, StepRecord};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Category used when the model does not name one.
pub const FALLBACK_CATEGORY: &str = "other";
/// Risk score used when the model does not provide one.
pub const FALLBACK_RISK_SCORE: u8 = 5;
/// Confidence used when the model does not provide one.
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

const USER_INSTRUCTION: &str =
    "Analyze this and identify the defect. Be as precise as possible.";

/// OpenAI connection settings.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// The two instructions sent with every request.
#[derive(Debug, Clone)]
pub struct AnalysisPrompt {
    pub system: String,
    pub user: String,
}

impl AnalysisPrompt {
    /// Build the system instruction from the catalog's repair identifiers.
    pub fn new(catalog: &RepairCatalog) -> Self {
        let categories = catalog.repair_ids().collect::<Vec<_>>().join(", ");

        let system = format!(
            r#"You are an expert in diagnosing household defects. Analyze the input and identify:
1. The type of object (e.g. faucet, toilet, power outlet, door)
2. The specific problem or defect
3. Its severity and risk
4. Recommended repair steps

Return the answer as JSON:
{{
  "object": {{ "name": "...", "category": "...", "confidence": 0.95 }},
  "issue": {{ "name": "...", "description": "...", "confidence": 0.90, "riskScore": 1-10 }},
  "recommendations": {{ "difficulty": "Low/Medium/High", "timeEstimate": "15 min", "requiredTools": ["..."], "steps": [{{ "step": 1, "action": "...", "time": "5 min", "icon": "🔧" }}], "safetyWarnings": ["..."] }}
}}

Available categories: {}"#,
            categories
        );

        Self {
            system,
            user: USER_INSTRUCTION.to_string(),
        }
    }

    /// The user instruction, extended with the caller's description.
    pub fn user_text(&self, description: Option<&str>) -> String {
        match description.map(str::trim).filter(|d| !d.is_empty()) {
            Some(description) => format!("{}\n\nDescription: {}", self.user, description),
            None => self.user.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: String },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Debug, Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Diagnosis as returned by the model, before normalization.
///
/// Models are loose with types: optional fields may be `null`, numbers may
/// arrive as strings and steps as bare sentences. All of those are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDiagnosis {
    pub object: RawObject,
    pub issue: RawIssue,
    #[serde(default)]
    pub recommendations: Option<RawRecommendations>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawObject {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIssue {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub confidence: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub risk_score: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecommendations {
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub time_estimate: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub required_tools: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub steps: Vec<RawStep>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub safety_warnings: Vec<String>,
}

/// A repair step, either a full record or just the instruction text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawStep {
    Text(String),
    Detailed {
        #[serde(default, deserialize_with = "lenient_number")]
        step: Option<f64>,
        #[serde(alias = "description")]
        action: String,
        #[serde(default, deserialize_with = "null_as_default")]
        time: String,
        #[serde(default, deserialize_with = "null_as_default")]
        icon: String,
    },
}

impl RawStep {
    /// Convert to a step record; `position` numbers steps that carry none.
    fn into_record(self, position: usize) -> StepRecord {
        let fallback = u32::try_from(position + 1).unwrap_or(u32::MAX);
        match self {
            RawStep::Text(action) => StepRecord {
                step: fallback,
                action,
                time: String::new(),
                icon: String::new(),
            },
            RawStep::Detailed {
                step,
                action,
                time,
                icon,
            } => StepRecord {
                step: step
                    .filter(|n| n.is_finite() && *n >= 1.0)
                    .map_or(fallback, |n| n.round().min(f64::from(u32::MAX)) as u32),
                action,
                time,
                icon,
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

/// Accept a number, a numeric string or `null`. Unparseable text reads as absent.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
        Some(NumberOrText::Number(n)) => Some(n),
        Some(NumberOrText::Text(text)) => text.trim().parse().ok(),
        None => None,
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Client for the OpenAI vision endpoint.
#[derive(Debug)]
pub struct OpenAiVisionBackend {
    client: Client,
    endpoint: Url,
    config: OpenAiConfig,
    prompt: AnalysisPrompt,
}

impl OpenAiVisionBackend {
    pub fn new(
        api_key: &str,
        config: OpenAiConfig,
        catalog: &RepairCatalog,
    ) -> Result<Self, AnalysisError> {
        let mut base = config.base_url.trim_end_matches('/').to_string();
        base.push('/');
        let endpoint = Url::parse(&base)?.join("chat/completions")?;

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| AnalysisError::MissingCredentials(Provider::OpenAi))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(AnalysisError::HttpClient)?;

        Ok(Self {
            client,
            endpoint,
            config,
            prompt: AnalysisPrompt::new(catalog),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Run one analysis request.
    pub async fn analyze(
        &self,
        input: &AnalysisInput,
        options: &AnalyzeOptions,
    ) -> Result<AnalysisResult, ProviderError> {
        let model = options.model.as_deref().unwrap_or(&self.config.model);

        let mut parts = vec![ContentPart::Text {
            text: self.prompt.user_text(input.description.as_deref()),
        }];
        if let Some(image) = input.image.as_deref() {
            parts.push(ContentPart::ImageUrl {
                image_url: ImageUrl { url: image },
            });
        }

        let request = ChatCompletionRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(&self.prompt.system),
                },
                ChatMessage {
                    role: "user",
                    content: MessageContent::Parts(parts),
                },
            ],
            max_tokens: options.max_tokens.unwrap_or(self.config.max_tokens),
            temperature: options.temperature.unwrap_or(self.config.temperature),
        };

        debug!(model, endpoint = %self.endpoint, "Sending vision request");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status, body });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ProviderError::EmptyResponse)?;

        let raw = parse_diagnosis(&content)?;
        let now = Utc::now();
        let analysis_id = new_analysis_id(&mut rand::thread_rng(), now);
        Ok(normalize(raw, analysis_id, now))
    }
}

/// Parse the model's answer, tolerating a surrounding Markdown code fence.
pub fn parse_diagnosis(content: &str) -> Result<RawDiagnosis, ProviderError> {
    Ok(serde_json::from_str(strip_code_fence(content))?)
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag on the opening fence line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Reshape a raw model answer into the shared result schema.
///
/// Missing category, risk score and confidences get fixed defaults; missing
/// safety warnings are derived from the risk score.
pub fn normalize(raw: RawDiagnosis, analysis_id: String, now: DateTime<Utc>) -> AnalysisResult {
    let risk_score = raw
        .issue
        .risk_score
        .filter(|score| score.is_finite() && score.round() >= 1.0)
        .map_or(FALLBACK_RISK_SCORE, |score| score.round().min(10.0) as u8);

    let category = raw
        .object
        .category
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_CATEGORY.to_string());

    let recommendations = raw.recommendations.unwrap_or_default();
    let safety_warnings = if recommendations.safety_warnings.is_empty() {
        safety_warnings(risk_score)
    } else {
        recommendations.safety_warnings
    };

    AnalysisResult {
        analysis_id,
        timestamp: now,
        provider: Provider::OpenAi,
        detection: Detection {
            object: DetectedObject {
                id: slugify(&raw.object.name),
                name: raw.object.name,
                category,
                confidence: confidence_or_default(raw.object.confidence),
            },
            issue: DetectedIssue {
                id: slugify(&raw.issue.name),
                name: raw.issue.name,
                description: raw.issue.description,
                confidence: confidence_or_default(raw.issue.confidence),
                risk_score,
            },
        },
        recommendations: Recommendations {
            difficulty: recommendations.difficulty.unwrap_or_default(),
            time_estimate: recommendations.time_estimate.unwrap_or_default(),
            required_tools: recommendations.required_tools,
            steps: recommendations
                .steps
                .into_iter()
                .enumerate()
                .map(|(position, step)| step.into_record(position))
                .collect(),
            safety_warnings,
        },
    }
}

fn confidence_or_default(confidence: Option<f64>) -> f64 {
    confidence
        .filter(|c| c.is_finite() && *c > 0.0)
        .map_or(FALLBACK_CONFIDENCE, |c| c.min(1.0))
}
