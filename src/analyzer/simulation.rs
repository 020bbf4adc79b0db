//! Simulation strategy.
//!
//! Produces a plausible diagnosis by drawing a random repair and issue from
//! the reference catalog. Used when no remote provider is configured and as
//! the fallback whenever a remote provider fails.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::error::AnalysisError;
use super::safety::safety_warnings;
use super::types::{
    new_analysis_id, slugify, AnalysisResult, DetectedIssue, DetectedObject, Detection,
    Recommendations,
};
use super::Provider;
use crate::catalog::RepairCatalog;

/// Default lower bound of the artificial latency (milliseconds).
pub const DEFAULT_MIN_DELAY_MS: u64 = 1500;
/// Default upper bound of the artificial latency (milliseconds).
pub const DEFAULT_MAX_DELAY_MS: u64 = 2500;

const OBJECT_CONFIDENCE: (f64, f64) = (0.75, 0.95);
const ISSUE_CONFIDENCE: (f64, f64) = (0.80, 0.98);

/// Simulation tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(DEFAULT_MIN_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }
}

impl SimulationConfig {
    /// No artificial latency.
    pub fn instant() -> Self {
        Self {
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }
}

/// Where random draws come from.
///
/// Every call gets its own [`StdRng`]. A seeded source derives those per-call
/// generators from a master generator, so a sequence of calls replays
/// identically.
#[derive(Debug)]
pub enum RandomSource {
    Entropy,
    Seeded(Mutex<StdRng>),
}

impl RandomSource {
    pub fn entropy() -> Self {
        RandomSource::Entropy
    }

    pub fn seeded(seed: u64) -> Self {
        RandomSource::Seeded(Mutex::new(StdRng::seed_from_u64(seed)))
    }

    /// A fresh generator for one call.
    pub fn rng(&self) -> StdRng {
        match self {
            RandomSource::Entropy => StdRng::from_entropy(),
            RandomSource::Seeded(master) => {
                let mut master = master.lock().unwrap_or_else(PoisonError::into_inner);
                StdRng::seed_from_u64(master.gen())
            }
        }
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::entropy()
    }
}

/// Catalog-driven simulated analysis.
#[derive(Debug)]
pub struct SimulationBackend {
    catalog: Arc<RepairCatalog>,
    config: SimulationConfig,
    random: RandomSource,
}

impl SimulationBackend {
    pub fn new(catalog: Arc<RepairCatalog>, config: SimulationConfig) -> Self {
        Self {
            catalog,
            config,
            random: RandomSource::entropy(),
        }
    }

    pub fn with_random_source(mut self, random: RandomSource) -> Self {
        self.random = random;
        self
    }

    /// Wait the artificial latency, then build a simulated result.
    pub async fn analyze(&self) -> Result<AnalysisResult, AnalysisError> {
        debug!("Using simulation");
        let mut rng = self.random.rng();

        let delay = self.draw_delay(&mut rng);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.simulate(&mut rng, Utc::now())
    }

    /// Build a simulated result without waiting.
    pub fn simulate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<AnalysisResult, AnalysisError> {
        let repairs = self.catalog.with_issues();
        let repair = *repairs.choose(rng).ok_or(AnalysisError::EmptyCatalog)?;
        let issue = repair
            .issues
            .choose(rng)
            .ok_or(AnalysisError::EmptyCatalog)?;

        let object_confidence = rng.gen_range(OBJECT_CONFIDENCE.0..OBJECT_CONFIDENCE.1);
        let issue_confidence = rng.gen_range(ISSUE_CONFIDENCE.0..ISSUE_CONFIDENCE.1);

        debug!(
            object = %repair.name,
            issue = %issue.id,
            risk_score = issue.risk_score,
            "Simulated detection"
        );

        Ok(AnalysisResult {
            analysis_id: new_analysis_id(rng, now),
            timestamp: now,
            provider: Provider::Simulation,
            detection: Detection {
                object: DetectedObject {
                    id: slugify(&repair.name),
                    name: repair.name.clone(),
                    category: repair.category.clone(),
                    confidence: object_confidence,
                },
                issue: DetectedIssue {
                    id: issue.id.clone(),
                    name: issue.name.clone(),
                    description: issue.description.clone(),
                    confidence: issue_confidence,
                    risk_score: issue.risk_score,
                },
            },
            recommendations: Recommendations {
                difficulty: issue.difficulty.clone(),
                time_estimate: issue.time_estimate.clone(),
                required_tools: issue.tools.clone(),
                steps: issue.steps.clone(),
                safety_warnings: safety_warnings(issue.risk_score),
            },
        })
    }

    fn draw_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let min = self.config.min_delay.as_millis() as u64;
        let max = self.config.max_delay.as_millis() as u64;
        if max <= min {
            return Duration::from_millis(min);
        }
        Duration::from_millis(rng.gen_range(min..=max))
    }
}
