//! Reference catalog of known repairs.
//!
//! The catalog is loaded once from a JSON file shaped like:
//!
//! ```json
//! {
//!   "repairs": {
//!     "faucet": {
//!       "name": "Faucet",
//!       "category": "water",
//!       "issues": [{ "id": "leak", "name": "Leaking", "riskScore": 2, ... }]
//!     }
//!   },
//!   "categories": [{ "id": "water", "name": "Water" }]
//! }
//! ```
//!
//! It is never mutated after loading. The simulation strategy draws from it
//! and the OpenAI prompt lists its repair identifiers.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category filter value that matches every repair.
pub const ALL_CATEGORIES: &str = "all";

pub const MIN_RISK_SCORE: u8 = 1;
pub const MAX_RISK_SCORE: u8 = 10;

/// Errors raised while loading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("issue {repair}/{issue} has risk score {score}, expected 1-10")]
    RiskScore {
        repair: String,
        issue: String,
        score: u8,
    },
}

/// A single repair instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: u32,
    pub action: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub icon: String,
}

/// A known problem with a repair object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Severity on a 1-10 scale.
    pub risk_score: u8,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub time_estimate: String,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub steps: Vec<StepRecord>,
}

/// A repairable household object and its possible issues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairRecord {
    pub name: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub issues: Vec<IssueRecord>,
}

/// Display metadata for a repair category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Read-only collection of repairs keyed by repair identifier.
///
/// Repairs are kept sorted by identifier so that iteration order, and with it
/// any seeded random selection, is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepairCatalog {
    #[serde(default)]
    repairs: BTreeMap<String, RepairRecord>,
    #[serde(default)]
    categories: Vec<Category>,
}

impl RepairCatalog {
    /// Parse a catalog from its JSON representation.
    ///
    /// Every issue must carry a risk score between 1 and 10.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.check_risk_scores()?;
        Ok(catalog)
    }

    fn check_risk_scores(&self) -> Result<(), CatalogError> {
        for (id, repair) in &self.repairs {
            let out_of_range = repair
                .issues
                .iter()
                .find(|issue| !(MIN_RISK_SCORE..=MAX_RISK_SCORE).contains(&issue.risk_score));
            if let Some(issue) = out_of_range {
                return Err(CatalogError::RiskScore {
                    repair: id.clone(),
                    issue: issue.id.clone(),
                    score: issue.risk_score,
                });
            }
        }
        Ok(())
    }

    /// Load a catalog file.
    pub async fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CatalogError::Io {
                path: path.display().to_string(),
                source,
            })?;

        let catalog = Self::from_json(&contents)?;
        tracing::debug!(
            "Loaded {} repairs and {} categories from {}",
            catalog.len(),
            catalog.categories.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.repairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repairs.is_empty()
    }

    /// Get a repair by identifier.
    pub fn get(&self, id: &str) -> Option<&RepairRecord> {
        self.repairs.get(id)
    }

    /// Iterate over all repairs in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RepairRecord)> {
        self.repairs.iter().map(|(id, repair)| (id.as_str(), repair))
    }

    /// Repair identifiers in sorted order.
    pub fn repair_ids(&self) -> impl Iterator<Item = &str> {
        self.repairs.keys().map(String::as_str)
    }

    /// Repairs belonging to `category`. [`ALL_CATEGORIES`] returns everything.
    pub fn by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a RepairRecord)> + 'a {
        self.iter()
            .filter(move |(_, repair)| category == ALL_CATEGORIES || repair.category == category)
    }

    /// Declared category metadata.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Repairs that can be used by the simulation strategy (at least one issue).
    pub fn with_issues(&self) -> Vec<&RepairRecord> {
        self.repairs
            .values()
            .filter(|repair| !repair.issues.is_empty())
            .collect()
    }
}
