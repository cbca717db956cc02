use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::decimal;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtsScore {
    pub id: i64,
    pub resume: i64,
    #[serde(default)]
    pub user: Option<i64>,
    #[serde(deserialize_with = "decimal")]
    pub score: f64,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub keyword_matches: u32,
    pub created_at: DateTime<Utc>,
}

/// Scoring is owned by the backend; the console only relays its output,
/// so the per-item structure is kept as raw JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationSuggestions {
    #[serde(default)]
    pub suggestions: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordMatches {
    #[serde(default)]
    pub matched: Vec<String>,
    #[serde(default)]
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobTitleSynonym {
    pub id: i64,
    pub job_title: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
}
