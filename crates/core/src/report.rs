//! Aggregate report and regression models

use crate::options::EvalOptions;
use crate::results::QueryEvalResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{AsRefStr, Display};

/// Two-sided 95% interval, clamped to [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

/// Accuracy of one slice (category, difficulty or codebase type)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryMetrics {
    /// Mean per-query score
    pub accuracy: f64,
    pub sample_size: usize,
    pub confidence_interval: ConfidenceInterval,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalMetrics {
    pub recall_at_k: BTreeMap<usize, f64>,
    pub precision_at_k: BTreeMap<usize, f64>,
    pub ndcg_at_k: BTreeMap<usize, f64>,
    pub mrr: f64,
    pub map: f64,
    /// Mean nDCG at the largest cutoff of the run
    pub ndcg: f64,
    pub required_recall: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_latency_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p95_latency_ms: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisMetrics {
    pub fact_precision: f64,
    pub fact_recall: f64,
    pub summary_accuracy: f64,
    pub consistency_score: f64,
    /// Queries that produced a synthesis result
    pub sample_size: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HallucinationMetrics {
    pub hallucination_rate: f64,
    pub total_hallucinations: usize,
    pub queries_with_hallucinations: usize,
    /// Reserved; see `SynthesisEvalResult::fabrication_rate`
    #[serde(default)]
    pub fabrication_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceMetrics {
    pub citation_accuracy: f64,
    pub grounding_rate: f64,
}

/// Corpus-wide aggregates for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvalMetrics {
    pub retrieval: RetrievalMetrics,
    pub synthesis: SynthesisMetrics,
    pub hallucination: HallucinationMetrics,
    pub evidence: EvidenceMetrics,
    pub by_category: BTreeMap<String, CategoryMetrics>,
    pub by_difficulty: BTreeMap<String, CategoryMetrics>,
    pub by_codebase_type: BTreeMap<String, CategoryMetrics>,
}

/// Result of one `evaluate()` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvalReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub options: EvalOptions,
    pub corpus_version: String,
    pub query_count: usize,
    pub metrics: EvalMetrics,
    pub query_results: Vec<QueryEvalResult>,
}

/// How large a metric delta is relative to the configured thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Significance {
    Significant,
    Marginal,
    Noise,
}

/// Release gate outcome of a regression comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Recommendation {
    Block,
    Warn,
    Pass,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionEntry {
    pub metric: String,
    pub baseline: f64,
    pub current: f64,
    /// `current - baseline`
    pub delta: f64,
    pub significance: Significance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionReport {
    pub has_regression: bool,
    pub regressions: Vec<RegressionEntry>,
    pub improvements: Vec<RegressionEntry>,
    pub recommendation: Recommendation,
}
