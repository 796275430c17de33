//! Per-query evaluation results

use crate::ground_truth::{Difficulty, QueryCategory};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Information-retrieval metrics for one query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalEvalResult {
    pub retrieved_docs: Vec<String>,
    pub recall_at_k: BTreeMap<usize, f64>,
    pub precision_at_k: BTreeMap<usize, f64>,
    pub ndcg_at_k: BTreeMap<usize, f64>,
    pub mrr: f64,
    pub map: f64,
    /// Fraction of must-include files found anywhere in the retrieved list
    pub required_recall: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl RetrievalEvalResult {
    /// Zeroed metrics for a query whose retrieval never ran or failed
    pub fn zeroed(k_values: &[usize]) -> Self {
        let zeros: BTreeMap<usize, f64> = k_values.iter().map(|k| (*k, 0.0)).collect();
        Self {
            retrieved_docs: Vec::new(),
            recall_at_k: zeros.clone(),
            precision_at_k: zeros.clone(),
            ndcg_at_k: zeros,
            mrr: 0.0,
            map: 0.0,
            required_recall: 0.0,
            latency_ms: None,
        }
    }
}

/// Answer-quality metrics for one query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisEvalResult {
    pub fact_precision: f64,
    pub fact_recall: f64,
    pub summary_accuracy: f64,
    /// Currently identical to `summary_accuracy`
    pub consistency_score: f64,
    pub hallucination_count: usize,
    pub hallucination_rate: f64,
    pub grounding_rate: f64,
    /// Reserved. No definition exists yet, so it is never computed.
    #[serde(default)]
    pub fabrication_rate: Option<f64>,
    pub citation_accuracy: f64,
    pub missing_facts: Vec<String>,
    pub false_claims: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structural_accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavioral_accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Everything recorded for one query in one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryEvalResult {
    pub query_id: String,
    pub repo_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corpus_id: Option<String>,
    pub category: QueryCategory,
    pub difficulty: Difficulty,
    pub retrieval: RetrievalEvalResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesis: Option<SynthesisEvalResult>,
    pub score: f64,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl QueryEvalResult {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
