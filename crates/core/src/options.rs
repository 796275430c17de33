//! Per-run evaluation options

use crate::config::{default_k_values, EvaluationConfig};
use crate::ground_truth::{Difficulty, QueryCategory};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Narrows a corpus to a subset of queries.
///
/// Every populated field must match; an empty filter passes every query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<QueryCategory>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulties: Option<Vec<Difficulty>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_ids: Option<Vec<String>>,
}

impl QueryFilter {
    pub fn is_empty(&self) -> bool {
        self.categories.is_none()
            && self.difficulties.is_none()
            && self.repo_ids.is_none()
            && self.query_ids.is_none()
    }
}

/// Options for a single `evaluate()` call. Echoed verbatim into the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvalOptions {
    /// Primary corpus root
    pub corpus_path: PathBuf,
    /// Additional corpus roots merged after the primary one
    #[serde(default)]
    pub corpus_paths: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_filter: Option<QueryFilter>,
    /// Worker count; `<= 1` evaluates sequentially
    pub parallel: usize,
    /// Per pipeline call deadline; `None` waits indefinitely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    pub include_latency: bool,
    /// Cutoffs shared by every query in the run
    pub k_values: Vec<usize>,
}

impl EvalOptions {
    /// Options for a corpus root with built-in defaults
    pub fn new(corpus_path: impl Into<PathBuf>) -> Self {
        Self::from_config(corpus_path, &EvaluationConfig::default())
    }

    /// Options for a corpus root with defaults taken from configuration
    pub fn from_config(corpus_path: impl Into<PathBuf>, config: &EvaluationConfig) -> Self {
        Self {
            corpus_path: corpus_path.into(),
            corpus_paths: Vec::new(),
            query_filter: None,
            parallel: config.parallel,
            timeout_ms: (config.timeout_ms > 0).then_some(config.timeout_ms),
            include_latency: config.include_latency,
            k_values: if config.k_values.is_empty() {
                default_k_values()
            } else {
                config.k_values.clone()
            },
        }
    }

    /// Every corpus root in load order, primary first
    pub fn all_corpus_paths(&self) -> Vec<PathBuf> {
        std::iter::once(self.corpus_path.clone())
            .chain(self.corpus_paths.iter().cloned())
            .collect()
    }

    /// Cutoffs sorted ascending with duplicates and zeros removed
    pub fn normalized_k_values(&self) -> Vec<usize> {
        let mut k_values: Vec<usize> = self.k_values.iter().copied().filter(|k| *k > 0).collect();
        k_values.sort_unstable();
        k_values.dedup();
        if k_values.is_empty() {
            default_k_values()
        } else {
            k_values
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_disables_zero_timeout() {
        let config = EvaluationConfig {
            timeout_ms: 0,
            ..Default::default()
        };
        let options = EvalOptions::from_config("/corpus", &config);
        assert_eq!(options.timeout_ms, None);
        assert_eq!(options.parallel, 1);
    }

    #[test]
    fn test_normalized_k_values() {
        let mut options = EvalOptions::new("/corpus");
        options.k_values = vec![10, 0, 3, 3, 1];
        assert_eq!(options.normalized_k_values(), vec![1, 3, 10]);

        options.k_values = vec![0];
        assert_eq!(options.normalized_k_values(), vec![1, 3, 5, 10]);
    }

    #[test]
    fn test_all_corpus_paths_primary_first() {
        let mut options = EvalOptions::new("/a");
        options.corpus_paths = vec![PathBuf::from("/b"), PathBuf::from("/c")];
        assert_eq!(
            options.all_corpus_paths(),
            vec![PathBuf::from("/a"), PathBuf::from("/b"), PathBuf::from("/c")]
        );
    }

    #[test]
    fn test_empty_filter() {
        assert!(QueryFilter::default().is_empty());
        let filter = QueryFilter {
            repo_ids: Some(vec!["small-ts".to_string()]),
            ..Default::default()
        };
        assert!(!filter.is_empty());
    }
}
