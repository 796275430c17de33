//! Corpus-wide and per-slice aggregation of query results
//!
//! Every function returns a zero-valued struct for empty input.

use crate::corpus::CorpusRepo;
use librarian_eval_core::{
    CategoryMetrics, ConfidenceInterval, EvalMetrics, EvidenceMetrics, HallucinationMetrics,
    QueryEvalResult, RetrievalMetrics, SynthesisEvalResult, SynthesisMetrics,
};
use std::collections::BTreeMap;

/// z-score of a two-sided 95% interval
const Z_95: f64 = 1.96;

/// Slice key for results whose repo is not part of the corpus
pub const UNKNOWN_CODEBASE_TYPE: &str = "unknown";

/// Reduces per-query results into the report's metric block
pub fn aggregate(results: &[QueryEvalResult], repos: &[CorpusRepo], k_values: &[usize]) -> EvalMetrics {
    EvalMetrics {
        retrieval: aggregate_retrieval(results, k_values),
        synthesis: aggregate_synthesis(results),
        hallucination: aggregate_hallucination(results),
        evidence: aggregate_evidence(results),
        by_category: group_by(results, |r| r.category.to_string()),
        by_difficulty: group_by(results, |r| r.difficulty.to_string()),
        by_codebase_type: group_by(results, |r| codebase_type(r, repos)),
    }
}

pub fn aggregate_retrieval(results: &[QueryEvalResult], k_values: &[usize]) -> RetrievalMetrics {
    if results.is_empty() {
        return RetrievalMetrics::default();
    }

    let recall_at_k = mean_at_k(results, k_values, |r, k| r.retrieval.recall_at_k.get(&k).copied());
    let precision_at_k =
        mean_at_k(results, k_values, |r, k| r.retrieval.precision_at_k.get(&k).copied());
    let ndcg_at_k = mean_at_k(results, k_values, |r, k| r.retrieval.ndcg_at_k.get(&k).copied());

    let ndcg = k_values
        .iter()
        .max()
        .and_then(|k_max| ndcg_at_k.get(k_max))
        .copied()
        .unwrap_or(0.0);

    let latencies: Vec<f64> = results
        .iter()
        .filter_map(|r| r.retrieval.latency_ms)
        .map(|ms| ms as f64)
        .collect();

    RetrievalMetrics {
        recall_at_k,
        precision_at_k,
        ndcg_at_k,
        mrr: mean_of(results, |r| r.retrieval.mrr),
        map: mean_of(results, |r| r.retrieval.map),
        ndcg,
        required_recall: mean_of(results, |r| r.retrieval.required_recall),
        mean_latency_ms: (!latencies.is_empty()).then(|| mean(&latencies)),
        p95_latency_ms: percentile(&latencies, 0.95),
    }
}

/// Mean of a per-cutoff metric; a cutoff missing from a result counts as 0
fn mean_at_k<F>(results: &[QueryEvalResult], k_values: &[usize], select: F) -> BTreeMap<usize, f64>
where
    F: Fn(&QueryEvalResult, usize) -> Option<f64>,
{
    k_values
        .iter()
        .map(|&k| {
            let values: Vec<f64> = results
                .iter()
                .map(|r| select(r, k).unwrap_or(0.0))
                .collect();
            (k, mean(&values))
        })
        .collect()
}

pub fn aggregate_synthesis(results: &[QueryEvalResult]) -> SynthesisMetrics {
    let synthesized = synthesis_results(results);
    if synthesized.is_empty() {
        return SynthesisMetrics::default();
    }

    SynthesisMetrics {
        fact_precision: mean_of(&synthesized, |s| s.fact_precision),
        fact_recall: mean_of(&synthesized, |s| s.fact_recall),
        summary_accuracy: mean_of(&synthesized, |s| s.summary_accuracy),
        consistency_score: mean_of(&synthesized, |s| s.consistency_score),
        sample_size: synthesized.len(),
    }
}

pub fn aggregate_hallucination(results: &[QueryEvalResult]) -> HallucinationMetrics {
    let synthesized = synthesis_results(results);
    if synthesized.is_empty() {
        return HallucinationMetrics::default();
    }

    HallucinationMetrics {
        hallucination_rate: mean_of(&synthesized, |s| s.hallucination_rate),
        total_hallucinations: synthesized.iter().map(|s| s.hallucination_count).sum(),
        queries_with_hallucinations: synthesized
            .iter()
            .filter(|s| s.hallucination_count > 0)
            .count(),
        fabrication_rate: None,
    }
}

pub fn aggregate_evidence(results: &[QueryEvalResult]) -> EvidenceMetrics {
    let synthesized = synthesis_results(results);
    if synthesized.is_empty() {
        return EvidenceMetrics::default();
    }

    EvidenceMetrics {
        citation_accuracy: mean_of(&synthesized, |s| s.citation_accuracy),
        grounding_rate: mean_of(&synthesized, |s| s.grounding_rate),
    }
}

/// Groups results by `key` and summarises each group's scores
pub fn group_by<F>(results: &[QueryEvalResult], key: F) -> BTreeMap<String, CategoryMetrics>
where
    F: Fn(&QueryEvalResult) -> String,
{
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for result in results {
        groups.entry(key(result)).or_default().push(result.score);
    }
    groups
        .into_iter()
        .map(|(name, scores)| (name, category_metrics(&scores)))
        .collect()
}

pub fn category_metrics(scores: &[f64]) -> CategoryMetrics {
    CategoryMetrics {
        accuracy: mean(scores),
        sample_size: scores.len(),
        confidence_interval: confidence_interval(scores),
    }
}

/// Annotation level of the repo a result ran against
fn codebase_type(result: &QueryEvalResult, repos: &[CorpusRepo]) -> String {
    let matching = |repo: &&CorpusRepo| {
        repo.repo_id() == result.repo_id
            && result
                .corpus_id
                .as_deref()
                .map_or(true, |corpus_id| repo.corpus_id() == Some(corpus_id))
    };
    repos
        .iter()
        .find(matching)
        .map(|repo| repo.manifest.annotation_level.to_string())
        .unwrap_or_else(|| UNKNOWN_CODEBASE_TYPE.to_string())
}

fn synthesis_results(results: &[QueryEvalResult]) -> Vec<&SynthesisEvalResult> {
    results.iter().filter_map(|r| r.synthesis.as_ref()).collect()
}

fn mean_of<T>(items: &[T], value: impl Fn(&T) -> f64) -> f64 {
    let values: Vec<f64> = items.iter().map(value).collect();
    mean(&values)
}

/// Arithmetic mean, 0 for no values
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1), 0 below two values
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Normal-approximation 95% interval `mean ± 1.96·sd/√n`, clamped to [0, 1]
pub fn confidence_interval(values: &[f64]) -> ConfidenceInterval {
    if values.is_empty() {
        return ConfidenceInterval::default();
    }
    let m = mean(values);
    let half_width = Z_95 * std_dev(values) / (values.len() as f64).sqrt();
    ConfidenceInterval {
        lower: (m - half_width).clamp(0.0, 1.0),
        upper: (m + half_width).clamp(0.0, 1.0),
    }
}

/// Nearest-rank percentile
pub fn percentile(values: &[f64], quantile: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|left, right| left.total_cmp(right));

    let q = quantile.clamp(0.0, 1.0);
    let rank = ((sorted.len() as f64) * q).ceil() as usize;
    let index = rank.saturating_sub(1).min(sorted.len().saturating_sub(1));
    sorted.get(index).copied()
}
