//! Information-retrieval metrics over a ranked list of file paths.
//!
//! Relevance is binary unless a graded map is supplied. All cutoff-based
//! metrics look at unique documents in the prefix, so a pipeline that repeats
//! a file cannot inflate its score.

use librarian_eval_core::{CorrectAnswer, RetrievalEvalResult};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Relevance grades keyed by document path
pub type GradedRelevance = HashMap<String, f64>;

/// Configuration for a retrieval evaluation
#[derive(Debug, Clone)]
pub struct RetrievalEvalConfig {
    /// Cutoffs shared by every query in the run
    pub k_values: Vec<usize>,
    /// Optional graded relevance; binary relevance when `None`
    pub graded_relevance: Option<GradedRelevance>,
}

impl RetrievalEvalConfig {
    pub fn new(k_values: Vec<usize>) -> Self {
        Self {
            k_values,
            graded_relevance: None,
        }
    }
}

/// Computes the full retrieval metric suite for one query
pub fn evaluate_retrieval(
    retrieved_docs: &[String],
    answer: &CorrectAnswer,
    config: &RetrievalEvalConfig,
) -> RetrievalEvalResult {
    let relevant_list = answer.relevant_files();
    let relevant: HashSet<&str> = relevant_list.iter().map(String::as_str).collect();
    let graded = config.graded_relevance.as_ref();

    let mut recall_at = BTreeMap::new();
    let mut precision_at = BTreeMap::new();
    let mut ndcg_at = BTreeMap::new();
    for &k in &config.k_values {
        recall_at.insert(k, recall_at_k(retrieved_docs, &relevant, k));
        precision_at.insert(k, precision_at_k(retrieved_docs, &relevant, k));
        ndcg_at.insert(k, ndcg_at_k(retrieved_docs, &relevant, graded, k));
    }

    RetrievalEvalResult {
        retrieved_docs: retrieved_docs.to_vec(),
        recall_at_k: recall_at,
        precision_at_k: precision_at,
        ndcg_at_k: ndcg_at,
        mrr: reciprocal_rank(retrieved_docs, &relevant),
        map: average_precision(retrieved_docs, &relevant),
        required_recall: required_recall(retrieved_docs, &answer.must_include_files),
        latency_ms: None,
    }
}

/// Unique relevant documents within the first `k` positions
fn hits_at_k<'a>(retrieved: &'a [String], relevant: &HashSet<&str>, k: usize) -> HashSet<&'a str> {
    retrieved
        .iter()
        .take(k)
        .map(String::as_str)
        .filter(|doc| relevant.contains(doc))
        .collect()
}

/// Fraction of the relevant set found in the top `k`. Zero when nothing is relevant.
pub fn recall_at_k(retrieved: &[String], relevant: &HashSet<&str>, k: usize) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    hits_at_k(retrieved, relevant, k).len() as f64 / relevant.len() as f64
}

/// Relevant hits in the top `k` divided by `k`
pub fn precision_at_k(retrieved: &[String], relevant: &HashSet<&str>, k: usize) -> f64 {
    if k == 0 {
        return 0.0;
    }
    hits_at_k(retrieved, relevant, k).len() as f64 / k as f64
}

/// Normalized discounted cumulative gain at `k`.
///
/// ```text
/// DCG@k  = Σ rel_i / log2(i + 2)   for 0-indexed positions i < k
/// IDCG@k = DCG of the relevant set's grades sorted descending, min(k, |relevant|) positions
/// ```
///
/// Zero when the ideal DCG is zero.
pub fn ndcg_at_k(
    retrieved: &[String],
    relevant: &HashSet<&str>,
    graded: Option<&GradedRelevance>,
    k: usize,
) -> f64 {
    let grade = |doc: &str| -> f64 {
        match graded.and_then(|grades| grades.get(doc)) {
            Some(value) => *value,
            None if relevant.contains(doc) => 1.0,
            None => 0.0,
        }
    };

    let mut seen = HashSet::new();
    let mut dcg = 0.0;
    for (i, doc) in retrieved.iter().take(k).enumerate() {
        if seen.insert(doc.as_str()) {
            dcg += grade(doc.as_str()) / discount(i);
        }
    }

    let mut ideal: Vec<f64> = relevant.iter().map(|doc| grade(*doc)).collect();
    ideal.sort_by(|a, b| b.total_cmp(a));
    let idcg: f64 = ideal
        .iter()
        .take(k.min(relevant.len()))
        .enumerate()
        .map(|(i, rel)| rel / discount(i))
        .sum();

    if idcg <= 0.0 {
        0.0
    } else {
        (dcg / idcg).clamp(0.0, 1.0)
    }
}

/// Logarithmic position discount for a 0-indexed rank
#[inline]
fn discount(position: usize) -> f64 {
    ((position + 2) as f64).log2()
}

/// `1 / (rank + 1)` of the first relevant document over the full list, 0 if none
pub fn reciprocal_rank(retrieved: &[String], relevant: &HashSet<&str>) -> f64 {
    retrieved
        .iter()
        .position(|doc| relevant.contains(doc.as_str()))
        .map(|rank| 1.0 / (rank + 1) as f64)
        .unwrap_or(0.0)
}

/// Average precision: sum of precision at each first-occurrence relevant hit,
/// divided by the size of the relevant set
pub fn average_precision(retrieved: &[String], relevant: &HashSet<&str>) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }

    let mut found = HashSet::new();
    let mut precision_sum = 0.0;
    for (rank, doc) in retrieved.iter().enumerate() {
        if relevant.contains(doc.as_str()) && found.insert(doc.as_str()) {
            precision_sum += found.len() as f64 / (rank + 1) as f64;
        }
    }
    precision_sum / relevant.len() as f64
}

/// Fraction of must-include files present anywhere in the retrieved list.
/// Vacuously 1 when nothing is required.
pub fn required_recall(retrieved: &[String], must_include: &[String]) -> f64 {
    let required: HashSet<&str> = must_include.iter().map(String::as_str).collect();
    if required.is_empty() {
        return 1.0;
    }
    let retrieved: HashSet<&str> = retrieved.iter().map(String::as_str).collect();
    required.intersection(&retrieved).count() as f64 / required.len() as f64
}
