//! Evaluation runner
//!
//! Loads the corpus, filters queries, drives the pipeline for each query with
//! bounded concurrency and assembles the [`EvalReport`]. Nothing is cached
//! between calls; every `evaluate()` rebuilds the corpus from disk.

use crate::aggregate::aggregate;
use crate::corpus::{CorpusLoader, CorpusRepo, EvalCorpus};
use crate::filter::filter_queries;
use crate::metrics::text::normalize_path;
use crate::metrics::{evaluate_retrieval, evaluate_synthesis, RetrievalEvalConfig};
use crate::pipeline::EvalPipeline;
use crate::scheduler::run_ordered;
use chrono::Utc;
use librarian_eval_core::{
    Error, EvalOptions, EvalReport, GroundTruthQuery, QueryEvalResult, Result,
    RetrievalEvalResult, RetrievalOutput, SynthesisEvalResult,
};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Drives an [`EvalPipeline`] over a ground-truth corpus
#[derive(Clone)]
pub struct EvalRunner {
    pipeline: Arc<dyn EvalPipeline>,
}

impl EvalRunner {
    pub fn new(pipeline: Arc<dyn EvalPipeline>) -> Self {
        Self { pipeline }
    }

    /// Evaluates every query selected by `options`.
    ///
    /// Only corpus load errors are returned. Failures of individual queries
    /// are recorded in their result's `errors` and never abort the batch.
    pub async fn evaluate(&self, options: &EvalOptions) -> Result<EvalReport> {
        let started_at = Utc::now();
        let run_id = Uuid::new_v4().to_string();

        let corpus = CorpusLoader::new(options.all_corpus_paths()).load()?;
        let queries = filter_queries(&corpus.queries, options.query_filter.as_ref());
        let k_values = options.normalized_k_values();

        info!(
            "Starting evaluation run {run_id}: {} of {} queries, parallel={}, k={:?}",
            queries.len(),
            corpus.queries.len(),
            options.parallel,
            k_values
        );

        let query_results = run_ordered(&queries, options.parallel, |query| {
            self.evaluate_one(&corpus, query, options, &k_values)
        })
        .await?;

        let failed = query_results.iter().filter(|r| r.has_errors()).count();
        if failed > 0 {
            warn!("{failed} of {} queries recorded errors", query_results.len());
        }

        let metrics = aggregate(&query_results, &corpus.repos, &k_values);
        let completed_at = Utc::now();
        info!(
            "Evaluation run {run_id} completed in {}ms: mrr={:.4}, map={:.4}",
            (completed_at - started_at).num_milliseconds(),
            metrics.retrieval.mrr,
            metrics.retrieval.map
        );

        Ok(EvalReport {
            run_id,
            started_at,
            completed_at,
            options: options.clone(),
            corpus_version: corpus.version.clone(),
            query_count: query_results.len(),
            metrics,
            query_results,
        })
    }

    /// Evaluates a single query by id, ignoring the options' query filter
    pub async fn evaluate_query(&self, query_id: &str, options: &EvalOptions) -> Result<QueryEvalResult> {
        let corpus = CorpusLoader::new(options.all_corpus_paths()).load()?;
        let query = corpus
            .find_query(query_id)
            .ok_or_else(|| Error::QueryNotFound(query_id.to_string()))?;
        let k_values = options.normalized_k_values();
        Ok(self.evaluate_one(&corpus, query, options, &k_values).await)
    }

    async fn evaluate_one(
        &self,
        corpus: &EvalCorpus,
        query: &GroundTruthQuery,
        options: &EvalOptions,
        k_values: &[usize],
    ) -> QueryEvalResult {
        let mut result = QueryEvalResult {
            query_id: query.query_id.clone(),
            repo_id: query.repo_id.clone(),
            corpus_id: query.corpus_id.clone(),
            category: query.category,
            difficulty: query.difficulty,
            retrieval: RetrievalEvalResult::zeroed(k_values),
            synthesis: None,
            score: 0.0,
            errors: Vec::new(),
        };

        let Some(repo) = corpus.resolve_repo(query) else {
            let message = match &query.corpus_id {
                Some(corpus_id) => format!(
                    "Repository not found: {} in corpus {corpus_id}",
                    query.repo_id
                ),
                None => format!("Repository not found: {}", query.repo_id),
            };
            warn!("Query {}: {message}", query.query_id);
            result.errors.push(message);
            return result;
        };

        debug!("Evaluating query {} against {}", query.query_id, repo.root.display());

        let Some(retrieval) = self.run_retrieval(query, repo, options, k_values, &mut result).await
        else {
            return result;
        };
        result.synthesis = self
            .run_synthesis(query, repo, options, &retrieval, &mut result.errors)
            .await;
        result.score = score(&result.retrieval, result.synthesis.as_ref(), k_values);

        debug!("Query {} scored {:.4}", query.query_id, result.score);
        result
    }

    /// Returns the raw output on success so synthesis can build on it
    async fn run_retrieval(
        &self,
        query: &GroundTruthQuery,
        repo: &CorpusRepo,
        options: &EvalOptions,
        k_values: &[usize],
        result: &mut QueryEvalResult,
    ) -> Option<RetrievalOutput> {
        let started = Instant::now();
        let call = self.pipeline.retrieve(query, &repo.manifest, &repo.root);
        match with_timeout("retrieve", options.timeout_ms, call).await {
            Ok(output) => {
                let docs: Vec<String> = output
                    .docs
                    .iter()
                    .map(|doc| normalize_doc(doc, &repo.root))
                    .collect();
                let config = RetrievalEvalConfig::new(k_values.to_vec());
                result.retrieval = evaluate_retrieval(&docs, &query.correct_answer, &config);
                if options.include_latency {
                    result.retrieval.latency_ms = Some(output.latency_ms.unwrap_or_else(|| elapsed_ms(started)));
                }
                Some(output)
            }
            Err(e) => {
                warn!("Query {}: retrieval failed: {e}", query.query_id);
                result.errors.push(format!("retrieve: {e}"));
                None
            }
        }
    }

    async fn run_synthesis(
        &self,
        query: &GroundTruthQuery,
        repo: &CorpusRepo,
        options: &EvalOptions,
        retrieval: &RetrievalOutput,
        errors: &mut Vec<String>,
    ) -> Option<SynthesisEvalResult> {
        let started = Instant::now();
        let call = self
            .pipeline
            .synthesize(query, &repo.manifest, &repo.root, retrieval);
        match with_timeout("synthesize", options.timeout_ms, call).await {
            Ok(Some(output)) => {
                let mut evaluated = evaluate_synthesis(&output, query);
                if options.include_latency {
                    evaluated.latency_ms = Some(output.latency_ms.unwrap_or_else(|| elapsed_ms(started)));
                }
                Some(evaluated)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Query {}: synthesis failed: {e}", query.query_id);
                errors.push(format!("synthesize: {e}"));
                None
            }
        }
    }
}

/// Awaits `call`, failing with [`Error::Timeout`] once `timeout_ms` elapses
pub async fn with_timeout<T, F>(operation: &str, timeout_ms: Option<u64>, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout_ms {
        Some(ms) => tokio::time::timeout(Duration::from_millis(ms), call)
            .await
            .map_err(|_| Error::timeout(operation, ms))?,
        None => call.await,
    }
}

/// Per-query score in [0, 1].
///
/// Retrieval contributes recall at the largest cutoff. Synthesis contributes
/// the mean of fact recall and precision, discounted by the hallucination
/// rate. With both present the score is their mean.
pub fn score(
    retrieval: &RetrievalEvalResult,
    synthesis: Option<&SynthesisEvalResult>,
    k_values: &[usize],
) -> f64 {
    let retrieval_component = k_values
        .iter()
        .max()
        .and_then(|k| retrieval.recall_at_k.get(k))
        .copied()
        .unwrap_or(0.0);

    let score = match synthesis {
        Some(s) => {
            let synthesis_component =
                (s.fact_recall + s.fact_precision) / 2.0 * (1.0 - s.hallucination_rate);
            (retrieval_component + synthesis_component) / 2.0
        }
        None => retrieval_component,
    };
    score.clamp(0.0, 1.0)
}

/// Normalises a retrieved path and makes it relative to the repo root
pub fn normalize_doc(doc: &str, repo_root: &Path) -> String {
    let doc = normalize_path(doc);
    let root = normalize_path(&repo_root.display().to_string());
    let root = root.trim_end_matches('/');
    if root.is_empty() {
        return doc;
    }
    match doc.strip_prefix(root) {
        Some(rest) if rest.starts_with('/') => rest.trim_start_matches('/').to_string(),
        _ => doc,
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_doc_strips_root_and_dot_prefix() {
        let root = Path::new("/corpus/repos/medium-python");
        assert_eq!(
            normalize_doc("/corpus/repos/medium-python/src/app.py", root),
            "src/app.py"
        );
        assert_eq!(normalize_doc("./src/app.py", root), "src/app.py");
        assert_eq!(normalize_doc("src\\models\\user.py", root), "src/models/user.py");
        // A sibling directory sharing the prefix is left alone
        assert_eq!(
            normalize_doc("/corpus/repos/medium-python-2/src/app.py", root),
            "/corpus/repos/medium-python-2/src/app.py"
        );
    }

    #[test]
    fn test_score_retrieval_only_uses_largest_cutoff() {
        let mut retrieval = RetrievalEvalResult::zeroed(&[1, 10]);
        retrieval.recall_at_k.insert(1, 0.2);
        retrieval.recall_at_k.insert(10, 0.8);
        assert!((score(&retrieval, None, &[1, 10]) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_score_blends_synthesis() {
        let mut retrieval = RetrievalEvalResult::zeroed(&[5]);
        retrieval.recall_at_k.insert(5, 1.0);
        let synthesis = SynthesisEvalResult {
            fact_recall: 1.0,
            fact_precision: 0.5,
            hallucination_rate: 0.5,
            ..Default::default()
        };
        // synthesis component = 0.75 * 0.5 = 0.375
        assert!((score(&retrieval, Some(&synthesis), &[5]) - 0.6875).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, Error>(1)
        };
        let err = with_timeout("retrieve", Some(10), slow).await.unwrap_err();
        assert!(matches!(err, Error::Timeout { timeout_ms: 10, .. }));
    }

    #[tokio::test]
    async fn test_with_timeout_disabled() {
        let value = with_timeout("retrieve", None, async { Ok::<_, Error>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }
}
