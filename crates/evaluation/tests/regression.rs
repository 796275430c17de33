//! Regression comparison over full reports

use chrono::Utc;
use librarian_eval::compare_runs;
use librarian_eval_core::{
    EvalMetrics, EvalOptions, EvalReport, Recommendation, RegressionConfig, RegressionEntry,
};

fn report(recall5: f64, precision5: f64, fact_recall: f64, hallucination: f64) -> EvalReport {
    let mut metrics = EvalMetrics::default();
    metrics.retrieval.recall_at_k.insert(5, recall5);
    metrics.retrieval.precision_at_k.insert(5, precision5);
    metrics.retrieval.mrr = 0.6;
    metrics.retrieval.map = 0.5;
    metrics.retrieval.ndcg = 0.55;
    metrics.synthesis.fact_recall = fact_recall;
    metrics.synthesis.fact_precision = 0.7;
    metrics.hallucination.hallucination_rate = hallucination;

    EvalReport {
        run_id: "run".to_string(),
        started_at: Utc::now(),
        completed_at: Utc::now(),
        options: EvalOptions::new("eval-corpus"),
        corpus_version: "1.0.0".to_string(),
        query_count: 0,
        metrics,
        query_results: Vec::new(),
    }
}

fn sorted_metrics(entries: &[RegressionEntry]) -> Vec<String> {
    let mut names: Vec<String> = entries.iter().map(|e| e.metric.clone()).collect();
    names.sort();
    names
}

#[test]
fn test_comparison_is_antisymmetric() {
    let a = report(0.80, 0.40, 0.90, 0.10);
    let b = report(0.72, 0.43, 0.905, 0.02);
    let thresholds = RegressionConfig::default();

    let forward = compare_runs(&a, &b, &thresholds);
    let backward = compare_runs(&b, &a, &thresholds);

    assert_eq!(sorted_metrics(&forward.regressions), sorted_metrics(&backward.improvements));
    assert_eq!(sorted_metrics(&forward.improvements), sorted_metrics(&backward.regressions));

    for entry in forward.regressions.iter().chain(&forward.improvements) {
        let mirrored = backward
            .regressions
            .iter()
            .chain(&backward.improvements)
            .find(|e| e.metric == entry.metric)
            .unwrap();
        assert_eq!(mirrored.delta, -entry.delta);
        assert_eq!(mirrored.significance, entry.significance);
        assert_eq!(mirrored.baseline, entry.current);
    }

    // fact recall moved by 0.005: noise, absent both ways
    assert!(!sorted_metrics(&forward.improvements).contains(&"synthesis.factRecall".to_string()));
    assert!(!sorted_metrics(&backward.regressions).contains(&"synthesis.factRecall".to_string()));
}

#[test]
fn test_recommendations() {
    let thresholds = RegressionConfig::default();
    let baseline = report(0.80, 0.40, 0.90, 0.10);

    let worse_recall = compare_runs(&baseline, &report(0.70, 0.40, 0.90, 0.10), &thresholds);
    assert_eq!(worse_recall.recommendation, Recommendation::Block);
    assert!(worse_recall.has_regression);

    let worse_precision = compare_runs(&baseline, &report(0.80, 0.30, 0.90, 0.10), &thresholds);
    assert_eq!(worse_precision.recommendation, Recommendation::Warn);

    let better = compare_runs(&baseline, &report(0.90, 0.50, 0.95, 0.0), &thresholds);
    assert_eq!(better.recommendation, Recommendation::Pass);
    assert!(!better.has_regression);
    assert_eq!(better.improvements.len(), 4);
}

#[test]
fn test_report_serializes_lowercase_enums() {
    let thresholds = RegressionConfig::default();
    let result = compare_runs(
        &report(0.80, 0.40, 0.90, 0.10),
        &report(0.80, 0.40, 0.90, 0.20),
        &thresholds,
    );
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["recommendation"], "block");
    assert_eq!(json["hasRegression"], true);
    assert_eq!(json["regressions"][0]["metric"], "hallucination.hallucinationRate");
    assert_eq!(json["regressions"][0]["significance"], "significant");
}
