//! Baseline vs. current comparison of two evaluation reports

use librarian_eval_core::{
    EvalMetrics, EvalReport, Recommendation, RegressionConfig, RegressionEntry, RegressionReport,
    Significance,
};
use tracing::{info, warn};

/// Absorbs floating point error in deltas sitting exactly on a threshold
const THRESHOLD_TOLERANCE: f64 = 1e-9;

/// Which direction of change is an improvement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    HigherIsBetter,
    LowerIsBetter,
}

/// A metric tracked across runs
#[derive(Debug, Clone, Copy)]
pub struct ComparedMetric {
    pub name: &'static str,
    pub polarity: Polarity,
    /// A significant regression on this metric blocks the release
    pub blocking: bool,
    extract: fn(&EvalMetrics) -> Option<f64>,
}

impl ComparedMetric {
    pub fn value(&self, metrics: &EvalMetrics) -> Option<f64> {
        (self.extract)(metrics)
    }
}

/// The fixed comparison set
pub const COMPARED_METRICS: [ComparedMetric; 8] = [
    ComparedMetric {
        name: "retrieval.recallAtK.5",
        polarity: Polarity::HigherIsBetter,
        blocking: true,
        extract: |m| m.retrieval.recall_at_k.get(&5).copied(),
    },
    ComparedMetric {
        name: "retrieval.precisionAtK.5",
        polarity: Polarity::HigherIsBetter,
        blocking: false,
        extract: |m| m.retrieval.precision_at_k.get(&5).copied(),
    },
    ComparedMetric {
        name: "retrieval.mrr",
        polarity: Polarity::HigherIsBetter,
        blocking: false,
        extract: |m| Some(m.retrieval.mrr),
    },
    ComparedMetric {
        name: "retrieval.map",
        polarity: Polarity::HigherIsBetter,
        blocking: false,
        extract: |m| Some(m.retrieval.map),
    },
    ComparedMetric {
        name: "retrieval.ndcg",
        polarity: Polarity::HigherIsBetter,
        blocking: false,
        extract: |m| Some(m.retrieval.ndcg),
    },
    ComparedMetric {
        name: "synthesis.factRecall",
        polarity: Polarity::HigherIsBetter,
        blocking: false,
        extract: |m| Some(m.synthesis.fact_recall),
    },
    ComparedMetric {
        name: "synthesis.factPrecision",
        polarity: Polarity::HigherIsBetter,
        blocking: false,
        extract: |m| Some(m.synthesis.fact_precision),
    },
    ComparedMetric {
        name: "hallucination.hallucinationRate",
        polarity: Polarity::LowerIsBetter,
        blocking: true,
        extract: |m| Some(m.hallucination.hallucination_rate),
    },
];

/// Classifies the size of a delta against the configured thresholds
pub fn classify(delta: f64, thresholds: &RegressionConfig) -> Significance {
    let magnitude = delta.abs() + THRESHOLD_TOLERANCE;
    if magnitude >= thresholds.significant_threshold {
        Significance::Significant
    } else if magnitude >= thresholds.marginal_threshold {
        Significance::Marginal
    } else {
        Significance::Noise
    }
}

/// Compares two reports' aggregate metrics
pub fn compare_runs(
    baseline: &EvalReport,
    current: &EvalReport,
    thresholds: &RegressionConfig,
) -> RegressionReport {
    compare_metrics(&baseline.metrics, &current.metrics, thresholds)
}

/// Diffs the fixed metric set.
///
/// Noise-level deltas appear in neither list. A metric missing from either
/// side (a run without cutoff 5, for instance) is skipped.
pub fn compare_metrics(
    baseline: &EvalMetrics,
    current: &EvalMetrics,
    thresholds: &RegressionConfig,
) -> RegressionReport {
    let mut regressions = Vec::new();
    let mut improvements = Vec::new();
    let mut blocked = false;

    for metric in &COMPARED_METRICS {
        let (Some(before), Some(after)) = (metric.value(baseline), metric.value(current)) else {
            continue;
        };
        let delta = after - before;
        let significance = classify(delta, thresholds);
        if significance == Significance::Noise || delta == 0.0 {
            continue;
        }

        let entry = RegressionEntry {
            metric: metric.name.to_string(),
            baseline: before,
            current: after,
            delta,
            significance,
        };
        let worse = match metric.polarity {
            Polarity::HigherIsBetter => delta < 0.0,
            Polarity::LowerIsBetter => delta > 0.0,
        };

        if worse {
            warn!(
                "Regression in {}: {:.4} -> {:.4} ({})",
                metric.name, before, after, significance
            );
            blocked |= metric.blocking && significance == Significance::Significant;
            regressions.push(entry);
        } else {
            improvements.push(entry);
        }
    }

    let recommendation = if blocked {
        Recommendation::Block
    } else if !regressions.is_empty() {
        Recommendation::Warn
    } else {
        Recommendation::Pass
    };
    info!(
        "Regression check: {} regressions, {} improvements, recommendation {}",
        regressions.len(),
        improvements.len(),
        recommendation
    );

    RegressionReport {
        has_regression: !regressions.is_empty(),
        regressions,
        improvements,
        recommendation,
    }
}
