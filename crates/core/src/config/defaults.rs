//! Default values and functions for configuration

pub(crate) const DEFAULT_EVIDENCE_OUTPUT_PATH: &str = "eval-results/evidence-manifest.json";
pub(crate) const DEFAULT_REPORT_OUTPUT_PATH: &str = "eval-results/metrics-report.json";

pub(crate) fn default_parallel() -> usize {
    1
}

pub(crate) fn default_timeout_ms() -> u64 {
    60_000
}

pub(crate) fn default_include_latency() -> bool {
    false
}

/// Cutoffs for recall/precision/nDCG. Shared by every query in a run.
pub fn default_k_values() -> Vec<usize> {
    vec![1, 3, 5, 10]
}

pub(crate) fn default_significant_threshold() -> f64 {
    0.05
}

pub(crate) fn default_marginal_threshold() -> f64 {
    0.01
}

pub(crate) fn default_evidence_output_path() -> String {
    DEFAULT_EVIDENCE_OUTPUT_PATH.to_string()
}

pub(crate) fn default_report_output_path() -> String {
    DEFAULT_REPORT_OUTPUT_PATH.to_string()
}
