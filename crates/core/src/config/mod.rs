//! Configuration module for the evaluation engine
//!
//! Configuration can be loaded from TOML files and/or environment variables.
//! Every field has a documented default so a missing file or section yields a
//! fully usable configuration.

mod defaults;
mod loading;


use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use defaults::default_k_values;

use defaults::*;

/// Returns the path to the global configuration file
///
/// The global config is stored at `~/.librarian-eval/config.toml`.
pub fn global_config_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| Error::config("Unable to determine home directory".to_string()))?;
    Ok(home_dir.join(".librarian-eval").join("config.toml"))
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Evaluation run defaults
    #[serde(default)]
    pub evaluation: EvaluationConfig,

    /// Regression significance thresholds
    #[serde(default)]
    pub regression: RegressionConfig,

    /// Evidence manifest settings
    #[serde(default)]
    pub evidence: EvidenceConfig,
}

/// Defaults applied to every evaluation run unless overridden by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Number of queries evaluated concurrently (`<= 1` runs sequentially)
    #[serde(default = "default_parallel")]
    pub parallel: usize,

    /// Deadline for each pipeline call in milliseconds (0 disables it)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Record retrieval and synthesis latency per query
    #[serde(default = "default_include_latency")]
    pub include_latency: bool,

    /// Cutoffs for recall@k, precision@k and nDCG@k
    #[serde(default = "default_k_values")]
    pub k_values: Vec<usize>,

    /// Where the CLI writes the evaluation report
    #[serde(default = "default_report_output_path")]
    pub report_path: String,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            parallel: default_parallel(),
            timeout_ms: default_timeout_ms(),
            include_latency: default_include_latency(),
            k_values: default_k_values(),
            report_path: default_report_output_path(),
        }
    }
}

/// Thresholds used to classify metric deltas between two runs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionConfig {
    /// `|delta| >= significant_threshold` is a significant change
    #[serde(default = "default_significant_threshold")]
    pub significant_threshold: f64,

    /// `|delta| >= marginal_threshold` is a marginal change; anything lower is noise
    #[serde(default = "default_marginal_threshold")]
    pub marginal_threshold: f64,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            significant_threshold: default_significant_threshold(),
            marginal_threshold: default_marginal_threshold(),
        }
    }
}

/// Evidence manifest configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceConfig {
    /// Output path of the manifest, relative to the artifact root
    #[serde(default = "default_evidence_output_path")]
    pub output_path: String,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            output_path: default_evidence_output_path(),
        }
    }
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.evaluation.k_values.is_empty() {
            return Err(Error::config(
                "evaluation.k_values must contain at least one cutoff".to_string(),
            ));
        }
        if self.evaluation.k_values.contains(&0) {
            return Err(Error::config(format!(
                "evaluation.k_values must be greater than 0 (got {:?})",
                self.evaluation.k_values
            )));
        }

        let regression = &self.regression;
        if regression.marginal_threshold.is_nan() || regression.marginal_threshold < 0.0 {
            return Err(Error::config(format!(
                "regression.marginal_threshold must be non-negative (got {})",
                regression.marginal_threshold
            )));
        }
        if regression.significant_threshold.is_nan() {
            return Err(Error::config(
                "regression.significant_threshold must be a number".to_string(),
            ));
        }
        if regression.significant_threshold < regression.marginal_threshold {
            return Err(Error::config(format!(
                "regression.significant_threshold ({}) must be >= marginal_threshold ({})",
                regression.significant_threshold, regression.marginal_threshold
            )));
        }

        if self.evidence.output_path.trim().is_empty() {
            return Err(Error::config(
                "evidence.output_path must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
