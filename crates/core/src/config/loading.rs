//! Configuration loading from files and environment variables

use crate::error::{Error, Result};
use config::{Config as ConfigLib, ConfigBuilder as LibConfigBuilder, Environment, File};
use std::path::Path;
use tracing::debug;

use super::defaults::*;
use super::{global_config_path, Config};

/// Helper to set a config default with consistent error mapping
fn set_config_default<T: Into<config::Value>>(
    builder: LibConfigBuilder<config::builder::DefaultState>,
    key: &str,
    value: T,
) -> Result<LibConfigBuilder<config::builder::DefaultState>> {
    builder
        .set_default(key, value)
        .map_err(|e| Error::config(format!("Failed to set {key} default: {e}")))
}

impl Config {
    /// Loads configuration from a TOML file with environment variable overrides
    ///
    /// Environment variables are prefixed with `LIBRARIAN_EVAL_` and use double
    /// underscores for nested values. For example:
    /// - `LIBRARIAN_EVAL_EVALUATION__PARALLEL=8`
    /// - `LIBRARIAN_EVAL_EVALUATION__K_VALUES=1,5,20`
    pub fn from_file(path: &Path) -> Result<Self> {
        let builder = ConfigLib::builder();

        // config crate doesn't apply serde defaults for missing sections
        let builder =
            set_config_default(builder, "evaluation.parallel", default_parallel() as i64)?;
        let builder =
            set_config_default(builder, "evaluation.timeout_ms", default_timeout_ms() as i64)?;
        let builder = set_config_default(
            builder,
            "evaluation.include_latency",
            default_include_latency(),
        )?;
        let builder = set_config_default(
            builder,
            "evaluation.k_values",
            default_k_values()
                .into_iter()
                .map(|k| k as i64)
                .collect::<Vec<i64>>(),
        )?;
        let builder = set_config_default(
            builder,
            "evaluation.report_path",
            default_report_output_path(),
        )?;
        let builder = set_config_default(
            builder,
            "regression.significant_threshold",
            default_significant_threshold(),
        )?;
        let builder = set_config_default(
            builder,
            "regression.marginal_threshold",
            default_marginal_threshold(),
        )?;
        let mut builder = set_config_default(
            builder,
            "evidence.output_path",
            default_evidence_output_path(),
        )?;

        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("LIBRARIAN_EVAL")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("evaluation.k_values")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| Error::config(format!("Failed to deserialize config: {e}")))
    }

    /// Creates a config from a TOML string (useful for testing)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from a single file
    ///
    /// Precedence (lowest to highest):
    /// 1. Hardcoded defaults
    /// 2. Config file (~/.librarian-eval/config.toml or custom --config path)
    /// 3. Environment variables (LIBRARIAN_EVAL_*)
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => global_config_path()?,
        };
        debug!("Loading configuration from {}", path.display());
        let config = Self::from_file(&path)?;
        config.validate()?;
        Ok(config)
    }
}
