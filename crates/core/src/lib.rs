//! Core types for the ground-truth evaluation engine
//!
//! This crate provides the foundational pieces shared by the evaluation
//! library and the command line:
//!
//! - **Ground truth**: corpus manifests, queries and their expected answers
//! - **Pipeline models**: what a retrieval/synthesis pipeline returns
//! - **Results and reports**: per-query metrics, aggregates and regressions
//! - **Configuration**: run defaults and regression thresholds
//! - **Error handling**: unified error types
//!

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod config;
pub mod error;
pub mod ground_truth;
pub mod options;
pub mod pipeline_models;
pub mod report;
pub mod results;

// Re-export main types for convenience
pub use config::{Config, EvaluationConfig, EvidenceConfig, RegressionConfig};
pub use error::{Error, Result, ResultExt};
pub use ground_truth::{
    AnnotationLevel, CorrectAnswer, Difficulty, EvidenceRef, GroundTruthFile, GroundTruthQuery,
    LineRange, QueryCategory, RepoManifest,
};
pub use options::{EvalOptions, QueryFilter};
pub use pipeline_models::{Citation, RetrievalOutput, SynthesisOutput};
pub use report::{
    CategoryMetrics, ConfidenceInterval, EvalMetrics, EvalReport, EvidenceMetrics,
    HallucinationMetrics, Recommendation, RegressionEntry, RegressionReport, RetrievalMetrics,
    Significance, SynthesisMetrics,
};
pub use results::{QueryEvalResult, RetrievalEvalResult, SynthesisEvalResult};

/// Version of the core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Result, ResultExt};
    pub use crate::ground_truth::{GroundTruthQuery, RepoManifest};
    pub use crate::options::EvalOptions;
}
