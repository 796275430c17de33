//! Ground-truth evaluation engine for code-knowledge retrieval
//!
//! This crate runs a retrieval/synthesis pipeline over an annotated corpus and
//! turns its outputs into comparable quality metrics:
//!
//! - **Corpus**: loading and merging corpus roots, query filtering
//! - **Metrics**: IR metrics, fact matching, hallucination and citation checks
//! - **Runner**: bounded-concurrency, order-preserving query evaluation
//! - **Aggregation**: corpus-wide and per-slice metrics with confidence intervals
//! - **Regression**: baseline vs. current comparison with a release recommendation
//! - **Evidence**: hashed manifest of result artifacts
//!

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod aggregate;
pub mod corpus;
pub mod evidence;
pub mod filter;
pub mod metrics;
pub mod pipeline;
pub mod regression;
pub mod runner;
pub mod scheduler;

pub use aggregate::aggregate;
pub use corpus::{CorpusLoader, CorpusRepo, EvalCorpus};
pub use evidence::{build_manifest, generate_evidence_manifest, EvidenceManifest};
pub use filter::filter_queries;
pub use pipeline::{EvalPipeline, HttpPipeline, RecordedOutput, RecordedPipeline};
pub use regression::{compare_metrics, compare_runs};
pub use runner::EvalRunner;
pub use scheduler::run_ordered;
