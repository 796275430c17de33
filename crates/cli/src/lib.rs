//! Command helpers for the `librarian-eval` binary
//!
//! Argument definitions and the glue between parsed arguments, configuration
//! and the evaluation library. Kept out of `main.rs` so it can be tested.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::Args;
use librarian_eval::{EvalPipeline, HttpPipeline, RecordedPipeline};
use librarian_eval_core::{
    Config, Difficulty, EvalOptions, EvalReport, GroundTruthQuery, QueryCategory, QueryFilter,
    Recommendation, RepoManifest, RetrievalOutput,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Exit code of `compare` when the recommendation is `block`
pub const BLOCK_EXIT_CODE: i32 = 2;

/// Where the corpus lives and which pipeline answers its queries
#[derive(Debug, Clone, Args)]
pub struct PipelineArgs {
    /// Corpus root directory
    #[arg(long, value_name = "DIR")]
    pub corpus: PathBuf,

    /// Additional corpus roots merged after the primary one
    #[arg(long = "extra-corpus", value_name = "DIR")]
    pub extra_corpus: Vec<PathBuf>,

    /// Base URL of a running retrieval service
    #[arg(long, value_name = "URL", conflicts_with = "recording")]
    pub pipeline_url: Option<String>,

    /// JSON file of recorded pipeline outputs keyed by query id
    #[arg(long, value_name = "FILE")]
    pub recording: Option<PathBuf>,

    /// Skip synthesis and evaluate retrieval only
    #[arg(long)]
    pub retrieval_only: bool,

    /// Per-call timeout in milliseconds (0 disables)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Record pipeline latency
    #[arg(long)]
    pub include_latency: bool,

    /// Cutoffs for recall/precision/nDCG, comma separated
    #[arg(long = "k", value_delimiter = ',')]
    pub k_values: Vec<usize>,
}

/// Query selection for a full run
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    #[arg(long = "category", value_delimiter = ',', value_parser = parse_category)]
    pub categories: Vec<QueryCategory>,

    #[arg(long = "difficulty", value_delimiter = ',', value_parser = parse_difficulty)]
    pub difficulties: Vec<Difficulty>,

    #[arg(long = "repo", value_delimiter = ',')]
    pub repo_ids: Vec<String>,

    #[arg(long = "query-id", value_delimiter = ',')]
    pub query_ids: Vec<String>,
}

impl FilterArgs {
    /// `None` when no filter flag was given
    pub fn to_filter(&self) -> Option<QueryFilter> {
        fn populated<T: Clone>(values: &[T]) -> Option<Vec<T>> {
            (!values.is_empty()).then(|| values.to_vec())
        }

        let filter = QueryFilter {
            categories: populated(&self.categories),
            difficulties: populated(&self.difficulties),
            repo_ids: populated(&self.repo_ids),
            query_ids: populated(&self.query_ids),
        };
        (!filter.is_empty()).then_some(filter)
    }
}

pub fn parse_category(value: &str) -> std::result::Result<QueryCategory, String> {
    value
        .trim()
        .to_lowercase()
        .parse()
        .map_err(|_| format!("unknown category '{value}'"))
}

pub fn parse_difficulty(value: &str) -> std::result::Result<Difficulty, String> {
    value
        .trim()
        .to_lowercase()
        .parse()
        .map_err(|_| format!("unknown difficulty '{value}'"))
}

/// Builds run options: configuration defaults, then command line overrides
pub fn build_options(
    config: &Config,
    args: &PipelineArgs,
    parallel: Option<usize>,
    filter: Option<QueryFilter>,
) -> EvalOptions {
    let mut options = EvalOptions::from_config(&args.corpus, &config.evaluation);
    options.corpus_paths = args.extra_corpus.clone();
    options.query_filter = filter;
    if let Some(parallel) = parallel {
        options.parallel = parallel;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        options.timeout_ms = (timeout_ms > 0).then_some(timeout_ms);
    }
    options.include_latency |= args.include_latency;
    if !args.k_values.is_empty() {
        options.k_values = args.k_values.clone();
    }
    options
}

/// Creates the pipeline selected on the command line
pub fn build_pipeline(args: &PipelineArgs) -> Result<Arc<dyn EvalPipeline>> {
    match (&args.pipeline_url, &args.recording) {
        (Some(url), None) => {
            let pipeline = HttpPipeline::new(url.as_str())?;
            let pipeline = if args.retrieval_only {
                pipeline.retrieval_only()
            } else {
                pipeline
            };
            Ok(Arc::new(pipeline))
        }
        (None, Some(path)) => {
            let pipeline = RecordedPipeline::from_file(path)?;
            if args.retrieval_only {
                Ok(Arc::new(RetrievalOnly(pipeline)))
            } else {
                Ok(Arc::new(pipeline))
            }
        }
        (Some(_), Some(_)) => bail!("--pipeline-url and --recording are mutually exclusive"),
        (None, None) => bail!("Either --pipeline-url or --recording is required"),
    }
}

/// Wraps a pipeline so that it never synthesizes
struct RetrievalOnly<P>(P);

#[async_trait]
impl<P: EvalPipeline> EvalPipeline for RetrievalOnly<P> {
    async fn retrieve(
        &self,
        query: &GroundTruthQuery,
        repo: &RepoManifest,
        repo_root: &Path,
    ) -> librarian_eval_core::Result<RetrievalOutput> {
        self.0.retrieve(query, repo, repo_root).await
    }
}

pub fn read_report(path: &Path) -> Result<EvalReport> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read report {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse report {}", path.display()))
}

/// Writes pretty JSON, creating parent directories
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    librarian_eval::evidence::write_json_pretty(path, value)
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Resolves `path` against `root` unless it is already absolute
pub fn resolve_under(root: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

pub fn exit_code(recommendation: Recommendation) -> i32 {
    match recommendation {
        Recommendation::Block => BLOCK_EXIT_CODE,
        Recommendation::Warn | Recommendation::Pass => 0,
    }
}
