//! Librarian evaluation CLI
//!
//! Runs ground-truth evaluations, compares runs and writes evidence manifests.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use librarian_eval::evidence::generate_evidence_manifest;
use librarian_eval::{compare_runs, EvalRunner};
use librarian_eval_cli::{
    build_options, build_pipeline, exit_code, read_report, resolve_under, write_json, FilterArgs,
    PipelineArgs,
};
use librarian_eval_core::Config;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "librarian-eval")]
#[command(about = "Ground-truth evaluation and regression detection for code retrieval")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a corpus and write the report
    Run {
        #[command(flatten)]
        pipeline: PipelineArgs,

        #[command(flatten)]
        filter: FilterArgs,

        /// Number of queries evaluated concurrently
        #[arg(long)]
        parallel: Option<usize>,

        /// Report path (defaults to evaluation.report_path)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Evaluate a single query and print its result
    Query {
        query_id: String,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Compare two reports; exits with status 2 on a blocking regression
    Compare {
        #[arg(long, value_name = "FILE")]
        baseline: PathBuf,

        #[arg(long, value_name = "FILE")]
        current: PathBuf,

        /// Also write the regression report to this file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Hash result artifacts into an evidence manifest
    Evidence {
        /// Directory containing eval-results/ and scenario-report.json
        #[arg(long, value_name = "DIR", default_value = ".")]
        root: PathBuf,

        /// Manifest path (defaults to evidence.output_path under the root)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Run {
            pipeline,
            filter,
            parallel,
            output,
        } => {
            let output = output.unwrap_or_else(|| PathBuf::from(&config.evaluation.report_path));
            run(&config, &pipeline, &filter, parallel, &output).await
        }
        Commands::Query { query_id, pipeline } => query(&config, &pipeline, &query_id).await,
        Commands::Compare {
            baseline,
            current,
            output,
        } => {
            let code = compare(&config, &baseline, &current, output.as_deref())?;
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Commands::Evidence { root, output } => {
            let output =
                output.unwrap_or_else(|| resolve_under(&root, &config.evidence.output_path));
            let manifest = generate_evidence_manifest(&root, &output)
                .context("Failed to generate evidence manifest")?;
            println!("{}", serde_json::to_string_pretty(&manifest)?);
            Ok(())
        }
    }
}

/// Initialize logging system
fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "librarian_eval={level},librarian_eval_core={level},{}={level}",
            env!("CARGO_CRATE_NAME")
        ))
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

async fn run(
    config: &Config,
    pipeline_args: &PipelineArgs,
    filter: &FilterArgs,
    parallel: Option<usize>,
    output: &Path,
) -> Result<()> {
    let options = build_options(config, pipeline_args, parallel, filter.to_filter());
    let runner = EvalRunner::new(build_pipeline(pipeline_args)?);

    let report = runner.evaluate(&options).await.context("Evaluation failed")?;
    write_json(output, &report)?;

    info!("Wrote report for {} queries to {}", report.query_count, output.display());
    let metrics = &report.metrics;
    println!("Queries:            {}", report.query_count);
    for (k, recall) in &metrics.retrieval.recall_at_k {
        println!("Recall@{k:<12}{recall:.4}");
    }
    println!("MRR:                {:.4}", metrics.retrieval.mrr);
    println!("MAP:                {:.4}", metrics.retrieval.map);
    println!("nDCG:               {:.4}", metrics.retrieval.ndcg);
    println!("Fact recall:        {:.4}", metrics.synthesis.fact_recall);
    println!("Hallucination rate: {:.4}", metrics.hallucination.hallucination_rate);

    let errored = report.query_results.iter().filter(|r| r.has_errors()).count();
    if errored > 0 {
        println!("Queries with errors: {errored}");
    }
    Ok(())
}

async fn query(config: &Config, pipeline_args: &PipelineArgs, query_id: &str) -> Result<()> {
    let options = build_options(config, pipeline_args, Some(1), None);
    let runner = EvalRunner::new(build_pipeline(pipeline_args)?);
    let result = runner
        .evaluate_query(query_id, &options)
        .await
        .with_context(|| format!("Failed to evaluate query {query_id}"))?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn compare(config: &Config, baseline: &Path, current: &Path, output: Option<&Path>) -> Result<i32> {
    let baseline_report = read_report(baseline)?;
    let current_report = read_report(current)?;
    let report = compare_runs(&baseline_report, &current_report, &config.regression);

    if let Some(output) = output {
        write_json(output, &report)?;
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(exit_code(report.recommendation))
}
