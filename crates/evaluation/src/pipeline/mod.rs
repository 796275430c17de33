//! The retrieval/synthesis system under evaluation

mod http;
mod recorded;

pub use http::HttpPipeline;
pub use recorded::{RecordedOutput, RecordedPipeline};

use async_trait::async_trait;
use librarian_eval_core::error::Result;
use librarian_eval_core::{GroundTruthQuery, RepoManifest, RetrievalOutput, SynthesisOutput};
use std::path::Path;

/// A pipeline the evaluator drives once per query.
///
/// Implementations must be safe to call concurrently when the run is
/// configured with more than one worker.
#[async_trait]
pub trait EvalPipeline: Send + Sync {
    /// Retrieve documents for a query, ranked best first
    async fn retrieve(
        &self,
        query: &GroundTruthQuery,
        repo: &RepoManifest,
        repo_root: &Path,
    ) -> Result<RetrievalOutput>;

    /// Synthesize an answer from a successful retrieval.
    ///
    /// `Ok(None)` means the pipeline does not synthesize, and the query is
    /// evaluated on retrieval alone.
    async fn synthesize(
        &self,
        _query: &GroundTruthQuery,
        _repo: &RepoManifest,
        _repo_root: &Path,
        _retrieval: &RetrievalOutput,
    ) -> Result<Option<SynthesisOutput>> {
        Ok(None)
    }
}
