//! Replays captured pipeline outputs
//!
//! The recording is a JSON object keyed by `queryId`:
//!
//! ```json
//! {
//!   "q1": {
//!     "retrieval": { "docs": ["src/auth.py"] },
//!     "synthesis": { "answer": "Tokens are refreshed hourly." }
//!   }
//! }
//! ```

use super::EvalPipeline;
use async_trait::async_trait;
use librarian_eval_core::error::{Error, Result};
use librarian_eval_core::{GroundTruthQuery, RepoManifest, RetrievalOutput, SynthesisOutput};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Captured outputs for one query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordedOutput {
    pub retrieval: RetrievalOutput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesis: Option<SynthesisOutput>,
}

/// Deterministic pipeline answering from a recording.
///
/// A query without a recording fails retrieval, which the runner records as
/// a per-query error.
#[derive(Debug, Clone, Default)]
pub struct RecordedPipeline {
    records: HashMap<String, RecordedOutput>,
}

impl RecordedPipeline {
    pub fn new(records: HashMap<String, RecordedOutput>) -> Self {
        Self { records }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::pipeline(format!("Failed to read recording {}: {e}", path.display()))
        })?;
        let records: HashMap<String, RecordedOutput> = serde_json::from_str(&content)
            .map_err(|e| {
                Error::pipeline(format!("Failed to parse recording {}: {e}", path.display()))
            })?;
        debug!("Loaded {} recorded outputs from {}", records.len(), path.display());
        Ok(Self::new(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn record(&self, query_id: &str) -> Result<&RecordedOutput> {
        self.records
            .get(query_id)
            .ok_or_else(|| Error::pipeline(format!("No recorded output for query {query_id}")))
    }
}

#[async_trait]
impl EvalPipeline for RecordedPipeline {
    async fn retrieve(
        &self,
        query: &GroundTruthQuery,
        _repo: &RepoManifest,
        _repo_root: &Path,
    ) -> Result<RetrievalOutput> {
        Ok(self.record(&query.query_id)?.retrieval.clone())
    }

    async fn synthesize(
        &self,
        query: &GroundTruthQuery,
        _repo: &RepoManifest,
        _repo_root: &Path,
        _retrieval: &RetrievalOutput,
    ) -> Result<Option<SynthesisOutput>> {
        Ok(self.record(&query.query_id)?.synthesis.clone())
    }
}
