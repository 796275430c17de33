//! Pipeline backed by a running retrieval service

use super::EvalPipeline;
use async_trait::async_trait;
use librarian_eval_core::error::{Error, Result};
use librarian_eval_core::{GroundTruthQuery, RepoManifest, RetrievalOutput, SynthesisOutput};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

/// Request body shared by both endpoints
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PipelineRequest<'a> {
    query_id: &'a str,
    query: &'a str,
    repo_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    corpus_id: Option<&'a str>,
    repo_root: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    retrieval: Option<&'a RetrievalOutput>,
}

impl<'a> PipelineRequest<'a> {
    fn new(query: &'a GroundTruthQuery, repo: &'a RepoManifest, repo_root: &Path) -> Self {
        Self {
            query_id: &query.query_id,
            query: &query.intent,
            repo_id: &repo.repo_id,
            corpus_id: repo.corpus_id.as_deref(),
            repo_root: repo_root.display().to_string(),
            retrieval: None,
        }
    }
}

/// Calls `POST {base_url}/retrieve` and, when enabled, `POST {base_url}/synthesize`
pub struct HttpPipeline {
    client: Client,
    base_url: String,
    synthesis: bool,
}

impl HttpPipeline {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::pipeline(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            synthesis: true,
        })
    }

    /// Evaluate retrieval only; `synthesize` is never called on the service
    pub fn retrieval_only(mut self) -> Self {
        self.synthesis = false;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<T: DeserializeOwned>(&self, endpoint: &str, body: &PipelineRequest<'_>) -> Result<T> {
        let url = format!("{}/{endpoint}", self.base_url);
        debug!("POST {url} for query {}", body.query_id);

        let response = self.client.post(&url).json(body).send().await.map_err(|e| {
            let error_kind = if e.is_timeout() {
                "timeout"
            } else if e.is_connect() {
                "connection"
            } else {
                "request"
            };
            Error::pipeline(format!("{endpoint} request failed ({error_kind}): {e}"))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            warn!("{endpoint} returned {status} for query {}: {error_text}", body.query_id);
            return Err(Error::pipeline(format!(
                "{endpoint} returned error {status}: {error_text}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::pipeline(format!("Failed to parse {endpoint} response: {e}")))
    }
}

#[async_trait]
impl EvalPipeline for HttpPipeline {
    async fn retrieve(
        &self,
        query: &GroundTruthQuery,
        repo: &RepoManifest,
        repo_root: &Path,
    ) -> Result<RetrievalOutput> {
        let request = PipelineRequest::new(query, repo, repo_root);
        self.post("retrieve", &request).await
    }

    async fn synthesize(
        &self,
        query: &GroundTruthQuery,
        repo: &RepoManifest,
        repo_root: &Path,
        retrieval: &RetrievalOutput,
    ) -> Result<Option<SynthesisOutput>> {
        if !self.synthesis {
            return Ok(None);
        }
        let request = PipelineRequest {
            retrieval: Some(retrieval),
            ..PipelineRequest::new(query, repo, repo_root)
        };
        self.post("synthesize", &request).await.map(Some)
    }
}
