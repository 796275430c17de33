//! Shared fixtures: on-disk corpora and a scripted pipeline

#![allow(dead_code)]

use async_trait::async_trait;
use librarian_eval::EvalPipeline;
use librarian_eval_core::{
    Citation, Error, GroundTruthQuery, RepoManifest, Result, RetrievalOutput, SynthesisOutput,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Writes `repos/<repo_id>/.librarian-eval/{manifest,ground-truth}.json`
pub fn write_repo(root: &Path, dir_name: &str, manifest: Value, ground_truth: Value) -> PathBuf {
    let repo_dir = root.join("repos").join(dir_name);
    let eval_dir = repo_dir.join(".librarian-eval");
    std::fs::create_dir_all(&eval_dir).unwrap();
    std::fs::write(
        eval_dir.join("manifest.json"),
        serde_json::to_string_pretty(&manifest).unwrap(),
    )
    .unwrap();
    std::fs::write(
        eval_dir.join("ground-truth.json"),
        serde_json::to_string_pretty(&ground_truth).unwrap(),
    )
    .unwrap();
    repo_dir
}

pub fn manifest(repo_id: &str, annotation_level: &str) -> Value {
    json!({
        "repoId": repo_id,
        "languages": ["python"],
        "fileCount": 11,
        "annotationLevel": annotation_level
    })
}

pub fn query(query_id: &str, category: &str, files: &[&str], facts: &[&str]) -> Value {
    json!({
        "queryId": query_id,
        "intent": format!("question {query_id}"),
        "category": category,
        "difficulty": "moderate",
        "correctAnswer": {
            "summary": format!("summary of {query_id}"),
            "mustIncludeFiles": files,
            "mustIncludeFacts": facts,
            "mustNotClaim": ["deletes accounts"],
            "evidenceRefs": [{ "refId": format!("{query_id}-ev"), "file": files.first() }]
        }
    })
}

/// A corpus root holding `medium-python` (full) and `medium-mixed` (sparse).
///
/// `ghost-query` names a repo that is not in the corpus.
pub fn sample_corpus(root: &Path) {
    let mut ghost = query("ghost-query", "impact", &["src/policy.py"], &[]);
    ghost["repoId"] = json!("ghost-repo");

    write_repo(
        root,
        "medium-python",
        manifest("medium-python", "full"),
        json!({
            "version": "1.0.0",
            "repoId": "medium-python",
            "queries": [
                query("py-auth", "structural", &["src/auth.py", "src/store.py"], &["hashes passwords"]),
                query("py-rate", "behavioral", &["src/rate_limit.py"], &["uses a token bucket"]),
                ghost,
                query("py-policy", "security", &["src/policy.py"], &[])
            ]
        }),
    );
    write_repo(
        root,
        "medium-mixed",
        manifest("medium-mixed", "sparse"),
        json!({
            "version": "1.1.0",
            "queries": [
                query("mixed-cache", "architectural", &["src/rust/cache.rs"], &["evicts least recently used"])
            ]
        }),
    );
}

/// Deterministic pipeline returning scripted outputs by query id
#[derive(Default)]
pub struct ScriptedPipeline {
    pub docs: HashMap<String, Vec<String>>,
    pub answers: HashMap<String, SynthesisOutput>,
    pub failing: Vec<String>,
    /// Per-query delay before retrieval completes
    pub delays: HashMap<String, Duration>,
    pub failing_synthesis: Vec<String>,
    /// Per-query delay before synthesis completes
    pub synthesis_delays: HashMap<String, Duration>,
    pub retrieve_calls: AtomicUsize,
    pub synthesize_calls: AtomicUsize,
}

impl ScriptedPipeline {
    pub fn with_docs(mut self, query_id: &str, docs: &[&str]) -> Self {
        self.docs.insert(
            query_id.to_string(),
            docs.iter().map(|d| d.to_string()).collect(),
        );
        self
    }

    pub fn with_answer(mut self, query_id: &str, answer: &str, citations: Vec<Citation>) -> Self {
        self.answers.insert(
            query_id.to_string(),
            SynthesisOutput {
                answer: answer.to_string(),
                claims: None,
                citations: Some(citations),
                latency_ms: Some(40),
            },
        );
        self
    }

    pub fn failing(mut self, query_id: &str) -> Self {
        self.failing.push(query_id.to_string());
        self
    }

    pub fn with_delay(mut self, query_id: &str, delay: Duration) -> Self {
        self.delays.insert(query_id.to_string(), delay);
        self
    }

    pub fn failing_synthesis(mut self, query_id: &str) -> Self {
        self.failing_synthesis.push(query_id.to_string());
        self
    }

    pub fn with_synthesis_delay(mut self, query_id: &str, delay: Duration) -> Self {
        self.synthesis_delays.insert(query_id.to_string(), delay);
        self
    }
}

#[async_trait]
impl EvalPipeline for ScriptedPipeline {
    async fn retrieve(
        &self,
        query: &GroundTruthQuery,
        _repo: &RepoManifest,
        repo_root: &Path,
    ) -> Result<RetrievalOutput> {
        self.retrieve_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(&query.query_id) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(&query.query_id) {
            return Err(Error::pipeline(format!("backend unavailable for {}", query.query_id)));
        }
        // Absolute paths exercise root stripping
        let docs = self
            .docs
            .get(&query.query_id)
            .map(|docs| {
                docs.iter()
                    .map(|d| repo_root.join(d).display().to_string())
                    .collect()
            })
            .unwrap_or_default();
        Ok(RetrievalOutput {
            docs,
            latency_ms: Some(25),
            scores: None,
        })
    }

    async fn synthesize(
        &self,
        query: &GroundTruthQuery,
        _repo: &RepoManifest,
        _repo_root: &Path,
        _retrieval: &RetrievalOutput,
    ) -> Result<Option<SynthesisOutput>> {
        self.synthesize_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.synthesis_delays.get(&query.query_id) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing_synthesis.contains(&query.query_id) {
            return Err(Error::pipeline(format!("model overloaded for {}", query.query_id)));
        }
        Ok(self.answers.get(&query.query_id).cloned())
    }
}
