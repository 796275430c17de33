//! Corpus loading and merging
//!
//! A corpus root has the layout
//!
//! ```text
//! <root>/repos/<repo>/.librarian-eval/manifest.json
//! <root>/repos/<repo>/.librarian-eval/ground-truth.json
//! ```
//!
//! Several roots can be merged into one [`EvalCorpus`]. Every root gets a
//! corpus id derived from its directory name, which disambiguates repos that
//! share a `repoId` across roots. A manifest may declare its own `corpusId`;
//! the repo's queries then default to that id instead.

use librarian_eval_core::{Error, GroundTruthFile, GroundTruthQuery, RepoManifest, Result};
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Directory under each repo holding the evaluation files
pub const EVAL_DIR: &str = ".librarian-eval";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const GROUND_TRUTH_FILE: &str = "ground-truth.json";
pub const REPOS_DIR: &str = "repos";

/// A loaded repository and where it lives on disk
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusRepo {
    /// Manifest with `corpus_id` always populated
    pub manifest: RepoManifest,
    pub root: PathBuf,
}

impl CorpusRepo {
    pub fn repo_id(&self) -> &str {
        &self.manifest.repo_id
    }

    pub fn corpus_id(&self) -> Option<&str> {
        self.manifest.corpus_id.as_deref()
    }
}

/// One logical corpus merged from every requested root. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvalCorpus {
    pub repos: Vec<CorpusRepo>,
    pub queries: Vec<GroundTruthQuery>,
    /// Corpus root id to its resolved path
    pub sources: BTreeMap<String, PathBuf>,
    /// Version of the last ground-truth file loaded
    pub version: String,
}

impl EvalCorpus {
    /// Finds the repo a query runs against.
    ///
    /// With a `corpus_id` on the query the `(repoId, corpusId)` pair must match
    /// exactly; without one the first repo with the same `repoId` wins.
    pub fn resolve_repo(&self, query: &GroundTruthQuery) -> Option<&CorpusRepo> {
        match query.corpus_id.as_deref() {
            Some(corpus_id) => self
                .repos
                .iter()
                .find(|repo| repo.repo_id() == query.repo_id && repo.corpus_id() == Some(corpus_id)),
            None => self.repos.iter().find(|repo| repo.repo_id() == query.repo_id),
        }
    }

    pub fn find_query(&self, query_id: &str) -> Option<&GroundTruthQuery> {
        self.queries.iter().find(|q| q.query_id == query_id)
    }
}

/// Loads and merges corpus roots
#[derive(Debug, Clone, Default)]
pub struct CorpusLoader {
    roots: Vec<PathBuf>,
}

impl CorpusLoader {
    pub fn new(roots: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    /// Loads every root in order.
    ///
    /// Any missing or malformed manifest or ground-truth file fails the whole
    /// load, as does a `queryId` appearing twice after the merge.
    pub fn load(&self) -> Result<EvalCorpus> {
        let mut corpus = EvalCorpus::default();
        let mut seen_roots = HashSet::new();

        for root in &self.roots {
            let resolved = std::fs::canonicalize(root).map_err(|e| {
                Error::corpus(root.display().to_string(), format!("cannot resolve root: {e}"))
            })?;
            if !seen_roots.insert(resolved.clone()) {
                warn!("Skipping duplicate corpus root {}", resolved.display());
                continue;
            }

            let corpus_id = unique_corpus_id(&resolved, &corpus.sources);
            self.load_root(&resolved, &corpus_id, &mut corpus)?;
            corpus.sources.insert(corpus_id, resolved);
        }

        check_unique_query_ids(&corpus.queries)?;

        info!(
            "Loaded corpus: {} roots, {} repos, {} queries",
            corpus.sources.len(),
            corpus.repos.len(),
            corpus.queries.len()
        );
        Ok(corpus)
    }

    fn load_root(&self, root: &Path, corpus_id: &str, corpus: &mut EvalCorpus) -> Result<()> {
        for repo_dir in list_repo_dirs(root)? {
            let eval_dir = repo_dir.join(EVAL_DIR);
            let mut manifest: RepoManifest = read_json(&eval_dir.join(MANIFEST_FILE))?;
            let ground_truth: GroundTruthFile = read_json(&eval_dir.join(GROUND_TRUTH_FILE))?;

            // One corpus id per repo, shared by the repo and its queries
            let repo_corpus_id = manifest
                .corpus_id
                .clone()
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| corpus_id.to_string());
            manifest.corpus_id = Some(repo_corpus_id.clone());

            if let Some(file_repo_id) = ground_truth.repo_id.as_deref() {
                if !file_repo_id.is_empty() && file_repo_id != manifest.repo_id {
                    warn!(
                        "Ground truth in {} declares repoId {file_repo_id}, using manifest repoId {}",
                        repo_dir.display(),
                        manifest.repo_id
                    );
                }
            }
            let default_repo_id = manifest.repo_id.clone();

            debug!(
                "Loaded repo {} ({} queries) from {}",
                manifest.repo_id,
                ground_truth.queries.len(),
                repo_dir.display()
            );

            corpus
                .queries
                .extend(ground_truth.queries.into_iter().map(|mut query| {
                    if query.repo_id.is_empty() {
                        query.repo_id = default_repo_id.clone();
                    }
                    if query.corpus_id.is_none() {
                        query.corpus_id = Some(repo_corpus_id.clone());
                    }
                    query
                }));
            corpus.version = ground_truth.version;
            corpus.repos.push(CorpusRepo {
                manifest,
                root: repo_dir,
            });
        }
        Ok(())
    }
}

/// Immediate subdirectories of `<root>/repos`, sorted by name
fn list_repo_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    let repos_dir = root.join(REPOS_DIR);
    let entries = std::fs::read_dir(&repos_dir).map_err(|e| {
        Error::corpus(repos_dir.display().to_string(), format!("cannot list repos: {e}"))
    })?;

    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::corpus(repos_dir.display().to_string(), e.to_string()))?;
        if entry.path().is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::corpus(path.display().to_string(), format!("cannot read: {e}")))?;
    serde_json::from_str(&content)
        .map_err(|e| Error::corpus(path.display().to_string(), format!("invalid JSON: {e}")))
}

/// Base name of the root, suffixed `-2`, `-3`, ... when already taken
fn unique_corpus_id(root: &Path, taken: &BTreeMap<String, PathBuf>) -> String {
    let base = root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "corpus".to_string());

    if !taken.contains_key(&base) {
        return base;
    }
    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken.contains_key(candidate))
        .unwrap_or(base)
}

fn check_unique_query_ids(queries: &[GroundTruthQuery]) -> Result<()> {
    let mut seen = HashSet::new();
    for query in queries {
        if !seen.insert(query.query_id.as_str()) {
            return Err(Error::corpus(
                query.query_id.clone(),
                "duplicate queryId after corpus merge",
            ));
        }
    }
    Ok(())
}
