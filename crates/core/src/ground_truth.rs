//! Ground-truth corpus model
//!
//! These types mirror the on-disk `manifest.json` and `ground-truth.json`
//! files found under `repos/<repoId>/.librarian-eval/` in a corpus root.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// What a query asks about
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum QueryCategory {
    Structural,
    Behavioral,
    Architectural,
    Impact,
    Security,
}

/// How hard a query is expected to be
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Trivial,
    Moderate,
    Hard,
    Research,
}

/// How thoroughly a repository is annotated; used as the codebase type slice
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AnnotationLevel {
    Full,
    Partial,
    Sparse,
}

/// Inclusive line range recorded for an evidence reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRange {
    pub start_line: u32,
    /// Defaults to `start_line` for single-line evidence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,
}

impl LineRange {
    pub fn new(start_line: u32, end_line: u32) -> Self {
        Self {
            start_line,
            end_line: Some(end_line),
        }
    }

    pub fn end(&self) -> u32 {
        self.end_line.unwrap_or(self.start_line).max(self.start_line)
    }

    /// Two inclusive ranges overlap when `a.start <= b.end && a.end >= b.start`
    pub fn overlaps(&self, start: u32, end: u32) -> bool {
        start <= self.end() && end >= self.start_line
    }
}

/// A location an answer is expected to cite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceRef {
    #[serde(alias = "id")]
    pub ref_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LineRange>,
}

/// The expected answer for a ground-truth query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectAnswer {
    #[serde(default)]
    pub summary: String,
    /// Files retrieval must surface
    #[serde(default)]
    pub must_include_files: Vec<String>,
    /// Files that count as relevant but are not required
    #[serde(default)]
    pub should_include_files: Vec<String>,
    /// Statements the synthesized answer must make
    #[serde(default)]
    pub must_include_facts: Vec<String>,
    /// Statements the synthesized answer must never make
    #[serde(default)]
    pub must_not_claim: Vec<String>,
    #[serde(default)]
    pub acceptable_variations: Vec<String>,
    #[serde(default)]
    pub evidence_refs: Vec<EvidenceRef>,
}

impl CorrectAnswer {
    /// Union of must-include and should-include files, deduplicated, first-seen order
    pub fn relevant_files(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.must_include_files
            .iter()
            .chain(self.should_include_files.iter())
            .filter(|file| seen.insert(file.as_str()))
            .cloned()
            .collect()
    }
}

/// A single evaluation query with its expected answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundTruthQuery {
    pub query_id: String,
    /// Filled from the owning manifest when absent on disk
    #[serde(default)]
    pub repo_id: String,
    /// Filled from the owning corpus root when absent on disk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corpus_id: Option<String>,
    pub intent: String,
    pub category: QueryCategory,
    pub difficulty: Difficulty,
    pub correct_answer: CorrectAnswer,
}

/// Repository metadata from `manifest.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoManifest {
    pub repo_id: String,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub file_count: usize,
    pub annotation_level: AnnotationLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corpus_id: Option<String>,
}

/// Contents of a `ground-truth.json` file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundTruthFile {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_id: Option<String>,
    pub queries: Vec<GroundTruthQuery>,
}
