//! Request and response models exchanged with an evaluation pipeline
//!
//! A pipeline is the retrieval/synthesis system under test. These types are
//! the whole contract between it and the evaluator.

use serde::{Deserialize, Serialize};

/// Output of a pipeline's retrieval step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalOutput {
    /// Retrieved file paths in rank order
    pub docs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    /// Retrieval scores aligned with `docs`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<Vec<f32>>,
}

/// A citation attached to a synthesized answer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,
}

impl Citation {
    pub fn for_ref(ref_id: impl Into<String>) -> Self {
        Self {
            ref_id: Some(ref_id.into()),
            ..Default::default()
        }
    }

    pub fn for_file(file: impl Into<String>, line: Option<u32>) -> Self {
        Self {
            file: Some(file.into()),
            line,
            ..Default::default()
        }
    }
}

/// Output of a pipeline's synthesis step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisOutput {
    pub answer: String,
    /// Explicit claims; when absent the answer text is split into claims
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claims: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Citation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}
