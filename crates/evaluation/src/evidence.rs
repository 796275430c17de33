//! Evidence manifest for a completed evaluation
//!
//! Hashes a fixed set of result artifacts and extracts their headline numbers
//! into one audit file. Every artifact and every required field must be
//! present; there is no partial manifest.

use chrono::{DateTime, Utc};
use librarian_eval_core::{Error, Result, ResultExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{info, warn};

/// JSON type a required field must have
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Number,
    Boolean,
}

impl FieldKind {
    fn accepts(self, value: &Value) -> bool {
        match self {
            FieldKind::Number => value.is_number(),
            FieldKind::Boolean => value.is_boolean(),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
        }
    }
}

/// A field the manifest copies out of an artifact, addressed by JSON pointer
#[derive(Debug, Clone, Copy)]
pub struct RequiredField {
    pub pointer: &'static str,
    pub kind: FieldKind,
}

/// An artifact the manifest covers
#[derive(Debug, Clone, Copy)]
pub struct ArtifactSpec {
    pub name: &'static str,
    /// Path relative to the evidence root
    pub path: &'static str,
    pub required: &'static [RequiredField],
}

const fn number(pointer: &'static str) -> RequiredField {
    RequiredField {
        pointer,
        kind: FieldKind::Number,
    }
}

const fn boolean(pointer: &'static str) -> RequiredField {
    RequiredField {
        pointer,
        kind: FieldKind::Boolean,
    }
}

pub const EVIDENCE_ARTIFACTS: [ArtifactSpec; 4] = [
    ArtifactSpec {
        name: "metricsReport",
        path: "eval-results/metrics-report.json",
        required: &[
            number("/queryCount"),
            number("/metrics/retrieval/mrr"),
            number("/metrics/retrieval/map"),
            number("/metrics/retrieval/recallAtK/5"),
            number("/metrics/synthesis/factRecall"),
            number("/metrics/hallucination/hallucinationRate"),
        ],
    },
    ArtifactSpec {
        name: "abResults",
        path: "eval-results/ab-results.json",
        required: &[number("/lift"), boolean("/significant")],
    },
    ArtifactSpec {
        name: "finalVerification",
        path: "eval-results/final-verification.json",
        required: &[boolean("/passed")],
    },
    ArtifactSpec {
        name: "scenarioReport",
        path: "scenario-report.json",
        required: &[number("/total"), number("/passed"), number("/failed")],
    },
];

/// One hashed artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRecord {
    pub name: String,
    pub path: String,
    pub sha256: String,
    pub size_bytes: u64,
    pub modified_at: DateTime<Utc>,
    /// Required fields keyed by pointer, e.g. `/metrics/retrieval/mrr`
    pub summary: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceManifest {
    pub generated_at: DateTime<Utc>,
    pub artifacts: Vec<ArtifactRecord>,
}

impl EvidenceManifest {
    pub fn artifact(&self, name: &str) -> Option<&ArtifactRecord> {
        self.artifacts.iter().find(|a| a.name == name)
    }
}

/// Hashes every artifact under `root` and collects the required fields
pub fn build_manifest(root: &Path) -> Result<EvidenceManifest> {
    let artifacts = EVIDENCE_ARTIFACTS
        .iter()
        .map(|spec| record_artifact(root, spec))
        .collect::<Result<Vec<_>>>()?;

    Ok(EvidenceManifest {
        generated_at: Utc::now(),
        artifacts,
    })
}

/// Builds the manifest and writes it to `output`
pub fn generate_evidence_manifest(root: &Path, output: &Path) -> Result<EvidenceManifest> {
    let manifest = build_manifest(root)?;
    write_json_pretty(output, &manifest)?;
    info!(
        "Wrote evidence manifest for {} artifacts to {}",
        manifest.artifacts.len(),
        output.display()
    );
    Ok(manifest)
}

fn record_artifact(root: &Path, spec: &ArtifactSpec) -> Result<ArtifactRecord> {
    let path = root.join(spec.path);
    if !path.is_file() {
        warn!("Evidence artifact missing: {}", path.display());
        return Err(Error::evidence(format!(
            "missing artifact {} at {}",
            spec.name,
            path.display()
        )));
    }

    let content = std::fs::read_to_string(&path)
        .context(format!("failed to read artifact {}", path.display()))?;
    let document: Value = serde_json::from_str(&content)
        .map_err(|e| Error::evidence(format!("artifact {} is not valid JSON: {e}", spec.path)))?;

    let summary = spec
        .required
        .iter()
        .map(|field| {
            required_value(&document, field, spec.path)
                .map(|value| (field.pointer.to_string(), value.clone()))
        })
        .collect::<Result<BTreeMap<_, _>>>()?;

    let metadata =
        std::fs::metadata(&path).context(format!("failed to stat artifact {}", path.display()))?;
    let modified = metadata
        .modified()
        .context(format!("no modification time for {}", path.display()))?;

    Ok(ArtifactRecord {
        name: spec.name.to_string(),
        path: spec.path.to_string(),
        sha256: sha256_file(&path)?,
        size_bytes: metadata.len(),
        modified_at: DateTime::<Utc>::from(modified),
        summary,
    })
}

/// Looks up a required field, failing when it is absent or mistyped
pub fn required_value<'a>(document: &'a Value, field: &RequiredField, artifact: &str) -> Result<&'a Value> {
    let value = document.pointer(field.pointer).ok_or_else(|| {
        Error::evidence(format!("{artifact} is missing required field {}", field.pointer))
    })?;
    if !field.kind.accepts(value) {
        return Err(Error::evidence(format!(
            "{artifact} field {} must be a {}, found {value}",
            field.pointer,
            field.kind.as_str()
        )));
    }
    Ok(value)
}

/// Lowercase hex SHA-256 of a file, streamed
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file =
        File::open(path).context(format!("failed to open file for hashing: {}", path.display()))?;

    let mut hasher = Sha256::new();
    let mut buf = [0_u8; 8192];

    loop {
        let count = file
            .read(&mut buf)
            .context(format!("failed to read file for hashing: {}", path.display()))?;
        if count == 0 {
            break;
        }
        hasher.update(&buf[..count]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Writes pretty JSON with a trailing newline, creating parent directories
pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .context(format!("failed to create directory {}", parent.display()))?;
    }

    let data = serde_json::to_vec_pretty(value)?;
    let mut file =
        File::create(path).context(format!("failed to create json file: {}", path.display()))?;
    file.write_all(&data)
        .context(format!("failed to write json file: {}", path.display()))?;
    file.write_all(b"\n")
        .context(format!("failed to finalize json file: {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sha256_of_known_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc.txt");
        std::fs::write(&path, "abc").unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_required_value_checks_presence_and_type() {
        let document = json!({ "lift": 0.12, "significant": "yes" });
        assert_eq!(
            required_value(&document, &number("/lift"), "ab-results.json").unwrap(),
            &json!(0.12)
        );

        let missing = required_value(&document, &number("/missing"), "ab-results.json").unwrap_err();
        assert!(missing.to_string().contains("missing required field /missing"));

        let mistyped =
            required_value(&document, &boolean("/significant"), "ab-results.json").unwrap_err();
        assert!(mistyped.to_string().contains("must be a boolean"));
    }

    #[test]
    fn test_write_json_pretty_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/manifest.json");
        write_json_pretty(&path, &json!({ "a": 1 })).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.ends_with('\n'));
        assert_eq!(serde_json::from_str::<Value>(&written).unwrap(), json!({ "a": 1 }));
    }
}
