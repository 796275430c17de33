//! Citation accuracy against a query's declared evidence references.
//!
//! Path matching is lenient: either path may be a suffix of the other, so
//! `src/foo.ts` matches `/repo/src/foo.ts`. Short or generic file names
//! (`mod.rs`) can therefore match evidence in an unrelated directory.

use super::text::normalize_path;
use librarian_eval_core::{Citation, EvidenceRef};

/// Valid citations / declared citations. An answer with no citations scores 0.
pub fn citation_accuracy(citations: &[Citation], evidence: &[EvidenceRef]) -> f64 {
    if citations.is_empty() {
        return 0.0;
    }
    let valid = citations
        .iter()
        .filter(|citation| is_valid_citation(citation, evidence))
        .count();
    valid as f64 / citations.len() as f64
}

/// A citation is valid if it names a known `refId`, or if its path matches an
/// evidence file and its lines overlap the evidence's recorded location.
/// A path match without a cited line is accepted on the path alone.
pub fn is_valid_citation(citation: &Citation, evidence: &[EvidenceRef]) -> bool {
    if let Some(ref_id) = citation.ref_id.as_deref() {
        if evidence.iter().any(|ev| ev.ref_id == ref_id) {
            return true;
        }
    }

    let Some(file) = citation.file.as_deref() else {
        return false;
    };

    evidence.iter().any(|ev| {
        let Some(evidence_file) = ev.file.as_deref() else {
            return false;
        };
        if !paths_match(file, evidence_file) {
            return false;
        }
        match (citation.line, ev.location) {
            (Some(start), Some(location)) => {
                let end = citation.end_line.unwrap_or(start).max(start);
                location.overlaps(start, end)
            }
            _ => true,
        }
    })
}

/// Suffix match in either direction after path normalisation
pub fn paths_match(a: &str, b: &str) -> bool {
    let a = normalize_path(a);
    let b = normalize_path(b);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.ends_with(&b) || b.ends_with(&a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use librarian_eval_core::LineRange;

    fn evidence() -> Vec<EvidenceRef> {
        vec![
            EvidenceRef {
                ref_id: "ev-auth".to_string(),
                file: Some("/repo/src/auth.py".to_string()),
                location: Some(LineRange::new(10, 20)),
            },
            EvidenceRef {
                ref_id: "ev-store".to_string(),
                file: Some("src/store.py".to_string()),
                location: None,
            },
        ]
    }

    #[test]
    fn test_ref_id_match() {
        assert!(is_valid_citation(&Citation::for_ref("ev-auth"), &evidence()));
        assert!(!is_valid_citation(&Citation::for_ref("ev-missing"), &evidence()));
    }

    #[test]
    fn test_suffix_path_with_overlapping_lines() {
        let ev = evidence();
        assert!(is_valid_citation(&Citation::for_file("src/auth.py", Some(15)), &ev));
        assert!(is_valid_citation(&Citation::for_file("./src/auth.py", Some(20)), &ev));
        assert!(!is_valid_citation(&Citation::for_file("src/auth.py", Some(21)), &ev));

        let spanning = Citation {
            file: Some("src/auth.py".to_string()),
            line: Some(1),
            end_line: Some(10),
            ..Default::default()
        };
        assert!(is_valid_citation(&spanning, &ev));
    }

    #[test]
    fn test_path_without_line_accepted() {
        assert!(is_valid_citation(&Citation::for_file("src/auth.py", None), &evidence()));
    }

    #[test]
    fn test_evidence_without_location_accepts_any_line() {
        assert!(is_valid_citation(&Citation::for_file("/abs/src/store.py", Some(400)), &evidence()));
    }

    #[test]
    fn test_unknown_path_rejected() {
        assert!(!is_valid_citation(&Citation::for_file("src/policy.py", Some(12)), &evidence()));
        assert!(!is_valid_citation(&Citation::default(), &evidence()));
    }

    #[test]
    fn test_lenient_suffix_matching_over_matches_generic_names() {
        // Known precision limitation: a bare file name matches any evidence
        // path ending with it, regardless of directory.
        let ev = vec![EvidenceRef {
            ref_id: "ev-1".to_string(),
            file: Some("crates/storage/src/store.py".to_string()),
            location: None,
        }];
        assert!(is_valid_citation(&Citation::for_file("store.py", None), &ev));
        assert!(paths_match("y", "src/policy"));
    }

    #[test]
    fn test_accuracy_ratio() {
        let citations = vec![
            Citation::for_ref("ev-auth"),
            Citation::for_file("src/store.py", None),
            Citation::for_file("src/unknown.py", None),
            Citation::for_ref("nope"),
        ];
        assert!((citation_accuracy(&citations, &evidence()) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_citations_score_zero() {
        assert_eq!(citation_accuracy(&[], &evidence()), 0.0);
        assert_eq!(citation_accuracy(&[], &[]), 0.0);
    }
}
