//! Answer-quality metrics for a synthesized response.
//!
//! Every metric here is lexical: normalized substring containment and token
//! overlap. No semantic or model-based judgement is made.

use super::citation::citation_accuracy;
use super::hallucination::detect_hallucinations;
use super::text::{normalize, normalize_path, split_claims};
use librarian_eval_core::{
    Citation, CorrectAnswer, GroundTruthQuery, QueryCategory, SynthesisEvalResult,
    SynthesisOutput,
};
use std::collections::HashSet;

/// Computes the synthesis metric suite for one query
pub fn evaluate_synthesis(output: &SynthesisOutput, query: &GroundTruthQuery) -> SynthesisEvalResult {
    let answer: &CorrectAnswer = &query.correct_answer;
    let claims = match &output.claims {
        Some(claims) => claims.clone(),
        None => split_claims(&output.answer),
    };
    let citations: &[Citation] = output.citations.as_deref().unwrap_or(&[]);

    let fact_match = match_facts(&claims, &answer.must_include_facts);
    let fact_precision = fact_precision(&claims, &answer.must_include_facts);
    let summary_accuracy = summary_accuracy(
        &output.answer,
        &answer.summary,
        &answer.acceptable_variations,
        fact_match.recall,
    );
    let hallucinations = detect_hallucinations(&claims, &answer.must_not_claim);

    SynthesisEvalResult {
        fact_precision,
        fact_recall: fact_match.recall,
        summary_accuracy,
        consistency_score: summary_accuracy,
        hallucination_count: hallucinations.count,
        hallucination_rate: hallucinations.rate,
        grounding_rate: grounding_rate(&claims, citations),
        fabrication_rate: None,
        citation_accuracy: citation_accuracy(citations, &answer.evidence_refs),
        missing_facts: fact_match.missing,
        false_claims: hallucinations.false_claims,
        structural_accuracy: (query.category == QueryCategory::Structural)
            .then_some(fact_match.recall),
        behavioral_accuracy: (query.category == QueryCategory::Behavioral)
            .then_some(summary_accuracy),
        latency_ms: None,
    }
}

/// Outcome of matching required facts against claims
#[derive(Debug, Clone, PartialEq)]
pub struct FactMatch {
    /// Matched facts / required facts, 1 when nothing is required
    pub recall: f64,
    /// Required facts no claim contains, as declared
    pub missing: Vec<String>,
}

/// A fact matches when its normalized text is a substring of any normalized claim
pub fn match_facts(claims: &[String], facts: &[String]) -> FactMatch {
    if facts.is_empty() {
        return FactMatch {
            recall: 1.0,
            missing: Vec::new(),
        };
    }

    let normalized_claims: Vec<String> = claims.iter().map(|c| normalize(c)).collect();
    let missing: Vec<String> = facts
        .iter()
        .filter(|fact| {
            let fact = normalize(fact);
            !normalized_claims.iter().any(|claim| claim.contains(&fact))
        })
        .cloned()
        .collect();

    FactMatch {
        recall: (facts.len() - missing.len()) as f64 / facts.len() as f64,
        missing,
    }
}

/// Fraction of claims containing at least one required fact.
///
/// 1 whenever no facts are required, even with zero claims; 0 when facts are
/// required but nothing was claimed.
pub fn fact_precision(claims: &[String], facts: &[String]) -> f64 {
    if facts.is_empty() {
        return 1.0;
    }
    if claims.is_empty() {
        return 0.0;
    }

    let normalized_facts: Vec<String> = facts.iter().map(|f| normalize(f)).collect();
    let supported = claims
        .iter()
        .filter(|claim| {
            let claim = normalize(claim);
            normalized_facts.iter().any(|fact| claim.contains(fact.as_str()))
        })
        .count();
    supported as f64 / claims.len() as f64
}

/// Unique citation tokens per claim, clamped to [0, 1]
pub fn grounding_rate(claims: &[String], citations: &[Citation]) -> f64 {
    if claims.is_empty() {
        return 0.0;
    }
    let tokens: HashSet<String> = citations.iter().filter_map(citation_token).collect();
    (tokens.len() as f64 / claims.len() as f64).clamp(0.0, 1.0)
}

/// Identity of a citation: its ref id, else `file:line`, else the bare file
fn citation_token(citation: &Citation) -> Option<String> {
    if let Some(ref_id) = citation.ref_id.as_deref().filter(|id| !id.trim().is_empty()) {
        return Some(format!("ref:{}", ref_id.trim()));
    }
    let file = normalize_path(citation.file.as_deref()?);
    if file.is_empty() {
        return None;
    }
    Some(match citation.line {
        Some(line) => format!("{file}:{line}"),
        None => file,
    })
}

/// 1 when the answer contains the summary or an acceptable variation,
/// otherwise falls back to fact recall
pub fn summary_accuracy(
    answer: &str,
    summary: &str,
    variations: &[String],
    fact_recall: f64,
) -> f64 {
    let answer = normalize(answer);
    let matches = std::iter::once(summary)
        .chain(variations.iter().map(String::as_str))
        .map(normalize)
        .filter(|expected| !expected.is_empty())
        .any(|expected| answer.contains(&expected));
    if matches {
        1.0
    } else {
        fact_recall
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use librarian_eval_core::{Difficulty, EvidenceRef};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn query(category: QueryCategory, answer: CorrectAnswer) -> GroundTruthQuery {
        GroundTruthQuery {
            query_id: "q1".to_string(),
            repo_id: "medium-python".to_string(),
            corpus_id: None,
            intent: "How are tokens refreshed?".to_string(),
            category,
            difficulty: Difficulty::Moderate,
            correct_answer: answer,
        }
    }

    #[test]
    fn test_fact_recall_and_missing_facts() {
        let claims = strings(&["The service Refreshes   tokens hourly", "It logs failures"]);
        let result = match_facts(&claims, &strings(&["refreshes tokens", "revokes sessions"]));
        assert!((result.recall - 0.5).abs() < 1e-9);
        assert_eq!(result.missing, vec!["revokes sessions"]);
    }

    #[test]
    fn test_fact_recall_without_required_facts() {
        assert_eq!(match_facts(&strings(&["x"]), &[]).recall, 1.0);
        assert_eq!(match_facts(&[], &[]).recall, 1.0);
    }

    #[test]
    fn test_fact_precision_counts_supporting_claims() {
        let claims = strings(&["refreshes tokens hourly", "uses redis", "logs failures"]);
        let precision = fact_precision(&claims, &strings(&["refreshes tokens"]));
        assert!((precision - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_fact_precision_zero_claim_asymmetry() {
        // No required facts: vacuously 1, even with no claims.
        assert_eq!(fact_precision(&[], &[]), 1.0);
        assert_eq!(fact_precision(&strings(&["anything"]), &[]), 1.0);
        // Required facts but nothing claimed: 0.
        assert_eq!(fact_precision(&[], &strings(&["refreshes tokens"])), 0.0);
    }

    #[test]
    fn test_summary_accuracy_exact_and_fallback() {
        let variations = strings(&["tokens are renewed every hour"]);
        assert_eq!(
            summary_accuracy(
                "In short: Tokens are renewed   every hour.",
                "the refresher job rotates tokens",
                &variations,
                0.25
            ),
            1.0
        );
        assert_eq!(
            summary_accuracy("Something else entirely", "rotates tokens", &variations, 0.25),
            0.25
        );
        // Empty summary never matches by itself
        assert_eq!(summary_accuracy("anything", "", &[], 0.4), 0.4);
    }

    #[test]
    fn test_grounding_rate_unique_tokens() {
        let claims = strings(&["a", "b", "c", "d"]);
        let citations = vec![
            Citation::for_ref("ev-1"),
            Citation::for_ref("ev-1"),
            Citation::for_file("./src/auth.py", Some(3)),
            Citation::for_file("src/auth.py", Some(3)),
            Citation::for_file("src/auth.py", None),
        ];
        // ref:ev-1, src/auth.py:3, src/auth.py
        assert!((grounding_rate(&claims, &citations) - 0.75).abs() < 1e-9);
        assert_eq!(grounding_rate(&strings(&["a"]), &citations), 1.0);
        assert_eq!(grounding_rate(&[], &citations), 0.0);
    }

    #[test]
    fn test_evaluate_synthesis_structural() {
        let answer = CorrectAnswer {
            summary: "AuthService delegates to TokenStore".to_string(),
            must_include_facts: strings(&["delegates to tokenstore", "caches sessions"]),
            must_not_claim: strings(&["deletes accounts"]),
            evidence_refs: vec![EvidenceRef {
                ref_id: "ev-1".to_string(),
                file: Some("src/auth.py".to_string()),
                location: None,
            }],
            ..Default::default()
        };
        let output = SynthesisOutput {
            answer: "AuthService delegates to TokenStore. It deletes accounts nightly.".to_string(),
            claims: None,
            citations: Some(vec![Citation::for_ref("ev-1")]),
            latency_ms: None,
        };

        let result = evaluate_synthesis(&output, &query(QueryCategory::Structural, answer));
        assert!((result.fact_recall - 0.5).abs() < 1e-9);
        assert!((result.fact_precision - 0.5).abs() < 1e-9);
        assert_eq!(result.summary_accuracy, 1.0);
        assert_eq!(result.consistency_score, result.summary_accuracy);
        assert_eq!(result.hallucination_count, 1);
        assert_eq!(result.false_claims, vec!["deletes accounts"]);
        assert_eq!(result.citation_accuracy, 1.0);
        assert!((result.grounding_rate - 0.5).abs() < 1e-9);
        assert_eq!(result.fabrication_rate, None);
        assert_eq!(result.structural_accuracy, Some(0.5));
        assert_eq!(result.behavioral_accuracy, None);
        assert_eq!(result.missing_facts, vec!["caches sessions"]);
    }

    #[test]
    fn test_evaluate_synthesis_behavioral_uses_explicit_claims() {
        let answer = CorrectAnswer {
            summary: "retries three times".to_string(),
            must_include_facts: strings(&["retries three times"]),
            ..Default::default()
        };
        let output = SynthesisOutput {
            answer: "ignored. text; here".to_string(),
            claims: Some(strings(&["It retries three times"])),
            citations: None,
            latency_ms: None,
        };

        let result = evaluate_synthesis(&output, &query(QueryCategory::Behavioral, answer));
        assert_eq!(result.fact_recall, 1.0);
        assert_eq!(result.fact_precision, 1.0);
        // answer text lacks the summary, so summary accuracy falls back to fact recall
        assert_eq!(result.summary_accuracy, 1.0);
        assert_eq!(result.behavioral_accuracy, Some(1.0));
        assert_eq!(result.structural_accuracy, None);
        assert_eq!(result.citation_accuracy, 0.0);
        assert_eq!(result.hallucination_rate, 0.0);
    }

    #[test]
    fn test_other_categories_report_no_category_accuracy() {
        let output = SynthesisOutput {
            answer: "x".to_string(),
            ..Default::default()
        };
        let result = evaluate_synthesis(
            &output,
            &query(QueryCategory::Security, CorrectAnswer::default()),
        );
        assert_eq!(result.structural_accuracy, None);
        assert_eq!(result.behavioral_accuracy, None);
    }
}
