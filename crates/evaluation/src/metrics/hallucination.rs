//! Lexical detection of forbidden claims in a synthesized answer.
//!
//! A forbidden statement is flagged when it appears verbatim inside a claim,
//! or when enough of its tokens appear in a single claim. This is an
//! approximation: paraphrases with different vocabulary are not caught.

use super::text::{normalize, token_overlap, token_set};
use std::collections::HashSet;

/// Statements longer than this many tokens use the stricter overlap threshold
pub const SHORT_STATEMENT_MAX_TOKENS: usize = 3;
/// Overlap a statement of more than three tokens must exceed to be flagged
pub const LONG_STATEMENT_OVERLAP: f64 = 0.75;
/// Overlap a statement of three tokens or fewer must exceed to be flagged
pub const SHORT_STATEMENT_OVERLAP: f64 = 0.66;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HallucinationCheck {
    pub count: usize,
    /// Flagged statements / declared statements, 0 when none are declared
    pub rate: f64,
    /// The forbidden statements that were flagged, as declared
    pub false_claims: Vec<String>,
}

/// Checks every `must_not_claim` statement against the answer's claims
pub fn detect_hallucinations(claims: &[String], must_not_claim: &[String]) -> HallucinationCheck {
    let normalized_claims: Vec<String> = claims.iter().map(|c| normalize(c)).collect();
    let claim_tokens: Vec<HashSet<String>> = claims.iter().map(|c| token_set(c)).collect();

    let mut declared = 0usize;
    let mut false_claims = Vec::new();
    for statement in must_not_claim {
        let normalized = normalize(statement);
        if normalized.is_empty() {
            continue;
        }
        declared += 1;

        let verbatim = normalized_claims
            .iter()
            .any(|claim| claim.contains(&normalized));
        if verbatim || overlaps_any_claim(&normalized, &claim_tokens) {
            false_claims.push(statement.clone());
        }
    }

    let count = false_claims.len();
    HallucinationCheck {
        count,
        rate: if declared == 0 {
            0.0
        } else {
            count as f64 / declared as f64
        },
        false_claims,
    }
}

fn overlaps_any_claim(statement: &str, claim_tokens: &[HashSet<String>]) -> bool {
    let tokens = token_set(statement);
    if tokens.is_empty() {
        return false;
    }
    let threshold = if tokens.len() > SHORT_STATEMENT_MAX_TOKENS {
        LONG_STATEMENT_OVERLAP
    } else {
        SHORT_STATEMENT_OVERLAP
    };
    claim_tokens
        .iter()
        .any(|claim| token_overlap(&tokens, claim) > threshold)
}
