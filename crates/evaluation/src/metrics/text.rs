//! Lexical helpers shared by the synthesis metrics

use std::collections::HashSet;

/// Lowercases and collapses every whitespace run to a single space
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Splits an answer into claims on `.`, `;` and newlines, dropping empty pieces
pub fn split_claims(answer: &str) -> Vec<String> {
    answer
        .split(['.', ';', '\n'])
        .map(str::trim)
        .filter(|claim| !claim.is_empty())
        .map(str::to_string)
        .collect()
}

/// Set of lowercase alphanumeric tokens
pub fn token_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Fraction of `statement` tokens also present in `claim`
pub fn token_overlap(statement: &HashSet<String>, claim: &HashSet<String>) -> f64 {
    if statement.is_empty() {
        return 0.0;
    }
    let shared = statement.intersection(claim).count();
    shared as f64 / statement.len() as f64
}

/// Normalises a file path for comparison: forward slashes, no leading `./`
pub fn normalize_path(path: &str) -> String {
    let unified = path.trim().replace('\\', "/");
    let mut trimmed = unified.as_str();
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest;
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("  Deletes\t  ACCOUNTS\n now "), "deletes accounts now");
    }

    #[test]
    fn test_split_claims() {
        let claims = split_claims("Reads config. Writes cache; retries\n\nlogs errors.");
        assert_eq!(
            claims,
            vec!["Reads config", "Writes cache", "retries", "logs errors"]
        );
        assert!(split_claims("  . ;\n").is_empty());
    }

    #[test]
    fn test_token_overlap() {
        let statement = token_set("updates the cache");
        let claim = token_set("Updates config");
        assert!((token_overlap(&statement, &claim) - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(token_overlap(&token_set(""), &claim), 0.0);
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("./src/auth.py"), "src/auth.py");
        assert_eq!(normalize_path("src\\go\\exporter.go"), "src/go/exporter.go");
        assert_eq!(normalize_path("././lib.rs"), "lib.rs");
    }
}
