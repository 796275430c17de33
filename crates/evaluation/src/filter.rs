//! Query selection

use librarian_eval_core::{GroundTruthQuery, QueryFilter};

/// Keeps the queries matching every populated filter field.
///
/// `None` and an empty filter both pass every query through.
pub fn filter_queries(
    queries: &[GroundTruthQuery],
    filter: Option<&QueryFilter>,
) -> Vec<GroundTruthQuery> {
    match filter {
        Some(filter) if !filter.is_empty() => queries
            .iter()
            .filter(|query| matches_filter(query, filter))
            .cloned()
            .collect(),
        _ => queries.to_vec(),
    }
}

pub fn matches_filter(query: &GroundTruthQuery, filter: &QueryFilter) -> bool {
    allowed(&filter.categories, &query.category)
        && allowed(&filter.difficulties, &query.difficulty)
        && allowed(&filter.repo_ids, &query.repo_id)
        && allowed(&filter.query_ids, &query.query_id)
}

fn allowed<T: PartialEq>(allow_list: &Option<Vec<T>>, value: &T) -> bool {
    allow_list
        .as_ref()
        .map_or(true, |allowed| allowed.contains(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use librarian_eval_core::{CorrectAnswer, Difficulty, QueryCategory};

    fn query(id: &str, repo: &str, category: QueryCategory, difficulty: Difficulty) -> GroundTruthQuery {
        GroundTruthQuery {
            query_id: id.to_string(),
            repo_id: repo.to_string(),
            corpus_id: None,
            intent: format!("intent for {id}"),
            category,
            difficulty,
            correct_answer: CorrectAnswer::default(),
        }
    }

    fn sample() -> Vec<GroundTruthQuery> {
        vec![
            query("q1", "medium-python", QueryCategory::Structural, Difficulty::Trivial),
            query("q2", "medium-python", QueryCategory::Behavioral, Difficulty::Hard),
            query("q3", "large-monorepo", QueryCategory::Security, Difficulty::Hard),
        ]
    }

    fn ids(queries: &[GroundTruthQuery]) -> Vec<&str> {
        queries.iter().map(|q| q.query_id.as_str()).collect()
    }

    #[test]
    fn test_no_filter_is_identity() {
        let queries = sample();
        assert_eq!(filter_queries(&queries, None), queries);
        assert_eq!(filter_queries(&queries, Some(&QueryFilter::default())), queries);
    }

    #[test]
    fn test_single_field_filters() {
        let queries = sample();
        let by_difficulty = QueryFilter {
            difficulties: Some(vec![Difficulty::Hard]),
            ..Default::default()
        };
        assert_eq!(ids(&filter_queries(&queries, Some(&by_difficulty))), vec!["q2", "q3"]);

        let by_repo = QueryFilter {
            repo_ids: Some(vec!["large-monorepo".to_string()]),
            ..Default::default()
        };
        assert_eq!(ids(&filter_queries(&queries, Some(&by_repo))), vec!["q3"]);
    }

    #[test]
    fn test_fields_combine_with_and() {
        let queries = sample();
        let filter = QueryFilter {
            categories: Some(vec![QueryCategory::Behavioral, QueryCategory::Security]),
            repo_ids: Some(vec!["medium-python".to_string()]),
            ..Default::default()
        };
        assert_eq!(ids(&filter_queries(&queries, Some(&filter))), vec!["q2"]);
    }

    #[test]
    fn test_empty_allow_list_matches_nothing() {
        let filter = QueryFilter {
            query_ids: Some(Vec::new()),
            ..Default::default()
        };
        assert!(filter_queries(&sample(), Some(&filter)).is_empty());
    }
}
