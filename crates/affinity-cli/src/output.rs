//! Output formatting for recommendations.
//!
//! Supports both human-readable terminal output and JSON for scripting.

use crate::recommend::AssignmentSummary;
use affinity_core::ratings::UserId;
use affinity_core::recommend::RecommendationCandidate;
use serde::Serialize;

/// JSON output structure for a recommendation run
#[derive(Serialize)]
pub struct JsonOutput {
    pub user_id: UserId,
    /// Clusters in the store after assignment
    pub clusters: usize,
    pub results: Vec<JsonCandidate>,
}

#[derive(Serialize)]
pub struct JsonCandidate {
    /// 1-based position in the ranking
    pub rank: usize,
    pub item_id: u64,
    pub name: String,
    /// Display score in [0.1, 9.9], or 0.0 for popular-item fallbacks
    pub score: f64,
}

/// Formats recommendations as JSON.
pub fn format_json(
    user_id: UserId,
    summary: &AssignmentSummary,
    results: &[RecommendationCandidate],
) -> String {
    let output = JsonOutput {
        user_id,
        clusters: summary.clusters,
        results: results
            .iter()
            .enumerate()
            .map(|(i, candidate)| JsonCandidate {
                rank: i + 1,
                item_id: candidate.item_id.as_u64(),
                name: candidate.display_name.clone(),
                score: candidate.score,
            })
            .collect(),
    };
    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
}

/// Formats recommendations for human-readable terminal output.
pub fn format_human(user_id: UserId, results: &[RecommendationCandidate]) -> String {
    if results.is_empty() {
        return format!("No recommendations for user {}", user_id);
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{} recommendation{} for user {}:\n\n",
        results.len(),
        if results.len() == 1 { "" } else { "s" },
        user_id
    ));

    let name_width = results
        .iter()
        .map(|c| c.display_name.chars().count())
        .max()
        .unwrap_or(0);

    for (i, candidate) in results.iter().enumerate() {
        output.push_str(&format!(
            "{:>3}. {:<width$}  {:.1}\n",
            i + 1,
            candidate.display_name,
            candidate.score,
            width = name_width
        ));
    }

    // Popular-item fallbacks carry no personalized score
    if results.iter().all(|c| c.score == 0.0) {
        output.push_str("\n(no rating history: showing popular items)\n");
    }

    output.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use affinity_core::ratings::ItemId;

    fn candidate(id: u64, name: &str, score: f64) -> RecommendationCandidate {
        RecommendationCandidate {
            item_id: ItemId::from_u64(id),
            display_name: name.to_string(),
            score,
        }
    }

    #[test]
    fn test_format_human_empty() {
        let output = format_human(UserId::from_u64(3), &[]);
        assert_eq!(output, "No recommendations for user 3");
    }

    #[test]
    fn test_format_human_ranked() {
        let results = vec![
            candidate(3, "Burr Grinder", 9.9),
            candidate(5, "Pour-over Kettle", 0.1),
        ];
        let output = format_human(UserId::from_u64(1), &results);

        assert!(output.starts_with("2 recommendations for user 1"));
        assert!(output.contains("  1. Burr Grinder"));
        assert!(output.contains("9.9"));
        assert!(output.contains("  2. Pour-over Kettle"));
        assert!(!output.contains("popular items"));
    }

    #[test]
    fn test_format_human_popular_fallback() {
        let results = vec![candidate(1, "Espresso Cups", 0.0)];
        let output = format_human(UserId::from_u64(42), &results);

        assert!(output.contains("1 recommendation for user 42"));
        assert!(output.contains("popular items"));
    }

    #[test]
    fn test_format_json() {
        let summary = AssignmentSummary {
            clusters: 2,
            ..AssignmentSummary::default()
        };
        let results = vec![candidate(3, "Burr Grinder", 5.0)];
        let output = format_json(UserId::from_u64(1), &summary, &results);

        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["user_id"], 1);
        assert_eq!(value["clusters"], 2);
        assert_eq!(value["results"][0]["rank"], 1);
        assert_eq!(value["results"][0]["item_id"], 3);
        assert_eq!(value["results"][0]["name"], "Burr Grinder");
        assert_eq!(value["results"][0]["score"], 5.0);
    }
}
