// src/analyzer.rs
//
// Threshold partition of the cleaned reviews plus per-group keyword
// frequencies, rendered as word clouds.

use anyhow::{Context, Result};
use itertools::Itertools;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::models::CleanReview;
use crate::wordcloud;

pub struct AnalyzerParams {
    pub threshold: i32, // score_numeric >= threshold counts as positive
    pub top_n: usize,
}

impl Default for AnalyzerParams {
    fn default() -> Self {
        Self {
            threshold: 30,
            top_n: 50,
        }
    }
}

/// Split reviews into (positive, negative) by the score threshold. Every
/// record lands in exactly one group.
pub fn classify(
    records: &[CleanReview],
    threshold: i32,
) -> (Vec<&CleanReview>, Vec<&CleanReview>) {
    records
        .iter()
        .partition(|r| r.score_numeric >= threshold)
}

/// Top-n word frequencies over the token lists of a group, descending by
/// count with lexicographic tie order. Counts across all distinct words sum
/// to the group's total token count.
pub fn extract_keywords<'a, I>(groups: I, top_n: usize) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a Vec<String>>,
{
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for tokens in groups {
        for t in tokens {
            *counts.entry(t.as_str()).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1))
        .take(top_n)
        .map(|(w, n)| (w.to_string(), n))
        .collect()
}

/// Partition, extract keywords and render the three word clouds under
/// `<out_dir>/wordclouds/`. Rendering is skipped entirely when either group
/// is empty; a single failed render does not stop the others.
pub fn analyze(records: &[CleanReview], out_dir: &Path, params: &AnalyzerParams) -> Result<()> {
    if records.is_empty() {
        warn!("Analysis skipped - cleaned table is empty");
        return Ok(());
    }

    let (positive, negative) = classify(records, params.threshold);
    info!(
        "Sentiment partition - positive={}, negative={}, threshold={}",
        positive.len(),
        negative.len(),
        params.threshold
    );

    if positive.is_empty() || negative.is_empty() {
        warn!(
            "Word clouds skipped - one group is empty (positive={}, negative={})",
            positive.len(),
            negative.len()
        );
        return Ok(());
    }

    let cloud_dir = out_dir.join("wordclouds");
    fs::create_dir_all(&cloud_dir).with_context(|| format!("create {:?}", cloud_dir))?;

    let all_keywords = extract_keywords(records.iter().map(|r| &r.tokens), params.top_n);
    let good_keywords = extract_keywords(positive.iter().map(|r| &r.tokens), params.top_n);
    let bad_keywords = extract_keywords(negative.iter().map(|r| &r.tokens), params.top_n);

    let clouds = [
        ("总体评论词云", &all_keywords),
        ("好评词云", &good_keywords),
        ("差评词云", &bad_keywords),
    ];
    for (title, keywords) in clouds {
        let path = cloud_dir.join(format!("{}.png", title));
        match wordcloud::render(keywords, &path) {
            Ok(placed) => info!(
                "Word cloud saved - path={:?}, words={}/{}",
                path,
                placed,
                keywords.len()
            ),
            Err(e) => warn!("Word cloud failed - title={}, error={:#}", title, e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(score: i32, tokens: &[&str]) -> CleanReview {
        CleanReview {
            score,
            score_numeric: score,
            content: tokens.join(""),
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            date: None,
            hour: None,
            city: None,
            votes: "0".to_string(),
        }
    }

    #[test]
    fn partition_is_exhaustive_and_disjoint() {
        let records: Vec<CleanReview> = [10, 20, 30, 40, 50]
            .iter()
            .map(|&s| review(s, &["场面"]))
            .collect();
        let (positive, negative) = classify(&records, 30);
        assert_eq!(positive.len(), 3);
        assert_eq!(negative.len(), 2);
        assert_eq!(positive.len() + negative.len(), records.len());
        assert!(positive.iter().all(|r| r.score_numeric >= 30));
        assert!(negative.iter().all(|r| r.score_numeric < 30));
    }

    #[test]
    fn keyword_counts_sum_to_token_total() {
        let records = vec![
            review(40, &["场面", "震撼", "场面"]),
            review(50, &["震撼", "节奏"]),
        ];
        let keywords = extract_keywords(records.iter().map(|r| &r.tokens), 50);
        let total: usize = keywords.iter().map(|(_, n)| n).sum();
        assert_eq!(total, 5);
        assert_eq!(keywords[0], ("场面".to_string(), 2));
    }

    #[test]
    fn keywords_are_ordered_and_truncated() {
        let tokens = vec![
            "甲".repeat(2),
            "甲".repeat(2),
            "甲".repeat(2),
            "乙乙".to_string(),
            "乙乙".to_string(),
            "丙丙".to_string(),
        ];
        let keywords = extract_keywords(std::iter::once(&tokens), 2);
        assert_eq!(keywords.len(), 2);
        assert_eq!(keywords[0].1, 3);
        assert_eq!(keywords[1].1, 2);
    }

    #[test]
    fn empty_input_is_a_noop() {
        let dir = std::env::temp_dir().join("review_vibes_analyzer_empty");
        analyze(&[], &dir, &AnalyzerParams::default()).unwrap();
        assert!(!dir.join("wordclouds").exists());
    }

    #[test]
    fn single_sided_input_renders_nothing() {
        let dir = std::env::temp_dir().join("review_vibes_analyzer_one_sided");
        let records = vec![review(40, &["场面"]), review(50, &["节奏"])];
        analyze(&records, &dir, &AnalyzerParams::default()).unwrap();
        assert!(!dir.join("wordclouds").exists());
    }
}
