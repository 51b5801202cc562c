use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A review exactly as extracted from the listing page, before any
/// normalization. One row per comment in the raw CSV.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawReview {
    pub score: i32,      // 10..=50, 0 when the rating element was absent
    pub content: String, // review text
    pub time: String,    // display string, e.g. "2018-02-16 20:31:43"
    pub city: String,    // free-text location, "未知" when missing
    pub votes: String,   // upvote display string
}

/// A review after field normalization, empty-content filtering and
/// tokenization. Invariant: `content` and `tokens` are non-empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanReview {
    pub score: i32,
    pub score_numeric: i32, // duplicate of `score`, kept for the cleaned table schema
    pub content: String,
    pub tokens: Vec<String>,
    pub date: Option<NaiveDate>,
    pub hour: Option<u32>, // 0..=23
    pub city: Option<String>,
    pub votes: String,
}
