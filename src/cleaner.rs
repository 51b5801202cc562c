// src/cleaner.rs
//
// Raw table -> cleaned table: field normalization, empty-content filtering,
// jieba segmentation with stopword and single-character removal.

use anyhow::Result;
use chrono::NaiveDate;
use jieba_rs::Jieba;
use regex::Regex;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::models::{CleanReview, RawReview};

/// Location sentinel the listing page shows when a reviewer has no profile city.
const UNKNOWN_CITY: &str = "未知";

/// Movie-domain terms that dominate every review without carrying signal.
const BASE_STOPWORDS: [&str; 29] = [
    "红海", "行动", "电影", "这部", "片子", "一个", "的", "了", "是", "我", "有", "看", "觉得",
    "这个", "非常", "很", "也", "就", "都", "还", "没有", "说", "要", "去", "你", "会", "着",
    "不是", "什么",
];

pub struct Cleaner {
    jieba: Jieba,
    stopwords: HashSet<String>,
    date_re: Regex,
    hour_re: Regex,
}

impl Cleaner {
    /// Build the segmenter and the stopword set once for the whole stage.
    /// `data_dir` may hold `military_words.txt` (domain dictionary for the
    /// segmenter) and `stopwords.txt` (one extra stopword per line); both are
    /// optional.
    pub fn new(data_dir: &Path) -> Result<Self> {
        let mut jieba = Jieba::new();

        let dict_path = data_dir.join("military_words.txt");
        match File::open(&dict_path) {
            Ok(f) => {
                let mut reader = BufReader::new(f);
                match jieba.load_dict(&mut reader) {
                    Ok(()) => debug!("Domain dictionary loaded - path={:?}", dict_path),
                    Err(e) => warn!("Domain dictionary unusable - path={:?}, error={}", dict_path, e),
                }
            }
            Err(_) => warn!("Domain dictionary missing - path={:?}", dict_path),
        }

        let mut stopwords: HashSet<String> =
            BASE_STOPWORDS.iter().map(|s| s.to_string()).collect();
        let stop_path = data_dir.join("stopwords.txt");
        if let Ok(f) = File::open(&stop_path) {
            let before = stopwords.len();
            for line in BufReader::new(f).lines() {
                let line = line.unwrap_or_default();
                let term = line.trim();
                if !term.is_empty() {
                    stopwords.insert(term.to_string());
                }
            }
            debug!(
                "Extra stopwords loaded - path={:?}, added={}",
                stop_path,
                stopwords.len() - before
            );
        }

        Ok(Self {
            jieba,
            stopwords,
            date_re: Regex::new(r"\d{4}-\d{1,2}-\d{1,2}")?,
            hour_re: Regex::new(r"(\d{1,2}):\d{1,2}")?,
        })
    }

    /// Strip bracket characters and map the unknown sentinel to None.
    pub fn normalize_city(&self, raw: &str) -> Option<String> {
        let city: String = raw.chars().filter(|c| *c != '[' && *c != ']').collect();
        let city = city.trim().to_string();
        if city.is_empty() || city == UNKNOWN_CITY {
            None
        } else {
            Some(city)
        }
    }

    /// First `YYYY-M-D` match in the raw time string.
    pub fn extract_date(&self, time: &str) -> Option<NaiveDate> {
        let m = self.date_re.find(time)?;
        NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d").ok()
    }

    /// Hour component of the first `H:MM` match; values >= 24 are rejected.
    pub fn extract_hour(&self, time: &str) -> Option<u32> {
        let caps = self.hour_re.captures(time)?;
        let hour: u32 = caps[1].parse().ok()?;
        (hour < 24).then_some(hour)
    }

    /// Segment `content` and keep tokens that are neither stopwords nor
    /// single characters.
    pub fn tokenize(&self, content: &str) -> Vec<String> {
        self.jieba
            .cut(content, false)
            .into_iter()
            .filter(|w| w.chars().count() > 1 && !self.stopwords.contains(*w))
            .map(|w| w.to_string())
            .collect()
    }

    /// One raw record -> cleaned record, or None when the row is dropped
    /// (empty content, or nothing survives tokenization).
    pub fn clean_record(&self, raw: &RawReview) -> Option<CleanReview> {
        let content = raw.content.trim();
        if content.is_empty() {
            return None;
        }
        let tokens = self.tokenize(content);
        if tokens.is_empty() {
            return None;
        }
        Some(CleanReview {
            score: raw.score,
            score_numeric: raw.score,
            content: content.to_string(),
            tokens,
            date: self.extract_date(&raw.time),
            hour: self.extract_hour(&raw.time),
            city: self.normalize_city(&raw.city),
            votes: raw.votes.clone(),
        })
    }

    pub fn run(&self, raw: &[RawReview]) -> Vec<CleanReview> {
        let cleaned: Vec<CleanReview> = raw.iter().filter_map(|r| self.clean_record(r)).collect();
        info!(
            "Cleaning completed - input={}, retained={}, dropped={}",
            raw.len(),
            cleaned.len(),
            raw.len() - cleaned.len()
        );
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn cleaner() -> Cleaner {
        // point at a directory without the optional files; both are tolerated
        Cleaner::new(&PathBuf::from(std::env::temp_dir())).unwrap()
    }

    fn raw(score: i32, content: &str) -> RawReview {
        RawReview {
            score,
            content: content.to_string(),
            time: "2018-02-16 20:31:43".to_string(),
            city: "北京".to_string(),
            votes: "12".to_string(),
        }
    }

    #[test]
    fn date_and_hour_extraction() {
        let c = cleaner();
        assert_eq!(
            c.extract_date("2018-02-16 20:31:43"),
            NaiveDate::from_ymd_opt(2018, 2, 16)
        );
        assert_eq!(
            c.extract_date("发表于 2018-3-5 早上"),
            NaiveDate::from_ymd_opt(2018, 3, 5)
        );
        assert_eq!(c.extract_date("昨天"), None);

        assert_eq!(c.extract_hour("2018-02-16 20:31:43"), Some(20));
        assert_eq!(c.extract_hour("9:05"), Some(9));
        assert_eq!(c.extract_hour("99:05"), None);
        assert_eq!(c.extract_hour("2018-02-16"), None);
    }

    #[test]
    fn city_normalization() {
        let c = cleaner();
        assert_eq!(c.normalize_city("[上海]"), Some("上海".to_string()));
        assert_eq!(c.normalize_city("未知"), None);
        assert_eq!(c.normalize_city(""), None);
    }

    #[test]
    fn tokens_exclude_stopwords_and_single_chars() {
        let c = cleaner();
        let tokens = c.tokenize("这部电影的战斗场面真实又震撼");
        assert!(!tokens.is_empty());
        for t in &tokens {
            assert!(t.chars().count() > 1, "single-char token survived: {}", t);
            assert!(!c.stopwords.contains(t), "stopword survived: {}", t);
        }
    }

    #[test]
    fn tokenization_is_deterministic() {
        let c = cleaner();
        let text = "军舰和直升机的协同作战拍得很有张力";
        assert_eq!(c.tokenize(text), c.tokenize(text));
    }

    #[test]
    fn empty_content_rows_are_dropped() {
        let c = cleaner();
        let rows = vec![
            raw(40, "战斗场面震撼"),
            raw(20, ""),
            raw(50, "节奏紧凑剧情在线"),
        ];
        let cleaned = c.run(&rows);
        assert_eq!(cleaned.len(), 2);
        for rec in &cleaned {
            assert!(!rec.content.is_empty());
            assert!(!rec.tokens.is_empty());
            assert_eq!(rec.score, rec.score_numeric);
            assert!(rec.score >= 0);
        }
    }

    #[test]
    fn all_stopword_content_is_dropped() {
        let c = cleaner();
        // every surviving token would be a stopword or a single character
        assert!(c.clean_record(&raw(30, "的了是我")).is_none());
    }
}
