// src/storage.rs
//
// CSV interchange between pipeline stages. The raw table is written once at
// the end of a collection run; the cleaned table is rewritten on every run.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::models::{CleanReview, RawReview};

const CLEAN_HEADERS: [&str; 8] = [
    "score",
    "score_numeric",
    "content",
    "tokens",
    "date",
    "hour",
    "city",
    "votes",
];

pub fn save_raw(path: &Path, records: &[RawReview]) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {:?}", dir))?;
    }
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("create {:?}", path))?;
    for rec in records {
        wtr.serialize(rec)?;
    }
    wtr.flush()?;
    info!("Raw table saved - path={:?}, records={}", path, records.len());
    Ok(())
}

/// Load the raw table. Malformed score cells default to 0, short rows are
/// skipped with a warning rather than failing the load.
pub fn load_raw(path: &Path) -> Result<Vec<RawReview>> {
    let mut rdr = csv::Reader::from_path(path).with_context(|| format!("open {:?}", path))?;
    let mut out = Vec::new();
    for (i, row) in rdr.records().enumerate() {
        let row = match row {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping unreadable raw row - row={}, error={}", i + 1, e);
                continue;
            }
        };
        if row.len() < 5 {
            warn!("Skipping short raw row - row={}, fields={}", i + 1, row.len());
            continue;
        }
        out.push(RawReview {
            score: row[0].trim().parse().unwrap_or(0),
            content: row[1].to_string(),
            time: row[2].to_string(),
            city: row[3].to_string(),
            votes: row[4].to_string(),
        });
    }
    info!("Raw table loaded - path={:?}, records={}", path, out.len());
    Ok(out)
}

pub fn save_clean(path: &Path, records: &[CleanReview]) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {:?}", dir))?;
    }
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("create {:?}", path))?;
    wtr.write_record(CLEAN_HEADERS)?;
    for rec in records {
        // tokens travel as a JSON array so the list survives the flat file
        wtr.write_record([
            rec.score.to_string(),
            rec.score_numeric.to_string(),
            rec.content.clone(),
            serde_json::to_string(&rec.tokens)?,
            rec.date.map(|d| d.to_string()).unwrap_or_default(),
            rec.hour.map(|h| h.to_string()).unwrap_or_default(),
            rec.city.clone().unwrap_or_default(),
            rec.votes.clone(),
        ])?;
    }
    wtr.flush()?;
    info!("Cleaned table saved - path={:?}, records={}", path, records.len());
    Ok(())
}

pub fn load_clean(path: &Path) -> Result<Vec<CleanReview>> {
    let mut rdr = csv::Reader::from_path(path).with_context(|| format!("open {:?}", path))?;
    let mut out = Vec::new();
    for (i, row) in rdr.records().enumerate() {
        let row = row.with_context(|| format!("read cleaned row {}", i + 1))?;
        if row.len() < 8 {
            warn!("Skipping short cleaned row - row={}, fields={}", i + 1, row.len());
            continue;
        }
        let tokens: Vec<String> = match serde_json::from_str(&row[3]) {
            Ok(t) => t,
            Err(e) => {
                warn!("Skipping row with bad token column - row={}, error={}", i + 1, e);
                continue;
            }
        };
        out.push(CleanReview {
            score: row[0].trim().parse().unwrap_or(0),
            score_numeric: row[1].trim().parse().unwrap_or(0),
            content: row[2].to_string(),
            tokens,
            date: NaiveDate::parse_from_str(row[4].trim(), "%Y-%m-%d").ok(),
            hour: row[5].trim().parse().ok(),
            city: if row[6].is_empty() {
                None
            } else {
                Some(row[6].to_string())
            },
            votes: row[7].to_string(),
        });
    }
    debug!("Cleaned table loaded - path={:?}, records={}", path, out.len());
    Ok(out)
}
