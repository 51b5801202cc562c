// src/visualizer.rs
//
// Four independent views over the cleaned table: rating pie, daily trend,
// hourly bar and the province choropleth (delegated to geo). One failing
// chart never stops the others.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use plotters::prelude::*;
use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::geo;
use crate::models::CleanReview;

const BIN_LABELS: [&str; 5] = [
    "1星(10分)",
    "2星(20分)",
    "3星(30分)",
    "4星(40分)",
    "5星(50分)",
];

pub fn render_all(records: &[CleanReview], out_dir: &Path) -> Result<()> {
    if records.is_empty() {
        warn!("Visualization skipped - cleaned table is empty");
        return Ok(());
    }
    fs::create_dir_all(out_dir).with_context(|| format!("create {:?}", out_dir))?;

    let charts: [(&str, fn(&[CleanReview], &Path) -> Result<()>); 4] = [
        ("rating_pie_chart.png", render_rating_pie),
        ("comment_time_trend.png", render_time_trend),
        ("hourly_comment_distribution.png", render_hourly_bar),
        ("province_comment_map.html", render_province_map),
    ];
    for (file, render) in charts {
        let path = out_dir.join(file);
        match render(records, &path) {
            Ok(()) => info!("Chart saved - path={:?}", path),
            Err(e) => warn!("Chart failed - file={}, error={:#}", file, e),
        }
    }
    Ok(())
}

/// Bucket scores into 5 equal-width bins spanning the observed range. A
/// degenerate range (all scores equal) collapses into the first bin.
pub fn bin_scores(scores: &[i32]) -> [u64; 5] {
    let mut bins = [0u64; 5];
    let (Some(&min), Some(&max)) = (scores.iter().min(), scores.iter().max()) else {
        return bins;
    };
    let width = (max - min) as f64 / 5.0;
    for &s in scores {
        let idx = if width == 0.0 {
            0
        } else {
            (((s - min) as f64 / width) as usize).min(4)
        };
        bins[idx] += 1;
    }
    bins
}

/// Count records per hour over exactly 24 buckets, zero-filled.
pub fn hourly_counts(records: &[CleanReview]) -> [u64; 24] {
    let mut buckets = [0u64; 24];
    for r in records {
        if let Some(h) = r.hour {
            if (h as usize) < buckets.len() {
                buckets[h as usize] += 1;
            }
        }
    }
    buckets
}

/// Count records per date, chronologically ordered.
pub fn daily_counts(records: &[CleanReview]) -> BTreeMap<NaiveDate, u64> {
    let mut counts = BTreeMap::new();
    for r in records {
        if let Some(d) = r.date {
            *counts.entry(d).or_insert(0u64) += 1;
        }
    }
    counts
}

fn render_rating_pie(records: &[CleanReview], path: &Path) -> Result<()> {
    let scores: Vec<i32> = records.iter().map(|r| r.score_numeric).collect();
    let bins = bin_scores(&scores);
    let total: u64 = bins.iter().sum();
    if total == 0 {
        return Err(anyhow!("no scores to bin"));
    }

    let root = BitMapBackend::new(path, (800, 800)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| anyhow!("fill canvas: {}", e))?;
    root.draw(&Text::new(
        "豆瓣评分分布",
        (280, 20),
        ("sans-serif", 30).into_font(),
    ))
    .map_err(|e| anyhow!("draw title: {}", e))?;

    let (cx, cy, radius) = (400.0f64, 430.0f64, 240.0f64);
    let mut angle = 140.0 * PI / 180.0; // start angle, matches the original chart

    for (i, &count) in bins.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let frac = count as f64 / total as f64;
        let sweep = frac * 2.0 * PI;
        let mid = angle + sweep / 2.0;

        // the two highest rating bins are pulled out of the pie
        let explode = if i >= 3 { 24.0 } else { 0.0 };
        let (ox, oy) = (cx + explode * mid.cos(), cy + explode * mid.sin());

        let color = Palette99::pick(i).to_rgba();
        let mut points = vec![(ox as i32, oy as i32)];
        let steps = (sweep / 0.02).ceil().max(2.0) as usize;
        for s in 0..=steps {
            let a = angle + sweep * s as f64 / steps as f64;
            points.push((
                (ox + radius * a.cos()) as i32,
                (oy + radius * a.sin()) as i32,
            ));
        }
        root.draw(&Polygon::new(points, color.filled()))
            .map_err(|e| anyhow!("draw sector: {}", e))?;

        let label_r = radius + explode + 28.0;
        root.draw(&Text::new(
            BIN_LABELS[i],
            (
                (cx + label_r * mid.cos()) as i32 - 40,
                (cy + label_r * mid.sin()) as i32,
            ),
            ("sans-serif", 18).into_font(),
        ))
        .map_err(|e| anyhow!("draw label: {}", e))?;
        root.draw(&Text::new(
            format!("{:.2}%", frac * 100.0),
            (
                (ox + radius * 0.55 * mid.cos()) as i32 - 20,
                (oy + radius * 0.55 * mid.sin()) as i32,
            ),
            ("sans-serif", 16).into_font().color(&BLACK),
        ))
        .map_err(|e| anyhow!("draw percent: {}", e))?;

        angle += sweep;
    }

    root.present().map_err(|e| anyhow!("write {:?}: {}", path, e))?;
    Ok(())
}

fn render_time_trend(records: &[CleanReview], path: &Path) -> Result<()> {
    let counts = daily_counts(records);
    if counts.is_empty() {
        return Err(anyhow!("no dated records"));
    }
    let dates: Vec<NaiveDate> = counts.keys().copied().collect();
    let values: Vec<u64> = counts.values().copied().collect();
    let y_max = values.iter().copied().max().unwrap_or(1);
    let x_max = (dates.len() as u32).saturating_sub(1).max(1);

    let root = BitMapBackend::new(path, (1200, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| anyhow!("fill canvas: {}", e))?;

    let mut chart = ChartBuilder::on(&root)
        .caption("评论数量随时间变化趋势", ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(50)
        .build_cartesian_2d(0u32..x_max, 0u64..y_max + 1)
        .map_err(|e| anyhow!("build chart: {}", e))?;

    let date_labels = dates.clone();
    chart
        .configure_mesh()
        .x_desc("日期")
        .y_desc("评论数量")
        .x_label_formatter(&move |idx| {
            date_labels
                .get(*idx as usize)
                .map(|d| d.to_string())
                .unwrap_or_default()
        })
        .draw()
        .map_err(|e| anyhow!("draw mesh: {}", e))?;

    let points: Vec<(u32, u64)> = values
        .iter()
        .enumerate()
        .map(|(i, &v)| (i as u32, v))
        .collect();

    // shade the opening week (the first 7 distinct dates)
    let band: Vec<(u32, u64)> = points.iter().take(7).copied().collect();
    if band.len() > 1 {
        chart
            .draw_series(AreaSeries::new(band, 0u64, RED.mix(0.25)))
            .map_err(|e| anyhow!("draw band: {}", e))?;
    }

    chart
        .draw_series(LineSeries::new(points.clone(), &RED))
        .map_err(|e| anyhow!("draw line: {}", e))?;
    chart
        .draw_series(points.iter().map(|p| Circle::new(*p, 3, RED.filled())))
        .map_err(|e| anyhow!("draw markers: {}", e))?;

    root.present().map_err(|e| anyhow!("write {:?}: {}", path, e))?;
    Ok(())
}

fn render_hourly_bar(records: &[CleanReview], path: &Path) -> Result<()> {
    let buckets = hourly_counts(records);
    let y_max = buckets.iter().copied().max().unwrap_or(0).max(1);

    let root = BitMapBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| anyhow!("fill canvas: {}", e))?;

    let mut chart = ChartBuilder::on(&root)
        .caption("评论数量按小时分布", ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0u32..24u32, 0u64..y_max + 1)
        .map_err(|e| anyhow!("build chart: {}", e))?;

    chart
        .configure_mesh()
        .x_desc("小时")
        .y_desc("评论数量")
        .x_labels(24)
        .draw()
        .map_err(|e| anyhow!("draw mesh: {}", e))?;

    chart
        .draw_series(buckets.iter().enumerate().map(|(h, &count)| {
            Rectangle::new(
                [(h as u32, 0), (h as u32 + 1, count)],
                BLUE.mix(0.6).filled(),
            )
        }))
        .map_err(|e| anyhow!("draw bars: {}", e))?;

    root.present().map_err(|e| anyhow!("write {:?}: {}", path, e))?;
    Ok(())
}

fn render_province_map(records: &[CleanReview], path: &Path) -> Result<()> {
    let counts = geo::aggregate(records.iter().filter_map(|r| r.city.as_deref()));
    if counts.is_empty() {
        warn!("Province map skipped - no record carries a city");
        return Ok(());
    }
    geo::render_map(&counts, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(score: i32, date: Option<&str>, hour: Option<u32>) -> CleanReview {
        CleanReview {
            score,
            score_numeric: score,
            content: "还行".to_string(),
            tokens: vec!["还行".to_string()],
            date: date.and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
            hour,
            city: None,
            votes: "0".to_string(),
        }
    }

    #[test]
    fn five_equal_width_bins_over_observed_range() {
        let bins = bin_scores(&[10, 20, 30, 40, 50]);
        assert_eq!(bins, [1, 1, 1, 1, 1]);
        assert_eq!(bin_scores(&[10, 10, 50]), [2, 0, 0, 0, 1]);
    }

    #[test]
    fn degenerate_score_range_collapses_into_one_bin() {
        let bins = bin_scores(&[40, 40, 40]);
        assert_eq!(bins.iter().sum::<u64>(), 3);
        assert_eq!(bins[0], 3);
    }

    #[test]
    fn hourly_histogram_always_has_24_buckets() {
        let records = vec![
            review(40, None, Some(20)),
            review(30, None, Some(20)),
            review(20, None, Some(0)),
            review(10, None, None),
        ];
        let buckets = hourly_counts(&records);
        assert_eq!(buckets.len(), 24);
        assert_eq!(buckets[20], 2);
        assert_eq!(buckets[0], 1);
        assert_eq!(buckets.iter().sum::<u64>(), 3);
    }

    #[test]
    fn daily_counts_are_chronological() {
        let records = vec![
            review(40, Some("2018-02-18"), None),
            review(40, Some("2018-02-16"), None),
            review(40, Some("2018-02-16"), None),
        ];
        let counts = daily_counts(&records);
        let dates: Vec<_> = counts.keys().collect();
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(counts.values().copied().collect::<Vec<_>>(), vec![2, 1]);
    }

    #[test]
    fn empty_input_writes_nothing() {
        let dir = std::env::temp_dir().join("review_vibes_visualizer_empty");
        let _ = std::fs::remove_dir_all(&dir);
        render_all(&[], &dir).unwrap();
        assert!(!dir.exists());
    }
}
