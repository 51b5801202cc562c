// src/orchestrator.rs
//
// Thin driver over the four stages: collect (optional) -> clean -> analyze ->
// visualize. Every stage reads its input from disk and writes its output back
// to disk; a failure below stage level never aborts the run.

use anyhow::Result;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::analyzer::{self, AnalyzerParams};
use crate::cleaner::Cleaner;
use crate::collector::{self, CrawlParams};
use crate::storage;
use crate::visualizer;
use crate::Args;

pub async fn run_pipeline(args: &Args) -> Result<()> {
    let pipeline_start = Instant::now();
    info!(
        "Pipeline started - crawl={}, data_dir={:?}, output_dir={:?}",
        args.crawl, args.data_dir, args.output_dir
    );

    let raw_path = args.data_dir.join("raw_comments.csv");
    let clean_path = args.data_dir.join("cleaned_data.csv");

    // 1) collection (toggle)
    if args.crawl {
        let params = CrawlParams::new(&args.subject_id, args.pages);
        match collector::collect(&args.webdriver_url, &params).await {
            Ok(records) if records.is_empty() => {
                warn!("Collection produced no records - raw table left untouched");
            }
            Ok(records) => storage::save_raw(&raw_path, &records)?,
            // run on against whatever raw data already exists
            Err(e) => error!("Collection failed - error={:#}", e),
        }
    } else {
        info!("Collection skipped - reusing existing raw data");
    }

    // 2) cleaning
    let clean_start = Instant::now();
    if !raw_path.exists() {
        warn!("No raw table to process - path={:?}, run with --crawl first", raw_path);
        return Ok(());
    }
    let raw = storage::load_raw(&raw_path)?;
    if raw.is_empty() {
        warn!("Raw table is empty - nothing to process");
        return Ok(());
    }
    let cleaner = Cleaner::new(&args.data_dir)?;
    let cleaned = cleaner.run(&raw);
    if cleaned.is_empty() {
        warn!("No records survived cleaning - nothing to analyze");
        return Ok(());
    }
    storage::save_clean(&clean_path, &cleaned)?;
    info!(
        "Cleaning stage completed - duration={:.2}s, records={}",
        clean_start.elapsed().as_secs_f32(),
        cleaned.len()
    );

    // downstream stages read the cleaned table back from disk
    let cleaned = storage::load_clean(&clean_path)?;

    // 3) text analysis
    let analyze_start = Instant::now();
    analyzer::analyze(&cleaned, &args.output_dir, &AnalyzerParams::default())?;
    info!(
        "Analysis stage completed - duration={:.2}s",
        analyze_start.elapsed().as_secs_f32()
    );

    // 4) visualization
    let viz_start = Instant::now();
    visualizer::render_all(&cleaned, &args.output_dir)?;
    info!(
        "Visualization stage completed - duration={:.2}s",
        viz_start.elapsed().as_secs_f32()
    );

    info!(
        "Pipeline completed - duration={:.2}s, records={}",
        pipeline_start.elapsed().as_secs_f32(),
        cleaned.len()
    );
    Ok(())
}
