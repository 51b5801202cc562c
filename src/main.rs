mod analyzer;
mod cleaner;
mod collector;
mod geo;
mod models;
mod orchestrator;
mod storage;
mod visualizer;
mod wordcloud;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Review Vibes - movie review scraper, sentiment grouping and chart renderer
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Re-crawl the review listing before processing (otherwise existing
    /// raw data is reused)
    #[arg(long)]
    pub crawl: bool,

    /// Douban subject id of the movie
    #[arg(long, default_value = "26861685")]
    pub subject_id: String,

    /// Number of listing pages to crawl (about 20 reviews per page)
    #[arg(long, default_value_t = 30)]
    pub pages: usize,

    /// Directory holding the raw/cleaned tables and optional dictionaries
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Output directory for rendered charts (default: "out")
    #[arg(short, long, default_value = "out")]
    pub output_dir: PathBuf,

    /// WebDriver endpoint the collector connects to
    #[arg(long, default_value = "http://localhost:9515")]
    pub webdriver_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();

    info!("Starting review_vibes");

    let args = Args::parse();
    orchestrator::run_pipeline(&args).await
}
