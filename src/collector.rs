// src/collector.rs
//
// Drives a WebDriver session over the review listing page: bounded wait for
// the list, scroll rounds to trigger lazy loading, per-item extraction with
// skip-and-continue, pagination until the next-page control goes disabled.
// Records accumulate in memory and are flushed once by the caller.

use anyhow::{Context, Result};
use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::json;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::models::RawReview;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

pub struct CrawlParams {
    pub subject_id: String,
    pub pages: usize,
    pub wait: Duration,         // bound on the review-list presence wait
    pub scroll_rounds: usize,   // scroll-to-bottom repetitions per page
    pub scroll_delay: Duration, // pause after each scroll
    pub page_delay: Duration,   // pause after activating the next page
}

impl CrawlParams {
    pub fn new(subject_id: &str, pages: usize) -> Self {
        Self {
            subject_id: subject_id.to_string(),
            pages,
            wait: Duration::from_secs(15),
            scroll_rounds: 3,
            scroll_delay: Duration::from_secs(2),
            page_delay: Duration::from_secs(3),
        }
    }
}

enum PageOutcome {
    Continue,
    LastPage,
}

/// Run a full collection pass. The session is closed on every exit path
/// before the outcome is propagated.
pub async fn collect(webdriver_url: &str, params: &CrawlParams) -> Result<Vec<RawReview>> {
    let start = std::time::Instant::now();
    let client = connect(webdriver_url).await?;
    info!("Browser session started - endpoint={}", webdriver_url);

    let outcome = crawl_pages(&client, params).await;

    if let Err(e) = client.close().await {
        warn!("Browser session close failed - error={}", e);
    }
    let records = outcome?;
    info!(
        "Collection completed - duration={:.2}s, records={}",
        start.elapsed().as_secs_f32(),
        records.len()
    );
    Ok(records)
}

async fn connect(webdriver_url: &str) -> Result<Client> {
    let mut caps = serde_json::map::Map::new();
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({
            "args": [
                "--headless",
                "--disable-gpu",
                format!("--user-agent={}", USER_AGENT),
            ]
        }),
    );
    ClientBuilder::native()
        .capabilities(caps)
        .connect(webdriver_url)
        .await
        .with_context(|| format!("connect to WebDriver at {}", webdriver_url))
}

async fn crawl_pages(client: &Client, params: &CrawlParams) -> Result<Vec<RawReview>> {
    let url = format!(
        "https://movie.douban.com/subject/{}/comments?status=P",
        params.subject_id
    );
    client.goto(&url).await.with_context(|| format!("open {}", url))?;
    sleep(Duration::from_secs(3)).await; // initial settle

    let mut records = Vec::new();
    for page in 0..params.pages {
        match crawl_page(client, params, &mut records).await {
            Ok(PageOutcome::Continue) => {
                info!("Page crawled - page={}, total_records={}", page + 1, records.len());
            }
            Ok(PageOutcome::LastPage) => {
                info!("Reached the last page - page={}", page + 1);
                break;
            }
            // best effort: a failed page is abandoned, not retried
            Err(e) => {
                warn!("Page crawl failed - page={}, error={:#}", page + 1, e);
                continue;
            }
        }
    }
    Ok(records)
}

async fn crawl_page(
    client: &Client,
    params: &CrawlParams,
    records: &mut Vec<RawReview>,
) -> Result<PageOutcome> {
    client
        .wait()
        .at_most(params.wait)
        .for_element(Locator::Css(".comment-item"))
        .await
        .context("review list did not appear within the wait bound")?;

    // trigger lazy loading the way a reader would
    for _ in 0..params.scroll_rounds {
        client
            .execute("window.scrollTo(0, document.body.scrollHeight);", vec![])
            .await
            .context("scroll to bottom")?;
        sleep(params.scroll_delay).await;
    }

    let items = client
        .find_all(Locator::Css(".comment-item"))
        .await
        .context("locate review items")?;
    for (i, item) in items.iter().enumerate() {
        match extract_review(item).await {
            Ok(review) => records.push(review),
            Err(e) => warn!("Review extraction failed - item={}, error={:#}", i + 1, e),
        }
    }

    let next = client
        .find(Locator::Css(".next"))
        .await
        .context("next-page control not found")?;
    let class = next.attr("class").await?.unwrap_or_default();
    if class.contains("disabled") {
        return Ok(PageOutcome::LastPage);
    }
    next.click().await.context("activate next page")?;
    sleep(params.page_delay).await;
    Ok(PageOutcome::Continue)
}

/// Visitor for one review item. Only `content`, `time` and `votes` are
/// required; a missing rating decodes to 0 and a missing location falls back
/// to the page's unknown sentinel.
async fn extract_review(item: &Element) -> Result<RawReview> {
    let score = match item.find(Locator::Css(".rating")).await {
        Ok(el) => decode_rating(el.attr("class").await?.as_deref()),
        Err(_) => 0,
    };

    let content = item
        .find(Locator::Css(".short"))
        .await
        .context("review text element missing")?
        .text()
        .await?
        .trim()
        .to_string();

    let time = item
        .find(Locator::Css(".comment-time"))
        .await
        .context("time element missing")?
        .text()
        .await?
        .trim()
        .to_string();

    let city = match item.find(Locator::Css(".comment-location")).await {
        Ok(el) => {
            let text = el.text().await?.trim().to_string();
            if text.is_empty() {
                "未知".to_string()
            } else {
                text
            }
        }
        Err(_) => "未知".to_string(),
    };

    let votes = item
        .find(Locator::Css(".votes"))
        .await
        .context("votes element missing")?
        .text()
        .await?
        .trim()
        .to_string();

    Ok(RawReview {
        score,
        content,
        time,
        city,
        votes,
    })
}

/// Decode the rating out of the element's class attribute. The page encodes
/// stars as `allstar<N>`, where N is either the star count (1..=5) or the
/// pre-scaled value (10..=50 in tens). Anything else decodes to 0.
pub fn decode_rating(class: Option<&str>) -> i32 {
    let Some(class) = class else { return 0 };
    for token in class.split_whitespace() {
        if let Some(digits) = token.strip_prefix("allstar") {
            return match digits.parse::<i32>() {
                Ok(n @ 1..=5) => n * 10,
                Ok(n) if (10..=50).contains(&n) && n % 10 == 0 => n,
                _ => 0,
            };
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_counts_scale_to_tens() {
        assert_eq!(decode_rating(Some("allstar4 rating")), 40);
        assert_eq!(decode_rating(Some("allstar1 rating")), 10);
    }

    #[test]
    fn prescaled_ratings_pass_through() {
        assert_eq!(decode_rating(Some("allstar50 rating")), 50);
        assert_eq!(decode_rating(Some("rating allstar30")), 30);
    }

    #[test]
    fn unexpected_class_shapes_decode_to_zero() {
        assert_eq!(decode_rating(None), 0);
        assert_eq!(decode_rating(Some("rating")), 0);
        assert_eq!(decode_rating(Some("allstar rating")), 0);
        assert_eq!(decode_rating(Some("allstar7 rating")), 0);
        assert_eq!(decode_rating(Some("allstar55 rating")), 0);
    }

    #[test]
    fn default_crawl_params_match_page_behavior() {
        let p = CrawlParams::new("26861685", 30);
        assert_eq!(p.wait, Duration::from_secs(15));
        assert_eq!(p.scroll_rounds, 3);
        assert_eq!(p.pages, 30);
    }
}
