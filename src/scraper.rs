//! Job board scraping over the public guest endpoints.
//!
//! The guest endpoints return server-rendered HTML fragments, so plain HTTP
//! plus CSS selectors is enough; no browser is involved.
//!
//! - search: `{base}/jobs-guest/jobs/api/seeMoreJobPostings/search?keywords=…&location=…&start=N`
//!   returns a list of job cards.
//! - description: `{base}/jobs-guest/jobs/api/jobPosting/{job_id}` returns
//!   the posting page with the description markup.
//!
//! Page fetching sits behind [`PageFetcher`] so parsing and pagination can
//! be exercised against canned HTML.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Node, Selector};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ScraperConfig;
use crate::models::JobListing;

const URN_PREFIX: &str = "urn:li:jobPosting:";

/// Fetches a page of HTML.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// [`PageFetcher`] over reqwest with browser-like headers.
pub struct HttpFetcher {
    client: reqwest::Client,
    max_retries: u32,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("en-US,en;q=0.5"),
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                warn!(url, attempt, "page fetch failed, retrying");
                tokio::time::sleep(delay).await;
            }

            let response = match self.client.get(url).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_err = Some(anyhow::anyhow!("HTTP request failed for {}: {}", url, e));
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                return response
                    .text()
                    .await
                    .context("Failed to read response body");
            }

            if status.as_u16() == 429 || status.is_server_error() {
                last_err = Some(anyhow::anyhow!("HTTP {} for {}", status, url));
                continue;
            }
            bail!("HTTP {} for {}", status, url);
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("fetch failed after retries: {}", url)))
    }
}

// ============ URLs ============

/// Search results URL for one page starting at result `start`.
pub fn search_url(base: &str, keywords: &str, location: &str, start: usize) -> Result<String> {
    let endpoint = format!(
        "{}/jobs-guest/jobs/api/seeMoreJobPostings/search",
        base.trim_end_matches('/')
    );
    let mut url =
        Url::parse(&endpoint).with_context(|| format!("invalid job board URL: {}", base))?;
    url.query_pairs_mut()
        .append_pair("keywords", keywords)
        .append_pair("location", location)
        .append_pair("start", &start.to_string());
    Ok(url.to_string())
}

/// Guest posting URL for `job_id`.
pub fn description_url(base: &str, job_id: &str) -> String {
    format!(
        "{}/jobs-guest/jobs/api/jobPosting/{}",
        base.trim_end_matches('/'),
        job_id
    )
}

/// Pull the job id out of a posting link.
///
/// Prefers the `currentJobId` query parameter, else the trailing digits of
/// the path segment after `/jobs/view/` (`rust-engineer-at-acme-3912345678`
/// or just `3912345678`).
pub fn job_id_from_url(link: &str) -> Option<String> {
    let url = Url::parse(link)
        .or_else(|_| Url::parse("https://www.linkedin.com").and_then(|b| b.join(link)))
        .ok()?;

    if let Some((_, id)) = url.query_pairs().find(|(k, _)| k == "currentJobId") {
        if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
            return Some(id.into_owned());
        }
    }

    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    let view = segments.iter().position(|s| *s == "view")?;
    let slug = segments.get(view + 1)?;
    trailing_digits(slug)
}

fn trailing_digits(s: &str) -> Option<String> {
    let digits: String = s
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

// ============ Parsing ============

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_text(card: ElementRef<'_>, css: &str) -> String {
    selector(css)
        .and_then(|s| card.select(&s).next().map(element_text))
        .unwrap_or_default()
}

/// Parse job cards from a search results page.
///
/// Cards without a title or link are skipped. The job id comes from the
/// card's `data-entity-urn`, falling back to the link.
pub fn parse_listings(html: &str) -> Vec<JobListing> {
    count_and_parse(html).1
}

/// Number of cards on the page (parseable or not) and the parsed listings.
fn count_and_parse(html: &str) -> (usize, Vec<JobListing>) {
    let document = Html::parse_fragment(html);
    let (Some(card_selector), Some(link_selector)) = (
        selector("div.base-search-card, div.job-search-card"),
        selector("a.base-card__full-link, a[href*='/jobs/view/']"),
    ) else {
        return (0, Vec::new());
    };

    let mut cards = 0;
    let mut listings = Vec::new();

    for card in document.select(&card_selector) {
        cards += 1;

        let title = first_text(card, ".base-search-card__title");
        let link = card
            .select(&link_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(clean_link)
            .unwrap_or_default();
        if title.is_empty() || link.is_empty() {
            debug!(title = %title, "skipping job card without title or link");
            continue;
        }

        let job_id = card
            .value()
            .attr("data-entity-urn")
            .and_then(|urn| urn.strip_prefix(URN_PREFIX))
            .map(str::to_string)
            .or_else(|| job_id_from_url(&link));
        let Some(job_id) = job_id else {
            debug!(link = %link, "skipping job card without job id");
            continue;
        };

        listings.push(JobListing {
            job_id,
            title,
            company: first_text(card, ".base-search-card__subtitle"),
            location: first_text(card, ".job-search-card__location"),
            url: link,
        });
    }

    (cards, listings)
}

/// Drop tracking query parameters from a posting link.
fn clean_link(href: &str) -> String {
    let href = href.trim();
    match Url::parse(href) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => href.split(['?', '#']).next().unwrap_or_default().to_string(),
    }
}

/// Extract the description text from a posting page.
///
/// Block elements become line breaks, list items get a `- ` prefix, the
/// "Show more / Show less" toggle is dropped and whitespace is normalized.
/// Returns `None` when the page has no description markup or it is empty.
pub fn parse_description(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let root = [
        ".description__text.description__text--rich",
        ".show-more-less-html__markup",
        ".description__text",
    ]
    .iter()
    .find_map(|css| {
        let s = selector(css)?;
        document.select(&s).next()
    })?;

    let mut raw = String::new();
    collect_text(root, &mut raw);
    let text = normalize_text(&raw);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn is_block(name: &str) -> bool {
    matches!(
        name,
        "p" | "div" | "section" | "article" | "ul" | "ol" | "li" | "br" | "h1" | "h2" | "h3"
            | "h4" | "h5" | "h6" | "tr" | "table"
    )
}

fn is_toggle(el: ElementRef<'_>) -> bool {
    let value = el.value();
    matches!(value.name(), "button" | "script" | "style" | "icon")
        || value
            .classes()
            .any(|c| c.starts_with("show-more-less-html__button") || c == "show-more-less-button")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                if is_toggle(child) {
                    continue;
                }
                let name = child.value().name();
                if is_block(name) {
                    out.push('\n');
                }
                if name == "li" {
                    out.push_str("- ");
                }
                collect_text(child, out);
                if is_block(name) {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

fn normalize_text(raw: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    for line in raw.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.eq_ignore_ascii_case("show more") || line.eq_ignore_ascii_case("show less") {
            continue;
        }
        let blank = line.is_empty();
        if blank && lines.last().map_or(true, |l| l.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

// ============ Job board ============

/// Search and describe postings on the configured job board.
pub struct JobBoard {
    fetcher: Box<dyn PageFetcher>,
    config: ScraperConfig,
}

impl JobBoard {
    /// A job board client fetching over HTTP.
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        Ok(Self::with_fetcher(config, Box::new(HttpFetcher::new(config)?)))
    }

    pub fn with_fetcher(config: &ScraperConfig, fetcher: Box<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            config: config.clone(),
        }
    }

    /// Collect up to `limit` listings for `keywords` in `location`.
    ///
    /// Pages are requested from `start=0`, advancing by the number of cards
    /// each page returned. Paging stops once `limit` listings are collected,
    /// a page comes back empty or adds nothing new, or `max_pages` pages
    /// were read. Duplicate job ids are dropped. `on_page` is called with
    /// the 1-based page number and the running listing count.
    pub async fn search<F>(
        &self,
        keywords: &str,
        location: &str,
        limit: usize,
        mut on_page: F,
    ) -> Result<Vec<JobListing>>
    where
        F: FnMut(usize, usize) + Send,
    {
        if keywords.trim().is_empty() {
            bail!("search keywords are empty");
        }

        let mut listings: Vec<JobListing> = Vec::new();
        let mut seen = HashSet::new();
        let mut start = 0;

        for page in 1..=self.config.max_pages {
            if listings.len() >= limit {
                break;
            }
            if page > 1 && self.config.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.delay_ms)).await;
            }

            let url = search_url(&self.config.base_url, keywords, location, start)?;
            let html = match self.fetcher.fetch(&url).await {
                Ok(html) => html,
                Err(e) if page == 1 => return Err(e.context("fetching first search page")),
                Err(e) => {
                    warn!(page, error = %e, "search page failed, keeping earlier results");
                    break;
                }
            };

            let (cards, parsed) = count_and_parse(&html);
            let before = listings.len();
            for listing in parsed {
                if seen.insert(listing.job_id.clone()) {
                    listings.push(listing);
                }
            }
            debug!(page, cards, new = listings.len() - before, "search page parsed");
            on_page(page, listings.len().min(limit));

            if cards == 0 || listings.len() == before {
                break;
            }
            start += cards;
        }

        listings.truncate(limit);
        info!(
            keywords,
            location,
            found = listings.len(),
            "job search complete"
        );
        Ok(listings)
    }

    /// Fetch the description for a job id or posting URL.
    pub async fn describe(&self, job: &str) -> Result<String> {
        let job = job.trim();
        let job_id = if !job.is_empty() && job.chars().all(|c| c.is_ascii_digit()) {
            job.to_string()
        } else {
            job_id_from_url(job)
                .with_context(|| format!("not a job id or posting URL: {}", job))?
        };

        let url = description_url(&self.config.base_url, &job_id);
        let html = self
            .fetcher
            .fetch(&url)
            .await
            .with_context(|| format!("fetching description for job {}", job_id))?;
        parse_description(&html).with_context(|| format!("no description found for job {}", job_id))
    }
}

// ============ CSV export ============

#[derive(Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Job Title")]
    title: &'a str,
    #[serde(rename = "Job Post Url")]
    url: &'a str,
    #[serde(rename = "Company Name")]
    company: &'a str,
    #[serde(rename = "Location")]
    location: &'a str,
    #[serde(rename = "Job ID")]
    job_id: &'a str,
}

/// Write listings as CSV, one row per listing.
pub fn export_listings_csv(listings: &[JobListing], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    if listings.is_empty() {
        writer.write_record(["Job Title", "Job Post Url", "Company Name", "Location", "Job ID"])?;
    }
    for l in listings {
        writer.serialize(CsvRow {
            title: &l.title,
            url: &l.url,
            company: &l.company,
            location: &l.location,
            job_id: &l.job_id,
        })?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn card(id: u64, title: &str) -> String {
        format!(
            r##"<li><div class="base-card base-search-card job-search-card" data-entity-urn="urn:li:jobPosting:{id}">
  <a class="base-card__full-link" href="https://www.linkedin.com/jobs/view/{slug}-{id}?position=1&amp;refId=abc"><span class="sr-only">{title}</span></a>
  <div class="base-search-card__info">
    <h3 class="base-search-card__title">
      {title}
    </h3>
    <h4 class="base-search-card__subtitle"><a class="hidden-nested-link" href="#">Acme</a></h4>
    <div class="base-search-card__metadata"><span class="job-search-card__location">Berlin, Germany</span></div>
  </div>
</div></li>"##,
            slug = title.to_lowercase().replace(' ', "-"),
        )
    }

    /// Serves canned pages keyed by the `start` parameter; other pages are empty.
    struct CannedFetcher {
        pages: HashMap<usize, String>,
        requested: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PageFetcher for CannedFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.requested.lock().unwrap().push(url.to_string());
            let start: usize = Url::parse(url)?
                .query_pairs()
                .find(|(k, _)| k == "start")
                .and_then(|(_, v)| v.parse().ok())
                .unwrap_or(0);
            Ok(self.pages.get(&start).cloned().unwrap_or_default())
        }
    }

    fn test_config() -> ScraperConfig {
        ScraperConfig {
            delay_ms: 0,
            ..Default::default()
        }
    }

    #[test]
    fn parses_job_cards() {
        let html = format!("{}{}", card(3912345678, "Rust Engineer"), card(42, "SRE"));
        let listings = parse_listings(&html);
        assert_eq!(listings.len(), 2);
        let first = &listings[0];
        assert_eq!(first.job_id, "3912345678");
        assert_eq!(first.title, "Rust Engineer");
        assert_eq!(first.company, "Acme");
        assert_eq!(first.location, "Berlin, Germany");
        assert_eq!(
            first.url,
            "https://www.linkedin.com/jobs/view/rust-engineer-3912345678"
        );
    }

    #[test]
    fn cards_without_title_are_skipped() {
        let broken = r#"<div class="base-search-card" data-entity-urn="urn:li:jobPosting:7">
            <a class="base-card__full-link" href="https://www.linkedin.com/jobs/view/7"></a></div>"#;
        let html = format!("{}{}", broken, card(8, "Platform Engineer"));
        let (cards, listings) = count_and_parse(&html);
        assert_eq!(cards, 2);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].job_id, "8");
    }

    #[test]
    fn job_id_from_various_links() {
        assert_eq!(
            job_id_from_url("https://www.linkedin.com/jobs/view/rust-dev-at-acme-3912345678/?refId=x"),
            Some("3912345678".to_string())
        );
        assert_eq!(
            job_id_from_url("https://www.linkedin.com/jobs/view/3912345678"),
            Some("3912345678".to_string())
        );
        assert_eq!(
            job_id_from_url("https://www.linkedin.com/jobs/search/?currentJobId=555&keywords=rust"),
            Some("555".to_string())
        );
        assert_eq!(job_id_from_url("/jobs/view/99"), Some("99".to_string()));
        assert_eq!(job_id_from_url("https://example.com/careers"), None);
    }

    #[test]
    fn search_url_is_encoded() {
        let url = search_url("https://www.linkedin.com", "rust engineer", "Berlin, Germany", 25)
            .unwrap();
        assert_eq!(
            url,
            "https://www.linkedin.com/jobs-guest/jobs/api/seeMoreJobPostings/search?keywords=rust+engineer&location=Berlin%2C+Germany&start=25"
        );
        assert_eq!(
            description_url("http://127.0.0.1:8080/", "42"),
            "http://127.0.0.1:8080/jobs-guest/jobs/api/jobPosting/42"
        );
    }

    #[test]
    fn description_text_is_cleaned() {
        let html = r#"<html><body>
<div class="description__text description__text--rich">
  <section class="show-more-less-html">
    <div class="show-more-less-html__markup">
      <strong>About the role</strong><br><br>
      We build   <em>fast</em> systems.
      <ul><li>Rust</li><li>Tokio &amp; async</li></ul>
      <p></p><p></p>
    </div>
    <button class="show-more-less-html__button show-more-less-button">
      Show more
    </button>
  </section>
</div></body></html>"#;
        let text = parse_description(html).unwrap();
        assert_eq!(
            text,
            "About the role\n\nWe build fast systems.\n\n- Rust\n\n- Tokio & async"
        );
    }

    #[test]
    fn missing_description_is_none() {
        assert!(parse_description("<html><body><p>nothing</p></body></html>").is_none());
        assert!(parse_description(
            r#"<div class="show-more-less-html__markup">   </div>"#
        )
        .is_none());
    }

    #[tokio::test]
    async fn search_paginates_and_dedups() {
        let page0 = (1..=10).map(|i| card(i, "Rust Engineer")).collect::<String>();
        // Second page repeats two ids from the first.
        let page1 = (9..=15).map(|i| card(i, "Rust Engineer")).collect::<String>();
        let pages = HashMap::from([(0, page0), (10, page1)]);
        let fetcher = CannedFetcher {
            pages,
            requested: Mutex::new(Vec::new()),
        };
        let board = JobBoard::with_fetcher(&test_config(), Box::new(fetcher));

        let mut seen_pages = Vec::new();
        let listings = board
            .search("rust", "Berlin", 100, |page, found| seen_pages.push((page, found)))
            .await
            .unwrap();

        assert_eq!(listings.len(), 15);
        let ids: HashSet<_> = listings.iter().map(|l| l.job_id.clone()).collect();
        assert_eq!(ids.len(), 15);
        // Third request (start=17) returns an empty page and stops the search.
        assert_eq!(seen_pages, vec![(1, 10), (2, 15), (3, 15)]);
    }

    #[tokio::test]
    async fn search_stops_at_limit() {
        let page0 = (1..=10).map(|i| card(i, "Dev")).collect::<String>();
        let fetcher = CannedFetcher {
            pages: HashMap::from([(0, page0)]),
            requested: Mutex::new(Vec::new()),
        };
        let board = JobBoard::with_fetcher(&test_config(), Box::new(fetcher));
        let listings = board.search("dev", "", 4, |_, _| {}).await.unwrap();
        assert_eq!(listings.len(), 4);
        assert_eq!(listings[0].job_id, "1");
    }

    /// Answers each search page through a closure over its `start` offset.
    struct StartFetcher<F>(F);

    #[async_trait]
    impl<F> PageFetcher for StartFetcher<F>
    where
        F: Fn(usize) -> Result<String> + Send + Sync,
    {
        async fn fetch(&self, url: &str) -> Result<String> {
            let start = Url::parse(url)?
                .query_pairs()
                .find(|(k, _)| k == "start")
                .and_then(|(_, v)| v.parse().ok())
                .unwrap_or(0);
            (self.0)(start)
        }
    }

    #[tokio::test]
    async fn first_page_failure_is_an_error() {
        let fetcher = StartFetcher(|_: usize| -> Result<String> { bail!("connection reset") });
        let board = JobBoard::with_fetcher(&test_config(), Box::new(fetcher));

        let err = board.search("rust", "Berlin", 10, |_, _| {}).await.unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("fetching first search page"), "{}", message);
        assert!(message.contains("connection reset"), "{}", message);
    }

    #[tokio::test]
    async fn later_page_failure_keeps_earlier_listings() {
        let page0 = (1..=5).map(|i| card(i, "Dev")).collect::<String>();
        let fetcher = StartFetcher(move |start: usize| -> Result<String> {
            match start {
                0 => Ok(page0.clone()),
                _ => bail!("HTTP 500"),
            }
        });
        let board = JobBoard::with_fetcher(&test_config(), Box::new(fetcher));

        let listings = board.search("dev", "", 50, |_, _| {}).await.unwrap();
        let ids: Vec<_> = listings.iter().map(|l| l.job_id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3", "4", "5"]);
    }

    #[tokio::test]
    async fn board_ignoring_start_stops_after_repeat() {
        let calls = Arc::new(AtomicUsize::new(0));
        let page = (1..=10).map(|i| card(i, "Dev")).collect::<String>();
        let counter = calls.clone();
        let fetcher = StartFetcher(move |_: usize| -> Result<String> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(page.clone())
        });
        let board = JobBoard::with_fetcher(&test_config(), Box::new(fetcher));

        let listings = board.search("dev", "", 100, |_, _| {}).await.unwrap();
        assert_eq!(listings.len(), 10);
        let ids: HashSet<_> = listings.iter().map(|l| l.job_id.clone()).collect();
        assert_eq!(ids.len(), 10);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn blank_keywords_fetch_nothing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let fetcher = StartFetcher(move |_: usize| -> Result<String> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(String::new())
        });
        let board = JobBoard::with_fetcher(&test_config(), Box::new(fetcher));

        let err = board.search("  ", "Berlin", 10, |_, _| {}).await.unwrap_err();
        assert!(err.to_string().contains("keywords are empty"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn describe_accepts_id_or_url() {
        struct DescriptionFetcher;

        #[async_trait]
        impl PageFetcher for DescriptionFetcher {
            async fn fetch(&self, url: &str) -> Result<String> {
                assert!(url.ends_with("/jobs-guest/jobs/api/jobPosting/77"));
                Ok(r#"<div class="show-more-less-html__markup">Ship Rust.</div>"#.to_string())
            }
        }

        let board = JobBoard::with_fetcher(&test_config(), Box::new(DescriptionFetcher));
        assert_eq!(board.describe("77").await.unwrap(), "Ship Rust.");
        assert_eq!(
            board
                .describe("https://www.linkedin.com/jobs/view/rust-77")
                .await
                .unwrap(),
            "Ship Rust."
        );
        assert!(board.describe("not a job").await.is_err());
    }

    #[test]
    fn csv_export_has_original_columns() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("listings.csv");
        let listings = parse_listings(&card(5, "Rust Engineer"));
        export_listings_csv(&listings, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Job Title,Job Post Url,Company Name,Location,Job ID"
        );
        assert_eq!(
            lines.next().unwrap(),
            "Rust Engineer,https://www.linkedin.com/jobs/view/rust-engineer-5,Acme,\"Berlin, Germany\",5"
        );
    }
}
