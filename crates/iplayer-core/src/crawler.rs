//! Main iPlayer crawler API
//!
//! This module ties the HTTP client to the parsers: it discovers the series
//! of a program, crawls every series concurrently (following pagination
//! within each), and aggregates the episodes by series name.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use tokio::task::{Id, JoinSet};
use tracing::{debug, info, warn};
use url::Url;

use crate::client::{ClientConfig, IplayerClient};
use crate::error::{IplayerError, Result};
use crate::parser::episodes::PAGE_MARKER;
use crate::parser::series::SERIES_ID_MARKER;
use crate::parser::{parse_episode_page, parse_series_links};
use crate::types::{
    AllEpisodes, CrawlOptions, CrawlReport, Episode, SeriesFailure, SeriesUrlMap, ShowTitle,
    NO_SERIES,
};

/// What one series task reported back to the crawl.
#[derive(Debug)]
pub struct SeriesOutcome {
    /// Name the series was discovered under (`"none"` for single-series programs)
    pub discovered_as: String,
    /// Page the extraction started from
    pub url: String,
    /// Episodes found, or why the extraction failed
    pub result: Result<Vec<Episode>>,
}

/// Main crawler API for BBC iPlayer
///
/// All operations are asynchronous. Series are crawled concurrently on the
/// tokio runtime, one task per series.
///
/// # Example
/// ```no_run
/// use iplayer_core::{CrawlOptions, IplayerCrawler};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let crawler = IplayerCrawler::new()?;
///
///     let url = "https://www.bbc.co.uk/iplayer/episodes/b006q2x0/doctor-who";
///     let all = crawler.crawl(url, CrawlOptions::default()).await?;
///     for (series, episodes) in &all {
///         println!("{}: {} episodes", series, episodes.len());
///     }
///
///     Ok(())
/// }
/// ```
pub struct IplayerCrawler {
    client: Arc<IplayerClient>,
}

impl IplayerCrawler {
    /// Create a new crawler with default configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new crawler with a custom client configuration.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        Ok(Self::with_client(IplayerClient::with_config(config)?))
    }

    /// Create a new crawler around an existing client.
    pub fn with_client(client: IplayerClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Find the series pages of a program.
    ///
    /// # Arguments
    /// * `root_url` - Program landing page
    ///
    /// # Returns
    /// * `Ok(SeriesUrlMap)`, empty for a program without series navigation
    /// * `Err(IplayerError::SeriesConflict)` if a series name links to two pages
    pub async fn discover_series(&self, root_url: &str) -> Result<SeriesUrlMap> {
        let html = self.client.fetch(root_url).await?;
        let series = parse_series_links(&html, root_url, self.client.base_url().as_str())?;
        info!(url = root_url, count = series.len(), "discovered series");
        Ok(series)
    }

    /// Collect all episodes of one series, following its pagination.
    ///
    /// # Arguments
    /// * `series_url` - First page of the series listing
    /// * `options` - Which optional variants to keep
    ///
    /// # Returns
    /// * `Ok(Vec<Episode>)`, empty if the listing has no episodes
    /// * `Err(IplayerError)` if any page of the listing cannot be fetched
    pub async fn extract_episodes(
        &self,
        series_url: &str,
        options: CrawlOptions,
    ) -> Result<Vec<Episode>> {
        extract_series(&self.client, series_url, options).await
    }

    /// Crawl a program and return its episodes grouped by series.
    ///
    /// Any failure aborts the whole crawl: remaining series tasks are
    /// cancelled and the first error is returned.
    ///
    /// # Arguments
    /// * `page_url` - Any page of the program; pagination and series
    ///   suffixes are stripped first
    /// * `options` - Which optional variants to keep
    pub async fn crawl(&self, page_url: &str, options: CrawlOptions) -> Result<AllEpisodes> {
        let plan = self.plan(page_url).await?;
        let all = self.spawn_extractions(plan, options).drain_fail_fast().await?;

        info!(url = page_url, series = all.len(), "crawl finished");
        Ok(all)
    }

    /// Crawl a program, keeping the series that succeeded when others fail.
    ///
    /// Failing to fetch or read the program page itself is still an error.
    pub async fn crawl_report(&self, page_url: &str, options: CrawlOptions) -> Result<CrawlReport> {
        Ok(build_report(self.crawl_outcomes(page_url, options).await?))
    }

    /// Crawl a program and return every series task's outcome unmerged,
    /// in completion order.
    pub async fn crawl_outcomes(
        &self,
        page_url: &str,
        options: CrawlOptions,
    ) -> Result<Vec<SeriesOutcome>> {
        let plan = self.plan(page_url).await?;
        Ok(self.spawn_extractions(plan, options).drain_all().await)
    }

    /// Normalize the URL and decide which series pages to crawl.
    async fn plan(&self, page_url: &str) -> Result<SeriesUrlMap> {
        let root_url = normalize_program_url(page_url);
        let mut series = self.discover_series(&root_url).await?;
        if series.is_empty() {
            series.insert(NO_SERIES.to_string(), root_url);
        }
        Ok(series)
    }

    /// Start one extraction task per series.
    fn spawn_extractions(&self, series: SeriesUrlMap, options: CrawlOptions) -> SeriesTasks {
        let mut tasks = SeriesTasks::new();

        for (name, url) in series {
            let client = Arc::clone(&self.client);
            let seed = url.clone();
            tasks.spawn(name, url, async move {
                extract_series(&client, &seed, options).await
            });
        }

        tasks
    }
}

/// Running series extractions, keyed by task so every result, including a
/// panic, is reported under the series it belongs to.
struct SeriesTasks {
    set: JoinSet<Result<Vec<Episode>>>,
    series: HashMap<Id, (String, String)>,
}

impl SeriesTasks {
    fn new() -> Self {
        Self {
            set: JoinSet::new(),
            series: HashMap::new(),
        }
    }

    /// Start the extraction of one series.
    fn spawn<F>(&mut self, name: String, url: String, task: F)
    where
        F: Future<Output = Result<Vec<Episode>>> + Send + 'static,
    {
        let handle = self.set.spawn(task);
        self.series.insert(handle.id(), (name, url));
    }

    /// Wait for the next task to finish.
    ///
    /// Returns `None` once every task has reported. A task that panicked or
    /// was cancelled yields `IplayerError::TaskFailed`.
    async fn next(&mut self) -> Option<SeriesOutcome> {
        let (id, result) = match self.set.join_next_with_id().await? {
            Ok((id, result)) => (id, result),
            Err(e) => (e.id(), Err(IplayerError::TaskFailed(e.to_string()))),
        };
        let (discovered_as, url) = self.series.remove(&id).unwrap_or_default();

        match &result {
            Ok(episodes) => {
                info!(series = %discovered_as, episodes = episodes.len(), "series extracted")
            }
            Err(e) => warn!(series = %discovered_as, error = %e, "series extraction failed"),
        }

        Some(SeriesOutcome {
            discovered_as,
            url,
            result,
        })
    }

    /// Merge results as they arrive, stopping at the first failure.
    ///
    /// Dropping the set on failure aborts the tasks still running.
    async fn drain_fail_fast(mut self) -> Result<AllEpisodes> {
        let mut all = AllEpisodes::new();

        while let Some(outcome) = self.next().await {
            match outcome.result {
                Ok(episodes) => merge_series(&mut all, episodes),
                Err(e) => {
                    warn!(series = %outcome.discovered_as, error = %e, "aborting crawl");
                    return Err(e);
                }
            }
        }

        Ok(all)
    }

    /// Wait for every task, in completion order.
    async fn drain_all(mut self) -> Vec<SeriesOutcome> {
        let mut outcomes = Vec::with_capacity(self.set.len());
        while let Some(outcome) = self.next().await {
            outcomes.push(outcome);
        }
        outcomes
    }
}

/// Walk a series listing to a fixed point.
///
/// Pages are drained from a worklist that grows as pagination links are
/// found. Which unvisited page is fetched next is unspecified; only the
/// order of episodes within one page is preserved.
async fn extract_series(
    client: &IplayerClient,
    series_url: &str,
    options: CrawlOptions,
) -> Result<Vec<Episode>> {
    let show_title = ShowTitle::new();
    let base_url = client.base_url().as_str();

    let mut seen: HashSet<String> = HashSet::from([page_key(series_url)]);
    let mut frontier = vec![series_url.to_string()];
    let mut episodes = Vec::new();

    while let Some(page_url) = frontier.pop() {
        let html = client.fetch(&page_url).await?;
        let page = parse_episode_page(&html, &page_url, base_url, &options, &show_title)?;
        debug!(
            url = %page_url,
            episodes = page.episodes.len(),
            pages = page.pagination.len(),
            "scanned page"
        );

        for next in page.pagination {
            if seen.insert(page_key(&next)) {
                frontier.push(next);
            }
        }
        episodes.extend(page.episodes);
    }

    Ok(episodes)
}

/// Identity of a listing page in the seen-set.
///
/// `page=1` is the listing itself, so it is dropped from the query; every
/// other query pair is kept.
fn page_key(page_url: &str) -> String {
    let Ok(mut url) = Url::parse(page_url) else {
        return page_url.to_string();
    };
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .into_owned()
        .filter(|(key, value)| !(key == "page" && value == "1"))
        .collect();

    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
    url.to_string()
}

/// Split outcomes into merged episodes and failures.
fn build_report(outcomes: Vec<SeriesOutcome>) -> CrawlReport {
    let mut report = CrawlReport::default();

    for outcome in outcomes {
        match outcome.result {
            Ok(episodes) => merge_series(&mut report.episodes, episodes),
            Err(error) => report.failures.push(SeriesFailure {
                series: outcome.discovered_as,
                url: outcome.url,
                error,
            }),
        }
    }

    report
}

/// Add one series' episodes under the series name the episodes carry.
///
/// Empty sequences contribute nothing. Two branches reporting the same
/// name are concatenated.
fn merge_series(all: &mut AllEpisodes, episodes: Vec<Episode>) {
    let Some(first) = episodes.first() else {
        return;
    };
    let name = first.series_name.clone();
    all.entry(name).or_default().extend(episodes);
}

/// Merge task outcomes, failing on the first error.
///
/// # Returns
/// * `Ok(AllEpisodes)` keyed by the first episode's series name of each
///   non-empty outcome
/// * `Err(IplayerError)` from the first failed outcome
pub fn aggregate_outcomes(
    outcomes: impl IntoIterator<Item = SeriesOutcome>,
) -> Result<AllEpisodes> {
    let mut all = AllEpisodes::new();
    for outcome in outcomes {
        merge_series(&mut all, outcome.result?);
    }
    Ok(all)
}

/// Strip a trailing pagination or series-selection suffix.
///
/// # Examples
/// ```
/// use iplayer_core::normalize_program_url;
///
/// assert_eq!(normalize_program_url("https://site/prog?page=3"), "https://site/prog");
/// assert_eq!(normalize_program_url("https://site/prog?seriesId=9"), "https://site/prog");
/// assert_eq!(normalize_program_url("https://site/prog"), "https://site/prog");
/// ```
pub fn normalize_program_url(page_url: &str) -> String {
    let mut url = page_url.to_string();
    for marker in [PAGE_MARKER, SERIES_ID_MARKER] {
        if let Some(index) = url.rfind(marker) {
            url.truncate(index);
        }
    }
    url
}

/// Check that a URL points at BBC iPlayer.
///
/// # Errors
/// `IplayerError::InvalidUrl` if the URL does not parse, its host is not
/// on bbc.co.uk, or its path is not under iplayer.
pub fn validate_source_url(source_url: &str) -> Result<()> {
    let parsed = Url::parse(source_url)?;
    let on_bbc = parsed
        .host_str()
        .is_some_and(|host| host.contains("bbc.co.uk"));
    if !on_bbc || !parsed.path().contains("iplayer") {
        return Err(IplayerError::InvalidUrl(format!(
            "not a BBC iPlayer URL: {}",
            source_url
        )));
    }
    Ok(())
}
