//! Work dispatcher: the public `Scraper` facade. Builds one unit per post,
//! subreddit or time window and runs them sequentially or on the worker pool.

use crate::concurrency::for_each_unit_limited;
use crate::config::{ScrapeOptions, SkipPolicy};
use crate::date::{format_datetime, Day, TimeWindow};
use crate::error::ProviderError;
use crate::fetch::{OutputLayout, PaginatedFetcher, WindowReport};
use crate::lists::{Blacklist, QueryParams};
use crate::partition::split_window;
use crate::progress::ProgressScope;
use crate::provider::ContentProvider;
use crate::scrape::{ItemScraper, ScrapeOutcome};
use crate::search::SearchIndex;
use crate::segment::{Segmenter, UnicodeSegmenter};
use crate::util::create_dir_all_with_backoff;
use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Totals for a whole run. Nothing here is fatal; the CLI decides what to do
/// with abandoned windows and failed items.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub units: usize,
    pub units_failed: usize,
    pub windows_abandoned: usize,
    pub items_written: usize,
    pub items_skipped: usize,
    pub items_failed: usize,
}

impl RunSummary {
    /// True when some content that should have been written was not.
    pub fn lost_data(&self) -> bool {
        self.units_failed > 0 || self.windows_abandoned > 0 || self.items_failed > 0
    }

    fn add_window(&mut self, w: &WindowReport) {
        self.items_written += w.written;
        self.items_skipped += w.skipped;
        self.items_failed += w.failed;
        if w.abandoned {
            self.windows_abandoned += 1;
        }
    }
}

#[derive(Clone, Debug)]
enum Unit {
    Post(String),
    Subreddit(String),
    Window(TimeWindow),
}

/// Entry point for library users.
///
/// ```no_run
/// # use std::sync::Arc;
/// # fn demo(provider: Arc<dyn threadscrape::ContentProvider>, index: Arc<dyn threadscrape::SearchIndex>) -> anyhow::Result<()> {
/// let summary = threadscrape::Scraper::new(provider, index)
///     .output_dir("./out")
///     .workers(4)
///     .attribution(true)
///     .scrape_subreddits(&["rust", "programming"], "2021-01-01".parse()?, "2021-01-31".parse()?)?;
/// println!("{} files written", summary.items_written);
/// # Ok(()) }
/// ```
#[derive(Clone)]
pub struct Scraper {
    provider: Arc<dyn ContentProvider>,
    index: Arc<dyn SearchIndex>,
    segmenter: Arc<dyn Segmenter>,
    blacklist: Arc<Blacklist>,
    output_dir: PathBuf,
    opts: ScrapeOptions,
}

impl Scraper {
    pub fn new(provider: Arc<dyn ContentProvider>, index: Arc<dyn SearchIndex>) -> Self {
        Self {
            provider,
            index,
            segmenter: Arc::new(UnicodeSegmenter),
            blacklist: Arc::new(Blacklist::new()),
            output_dir: PathBuf::from("."),
            opts: ScrapeOptions::default(),
        }
    }

    // -------- Builder methods --------
    pub fn output_dir(mut self, dir: impl AsRef<Path>) -> Self { self.output_dir = dir.as_ref().to_path_buf(); self }
    pub fn blacklist(mut self, bl: Blacklist) -> Self { self.blacklist = Arc::new(bl); self }
    pub fn segmenter(mut self, s: Arc<dyn Segmenter>) -> Self { self.segmenter = s; self }
    pub fn options(mut self, opts: ScrapeOptions) -> Self { self.opts = opts; self }
    pub fn skip_policy(mut self, skip: SkipPolicy) -> Self { self.opts = self.opts.with_skip_policy(skip); self }
    pub fn skip_deleted(mut self, yes: bool) -> Self { self.opts = self.opts.with_skip_deleted(yes); self }
    pub fn skip_removed(mut self, yes: bool) -> Self { self.opts = self.opts.with_skip_removed(yes); self }
    pub fn attribution(mut self, yes: bool) -> Self { self.opts = self.opts.with_attribution(yes); self }
    pub fn workers(mut self, n: usize) -> Self { self.opts = self.opts.with_workers(n); self }
    pub fn max_retries(mut self, n: usize) -> Self { self.opts = self.opts.with_max_retries(n); self }
    pub fn retry_delay(mut self, d: Duration) -> Self { self.opts = self.opts.with_retry_delay(d); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }

    // -------- Modes --------

    /// Scrape each post id straight into the output directory.
    pub fn scrape_posts<S: AsRef<str>>(&self, ids: &[S]) -> Result<RunSummary> {
        let units = ids.iter().map(|s| Unit::Post(s.as_ref().to_string())).collect();
        self.run(units, "Posts", &[])
    }

    /// One fetcher per subreddit over `[start 00:00, end 23:59]`, each writing into
    /// `<output>/<subreddit>/`.
    pub fn scrape_subreddits<S: AsRef<str>>(&self, names: &[S], start: Day, end: Day) -> Result<RunSummary> {
        let range = TimeWindow::from_days(start, end)?;
        let units = names.iter().map(|s| Unit::Subreddit(s.as_ref().to_string())).collect();
        self.run_in(units, "Subreddits", &[], Some(range))
    }

    /// Whole-index mode: split the range into one window per worker and write into
    /// `<output>/<date>/<subreddit>/`.
    pub fn scrape_corpus(&self, start: Day, end: Day, params: &QueryParams) -> Result<RunSummary> {
        let range = TimeWindow::from_days(start, end)?;
        let units = split_window(range, self.opts.workers).into_iter().map(Unit::Window).collect();
        self.run(units, "Windows", params)
    }

    // -------- Internals --------

    fn run(&self, units: Vec<Unit>, label: &str, params: &[(String, String)]) -> Result<RunSummary> {
        self.run_in(units, label, params, None)
    }

    fn run_in(
        &self,
        units: Vec<Unit>,
        label: &str,
        params: &[(String, String)],
        range: Option<TimeWindow>,
    ) -> Result<RunSummary> {
        create_dir_all_with_backoff(&self.output_dir, 16, 50)?;
        tracing::info!("Dispatching {} unit(s) on {} worker(s)", units.len(), self.opts.workers);

        let summary = Mutex::new(RunSummary { units: units.len(), ..Default::default() });
        let pb = ProgressScope::count(self.opts.progress, label, units.len() as u64);

        for_each_unit_limited(&units, self.opts.workers, |unit| {
            let outcome = self.run_unit(unit, params, range, &summary);
            pb.inc();
            match outcome {
                Ok(()) => Ok(()),
                Err(e) if is_fatal(&e) => Err(e),
                Err(e) => {
                    tracing::warn!("{:?} failed: {:#}", unit, e);
                    summary.lock().units_failed += 1;
                    Ok(())
                }
            }
        })?;

        pb.finish("done");
        let summary = summary.into_inner();
        tracing::info!(
            "Run finished: {} written, {} skipped, {} failed items, {} abandoned windows, {} failed units",
            summary.items_written,
            summary.items_skipped,
            summary.items_failed,
            summary.windows_abandoned,
            summary.units_failed
        );
        Ok(summary)
    }

    fn item_scraper(&self) -> ItemScraper<'_> {
        ItemScraper {
            provider: self.provider.as_ref(),
            segmenter: self.segmenter.as_ref(),
            blacklist: self.blacklist.as_ref(),
            opts: &self.opts,
        }
    }

    fn fetcher(&self) -> PaginatedFetcher<'_> {
        PaginatedFetcher { index: self.index.as_ref(), scraper: self.item_scraper(), opts: &self.opts }
    }

    fn run_unit(
        &self,
        unit: &Unit,
        params: &[(String, String)],
        range: Option<TimeWindow>,
        summary: &Mutex<RunSummary>,
    ) -> Result<()> {
        match unit {
            Unit::Post(id) => {
                let outcome = self.item_scraper().scrape(id, &self.output_dir, "");
                let mut s = summary.lock();
                match outcome {
                    Ok(ScrapeOutcome::Written { .. }) => s.items_written += 1,
                    Ok(ScrapeOutcome::Skipped) => s.items_skipped += 1,
                    Err(e) if is_fatal(&e) => return Err(e),
                    Err(e) => {
                        s.items_failed += 1;
                        tracing::warn!("Failed scraping submission {} due to {:#}", id, e);
                    }
                }
                Ok(())
            }
            Unit::Subreddit(name) => {
                let window = range.ok_or_else(|| anyhow!("subreddit mode needs a date range"))?;
                let dir = self.output_dir.join(name);
                create_dir_all_with_backoff(&dir, 16, 50)?;
                let filters = vec![("subreddit".to_string(), name.clone())];
                let report = self.fetcher().fetch(window, &filters, &OutputLayout::Flat(dir), &format!("r/{}", name))?;
                summary.lock().add_window(&report);
                Ok(())
            }
            Unit::Window(window) => {
                let layout = OutputLayout::ByDateAndSubreddit(self.output_dir.clone());
                let report = self.fetcher().fetch(*window, params, &layout, &format_datetime(window.start))?;
                summary.lock().add_window(&report);
                Ok(())
            }
        }
    }
}

fn is_fatal(e: &anyhow::Error) -> bool {
    e.downcast_ref::<ProviderError>().map_or(false, ProviderError::is_fatal)
}
