//! Paginated fetcher: walks a time window backwards through the search index,
//! one page at a time, scraping every item it returns.

use crate::config::ScrapeOptions;
use crate::date::{format_datetime, format_day, TimeWindow};
use crate::error::ProviderError;
use crate::scrape::{ItemScraper, ScrapeOutcome};
use crate::search::{Page, SearchIndex, SubmissionSummary};
use crate::util::create_dir_all_with_backoff;
use anyhow::Result;
use std::collections::HashSet;
use std::path::PathBuf;
use std::thread::sleep;

/// Where a fetched item's file goes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputLayout {
    /// Everything in one directory (subreddit mode).
    Flat(PathBuf),
    /// `<root>/<YYYY-MM-DD>/<subreddit>/` per item (corpus mode).
    ByDateAndSubreddit(PathBuf),
}

impl OutputLayout {
    fn dir_for(&self, s: &SubmissionSummary) -> Result<PathBuf> {
        match self {
            OutputLayout::Flat(dir) => Ok(dir.clone()),
            OutputLayout::ByDateAndSubreddit(root) => {
                let dir = root.join(format_day(s.created_utc)).join(&s.subreddit);
                create_dir_all_with_backoff(&dir, 16, 50)?;
                Ok(dir)
            }
        }
    }
}

/// Counters for one window, kept so silent losses are visible to the caller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WindowReport {
    pub pages: usize,
    pub items: usize,
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
    /// The index kept failing and the rest of the window was given up.
    pub abandoned: bool,
}

impl WindowReport {
    pub fn merge(&mut self, other: &WindowReport) {
        self.pages += other.pages;
        self.items += other.items;
        self.written += other.written;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.abandoned |= other.abandoned;
    }
}

pub struct PaginatedFetcher<'a> {
    pub index: &'a dyn SearchIndex,
    pub scraper: ItemScraper<'a>,
    pub opts: &'a ScrapeOptions,
}

impl<'a> PaginatedFetcher<'a> {
    /// Retrieve every item created in `(window.start, window.end]`.
    ///
    /// The cursor starts at `window.end` and moves down to the oldest timestamp of
    /// each page. Per-item failures are logged and counted; only a fatal provider
    /// error (authentication) is returned as `Err`.
    pub fn fetch(
        &self,
        window: TimeWindow,
        filters: &[(String, String)],
        layout: &OutputLayout,
        label: &str,
    ) -> Result<WindowReport> {
        tracing::info!("Scraping {} ({})...", label, window);
        let mut report = WindowReport::default();
        let mut cursor = window.end;
        // Ids already handled at the current cursor timestamp; the next page repeats them.
        let mut on_cursor: HashSet<String, ahash::RandomState> = HashSet::default();

        while cursor > window.start {
            let page = match self.fetch_page(window.start, cursor, filters, label) {
                Some(p) => p,
                None => {
                    report.abandoned = true;
                    return Ok(report);
                }
            };
            report.pages += 1;

            let (newest, oldest) = match (page.data.first(), page.data.last()) {
                (Some(n), Some(o)) => (n.created_utc, o.created_utc),
                _ => break,
            };

            for summary in &page.data {
                if summary.created_utc == cursor && on_cursor.contains(&summary.id) {
                    continue;
                }
                report.items += 1;
                match self.scrape_one(summary, layout) {
                    Ok(ScrapeOutcome::Written { .. }) => report.written += 1,
                    Ok(ScrapeOutcome::Skipped) => report.skipped += 1,
                    Err(e) => {
                        if e.downcast_ref::<ProviderError>().map_or(false, ProviderError::is_fatal) {
                            return Err(e.context(format!("{}: aborting at submission {}", label, summary.id)));
                        }
                        report.failed += 1;
                        tracing::warn!("{}: Failed scraping submission {} due to {:#}", label, summary.id, e);
                    }
                }
            }

            // A page whose oldest item sits on the cursor would otherwise be re-requested forever.
            if oldest < cursor {
                cursor = oldest;
                on_cursor = page.data.iter().filter(|s| s.created_utc == oldest).map(|s| s.id.clone()).collect();
            } else {
                cursor -= 1;
                on_cursor.clear();
            }

            tracing::info!(
                "Scraped {} from {} to {}.",
                label,
                format_datetime(oldest),
                format_datetime(newest)
            );
        }

        tracing::info!("Finished scraping {}.", label);
        Ok(report)
    }

    /// One page with bounded retries; `None` once every attempt has failed.
    fn fetch_page(&self, after: i64, before: i64, filters: &[(String, String)], label: &str) -> Option<Page> {
        let max = self.opts.max_retries.max(1);
        let mut last_err = None;
        for attempt in 1..=max {
            match self.index.query(after, before, self.opts.page_size, filters) {
                Ok(page) => return Some(page),
                Err(e) => {
                    tracing::info!("Failed scraping {}: tentative {} of {}", label, attempt, max);
                    last_err = Some(e);
                    if attempt < max {
                        sleep(self.opts.retry_delay);
                    }
                }
            }
        }
        if let Some(e) = last_err {
            tracing::warn!("Error while retrieving {}: {}", label, e);
        }
        None
    }

    fn scrape_one(&self, s: &SubmissionSummary, layout: &OutputLayout) -> Result<ScrapeOutcome> {
        let dir = layout.dir_for(s)?;
        self.scraper.scrape(&s.id, &dir, &format_day(s.created_utc))
    }
}
