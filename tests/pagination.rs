#[path = "common/mod.rs"]
mod common;

use common::*;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use threadscrape::{Day, ScrapeOptions, Scraper};

fn day(s: &str) -> Day {
    s.parse().unwrap()
}

fn opts(page_size: usize) -> ScrapeOptions {
    ScrapeOptions::default().with_page_size(page_size).with_retry_delay(Duration::ZERO)
}

fn assert_non_increasing(cursors: &[i64]) {
    for pair in cursors.windows(2) {
        assert!(pair[1] <= pair[0], "cursor went up: {:?}", cursors);
    }
}

/// Walks a subreddit whose items span several pages:
/// - 95 items, one per second, on 2021-03-01; pages of 10.
/// Outcome: every item written once into `<out>/rust/`, and the `before` cursor
/// never goes up from one query to the next.
#[test]
fn cursor_walks_down_and_covers_every_item() {
    let out = tempdir().unwrap();
    let base = day("2021-03-01").start_timestamp();
    let items: Vec<_> = (0..95).map(|i| summary(&format!("s{}", i), base + 100 + i, "rust")).collect();
    let index = Arc::new(FakeIndex::new(items.clone()));
    let provider = Arc::new(FakeProvider::new().with_posts_for(&items));

    let summary = Scraper::new(provider.clone(), index.clone())
        .output_dir(out.path())
        .options(opts(10))
        .scrape_subreddits(&["rust"], day("2021-03-01"), day("2021-03-01"))
        .unwrap();

    assert_eq!(summary.items_written, 95);
    assert_eq!(summary.items_failed, 0);
    assert_eq!(txt_files(&out.path().join("rust")).len(), 95);
    assert_eq!(provider.calls().len(), 95, "boundary items must not be scraped twice");
    let cursors = index.cursors();
    assert_eq!(cursors[0], day("2021-03-01").end_timestamp());
    assert_non_increasing(&cursors);
}

/// A page shorter than the limit is followed by at most a couple of queries
/// before the loop stops; it never spins.
#[test]
fn short_page_terminates() {
    let out = tempdir().unwrap();
    let base = day("2021-03-01").start_timestamp();
    let items = vec![summary("a", base + 10, "rust"), summary("b", base + 20, "rust"), summary("c", base + 30, "rust")];
    let index = Arc::new(FakeIndex::new(items.clone()));
    let provider = Arc::new(FakeProvider::new().with_posts_for(&items));

    let summary = Scraper::new(provider, index.clone())
        .output_dir(out.path())
        .options(opts(500))
        .scrape_subreddits(&["rust"], day("2021-03-01"), day("2021-03-01"))
        .unwrap();

    assert_eq!(summary.items_written, 3);
    assert!(index.query_count() <= 3, "too many queries: {}", index.query_count());
    assert_non_increasing(&index.cursors());
}

/// Every item of a full page shares one timestamp, so the oldest item cannot move
/// the cursor on its own. The loop still steps past that second and terminates.
#[test]
fn same_timestamp_page_terminates() {
    let out = tempdir().unwrap();
    let t = day("2021-03-01").start_timestamp() + 5_000;
    let items: Vec<_> = (0..30).map(|i| summary(&format!("same{}", i), t, "rust")).collect();
    let index = Arc::new(FakeIndex::new(items.clone()));
    let provider = Arc::new(FakeProvider::new().with_posts_for(&items));

    let summary = Scraper::new(provider, index.clone())
        .output_dir(out.path())
        .options(opts(10))
        .scrape_subreddits(&["rust"], day("2021-03-01"), day("2021-03-01"))
        .unwrap();

    assert_eq!(summary.items_written, 10);
    let cursors = index.cursors();
    assert_non_increasing(&cursors);
    assert!(cursors.len() <= 3, "cursor trail: {:?}", cursors);
    assert!(*cursors.last().unwrap() < t);
}

/// An index that never answers is queried exactly five times; the window is
/// abandoned, reported as such, and no file is written.
#[test]
fn failing_index_is_retried_five_times() {
    let out = tempdir().unwrap();
    let index = Arc::new(FakeIndex::new(vec![]).failing_first(usize::MAX));
    let provider = Arc::new(FakeProvider::new());

    let summary = Scraper::new(provider.clone(), index.clone())
        .output_dir(out.path())
        .options(opts(500))
        .scrape_subreddits(&["rust"], day("2021-03-01"), day("2021-03-02"))
        .unwrap();

    assert_eq!(index.query_count(), 5);
    assert_eq!(summary.windows_abandoned, 1);
    assert!(summary.lost_data());
    assert!(provider.calls().is_empty());
    assert!(txt_files(out.path()).is_empty());
}

/// Two bad pages followed by a good one: the retries absorb the failures and the
/// window completes normally.
#[test]
fn transient_index_failures_recover() {
    let out = tempdir().unwrap();
    let base = day("2021-03-01").start_timestamp();
    let items = vec![summary("x", base + 60, "rust")];
    let index = Arc::new(FakeIndex::new(items.clone()).failing_first(2));
    let provider = Arc::new(FakeProvider::new().with_posts_for(&items));

    let summary = Scraper::new(provider, index.clone())
        .output_dir(out.path())
        .options(opts(500))
        .scrape_subreddits(&["rust"], day("2021-03-01"), day("2021-03-01"))
        .unwrap();

    assert_eq!(summary.windows_abandoned, 0);
    assert_eq!(summary.items_written, 1);
    assert!(out.path().join("rust").join("x.txt").exists());
}

/// Items that fail to scrape inside a page are counted and skipped; the rest of
/// the page and later pages are still processed.
#[test]
fn item_failures_do_not_stop_the_page() {
    let out = tempdir().unwrap();
    let base = day("2021-03-01").start_timestamp();
    let items: Vec<_> = (0..6).map(|i| summary(&format!("i{}", i), base + 10 * (i + 1), "rust")).collect();
    let index = Arc::new(FakeIndex::new(items.clone()));
    let provider = Arc::new(FakeProvider::new().with_posts_for(&items).failing("i2").failing("i4"));

    let summary = Scraper::new(provider, index)
        .output_dir(out.path())
        .options(opts(2))
        .scrape_subreddits(&["rust"], day("2021-03-01"), day("2021-03-01"))
        .unwrap();

    assert_eq!(summary.items_written, 4);
    assert_eq!(summary.items_failed, 2);
    assert_eq!(txt_files(out.path()).len(), 4);
}

/// Authentication failing mid-window aborts the run with an error.
#[test]
fn auth_failure_aborts_the_window() {
    let out = tempdir().unwrap();
    let base = day("2021-03-01").start_timestamp();
    let items = vec![summary("ok", base + 20, "rust"), summary("bad", base + 10, "rust")];
    let index = Arc::new(FakeIndex::new(items.clone()));
    let provider = Arc::new(FakeProvider::new().with_posts_for(&items).auth_failing("bad"));

    let res = Scraper::new(provider, index)
        .output_dir(out.path())
        .options(opts(500))
        .scrape_subreddits(&["rust"], day("2021-03-01"), day("2021-03-01"));

    let err = res.unwrap_err();
    assert!(format!("{:#}", err).contains("bad"));
}
