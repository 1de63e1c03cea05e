use std::time::Duration;

/// Which deleted/removed posts to leave out of the output entirely.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkipPolicy {
    /// Skip posts whose body carries the `[deleted]` marker.
    pub skip_deleted: bool,
    /// Skip posts whose body carries the `[removed]` marker.
    pub skip_removed: bool,
}

impl Default for SkipPolicy {
    fn default() -> Self {
        Self { skip_deleted: true, skip_removed: true }
    }
}

impl SkipPolicy {
    pub fn none() -> Self {
        Self { skip_deleted: false, skip_removed: false }
    }

    /// True when `body` should not be scraped at all.
    pub fn skips(&self, body: &str) -> bool {
        (self.skip_deleted && body.contains(crate::model::DELETED_MARKER))
            || (self.skip_removed && body.contains(crate::model::REMOVED_MARKER))
    }
}

/// User-facing options with sensible defaults and builder chaining.
/// Read-only once a run starts; shared by every worker.
#[derive(Clone, Debug)]
pub struct ScrapeOptions {
    pub skip: SkipPolicy,
    pub attribution: bool,          // prefix each line with "<author> : "
    pub workers: usize,             // 1 = sequential
    pub max_retries: usize,         // attempts per index page
    pub retry_delay: Duration,      // fixed pause between attempts
    pub page_size: usize,           // items requested per index page
    pub progress: bool,             // count bar over work units
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            skip: SkipPolicy::default(),
            attribution: false,
            workers: 1,
            max_retries: 5,
            retry_delay: Duration::from_secs(1),
            page_size: 500,
            progress: false,
        }
    }
}

impl ScrapeOptions {
    pub fn with_skip_deleted(mut self, yes: bool) -> Self {
        self.skip.skip_deleted = yes;
        self
    }
    pub fn with_skip_removed(mut self, yes: bool) -> Self {
        self.skip.skip_removed = yes;
        self
    }
    pub fn with_skip_policy(mut self, skip: SkipPolicy) -> Self {
        self.skip = skip;
        self
    }
    pub fn with_attribution(mut self, yes: bool) -> Self {
        self.attribution = yes;
        self
    }
    pub fn with_workers(mut self, n: usize) -> Self {
        self.workers = n.max(1);
        self
    }
    pub fn with_max_retries(mut self, n: usize) -> Self {
        self.max_retries = n.max(1);
        self
    }
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }
    pub fn with_page_size(mut self, n: usize) -> Self {
        self.page_size = n.clamp(1, 500);
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
}
