mod config;
mod date;
mod error;
mod lists;
mod model;
mod util;

mod markdown;
mod segment;
mod tree;

mod provider;
mod reddit;
mod search;

mod concurrency;
mod dispatch;
mod fetch;
mod partition;
mod progress;
mod scrape;

#[cfg(test)]
mod test_http;

pub use crate::config::{ScrapeOptions, SkipPolicy};
pub use crate::date::{format_datetime, format_day, Day, TimeWindow};
pub use crate::error::{DateError, ProviderError, SearchError};
pub use crate::model::{CommentNode, DiscussionItem, Thread, AUTHOR_SEP, DELETED_AUTHOR, DELETED_MARKER, REMOVED_MARKER};

// Input files (lists, blacklist, index parameters).
pub use crate::lists::{load_blacklist, load_list_from_file, load_query_params, parse_query_params, Blacklist, QueryParams};

// Text pipeline pieces, usable on their own.
pub use crate::markdown::{conflate_spaces, normalize, remove_markdown};
pub use crate::segment::{Segmenter, UnicodeSegmenter};
pub use crate::tree::{flatten_comment_tree, flatten_forest};

// Collaborator seams and their HTTP implementations.
pub use crate::provider::ContentProvider;
pub use crate::reddit::{Credentials, RedditClient};
pub use crate::search::{Page, PushshiftClient, SearchIndex, SubmissionSummary, PUSHSHIFT_ENDPOINT};

// Orchestration.
pub use crate::dispatch::{RunSummary, Scraper};
pub use crate::fetch::{OutputLayout, PaginatedFetcher, WindowReport};
pub use crate::partition::{make_splits, split_window};
pub use crate::scrape::{render_thread, ItemScraper, ScrapeOutcome};

pub use crate::util::{init_tracing_once, is_writable_dir};
