//! Error types at the collaborator seams (content provider, search index).
//! Application plumbing uses `anyhow`; these enums carry the distinctions the
//! fetch loop acts on (fatal vs. per-item, retriable page failures).

use thiserror::Error;

/// Failure reported by a [`ContentProvider`](crate::ContentProvider).
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Credentials rejected. Aborts the whole run.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The item does not exist (or is not visible to us).
    #[error("item {0} not found")]
    NotFound(String),

    /// Anything else: network hiccups, 5xx, malformed payloads.
    #[error("fetch failed: {0}")]
    Transient(String),
}

impl ProviderError {
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    pub fn transient(message: impl std::fmt::Display) -> Self {
        Self::Transient(message.to_string())
    }

    /// Fatal errors cross unit boundaries and stop the run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transient(e.to_string())
    }
}

/// Failure fetching one page from a [`SearchIndex`](crate::SearchIndex).
/// Both kinds count against the same retry budget.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("index response is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("index request failed: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

/// Malformed or out-of-order dates.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct DateError(pub String);
