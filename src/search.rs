//! Search index seam (Pushshift): pages of `{id, created_utc, subreddit}` summaries.

use crate::error::SearchError;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

pub const PUSHSHIFT_ENDPOINT: &str = "https://api.pushshift.io/reddit/search/submission";

/// Minimal per-submission record returned by the index.
/// Extra fields are ignored by serde.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SubmissionSummary {
    pub id: String,
    #[serde(deserialize_with = "epoch_seconds")]
    pub created_utc: i64,
    #[serde(default)]
    pub subreddit: String,
}

/// One page, newest first.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Page {
    pub data: Vec<SubmissionSummary>,
}

impl Page {
    pub fn parse(body: &str) -> Result<Self, SearchError> {
        Ok(serde_json::from_str(body)?)
    }
}

// The index has served `created_utc` both as an integer and as a float.
fn epoch_seconds<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Num {
        Int(i64),
        Float(f64),
    }
    Ok(match Num::deserialize(d)? {
        Num::Int(i) => i,
        Num::Float(f) => f as i64,
    })
}

/// Query one page of items created in `(after, before]`, sorted newest first.
pub trait SearchIndex: Send + Sync {
    fn query(
        &self,
        after: i64,
        before: i64,
        limit: usize,
        filters: &[(String, String)],
    ) -> Result<Page, SearchError>;
}

/// Build the full query string for one page request.
pub fn query_pairs(after: i64, before: i64, limit: usize, filters: &[(String, String)]) -> Vec<(String, String)> {
    let mut q: Vec<(String, String)> = vec![
        ("before".into(), before.to_string()),
        ("after".into(), after.to_string()),
        ("fields".into(), "id,created_utc,subreddit".into()),
        ("limit".into(), limit.to_string()),
        ("sort".into(), "desc".into()),
        ("sort_type".into(), "created_utc".into()),
    ];
    q.extend(filters.iter().cloned());
    q
}

/// Blocking HTTP client for the Pushshift submission search endpoint.
pub struct PushshiftClient {
    http: reqwest::blocking::Client,
    endpoint: String,
}

impl PushshiftClient {
    pub fn new(user_agent: &str) -> Result<Self, SearchError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self { http, endpoint: PUSHSHIFT_ENDPOINT.to_string() })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl SearchIndex for PushshiftClient {
    fn query(
        &self,
        after: i64,
        before: i64,
        limit: usize,
        filters: &[(String, String)],
    ) -> Result<Page, SearchError> {
        let body = self
            .http
            .get(&self.endpoint)
            .query(&query_pairs(after, before, limit, filters))
            .send()?
            .text()?;
        // Rate-limited/error responses arrive as HTML or empty bodies and fail here.
        Page::parse(&body)
    }
}
