#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use threadscrape::{
    CommentNode, ContentProvider, DiscussionItem, Page, ProviderError, SearchError, SearchIndex,
    SubmissionSummary, Thread,
};
use walkdir::WalkDir;

/// Comment shape used to describe fixtures; turned into `CommentNode` per fetch.
#[derive(Clone, Debug)]
pub struct CommentFixture {
    pub body: String,
    pub author: Option<String>,
    pub replies: Vec<CommentFixture>,
}

pub fn comment(body: &str, author: Option<&str>, replies: Vec<CommentFixture>) -> CommentFixture {
    CommentFixture { body: body.to_string(), author: author.map(str::to_string), replies }
}

fn build(fixture: &CommentFixture) -> CommentNode {
    CommentNode::new(fixture.body.clone(), fixture.author.as_deref())
        .with_replies(fixture.replies.iter().map(build).collect())
}

/// In-memory content provider:
/// - ids registered with `with_post` resolve to that post
/// - ids in `failing` answer a transient error, ids in `auth_failing` an auth error
/// - anything else is "not found"
/// Every call is recorded in `calls`.
#[derive(Default)]
pub struct FakeProvider {
    posts: HashMap<String, (DiscussionItem, Vec<CommentFixture>)>,
    failing: HashSet<String>,
    auth_failing: HashSet<String>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_post(mut self, id: &str, title: &str, body: &str, comments: Vec<CommentFixture>) -> Self {
        let item = DiscussionItem {
            id: id.to_string(),
            created_utc: 1_600_000_000,
            subreddit: "test".to_string(),
            title: title.to_string(),
            body: body.to_string(),
            author: Some("op".to_string()),
        };
        self.posts.insert(id.to_string(), (item, comments));
        self
    }

    /// Register a plain post for every summary the fake index will serve.
    pub fn with_posts_for(mut self, summaries: &[SubmissionSummary]) -> Self {
        for s in summaries {
            self = self.with_post(&s.id, &format!("Title {}", s.id), "Body text.", vec![]);
        }
        self
    }

    pub fn failing(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub fn auth_failing(mut self, id: &str) -> Self {
        self.auth_failing.insert(id.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ContentProvider for FakeProvider {
    fn fetch_thread(&self, id: &str) -> Result<Thread, ProviderError> {
        self.calls.lock().unwrap().push(id.to_string());
        if self.auth_failing.contains(id) {
            return Err(ProviderError::auth("token revoked"));
        }
        if self.failing.contains(id) {
            return Err(ProviderError::transient("connection reset"));
        }
        let (item, comments) = self
            .posts
            .get(id)
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))?;
        Ok(Thread { item: item.clone(), comments: comments.iter().map(build).collect() })
    }
}

/// In-memory search index honouring `(after, before]`, newest first, `limit`,
/// and a `subreddit` filter. `fail_first` makes the first N queries fail to parse;
/// `usize::MAX` means always.
pub struct FakeIndex {
    items: Vec<SubmissionSummary>,
    fail_first: usize,
    pub queries: Mutex<Vec<(i64, i64, Vec<(String, String)>)>>,
}

impl FakeIndex {
    pub fn new(items: Vec<SubmissionSummary>) -> Self {
        Self { items, fail_first: 0, queries: Mutex::new(Vec::new()) }
    }

    pub fn failing_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    /// The `before` bound of every query, in order (i.e. the cursor trail).
    pub fn cursors(&self) -> Vec<i64> {
        self.queries.lock().unwrap().iter().map(|(_, b, _)| *b).collect()
    }
}

impl SearchIndex for FakeIndex {
    fn query(
        &self,
        after: i64,
        before: i64,
        limit: usize,
        filters: &[(String, String)],
    ) -> Result<Page, SearchError> {
        let n = {
            let mut q = self.queries.lock().unwrap();
            q.push((after, before, filters.to_vec()));
            q.len()
        };
        if n <= self.fail_first {
            return Page::parse("<html><body>502 Bad Gateway</body></html>");
        }
        let sub = filters.iter().find(|(k, _)| k == "subreddit").map(|(_, v)| v.clone());
        let mut data: Vec<SubmissionSummary> = self
            .items
            .iter()
            .filter(|s| s.created_utc > after && s.created_utc <= before)
            .filter(|s| sub.as_ref().map_or(true, |want| &s.subreddit == want))
            .cloned()
            .collect();
        data.sort_by(|a, b| b.created_utc.cmp(&a.created_utc));
        data.truncate(limit);
        Ok(Page { data })
    }
}

pub fn summary(id: &str, created_utc: i64, subreddit: &str) -> SubmissionSummary {
    SubmissionSummary { id: id.to_string(), created_utc, subreddit: subreddit.to_string() }
}

/// Read a text file line-by-line into strings (keeps empty lines out).
pub fn read_lines(path: &Path) -> Vec<String> {
    let f = File::open(path).unwrap();
    let r = BufReader::new(f);
    r.lines().map(|l| l.unwrap()).filter(|s| !s.is_empty()).collect()
}

/// Every `.txt` file written under `root`, sorted.
pub fn txt_files(root: &Path) -> Vec<PathBuf> {
    let mut v: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .filter(|p| p.extension().map_or(false, |x| x == "txt"))
        .collect();
    v.sort();
    v
}
