//! Reddit content provider over the OAuth API (application-only grant).
//!
//! A thread is loaded from `/comments/<id>`; "load more comments" stubs go
//! through `/api/morechildren` and "continue this thread" stubs re-fetch the
//! sub-thread. Everything is gathered as flat records first and assembled into
//! a tree at the end, so nesting depth never turns into call depth.

use crate::error::ProviderError;
use crate::model::{CommentNode, DiscussionItem, Thread, DELETED_MARKER};
use crate::provider::ContentProvider;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

pub const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
pub const API_BASE: &str = "https://oauth.reddit.com";

/// `/api/morechildren` accepts at most this many ids per call.
const MORE_BATCH: usize = 100;
/// Refresh the bearer token this long before Reddit says it expires.
const TOKEN_SLACK: Duration = Duration::from_secs(60);

/// Script-app credentials.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

struct Token {
    value: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    error: Option<String>,
}

pub struct RedditClient {
    http: reqwest::blocking::Client,
    creds: Credentials,
    token: Mutex<Option<Token>>,
    api_base: String,
    token_url: String,
}

impl RedditClient {
    pub fn new(creds: Credentials) -> Result<Self, ProviderError> {
        if creds.client_id.trim().is_empty() || creds.client_secret.trim().is_empty() {
            return Err(ProviderError::auth("missing Reddit client id or secret"));
        }
        let http = reqwest::blocking::Client::builder()
            .user_agent(creds.user_agent.clone())
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            http,
            creds,
            token: Mutex::new(None),
            api_base: API_BASE.to_string(),
            token_url: TOKEN_URL.to_string(),
        })
    }

    /// Point the client at another host (a proxy or a local mock).
    pub fn with_base_urls(mut self, api_base: impl Into<String>, token_url: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self.token_url = token_url.into();
        self
    }

    fn request_token(&self) -> Result<Token, ProviderError> {
        let resp = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.creds.client_id, Some(&self.creds.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()?;
        let status = resp.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(ProviderError::auth(format!("token endpoint answered {}", status)));
        }
        if !status.is_success() {
            return Err(ProviderError::transient(format!("token endpoint answered {}", status)));
        }
        let body: TokenResponse = resp.json()?;
        match (body.access_token, body.error) {
            (Some(value), None) => Ok(Token {
                value,
                expires_at: Instant::now() + Duration::from_secs(body.expires_in.unwrap_or(3600)),
            }),
            (_, Some(err)) => Err(ProviderError::auth(err)),
            (None, None) => Err(ProviderError::auth("token response without access_token")),
        }
    }

    /// Current bearer token, refreshed when close to expiry.
    fn bearer(&self) -> Result<String, ProviderError> {
        let mut guard = self.token.lock();
        let fresh = guard
            .as_ref()
            .map_or(false, |t| t.expires_at > Instant::now() + TOKEN_SLACK);
        if !fresh {
            *guard = Some(self.request_token()?);
        }
        Ok(guard.as_ref().map(|t| t.value.clone()).unwrap_or_default())
    }

    /// Exchange credentials for a new token and make it the current one.
    fn refresh_token(&self) -> Result<String, ProviderError> {
        let token = self.request_token()?;
        let value = token.value.clone();
        *self.token.lock() = Some(token);
        Ok(value)
    }

    fn get_json(&self, path: &str, query: &[(&str, String)], id: &str) -> Result<Value, ProviderError> {
        let url = format!("{}{}", self.api_base, path);
        let send = |token: String| self.http.get(&url).bearer_auth(token).query(query).send();

        let mut resp = send(self.bearer()?)?;
        if resp.status().as_u16() == 401 {
            // Tokens can be revoked before their stated expiry: re-authenticate once.
            tracing::debug!("{} answered 401, requesting a new token", path);
            resp = send(self.refresh_token()?)?;
        }
        match resp.status().as_u16() {
            200..=299 => Ok(resp.json()?),
            401 => Err(ProviderError::auth(format!("{} answered 401 with a fresh token", path))),
            403 | 404 => Err(ProviderError::NotFound(id.to_string())),
            code => Err(ProviderError::transient(format!("{} answered {}", path, code))),
        }
    }
}

impl ContentProvider for RedditClient {
    fn verify(&self) -> Result<(), ProviderError> {
        self.refresh_token().map(|_| ())
    }

    fn fetch_thread(&self, id: &str) -> Result<Thread, ProviderError> {
        let id = id.trim().trim_start_matches("t3_");
        let raw = self.get_json(&format!("/comments/{}", id), &[("raw_json", "1".to_string()), ("limit", "500".to_string())], id)?;

        let item = parse_submission(&raw[0]).ok_or_else(|| ProviderError::NotFound(id.to_string()))?;
        let link = format!("t3_{}", item.id);

        let mut acc = Collected::default();
        acc.absorb_listing(&raw[1]);
        self.resolve_stubs(&item.id, &link, &mut acc)?;

        Ok(Thread { item, comments: acc.assemble(&link) })
    }
}

impl RedditClient {
    /// Keep expanding stubs until none are left. Each stub is expanded once.
    fn resolve_stubs(&self, post_id: &str, link: &str, acc: &mut Collected) -> Result<(), ProviderError> {
        let mut requested: HashSet<String> = HashSet::new();
        let mut continued: HashSet<String> = HashSet::new();

        loop {
            let pending_more: Vec<String> = acc
                .more
                .drain(..)
                .filter(|c| requested.insert(c.clone()))
                .collect();
            let pending_continue: Vec<String> = acc
                .continue_from
                .drain(..)
                .filter(|p| continued.insert(p.clone()))
                .collect();
            if pending_more.is_empty() && pending_continue.is_empty() {
                return Ok(());
            }

            for batch in pending_more.chunks(MORE_BATCH) {
                let v = self.get_json(
                    "/api/morechildren",
                    &[
                        ("api_type", "json".to_string()),
                        ("link_id", link.to_string()),
                        ("children", batch.join(",")),
                        ("raw_json", "1".to_string()),
                    ],
                    post_id,
                )?;
                if let Some(things) = v["json"]["data"]["things"].as_array() {
                    let mut nested = Vec::new();
                    for thing in things {
                        acc.absorb_thing(thing, &mut nested);
                    }
                    for replies in nested {
                        acc.absorb_listing(replies);
                    }
                }
            }

            for parent in pending_continue {
                let short = parent.trim_start_matches("t1_");
                let v = self.get_json(
                    &format!("/comments/{}/_/{}", post_id, short),
                    &[("raw_json", "1".to_string()), ("limit", "500".to_string())],
                    post_id,
                )?;
                acc.absorb_listing(&v[1]);
            }
        }
    }
}

fn author_of(data: &Value) -> Option<String> {
    data["author"]
        .as_str()
        .filter(|a| !a.is_empty() && *a != DELETED_MARKER)
        .map(str::to_string)
}

fn epoch_of(v: &Value) -> i64 {
    v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)).unwrap_or(0)
}

fn parse_submission(listing: &Value) -> Option<DiscussionItem> {
    let data = &listing["data"]["children"][0]["data"];
    Some(DiscussionItem {
        id: data["id"].as_str()?.to_string(),
        created_utc: epoch_of(&data["created_utc"]),
        subreddit: data["subreddit"].as_str().unwrap_or_default().to_string(),
        title: data["title"].as_str().unwrap_or_default().to_string(),
        body: data["selftext"].as_str().unwrap_or_default().to_string(),
        author: author_of(data),
    })
}

struct RawComment {
    name: String,
    parent: String,
    body: String,
    author: Option<String>,
}

/// Flat comment records plus the stubs still to expand.
#[derive(Default)]
struct Collected {
    records: Vec<RawComment>,
    seen: HashSet<String>,
    more: VecDeque<String>,
    continue_from: VecDeque<String>,
}

impl Collected {
    /// Walk a listing and every nested `replies` listing, without recursion.
    fn absorb_listing(&mut self, listing: &Value) {
        let mut stack: Vec<&Value> = vec![listing];
        while let Some(l) = stack.pop() {
            if let Some(children) = l["data"]["children"].as_array() {
                for child in children {
                    self.absorb_thing(child, &mut stack);
                }
            }
        }
    }

    fn absorb_thing<'v>(&mut self, thing: &'v Value, nested: &mut Vec<&'v Value>) {
        let data = &thing["data"];
        match thing["kind"].as_str() {
            Some("t1") => {
                let name = match data["name"].as_str() {
                    Some(n) => n.to_string(),
                    None => match data["id"].as_str() {
                        Some(id) => format!("t1_{}", id),
                        None => return,
                    },
                };
                if self.seen.insert(name.clone()) {
                    self.records.push(RawComment {
                        name,
                        parent: data["parent_id"].as_str().unwrap_or_default().to_string(),
                        body: data["body"].as_str().unwrap_or_default().to_string(),
                        author: author_of(data),
                    });
                }
                if data["replies"].is_object() {
                    nested.push(&data["replies"]);
                }
            }
            Some("more") => {
                let children: Vec<&str> = data["children"]
                    .as_array()
                    .map(|a| a.iter().filter_map(Value::as_str).collect())
                    .unwrap_or_default();
                if children.is_empty() {
                    if let Some(p) = data["parent_id"].as_str() {
                        self.continue_from.push_back(p.to_string());
                    }
                } else {
                    self.more.extend(children.into_iter().map(str::to_string));
                }
            }
            _ => {}
        }
    }

    /// Build the reply forest under `root` (the post's fullname). Records whose
    /// parent never showed up are dropped.
    fn assemble(self, root: &str) -> Vec<CommentNode> {
        let mut kids: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, r) in self.records.iter().enumerate() {
            kids.entry(r.parent.as_str()).or_default().push(i);
        }
        let children_of = |name: &str| kids.get(name).cloned().unwrap_or_default();

        // Pre-order over reachable records.
        let mut order = Vec::with_capacity(self.records.len());
        let mut stack: Vec<usize> = children_of(root).into_iter().rev().collect();
        while let Some(i) = stack.pop() {
            order.push(i);
            stack.extend(children_of(&self.records[i].name).into_iter().rev());
        }

        // Reverse pre-order visits every child before its parent.
        let mut built: Vec<Option<CommentNode>> = (0..self.records.len()).map(|_| None).collect();
        for &i in order.iter().rev() {
            let r = &self.records[i];
            let replies = children_of(&r.name)
                .into_iter()
                .filter_map(|c| built[c].take())
                .collect();
            built[i] = Some(CommentNode {
                body: r.body.clone(),
                author: r.author.clone(),
                replies,
            });
        }

        children_of(root).into_iter().filter_map(|i| built[i].take()).collect()
    }
}
