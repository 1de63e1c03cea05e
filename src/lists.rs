//! Input files: subreddit/post lists, the line blacklist, and index query parameters.

use ahash::RandomState;
use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Lines to drop from the output, matched exactly (case and whitespace included).
#[derive(Clone, Debug, Default)]
pub struct Blacklist {
    lines: HashSet<String, RandomState>,
}

impl Blacklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { lines: lines.into_iter().map(Into::into).collect() }
    }

    #[inline]
    pub fn contains(&self, line: &str) -> bool {
        self.lines.contains(line)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Extra query parameters for the search index, in file order.
pub type QueryParams = Vec<(String, String)>;

fn read_text(path: &Path, what: &str) -> Result<String> {
    if !path.is_file() {
        bail!("the {} file {} does not exist or is inaccessible", what, path.display());
    }
    fs::read_to_string(path).with_context(|| format!("read {} file {}", what, path.display()))
}

/// Newline-delimited ids or subreddit names. Entries are trimmed; blank lines and
/// lines starting with `#` are ignored.
pub fn load_list_from_file(path: &Path) -> Result<Vec<String>> {
    let text = read_text(path, "list")?;
    let entries: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect();
    tracing::debug!("First 5 entries: {:?}", &entries[..entries.len().min(5)]);
    Ok(entries)
}

/// Newline-delimited blacklist; entries are trimmed, blank lines ignored.
pub fn load_blacklist(path: &Path) -> Result<Blacklist> {
    let text = read_text(path, "blacklist")?;
    let bl = Blacklist::from_lines(
        text.lines().map(str::trim).filter(|l| !l.is_empty()),
    );
    tracing::info!("Loaded {} blacklisted lines from {}", bl.len(), path.display());
    Ok(bl)
}

/// `key<TAB>value` per line; `#` comments and blank lines are skipped.
/// Any other line that is not exactly two fields is an error.
pub fn load_query_params(path: &Path) -> Result<QueryParams> {
    let text = read_text(path, "config")?;
    parse_query_params(&text).with_context(|| format!("parse config {}", path.display()))
}

pub fn parse_query_params(text: &str) -> Result<QueryParams> {
    let mut params = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        if raw.starts_with('#') || raw.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = raw.split('\t').collect();
        if fields.len() != 2 {
            bail!(
                "invalid configuration on line {}: each line should contain two tab-separated entries",
                i + 1
            );
        }
        params.push((fields[0].trim().to_string(), fields[1].trim().to_string()));
    }
    Ok(params)
}
