//! Item scraper: one post id in, one `<id>.txt` out (or nothing, for skipped posts).

use crate::config::ScrapeOptions;
use crate::lists::Blacklist;
use crate::markdown::normalize;
use crate::model::{Thread, AUTHOR_SEP, DELETED_AUTHOR};
use crate::provider::ContentProvider;
use crate::segment::Segmenter;
use crate::tree::flatten_forest;
use crate::util::write_lines_atomic;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// What happened to one item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScrapeOutcome {
    Written { path: PathBuf, lines: usize },
    /// Left out by the skip policy; nothing written.
    Skipped,
}

/// Borrowed view of everything a single scrape needs. Cheap to build per unit.
#[derive(Clone, Copy)]
pub struct ItemScraper<'a> {
    pub provider: &'a dyn ContentProvider,
    pub segmenter: &'a dyn Segmenter,
    pub blacklist: &'a Blacklist,
    pub opts: &'a ScrapeOptions,
}

impl<'a> ItemScraper<'a> {
    /// Fetch `id`, apply the skip policy, and write `<out_dir>/<id>.txt`.
    ///
    /// Provider failures come back as a [`ProviderError`](crate::ProviderError)
    /// inside the `anyhow::Error`, so callers can tell fatal ones apart.
    pub fn scrape(&self, id: &str, out_dir: &Path, label: &str) -> Result<ScrapeOutcome> {
        let thread = self.provider.fetch_thread(id)?;

        tracing::debug!(
            "Scraping {} |{} \"{}\"",
            thread.item.id,
            if label.trim().is_empty() { String::new() } else { format!(" {} |", label) },
            short_title(&thread.item.title)
        );

        if self.opts.skip.skips(&thread.item.body) {
            tracing::debug!("{}: skipped (deleted or removed)", id);
            return Ok(ScrapeOutcome::Skipped);
        }

        let lines = render_thread(&thread, self.opts.attribution, self.segmenter, self.blacklist);
        let path = out_dir.join(format!("{}.txt", id));
        write_lines_atomic(&path, &lines).with_context(|| format!("write {}", path.display()))?;

        Ok(ScrapeOutcome::Written { path, lines: lines.len() })
    }
}

fn short_title(title: &str) -> String {
    if title.chars().count() < 40 {
        title.to_string()
    } else {
        let head: String = title.chars().take(37).collect();
        format!("{}...", head)
    }
}

/// Raw text units in output order: title, body, then every comment tree.
fn raw_units(thread: &Thread, with_authors: bool) -> Vec<String> {
    let item = &thread.item;
    let mut units = if with_authors {
        let a = item.author_or_sentinel();
        vec![
            format!("{}{}{}", a, AUTHOR_SEP, item.title),
            format!("{}{}{}", a, AUTHOR_SEP, item.body),
        ]
    } else {
        vec![item.title.clone(), item.body.clone()]
    };
    units.extend(flatten_forest(&thread.comments, with_authors));
    units
}

/// Turn a fetched thread into output lines: one tokenized sentence per line,
/// blacklisted lines removed.
pub fn render_thread(
    thread: &Thread,
    with_authors: bool,
    segmenter: &dyn Segmenter,
    blacklist: &Blacklist,
) -> Vec<String> {
    let mut out = Vec::new();

    for unit in raw_units(thread, with_authors) {
        let unit = unit.trim();
        let (author, text) = if with_authors {
            match unit.split_once(AUTHOR_SEP.trim_end()) {
                Some((a, t)) => (Some(a.trim_end()), t.trim_start()),
                None => (Some(DELETED_AUTHOR), unit),
            }
        } else {
            (None, unit)
        };

        for sentence in segmenter.sentences(text) {
            let clean = normalize(&sentence);
            let tokens = segmenter.words(&clean);
            if tokens.is_empty() {
                continue;
            }
            let joined = tokens.join(" ");
            let line = match author {
                Some(a) => format!("{}{}{}", a, AUTHOR_SEP, joined),
                None => joined,
            };
            if !blacklist.contains(&line) {
                out.push(line);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CommentNode, DiscussionItem};
    use crate::segment::UnicodeSegmenter;

    fn thread(title: &str, body: &str, comments: Vec<CommentNode>) -> Thread {
        Thread {
            item: DiscussionItem {
                id: "abc".into(),
                created_utc: 1_600_000_000,
                subreddit: "rust".into(),
                title: title.into(),
                body: body.into(),
                author: Some("op".into()),
            },
            comments,
        }
    }

    #[test]
    fn title_body_then_comments_in_order() {
        let t = thread(
            "A title",
            "Some *body*. Second sentence!",
            vec![CommentNode::new("first", Some("x"))
                .with_replies(vec![CommentNode::new("nested [link](http://l)", Some("y"))])],
        );
        let lines = render_thread(&t, false, &UnicodeSegmenter, &Blacklist::new());
        assert_eq!(
            lines,
            vec!["A title", "Some body .", "Second sentence !", "first", "nested link"]
        );
    }

    #[test]
    fn attribution_prefixes_every_sentence() {
        let t = thread(
            "Hi",
            "One. Two.",
            vec![CommentNode::new("reply", None)],
        );
        let lines = render_thread(&t, true, &UnicodeSegmenter, &Blacklist::new());
        assert_eq!(
            lines,
            vec![
                "op : Hi".to_string(),
                "op : One .".to_string(),
                "op : Two .".to_string(),
                format!("{} : reply", DELETED_AUTHOR),
            ]
        );
    }

    #[test]
    fn empty_body_produces_no_line() {
        let t = thread("Only title", "", vec![]);
        let lines = render_thread(&t, false, &UnicodeSegmenter, &Blacklist::new());
        assert_eq!(lines, vec!["Only title"]);
    }

    #[test]
    fn blacklist_drops_exact_lines_only() {
        let t = thread(
            "T",
            "I am a bot. I am a Bot.",
            vec![],
        );
        let bl = Blacklist::from_lines(["I am a bot ."]);
        let lines = render_thread(&t, false, &UnicodeSegmenter, &bl);
        assert_eq!(lines, vec!["T", "I am a Bot ."]);
    }

    #[test]
    fn short_title_truncates_long_titles() {
        assert_eq!(short_title("short"), "short");
        let long = "x".repeat(50);
        assert_eq!(short_title(&long), format!("{}...", "x".repeat(37)));
    }
}
