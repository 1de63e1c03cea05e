//! Fetched content: a post, its reply tree, and the markers the scraper looks for.

/// Printed in place of an author that no longer exists.
pub const DELETED_AUTHOR: &str = "[ DELETED_AUTHOR ]";
/// Separates the author from the text in attribution mode.
pub const AUTHOR_SEP: &str = " : ";
/// Body of a post deleted by its author.
pub const DELETED_MARKER: &str = "[deleted]";
/// Body of a post removed by moderators or bots.
pub const REMOVED_MARKER: &str = "[removed]";

/// A top-level post (Reddit "submission").
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscussionItem {
    pub id: String,
    pub created_utc: i64,
    pub subreddit: String,
    pub title: String,
    pub body: String,
    /// `None` when the account was deleted.
    pub author: Option<String>,
}

impl DiscussionItem {
    pub fn author_or_sentinel(&self) -> &str {
        self.author.as_deref().unwrap_or(DELETED_AUTHOR)
    }
}

/// One comment and its replies, in reply order.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CommentNode {
    pub body: String,
    pub author: Option<String>,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    pub fn new(body: impl Into<String>, author: Option<&str>) -> Self {
        Self { body: body.into(), author: author.map(str::to_string), replies: Vec::new() }
    }

    pub fn with_replies(mut self, replies: Vec<CommentNode>) -> Self {
        self.replies = replies;
        self
    }

    pub fn author_or_sentinel(&self) -> &str {
        self.author.as_deref().unwrap_or(DELETED_AUTHOR)
    }

    /// Number of nodes in this subtree, counted without recursion.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.replies.iter());
        }
        count
    }
}

// Reply chains can be arbitrarily deep; the derived drop glue would recurse once
// per level, so unlink children onto a heap stack first.
impl Drop for CommentNode {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.replies);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.replies);
        }
    }
}

/// What the content provider hands back for one item id.
#[derive(Debug)]
pub struct Thread {
    pub item: DiscussionItem,
    pub comments: Vec<CommentNode>,
}
