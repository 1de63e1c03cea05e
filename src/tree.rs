//! Comment tree flattening: depth-first, pre-order, reply order preserved.

use crate::model::{CommentNode, AUTHOR_SEP};

/// Flatten `root` and all of its replies into one line per comment.
///
/// With `with_authors` each line is `<author> : <body>`, using the deleted-author
/// sentinel when the account is gone. Uses an explicit stack, so thread depth is
/// limited by memory only.
pub fn flatten_comment_tree(root: &CommentNode, with_authors: bool) -> Vec<String> {
    let mut lines = Vec::new();
    let mut stack: Vec<&CommentNode> = vec![root];

    while let Some(node) = stack.pop() {
        if with_authors {
            lines.push(format!("{}{}{}", node.author_or_sentinel(), AUTHOR_SEP, node.body));
        } else {
            lines.push(node.body.clone());
        }
        // Reversed so the first reply is popped next.
        stack.extend(node.replies.iter().rev());
    }

    lines
}

/// Flatten a forest of top-level comments, in order.
pub fn flatten_forest(comments: &[CommentNode], with_authors: bool) -> Vec<String> {
    comments
        .iter()
        .flat_map(|c| flatten_comment_tree(c, with_authors))
        .collect()
}
