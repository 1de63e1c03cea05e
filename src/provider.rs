//! Content provider seam: resolves an item id to the post and its full reply tree.

use crate::error::ProviderError;
use crate::model::Thread;

/// Anything that can hand back a post plus every comment under it, with
/// "load more comments" stubs already resolved into real nodes.
pub trait ContentProvider: Send + Sync {
    fn fetch_thread(&self, id: &str) -> Result<Thread, ProviderError>;

    /// Check credentials before any work starts. Defaults to a no-op.
    fn verify(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}
