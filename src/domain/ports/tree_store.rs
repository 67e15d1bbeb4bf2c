use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::TreeNode;

/// Hierarchical key/value store holding actual-LRP records.
#[async_trait]
pub trait TreeStore: Send + Sync {
    /// Snapshot of everything stored at or below `path`.
    ///
    /// Returns `Ok(None)` when the path does not exist.
    async fn fetch_subtree(&self, path: &str) -> DomainResult<Option<TreeNode>>;
}
