use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::DomainResult;
use crate::domain::models::tree::normalize_key;
use crate::domain::models::TreeNode;
use crate::domain::ports::TreeStore;

/// [`TreeStore`] over an ordered map of leaf keys.
#[derive(Default)]
pub struct InMemoryTreeStore {
    nodes: RwLock<BTreeMap<String, String>>,
}

impl InMemoryTreeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, key: &str, value: impl Into<String>) {
        self.nodes.write().await.insert(normalize_key(key), value.into());
    }

    /// Remove `key` and everything below it.
    pub async fn delete(&self, key: &str) -> usize {
        let key = normalize_key(key);
        let mut nodes = self.nodes.write().await;
        let before = nodes.len();
        nodes.retain(|k, _| !is_at_or_below(&key, k));
        before - nodes.len()
    }

    pub async fn len(&self) -> usize {
        self.nodes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.nodes.read().await.is_empty()
    }
}

#[async_trait]
impl TreeStore for InMemoryTreeStore {
    async fn fetch_subtree(&self, path: &str) -> DomainResult<Option<TreeNode>> {
        let root = normalize_key(path);
        let nodes = self.nodes.read().await;
        let entries = nodes
            .iter()
            .filter(|(k, _)| is_at_or_below(&root, k))
            .map(|(k, v)| (k.clone(), v.clone()));
        Ok(TreeNode::from_entries(&root, entries))
    }
}

fn is_at_or_below(root: &str, key: &str) -> bool {
    root == "/"
        || key == root
        || key
            .strip_prefix(root)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_subtree() {
        let store = InMemoryTreeStore::new();
        store.put("/v1/actual/p1/0/instance", "a").await;
        store.put("/v1/actual/p1/0/evacuating", "b").await;
        store.put("/v1/actual/p10/0/instance", "c").await;

        let p1 = store.fetch_subtree("/v1/actual/p1").await.unwrap().unwrap();
        assert_eq!(p1.nodes.len(), 1);
        assert_eq!(p1.nodes[0].nodes.len(), 2);

        let all = store.fetch_subtree("/").await.unwrap().unwrap();
        assert_eq!(all.nodes[0].key, "/v1");
        assert!(store.fetch_subtree("/v1/desired").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_subtree() {
        let store = InMemoryTreeStore::new();
        store.put("/a/b", "1").await;
        store.put("/a/c", "2").await;
        store.put("/ab", "3").await;

        assert_eq!(store.delete("/a").await, 2);
        assert_eq!(store.len().await, 1);
        assert!(!store.is_empty().await);
    }
}
