//! Tree-shaped snapshot of a hierarchical key/value store.
//!
//! Keys are absolute, `/`-separated paths. A node either carries a value (a
//! leaf record) or groups the nodes stored below it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Absolute key of this node, e.g. `/v1/actual/guid/0/instance`.
    pub key: String,
    /// Serialized record for leaf nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Children, sorted by key.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<TreeNode>,
}

impl TreeNode {
    pub fn dir(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
            nodes: Vec::new(),
        }
    }

    pub fn leaf(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            nodes: Vec::new(),
        }
    }

    /// Trailing path segment of the key.
    pub fn base_name(&self) -> &str {
        base_name(&self.key)
    }

    pub fn is_leaf(&self) -> bool {
        self.nodes.is_empty() && self.value.is_some()
    }

    /// Assemble the subtree rooted at `root` from flat `(key, value)` entries.
    ///
    /// Entries outside `root` are ignored. Returns `None` when no entry lives at
    /// or below `root`.
    pub fn from_entries<I>(root: &str, entries: I) -> Option<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let root = normalize_key(root);
        let mut entries: Vec<(String, String)> = entries
            .into_iter()
            .map(|(key, value)| (normalize_key(&key), value))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut node = Self::dir(root.clone());
        let mut found = false;
        for (key, value) in entries {
            if key == root {
                node.value = Some(value);
                found = true;
                continue;
            }
            let Some(rest) = relative_to(&root, &key) else {
                continue;
            };
            node.insert(rest.split('/').filter(|s| !s.is_empty()), value);
            found = true;
        }

        found.then_some(node)
    }

    fn insert<'a>(&mut self, mut segments: impl Iterator<Item = &'a str>, value: String) {
        let Some(segment) = segments.next() else {
            self.value = Some(value);
            return;
        };

        // Sorted entries can interleave a child with its siblings (`a`, `a.b`, `a/c`).
        let child_key = join_key(&self.key, segment);
        let at = match self
            .nodes
            .binary_search_by(|node| node.key.as_str().cmp(child_key.as_str()))
        {
            Ok(at) => at,
            Err(at) => {
                self.nodes.insert(at, Self::dir(child_key));
                at
            }
        };
        self.nodes[at].insert(segments, value);
    }
}

/// Trailing segment of a `/`-separated key.
pub fn base_name(key: &str) -> &str {
    key.trim_end_matches('/').rsplit('/').next().unwrap_or_default()
}

/// Absolute key without a trailing slash (`/` stays `/`).
pub fn normalize_key(key: &str) -> String {
    let trimmed = key.trim_matches('/');
    format!("/{trimmed}")
}

/// Append one segment to a key.
pub fn join_key(parent: &str, segment: &str) -> String {
    if parent == "/" {
        format!("/{segment}")
    } else {
        format!("{parent}/{segment}")
    }
}

fn relative_to<'a>(root: &str, key: &'a str) -> Option<&'a str> {
    if root == "/" {
        return key.strip_prefix('/');
    }
    key.strip_prefix(root).and_then(|rest| rest.strip_prefix('/'))
}
