//! Actual long-running-process records.
//!
//! Each instance slot `(process_guid, index)` of an LRP owns a directory in the
//! tree store holding at most two records: `instance` and `evacuating`.
//! Which side a record belongs to is decided purely by its key.

use serde::{Deserialize, Serialize};

/// Root of the actual-LRP namespace in the tree store.
pub const ACTUAL_LRP_SCHEMA_ROOT: &str = "/v1/actual";
/// Key name of the live instance record of a slot.
pub const ACTUAL_LRP_INSTANCE_KEY: &str = "instance";
/// Key name of the evacuating record of a slot.
pub const ACTUAL_LRP_EVACUATING_KEY: &str = "evacuating";

pub fn actual_lrp_process_dir(process_guid: &str) -> String {
    format!("{ACTUAL_LRP_SCHEMA_ROOT}/{process_guid}")
}

pub fn actual_lrp_index_dir(process_guid: &str, index: i32) -> String {
    format!("{}/{index}", actual_lrp_process_dir(process_guid))
}

pub fn actual_lrp_schema_path(process_guid: &str, index: i32) -> String {
    format!("{}/{ACTUAL_LRP_INSTANCE_KEY}", actual_lrp_index_dir(process_guid, index))
}

pub fn evacuating_actual_lrp_schema_path(process_guid: &str, index: i32) -> String {
    format!("{}/{ACTUAL_LRP_EVACUATING_KEY}", actual_lrp_index_dir(process_guid, index))
}

/// Observed runtime state of one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActualLRPState {
    Unclaimed,
    Claimed,
    Running,
    Crashed,
}

impl ActualLRPState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unclaimed => "UNCLAIMED",
            Self::Claimed => "CLAIMED",
            Self::Running => "RUNNING",
            Self::Crashed => "CRASHED",
        }
    }
}

/// One observed actual-LRP record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActualLRP {
    pub process_guid: String,
    pub index: i32,
    pub domain: String,
    #[serde(default)]
    pub instance_guid: String,
    #[serde(default)]
    pub cell_id: String,
    pub state: ActualLRPState,
    /// Unix nanoseconds of the last state change
    #[serde(default)]
    pub since: i64,
    #[serde(default)]
    pub crash_count: i32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub placement_error: String,
}

/// Instance and evacuating records of one slot.
///
/// At least one side is populated in every group handed out by the reader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActualLRPGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<ActualLRP>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evacuating: Option<ActualLRP>,
}

impl ActualLRPGroup {
    pub const fn is_empty(&self) -> bool {
        self.instance.is_none() && self.evacuating.is_none()
    }

    /// Either populated record; the instance side wins when both exist.
    pub fn resolve(&self) -> Option<&ActualLRP> {
        self.instance.as_ref().or(self.evacuating.as_ref())
    }
}

/// Restricts a bulk read by domain and/or cell. Empty fields do not restrict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActualLRPFilter {
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub cell_id: String,
}

impl ActualLRPFilter {
    pub fn new(domain: impl Into<String>, cell_id: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            cell_id: cell_id.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.domain.is_empty() && self.cell_id.is_empty()
    }

    pub fn matches_domain(&self, lrp: &ActualLRP) -> bool {
        self.domain.is_empty() || lrp.domain == self.domain
    }

    pub fn matches_cell(&self, lrp: &ActualLRP) -> bool {
        self.cell_id.is_empty() || lrp.cell_id == self.cell_id
    }

    pub fn matches(&self, lrp: &ActualLRP) -> bool {
        self.matches_domain(lrp) && self.matches_cell(lrp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lrp(domain: &str, cell_id: &str) -> ActualLRP {
        ActualLRP {
            process_guid: "proc".to_string(),
            index: 0,
            domain: domain.to_string(),
            instance_guid: "ig".to_string(),
            cell_id: cell_id.to_string(),
            state: ActualLRPState::Running,
            since: 0,
            crash_count: 0,
            placement_error: String::new(),
        }
    }

    #[test]
    fn test_schema_paths() {
        assert_eq!(actual_lrp_process_dir("p"), "/v1/actual/p");
        assert_eq!(actual_lrp_index_dir("p", 3), "/v1/actual/p/3");
        assert_eq!(actual_lrp_schema_path("p", 3), "/v1/actual/p/3/instance");
        assert_eq!(
            evacuating_actual_lrp_schema_path("p", 3),
            "/v1/actual/p/3/evacuating"
        );
    }

    #[test]
    fn test_filter_matching() {
        let record = lrp("cf-apps", "cell-1");
        assert!(ActualLRPFilter::default().matches(&record));
        assert!(ActualLRPFilter::new("cf-apps", "").matches(&record));
        assert!(ActualLRPFilter::new("", "cell-1").matches(&record));
        assert!(!ActualLRPFilter::new("cf-tasks", "").matches(&record));
        assert!(!ActualLRPFilter::new("cf-apps", "cell-2").matches(&record));
    }

    #[test]
    fn test_state_serializes_uppercase() {
        let json = serde_json::to_value(lrp("d", "c")).unwrap();
        assert_eq!(json["state"], "RUNNING");
        assert_eq!(ActualLRPState::Crashed.as_str(), "CRASHED");
    }

    #[test]
    fn test_group_resolve_prefers_instance() {
        let group = ActualLRPGroup {
            instance: Some(lrp("d", "new-cell")),
            evacuating: Some(lrp("d", "old-cell")),
        };
        assert_eq!(group.resolve().map(|l| l.cell_id.as_str()), Some("new-cell"));
        assert!(ActualLRPGroup::default().is_empty());
    }
}
