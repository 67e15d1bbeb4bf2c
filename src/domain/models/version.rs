//! Data version record kept in the configuration table.

use serde::{Deserialize, Serialize};

/// Schema version the stored data is at, and the one it is heading to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub current_version: i64,
    pub target_version: i64,
}

impl Version {
    pub const fn new(current_version: i64, target_version: i64) -> Self {
        Self {
            current_version,
            target_version,
        }
    }

    pub const fn is_current(&self) -> bool {
        self.current_version >= self.target_version
    }
}
