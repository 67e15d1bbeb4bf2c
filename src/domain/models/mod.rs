pub mod actual_lrp;
pub mod cell;
pub mod config;
pub mod convergence;
pub mod task;
pub mod tree;
pub mod version;

pub use actual_lrp::{
    actual_lrp_index_dir, actual_lrp_process_dir, actual_lrp_schema_path,
    evacuating_actual_lrp_schema_path, ActualLRP, ActualLRPFilter, ActualLRPGroup, ActualLRPState,
    ACTUAL_LRP_EVACUATING_KEY, ACTUAL_LRP_INSTANCE_KEY, ACTUAL_LRP_SCHEMA_ROOT,
};
pub use cell::{CellPresence, CellSet};
pub use config::{ActualLrpConfig, Config, ConvergenceConfig, DatabaseConfig, LoggingConfig};
pub use convergence::{ConvergenceReport, ConvergenceResult, ConvergenceThresholds};
pub use task::{
    Task, TaskDefinition, TaskStartRequest, TaskState, TaskStateCounts,
    FAILURE_REASON_CELL_DISAPPEARED, FAILURE_REASON_NOT_STARTED,
};
pub use tree::TreeNode;
pub use version::Version;
