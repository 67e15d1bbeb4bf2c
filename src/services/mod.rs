pub mod actual_lrp_reader;
pub mod task_convergence;
pub mod work_pool;

pub use actual_lrp_reader::{parse_process_subtree, ActualLrpReader};
pub use task_convergence::TaskConvergenceEngine;
pub use work_pool::{WorkPool, WorkPoolError};
