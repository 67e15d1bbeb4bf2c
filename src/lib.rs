//! Bulletin - authoritative task and actual-LRP state store
//!
//! Keeps stored scheduler state honest over time and reads tree-shaped
//! placement snapshots consistently.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, port traits and errors
//! - **Adapters** (`adapters`): SQLite and in-memory stores, metrics sinks
//! - **Service Layer** (`services`): task convergence, actual-LRP reads, work pool
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): operator commands
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use bulletin::adapters::{sqlite::SqliteTaskStore, TracingMetricsSink};
//! use bulletin::domain::ports::SystemClock;
//! use bulletin::services::TaskConvergenceEngine;
//!
//! let engine = TaskConvergenceEngine::new(
//!     Arc::new(SqliteTaskStore::new(pool)),
//!     Arc::new(SystemClock),
//!     Arc::new(TracingMetricsSink),
//! );
//! let result = engine.converge(&live_cells, &config.convergence.thresholds()).await;
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    ActualLRP, ActualLRPFilter, ActualLRPGroup, CellSet, Config, ConvergenceResult,
    ConvergenceThresholds, Task, TaskState,
};
pub use domain::ports::{Clock, MetricsSink, TaskStore, TreeStore, VersionStore};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{ActualLrpReader, TaskConvergenceEngine, WorkPool};
