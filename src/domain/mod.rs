//! Domain layer for the bulletin state store
//!
//! Models, the ports the services depend on, and the error type they share.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
