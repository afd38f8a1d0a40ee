//! Fleet-scale benchmark orchestrator for ephemeral cloud compute
//! instances: fire-and-forget launch, object-store rendezvous, and
//! multi-iteration statistical aggregation.

pub mod aggregate;
pub mod arch;
pub mod cloud;
pub mod collector;
pub mod config;
pub mod errors;
pub mod launcher;
pub mod model;
pub mod payload;
pub mod retry;
pub mod suites;

pub use collector::Collector;
pub use config::OrchestratorConfig;
pub use errors::OrchestratorError;
pub use launcher::{BatchResult, Launcher};

/// Current crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
