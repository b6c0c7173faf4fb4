//! Report orchestration for ReportForge.
//!
//! Runs every content module concurrently under per-module timeouts and an
//! overall deadline, layers enrichment on top, and cross-checks the chart kind
//! each block claims against the catalog and the rendered payload.

pub mod orchestrator;
pub mod runner;
pub mod verifier;

pub use orchestrator::{Orchestrator, RunProgress, SilentProgress};
pub use runner::ModuleRunner;
pub use verifier::{ConsistencyVerifier, ProseMention, scan_prose};
