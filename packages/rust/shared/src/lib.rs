//! Shared types, error model, and configuration for ReportForge.
//!
//! This crate is the foundation depended on by all other ReportForge crates.
//! It provides:
//! - [`ReportForgeError`], [`ModuleError`], [`EnrichmentError`]: the error model
//! - Domain types ([`ModuleId`], [`ChartKind`], [`CatalogEntry`], [`ChartPayload`])
//! - Report types ([`ContentBlock`], [`EnrichmentResult`], [`ConsistencyFinding`], [`ReportResult`])
//! - Configuration ([`AppConfig`], [`RunConfig`], config loading)

pub mod config;
pub mod error;
pub mod report;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, EnrichmentMode, EnrichmentSection, EnrichmentSettings, ModuleConfig, RunConfig,
    RunSection, config_dir, config_file_path, init_config, load_config, load_config_from,
    validate_config,
};
pub use error::{EnrichmentError, ModuleError, ReportForgeError, Result};
pub use report::{
    BlockFailure, ConsistencyFinding, ContentBlock, DeclaredKind, Discrepancy, EnrichmentResult,
    FailureKind, Provenance, ReportResult, RunStats, RunStatus, Severity,
};
pub use types::{
    AnalysisInput, CatalogEntry, ChartKind, ChartPayload, ChartPoint, Dataset, ModuleId, RunId,
};
