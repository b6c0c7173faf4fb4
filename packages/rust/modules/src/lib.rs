//! Report sections for ReportForge.
//!
//! - [`Catalog`]: which chart each section is declared to render
//! - [`ContentModule`]: the section generator contract
//! - [`ModuleRegistry`]: the catalog bound to one module per entry
//!
//! The built-in registry carries 22 strategic-analysis sections. Each reads its
//! own object from the analysis input, keyed by module id.

pub mod catalog;
pub mod data;
pub mod prose;
pub mod sample;
pub mod sections;

pub use catalog::Catalog;
pub use sample::sample_input;
pub use sections::{ContentModule, ModuleOutput, ModuleRegistry, builtin_modules};
