//! Enrichment for ReportForge content blocks.
//!
//! Two [`EnrichmentClient`] variants sit behind a per-run [`EnrichmentSession`]:
//! the HTTP [`LiveEnrichmentClient`] and the static [`FallbackEnrichmentClient`].
//! The session's [`CircuitBreaker`] stops calling the live backend once it has
//! failed repeatedly within a run.

pub mod breaker;
pub mod client;
pub mod fallback;
pub mod live;
pub mod session;

pub use breaker::CircuitBreaker;
pub use client::EnrichmentClient;
pub use fallback::{FALLBACK_CONFIDENCE, FallbackEnrichmentClient};
pub use live::{LIVE_CONFIDENCE, LiveEnrichmentClient};
pub use session::EnrichmentSession;
