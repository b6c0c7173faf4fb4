//! Report-level data: content blocks, enrichment results, consistency findings
//! and the [`ReportResult`] handed to the rendering collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CatalogEntry, ChartKind, ChartPayload, ModuleId, RunId};

// ---------------------------------------------------------------------------
// Enrichment
// ---------------------------------------------------------------------------

/// Where an enrichment result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Live,
    Fallback,
}

/// Best-effort intelligence attached to a module's content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    /// Confidence in `[0, 1]`. Only live results reach 1.0.
    pub confidence: f64,
    pub provenance: Provenance,
    pub payload: serde_json::Value,
}

impl EnrichmentResult {
    pub fn is_fallback(&self) -> bool {
        self.provenance == Provenance::Fallback
    }
}

// ---------------------------------------------------------------------------
// ContentBlock
// ---------------------------------------------------------------------------

/// Why a module contributed a placeholder instead of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    GenerationFailure,
    Timeout,
    DeadlineExceeded,
    Panicked,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GenerationFailure => "generation_failure",
            Self::Timeout => "timeout",
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::Panicked => "panicked",
        }
    }
}

/// Error marker carried by a placeholder block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl BlockFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// One assembled report section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub module_id: ModuleId,
    pub title: String,
    pub prose: String,
    /// Chart kind the module declared for itself.
    #[serde(default)]
    pub declared_kind: Option<ChartKind>,
    /// Chart kind actually attached to the payload.
    #[serde(default)]
    pub rendered_kind: Option<ChartKind>,
    #[serde(default)]
    pub series: Option<ChartPayload>,
    #[serde(default)]
    pub enrichment: Option<EnrichmentResult>,
    /// Whether the enrichment met the configured confidence threshold.
    #[serde(default)]
    pub enrichment_surfaced: bool,
    /// The module had no data and produced its canonical empty block.
    #[serde(default)]
    pub no_data: bool,
    #[serde(default)]
    pub failure: Option<BlockFailure>,
}

impl ContentBlock {
    /// Placeholder for a module that failed, timed out or was cancelled.
    pub fn placeholder(entry: &CatalogEntry, failure: BlockFailure) -> Self {
        let prose = format!(
            "The {} section could not be generated for this report ({}).",
            entry.title,
            failure.kind.as_str()
        );
        Self {
            module_id: entry.id.clone(),
            title: entry.title.clone(),
            prose,
            declared_kind: None,
            rendered_kind: None,
            series: None,
            enrichment: None,
            enrichment_surfaced: false,
            no_data: false,
            failure: Some(failure),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.failure.is_some()
    }

    pub fn used_fallback(&self) -> bool {
        self.enrichment.as_ref().is_some_and(EnrichmentResult::is_fallback)
    }

    /// Anything that makes this block less than fully generated, live content.
    pub fn is_degraded(&self) -> bool {
        self.is_placeholder() || self.no_data || self.used_fallback()
    }
}

// ---------------------------------------------------------------------------
// Consistency findings
// ---------------------------------------------------------------------------

/// Chart kind stated for a module: a single kind, or every kind mentioned
/// when the prose is ambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeclaredKind {
    Stated(ChartKind),
    Ambiguous(Vec<ChartKind>),
}

impl DeclaredKind {
    pub fn stated(&self) -> Option<ChartKind> {
        match self {
            Self::Stated(kind) => Some(*kind),
            Self::Ambiguous(_) => None,
        }
    }
}

impl std::fmt::Display for DeclaredKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stated(kind) => write!(f, "{kind}"),
            Self::Ambiguous(kinds) => {
                let names: Vec<&str> = kinds.iter().map(ChartKind::as_str).collect();
                write!(f, "ambiguous({})", names.join("|"))
            }
        }
    }
}

/// Which pair of chart-kind sources disagreed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Discrepancy {
    CatalogVsRendered,
    CatalogVsText,
    TextVsRendered,
    AmbiguousText,
}

/// Consistency issues never block delivery; there is no fatal level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

/// A recorded disagreement between catalog, text and rendered chart kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyFinding {
    pub module_id: ModuleId,
    pub expected_kind: ChartKind,
    pub declared_kind: DeclaredKind,
    pub rendered_kind: Option<ChartKind>,
    pub severity: Severity,
    pub issues: Vec<Discrepancy>,
}

// ---------------------------------------------------------------------------
// ReportResult
// ---------------------------------------------------------------------------

/// Run-level outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Complete,
    Degraded,
}

impl RunStatus {
    pub fn from_blocks(blocks: &[ContentBlock]) -> Self {
        if blocks.iter().any(ContentBlock::is_degraded) {
            Self::Degraded
        } else {
            Self::Complete
        }
    }
}

/// Aggregate counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub modules: usize,
    pub generated: usize,
    pub no_data: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub cancelled: usize,
    pub live_enrichments: usize,
    pub fallback_enrichments: usize,
    pub elapsed_ms: u64,
}

impl RunStats {
    pub fn from_blocks(blocks: &[ContentBlock], elapsed_ms: u64) -> Self {
        let mut stats = Self {
            modules: blocks.len(),
            elapsed_ms,
            ..Default::default()
        };
        for block in blocks {
            match block.failure.as_ref().map(|f| f.kind) {
                None if block.no_data => stats.no_data += 1,
                None => stats.generated += 1,
                Some(FailureKind::Timeout) => stats.timed_out += 1,
                Some(FailureKind::DeadlineExceeded) => stats.cancelled += 1,
                Some(FailureKind::GenerationFailure | FailureKind::Panicked) => stats.failed += 1,
            }
            match block.enrichment.as_ref().map(|e| e.provenance) {
                Some(Provenance::Live) => stats.live_enrichments += 1,
                Some(Provenance::Fallback) => stats.fallback_enrichments += 1,
                None => {}
            }
        }
        stats
    }
}

/// Everything produced by one report-generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportResult {
    pub run_id: RunId,
    pub generated_at: DateTime<Utc>,
    pub status: RunStatus,
    /// One block per catalog entry, in catalog order.
    pub blocks: Vec<ContentBlock>,
    pub findings: Vec<ConsistencyFinding>,
    pub stats: RunStats,
}

impl ReportResult {
    pub fn block(&self, id: &ModuleId) -> Option<&ContentBlock> {
        self.blocks.iter().find(|b| &b.module_id == id)
    }
}
