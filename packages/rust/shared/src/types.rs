//! Core domain types: identifiers, chart kinds, catalog entries and chart payloads.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Arbitrary structured analysis data handed to every content module.
pub type AnalysisInput = serde_json::Value;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Stable identifier of a report module (e.g. `executive_summary`).
///
/// Join key between catalog entries, content blocks and consistency findings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ModuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A UUID v7 wrapper identifying one report-generation run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ChartKind
// ---------------------------------------------------------------------------

/// Closed set of chart kinds a module can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
    Doughnut,
    Radar,
    PolarArea,
    Scatter,
    Bubble,
}

impl ChartKind {
    /// Every kind, in declaration order.
    pub const ALL: [ChartKind; 8] = [
        Self::Bar,
        Self::Line,
        Self::Pie,
        Self::Doughnut,
        Self::Radar,
        Self::PolarArea,
        Self::Scatter,
        Self::Bubble,
    ];

    /// Wire name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Line => "line",
            Self::Pie => "pie",
            Self::Doughnut => "doughnut",
            Self::Radar => "radar",
            Self::PolarArea => "polarArea",
            Self::Scatter => "scatter",
            Self::Bubble => "bubble",
        }
    }

    /// Canonical phrase used when prose refers to this chart.
    pub fn phrase(&self) -> &'static str {
        match self {
            Self::Bar => "bar chart",
            Self::Line => "line chart",
            Self::Pie => "pie chart",
            Self::Doughnut => "doughnut chart",
            Self::Radar => "radar chart",
            Self::PolarArea => "polar area chart",
            Self::Scatter => "scatter plot",
            Self::Bubble => "bubble chart",
        }
    }

    /// Every phrase that names this kind in free text, canonical first.
    pub fn phrases(&self) -> &'static [&'static str] {
        match self {
            Self::Bar => &["bar chart", "bar graph", "column chart"],
            Self::Line => &["line chart", "line graph"],
            Self::Pie => &["pie chart"],
            Self::Doughnut => &["doughnut chart", "donut chart", "ring chart"],
            Self::Radar => &["radar chart", "spider chart"],
            Self::PolarArea => &["polar area chart", "polar chart", "rose chart"],
            Self::Scatter => &["scatter plot", "scatter chart", "scatterplot"],
            Self::Bubble => &["bubble chart", "bubble plot"],
        }
    }

    /// Resolve a phrase (any accepted synonym, case-insensitive) to its kind.
    pub fn from_phrase(phrase: &str) -> Option<Self> {
        let needle = phrase.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.phrases().iter().any(|p| *p == needle))
    }
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChartKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown chart kind '{s}'"))
    }
}

// ---------------------------------------------------------------------------
// CatalogEntry
// ---------------------------------------------------------------------------

/// Immutable catalog record describing what a module is supposed to render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Module identifier.
    pub id: ModuleId,
    /// Section heading used by the renderer.
    pub title: String,
    /// Canonical chart kind for this module.
    pub chart_kind: ChartKind,
    /// Canonical description phrase (e.g. "doughnut chart").
    pub phrase: String,
}

impl CatalogEntry {
    /// Build an entry whose phrase is the chart kind's canonical phrase.
    pub fn new(id: &str, title: &str, chart_kind: ChartKind) -> Self {
        Self {
            id: ModuleId::new(id),
            title: title.to_string(),
            chart_kind,
            phrase: chart_kind.phrase().to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// ChartPayload
// ---------------------------------------------------------------------------

/// A single (x, y[, size]) observation for scatter and bubble charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
}

/// One named series of a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub label: String,
    /// Categorical values aligned with [`ChartPayload::labels`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<f64>,
    /// Point observations (scatter/bubble).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<ChartPoint>,
}

impl Dataset {
    pub fn values(label: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            values,
            points: Vec::new(),
        }
    }

    pub fn points(label: impl Into<String>, points: Vec<ChartPoint>) -> Self {
        Self {
            label: label.into(),
            values: Vec::new(),
            points,
        }
    }
}

/// Raw series data handed to the chart-drawing collaborator.
///
/// `kind` is the chart that is actually rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPayload {
    pub kind: ChartKind,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub datasets: Vec<Dataset>,
}

impl ChartPayload {
    pub fn new(kind: ChartKind, labels: Vec<String>, datasets: Vec<Dataset>) -> Self {
        Self {
            kind,
            labels,
            datasets,
        }
    }

    /// A chart with no data, used by no-data blocks.
    pub fn empty(kind: ChartKind) -> Self {
        Self::new(kind, Vec::new(), Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.datasets
            .iter()
            .all(|d| d.values.is_empty() && d.points.is_empty())
    }
}
