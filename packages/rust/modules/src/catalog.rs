//! The chart descriptor catalog: which chart each module is supposed to render.

use std::collections::HashMap;

use reportforge_shared::{CatalogEntry, ChartKind, ModuleId, ReportForgeError, Result};

/// Built-in catalog rows in report order: (id, title, chart kind).
const BUILTIN: [(&str, &str, ChartKind); 22] = [
    ("executive_summary", "Executive Summary", ChartKind::Doughnut),
    ("market_overview", "Market Overview", ChartKind::Bar),
    ("growth_trajectory", "Growth Trajectory", ChartKind::Line),
    ("competitive_landscape", "Competitive Landscape", ChartKind::Radar),
    ("market_share", "Market Share", ChartKind::Pie),
    ("swot_analysis", "SWOT Analysis", ChartKind::PolarArea),
    ("risk_matrix", "Risk Matrix", ChartKind::Scatter),
    ("customer_segments", "Customer Segments", ChartKind::Doughnut),
    ("revenue_breakdown", "Revenue Breakdown", ChartKind::Pie),
    ("pricing_analysis", "Pricing Analysis", ChartKind::Bar),
    ("technology_adoption", "Technology Adoption", ChartKind::Line),
    ("regulatory_environment", "Regulatory Environment", ChartKind::PolarArea),
    ("supply_chain", "Supply Chain", ChartKind::Bar),
    ("investment_flows", "Investment Flows", ChartKind::Line),
    ("talent_landscape", "Talent Landscape", ChartKind::Radar),
    ("geographic_distribution", "Geographic Distribution", ChartKind::Bar),
    ("partnership_network", "Partnership Network", ChartKind::Bubble),
    ("scenario_planning", "Scenario Planning", ChartKind::Line),
    ("innovation_pipeline", "Innovation Pipeline", ChartKind::Scatter),
    ("financial_health", "Financial Health", ChartKind::Radar),
    ("strategic_recommendations", "Strategic Recommendations", ChartKind::PolarArea),
    ("implementation_roadmap", "Implementation Roadmap", ChartKind::Bar),
];

/// Ordered, immutable set of catalog entries keyed by module id.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    index: HashMap<ModuleId, usize>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate module ids.
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self> {
        let mut index = HashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            if index.insert(entry.id.clone(), position).is_some() {
                return Err(ReportForgeError::validation(format!(
                    "duplicate catalog entry for module '{}'",
                    entry.id
                )));
            }
        }
        Ok(Self { entries, index })
    }

    /// The 22-section strategic report catalog.
    pub fn builtin() -> Self {
        let entries = BUILTIN
            .iter()
            .map(|(id, title, kind)| CatalogEntry::new(id, title, *kind))
            .collect::<Vec<_>>();
        let index = entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.id.clone(), position))
            .collect();
        Self { entries, index }
    }

    pub fn get(&self, id: &ModuleId) -> Option<&CatalogEntry> {
        self.index.get(id).map(|&position| &self.entries[position])
    }

    /// Registration position of a module.
    pub fn position(&self, id: &ModuleId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
