//! The content module trait, the built-in report sections, and the registry
//! that binds them to the catalog.

mod competition;
mod executive;
mod finance;
mod market;
mod operations;
mod risk;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use reportforge_shared::{
    AnalysisInput, CatalogEntry, ChartKind, ChartPayload, ChartPoint, Dataset, ModuleConfig,
    ModuleError, ModuleId, ReportForgeError, Result,
};

use crate::catalog::Catalog;
use crate::data::{self, Entry, SeriesTable};
use crate::prose;

pub use competition::{CompetitiveLandscape, PartnershipNetwork, PricingAnalysis, SwotAnalysis};
pub use executive::{ExecutiveSummary, ImplementationRoadmap, StrategicRecommendations};
pub use finance::{FinancialHealth, InvestmentFlows, RevenueBreakdown, ScenarioPlanning};
pub use market::{
    CustomerSegments, GeographicDistribution, GrowthTrajectory, MarketOverview, MarketShare,
};
pub use operations::{InnovationPipeline, SupplyChain, TalentLandscape, TechnologyAdoption};
pub use risk::{RegulatoryEnvironment, RiskMatrix};

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// What a module produces: prose, the chart kind it claims, and the chart itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleOutput {
    pub prose: String,
    pub declared_kind: ChartKind,
    pub series: ChartPayload,
    /// Canonical no-data block rather than computed content.
    pub no_data: bool,
}

impl ModuleOutput {
    pub fn new(prose: String, declared_kind: ChartKind, series: ChartPayload) -> Self {
        Self {
            prose,
            declared_kind,
            series,
            no_data: false,
        }
    }

    /// Canonical block for a module whose input section is absent or empty.
    pub fn no_data(kind: ChartKind, topic: &str) -> Self {
        let prose = format!(
            "The {} for {topic} is empty: no {topic} data was supplied for this analysis.",
            kind.phrase()
        );
        Self {
            prose,
            declared_kind: kind,
            series: ChartPayload::empty(kind),
            no_data: true,
        }
    }

    /// Apply the prose length cap from the module config.
    pub fn fitted(mut self, config: &ModuleConfig) -> Self {
        self.prose = prose::fit(&self.prose, config.max_prose_length);
        self
    }
}

/// A self-contained report section generator.
///
/// Output must be a pure function of `input` and `config`. Malformed input is a
/// [`ModuleError::GenerationFailure`]; missing data is not, and yields
/// [`ModuleOutput::no_data`].
#[async_trait]
pub trait ContentModule: Send + Sync {
    /// Catalog id this module is registered under.
    fn id(&self) -> &str;

    /// Produce prose and chart data for this section.
    async fn generate(
        &self,
        input: &AnalysisInput,
        config: &ModuleConfig,
    ) -> std::result::Result<ModuleOutput, ModuleError>;
}

// ---------------------------------------------------------------------------
// Payload builders
// ---------------------------------------------------------------------------

/// One categorical dataset over entry labels.
fn categorical(kind: ChartKind, dataset: &str, entries: &[Entry]) -> ChartPayload {
    ChartPayload::new(
        kind,
        data::labels(entries),
        vec![Dataset::values(dataset, data::values(entries))],
    )
}

/// One dataset per series, aligned against the table axes.
fn tabular(kind: ChartKind, table: &SeriesTable) -> ChartPayload {
    let datasets = table
        .series
        .iter()
        .map(|s| Dataset::values(s.name.clone(), s.values.clone()))
        .collect();
    ChartPayload::new(kind, table.axes.clone(), datasets)
}

/// One point dataset.
fn plotted(kind: ChartKind, dataset: &str, points: Vec<ChartPoint>) -> ChartPayload {
    ChartPayload::new(kind, Vec::new(), vec![Dataset::points(dataset, points)])
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Catalog plus exactly one module per entry, held in catalog order.
pub struct ModuleRegistry {
    catalog: Arc<Catalog>,
    modules: Vec<Arc<dyn ContentModule>>,
}

impl ModuleRegistry {
    /// Pair modules with catalog entries.
    ///
    /// Fails unless every entry has exactly one module and every module has an entry.
    pub fn new(catalog: Catalog, modules: Vec<Arc<dyn ContentModule>>) -> Result<Self> {
        let mut by_id: HashMap<ModuleId, Arc<dyn ContentModule>> =
            HashMap::with_capacity(modules.len());
        for module in modules {
            let id = ModuleId::new(module.id());
            if catalog.get(&id).is_none() {
                return Err(ReportForgeError::validation(format!(
                    "module '{id}' has no catalog entry"
                )));
            }
            if by_id.insert(id.clone(), module).is_some() {
                return Err(ReportForgeError::validation(format!(
                    "module '{id}' registered twice"
                )));
            }
        }

        let mut ordered = Vec::with_capacity(catalog.len());
        for entry in catalog.iter() {
            let module = by_id.remove(&entry.id).ok_or_else(|| {
                ReportForgeError::validation(format!(
                    "catalog entry '{}' has no registered module",
                    entry.id
                ))
            })?;
            ordered.push(module);
        }

        debug!(modules = ordered.len(), "module registry built");
        Ok(Self {
            catalog: Arc::new(catalog),
            modules: ordered,
        })
    }

    /// The 22 built-in report sections bound to the built-in catalog.
    pub fn builtin() -> Result<Self> {
        Self::new(Catalog::builtin(), builtin_modules())
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// `(entry, module)` pairs in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (&CatalogEntry, &Arc<dyn ContentModule>)> {
        self.catalog.iter().zip(self.modules.iter())
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// One instance of every built-in section.
pub fn builtin_modules() -> Vec<Arc<dyn ContentModule>> {
    vec![
        Arc::new(ExecutiveSummary),
        Arc::new(MarketOverview),
        Arc::new(GrowthTrajectory),
        Arc::new(CompetitiveLandscape),
        Arc::new(MarketShare),
        Arc::new(SwotAnalysis),
        Arc::new(RiskMatrix),
        Arc::new(CustomerSegments),
        Arc::new(RevenueBreakdown),
        Arc::new(PricingAnalysis),
        Arc::new(TechnologyAdoption),
        Arc::new(RegulatoryEnvironment),
        Arc::new(SupplyChain),
        Arc::new(InvestmentFlows),
        Arc::new(TalentLandscape),
        Arc::new(GeographicDistribution),
        Arc::new(PartnershipNetwork),
        Arc::new(ScenarioPlanning),
        Arc::new(InnovationPipeline),
        Arc::new(FinancialHealth),
        Arc::new(StrategicRecommendations),
        Arc::new(ImplementationRoadmap),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::sample_input;
    use serde_json::json;

    #[test]
    fn builtin_registry_covers_catalog() {
        let registry = ModuleRegistry::builtin().expect("builtin registry");
        assert_eq!(registry.len(), registry.catalog().len());
        for (entry, module) in registry.iter() {
            assert_eq!(entry.id.as_str(), module.id());
        }
    }

    #[test]
    fn registry_reorders_into_catalog_order() {
        let mut modules = builtin_modules();
        modules.reverse();
        let registry = ModuleRegistry::new(Catalog::builtin(), modules).unwrap();
        let first = registry.iter().next().unwrap();
        assert_eq!(first.1.id(), "executive_summary");
    }

    #[test]
    fn registry_rejects_missing_module() {
        let mut modules = builtin_modules();
        modules.pop();
        let err = ModuleRegistry::new(Catalog::builtin(), modules).err().unwrap();
        assert!(err.to_string().contains("implementation_roadmap"));
    }

    #[test]
    fn registry_rejects_duplicates() {
        let mut modules = builtin_modules();
        modules.push(Arc::new(MarketShare));
        let err = ModuleRegistry::new(Catalog::builtin(), modules).err().unwrap();
        assert!(err.to_string().contains("registered twice"));
    }

    #[test]
    fn registry_rejects_uncatalogued_module() {
        let catalog = Catalog::new(vec![CatalogEntry::new(
            "market_share",
            "Market Share",
            ChartKind::Pie,
        )])
        .unwrap();
        let modules: Vec<Arc<dyn ContentModule>> = vec![Arc::new(MarketShare), Arc::new(RiskMatrix)];
        let err = ModuleRegistry::new(catalog, modules).err().unwrap();
        assert!(err.to_string().contains("risk_matrix"));
    }

    #[test]
    fn no_data_block_names_its_chart() {
        let out = ModuleOutput::no_data(ChartKind::Radar, "competitor");
        assert!(out.no_data);
        assert!(out.prose.starts_with("The radar chart"));
        assert!(out.series.is_empty());
    }

    /// Every built-in module with empty input yields its catalog chart and
    /// names only that chart in its prose.
    #[tokio::test]
    async fn empty_input_degrades_to_no_data_everywhere() {
        let registry = ModuleRegistry::builtin().unwrap();
        let input = json!({});
        let config = ModuleConfig::default();
        for (entry, module) in registry.iter() {
            let out = module.generate(&input, &config).await.expect("no-data block");
            assert!(out.no_data, "{} should report no data", entry.id);
            assert_eq!(out.series.kind, entry.chart_kind, "{}", entry.id);
            assert_eq!(out.declared_kind, entry.chart_kind, "{}", entry.id);
            assert!(out.prose.contains(&entry.phrase), "{}", entry.id);
        }
    }

    #[tokio::test]
    async fn sample_input_generates_every_section() {
        let registry = ModuleRegistry::builtin().unwrap();
        let input = sample_input();
        let config = ModuleConfig::default();
        for (entry, module) in registry.iter() {
            let out = module
                .generate(&input, &config)
                .await
                .unwrap_or_else(|e| panic!("{} failed: {e}", entry.id));
            assert!(!out.no_data, "{} unexpectedly empty", entry.id);
            assert_eq!(out.series.kind, entry.chart_kind, "{}", entry.id);
            assert!(!out.series.is_empty(), "{}", entry.id);
            assert!(out.prose.contains(&entry.phrase), "{}", entry.id);
            assert!(out.prose.chars().count() <= config.max_prose_length);
        }
    }

    #[tokio::test]
    async fn generation_is_deterministic() {
        let registry = ModuleRegistry::builtin().unwrap();
        let input = sample_input();
        let config = ModuleConfig::default();
        for (_, module) in registry.iter() {
            let a = module.generate(&input, &config).await.unwrap();
            let b = module.generate(&input, &config).await.unwrap();
            assert_eq!(a, b);
        }
    }

    #[tokio::test]
    async fn prose_cap_keeps_chart_phrase() {
        let registry = ModuleRegistry::builtin().unwrap();
        let input = sample_input();
        let config = ModuleConfig {
            max_prose_length: 80,
            ..ModuleConfig::default()
        };
        for (entry, module) in registry.iter() {
            let out = module.generate(&input, &config).await.unwrap();
            assert!(out.prose.chars().count() <= 80, "{}", entry.id);
            assert!(out.prose.contains(&entry.phrase), "{}: {}", entry.id, out.prose);
        }
    }
}
