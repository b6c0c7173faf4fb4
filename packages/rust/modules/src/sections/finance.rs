//! Financial sections.

use async_trait::async_trait;

use reportforge_shared::{AnalysisInput, ChartKind, ModuleConfig, ModuleError};

use super::{ContentModule, ModuleOutput, categorical, tabular};
use crate::data::{self, SeriesTable};
use crate::prose::{count, list, num, pct, percent};

// ---------------------------------------------------------------------------
// Revenue breakdown
// ---------------------------------------------------------------------------

pub struct RevenueBreakdown;

/// `1 - sum(share^2)`, 0 for a single stream and approaching 1 as revenue spreads out.
fn diversification(values: &[f64], total: f64) -> f64 {
    1.0 - values.iter().map(|v| (v / total).powi(2)).sum::<f64>()
}

fn diversification_band(index: f64) -> &'static str {
    if index < 0.4 {
        "concentrated"
    } else if index < 0.6 {
        "moderately diversified"
    } else {
        "well diversified"
    }
}

#[async_trait]
impl ContentModule for RevenueBreakdown {
    fn id(&self) -> &str {
        "revenue_breakdown"
    }

    async fn generate(
        &self,
        input: &AnalysisInput,
        config: &ModuleConfig,
    ) -> Result<ModuleOutput, ModuleError> {
        let kind = ChartKind::Pie;
        let Some((_, streams)) = data::section_entries(input, self.id(), "streams")? else {
            return Ok(ModuleOutput::no_data(kind, "revenue"));
        };
        let total = data::positive_total(&streams, "revenue streams")?;
        let dominant = data::largest(&streams).ok_or_else(|| ModuleError::generation("no streams"))?;
        let index = diversification(&data::values(&streams), total);

        let text = format!(
            "The {} splits revenue for {} across {}. {} is the dominant stream at {}, and the \
             diversification index of {index:.2} marks the mix as {}.",
            kind.phrase(),
            data::subject(input),
            count(streams.len(), "stream"),
            dominant.label,
            pct(percent(dominant.value, total)),
            diversification_band(index),
        );

        Ok(ModuleOutput::new(text, kind, categorical(kind, "Revenue", &streams)).fitted(config))
    }
}

// ---------------------------------------------------------------------------
// Investment flows
// ---------------------------------------------------------------------------

pub struct InvestmentFlows;

/// Second-half total against first-half total.
fn momentum(values: &[f64]) -> Option<&'static str> {
    if values.len() < 2 {
        return None;
    }
    let (early, late) = values.split_at(values.len() / 2);
    let early: f64 = early.iter().sum();
    let late: f64 = late.iter().sum();
    Some(if late > early {
        "accelerating"
    } else if late < early {
        "slowing"
    } else {
        "steady"
    })
}

#[async_trait]
impl ContentModule for InvestmentFlows {
    fn id(&self) -> &str {
        "investment_flows"
    }

    async fn generate(
        &self,
        input: &AnalysisInput,
        config: &ModuleConfig,
    ) -> Result<ModuleOutput, ModuleError> {
        let kind = ChartKind::Line;
        let Some((_, quarters)) = data::section_entries(input, self.id(), "quarters")? else {
            return Ok(ModuleOutput::no_data(kind, "investment"));
        };
        let values = data::values(&quarters);
        let net = data::total(&quarters);
        let inflows = values.iter().filter(|v| **v > 0.0).count();
        let outflows = values.iter().filter(|v| **v < 0.0).count();
        let direction = if net >= 0.0 { "an inflow" } else { "an outflow" };

        let mut text = format!(
            "The {} follows capital movements over {}. The net position is {direction} of {}, \
             with {} and {}.",
            kind.phrase(),
            count(quarters.len(), "period"),
            num(net.abs()),
            count(inflows, "inflow period"),
            count(outflows, "outflow period"),
        );
        if let Some(trend) = momentum(&values) {
            text.push_str(&format!(" Momentum is {trend} into the later periods."));
        }

        Ok(ModuleOutput::new(text, kind, categorical(kind, "Net flow", &quarters)).fitted(config))
    }
}

// ---------------------------------------------------------------------------
// Financial health
// ---------------------------------------------------------------------------

pub struct FinancialHealth;

fn extreme_axes(table: &SeriesTable, values: &[f64]) -> (String, String) {
    let mut strongest = 0;
    let mut weakest = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[strongest] {
            strongest = i;
        }
        if *v < values[weakest] {
            weakest = i;
        }
    }
    (table.axes[strongest].clone(), table.axes[weakest].clone())
}

#[async_trait]
impl ContentModule for FinancialHealth {
    fn id(&self) -> &str {
        "financial_health"
    }

    async fn generate(
        &self,
        input: &AnalysisInput,
        config: &ModuleConfig,
    ) -> Result<ModuleOutput, ModuleError> {
        let kind = ChartKind::Radar;
        let Some(table) = data::section_table(input, self.id(), "ratios", "profiles")? else {
            return Ok(ModuleOutput::no_data(kind, "financial ratio"));
        };
        let company = &table.series[0];
        let (strongest, weakest) = extreme_axes(&table, &company.values);

        let mut text = format!(
            "The {} profiles {} across {}. {strongest} is the strongest ratio and {weakest} the \
             weakest.",
            kind.phrase(),
            company.name,
            count(table.axes.len(), "financial ratio"),
        );
        if let Some(benchmark) = table.series.get(1) {
            let ahead: Vec<&str> = table
                .axes
                .iter()
                .zip(company.values.iter().zip(&benchmark.values))
                .filter(|(_, (own, other))| own > other)
                .map(|(axis, _)| axis.as_str())
                .collect();
            if ahead.is_empty() {
                text.push_str(&format!(" {} trails {} on every ratio.", company.name, benchmark.name));
            } else {
                text.push_str(&format!(
                    " Against {}, it is ahead on {} of {}: {}.",
                    benchmark.name,
                    ahead.len(),
                    table.axes.len(),
                    list(&ahead),
                ));
            }
        }

        Ok(ModuleOutput::new(text, kind, tabular(kind, &table)).fitted(config))
    }
}

// ---------------------------------------------------------------------------
// Scenario planning
// ---------------------------------------------------------------------------

pub struct ScenarioPlanning;

#[async_trait]
impl ContentModule for ScenarioPlanning {
    fn id(&self) -> &str {
        "scenario_planning"
    }

    async fn generate(
        &self,
        input: &AnalysisInput,
        config: &ModuleConfig,
    ) -> Result<ModuleOutput, ModuleError> {
        let kind = ChartKind::Line;
        let Some(table) = data::section_table(input, self.id(), "periods", "scenarios")? else {
            return Ok(ModuleOutput::no_data(kind, "scenario"));
        };
        let horizon = table.axes.len() - 1;
        let at_horizon = |i: usize| table.series[i].values[horizon];

        let mut best = 0;
        let mut worst = 0;
        for i in 1..table.series.len() {
            if at_horizon(i) > at_horizon(best) {
                best = i;
            }
            if at_horizon(i) < at_horizon(worst) {
                worst = i;
            }
        }

        let mut text = format!(
            "The {} projects {} through {}.",
            kind.phrase(),
            count(table.series.len(), "scenario"),
            table.axes[horizon],
        );
        if best == worst {
            text.push_str(&format!(
                " {} reaches {} at the horizon.",
                table.series[best].name,
                num(at_horizon(best))
            ));
        } else {
            let spread = at_horizon(best) - at_horizon(worst);
            text.push_str(&format!(
                " {} ends highest at {} and {} lowest at {}, a spread of {} ({} of the low case).",
                table.series[best].name,
                num(at_horizon(best)),
                table.series[worst].name,
                num(at_horizon(worst)),
                num(spread),
                pct(percent(spread, at_horizon(worst).abs())),
            ));
        }

        Ok(ModuleOutput::new(text, kind, tabular(kind, &table)).fitted(config))
    }
}
