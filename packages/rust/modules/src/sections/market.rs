//! Market sizing and structure sections.

use async_trait::async_trait;

use reportforge_shared::{AnalysisInput, ChartKind, ModuleConfig, ModuleError};

use super::{ContentModule, ModuleOutput, categorical};
use crate::data;
use crate::prose::{count, list, num, pct, percent};

/// Herfindahl-Hirschman bands on the 0..10000 scale.
const HHI_UNCONCENTRATED: f64 = 1500.0;
const HHI_MODERATE: f64 = 2500.0;

/// Segment share that makes a customer segment part of the core.
const CORE_SEGMENT_SHARE: f64 = 20.0;
/// Segment share below which a segment sits in the long tail.
const LONG_TAIL_SHARE: f64 = 10.0;

/// Cumulative share used to measure geographic concentration.
const REGION_COVERAGE: f64 = 80.0;

// ---------------------------------------------------------------------------
// Market overview
// ---------------------------------------------------------------------------

pub struct MarketOverview;

#[async_trait]
impl ContentModule for MarketOverview {
    fn id(&self) -> &str {
        "market_overview"
    }

    async fn generate(
        &self,
        input: &AnalysisInput,
        config: &ModuleConfig,
    ) -> Result<ModuleOutput, ModuleError> {
        let kind = ChartKind::Bar;
        let Some((section, segments)) = data::section_entries(input, self.id(), "segments")? else {
            return Ok(ModuleOutput::no_data(kind, "market segment"));
        };
        let total = data::positive_total(&segments, "segment sizes")?;
        let unit = data::text(section, "unit")?
            .map(|u| format!(" {u}"))
            .unwrap_or_default();
        let ranked = data::ranked(&segments);
        let top3: f64 = ranked.iter().take(3).map(|e| e.value).sum();
        let lead = ranked[0];

        let text = format!(
            "The {} sizes {} of the market addressed by {}, totalling {}{unit}. {} is the largest \
             at {}{unit} ({}), and the top three segments account for {} of the total.",
            kind.phrase(),
            count(segments.len(), "segment"),
            data::subject(input),
            num(total),
            lead.label,
            num(lead.value),
            pct(percent(lead.value, total)),
            pct(percent(top3, total)),
        );

        Ok(ModuleOutput::new(text, kind, categorical(kind, "Market size", &segments)).fitted(config))
    }
}

// ---------------------------------------------------------------------------
// Market share
// ---------------------------------------------------------------------------

pub struct MarketShare;

fn concentration_band(hhi: f64) -> &'static str {
    if hhi < HHI_UNCONCENTRATED {
        "unconcentrated"
    } else if hhi <= HHI_MODERATE {
        "moderately concentrated"
    } else {
        "highly concentrated"
    }
}

fn ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (1, 11) | (2, 12) | (3, 13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

#[async_trait]
impl ContentModule for MarketShare {
    fn id(&self) -> &str {
        "market_share"
    }

    async fn generate(
        &self,
        input: &AnalysisInput,
        config: &ModuleConfig,
    ) -> Result<ModuleOutput, ModuleError> {
        let kind = ChartKind::Pie;
        let Some((_, shares)) = data::section_entries(input, self.id(), "shares")? else {
            return Ok(ModuleOutput::no_data(kind, "market share"));
        };
        let total = data::positive_total(&shares, "market shares")?;
        let hhi: f64 = shares
            .iter()
            .map(|e| percent(e.value, total).powi(2))
            .sum();
        let ranked = data::ranked(&shares);
        let leader = ranked[0];

        let mut text = format!(
            "The {} divides the market among {}. {} leads with {}, and the market is {} \
             (HHI {:.0}).",
            kind.phrase(),
            count(shares.len(), "participant"),
            leader.label,
            pct(percent(leader.value, total)),
            concentration_band(hhi),
            hhi,
        );
        let subject = data::subject(input);
        if let Some(rank) = ranked
            .iter()
            .position(|e| e.label.eq_ignore_ascii_case(subject))
        {
            text.push_str(&format!(
                " {subject} ranks {} with {}.",
                ordinal(rank + 1),
                pct(percent(ranked[rank].value, total))
            ));
        }

        Ok(ModuleOutput::new(text, kind, categorical(kind, "Share", &shares)).fitted(config))
    }
}

// ---------------------------------------------------------------------------
// Growth trajectory
// ---------------------------------------------------------------------------

pub struct GrowthTrajectory;

#[async_trait]
impl ContentModule for GrowthTrajectory {
    fn id(&self) -> &str {
        "growth_trajectory"
    }

    async fn generate(
        &self,
        input: &AnalysisInput,
        config: &ModuleConfig,
    ) -> Result<ModuleOutput, ModuleError> {
        let kind = ChartKind::Line;
        // A trajectory needs two points.
        let Some((_, periods)) = data::section_entries(input, self.id(), "periods")?
            .filter(|(_, p)| p.len() >= 2)
        else {
            return Ok(ModuleOutput::no_data(kind, "growth"));
        };
        if let Some(bad) = periods.iter().find(|p| p.value <= 0.0) {
            return Err(ModuleError::generation(format!(
                "period '{}' must have a positive value for growth rates",
                bad.label
            )));
        }

        let first = &periods[0];
        let last = &periods[periods.len() - 1];
        let steps = (periods.len() - 1) as f64;
        let cagr = ((last.value / first.value).powf(1.0 / steps) - 1.0) * 100.0;
        let (peak_label, peak_growth) = periods
            .windows(2)
            .map(|w| (&w[1].label, (w[1].value / w[0].value - 1.0) * 100.0))
            .fold(None, |best: Option<(&String, f64)>, (label, g)| match best {
                Some((_, b)) if b >= g => best,
                _ => Some((label, g)),
            })
            .ok_or_else(|| ModuleError::generation("growth needs at least two periods"))?;

        let direction = if cagr >= 0.0 { "growth" } else { "contraction" };
        let text = format!(
            "The {} tracks {} from {} to {}. The value moved from {} to {}, a compound {direction} \
             rate of {} per period. The strongest step was {} at {}.",
            kind.phrase(),
            count(periods.len(), "period"),
            first.label,
            last.label,
            num(first.value),
            num(last.value),
            pct(cagr.abs()),
            peak_label,
            pct(peak_growth),
        );

        Ok(ModuleOutput::new(text, kind, categorical(kind, "Value", &periods)).fitted(config))
    }
}

// ---------------------------------------------------------------------------
// Customer segments
// ---------------------------------------------------------------------------

pub struct CustomerSegments;

#[async_trait]
impl ContentModule for CustomerSegments {
    fn id(&self) -> &str {
        "customer_segments"
    }

    async fn generate(
        &self,
        input: &AnalysisInput,
        config: &ModuleConfig,
    ) -> Result<ModuleOutput, ModuleError> {
        let kind = ChartKind::Doughnut;
        let Some((_, segments)) = data::section_entries(input, self.id(), "segments")? else {
            return Ok(ModuleOutput::no_data(kind, "customer segment"));
        };
        let total = data::positive_total(&segments, "segment shares")?;
        let share = |v: f64| percent(v, total);

        let core: Vec<&str> = data::ranked(&segments)
            .into_iter()
            .filter(|e| share(e.value) >= CORE_SEGMENT_SHARE)
            .map(|e| e.label.as_str())
            .collect();
        let tail: Vec<&data::Entry> = segments
            .iter()
            .filter(|e| share(e.value) < LONG_TAIL_SHARE)
            .collect();
        let tail_share: f64 = tail.iter().map(|e| share(e.value)).sum();

        let core_text = if core.is_empty() {
            "No single segment reaches a fifth of the customer base".to_string()
        } else {
            format!("The core of the base is {}", list(&core))
        };
        let mut text = format!(
            "The {} splits the customer base of {} into {}. {core_text}.",
            kind.phrase(),
            data::subject(input),
            count(segments.len(), "segment"),
        );
        if !tail.is_empty() {
            text.push_str(&format!(
                " A long tail of {} contributes {}.",
                count(tail.len(), "segment"),
                pct(tail_share)
            ));
        }

        Ok(ModuleOutput::new(text, kind, categorical(kind, "Customers", &segments)).fitted(config))
    }
}

// ---------------------------------------------------------------------------
// Geographic distribution
// ---------------------------------------------------------------------------

pub struct GeographicDistribution;

#[async_trait]
impl ContentModule for GeographicDistribution {
    fn id(&self) -> &str {
        "geographic_distribution"
    }

    async fn generate(
        &self,
        input: &AnalysisInput,
        config: &ModuleConfig,
    ) -> Result<ModuleOutput, ModuleError> {
        let kind = ChartKind::Bar;
        let Some((_, regions)) = data::section_entries(input, self.id(), "regions")? else {
            return Ok(ModuleOutput::no_data(kind, "regional"));
        };
        let total = data::positive_total(&regions, "regional values")?;
        let ranked = data::ranked(&regions);

        let mut covered = 0.0;
        let mut needed = 0;
        for region in &ranked {
            covered += percent(region.value, total);
            needed += 1;
            if covered >= REGION_COVERAGE {
                break;
            }
        }

        let text = format!(
            "The {} compares {} by contribution. {} leads with {}, and the top {} of {} regions \
             cover at least {} of the total.",
            kind.phrase(),
            count(regions.len(), "region"),
            ranked[0].label,
            pct(percent(ranked[0].value, total)),
            needed,
            regions.len(),
            pct(REGION_COVERAGE),
        );

        Ok(ModuleOutput::new(text, kind, categorical(kind, "Contribution", &regions)).fitted(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn run(module: &dyn ContentModule, input: serde_json::Value) -> ModuleOutput {
        module
            .generate(&input, &ModuleConfig::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn market_overview_reports_total_and_unit() {
        let out = run(
            &MarketOverview,
            json!({"market_overview": {"unit": "USD m", "segments": [
                {"label": "A", "value": 50}, {"label": "B", "value": 30}, {"label": "C", "value": 20}
            ]}}),
        )
        .await;
        assert!(out.prose.contains("totalling 100 USD m"));
        assert!(out.prose.contains("A is the largest at 50 USD m (50.0%)"));
        assert!(out.prose.contains("top three segments account for 100.0%"));
    }

    #[test]
    fn concentration_bands() {
        assert_eq!(concentration_band(1000.0), "unconcentrated");
        assert_eq!(concentration_band(2500.0), "moderately concentrated");
        assert_eq!(concentration_band(2501.0), "highly concentrated");
    }

    #[test]
    fn ordinals() {
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(2), "2nd");
        assert_eq!(ordinal(3), "3rd");
        assert_eq!(ordinal(11), "11th");
        assert_eq!(ordinal(22), "22nd");
    }

    #[tokio::test]
    async fn market_share_ranks_subject() {
        let out = run(
            &MarketShare,
            json!({"subject": "Acme", "market_share": {"shares": [
                {"label": "Globex", "value": 50}, {"label": "Acme", "value": 30}, {"label": "Other", "value": 20}
            ]}}),
        )
        .await;
        assert!(out.prose.starts_with("The pie chart"));
        // 2500 + 900 + 400
        assert!(out.prose.contains("highly concentrated (HHI 3800)"));
        assert!(out.prose.contains("Acme ranks 2nd with 30.0%"));
    }

    #[tokio::test]
    async fn growth_needs_two_periods() {
        let out = run(
            &GrowthTrajectory,
            json!({"growth_trajectory": {"periods": [{"label": "2024", "value": 10}]}}),
        )
        .await;
        assert!(out.no_data);
    }

    #[tokio::test]
    async fn growth_computes_compound_rate() {
        let out = run(
            &GrowthTrajectory,
            json!({"growth_trajectory": {"periods": [
                {"label": "2022", "value": 100}, {"label": "2023", "value": 120}, {"label": "2024", "value": 121}
            ]}}),
        )
        .await;
        assert!(out.prose.contains("compound growth rate of 10.0% per period"));
        assert!(out.prose.contains("strongest step was 2023"));
    }

    #[tokio::test]
    async fn growth_rejects_non_positive_values() {
        let input = json!({"growth_trajectory": {"periods": [
            {"label": "2023", "value": 0}, {"label": "2024", "value": 5}
        ]}});
        assert!(
            GrowthTrajectory
                .generate(&input, &ModuleConfig::default())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn customer_segments_core_and_tail() {
        let out = run(
            &CustomerSegments,
            json!({"customer_segments": {"segments": [
                {"label": "Retail", "value": 60}, {"label": "Health", "value": 32},
                {"label": "Energy", "value": 5}, {"label": "Other", "value": 3}
            ]}}),
        )
        .await;
        assert!(out.prose.contains("core of the base is Retail and Health"));
        assert!(out.prose.contains("long tail of 2 segments contributes 8.0%"));
    }

    #[tokio::test]
    async fn geographic_coverage_counts_regions() {
        let out = run(
            &GeographicDistribution,
            json!({"geographic_distribution": {"regions": [
                {"label": "NA", "value": 50}, {"label": "EU", "value": 35}, {"label": "APAC", "value": 15}
            ]}}),
        )
        .await;
        assert!(out.prose.contains("NA leads with 50.0%"));
        assert!(out.prose.contains("top 2 of 3 regions cover at least 80.0%"));
    }
}
