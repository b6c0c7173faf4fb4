//! Risk and regulatory sections.

use async_trait::async_trait;

use reportforge_shared::{AnalysisInput, ChartKind, ChartPoint, ModuleConfig, ModuleError};

use super::{ContentModule, ModuleOutput, categorical, plotted};
use crate::data;
use crate::prose::{count, list, num};

/// Likelihood times impact at or above which a risk is critical.
const CRITICAL_EXPOSURE: f64 = 0.45;

/// Regulatory pressure (0-10) at or above which an area is a hotspot.
const HOTSPOT_PRESSURE: f64 = 7.0;

fn exposure(risk: &ChartPoint) -> f64 {
    risk.x * risk.y
}

// ---------------------------------------------------------------------------
// Risk matrix
// ---------------------------------------------------------------------------

pub struct RiskMatrix;

#[async_trait]
impl ContentModule for RiskMatrix {
    fn id(&self) -> &str {
        "risk_matrix"
    }

    async fn generate(
        &self,
        input: &AnalysisInput,
        config: &ModuleConfig,
    ) -> Result<ModuleOutput, ModuleError> {
        let kind = ChartKind::Scatter;
        let Some(risks) = data::section_points(input, self.id(), "risks")? else {
            return Ok(ModuleOutput::no_data(kind, "risk"));
        };
        if let Some(bad) = risks
            .iter()
            .find(|r| !(0.0..=1.0).contains(&r.x) || !(0.0..=1.0).contains(&r.y))
        {
            return Err(ModuleError::generation(format!(
                "risk '{}' must have likelihood and impact between 0 and 1",
                bad.label
            )));
        }

        let critical: Vec<&str> = risks
            .iter()
            .filter(|r| exposure(r) >= CRITICAL_EXPOSURE)
            .map(|r| r.label.as_str())
            .collect();
        let worst = risks
            .iter()
            .fold(None, |best: Option<&ChartPoint>, r| match best {
                Some(b) if exposure(b) >= exposure(r) => best,
                _ => Some(r),
            })
            .ok_or_else(|| ModuleError::generation("no risks"))?;

        let mut text = format!(
            "The {} positions {} by likelihood and impact. {} carries the highest exposure at \
             {:.2}.",
            kind.phrase(),
            count(risks.len(), "risk"),
            worst.label,
            exposure(worst),
        );
        if critical.is_empty() {
            text.push_str(" No risk reaches the critical exposure band.");
        } else {
            text.push_str(&format!(
                " {} in the critical band: {}.",
                count(critical.len(), "risk"),
                list(&critical)
            ));
        }

        Ok(ModuleOutput::new(text, kind, plotted(kind, "Risks", risks)).fitted(config))
    }
}

// ---------------------------------------------------------------------------
// Regulatory environment
// ---------------------------------------------------------------------------

pub struct RegulatoryEnvironment;

#[async_trait]
impl ContentModule for RegulatoryEnvironment {
    fn id(&self) -> &str {
        "regulatory_environment"
    }

    async fn generate(
        &self,
        input: &AnalysisInput,
        config: &ModuleConfig,
    ) -> Result<ModuleOutput, ModuleError> {
        let kind = ChartKind::PolarArea;
        let Some((_, pressures)) = data::section_entries(input, self.id(), "pressures")? else {
            return Ok(ModuleOutput::no_data(kind, "regulatory"));
        };
        if let Some(bad) = pressures.iter().find(|p| !(0.0..=10.0).contains(&p.value)) {
            return Err(ModuleError::generation(format!(
                "pressure for '{}' must be between 0 and 10, got {}",
                bad.label, bad.value
            )));
        }

        let mean = data::mean(pressures.iter().map(|p| p.value));
        let hotspots: Vec<&str> = data::ranked(&pressures)
            .into_iter()
            .filter(|p| p.value >= HOTSPOT_PRESSURE)
            .map(|p| p.label.as_str())
            .collect();
        let climate = if mean >= HOTSPOT_PRESSURE {
            "severe"
        } else if mean >= 4.0 {
            "elevated"
        } else {
            "moderate"
        };

        let mut text = format!(
            "The {} scores regulatory pressure on {} across {}. The mean pressure of {} points to \
             a {climate} regulatory climate.",
            kind.phrase(),
            data::subject(input),
            count(pressures.len(), "area"),
            num((mean * 10.0).round() / 10.0),
        );
        if !hotspots.is_empty() {
            text.push_str(&format!(" Hotspots: {}.", list(&hotspots)));
        }

        Ok(ModuleOutput::new(text, kind, categorical(kind, "Pressure", &pressures)).fitted(config))
    }
}
