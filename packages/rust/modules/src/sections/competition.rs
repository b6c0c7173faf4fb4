//! Competitive position sections.

use async_trait::async_trait;

use reportforge_shared::{AnalysisInput, ChartKind, ModuleConfig, ModuleError};

use super::{ContentModule, ModuleOutput, categorical, plotted, tabular};
use crate::data;
use crate::prose::{count, list, num, pct, percent};

/// Both fit axes must reach this for a partner to count as strategic.
const STRATEGIC_FIT: f64 = 0.7;

/// Band around the competitor mean treated as "in line".
const PRICE_PARITY_BAND: f64 = 5.0;

// ---------------------------------------------------------------------------
// Competitive landscape
// ---------------------------------------------------------------------------

pub struct CompetitiveLandscape;

#[async_trait]
impl ContentModule for CompetitiveLandscape {
    fn id(&self) -> &str {
        "competitive_landscape"
    }

    async fn generate(
        &self,
        input: &AnalysisInput,
        config: &ModuleConfig,
    ) -> Result<ModuleOutput, ModuleError> {
        let kind = ChartKind::Radar;
        let Some(table) = data::section_table(input, self.id(), "axes", "competitors")? else {
            return Ok(ModuleOutput::no_data(kind, "competitor"));
        };

        let averages: Vec<(&str, f64)> = table
            .series
            .iter()
            .map(|s| (s.name.as_str(), data::mean(s.values.iter().copied())))
            .collect();
        let (strongest, strongest_avg) = averages
            .iter()
            .copied()
            .fold(None, |best: Option<(&str, f64)>, (name, avg)| match best {
                Some((_, b)) if b >= avg => best,
                _ => Some((name, avg)),
            })
            .ok_or_else(|| ModuleError::generation("no competitors"))?;

        let leaders: Vec<String> = table
            .axes
            .iter()
            .enumerate()
            .filter_map(|(i, axis)| {
                table
                    .series
                    .iter()
                    .fold(None, |best: Option<(&str, f64)>, s| match best {
                        Some((_, b)) if b >= s.values[i] => best,
                        _ => Some((s.name.as_str(), s.values[i])),
                    })
                    .map(|(name, _)| format!("{name} on {axis}"))
            })
            .collect();

        let text = format!(
            "The {} compares {} across {}. {strongest} has the strongest overall profile with an \
             average score of {}. Axis leaders: {}.",
            kind.phrase(),
            count(table.series.len(), "competitor"),
            count(table.axes.len(), "dimension"),
            num(strongest_avg),
            list(&leaders),
        );

        Ok(ModuleOutput::new(text, kind, tabular(kind, &table)).fitted(config))
    }
}

// ---------------------------------------------------------------------------
// SWOT
// ---------------------------------------------------------------------------

pub struct SwotAnalysis;

const SWOT_FACTORS: [&str; 4] = ["Strengths", "Weaknesses", "Opportunities", "Threats"];

fn posture(s: f64, w: f64, o: f64, t: f64) -> &'static str {
    match (s >= w, o >= t) {
        (true, true) => "growth-oriented (SO): strengths can be used to pursue opportunities",
        (true, false) => "defensive (ST): strengths should be used to blunt threats",
        (false, true) => "turnaround (WO): opportunities should be used to repair weaknesses",
        (false, false) => "survival (WT): weaknesses and threats should be contained first",
    }
}

#[async_trait]
impl ContentModule for SwotAnalysis {
    fn id(&self) -> &str {
        "swot_analysis"
    }

    async fn generate(
        &self,
        input: &AnalysisInput,
        config: &ModuleConfig,
    ) -> Result<ModuleOutput, ModuleError> {
        let kind = ChartKind::PolarArea;
        let Some((_, factors)) = data::section_entries(input, self.id(), "factors")? else {
            return Ok(ModuleOutput::no_data(kind, "SWOT"));
        };
        data::positive_total(&factors, "SWOT factor weights")?;

        let mut scores = [0.0; 4];
        for (slot, name) in scores.iter_mut().zip(SWOT_FACTORS) {
            *slot = factors
                .iter()
                .find(|f| f.label.eq_ignore_ascii_case(name))
                .map(|f| f.value)
                .ok_or_else(|| ModuleError::generation(format!("SWOT factor '{name}' is missing")))?;
        }
        let [s, w, o, t] = scores;

        let text = format!(
            "The {} weighs internal strengths ({}) against weaknesses ({}) and external \
             opportunities ({}) against threats ({}) for {}. The resulting posture is {}.",
            kind.phrase(),
            num(s),
            num(w),
            num(o),
            num(t),
            data::subject(input),
            posture(s, w, o, t),
        );

        Ok(ModuleOutput::new(text, kind, categorical(kind, "Weight", &factors)).fitted(config))
    }
}

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

pub struct PricingAnalysis;

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.is_empty() {
        0.0
    } else if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[async_trait]
impl ContentModule for PricingAnalysis {
    fn id(&self) -> &str {
        "pricing_analysis"
    }

    async fn generate(
        &self,
        input: &AnalysisInput,
        config: &ModuleConfig,
    ) -> Result<ModuleOutput, ModuleError> {
        let kind = ChartKind::Bar;
        let Some((section, prices)) = data::section_entries(input, self.id(), "price_points")?
        else {
            return Ok(ModuleOutput::no_data(kind, "pricing"));
        };
        if let Some(bad) = prices.iter().find(|p| p.value <= 0.0) {
            return Err(ModuleError::generation(format!(
                "price for '{}' must be positive",
                bad.label
            )));
        }

        let values = data::values(&prices);
        let mean = data::mean(values.iter().copied());
        let low = values.iter().copied().fold(f64::INFINITY, f64::min);
        let high = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let mut text = format!(
            "The {} compares {}. The mean is {}, the median {}, and prices span {} from {} to {}.",
            kind.phrase(),
            count(prices.len(), "price point"),
            num(mean),
            num(median(&values)),
            num(high - low),
            num(low),
            num(high),
        );
        if let Some(own) = data::number(section, "own_price")? {
            if own <= 0.0 {
                return Err(ModuleError::generation("own_price must be positive"));
            }
            let gap = percent(own - mean, mean);
            let position = if gap > PRICE_PARITY_BAND {
                format!("a premium of {} over", pct(gap))
            } else if gap < -PRICE_PARITY_BAND {
                format!("a discount of {} against", pct(-gap))
            } else {
                "parity with".to_string()
            };
            text.push_str(&format!(
                " At {}, {} sits at {position} the competitor mean.",
                num(own),
                data::subject(input)
            ));
        }

        Ok(ModuleOutput::new(text, kind, categorical(kind, "Price", &prices)).fitted(config))
    }
}

// ---------------------------------------------------------------------------
// Partnerships
// ---------------------------------------------------------------------------

pub struct PartnershipNetwork;

#[async_trait]
impl ContentModule for PartnershipNetwork {
    fn id(&self) -> &str {
        "partnership_network"
    }

    async fn generate(
        &self,
        input: &AnalysisInput,
        config: &ModuleConfig,
    ) -> Result<ModuleOutput, ModuleError> {
        let kind = ChartKind::Bubble;
        let Some(partners) = data::section_points(input, self.id(), "partners")? else {
            return Ok(ModuleOutput::no_data(kind, "partnership"));
        };

        let mut sizes = Vec::with_capacity(partners.len());
        for p in &partners {
            match p.size {
                Some(size) if size > 0.0 => sizes.push(size),
                _ => {
                    return Err(ModuleError::generation(format!(
                        "partner '{}' needs a positive size",
                        p.label
                    )));
                }
            }
        }

        let weight: f64 = sizes.iter().sum();
        let fit = partners
            .iter()
            .zip(&sizes)
            .map(|(p, size)| size * (p.x + p.y) / 2.0)
            .sum::<f64>()
            / weight;
        let anchor = partners
            .iter()
            .zip(&sizes)
            .fold(None, |best: Option<(&str, f64)>, (p, &size)| match best {
                Some((_, b)) if b >= size => best,
                _ => Some((p.label.as_str(), size)),
            })
            .map(|(label, _)| label)
            .ok_or_else(|| ModuleError::generation("no partners"))?;
        let strategic = partners
            .iter()
            .filter(|p| p.x >= STRATEGIC_FIT && p.y >= STRATEGIC_FIT)
            .count();

        let text = format!(
            "The {} maps {} by strategic and operational fit, sized by deal value. {anchor} is the \
             anchor partner, the value-weighted fit is {fit:.2}, and {strategic} of them clear the \
             strategic bar on both axes.",
            kind.phrase(),
            count(partners.len(), "partner"),
        );

        Ok(ModuleOutput::new(text, kind, plotted(kind, "Partners", partners)).fitted(config))
    }
}
