//! Operating model sections: suppliers, talent, technology and innovation.

use async_trait::async_trait;

use reportforge_shared::{AnalysisInput, ChartKind, ChartPoint, ModuleConfig, ModuleError};

use super::{ContentModule, ModuleOutput, categorical, plotted, tabular};
use crate::data;
use crate::prose::{count, list, num, pct, percent};

/// Spend share above which a supplier is a single-source exposure.
const SINGLE_SOURCE_SHARE: f64 = 40.0;

/// Feasibility and impact split for the pipeline quadrants.
const QUADRANT_SPLIT: f64 = 0.5;

// ---------------------------------------------------------------------------
// Supply chain
// ---------------------------------------------------------------------------

pub struct SupplyChain;

#[async_trait]
impl ContentModule for SupplyChain {
    fn id(&self) -> &str {
        "supply_chain"
    }

    async fn generate(
        &self,
        input: &AnalysisInput,
        config: &ModuleConfig,
    ) -> Result<ModuleOutput, ModuleError> {
        let kind = ChartKind::Bar;
        let Some((_, suppliers)) = data::section_entries(input, self.id(), "suppliers")? else {
            return Ok(ModuleOutput::no_data(kind, "supplier"));
        };
        let total = data::positive_total(&suppliers, "supplier spend")?;
        let ranked = data::ranked(&suppliers);
        let top3: f64 = ranked.iter().take(3).map(|e| e.value).sum();
        let exposed: Vec<String> = ranked
            .iter()
            .filter(|e| percent(e.value, total) > SINGLE_SOURCE_SHARE)
            .map(|e| format!("{} ({})", e.label, pct(percent(e.value, total))))
            .collect();

        let mut text = format!(
            "The {} ranks {} by share of spend. The top three account for {}.",
            kind.phrase(),
            count(suppliers.len(), "supplier"),
            pct(percent(top3, total)),
        );
        if exposed.is_empty() {
            text.push_str(" No supplier exceeds the single-source exposure threshold.");
        } else {
            text.push_str(&format!(
                " Single-source exposure above {}: {}.",
                pct(SINGLE_SOURCE_SHARE),
                list(&exposed)
            ));
        }

        Ok(ModuleOutput::new(text, kind, categorical(kind, "Spend share", &suppliers)).fitted(config))
    }
}

// ---------------------------------------------------------------------------
// Talent
// ---------------------------------------------------------------------------

pub struct TalentLandscape;

#[async_trait]
impl ContentModule for TalentLandscape {
    fn id(&self) -> &str {
        "talent_landscape"
    }

    async fn generate(
        &self,
        input: &AnalysisInput,
        config: &ModuleConfig,
    ) -> Result<ModuleOutput, ModuleError> {
        let kind = ChartKind::Radar;
        let Some(table) = data::section_table(input, self.id(), "skills", "teams")? else {
            return Ok(ModuleOutput::no_data(kind, "talent"));
        };

        let means = table.axis_means();
        let mut strongest = 0;
        let mut weakest = 0;
        for (i, m) in means.iter().enumerate() {
            if *m > means[strongest] {
                strongest = i;
            }
            if *m < means[weakest] {
                weakest = i;
            }
        }

        // Smallest gap between a team's best and worst skill.
        let balanced = table
            .series
            .iter()
            .map(|s| {
                let hi = s.values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let lo = s.values.iter().copied().fold(f64::INFINITY, f64::min);
                (s.name.as_str(), hi - lo)
            })
            .fold(None, |best: Option<(&str, f64)>, (name, gap)| match best {
                Some((_, b)) if b <= gap => best,
                _ => Some((name, gap)),
            })
            .map(|(name, _)| name)
            .ok_or_else(|| ModuleError::generation("no teams"))?;

        let text = format!(
            "The {} rates {} on {}. {} is the deepest capability (mean {}) and {} the thinnest \
             (mean {}). {balanced} is the most evenly skilled team.",
            kind.phrase(),
            count(table.series.len(), "team"),
            count(table.axes.len(), "skill"),
            table.axes[strongest],
            num(means[strongest]),
            table.axes[weakest],
            num(means[weakest]),
        );

        Ok(ModuleOutput::new(text, kind, tabular(kind, &table)).fitted(config))
    }
}

// ---------------------------------------------------------------------------
// Technology adoption
// ---------------------------------------------------------------------------

pub struct TechnologyAdoption;

#[async_trait]
impl ContentModule for TechnologyAdoption {
    fn id(&self) -> &str {
        "technology_adoption"
    }

    async fn generate(
        &self,
        input: &AnalysisInput,
        config: &ModuleConfig,
    ) -> Result<ModuleOutput, ModuleError> {
        let kind = ChartKind::Line;
        let Some(table) = data::section_table(input, self.id(), "periods", "technologies")? else {
            return Ok(ModuleOutput::no_data(kind, "adoption"));
        };
        let last = table.axes.len() - 1;

        let mut riser = 0;
        let mut leader = 0;
        let gain = |i: usize| table.series[i].values[last] - table.series[i].values[0];
        for i in 1..table.series.len() {
            if gain(i) > gain(riser) {
                riser = i;
            }
            if table.series[i].values[last] > table.series[leader].values[last] {
                leader = i;
            }
        }

        let text = format!(
            "The {} traces adoption of {} from {} to {}. {} leads at {} in {}, while \
             {} rose fastest, gaining {} points.",
            kind.phrase(),
            count(table.series.len(), "technology"),
            table.axes[0],
            table.axes[last],
            table.series[leader].name,
            num(table.series[leader].values[last]),
            table.axes[last],
            table.series[riser].name,
            num(gain(riser)),
        );

        Ok(ModuleOutput::new(text, kind, tabular(kind, &table)).fitted(config))
    }
}

// ---------------------------------------------------------------------------
// Innovation pipeline
// ---------------------------------------------------------------------------

pub struct InnovationPipeline;

fn quadrant(point: &ChartPoint) -> usize {
    match (point.x >= QUADRANT_SPLIT, point.y >= QUADRANT_SPLIT) {
        (true, true) => 0,
        (false, true) => 1,
        (true, false) => 2,
        (false, false) => 3,
    }
}

const QUADRANT_NAMES: [&str; 4] = ["quick win", "big bet", "incremental improvement", "long shot"];

#[async_trait]
impl ContentModule for InnovationPipeline {
    fn id(&self) -> &str {
        "innovation_pipeline"
    }

    async fn generate(
        &self,
        input: &AnalysisInput,
        config: &ModuleConfig,
    ) -> Result<ModuleOutput, ModuleError> {
        let kind = ChartKind::Scatter;
        let Some(initiatives) = data::section_points(input, self.id(), "initiatives")? else {
            return Ok(ModuleOutput::no_data(kind, "innovation"));
        };
        if let Some(bad) = initiatives
            .iter()
            .find(|p| !(0.0..=1.0).contains(&p.x) || !(0.0..=1.0).contains(&p.y))
        {
            return Err(ModuleError::generation(format!(
                "initiative '{}' must have feasibility and impact between 0 and 1",
                bad.label
            )));
        }

        let mut tally = [0usize; 4];
        for p in &initiatives {
            tally[quadrant(p)] += 1;
        }
        let breakdown: Vec<String> = tally
            .iter()
            .zip(QUADRANT_NAMES)
            .filter(|(n, _)| **n > 0)
            .map(|(n, name)| count(*n, name))
            .collect();
        let top = initiatives
            .iter()
            .fold(None, |best: Option<&ChartPoint>, p| match best {
                Some(b) if b.x * b.y >= p.x * p.y => best,
                _ => Some(p),
            })
            .ok_or_else(|| ModuleError::generation("no initiatives"))?;

        let text = format!(
            "The {} places {} by feasibility and impact: {}. {} scores highest with a combined \
             value of {:.2}.",
            kind.phrase(),
            count(initiatives.len(), "initiative"),
            list(&breakdown),
            top.label,
            top.x * top.y,
        );

        Ok(ModuleOutput::new(text, kind, plotted(kind, "Initiatives", initiatives)).fitted(config))
    }
}
