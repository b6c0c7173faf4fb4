//! Framing sections: executive summary, recommendations and roadmap.

use async_trait::async_trait;

use reportforge_shared::{AnalysisInput, ChartKind, ModuleConfig, ModuleError};

use super::{ContentModule, ModuleOutput, categorical};
use crate::data;
use crate::prose::{count, list, num, pct, percent};

/// Share above which one pillar is said to dominate the position.
const DOMINANT_PILLAR_SHARE: f64 = 50.0;

/// Priority score below which an initiative is deferred.
const DEFER_BELOW: f64 = 5.0;

// ---------------------------------------------------------------------------
// Executive summary
// ---------------------------------------------------------------------------

/// Weighs strategic pillars against each other.
pub struct ExecutiveSummary;

#[async_trait]
impl ContentModule for ExecutiveSummary {
    fn id(&self) -> &str {
        "executive_summary"
    }

    async fn generate(
        &self,
        input: &AnalysisInput,
        config: &ModuleConfig,
    ) -> Result<ModuleOutput, ModuleError> {
        let kind = ChartKind::Doughnut;
        let Some((section, pillars)) = data::section_entries(input, self.id(), "pillars")? else {
            return Ok(ModuleOutput::no_data(kind, "strategic pillar"));
        };
        let total = data::positive_total(&pillars, "pillar scores")?;
        let ranked = data::ranked(&pillars);
        let lead = ranked[0];
        let lead_share = percent(lead.value, total);

        let balance = match ranked.get(1) {
            _ if lead_share >= DOMINANT_PILLAR_SHARE => "concentrated in a single pillar",
            Some(second) if percent(second.value, total) >= lead_share * 0.75 => {
                "broadly balanced"
            }
            Some(_) => "led by one pillar with meaningful support from the others",
            None => "defined by a single pillar",
        };

        let mut text = format!(
            "The {} summarizes the strategic position of {} across {}. {} carries the largest \
             weight at {} of the total, and the overall profile is {balance}.",
            kind.phrase(),
            data::subject(input),
            count(pillars.len(), "pillar"),
            lead.label,
            pct(lead_share),
        );
        if let Some(headline) = data::text(section, "headline")? {
            text.push_str(&format!(" Headline finding: {headline}."));
        }

        Ok(ModuleOutput::new(text, kind, categorical(kind, "Weight", &pillars)).fitted(config))
    }
}

// ---------------------------------------------------------------------------
// Strategic recommendations
// ---------------------------------------------------------------------------

/// Ranks candidate initiatives by priority score.
pub struct StrategicRecommendations;

#[async_trait]
impl ContentModule for StrategicRecommendations {
    fn id(&self) -> &str {
        "strategic_recommendations"
    }

    async fn generate(
        &self,
        input: &AnalysisInput,
        config: &ModuleConfig,
    ) -> Result<ModuleOutput, ModuleError> {
        let kind = ChartKind::PolarArea;
        let Some((_, priorities)) = data::section_entries(input, self.id(), "priorities")? else {
            return Ok(ModuleOutput::no_data(kind, "recommendation"));
        };
        if let Some(bad) = priorities.iter().find(|p| !(0.0..=10.0).contains(&p.value)) {
            return Err(ModuleError::generation(format!(
                "priority for '{}' must be between 0 and 10, got {}",
                bad.label, bad.value
            )));
        }

        let ranked = data::ranked(&priorities);
        let top: Vec<String> = ranked
            .iter()
            .take(3)
            .map(|p| format!("{} ({})", p.label, num(p.value)))
            .collect();
        let deferred = priorities.iter().filter(|p| p.value < DEFER_BELOW).count();

        let mut text = format!(
            "The {} scores {} by priority. The highest-priority moves are {}.",
            kind.phrase(),
            count(priorities.len(), "candidate initiative"),
            list(&top),
        );
        if deferred > 0 {
            text.push_str(&format!(
                " {} below {} should be deferred until the leading moves are under way.",
                count(deferred, "initiative"),
                num(DEFER_BELOW)
            ));
        }

        Ok(ModuleOutput::new(text, kind, categorical(kind, "Priority", &priorities)).fitted(config))
    }
}

// ---------------------------------------------------------------------------
// Implementation roadmap
// ---------------------------------------------------------------------------

/// Lays out phase durations and cumulative milestones.
pub struct ImplementationRoadmap;

#[async_trait]
impl ContentModule for ImplementationRoadmap {
    fn id(&self) -> &str {
        "implementation_roadmap"
    }

    async fn generate(
        &self,
        input: &AnalysisInput,
        config: &ModuleConfig,
    ) -> Result<ModuleOutput, ModuleError> {
        let kind = ChartKind::Bar;
        let Some((_, phases)) = data::section_entries(input, self.id(), "phases")? else {
            return Ok(ModuleOutput::no_data(kind, "roadmap"));
        };
        if let Some(bad) = phases.iter().find(|p| p.value <= 0.0) {
            return Err(ModuleError::generation(format!(
                "phase '{}' must have a positive duration",
                bad.label
            )));
        }

        let total = data::total(&phases);
        let longest = data::largest(&phases).ok_or_else(|| ModuleError::generation("no phases"))?;
        let mut elapsed = 0.0;
        let milestones: Vec<String> = phases
            .iter()
            .map(|p| {
                elapsed += p.value;
                format!("{} ends in week {}", p.label, num(elapsed))
            })
            .collect();

        let text = format!(
            "The {} lays out {} spanning {} weeks. {} is the longest phase at {} weeks, {} of \
             the programme. Milestones: {}.",
            kind.phrase(),
            count(phases.len(), "implementation phase"),
            num(total),
            longest.label,
            num(longest.value),
            pct(percent(longest.value, total)),
            list(&milestones),
        );

        Ok(ModuleOutput::new(text, kind, categorical(kind, "Duration (weeks)", &phases)).fitted(config))
    }
}
