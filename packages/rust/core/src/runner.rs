//! Runs one content module under its time budget and layers enrichment on top.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, instrument, warn};

use reportforge_enrichment::EnrichmentSession;
use reportforge_modules::ContentModule;
use reportforge_shared::{
    AnalysisInput, BlockFailure, CatalogEntry, ContentBlock, FailureKind, ModuleConfig, ModuleError,
};

/// Turns every module outcome into a [`ContentBlock`]. Never fails.
#[derive(Clone)]
pub struct ModuleRunner {
    config: ModuleConfig,
    timeout: Duration,
    session: Arc<EnrichmentSession>,
}

impl ModuleRunner {
    pub fn new(config: ModuleConfig, timeout: Duration, session: Arc<EnrichmentSession>) -> Self {
        Self {
            config,
            timeout,
            session,
        }
    }

    /// Generate, then enrich, one block.
    ///
    /// Generation errors and timeouts become placeholders. The timeout covers
    /// `generate` only; enrichment has its own budget inside the session.
    #[instrument(skip_all, fields(module = %entry.id))]
    pub async fn run(
        &self,
        module: &dyn ContentModule,
        entry: &CatalogEntry,
        input: &AnalysisInput,
    ) -> ContentBlock {
        let started = Instant::now();
        let generated = tokio::time::timeout(self.timeout, module.generate(input, &self.config)).await;

        let output = match generated {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!(error = %e, "module failed");
                return ContentBlock::placeholder(
                    entry,
                    BlockFailure::new(FailureKind::GenerationFailure, e.to_string()),
                );
            }
            Err(_) => {
                let e = ModuleError::Timeout {
                    timeout_ms: self.timeout.as_millis() as u64,
                };
                warn!(error = %e, "module timed out");
                return ContentBlock::placeholder(
                    entry,
                    BlockFailure::new(FailureKind::Timeout, e.to_string()),
                );
            }
        };

        // Nothing to look up for an empty section.
        let enrichment = if self.config.include_enrichment && !output.no_data {
            Some(self.session.enrich(&entry.id, &output.prose).await)
        } else {
            None
        };
        let enrichment_surfaced = enrichment
            .as_ref()
            .is_some_and(|e| e.confidence >= self.config.confidence_threshold);

        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            no_data = output.no_data,
            surfaced = enrichment_surfaced,
            "module finished"
        );

        ContentBlock {
            module_id: entry.id.clone(),
            title: entry.title.clone(),
            prose: output.prose,
            declared_kind: Some(output.declared_kind),
            rendered_kind: Some(output.series.kind),
            series: Some(output.series),
            enrichment,
            enrichment_surfaced,
            no_data: output.no_data,
            failure: None,
        }
    }
}
