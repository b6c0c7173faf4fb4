//! Static enrichment used when the live backend is absent or unhealthy.

use async_trait::async_trait;
use serde_json::json;

use reportforge_shared::{EnrichmentError, EnrichmentResult, ModuleId, Provenance};

use crate::client::EnrichmentClient;

/// Confidence attached to every fallback result.
pub const FALLBACK_CONFIDENCE: f64 = 0.3;

/// Returns a labelled placeholder payload. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackEnrichmentClient;

impl FallbackEnrichmentClient {
    /// The fallback result for one module, without going through the trait.
    pub fn result_for(&self, module_id: &ModuleId) -> EnrichmentResult {
        EnrichmentResult {
            confidence: FALLBACK_CONFIDENCE,
            provenance: Provenance::Fallback,
            payload: json!({
                "source": "fallback",
                "module_id": module_id.as_str(),
                "entities": [],
                "patterns": [],
                "precedents": [],
                "summary": format!(
                    "Knowledge services were unavailable; no external context was added to {module_id}."
                ),
            }),
        }
    }
}

#[async_trait]
impl EnrichmentClient for FallbackEnrichmentClient {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn enrich(
        &self,
        module_id: &ModuleId,
        _context: &str,
    ) -> Result<EnrichmentResult, EnrichmentError> {
        Ok(self.result_for(module_id))
    }
}
