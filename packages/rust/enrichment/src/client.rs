//! The enrichment client contract.

use async_trait::async_trait;

use reportforge_shared::{EnrichmentError, EnrichmentResult, ModuleId};

/// A source of supplementary intelligence for a module's content.
///
/// Implementations may fail; the per-run [`crate::EnrichmentSession`] turns
/// every failure into a fallback result.
#[async_trait]
pub trait EnrichmentClient: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Look up context for `module_id` using the module's own prose.
    async fn enrich(
        &self,
        module_id: &ModuleId,
        context: &str,
    ) -> Result<EnrichmentResult, EnrichmentError>;
}
