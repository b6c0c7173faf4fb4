//! Per-run enrichment: live client, fallback client and breaker.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use reportforge_shared::{EnrichmentMode, EnrichmentResult, EnrichmentSettings, ModuleId};

use crate::breaker::CircuitBreaker;
use crate::client::EnrichmentClient;
use crate::fallback::FallbackEnrichmentClient;

/// Enrichment state for one report run.
///
/// Created fresh by every run, so concurrent runs never share breaker state.
/// Live calls hold one of `breaker_threshold` slots. A failed call keeps its
/// slot until a success ends the streak, so a dead backend sees at most
/// `breaker_threshold` calls however many modules enrich at once.
pub struct EnrichmentSession {
    live: Option<Arc<dyn EnrichmentClient>>,
    fallback: FallbackEnrichmentClient,
    call_timeout: Duration,
    breaker: CircuitBreaker,
    in_flight: Semaphore,
}

impl EnrichmentSession {
    /// Session over an optional live client. `mode = "fallback"` drops the client.
    pub fn new(live: Option<Arc<dyn EnrichmentClient>>, settings: &EnrichmentSettings) -> Self {
        let live = match settings.mode {
            EnrichmentMode::Fallback => None,
            EnrichmentMode::Auto => live,
        };
        let breaker = CircuitBreaker::new(settings.breaker_threshold);
        Self {
            live,
            fallback: FallbackEnrichmentClient,
            call_timeout: settings.call_timeout,
            in_flight: Semaphore::new(breaker.threshold() as usize),
            breaker,
        }
    }

    /// Session that always answers with the fallback.
    pub fn fallback_only() -> Self {
        Self::new(None, &EnrichmentSettings::default())
    }

    pub fn has_live(&self) -> bool {
        self.live.is_some()
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Enrich one module's prose. Never fails: every live problem yields the fallback.
    pub async fn enrich(&self, module_id: &ModuleId, context: &str) -> EnrichmentResult {
        let Some(live) = self.live.as_ref() else {
            return self.fallback.result_for(module_id);
        };
        if self.breaker.is_open() {
            debug!(module = %module_id, "breaker open, using fallback");
            return self.fallback.result_for(module_id);
        }
        // Closed when the breaker trips.
        let Ok(slot) = self.in_flight.acquire().await else {
            debug!(module = %module_id, "breaker opened while queued, using fallback");
            return self.fallback.result_for(module_id);
        };

        let error = match tokio::time::timeout(self.call_timeout, live.enrich(module_id, context)).await
        {
            Ok(Ok(result)) => {
                let streak = self.breaker.record_success();
                drop(slot);
                self.in_flight.add_permits(streak as usize);
                return result;
            }
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!(
                "{} enrichment exceeded {}ms",
                live.name(),
                self.call_timeout.as_millis()
            ),
        };

        warn!(module = %module_id, client = live.name(), error = %error, "live enrichment failed, using fallback");
        slot.forget();
        if self.breaker.record_failure() {
            self.in_flight.close();
            warn!(
                failures = self.breaker.consecutive_failures(),
                threshold = self.breaker.threshold(),
                "enrichment breaker opened; remaining modules use fallback"
            );
        }
        self.fallback.result_for(module_id)
    }
}
