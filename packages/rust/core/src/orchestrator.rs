//! Report-generation run: concurrent fan-out over the registry, ordered
//! collection, deadline handling and consistency verification.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use reportforge_enrichment::{EnrichmentClient, EnrichmentSession};
use reportforge_modules::ModuleRegistry;
use reportforge_shared::{
    AnalysisInput, BlockFailure, CatalogEntry, ContentBlock, FailureKind, ModuleId, ReportResult,
    RunConfig, RunId, RunStats, RunStatus,
};

use crate::runner::ModuleRunner;
use crate::verifier::ConsistencyVerifier;

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Callback for progress updates during a run.
pub trait RunProgress: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called as each block is collected, in catalog order.
    fn module_finished(&self, id: &ModuleId, current: usize, total: usize);
    /// Called when the run completes.
    fn done(&self, result: &ReportResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl RunProgress for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn module_finished(&self, _id: &ModuleId, _current: usize, _total: usize) {}
    fn done(&self, _result: &ReportResult) {}
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Runs every registered module and assembles the [`ReportResult`].
pub struct Orchestrator {
    registry: Arc<ModuleRegistry>,
    live: Option<Arc<dyn EnrichmentClient>>,
    config: RunConfig,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<ModuleRegistry>,
        live: Option<Arc<dyn EnrichmentClient>>,
        config: RunConfig,
    ) -> Self {
        Self {
            registry,
            live,
            config,
        }
    }

    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Generate a full report. Total: never fails, and always returns one
    /// block per registered module in catalog order.
    ///
    /// 1. Fresh enrichment session (and breaker) for this run
    /// 2. One task per module, gated by `max_concurrency` permits
    /// 3. Collect handles in catalog order, cancelling at the report deadline
    /// 4. Status, stats and consistency findings
    #[instrument(skip_all, fields(run_id = %run_id, modules = self.registry.len()))]
    pub async fn run_with_id(
        &self,
        run_id: RunId,
        input: AnalysisInput,
        progress: &dyn RunProgress,
    ) -> ReportResult {
        let started = Instant::now();
        let deadline = self
            .config
            .report_deadline
            .map(|budget| tokio::time::Instant::now() + budget);
        let permits = match self.config.max_concurrency {
            0 => self.registry.len().max(1),
            n => n,
        };
        info!(
            permits,
            module_timeout_ms = self.config.module_timeout.as_millis() as u64,
            deadline_ms = self.config.report_deadline.map(|d| d.as_millis() as u64),
            live_enrichment = self.live.is_some(),
            "starting report run"
        );

        // --- Fan out ---
        progress.phase("generating");
        let session = Arc::new(EnrichmentSession::new(
            self.live.clone(),
            &self.config.enrichment,
        ));
        let runner = ModuleRunner::new(
            self.config.module.clone(),
            self.config.module_timeout,
            session,
        );
        let input = Arc::new(input);
        let semaphore = Arc::new(Semaphore::new(permits));

        let mut handles: Vec<JoinHandle<ContentBlock>> = Vec::with_capacity(self.registry.len());
        for (entry, module) in self.registry.iter() {
            let runner = runner.clone();
            let module = Arc::clone(module);
            let entry = entry.clone();
            let input = Arc::clone(&input);
            let sem = Arc::clone(&semaphore);
            handles.push(tokio::spawn(async move {
                // The semaphore is never closed; a missing permit just means no gate.
                let _permit = sem.acquire_owned().await.ok();
                runner.run(module.as_ref(), &entry, &input).await
            }));
        }

        // --- Collect in catalog order ---
        let total = handles.len();
        let mut blocks: Vec<ContentBlock> = Vec::with_capacity(total);
        for (index, (handle, (entry, _))) in handles.into_iter().zip(self.registry.iter()).enumerate()
        {
            let block = collect(handle, entry, deadline).await;
            progress.module_finished(&entry.id, index + 1, total);
            blocks.push(block);
        }

        // --- Verify ---
        progress.phase("verifying");
        let findings = ConsistencyVerifier::new(self.registry.catalog()).verify(&blocks);

        let status = RunStatus::from_blocks(&blocks);
        let stats = RunStats::from_blocks(&blocks, started.elapsed().as_millis() as u64);
        info!(
            status = ?status,
            generated = stats.generated,
            no_data = stats.no_data,
            failed = stats.failed,
            timed_out = stats.timed_out,
            cancelled = stats.cancelled,
            live_enrichments = stats.live_enrichments,
            fallback_enrichments = stats.fallback_enrichments,
            findings = findings.len(),
            elapsed_ms = stats.elapsed_ms,
            "report run finished"
        );

        let result = ReportResult {
            run_id,
            generated_at: Utc::now(),
            status,
            blocks,
            findings,
            stats,
        };
        progress.done(&result);
        result
    }

    /// [`Self::run_with_id`] with a fresh run id.
    pub async fn run(&self, input: AnalysisInput, progress: &dyn RunProgress) -> ReportResult {
        self.run_with_id(RunId::new(), input, progress).await
    }
}

/// Await one module task, honouring the report deadline.
///
/// Tasks that already finished are collected even after the deadline; the rest
/// are aborted and replaced by a placeholder.
async fn collect(
    mut handle: JoinHandle<ContentBlock>,
    entry: &CatalogEntry,
    deadline: Option<tokio::time::Instant>,
) -> ContentBlock {
    let joined = match deadline {
        Some(deadline) => match tokio::time::timeout_at(deadline, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                handle.abort();
                warn!(module = %entry.id, "report deadline passed, module cancelled");
                return ContentBlock::placeholder(
                    entry,
                    BlockFailure::new(
                        FailureKind::DeadlineExceeded,
                        "report deadline passed before the module finished",
                    ),
                );
            }
        },
        None => handle.await,
    };

    match joined {
        Ok(block) => block,
        Err(e) if e.is_panic() => {
            warn!(module = %entry.id, "module panicked");
            ContentBlock::placeholder(
                entry,
                BlockFailure::new(FailureKind::Panicked, "module panicked during generation"),
            )
        }
        Err(e) => {
            warn!(module = %entry.id, error = %e, "module task cancelled");
            ContentBlock::placeholder(
                entry,
                BlockFailure::new(FailureKind::DeadlineExceeded, format!("module task cancelled: {e}")),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use reportforge_modules::{Catalog, ContentModule, ModuleOutput, sample_input};
    use reportforge_shared::{
        ChartKind, ChartPayload, DeclaredKind, Discrepancy, EnrichmentError, EnrichmentResult,
        EnrichmentSettings, ModuleConfig, ModuleError,
    };
    use serde_json::json;

    enum Behavior {
        Ready,
        Sleep(Duration),
        Fail,
        Panic,
    }

    struct Fake {
        id: &'static str,
        prose: &'static str,
        declared: ChartKind,
        rendered: ChartKind,
        behavior: Behavior,
    }

    impl Fake {
        fn ready(id: &'static str, prose: &'static str, declared: ChartKind, rendered: ChartKind) -> Self {
            Self {
                id,
                prose,
                declared,
                rendered,
                behavior: Behavior::Ready,
            }
        }

        fn with(id: &'static str, kind: ChartKind, behavior: Behavior) -> Self {
            Self {
                id,
                prose: "Plain prose.",
                declared: kind,
                rendered: kind,
                behavior,
            }
        }
    }

    #[async_trait]
    impl ContentModule for Fake {
        fn id(&self) -> &str {
            self.id
        }

        async fn generate(
            &self,
            _input: &AnalysisInput,
            _config: &ModuleConfig,
        ) -> Result<ModuleOutput, ModuleError> {
            match self.behavior {
                Behavior::Ready => {}
                Behavior::Sleep(d) => tokio::time::sleep(d).await,
                Behavior::Fail => return Err(ModuleError::generation("bad input")),
                Behavior::Panic => panic!("module bug"),
            }
            Ok(ModuleOutput::new(
                self.prose.to_string(),
                self.declared,
                ChartPayload::empty(self.rendered),
            ))
        }
    }

    /// Always-failing live client that counts its calls.
    struct DownLive {
        calls: AtomicUsize,
        delay: Duration,
    }

    impl DownLive {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay,
            })
        }
    }

    #[async_trait]
    impl EnrichmentClient for DownLive {
        fn name(&self) -> &str {
            "down"
        }

        async fn enrich(
            &self,
            _module_id: &ModuleId,
            _context: &str,
        ) -> Result<EnrichmentResult, EnrichmentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Err(EnrichmentError::Unavailable("connection refused".into()))
        }
    }

    #[derive(Default)]
    struct Recording {
        finished: Mutex<Vec<(String, usize, usize)>>,
        phases: Mutex<Vec<String>>,
    }

    impl RunProgress for Recording {
        fn phase(&self, name: &str) {
            self.phases.lock().unwrap().push(name.to_string());
        }
        fn module_finished(&self, id: &ModuleId, current: usize, total: usize) {
            self.finished
                .lock()
                .unwrap()
                .push((id.to_string(), current, total));
        }
        fn done(&self, _result: &ReportResult) {
            self.phases.lock().unwrap().push("done".into());
        }
    }

    fn registry(modules: Vec<Fake>) -> Arc<ModuleRegistry> {
        let catalog = Catalog::new(
            modules
                .iter()
                .map(|m| CatalogEntry::new(m.id, &m.id.to_uppercase(), m.rendered))
                .collect(),
        )
        .unwrap();
        let modules: Vec<Arc<dyn ContentModule>> = modules
            .into_iter()
            .map(|m| Arc::new(m) as Arc<dyn ContentModule>)
            .collect();
        Arc::new(ModuleRegistry::new(catalog, modules).unwrap())
    }

    fn config() -> RunConfig {
        RunConfig {
            module: ModuleConfig {
                include_enrichment: false,
                ..ModuleConfig::default()
            },
            module_timeout: Duration::from_millis(50),
            report_deadline: None,
            max_concurrency: 0,
            enrichment: EnrichmentSettings::default(),
        }
    }

    fn ids(result: &ReportResult) -> Vec<&str> {
        result.blocks.iter().map(|b| b.module_id.as_str()).collect()
    }

    #[tokio::test]
    async fn three_module_scenario() {
        let registry = registry(vec![
            Fake::ready("a", "The bar chart ranks segments.", ChartKind::Bar, ChartKind::Bar),
            Fake::ready("b", "The scatter plot tracks growth.", ChartKind::Line, ChartKind::Line),
            Fake::with("c", ChartKind::Bar, Behavior::Sleep(Duration::from_secs(5))),
        ]);
        let result = Orchestrator::new(registry, None, config())
            .run(json!({}), &SilentProgress)
            .await;

        assert_eq!(ids(&result), vec!["a", "b", "c"]);
        assert_eq!(result.status, RunStatus::Degraded);

        assert_eq!(result.findings.len(), 1);
        let b = &result.findings[0];
        assert_eq!(b.module_id.as_str(), "b");
        assert_eq!(b.declared_kind, DeclaredKind::Stated(ChartKind::Scatter));
        assert_eq!(b.expected_kind, ChartKind::Line);
        assert_eq!(b.rendered_kind, Some(ChartKind::Line));
        assert_eq!(
            b.issues,
            vec![Discrepancy::CatalogVsText, Discrepancy::TextVsRendered]
        );

        let c = &result.blocks[2];
        assert_eq!(c.failure.as_ref().unwrap().kind, FailureKind::Timeout);
        assert_eq!(result.stats.timed_out, 1);
        assert_eq!(result.stats.generated, 2);
    }

    #[tokio::test]
    async fn every_failure_mode_still_yields_a_block() {
        let registry = registry(vec![
            Fake::with("ok", ChartKind::Pie, Behavior::Ready),
            Fake::with("fails", ChartKind::Bar, Behavior::Fail),
            Fake::with("panics", ChartKind::Radar, Behavior::Panic),
            Fake::with("slow", ChartKind::Line, Behavior::Sleep(Duration::from_secs(5))),
            Fake::with("also_ok", ChartKind::Bubble, Behavior::Ready),
        ]);
        let result = Orchestrator::new(registry, None, config())
            .run(json!({}), &SilentProgress)
            .await;

        assert_eq!(ids(&result), vec!["ok", "fails", "panics", "slow", "also_ok"]);
        let kinds: Vec<Option<FailureKind>> = result
            .blocks
            .iter()
            .map(|b| b.failure.as_ref().map(|f| f.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                None,
                Some(FailureKind::GenerationFailure),
                Some(FailureKind::Panicked),
                Some(FailureKind::Timeout),
                None
            ]
        );
        assert_eq!(result.stats.failed, 2);
        assert!(result.findings.is_empty());
    }

    #[tokio::test]
    async fn deadline_cancels_unfinished_modules() {
        let registry = registry(vec![
            Fake::with("fast", ChartKind::Bar, Behavior::Ready),
            Fake::with("stuck", ChartKind::Line, Behavior::Sleep(Duration::from_secs(10))),
            Fake::with("late_fast", ChartKind::Pie, Behavior::Ready),
        ]);
        let config = RunConfig {
            module_timeout: Duration::from_secs(30),
            report_deadline: Some(Duration::from_millis(100)),
            ..config()
        };
        let started = Instant::now();
        let result = Orchestrator::new(registry, None, config)
            .run(json!({}), &SilentProgress)
            .await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(ids(&result), vec!["fast", "stuck", "late_fast"]);
        assert!(result.blocks[0].failure.is_none());
        assert_eq!(
            result.blocks[1].failure.as_ref().unwrap().kind,
            FailureKind::DeadlineExceeded
        );
        // Finished before the deadline, collected after it.
        assert!(result.blocks[2].failure.is_none());
        assert_eq!(result.stats.cancelled, 1);
        assert_eq!(result.status, RunStatus::Degraded);
    }

    #[tokio::test]
    async fn breaker_limits_live_calls_within_a_run() {
        let registry = registry(vec![
            Fake::with("m1", ChartKind::Bar, Behavior::Ready),
            Fake::with("m2", ChartKind::Bar, Behavior::Ready),
            Fake::with("m3", ChartKind::Bar, Behavior::Ready),
            Fake::with("m4", ChartKind::Bar, Behavior::Ready),
        ]);
        let live = DownLive::new(Duration::ZERO);
        let client: Arc<dyn EnrichmentClient> = live.clone();
        let config = RunConfig {
            module: ModuleConfig::default(),
            max_concurrency: 1,
            ..config()
        };
        let orchestrator = Orchestrator::new(registry, Some(client), config);

        let result = orchestrator.run(json!({}), &SilentProgress).await;
        assert_eq!(live.calls.load(Ordering::SeqCst), 2);
        assert!(result.blocks.iter().all(|b| b.used_fallback()));
        assert_eq!(result.stats.fallback_enrichments, 4);
        assert_eq!(result.status, RunStatus::Degraded);

        // A second run starts with a closed breaker.
        orchestrator.run(json!({}), &SilentProgress).await;
        assert_eq!(live.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn breaker_holds_with_all_modules_in_parallel() {
        let registry = Arc::new(ModuleRegistry::builtin().unwrap());
        let live = DownLive::new(Duration::from_millis(40));
        let client: Arc<dyn EnrichmentClient> = live.clone();
        let config = RunConfig {
            module: ModuleConfig::default(),
            module_timeout: Duration::from_secs(5),
            max_concurrency: 0,
            ..config()
        };
        let threshold = config.enrichment.breaker_threshold as usize;

        let result = Orchestrator::new(registry, Some(client), config)
            .run(sample_input(), &SilentProgress)
            .await;

        assert_eq!(live.calls.load(Ordering::SeqCst), threshold);
        assert_eq!(result.stats.fallback_enrichments, 22);
        assert_eq!(result.stats.live_enrichments, 0);
        assert_eq!(result.status, RunStatus::Degraded);
    }

    #[tokio::test]
    async fn progress_follows_catalog_order() {
        let registry = registry(vec![
            Fake::with("first", ChartKind::Bar, Behavior::Sleep(Duration::from_millis(30))),
            Fake::with("second", ChartKind::Line, Behavior::Ready),
        ]);
        let progress = Recording::default();
        Orchestrator::new(registry, None, config())
            .run(json!({}), &progress)
            .await;

        let finished = progress.finished.lock().unwrap().clone();
        assert_eq!(
            finished,
            vec![("first".to_string(), 1, 2), ("second".to_string(), 2, 2)]
        );
        assert_eq!(
            *progress.phases.lock().unwrap(),
            vec!["generating", "verifying", "done"]
        );
    }

    #[tokio::test]
    async fn builtin_sections_are_consistent() {
        let registry = Arc::new(ModuleRegistry::builtin().unwrap());
        let config = RunConfig {
            module_timeout: Duration::from_secs(5),
            ..config()
        };
        let result = Orchestrator::new(registry, None, config)
            .run(sample_input(), &SilentProgress)
            .await;

        assert_eq!(result.blocks.len(), 22);
        assert!(result.findings.is_empty(), "{:?}", result.findings);
        assert_eq!(result.status, RunStatus::Complete);
        assert_eq!(result.stats.generated, 22);
    }

    #[tokio::test]
    async fn builtin_run_with_fallback_enrichment_is_degraded() {
        let registry = Arc::new(ModuleRegistry::builtin().unwrap());
        let config = RunConfig {
            module: ModuleConfig::default(),
            module_timeout: Duration::from_secs(5),
            ..config()
        };
        let result = Orchestrator::new(registry, None, config)
            .run(sample_input(), &SilentProgress)
            .await;

        assert_eq!(result.stats.fallback_enrichments, 22);
        assert_eq!(result.status, RunStatus::Degraded);
        assert!(result.blocks.iter().all(|b| !b.enrichment_surfaced));
    }
}
