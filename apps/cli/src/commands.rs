//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use reportforge_core::{ConsistencyVerifier, Orchestrator, RunProgress};
use reportforge_enrichment::{EnrichmentClient, LiveEnrichmentClient};
use reportforge_modules::{Catalog, ModuleRegistry, sample_input};
use reportforge_shared::{
    AnalysisInput, AppConfig, ConsistencyFinding, EnrichmentMode, ModuleId, ReportResult,
    RunConfig, Severity, init_config, load_config,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ReportForge: structured analysis data in, narrated and charted report out.
#[derive(Parser)]
#[command(
    name = "reportforge",
    version,
    about = "Generate multi-section analysis reports with chart consistency checks.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Generate a report from an analysis input file.
    Generate {
        /// Analysis input JSON (one object keyed by section).
        #[arg(short, long, required_unless_present = "sample", conflicts_with = "sample")]
        input: Option<PathBuf>,

        /// Use the built-in demonstration input.
        #[arg(long)]
        sample: bool,

        /// Where to write the report JSON (defaults to stdout).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Overall report deadline in milliseconds (0 disables it).
        #[arg(long)]
        deadline_ms: Option<u64>,

        /// Maximum modules running at once (0 = all).
        #[arg(long)]
        concurrency: Option<usize>,

        /// Never contact the live enrichment backend.
        #[arg(long)]
        offline: bool,

        /// Skip enrichment entirely.
        #[arg(long)]
        no_enrichment: bool,
    },

    /// List report sections with their chart kinds.
    Catalog,

    /// Re-run the consistency check on a saved report.
    Verify {
        /// Report JSON written by `generate`.
        #[arg(long)]
        report: PathBuf,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "reportforge=info",
        1 => "reportforge=debug",
        _ => "reportforge=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so a report written to stdout stays clean JSON.
    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Generate {
            input,
            sample,
            out,
            deadline_ms,
            concurrency,
            offline,
            no_enrichment,
        } => {
            let overrides = Overrides {
                deadline_ms,
                concurrency,
                offline,
                no_enrichment,
            };
            cmd_generate(input.as_deref(), sample, out.as_deref(), overrides).await
        }
        Command::Catalog => cmd_catalog(),
        Command::Verify { report } => cmd_verify(&report),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// generate
// ---------------------------------------------------------------------------

/// Command-line adjustments layered over the loaded config.
#[derive(Debug, Default, Clone, Copy)]
struct Overrides {
    deadline_ms: Option<u64>,
    concurrency: Option<usize>,
    offline: bool,
    no_enrichment: bool,
}

impl Overrides {
    fn apply(self, config: &AppConfig) -> RunConfig {
        let mut run = RunConfig::from(config);
        if let Some(ms) = self.deadline_ms {
            run.report_deadline = (ms > 0).then(|| Duration::from_millis(ms));
        }
        if let Some(n) = self.concurrency {
            run.max_concurrency = n;
        }
        if self.offline {
            run.enrichment.mode = EnrichmentMode::Fallback;
        }
        if self.no_enrichment {
            run.module.include_enrichment = false;
        }
        run
    }
}

async fn cmd_generate(
    input: Option<&Path>,
    sample: bool,
    out: Option<&Path>,
    overrides: Overrides,
) -> Result<()> {
    let config = load_config()?;
    let run_config = overrides.apply(&config);

    let input: AnalysisInput = match input {
        Some(path) if !sample => read_json(path)?,
        _ => sample_input(),
    };
    if !input.is_object() {
        return Err(eyre!("analysis input must be a JSON object keyed by section"));
    }

    let live: Option<Arc<dyn EnrichmentClient>> =
        LiveEnrichmentClient::from_settings(&run_config.enrichment)?.map(|client| {
            info!(endpoint = %client.base_url(), "live enrichment enabled");
            Arc::new(client) as Arc<dyn EnrichmentClient>
        });

    let registry = Arc::new(ModuleRegistry::builtin()?);
    let orchestrator = Orchestrator::new(registry, live, run_config);

    let reporter = CliProgress::new();
    let result = orchestrator.run(input, &reporter).await;

    log_findings(&result.findings);

    let json = serde_json::to_string_pretty(&result)?;
    match out {
        Some(path) => {
            std::fs::write(path, format!("{json}\n"))
                .wrap_err_with(|| format!("failed to write {}", path.display()))?;
            print_summary(&result);
            println!("  Report: {}", path.display());
            println!();
        }
        None => println!("{json}"),
    }

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).wrap_err_with(|| format!("failed to parse {}", path.display()))
}

fn log_findings(findings: &[ConsistencyFinding]) {
    for finding in findings {
        let rendered = finding
            .rendered_kind
            .map(|k| k.to_string())
            .unwrap_or_else(|| "-".into());
        match finding.severity {
            Severity::Warning => warn!(
                module = %finding.module_id,
                expected = %finding.expected_kind,
                declared = %finding.declared_kind,
                rendered = %rendered,
                issues = ?finding.issues,
                "chart kind mismatch"
            ),
            Severity::Info => info!(
                module = %finding.module_id,
                declared = %finding.declared_kind,
                issues = ?finding.issues,
                "ambiguous chart reference"
            ),
        }
    }
}

fn print_summary(result: &ReportResult) {
    let stats = &result.stats;
    println!();
    println!("  Report generated ({:?})", result.status);
    println!("  Run:        {}", result.run_id);
    println!("  Sections:   {}", stats.modules);
    println!("  Generated:  {} ({} without data)", stats.generated, stats.no_data);
    println!(
        "  Failed:     {} ({} timed out, {} cancelled)",
        stats.failed + stats.timed_out + stats.cancelled,
        stats.timed_out,
        stats.cancelled
    );
    println!(
        "  Enrichment: {} live, {} fallback",
        stats.live_enrichments, stats.fallback_enrichments
    );
    println!("  Findings:   {}", result.findings.len());
    println!("  Time:       {:.1}s", stats.elapsed_ms as f64 / 1000.0);
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }
}

impl RunProgress for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn module_finished(&self, id: &ModuleId, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Collected [{current}/{total}] {id}"));
    }

    fn done(&self, _result: &ReportResult) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// catalog / verify / config
// ---------------------------------------------------------------------------

fn cmd_catalog() -> Result<()> {
    let catalog = Catalog::builtin();
    for (i, entry) in catalog.iter().enumerate() {
        println!(
            "{:>2}. {:<28} {:<11} {}",
            i + 1,
            entry.id.as_str(),
            entry.chart_kind.as_str(),
            entry.title
        );
    }
    Ok(())
}

fn cmd_verify(path: &Path) -> Result<()> {
    let report: ReportResult = read_json(path)?;
    let catalog = Catalog::builtin();
    let findings = ConsistencyVerifier::new(&catalog).verify(&report.blocks);
    info!(
        run_id = %report.run_id,
        blocks = report.blocks.len(),
        findings = findings.len(),
        "verified saved report"
    );

    if findings.is_empty() {
        println!("No chart kind inconsistencies in {} blocks.", report.blocks.len());
        return Ok(());
    }
    for f in &findings {
        let rendered = f
            .rendered_kind
            .map(|k| k.to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<8} {:<28} expected={} declared={} rendered={} issues={:?}",
            format!("{:?}", f.severity).to_lowercase(),
            f.module_id.as_str(),
            f.expected_kind,
            f.declared_kind,
            rendered,
            f.issues
        );
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
