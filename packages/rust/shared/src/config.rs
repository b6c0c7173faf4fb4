//! Application configuration for ReportForge.
//!
//! User config lives at `~/.reportforge/reportforge.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ReportForgeError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "reportforge.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".reportforge";

// ---------------------------------------------------------------------------
// Config structs (matching reportforge.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Run scheduling limits.
    #[serde(default)]
    pub run: RunSection,

    /// Options passed to every content module.
    #[serde(default)]
    pub module: ModuleConfig,

    /// Knowledge-graph / vector-search backend.
    #[serde(default)]
    pub enrichment: EnrichmentSection,
}

/// `[run]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSection {
    /// Per-module generation budget.
    #[serde(default = "default_module_timeout_ms")]
    pub module_timeout_ms: u64,

    /// Overall report deadline; 0 disables it.
    #[serde(default = "default_report_deadline_ms")]
    pub report_deadline_ms: u64,

    /// Maximum concurrent module runs; 0 means the whole catalog.
    #[serde(default)]
    pub max_concurrency: usize,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            module_timeout_ms: default_module_timeout_ms(),
            report_deadline_ms: default_report_deadline_ms(),
            max_concurrency: 0,
        }
    }
}

fn default_module_timeout_ms() -> u64 {
    5_000
}
fn default_report_deadline_ms() -> u64 {
    30_000
}

/// `[module]` section, handed to `ContentModule::generate` as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Minimum enrichment confidence for the enrichment to be surfaced.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Whether modules are enriched at all.
    #[serde(default = "default_true")]
    pub include_enrichment: bool,

    /// Maximum prose length in characters.
    #[serde(default = "default_max_prose_length")]
    pub max_prose_length: usize,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            include_enrichment: true,
            max_prose_length: default_max_prose_length(),
        }
    }
}

fn default_confidence_threshold() -> f64 {
    0.5
}
fn default_true() -> bool {
    true
}
fn default_max_prose_length() -> usize {
    1_200
}

/// How the enrichment client is selected for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentMode {
    /// Use the live backend when configured, falling back per call.
    #[default]
    Auto,
    /// Never touch the live backend.
    Fallback,
}

/// `[enrichment]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentSection {
    #[serde(default)]
    pub mode: EnrichmentMode,

    /// Base URL of the backend. Absent means fallback-only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Name of the env var holding the backend token (never store the token itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Per-call budget for the live backend.
    #[serde(default = "default_enrichment_timeout_ms")]
    pub timeout_ms: u64,

    /// Consecutive live failures before the breaker opens for the run.
    #[serde(default = "default_breaker_threshold")]
    pub breaker_threshold: u32,

    /// Maximum entities/precedents kept per result.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for EnrichmentSection {
    fn default() -> Self {
        Self {
            mode: EnrichmentMode::Auto,
            endpoint: None,
            api_key_env: default_api_key_env(),
            timeout_ms: default_enrichment_timeout_ms(),
            breaker_threshold: default_breaker_threshold(),
            top_k: default_top_k(),
        }
    }
}

fn default_api_key_env() -> String {
    "REPORTFORGE_KG_API_KEY".into()
}
fn default_enrichment_timeout_ms() -> u64 {
    2_000
}
fn default_breaker_threshold() -> u32 {
    2
}
fn default_top_k() -> usize {
    5
}

// ---------------------------------------------------------------------------
// Runtime config (merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Immutable configuration for one report-generation run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub module: ModuleConfig,
    pub module_timeout: Duration,
    /// `None` disables the overall deadline.
    pub report_deadline: Option<Duration>,
    /// 0 means one slot per catalog entry.
    pub max_concurrency: usize,
    pub enrichment: EnrichmentSettings,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for RunConfig {
    fn from(config: &AppConfig) -> Self {
        let deadline_ms = config.run.report_deadline_ms;
        Self {
            module: config.module.clone(),
            module_timeout: Duration::from_millis(config.run.module_timeout_ms),
            report_deadline: (deadline_ms > 0).then(|| Duration::from_millis(deadline_ms)),
            max_concurrency: config.run.max_concurrency,
            enrichment: EnrichmentSettings::from(&config.enrichment),
        }
    }
}

/// Runtime enrichment settings.
#[derive(Debug, Clone)]
pub struct EnrichmentSettings {
    pub mode: EnrichmentMode,
    pub endpoint: Option<String>,
    pub api_key_env: String,
    pub call_timeout: Duration,
    pub breaker_threshold: u32,
    pub top_k: usize,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self::from(&EnrichmentSection::default())
    }
}

impl From<&EnrichmentSection> for EnrichmentSettings {
    fn from(section: &EnrichmentSection) -> Self {
        Self {
            mode: section.mode,
            endpoint: section.endpoint.clone(),
            api_key_env: section.api_key_env.clone(),
            call_timeout: Duration::from_millis(section.timeout_ms),
            breaker_threshold: section.breaker_threshold.max(1),
            top_k: section.top_k,
        }
    }
}

impl EnrichmentSettings {
    /// Parsed endpoint when the live backend should be used for this run.
    ///
    /// The base always ends with `/` so relative joins keep its path.
    pub fn live_endpoint(&self) -> Result<Option<Url>> {
        if self.mode == EnrichmentMode::Fallback {
            return Ok(None);
        }
        let Some(raw) = self.endpoint.as_deref().filter(|s| !s.trim().is_empty()) else {
            return Ok(None);
        };
        let normalized = if raw.ends_with('/') {
            raw.to_string()
        } else {
            format!("{raw}/")
        };
        Url::parse(&normalized)
            .map(Some)
            .map_err(|e| ReportForgeError::config(format!("invalid enrichment endpoint '{raw}': {e}")))
    }

    /// Backend token from the configured env var, if set and non-empty.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|v| !v.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.reportforge/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ReportForgeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.reportforge/reportforge.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ReportForgeError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        ReportForgeError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Reject values that cannot produce a meaningful run.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let threshold = config.module.confidence_threshold;
    if !(0.0..=1.0).contains(&threshold) {
        return Err(ReportForgeError::config(format!(
            "module.confidence_threshold must be within [0, 1], got {threshold}"
        )));
    }
    if config.module.max_prose_length == 0 {
        return Err(ReportForgeError::config("module.max_prose_length must be positive"));
    }
    if config.run.module_timeout_ms == 0 {
        return Err(ReportForgeError::config("run.module_timeout_ms must be positive"));
    }
    Ok(())
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ReportForgeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ReportForgeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ReportForgeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("module_timeout_ms"));
        assert!(toml_str.contains("REPORTFORGE_KG_API_KEY"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.run.module_timeout_ms, 5_000);
        assert_eq!(parsed.enrichment.breaker_threshold, 2);
        assert_eq!(parsed.module, ModuleConfig::default());
    }

    #[test]
    fn partial_config_uses_defaults() {
        let toml_str = r#"
[module]
max_prose_length = 400

[enrichment]
mode = "fallback"
endpoint = "http://kg.internal:8750"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.module.max_prose_length, 400);
        assert!(config.module.include_enrichment);
        assert_eq!(config.enrichment.mode, EnrichmentMode::Fallback);
        assert_eq!(config.run.report_deadline_ms, 30_000);
    }

    #[test]
    fn run_config_from_app_config() {
        let mut app = AppConfig::default();
        app.run.report_deadline_ms = 0;
        app.enrichment.breaker_threshold = 0;
        let run = RunConfig::from(&app);
        assert_eq!(run.module_timeout, Duration::from_millis(5_000));
        assert!(run.report_deadline.is_none());
        assert_eq!(run.enrichment.breaker_threshold, 1);
        assert_eq!(run.max_concurrency, 0);
    }

    #[test]
    fn live_endpoint_selection() {
        let mut section = EnrichmentSection::default();
        assert_eq!(EnrichmentSettings::from(&section).live_endpoint().unwrap(), None);

        section.endpoint = Some("http://localhost:8750/kg".into());
        let url = EnrichmentSettings::from(&section)
            .live_endpoint()
            .unwrap()
            .expect("endpoint");
        assert_eq!(url.as_str(), "http://localhost:8750/kg/");

        section.mode = EnrichmentMode::Fallback;
        assert_eq!(EnrichmentSettings::from(&section).live_endpoint().unwrap(), None);

        section.mode = EnrichmentMode::Auto;
        section.endpoint = Some("not a url".into());
        assert!(EnrichmentSettings::from(&section).live_endpoint().is_err());
    }

    #[test]
    fn validation_rejects_out_of_range_threshold() {
        let mut config = AppConfig::default();
        config.module.confidence_threshold = 1.5;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("confidence_threshold"));
    }

    #[test]
    fn api_key_missing_env_is_none() {
        let settings = EnrichmentSettings {
            api_key_env: "RF_TEST_NONEXISTENT_KEY_12345".into(),
            ..EnrichmentSettings::from(&EnrichmentSection::default())
        };
        assert!(settings.api_key().is_none());
    }
}
