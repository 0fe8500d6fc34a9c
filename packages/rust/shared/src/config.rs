//! Application configuration for pathscout.
//!
//! User config lives at `~/.pathscout/pathscout.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PathscoutError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "pathscout.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".pathscout";

/// File name of the durable cache database inside the cache directory.
const CACHE_DB_FILE_NAME: &str = "cache.db";

// ---------------------------------------------------------------------------
// Config structs (matching pathscout.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Scan tuning defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// KEGG REST endpoint settings.
    #[serde(default)]
    pub kegg: KeggConfig,

    /// Durable cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Global bound on simultaneous in-flight fetch/extract operations.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Number of pathway documents submitted per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Stop scanning once this many relations have accumulated.
    #[serde(default = "default_min_relations")]
    pub min_relations: usize,

    /// Never fetch more than this many pathway documents per gene.
    #[serde(default = "default_max_pathways")]
    pub max_pathways: usize,

    /// Number of top-ranked related genes to enrich.
    #[serde(default = "default_top_genes")]
    pub top_genes: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            batch_size: default_batch_size(),
            min_relations: default_min_relations(),
            max_pathways: default_max_pathways(),
            top_genes: default_top_genes(),
        }
    }
}

fn default_max_concurrency() -> usize {
    40
}
fn default_batch_size() -> usize {
    10
}
fn default_min_relations() -> usize {
    10
}
fn default_max_pathways() -> usize {
    15
}
fn default_top_genes() -> usize {
    5
}

/// `[kegg]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeggConfig {
    /// Base URL of the KEGG REST API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for KeggConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://rest.kegg.jp".into()
}
fn default_request_timeout_secs() -> u64 {
    10
}

/// `[cache]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory holding the durable cache database.
    /// A leading `~/` is expanded to the user's home directory.
    #[serde(default = "default_cache_dir")]
    pub dir: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
        }
    }
}

fn default_cache_dir() -> String {
    "~/.pathscout/cache".into()
}

impl CacheConfig {
    /// Resolve the cache database path, expanding `~/`.
    pub fn db_path(&self) -> Result<PathBuf> {
        let dir = if let Some(rest) = self.dir.strip_prefix("~/") {
            let home = dirs::home_dir().ok_or_else(|| {
                PathscoutError::config("could not determine home directory")
            })?;
            home.join(rest)
        } else {
            PathBuf::from(&self.dir)
        };
        Ok(dir.join(CACHE_DB_FILE_NAME))
    }
}

// ---------------------------------------------------------------------------
// Scan config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime scan configuration — merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Base URL of the KEGG REST API.
    pub base_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Global bound on simultaneous in-flight operations.
    pub max_concurrency: usize,
    /// Pathway documents submitted per batch.
    pub batch_size: usize,
    /// Early-termination relation threshold.
    pub min_relations: usize,
    /// Hard cap on pathway documents per gene.
    pub max_pathways: usize,
    /// Number of top-ranked genes to enrich.
    pub top_genes: usize,
}

impl From<&AppConfig> for ScanConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_url: config.kegg.base_url.clone(),
            request_timeout: Duration::from_secs(config.kegg.request_timeout_secs),
            max_concurrency: config.defaults.max_concurrency,
            batch_size: config.defaults.batch_size,
            min_relations: config.defaults.min_relations,
            max_pathways: config.defaults.max_pathways,
            top_genes: config.defaults.top_genes,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.pathscout/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PathscoutError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.pathscout/pathscout.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| PathscoutError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| PathscoutError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PathscoutError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PathscoutError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PathscoutError::io(&path, e))?;
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
        assert!(toml_str.contains("max_concurrency"));
        assert!(toml_str.contains("rest.kegg.jp"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.max_concurrency, 40);
        assert_eq!(parsed.defaults.max_pathways, 15);
        assert_eq!(parsed.kegg.request_timeout_secs, 10);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[defaults]
min_relations = 3

[kegg]
base_url = "http://localhost:9999"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.min_relations, 3);
        assert_eq!(config.defaults.batch_size, 10);
        assert_eq!(config.kegg.base_url, "http://localhost:9999");
        assert_eq!(config.kegg.request_timeout_secs, 10);
    }

    #[test]
    fn scan_config_from_app_config() {
        let app = AppConfig::default();
        let scan = ScanConfig::from(&app);
        assert_eq!(scan.max_concurrency, 40);
        assert_eq!(scan.batch_size, 10);
        assert_eq!(scan.min_relations, 10);
        assert_eq!(scan.max_pathways, 15);
        assert_eq!(scan.top_genes, 5);
        assert_eq!(scan.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn cache_dir_without_tilde_is_literal() {
        let cache = CacheConfig {
            dir: "/tmp/pathscout-cache".into(),
        };
        let path = cache.db_path().expect("db path");
        assert_eq!(path, PathBuf::from("/tmp/pathscout-cache/cache.db"));
    }
}
