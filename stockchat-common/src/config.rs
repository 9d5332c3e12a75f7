//! Configuration management for stockchat services.
//!
//! All services share a single configuration file at `~/.stockchat/config.json`.
//!
//! # Configuration Priority
//!
//! 1. Environment variables (`STOCKCHAT_*` prefix, `OPENAI_*`)
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `STOCKCHAT_PORT` → network.port
//! - `STOCKCHAT_BIND_ADDRESS` → network.bind
//! - `STOCKCHAT_LOG_LEVEL` → observability.log_level
//! - `STOCKCHAT_BUCKET` → storage.bucket
//! - `OPENAI_API_KEY` → secrets.llm.openai
//! - `OPENAI_BASE_URL` → llm.base_url

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".stockchat"),
        |dirs| dirs.home_dir().join(".stockchat"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

// ============================================================================
// Network Configuration
// ============================================================================

/// Bind address and port of the HTTP surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Bind address. `127.0.0.1` keeps the service local, `0.0.0.0` exposes it.
    #[serde(default = "default_bind_address")]
    pub bind: String,

    /// HTTP port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Per-request timeout applied by the HTTP layer, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind: default_bind_address(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    4480
}

fn default_request_timeout() -> u64 {
    180 // LLM completions of 4000 tokens can take a while
}

// ============================================================================
// Secrets
// ============================================================================

/// Grouped credentials.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SecretsConfig {
    #[serde(default)]
    pub llm: LlmSecretsConfig,
}

/// LLM provider API keys.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct LlmSecretsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai: Option<String>,
}

impl std::fmt::Debug for LlmSecretsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSecretsConfig")
            .field("openai", &self.openai.as_ref().map(|_| "***"))
            .finish()
    }
}

// ============================================================================
// Snapshot Storage
// ============================================================================

/// Where the screener snapshots live and how they are read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base URL of the object-storage HTTP API
    #[serde(default = "default_storage_api_base")]
    pub api_base: String,

    /// Bucket holding the snapshots
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Object name prefix, e.g. `tickertape_custom_screener_`
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Object name suffix
    #[serde(default = "default_suffix")]
    pub suffix: String,

    /// Trailing window of snapshots considered historical, in days
    #[serde(default = "default_history_window_days")]
    pub history_window_days: u32,

    /// Timeout for a single list/fetch call, in seconds
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Maximum number of snapshot fetches in flight during history aggregation
    #[serde(default = "default_history_concurrency")]
    pub history_concurrency: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            api_base: default_storage_api_base(),
            bucket: default_bucket(),
            prefix: default_prefix(),
            suffix: default_suffix(),
            history_window_days: default_history_window_days(),
            fetch_timeout_secs: default_fetch_timeout(),
            history_concurrency: default_history_concurrency(),
        }
    }
}

fn default_storage_api_base() -> String {
    "https://storage.googleapis.com".to_string()
}

fn default_bucket() -> String {
    "aistocks_data".to_string()
}

fn default_prefix() -> String {
    "tickertape_custom_screener_".to_string()
}

fn default_suffix() -> String {
    ".json".to_string()
}

fn default_history_window_days() -> u32 {
    183
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_history_concurrency() -> usize {
    4
}

// ============================================================================
// Screener
// ============================================================================

/// A known ticker and the sector used for portfolio breakdowns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolEntry {
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
}

impl SymbolEntry {
    pub fn new(symbol: impl Into<String>, sector: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            sector: Some(sector.into()),
        }
    }
}

/// Screening behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenerConfig {
    /// Maximum number of records an advanced screen hands to the narrator
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,

    /// Symbol registry used for query classification and sector lookup
    #[serde(default = "default_symbols")]
    pub symbols: Vec<SymbolEntry>,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            result_limit: default_result_limit(),
            symbols: default_symbols(),
        }
    }
}

fn default_result_limit() -> usize {
    10
}

/// Default NSE large-cap universe with sector tags.
pub fn default_symbols() -> Vec<SymbolEntry> {
    [
        ("INFOSYS", "Technology"),
        ("TCS", "Technology"),
        ("HDFC", "Financial"),
        ("RELIANCE", "Energy"),
        ("TATAMOTORS", "Automotive"),
        ("TATASTEEL", "Materials"),
        ("WIPRO", "Technology"),
        ("HCLTECH", "Technology"),
        ("TECHM", "Technology"),
        ("MINDTREE", "Technology"),
        ("LTI", "Technology"),
        ("MPHASIS", "Technology"),
        ("PERSISTENT", "Technology"),
        ("COFORGE", "Technology"),
        ("L&T", "Industrial"),
        ("BHARTIARTL", "Telecommunications"),
        ("ITC", "Consumer Goods"),
        ("AXISBANK", "Financial"),
        ("ICICIBANK", "Financial"),
        ("KOTAKBANK", "Financial"),
        ("SBIN", "Financial"),
        ("HINDUNILVR", "Consumer Goods"),
        ("MARUTI", "Automotive"),
        ("BAJFINANCE", "Financial"),
        ("BAJAJFINSV", "Financial"),
        ("ASIANPAINT", "Materials"),
        ("ULTRACEMCO", "Materials"),
        ("NESTLEIND", "Consumer Goods"),
        ("SUNPHARMA", "Healthcare"),
        ("DRREDDY", "Healthcare"),
        ("CIPLA", "Healthcare"),
        ("DIVISLAB", "Healthcare"),
        ("TATACONSUM", "Consumer Goods"),
        ("BRITANNIA", "Consumer Goods"),
        ("HINDALCO", "Materials"),
        ("VEDL", "Materials"),
        ("JSWSTEEL", "Materials"),
        ("ADANIENT", "Conglomerate"),
        ("ADANIPORTS", "Infrastructure"),
    ]
    .into_iter()
    .map(|(symbol, sector)| SymbolEntry::new(symbol, sector))
    .collect()
}

// ============================================================================
// LLM
// ============================================================================

/// Narrative generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the chat-completions API
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Model for stock and screen narratives
    #[serde(default = "default_insight_model")]
    pub insight_model: String,

    #[serde(default = "default_insight_max_tokens")]
    pub insight_max_tokens: u32,

    #[serde(default = "default_insight_temperature")]
    pub insight_temperature: f64,

    /// Model for news sentiment summaries
    #[serde(default = "default_sentiment_model")]
    pub sentiment_model: String,

    #[serde(default = "default_sentiment_max_tokens")]
    pub sentiment_max_tokens: u32,

    #[serde(default = "default_sentiment_temperature")]
    pub sentiment_temperature: f64,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            insight_model: default_insight_model(),
            insight_max_tokens: default_insight_max_tokens(),
            insight_temperature: default_insight_temperature(),
            sentiment_model: default_sentiment_model(),
            sentiment_max_tokens: default_sentiment_max_tokens(),
            sentiment_temperature: default_sentiment_temperature(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

fn default_llm_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_insight_model() -> String {
    "gpt-4o".to_string()
}

fn default_insight_max_tokens() -> u32 {
    4000
}

fn default_insight_temperature() -> f64 {
    0.3
}

fn default_sentiment_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_sentiment_max_tokens() -> u32 {
    300
}

fn default_sentiment_temperature() -> f64 {
    0.7
}

fn default_llm_timeout() -> u64 {
    120
}

// ============================================================================
// Observability
// ============================================================================

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,

    /// Additional module targets clamped to `warn`.
    #[serde(default)]
    pub excluded_targets: Vec<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            excluded_targets: Vec::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub secrets: SecretsConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub screener: ScreenerConfig,

    #[serde(default)]
    pub llm: LlmConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration with environment variable overrides.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("STOCKCHAT_PORT") {
            match port.parse() {
                Ok(p) => self.network.port = p,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid STOCKCHAT_PORT"),
            }
        }

        if let Some(bind) = lookup("STOCKCHAT_BIND_ADDRESS") {
            self.network.bind = bind;
        }

        if let Some(level) = lookup("STOCKCHAT_LOG_LEVEL") {
            self.observability.log_level = level;
        }

        if let Some(bucket) = lookup("STOCKCHAT_BUCKET") {
            self.storage.bucket = bucket;
        }

        if let Some(key) = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.secrets.llm.openai = Some(key);
        }

        if let Some(url) = lookup("OPENAI_BASE_URL") {
            self.llm.base_url = url;
        }
    }

    /// `bind:port` of the HTTP surface.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.network.bind, self.network.port)
    }

    /// OpenAI API key, trimmed, if configured and non-empty.
    pub fn openai_api_key(&self) -> Option<&str> {
        self.secrets
            .llm
            .openai
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Sector of a registered symbol (case-insensitive).
    pub fn sector_for(&self, symbol: &str) -> Option<&str> {
        self.screener
            .symbols
            .iter()
            .find(|e| e.symbol.eq_ignore_ascii_case(symbol))
            .and_then(|e| e.sector.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.network.port, 4480);
        assert_eq!(config.storage.bucket, "aistocks_data");
        assert_eq!(config.storage.prefix, "tickertape_custom_screener_");
        assert_eq!(config.storage.history_window_days, 183);
        assert_eq!(config.screener.result_limit, 10);
        assert_eq!(config.screener.symbols.len(), 39);
        assert_eq!(config.llm.insight_model, "gpt-4o");
        assert!(config.openai_api_key().is_none());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(
            r#"{ "storage": { "bucket": "other" }, "screener": { "result_limit": 5 } }"#,
        )
        .unwrap();
        assert_eq!(config.storage.bucket, "other");
        assert_eq!(config.storage.suffix, ".json");
        assert_eq!(config.screener.result_limit, 5);
        assert!(!config.screener.symbols.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "network": {{ "port": 9000 }}, "secrets": {{ "llm": {{ "openai": "sk-test" }} }} }}"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.network.port, 9000);
        assert_eq!(config.openai_api_key(), Some("sk-test"));
    }

    #[test]
    fn test_load_from_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(Config::load_from(file.path()).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("STOCKCHAT_PORT", "5000"),
            ("STOCKCHAT_BIND_ADDRESS", "0.0.0.0"),
            ("STOCKCHAT_BUCKET", "snapshots"),
            ("OPENAI_API_KEY", "sk-env"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides_from(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.listen_address(), "0.0.0.0:5000");
        assert_eq!(config.storage.bucket, "snapshots");
        assert_eq!(config.openai_api_key(), Some("sk-env"));
    }

    #[test]
    fn test_invalid_port_override_ignored() {
        let mut config = Config::default();
        config.apply_overrides_from(|k| (k == "STOCKCHAT_PORT").then(|| "abc".to_string()));
        assert_eq!(config.network.port, 4480);
    }

    #[test]
    fn test_blank_api_key_is_absent() {
        let mut config = Config::default();
        config.secrets.llm.openai = Some("   ".into());
        assert!(config.openai_api_key().is_none());
    }

    #[test]
    fn test_sector_lookup() {
        let config = Config::default();
        assert_eq!(config.sector_for("infosys"), Some("Technology"));
        assert_eq!(config.sector_for("SBIN"), Some("Financial"));
        assert_eq!(config.sector_for("UNKNOWN"), None);
    }

    #[test]
    fn test_secrets_debug_redacted() {
        let secrets = LlmSecretsConfig {
            openai: Some("sk-very-secret".into()),
        };
        let debug = format!("{:?}", secrets);
        assert!(!debug.contains("sk-very-secret"));
    }
}
