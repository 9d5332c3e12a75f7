//! Configuration validation.
//!
//! Checks that required values are present and within valid ranges before
//! the service binds its listener.

use thiserror::Error;

use crate::config::{
    Config, LlmConfig, NetworkConfig, ObservabilityConfig, ScreenerConfig, SecretsConfig,
    StorageConfig,
};

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid port {port}: must be between 1 and 65535")]
    InvalidPort { port: u16, field: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

impl Config {
    /// Validate the entire configuration.
    pub fn validate(&self) -> ValidationResult<()> {
        let sections: [&dyn Validate; 6] = [
            &self.network,
            &self.observability,
            &self.secrets,
            &self.storage,
            &self.screener,
            &self.llm,
        ];

        let mut errors: Vec<ValidationError> = sections
            .iter()
            .filter_map(|s| s.validate().err())
            .collect();

        if errors.is_empty() {
            Ok(())
        } else if errors.len() == 1 {
            Err(errors.remove(0))
        } else {
            Err(ValidationError::Multiple(errors))
        }
    }

    /// Load, apply environment overrides and validate.
    pub fn load_and_validate() -> anyhow::Result<Self> {
        let config = Self::load_with_env()?;
        config.validate().map_err(|e| anyhow::anyhow!("{}", e))?;
        Ok(config)
    }
}

impl Validate for NetworkConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort {
                port: self.port,
                field: "network.port".into(),
            });
        }
        if self.bind.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "network.bind".into(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ValidationError::InvalidValue {
                field: "network.request_timeout_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }
        Ok(())
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_level".into(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            });
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.log_format.as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_format".into(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            });
        }

        Ok(())
    }
}

impl Validate for SecretsConfig {
    fn validate(&self) -> ValidationResult<()> {
        let Some(key) = self.llm.openai.as_deref().map(str::trim) else {
            return Ok(());
        };
        if !key.is_empty() && !key.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(ValidationError::InvalidValue {
                field: "secrets.llm.openai".into(),
                reason: "must contain only visible ASCII characters".into(),
            });
        }
        Ok(())
    }
}

impl Validate for StorageConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.bucket.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "storage.bucket".into(),
            });
        }
        if self.prefix.is_empty() {
            return Err(ValidationError::MissingField {
                field: "storage.prefix".into(),
            });
        }
        if !self.api_base.starts_with("http://") && !self.api_base.starts_with("https://") {
            return Err(ValidationError::InvalidValue {
                field: "storage.api_base".into(),
                reason: "must be an http(s) URL".into(),
            });
        }
        if self.history_window_days == 0 {
            return Err(ValidationError::InvalidValue {
                field: "storage.history_window_days".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ValidationError::InvalidValue {
                field: "storage.fetch_timeout_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.history_concurrency == 0 {
            return Err(ValidationError::InvalidValue {
                field: "storage.history_concurrency".into(),
                reason: "must be greater than 0".into(),
            });
        }
        Ok(())
    }
}

impl Validate for ScreenerConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.result_limit == 0 {
            return Err(ValidationError::InvalidValue {
                field: "screener.result_limit".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if let Some(entry) = self.symbols.iter().find(|e| e.symbol.trim().is_empty()) {
            return Err(ValidationError::InvalidValue {
                field: "screener.symbols".into(),
                reason: format!("empty symbol (sector {:?})", entry.sector),
            });
        }
        Ok(())
    }
}

impl Validate for LlmConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidValue {
                field: "llm.timeout_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }
        for (field, value) in [
            ("llm.insight_temperature", self.insight_temperature),
            ("llm.sentiment_temperature", self.sentiment_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(ValidationError::InvalidValue {
                    field: field.into(),
                    reason: "must be between 0.0 and 2.0".into(),
                });
            }
        }
        Ok(())
    }
}
