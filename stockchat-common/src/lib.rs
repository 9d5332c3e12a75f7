//! stockchat-common - Shared configuration, errors and logging for stockchat services.
//!
//! This crate provides:
//! - Configuration types, loading and environment overrides
//! - Configuration validation
//! - The error taxonomy rendered at the HTTP boundary
//! - Logging setup
//! - Small string utilities used when logging upstream payloads

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;
pub mod util;
pub mod validation;

pub use config::{
    Config, LlmConfig, NetworkConfig, ObservabilityConfig, ScreenerConfig, StorageConfig,
    SymbolEntry,
};
pub use error::{Error, Result};
pub use validation::{Validate, ValidationError, ValidationResult};

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::logging::init_logging;
    pub use crate::validation::Validate;
}
