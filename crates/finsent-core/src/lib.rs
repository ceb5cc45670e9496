//! Shared domain types and configuration for Finsent.
//!
//! Holds the record model (raw batch rows, enriched corpus rows, sentiment
//! labels), the batch decoding contract with explicit schema detection, and
//! the env-driven application configuration.

use thiserror::Error;

pub mod batch;
pub mod config;
pub mod records;

pub use batch::{decode_batch, Batch, BatchError, BatchSchema};
pub use config::{load_app_config, load_app_config_from_env, AppConfig};
pub use records::{RawRecord, Sentiment, TweetRecord};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),
    #[error("invalid env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
