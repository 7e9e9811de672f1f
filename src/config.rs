//! Configuration management for the scoring pipeline

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub nats: NatsConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    #[serde(default = "default_nats_url")]
    pub url: String,
    /// Subject carrying transaction-created events
    #[serde(default = "default_transaction_subject")]
    pub transaction_subject: String,
    /// Subject alerts are mirrored to
    #[serde(default = "default_alert_subject")]
    pub alert_subject: String,
}

/// Anomaly detection configuration.
///
/// Only the Z-score threshold is configurable; the flag (0.7) and
/// notification (0.4) thresholds and the 90-day window are fixed in the
/// scoring logic.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionConfig {
    /// Z-score above which a transaction is anomalous
    #[serde(default = "default_anomaly_threshold")]
    pub anomaly_threshold: f64,
}

/// Worker pool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Maximum concurrent scoring runs
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Bounded dispatch queue size; a full queue rejects new dispatches
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_nats_url() -> String {
    "nats://localhost:4222".to_string()
}

fn default_transaction_subject() -> String {
    "transactions.created".to_string()
}

fn default_alert_subject() -> String {
    "fraud.alerts".to_string()
}

fn default_anomaly_threshold() -> f64 {
    2.0
}

fn default_workers() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    256
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from the default file, falling back to built-in
    /// defaults when the file does not exist.
    pub fn load() -> Result<Self> {
        let path = Path::new("config/config.toml");
        if path.exists() {
            Self::load_from_path(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig::default(),
            detection: DetectionConfig::default(),
            pipeline: PipelineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: default_nats_url(),
            transaction_subject: default_transaction_subject(),
            alert_subject: default_alert_subject(),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            anomaly_threshold: default_anomaly_threshold(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
