//! Transaction Scoring Pipeline Library
//!
//! Runs persisted financial transactions through a sequence of scoring
//! stages (categorization, Z-score anomaly detection, risk decisioning,
//! alerting) to flag potentially fraudulent activity for human review.

pub mod config;
pub mod dispatcher;
pub mod intake;
pub mod metrics;
pub mod orchestrator;
pub mod producer;
pub mod stages;
pub mod store;
pub mod types;

pub use config::AppConfig;
pub use dispatcher::ScoringDispatcher;
pub use intake::TransactionIntake;
pub use orchestrator::Orchestrator;
pub use producer::AlertProducer;
pub use types::{alert::Alert, transaction::Transaction};
