//! Scoring stages.
//!
//! Each stage mutates its owning transaction's derived fields and persists
//! the result before the next stage runs, so a prefix of completed stages
//! is always durable. Stages return `Result`; the orchestrator is the
//! single fail-open boundary that logs and records a stage failure without
//! propagating it.

pub mod anomaly;
pub mod categorizer;
pub mod decision;
pub mod notifier;

pub use anomaly::AnomalyDetector;
pub use categorizer::Categorizer;
pub use decision::RiskDecider;
pub use notifier::Notifier;
