//! Type definitions for the scoring pipeline

pub mod alert;
pub mod transaction;

pub use alert::{Alert, AlertSeverity};
pub use transaction::{ScoringState, Transaction, TransactionCreateRequest, TransactionStatus};
