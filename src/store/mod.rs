//! Persistence seams consumed by the pipeline.
//!
//! The pipeline never talks to a database directly; it goes through these
//! traits. Implementations must provide read-your-writes consistency for a
//! single row and atomic per-row upserts. No optimistic locking is required:
//! concurrent writers to the same row are last-write-wins.

use crate::types::{Alert, Transaction};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub mod memory;

pub use memory::{MemoryAlertStore, MemoryTransactionStore};

/// Store for transaction rows.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Upsert by transaction id, returning the persisted row.
    async fn save(&self, tx: &Transaction) -> Result<Transaction>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Transaction>>;

    /// All of a user's transactions in the given category with an event
    /// date strictly after `since`. This is the anomaly detector's
    /// historical window query.
    async fn find_by_user_and_category_since(
        &self,
        user_id: &str,
        category: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Transaction>>;
}

/// Store for alert rows.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Upsert by alert id, returning the persisted row.
    async fn save(&self, alert: &Alert) -> Result<Alert>;
}
