//! In-memory store implementations.
//!
//! Back the binary and the tests; a relational implementation would slot in
//! behind the same traits.

use crate::store::{AlertStore, TransactionStore};
use crate::types::{Alert, Transaction};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Transaction store backed by a `HashMap` keyed on transaction id.
#[derive(Default)]
pub struct MemoryTransactionStore {
    rows: RwLock<HashMap<String, Transaction>>,
}

impl MemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored transactions.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl TransactionStore for MemoryTransactionStore {
    async fn save(&self, tx: &Transaction) -> Result<Transaction> {
        let mut stored = tx.clone();
        stored.updated_at = Utc::now();
        self.rows
            .write()
            .await
            .insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Transaction>> {
        Ok(self.rows.read().await.get(id).cloned())
    }

    async fn find_by_user_and_category_since(
        &self,
        user_id: &str,
        category: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Transaction>> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .filter(|t| {
                t.user_id == user_id && t.category.as_deref() == Some(category) && t.date > since
            })
            .cloned()
            .collect())
    }
}

/// Alert store backed by a `HashMap` keyed on alert id.
#[derive(Default)]
pub struct MemoryAlertStore {
    rows: RwLock<HashMap<String, Alert>>,
}

impl MemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All alerts for a user, most recent first. Used by alert views.
    pub async fn find_by_user(&self, user_id: &str) -> Vec<Alert> {
        let mut alerts: Vec<Alert> = self
            .rows
            .read()
            .await
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        alerts
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl AlertStore for MemoryAlertStore {
    async fn save(&self, alert: &Alert) -> Result<Alert> {
        self.rows
            .write()
            .await
            .insert(alert.id.clone(), alert.clone());
        Ok(alert.clone())
    }
}
