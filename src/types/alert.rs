//! Alert data structures

use crate::types::transaction::Transaction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Severity of an alert, derived from the transaction's risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertSeverity {
    Medium,
    High,
}

/// Risk score at or above which an alert is `High` severity. Matches the
/// threshold that flags the transaction itself.
pub const HIGH_SEVERITY_THRESHOLD: f64 = 0.7;

impl AlertSeverity {
    /// Map a risk score to a severity.
    pub fn from_risk_score(score: f64) -> Self {
        if score >= HIGH_SEVERITY_THRESHOLD {
            AlertSeverity::High
        } else {
            AlertSeverity::Medium
        }
    }
}

/// A notification artifact addressed to the transaction owner, created by
/// the notifier stage when the risk score crosses the alert threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Unique alert identifier
    pub id: String,

    /// Transaction this alert is about
    pub transaction_id: String,

    /// Owner of the transaction, recipient of the alert
    pub user_id: String,

    /// Alert type tag
    pub alert_type: String,

    pub severity: AlertSeverity,

    /// Short headline rendered from amount and merchant
    pub title: String,

    /// Anomaly explanation, or generic fallback text
    pub message: String,

    /// What the reviewer should do about it
    pub recommendation: String,

    /// Flipped by the UI when the owner views the alert
    pub is_read: bool,

    pub created_at: DateTime<Utc>,
}

impl Alert {
    /// Build an anomaly alert for a scored transaction.
    pub fn for_transaction(tx: &Transaction, severity: AlertSeverity) -> Self {
        let merchant = tx.merchant.as_deref().unwrap_or("Unknown");

        Self {
            id: Uuid::new_v4().to_string(),
            transaction_id: tx.id.clone(),
            user_id: tx.user_id.clone(),
            alert_type: "anomaly".to_string(),
            severity,
            title: format!("Anomaly Detected: ${:.2} at {}", tx.amount, merchant),
            message: tx
                .anomaly_reason
                .clone()
                .unwrap_or_else(|| "Transaction flagged as anomalous".to_string()),
            recommendation: "Please review this transaction for potential fraud or errors"
                .to_string(),
            is_read: false,
            created_at: Utc::now(),
        }
    }
}
