//! Risk decisioning.
//!
//! Aggregates the signals produced by the earlier stages into an additive
//! risk score and an ordered risk-factor list, and flags the transaction
//! when the score crosses the review threshold. The score is additive,
//! not probabilistic; it is clamped to 1.0 after summation so future
//! factors cannot push it past the documented range.

use crate::store::TransactionStore;
use crate::types::{Transaction, TransactionStatus};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Risk score at or above which a pending transaction is flagged for review.
pub const FLAG_THRESHOLD: f64 = 0.7;

/// Categorization confidence below which a risk factor is added.
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.7;

const ANOMALY_WEIGHT: f64 = 0.6;
const LOW_CONFIDENCE_WEIGHT: f64 = 0.2;

/// Risk decision stage.
pub struct RiskDecider {
    transactions: Arc<dyn TransactionStore>,
}

impl RiskDecider {
    pub fn new(transactions: Arc<dyn TransactionStore>) -> Self {
        Self { transactions }
    }

    /// Score the transaction, conditionally flag it, and persist the
    /// score, factors, and status together.
    pub async fn run(&self, tx: &mut Transaction) -> Result<()> {
        let mut risk_factors = Vec::new();
        let mut risk_score = 0.0;

        if tx.is_anomaly {
            risk_factors.push("Anomaly detected".to_string());
            risk_score += ANOMALY_WEIGHT;
        }

        if let Some(confidence) = tx.classification_confidence {
            if confidence < LOW_CONFIDENCE_THRESHOLD {
                risk_factors.push("Low classification confidence".to_string());
                risk_score += LOW_CONFIDENCE_WEIGHT;
            }
        }

        let risk_score = risk_score.min(1.0);

        tx.risk_score = Some(risk_score);
        tx.risk_factors = risk_factors;

        // Only the pipeline's own PENDING -> FLAGGED transition; statuses
        // set by external review are never touched.
        if risk_score >= FLAG_THRESHOLD && tx.status == TransactionStatus::Pending {
            tx.status = TransactionStatus::Flagged;
        }

        self.transactions
            .save(tx)
            .await
            .context("persisting risk decision")?;

        info!(
            transaction_id = %tx.id,
            risk_score,
            status = ?tx.status,
            "Risk decision made"
        );
        Ok(())
    }
}
