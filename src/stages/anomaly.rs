//! Statistical anomaly detection.
//!
//! Compares a transaction's amount against the owner's historical amounts
//! in the same category over a trailing 90-day window, using a Z-score
//! test. The window is recomputed fresh on every run; nothing is cached.

use crate::store::TransactionStore;
use crate::types::Transaction;
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// Length of the historical window used as the anomaly baseline.
pub const HISTORICAL_WINDOW_DAYS: i64 = 90;

/// Default Z-score threshold above which a transaction is anomalous.
pub const DEFAULT_ANOMALY_THRESHOLD: f64 = 2.0;

/// Sample standard deviation (n-1 denominator).
///
/// The estimator is fixed as *sample*, not population: it matters for
/// small windows, and the documented threshold behavior assumes it.
/// Returns 0.0 for fewer than two values, which the caller treats the
/// same as a zero-variance window.
fn sample_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Anomaly detection stage.
pub struct AnomalyDetector {
    transactions: Arc<dyn TransactionStore>,
    threshold: f64,
}

impl AnomalyDetector {
    pub fn new(transactions: Arc<dyn TransactionStore>, threshold: f64) -> Self {
        Self {
            transactions,
            threshold,
        }
    }

    /// Run the Z-score test and, on an anomaly, mark and persist the
    /// transaction. No-op paths (no category, empty window, zero
    /// variance, score within threshold) perform no write.
    pub async fn run(&self, tx: &mut Transaction) -> Result<()> {
        let Some(category) = tx.category.clone() else {
            // Categorization did not run; no baseline to compare against.
            debug!(transaction_id = %tx.id, "No category, skipping anomaly detection");
            return Ok(());
        };

        let cutoff = Utc::now() - Duration::days(HISTORICAL_WINDOW_DAYS);
        let mut historical = self
            .transactions
            .find_by_user_and_category_since(&tx.user_id, &category, cutoff)
            .await
            .context("loading historical window")?;

        // The transaction under test is already persisted with its
        // category; it must not be part of its own baseline.
        historical.retain(|t| t.id != tx.id);

        if historical.is_empty() {
            debug!(transaction_id = %tx.id, category = %category, "Empty historical window");
            return Ok(());
        }

        let amounts: Vec<f64> = historical.iter().map(|t| t.amount).collect();
        let mean = amounts.iter().sum::<f64>() / amounts.len() as f64;
        let std = sample_std_dev(&amounts, mean);

        if std > 0.0 {
            let z_score = ((tx.amount - mean) / std).abs();

            if z_score > self.threshold {
                tx.is_anomaly = true;
                tx.anomaly_score = Some(z_score);
                tx.anomaly_reason = Some(format!(
                    "Amount ${:.2} is significantly different from average ${:.2} (Z-score: {:.2})",
                    tx.amount, mean, z_score
                ));

                self.transactions
                    .save(tx)
                    .await
                    .context("persisting anomaly flags")?;

                info!(
                    transaction_id = %tx.id,
                    z_score,
                    window_size = historical.len(),
                    "Anomaly detected"
                );
            }
        }

        Ok(())
    }
}
