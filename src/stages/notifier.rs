//! Alert creation for risky transactions.

use crate::producer::AlertProducer;
use crate::store::AlertStore;
use crate::types::{Alert, AlertSeverity, Transaction};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info};

/// Risk score at or above which the orchestrator invokes the notifier.
/// Deliberately lower than the flag threshold so medium-risk transactions
/// alert without being auto-flagged.
pub const NOTIFY_THRESHOLD: f64 = 0.4;

/// Notification stage: creates exactly one alert per invocation.
pub struct Notifier {
    alerts: Arc<dyn AlertStore>,
    /// Optional outbound mirror; the persisted alert row is the source of
    /// truth and a publish failure is logged, never propagated.
    producer: Option<AlertProducer>,
}

impl Notifier {
    pub fn new(alerts: Arc<dyn AlertStore>, producer: Option<AlertProducer>) -> Self {
        Self { alerts, producer }
    }

    pub async fn run(&self, tx: &Transaction) -> Result<()> {
        let risk_score = tx.risk_score.unwrap_or(0.0);
        let severity = AlertSeverity::from_risk_score(risk_score);

        let alert = Alert::for_transaction(tx, severity);
        let alert = self
            .alerts
            .save(&alert)
            .await
            .context("persisting alert")?;

        if let Some(producer) = &self.producer {
            if let Err(e) = producer.publish(&alert).await {
                error!(
                    alert_id = %alert.id,
                    transaction_id = %tx.id,
                    error = %e,
                    "Failed to publish alert"
                );
            }
        }

        info!(
            alert_id = %alert.id,
            transaction_id = %tx.id,
            severity = ?alert.severity,
            "Alert created"
        );
        Ok(())
    }
}
