//! Sequential stage orchestration for one transaction.
//!
//! Runs categorization, anomaly detection, risk decisioning, and
//! (conditionally) alerting in fixed order. A stage failure is logged,
//! counted, and recorded on the transaction as an incomplete scoring run;
//! it never aborts the task, rolls back earlier persisted stages, or
//! surfaces to the caller that created the transaction.

use crate::metrics::PipelineMetrics;
use crate::producer::AlertProducer;
use crate::stages::notifier::NOTIFY_THRESHOLD;
use crate::stages::{AnomalyDetector, Categorizer, Notifier, RiskDecider};
use crate::store::{AlertStore, TransactionStore};
use crate::types::{ScoringState, Transaction};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Runs the scoring stages for one transaction at a time.
pub struct Orchestrator {
    categorizer: Categorizer,
    anomaly_detector: AnomalyDetector,
    risk_decider: RiskDecider,
    notifier: Notifier,
    transactions: Arc<dyn TransactionStore>,
    metrics: Arc<PipelineMetrics>,
}

impl Orchestrator {
    pub fn new(
        transactions: Arc<dyn TransactionStore>,
        alerts: Arc<dyn AlertStore>,
        producer: Option<AlertProducer>,
        anomaly_threshold: f64,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            categorizer: Categorizer::new(transactions.clone()),
            anomaly_detector: AnomalyDetector::new(transactions.clone(), anomaly_threshold),
            risk_decider: RiskDecider::new(transactions.clone()),
            notifier: Notifier::new(alerts, producer),
            transactions,
            metrics,
        }
    }

    /// Score one persisted transaction. Takes the transaction by value:
    /// the run owns it exclusively and threads it through the stages.
    pub async fn process(&self, mut tx: Transaction) {
        let started = Instant::now();
        info!(transaction_id = %tx.id, "Processing transaction");

        let mut incomplete = false;

        if let Err(e) = self.categorizer.run(&mut tx).await {
            error!(transaction_id = %tx.id, error = %e, "Categorization stage failed");
            self.metrics.record_stage_failure("categorize");
            incomplete = true;
        }

        if let Err(e) = self.anomaly_detector.run(&mut tx).await {
            error!(transaction_id = %tx.id, error = %e, "Anomaly detection stage failed");
            self.metrics.record_stage_failure("anomaly");
            incomplete = true;
        }

        if let Err(e) = self.risk_decider.run(&mut tx).await {
            error!(transaction_id = %tx.id, error = %e, "Risk decision stage failed");
            self.metrics.record_stage_failure("decision");
            incomplete = true;
        }

        let risk_score = tx.risk_score.unwrap_or(0.0);

        if risk_score >= NOTIFY_THRESHOLD {
            match self.notifier.run(&tx).await {
                Ok(()) => {
                    let severity = crate::types::AlertSeverity::from_risk_score(risk_score);
                    self.metrics
                        .record_alert(&format!("{:?}", severity).to_lowercase());
                }
                Err(e) => {
                    error!(transaction_id = %tx.id, error = %e, "Notification stage failed");
                    self.metrics.record_stage_failure("notify");
                    incomplete = true;
                }
            }
        }

        // Persist the completion marker so consumers can tell "scoring did
        // not finish" from "scored as low risk". A failure here is the
        // outer guard's concern: log and end the task cleanly.
        tx.scoring = if incomplete {
            ScoringState::Incomplete
        } else {
            ScoringState::Complete
        };
        if let Err(e) = self.transactions.save(&tx).await {
            error!(transaction_id = %tx.id, error = %e, "Failed to persist scoring state");
        }

        self.metrics.record_transaction(started.elapsed(), risk_score);

        info!(
            transaction_id = %tx.id,
            risk_score,
            status = ?tx.status,
            scoring = ?tx.scoring,
            "Transaction processed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::anomaly::DEFAULT_ANOMALY_THRESHOLD;
    use crate::store::{MemoryAlertStore, MemoryTransactionStore};
    use crate::types::{AlertSeverity, TransactionStatus};
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};

    struct Fixture {
        transactions: Arc<MemoryTransactionStore>,
        alerts: Arc<MemoryAlertStore>,
        orchestrator: Orchestrator,
    }

    fn fixture() -> Fixture {
        let transactions = Arc::new(MemoryTransactionStore::new());
        let alerts = Arc::new(MemoryAlertStore::new());
        let orchestrator = Orchestrator::new(
            transactions.clone(),
            alerts.clone(),
            None,
            DEFAULT_ANOMALY_THRESHOLD,
            Arc::new(PipelineMetrics::new()),
        );
        Fixture {
            transactions,
            alerts,
            orchestrator,
        }
    }

    /// Five prior "meals" transactions of $10, $12, $11, $9, $13
    /// (mean 11, sample std ~1.58).
    async fn seed_meals_history(store: &Arc<MemoryTransactionStore>) {
        let now = Utc::now();
        for amount in [10.0, 12.0, 11.0, 9.0, 13.0] {
            let prior =
                Transaction::with_category("u1", amount, now - Duration::days(7), "meals");
            store.save(&prior).await.unwrap();
        }
    }

    async fn new_meals_transaction(
        store: &Arc<MemoryTransactionStore>,
        amount: f64,
    ) -> Transaction {
        let mut tx = Transaction::new("u1", amount, Utc::now());
        tx.merchant = Some("Starbucks".to_string());
        store.save(&tx).await.unwrap()
    }

    #[tokio::test]
    async fn test_typical_transaction_scores_clean() {
        let f = fixture();
        seed_meals_history(&f.transactions).await;
        let tx = new_meals_transaction(&f.transactions, 10.0).await;
        let id = tx.id.clone();

        f.orchestrator.process(tx).await;

        let scored = f.transactions.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(scored.category.as_deref(), Some("meals"));
        assert!(!scored.is_anomaly);
        assert_eq!(scored.risk_score, Some(0.0));
        assert_eq!(scored.status, TransactionStatus::Pending);
        assert_eq!(scored.scoring, ScoringState::Complete);
        assert!(f.alerts.is_empty().await, "no alert below 0.4");
    }

    #[tokio::test]
    async fn test_outlier_alerts_without_flagging() {
        let f = fixture();
        seed_meals_history(&f.transactions).await;
        let tx = new_meals_transaction(&f.transactions, 50.0).await;
        let id = tx.id.clone();

        f.orchestrator.process(tx).await;

        let scored = f.transactions.find_by_id(&id).await.unwrap().unwrap();
        assert!(scored.is_anomaly);
        assert!(scored.anomaly_score.unwrap() > 20.0);
        assert_eq!(scored.risk_score, Some(0.6));
        // 0.6 is below the 0.7 flag threshold but above the 0.4 alert one
        assert_eq!(scored.status, TransactionStatus::Pending);
        assert_eq!(scored.scoring, ScoringState::Complete);

        let alerts = f.alerts.find_by_user("u1").await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::Medium);
        assert_eq!(alerts[0].transaction_id, id);
    }

    #[tokio::test]
    async fn test_pipeline_is_idempotent_on_unchanged_window() {
        let f = fixture();
        seed_meals_history(&f.transactions).await;
        let tx = new_meals_transaction(&f.transactions, 50.0).await;
        let id = tx.id.clone();

        f.orchestrator.process(tx).await;
        let first = f.transactions.find_by_id(&id).await.unwrap().unwrap();

        f.orchestrator.process(first.clone()).await;
        let second = f.transactions.find_by_id(&id).await.unwrap().unwrap();

        assert_eq!(first.category, second.category);
        assert_eq!(first.is_anomaly, second.is_anomaly);
        assert_eq!(first.anomaly_score, second.anomaly_score);
        assert_eq!(first.risk_score, second.risk_score);
        assert_eq!(first.status, second.status);
    }

    /// Transaction store whose window query always fails; saves pass
    /// through to a real memory store.
    struct BrokenWindowStore {
        inner: Arc<MemoryTransactionStore>,
    }

    #[async_trait]
    impl TransactionStore for BrokenWindowStore {
        async fn save(&self, tx: &Transaction) -> Result<Transaction> {
            self.inner.save(tx).await
        }

        async fn find_by_id(&self, id: &str) -> Result<Option<Transaction>> {
            self.inner.find_by_id(id).await
        }

        async fn find_by_user_and_category_since(
            &self,
            _user_id: &str,
            _category: &str,
            _since: DateTime<Utc>,
        ) -> Result<Vec<Transaction>> {
            anyhow::bail!("window query unavailable")
        }
    }

    #[tokio::test]
    async fn test_stage_failure_is_fail_open_and_marked_incomplete() {
        let inner = Arc::new(MemoryTransactionStore::new());
        let transactions: Arc<dyn TransactionStore> = Arc::new(BrokenWindowStore {
            inner: inner.clone(),
        });
        let alerts = Arc::new(MemoryAlertStore::new());
        let metrics = Arc::new(PipelineMetrics::new());
        let orchestrator = Orchestrator::new(
            transactions,
            alerts.clone(),
            None,
            DEFAULT_ANOMALY_THRESHOLD,
            metrics.clone(),
        );

        let mut tx = Transaction::new("u1", 50.0, Utc::now());
        tx.merchant = Some("Starbucks".to_string());
        let tx = inner.save(&tx).await.unwrap();
        let id = tx.id.clone();

        orchestrator.process(tx).await;

        let scored = inner.find_by_id(&id).await.unwrap().unwrap();
        // categorization succeeded before the failing stage
        assert_eq!(scored.category.as_deref(), Some("meals"));
        // the failing anomaly stage left the transaction unmarked
        assert!(!scored.is_anomaly);
        // later stages still ran
        assert_eq!(scored.risk_score, Some(0.0));
        // and the run is distinguishable from "scored low risk"
        assert_eq!(scored.scoring, ScoringState::Incomplete);
        assert_eq!(metrics.get_stage_failures().get("anomaly"), Some(&1));
    }

    #[tokio::test]
    async fn test_uncategorizable_transaction_still_completes() {
        let f = fixture();
        let mut tx = Transaction::new("u1", 10.0, Utc::now());
        tx.description = Some("widgets".to_string());
        let tx = f.transactions.save(&tx).await.unwrap();
        let id = tx.id.clone();

        f.orchestrator.process(tx).await;

        let scored = f.transactions.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(scored.category.as_deref(), Some("other"));
        assert_eq!(scored.risk_score, Some(0.0));
        assert_eq!(scored.scoring, ScoringState::Complete);
    }
}
