//! Fire-and-forget dispatch of scoring runs onto a bounded worker pool.
//!
//! One task per transaction, dispatched at creation time; the caller
//! returns immediately. Backpressure is reject-and-log: when the bounded
//! queue is full the transaction is left unscored (it stays PENDING with
//! scoring state `pending`). Dispatch is at-most-once; there is no retry
//! and no way to cancel an in-flight run.

use crate::metrics::PipelineMetrics;
use crate::orchestrator::Orchestrator;
use crate::types::Transaction;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// Hands transactions to a pool of scoring workers.
pub struct ScoringDispatcher {
    queue: mpsc::Sender<Transaction>,
    metrics: Arc<PipelineMetrics>,
}

impl ScoringDispatcher {
    /// Spawn the worker loop and return a dispatcher handle.
    ///
    /// `workers` bounds how many scoring runs execute concurrently;
    /// `queue_capacity` bounds how many dispatched transactions may wait
    /// for a worker.
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        metrics: Arc<PipelineMetrics>,
        workers: usize,
        queue_capacity: usize,
    ) -> Self {
        let (queue, mut rx) = mpsc::channel::<Transaction>(queue_capacity);
        let semaphore = Arc::new(Semaphore::new(workers));

        tokio::spawn(async move {
            while let Some(tx) = rx.recv().await {
                let permit = match semaphore.clone().acquire_owned().await {
                    Ok(permit) => permit,
                    // Closed only on shutdown
                    Err(_) => break,
                };

                let orchestrator = orchestrator.clone();
                tokio::spawn(async move {
                    orchestrator.process(tx).await;
                    drop(permit);
                });
            }
        });

        info!(workers, queue_capacity, "Scoring dispatcher started");

        Self { queue, metrics }
    }

    /// Queue a persisted transaction for scoring. Non-blocking: a full
    /// queue rejects the dispatch and the transaction stays unscored.
    pub fn dispatch(&self, tx: Transaction) {
        match self.queue.try_send(tx) {
            Ok(()) => {}
            Err(TrySendError::Full(tx)) => {
                self.metrics.record_dispatch_rejected();
                warn!(
                    transaction_id = %tx.id,
                    "Scoring queue full, transaction left unscored"
                );
            }
            Err(TrySendError::Closed(tx)) => {
                warn!(
                    transaction_id = %tx.id,
                    "Scoring queue closed, transaction left unscored"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::anomaly::DEFAULT_ANOMALY_THRESHOLD;
    use crate::store::{MemoryAlertStore, MemoryTransactionStore, TransactionStore};
    use crate::types::ScoringState;
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tokio::sync::Notify;

    fn orchestrator(
        transactions: Arc<dyn TransactionStore>,
        metrics: Arc<PipelineMetrics>,
    ) -> Arc<Orchestrator> {
        Arc::new(Orchestrator::new(
            transactions,
            Arc::new(MemoryAlertStore::new()),
            None,
            DEFAULT_ANOMALY_THRESHOLD,
            metrics,
        ))
    }

    #[tokio::test]
    async fn test_dispatched_transaction_is_scored() {
        let store = Arc::new(MemoryTransactionStore::new());
        let metrics = Arc::new(PipelineMetrics::new());
        let dispatcher = ScoringDispatcher::new(
            orchestrator(store.clone(), metrics.clone()),
            metrics.clone(),
            2,
            16,
        );

        let tx = Transaction::new("u1", 10.0, Utc::now());
        let tx = store.save(&tx).await.unwrap();
        let id = tx.id.clone();

        dispatcher.dispatch(tx);

        // Fire-and-forget: poll the store until the run lands.
        for _ in 0..100 {
            if let Some(scored) = store.find_by_id(&id).await.unwrap() {
                if scored.scoring == ScoringState::Complete {
                    assert_eq!(scored.category.as_deref(), Some("other"));
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("transaction was never scored");
    }

    /// Store whose saves block until released, to hold workers busy.
    struct StalledStore {
        inner: MemoryTransactionStore,
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl TransactionStore for StalledStore {
        async fn save(&self, tx: &Transaction) -> Result<Transaction> {
            self.gate.notified().await;
            self.inner.save(tx).await
        }

        async fn find_by_id(&self, id: &str) -> Result<Option<Transaction>> {
            self.inner.find_by_id(id).await
        }

        async fn find_by_user_and_category_since(
            &self,
            user_id: &str,
            category: &str,
            since: DateTime<Utc>,
        ) -> Result<Vec<Transaction>> {
            self.inner
                .find_by_user_and_category_since(user_id, category, since)
                .await
        }
    }

    #[tokio::test]
    async fn test_full_queue_rejects_and_counts() {
        let gate = Arc::new(Notify::new());
        let store: Arc<dyn TransactionStore> = Arc::new(StalledStore {
            inner: MemoryTransactionStore::new(),
            gate: gate.clone(),
        });
        let metrics = Arc::new(PipelineMetrics::new());
        let dispatcher =
            ScoringDispatcher::new(orchestrator(store, metrics.clone()), metrics.clone(), 1, 1);

        // One run stalls in the single worker, one fills the queue slot;
        // with four dispatches at least one must be rejected.
        for _ in 0..4 {
            dispatcher.dispatch(Transaction::new("u1", 10.0, Utc::now()));
        }
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(metrics.dispatch_rejected.load(Ordering::Relaxed) >= 1);

        // unblock the stalled runs so the runtime can wind down
        gate.notify_waiters();
    }
}
