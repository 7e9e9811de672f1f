//! Transaction Scoring Pipeline - Main Entry Point
//!
//! Consumes transaction-created events from NATS, persists each
//! transaction, and dispatches it to the scoring worker pool. Alerts are
//! persisted and mirrored to the alert subject.

use anyhow::Result;
use futures::StreamExt;
use std::sync::Arc;
use tracing::{error, info, warn};
use txn_scoring_pipeline::{
    config::AppConfig,
    dispatcher::ScoringDispatcher,
    intake::{self, TransactionIntake},
    metrics::{MetricsReporter, PipelineMetrics},
    orchestrator::Orchestrator,
    producer::AlertProducer,
    store::{AlertStore, MemoryAlertStore, MemoryTransactionStore, TransactionStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("txn_scoring_pipeline=info".parse()?),
        )
        .init();

    info!("Starting transaction scoring pipeline");

    // Load configuration
    let config = AppConfig::load()?;
    info!(
        "Anomaly threshold: {:.2}, workers: {}, queue capacity: {}",
        config.detection.anomaly_threshold, config.pipeline.workers, config.pipeline.queue_capacity
    );

    // Initialize metrics
    let metrics = Arc::new(PipelineMetrics::new());

    // Initialize stores
    let transactions: Arc<dyn TransactionStore> = Arc::new(MemoryTransactionStore::new());
    let alerts: Arc<dyn AlertStore> = Arc::new(MemoryAlertStore::new());

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    let producer = AlertProducer::new(client.clone(), &config.nats.alert_subject);
    let intake = TransactionIntake::new(client, &config.nats.transaction_subject);

    // Wire the pipeline
    let orchestrator = Arc::new(Orchestrator::new(
        transactions.clone(),
        alerts,
        Some(producer),
        config.detection.anomaly_threshold,
        metrics.clone(),
    ));
    let dispatcher = ScoringDispatcher::new(
        orchestrator,
        metrics.clone(),
        config.pipeline.workers,
        config.pipeline.queue_capacity,
    );

    // Start metrics reporter (prints summary every 30 seconds)
    let metrics_clone = metrics.clone();
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics_clone, 30);
        reporter.start().await;
    });

    info!("Listening on subject: {}", intake.subject());

    // Intake loop: persist, then fire-and-forget dispatch. The creator's
    // side of the contract already returned the PENDING transaction to its
    // caller; nothing here blocks on scoring.
    let mut subscription = intake.subscribe().await?;

    while let Some(message) = subscription.next().await {
        match intake::decode_event(&message.payload) {
            Ok(request) => match request.into_transaction() {
                Ok(tx) => match transactions.save(&tx).await {
                    Ok(saved) => dispatcher.dispatch(saved),
                    Err(e) => {
                        error!(transaction_id = %tx.id, error = %e, "Failed to persist transaction")
                    }
                },
                Err(e) => warn!(error = %e, "Rejected invalid transaction event"),
            },
            Err(e) => warn!(error = %e, "Failed to deserialize transaction event"),
        }
    }

    info!("Pipeline shutting down...");
    metrics.print_summary();

    Ok(())
}
