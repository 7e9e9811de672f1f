//! Performance metrics and statistics tracking for the scoring pipeline.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for pipeline activity
pub struct PipelineMetrics {
    /// Total transactions run through the pipeline
    pub transactions_processed: AtomicU64,
    /// Total alerts generated
    pub alerts_generated: AtomicU64,
    /// Dispatches rejected because the scoring queue was full
    pub dispatch_rejected: AtomicU64,
    /// Alerts by severity
    alerts_by_severity: RwLock<HashMap<String, u64>>,
    /// Stage failures by stage name
    stage_failures: RwLock<HashMap<String, u64>>,
    /// Pipeline run times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Risk score distribution buckets
    score_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl PipelineMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            transactions_processed: AtomicU64::new(0),
            alerts_generated: AtomicU64::new(0),
            dispatch_rejected: AtomicU64::new(0),
            alerts_by_severity: RwLock::new(HashMap::new()),
            stage_failures: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            score_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a completed pipeline run
    pub fn record_transaction(&self, processing_time: Duration, risk_score: f64) {
        self.transactions_processed.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only the most recent samples
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }

        let bucket = (risk_score * 10.0).min(9.0) as usize;
        if let Ok(mut buckets) = self.score_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record a created alert
    pub fn record_alert(&self, severity: &str) {
        self.alerts_generated.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut by_severity) = self.alerts_by_severity.write() {
            *by_severity.entry(severity.to_string()).or_insert(0) += 1;
        }
    }

    /// Record a fail-open stage failure
    pub fn record_stage_failure(&self, stage: &str) {
        if let Ok(mut failures) = self.stage_failures.write() {
            *failures.entry(stage.to_string()).or_insert(0) += 1;
        }
    }

    /// Record a dispatch rejected by a full scoring queue
    pub fn record_dispatch_rejected(&self) {
        self.dispatch_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Get pipeline run time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let times = match self.processing_times.read() {
            Ok(times) => times,
            Err(_) => return ProcessingStats::default(),
        };
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Get current throughput (transactions per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.transactions_processed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get the risk score distribution
    pub fn get_score_distribution(&self) -> [u64; 10] {
        self.score_buckets.read().map(|b| *b).unwrap_or([0; 10])
    }

    /// Get alerts by severity
    pub fn get_alerts_by_severity(&self) -> HashMap<String, u64> {
        self.alerts_by_severity
            .read()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Get stage failures by stage name
    pub fn get_stage_failures(&self) -> HashMap<String, u64> {
        self.stage_failures
            .read()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let tx_count = self.transactions_processed.load(Ordering::Relaxed);
        let alert_count = self.alerts_generated.load(Ordering::Relaxed);
        let rejected = self.dispatch_rejected.load(Ordering::Relaxed);
        let alert_rate = if tx_count > 0 {
            (alert_count as f64 / tx_count as f64) * 100.0
        } else {
            0.0
        };

        let processing = self.get_processing_stats();

        info!("=== Scoring pipeline metrics ===");
        info!(
            "Transactions scored: {} ({:.1} tx/s), alerts: {} ({:.1}%), dispatch rejected: {}",
            tx_count,
            self.get_throughput(),
            alert_count,
            alert_rate,
            rejected
        );
        info!(
            "Run time (us): mean={} p50={} p95={} p99={} max={}",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us,
            processing.max_us
        );

        let by_severity = self.get_alerts_by_severity();
        if !by_severity.is_empty() {
            for (severity, count) in &by_severity {
                info!("Alerts [{}]: {}", severity, count);
            }
        }

        let failures = self.get_stage_failures();
        if !failures.is_empty() {
            for (stage, count) in &failures {
                info!("Stage failures [{}]: {}", stage, count);
            }
        }

        let score_dist = self.get_score_distribution();
        let total: u64 = score_dist.iter().sum();
        if total > 0 {
            for (i, &count) in score_dist.iter().enumerate() {
                if count > 0 {
                    info!(
                        "Risk {:.1}-{:.1}: {} ({:.1}%)",
                        i as f64 / 10.0,
                        (i + 1) as f64 / 10.0,
                        count,
                        (count as f64 / total as f64) * 100.0
                    );
                }
            }
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Pipeline run time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Periodic metrics summary task
pub struct MetricsReporter {
    metrics: std::sync::Arc<PipelineMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: std::sync::Arc<PipelineMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting loop
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
