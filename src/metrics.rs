//! Prediction metrics and statistics tracking.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for the prediction service
pub struct PredictionMetrics {
    /// Single-record predictions served
    pub single_predictions: AtomicU64,
    /// Batch files scored
    pub batches_processed: AtomicU64,
    /// Records scored across all batches
    pub batch_rows: AtomicU64,
    /// Records predicted as claims
    pub positive_labels: AtomicU64,
    /// Requests that ended in an error message
    pub failures: AtomicU64,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Probability distribution buckets for single predictions
    probability_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
    started_at: DateTime<Utc>,
}

impl PredictionMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            single_predictions: AtomicU64::new(0),
            batches_processed: AtomicU64::new(0),
            batch_rows: AtomicU64::new(0),
            positive_labels: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            probability_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
            started_at: Utc::now(),
        }
    }

    /// Record a single-record prediction
    pub fn record_single(&self, processing_time: Duration, label: u8, probability: f64) {
        self.single_predictions.fetch_add(1, Ordering::Relaxed);
        if label == 1 {
            self.positive_labels.fetch_add(1, Ordering::Relaxed);
        }
        self.record_time(processing_time);

        let bucket = (probability * 10.0).clamp(0.0, 9.0) as usize;
        if let Ok(mut buckets) = self.probability_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record a scored batch
    pub fn record_batch(&self, processing_time: Duration, rows: usize, positives: usize) {
        self.batches_processed.fetch_add(1, Ordering::Relaxed);
        self.batch_rows.fetch_add(rows as u64, Ordering::Relaxed);
        self.positive_labels.fetch_add(positives as u64, Ordering::Relaxed);
        self.record_time(processing_time);
    }

    /// Record a request that surfaced an error
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    fn record_time(&self, processing_time: Duration) {
        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let mut sorted: Vec<u64> = match self.processing_times.read() {
            Ok(times) => times.clone(),
            Err(_) => return ProcessingStats::default(),
        };
        if sorted.is_empty() {
            return ProcessingStats::default();
        }
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();
        let at = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: at(0.5),
            p95_us: at(0.95),
            p99_us: at(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Get probability distribution
    pub fn get_probability_distribution(&self) -> [u64; 10] {
        self.probability_buckets
            .read()
            .map(|b| *b)
            .unwrap_or_default()
    }

    /// Point-in-time view for the metrics endpoint
    pub fn snapshot(&self) -> MetricsSnapshot {
        let single = self.single_predictions.load(Ordering::Relaxed);
        let rows = self.batch_rows.load(Ordering::Relaxed);
        let positives = self.positive_labels.load(Ordering::Relaxed);
        let scored = single + rows;

        MetricsSnapshot {
            started_at: self.started_at,
            uptime_secs: self.start_time.elapsed().as_secs(),
            single_predictions: single,
            batches_processed: self.batches_processed.load(Ordering::Relaxed),
            batch_rows: rows,
            positive_labels: positives,
            positive_rate: if scored > 0 {
                positives as f64 / scored as f64
            } else {
                0.0
            },
            failures: self.failures.load(Ordering::Relaxed),
            processing: self.get_processing_stats(),
            probability_distribution: self.get_probability_distribution(),
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let snapshot = self.snapshot();
        let processing = &snapshot.processing;

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║            CLAIM PREDICTOR - METRICS SUMMARY                 ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Single Predictions: {:>8}  │  Batches: {:>6} ({:>8} rows) ║",
            snapshot.single_predictions, snapshot.batches_processed, snapshot.batch_rows
        );
        info!(
            "║ Predicted Claims:   {:>8}  │  Claim Rate: {:>6.1}%          ║",
            snapshot.positive_labels,
            snapshot.positive_rate * 100.0
        );
        info!("║ Failed Requests:    {:>8}                                  ║", snapshot.failures);
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Processing Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5} ║",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Claim Probability Distribution:                              ║");
        let total: u64 = snapshot.probability_distribution.iter().sum();
        for (i, &count) in snapshot.probability_distribution.iter().enumerate() {
            let pct = if total > 0 { (count as f64 / total as f64) * 100.0 } else { 0.0 };
            let bar: String = "█".repeat(((pct / 2.0) as usize).min(20));
            info!(
                "║   {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for PredictionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default, Clone, Serialize)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Serializable metrics view
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
    pub single_predictions: u64,
    pub batches_processed: u64,
    pub batch_rows: u64,
    pub positive_labels: u64,
    pub positive_rate: f64,
    pub failures: u64,
    pub processing: ProcessingStats,
    pub probability_distribution: [u64; 10],
}
