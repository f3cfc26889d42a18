//! Observability infrastructure for the printability predictor
//!
//! Provides:
//! - Prometheus metrics (prediction latency, verdict counts, errors, model info)
//! - Structured logging of training and prediction events with tracing

use crate::training::TrainingSummary;
use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    register_int_gauge, GaugeVec, Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<PredictorMetricsInner> = OnceLock::new();

struct PredictorMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_total: IntCounterVec,
    invalid_inputs_total: IntCounter,
    prediction_errors_total: IntCounter,
    training_samples: IntGauge,
    model_info: GaugeVec,
}

impl PredictorMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "printability_prediction_latency_seconds",
                "Time spent scoring a single formulation",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter_vec!(
                "printability_predictions_total",
                "Predictions served, by verdict",
                &["verdict"]
            )
            .expect("Failed to register predictions_total"),

            invalid_inputs_total: register_int_counter!(
                "printability_invalid_inputs_total",
                "Requests rejected by input validation"
            )
            .expect("Failed to register invalid_inputs_total"),

            prediction_errors_total: register_int_counter!(
                "printability_prediction_errors_total",
                "Requests that failed inside the prediction service"
            )
            .expect("Failed to register prediction_errors_total"),

            training_samples: register_int_gauge!(
                "printability_training_samples",
                "Number of samples the loaded model was trained on"
            )
            .expect("Failed to register training_samples"),

            model_info: register_gauge_vec!(
                "printability_model_info",
                "Information about the currently loaded model",
                &["version", "trees"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct PredictorMetrics {
    _private: (),
}

impl Default for PredictorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictorMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(PredictorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &PredictorMetricsInner {
        GLOBAL_METRICS.get_or_init(PredictorMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_prediction(&self, verdict: bool) {
        let label = if verdict { "printable" } else { "not_printable" };
        self.inner()
            .predictions_total
            .with_label_values(&[label])
            .inc();
    }

    pub fn inc_invalid_inputs(&self) {
        self.inner().invalid_inputs_total.inc();
    }

    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors_total.inc();
    }

    /// Record the loaded model's version and size
    pub fn set_model_info(&self, version: &str, trees: usize, training_samples: usize) {
        let inner = self.inner();
        inner.model_info.reset();
        inner
            .model_info
            .with_label_values(&[version, &trees.to_string()])
            .set(1.0);
        inner.training_samples.set(training_samples as i64);
    }

    pub fn predictions_served(&self, verdict: bool) -> u64 {
        let label = if verdict { "printable" } else { "not_printable" };
        self.inner()
            .predictions_total
            .with_label_values(&[label])
            .get()
    }
}

/// Structured logger for predictor events
///
/// Provides consistent field names for predictions, training runs and
/// service lifecycle events.
#[derive(Clone)]
pub struct StructuredLogger {
    source: String,
}

impl StructuredLogger {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Log a served prediction
    pub fn log_prediction(
        &self,
        verdict: bool,
        probability: f64,
        remark: &str,
        model_version: &str,
    ) {
        info!(
            event = "prediction_generated",
            source = %self.source,
            verdict = verdict,
            probability = probability,
            remark = %remark,
            model_version = %model_version,
            "Generated printability prediction"
        );
    }

    /// Log a request rejected at the boundary
    pub fn log_invalid_input(&self, reason: &str) {
        info!(
            event = "invalid_input",
            source = %self.source,
            reason = %reason,
            "Rejected prediction request"
        );
    }

    /// Log a failure inside the prediction service
    pub fn log_prediction_error(&self, error: &str) {
        warn!(
            event = "prediction_failed",
            source = %self.source,
            error = %error,
            "Prediction failed"
        );
    }

    /// Log a completed training run
    pub fn log_training(&self, summary: &TrainingSummary, model_version: &str) {
        info!(
            event = "model_trained",
            source = %self.source,
            total_samples = summary.total_samples,
            printable_samples = summary.printable_samples,
            printable_share = summary.printable_share,
            dropped_records = summary.dropped_records,
            model_version = %model_version,
            "Model trained and saved"
        );
        if summary.dropped_records > 0 {
            warn!(
                event = "records_dropped",
                source = %self.source,
                dropped_records = summary.dropped_records,
                "Training records excluded due to unparseable composition"
            );
        }
    }

    /// Log a model artifact being loaded for serving
    pub fn log_model_loaded(&self, model_dir: &str, model_version: &str, trees: usize) {
        info!(
            event = "model_loaded",
            source = %self.source,
            model_dir = %model_dir,
            model_version = %model_version,
            trees = trees,
            "Model artifact loaded"
        );
    }

    /// Log service startup
    pub fn log_startup(&self, version: &str, model_version: &str) {
        info!(
            event = "service_started",
            source = %self.source,
            service_version = %version,
            model_version = %model_version,
            "Printability service started"
        );
    }

    /// Log service shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            source = %self.source,
            reason = %reason,
            "Printability service shutting down"
        );
    }
}
