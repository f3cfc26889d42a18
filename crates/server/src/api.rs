//! HTTP API for predictions, parameter ranges, health and Prometheus metrics

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use printability_lib::{
    InferenceStats, ParameterRangeRegistry, PredictionError, Predictor, PredictorMetrics,
    PrintParameters, StructuredLogger,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn Predictor>,
    pub ranges: ParameterRangeRegistry,
    pub metrics: PredictorMetrics,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(
        service: Arc<dyn Predictor>,
        ranges: ParameterRangeRegistry,
        metrics: PredictorMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            service,
            ranges,
            metrics,
            logger,
        }
    }
}

/// Successful prediction body
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    /// "Printable: YES" / "Printable: NO"
    pub prediction: String,
    /// "Probability: 87%"
    pub probability: String,
    pub remarks: String,
    pub printable: bool,
    pub probability_value: f64,
    pub model_version: String,
}

/// Error body; `kind` lets clients tell bad input from a broken service
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub kind: String,
    pub error: String,
}

/// Health response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_version: String,
    pub trees: usize,
    pub training_samples: usize,
    pub inference: InferenceStats,
}

/// Request failures mapped to HTTP responses
pub enum ApiError {
    InvalidInput(String),
    Internal(String),
}

impl From<PredictionError> for ApiError {
    fn from(err: PredictionError) -> Self {
        if err.is_user_error() {
            ApiError::InvalidInput(err.to_string())
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, error) = match self {
            ApiError::InvalidInput(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_input", msg),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                format!("Prediction service failure: {msg}"),
            ),
        };
        let body = ErrorResponse {
            kind: kind.to_string(),
            error,
        };
        (status, Json(body)).into_response()
    }
}

/// Health check: the service only starts once a model is loaded
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let info = state.service.model_info();
    Json(HealthResponse {
        status: "ok".to_string(),
        model_version: info.model_version,
        trees: info.trees,
        training_samples: info.training_samples,
        inference: state.service.stats(),
    })
}

/// Parameter ranges for rendering input controls
async fn ranges(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.ranges.clone())
}

/// Score one formulation
async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PrintParameters>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let params = match payload {
        Ok(Json(params)) => params,
        Err(rejection) => {
            let reason = rejection.body_text();
            state.metrics.inc_invalid_inputs();
            state.logger.log_invalid_input(&reason);
            return Err(ApiError::InvalidInput(reason));
        }
    };

    if let Err(err) = state.ranges.validate(&params) {
        state.metrics.inc_invalid_inputs();
        state.logger.log_invalid_input(&err.to_string());
        return Err(err.into());
    }

    let start = Instant::now();
    let result = state.service.evaluate(&params).map_err(|err| {
        if err.is_user_error() {
            state.metrics.inc_invalid_inputs();
            state.logger.log_invalid_input(&err.to_string());
        } else {
            state.metrics.inc_prediction_errors();
            state.logger.log_prediction_error(&err.to_string());
        }
        ApiError::from(err)
    })?;
    state
        .metrics
        .observe_prediction_latency(start.elapsed().as_secs_f64());
    state.metrics.inc_prediction(result.verdict);

    let model_version = state.service.model_version().to_string();
    state.logger.log_prediction(
        result.verdict,
        result.probability,
        &result.remark,
        &model_version,
    );

    Ok(Json(PredictResponse {
        prediction: result.verdict_label(),
        probability: result.probability_label(),
        remarks: result.remark,
        printable: result.verdict,
        probability_value: result.probability,
        model_version,
    }))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            err.to_string().into_bytes(),
        );
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/ranges", get(ranges))
        .route("/predict", post(predict))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
