//! Route handlers

use crate::batch;
use crate::collector::default_form_values;
use crate::web::page::{self, Outcome, PageContext};
use crate::web::AppState;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::{Form, Json};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{error, info, warn};

fn render_page(state: &AppState, values: &HashMap<String, String>, outcome: Option<Outcome>) -> Html<String> {
    Html(page::render(&PageContext {
        schema: state.collector.schema(),
        values,
        outcome,
        report: state.report.view(),
    }))
}

/// Form page with default values
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let values = default_form_values(state.collector.schema());
    render_page(&state, &values, None)
}

/// Single-record prediction from the form
pub async fn predict(
    State(state): State<AppState>,
    Form(fields): Form<HashMap<String, String>>,
) -> Html<String> {
    let start = Instant::now();

    let outcome = state
        .collector
        .from_form(&fields)
        .map_err(|e| e.to_string())
        .and_then(|record| state.adapter.predict_one(&record).map_err(|e| e.to_string()));

    let outcome = match outcome {
        Ok(prediction) => {
            let probability = prediction.probability.unwrap_or_default();
            state
                .metrics
                .record_single(start.elapsed(), prediction.label, probability);
            info!(
                label = prediction.label,
                probability = probability,
                processing_time_us = start.elapsed().as_micros(),
                "Prediction served"
            );
            Outcome::Prediction(prediction.summary())
        }
        Err(message) => {
            state.metrics.record_failure();
            warn!(error = %message, "Prediction failed");
            Outcome::Error(format!("Error in prediction: {}", message))
        }
    };

    render_page(&state, &fields, Some(outcome))
}

async fn read_upload(mut multipart: Multipart) -> Result<Vec<u8>, String> {
    while let Some(field) = multipart.next_field().await.map_err(|e| e.to_string())? {
        if field.name() == Some("file") {
            let bytes = field.bytes().await.map_err(|e| e.to_string())?;
            return Ok(bytes.to_vec());
        }
    }
    Err("No file uploaded".to_string())
}

/// Batch prediction from an uploaded CSV, answered with a submission download
pub async fn upload_batch(State(state): State<AppState>, multipart: Multipart) -> Response {
    let start = Instant::now();

    let result = match read_upload(multipart).await {
        Ok(bytes) => batch::score_csv(
            &state.collector,
            &state.adapter,
            bytes.as_slice(),
            &state.config.batch.submission_template,
        )
        .map_err(|e| e.to_string()),
        Err(e) => Err(e),
    };

    match result {
        Ok(output) => {
            state
                .metrics
                .record_batch(start.elapsed(), output.rows, output.positives);
            let disposition = format!(
                "attachment; filename=\"{}\"",
                state.config.batch.output_file_name
            );
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                output.csv,
            )
                .into_response()
        }
        Err(message) => {
            state.metrics.record_failure();
            error!(error = %message, "Batch prediction failed");
            let values = default_form_values(state.collector.schema());
            let outcome = Outcome::Error(format!("Error in batch prediction: {}", message));
            (StatusCode::UNPROCESSABLE_ENTITY, render_page(&state, &values, Some(outcome))).into_response()
        }
    }
}

/// Serve one of the report images
pub async fn report_image(State(state): State<AppState>, Path(file): Path<String>) -> Response {
    match state.report.read_image(&file) {
        Some(bytes) => ([(header::CONTENT_TYPE, "image/png")], bytes).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Liveness probe - is the server running?
pub async fn liveness(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION"),
        "classifier": state.adapter.classifier_name(),
    }))
}

/// Current prediction metrics
pub async fn metrics(State(state): State<AppState>) -> Json<crate::metrics::MetricsSnapshot> {
    Json(state.metrics.snapshot())
}
