//! HTTP request handlers for the payroll API.
//!
//! This module contains the handler functions for all API endpoints. Every
//! service call goes through [`AppState::run_blocking`].

use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::EngineError;

use super::request::{DeleteQuery, PreviewRequest, RunRequest, StatusRequest};
use super::response::{ApiError, ApiErrorResponse, CreatedResponse, RunResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/payroll/preview", post(preview_handler))
        .route("/payroll/runs", post(create_run_handler))
        .route(
            "/payroll/runs/:id",
            get(get_run_handler)
                .put(update_run_handler)
                .delete(delete_run_handler),
        )
        .route("/payroll/runs/:id/status", put(update_status_handler))
        .route("/payroll/runs/:id/archive", post(archive_run_handler))
        .route("/payroll/runs/:id/summary", get(summary_handler))
        .route(
            "/payroll/runs/:id/attendance.csv",
            get(attendance_csv_handler),
        )
        .route("/payroll/runs/:id/register.csv", get(register_csv_handler))
        .with_state(state)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

fn csv_response(body: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        body,
    )
        .into_response()
}

fn error_response(correlation_id: Uuid, err: EngineError) -> Response {
    warn!(correlation_id = %correlation_id, error = %err, "Request failed");
    let api_error: ApiErrorResponse = err.into();
    json_response(api_error.status, api_error.error)
}

fn rejection_response(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    json_response(StatusCode::BAD_REQUEST, error)
}

fn parse_run_id(correlation_id: Uuid, raw: &str) -> Result<Uuid, Response> {
    Uuid::parse_str(raw).map_err(|_| {
        warn!(correlation_id = %correlation_id, run_id = %raw, "Invalid run ID");
        json_response(
            StatusCode::BAD_REQUEST,
            ApiError::with_details(
                "VALIDATION_ERROR",
                format!("Invalid payroll run ID: {}", raw),
                "id",
            ),
        )
    })
}

/// Handler for POST /payroll/preview.
///
/// Computes one employee's payslip without persisting anything.
async fn preview_handler(
    State(state): State<AppState>,
    payload: Result<Json<PreviewRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing payslip preview");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };
    let (employee_id, params) = match request.into_parameters() {
        Ok(parts) => parts,
        Err(err) => return error_response(correlation_id, err),
    };

    let start_time = Instant::now();
    let preview_id = employee_id.clone();
    match state
        .run_blocking(move |service| service.preview_employee_payroll(&preview_id, &params))
        .await
    {
        Ok(computation) => {
            info!(
                correlation_id = %correlation_id,
                employee_id = %employee_id,
                net_pay = %computation.payslip.net_pay,
                duration_us = start_time.elapsed().as_micros(),
                "Preview completed"
            );
            json_response(StatusCode::OK, computation)
        }
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for POST /payroll/runs.
async fn create_run_handler(
    State(state): State<AppState>,
    payload: Result<Json<RunRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing payroll run creation");

    let params = match payload.map(|Json(req)| req.into_parameters()) {
        Ok(Ok(params)) => params,
        Ok(Err(err)) => return error_response(correlation_id, err),
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let start_time = Instant::now();
    match state
        .run_blocking(move |service| service.create_payroll_run(params))
        .await
    {
        Ok(run) => {
            info!(
                correlation_id = %correlation_id,
                run_id = %run.id,
                employee_count = run.employee_ids.len(),
                duration_us = start_time.elapsed().as_micros(),
                "Payroll run created"
            );
            json_response(StatusCode::CREATED, CreatedResponse { id: run.id })
        }
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for GET /payroll/runs/:id.
async fn get_run_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let correlation_id = Uuid::new_v4();
    let run_id = match parse_run_id(correlation_id, &id) {
        Ok(run_id) => run_id,
        Err(response) => return response,
    };

    let result = state
        .run_blocking(move |service| {
            let run = service.get_payroll_run(run_id)?;
            let payslips = service.get_payslips(run_id)?;
            Ok(RunResponse { run, payslips })
        })
        .await;
    match result {
        Ok(body) => json_response(StatusCode::OK, body),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for PUT /payroll/runs/:id.
///
/// Only draft runs can be edited.
async fn update_run_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<RunRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, run_id = %id, "Processing payroll run update");

    let run_id = match parse_run_id(correlation_id, &id) {
        Ok(run_id) => run_id,
        Err(response) => return response,
    };
    let params = match payload.map(|Json(req)| req.into_parameters()) {
        Ok(Ok(params)) => params,
        Ok(Err(err)) => return error_response(correlation_id, err),
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    match state
        .run_blocking(move |service| service.update_payroll_run(run_id, params))
        .await
    {
        Ok(run) => json_response(StatusCode::OK, run),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for PUT /payroll/runs/:id/status.
async fn update_status_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let run_id = match parse_run_id(correlation_id, &id) {
        Ok(run_id) => run_id,
        Err(response) => return response,
    };
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };
    info!(
        correlation_id = %correlation_id,
        run_id = %run_id,
        to = %request.status,
        "Processing status change"
    );

    let target = request.status;
    match state
        .run_blocking(move |service| service.update_payroll_run_status(run_id, target))
        .await
    {
        Ok(change) => json_response(StatusCode::OK, change),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for POST /payroll/runs/:id/archive.
async fn archive_run_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let correlation_id = Uuid::new_v4();
    let run_id = match parse_run_id(correlation_id, &id) {
        Ok(run_id) => run_id,
        Err(response) => return response,
    };

    match state
        .run_blocking(move |service| service.archive_payroll_run(run_id))
        .await
    {
        Ok(change) => json_response(StatusCode::OK, change),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for DELETE /payroll/runs/:id?confirm=:id.
///
/// The `confirm` query parameter must repeat the run ID.
async fn delete_run_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let run_id = match parse_run_id(correlation_id, &id) {
        Ok(run_id) => run_id,
        Err(response) => return response,
    };

    let confirmed = query
        .confirm
        .as_deref()
        .and_then(|c| Uuid::parse_str(c).ok())
        == Some(run_id);
    if !confirmed {
        warn!(correlation_id = %correlation_id, run_id = %run_id, "Delete not confirmed");
        return json_response(
            StatusCode::BAD_REQUEST,
            ApiError::with_details(
                "VALIDATION_ERROR",
                "Deleting a payroll run requires confirm=<run id>",
                "confirm",
            ),
        );
    }

    match state
        .run_blocking(move |service| service.delete_payroll_run(run_id))
        .await
    {
        Ok(outcome) => {
            info!(correlation_id = %correlation_id, run_id = %run_id, "Payroll run deleted");
            json_response(StatusCode::OK, outcome)
        }
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for GET /payroll/runs/:id/summary.
async fn summary_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let correlation_id = Uuid::new_v4();
    let run_id = match parse_run_id(correlation_id, &id) {
        Ok(run_id) => run_id,
        Err(response) => return response,
    };

    match state
        .run_blocking(move |service| service.get_payroll_run_summary(run_id))
        .await
    {
        Ok(summary) => json_response(StatusCode::OK, summary),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for GET /payroll/runs/:id/attendance.csv.
async fn attendance_csv_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let run_id = match parse_run_id(correlation_id, &id) {
        Ok(run_id) => run_id,
        Err(response) => return response,
    };

    match state
        .run_blocking(move |service| service.export_attendance_csv(run_id))
        .await
    {
        Ok(csv) => csv_response(csv),
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for GET /payroll/runs/:id/register.csv.
async fn register_csv_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let correlation_id = Uuid::new_v4();
    let run_id = match parse_run_id(correlation_id, &id) {
        Ok(run_id) => run_id,
        Err(response) => return response,
    };

    match state
        .run_blocking(move |service| service.export_payslip_register_csv(run_id))
        .await
    {
        Ok(csv) => csv_response(csv),
        Err(err) => error_response(correlation_id, err),
    }
}
