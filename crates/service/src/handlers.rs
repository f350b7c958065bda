// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Endpoint handlers.

use crate::validate::{parse_report, ValidateError};
use crate::ServiceState;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use ms_core::{InstanceId, Permission, ProcessId};
use ms_storage::{StoreError, SubmitOutcome};
use serde::Serialize;
use serde_json::json;

/// The `{code, message, success}` envelope every mutating endpoint
/// answers with.
#[derive(Debug, Serialize)]
struct ApiReply {
    code: u16,
    message: String,
    success: bool,
}

fn reply(status: StatusCode, message: &str, success: bool) -> Response {
    let body = ApiReply { code: status.as_u16(), message: message.to_string(), success };
    (status, Json(body)).into_response()
}

fn validation_reply(err: ValidateError) -> Response {
    match err {
        ValidateError::InvalidJson => reply(StatusCode::BAD_REQUEST, "Invalid JSON.", false),
        ValidateError::MissingKeys => {
            reply(StatusCode::UNPROCESSABLE_ENTITY, "Missing or invalid values.", false)
        }
        ValidateError::InvalidValues => reply(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Missing or invalid JSON keys and/or values.",
            false,
        ),
    }
}

const NO_SUCH_INSTANCE: &str = "No infrastructure exists with this ID.";

pub(crate) async fn submit(
    State(state): State<ServiceState>,
    Path((instance, process)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    let instance = InstanceId::new(instance);
    let process = ProcessId::new(process);

    if state.store.instance(&instance).is_err() {
        tracing::info!(%instance, "breakpoint data for unknown infrastructure");
        return reply(StatusCode::NOT_FOUND, NO_SUCH_INSTANCE, false);
    }
    let (report, payload) = match parse_report(&body) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::info!(%instance, %process, %err, "invalid breakpoint data");
            return validation_reply(err);
        }
    };

    match state.store.record_submit(&instance, &process, &report, payload, Utc::now()) {
        Ok(SubmitOutcome::NewProcess { .. }) => {
            tracing::info!(%instance, %process, "new process and breakpoint registered");
            reply(StatusCode::OK, "Valid JSON. New process and breakpoint added.", true)
        }
        Ok(SubmitOutcome::Advanced { bp } | SubmitOutcome::Finished { bp }) => {
            tracing::info!(%instance, %process, bp, "breakpoint registered");
            reply(StatusCode::OK, "Valid JSON. New breakpoint added, process updated.", true)
        }
        Err(StoreError::UnknownInstance(_)) => {
            reply(StatusCode::NOT_FOUND, NO_SUCH_INSTANCE, false)
        }
        Err(err @ (StoreError::ProcessFinished { .. } | StoreError::Integrity(_))) => {
            tracing::warn!(%instance, %process, %err, "breakpoint rejected");
            reply(StatusCode::UNPROCESSABLE_ENTITY, &err.to_string(), false)
        }
        Err(err) => {
            tracing::error!(%instance, %process, %err, "submit failed");
            reply(StatusCode::INTERNAL_SERVER_ERROR, "Internal error.", false)
        }
    }
}

/// A refresh proves the process re-read state at its current breakpoint.
/// The payload goes through full validation as a liveness check but is
/// not persisted; only the `refreshed` flag changes.
pub(crate) async fn refresh(
    State(state): State<ServiceState>,
    Path((instance, process)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    let instance = InstanceId::new(instance);
    let process = ProcessId::new(process);

    if state.store.instance(&instance).is_err() {
        return reply(StatusCode::NOT_FOUND, NO_SUCH_INSTANCE, false);
    }
    if let Err(err) = parse_report(&body) {
        tracing::info!(%instance, %process, %err, "invalid refresh data");
        return validation_reply(err);
    }

    match state.store.mark_refreshed(&instance, &process) {
        Ok(()) => {
            tracing::debug!(%instance, %process, "process refreshed");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(StoreError::UnknownProcess { .. }) => {
            reply(StatusCode::NOT_FOUND, "No such process in this infrastructure.", false)
        }
        Err(err) => {
            tracing::error!(%instance, %process, %err, "refresh failed");
            reply(StatusCode::INTERNAL_SERVER_ERROR, "Internal error.", false)
        }
    }
}

pub(crate) async fn next(
    State(state): State<ServiceState>,
    Path((instance, process)): Path<(String, String)>,
) -> Response {
    let instance = InstanceId::new(instance);
    let process = ProcessId::new(process);

    match state.store.permission(&instance, &process) {
        Ok(Permission::Go) => {
            (StatusCode::OK, Json(json!({ "success": true, "next": true }))).into_response()
        }
        Ok(Permission::Wait) => StatusCode::NO_CONTENT.into_response(),
        Ok(Permission::Refresh) => StatusCode::RESET_CONTENT.into_response(),
        Err(StoreError::UnknownInstance(_) | StoreError::UnknownProcess { .. }) => {
            (StatusCode::NOT_FOUND, Json(json!({ "success": false, "next": false })))
                .into_response()
        }
        Err(err) => {
            tracing::error!(%instance, %process, %err, "permission check failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub(crate) async fn list_instances(State(state): State<ServiceState>) -> Response {
    let ids: Vec<String> = state.store.instances().iter().map(|i| i.id.to_string()).collect();
    Json(json!({ "infrastructures": ids })).into_response()
}

#[derive(Debug, Serialize)]
struct ProcessEntry {
    #[serde(rename = "processID")]
    process_id: String,
    #[serde(rename = "processName")]
    name: String,
    #[serde(rename = "currBP")]
    curr_bp: u32,
    permit: bool,
    finished: bool,
    refreshed: bool,
    #[serde(rename = "publicIP")]
    public_ip: String,
}

pub(crate) async fn list_processes(
    State(state): State<ServiceState>,
    Path(instance): Path<String>,
) -> Response {
    let instance = InstanceId::new(instance);
    match state.store.processes(&instance) {
        Ok(rows) => {
            let processes: Vec<ProcessEntry> = rows
                .into_iter()
                .map(|p| ProcessEntry {
                    process_id: p.process_id.to_string(),
                    name: p.name,
                    curr_bp: p.curr_bp,
                    permit: p.permit,
                    finished: p.finished,
                    refreshed: p.refreshed,
                    public_ip: p.public_ip,
                })
                .collect();
            Json(json!({ "infrastructure": instance.as_str(), "processes": processes }))
                .into_response()
        }
        Err(_) => reply(StatusCode::NOT_FOUND, NO_SUCH_INSTANCE, false),
    }
}

pub(crate) async fn breakpoint_log(
    State(state): State<ServiceState>,
    Path((instance, process)): Path<(String, String)>,
) -> Response {
    let instance = InstanceId::new(instance);
    let process = ProcessId::new(process);
    match state.store.breakpoints_for(&instance, &process) {
        Ok(records) => {
            let mut log = serde_json::Map::new();
            for record in records {
                log.insert(format!("breakpoint{}", record.bp_num), record.payload);
            }
            Json(serde_json::Value::Object(log)).into_response()
        }
        Err(_) => reply(
            StatusCode::NOT_FOUND,
            "Given process does not exist in the given infrastructure.",
            false,
        ),
    }
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
