//! Submission HTTP surface (C8): accepts a submission, reports its status,
//! and relays operator retry/ignore signals for blocked steps.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use prov_core::{Action, CoreError, ExecutorRegistry, Step, WorkflowInput};
use prov_durable::{PostgresWorkflowEventStore, WorkflowExecutor, WorkflowSignal};
use prov_storage::{StateStore, SubmissionStore};
use prov_worker::engine::{ProvisioningInput, ProvisioningWorkflow, STEP_CONTROL_SIGNAL};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<WorkflowExecutor<PostgresWorkflowEventStore>>,
    pub registry: Arc<ExecutorRegistry>,
    pub submissions: Arc<dyn SubmissionStore>,
    pub snapshots: Arc<dyn StateStore>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse { error: message.into() }))
}

/// Request body for `POST /v1/submissions`. `submission_id` is never taken
/// from the caller; it is assigned here at acceptance.
#[derive(Debug, Deserialize)]
pub struct CreateSubmissionRequest {
    pub workflow_name: String,
    pub account: String,
    pub submitter: String,
    pub project: String,
    pub action: Action,
    pub deployment_id: String,
    pub steps: Vec<Step>,
    #[serde(default)]
    pub secret_id: Option<String>,
    #[serde(default)]
    pub role_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateSubmissionResponse {
    pub submission_id: Uuid,
    pub workflow_id: Uuid,
    pub run_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub submission_id: Uuid,
    pub workflow_status: String,
    pub steps: Vec<SubmissionStepResponse>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionStepResponse {
    pub step_id: String,
    pub status: String,
    pub step_result: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct SignalRequest {
    pub step_id: String,
    pub action: prov_core::SignalAction,
    #[serde(default)]
    pub inputs: Option<HashMap<String, Value>>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/submissions", post(create_submission))
        .route("/v1/submissions/:submission_id", get(get_submission))
        .route("/v1/submissions/:submission_id/signal", post(send_signal))
        .with_state(state)
}

/// POST /v1/submissions — validates the step graph, pre-validates every
/// step against its executor, loads the prior snapshot on `delete`, records
/// the submission and its PENDING steps, then starts the durable workflow.
///
/// The submission row (and every PENDING step row) is written *before* the
/// workflow starts: the workflow's step activities call
/// `SubmissionStore::update_step` against those rows as soon as they run, so
/// the rows have to already exist or those updates would silently match zero
/// rows. `run_id`/`workflow_id` aren't known until the workflow actually
/// starts, so they're set on the row afterward via `set_workflow_ids`.
async fn create_submission(
    State(state): State<AppState>,
    Json(req): Json<CreateSubmissionRequest>,
) -> Result<(StatusCode, Json<CreateSubmissionResponse>), ApiError> {
    prov_core::validate_steps(&req.steps).map_err(core_error)?;

    for step in &req.steps {
        state.registry.get(step).map_err(core_error)?;
    }

    let submission_id = Uuid::now_v7();

    let initial_results = if req.action == Action::Delete {
        let key = prov_core::snapshot_key(&req.project, &req.deployment_id, &req.account);
        state.snapshots.load(&key).await.map_err(|e| {
            tracing::warn!(%key, error = %e, "snapshot load failed for delete submission");
            error(StatusCode::NOT_FOUND, format!("no snapshot found for {key}: {e}"))
        })?
    } else {
        prov_core::ResultsMap::new()
    };

    let workflow_input = WorkflowInput {
        workflow_name: req.workflow_name,
        account: req.account,
        submitter: req.submitter,
        project: req.project,
        action: req.action,
        deployment_id: req.deployment_id,
        submission_id: submission_id.to_string(),
        steps: req.steps,
        secret_id: req.secret_id,
        role_id: req.role_id,
    };

    state
        .submissions
        .insert_submission(&workflow_input)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "failed to record submission");
            error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    let workflow_id = state
        .executor
        .start_workflow::<ProvisioningWorkflow>(
            ProvisioningInput {
                workflow_input: workflow_input.clone(),
                initial_results,
            },
            None,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "failed to start provisioning workflow");
            error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    // This runtime has no notion of a workflow run distinct from the
    // workflow itself (unlike the original's Temporal `RunID`), so `run_id`
    // and `workflow_id` are the same value here.
    state
        .submissions
        .set_workflow_ids(submission_id, &workflow_id.to_string(), &workflow_id.to_string())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "failed to record workflow id on submission");
            error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    Ok((
        StatusCode::ACCEPTED,
        Json(CreateSubmissionResponse {
            submission_id,
            workflow_id,
            run_id: workflow_id,
        }),
    ))
}

/// GET /v1/submissions/:submission_id — current workflow status plus every
/// step's persisted status/result.
async fn get_submission(
    State(state): State<AppState>,
    Path(submission_id): Path<Uuid>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let submission = state
        .submissions
        .get_submission(submission_id)
        .await
        .map_err(|e| error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "submission not found"))?;

    let step_rows = state
        .submissions
        .get_steps(submission_id)
        .await
        .map_err(|e| error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let workflow_status = match &submission.workflow_id {
        Some(workflow_id) => match workflow_id.parse::<Uuid>() {
            Ok(workflow_id) => state
                .executor
                .store()
                .get_workflow_status(workflow_id)
                .await
                .map(|status| status.to_string())
                .unwrap_or_else(|e| format!("unknown ({e})")),
            Err(_) => "unknown (malformed workflow id)".to_string(),
        },
        None => "unknown".to_string(),
    };

    let steps = step_rows
        .into_iter()
        .map(|row| SubmissionStepResponse {
            step_id: row.step_id,
            status: row.status,
            step_result: row.step_result,
        })
        .collect();

    Ok(Json(SubmissionResponse {
        submission_id,
        workflow_status,
        steps,
    }))
}

/// POST /v1/submissions/:submission_id/signal — relays an operator's retry
/// or ignore decision for a `Failed` step into the workflow.
async fn send_signal(
    State(state): State<AppState>,
    Path(submission_id): Path<Uuid>,
    Json(req): Json<SignalRequest>,
) -> Result<StatusCode, ApiError> {
    let submission = state
        .submissions
        .get_submission(submission_id)
        .await
        .map_err(|e| error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "submission not found"))?;

    let workflow_id = submission
        .workflow_id
        .as_deref()
        .and_then(|s| s.parse::<Uuid>().ok())
        .ok_or_else(|| error(StatusCode::INTERNAL_SERVER_ERROR, "submission has no workflow id"))?;

    let signal = WorkflowSignal {
        signal_type: STEP_CONTROL_SIGNAL.to_string(),
        payload: serde_json::to_value(prov_core::RetrySignal {
            step_id: req.step_id,
            action: req.action,
            inputs: req.inputs,
        })
        .expect("RetrySignal always serializes"),
        sent_at: chrono::Utc::now(),
    };

    state.executor.send_signal(workflow_id, signal).await.map_err(|e| {
        tracing::error!(%workflow_id, error = %e, "failed to send signal");
        error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    state.executor.process_workflow(workflow_id).await.map_err(|e| {
        tracing::error!(%workflow_id, error = %e, "failed to process workflow after signal");
        error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    Ok(StatusCode::OK)
}

fn core_error(e: CoreError) -> ApiError {
    let status = match e {
        CoreError::Validation(_)
        | CoreError::Dependency(_)
        | CoreError::UnsupportedOperation { .. }
        | CoreError::UnknownExecutor(_) => StatusCode::BAD_REQUEST,
        CoreError::DuplicateExecutor(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error(status, e.to_string())
}
