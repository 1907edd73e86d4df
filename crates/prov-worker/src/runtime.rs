//! Durable-runtime adapter (C7): registers one `WorkerPool` handler per
//! executor name plus the reserved snapshot activity.
//!
//! `WorkerPool`'s own poll loop only talks to the event store's task-queue
//! bookkeeping (`complete_task`/`fail_task`) — it never calls back into a
//! `WorkflowExecutor`. Each handler registered here does that bridging
//! itself: run the work, record the step's row in the submission store,
//! then call `on_activity_completed`/`on_activity_failed` directly before
//! returning the plain `Result<Value, String>` the pool loop consumes.
//!
//! A failed `SubmissionStore::update_step` call (STARTED, SUCCESS, or
//! FAILED) is treated the same as an executor failure: it fails the
//! activity rather than being logged and ignored, since a lost status
//! write desyncs the persisted submission from the workflow silently
//! otherwise.

use std::sync::Arc;

use prov_core::{ExecutorRegistry, Step, StepStatus};
use prov_durable::persistence::ClaimedTask;
use prov_durable::worker::WorkerPool;
use prov_durable::{ActivityError, WorkflowEventStore, WorkflowExecutor};
use prov_storage::{StateStore, SubmissionStore};
use serde_json::Value;
use tracing::error;
use uuid::Uuid;

use crate::engine::{STATE_SNAPSHOT_ACTIVITY_TYPE, STATE_SNAPSHOT_ACTIVITY_ID};

/// Registers every executor name known to `registry` plus the snapshot
/// activity against `pool`. Must run before `pool.start()`.
pub fn register_activities<S>(
    pool: &WorkerPool,
    executor: Arc<WorkflowExecutor<S>>,
    registry: Arc<ExecutorRegistry>,
    submissions: Arc<dyn SubmissionStore>,
    snapshots: Arc<dyn StateStore>,
) where
    S: WorkflowEventStore,
{
    let names: Vec<String> = registry.executor_names().map(str::to_string).collect();
    for name in names {
        let executor = Arc::clone(&executor);
        let registry = Arc::clone(&registry);
        let submissions = Arc::clone(&submissions);

        pool.register_handler(&name, move |task: ClaimedTask| {
            let executor = Arc::clone(&executor);
            let registry = Arc::clone(&registry);
            let submissions = Arc::clone(&submissions);
            async move { run_step_activity(task, executor, registry, submissions).await }
        });
    }

    pool.register_handler(STATE_SNAPSHOT_ACTIVITY_TYPE, move |task: ClaimedTask| {
        let executor = Arc::clone(&executor);
        let snapshots = Arc::clone(&snapshots);
        async move { run_snapshot_activity(task, executor, snapshots).await }
    });
}

async fn run_step_activity<S>(
    task: ClaimedTask,
    executor: Arc<WorkflowExecutor<S>>,
    registry: Arc<ExecutorRegistry>,
    submissions: Arc<dyn SubmissionStore>,
) -> Result<Value, String>
where
    S: WorkflowEventStore,
{
    let submission_id = submission_id_of(&task);

    let step: Step = match task.input.get("step").cloned() {
        Some(value) => match serde_json::from_value(value) {
            Ok(step) => step,
            Err(e) => return fail(&executor, &task, format!("invalid step payload: {e}")).await,
        },
        None => return fail(&executor, &task, "missing step payload in activity input".to_string()).await,
    };

    if let Some(submission_id) = submission_id {
        if let Err(e) = submissions.update_step(submission_id, &step.id, StepStatus::Started, None).await {
            return fail(&executor, &task, format!("failed to record step start: {e}")).await;
        }
    }

    match run_executor(&registry, &step).await {
        Ok(output) => {
            let result = Value::Object(output);
            if let Some(submission_id) = submission_id {
                if let Err(e) = submissions
                    .update_step(submission_id, &step.id, StepStatus::Success, Some(result.clone()))
                    .await
                {
                    return fail(&executor, &task, format!("failed to record step success: {e}")).await;
                }
            }

            if let Err(e) = executor
                .on_activity_completed(task.workflow_id, &task.activity_id, result.clone())
                .await
            {
                error!(workflow_id = %task.workflow_id, activity_id = %task.activity_id, error = %e, "failed to notify workflow of activity completion");
            }

            Ok(result)
        }
        Err(message) => {
            if let Some(submission_id) = submission_id {
                if let Err(e) = submissions
                    .update_step(submission_id, &step.id, StepStatus::Failed, Some(Value::String(message.clone())))
                    .await
                {
                    return fail(
                        &executor,
                        &task,
                        format!("failed to record step failure ({message}): {e}"),
                    )
                    .await;
                }
            }
            fail(&executor, &task, message).await
        }
    }
}

async fn run_snapshot_activity<S>(
    task: ClaimedTask,
    executor: Arc<WorkflowExecutor<S>>,
    snapshots: Arc<dyn StateStore>,
) -> Result<Value, String>
where
    S: WorkflowEventStore,
{
    let key = task
        .input
        .get("key")
        .and_then(Value::as_str)
        .ok_or_else(|| "snapshot activity missing key".to_string())?;
    let results = task
        .input
        .get("results")
        .cloned()
        .ok_or_else(|| "snapshot activity missing results".to_string())?;
    let results = serde_json::from_value(results)
        .map_err(|e| format!("invalid snapshot results payload: {e}"))?;

    match snapshots.save(key, &results).await {
        Ok(()) => {
            let result = serde_json::json!({ "status": "ok" });
            if let Err(e) = executor
                .on_activity_completed(task.workflow_id, STATE_SNAPSHOT_ACTIVITY_ID, result.clone())
                .await
            {
                error!(workflow_id = %task.workflow_id, error = %e, "failed to notify workflow of snapshot completion");
            }
            Ok(result)
        }
        Err(e) => fail(&executor, &task, format!("failed to save snapshot: {e}")).await,
    }
}

async fn run_executor(registry: &ExecutorRegistry, step: &Step) -> Result<serde_json::Map<String, Value>, String> {
    let executor = registry.get(step).map_err(|e| e.to_string())?;
    executor
        .execute(step, &step.variables)
        .await
        .map_err(|e| e.error_line.unwrap_or(e.message))
}

async fn fail<S>(executor: &Arc<WorkflowExecutor<S>>, task: &ClaimedTask, message: String) -> Result<Value, String>
where
    S: WorkflowEventStore,
{
    let will_retry = task.attempt < task.max_attempts;
    let activity_error = ActivityError::retryable(message.clone());

    if let Err(e) = executor
        .on_activity_failed(task.workflow_id, &task.activity_id, activity_error, will_retry)
        .await
    {
        error!(workflow_id = %task.workflow_id, activity_id = %task.activity_id, error = %e, "failed to notify workflow of activity failure");
    }

    Err(message)
}

fn submission_id_of(task: &ClaimedTask) -> Option<Uuid> {
    task.input
        .get("submission_id")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<Uuid>().ok())
}
