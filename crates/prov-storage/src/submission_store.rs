//! Submission store (C5): durable record of a workflow submission and its
//! per-step status, backed by Postgres.
//!
//! Grounded on the original's `db/models.go` (`Submission`/`SubmissionStep`
//! gorm models) and the SQL literals in `db/common.go`
//! (`InsertSubmission`, `UpdateSubmissionStepStatus`,
//! `GetSubmissionStepsByStatus`), reimplemented with sqlx against the
//! migration in `migrations/0001_init.sql` rather than gorm's implicit
//! schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use prov_core::{Step, StepStatus, WorkflowInput};
use serde_json::Value;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{Result, StoreError};

#[derive(Debug, Clone)]
pub struct Submission {
    pub id: Uuid,
    pub workflow_name: String,
    pub account: String,
    pub submitter: String,
    pub project: String,
    pub action: String,
    pub deployment_id: String,
    pub run_id: Option<String>,
    pub workflow_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SubmissionStepRow {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub step_id: String,
    pub provider: String,
    pub executor: String,
    pub resource: Option<String>,
    pub workspace: Option<String>,
    pub operation: String,
    pub variables: Value,
    pub depends_on: Vec<String>,
    pub status: String,
    pub step_result: Option<Value>,
    pub last_updated_at: DateTime<Utc>,
}

impl SubmissionStepRow {
    pub fn status(&self) -> StepStatus {
        self.status.parse().unwrap_or(StepStatus::Pending)
    }

    fn from_row(row: &sqlx::postgres::PgRow) -> Self {
        Self {
            id: row.get("id"),
            submission_id: row.get("submission_id"),
            step_id: row.get("step_id"),
            provider: row.get("provider"),
            executor: row.get("executor"),
            resource: row.get("resource"),
            workspace: row.get("workspace"),
            operation: row.get("operation"),
            variables: row.get("variables"),
            depends_on: row.get("depends_on"),
            status: row.get("status"),
            step_result: row.get("step_result"),
            last_updated_at: row.get("last_updated_at"),
        }
    }
}

#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Insert a submission and all of its PENDING steps in a single
    /// transaction. The row's id is `input.submission_id`, not a
    /// database-assigned value. Called before the workflow starts, so
    /// `run_id`/`workflow_id` aren't known yet — set them afterward via
    /// [`SubmissionStore::set_workflow_ids`].
    async fn insert_submission(&self, input: &WorkflowInput) -> Result<Uuid>;

    /// Record the workflow identity on an already-inserted submission, once
    /// the workflow has actually started.
    async fn set_workflow_ids(&self, submission_id: Uuid, run_id: &str, workflow_id: &str) -> Result<()>;

    /// Update one step's status/result. Identified by (submission_id, step_id),
    /// matching the original's `provider`+`submission_id`+`step_id` predicate;
    /// `provider` is carried for parity but submission_id/step_id already
    /// uniquely identify the row.
    async fn update_step(
        &self,
        submission_id: Uuid,
        step_id: &str,
        status: StepStatus,
        step_result: Option<Value>,
    ) -> Result<()>;

    async fn steps_by_status(&self, submission_id: Uuid, status: StepStatus) -> Result<Vec<SubmissionStepRow>>;

    async fn get_submission(&self, submission_id: Uuid) -> Result<Option<Submission>>;

    async fn get_steps(&self, submission_id: Uuid) -> Result<Vec<SubmissionStepRow>>;
}

pub struct PostgresSubmissionStore {
    pool: PgPool,
}

impl PostgresSubmissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionStore for PostgresSubmissionStore {
    async fn insert_submission(&self, input: &WorkflowInput) -> Result<Uuid> {
        let mut tx = self.pool.begin().await?;

        // `id` is bound explicitly rather than left to its `gen_random_uuid()`
        // default: `input.submission_id` is already the id the workflow will
        // start under (it's what `runtime.rs` echoes back in
        // `update_step` calls), so the row must carry that same value.
        let submission_id: Uuid = input.submission_id.parse().map_err(|_| {
            StoreError::Database(sqlx::Error::Decode(
                format!("submission_id '{}' is not a valid UUID", input.submission_id).into(),
            ))
        })?;

        sqlx::query(
            r#"
            INSERT INTO submissions (id, workflow_name, account, submitter, project, action, deployment_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(submission_id)
        .bind(&input.workflow_name)
        .bind(&input.account)
        .bind(&input.submitter)
        .bind(&input.project)
        .bind(input.action.as_str())
        .bind(&input.deployment_id)
        .execute(&mut *tx)
        .await?;

        for step in &input.steps {
            insert_step(&mut tx, submission_id, step).await?;
        }

        tx.commit().await?;
        Ok(submission_id)
    }

    async fn set_workflow_ids(&self, submission_id: Uuid, run_id: &str, workflow_id: &str) -> Result<()> {
        sqlx::query("UPDATE submissions SET run_id = $1, workflow_id = $2 WHERE id = $3")
            .bind(run_id)
            .bind(workflow_id)
            .bind(submission_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update_step(
        &self,
        submission_id: Uuid,
        step_id: &str,
        status: StepStatus,
        step_result: Option<Value>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE submission_steps
            SET status = $1, step_result = $2, last_updated_at = now()
            WHERE submission_id = $3 AND step_id = $4
            "#,
        )
        .bind(status.as_str())
        .bind(step_result)
        .bind(submission_id)
        .bind(step_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn steps_by_status(&self, submission_id: Uuid, status: StepStatus) -> Result<Vec<SubmissionStepRow>> {
        let rows = sqlx::query(
            "SELECT * FROM submission_steps WHERE submission_id = $1 AND status = $2",
        )
        .bind(submission_id)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(SubmissionStepRow::from_row).collect())
    }

    async fn get_submission(&self, submission_id: Uuid) -> Result<Option<Submission>> {
        let row = sqlx::query(
            r#"
            SELECT id, workflow_name, account, submitter, project, action,
                   deployment_id, run_id, workflow_id, created_at
            FROM submissions WHERE id = $1
            "#,
        )
        .bind(submission_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Submission {
            id: row.get("id"),
            workflow_name: row.get("workflow_name"),
            account: row.get("account"),
            submitter: row.get("submitter"),
            project: row.get("project"),
            action: row.get("action"),
            deployment_id: row.get("deployment_id"),
            run_id: row.get("run_id"),
            workflow_id: row.get("workflow_id"),
            created_at: row.get("created_at"),
        }))
    }

    async fn get_steps(&self, submission_id: Uuid) -> Result<Vec<SubmissionStepRow>> {
        let rows = sqlx::query(
            "SELECT * FROM submission_steps WHERE submission_id = $1 ORDER BY step_id",
        )
        .bind(submission_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(SubmissionStepRow::from_row).collect())
    }
}

async fn insert_step(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    submission_id: Uuid,
    step: &Step,
) -> Result<()> {
    let variables = serde_json::to_value(&step.variables)?;

    sqlx::query(
        r#"
        INSERT INTO submission_steps
            (submission_id, step_id, provider, executor, resource, workspace,
             operation, variables, depends_on, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'PENDING')
        "#,
    )
    .bind(submission_id)
    .bind(&step.id)
    .bind(&step.provider)
    .bind(&step.executor)
    .bind(&step.resource)
    .bind(&step.workspace)
    .bind(&step.operation)
    .bind(variables)
    .bind(&step.depends_on)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
