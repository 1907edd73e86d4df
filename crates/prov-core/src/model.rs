//! Domain types shared by the engine, the executor adapters, and the stores.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Step id reserved for the engine's own post-create snapshot activity;
/// no submitted step may use it. Checked by [`crate::validate_steps`].
pub const RESERVED_STEP_ID_STATE_SNAPSHOT: &str = "__state_snapshot__";

/// The two actions a step (and a whole submission) can carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Delete => "delete",
        }
    }
}

/// A single unit of work within a submission.
///
/// Field names mirror the original `models.Step` one-to-one so that a submitted
/// document round-trips without field renaming at the HTTP boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
    pub executor: String,
    pub operation: String,
    pub action: Action,
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub workspace: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub provisioner: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub submitter: String,
    #[serde(default)]
    pub customer: String,
    #[serde(default)]
    pub resource_group: String,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub deployment_name: String,
    /// Display label only; never interpreted by the engine.
    #[serde(default)]
    pub activity: String,
    #[serde(default)]
    pub variables: HashMap<String, Value>,
    #[serde(default)]
    pub role_id: Option<String>,
    #[serde(default)]
    pub secret_id: Option<String>,
}

impl Step {
    pub fn depends_on_set(&self) -> HashSet<&str> {
        self.depends_on.iter().map(String::as_str).collect()
    }
}

/// Submission envelope accepted by the engine. `submission_id` is assigned at
/// acceptance (C8), never supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowInput {
    pub workflow_name: String,
    pub account: String,
    pub submitter: String,
    pub project: String,
    pub action: Action,
    pub deployment_id: String,
    pub submission_id: String,
    pub steps: Vec<Step>,
    #[serde(default)]
    pub secret_id: Option<String>,
    #[serde(default)]
    pub role_id: Option<String>,
}

/// The per-step output mapping, the left-hand side of variable interpolation
/// and the body of a snapshot. Values are an open sum of scalar, string, list
/// and nested mapping — carried as `serde_json::Value` rather than a
/// language-specific generic container.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResultsMap(pub HashMap<String, serde_json::Map<String, Value>>);

impl ResultsMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, step_id: &str) -> Option<&serde_json::Map<String, Value>> {
        self.0.get(step_id)
    }

    pub fn insert(&mut self, step_id: impl Into<String>, output: serde_json::Map<String, Value>) {
        self.0.insert(step_id.into(), output);
    }

    pub fn contains(&self, step_id: &str) -> bool {
        self.0.contains_key(step_id)
    }
}

/// Key under which a `ResultsMap` snapshot is stored: `{project}-{deployment_id}-{account}`.
///
/// This is the single layout adopted from the two inconsistent ones in the
/// original source.
pub fn snapshot_key(project: &str, deployment_id: &str, account: &str) -> String {
    format!("{project}-{deployment_id}-{account}")
}

/// The out-of-band message an operator sends to unblock a FAILED step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySignal {
    pub step_id: String,
    pub action: SignalAction,
    #[serde(default)]
    pub inputs: Option<HashMap<String, Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalAction {
    Retry,
    Ignore,
}

/// Status of a single submission step row, as persisted by the submission store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StepStatus {
    Pending,
    Started,
    Success,
    Failed,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pending => "PENDING",
            StepStatus::Started => "STARTED",
            StepStatus::Success => "SUCCESS",
            StepStatus::Failed => "FAILED",
        }
    }
}

impl std::str::FromStr for StepStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(StepStatus::Pending),
            "STARTED" => Ok(StepStatus::Started),
            "SUCCESS" => Ok(StepStatus::Success),
            "FAILED" => Ok(StepStatus::Failed),
            other => Err(format!("unknown step status: {other}")),
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fixed message stored as a step's `step_result` when an operator ignores
/// a FAILED step.
pub fn ignored_step_result() -> serde_json::Map<String, Value> {
    let mut map = serde_json::Map::new();
    map.insert(
        "message".to_string(),
        Value::String("Step ignored manually".to_string()),
    );
    map
}
