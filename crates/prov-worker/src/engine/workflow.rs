//! The provisioning workflow (C6).
//!
//! Schedules each step's activity once its `depends_on` set has resolved to
//! `Success`/`Ignored`, folds every activity result into a [`ResultsMap`],
//! and — the one deliberate departure from a conventional task-DAG runner —
//! never auto-fails the run on a step error. A step that exhausts its
//! retries just sits `Failed` until an operator signal either retries it
//! with fresh inputs or ignores it outright.

use std::collections::HashMap;
use std::time::Duration;

use prov_core::{
    ignored_step_result, interpolate_variables, snapshot_key, Action, ResultsMap, RetrySignal,
    SignalAction, Step, WorkflowInput,
};
use prov_durable::{ActivityError, ActivityOptions, RetryPolicy, Workflow, WorkflowAction, WorkflowSignal};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved activity id for the post-create snapshot write. Shares its value
/// with `prov_core::RESERVED_STEP_ID_STATE_SNAPSHOT`, which
/// `validate_steps` rejects a submitted step from colliding with before it
/// ever reaches the engine.
pub const STATE_SNAPSHOT_ACTIVITY_ID: &str = prov_core::RESERVED_STEP_ID_STATE_SNAPSHOT;
pub const STATE_SNAPSHOT_ACTIVITY_TYPE: &str = "state_snapshot";
pub const STEP_CONTROL_SIGNAL: &str = "step_control_signal";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisioningInput {
    pub workflow_input: WorkflowInput,
    /// Prior run's results, loaded from the snapshot store by the caller
    /// before `start_workflow`. Empty for `create`; populated for `delete`
    /// so steps can interpolate `${step.key}` against the run being torn
    /// down.
    #[serde(default)]
    pub initial_results: ResultsMap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisioningOutput {
    pub results: ResultsMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepState {
    Pending,
    Scheduled,
    Success,
    Ignored,
    Failed,
}

pub struct ProvisioningWorkflow {
    input: WorkflowInput,
    steps_by_id: HashMap<String, Step>,
    order: Vec<String>,
    state: HashMap<String, StepState>,
    results: ResultsMap,
    snapshot_scheduled: bool,
    snapshot_done: bool,
    completed: bool,
}

impl ProvisioningWorkflow {
    fn step(&self, id: &str) -> Step {
        self.steps_by_id
            .get(id)
            .cloned()
            .unwrap_or_else(|| panic!("unknown step id: {id}"))
    }

    fn deps_satisfied(&self, step: &Step) -> bool {
        step.depends_on.iter().all(|dep| {
            matches!(
                self.state.get(dep).copied(),
                Some(StepState::Success) | Some(StepState::Ignored)
            )
        })
    }

    fn ready_actions(&mut self) -> Vec<WorkflowAction> {
        let mut actions = Vec::new();
        for id in self.order.clone() {
            if self.state.get(&id).copied() != Some(StepState::Pending) {
                continue;
            }
            let step = self.step(&id);
            if self.deps_satisfied(&step) {
                actions.push(self.schedule_step(&step));
            }
        }
        actions
    }

    fn schedule_step(&mut self, step: &Step) -> WorkflowAction {
        self.state.insert(step.id.clone(), StepState::Scheduled);

        let mut scheduled = step.clone();
        scheduled.variables = interpolate_variables(&step.variables, &self.results);

        let input = serde_json::json!({
            "submission_id": self.input.submission_id,
            "step": scheduled,
        });

        WorkflowAction::ScheduleActivity {
            activity_id: step.id.clone(),
            activity_type: step.executor.clone(),
            input,
            options: step_activity_options(),
        }
    }

    fn all_steps_terminal(&self) -> bool {
        self.order.iter().all(|id| {
            matches!(
                self.state.get(id).copied(),
                Some(StepState::Success) | Some(StepState::Ignored)
            )
        })
    }

    /// Emits the next step once every step is terminal: a snapshot write for
    /// `create` runs, then completion. `delete` runs skip straight to
    /// completion — there is nothing left to tear down next time.
    fn finalize_if_ready(&mut self) -> Vec<WorkflowAction> {
        if !self.all_steps_terminal() {
            return vec![];
        }

        if self.input.action == Action::Create {
            if !self.snapshot_scheduled {
                self.snapshot_scheduled = true;
                let key = snapshot_key(&self.input.project, &self.input.deployment_id, &self.input.account);
                let input = serde_json::json!({ "key": key, "results": self.results });
                return vec![WorkflowAction::ScheduleActivity {
                    activity_id: STATE_SNAPSHOT_ACTIVITY_ID.to_string(),
                    activity_type: STATE_SNAPSHOT_ACTIVITY_TYPE.to_string(),
                    input,
                    options: ActivityOptions::default(),
                }];
            }
            if !self.snapshot_done {
                return vec![];
            }
        }

        self.completed = true;
        vec![WorkflowAction::complete(
            serde_json::to_value(ProvisioningOutput {
                results: self.results.clone(),
            })
            .expect("ProvisioningOutput always serializes"),
        )]
    }
}

/// Non-default retry policy and timeout for step activities: 5s initial
/// backoff, 60s cap, 2x coefficient, 5 attempts, 30 minute execution budget —
/// terraform/opentofu applies routinely take minutes.
fn step_activity_options() -> ActivityOptions {
    ActivityOptions::default()
        .with_retry(
            RetryPolicy::exponential()
                .with_initial_interval(Duration::from_secs(5))
                .with_max_interval(Duration::from_secs(60))
                .with_backoff_coefficient(2.0)
                .with_max_attempts(5),
        )
        .with_start_to_close_timeout(Duration::from_secs(30 * 60))
}

impl Workflow for ProvisioningWorkflow {
    const TYPE: &'static str = "provisioning_workflow";
    type Input = ProvisioningInput;
    type Output = ProvisioningOutput;

    fn new(input: Self::Input) -> Self {
        let ProvisioningInput {
            workflow_input,
            initial_results,
        } = input;

        let mut order: Vec<String> = workflow_input.steps.iter().map(|s| s.id.clone()).collect();
        if workflow_input.action == Action::Delete {
            // Presentation only: `ready_actions` schedules whatever step's
            // `depends_on` set is satisfied regardless of list position, so
            // this has no effect on scheduling order itself.
            order.reverse();
        }
        let steps_by_id = workflow_input
            .steps
            .iter()
            .cloned()
            .map(|s| (s.id.clone(), s))
            .collect();
        let state = order.iter().map(|id| (id.clone(), StepState::Pending)).collect();

        Self {
            input: workflow_input,
            steps_by_id,
            order,
            state,
            results: initial_results,
            snapshot_scheduled: false,
            snapshot_done: false,
            completed: false,
        }
    }

    fn on_start(&mut self) -> Vec<WorkflowAction> {
        self.ready_actions()
    }

    fn on_activity_completed(&mut self, activity_id: &str, result: Value) -> Vec<WorkflowAction> {
        if activity_id == STATE_SNAPSHOT_ACTIVITY_ID {
            self.snapshot_done = true;
            return self.finalize_if_ready();
        }

        let output = match result {
            Value::Object(map) => map,
            other => {
                let mut map = serde_json::Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        self.results.insert(activity_id, output);
        self.state.insert(activity_id.to_string(), StepState::Success);

        let mut actions = self.ready_actions();
        actions.extend(self.finalize_if_ready());
        actions
    }

    fn on_activity_failed(&mut self, activity_id: &str, _error: &ActivityError) -> Vec<WorkflowAction> {
        // Reached only after retries are exhausted. Block here rather than
        // failing the run; an operator resolves it via a signal.
        self.state.insert(activity_id.to_string(), StepState::Failed);
        vec![]
    }

    fn on_signal(&mut self, signal: &WorkflowSignal) -> Vec<WorkflowAction> {
        if signal.signal_type != STEP_CONTROL_SIGNAL {
            return vec![];
        }
        let Ok(retry_signal) = serde_json::from_value::<RetrySignal>(signal.payload.clone()) else {
            return vec![];
        };
        if self.state.get(&retry_signal.step_id).copied() != Some(StepState::Failed) {
            return vec![];
        }

        match retry_signal.action {
            SignalAction::Ignore => {
                self.results
                    .insert(retry_signal.step_id.clone(), ignored_step_result());
                self.state.insert(retry_signal.step_id.clone(), StepState::Ignored);
                let mut actions = self.ready_actions();
                actions.extend(self.finalize_if_ready());
                actions
            }
            SignalAction::Retry => {
                // The reserved snapshot activity never lands in `steps_by_id`
                // (it isn't a submitted step), so it can't be rescheduled this
                // way; it can still reach `Failed` via `on_activity_failed`.
                if retry_signal.step_id == prov_core::RESERVED_STEP_ID_STATE_SNAPSHOT {
                    return vec![];
                }
                let mut step = self.step(&retry_signal.step_id);
                if let Some(inputs) = retry_signal.inputs {
                    step.variables = inputs;
                    self.steps_by_id.insert(step.id.clone(), step.clone());
                }
                vec![self.schedule_step(&step)]
            }
        }
    }

    fn is_completed(&self) -> bool {
        self.completed
    }

    fn result(&self) -> Option<Self::Output> {
        self.completed.then(|| ProvisioningOutput {
            results: self.results.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prov_core::WorkflowInput;
    use prov_durable::{InMemoryWorkflowEventStore, WorkflowEventStore, WorkflowExecutor};
    use serde_json::json;

    fn step(id: &str, executor: &str, depends_on: &[&str]) -> Step {
        Step {
            id: id.to_string(),
            depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
            executor: executor.to_string(),
            operation: "create".to_string(),
            action: Action::Create,
            resource: String::new(),
            workspace: String::new(),
            provider: String::new(),
            provisioner: String::new(),
            project: "proj".to_string(),
            submitter: String::new(),
            customer: String::new(),
            resource_group: String::new(),
            file: String::new(),
            deployment_name: String::new(),
            activity: String::new(),
            variables: HashMap::new(),
            role_id: None,
            secret_id: None,
        }
    }

    fn workflow_input(steps: Vec<Step>, action: Action) -> WorkflowInput {
        WorkflowInput {
            workflow_name: "provision".to_string(),
            account: "acct-1".to_string(),
            submitter: "alice".to_string(),
            project: "proj".to_string(),
            action,
            deployment_id: "dep-1".to_string(),
            submission_id: "11111111-1111-1111-1111-111111111111".to_string(),
            steps,
            secret_id: None,
            role_id: None,
        }
    }

    // Scenario S1: a two-step chain (A then B, B depends on A) runs A first,
    // only schedules B once A succeeds, then snapshots and completes.
    #[tokio::test]
    async fn scenario_s1_sequential_dependency_then_snapshot() {
        let store = InMemoryWorkflowEventStore::new();
        let mut executor = WorkflowExecutor::new(store);
        executor.register::<ProvisioningWorkflow>();

        let steps = vec![step("A", "terraform", &[]), step("B", "terraform", &["A"])];
        let input = ProvisioningInput {
            workflow_input: workflow_input(steps, Action::Create),
            initial_results: ResultsMap::new(),
        };

        let workflow_id = executor.start_workflow::<ProvisioningWorkflow>(input, None).await.unwrap();

        // Only A should be scheduled at start; B depends on A.
        executor
            .on_activity_completed(workflow_id, "A", json!({"vpc_id": "vpc-1"}))
            .await
            .unwrap();
        executor
            .on_activity_completed(workflow_id, "B", json!({"instance_id": "i-1"}))
            .await
            .unwrap();

        // Both real steps done: next is the reserved snapshot activity.
        let result = executor
            .on_activity_completed(workflow_id, STATE_SNAPSHOT_ACTIVITY_ID, json!({"status": "ok"}))
            .await
            .unwrap();
        assert!(result.completed);

        let info = executor.store().get_workflow_info(workflow_id).await.unwrap();
        let output: ProvisioningOutput = serde_json::from_value(info.result.unwrap()).unwrap();
        assert_eq!(output.results.get("A").unwrap()["vpc_id"], json!("vpc-1"));
        assert_eq!(output.results.get("B").unwrap()["instance_id"], json!("i-1"));
    }

    // Scenario: a `delete` run never schedules a snapshot write.
    #[tokio::test]
    async fn delete_run_completes_without_snapshot() {
        let store = InMemoryWorkflowEventStore::new();
        let mut executor = WorkflowExecutor::new(store);
        executor.register::<ProvisioningWorkflow>();

        let steps = vec![step("A", "terraform", &[])];
        let input = ProvisioningInput {
            workflow_input: workflow_input(steps, Action::Delete),
            initial_results: ResultsMap::new(),
        };

        let workflow_id = executor.start_workflow::<ProvisioningWorkflow>(input, None).await.unwrap();
        let result = executor
            .on_activity_completed(workflow_id, "A", json!({"status": "destroyed"}))
            .await
            .unwrap();
        assert!(result.completed);
    }

    // Scenario S4/S5: a failed step blocks the workflow until a signal
    // resolves it; "ignore" substitutes the canned message and unblocks
    // downstream steps without ever running the failed step.
    #[tokio::test]
    async fn failed_step_blocks_until_ignore_signal_unblocks_dependents() {
        let store = InMemoryWorkflowEventStore::new();
        let mut executor = WorkflowExecutor::new(store);
        executor.register::<ProvisioningWorkflow>();

        let steps = vec![step("A", "terraform", &[]), step("B", "terraform", &["A"])];
        let input = ProvisioningInput {
            workflow_input: workflow_input(steps, Action::Create),
            initial_results: ResultsMap::new(),
        };

        let workflow_id = executor.start_workflow::<ProvisioningWorkflow>(input, None).await.unwrap();

        let result = executor
            .on_activity_failed(
                workflow_id,
                "A",
                ActivityError::non_retryable("plan failed"),
                false,
            )
            .await
            .unwrap();
        assert!(!result.completed);

        let status = executor.store().get_workflow_status(workflow_id).await.unwrap();
        assert_eq!(status, prov_durable::WorkflowStatus::Running);

        executor
            .send_signal(
                workflow_id,
                WorkflowSignal::custom(
                    STEP_CONTROL_SIGNAL,
                    serde_json::to_value(RetrySignal {
                        step_id: "A".to_string(),
                        action: SignalAction::Ignore,
                        inputs: None,
                    })
                    .unwrap(),
                ),
            )
            .await
            .unwrap();

        // Processing the signal ignores A and schedules B; completing B then
        // schedules the snapshot.
        executor.process_workflow(workflow_id).await.unwrap();
        executor
            .on_activity_completed(workflow_id, "B", json!({"instance_id": "i-2"}))
            .await
            .unwrap();
        let result = executor
            .on_activity_completed(workflow_id, STATE_SNAPSHOT_ACTIVITY_ID, json!({"status": "ok"}))
            .await
            .unwrap();
        assert!(result.completed);

        let info = executor.store().get_workflow_info(workflow_id).await.unwrap();
        let output: ProvisioningOutput = serde_json::from_value(info.result.unwrap()).unwrap();
        assert_eq!(output.results.get("A").unwrap()["message"], json!("Step ignored manually"));
    }

    // Scenario S6: a retry signal re-runs the failed step with overridden
    // inputs instead of marking it done.
    #[tokio::test]
    async fn retry_signal_reschedules_failed_step_with_overridden_inputs() {
        let store = InMemoryWorkflowEventStore::new();
        let mut executor = WorkflowExecutor::new(store);
        executor.register::<ProvisioningWorkflow>();

        let steps = vec![step("A", "terraform", &[])];
        let input = ProvisioningInput {
            workflow_input: workflow_input(steps, Action::Create),
            initial_results: ResultsMap::new(),
        };

        let workflow_id = executor.start_workflow::<ProvisioningWorkflow>(input, None).await.unwrap();
        executor
            .on_activity_failed(workflow_id, "A", ActivityError::non_retryable("bad var"), false)
            .await
            .unwrap();

        let mut inputs = HashMap::new();
        inputs.insert("region".to_string(), json!("us-east-2"));
        executor
            .send_signal(
                workflow_id,
                WorkflowSignal::custom(
                    STEP_CONTROL_SIGNAL,
                    serde_json::to_value(RetrySignal {
                        step_id: "A".to_string(),
                        action: SignalAction::Retry,
                        inputs: Some(inputs),
                    })
                    .unwrap(),
                ),
            )
            .await
            .unwrap();
        executor.process_workflow(workflow_id).await.unwrap();

        let events = executor.store().load_events(workflow_id).await.unwrap();
        let rescheduled = events.iter().any(|(_, event)| {
            matches!(
                event,
                prov_durable::WorkflowEvent::ActivityScheduled { activity_id, input, .. }
                    if activity_id == "A" && input["step"]["variables"]["region"] == json!("us-east-2")
            )
        });
        assert!(rescheduled, "expected a fresh ActivityScheduled event for step A with overridden inputs");
    }
}
