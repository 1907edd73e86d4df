//! Infracost executor adapter (C3): `cost_estimate` only. Runs the step's
//! provisioner (`terraform` or `tofu`) through init/plan-out/show to produce
//! a `plan.json`, then `infracost breakdown` against it. Grounded on
//! `executors/infracost.go`.

use std::collections::HashMap;

use async_trait::async_trait;
use prov_core::{CoreError, Executor, ExecutorError, Step};
use serde_json::Value;

use super::shell::{format_variables, run_command};

pub struct InfracostExecutor;

#[async_trait]
impl Executor for InfracostExecutor {
    fn validate(&self, step: &Step) -> Result<(), CoreError> {
        if step.operation != "cost_estimate" {
            return Err(CoreError::UnsupportedOperation {
                executor: "infracost".to_string(),
                operation: step.operation.clone(),
                action: step.action.as_str().to_string(),
            });
        }
        Ok(())
    }

    async fn execute(
        &self,
        step: &Step,
        variables: &HashMap<String, Value>,
    ) -> Result<serde_json::Map<String, Value>, ExecutorError> {
        let workspace = step.workspace.as_str();
        let provisioner = if step.provisioner.is_empty() {
            "terraform"
        } else {
            step.provisioner.as_str()
        };

        run_command(provisioner, &["init".to_string()], workspace).await?;

        let mut plan_out_args = vec![
            "plan".to_string(),
            "-input=false".to_string(),
            "-out=plan.binary".to_string(),
        ];
        plan_out_args.extend(format_variables(variables));
        run_command(provisioner, &plan_out_args, workspace).await?;

        let plan_json = run_command(
            provisioner,
            &["show".to_string(), "-json".to_string(), "plan.binary".to_string()],
            workspace,
        )
        .await?;
        write_plan_json(workspace, &plan_json).await?;

        run_command(
            "infracost",
            &[
                "breakdown".to_string(),
                "--path".to_string(),
                "plan.json".to_string(),
                "--fields".to_string(),
                "all".to_string(),
                "--format".to_string(),
                "json".to_string(),
                "--out-file".to_string(),
                "output.json".to_string(),
            ],
            workspace,
        )
        .await?;

        read_cost_estimate(workspace).await
    }
}

async fn write_plan_json(workspace: &str, plan_json: &str) -> Result<(), ExecutorError> {
    let path = std::path::Path::new(workspace).join("plan.json");
    tokio::fs::write(&path, plan_json)
        .await
        .map_err(|e| ExecutorError::new(format!("failed to write plan.json: {e}")))
}

async fn read_cost_estimate(workspace: &str) -> Result<serde_json::Map<String, Value>, ExecutorError> {
    let path = std::path::Path::new(workspace).join("output.json");
    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| ExecutorError::new(format!("failed to read infracost output: {e}")))?;

    let parsed: Value = serde_json::from_str(&content)
        .map_err(|e| ExecutorError::new(format!("failed to parse infracost output: {e}")))?;

    let total = parsed.get("totalMonthlyCost").cloned().unwrap_or(Value::Null);
    let currency = parsed.get("currency").cloned().unwrap_or(Value::Null);
    let estimated_cost = format!(
        "{} {}",
        total.as_str().unwrap_or_default(),
        currency.as_str().unwrap_or_default()
    );

    let mut result = serde_json::Map::new();
    result.insert("estimated_cost".to_string(), Value::String(estimated_cost));
    Ok(result)
}
