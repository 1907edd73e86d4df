//! Bicep executor adapter (C3): `az deployment group create` for `create`.
//! Grounded on `executors/bicep.go` — including its one real oddity, that
//! `delete` shells to `terraform destroy` rather than any `az` teardown
//! command. Reproduced as-is rather than "fixed", since nothing in the
//! original source suggests it was ever meant to call `az`.

use std::collections::HashMap;

use async_trait::async_trait;
use prov_core::{Action, CoreError, Executor, ExecutorError, Step};
use serde_json::Value;

use super::shell::{format_bicep_parameters, format_variables, run_command};

pub struct BicepExecutor;

#[async_trait]
impl Executor for BicepExecutor {
    fn validate(&self, _step: &Step) -> Result<(), CoreError> {
        Ok(())
    }

    async fn execute(
        &self,
        step: &Step,
        variables: &HashMap<String, Value>,
    ) -> Result<serde_json::Map<String, Value>, ExecutorError> {
        let workspace = step.workspace.as_str();

        match step.action {
            Action::Create => {
                let mut args = vec![
                    "deployment".to_string(),
                    "group".to_string(),
                    "create".to_string(),
                    "--resource-group".to_string(),
                    step.resource_group.clone(),
                    "--template-file".to_string(),
                    step.file.clone(),
                    "--name".to_string(),
                    step.deployment_name.clone(),
                ];
                args.extend(format_bicep_parameters(variables));

                let stdout = run_command("az", &args, workspace).await?;
                serde_json::from_str(&stdout)
                    .map_err(|e| ExecutorError::new(format!("failed to parse az deployment output: {e}")))
            }
            Action::Delete => {
                let mut destroy_args = vec![
                    "destroy".to_string(),
                    "-input=false".to_string(),
                    "-auto-approve".to_string(),
                ];
                destroy_args.extend(format_variables(variables));
                run_command("terraform", &destroy_args, workspace).await?;

                let mut result = serde_json::Map::new();
                result.insert("status".to_string(), Value::String("destroyed".to_string()));
                Ok(result)
            }
        }
    }
}
