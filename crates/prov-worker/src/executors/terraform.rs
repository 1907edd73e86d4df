//! Terraform executor adapter (C3): `init`/`plan`/`apply` for `create`,
//! `plan`/`destroy` for `delete`. Grounded on `executors/terraform.go`.
//!
//! The original runs a plain `plan` (not a destroy plan) before `destroy` —
//! "else it would encounter a failure" per its own comment — and skips
//! `init` entirely on the delete path. Both kept as-is.

use std::collections::HashMap;

use async_trait::async_trait;
use prov_core::{Action, CoreError, Executor, ExecutorError, Step};
use serde_json::Value;

use super::shell::{format_variables, run_command};

pub struct TerraformExecutor;

#[async_trait]
impl Executor for TerraformExecutor {
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
                run_command("terraform", &["init".to_string()], workspace).await?;

                let mut plan_args = vec!["plan".to_string(), "-input=false".to_string()];
                plan_args.extend(format_variables(variables));
                run_command("terraform", &plan_args, workspace).await?;

                let mut apply_args = vec![
                    "apply".to_string(),
                    "-input=false".to_string(),
                    "-auto-approve".to_string(),
                ];
                apply_args.extend(format_variables(variables));
                run_command("terraform", &apply_args, workspace).await?;

                capture_outputs(workspace).await
            }
            Action::Delete => {
                let mut plan_args = vec!["plan".to_string(), "-input=false".to_string()];
                plan_args.extend(format_variables(variables));
                run_command("terraform", &plan_args, workspace).await?;

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

pub(super) async fn capture_outputs(workspace: &str) -> Result<serde_json::Map<String, Value>, ExecutorError> {
    let stdout = run_command(
        "terraform",
        &["output".to_string(), "-json".to_string()],
        workspace,
    )
    .await?;
    parse_terraform_outputs(&stdout)
}

pub(super) fn parse_terraform_outputs(stdout: &str) -> Result<serde_json::Map<String, Value>, ExecutorError> {
    let raw: serde_json::Map<String, Value> = serde_json::from_str(stdout)
        .map_err(|e| ExecutorError::new(format!("failed to parse terraform output -json: {e}")))?;

    let mut outputs = serde_json::Map::new();
    for (key, details) in raw {
        if let Some(value) = details.get("value") {
            outputs.insert(key, value.clone());
        }
    }
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_value_field_out_of_terraform_output_json() {
        let stdout = r#"{"vpc_id": {"value": "vpc-123", "type": "string"}, "count": {"value": 3, "type": "number"}}"#;
        let outputs = parse_terraform_outputs(stdout).unwrap();
        assert_eq!(outputs.get("vpc_id").unwrap(), &Value::String("vpc-123".to_string()));
        assert_eq!(outputs.get("count").unwrap(), &Value::Number(3.into()));
    }
}
