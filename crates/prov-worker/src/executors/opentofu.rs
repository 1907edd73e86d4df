//! OpenTofu executor adapter (C3): identical shape to the terraform
//! adapter, shelling to `tofu` instead of `terraform`. Grounded on
//! `executors/opentofu.go`.

use std::collections::HashMap;

use async_trait::async_trait;
use prov_core::{Action, CoreError, Executor, ExecutorError, Step};
use serde_json::Value;

use super::shell::{format_variables, run_command};
use super::terraform::parse_terraform_outputs;

pub struct OpenTofuExecutor;

#[async_trait]
impl Executor for OpenTofuExecutor {
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
                run_command("tofu", &["init".to_string()], workspace).await?;

                let mut plan_args = vec!["plan".to_string(), "-input=false".to_string()];
                plan_args.extend(format_variables(variables));
                run_command("tofu", &plan_args, workspace).await?;

                let mut apply_args = vec![
                    "apply".to_string(),
                    "-input=false".to_string(),
                    "-auto-approve".to_string(),
                ];
                apply_args.extend(format_variables(variables));
                run_command("tofu", &apply_args, workspace).await?;

                let stdout =
                    run_command("tofu", &["output".to_string(), "-json".to_string()], workspace).await?;
                parse_terraform_outputs(&stdout)
            }
            Action::Delete => {
                let mut plan_args = vec!["plan".to_string(), "-input=false".to_string()];
                plan_args.extend(format_variables(variables));
                run_command("tofu", &plan_args, workspace).await?;

                let mut destroy_args = vec![
                    "destroy".to_string(),
                    "-input=false".to_string(),
                    "-auto-approve".to_string(),
                ];
                destroy_args.extend(format_variables(variables));
                run_command("tofu", &destroy_args, workspace).await?;

                let mut result = serde_json::Map::new();
                result.insert("status".to_string(), Value::String("destroyed".to_string()));
                Ok(result)
            }
        }
    }
}
