//! Shared shell-out helper for the terraform/opentofu/bicep/infracost
//! adapters: runs a command in a workspace directory and turns a non-zero
//! exit into an [`ExecutorError`] carrying the offending line.
//!
//! Departs from the original `extractError` on purpose: that one returns
//! the *first* `Error:` line in stderr, but terraform/tofu often print a
//! preamble warning that also starts with `Error:` before the real failure.
//! The *last* match is the one that actually explains why the apply failed.

use std::collections::HashMap;

use prov_core::ExecutorError;
use serde_json::Value;
use tokio::process::Command;
use tracing::{error, info};

pub async fn run_command(program: &str, args: &[String], workspace: &str) -> Result<String, ExecutorError> {
    info!(program, args = %args.join(" "), workspace, "running command");

    let output = Command::new(program)
        .args(args)
        .current_dir(workspace)
        .output()
        .await
        .map_err(|e| ExecutorError::new(format!("failed to spawn {program}: {e}")))?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        error!(program, status = %output.status, stderr, "command failed");

        return Err(match last_error_line(stderr) {
            Some(line) => {
                ExecutorError::with_error_line(format!("{program} exited with {}", output.status), line)
            }
            None => ExecutorError::new(format!("{program} exited with {}: {stderr}", output.status)),
        });
    }

    Ok(stdout)
}

/// Last line whose trimmed form starts with `Error:`.
fn last_error_line(stderr: &str) -> Option<String> {
    stderr
        .lines()
        .filter(|line| line.trim_start().starts_with("Error:"))
        .last()
        .map(str::trim)
        .map(str::to_string)
}

pub fn format_variables(variables: &HashMap<String, Value>) -> Vec<String> {
    variables
        .iter()
        .map(|(key, value)| format!("-var={key}={}", value_as_arg(value)))
        .collect()
}

pub fn format_bicep_parameters(variables: &HashMap<String, Value>) -> Vec<String> {
    variables
        .iter()
        .map(|(key, value)| format!("--parameters={key}={}", value_as_arg(value)))
        .collect()
}

fn value_as_arg(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_error_line_picks_final_match() {
        let stderr = "Error: deprecated argument\n\nsome plan output\n\nError: creating instance: quota exceeded";
        assert_eq!(
            last_error_line(stderr),
            Some("Error: creating instance: quota exceeded".to_string())
        );
    }

    #[test]
    fn last_error_line_absent_returns_none() {
        assert_eq!(last_error_line("no failure markers here"), None);
    }

    #[test]
    fn format_variables_uses_var_flag() {
        let mut vars = HashMap::new();
        vars.insert("region".to_string(), Value::String("us-east-1".to_string()));
        let formatted = format_variables(&vars);
        assert_eq!(formatted, vec!["-var=region=us-east-1".to_string()]);
    }
}
