//! Vault executor adapter (C3): AppRole login followed by a KV v2 secret
//! read. Grounded on `executors/vault.go`.
//!
//! The original dispatches off the literal step id `"getcreds"` rather than
//! an operation name, unlike every other executor here; ported as
//! `step.operation == "getcreds"` for consistency (see DESIGN.md).

use std::collections::HashMap;

use async_trait::async_trait;
use prov_core::{CoreError, Executor, ExecutorError, Step};
use serde_json::Value;
use vaultrs::auth::approle;
use vaultrs::client::{Client, VaultClient, VaultClientSettingsBuilder};
use vaultrs::kv2;

pub struct VaultExecutor;

#[async_trait]
impl Executor for VaultExecutor {
    fn validate(&self, step: &Step) -> Result<(), CoreError> {
        if step.operation != "getcreds" {
            return Err(CoreError::UnsupportedOperation {
                executor: "vault".to_string(),
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
        let url = string_var(variables, "url")?;
        let mount_path = string_var(variables, "mount_path")?;
        let secret_path = string_var(variables, "secret_path")?;

        let role_id = step
            .role_id
            .as_deref()
            .ok_or_else(|| ExecutorError::new("step is missing role_id"))?;
        let secret_id = step
            .secret_id
            .as_deref()
            .ok_or_else(|| ExecutorError::new("step is missing secret_id"))?;

        let settings = VaultClientSettingsBuilder::default()
            .address(&url)
            .build()
            .map_err(|e| ExecutorError::new(format!("invalid vault client settings: {e}")))?;

        let mut client = VaultClient::new(settings)
            .map_err(|e| ExecutorError::new(format!("failed to build vault client: {e}")))?;

        let auth_info = approle::login(&client, "approle", role_id, secret_id)
            .await
            .map_err(|e| ExecutorError::new(format!("vault approle login failed: {e}")))?;

        client.set_token(&auth_info.client_token);

        let secret: Value = kv2::read(&client, &mount_path, &secret_path)
            .await
            .map_err(|e| ExecutorError::new(format!("failed to read vault secret: {e}")))?;

        match secret {
            Value::Object(map) => Ok(map),
            other => Err(ExecutorError::new(format!(
                "unexpected vault secret shape: {other}"
            ))),
        }
    }
}

fn string_var(variables: &HashMap<String, Value>, key: &str) -> Result<String, ExecutorError> {
    variables
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ExecutorError::new(format!("missing or non-string variable '{key}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_var_rejects_missing_and_non_string_values() {
        let mut variables = HashMap::new();
        variables.insert("count".to_string(), Value::Number(1.into()));
        assert!(string_var(&variables, "count").is_err());
        assert!(string_var(&variables, "missing").is_err());

        variables.insert("url".to_string(), Value::String("https://vault.example".to_string()));
        assert_eq!(string_var(&variables, "url").unwrap(), "https://vault.example");
    }
}
