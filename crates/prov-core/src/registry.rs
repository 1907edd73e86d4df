//! Executor interface + registry (C2).
//!
//! Mirrors `prov_durable::engine::registry::WorkflowRegistry`'s
//! name-to-factory pattern: a name (`terraform`, `vault`, ...) maps to a
//! constructor that binds an executor to one step's configuration fields.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CoreError;
use crate::model::Step;

/// A bounded set of external invocations realizing one `(action, operation)`
/// pair for a single step.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Cheap check that this executor supports the step's `(operation, action)`.
    fn validate(&self, step: &Step) -> Result<(), CoreError>;

    /// Runs the operation, returning the step's authoritative outputs.
    async fn execute(
        &self,
        step: &Step,
        variables: &HashMap<String, Value>,
    ) -> Result<serde_json::Map<String, Value>, ExecutorError>;
}

/// Business-level failure from an executor, after any transient retries at
/// the durable-runtime layer have been exhausted.
#[derive(Debug, thiserror::Error, Clone)]
#[error("{message}")]
pub struct ExecutorError {
    pub message: String,
    /// The last `Error:` line observed on the underlying tool's stderr, if any.
    pub error_line: Option<String>,
}

impl ExecutorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_line: None,
        }
    }

    pub fn with_error_line(message: impl Into<String>, error_line: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_line: Some(error_line.into()),
        }
    }
}

/// Factory function constructing an [`Executor`] bound to one step's fields.
pub type ExecutorFactory =
    Box<dyn Fn(&Step) -> Result<Arc<dyn Executor>, CoreError> + Send + Sync>;

/// Name → constructor table. Write phase (`register`)
/// belongs to start-of-process initialization; read phase (`get`) is a pure
/// lookup safe for parallel reads once construction is complete.
pub struct ExecutorRegistry {
    factories: HashMap<String, ExecutorFactory>,
}

impl Default for ExecutorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registers a constructor under `name`. Fails fast on a duplicate name
    /// rather than the original's `panic()` on duplicate registration — still
    /// rejected before the process serves traffic, but as a recoverable error.
    pub fn register(&mut self, name: impl Into<String>, factory: ExecutorFactory) -> Result<(), CoreError> {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(CoreError::DuplicateExecutor(name));
        }
        self.factories.insert(name, factory);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Looks up `step.executor`, constructs the bound executor, and validates
    /// it against the step in one call (the
    /// `registry.get(...) → executor.validate(...)` sequence).
    pub fn get(&self, step: &Step) -> Result<Arc<dyn Executor>, CoreError> {
        let factory = self
            .factories
            .get(step.executor.as_str())
            .ok_or_else(|| CoreError::UnknownExecutor(step.executor.clone()))?;

        let executor = factory(step)?;
        executor.validate(step)?;
        Ok(executor)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    pub fn executor_names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(|s| s.as_str())
    }
}

impl fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorRegistry")
            .field("executors", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Action;

    struct EchoExecutor;

    #[async_trait]
    impl Executor for EchoExecutor {
        fn validate(&self, step: &Step) -> Result<(), CoreError> {
            if step.operation == "echo" {
                Ok(())
            } else {
                Err(CoreError::UnsupportedOperation {
                    executor: step.executor.clone(),
                    operation: step.operation.clone(),
                    action: step.action.as_str().to_string(),
                })
            }
        }

        async fn execute(
            &self,
            _step: &Step,
            variables: &HashMap<String, Value>,
        ) -> Result<serde_json::Map<String, Value>, ExecutorError> {
            Ok(variables
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect())
        }
    }

    fn step(executor: &str, operation: &str) -> Step {
        Step {
            id: "A".to_string(),
            depends_on: vec![],
            executor: executor.to_string(),
            operation: operation.to_string(),
            action: Action::Create,
            resource: String::new(),
            workspace: String::new(),
            provider: String::new(),
            provisioner: String::new(),
            project: String::new(),
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

    #[test]
    fn duplicate_registration_fails_fast() {
        let mut registry = ExecutorRegistry::new();
        registry
            .register("echo", Box::new(|_| Ok(Arc::new(EchoExecutor))))
            .unwrap();

        let err = registry
            .register("echo", Box::new(|_| Ok(Arc::new(EchoExecutor))))
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateExecutor(_)));
    }

    #[test]
    fn unknown_executor_name() {
        let registry = ExecutorRegistry::new();
        let err = registry.get(&step("missing", "noop")).unwrap_err();
        assert!(matches!(err, CoreError::UnknownExecutor(_)));
    }

    #[test]
    fn validate_rejects_unsupported_operation() {
        let mut registry = ExecutorRegistry::new();
        registry
            .register("echo", Box::new(|_| Ok(Arc::new(EchoExecutor))))
            .unwrap();

        let err = registry.get(&step("echo", "not-echo")).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedOperation { .. }));
    }
}
