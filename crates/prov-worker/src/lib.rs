//! Executor adapters (C3), the provisioning workflow (C6), and the
//! durable-runtime glue (C7) that wires both into a `WorkerPool`.

pub mod engine;
pub mod executors;
pub mod runtime;

use std::sync::Arc;

use prov_core::{CoreError, ExecutorRegistry};
use prov_storage::EncryptionService;

/// Builds the registry of all seven executor adapters — the one wiring
/// point a process needs at startup.
pub fn build_executor_registry(encryption: EncryptionService) -> Result<ExecutorRegistry, CoreError> {
    let mut registry = ExecutorRegistry::new();

    registry.register("terraform", Box::new(|_step| Ok(Arc::new(executors::TerraformExecutor))))?;
    registry.register("opentofu", Box::new(|_step| Ok(Arc::new(executors::OpenTofuExecutor))))?;
    registry.register("bicep", Box::new(|_step| Ok(Arc::new(executors::BicepExecutor))))?;
    registry.register("infracost", Box::new(|_step| Ok(Arc::new(executors::InfracostExecutor))))?;
    registry.register("git", Box::new(|_step| Ok(Arc::new(executors::GitExecutor::new()))))?;
    registry.register("vault", Box::new(|_step| Ok(Arc::new(executors::VaultExecutor))))?;

    registry.register(
        "http",
        Box::new(move |_step| Ok(Arc::new(executors::HttpExecutor::new(encryption.clone())))),
    )?;

    Ok(registry)
}
