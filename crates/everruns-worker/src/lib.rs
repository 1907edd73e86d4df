pub mod activities;
pub mod adapters;
pub mod agent_workflow;
pub mod client;
pub mod runner;
pub mod traits;
pub mod types;
pub mod unified_tool_executor;
pub mod worker;
pub mod workflow_registry;

// Re-export main types
pub use agent_workflow::{AgentWorkflow, AgentWorkflowInput};
pub use runner::{create_runner, run_worker, AgentRunner, RunnerConfig, TemporalRunner};
pub use traits::{Workflow, WorkflowInput};
pub use types::WorkflowAction;
pub use worker::TemporalWorker;
pub use workflow_registry::{WorkflowFactory, WorkflowRegistry, WorkflowRegistryBuilder};

// Re-export adapters
pub use adapters::{create_db_message_store, DbMessageStore};

// Re-export unified tool executor
pub use unified_tool_executor::UnifiedToolExecutor;

// Re-export OpenAI provider from the openai crate
pub use everruns_openai::OpenAiProvider;
