pub mod activities;
pub mod adapters;
pub mod client;
pub mod durable_runner;
pub mod durable_worker;
pub mod grpc_adapters;
pub mod runner;
pub mod traits;
pub mod turn_workflow;
pub mod types;
pub mod worker;
pub mod workflow_registry;

// Re-export main types
pub use durable_runner::{DurableRunner, DurableTurnInput, DurableTurnOutput};
pub use durable_worker::{DurableWorker, DurableWorkerConfig};
pub use runner::{create_runner, AgentRunner, RunnerConfig, RunnerMode, TemporalRunner};
pub use traits::{Workflow, WorkflowInput};
pub use turn_workflow::{TurnWorkflow, TurnWorkflowInput};
pub use types::WorkflowAction;
pub use worker::TemporalWorker;
pub use workflow_registry::{WorkflowFactory, WorkflowRegistry, WorkflowRegistryBuilder};

// Re-export LLM driver factory helpers
pub use adapters::{create_driver_registry, create_llm_driver};

// Re-export gRPC adapters for worker communication with control plane
pub use grpc_adapters::{
    load_turn_context, GrpcAgentStore, GrpcClient, GrpcEventEmitter, GrpcLlmProviderStore,
    GrpcMessageStore, GrpcSessionFileStore, GrpcSessionStore, TurnContext,
};

// Re-export OpenAI driver from the openai crate
pub use everruns_openai::OpenAILlmDriver;
