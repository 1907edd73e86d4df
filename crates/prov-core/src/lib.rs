//! Domain model, variable interpolation, and executor registry for the
//! provisioning orchestrator.
//!
//! This crate is deliberately storage- and runtime-agnostic: it has no
//! dependency on sqlx, axum, or the durable-execution engine. `prov-storage`,
//! `prov-worker`, and `prov-api` build on top of the types defined here.

pub mod dependency;
pub mod error;
pub mod interpolate;
pub mod model;
pub mod registry;

pub use dependency::validate_steps;
pub use error::{CoreError, Result};
pub use interpolate::{interpolate, interpolate_variables};
pub use model::{
    ignored_step_result, snapshot_key, Action, ResultsMap, RetrySignal, SignalAction, Step,
    StepStatus, WorkflowInput, RESERVED_STEP_ID_STATE_SNAPSHOT,
};
pub use registry::{Executor, ExecutorError, ExecutorFactory, ExecutorRegistry};
