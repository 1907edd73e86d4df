// Public contracts for Everruns API
// This crate defines DTOs, AG-UI event types, and JSON schemas

pub mod agents;
pub mod events;
pub mod llm;
pub mod resources;
pub mod tools;

pub use agents::*;
pub use events::*;
pub use llm::*;
pub use resources::*;
pub use tools::*;
