//! State snapshot store (C4), submission store (C5), and envelope
//! encryption for credential material used by the HTTP and Vault
//! executor adapters.

pub mod encryption;
pub mod error;
pub mod state_store;
pub mod submission_store;

pub use encryption::{generate_encryption_key, EncryptedPayload, EncryptionService};
pub use error::{Result, StoreError};
pub use state_store::{FileStateStore, StateStore};
pub use submission_store::{PostgresSubmissionStore, Submission, SubmissionStepRow, SubmissionStore};
