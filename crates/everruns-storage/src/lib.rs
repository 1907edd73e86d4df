// Postgres storage layer with sqlx

pub mod encryption;
pub mod models;
pub mod password;
pub mod repositories;

pub use encryption::{
    generate_encryption_key, EncryptedColumn, EncryptedPayload, EncryptionService,
    ENCRYPTED_COLUMNS,
};
pub use models::*;
pub use repositories::*;
