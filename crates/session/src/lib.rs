//! Session state manager for the Stride app
//!
//! This crate owns the process-wide answer to "is anyone logged in, and
//! who". It subscribes to the credential gateway's session-change channel,
//! merges in the matching profile row from the record service, and
//! publishes a [`SessionState`] snapshot that screens read reactively.
//! Consumers never mutate the state directly; all writes go through the
//! [`SessionManager`] operations.

mod error;
mod manager;
mod state;
mod stores;

pub use error::SessionError;
pub use manager::SessionManager;
pub use state::{AuthStatus, SessionState};
pub use stores::{CredentialGateway, ProfileStore};
