//! Error handling for session operations

use stride_auth::AuthError;
use stride_records::RecordsError;
use thiserror::Error;

/// Errors surfaced by the session manager's operations
///
/// Profile *fetch* failures are deliberately absent: a reachable identity
/// with an unreachable profile row degrades to a placeholder user instead
/// of failing the operation.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The credential gateway rejected the operation
    #[error("Credential error: {0}")]
    Credential(#[from] AuthError),

    /// Registration could not create the profile-side records; the
    /// identity already exists at the gateway and is left orphaned
    #[error("Profile write error: {0}")]
    ProfileWrite(#[source] RecordsError),

    /// Login and registration require non-empty inputs
    #[error("Missing required credentials")]
    EmptyCredentials,
}
