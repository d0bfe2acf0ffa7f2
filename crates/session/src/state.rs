//! The published session snapshot

use stride_records::UserProfile;

/// Where the process stands in the authentication lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// Before the first gateway notification has been processed
    Unknown,
    Authenticated,
    Unauthenticated,
}

/// Process-wide session snapshot
///
/// Exactly one instance exists per manager; it is created at startup and
/// only ever mutated, never replaced. `current_user` is `Some` if and only
/// if `status` is [`AuthStatus::Authenticated`]. The profile may still be
/// a placeholder (identity fields only) while the full row is in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub status: AuthStatus,
    /// True while bootstrap, login, registration or logout is in flight
    pub is_loading: bool,
    pub current_user: Option<UserProfile>,
}

impl SessionState {
    pub(crate) fn bootstrapping() -> Self {
        Self {
            status: AuthStatus::Unknown,
            is_loading: true,
            current_user: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == AuthStatus::Authenticated
    }

    /// Identity id of the current user, if any
    pub fn user_id(&self) -> Option<&str> {
        self.current_user.as_ref().map(|user| user.id.as_str())
    }
}
