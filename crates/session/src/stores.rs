//! Seams to the two external collaborators
//!
//! The manager is constructor-injected with these traits rather than the
//! concrete HTTP clients, so tests can drive notification sequences and
//! fetch timing directly.

use async_trait::async_trait;
use stride_auth::{AuthChange, AuthClient, AuthError, AuthSession};
use stride_records::{NewProfile, RecordsClient, RecordsError, UserProfile};
use tokio::sync::broadcast;

/// The hosted identity service
#[async_trait]
pub trait CredentialGateway: Send + Sync {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Session transitions, in emission order
    fn on_session_change(&self) -> broadcast::Receiver<AuthChange>;
}

/// The hosted record service, narrowed to what the session lifecycle needs
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn fetch_profile(&self, id: &str) -> Result<Option<UserProfile>, RecordsError>;

    async fn insert_profile(&self, profile: NewProfile) -> Result<UserProfile, RecordsError>;

    async fn insert_dashboard_stats(&self, user_id: &str) -> Result<(), RecordsError>;
}

#[async_trait]
impl CredentialGateway for AuthClient {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        AuthClient::sign_in_with_password(self, email, password).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        AuthClient::sign_up(self, email, password).await
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        AuthClient::sign_out(self).await
    }

    fn on_session_change(&self) -> broadcast::Receiver<AuthChange> {
        AuthClient::on_session_change(self)
    }
}

#[async_trait]
impl ProfileStore for RecordsClient {
    async fn fetch_profile(&self, id: &str) -> Result<Option<UserProfile>, RecordsError> {
        RecordsClient::fetch_profile(self, id).await
    }

    async fn insert_profile(&self, profile: NewProfile) -> Result<UserProfile, RecordsError> {
        RecordsClient::insert_profile(self, profile).await
    }

    async fn insert_dashboard_stats(&self, user_id: &str) -> Result<(), RecordsError> {
        RecordsClient::insert_dashboard_stats(self, user_id).await
    }
}
