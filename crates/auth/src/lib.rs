//! Credential gateway client for the Stride app
//!
//! This crate wraps the hosted identity service (GoTrue-style endpoints),
//! providing sign up, sign in, sign out and session management. Session
//! transitions (bootstrap, sign-in, sign-out, token refresh) are also
//! published on a broadcast channel so that in-process subscribers (the
//! session state manager) can react to it.

use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tokio::sync::broadcast;

/// Capacity of the session-change broadcast channel. The single in-process
/// subscriber drains promptly; lagging only happens if nobody is listening.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Error type for credential gateway operations
#[derive(Error, Debug)]
pub enum AuthError {
    /// The gateway rejected the request; the body is carried verbatim
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// An operation that needs a live session was called without one
    #[error("Missing session")]
    MissingSession,
}

/// Identity record as the gateway reports it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
    pub created_at: String,
    pub updated_at: String,
}

/// An authenticated session issued by the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub token_type: String,
    pub user: AuthUser,
}

impl AuthSession {
    /// Check whether the access token has passed its expiry timestamp
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now().timestamp() >= expires_at,
            None => false,
        }
    }

    fn stamp_expiry(&mut self) {
        if self.expires_at.is_none() {
            self.expires_at = Some(Utc::now().timestamp() + self.expires_in);
        }
    }
}

/// A session transition, as delivered to subscribers
///
/// `SignedIn` covers bootstrap, password sign-in, sign-up and token
/// refresh; subscribers must treat a repeated `SignedIn` for the same
/// identity as a refresh, not a new login.
#[derive(Debug, Clone)]
pub enum AuthChange {
    SignedIn(AuthSession),
    SignedOut,
}

/// Client options
#[derive(Debug, Clone)]
pub struct AuthOptions {
    /// Whether to keep the session in memory after a successful sign-in
    pub persist_session: bool,
    /// Whether `refresh_session` may be driven automatically by callers
    pub auto_refresh_token: bool,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            persist_session: true,
            auto_refresh_token: true,
        }
    }
}

/// Client for the hosted credential gateway
pub struct AuthClient {
    url: String,
    key: String,
    http_client: Client,
    options: AuthOptions,
    current_session: Arc<RwLock<Option<AuthSession>>>,
    changes: broadcast::Sender<AuthChange>,
}

impl AuthClient {
    /// Create a new gateway client
    pub fn new(url: &str, key: &str, http_client: Client, options: AuthOptions) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            http_client,
            options,
            current_session: Arc::new(RwLock::new(None)),
            changes,
        }
    }

    fn get_auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.url, path)
    }

    /// Subscribe to session transitions
    ///
    /// Changes are delivered in the order the gateway client applied them.
    pub fn on_session_change(&self) -> broadcast::Receiver<AuthChange> {
        self.changes.subscribe()
    }

    fn emit(&self, change: AuthChange) {
        // send only fails when nobody is subscribed
        if self.changes.send(change).is_err() {
            log::debug!("session change dropped: no subscribers");
        }
    }

    fn store_session(&self, session: &AuthSession) {
        if self.options.persist_session {
            let mut guard = self.current_session.write().unwrap();
            *guard = Some(session.clone());
        }
    }

    /// Register a new identity with email and password
    ///
    /// The minted session is stored but not announced on the change
    /// channel: a registration only becomes a usable session once the
    /// caller has finished provisioning the matching application records.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let url = self.get_auth_url("/signup");

        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AuthError::ApiError(error_text));
        }

        let mut session: AuthSession = response.json().await?;
        session.stamp_expiry();

        self.store_session(&session);

        Ok(session)
    }

    /// Sign in with email and password
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let url = self.get_auth_url("/token?grant_type=password");

        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AuthError::ApiError(error_text));
        }

        let mut session: AuthSession = response.json().await?;
        session.stamp_expiry();

        self.store_session(&session);
        self.emit(AuthChange::SignedIn(session.clone()));

        Ok(session)
    }

    /// Exchange the refresh token for a new session
    pub async fn refresh_session(&self) -> Result<AuthSession, AuthError> {
        let session = self.get_session().ok_or(AuthError::MissingSession)?;

        let url = self.get_auth_url("/token?grant_type=refresh_token");

        let payload = serde_json::json!({
            "refresh_token": session.refresh_token,
        });

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AuthError::ApiError(error_text));
        }

        let mut new_session: AuthSession = response.json().await?;
        new_session.stamp_expiry();

        self.store_session(&new_session);
        // A refresh re-announces the same identity
        self.emit(AuthChange::SignedIn(new_session.clone()));

        Ok(new_session)
    }

    /// Sign out the current session
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let session = self.get_session().ok_or(AuthError::MissingSession)?;

        let url = self.get_auth_url("/logout");

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", session.access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AuthError::ApiError(error_text));
        }

        // Clear the session
        {
            let mut guard = self.current_session.write().unwrap();
            *guard = None;
        }
        self.emit(AuthChange::SignedOut);

        Ok(())
    }

    /// Fetch the identity record for the current session
    pub async fn get_user(&self) -> Result<AuthUser, AuthError> {
        let session = self.get_session().ok_or(AuthError::MissingSession)?;

        let url = self.get_auth_url("/user");

        let response = self
            .http_client
            .get(&url)
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", session.access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AuthError::ApiError(error_text));
        }

        let user: AuthUser = response.json().await?;

        Ok(user)
    }

    /// Send a password-reset email
    pub async fn reset_password_for_email(&self, email: &str) -> Result<(), AuthError> {
        let url = self.get_auth_url("/recover");

        let payload = serde_json::json!({
            "email": email,
        });

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AuthError::ApiError(error_text));
        }

        Ok(())
    }

    /// Get the current session, if any
    pub fn get_session(&self) -> Option<AuthSession> {
        let guard = self.current_session.read().unwrap();
        guard.clone()
    }

    /// Replace the stored session, announcing it to subscribers
    ///
    /// Used to restore a persisted session at startup; the announcement
    /// drives the same bootstrap path as a fresh sign-in.
    pub fn set_session(&self, session: AuthSession) {
        {
            let mut guard = self.current_session.write().unwrap();
            *guard = Some(session.clone());
        }
        self.emit(AuthChange::SignedIn(session));
    }

    /// Announce that no persisted session was found at startup
    pub fn announce_signed_out(&self) {
        self.emit(AuthChange::SignedOut);
    }
}
