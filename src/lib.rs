//! Stride Rust Client Library
//!
//! Client-side core for Stride, a goal-tracking and accountability-partner
//! application. The backend is a hosted service exposing managed
//! authentication and relational tables; this crate composes the two
//! service clients with the session state manager that every screen reads
//! to decide between authenticated content and the login flow.

pub mod config;
pub mod error;

use std::sync::Arc;

use reqwest::Client;

use crate::config::ClientConfig;
use crate::error::ClientError;

pub use stride_auth::{AuthChange, AuthClient, AuthError, AuthOptions, AuthSession, AuthUser};
pub use stride_records::{
    DashboardStats, GoalRecord, GoalStatus, NewProfile, RecordsClient, RecordsError, SortOrder,
    TableQuery, UserProfile,
};
pub use stride_session::{AuthStatus, SessionError, SessionManager, SessionState};

/// The main entry point for the Stride client
///
/// One instance per process: it owns the shared HTTP connection pool and
/// the session state manager wired to the two service clients.
pub struct StrideClient {
    /// Client configuration
    pub config: ClientConfig,
    /// HTTP client shared by all service clients
    pub http_client: Client,
    /// Credential gateway client
    pub auth: Arc<AuthClient>,
    /// Record service client
    pub records: Arc<RecordsClient>,
    /// Session state manager
    pub session: Arc<SessionManager>,
}

impl StrideClient {
    /// Create a new Stride client
    ///
    /// Must be called from within a Tokio runtime: the session manager
    /// spawns its notification loop on construction.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use stride_client::{config::ClientConfig, StrideClient};
    ///
    /// # async fn run() -> Result<(), stride_client::error::ClientError> {
    /// let config = ClientConfig::new("https://your-project.supabase.co", "your-anon-key")?;
    /// let client = StrideClient::new(config)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| ClientError::Initialization(e.to_string()))?;

        let auth = Arc::new(AuthClient::new(
            config.url.as_str(),
            &config.anon_key,
            http_client.clone(),
            AuthOptions::default(),
        ));
        let records = Arc::new(RecordsClient::new(
            config.url.as_str(),
            &config.anon_key,
            http_client.clone(),
        ));
        let session = SessionManager::new(auth.clone(), records.clone());

        Ok(Self {
            config,
            http_client,
            auth,
            records,
            session,
        })
    }

    /// Announce the result of the startup credential check
    ///
    /// Call once at startup with the session restored from secure
    /// storage, or `None` when nothing was persisted; the session manager
    /// settles out of its `Unknown` state when the announcement is
    /// processed.
    pub fn bootstrap(&self, restored: Option<AuthSession>) {
        match restored {
            Some(session) => self.auth.set_session(session),
            None => self.auth.announce_signed_out(),
        }
    }

    /// Get a reference to the credential gateway client
    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    /// Get a reference to the record service client
    pub fn records(&self) -> &RecordsClient {
        &self.records
    }

    /// Get a reference to the session state manager
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Start a query against an arbitrary table
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use stride_client::{config::ClientConfig, StrideClient};
    /// # fn demo(client: &StrideClient) {
    /// let query = client.from("goals");
    /// # }
    /// ```
    pub fn from(&self, table: &str) -> TableQuery {
        self.records.from(table)
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::config::ClientConfig;
    pub use crate::error::ClientError;
    pub use crate::StrideClient;
    pub use stride_session::{AuthStatus, SessionError, SessionManager, SessionState};
}
