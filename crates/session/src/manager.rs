//! The session state manager

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use stride_auth::{AuthChange, AuthError, AuthSession};
use stride_records::{NewProfile, UserProfile};
use tokio::sync::{broadcast, watch};

use crate::error::SessionError;
use crate::state::{AuthStatus, SessionState};
use crate::stores::{CredentialGateway, ProfileStore};

/// Single source of truth for the authentication lifecycle
///
/// One manager exists per client process. It subscribes to the credential
/// gateway's session-change channel at construction and applies the
/// notifications strictly in emission order; `login`, `register` and
/// `logout` funnel through the same state-publishing path, so a duplicate
/// gateway announcement for an identity already held is a no-op beyond a
/// background profile refresh.
///
/// Profile rows arriving from fire-and-forget fetches are generation
/// stamped: any transition bumps the generation, and a fetch result whose
/// stamp (or profile id) no longer matches the current session is
/// discarded rather than applied.
pub struct SessionManager {
    gateway: Arc<dyn CredentialGateway>,
    profiles: Arc<dyn ProfileStore>,
    state: watch::Sender<SessionState>,
    generation: AtomicU64,
}

impl SessionManager {
    /// Create the manager and start its notification loop
    ///
    /// Must be called from within a Tokio runtime. The returned state is
    /// `Unknown`/loading until the gateway delivers its bootstrap
    /// notification.
    pub fn new(gateway: Arc<dyn CredentialGateway>, profiles: Arc<dyn ProfileStore>) -> Arc<Self> {
        let (state, _) = watch::channel(SessionState::bootstrapping());
        let manager = Arc::new(Self {
            gateway,
            profiles,
            state,
            generation: AtomicU64::new(0),
        });
        manager.spawn_change_loop();
        manager
    }

    /// Subscribe to session snapshots
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Current session snapshot
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Sign in with email and password
    ///
    /// On success the profile row is fetched before the authenticated
    /// state is published; a missing or unreachable row degrades to a
    /// placeholder user instead of failing the login. Logging in while
    /// already authenticated replaces the held identity.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), SessionError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(SessionError::EmptyCredentials);
        }
        self.set_loading(true);

        let session = match self.gateway.sign_in_with_password(email, password).await {
            Ok(session) => session,
            Err(err) => {
                self.set_loading(false);
                return Err(SessionError::Credential(err));
            }
        };

        let profile = self.resolve_profile(&session).await;
        self.bump_generation();
        self.publish_authenticated(profile);
        Ok(())
    }

    /// Mint a new identity and provision its application records
    ///
    /// The `profiles` row and the zeroed `dashboard_stats` row are two
    /// separate writes with no transaction around them. If either fails
    /// the operation fails as a whole, the session state keeps its
    /// pre-call value, and the identity is left orphaned at the gateway.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), SessionError> {
        if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(SessionError::EmptyCredentials);
        }
        self.set_loading(true);

        let session = match self.gateway.sign_up(email, password).await {
            Ok(session) => session,
            Err(err) => {
                self.set_loading(false);
                return Err(SessionError::Credential(err));
            }
        };

        let profile = match self
            .profiles
            .insert_profile(NewProfile::with_defaults(&session.user.id, name, email))
            .await
        {
            Ok(profile) => profile,
            Err(err) => {
                self.set_loading(false);
                return Err(SessionError::ProfileWrite(err));
            }
        };

        if let Err(err) = self.profiles.insert_dashboard_stats(&session.user.id).await {
            self.set_loading(false);
            return Err(SessionError::ProfileWrite(err));
        }

        self.bump_generation();
        self.publish_authenticated(profile);
        Ok(())
    }

    /// Sign out and clear the session
    ///
    /// Local state is cleared before any gateway error is surfaced; once
    /// this returns, no reader observes a signed-in user. Signing out
    /// without a live gateway session is a local no-op.
    pub async fn logout(&self) -> Result<(), SessionError> {
        self.set_loading(true);

        let result = self.gateway.sign_out().await;

        self.bump_generation();
        self.state.send_modify(|state| {
            state.status = AuthStatus::Unauthenticated;
            state.current_user = None;
            state.is_loading = false;
        });

        match result {
            Ok(()) | Err(AuthError::MissingSession) => Ok(()),
            Err(err) => Err(SessionError::Credential(err)),
        }
    }

    fn spawn_change_loop(self: &Arc<Self>) {
        let mut changes = self.gateway.on_session_change();
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) => {
                        let Some(manager) = weak.upgrade() else { break };
                        manager.apply_change(change);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log::warn!("session change loop lagged, skipped {} changes", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            log::debug!("session change loop stopped");
        });
    }

    fn apply_change(self: &Arc<Self>, change: AuthChange) {
        match change {
            AuthChange::SignedIn(session) => self.apply_signed_in(session),
            AuthChange::SignedOut => {
                self.bump_generation();
                self.state.send_modify(|state| {
                    state.status = AuthStatus::Unauthenticated;
                    state.current_user = None;
                    state.is_loading = false;
                });
            }
        }
    }

    fn apply_signed_in(self: &Arc<Self>, session: AuthSession) {
        let same_identity = {
            let state = self.state.borrow();
            state.is_authenticated() && state.user_id() == Some(session.user.id.as_str())
        };

        if same_identity {
            // Redundant announcement (token refresh, or the echo of a
            // login we already applied): keep the loaded profile and
            // refresh it in the background.
            self.set_loading(false);
            self.spawn_profile_refresh(self.current_generation(), session.user.id);
            return;
        }

        let generation = self.bump_generation();
        let placeholder =
            UserProfile::placeholder(&session.user.id, session.user.email.as_deref());
        self.publish_authenticated(placeholder);
        self.spawn_profile_refresh(generation, session.user.id);
    }

    fn spawn_profile_refresh(self: &Arc<Self>, generation: u64, user_id: String) {
        let weak = Arc::downgrade(self);
        let profiles = Arc::clone(&self.profiles);
        tokio::spawn(async move {
            match profiles.fetch_profile(&user_id).await {
                Ok(Some(profile)) => {
                    if let Some(manager) = weak.upgrade() {
                        manager.apply_fetched_profile(generation, profile);
                    }
                }
                Ok(None) => {
                    log::debug!("no profile row for {}, keeping placeholder", user_id);
                }
                Err(err) => {
                    // Nobody awaits this fetch; the placeholder stays
                    log::warn!("background profile fetch for {} failed: {}", user_id, err);
                }
            }
        });
    }

    fn apply_fetched_profile(&self, generation: u64, profile: UserProfile) {
        if self.current_generation() != generation {
            log::debug!("discarding stale profile fetch for {}", profile.id);
            return;
        }
        self.state.send_if_modified(|state| {
            if state.status != AuthStatus::Authenticated {
                return false;
            }
            match state.current_user.as_mut() {
                Some(user) if user.id == profile.id => {
                    *user = profile;
                    true
                }
                _ => false,
            }
        });
    }

    async fn resolve_profile(&self, session: &AuthSession) -> UserProfile {
        match self.profiles.fetch_profile(&session.user.id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                log::debug!("no profile row for {}, using placeholder", session.user.id);
                UserProfile::placeholder(&session.user.id, session.user.email.as_deref())
            }
            Err(err) => {
                log::warn!(
                    "profile fetch for {} failed: {}, using placeholder",
                    session.user.id,
                    err
                );
                UserProfile::placeholder(&session.user.id, session.user.email.as_deref())
            }
        }
    }

    fn publish_authenticated(&self, profile: UserProfile) {
        self.state.send_modify(|state| {
            state.status = AuthStatus::Authenticated;
            state.current_user = Some(profile);
            state.is_loading = false;
        });
    }

    fn set_loading(&self, value: bool) {
        self.state.send_if_modified(|state| {
            if state.is_loading == value {
                return false;
            }
            state.is_loading = value;
            true
        });
    }

    fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}
