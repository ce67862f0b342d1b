use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
    config::Config,
    crypto::token::{TokenError, TokenSigner},
    error::Result,
    models::{
        session::{Claims, SessionRecord},
        user::UserIdentity,
    },
    repositories::{session as session_repo, user as user_repo},
    scheduler::{ScheduledTask, TaskRegistry, TickOutcome},
    store::Store,
};

/// A freshly issued token together with the claims it encodes.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Why a presented token does not authenticate its bearer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unauthenticated {
    /// No token was presented.
    Absent,
    /// The token failed to decode or verify.
    Invalid(TokenError),
    /// The token's expiry is in the past.
    Expired { user_id: Uuid },
    /// The token verifies but its session has been terminated or replaced.
    Revoked { user_id: Uuid },
}

/// Outcome of checking a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Authenticated(Claims),
    Unauthenticated(Unauthenticated),
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }
}

/// Identity of the caller, handed to every handler that needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub claims: Claims,
    pub token: String,
}

impl SessionContext {
    pub fn user_id(&self) -> Uuid {
        self.claims.user_id
    }
}

/// Issues, validates, refreshes and terminates sessions.
#[derive(Clone)]
pub struct SessionManager {
    signer: TokenSigner,
    store: Store,
    tasks: TaskRegistry,
    session_ttl: Duration,
    remember_me_ttl: Duration,
    refresh_interval: std::time::Duration,
}

impl SessionManager {
    /// Creates a new `SessionManager`.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    /// * `store` - Where session records live.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `SessionManager`.
    pub fn new(config: &Config, store: Store) -> Result<Self> {
        Ok(Self {
            signer: TokenSigner::new(&config.signing_key)?,
            store,
            tasks: TaskRegistry::new(),
            session_ttl: Duration::days(config.session_duration_days),
            remember_me_ttl: Duration::days(config.remember_me_duration_days),
            refresh_interval: std::time::Duration::from_secs(config.activity_refresh_secs),
        })
    }

    /// Expiry of a token issued at `issued_at`.
    pub fn expiry_for(&self, issued_at: DateTime<Utc>, remember_me: bool) -> DateTime<Utc> {
        let ttl = if remember_me {
            self.remember_me_ttl
        } else {
            self.session_ttl
        };
        issued_at + ttl
    }

    /// Issues a token expiring one session length from now.
    pub fn issue(&self, user_id: Uuid, email: &str, remember_me: bool) -> Result<IssuedToken> {
        self.issue_at(user_id, email, remember_me, Utc::now())
    }

    /// Issues a token as if the clock read `now`.
    pub fn issue_at(
        &self,
        user_id: Uuid,
        email: &str,
        remember_me: bool,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken> {
        let claims = Claims {
            user_id,
            email: email.to_string(),
            exp: self.expiry_for(now, remember_me).timestamp(),
        };
        let token = self.signer.sign(&claims)?;
        Ok(IssuedToken { token, claims })
    }

    /// Decodes and verifies `token` against the clock reading `now`.
    ///
    /// Pure: no store access and no teardown.
    pub fn validate_at(&self, token: Option<&str>, now: DateTime<Utc>) -> AuthState {
        let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
            return AuthState::Unauthenticated(Unauthenticated::Absent);
        };

        match self.signer.verify(token) {
            Ok(claims) if claims.is_expired_at(now) => {
                AuthState::Unauthenticated(Unauthenticated::Expired {
                    user_id: claims.user_id,
                })
            }
            Ok(claims) => AuthState::Authenticated(claims),
            Err(e) => AuthState::Unauthenticated(Unauthenticated::Invalid(e)),
        }
    }

    /// Whether `token` is currently structurally valid and unexpired.
    pub fn is_valid(&self, token: Option<&str>) -> bool {
        self.validate_at(token, Utc::now()).is_authenticated()
    }

    /// Persists a new session for `identity` and starts its activity refresh task.
    ///
    /// # Arguments
    ///
    /// * `identity` - The user that logged in.
    /// * `issued` - The token handed to the client.
    ///
    /// # Returns
    ///
    /// A `Result` containing the new `SessionRecord`.
    pub async fn establish(
        &self,
        identity: &UserIdentity,
        issued: &IssuedToken,
    ) -> Result<SessionRecord> {
        let record = SessionRecord::new(identity.login_time, &issued.claims);

        user_repo::save_identity(&self.store, identity).await?;
        session_repo::save_token(&self.store, &identity.id, &issued.token).await?;
        session_repo::save_record(&self.store, &identity.id, &record).await?;
        tracing::info!(
            "✅ Session established for user {} (expires {})",
            identity.id,
            record.expires_at
        );

        self.schedule_activity_refresh(identity.id).await;

        Ok(record)
    }

    async fn schedule_activity_refresh(&self, user_id: Uuid) {
        let manager = self.clone();
        let task = ScheduledTask::every(self.refresh_interval, move || {
            let manager = manager.clone();
            async move {
                match manager.refresh_activity(&user_id).await {
                    Ok(true) => TickOutcome::Continue,
                    Ok(false) => TickOutcome::Stop,
                    Err(e) => {
                        tracing::error!("❌ Activity refresh failed for user {}: {}", user_id, e);
                        TickOutcome::Continue
                    }
                }
            }
        });
        self.tasks.replace(user_id, task).await;
    }

    /// Checks a presented token against the clock and the stored session.
    ///
    /// An expired token tears down its user's session state, but only while it is
    /// still the token stored for that user. A token that is not the one currently
    /// stored for its user is rejected.
    pub async fn check(&self, token: Option<&str>) -> Result<AuthState> {
        let state = self.validate_at(token, Utc::now());
        let presented = token.map(str::trim).unwrap_or_default();

        let claims = match state {
            AuthState::Authenticated(claims) => claims,
            AuthState::Unauthenticated(Unauthenticated::Expired { user_id }) => {
                let stored_token = session_repo::find_token(&self.store, &user_id).await?;
                if stored_token.as_deref() == Some(presented) {
                    tracing::warn!("❌ Session expired for user: {}", user_id);
                    self.terminate(&user_id).await?;
                } else {
                    tracing::debug!("🔐 Stale expired token for user: {}", user_id);
                }
                return Ok(state);
            }
            AuthState::Unauthenticated(reason) => {
                tracing::debug!("🔐 Token rejected: {:?}", reason);
                return Ok(state);
            }
        };

        let stored_token = session_repo::find_token(&self.store, &claims.user_id).await?;
        let has_record = session_repo::find_record(&self.store, &claims.user_id)
            .await?
            .is_some();

        if stored_token.as_deref() != Some(presented) || !has_record {
            tracing::warn!("❌ Token for user {} has no live session", claims.user_id);
            return Ok(AuthState::Unauthenticated(Unauthenticated::Revoked {
                user_id: claims.user_id,
            }));
        }

        Ok(AuthState::Authenticated(claims))
    }

    /// Sets `last_activity` to now when the user has a valid session.
    ///
    /// Returns `false` (and changes nothing) when there is no valid session.
    pub async fn refresh_activity(&self, user_id: &Uuid) -> Result<bool> {
        self.refresh_activity_at(user_id, Utc::now()).await
    }

    pub async fn refresh_activity_at(&self, user_id: &Uuid, now: DateTime<Utc>) -> Result<bool> {
        let Some(token) = session_repo::find_token(&self.store, user_id).await? else {
            return Ok(false);
        };
        let Some(mut record) = session_repo::find_record(&self.store, user_id).await? else {
            return Ok(false);
        };

        match self.validate_at(Some(&token), now) {
            AuthState::Authenticated(_) => {}
            AuthState::Unauthenticated(Unauthenticated::Expired { .. }) => {
                self.terminate(user_id).await?;
                return Ok(false);
            }
            AuthState::Unauthenticated(_) => return Ok(false),
        }

        record.last_activity = now;
        session_repo::save_record(&self.store, user_id, &record).await?;
        tracing::debug!("🕒 Activity refreshed for user: {}", user_id);
        Ok(true)
    }

    /// Loads the session record of `user_id`, if any.
    pub async fn record(&self, user_id: &Uuid) -> Result<Option<SessionRecord>> {
        session_repo::find_record(&self.store, user_id).await
    }

    /// Clears all session state of `user_id` and cancels its scheduled tasks.
    pub async fn terminate(&self, user_id: &Uuid) -> Result<()> {
        self.tasks.cancel(user_id).await;
        session_repo::clear(&self.store, user_id).await?;
        tracing::info!("👋 Session terminated for user: {}", user_id);
        Ok(())
    }

    /// Number of sessions with a running activity refresh task.
    pub async fn active_tasks(&self) -> usize {
        self.tasks.active_count().await
    }
}
