/// Auth simulator
///
/// Orchestrates validation, rate limiting, lockout, and session issuance.
/// Every login call walks the same ordered checks, each able to
/// short-circuit; the order is part of the contract. The public surface
/// never panics and never leaks internal errors - anything unexpected
/// degrades to `SERVER_ERROR`.
use crate::{
    api::ApiClient,
    auth::{
        mint_access_token, mint_refresh_token, parse_access_token, AccountTable, AttemptLedger,
        LoginError, RateDecision, Session, SessionState, UserProfile,
    },
    clock::Clock,
    config::AppConfig,
    storage::{keys, KeyValueStore},
};
use std::sync::Arc;

/// Origin tag recorded with every attempt; there is no real client address
/// in a single-page app
const LOCAL_ORIGIN: &str = "spa";

/// Registration input
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Mock authentication service
pub struct AuthSimulator {
    config: Arc<AppConfig>,
    clock: Arc<dyn Clock>,
    accounts: Arc<AccountTable>,
    ledger: Arc<AttemptLedger>,
    storage: Arc<dyn KeyValueStore>,
    session: Arc<SessionState>,
    api: Arc<ApiClient>,
}

impl AuthSimulator {
    pub fn new(
        config: Arc<AppConfig>,
        clock: Arc<dyn Clock>,
        accounts: Arc<AccountTable>,
        ledger: Arc<AttemptLedger>,
        storage: Arc<dyn KeyValueStore>,
        session: Arc<SessionState>,
        api: Arc<ApiClient>,
    ) -> Self {
        Self {
            config,
            clock,
            accounts,
            ledger,
            storage,
            session,
            api,
        }
    }

    /// Attempt a login. Returns the minted session or a typed failure;
    /// this call never panics across its boundary.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, LoginError> {
        self.simulate_latency().await;

        let result = if self.config.api.mock_mode {
            self.login_mock(email.trim(), password).await
        } else {
            self.login_remote(email.trim(), password).await
        };

        match &result {
            Ok(session) => {
                tracing::info!(user = %session.user.id, "login succeeded");
            }
            Err(e) => {
                tracing::debug!(kind = e.kind.as_str(), "login failed");
            }
        }

        result
    }

    /// The mock login state machine, evaluated strictly in order
    async fn login_mock(&self, email: &str, password: &str) -> Result<Session, LoginError> {
        let now = self.clock.now();

        // 1. Missing input
        let mut missing = Vec::new();
        if email.is_empty() {
            missing.push("email".to_string());
        }
        if password.is_empty() {
            missing.push("password".to_string());
        }
        if !missing.is_empty() {
            return Err(LoginError::validation(
                "Email and password are required",
                missing,
            ));
        }

        // 2. Email format
        if !is_valid_email(email) {
            return Err(LoginError::validation(
                "Please enter a valid email address",
                vec!["email".to_string()],
            ));
        }

        // 3. Rate limiting - decided before the credential store is
        // consulted, so unknown emails throttle like real ones. The attempt
        // is recorded after the decision (evaluate-then-record).
        if let RateDecision::Limited { retry_after } = self.ledger.check(email, now).await {
            self.ledger
                .record(email, false, Some(LOCAL_ORIGIN), now)
                .await;
            return Err(LoginError::too_many_attempts(retry_after.num_seconds()));
        }

        // 4. Account lookup - a miss reads the same as a wrong password
        let account = match self.accounts.find_by_email(email).await {
            Some(account) => account,
            None => {
                self.ledger
                    .record(email, false, Some(LOCAL_ORIGIN), now)
                    .await;
                return Err(LoginError::invalid_credentials(None));
            }
        };

        // 5. Lockout
        if let Some(locked_until) = account.locked_until {
            if locked_until > now {
                self.ledger
                    .record(email, false, Some(LOCAL_ORIGIN), now)
                    .await;
                return Err(LoginError::locked(locked_until));
            }
        }

        // 6. Active flag
        if !account.is_active {
            self.ledger
                .record(email, false, Some(LOCAL_ORIGIN), now)
                .await;
            return Err(LoginError::inactive());
        }

        // 7. Password (plaintext compare - mock fixture only)
        if account.password != password {
            let max = self.config.auth.max_attempts;
            let failure = self
                .accounts
                .record_password_failure(&account.id, now, max, self.config.auth.lockout_duration())
                .await;
            self.ledger
                .record(email, false, Some(LOCAL_ORIGIN), now)
                .await;

            return match failure {
                Some((count, Some(locked_until))) if count >= max => {
                    Err(LoginError::locked(locked_until))
                }
                Some((count, _)) => {
                    Err(LoginError::invalid_credentials(Some(max.saturating_sub(count))))
                }
                // Account vanished between lookup and update; treat as a
                // plain credential failure
                None => Err(LoginError::invalid_credentials(None)),
            };
        }

        // 8. Success
        let account = self
            .accounts
            .record_successful_login(&account.id, now)
            .await
            .ok_or_else(LoginError::server_error)?;
        self.ledger
            .record(email, true, Some(LOCAL_ORIGIN), now)
            .await;

        let session = Session {
            user: account.profile(),
            access_token: mint_access_token(&account.id, now),
            refresh_token: mint_refresh_token(),
        };

        self.persist_session(&session).await.map_err(|e| {
            tracing::error!("Failed to persist session: {}", e);
            LoginError::server_error()
        })?;
        self.session.set(session.clone()).await;

        Ok(session)
    }

    /// API-backed login: the backend runs the real checks, we keep the
    /// session bookkeeping
    async fn login_remote(&self, email: &str, password: &str) -> Result<Session, LoginError> {
        let session = self
            .api
            .login(email, password)
            .await
            .map_err(|e| LoginError::network(e.to_string()))?;

        self.persist_session(&session).await.map_err(|e| {
            tracing::error!("Failed to persist session: {}", e);
            LoginError::server_error()
        })?;
        self.session.set(session.clone()).await;

        Ok(session)
    }

    /// Register a new account and sign it in
    pub async fn register(&self, input: RegisterInput) -> Result<Session, LoginError> {
        self.simulate_latency().await;

        let name = input.name.trim();
        let email = input.email.trim();

        let mut missing = Vec::new();
        if name.is_empty() {
            missing.push("name".to_string());
        }
        if email.is_empty() {
            missing.push("email".to_string());
        }
        if input.password.is_empty() {
            missing.push("password".to_string());
        }
        if !missing.is_empty() {
            return Err(LoginError::validation("All fields are required", missing));
        }

        if !is_valid_email(email) {
            return Err(LoginError::validation(
                "Please enter a valid email address",
                vec!["email".to_string()],
            ));
        }

        if input.password != input.confirm_password {
            return Err(LoginError::validation(
                "Passwords do not match",
                vec!["confirm_password".to_string()],
            ));
        }

        if input.password.len() < 6 {
            return Err(LoginError::validation(
                "Password must be at least 6 characters",
                vec!["password".to_string()],
            ));
        }

        if !self.config.api.mock_mode {
            let session = self
                .api
                .register(name, email, &input.password)
                .await
                .map_err(|e| LoginError::network(e.to_string()))?;
            self.persist_session(&session).await.map_err(|e| {
                tracing::error!("Failed to persist session: {}", e);
                LoginError::server_error()
            })?;
            self.session.set(session.clone()).await;
            return Ok(session);
        }

        if self.accounts.email_exists(email).await {
            return Err(LoginError::validation(
                "Email is already registered",
                vec!["email".to_string()],
            ));
        }

        let now = self.clock.now();
        let account = self.accounts.insert(name, email, &input.password, now).await;

        let session = Session {
            user: account.profile(),
            access_token: mint_access_token(&account.id, now),
            refresh_token: mint_refresh_token(),
        };

        self.persist_session(&session).await.map_err(|e| {
            tracing::error!("Failed to persist session: {}", e);
            LoginError::server_error()
        })?;
        self.session.set(session.clone()).await;

        tracing::info!(user = %session.user.id, "registered new account");
        Ok(session)
    }

    /// Log out. Remote invalidation is best effort; local state is always
    /// cleared, and this never fails.
    pub async fn logout(&self) {
        if !self.config.api.mock_mode {
            if let Err(e) = self.api.logout().await {
                tracing::warn!("Remote logout failed, clearing local state anyway: {}", e);
            }
        }

        self.session.clear().await;
        if let Err(e) = self.storage.clear_session().await {
            tracing::warn!("Failed to clear stored session: {}", e);
        }
    }

    /// Restore a persisted session on startup.
    /// Malformed or expired state clears storage and reports logged out.
    pub async fn restore_session(&self) -> Option<Session> {
        let token = match self.storage.get(keys::AUTH_TOKEN).await {
            Ok(Some(token)) => token,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read stored session: {}", e);
                return None;
            }
        };

        let Some(claims) = parse_access_token(&token) else {
            tracing::debug!("Stored token has invalid shape, logging out");
            self.discard_stored_session().await;
            return None;
        };

        let now = self.clock.now();
        if now - claims.issued_at > self.config.auth.session_ttl() {
            tracing::debug!("Stored token expired, logging out");
            self.discard_stored_session().await;
            return None;
        }

        let user: UserProfile = match self.storage.get(keys::USER_DATA).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(user) => user,
                Err(e) => {
                    tracing::debug!("Stored profile unreadable ({}), logging out", e);
                    self.discard_stored_session().await;
                    return None;
                }
            },
            _ => {
                self.discard_stored_session().await;
                return None;
            }
        };

        let user = if self.config.api.mock_mode {
            user
        } else {
            // Revalidate against the backend; any failure means logged out
            match self.api.me().await {
                Ok(fresh) => fresh,
                Err(e) => {
                    tracing::debug!("Session revalidation failed ({}), logging out", e);
                    self.discard_stored_session().await;
                    return None;
                }
            }
        };

        let refresh_token = self
            .storage
            .get(keys::REFRESH_TOKEN)
            .await
            .ok()
            .flatten()
            .unwrap_or_default();

        let session = Session {
            user,
            access_token: token,
            refresh_token,
        };
        self.session.set(session.clone()).await;

        tracing::info!(user = %session.user.id, "session restored");
        Some(session)
    }

    async fn discard_stored_session(&self) {
        if let Err(e) = self.storage.clear_session().await {
            tracing::warn!("Failed to clear stored session: {}", e);
        }
    }

    async fn persist_session(&self, session: &Session) -> crate::error::AppResult<()> {
        self.storage
            .set(keys::AUTH_TOKEN, &session.access_token)
            .await?;
        self.storage
            .set(keys::USER_DATA, &serde_json::to_string(&session.user)?)
            .await?;
        self.storage
            .set(keys::REFRESH_TOKEN, &session.refresh_token)
            .await?;
        Ok(())
    }

    async fn simulate_latency(&self) {
        let ms = self.config.auth.simulated_latency_ms;
        if ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
        }
    }
}

/// Minimal `local@domain.tld` shape check
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };

    !host.is_empty() && !host.starts_with('.') && tld.len() >= 2
}
