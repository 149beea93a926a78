/// Application context
///
/// One explicit object owning every store and service; nothing in the crate
/// reaches for a global. Construction wires the dependency graph once,
/// `initialize` hydrates persisted state, and `logout` fans the teardown
/// out to every layer that holds per-user state.
use crate::admin::AdminPanel;
use crate::api::ApiClient;
use crate::auth::{AccountTable, AttemptLedger, AuthSimulator, Session, SessionState};
use crate::catalog::Catalog;
use crate::clock::{Clock, ManualClock, SystemClock};
use crate::config::AppConfig;
use crate::error::AppResult;
use crate::prefs::PrefsStore;
use crate::profile::ProfileStore;
use crate::reviews::ReviewEngine;
use crate::storage::{JsonFileStore, KeyValueStore, MemoryStore};
use std::sync::Arc;

/// Shared application state
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub clock: Arc<dyn Clock>,
    pub storage: Arc<dyn KeyValueStore>,
    pub session: Arc<SessionState>,
    pub accounts: Arc<AccountTable>,
    pub ledger: Arc<AttemptLedger>,
    pub auth: Arc<AuthSimulator>,
    pub reviews: Arc<ReviewEngine>,
    pub catalog: Arc<Catalog>,
    pub profile: Arc<ProfileStore>,
    pub prefs: Arc<PrefsStore>,
    pub admin: Arc<AdminPanel>,
    pub api: Arc<ApiClient>,
}

impl AppContext {
    /// Production wiring: system clock and file-backed storage
    pub async fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        let storage: Arc<dyn KeyValueStore> =
            Arc::new(JsonFileStore::open(config.storage.state_file.clone()).await?);
        Ok(Self::wire(Arc::new(config), Arc::new(SystemClock), storage))
    }

    /// Hermetic wiring for tests: manual clock, in-memory storage, zero
    /// latency. The clock is returned so tests can drive time.
    pub fn mock() -> (Self, Arc<ManualClock>) {
        let mut config = AppConfig::default();
        config.auth.simulated_latency_ms = 0;

        let clock = Arc::new(ManualClock::fixed());
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let context = Self::wire(
            Arc::new(config),
            Arc::clone(&clock) as Arc<dyn Clock>,
            storage,
        );
        (context, clock)
    }

    fn wire(
        config: Arc<AppConfig>,
        clock: Arc<dyn Clock>,
        storage: Arc<dyn KeyValueStore>,
    ) -> Self {
        let session = Arc::new(SessionState::new());
        let accounts = Arc::new(AccountTable::seeded());
        let ledger = Arc::new(AttemptLedger::new(
            config.auth.attempt_window(),
            config.auth.max_attempts,
        ));
        let api = Arc::new(ApiClient::new(Arc::clone(&config), Arc::clone(&storage)));
        let reviews = Arc::new(ReviewEngine::new());
        let catalog = Arc::new(Catalog::seeded(Arc::clone(&config), Arc::clone(&api)));

        let auth = Arc::new(AuthSimulator::new(
            Arc::clone(&config),
            Arc::clone(&clock),
            Arc::clone(&accounts),
            Arc::clone(&ledger),
            Arc::clone(&storage),
            Arc::clone(&session),
            Arc::clone(&api),
        ));
        let profile = Arc::new(ProfileStore::new(
            Arc::clone(&session),
            Arc::clone(&accounts),
            Arc::clone(&reviews),
            Arc::clone(&storage),
        ));
        let prefs = Arc::new(PrefsStore::new(Arc::clone(&storage)));
        let admin = Arc::new(AdminPanel::new(
            Arc::clone(&config),
            Arc::clone(&clock),
            Arc::clone(&session),
            Arc::clone(&accounts),
            Arc::clone(&reviews),
            Arc::clone(&catalog),
            Arc::clone(&api),
        ));

        Self {
            config,
            clock,
            storage,
            session,
            accounts,
            ledger,
            auth,
            reviews,
            catalog,
            profile,
            prefs,
            admin,
            api,
        }
    }

    /// Startup hydration: preferences, then any persisted session
    pub async fn initialize(&self) -> AppResult<Option<Session>> {
        self.prefs.load().await?;
        Ok(self.auth.restore_session().await)
    }

    /// Sign out and drop every piece of per-user state
    pub async fn logout(&self) {
        self.auth.logout().await;
        self.profile.clear().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_context_starts_signed_out() {
        let (context, _clock) = AppContext::mock();
        assert!(context.initialize().await.unwrap().is_none());
        assert!(!context.session.is_authenticated().await);
        assert!(!context.catalog.is_empty().await);
    }

    #[tokio::test]
    async fn logout_clears_profile_state() {
        let (context, _clock) = AppContext::mock();
        context
            .auth
            .login("user@test.com", "password123")
            .await
            .unwrap();

        context.profile.add_to_watchlist("1").await;
        assert!(context.profile.is_in_watchlist("1").await);

        context.logout().await;
        assert!(!context.session.is_authenticated().await);
        assert!(!context.profile.is_in_watchlist("1").await);
        assert!(context
            .storage
            .get(crate::storage::keys::AUTH_TOKEN)
            .await
            .unwrap()
            .is_none());
    }
}
