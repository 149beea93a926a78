/// Current-user profile state
///
/// Watchlist, favorites, and the follow graph for whoever is signed in.
/// Every mutation checks the session first and silently does nothing when
/// unauthenticated - the UI treats these as fire-and-forget toggles, not
/// errors. Watchlist and favorites are sets of work ids with no ordering
/// guarantee.
use crate::auth::{AccountTable, SessionState, UserProfile};
use crate::error::AppResult;
use crate::reviews::ReviewEngine;
use crate::storage::{keys, KeyValueStore};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Aggregates over the user's own reviews
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub total_reviews: u32,
    pub average_rating: f32,
    pub total_helpfulness: i32,
    pub works_reviewed: u32,
}

/// Field patch for the signed-in user's profile
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Default)]
struct Collections {
    watchlist: HashSet<String>,
    favorites: HashSet<String>,
    following: HashSet<String>,
}

/// Per-session user state
pub struct ProfileStore {
    session: Arc<SessionState>,
    accounts: Arc<AccountTable>,
    reviews: Arc<ReviewEngine>,
    storage: Arc<dyn KeyValueStore>,
    collections: RwLock<Collections>,
}

impl ProfileStore {
    pub fn new(
        session: Arc<SessionState>,
        accounts: Arc<AccountTable>,
        reviews: Arc<ReviewEngine>,
        storage: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            session,
            accounts,
            reviews,
            storage,
            collections: RwLock::new(Collections::default()),
        }
    }

    // --- Watchlist ---

    /// Add a work to the watchlist. Idempotent; no-op when signed out.
    pub async fn add_to_watchlist(&self, work_id: &str) {
        if !self.session.is_authenticated().await {
            return;
        }
        self.collections
            .write()
            .await
            .watchlist
            .insert(work_id.to_string());
    }

    pub async fn remove_from_watchlist(&self, work_id: &str) {
        if !self.session.is_authenticated().await {
            return;
        }
        self.collections.write().await.watchlist.remove(work_id);
    }

    /// Toggle membership. Returns whether the work is in the watchlist
    /// after the call, or `None` when signed out.
    pub async fn toggle_watchlist(&self, work_id: &str) -> Option<bool> {
        if !self.session.is_authenticated().await {
            return None;
        }
        let mut collections = self.collections.write().await;
        if collections.watchlist.remove(work_id) {
            Some(false)
        } else {
            collections.watchlist.insert(work_id.to_string());
            Some(true)
        }
    }

    pub async fn is_in_watchlist(&self, work_id: &str) -> bool {
        self.collections.read().await.watchlist.contains(work_id)
    }

    pub async fn watchlist(&self) -> HashSet<String> {
        self.collections.read().await.watchlist.clone()
    }

    // --- Favorites ---

    pub async fn add_to_favorites(&self, work_id: &str) {
        if !self.session.is_authenticated().await {
            return;
        }
        self.collections
            .write()
            .await
            .favorites
            .insert(work_id.to_string());
    }

    pub async fn remove_from_favorites(&self, work_id: &str) {
        if !self.session.is_authenticated().await {
            return;
        }
        self.collections.write().await.favorites.remove(work_id);
    }

    pub async fn toggle_favorite(&self, work_id: &str) -> Option<bool> {
        if !self.session.is_authenticated().await {
            return None;
        }
        let mut collections = self.collections.write().await;
        if collections.favorites.remove(work_id) {
            Some(false)
        } else {
            collections.favorites.insert(work_id.to_string());
            Some(true)
        }
    }

    pub async fn is_favorite(&self, work_id: &str) -> bool {
        self.collections.read().await.favorites.contains(work_id)
    }

    pub async fn favorites(&self) -> HashSet<String> {
        self.collections.read().await.favorites.clone()
    }

    // --- Follow graph ---

    /// Follow another user. Self-follows are refused; signed-out calls and
    /// repeats are no-ops. Returns whether the user is followed afterwards.
    pub async fn follow(&self, user_id: &str) -> bool {
        let current = match self.session.user().await {
            Some(user) => user,
            None => return false,
        };
        if current.id == user_id {
            tracing::debug!(user_id = %user_id, "Refusing self-follow");
            return false;
        }
        self.collections
            .write()
            .await
            .following
            .insert(user_id.to_string());
        true
    }

    pub async fn unfollow(&self, user_id: &str) {
        if !self.session.is_authenticated().await {
            return;
        }
        self.collections.write().await.following.remove(user_id);
    }

    pub async fn is_following(&self, user_id: &str) -> bool {
        self.collections.read().await.following.contains(user_id)
    }

    pub async fn following(&self) -> HashSet<String> {
        self.collections.read().await.following.clone()
    }

    // --- Profile ---

    /// Patch the signed-in user's profile. Updates the account record, the
    /// live session, and the persisted user snapshot together. Returns the
    /// updated profile, or `None` when signed out.
    pub async fn update_profile(&self, patch: ProfilePatch) -> AppResult<Option<UserProfile>> {
        let current = match self.session.user().await {
            Some(user) => user,
            None => return Ok(None),
        };

        let account = self
            .accounts
            .update_profile_fields(
                &current.id,
                patch.name.as_deref(),
                patch.bio.as_deref(),
                patch.location.as_deref(),
                patch.avatar.as_deref(),
            )
            .await;

        let profile = match account {
            Some(account) => account.profile(),
            None => return Ok(None),
        };

        self.session.update_user(profile.clone()).await;
        self.storage
            .set(keys::USER_DATA, &serde_json::to_string(&profile)?)
            .await?;

        Ok(Some(profile))
    }

    /// The signed-in user's own reviews
    pub async fn my_reviews(&self) -> Vec<crate::reviews::Review> {
        match self.session.user().await {
            Some(user) => self.reviews.by_author(&user.id).await,
            None => Vec::new(),
        }
    }

    /// Aggregates over the signed-in user's reviews
    pub async fn stats(&self) -> UserStats {
        let reviews = self.my_reviews().await;
        if reviews.is_empty() {
            return UserStats::default();
        }

        let total = reviews.len() as u32;
        let sum: f32 = reviews.iter().map(|r| r.rating).sum();
        let helpfulness: i32 = reviews.iter().map(|r| r.helpfulness_score).sum();
        let works: HashSet<&str> = reviews.iter().map(|r| r.work_id.as_str()).collect();

        UserStats {
            total_reviews: total,
            average_rating: sum / total as f32,
            total_helpfulness: helpfulness,
            works_reviewed: works.len() as u32,
        }
    }

    /// Drop all per-user state; called on logout
    pub async fn clear(&self) {
        let mut collections = self.collections.write().await;
        collections.watchlist.clear();
        collections.favorites.clear();
        collections.following.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{mint_access_token, mint_refresh_token, Session};
    use crate::authz::Role;
    use crate::storage::MemoryStore;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn profile(id: &str) -> UserProfile {
        UserProfile {
            id: id.to_string(),
            name: "Test User".to_string(),
            email: "user@test.com".to_string(),
            bio: None,
            location: None,
            join_date: NaiveDate::from_ymd_opt(2023, 3, 20).unwrap(),
            avatar: None,
            role: Role::User,
        }
    }

    async fn store_with_session(user_id: Option<&str>) -> ProfileStore {
        let session = Arc::new(SessionState::new());
        if let Some(id) = user_id {
            let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
            session
                .set(Session {
                    user: profile(id),
                    access_token: mint_access_token(id, now),
                    refresh_token: mint_refresh_token(),
                })
                .await;
        }
        ProfileStore::new(
            session,
            Arc::new(AccountTable::seeded()),
            Arc::new(ReviewEngine::new()),
            Arc::new(MemoryStore::new()),
        )
    }

    #[tokio::test]
    async fn watchlist_add_is_idempotent() {
        let store = store_with_session(Some("2")).await;

        store.add_to_watchlist("m1").await;
        store.add_to_watchlist("m1").await;
        store.add_to_watchlist("m1").await;

        assert_eq!(store.watchlist().await.len(), 1);
        assert!(store.is_in_watchlist("m1").await);
    }

    #[tokio::test]
    async fn toggle_round_trips() {
        let store = store_with_session(Some("2")).await;

        assert_eq!(store.toggle_watchlist("m1").await, Some(true));
        assert_eq!(store.toggle_watchlist("m1").await, Some(false));
        assert!(!store.is_in_watchlist("m1").await);

        assert_eq!(store.toggle_favorite("m2").await, Some(true));
        assert!(store.is_favorite("m2").await);
    }

    #[tokio::test]
    async fn signed_out_mutations_are_no_ops() {
        let store = store_with_session(None).await;

        store.add_to_watchlist("m1").await;
        store.add_to_favorites("m1").await;
        assert_eq!(store.toggle_watchlist("m1").await, None);
        assert!(!store.follow("3").await);

        assert!(store.watchlist().await.is_empty());
        assert!(store.favorites().await.is_empty());
        assert!(store.following().await.is_empty());
    }

    #[tokio::test]
    async fn self_follow_is_refused() {
        let store = store_with_session(Some("2")).await;

        assert!(!store.follow("2").await);
        assert!(store.following().await.is_empty());

        assert!(store.follow("3").await);
        assert!(store.is_following("3").await);
        store.unfollow("3").await;
        assert!(!store.is_following("3").await);
    }

    #[tokio::test]
    async fn update_profile_touches_account_session_and_storage() {
        let store = store_with_session(Some("2")).await;

        let patch = ProfilePatch {
            bio: Some("Cinephile".to_string()),
            location: Some("Lagos".to_string()),
            ..Default::default()
        };
        let updated = store.update_profile(patch).await.unwrap().unwrap();
        assert_eq!(updated.bio.as_deref(), Some("Cinephile"));

        let account = store.accounts.find_by_id("2").await.unwrap();
        assert_eq!(account.bio.as_deref(), Some("Cinephile"));

        let in_session = store.session.user().await.unwrap();
        assert_eq!(in_session.location.as_deref(), Some("Lagos"));

        let stored = store.storage.get(keys::USER_DATA).await.unwrap().unwrap();
        assert!(stored.contains("Cinephile"));
    }

    #[tokio::test]
    async fn stats_aggregate_own_reviews() {
        let store = store_with_session(Some("2")).await;
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

        let author = crate::reviews::AuthorSnapshot {
            user_id: "2".to_string(),
            name: "Funmi".to_string(),
            avatar: None,
            role: Role::User,
            verified_critic: false,
        };
        for (work, rating) in [("m1", 8.0), ("m2", 6.0), ("m1", 7.0)] {
            store
                .reviews
                .add_review(
                    crate::reviews::ReviewDraft {
                        work_id: work.to_string(),
                        author: author.clone(),
                        rating,
                        aspects: Default::default(),
                        title: String::new(),
                        content: String::new(),
                        tags: vec![],
                        spoiler: false,
                        language: "en".to_string(),
                    },
                    now,
                )
                .await;
        }

        let stats = store.stats().await;
        assert_eq!(stats.total_reviews, 3);
        assert_eq!(stats.works_reviewed, 2);
        assert!((stats.average_rating - 7.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn clear_drops_everything() {
        let store = store_with_session(Some("2")).await;
        store.add_to_watchlist("m1").await;
        store.add_to_favorites("m2").await;
        store.follow("3").await;

        store.clear().await;
        assert!(store.watchlist().await.is_empty());
        assert!(store.favorites().await.is_empty());
        assert!(store.following().await.is_empty());
    }
}
