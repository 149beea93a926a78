/// Review aggregation and voting engine
///
/// Reviews carry a denormalized author snapshot so listings never need a
/// join back to the account table. Helpfulness voting is a per-voter ledger
/// with derived counters: the counters must always equal a fold over the
/// ledger, and every mutation recomputes the score from the counters.
use crate::authz::Role;
use crate::catalog::{RatingBand, SortOrder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A helpfulness vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    Helpful,
    Unhelpful,
}

/// Who wrote the review, frozen at creation time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorSnapshot {
    pub user_id: String,
    pub name: String,
    pub avatar: Option<String>,
    pub role: Role,
    pub verified_critic: bool,
}

/// Per-aspect ratings alongside the overall score. Cultural authenticity
/// and production quality are always scored; the rest are optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AspectRatings {
    pub cultural_authenticity: f32,
    pub production_quality: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acting: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cinematography: Option<f32>,
}

/// A published review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub work_id: String,
    pub author: AuthorSnapshot,
    /// Overall score in [1.0, 10.0]
    pub rating: f32,
    pub aspects: AspectRatings,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub spoiler: bool,
    pub language: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Voter id -> vote; one vote per voter
    pub votes: HashMap<String, VoteKind>,
    pub helpful_count: u32,
    pub unhelpful_count: u32,
    /// helpful_count - unhelpful_count, recomputed after every vote mutation
    pub helpfulness_score: i32,
}

impl Review {
    pub fn band(&self) -> RatingBand {
        RatingBand::of(self.rating)
    }

    /// Counters recomputed from the ledger; must match the stored counters
    pub fn fold_votes(&self) -> (u32, u32) {
        self.votes.values().fold((0, 0), |(h, u), vote| match vote {
            VoteKind::Helpful => (h + 1, u),
            VoteKind::Unhelpful => (h, u + 1),
        })
    }
}

/// Input for a new review; the engine assigns id, stamps, and vote state
#[derive(Debug, Clone)]
pub struct ReviewDraft {
    pub work_id: String,
    pub author: AuthorSnapshot,
    pub rating: f32,
    pub aspects: AspectRatings,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub spoiler: bool,
    pub language: String,
}

/// Field patch for an existing review; `None` leaves a field alone.
/// Votes are deliberately absent - edits never touch the ledger.
#[derive(Debug, Clone, Default)]
pub struct ReviewPatch {
    pub rating: Option<f32>,
    pub aspects: Option<AspectRatings>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub spoiler: Option<bool>,
    pub language: Option<String>,
}

/// Sort keys for review listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewSortKey {
    Date,
    Rating,
    Helpfulness,
}

struct EngineState {
    reviews: Vec<Review>,
    /// Work whose reviews are currently projected, if any
    open_work: Option<String>,
    /// Reviews for the open work; always recomputed by re-filtering
    current: Vec<Review>,
}

impl EngineState {
    fn reproject(&mut self) {
        self.current = match &self.open_work {
            Some(work_id) => self
                .reviews
                .iter()
                .filter(|r| &r.work_id == work_id)
                .cloned()
                .collect(),
            None => Vec::new(),
        };
    }
}

/// In-memory review store with a per-work projection
pub struct ReviewEngine {
    state: RwLock<EngineState>,
}

impl Default for ReviewEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewEngine {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(EngineState {
                reviews: Vec::new(),
                open_work: None,
                current: Vec::new(),
            }),
        }
    }

    /// Focus on one work; the current-reviews projection follows it
    pub async fn open_work(&self, work_id: &str) {
        let mut state = self.state.write().await;
        state.open_work = Some(work_id.to_string());
        state.reproject();
    }

    pub async fn close_work(&self) {
        let mut state = self.state.write().await;
        state.open_work = None;
        state.current.clear();
    }

    pub async fn current_reviews(&self) -> Vec<Review> {
        self.state.read().await.current.clone()
    }

    /// Publish a review. Returns the stored record with its assigned id.
    pub async fn add_review(&self, draft: ReviewDraft, now: DateTime<Utc>) -> Review {
        let review = Review {
            id: Uuid::new_v4().to_string(),
            work_id: draft.work_id,
            author: draft.author,
            rating: draft.rating,
            aspects: draft.aspects,
            title: draft.title,
            content: draft.content,
            tags: draft.tags,
            spoiler: draft.spoiler,
            language: draft.language,
            created_at: now,
            updated_at: None,
            votes: HashMap::new(),
            helpful_count: 0,
            unhelpful_count: 0,
            helpfulness_score: 0,
        };

        let mut state = self.state.write().await;
        state.reviews.push(review.clone());
        state.reproject();

        tracing::debug!(review_id = %review.id, work_id = %review.work_id, "Review published");
        review
    }

    /// Patch a review in place. Returns the updated record, or `None` for an
    /// unknown id. The vote ledger and counters are untouched.
    pub async fn update_review(
        &self,
        id: &str,
        patch: ReviewPatch,
        now: DateTime<Utc>,
    ) -> Option<Review> {
        let mut state = self.state.write().await;
        let review = state.reviews.iter_mut().find(|r| r.id == id)?;

        if let Some(rating) = patch.rating {
            review.rating = rating;
        }
        if let Some(aspects) = patch.aspects {
            review.aspects = aspects;
        }
        if let Some(title) = patch.title {
            review.title = title;
        }
        if let Some(content) = patch.content {
            review.content = content;
        }
        if let Some(tags) = patch.tags {
            review.tags = tags;
        }
        if let Some(spoiler) = patch.spoiler {
            review.spoiler = spoiler;
        }
        if let Some(language) = patch.language {
            review.language = language;
        }
        review.updated_at = Some(now);

        let updated = review.clone();
        state.reproject();
        Some(updated)
    }

    /// Remove a review. Returns whether anything was deleted.
    pub async fn delete_review(&self, id: &str) -> bool {
        let mut state = self.state.write().await;
        let before = state.reviews.len();
        state.reviews.retain(|r| r.id != id);
        let deleted = state.reviews.len() < before;

        if deleted {
            state.reproject();
            tracing::debug!(review_id = %id, "Review deleted");
        }
        deleted
    }

    /// Cast, toggle, or switch a helpfulness vote.
    ///
    /// Self-votes and unknown review ids are no-ops. Voting the same way
    /// twice retracts the vote; voting the other way switches it by
    /// decrementing the old counter and incrementing the new one. The
    /// counters are maintained incrementally; a fold over the ledger is the
    /// independent consistency oracle, never the update path.
    /// Returns the review after the call, or `None` for an unknown id.
    pub async fn vote_on_review(
        &self,
        review_id: &str,
        voter_id: &str,
        vote: VoteKind,
    ) -> Option<Review> {
        let mut state = self.state.write().await;
        let review = state.reviews.iter_mut().find(|r| r.id == review_id)?;

        if review.author.user_id == voter_id {
            tracing::debug!(review_id = %review_id, "Ignoring self-vote");
            return Some(review.clone());
        }

        let previous = review.votes.get(voter_id).copied();
        match previous {
            Some(existing) if existing == vote => {
                review.votes.remove(voter_id);
                decrement_counter(review, existing);
            }
            _ => {
                if let Some(existing) = previous {
                    decrement_counter(review, existing);
                }
                review.votes.insert(voter_id.to_string(), vote);
                increment_counter(review, vote);
            }
        }

        review.helpfulness_score =
            review.helpful_count as i32 - review.unhelpful_count as i32;

        let updated = review.clone();
        state.reproject();
        Some(updated)
    }

    pub async fn get(&self, id: &str) -> Option<Review> {
        self.state
            .read()
            .await
            .reviews
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    pub async fn all(&self) -> Vec<Review> {
        self.state.read().await.reviews.clone()
    }

    pub async fn for_work(&self, work_id: &str) -> Vec<Review> {
        self.state
            .read()
            .await
            .reviews
            .iter()
            .filter(|r| r.work_id == work_id)
            .cloned()
            .collect()
    }

    pub async fn by_author(&self, user_id: &str) -> Vec<Review> {
        self.state
            .read()
            .await
            .reviews
            .iter()
            .filter(|r| r.author.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn by_band(&self, work_id: &str, band: RatingBand) -> Vec<Review> {
        self.state
            .read()
            .await
            .reviews
            .iter()
            .filter(|r| r.work_id == work_id && r.band() == band)
            .cloned()
            .collect()
    }

    pub async fn sorted_for_work(
        &self,
        work_id: &str,
        key: ReviewSortKey,
        order: SortOrder,
    ) -> Vec<Review> {
        let mut reviews = self.for_work(work_id).await;
        sort_reviews(&mut reviews, key, order);
        reviews
    }

    pub async fn count(&self) -> usize {
        self.state.read().await.reviews.len()
    }
}

fn increment_counter(review: &mut Review, kind: VoteKind) {
    match kind {
        VoteKind::Helpful => review.helpful_count += 1,
        VoteKind::Unhelpful => review.unhelpful_count += 1,
    }
}

/// Only ever called for a vote that is present in the ledger, so the
/// counter cannot underflow
fn decrement_counter(review: &mut Review, kind: VoteKind) {
    match kind {
        VoteKind::Helpful => review.helpful_count -= 1,
        VoteKind::Unhelpful => review.unhelpful_count -= 1,
    }
}

/// Sort reviews in place
pub fn sort_reviews(reviews: &mut [Review], key: ReviewSortKey, order: SortOrder) {
    reviews.sort_by(|a, b| {
        let ordering = match key {
            ReviewSortKey::Date => a.created_at.cmp(&b.created_at),
            ReviewSortKey::Rating => a
                .rating
                .partial_cmp(&b.rating)
                .unwrap_or(Ordering::Equal),
            ReviewSortKey::Helpfulness => a.helpfulness_score.cmp(&b.helpfulness_score),
        };

        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn author(user_id: &str) -> AuthorSnapshot {
        AuthorSnapshot {
            user_id: user_id.to_string(),
            name: format!("User {}", user_id),
            avatar: None,
            role: Role::User,
            verified_critic: false,
        }
    }

    fn draft(work_id: &str, author_id: &str, rating: f32) -> ReviewDraft {
        ReviewDraft {
            work_id: work_id.to_string(),
            author: author(author_id),
            rating,
            aspects: AspectRatings::default(),
            title: "A review".to_string(),
            content: "Some thoughts.".to_string(),
            tags: vec![],
            spoiler: false,
            language: "en".to_string(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn assert_consistent(review: &Review) {
        let (helpful, unhelpful) = review.fold_votes();
        assert_eq!(review.helpful_count, helpful);
        assert_eq!(review.unhelpful_count, unhelpful);
        assert_eq!(
            review.helpfulness_score,
            helpful as i32 - unhelpful as i32
        );
    }

    #[tokio::test]
    async fn projection_follows_the_open_work() {
        let engine = ReviewEngine::new();
        engine.open_work("m1").await;

        engine.add_review(draft("m1", "2", 8.0), now()).await;
        engine.add_review(draft("m2", "2", 5.0), now()).await;
        engine.add_review(draft("m1", "3", 9.0), now()).await;

        let current = engine.current_reviews().await;
        assert_eq!(current.len(), 2);
        assert!(current.iter().all(|r| r.work_id == "m1"));

        engine.close_work().await;
        assert!(engine.current_reviews().await.is_empty());
    }

    #[tokio::test]
    async fn delete_recomputes_projection() {
        let engine = ReviewEngine::new();
        engine.open_work("m1").await;

        let review = engine.add_review(draft("m1", "2", 8.0), now()).await;
        engine.add_review(draft("m1", "3", 6.0), now()).await;
        assert_eq!(engine.current_reviews().await.len(), 2);

        assert!(engine.delete_review(&review.id).await);
        let current = engine.current_reviews().await;
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].author.user_id, "3");

        // Deleting again is a no-op
        assert!(!engine.delete_review(&review.id).await);
    }

    #[tokio::test]
    async fn vote_toggle_and_switch_keep_counters_consistent() {
        let engine = ReviewEngine::new();
        let review = engine.add_review(draft("m1", "2", 8.0), now()).await;

        // Cast
        let r = engine
            .vote_on_review(&review.id, "3", VoteKind::Helpful)
            .await
            .unwrap();
        assert_eq!((r.helpful_count, r.unhelpful_count), (1, 0));
        assert_eq!(r.helpfulness_score, 1);
        assert_consistent(&r);

        // Same vote again retracts
        let r = engine
            .vote_on_review(&review.id, "3", VoteKind::Helpful)
            .await
            .unwrap();
        assert_eq!((r.helpful_count, r.unhelpful_count), (0, 0));
        assert_eq!(r.helpfulness_score, 0);
        assert!(r.votes.is_empty());
        assert_consistent(&r);

        // Cast then switch
        engine
            .vote_on_review(&review.id, "3", VoteKind::Helpful)
            .await
            .unwrap();
        let r = engine
            .vote_on_review(&review.id, "3", VoteKind::Unhelpful)
            .await
            .unwrap();
        assert_eq!((r.helpful_count, r.unhelpful_count), (0, 1));
        assert_eq!(r.helpfulness_score, -1);
        assert_consistent(&r);
    }

    #[tokio::test]
    async fn self_vote_is_a_no_op() {
        let engine = ReviewEngine::new();
        let review = engine.add_review(draft("m1", "2", 8.0), now()).await;

        let r = engine
            .vote_on_review(&review.id, "2", VoteKind::Helpful)
            .await
            .unwrap();
        assert!(r.votes.is_empty());
        assert_eq!(r.helpfulness_score, 0);
    }

    #[tokio::test]
    async fn vote_on_unknown_review_returns_none() {
        let engine = ReviewEngine::new();
        assert!(engine
            .vote_on_review("missing", "3", VoteKind::Helpful)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn update_patches_fields_but_never_votes() {
        let engine = ReviewEngine::new();
        let review = engine.add_review(draft("m1", "2", 8.0), now()).await;
        engine
            .vote_on_review(&review.id, "3", VoteKind::Helpful)
            .await
            .unwrap();

        let later = now() + chrono::Duration::hours(1);
        let patch = ReviewPatch {
            rating: Some(6.5),
            content: Some("Revised thoughts.".to_string()),
            ..Default::default()
        };
        let updated = engine.update_review(&review.id, patch, later).await.unwrap();

        assert_eq!(updated.rating, 6.5);
        assert_eq!(updated.content, "Revised thoughts.");
        assert_eq!(updated.updated_at, Some(later));
        // Ledger survives the edit
        assert_eq!(updated.helpful_count, 1);
        assert_eq!(updated.votes.len(), 1);

        assert!(engine
            .update_review("missing", ReviewPatch::default(), later)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn aspect_ratings_are_carried_and_patchable() {
        let engine = ReviewEngine::new();

        let mut input = draft("m1", "2", 8.0);
        input.aspects = AspectRatings {
            cultural_authenticity: 9.0,
            production_quality: 7.5,
            story: Some(8.0),
            acting: None,
            cinematography: None,
        };
        let review = engine.add_review(input, now()).await;
        assert_eq!(review.aspects.cultural_authenticity, 9.0);
        assert_eq!(review.aspects.production_quality, 7.5);
        assert_eq!(review.aspects.story, Some(8.0));

        // Unset optional aspects stay out of the wire shape
        let json = serde_json::to_string(&review).unwrap();
        assert!(json.contains(r#""cultural_authenticity":9.0"#));
        assert!(!json.contains("acting"));

        let patch = ReviewPatch {
            aspects: Some(AspectRatings {
                cultural_authenticity: 8.0,
                production_quality: 8.0,
                ..review.aspects
            }),
            ..Default::default()
        };
        let updated = engine.update_review(&review.id, patch, now()).await.unwrap();
        assert_eq!(updated.aspects.cultural_authenticity, 8.0);
        assert_eq!(updated.aspects.production_quality, 8.0);
        assert_eq!(updated.aspects.story, Some(8.0));
    }

    #[tokio::test]
    async fn band_filter_and_sorts() {
        let engine = ReviewEngine::new();
        engine.add_review(draft("m1", "2", 8.2), now()).await;
        engine.add_review(draft("m1", "3", 3.0), now()).await;
        engine
            .add_review(draft("m1", "4", 5.5), now() + chrono::Duration::hours(1))
            .await;

        assert_eq!(engine.by_band("m1", RatingBand::Pie).await.len(), 1);
        assert_eq!(engine.by_band("m1", RatingBand::Lemon).await.len(), 1);
        assert_eq!(engine.by_band("m1", RatingBand::Neutral).await.len(), 1);

        let sorted = engine
            .sorted_for_work("m1", ReviewSortKey::Rating, SortOrder::default())
            .await;
        let ratings: Vec<f32> = sorted.iter().map(|r| r.rating).collect();
        assert_eq!(ratings, [3.0, 5.5, 8.2]);

        let newest_first = engine
            .sorted_for_work("m1", ReviewSortKey::Date, SortOrder::Descending)
            .await;
        assert_eq!(newest_first[0].author.user_id, "4");
    }
}
