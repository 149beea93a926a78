/// Review moderation log and flag state
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tokio::sync::RwLock;

/// What a moderator did to a review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationAction {
    Approve,
    Reject,
    Flag,
    Unflag,
}

impl ModerationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationAction::Approve => "approve",
            ModerationAction::Reject => "reject",
            ModerationAction::Flag => "flag",
            ModerationAction::Unflag => "unflag",
        }
    }

    pub fn from_str(s: &str) -> AppResult<Self> {
        match s.to_lowercase().as_str() {
            "approve" => Ok(ModerationAction::Approve),
            "reject" => Ok(ModerationAction::Reject),
            "flag" => Ok(ModerationAction::Flag),
            "unflag" => Ok(ModerationAction::Unflag),
            _ => Err(AppError::Validation(format!(
                "Invalid moderation action: {}",
                s
            ))),
        }
    }
}

/// One moderation decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationRecord {
    pub moderator_id: String,
    pub review_id: String,
    pub action: ModerationAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct ModerationState {
    records: Vec<ModerationRecord>,
    flagged: HashSet<String>,
}

/// Moderation history plus the set of currently flagged reviews
#[derive(Debug, Default)]
pub struct ModerationLog {
    state: RwLock<ModerationState>,
}

impl ModerationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a decision and update the flag set to match
    pub async fn record(&self, record: ModerationRecord) {
        let mut state = self.state.write().await;
        match record.action {
            ModerationAction::Flag => {
                state.flagged.insert(record.review_id.clone());
            }
            // Approving, rejecting, or unflagging all clear the flag
            ModerationAction::Unflag
            | ModerationAction::Approve
            | ModerationAction::Reject => {
                state.flagged.remove(&record.review_id);
            }
        }
        state.records.push(record);
    }

    pub async fn is_flagged(&self, review_id: &str) -> bool {
        self.state.read().await.flagged.contains(review_id)
    }

    pub async fn flagged_count(&self) -> usize {
        self.state.read().await.flagged.len()
    }

    pub async fn history(&self) -> Vec<ModerationRecord> {
        self.state.read().await.records.clone()
    }

    pub async fn history_for(&self, review_id: &str) -> Vec<ModerationRecord> {
        self.state
            .read()
            .await
            .records
            .iter()
            .filter(|r| r.review_id == review_id)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(review_id: &str, action: ModerationAction) -> ModerationRecord {
        ModerationRecord {
            moderator_id: "3".to_string(),
            review_id: review_id.to_string(),
            action,
            reason: None,
            notes: None,
            timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn flag_then_unflag() {
        let log = ModerationLog::new();

        log.record(record("r1", ModerationAction::Flag)).await;
        assert!(log.is_flagged("r1").await);
        assert_eq!(log.flagged_count().await, 1);

        log.record(record("r1", ModerationAction::Unflag)).await;
        assert!(!log.is_flagged("r1").await);
        assert_eq!(log.history_for("r1").await.len(), 2);
    }

    #[tokio::test]
    async fn approval_clears_the_flag() {
        let log = ModerationLog::new();

        log.record(record("r1", ModerationAction::Flag)).await;
        log.record(record("r1", ModerationAction::Approve)).await;
        assert!(!log.is_flagged("r1").await);
    }
}
