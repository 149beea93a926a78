/// Administrative audit log
///
/// Every user-administration action is appended here: who did it, what they
/// did, and to whom. The log is append-only; nothing ever edits or removes
/// an entry.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// One audited admin action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub actor_id: String,
    pub action: String,
    pub subject_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Append-only log of user-administration actions
#[derive(Debug, Default)]
pub struct AuditLog {
    entries: RwLock<Vec<AuditEntry>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append(
        &self,
        actor_id: &str,
        action: &str,
        subject_id: &str,
        detail: Option<String>,
        now: DateTime<Utc>,
    ) {
        tracing::info!(actor = %actor_id, action = %action, subject = %subject_id, "Admin action");
        self.entries.write().await.push(AuditEntry {
            actor_id: actor_id.to_string(),
            action: action.to_string(),
            subject_id: subject_id.to_string(),
            detail,
            timestamp: now,
        });
    }

    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }

    pub async fn for_subject(&self, subject_id: &str) -> Vec<AuditEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.subject_id == subject_id)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
