/// User-submitted reports and their resolution lifecycle
///
/// Reports move pending -> investigating -> resolved | dismissed. A report
/// can also be resolved or dismissed straight from pending; nothing ever
/// moves backwards or out of a terminal state.
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

/// What a report is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ReportSubject {
    User(String),
    Review(String),
}

/// Report lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Investigating,
    Resolved,
    Dismissed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Investigating => "investigating",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Dismissed => "dismissed",
        }
    }

    pub fn from_str(s: &str) -> AppResult<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ReportStatus::Pending),
            "investigating" => Ok(ReportStatus::Investigating),
            "resolved" => Ok(ReportStatus::Resolved),
            "dismissed" => Ok(ReportStatus::Dismissed),
            _ => Err(AppError::Validation(format!("Invalid report status: {}", s))),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ReportStatus::Resolved | ReportStatus::Dismissed)
    }

    fn can_transition_to(&self, next: ReportStatus) -> bool {
        match self {
            ReportStatus::Pending => next != ReportStatus::Pending,
            ReportStatus::Investigating => next.is_terminal(),
            ReportStatus::Resolved | ReportStatus::Dismissed => false,
        }
    }
}

/// A submitted report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub reporter_id: String,
    pub subject: ReportSubject,
    pub reason: String,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

/// In-memory report queue
#[derive(Debug, Default)]
pub struct ReportQueue {
    reports: RwLock<Vec<Report>>,
}

impl ReportQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// File a new report; it starts out pending
    pub async fn submit(
        &self,
        reporter_id: &str,
        subject: ReportSubject,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Report {
        let report = Report {
            id: Uuid::new_v4().to_string(),
            reporter_id: reporter_id.to_string(),
            subject,
            reason: reason.to_string(),
            status: ReportStatus::Pending,
            created_at: now,
            resolved_by: None,
            resolved_at: None,
        };

        self.reports.write().await.push(report.clone());
        tracing::info!(report_id = %report.id, reporter = %reporter_id, "Report submitted");
        report
    }

    /// Move a report to a new status, stamping the resolver on terminal
    /// transitions. Invalid transitions and unknown ids are conflicts.
    pub async fn update_status(
        &self,
        report_id: &str,
        next: ReportStatus,
        resolver_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Report> {
        let mut reports = self.reports.write().await;
        let report = reports
            .iter_mut()
            .find(|r| r.id == report_id)
            .ok_or_else(|| AppError::NotFound(format!("Report {} not found", report_id)))?;

        if !report.status.can_transition_to(next) {
            return Err(AppError::Conflict(format!(
                "Cannot move report from {} to {}",
                report.status.as_str(),
                next.as_str()
            )));
        }

        report.status = next;
        if next.is_terminal() {
            report.resolved_by = Some(resolver_id.to_string());
            report.resolved_at = Some(now);
        }

        Ok(report.clone())
    }

    pub async fn get(&self, report_id: &str) -> Option<Report> {
        self.reports
            .read()
            .await
            .iter()
            .find(|r| r.id == report_id)
            .cloned()
    }

    pub async fn list(&self) -> Vec<Report> {
        self.reports.read().await.clone()
    }

    pub async fn by_status(&self, status: ReportStatus) -> Vec<Report> {
        self.reports
            .read()
            .await
            .iter()
            .filter(|r| r.status == status)
            .cloned()
            .collect()
    }

    pub async fn pending_count(&self) -> usize {
        self.by_status(ReportStatus::Pending).await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn full_lifecycle() {
        let queue = ReportQueue::new();
        let report = queue
            .submit("2", ReportSubject::Review("r1".to_string()), "Spam", now())
            .await;
        assert_eq!(report.status, ReportStatus::Pending);
        assert_eq!(queue.pending_count().await, 1);

        queue
            .update_status(&report.id, ReportStatus::Investigating, "3", now())
            .await
            .unwrap();

        let resolved = queue
            .update_status(&report.id, ReportStatus::Resolved, "3", now())
            .await
            .unwrap();
        assert_eq!(resolved.resolved_by.as_deref(), Some("3"));
        assert!(resolved.resolved_at.is_some());
        assert_eq!(queue.pending_count().await, 0);
    }

    #[tokio::test]
    async fn terminal_states_are_final() {
        let queue = ReportQueue::new();
        let report = queue
            .submit("2", ReportSubject::User("5".to_string()), "Abuse", now())
            .await;

        queue
            .update_status(&report.id, ReportStatus::Dismissed, "1", now())
            .await
            .unwrap();

        let err = queue
            .update_status(&report.id, ReportStatus::Investigating, "1", now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn pending_can_resolve_directly() {
        let queue = ReportQueue::new();
        let report = queue
            .submit("2", ReportSubject::Review("r1".to_string()), "Spam", now())
            .await;

        assert!(queue
            .update_status(&report.id, ReportStatus::Resolved, "1", now())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn unknown_report_is_not_found() {
        let queue = ReportQueue::new();
        let err = queue
            .update_status("missing", ReportStatus::Resolved, "1", now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
