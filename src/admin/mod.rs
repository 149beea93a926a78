/// Admin and moderation layer
///
/// Orchestrates user administration, review moderation, and report handling
/// over the in-memory state. Every operation takes its caller from the live
/// session and checks the role predicates before touching anything;
/// failures are authorization errors, never silent no-ops.
mod metrics;
mod moderation;
mod reports;
mod users;

pub use metrics::DashboardMetrics;
pub use moderation::{ModerationAction, ModerationLog, ModerationRecord};
pub use reports::{Report, ReportQueue, ReportStatus, ReportSubject};
pub use users::{AuditEntry, AuditLog};

use crate::api::ApiClient;
use crate::auth::{AccountTable, SessionState, UserProfile};
use crate::authz::{self, Role};
use crate::catalog::Catalog;
use crate::clock::Clock;
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::reviews::ReviewEngine;
use std::sync::Arc;

/// Admin operations, gated by the caller's session
pub struct AdminPanel {
    config: Arc<AppConfig>,
    clock: Arc<dyn Clock>,
    session: Arc<SessionState>,
    accounts: Arc<AccountTable>,
    reviews: Arc<ReviewEngine>,
    catalog: Arc<Catalog>,
    api: Arc<ApiClient>,
    audit: AuditLog,
    moderation: ModerationLog,
    reports: ReportQueue,
}

impl AdminPanel {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<AppConfig>,
        clock: Arc<dyn Clock>,
        session: Arc<SessionState>,
        accounts: Arc<AccountTable>,
        reviews: Arc<ReviewEngine>,
        catalog: Arc<Catalog>,
        api: Arc<ApiClient>,
    ) -> Self {
        Self {
            config,
            clock,
            session,
            accounts,
            reviews,
            catalog,
            api,
            audit: AuditLog::new(),
            moderation: ModerationLog::new(),
            reports: ReportQueue::new(),
        }
    }

    /// Resolve the caller and check a role predicate
    async fn require(
        &self,
        check: fn(Option<&UserProfile>) -> bool,
        operation: &str,
    ) -> AppResult<UserProfile> {
        let user = self.session.user().await;
        if check(user.as_ref()) {
            // The predicate only passes for authenticated users
            user.ok_or_else(|| AppError::Authorization(format!("{} requires a session", operation)))
        } else {
            tracing::warn!(operation = %operation, "Admin operation refused");
            Err(AppError::Authorization(format!(
                "Not permitted to {}",
                operation
            )))
        }
    }

    // --- Dashboard ---

    /// Metrics snapshot. API-backed when not in mock mode, falling back to
    /// locally computed totals on any failure.
    pub async fn metrics(&self) -> AppResult<DashboardMetrics> {
        self.require(authz::can_access_admin, "view the admin dashboard")
            .await?;

        if !self.config.api.mock_mode {
            match self.api.admin_metrics().await {
                Ok(metrics) => return Ok(metrics),
                Err(e) => {
                    tracing::warn!("Remote metrics unavailable, computing locally: {}", e);
                }
            }
        }

        Ok(DashboardMetrics {
            total_users: self.accounts.count().await as u64,
            active_users: self.accounts.count_active().await as u64,
            total_reviews: self.reviews.count().await as u64,
            total_works: self.catalog.len().await as u64,
            flagged_content: self.moderation.flagged_count().await as u64,
            pending_reports: self.reports.pending_count().await as u64,
        })
    }

    // --- User administration ---

    pub async fn list_users(&self) -> AppResult<Vec<UserProfile>> {
        self.require(authz::can_manage_users, "list users").await?;
        let accounts = self.accounts.list().await;
        Ok(accounts.iter().map(|a| a.profile()).collect())
    }

    pub async fn assign_role(&self, user_id: &str, role: Role) -> AppResult<()> {
        let actor = self.require(authz::can_assign_roles, "assign roles").await?;

        if !self.accounts.set_role(user_id, role).await {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }

        self.audit
            .append(
                &actor.id,
                "assign_role",
                user_id,
                Some(role.as_str().to_string()),
                self.clock.now(),
            )
            .await;
        Ok(())
    }

    pub async fn suspend_user(&self, user_id: &str) -> AppResult<()> {
        self.set_user_active(user_id, false, "suspend_user").await
    }

    pub async fn reactivate_user(&self, user_id: &str) -> AppResult<()> {
        self.set_user_active(user_id, true, "reactivate_user").await
    }

    async fn set_user_active(&self, user_id: &str, active: bool, action: &str) -> AppResult<()> {
        let actor = self.require(authz::can_manage_users, "manage users").await?;

        if actor.id == user_id {
            return Err(AppError::Conflict(
                "Cannot change your own account status".to_string(),
            ));
        }
        if !self.accounts.set_active(user_id, active).await {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }

        self.audit
            .append(&actor.id, action, user_id, None, self.clock.now())
            .await;
        Ok(())
    }

    pub async fn audit_log(&self) -> AppResult<Vec<AuditEntry>> {
        self.require(authz::can_manage_users, "read the audit log")
            .await?;
        Ok(self.audit.entries().await)
    }

    // --- Review moderation ---

    /// Apply a moderation action to a review. Rejection deletes the review
    /// through the engine's own delete path.
    pub async fn moderate_review(
        &self,
        review_id: &str,
        action: ModerationAction,
        reason: Option<String>,
        notes: Option<String>,
    ) -> AppResult<()> {
        let actor = self
            .require(authz::can_moderate_content, "moderate reviews")
            .await?;

        if self.reviews.get(review_id).await.is_none() {
            return Err(AppError::NotFound(format!(
                "Review {} not found",
                review_id
            )));
        }

        if action == ModerationAction::Reject && !self.reviews.delete_review(review_id).await {
            return Err(AppError::Internal(format!(
                "Review {} vanished mid-moderation",
                review_id
            )));
        }

        self.moderation
            .record(ModerationRecord {
                moderator_id: actor.id,
                review_id: review_id.to_string(),
                action,
                reason,
                notes,
                timestamp: self.clock.now(),
            })
            .await;
        Ok(())
    }

    pub async fn is_review_flagged(&self, review_id: &str) -> bool {
        self.moderation.is_flagged(review_id).await
    }

    pub async fn moderation_history(&self, review_id: &str) -> AppResult<Vec<ModerationRecord>> {
        self.require(authz::can_moderate_content, "read moderation history")
            .await?;
        Ok(self.moderation.history_for(review_id).await)
    }

    // --- Reports ---

    /// File a report. Any signed-in user may report.
    pub async fn submit_report(
        &self,
        subject: ReportSubject,
        reason: &str,
    ) -> AppResult<Report> {
        let reporter = self
            .session
            .user()
            .await
            .ok_or_else(|| AppError::Authorization("Reporting requires a session".to_string()))?;

        Ok(self
            .reports
            .submit(&reporter.id, subject, reason, self.clock.now())
            .await)
    }

    pub async fn update_report(
        &self,
        report_id: &str,
        status: ReportStatus,
    ) -> AppResult<Report> {
        let actor = self
            .require(authz::can_moderate_content, "handle reports")
            .await?;
        self.reports
            .update_status(report_id, status, &actor.id, self.clock.now())
            .await
    }

    pub async fn list_reports(&self) -> AppResult<Vec<Report>> {
        self.require(authz::can_moderate_content, "list reports")
            .await?;
        Ok(self.reports.list().await)
    }

    pub async fn reports_by_status(&self, status: ReportStatus) -> AppResult<Vec<Report>> {
        self.require(authz::can_moderate_content, "list reports")
            .await?;
        Ok(self.reports.by_status(status).await)
    }
}
