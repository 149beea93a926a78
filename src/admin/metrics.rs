/// Dashboard metrics snapshot
use serde::{Deserialize, Serialize};

/// Point-in-time totals for the admin dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub total_users: u64,
    pub active_users: u64,
    pub total_reviews: u64,
    pub total_works: u64,
    pub flagged_content: u64,
    pub pending_reports: u64,
}
