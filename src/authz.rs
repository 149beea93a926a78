/// Role-based authorization
///
/// Flat capability model: every role enumerates its own permission list and
/// no role inherits from another. `admin` sees exactly what its list says,
/// which keeps the table auditable.
use crate::auth::UserProfile;
use crate::error::{AppError, AppResult};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// User roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Critic,
    Moderator,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Critic => "critic",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> AppResult<Self> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "critic" => Ok(Role::Critic),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            _ => Err(AppError::Validation(format!("Invalid role: {}", s))),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Critic => "Verified Critic",
            Role::Moderator => "Moderator",
            Role::Admin => "Administrator",
        }
    }
}

/// A single permission entry: an action on a resource, optionally narrowed
/// by key/value conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permission {
    pub action: &'static str,
    pub resource: &'static str,
    pub conditions: &'static [(&'static str, &'static str)],
}

const fn perm(action: &'static str, resource: &'static str) -> Permission {
    Permission {
        action,
        resource,
        conditions: &[],
    }
}

lazy_static! {
    /// Static capability table, one list per role
    pub static ref ROLE_PERMISSIONS: HashMap<Role, Vec<Permission>> = {
        let mut table = HashMap::new();
        table.insert(
            Role::Admin,
            vec![
                perm("read", "admin_dashboard"),
                perm("write", "admin_dashboard"),
                perm("read", "user_management"),
                perm("write", "user_management"),
                perm("read", "content_moderation"),
                perm("write", "content_moderation"),
                perm("read", "analytics"),
                perm("write", "system_settings"),
                perm("read", "all_reviews"),
                perm("write", "all_reviews"),
                perm("delete", "all_reviews"),
                perm("read", "user_profiles"),
                perm("write", "user_profiles"),
                perm("assign", "user_roles"),
                perm("verify", "critic_status"),
            ],
        );
        table.insert(
            Role::Moderator,
            vec![
                perm("read", "content_moderation"),
                perm("write", "content_moderation"),
                perm("read", "all_reviews"),
                perm("write", "all_reviews"),
                perm("delete", "inappropriate_content"),
                perm("read", "user_reports"),
                perm("write", "user_reports"),
            ],
        );
        table.insert(
            Role::Critic,
            vec![
                perm("read", "critic_dashboard"),
                perm("write", "verified_reviews"),
                perm("read", "advanced_analytics"),
                perm("write", "critic_insights"),
            ],
        );
        table.insert(
            Role::User,
            vec![
                perm("read", "public_content"),
                perm("write", "own_reviews"),
                perm("write", "own_profile"),
                perm("read", "own_profile"),
                perm("write", "watchlist"),
                perm("write", "favorites"),
            ],
        );
        table
    };
}

/// Whether a single permission entry grants `action` on `resource`.
///
/// `*` is a wildcard on either side. When the entry carries conditions and
/// the caller supplied some, every entry condition must be met (conjunction);
/// an entry with conditions still matches a caller that supplied none.
pub fn permission_matches(
    permission: &Permission,
    action: &str,
    resource: &str,
    conditions: Option<&HashMap<String, String>>,
) -> bool {
    let action_match = permission.action == action || permission.action == "*";
    let resource_match = permission.resource == resource || permission.resource == "*";

    if let (Some(supplied), false) = (conditions, permission.conditions.is_empty()) {
        let conditions_match = permission
            .conditions
            .iter()
            .all(|(key, value)| supplied.get(*key).map(String::as_str) == Some(*value));
        return action_match && resource_match && conditions_match;
    }

    action_match && resource_match
}

/// Exact role match; no session means no role
pub fn has_role(user: Option<&UserProfile>, role: Role) -> bool {
    user.map(|u| u.role == role).unwrap_or(false)
}

pub fn has_any_role(user: Option<&UserProfile>, roles: &[Role]) -> bool {
    roles.iter().any(|role| has_role(user, *role))
}

/// Whether the current user's role grants `action` on `resource`
pub fn has_permission(
    user: Option<&UserProfile>,
    action: &str,
    resource: &str,
    conditions: Option<&HashMap<String, String>>,
) -> bool {
    let Some(user) = user else {
        return false;
    };

    ROLE_PERMISSIONS
        .get(&user.role)
        .map(|permissions| {
            permissions
                .iter()
                .any(|p| permission_matches(p, action, resource, conditions))
        })
        .unwrap_or(false)
}

/// Ownership override: the author may edit their own review; moderators and
/// admins may edit any. Unauthenticated callers may edit nothing.
pub fn can_edit_review(user: Option<&UserProfile>, author_id: &str) -> bool {
    let Some(user) = user else {
        return false;
    };

    user.id == author_id || has_any_role(Some(user), &[Role::Admin, Role::Moderator])
}

pub fn can_delete_review(user: Option<&UserProfile>, author_id: &str) -> bool {
    let Some(user) = user else {
        return false;
    };

    user.id == author_id || has_any_role(Some(user), &[Role::Admin, Role::Moderator])
}

pub fn can_access_admin(user: Option<&UserProfile>) -> bool {
    has_role(user, Role::Admin)
}

pub fn can_moderate_content(user: Option<&UserProfile>) -> bool {
    has_any_role(user, &[Role::Admin, Role::Moderator])
}

pub fn can_manage_users(user: Option<&UserProfile>) -> bool {
    has_permission(user, "write", "user_management", None)
}

pub fn can_view_analytics(user: Option<&UserProfile>) -> bool {
    has_permission(user, "read", "analytics", None)
}

pub fn can_assign_roles(user: Option<&UserProfile>) -> bool {
    has_permission(user, "assign", "user_roles", None)
}

pub fn can_verify_critics(user: Option<&UserProfile>) -> bool {
    has_permission(user, "verify", "critic_status", None)
}

/// Permission list for the current user's role
pub fn available_permissions(user: Option<&UserProfile>) -> &'static [Permission] {
    user.and_then(|u| ROLE_PERMISSIONS.get(&u.role))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
