/// Mock credential store
///
/// A static table of test accounts with lockout bookkeeping. Passwords are
/// stored and compared in plaintext because this is a test fixture standing
/// in for a backend - a real implementation must replace this with salted
/// hashing.
use crate::auth::UserProfile;
use crate::authz::Role;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

/// A mock account record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub join_date: NaiveDate,
    pub avatar: Option<String>,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    /// Consecutive failed password attempts since the last success
    pub failed_attempts: u32,
    /// When set and in the future, the account is locked out
    pub locked_until: Option<DateTime<Utc>>,
    pub role: Role,
}

impl Account {
    /// Project the account into the shape carried by sessions
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            bio: self.bio.clone(),
            location: self.location.clone(),
            join_date: self.join_date,
            avatar: self.avatar.clone(),
            role: self.role,
        }
    }
}

/// In-memory account table
#[derive(Debug, Default)]
pub struct AccountTable {
    accounts: RwLock<Vec<Account>>,
}

impl AccountTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table pre-populated with the standard test accounts
    pub fn seeded() -> Self {
        Self {
            accounts: RwLock::new(seed_accounts()),
        }
    }

    /// Case-insensitive email lookup
    pub async fn find_by_email(&self, email: &str) -> Option<Account> {
        let needle = email.to_lowercase();
        self.accounts
            .read()
            .await
            .iter()
            .find(|a| a.email.to_lowercase() == needle)
            .cloned()
    }

    pub async fn find_by_id(&self, id: &str) -> Option<Account> {
        self.accounts
            .read()
            .await
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }

    pub async fn email_exists(&self, email: &str) -> bool {
        self.find_by_email(email).await.is_some()
    }

    /// Record a password failure against the account. When the consecutive
    /// counter reaches `max_attempts` the lockout expiry is set. Returns the
    /// updated counter and the lockout expiry if one was just applied.
    pub async fn record_password_failure(
        &self,
        id: &str,
        now: DateTime<Utc>,
        max_attempts: u32,
        lockout: chrono::Duration,
    ) -> Option<(u32, Option<DateTime<Utc>>)> {
        let mut accounts = self.accounts.write().await;
        let account = accounts.iter_mut().find(|a| a.id == id)?;

        account.failed_attempts += 1;
        if account.failed_attempts >= max_attempts {
            account.locked_until = Some(now + lockout);
        }

        Some((account.failed_attempts, account.locked_until))
    }

    /// Successful login: reset the failure counter, clear any lockout, and
    /// stamp the last-login time. These happen together, never separately.
    pub async fn record_successful_login(&self, id: &str, now: DateTime<Utc>) -> Option<Account> {
        let mut accounts = self.accounts.write().await;
        let account = accounts.iter_mut().find(|a| a.id == id)?;

        account.failed_attempts = 0;
        account.locked_until = None;
        account.last_login = Some(now);

        Some(account.clone())
    }

    /// Register a new account with the default role
    pub async fn insert(
        &self,
        name: &str,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Account {
        let account = Account {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            bio: None,
            location: None,
            join_date: now.date_naive(),
            avatar: None,
            is_active: true,
            last_login: None,
            failed_attempts: 0,
            locked_until: None,
            role: Role::User,
        };

        self.accounts.write().await.push(account.clone());
        account
    }

    pub async fn update_profile_fields(
        &self,
        id: &str,
        name: Option<&str>,
        bio: Option<&str>,
        location: Option<&str>,
        avatar: Option<&str>,
    ) -> Option<Account> {
        let mut accounts = self.accounts.write().await;
        let account = accounts.iter_mut().find(|a| a.id == id)?;

        if let Some(name) = name {
            account.name = name.to_string();
        }
        if let Some(bio) = bio {
            account.bio = Some(bio.to_string());
        }
        if let Some(location) = location {
            account.location = Some(location.to_string());
        }
        if let Some(avatar) = avatar {
            account.avatar = Some(avatar.to_string());
        }

        Some(account.clone())
    }

    pub async fn set_role(&self, id: &str, role: Role) -> bool {
        let mut accounts = self.accounts.write().await;
        match accounts.iter_mut().find(|a| a.id == id) {
            Some(account) => {
                account.role = role;
                true
            }
            None => false,
        }
    }

    pub async fn set_active(&self, id: &str, active: bool) -> bool {
        let mut accounts = self.accounts.write().await;
        match accounts.iter_mut().find(|a| a.id == id) {
            Some(account) => {
                account.is_active = active;
                true
            }
            None => false,
        }
    }

    pub async fn list(&self) -> Vec<Account> {
        self.accounts.read().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn count_active(&self) -> usize {
        self.accounts
            .read()
            .await
            .iter()
            .filter(|a| a.is_active)
            .count()
    }
}

/// The standard mock accounts: an admin, a regular user, a moderator, a
/// locked account, and a deactivated account.
fn seed_accounts() -> Vec<Account> {
    let join = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();

    vec![
        Account {
            id: "1".to_string(),
            name: "Adebayo Johnson".to_string(),
            email: "admin@admin.com".to_string(),
            password: "admin123".to_string(),
            bio: Some("Passionate Nollywood enthusiast and film critic".to_string()),
            location: Some("Lagos, Nigeria".to_string()),
            join_date: join(2023, 1, 15),
            avatar: Some("https://avatars.lemonpie.ng/adebayo.png".to_string()),
            is_active: true,
            last_login: None,
            failed_attempts: 0,
            locked_until: None,
            role: Role::Admin,
        },
        Account {
            id: "2".to_string(),
            name: "Funmi Adebayo".to_string(),
            email: "user@test.com".to_string(),
            password: "password123".to_string(),
            bio: Some("Movie lover and weekend binge-watcher".to_string()),
            location: Some("Abuja, Nigeria".to_string()),
            join_date: join(2023, 3, 20),
            avatar: Some("https://avatars.lemonpie.ng/funmi.png".to_string()),
            is_active: true,
            last_login: None,
            failed_attempts: 0,
            locked_until: None,
            role: Role::User,
        },
        Account {
            id: "3".to_string(),
            name: "Kemi Okafor".to_string(),
            email: "moderator@test.com".to_string(),
            password: "mod123456".to_string(),
            bio: Some("Community moderator and film enthusiast".to_string()),
            location: Some("Port Harcourt, Nigeria".to_string()),
            join_date: join(2023, 2, 10),
            avatar: Some("https://avatars.lemonpie.ng/kemi.png".to_string()),
            is_active: true,
            last_login: None,
            failed_attempts: 0,
            locked_until: None,
            role: Role::Moderator,
        },
        Account {
            id: "4".to_string(),
            name: "Locked User".to_string(),
            email: "locked@test.com".to_string(),
            password: "locked123".to_string(),
            bio: Some("Account locked due to multiple failed attempts".to_string()),
            location: Some("Kano, Nigeria".to_string()),
            join_date: join(2023, 4, 1),
            avatar: None,
            is_active: false,
            last_login: None,
            failed_attempts: 5,
            locked_until: None,
            role: Role::User,
        },
        Account {
            id: "5".to_string(),
            name: "Inactive User".to_string(),
            email: "inactive@test.com".to_string(),
            password: "inactive123".to_string(),
            bio: Some("Deactivated account for testing".to_string()),
            location: Some("Ibadan, Nigeria".to_string()),
            join_date: join(2023, 1, 1),
            avatar: None,
            is_active: false,
            last_login: None,
            failed_attempts: 0,
            locked_until: None,
            role: Role::User,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[tokio::test]
    async fn email_lookup_is_case_insensitive() {
        let table = AccountTable::seeded();
        let account = table.find_by_email("ADMIN@Admin.Com").await.unwrap();
        assert_eq!(account.id, "1");
        assert_eq!(account.role, Role::Admin);
    }

    #[tokio::test]
    async fn success_resets_counter_and_lockout() {
        let table = AccountTable::seeded();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

        for _ in 0..3 {
            table
                .record_password_failure("2", now, 5, Duration::minutes(15))
                .await
                .unwrap();
        }
        let account = table.find_by_id("2").await.unwrap();
        assert_eq!(account.failed_attempts, 3);

        let account = table.record_successful_login("2", now).await.unwrap();
        assert_eq!(account.failed_attempts, 0);
        assert!(account.locked_until.is_none());
        assert_eq!(account.last_login, Some(now));
    }

    #[tokio::test]
    async fn lockout_applied_at_threshold() {
        let table = AccountTable::seeded();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

        for i in 1..=5u32 {
            let (count, locked) = table
                .record_password_failure("2", now, 5, Duration::minutes(15))
                .await
                .unwrap();
            assert_eq!(count, i);
            if i < 5 {
                assert!(locked.is_none());
            } else {
                assert_eq!(locked, Some(now + Duration::minutes(15)));
            }
        }
    }
}
