/// Sessions and mock tokens
///
/// A session is derived state: the account projection plus an opaque access
/// token and refresh token. Mock access tokens embed the account id and the
/// issuance time so restore-on-startup can expire them without a backend.
use crate::authz::Role;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

const TOKEN_PREFIX: &str = "mock_jwt_";

/// Account projection carried by a session and persisted as `user_data`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub join_date: NaiveDate,
    pub avatar: Option<String>,
    pub role: Role,
}

/// An authenticated session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: UserProfile,
    pub access_token: String,
    pub refresh_token: String,
}

/// Claims recovered from a mock access token
#[derive(Debug, Clone, PartialEq)]
pub struct TokenClaims {
    pub account_id: String,
    pub issued_at: DateTime<Utc>,
}

/// Mint a mock access token: `mock_jwt_<accountId>_<issuedAtMillis>`
pub fn mint_access_token(account_id: &str, issued_at: DateTime<Utc>) -> String {
    format!(
        "{}{}_{}",
        TOKEN_PREFIX,
        account_id,
        issued_at.timestamp_millis()
    )
}

/// Mint an opaque refresh token
pub fn mint_refresh_token() -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();

    let body: String = (0..32)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect();

    format!("mock_refresh_{}", body)
}

/// Parse a mock access token back into its claims.
/// Returns `None` for anything that does not have the expected shape.
pub fn parse_access_token(token: &str) -> Option<TokenClaims> {
    let rest = token.strip_prefix(TOKEN_PREFIX)?;
    let (account_id, millis) = rest.rsplit_once('_')?;

    if account_id.is_empty() {
        return None;
    }

    let millis: i64 = millis.parse().ok()?;
    let issued_at = Utc.timestamp_millis_opt(millis).single()?;

    Some(TokenClaims {
        account_id: account_id.to_string(),
        issued_at,
    })
}

/// Shared slot holding the current session
///
/// Owned by the application context and read by the profile, review, and
/// admin layers. There is one logical thread of control, so readers never
/// observe a half-updated session.
#[derive(Debug, Default)]
pub struct SessionState {
    current: RwLock<Option<Session>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> Option<Session> {
        self.current.read().await.clone()
    }

    pub async fn user(&self) -> Option<UserProfile> {
        self.current.read().await.as_ref().map(|s| s.user.clone())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.current.read().await.is_some()
    }

    pub async fn set(&self, session: Session) {
        *self.current.write().await = Some(session);
    }

    pub async fn update_user(&self, user: UserProfile) {
        if let Some(session) = self.current.write().await.as_mut() {
            session.user = user;
        }
    }

    pub async fn clear(&self) {
        *self.current.write().await = None;
    }
}
