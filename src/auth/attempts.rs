/// Login attempt ledger and sliding-window rate limiter
///
/// The limiter is a pure read over the ledger: `check` never mutates. The
/// caller records the attempt after acting on the decision
/// (evaluate-then-record). That split only stays correct because there is a
/// single logical thread of control; a server-side port must wrap the
/// evaluate-then-record pair in a lock or CAS.
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// One login attempt, success or failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginAttempt {
    pub email: String,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub origin: Option<String>,
}

/// Outcome of a rate-limit check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    /// Too many recent attempts; retry once the earliest in-window attempt
    /// ages out
    Limited { retry_after: Duration },
}

/// Append-only attempt ledger with a sliding-window limiter
#[derive(Debug)]
pub struct AttemptLedger {
    window: Duration,
    max_attempts: usize,
    attempts: RwLock<Vec<LoginAttempt>>,
}

impl AttemptLedger {
    pub fn new(window: Duration, max_attempts: u32) -> Self {
        Self {
            window,
            max_attempts: max_attempts as usize,
            attempts: RwLock::new(Vec::new()),
        }
    }

    /// Decide whether a new attempt for `email` is allowed right now.
    /// Pure read - the current attempt is not counted and not recorded here.
    pub async fn check(&self, email: &str, now: DateTime<Utc>) -> RateDecision {
        let cutoff = now - self.window;
        let needle = email.to_lowercase();

        let attempts = self.attempts.read().await;
        let mut recent = attempts
            .iter()
            .filter(|a| a.timestamp >= cutoff && a.email.to_lowercase() == needle)
            .peekable();

        let earliest = match recent.peek() {
            Some(first) => first.timestamp,
            None => return RateDecision::Allowed,
        };

        if recent.count() >= self.max_attempts {
            // The window reopens when the earliest recent attempt expires
            let retry_after = earliest + self.window - now;
            RateDecision::Limited { retry_after }
        } else {
            RateDecision::Allowed
        }
    }

    /// Append an attempt. Entries older than the window are evicted on the
    /// way through; they can never influence a future decision, so dropping
    /// them does not change observable behavior.
    pub async fn record(
        &self,
        email: &str,
        success: bool,
        origin: Option<&str>,
        now: DateTime<Utc>,
    ) {
        let mut attempts = self.attempts.write().await;

        let cutoff = now - self.window;
        attempts.retain(|a| a.timestamp >= cutoff);

        attempts.push(LoginAttempt {
            email: email.to_string(),
            timestamp: now,
            success,
            origin: origin.map(String::from),
        });
    }

    /// Failed attempts for `email` within the window
    pub async fn recent_failures(&self, email: &str, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.window;
        let needle = email.to_lowercase();

        self.attempts
            .read()
            .await
            .iter()
            .filter(|a| !a.success && a.timestamp >= cutoff && a.email.to_lowercase() == needle)
            .count()
    }

    pub async fn len(&self) -> usize {
        self.attempts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.attempts.read().await.is_empty()
    }
}
