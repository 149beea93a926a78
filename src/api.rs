/// Backend REST client
///
/// Thin wrapper over `reqwest` for the LemonPie API. Every response is the
/// uniform `{ data } | { error, message }` envelope; any non-2xx status or
/// envelope error collapses into a single recoverable failure so callers can
/// fall back to local data without matching on status codes. The bearer
/// token is read from storage on every request, never cached here.
use crate::admin::DashboardMetrics;
use crate::auth::{Session, UserProfile};
use crate::catalog::Work;
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::reviews::Review;
use crate::storage::{keys, KeyValueStore};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// The backend's uniform response envelope
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    data: Option<T>,
    error: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

/// HTTP client for the LemonPie backend
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    storage: Arc<dyn KeyValueStore>,
}

impl ApiClient {
    pub fn new(config: Arc<AppConfig>, storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.api.request_timeout_secs),
            storage,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn bearer(&self) -> Option<String> {
        match self.storage.get(keys::AUTH_TOKEN).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("Failed to read auth token from storage: {}", e);
                None
            }
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        mut request: reqwest::RequestBuilder,
    ) -> AppResult<T> {
        if let Some(token) = self.bearer().await {
            request = request.bearer_auth(token);
        }

        let response = request.timeout(self.timeout).send().await?;
        let status = response.status();
        let envelope: ApiEnvelope<T> = response.json().await?;

        if let Some(error) = envelope.error {
            let message = envelope.message.unwrap_or(error);
            return Err(AppError::Api(message));
        }
        if !status.is_success() {
            return Err(AppError::Api(format!("Request failed with {}", status)));
        }

        envelope
            .data
            .ok_or_else(|| AppError::Api("Response envelope had no data".to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        self.send(self.client.get(self.url(path))).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> AppResult<T> {
        self.send(self.client.post(self.url(path)).json(body)).await
    }

    // --- Auth ---

    pub async fn login(&self, email: &str, password: &str) -> AppResult<Session> {
        self.post("/login", &LoginRequest { email, password }).await
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> AppResult<Session> {
        self.post(
            "/register",
            &RegisterRequest {
                name,
                email,
                password,
            },
        )
        .await
    }

    pub async fn logout(&self) -> AppResult<()> {
        // The envelope data for logout is an empty object
        let _: serde_json::Value = self.post("/logout", &json!({})).await?;
        Ok(())
    }

    pub async fn me(&self) -> AppResult<UserProfile> {
        self.get("/me").await
    }

    // --- Catalog ---

    pub async fn movies(&self) -> AppResult<Vec<Work>> {
        self.get("/movies").await
    }

    pub async fn movie(&self, id: &str) -> AppResult<Work> {
        self.get(&format!("/movies/{}", id)).await
    }

    pub async fn search_movies(&self, query: &str) -> AppResult<Vec<Work>> {
        let request = self
            .client
            .get(self.url("/movies/search"))
            .query(&[("q", query)]);
        self.send(request).await
    }

    pub async fn trending(&self) -> AppResult<Vec<Work>> {
        self.get("/movies/trending").await
    }

    pub async fn featured(&self) -> AppResult<Work> {
        self.get("/movies/featured").await
    }

    // --- Admin ---

    pub async fn admin_metrics(&self) -> AppResult<DashboardMetrics> {
        self.get("/admin/metrics").await
    }

    pub async fn admin_users(&self) -> AppResult<Vec<UserProfile>> {
        self.get("/admin/users").await
    }

    pub async fn admin_set_role(&self, user_id: &str, role: &str) -> AppResult<UserProfile> {
        self.post(
            &format!("/admin/users/{}/role", user_id),
            &json!({ "role": role }),
        )
        .await
    }

    pub async fn admin_set_active(&self, user_id: &str, active: bool) -> AppResult<UserProfile> {
        self.post(
            &format!("/admin/users/{}/status", user_id),
            &json!({ "active": active }),
        )
        .await
    }

    pub async fn admin_moderate_review(
        &self,
        review_id: &str,
        action: &str,
        reason: Option<&str>,
    ) -> AppResult<Review> {
        self.post(
            &format!("/admin/reviews/{}/moderate", review_id),
            &json!({ "action": action, "reason": reason }),
        )
        .await
    }

    pub async fn admin_resolve_report(
        &self,
        report_id: &str,
        status: &str,
    ) -> AppResult<serde_json::Value> {
        self.post(
            &format!("/admin/reports/{}/resolve", report_id),
            &json!({ "status": status }),
        )
        .await
    }
}
