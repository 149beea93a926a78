/// LemonPie client state engine
///
/// The state layer of a Nollywood film and series review platform: mock
/// authentication with rate limiting and lockout, role-based authorization,
/// a review voting engine, watchlist and follow-graph state, a catalog with
/// lemon-pie rating bands, user preferences, an admin and moderation layer,
/// durable key-value storage, and a thin REST client for the real backend.
///
/// Everything hangs off [`AppContext`]; see `AppContext::mock()` for the
/// hermetic test wiring with a manual clock.
pub mod admin;
pub mod api;
pub mod auth;
pub mod authz;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod prefs;
pub mod profile;
pub mod reviews;
pub mod storage;

pub use config::AppConfig;
pub use context::AppContext;
pub use error::{AppError, AppResult};
