/// End-to-end auth flows against the hermetic context
use chrono::Duration;
use lemonpie::auth::{LoginErrorKind, RegisterInput};
use lemonpie::clock::Clock;
use lemonpie::clock::ManualClock;
use lemonpie::storage::keys;
use lemonpie::AppContext;
use std::sync::Arc;
use tokio_test::assert_ok;

/// Hermetic context with log capture wired up; run with RUST_LOG to see
/// the engine's tracing output during a failing test
fn mock_context() -> (AppContext, Arc<ManualClock>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    AppContext::mock()
}

#[tokio::test]
async fn admin_login_succeeds_and_persists_the_session() {
    let (context, _clock) = mock_context();

    let session = assert_ok!(context.auth.login("admin@admin.com", "admin123").await);
    assert_eq!(session.user.id, "1");
    assert_eq!(session.user.role, lemonpie::authz::Role::Admin);
    assert!(session.access_token.starts_with("mock_jwt_1_"));

    // Session is live and the triple is in storage
    assert!(context.session.is_authenticated().await);
    let token = context.storage.get(keys::AUTH_TOKEN).await.unwrap().unwrap();
    assert_eq!(token, session.access_token);
    assert!(context.storage.get(keys::USER_DATA).await.unwrap().is_some());
    assert!(context
        .storage
        .get(keys::REFRESH_TOKEN)
        .await
        .unwrap()
        .is_some());

    // Success resets the failure counter and stamps last-login
    let account = context.accounts.find_by_id("1").await.unwrap();
    assert_eq!(account.failed_attempts, 0);
    assert!(account.last_login.is_some());
}

#[tokio::test]
async fn email_lookup_is_case_insensitive_at_the_login_boundary() {
    let (context, _clock) = mock_context();
    let session = context.auth.login("ADMIN@Admin.Com", "admin123").await.unwrap();
    assert_eq!(session.user.id, "1");
}

#[tokio::test]
async fn missing_fields_and_bad_email_shape_fail_validation() {
    let (context, _clock) = mock_context();

    let err = context.auth.login("", "").await.unwrap_err();
    assert_eq!(err.kind, LoginErrorKind::ValidationError);
    assert_eq!(err.details.missing_fields, ["email", "password"]);

    let err = context.auth.login("not-an-email", "whatever").await.unwrap_err();
    assert_eq!(err.kind, LoginErrorKind::ValidationError);
    assert_eq!(err.details.missing_fields, ["email"]);
}

#[tokio::test]
async fn fifth_password_failure_locks_the_account() {
    let (context, clock) = mock_context();
    let lockout_starts = clock.now();

    for i in 1..=4u32 {
        let err = context.auth.login("user@test.com", "wrong").await.unwrap_err();
        assert_eq!(err.kind, LoginErrorKind::InvalidCredentials);
        assert_eq!(err.details.attempts_remaining, Some(5 - i));
    }

    // Fifth failure trips the lockout, measured from this attempt
    let err = context.auth.login("user@test.com", "wrong").await.unwrap_err();
    assert_eq!(err.kind, LoginErrorKind::AccountLocked);
    assert_eq!(
        err.details.unlock_time,
        Some(lockout_starts + Duration::minutes(15))
    );

    // Past the rate window but inside the lockout: the right password still
    // fails with AccountLocked
    clock.advance(Duration::minutes(6));
    let err = context
        .auth
        .login("user@test.com", "password123")
        .await
        .unwrap_err();
    assert_eq!(err.kind, LoginErrorKind::AccountLocked);

    // Once the lockout expires the account works again
    clock.advance(Duration::minutes(10));
    let session = context
        .auth
        .login("user@test.com", "password123")
        .await
        .unwrap();
    assert_eq!(session.user.id, "2");

    let account = context.accounts.find_by_id("2").await.unwrap();
    assert_eq!(account.failed_attempts, 0);
    assert!(account.locked_until.is_none());
}

#[tokio::test]
async fn sixth_attempt_in_the_window_is_rate_limited() {
    let (context, clock) = mock_context();

    for _ in 0..5 {
        let err = context
            .auth
            .login("unknown@nowhere.com", "guess")
            .await
            .unwrap_err();
        assert_eq!(err.kind, LoginErrorKind::InvalidCredentials);
    }

    let err = context
        .auth
        .login("unknown@nowhere.com", "guess")
        .await
        .unwrap_err();
    assert_eq!(err.kind, LoginErrorKind::TooManyAttempts);
    assert_eq!(err.details.retry_after_secs, Some(5 * 60));

    // After the window the same email is evaluated again
    clock.advance(Duration::minutes(6));
    let err = context
        .auth
        .login("unknown@nowhere.com", "guess")
        .await
        .unwrap_err();
    assert_eq!(err.kind, LoginErrorKind::InvalidCredentials);
}

#[tokio::test]
async fn unknown_email_never_touches_real_accounts() {
    let (context, _clock) = mock_context();

    let err = context
        .auth
        .login("unknown@nowhere.com", "guess")
        .await
        .unwrap_err();
    assert_eq!(err.kind, LoginErrorKind::InvalidCredentials);
    // No existence hint for unknown emails
    assert_eq!(err.details.attempts_remaining, None);

    for account in context.accounts.list().await {
        if account.id == "4" {
            // The seeded locked fixture keeps its counter
            assert_eq!(account.failed_attempts, 5);
        } else {
            assert_eq!(account.failed_attempts, 0);
        }
    }
}

#[tokio::test]
async fn deactivated_account_is_reported_inactive() {
    let (context, _clock) = mock_context();
    let err = context
        .auth
        .login("inactive@test.com", "inactive123")
        .await
        .unwrap_err();
    assert_eq!(err.kind, LoginErrorKind::AccountInactive);
}

#[tokio::test]
async fn session_restores_until_the_ttl_expires() {
    let (context, clock) = mock_context();
    context.auth.login("user@test.com", "password123").await.unwrap();

    // Simulate a page reload: live session gone, storage intact
    context.session.clear().await;
    let restored = context.auth.restore_session().await.unwrap();
    assert_eq!(restored.user.id, "2");
    assert!(context.session.is_authenticated().await);

    // Past the 24 hour TTL the stored session is discarded
    context.session.clear().await;
    clock.advance(Duration::hours(25));
    assert!(context.auth.restore_session().await.is_none());
    assert!(context.storage.get(keys::AUTH_TOKEN).await.unwrap().is_none());
}

#[tokio::test]
async fn garbage_in_storage_restores_to_logged_out() {
    let (context, _clock) = mock_context();

    context
        .storage
        .set(keys::AUTH_TOKEN, "definitely-not-a-token")
        .await
        .unwrap();
    assert!(context.auth.restore_session().await.is_none());
    assert!(context.storage.get(keys::AUTH_TOKEN).await.unwrap().is_none());
}

#[tokio::test]
async fn register_creates_a_signed_in_user_account() {
    let (context, _clock) = mock_context();

    let session = context
        .auth
        .register(RegisterInput {
            name: "Ngozi Eze".to_string(),
            email: "ngozi@example.com".to_string(),
            password: "secret99".to_string(),
            confirm_password: "secret99".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(session.user.role, lemonpie::authz::Role::User);
    assert!(context.session.is_authenticated().await);
    assert!(context.accounts.email_exists("ngozi@example.com").await);

    // Duplicate email is refused
    let err = context
        .auth
        .register(RegisterInput {
            name: "Imposter".to_string(),
            email: "ngozi@example.com".to_string(),
            password: "secret99".to_string(),
            confirm_password: "secret99".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind, LoginErrorKind::ValidationError);
}

#[tokio::test]
async fn register_validates_password_rules() {
    let (context, _clock) = mock_context();

    let err = context
        .auth
        .register(RegisterInput {
            name: "A".to_string(),
            email: "a@b.com".to_string(),
            password: "one".to_string(),
            confirm_password: "two".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind, LoginErrorKind::ValidationError);
    assert_eq!(err.details.missing_fields, ["confirm_password"]);

    let err = context
        .auth
        .register(RegisterInput {
            name: "A".to_string(),
            email: "a@b.com".to_string(),
            password: "tiny".to_string(),
            confirm_password: "tiny".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.details.missing_fields, ["password"]);
}

#[tokio::test]
async fn logout_clears_session_and_storage_but_keeps_prefs() {
    let (context, _clock) = mock_context();
    context.auth.login("user@test.com", "password123").await.unwrap();
    context
        .prefs
        .set_language(lemonpie::prefs::Language::Yoruba)
        .await
        .unwrap();

    context.logout().await;

    assert!(!context.session.is_authenticated().await);
    assert!(context.storage.get(keys::AUTH_TOKEN).await.unwrap().is_none());
    assert!(context.storage.get(keys::USER_DATA).await.unwrap().is_none());
    // Preferences are not session state
    assert_eq!(
        context.storage.get(keys::LANGUAGE).await.unwrap().as_deref(),
        Some("yo")
    );
}
