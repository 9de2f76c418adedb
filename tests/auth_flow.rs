mod util;

use async_trait::async_trait;
use autovault::commands::{self, NewUser};
use autovault::remote::AuthService;
use autovault::{AppError, AppResult, Store};
use std::sync::Mutex;

/// Records credential calls; rejects sign-in for unknown emails.
#[derive(Default)]
struct FakeAuth {
    registered: Mutex<Vec<String>>,
    resets: Mutex<Vec<String>>,
}

#[async_trait]
impl AuthService for FakeAuth {
    async fn sign_up(&self, email: &str, _password: &str) -> AppResult<()> {
        self.registered.lock().unwrap().push(email.to_string());
        Ok(())
    }

    async fn sign_in(&self, email: &str, _password: &str) -> AppResult<()> {
        if self.registered.lock().unwrap().iter().any(|e| e == email) {
            Ok(())
        } else {
            Err(AppError::new("AUTH/INVALID", "Invalid credentials"))
        }
    }

    async fn send_password_reset(&self, email: &str) -> AppResult<()> {
        self.resets.lock().unwrap().push(email.to_string());
        Ok(())
    }

    async fn confirm_password_reset(&self, _token: &str, _new_password: &str) -> AppResult<()> {
        Ok(())
    }
}

#[tokio::test]
async fn register_then_login() {
    let pool = util::memory_pool().await;
    let store = Store::new(pool);
    let auth = FakeAuth::default();

    let user = commands::register_user(
        &store,
        &auth,
        NewUser {
            email: "driver@example.com".into(),
            password: "correct horse".into(),
            first_name: Some("Avery".into()),
            last_name: None,
        },
    )
    .await
    .unwrap();
    assert!(!user.blocked);
    assert_eq!(auth.registered.lock().unwrap().len(), 1);

    let logged_in = commands::login(&store, &auth, "driver@example.com", "correct horse")
        .await
        .unwrap();
    assert_eq!(logged_in.id, user.id);
}

#[tokio::test]
async fn duplicate_email_is_rejected_before_signup() {
    let pool = util::memory_pool().await;
    util::seed_user(&pool, "taken@example.com", "user").await;
    let store = Store::new(pool);
    let auth = FakeAuth::default();

    let err = commands::register_user(
        &store,
        &auth,
        NewUser {
            email: "taken@example.com".into(),
            password: "longenough".into(),
            first_name: None,
            last_name: None,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), "VALIDATION/EMAIL_TAKEN");
    assert!(auth.registered.lock().unwrap().is_empty());
}

#[tokio::test]
async fn weak_credentials_never_reach_the_provider() {
    let pool = util::memory_pool().await;
    let store = Store::new(pool);
    let auth = FakeAuth::default();

    let err = commands::register_user(
        &store,
        &auth,
        NewUser {
            email: "no-at-sign".into(),
            password: "longenough".into(),
            ..NewUser::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), "VALIDATION/EMAIL");

    let err = commands::register_user(
        &store,
        &auth,
        NewUser {
            email: "short@example.com".into(),
            password: "short".into(),
            ..NewUser::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), "VALIDATION/PASSWORD");
    assert!(auth.registered.lock().unwrap().is_empty());
}

#[tokio::test]
async fn blocked_account_cannot_login() {
    let pool = util::memory_pool().await;
    let admin = util::seed_user(&pool, "admin@example.com", "admin").await;
    let store = Store::new(pool);
    let auth = FakeAuth::default();

    let user = commands::register_user(
        &store,
        &auth,
        NewUser {
            email: "banned@example.com".into(),
            password: "longenough".into(),
            ..NewUser::default()
        },
    )
    .await
    .unwrap();

    commands::set_user_blocked(&store, &admin, &user.id, true)
        .await
        .unwrap();

    let err = commands::login(&store, &auth, "banned@example.com", "longenough")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "AUTH/BLOCKED");

    // Unblocking restores access.
    commands::set_user_blocked(&store, &admin, &user.id, false)
        .await
        .unwrap();
    commands::login(&store, &auth, "banned@example.com", "longenough")
        .await
        .unwrap();
}

#[tokio::test]
async fn password_reset_goes_through_the_provider() {
    let auth = FakeAuth::default();

    commands::request_password_reset(&auth, "driver@example.com")
        .await
        .unwrap();
    assert_eq!(
        auth.resets.lock().unwrap().as_slice(),
        ["driver@example.com".to_string()]
    );

    let err = commands::confirm_password_reset(&auth, "", "longenough")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "VALIDATION/MISSING_FIELD");
    commands::confirm_password_reset(&auth, "token-1", "longenough")
        .await
        .unwrap();
}
