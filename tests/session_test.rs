//! Session service tests: login, logout and revocation bookkeeping against
//! in-memory collaborators.

mod common;

use std::sync::Arc;

use blog_api::error::AppError;
use blog_api::services::SessionService;

use common::{
    test_codec, test_user, InMemoryRevocationStore, InMemoryUserStore, ADMIN_IDENTITY,
    ADMIN_PASSWORD,
};

fn session_with_stores() -> (SessionService, Arc<InMemoryRevocationStore>) {
    let users = Arc::new(
        InMemoryUserStore::new().with_user(test_user(ADMIN_IDENTITY, ADMIN_PASSWORD, true)),
    );
    let revocations = Arc::new(InMemoryRevocationStore::new());
    let service = SessionService::new(Arc::new(test_codec()), users, revocations.clone());
    (service, revocations)
}

#[tokio::test]
async fn test_login_issues_decodable_token() {
    let (service, _) = session_with_stores();

    let issued = service.login(ADMIN_IDENTITY, ADMIN_PASSWORD).await.unwrap();

    let claims = test_codec().decode(&issued.token).unwrap();
    assert_eq!(claims.sub, ADMIN_IDENTITY);
    assert_eq!(claims.jti, issued.token_id);
}

#[tokio::test]
async fn test_unknown_user_and_wrong_password_are_indistinguishable() {
    let (service, _) = session_with_stores();

    let unknown = service
        .login("nobody@example.com", ADMIN_PASSWORD)
        .await
        .unwrap_err();
    let wrong = service.login(ADMIN_IDENTITY, "Wrong@123").await.unwrap_err();

    assert!(matches!(unknown, AppError::InvalidCredentials));
    assert!(matches!(wrong, AppError::InvalidCredentials));
    assert_eq!(unknown.to_string(), wrong.to_string());
}

#[tokio::test]
async fn test_logout_revokes_only_the_presented_token() {
    let (service, revocations) = session_with_stores();

    let first = service.login(ADMIN_IDENTITY, ADMIN_PASSWORD).await.unwrap();
    let second = service.login(ADMIN_IDENTITY, ADMIN_PASSWORD).await.unwrap();

    service.logout(&first.token).await.unwrap();

    use blog_api::security::revocation::RevocationStore;
    assert!(revocations.is_revoked(first.token_id).await.unwrap());
    assert!(!revocations.is_revoked(second.token_id).await.unwrap());
}

#[tokio::test]
async fn test_repeated_logout_is_idempotent() {
    let (service, revocations) = session_with_stores();

    let issued = service.login(ADMIN_IDENTITY, ADMIN_PASSWORD).await.unwrap();

    service.logout(&issued.token).await.unwrap();
    service.logout(&issued.token).await.unwrap();

    assert_eq!(revocations.record_count(), 1);
}

#[tokio::test]
async fn test_logout_rejects_garbage_token() {
    let (service, revocations) = session_with_stores();

    let result = service.logout("definitely.not.a.real.token").await;
    assert!(matches!(result, Err(AppError::InvalidToken)));
    assert_eq!(revocations.record_count(), 0);
}

#[tokio::test]
async fn test_logout_rejects_expired_token() {
    let (service, revocations) = session_with_stores();

    let issued = test_codec()
        .issue(ADMIN_IDENTITY, Some(chrono::Duration::seconds(1)))
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_secs(2)).await;

    let result = service.logout(&issued.token).await;
    assert!(matches!(result, Err(AppError::InvalidToken)));
    assert_eq!(revocations.record_count(), 0);
}

#[tokio::test]
async fn test_logout_fails_closed_when_store_is_down() {
    let (service, revocations) = session_with_stores();

    let issued = service.login(ADMIN_IDENTITY, ADMIN_PASSWORD).await.unwrap();
    revocations.set_failing(true);

    let result = service.logout(&issued.token).await;
    assert!(matches!(result, Err(AppError::ServiceUnavailable)));
}
