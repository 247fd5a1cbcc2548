//! # Registration Tests
//!
//! Tests for account registration.

use super::*;

#[tokio::test]
async fn test_register_success() {
    // Arrange
    let pool = setup_test_db().await;
    let app = test_app(pool, test_config());

    // Act
    let (status, body) = post_json(
        &app,
        "/register",
        json!({ "email": "alice@example.com", "password": "TestPassword123!" }),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert_eq!(body["message"], "Registration successful");
    assert!(!body["token"].as_str().unwrap_or_default().is_empty());
    assert!(
        body["user"].get("last_login").is_none(),
        "a fresh account has no last_login"
    );
}

#[tokio::test]
async fn test_register_normalizes_email() {
    // Arrange
    let pool = setup_test_db().await;
    let app = test_app(pool.clone(), test_config());

    // Act
    let (status, body) = post_json(
        &app,
        "/register",
        json!({ "email": "  Alice@Example.COM ", "password": "TestPassword123!" }),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "alice@example.com");

    let stored = UserRepository::find_by_email(&pool, "alice@example.com")
        .await
        .expect("lookup should succeed");
    assert!(stored.is_some(), "stored email should be normalized");
}

#[tokio::test]
async fn test_register_rejects_invalid_email() {
    // Arrange
    let pool = setup_test_db().await;
    let app = test_app(pool, test_config());

    // Act
    let (status, body) = post_json(
        &app,
        "/register",
        json!({ "email": "not-an-email", "password": "TestPassword123!" }),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid email format");
}

#[tokio::test]
async fn test_register_rejects_too_short_email() {
    // Arrange
    let pool = setup_test_db().await;
    let app = test_app(pool, test_config());

    // Act: "a@b.c" is well-formed but below the six character floor.
    let (status, body) = post_json(
        &app,
        "/register",
        json!({ "email": "a@b.c", "password": "TestPassword123!" }),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap_or_default()
        .contains("at least 6"));
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    // Arrange
    let pool = setup_test_db().await;
    let app = test_app(pool, test_config());

    // Act
    let (status, body) = post_json(
        &app,
        "/register",
        json!({ "email": "alice@example.com", "password": "short" }),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap_or_default()
        .contains("at least 8"));
}

#[tokio::test]
async fn test_register_rejects_duplicate_email() {
    // Arrange
    let pool = setup_test_db().await;
    let app = test_app(pool, test_config());
    register_account(&app, "alice@example.com", "TestPassword123!").await;

    // Act: same address again, shouting this time.
    let (status, body) = post_json(
        &app,
        "/register",
        json!({ "email": "ALICE@example.com", "password": "OtherPassword456!" }),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already registered");
}

#[tokio::test]
async fn test_register_stores_hash_not_password() {
    // Arrange
    let pool = setup_test_db().await;
    let app = test_app(pool.clone(), test_config());

    // Act
    register_account(&app, "alice@example.com", "TestPassword123!").await;

    // Assert
    let user = UserRepository::find_by_email(&pool, "alice@example.com")
        .await
        .expect("lookup should succeed")
        .expect("account should exist");
    assert_ne!(user.password_hash, "TestPassword123!");
    assert!(user.password_hash.starts_with("$argon2"));
}
