mod common;

use axum::http::StatusCode;
use common::{cookie_value, parse_body, TestApp, PASSWORD};
use serde_json::json;

#[tokio::test]
async fn test_register_login_and_profile() {
    let app = TestApp::new().await;

    let res = app.register("Ana", "Ana@Example.com", "guest").await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = parse_body(res).await;
    assert_eq!(body["email"], "ana@example.com");
    assert_eq!(body["role"], "guest");
    assert!(body.get("password_hash").is_none());

    let auth = app.login("ana@example.com", PASSWORD).await;

    let res = app.send("GET", "/api/v1/users/me", Some(&auth), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let me = parse_body(res).await;
    assert_eq!(me["id"], auth.user_id.as_str());
    assert_eq!(me["name"], "Ana");

    let res = app.send("GET", &format!("/api/v1/users/{}", auth.user_id), None, None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let public = parse_body(res).await;
    assert_eq!(public["name"], "Ana");
    assert!(public.get("email").is_none());
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_bad_input() {
    let app = TestApp::new().await;

    assert_eq!(app.register("Ana", "ana@example.com", "guest").await.status(), StatusCode::CREATED);
    assert_eq!(app.register("Ana 2", "ANA@example.com", "host").await.status(), StatusCode::CONFLICT);

    assert_eq!(app.register("Bo", "not-an-email", "guest").await.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.register("Root", "root@example.com", "admin").await.status(), StatusCode::FORBIDDEN);

    let res = app.send("POST", "/api/v1/auth/register", None, Some(json!({
        "name": "Shorty",
        "email": "shorty@example.com",
        "password": "short"
    }))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_with_wrong_password_is_unauthorized() {
    let app = TestApp::new().await;
    app.register("Ana", "ana@example.com", "guest").await;

    let res = app.send("POST", "/api/v1/auth/login", None, Some(json!({
        "email": "ana@example.com",
        "password": "wrong-password"
    }))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app.send("POST", "/api/v1/auth/login", None, Some(json!({
        "email": "nobody@example.com",
        "password": PASSWORD
    }))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_token_and_csrf() {
    let app = TestApp::new().await;
    let host = app.signup("host").await;

    let res = app.send("GET", "/api/v1/users/me", None, None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let cookie = format!("access_token={}", host.access_token);
    let listing = json!({"title": "Loft", "location": "Porto", "price_per_night": 9000});

    // Cookie without the CSRF header on a state-changing request.
    let res = app.send_with_cookie("POST", "/api/v1/properties", Some(&cookie), None, Some(listing.clone())).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.send_with_cookie("POST", "/api/v1/properties", Some(&cookie), Some("forged"), Some(listing.clone())).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.send_with_cookie("GET", "/api/v1/users/me", Some("access_token=not-a-jwt"), None, None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Reads only need the cookie.
    let res = app.send_with_cookie("GET", "/api/v1/users/me", Some(&cookie), None, None).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.send("POST", "/api/v1/properties", Some(&host), Some(listing)).await;
    assert_eq!(res.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_refresh_rotates_token_and_logout_revokes_it() {
    let app = TestApp::new().await;
    app.register("Ana", "ana@example.com", "guest").await;

    let res = app.send("POST", "/api/v1/auth/login", None, Some(json!({
        "email": "ana@example.com",
        "password": PASSWORD
    }))).await;
    let refresh_token = cookie_value(&res, "refresh_token").unwrap();

    let cookie = |token: &str| format!("refresh_token={}", token);

    let res = app.send_with_cookie("POST", "/api/v1/auth/refresh", Some(&cookie(&refresh_token)), None, None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let rotated = cookie_value(&res, "refresh_token").unwrap();
    assert_ne!(rotated, refresh_token);
    assert!(parse_body(res).await["csrf_token"].is_string());

    // The old token was consumed by the rotation.
    let res = app.send_with_cookie("POST", "/api/v1/auth/refresh", Some(&cookie(&refresh_token)), None, None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app.send_with_cookie("POST", "/api/v1/auth/logout", Some(&cookie(&rotated)), None, None).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.send_with_cookie("POST", "/api/v1/auth/refresh", Some(&cookie(&rotated)), None, None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_replayed_refresh_token_revokes_the_family() {
    let app = TestApp::new().await;
    app.register("Ana", "ana@example.com", "guest").await;
    let cookie = |token: &str| format!("refresh_token={}", token);

    let res = app.send("POST", "/api/v1/auth/login", None, Some(json!({
        "email": "ana@example.com",
        "password": PASSWORD
    }))).await;
    let stolen = cookie_value(&res, "refresh_token").unwrap();

    // A second, independent login.
    let res = app.send("POST", "/api/v1/auth/login", None, Some(json!({
        "email": "ana@example.com",
        "password": PASSWORD
    }))).await;
    let other_device = cookie_value(&res, "refresh_token").unwrap();

    let res = app.send_with_cookie("POST", "/api/v1/auth/refresh", Some(&cookie(&stolen)), None, None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let rotated = cookie_value(&res, "refresh_token").unwrap();

    let res = app.send_with_cookie("POST", "/api/v1/auth/refresh", Some(&cookie(&stolen)), None, None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // The replay took the legitimate successor down with it.
    let res = app.send_with_cookie("POST", "/api/v1/auth/refresh", Some(&cookie(&rotated)), None, None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app.send_with_cookie("POST", "/api/v1/auth/refresh", Some(&cookie(&other_device)), None, None).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_update_profile_changes_name_and_password() {
    let app = TestApp::new().await;
    let guest = app.signup("guest").await;

    let res = app.send("PUT", "/api/v1/users/me", Some(&guest), Some(json!({
        "name": "Renamed",
        "password": "another-secret-99"
    }))).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["name"], "Renamed");

    let relogged = app.login(&guest.email, "another-secret-99").await;
    assert_eq!(relogged.user_id, guest.user_id);
}

#[tokio::test]
async fn test_admin_manages_roles() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let guest = app.signup("guest").await;

    let res = app.send("GET", "/api/v1/admin/users", Some(&guest), None).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.send("GET", "/api/v1/admin/users", Some(&admin), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await.as_array().unwrap().len(), 2);

    let res = app.send(
        "PUT",
        &format!("/api/v1/admin/users/{}/role", guest.user_id),
        Some(&admin),
        Some(json!({"role": "host"})),
    ).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["role"], "host");

    let res = app.send(
        "PUT",
        &format!("/api/v1/admin/users/{}/role", admin.user_id),
        Some(&admin),
        Some(json!({"role": "guest"})),
    ).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}
