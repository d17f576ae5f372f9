mod common;

use axum::http::StatusCode;
use common::{day, parse_body, AuthHeaders, TestApp};
use serde_json::json;
use std::time::Duration;

/// A host's property plus a guest whose stay there is paid and confirmed.
async fn confirmed_stay(app: &TestApp) -> (AuthHeaders, AuthHeaders, String) {
    let host = app.signup("host").await;
    let guest = app.signup("guest").await;
    let property_id = app.create_property(&host, "Lisbon", 100).await;

    let booking = parse_body(app.book(&guest, &property_id, day(1), day(3)).await).await;
    assert_eq!(app.pay(&guest, booking["id"].as_str().unwrap(), "credit_card").await.status(), StatusCode::ACCEPTED);
    app.run_jobs().await;

    (host, guest, property_id)
}

#[tokio::test]
async fn test_review_rating_bounds() {
    let app = TestApp::new().await;
    let (_, guest, property_id) = confirmed_stay(&app).await;
    let uri = format!("/api/v1/properties/{}/reviews", property_id);

    for rating in [0, 6, -1] {
        let res = app.send("POST", &uri, Some(&guest), Some(json!({"rating": rating, "comment": "hm"}))).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "rating {} should be rejected", rating);
    }

    let res = app.send("POST", &uri, Some(&guest), Some(json!({"rating": 5}))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let review = parse_body(res).await;
    assert_eq!(review["rating"], 5);
    assert_eq!(review["comment"], "");
}

#[tokio::test]
async fn test_review_with_malformed_rating_is_a_bad_request() {
    let app = TestApp::new().await;
    let (_, guest, property_id) = confirmed_stay(&app).await;
    let uri = format!("/api/v1/properties/{}/reviews", property_id);

    for rating in [json!(4.5), json!(9999999999_i64), json!("five"), json!(null)] {
        let res = app.send("POST", &uri, Some(&guest), Some(json!({"rating": rating, "comment": "hm"}))).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "rating {} should be rejected", rating);
        assert!(parse_body(res).await["error"].is_string());
    }

    let res = app.send("GET", &uri, None, None).await;
    assert!(parse_body(res).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_review_requires_confirmed_stay() {
    let app = TestApp::new().await;
    let host = app.signup("host").await;
    let guest = app.signup("guest").await;
    let property_id = app.create_property(&host, "Lisbon", 100).await;
    let uri = format!("/api/v1/properties/{}/reviews", property_id);

    let res = app.send("POST", &uri, Some(&guest), Some(json!({"rating": 4}))).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // A pending booking is not enough.
    app.book(&guest, &property_id, day(1), day(2)).await;
    let res = app.send("POST", &uri, Some(&guest), Some(json!({"rating": 4}))).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.send("POST", "/api/v1/properties/missing/reviews", Some(&guest), Some(json!({"rating": 4}))).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_one_review_per_guest_and_summary() {
    let app = TestApp::new().await;
    let (_, guest, property_id) = confirmed_stay(&app).await;
    let uri = format!("/api/v1/properties/{}/reviews", property_id);

    let res = app.send("POST", &uri, Some(&guest), Some(json!({"rating": 4, "comment": "Lovely view"}))).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = app.send("POST", &uri, Some(&guest), Some(json!({"rating": 2, "comment": "Changed my mind"}))).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // A second confirmed guest.
    let other = app.signup("guest").await;
    let booking = parse_body(app.book(&other, &property_id, day(5), day(6)).await).await;
    app.pay(&other, booking["id"].as_str().unwrap(), "paypal").await;
    app.run_jobs().await;
    let res = app.send("POST", &uri, Some(&other), Some(json!({"rating": 5}))).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = app.send("GET", &uri, None, None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await.as_array().unwrap().len(), 2);

    let res = app.send("GET", &format!("/api/v1/properties/{}", property_id), None, None).await;
    let details = parse_body(res).await;
    assert_eq!(details["review_count"], 2);
    assert_eq!(details["average_rating"].as_f64(), Some(4.5));
}

#[tokio::test]
async fn test_delete_review_by_author_or_admin() {
    let app = TestApp::new().await;
    let (host, guest, property_id) = confirmed_stay(&app).await;
    let admin = app.admin().await;
    let uri = format!("/api/v1/properties/{}/reviews", property_id);

    let review = parse_body(app.send("POST", &uri, Some(&guest), Some(json!({"rating": 3}))).await).await;
    let review_uri = format!("/api/v1/reviews/{}", review["id"].as_str().unwrap());

    assert_eq!(app.send("DELETE", &review_uri, Some(&host), None).await.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.send("DELETE", &review_uri, Some(&guest), None).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.send("DELETE", &review_uri, Some(&guest), None).await.status(), StatusCode::NOT_FOUND);

    // The author may review again after deleting.
    let review = parse_body(app.send("POST", &uri, Some(&guest), Some(json!({"rating": 4}))).await).await;
    let review_uri = format!("/api/v1/reviews/{}", review["id"].as_str().unwrap());
    assert_eq!(app.send("DELETE", &review_uri, Some(&admin), None).await.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_send_message_validation() {
    let app = TestApp::new().await;
    let guest = app.signup("guest").await;
    let host = app.signup("host").await;

    let send = |recipient: &str, body: &str| json!({"recipient_id": recipient, "message_body": body});

    let res = app.send("POST", "/api/v1/messages", Some(&guest), Some(send(&host.user_id, ""))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.send("POST", "/api/v1/messages", Some(&guest), Some(send(&host.user_id, "   "))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.send("POST", "/api/v1/messages", Some(&guest), Some(send(&guest.user_id, "note to self"))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.send("POST", "/api/v1/messages", Some(&guest), Some(send("nobody", "hello?"))).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app.send("POST", "/api/v1/messages", None, Some(send(&host.user_id, "hi"))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app.send("POST", "/api/v1/messages", Some(&guest), Some(send(&host.user_id, "Is parking available?"))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let message = parse_body(res).await;
    assert_eq!(message["sender_id"], guest.user_id.as_str());
    assert_eq!(message["recipient_id"], host.user_id.as_str());
}

#[tokio::test]
async fn test_inbox_and_conversation() {
    let app = TestApp::new().await;
    let guest = app.signup("guest").await;
    let host = app.signup("host").await;
    let other = app.signup("guest").await;

    let exchange = [
        (&guest, &host, "Is parking available?"),
        (&host, &guest, "Yes, one spot."),
        (&guest, &host, "Great, thanks!"),
        (&other, &host, "Pets allowed?"),
    ];
    for (from, to, body) in exchange {
        let res = app.send("POST", "/api/v1/messages", Some(from), Some(json!({
            "recipient_id": to.user_id,
            "message_body": body
        }))).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let res = app.send("GET", "/api/v1/messages", Some(&host), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let inbox = parse_body(res).await;
    let bodies: Vec<&str> = inbox.as_array().unwrap().iter().map(|m| m["message_body"].as_str().unwrap()).collect();
    assert_eq!(bodies, vec!["Pets allowed?", "Great, thanks!", "Is parking available?"]);

    let res = app.send("GET", &format!("/api/v1/messages/with/{}", host.user_id), Some(&guest), None).await;
    let thread = parse_body(res).await;
    let bodies: Vec<&str> = thread.as_array().unwrap().iter().map(|m| m["message_body"].as_str().unwrap()).collect();
    assert_eq!(bodies, vec!["Is parking available?", "Yes, one spot.", "Great, thanks!"]);

    let res = app.send("GET", &format!("/api/v1/messages/with/{}", guest.user_id), Some(&other), None).await;
    assert!(parse_body(res).await.as_array().unwrap().is_empty());
}
