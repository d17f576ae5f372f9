mod common;

use axum::http::StatusCode;
use chrono::{NaiveDate, Utc};
use common::{day, parse_body, TestApp};
use serde_json::json;
use stay_backend::domain::models::{booking::BookingStatus, job::{Job, JOB_BOOKING_CANCELED}};
use std::sync::Arc;
use tokio::task::JoinSet;
use uuid::Uuid;

#[tokio::test]
async fn test_booking_total_is_nights_times_price() {
    let app = TestApp::new().await;
    let host = app.signup("host").await;
    let guest = app.signup("guest").await;
    let property_id = app.create_property(&host, "Lisbon", 100).await;

    let res = app.book(&guest, &property_id, day(10), day(15)).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let booking = parse_body(res).await;
    assert_eq!(booking["total_price"], 500);
    assert_eq!(booking["status"], "pending");
    assert_eq!(booking["user_id"], guest.user_id.as_str());

    let res = app.send("GET", &format!("/api/v1/bookings/{}", booking["id"].as_str().unwrap()), Some(&guest), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let details = parse_body(res).await;
    assert_eq!(details["nights"], 5);
    assert!(details["payment"].is_null());

    let res = app.send("GET", "/api/v1/bookings", Some(&guest), None).await;
    assert_eq!(parse_body(res).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_booking_rejects_bad_dates() {
    let app = TestApp::new().await;
    let host = app.signup("host").await;
    let guest = app.signup("guest").await;
    let property_id = app.create_property(&host, "Lisbon", 100).await;

    assert_eq!(app.book(&guest, &property_id, day(5), day(5)).await.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.book(&guest, &property_id, day(6), day(5)).await.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.book(&guest, &property_id, day(-2), day(3)).await.status(), StatusCode::BAD_REQUEST);

    // Check-in today is fine.
    assert_eq!(app.book(&guest, &property_id, day(0), day(1)).await.status(), StatusCode::CREATED);

    assert_eq!(app.book(&guest, "missing-property", day(1), day(2)).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unparseable_dates_are_bad_requests() {
    let app = TestApp::new().await;
    let host = app.signup("host").await;
    let guest = app.signup("guest").await;
    let property_id = app.create_property(&host, "Lisbon", 100).await;
    let uri = format!("/api/v1/properties/{}/bookings", property_id);

    for (start, end) in [("2030-02-30", "2030-03-02"), ("tomorrow", "2030-03-02"), ("2030-03-01", "")] {
        let res = app.send("POST", &uri, Some(&guest), Some(json!({"start_date": start, "end_date": end}))).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{} .. {}", start, end);
        assert!(parse_body(res).await["error"].is_string());
    }

    let res = app.send("POST", &uri, Some(&guest), Some(json!({"start_date": "2030-03-01"}))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.send("GET", "/api/v1/properties?check_in=2030-02-30&check_out=2030-03-02", None, None).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(parse_body(res).await["error"].is_string());

    let res = app.send("GET", "/api/v1/properties?min_price=cheap", None, None).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_overlapping_bookings_conflict_but_adjacent_ones_do_not() {
    let app = TestApp::new().await;
    let host = app.signup("host").await;
    let alice = app.signup("guest").await;
    let bob = app.signup("guest").await;
    let property_id = app.create_property(&host, "Lisbon", 100).await;

    assert_eq!(app.book(&alice, &property_id, day(10), day(15)).await.status(), StatusCode::CREATED);

    assert_eq!(app.book(&bob, &property_id, day(12), day(13)).await.status(), StatusCode::CONFLICT);
    assert_eq!(app.book(&bob, &property_id, day(8), day(11)).await.status(), StatusCode::CONFLICT);
    assert_eq!(app.book(&bob, &property_id, day(14), day(20)).await.status(), StatusCode::CONFLICT);
    assert_eq!(app.book(&bob, &property_id, day(9), day(16)).await.status(), StatusCode::CONFLICT);

    // Check-out day is free for the next check-in.
    assert_eq!(app.book(&bob, &property_id, day(15), day(17)).await.status(), StatusCode::CREATED);
    assert_eq!(app.book(&bob, &property_id, day(7), day(10)).await.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_host_cannot_book_own_property() {
    let app = TestApp::new().await;
    let host = app.signup("host").await;
    let property_id = app.create_property(&host, "Lisbon", 100).await;

    assert_eq!(app.book(&host, &property_id, day(1), day(3)).await.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_booking_visibility() {
    let app = TestApp::new().await;
    let host = app.signup("host").await;
    let other_host = app.signup("host").await;
    let guest = app.signup("guest").await;
    let stranger = app.signup("guest").await;
    let admin = app.admin().await;
    let property_id = app.create_property(&host, "Lisbon", 100).await;

    let booking = parse_body(app.book(&guest, &property_id, day(1), day(3)).await).await;
    let uri = format!("/api/v1/bookings/{}", booking["id"].as_str().unwrap());

    assert_eq!(app.send("GET", &uri, Some(&stranger), None).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.send("GET", &uri, Some(&host), None).await.status(), StatusCode::OK);
    assert_eq!(app.send("GET", &uri, Some(&admin), None).await.status(), StatusCode::OK);

    let list_uri = format!("/api/v1/properties/{}/bookings", property_id);
    let res = app.send("GET", &list_uri, Some(&host), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await.as_array().unwrap().len(), 1);

    assert_eq!(app.send("GET", &list_uri, Some(&other_host), None).await.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_cancel_frees_dates_and_is_idempotent() {
    let app = TestApp::new().await;
    let host = app.signup("host").await;
    let alice = app.signup("guest").await;
    let bob = app.signup("guest").await;
    let property_id = app.create_property(&host, "Lisbon", 100).await;

    let booking = parse_body(app.book(&alice, &property_id, day(10), day(15)).await).await;
    let cancel_uri = format!("/api/v1/bookings/{}/cancel", booking["id"].as_str().unwrap());

    assert_eq!(app.send("POST", &cancel_uri, Some(&bob), None).await.status(), StatusCode::NOT_FOUND);

    let res = app.send("POST", &cancel_uri, Some(&alice), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["status"], "canceled");

    let res = app.send("POST", &cancel_uri, Some(&alice), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["status"], "canceled");

    assert_eq!(app.book(&bob, &property_id, day(10), day(15)).await.status(), StatusCode::CREATED);

    // The cancellation notice goes out once.
    app.run_jobs().await;
    let sent = app.email.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, alice.email);
    assert!(sent[0].subject.starts_with("Booking canceled"));
}

#[tokio::test]
async fn test_repeated_cancel_queues_one_notice() {
    let app = TestApp::new().await;
    let host = app.signup("host").await;
    let guest = app.signup("guest").await;
    let property_id = app.create_property(&host, "Lisbon", 100).await;

    let created = parse_body(app.book(&guest, &property_id, day(10), day(12)).await).await;
    let booking_id = created["id"].as_str().unwrap();

    // Two cancels that both read the booking while it was still pending.
    let booking = app.state.booking_repo.find_by_id(booking_id).await.unwrap().unwrap();
    let notice = || vec![Job::new(JOB_BOOKING_CANCELED, booking_id.to_string(), Utc::now())];

    let first = app.state.booking_repo.cancel(&booking, notice()).await.unwrap();
    let second = app.state.booking_repo.cancel(&booking, notice()).await.unwrap();
    assert_eq!(first.status, BookingStatus::Canceled);
    assert_eq!(second.status, BookingStatus::Canceled);

    let jobs = app.state.job_repo.list_for_booking(booking_id).await.unwrap();
    let notices = jobs.iter().filter(|j| j.job_type == JOB_BOOKING_CANCELED).count();
    assert_eq!(notices, 1);

    app.run_jobs().await;
    assert_eq!(app.email.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_host_can_cancel_guest_booking() {
    let app = TestApp::new().await;
    let host = app.signup("host").await;
    let guest = app.signup("guest").await;
    let property_id = app.create_property(&host, "Lisbon", 100).await;

    let booking = parse_body(app.book(&guest, &property_id, day(3), day(4)).await).await;
    let res = app.send("POST", &format!("/api/v1/bookings/{}/cancel", booking["id"].as_str().unwrap()), Some(&host), None).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_bookings_for_same_dates() {
    let app = Arc::new(TestApp::new().await);
    let host = app.signup("host").await;
    let property_id = app.create_property(&host, "Lisbon", 100).await;

    let mut guests = Vec::new();
    for _ in 0..8 {
        guests.push(app.signup("guest").await);
    }

    let mut set = JoinSet::new();
    for guest in guests {
        let app = app.clone();
        let property_id = property_id.clone();
        set.spawn(async move {
            app.book(&guest, &property_id, day(20), day(25)).await.status()
        });
    }

    let mut created = 0;
    let mut conflicts = 0;
    while let Some(res) = set.join_next().await {
        match res.unwrap() {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => conflicts += 1,
            other => panic!("unexpected status {}", other),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(conflicts, 7);

    let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE property_id = ?")
        .bind(&property_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(stored, 1);
}

#[tokio::test]
async fn test_database_rejects_overlapping_rows() {
    let app = TestApp::new().await;
    let host = app.signup("host").await;
    let guest = app.signup("guest").await;
    let property_id = app.create_property(&host, "Lisbon", 100).await;

    assert_eq!(app.book(&guest, &property_id, day(10), day(15)).await.status(), StatusCode::CREATED);

    let insert = |start: NaiveDate, end: NaiveDate, status: &'static str| {
        sqlx::query(
            "INSERT INTO bookings (id, property_id, user_id, start_date, end_date, total_price, status, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
        )
            .bind(Uuid::new_v4().to_string())
            .bind(property_id.clone())
            .bind(guest.user_id.clone())
            .bind(start)
            .bind(end)
            .bind(100_i64)
            .bind(status)
            .bind(Utc::now())
            .execute(&app.pool)
    };

    let err = insert(day(12), day(14), "pending").await.unwrap_err();
    assert!(err.to_string().contains("overlap"), "unexpected error: {}", err);

    // Canceled rows never block.
    insert(day(12), day(14), "canceled").await.unwrap();
    insert(day(15), day(16), "confirmed").await.unwrap();
}
