mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{TestApp, OPERATOR_EMAIL};
use serde_json::json;

fn customer(name: &str, email: &str) -> serde_json::Value {
    json!({ "customerName": name, "customerEmail": email, "customerPhone": "555-0100" })
}

#[tokio::test]
async fn test_capacity_two_then_full() {
    let app = TestApp::new().await;
    let yoga = app.create_class("Yoga").await;
    let session = app.create_session(&yoga, Utc::now() + Duration::days(2), 2).await;

    let (status, body) = app.send("POST", &format!("/api/v1/classes/{}/sessions", yoga.id), None, false).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], session.id.as_str());
    assert_eq!(body[0]["spotsLeft"], 2);
    assert_eq!(body[0]["maxCapacity"], 2);

    let uri = format!("/api/v1/sessions/{}/bookings", session.id);
    let (status, first) = app.send("POST", &uri, Some(customer("Ann", "ann@x.com")), false).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["className"], "Yoga");
    assert_eq!(first["sessionId"], session.id.as_str());
    assert!(first["bookingId"].as_str().is_some());

    let (status, _) = app.send("POST", &uri, Some(customer("Bob", "bob@x.com")), false).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.send("POST", &uri, Some(customer("Cid", "cid@x.com")), false).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "SESSION_FULL");

    assert_eq!(app.state.booking_repo.count_confirmed(&session.id).await.unwrap(), 2);

    let (_, body) = app.send("GET", &format!("/api/v1/classes/{}/sessions", yoga.id), None, false).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_duplicate_email_is_case_insensitive() {
    let app = TestApp::new().await;
    let yoga = app.create_class("Yoga").await;
    let session = app.create_session(&yoga, Utc::now() + Duration::days(1), 3).await;
    let uri = format!("/api/v1/sessions/{}/bookings", session.id);

    let (status, _) = app.send("POST", &uri, Some(customer("Ann", "ann@x.com")), false).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.send("POST", &uri, Some(customer("Ann", "ANN@X.com")), false).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "DUPLICATE_BOOKING");

    assert_eq!(app.state.booking_repo.count_confirmed(&session.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_full_reported_before_duplicate() {
    let app = TestApp::new().await;
    let yoga = app.create_class("Yoga").await;
    let session = app.create_session(&yoga, Utc::now() + Duration::days(1), 1).await;
    let uri = format!("/api/v1/sessions/{}/bookings", session.id);

    app.send("POST", &uri, Some(customer("Ann", "ann@x.com")), false).await;
    let (status, body) = app.send("POST", &uri, Some(customer("Ann", "ann@x.com")), false).await;

    // Capacity is gated first, so a full session reports full even for a repeat customer.
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "SESSION_FULL");
}

#[tokio::test]
async fn test_capacity_ledger_answers() {
    let app = TestApp::new().await;
    let yoga = app.create_class("Yoga").await;
    let session = app.create_session(&yoga, Utc::now() + Duration::days(1), 2).await;
    let uri = format!("/api/v1/sessions/{}/bookings", session.id);
    let ledger = app.state.booking_service.ledger();

    assert!(!ledger.has_capacity("missing-session").await.unwrap());
    assert!(!ledger.is_already_booked("missing-session", "ann@x.com").await.unwrap());

    assert!(ledger.has_capacity(&session.id).await.unwrap());
    assert!(!ledger.is_already_booked(&session.id, "ann@x.com").await.unwrap());

    app.send("POST", &uri, Some(customer("Ann", "Ann@X.com")), false).await;
    assert!(ledger.has_capacity(&session.id).await.unwrap());
    assert!(ledger.is_already_booked(&session.id, "ann@x.com").await.unwrap());
    assert!(ledger.is_already_booked(&session.id, "ANN@X.COM").await.unwrap());
    assert!(!ledger.is_already_booked(&session.id, "bob@x.com").await.unwrap());

    app.send("POST", &uri, Some(customer("Bob", "bob@x.com")), false).await;
    assert!(!ledger.has_capacity(&session.id).await.unwrap());
}

#[tokio::test]
async fn test_invalid_input_rejected() {
    let app = TestApp::new().await;
    let yoga = app.create_class("Yoga").await;
    let session = app.create_session(&yoga, Utc::now() + Duration::days(1), 2).await;
    let uri = format!("/api/v1/sessions/{}/bookings", session.id);

    let (status, body) = app.send("POST", &uri, Some(json!({ "customerName": "Ann", "customerEmail": "ann@x.com" })), false).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = app.send("POST", &uri, Some(customer("Ann", "not-an-email")), false).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.send("POST", &uri, Some(customer("   ", "ann@x.com")), false).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(app.state.booking_repo.count_confirmed(&session.id).await.unwrap(), 0);
    assert!(app.sent_mail().is_empty());
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let app = TestApp::new().await;
    let (status, body) = app.send("POST", "/api/v1/sessions/missing/bookings", Some(customer("Ann", "ann@x.com")), false).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_confirmation_and_operator_emails_sent() {
    let app = TestApp::new().await;
    let yoga = app.create_class("Yoga").await;
    let session = app.create_session(&yoga, Utc::now() + Duration::days(1), 2).await;

    let (status, _) = app.send("POST", &format!("/api/v1/sessions/{}/bookings", session.id), Some(customer("Ann", "ann@x.com")), false).await;
    assert_eq!(status, StatusCode::CREATED);

    let mail = app.sent_mail();
    assert_eq!(mail.len(), 2);

    let confirmation = mail.iter().find(|m| m.recipient == "ann@x.com").unwrap();
    assert_eq!(confirmation.subject, "Booking Confirmed: Yoga");
    assert!(confirmation.body.contains("Hello Ann"));
    assert!(confirmation.body.contains("Location: Studio A"));
    assert_eq!(confirmation.attachment_name.as_deref(), Some("booking.ics"));

    let notice = mail.iter().find(|m| m.recipient == OPERATOR_EMAIL).unwrap();
    assert_eq!(notice.subject, "New Booking: Yoga - Ann");
    assert!(notice.body.contains("ann@x.com"));
    assert!(notice.body.contains("555-0100"));
}

#[tokio::test]
async fn test_mail_failure_does_not_fail_booking() {
    let app = TestApp::new().await;
    *app.email.fail.lock().unwrap() = true;
    let yoga = app.create_class("Yoga").await;
    let session = app.create_session(&yoga, Utc::now() + Duration::days(1), 2).await;

    let (status, _) = app.send("POST", &format!("/api/v1/sessions/{}/bookings", session.id), Some(customer("Ann", "ann@x.com")), false).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(app.state.booking_repo.count_confirmed(&session.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_past_sessions_not_listed() {
    let app = TestApp::new().await;
    let yoga = app.create_class("Yoga").await;
    app.create_session(&yoga, Utc::now() - Duration::days(1), 5).await;
    let upcoming = app.create_session(&yoga, Utc::now() + Duration::days(3), 5).await;

    let (_, body) = app.send("GET", &format!("/api/v1/classes/{}/sessions", yoga.id), None, false).await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], upcoming.id.as_str());
}

#[tokio::test]
async fn test_cancel_frees_spot() {
    let app = TestApp::new().await;
    let yoga = app.create_class("Yoga").await;
    let session = app.create_session(&yoga, Utc::now() + Duration::days(1), 1).await;
    let uri = format!("/api/v1/sessions/{}/bookings", session.id);

    let (_, booked) = app.send("POST", &uri, Some(customer("Ann", "ann@x.com")), false).await;
    let booking_id = booked["bookingId"].as_str().unwrap().to_string();

    let (status, cancelled) = app.send("POST", &format!("/api/v1/admin/bookings/{}/cancel", booking_id), None, true).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");

    let (status, body) = app.send("POST", &format!("/api/v1/admin/bookings/{}/cancel", booking_id), None, true).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    // Same customer may book again once the earlier booking is cancelled.
    let (status, _) = app.send("POST", &uri, Some(customer("Ann", "ann@x.com")), false).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_admin_booking_views() {
    let app = TestApp::new().await;
    let yoga = app.create_class("Yoga").await;
    let session = app.create_session(&yoga, Utc::now() + Duration::days(1), 3).await;
    let (_, booked) = app.send("POST", &format!("/api/v1/sessions/{}/bookings", session.id), Some(customer("Ann", "ann@x.com")), false).await;
    let booking_id = booked["bookingId"].as_str().unwrap();

    let (status, _) = app.send("GET", "/api/v1/admin/bookings", None, false).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, list) = app.send("GET", "/api/v1/admin/bookings", None, true).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list[0]["id"], booking_id);
    assert_eq!(list[0]["class_name"], "Yoga");

    let (status, one) = app.send("GET", &format!("/api/v1/admin/bookings/{}", booking_id), None, true).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(one["customer_email"], "ann@x.com");

    let (_, by_session) = app.send("GET", &format!("/api/v1/admin/sessions/{}/bookings", session.id), None, true).await;
    assert_eq!(by_session.as_array().unwrap().len(), 1);

    let (status, _) = app.send("GET", "/api/v1/admin/bookings/nope", None, true).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
