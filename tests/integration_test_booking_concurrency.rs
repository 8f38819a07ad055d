mod common;

use chrono::{Duration, Utc};
use class_booking_backend::{domain::services::booking::BookingRequest, error::AppError};
use common::TestApp;
use tokio::task::JoinSet;

fn request(n: usize, email: &str) -> BookingRequest {
    BookingRequest {
        customer_name: format!("Customer {}", n),
        customer_email: email.to_string(),
        customer_phone: "555-0100".to_string(),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_bookings_never_exceed_capacity() {
    let app = TestApp::new().await;
    let yoga = app.create_class("Yoga").await;
    let session = app.create_session(&yoga, Utc::now() + Duration::days(1), 5).await;

    let mut tasks = JoinSet::new();
    for n in 0..24 {
        let service = app.state.booking_service.clone();
        let session_id = session.id.clone();
        tasks.spawn(async move {
            service.submit_booking(&session_id, request(n, &format!("c{}@x.com", n))).await
        });
    }

    let mut confirmed = 0;
    let mut full = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined.unwrap() {
            Ok(_) => confirmed += 1,
            Err(AppError::SessionFull) => full += 1,
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(confirmed, 5);
    assert_eq!(full, 19);
    assert_eq!(app.state.booking_repo.count_confirmed(&session.id).await.unwrap(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_same_email_books_once() {
    let app = TestApp::new().await;
    let yoga = app.create_class("Yoga").await;
    let session = app.create_session(&yoga, Utc::now() + Duration::days(1), 10).await;

    let mut tasks = JoinSet::new();
    for n in 0..12 {
        let service = app.state.booking_service.clone();
        let session_id = session.id.clone();
        let email = if n % 2 == 0 { "ann@x.com" } else { "Ann@X.com" };
        tasks.spawn(async move { service.submit_booking(&session_id, request(n, email)).await });
    }

    let mut confirmed = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined.unwrap() {
            Ok(_) => confirmed += 1,
            Err(AppError::DuplicateBooking) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(confirmed, 1);
    let bookings = app.state.booking_repo.list_by_session(&session.id).await.unwrap();
    assert_eq!(bookings.iter().filter(|b| b.is_confirmed()).count(), 1);
}
