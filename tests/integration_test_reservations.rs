mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn test_weekly_class_books_until_full() {
    let (app, channel) = TestApp::new().await;
    let (program_id, instructor_id, studio_id) = app.seed_reference(20).await;

    let (status, body) = app.request("POST", "/schedules/recurring", Some(json!({
        "baseDate": "2026-11-02",
        "startTime": "09:00",
        "endTime": "10:00",
        "programId": program_id,
        "instructorId": instructor_id,
        "studioId": studio_id,
        "capacity": 1,
        "repeat": "weekly",
        "repeatCount": 3,
    }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let first = body["schedules"][0]["id"].as_str().unwrap().to_string();
    let second = body["schedules"][1]["id"].as_str().unwrap().to_string();

    let (status, booked) = app.book(&first, "U-alice").await;
    assert_eq!(status, StatusCode::CREATED, "{}", booked);
    assert_eq!(booked["reservation"]["status"], "confirmed");
    assert_eq!(booked["customer"]["externalId"], "U-alice");
    assert_eq!(booked["notification"]["success"], true);
    assert!(booked["warning"].is_null());
    assert_eq!(booked["degraded"], false);

    let (status, full) = app.book(&first, "U-bob").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(full["error"], "This class is full");

    // Other occurrences keep their own capacity.
    let (status, _) = app.book(&second, "U-bob").await;
    assert_eq!(status, StatusCode::CREATED);

    let messages = channel.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].0, "U-alice");
    assert!(messages[0].1.contains("Morning Flow"));
    assert!(messages[0].1.contains("2026-11-02"));
    assert!(messages[0].1.contains("09:00"));
}

#[tokio::test]
async fn test_duplicate_booking_rejected() {
    let (app, _channel) = TestApp::new().await;
    let schedule_id = app.seed_class("2026-11-02", "09:00", "10:00", 5).await;

    let (status, _) = app.book(&schedule_id, "U-dup").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.book(&schedule_id, "U-dup").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "You have already booked this class");

    let (_, schedule) = app.request("GET", &format!("/schedules/{}", schedule_id), None).await;
    assert_eq!(schedule["schedule"]["bookedCount"], 1);
}

#[tokio::test]
async fn test_reservation_input_errors() {
    let (app, _channel) = TestApp::new().await;
    let schedule_id = app.seed_class("2026-11-02", "09:00", "10:00", 5).await;

    let (status, body) = app.request("POST", "/reservations", Some(json!({
        "scheduleId": schedule_id, "customerName": "No Line",
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("lineId"));

    let (status, body) = app.request("POST", "/reservations", Some(json!({
        "customerName": "No Schedule", "lineId": "U-x",
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("scheduleId"));

    let (status, body) = app.book("no-such-schedule", "U-x").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = app.request("POST", "/reservations", Some(json!({
        "scheduleId": schedule_id, "customerName": "Fax", "lineId": "U-fax", "channel": "fax",
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cancelled_slot_rejects_bookings() {
    let (app, _channel) = TestApp::new().await;
    let schedule_id = app.seed_class("2026-11-02", "09:00", "10:00", 5).await;

    let (status, _) = app.request("PUT", &format!("/schedules/{}", schedule_id), Some(json!({ "status": "cancelled" }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.book(&schedule_id, "U-late").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "This class has been cancelled");
}

#[tokio::test]
async fn test_cancel_frees_seat_and_reactivation_is_guarded() {
    let (app, _channel) = TestApp::new().await;
    let schedule_id = app.seed_class("2026-11-02", "09:00", "10:00", 1).await;

    let (_, first) = app.book(&schedule_id, "U-first").await;
    let first_id = first["reservation"]["id"].as_str().unwrap().to_string();

    let (status, cancelled) = app.request("PUT", &format!("/reservations/{}", first_id), Some(json!({
        "status": "cancelled", "cancellationReason": "sick",
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["reservation"]["status"], "cancelled");
    assert_eq!(cancelled["reservation"]["cancellationReason"], "sick");

    let (status, _) = app.book(&schedule_id, "U-second").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.request("PUT", &format!("/reservations/{}", first_id), Some(json!({ "status": "confirmed" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "This class is full");

    let (_, schedule) = app.request("GET", &format!("/schedules/{}", schedule_id), None).await;
    assert_eq!(schedule["schedule"]["bookedCount"], 1);
}

#[tokio::test]
async fn test_rebooking_after_cancellation() {
    let (app, _channel) = TestApp::new().await;
    let schedule_id = app.seed_class("2026-11-02", "09:00", "10:00", 3).await;

    let (_, first) = app.book(&schedule_id, "U-back").await;
    let first_id = first["reservation"]["id"].as_str().unwrap();
    let (status, _) = app.request("PUT", &format!("/reservations/{}", first_id), Some(json!({ "status": "cancelled" }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, second) = app.book(&schedule_id, "U-back").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(second["customer"]["id"], first["customer"]["id"]);
}

#[tokio::test]
async fn test_cancellation_notice_follows_settings() {
    let (app, channel) = TestApp::new().await;
    let schedule_id = app.seed_class("2026-11-02", "09:00", "10:00", 3).await;

    let (_, settings) = app.request("GET", "/settings", None).await;
    let mut updated = settings["settings"].clone();
    updated["cancellation"]["enabled"] = json!(true);
    updated["cancellation"]["template"] = json!("Your {program} on {date} is cancelled");
    let (status, _) = app.request("PUT", "/settings", Some(json!({ "version": settings["version"], "settings": updated }))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, booked) = app.book(&schedule_id, "U-cancel").await;
    let id = booked["reservation"]["id"].as_str().unwrap();

    let (status, body) = app.request("PUT", &format!("/reservations/{}", id), Some(json!({ "status": "cancelled" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notification"]["success"], true);

    let messages = channel.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].1, "Your Morning Flow on 2026-11-02 is cancelled");

    let (_, log) = app.request("GET", &format!("/notifications?reservationId={}", id), None).await;
    let types: Vec<&str> = log.as_array().unwrap().iter().map(|e| e["notificationType"].as_str().unwrap()).collect();
    assert_eq!(types, vec!["booking-confirmation", "cancellation"]);
}

#[tokio::test]
async fn test_reservation_update_and_delete() {
    let (app, _channel) = TestApp::new().await;
    let schedule_id = app.seed_class("2026-11-02", "09:00", "10:00", 3).await;

    let (_, booked) = app.book(&schedule_id, "U-walk").await;
    let uri = format!("/reservations/{}", booked["reservation"]["id"].as_str().unwrap());

    let (status, body) = app.request("PUT", &uri, Some(json!({ "bookingType": "walk-in" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reservation"]["bookingType"], "walk-in");
    assert!(body["notification"].is_null());

    let (status, _) = app.request("PUT", &uri, Some(json!({ "status": "lost" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, fetched) = app.request("GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["bookingType"], "walk-in");

    let (status, _) = app.request("DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.request("DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_customer_upsert_keeps_one_record() {
    let (app, _channel) = TestApp::new().await;
    let first = app.seed_class("2026-11-02", "09:00", "10:00", 3).await;
    let second = app.seed_class("2026-11-03", "09:00", "10:00", 3).await;

    let (status, _) = app.request("POST", "/reservations", Some(json!({
        "scheduleId": first, "customerName": "Lin", "lineId": "U-lin", "phone": "0912-345-678",
    }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app.request("POST", "/reservations", Some(json!({
        "scheduleId": second, "customerName": "Lin Mei", "lineId": "U-lin",
    }))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, customer) = app.request("GET", "/customers/U-lin", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(customer["name"], "Lin Mei");
    assert_eq!(customer["phone"], "0912-345-678", "an omitted phone keeps the stored one");

    let (status, _) = app.request("GET", "/customers/U-nobody", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
