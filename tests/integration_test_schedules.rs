mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn test_single_slot_and_collision_conflict() {
    let (app, _channel) = TestApp::new().await;
    let (program_id, instructor_id, studio_id) = app.seed_reference(12).await;

    let body = json!({
        "baseDate": "2026-11-02",
        "startTime": "09:00",
        "endTime": "10:00",
        "programId": program_id,
        "instructorId": instructor_id,
        "studioId": studio_id,
    });

    let (status, created) = app.request("POST", "/schedules", Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["schedule"]["capacity"], 12, "capacity defaults to the studio's");
    assert_eq!(created["schedule"]["status"], "active");
    assert_eq!(created["schedule"]["startTime"], "09:00:00");

    let (status, conflict) = app.request("POST", "/schedules", Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(conflict["error"].is_string());

    let (status, listed) = app.request("GET", "/schedules?date=2026-11-02", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["bookedCount"], 0);
}

#[tokio::test]
async fn test_slot_validation_errors() {
    let (app, _channel) = TestApp::new().await;
    let (program_id, _instructor_id, studio_id) = app.seed_reference(5).await;

    let (status, body) = app.request("POST", "/schedules", Some(json!({
        "baseDate": "2026-11-02", "startTime": "10:00", "endTime": "09:00",
        "programId": program_id, "studioId": studio_id,
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("endTime"));

    let (status, body) = app.request("POST", "/schedules", Some(json!({
        "baseDate": "2026-11-02", "startTime": "9am", "endTime": "10:00",
        "programId": program_id, "studioId": studio_id,
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("startTime"));

    let (status, _) = app.request("POST", "/schedules", Some(json!({
        "baseDate": "2026-11-02", "startTime": "09:00", "endTime": "10:00",
        "programId": "missing-program", "studioId": studio_id,
    }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.request("POST", "/schedules", Some(json!({
        "startTime": "09:00", "endTime": "10:00", "programId": program_id, "studioId": studio_id,
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("baseDate"));
}

#[tokio::test]
async fn test_weekly_recurring_group() {
    let (app, _channel) = TestApp::new().await;
    let (program_id, instructor_id, studio_id) = app.seed_reference(8).await;

    let (status, body) = app.request("POST", "/schedules/recurring", Some(json!({
        "baseDate": "2026-11-02",
        "startTime": "18:00",
        "endTime": "19:00",
        "programId": program_id,
        "instructorId": instructor_id,
        "studioId": studio_id,
        "capacity": 4,
        "repeat": "weekly",
        "repeatCount": 4,
    }))).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["schedulesCreated"], 4);

    let schedules = body["schedules"].as_array().unwrap();
    let dates: Vec<&str> = schedules.iter().map(|s| s["date"].as_str().unwrap()).collect();
    assert_eq!(dates, vec!["2026-11-02", "2026-11-09", "2026-11-16", "2026-11-23"]);

    let group = schedules[0]["recurringGroupId"].as_str().unwrap();
    assert!(schedules.iter().all(|s| s["recurringGroupId"] == group));
    assert!(schedules.iter().all(|s| s["recurrenceType"] == "weekly" && s["capacity"] == 4));
}

#[tokio::test]
async fn test_recurring_skips_colliding_dates() {
    let (app, _channel) = TestApp::new().await;
    let (program_id, instructor_id, studio_id) = app.seed_reference(8).await;

    let slot = json!({
        "baseDate": "2026-11-04",
        "startTime": "07:00",
        "endTime": "08:00",
        "programId": program_id,
        "instructorId": instructor_id,
        "studioId": studio_id,
    });
    let (status, _) = app.request("POST", "/schedules", Some(slot)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.request("POST", "/schedules/recurring", Some(json!({
        "baseDate": "2026-11-02",
        "startTime": "07:00",
        "endTime": "08:00",
        "programId": program_id,
        "instructorId": instructor_id,
        "studioId": studio_id,
        "repeat": "daily",
        "repeatEndDate": "2026-11-06",
    }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["schedulesCreated"], 4);
    assert_eq!(body["skippedDates"], json!(["2026-11-04"]));
}

#[tokio::test]
async fn test_recurring_rejects_bad_rule() {
    let (app, _channel) = TestApp::new().await;
    let (program_id, _instructor_id, studio_id) = app.seed_reference(8).await;

    let (status, body) = app.request("POST", "/schedules/recurring", Some(json!({
        "baseDate": "2026-11-02", "startTime": "07:00", "endTime": "08:00",
        "programId": program_id, "studioId": studio_id, "repeat": "fortnightly",
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("fortnightly"));

    let (status, _) = app.request("POST", "/schedules/recurring", Some(json!({
        "baseDate": "2026-11-02", "startTime": "07:00", "endTime": "08:00",
        "programId": program_id, "studioId": studio_id, "repeat": "daily", "repeatCount": 0,
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_capacity_update_respects_bookings() {
    let (app, _channel) = TestApp::new().await;
    let schedule_id = app.seed_class("2026-11-02", "12:00", "13:00", 5).await;

    for line_id in ["U-a", "U-b", "U-c"] {
        let (status, _) = app.book(&schedule_id, line_id).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let uri = format!("/schedules/{}", schedule_id);
    let (status, _) = app.request("PUT", &uri, Some(json!({ "capacity": 2 }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app.request("PUT", &uri, Some(json!({ "capacity": 3 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["schedule"]["capacity"], 3);
    assert_eq!(body["schedule"]["bookedCount"], 3);

    let (status, _) = app.request("PUT", &uri, Some(json!({ "status": "paused" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_slot_cascades_reservations() {
    let (app, _channel) = TestApp::new().await;
    let schedule_id = app.seed_class("2026-11-02", "12:00", "13:00", 5).await;

    let (_, booked) = app.book(&schedule_id, "U-cascade").await;
    let reservation_id = booked["reservation"]["id"].as_str().unwrap().to_string();

    let (status, listed) = app.request("GET", &format!("/schedules/{}/reservations", schedule_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, _) = app.request("DELETE", &format!("/schedules/{}", schedule_id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.request("GET", &format!("/reservations/{}", reservation_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.request("GET", &format!("/schedules/{}", schedule_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.request("DELETE", &format!("/schedules/{}", schedule_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
