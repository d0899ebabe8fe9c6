use axum::{
    body::Body,
    extract::Request,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{cron, customer, health, notification, reference, reminder, reservation, schedule, settings};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Reference data
        .route("/programs", get(reference::list_programs).post(reference::create_program))
        .route("/instructors", get(reference::list_instructors).post(reference::create_instructor))
        .route("/studios", get(reference::list_studios).post(reference::create_studio))

        // Schedules
        .route("/schedules", post(schedule::create_schedule).get(schedule::list_schedules))
        .route("/schedules/recurring", post(schedule::create_recurring_schedule))
        .route("/schedules/{id}", get(schedule::get_schedule).put(schedule::update_schedule).delete(schedule::delete_schedule))
        .route("/schedules/{id}/reservations", get(schedule::list_schedule_reservations))

        // Reservations
        .route("/reservations", post(reservation::create_reservation))
        .route("/reservations/{id}", get(reservation::get_reservation).put(reservation::update_reservation).delete(reservation::delete_reservation))
        .route("/customers/{external_id}", get(customer::get_customer))

        // Reminders & notifications
        .route("/reminder-definitions", get(reminder::list_definitions).post(reminder::create_definition))
        .route("/reminder-definitions/{id}", put(reminder::update_definition).delete(reminder::delete_definition))
        .route("/settings", get(settings::get_settings).put(settings::update_settings))
        .route("/notifications", get(notification::list_notifications))

        // Triggers
        .route("/cron/daily-reminders", get(cron::daily_reminders))
        .route("/test-reminder", post(cron::test_reminder))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}
