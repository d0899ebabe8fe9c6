#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use sqlx::{sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions}, Pool, Sqlite};
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use studio_booking::{
    api::router::create_router,
    config::Config,
    domain::models::channel::{ChannelError, ChannelKind, ChannelReceipt},
    domain::ports::ChannelProvider,
    domain::services::channel_registry::ChannelRegistry,
    infra::factory::{run_sqlite_migrations, sqlite_repositories},
    infra::memory::{fixtures::seed_placeholder_data, MemoryStore},
    state::{AppState, Repositories},
};
use tower::ServiceExt;
use uuid::Uuid;

pub const CRON_SECRET: &str = "test-cron-secret";
pub const DEGRADED_RECIPIENT: &str = "U-degraded-recipient";

/// Succeeds and remembers every (recipient, message) pair.
#[derive(Default)]
pub struct RecordingChannel {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingChannel {
    pub fn messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChannelProvider for RecordingChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Line
    }

    async fn send(&self, target: &str, message: &str) -> Result<ChannelReceipt, ChannelError> {
        let mut sent = self.sent.lock().unwrap();
        sent.push((target.to_string(), message.to_string()));
        Ok(ChannelReceipt { message_id: Some(format!("msg-{}", sent.len())), response: "{}".into() })
    }
}

/// Always fails with the configured error.
pub struct FailingChannel {
    pub error: ChannelError,
    pub calls: AtomicU32,
}

impl FailingChannel {
    pub fn new(error: ChannelError) -> Self {
        Self { error, calls: AtomicU32::new(0) }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChannelProvider for FailingChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Line
    }

    async fn send(&self, _target: &str, _message: &str) -> Result<ChannelReceipt, ChannelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}

/// Never answers within the dispatcher timeout.
pub struct StallingChannel;

#[async_trait]
impl ChannelProvider for StallingChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Line
    }

    async fn send(&self, _target: &str, _message: &str) -> Result<ChannelReceipt, ChannelError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(ChannelReceipt::default())
    }
}

pub fn test_config(database_url: Option<String>) -> Config {
    Config {
        database_url,
        port: 0,
        cron_secret: CRON_SECRET.to_string(),
        line_api_url: "http://localhost/push".to_string(),
        line_channel_token: None,
        proxy_relay_url: None,
        proxy_relay_token: None,
        default_channel: ChannelKind::Line,
        channel_timeout: Duration::from_millis(200),
        channel_max_attempts: 3,
        channel_initial_backoff: Duration::from_millis(5),
        send_delay: Duration::ZERO,
        studio_timezone: chrono_tz::UTC,
        degraded_fallback: false,
        degraded_recipient: DEGRADED_RECIPIENT.to_string(),
        reminder_tick: None,
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: Option<Pool<Sqlite>>,
    pub db_filename: Option<String>,
    pub state: Arc<AppState>,
}

impl TestApp {
    /// SQLite-backed app whose only channel records what it sends.
    pub async fn new() -> (Self, Arc<RecordingChannel>) {
        let channel = Arc::new(RecordingChannel::default());
        let app = Self::with_channel(channel.clone()).await;
        (app, channel)
    }

    pub async fn with_channel(provider: Arc<dyn ChannelProvider>) -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        run_sqlite_migrations(&pool).await.expect("Failed to migrate test db");

        let config = test_config(Some(db_url));
        let channels = ChannelRegistry::new(ChannelKind::Line).with_provider(provider);
        let state = Arc::new(AppState::new(config, sqlite_repositories(pool.clone()), channels, false));

        Self {
            router: create_router(state.clone()),
            pool: Some(pool),
            db_filename: Some(db_filename),
            state,
        }
    }

    /// The degraded-mode wiring: in-memory store seeded with placeholder classes.
    pub async fn degraded(today: NaiveDate) -> (Self, Arc<RecordingChannel>) {
        let channel = Arc::new(RecordingChannel::default());
        let store = Arc::new(MemoryStore::new());
        seed_placeholder_data(&store, today, DEGRADED_RECIPIENT).await.expect("Failed to seed placeholders");

        let channels = ChannelRegistry::new(ChannelKind::Line).with_provider(channel.clone());
        let state = Arc::new(AppState::new(test_config(None), Repositories::in_memory(store), channels, true));

        let app = Self {
            router: create_router(state.clone()),
            pool: None,
            db_filename: None,
            state,
        };
        (app, channel)
    }

    pub async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    pub async fn cron(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
        (status, body)
    }

    /// Creates an instructor, a studio of `capacity` seats and a program;
    /// returns their ids as (program, instructor, studio).
    pub async fn seed_reference(&self, capacity: i32) -> (String, String, String) {
        let (status, instructor) = self.request("POST", "/instructors", Some(json!({
            "name": "Mei", "specialties": ["yoga", "pilates"]
        }))).await;
        assert_eq!(status, StatusCode::CREATED);
        let instructor_id = instructor["id"].as_str().unwrap().to_string();

        let (status, studio) = self.request("POST", "/studios", Some(json!({
            "name": "Studio A", "capacity": capacity
        }))).await;
        assert_eq!(status, StatusCode::CREATED);
        let studio_id = studio["id"].as_str().unwrap().to_string();

        let (status, program) = self.request("POST", "/programs", Some(json!({
            "name": "Morning Flow", "defaultDurationMin": 60, "defaultInstructorId": instructor_id
        }))).await;
        assert_eq!(status, StatusCode::CREATED);
        let program_id = program["id"].as_str().unwrap().to_string();

        (program_id, instructor_id, studio_id)
    }

    /// One class on `date` from `start` to `end`; returns the schedule id.
    pub async fn seed_class(&self, date: &str, start: &str, end: &str, capacity: i32) -> String {
        let (program_id, instructor_id, studio_id) = self.seed_reference(capacity).await;
        let (status, body) = self.request("POST", "/schedules", Some(json!({
            "baseDate": date,
            "startTime": start,
            "endTime": end,
            "programId": program_id,
            "instructorId": instructor_id,
            "studioId": studio_id,
        }))).await;
        assert_eq!(status, StatusCode::CREATED, "create schedule failed: {}", body);
        body["schedule"]["id"].as_str().unwrap().to_string()
    }

    pub async fn book(&self, schedule_id: &str, line_id: &str) -> (StatusCode, Value) {
        self.request("POST", "/reservations", Some(json!({
            "scheduleId": schedule_id,
            "customerName": format!("Customer {}", line_id),
            "lineId": line_id,
        }))).await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(db_filename) = &self.db_filename {
            let _ = std::fs::remove_file(db_filename);
            let _ = std::fs::remove_file(format!("{}-wal", db_filename));
            let _ = std::fs::remove_file(format!("{}-shm", db_filename));
        }
    }
}
