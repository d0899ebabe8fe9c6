use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::{error, info, warn};
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::domain::services::channel_registry::ChannelRegistry;
use crate::infra::channels::{line::LineMessagingProvider, proxy::ProxyRelayProvider};
use crate::infra::memory::{fixtures::seed_placeholder_data, MemoryStore};
use crate::infra::repositories::{
    postgres_customer_repo::PostgresCustomerRepo, postgres_notification_repo::PostgresNotificationRepo,
    postgres_reminder_repo::PostgresReminderRepo, postgres_reservation_repo::PostgresReservationRepo,
    postgres_schedule_repo::PostgresScheduleRepo, postgres_settings_repo::PostgresSettingsRepo,
    sqlite_customer_repo::SqliteCustomerRepo, sqlite_notification_repo::SqliteNotificationRepo,
    sqlite_reminder_repo::SqliteReminderRepo, sqlite_reservation_repo::SqliteReservationRepo,
    sqlite_schedule_repo::SqliteScheduleRepo, sqlite_settings_repo::SqliteSettingsRepo,
};
use crate::state::{AppState, Repositories};

pub async fn bootstrap_state(config: &Config) -> AppState {
    let channels = build_channel_registry(config);

    let connected = match config.database_url.as_deref() {
        Some(url) => connect_repositories(url).await,
        None => Err(sqlx::Error::Configuration("DATABASE_URL is not set".into())),
    };

    match connected {
        Ok(repos) => AppState::new(config.clone(), repos, channels, false),
        Err(e) if config.degraded_fallback => {
            warn!("Primary store unavailable ({}); starting in DEGRADED MODE on placeholder data", e);
            let repos = placeholder_repositories(config).await;
            AppState::new(config.clone(), repos, channels, true)
        }
        Err(e) => {
            error!("Failed to initialize storage: {:?}", e);
            panic!("Failed to initialize storage: {}", e);
        }
    }
}

pub fn build_channel_registry(config: &Config) -> ChannelRegistry {
    let mut registry = ChannelRegistry::new(config.default_channel);

    match &config.line_channel_token {
        Some(token) => registry.register(Arc::new(LineMessagingProvider::new(
            config.line_api_url.clone(),
            token.clone(),
            config.channel_timeout,
        ))),
        None => warn!("LINE_CHANNEL_ACCESS_TOKEN not set; the line channel is disabled"),
    }

    match &config.proxy_relay_url {
        Some(url) => registry.register(Arc::new(ProxyRelayProvider::new(
            url.clone(),
            config.proxy_relay_token.clone(),
            config.channel_timeout,
        ))),
        None => info!("PROXY_RELAY_URL not set; the proxy channel is disabled"),
    }

    if !registry.registered().contains(&config.default_channel) {
        warn!("Default channel '{}' has no provider; notifications will be logged as failed", config.default_channel);
    }
    registry
}

/// Name of the store a process ends up on: placeholder memory when degraded, else by URL scheme.
pub fn storage_backend(database_url: Option<&str>, degraded: bool) -> &'static str {
    match database_url {
        _ if degraded => "memory-placeholder",
        Some(url) if is_postgres_url(url) => "postgres",
        Some(_) => "sqlite",
        None => "none",
    }
}

fn is_postgres_url(url: &str) -> bool {
    url.starts_with("postgres://") || url.starts_with("postgresql://")
}

/// Connects, migrates and wraps the primary store selected by the URL scheme.
pub async fn connect_repositories(database_url: &str) -> Result<Repositories, sqlx::Error> {
    if is_postgres_url(database_url) {
        info!("Initializing PostgreSQL connection...");

        let opts: PgConnectOptions = database_url.parse::<PgConnectOptions>()?
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await?;

        run_postgres_migrations(&pool).await?;
        Ok(postgres_repositories(pool))
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;

        run_sqlite_migrations(&pool).await?;
        Ok(sqlite_repositories(pool))
    }
}

pub fn sqlite_repositories(pool: SqlitePool) -> Repositories {
    Repositories {
        schedules: Arc::new(SqliteScheduleRepo::new(pool.clone())),
        customers: Arc::new(SqliteCustomerRepo::new(pool.clone())),
        reservations: Arc::new(SqliteReservationRepo::new(pool.clone())),
        reminders: Arc::new(SqliteReminderRepo::new(pool.clone())),
        notifications: Arc::new(SqliteNotificationRepo::new(pool.clone())),
        settings: Arc::new(SqliteSettingsRepo::new(pool)),
    }
}

pub fn postgres_repositories(pool: PgPool) -> Repositories {
    Repositories {
        schedules: Arc::new(PostgresScheduleRepo::new(pool.clone())),
        customers: Arc::new(PostgresCustomerRepo::new(pool.clone())),
        reservations: Arc::new(PostgresReservationRepo::new(pool.clone())),
        reminders: Arc::new(PostgresReminderRepo::new(pool.clone())),
        notifications: Arc::new(PostgresNotificationRepo::new(pool.clone())),
        settings: Arc::new(PostgresSettingsRepo::new(pool)),
    }
}

async fn placeholder_repositories(config: &Config) -> Repositories {
    let store = Arc::new(MemoryStore::new());
    let today = Utc::now().with_timezone(&config.studio_timezone).date_naive();
    if let Err(e) = seed_placeholder_data(&store, today, &config.degraded_recipient).await {
        error!("Failed to seed placeholder data: {:?}", e);
    }
    Repositories::in_memory(store)
}

pub async fn run_postgres_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations/postgres").run(pool).await?;
    Ok(())
}

pub async fn run_sqlite_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations/sqlite").run(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_backend_names() {
        assert_eq!(storage_backend(Some("postgres://u@h/db"), false), "postgres");
        assert_eq!(storage_backend(Some("postgresql://u@h/db"), false), "postgres");
        assert_eq!(storage_backend(Some("sqlite://studio.db"), false), "sqlite");
        assert_eq!(storage_backend(Some("postgres://u@h/db"), true), "memory-placeholder");
        assert_eq!(storage_backend(None, true), "memory-placeholder");
    }
}
