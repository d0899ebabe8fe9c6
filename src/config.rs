use std::env;
use std::time::Duration;

use chrono_tz::Tz;

use crate::domain::models::channel::ChannelKind;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: Option<String>,
    pub port: u16,
    pub cron_secret: String,
    pub line_api_url: String,
    pub line_channel_token: Option<String>,
    pub proxy_relay_url: Option<String>,
    pub proxy_relay_token: Option<String>,
    pub default_channel: ChannelKind,
    pub channel_timeout: Duration,
    pub channel_max_attempts: u32,
    pub channel_initial_backoff: Duration,
    pub send_delay: Duration,
    pub studio_timezone: Tz,
    pub degraded_fallback: bool,
    pub degraded_recipient: String,
    pub reminder_tick: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        Self {
            database_url: env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            cron_secret: cron_secret(env::var("CRON_SECRET").ok()).unwrap_or_else(|e| panic!("{}", e)),
            line_api_url: env::var("LINE_API_URL").unwrap_or_else(|_| "https://api.line.me/v2/bot/message/push".to_string()),
            line_channel_token: env::var("LINE_CHANNEL_ACCESS_TOKEN").ok().filter(|v| !v.is_empty()),
            proxy_relay_url: env::var("PROXY_RELAY_URL").ok().filter(|v| !v.is_empty()),
            proxy_relay_token: env::var("PROXY_RELAY_TOKEN").ok().filter(|v| !v.is_empty()),
            default_channel: env::var("DEFAULT_CHANNEL")
                .unwrap_or_else(|_| "line".to_string())
                .parse()
                .expect("DEFAULT_CHANNEL must be 'line' or 'proxy'"),
            channel_timeout: Duration::from_secs(parse_or("CHANNEL_TIMEOUT_SECS", 5)),
            channel_max_attempts: parse_or("CHANNEL_MAX_ATTEMPTS", 3) as u32,
            channel_initial_backoff: Duration::from_millis(parse_or("CHANNEL_INITIAL_BACKOFF_MS", 500)),
            send_delay: Duration::from_millis(parse_or("SEND_DELAY_MS", 200)),
            studio_timezone: env::var("STUDIO_TIMEZONE")
                .unwrap_or_else(|_| "Asia/Taipei".to_string())
                .parse()
                .expect("STUDIO_TIMEZONE must be an IANA timezone name"),
            degraded_fallback: env::var("DEGRADED_FALLBACK").map(|v| v == "true" || v == "1").unwrap_or(false),
            degraded_recipient: env::var("DEGRADED_RECIPIENT").unwrap_or_else(|_| "U-placeholder-recipient".to_string()),
            reminder_tick: env::var("REMINDER_TICK_SECS").ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        }
    }
}

/// An unset or blank secret would let an empty bearer token through.
fn cron_secret(raw: Option<String>) -> Result<String, &'static str> {
    match raw.map(|v| v.trim().to_string()) {
        Some(secret) if !secret.is_empty() => Ok(secret),
        Some(_) => Err("CRON_SECRET must not be empty"),
        None => Err("CRON_SECRET must be set"),
    }
}

fn parse_or(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| panic!("{} must be a non-negative integer", key)),
        Err(_) => default,
    }
}
