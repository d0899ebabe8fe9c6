pub mod cron_auth;
pub mod json;
