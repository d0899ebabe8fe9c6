use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// External messaging transport a notification is delivered through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Direct messaging API (push endpoint).
    Line,
    /// Indirect relay that forwards to the customer on our behalf.
    Proxy,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Line => "line",
            ChannelKind::Proxy => "proxy",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "line" => Ok(ChannelKind::Line),
            "proxy" => Ok(ChannelKind::Proxy),
            other => Err(format!("Unknown channel '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChannelReceipt {
    pub message_id: Option<String>,
    pub response: String,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChannelError {
    #[error("transient channel failure: {0}")]
    Transient(String),
    #[error("permanent channel failure: {0}")]
    Permanent(String),
    #[error("channel call timed out")]
    Timeout,
}

impl ChannelError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ChannelError::Transient(_) | ChannelError::Timeout)
    }

    /// Classifies an HTTP status returned by a provider.
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = format!("status {}: {}", status, body);
        if status >= 500 || status == 429 || status == 408 {
            ChannelError::Transient(detail)
        } else {
            ChannelError::Permanent(detail)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(ChannelError::from_status(503, "").is_retryable());
        assert!(ChannelError::from_status(429, "slow down").is_retryable());
        assert!(!ChannelError::from_status(400, "invalid recipient").is_retryable());
        assert!(!ChannelError::from_status(401, "").is_retryable());
        assert!(ChannelError::Timeout.is_retryable());
    }

    #[test]
    fn test_channel_kind_parse() {
        assert_eq!("LINE".parse::<ChannelKind>().unwrap(), ChannelKind::Line);
        assert_eq!(" proxy ".parse::<ChannelKind>().unwrap(), ChannelKind::Proxy);
        assert!("email".parse::<ChannelKind>().is_err());
    }
}
