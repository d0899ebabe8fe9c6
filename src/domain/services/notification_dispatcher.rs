use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::time::{sleep, timeout};
use tracing::{error, info, warn};

use crate::domain::models::{
    channel::{ChannelError, ChannelKind},
    notification::{NewLogEntry, NotificationLogEntry, NotificationType},
};
use crate::domain::ports::NotificationLogRepository;
use crate::domain::services::channel_registry::ChannelRegistry;
use crate::domain::services::retry::RetryPolicy;
use crate::domain::services::template::{render, TemplateVars};

pub struct DispatchRequest<'a> {
    pub customer_id: &'a str,
    /// External messaging identifier of the customer.
    pub recipient: &'a str,
    pub notification_type: NotificationType,
    pub template: &'a str,
    pub variables: &'a TemplateVars,
    pub reservation_id: Option<&'a str>,
    pub definition_id: Option<&'a str>,
    /// `None` selects the registry default.
    pub channel: Option<ChannelKind>,
    /// When set, a prior successful send with the same key suppresses this one.
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOutcome {
    pub success: bool,
    pub skipped: bool,
    pub channel: Option<ChannelKind>,
    pub channel_message_id: Option<String>,
    pub error: Option<String>,
    pub attempts: u32,
}

impl DispatchOutcome {
    pub fn skipped(reason: &str) -> Self {
        Self {
            success: false,
            skipped: true,
            channel: None,
            channel_message_id: None,
            error: Some(reason.to_string()),
            attempts: 0,
        }
    }

    fn failed(channel: ChannelKind, error: String, attempts: u32) -> Self {
        Self {
            success: false,
            skipped: false,
            channel: Some(channel),
            channel_message_id: None,
            error: Some(error),
            attempts,
        }
    }
}

/// Idempotency key for one notification type sent for one reservation
/// (and, for reminders, one reminder definition).
pub fn idempotency_key(notification_type: NotificationType, reservation_id: &str, definition_id: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(notification_type.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(reservation_id.as_bytes());
    hasher.update(b"|");
    hasher.update(definition_id.unwrap_or("").as_bytes());
    hex::encode(hasher.finalize())
}

/// Renders, sends with bounded retry and logs every attempt. Channel
/// failures never escape as errors; they are reported in the outcome.
pub struct NotificationDispatcher {
    channels: Arc<ChannelRegistry>,
    log_repo: Arc<dyn NotificationLogRepository>,
    call_timeout: Duration,
    retry: RetryPolicy,
}

impl NotificationDispatcher {
    pub fn new(
        channels: Arc<ChannelRegistry>,
        log_repo: Arc<dyn NotificationLogRepository>,
        call_timeout: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self { channels, log_repo, call_timeout, retry }
    }

    pub fn registered_channels(&self) -> Vec<ChannelKind> {
        self.channels.registered()
    }

    pub async fn dispatch(&self, req: DispatchRequest<'_>) -> DispatchOutcome {
        if let Some(key) = req.idempotency_key.as_deref() {
            match self.log_repo.has_successful_send(key).await {
                Ok(true) => {
                    info!(
                        notification_type = %req.notification_type,
                        reservation_id = ?req.reservation_id,
                        "Notification skipped (already sent)"
                    );
                    return DispatchOutcome::skipped("already sent");
                }
                Ok(false) => {}
                // Without the ledger we cannot prove a previous send; better to skip than to double-send.
                Err(e) => {
                    error!("Idempotency lookup failed, not sending: {:?}", e);
                    return DispatchOutcome::skipped("idempotency check unavailable");
                }
            }
        }

        let message = render(req.template, req.variables);
        let (kind, provider) = self.channels.resolve(req.channel);

        let log_params = NewLogEntry {
            customer_id: req.customer_id,
            reservation_id: req.reservation_id,
            reminder_definition_id: req.definition_id,
            notification_type: req.notification_type,
            channel: kind.as_str(),
            content: &message,
            idempotency_key: req.idempotency_key.as_deref(),
            attempt: 1,
        };

        let Some(provider) = provider else {
            let detail = format!("No channel provider registered for '{}'", kind);
            error!("{}", detail);
            self.write_log(NotificationLogEntry::failure(&log_params, detail.clone())).await;
            return DispatchOutcome::failed(kind, detail, 1);
        };

        let terminal = if req.recipient.trim().is_empty() {
            Some("Recipient has no messaging identifier")
        } else if message.trim().is_empty() {
            Some("Rendered message is empty")
        } else {
            None
        };
        if let Some(detail) = terminal {
            warn!("{} (type {})", detail, req.notification_type);
            self.write_log(NotificationLogEntry::failure(&log_params, detail.to_string())).await;
            return DispatchOutcome::failed(kind, detail.to_string(), 1);
        }

        let mut attempt = 1;
        loop {
            let params = NewLogEntry { attempt, ..log_params };
            let result = match timeout(self.call_timeout, provider.send(req.recipient, &message)).await {
                Ok(result) => result,
                Err(_) => Err(ChannelError::Timeout),
            };

            match result {
                Ok(receipt) => {
                    info!(channel = %kind, attempt, notification_type = %req.notification_type, "Notification sent");
                    self.write_log(NotificationLogEntry::success(&params, receipt.response.clone())).await;
                    return DispatchOutcome {
                        success: true,
                        skipped: false,
                        channel: Some(kind),
                        channel_message_id: receipt.message_id,
                        error: None,
                        attempts: attempt,
                    };
                }
                Err(e) => {
                    self.write_log(NotificationLogEntry::failure(&params, e.to_string())).await;

                    if e.is_retryable() && self.retry.should_retry(attempt) {
                        let delay = self.retry.delay_after(attempt);
                        warn!(channel = %kind, attempt, "Channel send failed ({}). Retrying in {}ms...", e, delay.as_millis());
                        sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    error!(channel = %kind, attempt, "Channel send failed terminally: {}", e);
                    return DispatchOutcome::failed(kind, e.to_string(), attempt);
                }
            }
        }
    }

    async fn write_log(&self, entry: NotificationLogEntry) {
        if let Err(e) = self.log_repo.append(&entry).await {
            error!("Failed to write notification log entry {}: {:?}", entry.id, e);
        }
    }
}
