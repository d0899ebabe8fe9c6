use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::domain::models::channel::{ChannelError, ChannelKind, ChannelReceipt};
use crate::domain::ports::ChannelProvider;

use super::{classify_transport_error, read_response};

/// Push-message client for the LINE Messaging API.
pub struct LineMessagingProvider {
    client: Client,
    api_url: String,
    access_token: String,
}

impl LineMessagingProvider {
    pub fn new(api_url: String, access_token: String, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_url,
            access_token,
        }
    }
}

#[derive(Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

#[derive(Serialize)]
struct PushPayload<'a> {
    to: &'a str,
    messages: [TextMessage<'a>; 1],
}

fn sent_message_id(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    parsed.get("sentMessages")?
        .as_array()?
        .first()?
        .get("id")?
        .as_str()
        .map(str::to_string)
}

#[async_trait]
impl ChannelProvider for LineMessagingProvider {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Line
    }

    async fn send(&self, target: &str, message: &str) -> Result<ChannelReceipt, ChannelError> {
        let payload = PushPayload {
            to: target,
            messages: [TextMessage { kind: "text", text: message }],
        };

        let res = self.client.post(&self.api_url)
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!("LINE push connection error: {}", e);
                classify_transport_error(e)
            })?;

        let body = read_response(res).await?;
        debug!("LINE push accepted: {}", body);
        Ok(ChannelReceipt { message_id: sent_message_id(&body), response: body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let payload = PushPayload { to: "U123", messages: [TextMessage { kind: "text", text: "hi" }] };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, serde_json::json!({"to": "U123", "messages": [{"type": "text", "text": "hi"}]}));
    }

    #[test]
    fn test_sent_message_id() {
        assert_eq!(sent_message_id(r#"{"sentMessages":[{"id":"461230966842064897","quoteToken":"x"}]}"#), Some("461230966842064897".into()));
        assert_eq!(sent_message_id("{}"), None);
        assert_eq!(sent_message_id(""), None);
    }
}
