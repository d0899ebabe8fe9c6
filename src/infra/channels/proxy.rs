use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error};

use crate::domain::models::channel::{ChannelError, ChannelKind, ChannelReceipt};
use crate::domain::ports::ChannelProvider;

use super::{classify_transport_error, read_response};

/// Relay that forwards the message to the customer on the studio's behalf.
pub struct ProxyRelayProvider {
    client: Client,
    relay_url: String,
    token: Option<String>,
}

impl ProxyRelayProvider {
    pub fn new(relay_url: String, token: Option<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            relay_url,
            token,
        }
    }
}

#[derive(Serialize)]
struct RelayPayload<'a> {
    recipient: &'a str,
    message: &'a str,
}

#[async_trait]
impl ChannelProvider for ProxyRelayProvider {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Proxy
    }

    async fn send(&self, target: &str, message: &str) -> Result<ChannelReceipt, ChannelError> {
        let mut request = self.client.post(&self.relay_url)
            .json(&RelayPayload { recipient: target, message });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let res = request.send().await.map_err(|e| {
            error!("Proxy relay connection error: {}", e);
            classify_transport_error(e)
        })?;

        let body = read_response(res).await?;
        debug!("Proxy relay accepted: {}", body);
        Ok(ChannelReceipt { message_id: None, response: body })
    }
}
