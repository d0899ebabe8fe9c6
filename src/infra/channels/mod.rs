pub mod line;
pub mod proxy;

use reqwest::Response;

use crate::domain::models::channel::ChannelError;

fn classify_transport_error(e: reqwest::Error) -> ChannelError {
    if e.is_timeout() {
        ChannelError::Timeout
    } else {
        ChannelError::Transient(format!("connection error: {}", e))
    }
}

/// Splits a provider response into its body on 2xx, or a classified error.
async fn read_response(res: Response) -> Result<String, ChannelError> {
    let status = res.status();
    let text = res.text().await.unwrap_or_default();
    if status.is_success() {
        Ok(text)
    } else {
        Err(ChannelError::from_status(status.as_u16(), &text))
    }
}
