//! Opening the upload and event WebSocket channels.

use std::time::Duration;

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::debug;

use dubhub_protocol::constants::{TOKEN_QUERY_PARAM, WS_MAX_MESSAGE_SIZE};

use crate::error::{Channel, UploadError};

/// A connected client WebSocket.
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Builds the WebSocket URL for a channel.
///
/// `http`/`https` become `ws`/`wss`. The upload token is appended as a
/// query parameter unless the URL already carries one.
pub fn channel_url(raw: &str, token: &str) -> Result<String, UploadError> {
    let raw = raw.trim();
    let url = if let Some(rest) = raw.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = raw.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if raw.starts_with("ws://") || raw.starts_with("wss://") {
        raw.to_string()
    } else {
        return Err(UploadError::InvalidUrl(redact(raw).to_string()));
    };

    if has_token_param(&url) {
        return Ok(url);
    }
    let encoded = utf8_percent_encode(token, NON_ALPHANUMERIC);
    let sep = if url.contains('?') { '&' } else { '?' };
    Ok(format!("{url}{sep}{TOKEN_QUERY_PARAM}={encoded}"))
}

fn has_token_param(url: &str) -> bool {
    let Some((_, query)) = url.split_once('?') else {
        return false;
    };
    query
        .split('&')
        .any(|pair| pair.split('=').next() == Some(TOKEN_QUERY_PARAM))
}

/// Strips the query string so tokens never reach the logs.
pub(crate) fn redact(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

/// Opens one channel, giving up after `timeout`.
pub async fn connect(
    url: &str,
    channel: Channel,
    timeout: Duration,
) -> Result<WsStream, UploadError> {
    let mut ws_config = WebSocketConfig::default();
    ws_config.max_message_size = Some(WS_MAX_MESSAGE_SIZE);
    ws_config.max_frame_size = Some(WS_MAX_MESSAGE_SIZE);

    debug!(%channel, url = redact(url), "opening channel");
    let attempt = tokio_tungstenite::connect_async_with_config(url, Some(ws_config), false);
    match tokio::time::timeout(timeout, attempt).await {
        Ok(Ok((ws, _))) => {
            debug!(%channel, "channel open");
            Ok(ws)
        }
        Ok(Err(source)) => Err(UploadError::Connect { channel, source }),
        Err(_) => Err(UploadError::ConnectTimeout(channel)),
    }
}
