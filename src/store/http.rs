//! HTTP + websocket implementation of `RemoteStore`.
//!
//! REST calls go through one `reqwest::Client` carrying the `apikey` and
//! bearer headers. The live feed is a websocket of JSON text messages. Pure
//! payload parsing lives in free functions so it is testable without a
//! server.

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;

use std::time::Duration;

use canvas::grid::Cell;
use futures::StreamExt;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tracing::{debug, warn};

use super::{CellStream, NewCell, RemoteStore, StoreError};
use crate::config::StoreConfig;

const CELLS_PATH: &str = "/rest/v1/pixels";
const COOLDOWNS_PATH: &str = "/rest/v1/user_cooldowns";
const INSERT_EVENT: &str = "INSERT";

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpStore {
    http: reqwest::Client,
    base_url: String,
    live_url: String,
    api_key: String,
    connect_timeout: Duration,
}

impl HttpStore {
    /// # Errors
    ///
    /// Returns [`StoreError::HttpClientBuild`] if the key is not a valid
    /// header value or the client cannot be built.
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", header_value(&config.api_key)?);
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", config.api_key))?);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| StoreError::HttpClientBuild(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            live_url: config.live_url.clone(),
            api_key: config.api_key.clone(),
            connect_timeout: Duration::from_secs(config.timeouts.connect_secs),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn read_body(response: reqwest::Response) -> Result<String, StoreError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        if !status.is_success() {
            return Err(StoreError::Status { status: status.as_u16(), body });
        }
        Ok(body)
    }
}

fn header_value(value: &str) -> Result<HeaderValue, StoreError> {
    HeaderValue::from_str(value).map_err(|e| StoreError::HttpClientBuild(e.to_string()))
}

#[async_trait::async_trait]
impl RemoteStore for HttpStore {
    async fn fetch_all_cells(&self) -> Result<Vec<Cell>, StoreError> {
        let response = self
            .http
            .get(self.url(CELLS_PATH))
            .query(&[("select", "x,y,color,user_name")])
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        parse_cells(&Self::read_body(response).await?)
    }

    async fn insert_cell(&self, cell: &NewCell) -> Result<(), StoreError> {
        let response = self
            .http
            .post(self.url(CELLS_PATH))
            .header("Prefer", "return=minimal")
            .json(&[cell])
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        Self::read_body(response).await?;
        Ok(())
    }

    async fn fetch_last_placement(&self, user_id: &str) -> Result<Option<i64>, StoreError> {
        let response = self
            .http
            .get(self.url(COOLDOWNS_PATH))
            .query(&[("select", "last_placed_at".to_owned()), ("user_id", format!("eq.{user_id}"))])
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        parse_last_placed(&Self::read_body(response).await?)
    }

    async fn subscribe(&self) -> Result<CellStream, StoreError> {
        let mut request = self
            .live_url
            .as_str()
            .into_client_request()
            .map_err(|e| StoreError::Live(e.to_string()))?;
        let key = self
            .api_key
            .parse()
            .map_err(|_| StoreError::Live("API key is not a valid header value".into()))?;
        request.headers_mut().insert("apikey", key);

        let (socket, _) = tokio::time::timeout(self.connect_timeout, connect_async(request))
            .await
            .map_err(|_| StoreError::Live(format!("handshake timed out after {}s", self.connect_timeout.as_secs())))?
            .map_err(|e| StoreError::Live(e.to_string()))?;
        debug!(url = %self.live_url, "live feed connected");

        let stream = socket.filter_map(|message| async move {
            match message {
                Ok(Message::Text(text)) => match parse_live_message(text.as_str()) {
                    Ok(cell) => cell.map(Ok),
                    Err(e) => {
                        warn!(error = %e, "dropping malformed live message");
                        None
                    }
                },
                Ok(_) => None,
                Err(e) => Some(Err(StoreError::Live(e.to_string()))),
            }
        });
        Ok(stream.boxed())
    }
}

// =============================================================================
// WIRE PARSING
// =============================================================================

#[derive(Deserialize)]
struct LiveMessage {
    #[serde(rename = "type")]
    kind: String,
    record: Option<Cell>,
}

#[derive(Deserialize)]
struct CooldownRow {
    last_placed_at: Option<String>,
}

/// Parse the bulk cell listing.
///
/// # Errors
///
/// Returns [`StoreError::Decode`] for anything but a JSON array of cells.
pub fn parse_cells(body: &str) -> Result<Vec<Cell>, StoreError> {
    serde_json::from_str(body).map_err(|e| StoreError::Decode(e.to_string()))
}

/// Parse one live-feed message. Only insert events carry a cell; other event
/// types yield `None`.
///
/// # Errors
///
/// Returns [`StoreError::Decode`] for invalid JSON or an insert without a record.
pub fn parse_live_message(text: &str) -> Result<Option<Cell>, StoreError> {
    let message: LiveMessage = serde_json::from_str(text).map_err(|e| StoreError::Decode(e.to_string()))?;
    if message.kind != INSERT_EVENT {
        return Ok(None);
    }
    message
        .record
        .map(Some)
        .ok_or_else(|| StoreError::Decode("insert event without record".into()))
}

/// Parse the cooldown lookup into epoch milliseconds.
///
/// An empty result or a null timestamp means the user never placed.
///
/// # Errors
///
/// Returns [`StoreError::Decode`] for invalid JSON or a non-RFC 3339 timestamp.
pub fn parse_last_placed(body: &str) -> Result<Option<i64>, StoreError> {
    let rows: Vec<CooldownRow> = serde_json::from_str(body).map_err(|e| StoreError::Decode(e.to_string()))?;
    let Some(stamp) = rows.into_iter().find_map(|row| row.last_placed_at) else {
        return Ok(None);
    };
    let at = OffsetDateTime::parse(&stamp, &Rfc3339)
        .map_err(|e| StoreError::Decode(format!("last_placed_at {stamp:?}: {e}")))?;
    let ms = at.unix_timestamp_nanos() / 1_000_000;
    i64::try_from(ms)
        .map(Some)
        .map_err(|_| StoreError::Decode(format!("last_placed_at out of range: {stamp}")))
}
