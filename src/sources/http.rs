use std::time::Duration;

use reqwest::{Client, Response, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{LogSource, SourceHealth};
use crate::error::SourceError;
use crate::model::{HistoryPage, LogEntry, RequestLogRecord};

/// A log source backed by the log server's JSON API
pub struct HttpSource {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct HealthBody {
    #[serde(default)]
    port: Option<u16>,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        match Url::parse(&base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(SourceError::Unavailable(format!(
                    "unsupported scheme '{}' in {}",
                    url.scheme(),
                    base_url
                )));
            }
            Err(e) => return Err(SourceError::Unavailable(format!("bad server url {}: {}", base_url, e))),
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Turn non-2xx statuses into `SourceError::Status`
    async fn check(response: Response) -> Result<Response, SourceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(SourceError::Status {
            status: status.as_u16(),
            message: if message.is_empty() {
                status.canonical_reason().unwrap_or("unknown").to_string()
            } else {
                message
            },
        })
    }

    /// Decode a body ourselves so a bad payload becomes `SourceError::Decode`
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, SourceError> {
        let body = Self::check(response).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait::async_trait]
impl LogSource for HttpSource {
    async fn fetch_pending(&self) -> Result<Vec<RequestLogRecord>, SourceError> {
        let response = self.client.get(self.url("requests/pending")).send().await?;
        Self::decode(response).await
    }

    async fn fetch_historical(&self, offset: usize, limit: usize) -> Result<HistoryPage, SourceError> {
        debug!(offset, limit, "HttpSource::fetch_historical");
        let response = self
            .client
            .get(self.url("requests/history"))
            .query(&[("offset", offset), ("limit", limit)])
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn purge_historical(&self) -> Result<(), SourceError> {
        let response = self.client.delete(self.url("requests/history")).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn fetch_tail(&self, since: i64) -> Result<Vec<LogEntry>, SourceError> {
        let response = self
            .client
            .get(self.url("console"))
            .query(&[("since", since)])
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn upload_local(&self, entries: &[LogEntry]) -> Result<(), SourceError> {
        debug!(count = entries.len(), "HttpSource::upload_local");
        let response = self.client.post(self.url("console")).json(entries).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn health(&self) -> Result<SourceHealth, SourceError> {
        let response = self.client.get(self.url("health")).send().await?;
        let body: HealthBody = Self::decode(response).await?;
        let label = match body.port {
            Some(port) => format!("connected (port {})", port),
            None => "connected".to_string(),
        };
        Ok(SourceHealth { label })
    }
}
