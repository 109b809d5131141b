use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};

use crate::application::{AppError, AppResult, FeedSource};

pub const DEFAULT_FEED_URL: &str = "https://www.berlin.de/polizei/service/versammlungsbehoerde/versammlungen-aufzuege/index.php/index/all.json";

pub struct HttpFeedSource {
    client: reqwest::Client,
    url: String,
}

impl HttpFeedSource {
    pub fn new(url: String, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self) -> AppResult<Vec<u8>> {
        let resp = self
            .client
            .get(&self.url)
            .header(USER_AGENT, "demowatch")
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AppError::Provider(e.to_string()))?
            .error_for_status()
            .map_err(|e| AppError::Provider(e.to_string()))?;

        let body = resp
            .bytes()
            .await
            .map_err(|e| AppError::Provider(e.to_string()))?;

        tracing::debug!(url = %self.url, bytes = body.len(), "feed fetched");
        Ok(body.to_vec())
    }
}
