use std::time::Duration;

use log::{error, info};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::time::sleep;

use crate::models::WeatherRecord;

const SEND_ATTEMPTS: u32 = 3;
const SEND_RETRY_DELAY: Duration = Duration::from_secs(2);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("request to weather API failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("weather API answered with status {0}")]
    Status(StatusCode),
}

/// Client for the downstream ingestion API.
pub struct ApiClient {
    client: Client,
    logs_url: String,
    max_attempts: u32,
    retry_delay: Duration,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<ApiClient, ForwardError> {
        ApiClient::with_policy(base_url, SEND_ATTEMPTS, SEND_RETRY_DELAY)
    }

    pub(crate) fn with_policy(
        base_url: &str,
        max_attempts: u32,
        retry_delay: Duration,
    ) -> Result<ApiClient, ForwardError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(ApiClient {
            client,
            logs_url: format!("{}/api/weather/logs", base_url.trim_end_matches('/')),
            max_attempts,
            retry_delay,
        })
    }

    /// Posts the record to the ingestion endpoint. Network errors and non-2xx
    /// responses count the same toward the attempt limit; the last failure is
    /// returned when no attempts remain.
    pub async fn send(&self, record: &WeatherRecord) -> Result<(), ForwardError> {
        let mut attempt = 1;
        loop {
            let failure = match self.client.post(&self.logs_url).json(record).send().await {
                Ok(response) if response.status().is_success() => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    info!("API response: {} - {}", status, body);
                    return Ok(());
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    error!(
                        "API error: {} - {} (attempt {}/{})",
                        status, body, attempt, self.max_attempts
                    );
                    ForwardError::Status(status)
                }
                Err(e) => {
                    error!(
                        "HTTP request error (attempt {}/{}): {}",
                        attempt, self.max_attempts, e
                    );
                    ForwardError::Request(e)
                }
            };

            if attempt >= self.max_attempts {
                return Err(failure);
            }
            attempt += 1;
            sleep(self.retry_delay).await;
        }
    }
}
