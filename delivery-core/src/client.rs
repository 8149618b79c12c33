use anyhow::{Context, Result, anyhow};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::{model::WeatherRecord, service::DeliveryCost};

/// Client for a running delivery fee API.
#[derive(Debug, Clone)]
pub struct DeliveryApiClient {
    base_url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl DeliveryApiClient {
    /// `base_url` is the API root, e.g. `http://localhost:8080/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http: Client::new() }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn delivery_cost(&self, city: &str, vehicle: &str) -> Result<DeliveryCost> {
        let res = self
            .http
            .get(format!("{}/delivery-cost", self.base_url))
            .query(&[("city", city), ("vehicle", vehicle)])
            .send()
            .await
            .context("Failed to send delivery cost request")?;

        let status = res.status();
        let body = res.text().await.context("Failed to read delivery cost response body")?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|err| err.message)
                .unwrap_or_else(|_| truncate_body(&body));
            return Err(anyhow!("Delivery cost request failed with status {status}: {message}"));
        }

        serde_json::from_str(&body).context("Failed to parse delivery cost JSON")
    }

    /// Latest weather for `city`, or `None` when nothing has been recorded.
    pub async fn latest_weather(&self, city: &str) -> Result<Option<WeatherRecord>> {
        let res = self
            .http
            .get(format!("{}/latest-weather", self.base_url))
            .query(&[("city", city)])
            .send()
            .await
            .context("Failed to send latest weather request")?;

        let status = res.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body = res.text().await.context("Failed to read latest weather response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "Latest weather request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let record = serde_json::from_str(&body).context("Failed to parse latest weather JSON")?;
        Ok(Some(record))
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
