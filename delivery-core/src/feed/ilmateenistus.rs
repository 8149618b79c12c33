use async_trait::async_trait;
use reqwest::Client;

use crate::client::truncate_body;

use super::{FeedError, ObservationDocument, ObservationFeed, parse_observations};

/// Public observation feed of the Estonian Environment Agency.
pub const DEFAULT_FEED_URL: &str = "https://www.ilmateenistus.ee/ilma_andmed/xml/observations.php";

/// Fetches the observation XML over HTTP.
#[derive(Debug, Clone)]
pub struct HttpObservationFeed {
    url: String,
    http: Client,
}

impl HttpObservationFeed {
    pub fn new(url: String) -> Self {
        Self { url, http: Client::new() }
    }
}

#[async_trait]
impl ObservationFeed for HttpObservationFeed {
    async fn fetch(&self) -> Result<ObservationDocument, FeedError> {
        let res = self.http.get(&self.url).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FeedError::Status { status, body: truncate_body(&body) });
        }

        parse_observations(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_feed_is_a_transport_error() {
        let feed = HttpObservationFeed::new("http://127.0.0.1:9/observations.php".into());
        let err = feed.fetch().await.unwrap_err();
        assert!(matches!(err, FeedError::Http(_)));
    }
}
