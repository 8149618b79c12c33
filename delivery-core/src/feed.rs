use async_trait::async_trait;
use std::fmt::Debug;

pub mod ilmateenistus;
pub mod xml;

pub use ilmateenistus::HttpObservationFeed;
pub use xml::parse_observations;

/// One `<station>` entry of the observation feed, with raw text values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationObservation {
    pub name: String,
    pub wmo_code: String,
    pub air_temperature: String,
    pub wind_speed: String,
    pub phenomenon: String,
}

/// A parsed observation document: one timestamp shared by all stations.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationDocument {
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    pub stations: Vec<StationObservation>,
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Failed to fetch observation feed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Observation feed request failed with status {status}: {body}")]
    Status { status: reqwest::StatusCode, body: String },

    #[error("Failed to parse observation XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed observation document: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait ObservationFeed: Send + Sync + Debug {
    async fn fetch(&self) -> Result<ObservationDocument, FeedError>;
}
