//! Weather ingestion: fetch the observation feed, keep the monitored
//! stations and append one record per station to the store.
//!
//! A cycle is all-or-nothing up to the first write. Fetch, parse and field
//! conversion errors abort before anything is saved. Records are then saved
//! one by one in feed order and the first failed save aborts the rest of the
//! cycle; records saved before it are kept. Saves run on the blocking pool.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::{
    feed::{FeedError, ObservationDocument, ObservationFeed, StationObservation},
    model::NewWeatherRecord,
    store::{StoreError, WeatherStore},
};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("Station '{station}' has invalid {field} value '{value}'")]
    InvalidField {
        station: String,
        field: &'static str,
        value: String,
    },

    #[error("Failed to save observation for '{station}' after {saved} saved: {source}")]
    Persist {
        station: String,
        saved: usize,
        #[source]
        source: StoreError,
    },

    #[error("Observation save task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Summary of a finished ingestion cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub observed_at: i64,
    /// Stations present in the feed.
    pub seen: usize,
    /// Records written to the store.
    pub saved: usize,
}

#[derive(Debug)]
pub struct Ingestor {
    feed: Arc<dyn ObservationFeed>,
    store: Arc<dyn WeatherStore>,
    stations: Vec<String>,
}

impl Ingestor {
    pub fn new(
        feed: Arc<dyn ObservationFeed>,
        store: Arc<dyn WeatherStore>,
        stations: Vec<String>,
    ) -> Self {
        Self { feed, store, stations }
    }

    /// Run a single ingestion cycle to completion.
    pub async fn run_once(&self) -> Result<IngestReport, IngestError> {
        info!(stations = ?self.stations, "starting weather ingestion");

        let document = self.feed.fetch().await.inspect_err(|err| {
            error!(%err, "weather feed unavailable, skipping cycle");
        })?;

        let records = extract_records(&document, &self.stations)?;

        let mut saved = 0;
        for record in records {
            let station = record.station_name.clone();
            let store = Arc::clone(&self.store);
            match tokio::task::spawn_blocking(move || store.save(record)).await? {
                Ok(stored) => {
                    debug!(id = stored.id, station = %stored.station_name, "saved observation");
                    saved += 1;
                }
                Err(source) => {
                    error!(%station, saved, err = %source, "aborting ingestion cycle");
                    return Err(IngestError::Persist { station, saved, source });
                }
            }
        }

        let report = IngestReport {
            observed_at: document.timestamp,
            seen: document.stations.len(),
            saved,
        };
        info!(
            observed_at = report.observed_at,
            seen = report.seen,
            saved = report.saved,
            "weather ingestion finished"
        );
        Ok(report)
    }
}

/// Convert every monitored station in `document` into a record. Stations not
/// listed in `monitored` (exact name match) are skipped.
pub fn extract_records(
    document: &ObservationDocument,
    monitored: &[String],
) -> Result<Vec<NewWeatherRecord>, IngestError> {
    document
        .stations
        .iter()
        .filter(|station| {
            let keep = monitored.iter().any(|name| *name == station.name);
            if !keep {
                debug!(station = %station.name, "skipping unmonitored station");
            }
            keep
        })
        .map(|station| to_record(station, document.timestamp))
        .collect()
}

fn to_record(
    station: &StationObservation,
    observed_at: i64,
) -> Result<NewWeatherRecord, IngestError> {
    Ok(NewWeatherRecord {
        station_name: station.name.clone(),
        wmo_code: station.wmo_code.clone(),
        air_temperature: parse_number(station, "airtemperature", &station.air_temperature)?,
        wind_speed: parse_number(station, "windspeed", &station.wind_speed)?,
        weather_phenomenon: station.phenomenon.clone(),
        observed_at,
    })
}

fn parse_number(
    station: &StationObservation,
    field: &'static str,
    value: &str,
) -> Result<f64, IngestError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .ok_or_else(|| IngestError::InvalidField {
            station: station.name.clone(),
            field,
            value: value.to_string(),
        })
}
