use std::fmt::Debug;

use crate::model::{NewWeatherRecord, WeatherRecord};

pub mod sqlite;

pub use sqlite::SqliteWeatherStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Database connection lock was poisoned")]
    LockPoisoned,
}

/// Append-only collection of weather observations.
///
/// Records are returned in insertion order, and ids grow with insertion
/// order, so the id doubles as the arrival sequence number.
pub trait WeatherStore: Send + Sync + Debug {
    /// Persist a new observation and return it with its assigned id.
    fn save(&self, record: NewWeatherRecord) -> Result<WeatherRecord, StoreError>;

    fn find_all(&self) -> Result<Vec<WeatherRecord>, StoreError>;

    /// Records whose station name contains `substring` (case-sensitive).
    fn find_by_station_containing(&self, substring: &str)
    -> Result<Vec<WeatherRecord>, StoreError>;
}

/// Pick the most recent observation: highest `observed_at`, and among equal
/// timestamps the one inserted last.
pub fn latest(records: Vec<WeatherRecord>) -> Option<WeatherRecord> {
    records
        .into_iter()
        .max_by_key(|record| (record.observed_at, record.id))
}
