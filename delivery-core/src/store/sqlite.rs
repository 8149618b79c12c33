use rusqlite::{Connection, Row, params};
use std::{
    path::Path,
    sync::{Mutex, MutexGuard},
};

use crate::model::{NewWeatherRecord, WeatherRecord};

use super::{StoreError, WeatherStore};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS weather (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        station_name TEXT NOT NULL,
        wmo_code TEXT NOT NULL,
        air_temperature REAL NOT NULL,
        wind_speed REAL NOT NULL,
        weather_phenomenon TEXT NOT NULL,
        timestamp INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_weather_station ON weather(station_name);
"#;

const COLUMNS: &str =
    "id, station_name, wmo_code, air_temperature, wind_speed, weather_phenomenon, timestamp";

/// SQLite-backed weather store.
#[derive(Debug)]
pub struct SqliteWeatherStore {
    conn: Mutex<Connection>,
}

impl SqliteWeatherStore {
    /// Open (or create) a database file and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl WeatherStore for SqliteWeatherStore {
    fn save(&self, record: NewWeatherRecord) -> Result<WeatherRecord, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO weather
                (station_name, wmo_code, air_temperature, wind_speed, weather_phenomenon, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.station_name,
                record.wmo_code,
                record.air_temperature,
                record.wind_speed,
                record.weather_phenomenon,
                record.observed_at,
            ],
        )?;
        let id = conn.last_insert_rowid();

        Ok(WeatherRecord::from_new(id, record))
    }

    fn find_all(&self) -> Result<Vec<WeatherRecord>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM weather ORDER BY id"))?;
        let rows = stmt
            .query_map([], row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn find_by_station_containing(
        &self,
        substring: &str,
    ) -> Result<Vec<WeatherRecord>, StoreError> {
        let conn = self.conn()?;
        // instr() is case-sensitive, LIKE is not.
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM weather WHERE instr(station_name, ?1) > 0 ORDER BY id"
        ))?;
        let rows = stmt
            .query_map(params![substring], row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<WeatherRecord> {
    Ok(WeatherRecord {
        id: row.get(0)?,
        station_name: row.get(1)?,
        wmo_code: row.get(2)?,
        air_temperature: row.get(3)?,
        wind_speed: row.get(4)?,
        weather_phenomenon: row.get(5)?,
        observed_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_record(station: &str, observed_at: i64) -> NewWeatherRecord {
        NewWeatherRecord {
            station_name: station.to_string(),
            wmo_code: "26038".into(),
            air_temperature: -1.5,
            wind_speed: 3.2,
            weather_phenomenon: "Light rain".into(),
            observed_at,
        }
    }

    #[test]
    fn empty_store_returns_empty_results() {
        let store = SqliteWeatherStore::open_in_memory().unwrap();

        assert!(store.find_all().unwrap().is_empty());
        assert!(store.find_by_station_containing("Tallinn").unwrap().is_empty());
    }

    #[test]
    fn save_assigns_increasing_ids() {
        let store = SqliteWeatherStore::open_in_memory().unwrap();

        let first = store.save(new_record("Tallinn-Harku", 100)).unwrap();
        let second = store.save(new_record("Pärnu", 100)).unwrap();

        assert!(second.id > first.id);
        assert_eq!(first.station_name, "Tallinn-Harku");
        assert_eq!(first.weather_phenomenon, "Light rain");
    }

    #[test]
    fn find_all_preserves_insertion_order() {
        let store = SqliteWeatherStore::open_in_memory().unwrap();
        store.save(new_record("Tartu-Tõravere", 300)).unwrap();
        store.save(new_record("Tallinn-Harku", 100)).unwrap();
        store.save(new_record("Pärnu", 200)).unwrap();

        let names: Vec<_> =
            store.find_all().unwrap().into_iter().map(|r| r.station_name).collect();
        assert_eq!(names, ["Tartu-Tõravere", "Tallinn-Harku", "Pärnu"]);
    }

    #[test]
    fn station_substring_match_is_case_sensitive() {
        let store = SqliteWeatherStore::open_in_memory().unwrap();
        store.save(new_record("Tallinn-Harku", 100)).unwrap();
        store.save(new_record("Tartu-Tõravere", 100)).unwrap();
        store.save(new_record("Tallinn-Harku", 200)).unwrap();

        let tallinn = store.find_by_station_containing("Tallinn").unwrap();
        assert_eq!(tallinn.len(), 2);
        assert_eq!(tallinn[0].observed_at, 100);
        assert_eq!(tallinn[1].observed_at, 200);

        assert_eq!(store.find_by_station_containing("Harku").unwrap().len(), 2);
        assert!(store.find_by_station_containing("tallinn").unwrap().is_empty());
    }

    #[test]
    fn non_ascii_station_names_roundtrip() {
        let store = SqliteWeatherStore::open_in_memory().unwrap();
        store.save(new_record("Pärnu", 100)).unwrap();

        let found = store.find_by_station_containing("Pärnu").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].station_name, "Pärnu");
    }
}
