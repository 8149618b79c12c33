use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    feed::ilmateenistus::DEFAULT_FEED_URL,
    fee::FeeTable,
    model::{City, Vehicle},
    schedule::{DEFAULT_SCHEDULE, IngestSchedule},
};

/// Top-level configuration stored on disk. Loaded once at startup and
/// treated as read-only afterwards.
///
/// Example TOML:
/// listen_addr = "0.0.0.0:8080"
/// stations = ["Tallinn-Harku", "Tartu-Tõravere", "Pärnu"]
/// cities = ["Tallinn", "Tartu"]
///
/// [base_fees.tartu]
/// car = 3.5
/// scooter = 3.0
/// bike = 2.5
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the HTTP server binds to.
    pub listen_addr: String,

    /// Base URL of a running API, used by the client commands.
    pub api_base_url: String,

    /// Origin allowed to call the API from a browser.
    pub allowed_origin: String,

    /// SQLite database file; defaults to the platform data directory.
    pub database_path: Option<PathBuf>,

    /// Observation XML feed.
    pub feed_url: String,

    /// Cron-style ingestion trigger, `sec min hour day month weekday`.
    pub schedule: String,

    /// Station names to ingest (exact match).
    pub stations: Vec<String>,

    /// Cities where delivery is offered.
    pub cities: Vec<City>,

    /// Vehicle types that may be requested.
    pub vehicles: Vec<Vehicle>,

    pub base_fees: FeeTable,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            api_base_url: "http://localhost:8080/api".to_string(),
            allowed_origin: "http://localhost:8080".to_string(),
            database_path: None,
            feed_url: DEFAULT_FEED_URL.to_string(),
            schedule: DEFAULT_SCHEDULE.to_string(),
            stations: vec![
                "Tallinn-Harku".to_string(),
                "Tartu-Tõravere".to_string(),
                "Pärnu".to_string(),
            ],
            cities: City::all().to_vec(),
            vehicles: Vehicle::all().to_vec(),
            base_fees: FeeTable::default(),
        }
    }
}

impl Config {
    /// Load config from the default location, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Load config from `path`, or return defaults if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        cfg.validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Database file, either configured or inside the platform data directory.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::project_dirs()?.data_dir().join("weather.db")),
        }
    }

    pub fn ingest_schedule(&self) -> Result<IngestSchedule> {
        Ok(self.schedule.parse::<IngestSchedule>()?)
    }

    pub fn is_city_enabled(&self, city: City) -> bool {
        self.cities.contains(&city)
    }

    pub fn is_vehicle_enabled(&self, vehicle: Vehicle) -> bool {
        self.vehicles.contains(&vehicle)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cities.is_empty() {
            bail!("At least one city must be configured");
        }
        if self.vehicles.is_empty() {
            bail!("At least one vehicle type must be configured");
        }
        if self.stations.iter().all(|station| station.trim().is_empty()) {
            bail!("At least one weather station must be configured");
        }
        self.ingest_schedule()?;
        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("ee", "delivery-fee", "delivery")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = Config::default();
        cfg.validate().expect("default config must be valid");

        assert_eq!(cfg.cities, City::all());
        assert_eq!(cfg.vehicles, Vehicle::all());
        assert_eq!(cfg.stations, ["Tallinn-Harku", "Tartu-Tõravere", "Pärnu"]);
        assert_eq!(cfg.ingest_schedule().unwrap(), IngestSchedule::default());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            listen_addr = "0.0.0.0:9000"
            cities = ["Tartu", "Pärnu"]

            [base_fees.tartu]
            car = 5.0
            scooter = 4.0
            "#,
        )
        .unwrap();

        assert_eq!(cfg.listen_addr, "0.0.0.0:9000");
        assert!(!cfg.is_city_enabled(City::Tallinn));
        assert!(cfg.is_city_enabled(City::Parnu));
        assert!(cfg.is_vehicle_enabled(Vehicle::Bike));
        assert_eq!(cfg.base_fees.base_fee(City::Tartu, Vehicle::Car), 5.0);
        assert_eq!(cfg.base_fees.base_fee(City::Tartu, Vehicle::Bike), 2.5);
        assert_eq!(cfg.base_fees.base_fee(City::Tallinn, Vehicle::Car), 4.0);
        assert_eq!(cfg.feed_url, DEFAULT_FEED_URL);
    }

    #[test]
    fn single_base_fee_override_keeps_the_rest() {
        let cfg: Config = toml::from_str("[base_fees.tartu]\ncar = 5.0\n").unwrap();

        assert_eq!(cfg.base_fees.base_fee(City::Tartu, Vehicle::Car), 5.0);
        assert_eq!(cfg.base_fees.base_fee(City::Tartu, Vehicle::Scooter), 3.0);
        assert_eq!(cfg.base_fees.base_fee(City::Parnu, Vehicle::Bike), 2.0);
        cfg.validate().unwrap();
    }

    #[test]
    fn unknown_city_in_toml_is_rejected() {
        let res = toml::from_str::<Config>(r#"cities = ["Narva"]"#);
        assert!(res.is_err());
    }

    #[test]
    fn validate_rejects_empty_lists() {
        let cfg = Config { vehicles: Vec::new(), ..Config::default() };
        assert!(cfg.validate().unwrap_err().to_string().contains("vehicle"));

        let cfg = Config { stations: vec![" ".into()], ..Config::default() };
        assert!(cfg.validate().unwrap_err().to_string().contains("station"));
    }

    #[test]
    fn validate_rejects_bad_schedule() {
        let cfg = Config { schedule: "every hour".into(), ..Config::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn configured_database_path_wins() {
        let cfg = Config { database_path: Some("/tmp/w.db".into()), ..Config::default() };
        assert_eq!(cfg.database_path().unwrap(), PathBuf::from("/tmp/w.db"));
    }

    #[test]
    fn toml_roundtrip_preserves_values() {
        let cfg = Config { cities: vec![City::Parnu], ..Config::default() };
        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();

        assert_eq!(parsed.cities, [City::Parnu]);
        assert_eq!(parsed.base_fees, cfg.base_fees);
        assert_eq!(parsed.schedule, cfg.schedule);
    }
}
