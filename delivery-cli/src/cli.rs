use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use delivery_core::{
    City, Config, DeliveryApiClient, DeliveryCost, DeliveryService, HttpObservationFeed,
    IngestSchedule, Ingestor, SqliteWeatherStore, Vehicle, WeatherStore,
};
use inquire::{MultiSelect, Text};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, info};

use crate::{scheduler, server};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "delivery", version, about = "Weather-aware delivery fee service")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively edit the configuration file.
    Configure,

    /// Serve the REST API and ingest weather on schedule.
    Serve,

    /// Run one weather ingestion cycle now.
    Ingest,

    /// Ask a running server for a delivery fee.
    Cost {
        /// City name, e.g. "Tallinn".
        city: String,

        /// Vehicle type: Car, Scooter or Bike.
        vehicle: String,
    },

    /// Ask a running server for the latest weather in a city.
    Latest {
        /// City or station name fragment.
        city: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        setup_logging(self.verbose);

        let config_path = match &self.config {
            Some(path) => path.clone(),
            None => Config::config_file_path()?,
        };
        debug!(path = %config_path.display(), "loading configuration");
        let config = Config::load_from(&config_path)?;

        match self.command {
            Command::Configure => configure(config, &config_path)?,
            Command::Serve => serve(config).await?,
            Command::Ingest => {
                let ingestor = ingestor(&config, open_store(&config)?);
                let report = ingestor.run_once().await?;
                println!(
                    "Saved {} of {} observations (feed timestamp {})",
                    report.saved, report.seen, report.observed_at
                );
            }
            Command::Cost { city, vehicle } => {
                let client = DeliveryApiClient::new(config.api_base_url.clone());
                match client.delivery_cost(&city, &vehicle).await? {
                    DeliveryCost::Fee { fee } => {
                        println!("Delivery by {vehicle} in {city} costs {fee:.2} €")
                    }
                    DeliveryCost::Forbidden { message } => println!("{message}"),
                }
            }
            Command::Latest { city } => {
                let client = DeliveryApiClient::new(config.api_base_url.clone());
                match client.latest_weather(&city).await? {
                    Some(w) => {
                        let phenomenon = match w.weather_phenomenon.as_str() {
                            "" => "-",
                            phenomenon => phenomenon,
                        };
                        println!(
                            "{} ({}): {:.1} °C, wind {:.1} m/s, {}",
                            w.station_name,
                            w.observed_at,
                            w.air_temperature,
                            w.wind_speed,
                            phenomenon,
                        )
                    }
                    None => println!("No weather recorded for {city} yet."),
                }
            }
        }

        Ok(())
    }
}

async fn serve(config: Config) -> Result<()> {
    let schedule = config.ingest_schedule()?;
    let config = Arc::new(config);
    let store = open_store(&config)?;

    let service = DeliveryService::new(config.clone(), store.clone());
    let ingestor = ingestor(&config, store);

    info!(%schedule, "starting weather ingestion scheduler");
    tokio::spawn(scheduler::run(ingestor, schedule));

    let app = server::router(service, &config.allowed_origin)?;
    server::serve(&config.listen_addr, app).await
}

fn open_store(config: &Config) -> Result<Arc<dyn WeatherStore>> {
    let path = config.database_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory: {}", parent.display()))?;
    }

    let store = SqliteWeatherStore::open(&path)
        .with_context(|| format!("Failed to open weather database: {}", path.display()))?;
    info!(path = %path.display(), "opened weather database");
    Ok(Arc::new(store))
}

fn ingestor(config: &Config, store: Arc<dyn WeatherStore>) -> Ingestor {
    let feed = HttpObservationFeed::new(config.feed_url.clone());
    Ingestor::new(Arc::new(feed), store, config.stations.clone())
}

fn configure(mut config: Config, path: &Path) -> Result<()> {
    config.listen_addr = Text::new("Listen address:")
        .with_default(&config.listen_addr)
        .prompt()?;
    config.api_base_url = Text::new("API base URL (used by `cost` and `latest`):")
        .with_default(&config.api_base_url)
        .prompt()?;
    config.allowed_origin = Text::new("Allowed CORS origin:")
        .with_default(&config.allowed_origin)
        .prompt()?;
    config.feed_url = Text::new("Observation feed URL:")
        .with_default(&config.feed_url)
        .prompt()?;
    config.schedule = Text::new("Ingestion schedule (sec min hour day month weekday):")
        .with_default(&config.schedule)
        .with_validator(|input: &str| {
            Ok(match input.parse::<IngestSchedule>() {
                Ok(_) => inquire::validator::Validation::Valid,
                Err(err) => inquire::validator::Validation::Invalid(err.to_string().into()),
            })
        })
        .prompt()?;

    let stations = Text::new("Monitored stations (comma separated):")
        .with_default(&config.stations.join(", "))
        .prompt()?;
    config.stations = stations
        .split(',')
        .map(str::trim)
        .filter(|station| !station.is_empty())
        .map(str::to_string)
        .collect();

    let selected: Vec<usize> = City::all()
        .iter()
        .enumerate()
        .filter(|(_, city)| config.is_city_enabled(**city))
        .map(|(idx, _)| idx)
        .collect();
    config.cities = MultiSelect::new("Cities:", City::all().to_vec())
        .with_default(&selected)
        .prompt()?;

    let selected: Vec<usize> = Vehicle::all()
        .iter()
        .enumerate()
        .filter(|(_, vehicle)| config.is_vehicle_enabled(**vehicle))
        .map(|(idx, _)| idx)
        .collect();
    config.vehicles = MultiSelect::new("Vehicle types:", Vehicle::all().to_vec())
        .with_default(&selected)
        .prompt()?;

    config.validate()?;
    config.save_to(path)?;
    println!("Configuration saved to {}", path.display());

    Ok(())
}

fn setup_logging(verbose: u8) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("delivery_core={level},delivery={level},tower_http=info"))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .init();
}
