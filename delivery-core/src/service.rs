use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    config::Config,
    fee::{FeeDecision, FeeError, compute_fee},
    model::{City, NewWeatherRecord, Vehicle, WeatherRecord},
    store::{self, StoreError, WeatherStore},
};

/// Caller-facing answer to a delivery fee request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeliveryCost {
    Fee { fee: f64 },
    /// The weather rules out the requested vehicle.
    Forbidden { message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Delivery can not be done in given city.")]
    UnknownCity(String),

    #[error("Delivery can not be done with given vehicle.")]
    UnknownVehicle(String),

    #[error(transparent)]
    DataUnavailable(#[from] FeeError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// Errors caused by the request itself rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ServiceError::UnknownCity(_) | ServiceError::UnknownVehicle(_))
    }
}

/// Fee queries and weather access on top of a weather store.
#[derive(Debug, Clone)]
pub struct DeliveryService {
    config: Arc<Config>,
    store: Arc<dyn WeatherStore>,
}

impl DeliveryService {
    pub fn new(config: Arc<Config>, store: Arc<dyn WeatherStore>) -> Self {
        Self { config, store }
    }

    /// Delivery fee for `city` and `vehicle` using the latest weather there.
    pub fn delivery_cost(&self, city: &str, vehicle: &str) -> Result<DeliveryCost, ServiceError> {
        let city = City::try_from(city)
            .ok()
            .filter(|city| self.config.is_city_enabled(*city))
            .ok_or_else(|| ServiceError::UnknownCity(city.to_string()))?;
        let vehicle = Vehicle::try_from(vehicle)
            .ok()
            .filter(|vehicle| self.config.is_vehicle_enabled(*vehicle))
            .ok_or_else(|| ServiceError::UnknownVehicle(vehicle.to_string()))?;

        let weather = self.latest_weather(city.station_query())?;

        let cost = match compute_fee(&self.config.base_fees, city, vehicle, weather.as_ref())? {
            FeeDecision::Fee(breakdown) => {
                debug!(%city, %vehicle, ?breakdown, "computed delivery fee");
                DeliveryCost::Fee { fee: breakdown.total() }
            }
            FeeDecision::Forbidden(reason) => {
                debug!(%city, %vehicle, ?reason, "vehicle forbidden by weather");
                DeliveryCost::Forbidden { message: reason.to_string() }
            }
        };

        Ok(cost)
    }

    /// Most recent observation from any station whose name contains `city`.
    pub fn latest_weather(&self, city: &str) -> Result<Option<WeatherRecord>, StoreError> {
        let records = self.store.find_by_station_containing(city)?;
        Ok(store::latest(records))
    }

    pub fn weathers(&self) -> Result<Vec<WeatherRecord>, StoreError> {
        self.store.find_all()
    }

    pub fn add_weather(&self, record: NewWeatherRecord) -> Result<WeatherRecord, StoreError> {
        self.store.save(record)
    }
}
