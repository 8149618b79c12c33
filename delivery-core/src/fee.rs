//! Delivery fee rules.
//!
//! A fee is the regional base fee for the city and vehicle plus three
//! weather surcharges: air temperature, wind speed and weather phenomenon.
//! Some weather makes a vehicle unusable; that outcome is reported as
//! [`FeeDecision::Forbidden`] rather than as an error.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{City, Vehicle, WeatherRecord};

/// Base fees for a single city, one per vehicle type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VehicleFees {
    pub car: f64,
    pub scooter: f64,
    pub bike: f64,
}

impl VehicleFees {
    fn get(&self, vehicle: Vehicle) -> f64 {
        match vehicle {
            Vehicle::Car => self.car,
            Vehicle::Scooter => self.scooter,
            Vehicle::Bike => self.bike,
        }
    }
}

/// Regional base fee table keyed by city and vehicle.
///
/// When deserialized, every city and vehicle left out keeps its default fee,
/// so a config can override a single entry:
///
/// ```toml
/// [base_fees.tartu]
/// car = 5.0
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "FeeTableOverrides")]
pub struct FeeTable {
    pub tallinn: VehicleFees,
    pub tartu: VehicleFees,
    pub parnu: VehicleFees,
}

impl FeeTable {
    pub fn base_fee(&self, city: City, vehicle: Vehicle) -> f64 {
        let row = match city {
            City::Tallinn => &self.tallinn,
            City::Tartu => &self.tartu,
            City::Parnu => &self.parnu,
        };
        row.get(vehicle)
    }
}

impl Default for FeeTable {
    fn default() -> Self {
        Self {
            tallinn: VehicleFees { car: 4.0, scooter: 3.5, bike: 3.0 },
            tartu: VehicleFees { car: 3.5, scooter: 3.0, bike: 2.5 },
            parnu: VehicleFees { car: 3.0, scooter: 2.5, bike: 2.0 },
        }
    }
}

/// Deserialized shape of [`FeeTable`]: any subset of cities and vehicles.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FeeTableOverrides {
    tallinn: VehicleFeeOverrides,
    tartu: VehicleFeeOverrides,
    parnu: VehicleFeeOverrides,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VehicleFeeOverrides {
    car: Option<f64>,
    scooter: Option<f64>,
    bike: Option<f64>,
}

impl VehicleFeeOverrides {
    fn apply(self, fees: VehicleFees) -> VehicleFees {
        VehicleFees {
            car: self.car.unwrap_or(fees.car),
            scooter: self.scooter.unwrap_or(fees.scooter),
            bike: self.bike.unwrap_or(fees.bike),
        }
    }
}

impl From<FeeTableOverrides> for FeeTable {
    fn from(overrides: FeeTableOverrides) -> Self {
        let defaults = FeeTable::default();
        Self {
            tallinn: overrides.tallinn.apply(defaults.tallinn),
            tartu: overrides.tartu.apply(defaults.tartu),
            parnu: overrides.parnu.apply(defaults.parnu),
        }
    }
}

/// Why a vehicle may not be used in the current weather.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForbiddenUsage {
    /// Wind speed above the bike limit.
    HighWind,
    /// Glaze, hail or thunder.
    DangerousPhenomenon,
}

impl ForbiddenUsage {
    pub fn message(&self) -> &'static str {
        "Usage of selected vehicle type is forbidden"
    }
}

impl fmt::Display for ForbiddenUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// The individual terms of a computed fee.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeeBreakdown {
    pub regional_base_fee: f64,
    pub air_temperature_fee: f64,
    pub wind_speed_fee: f64,
    pub weather_phenomenon_fee: f64,
}

impl FeeBreakdown {
    pub fn total(&self) -> f64 {
        self.regional_base_fee
            + self.air_temperature_fee
            + self.wind_speed_fee
            + self.weather_phenomenon_fee
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeeDecision {
    Fee(FeeBreakdown),
    Forbidden(ForbiddenUsage),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeeError {
    #[error("No weather data available for {city}")]
    DataUnavailable { city: City },
}

/// Compute the delivery fee for `city` and `vehicle` given the latest weather
/// observed there.
pub fn compute_fee(
    table: &FeeTable,
    city: City,
    vehicle: Vehicle,
    latest_weather: Option<&WeatherRecord>,
) -> Result<FeeDecision, FeeError> {
    let weather = latest_weather.ok_or(FeeError::DataUnavailable { city })?;

    let regional_base_fee = table.base_fee(city, vehicle);
    let air_temperature_fee = air_temperature_fee(vehicle, weather.air_temperature);
    let wind_speed_fee = wind_speed_fee(vehicle, weather.wind_speed);
    let weather_phenomenon_fee = weather_phenomenon_fee(vehicle, &weather.weather_phenomenon);

    let wind_speed_fee = match wind_speed_fee {
        Ok(fee) => fee,
        Err(reason) => return Ok(FeeDecision::Forbidden(reason)),
    };
    let weather_phenomenon_fee = match weather_phenomenon_fee {
        Ok(fee) => fee,
        Err(reason) => return Ok(FeeDecision::Forbidden(reason)),
    };

    Ok(FeeDecision::Fee(FeeBreakdown {
        regional_base_fee,
        air_temperature_fee,
        wind_speed_fee,
        weather_phenomenon_fee,
    }))
}

fn air_temperature_fee(vehicle: Vehicle, air_temperature: f64) -> f64 {
    if !vehicle.is_open_air() {
        return 0.0;
    }
    if air_temperature < -10.0 {
        1.0
    } else if air_temperature <= 0.0 {
        0.5
    } else {
        0.0
    }
}

fn wind_speed_fee(vehicle: Vehicle, wind_speed: f64) -> Result<f64, ForbiddenUsage> {
    if vehicle != Vehicle::Bike {
        return Ok(0.0);
    }
    if wind_speed > 20.0 {
        Err(ForbiddenUsage::HighWind)
    } else if wind_speed >= 10.0 {
        Ok(0.5)
    } else {
        Ok(0.0)
    }
}

fn weather_phenomenon_fee(vehicle: Vehicle, phenomenon: &str) -> Result<f64, ForbiddenUsage> {
    if !vehicle.is_open_air() {
        return Ok(0.0);
    }

    let phenomenon = phenomenon.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|word| phenomenon.contains(word));

    if mentions(&["glaze", "hail", "thunder"]) {
        Err(ForbiddenUsage::DangerousPhenomenon)
    } else if mentions(&["snow", "sleet"]) {
        Ok(1.0)
    } else if mentions(&["rain"]) {
        Ok(0.5)
    } else {
        Ok(0.0)
    }
}
