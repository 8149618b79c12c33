use serde::{Deserialize, Serialize};
use std::fmt;

/// Cities where deliveries can be made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum City {
    Tallinn,
    Tartu,
    #[serde(rename = "Pärnu")]
    Parnu,
}

impl City {
    pub fn as_str(&self) -> &'static str {
        match self {
            City::Tallinn => "Tallinn",
            City::Tartu => "Tartu",
            City::Parnu => "Pärnu",
        }
    }

    /// Substring identifying this city's stations in the weather store.
    pub fn station_query(&self) -> &'static str {
        self.as_str()
    }

    pub const fn all() -> &'static [City] {
        &[City::Tallinn, City::Tartu, City::Parnu]
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for City {
    type Error = UnknownName;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        City::all()
            .iter()
            .copied()
            .find(|city| city.as_str() == value)
            .ok_or_else(|| UnknownName(value.to_string()))
    }
}

/// Vehicle types a courier can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vehicle {
    Car,
    Scooter,
    Bike,
}

impl Vehicle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Vehicle::Car => "Car",
            Vehicle::Scooter => "Scooter",
            Vehicle::Bike => "Bike",
        }
    }

    pub const fn all() -> &'static [Vehicle] {
        &[Vehicle::Car, Vehicle::Scooter, Vehicle::Bike]
    }

    /// Scooters and bikes are exposed to the weather; cars are not.
    pub fn is_open_air(&self) -> bool {
        matches!(self, Vehicle::Scooter | Vehicle::Bike)
    }
}

impl fmt::Display for Vehicle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Vehicle {
    type Error = UnknownName;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Vehicle::all()
            .iter()
            .copied()
            .find(|vehicle| vehicle.as_str() == value)
            .ok_or_else(|| UnknownName(value.to_string()))
    }
}

/// A city or vehicle name that is not part of the fixed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown name '{0}'")]
pub struct UnknownName(pub String);

/// A weather observation as it is submitted for storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWeatherRecord {
    pub station_name: String,
    #[serde(default)]
    pub wmo_code: String,
    pub air_temperature: f64,
    pub wind_speed: f64,
    #[serde(default)]
    pub weather_phenomenon: String,
    /// Seconds since the Unix epoch.
    #[serde(rename = "timestamp")]
    pub observed_at: i64,
}

/// A stored weather observation. Records are never changed after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherRecord {
    pub id: i64,
    pub station_name: String,
    pub wmo_code: String,
    pub air_temperature: f64,
    pub wind_speed: f64,
    pub weather_phenomenon: String,
    #[serde(rename = "timestamp")]
    pub observed_at: i64,
}

impl WeatherRecord {
    pub fn from_new(id: i64, record: NewWeatherRecord) -> Self {
        Self {
            id,
            station_name: record.station_name,
            wmo_code: record.wmo_code,
            air_temperature: record.air_temperature,
            wind_speed: record.wind_speed,
            weather_phenomenon: record.weather_phenomenon,
            observed_at: record.observed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_as_str_roundtrip() {
        for city in City::all() {
            let parsed = City::try_from(city.as_str()).expect("roundtrip should succeed");
            assert_eq!(*city, parsed);
        }
    }

    #[test]
    fn city_names_are_case_sensitive() {
        assert!(City::try_from("tallinn").is_err());
        assert!(City::try_from("Parnu").is_err());
        assert_eq!(City::try_from("Pärnu"), Ok(City::Parnu));
    }

    #[test]
    fn unknown_vehicle_error() {
        let err = Vehicle::try_from("Boat").unwrap_err();
        assert_eq!(err, UnknownName("Boat".to_string()));
    }

    #[test]
    fn only_scooter_and_bike_are_open_air() {
        assert!(!Vehicle::Car.is_open_air());
        assert!(Vehicle::Scooter.is_open_air());
        assert!(Vehicle::Bike.is_open_air());
    }

    #[test]
    fn weather_record_uses_camel_case_wire_names() {
        let record = WeatherRecord {
            id: 7,
            station_name: "Tallinn-Harku".into(),
            wmo_code: "26038".into(),
            air_temperature: -2.5,
            wind_speed: 4.1,
            weather_phenomenon: "Light snow shower".into(),
            observed_at: 1_700_000_000,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["stationName"], "Tallinn-Harku");
        assert_eq!(json["wmoCode"], "26038");
        assert_eq!(json["weatherPhenomenon"], "Light snow shower");
        assert_eq!(json["timestamp"], 1_700_000_000);
    }

    #[test]
    fn new_record_defaults_missing_text_fields() {
        let body = r#"{"stationName":"Pärnu","airTemperature":1.0,"windSpeed":2.0,"timestamp":5}"#;
        let record: NewWeatherRecord = serde_json::from_str(body).unwrap();

        assert_eq!(record.wmo_code, "");
        assert_eq!(record.weather_phenomenon, "");
        assert_eq!(record.observed_at, 5);
    }
}
