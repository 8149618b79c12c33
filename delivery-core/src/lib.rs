//! Core library for the delivery fee service.
//!
//! This crate defines:
//! - Configuration loading and validation
//! - The delivery fee rules and the fee query service
//! - Weather storage and the scheduled observation ingestion
//! - A client for a running delivery fee API
//!
//! It is used by `delivery-cli`, which wires it to an HTTP server and a scheduler.

pub mod client;
pub mod config;
pub mod fee;
pub mod feed;
pub mod ingest;
pub mod model;
pub mod schedule;
pub mod service;
pub mod store;

pub use client::DeliveryApiClient;
pub use config::Config;
pub use fee::{FeeBreakdown, FeeDecision, FeeError, FeeTable, ForbiddenUsage, compute_fee};
pub use feed::{HttpObservationFeed, ObservationFeed};
pub use ingest::{IngestError, IngestReport, Ingestor};
pub use model::{City, NewWeatherRecord, Vehicle, WeatherRecord};
pub use schedule::IngestSchedule;
pub use service::{DeliveryCost, DeliveryService, ServiceError};
pub use store::{SqliteWeatherStore, StoreError, WeatherStore};
