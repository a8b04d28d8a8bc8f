//! Core library for the `weatherlog` client.
//!
//! This crate defines:
//! - The fetch pipeline: transport, response mapping and the remote client
//! - Local persistence of every fetched reading
//! - The application state machine a view renders and drives with events
//! - Configuration of the endpoint and credentials
//!
//! It is used by `weatherlog-cli`, but can also be embedded in any other host.

pub mod app;
pub mod client;
pub mod config;
pub mod mapper;
pub mod model;
pub mod store;
pub mod transport;

#[cfg(test)]
mod testing;

pub use app::{ApplicationState, Event, ListState, Tab, WeatherApp};
pub use client::{ClientError, RemoteWeatherClient, WeatherClient};
pub use config::{ClientConfig, Config};
pub use model::{Coordinate, MarkerData, StoredRecord, WeatherReading};
pub use store::{LoadOutcome, LocalStore, SqliteStore, StoreError};
pub use transport::{ReqwestTransport, Transport, TransportError};
