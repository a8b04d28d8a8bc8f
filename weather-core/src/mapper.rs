//! Decodes the upstream current-weather payload into a [`WeatherReading`].

use serde::Deserialize;
use thiserror::Error;

use crate::model::WeatherReading;

const OK_STATUS_CODE: u16 = 200;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("weather service answered with status {status}")]
    InvalidRequest { status: u16 },

    #[error("unexpected weather payload: {0}")]
    InvalidData(#[from] serde_json::Error),
}

/// Wire mirror of the upstream JSON.
///
/// Only the blocks that feed a [`WeatherReading`] are required; the rest are
/// carried along when present.
#[derive(Debug, Deserialize)]
pub struct RemoteReadingPayload {
    pub id: Option<i64>,
    pub coord: CoordBlock,
    pub weather: Vec<ConditionEntry>,
    pub base: Option<String>,
    pub main: MainBlock,
    pub visibility: Option<i64>,
    pub wind: Option<WindBlock>,
    pub clouds: Option<CloudsBlock>,
    pub dt: Option<i64>,
    pub sys: Option<SysBlock>,
    pub timezone: Option<i64>,
    pub name: String,
    pub cod: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CoordBlock {
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Deserialize)]
pub struct ConditionEntry {
    pub id: Option<i64>,
    pub main: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MainBlock {
    pub temp: f64,
    pub humidity: i64,
    pub feels_like: Option<f64>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub pressure: Option<i64>,
    pub sea_level: Option<i64>,
    pub grnd_level: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct WindBlock {
    pub speed: Option<f64>,
    pub deg: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CloudsBlock {
    pub all: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SysBlock {
    #[serde(rename = "type")]
    pub kind: Option<i64>,
    pub id: Option<i64>,
    pub country: Option<String>,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
}

impl From<RemoteReadingPayload> for WeatherReading {
    fn from(payload: RemoteReadingPayload) -> Self {
        let weather_summary = payload
            .weather
            .iter()
            .map(|entry| entry.main.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        WeatherReading {
            name: payload.name,
            latitude: payload.coord.lat,
            longitude: payload.coord.lon,
            weather_summary,
            temperature_c: payload.main.temp,
            humidity_pct: payload.main.humidity,
        }
    }
}

/// Validates the status, then decodes `body` strictly.
pub fn map(body: &[u8], status: u16) -> Result<WeatherReading, MapError> {
    if status != OK_STATUS_CODE {
        return Err(MapError::InvalidRequest { status });
    }

    let payload: RemoteReadingPayload = serde_json::from_slice(body)?;
    Ok(payload.into())
}
