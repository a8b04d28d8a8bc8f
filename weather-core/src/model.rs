use chrono::{DateTime, Utc};

/// One normalized weather observation for the configured location.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReading {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Condition labels joined with `", "`, in source order.
    pub weather_summary: String,
    pub temperature_c: f64,
    pub humidity_pct: i64,
}

impl WeatherReading {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate { latitude: self.latitude, longitude: self.longitude }
    }
}

/// A reading as persisted by the local store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: i64,
    pub reading: WeatherReading,
    /// Client clock at insert time.
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Named map marker shown by the view.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerData {
    pub name: String,
    pub coordinate: Coordinate,
}

impl MarkerData {
    pub fn from_reading(reading: &WeatherReading) -> Self {
        Self { name: reading.name.clone(), coordinate: reading.coordinate() }
    }
}

impl Default for MarkerData {
    /// Mexico City.
    fn default() -> Self {
        Self {
            name: "Mexico City".to_string(),
            coordinate: Coordinate { latitude: 19.451054, longitude: -99.125519 },
        }
    }
}
