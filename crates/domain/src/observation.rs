//! Canonical observation record
//!
//! Every reader variant produces this shape regardless of the provider's
//! native payload. All numeric fields are in canonical metric units and
//! explicitly nullable — a provider that does not expose a field leaves it
//! `None`, never a defaulted zero (zero is a valid reading).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One normalized weather observation, keyed by `(station_id, observed_at)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedObservation {
    /// Station this observation belongs to
    pub station_id: Uuid,
    /// Provider-reported observation time, normalized to UTC
    pub observed_at: DateTime<Utc>,
    /// Wall-clock time the fetch happened
    pub taken_at: DateTime<Utc>,

    /// Air temperature, °C
    pub temperature: Option<f64>,
    /// Relative humidity, %
    pub humidity: Option<f64>,
    /// Barometric pressure, hPa
    pub pressure: Option<f64>,
    /// Wind speed, m/s
    pub wind_speed: Option<f64>,
    /// Wind gust, m/s
    pub wind_gust: Option<f64>,
    /// Wind direction azimuth, degrees [0, 360)
    pub wind_direction: Option<f64>,
    /// Instantaneous rain rate, mm/h
    pub rain_rate: Option<f64>,

    /// Rain accumulated since local midnight, mm
    pub rain_day: Option<f64>,
    /// Daily maximum temperature, °C
    pub max_temperature: Option<f64>,
    /// Daily minimum temperature, °C
    pub min_temperature: Option<f64>,
    /// Daily maximum wind speed, m/s
    pub max_wind_speed: Option<f64>,
    /// Daily maximum wind gust, m/s
    pub max_wind_gust: Option<f64>,

    /// Dew point derived from temperature + humidity, °C
    pub dew_point: Option<f64>,
    /// Heat index derived from temperature + humidity, °C
    pub heat_index: Option<f64>,

    /// Set when the range validator nulled at least one implausible field
    pub flagged: bool,
}

impl NormalizedObservation {
    /// Empty observation for a station at a given time; every measurement
    /// starts out `None`.
    #[must_use]
    pub fn new(station_id: Uuid, observed_at: DateTime<Utc>) -> Self {
        Self {
            station_id,
            observed_at,
            taken_at: Utc::now(),
            temperature: None,
            humidity: None,
            pressure: None,
            wind_speed: None,
            wind_gust: None,
            wind_direction: None,
            rain_rate: None,
            rain_day: None,
            max_temperature: None,
            min_temperature: None,
            max_wind_speed: None,
            max_wind_gust: None,
            dew_point: None,
            heat_index: None,
            flagged: false,
        }
    }

    /// Drop the daily aggregate fields.
    ///
    /// Used by readers around the daily rollover, when a provider's "today"
    /// aggregates still describe yesterday.
    pub fn clear_daily(&mut self) {
        self.rain_day = None;
        self.max_temperature = None;
        self.min_temperature = None;
        self.max_wind_speed = None;
        self.max_wind_gust = None;
    }
}
