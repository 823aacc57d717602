//! Meteoclimatic template reader
//!
//! The network publishes a plain-text template of `*KEY=value` pairs per
//! station. Numbers use Spanish decimal commas and the wind azimuth may be
//! a Spanish compass token (`O` for west). A handful of known keys is
//! extracted, the rest is ignored. There is no rain rate in this feed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::units;
use domain::{NormalizedObservation, Provider, StationConfig};
use std::collections::HashMap;
use tracing::{instrument, warn};

use crate::error::ReadError;
use crate::http::{HttpClient, BROWSER_USER_AGENT};
use crate::parse::{
    ensure_fresh, is_not_available, lenient_datetime, lenient_float, map_opt, naive_in_tz, require,
};
use crate::reader::WeatherReader;

const KEY_TIMESTAMP: &str = "UPD";
const KEY_TEMPERATURE: &str = "TMP";
const KEY_WIND_SPEED: &str = "WND";
const KEY_WIND_DIRECTION: &str = "AZI";
const KEY_PRESSURE: &str = "BAR";
const KEY_HUMIDITY: &str = "HUM";
const KEY_MAX_TEMPERATURE: &str = "DHTM";
const KEY_MIN_TEMPERATURE: &str = "DLTM";
const KEY_MAX_WIND_GUST: &str = "DGST";
const KEY_RAIN_DAY: &str = "DPCP";

#[derive(Debug)]
pub struct MeteoclimaticReader {
    http: HttpClient,
}

/// `*KEY=value` pairs from the template body.
fn template_pairs(body: &str) -> HashMap<&str, &str> {
    body.split('*')
        .filter_map(|line| {
            let (key, value) = line.trim().split_once('=')?;
            Some((key.trim(), value.trim()))
        })
        .collect()
}

/// Azimuth field: numeric degrees or a compass token. Spanish templates
/// write west as `O` (oeste).
fn azimuth(token: &str) -> Result<Option<f64>, ReadError> {
    if let Some(value) = lenient_float(token) {
        return Ok(Some(units::direction(value)?));
    }
    let trimmed = token.trim();
    if trimmed.is_empty() || is_not_available(trimmed) {
        return Ok(None);
    }
    let english = trimmed
        .to_ascii_lowercase()
        .replace('º', "")
        .replace('o', "w");
    Ok(Some(units::compass(&english)?))
}

impl MeteoclimaticReader {
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// The network's firmware emits a literal 100 for several quantities
    /// when a sensor glitches.
    fn warn_sentinel(station: &StationConfig, name: &str, value: Option<f64>) {
        if let Some(value) = value {
            if (value - 100.0).abs() < f64::EPSILON {
                warn!(station = %station.id, field = name, "suspicious sentinel value 100");
            }
        }
    }

    fn parse(
        station: &StationConfig,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<NormalizedObservation, ReadError> {
        let pairs = template_pairs(body);
        if pairs.is_empty() {
            return Err(ReadError::parse("body carries no template pairs"));
        }

        let raw_time = pairs
            .get(KEY_TIMESTAMP)
            .ok_or_else(|| ReadError::parse("template has no UPD timestamp"))?;
        let naive = lenient_datetime(raw_time)
            .ok_or_else(|| ReadError::parse(format!("bad UPD timestamp {raw_time:?}")))?;
        let observed_at = naive_in_tz(naive, station.timezone)?;
        ensure_fresh(observed_at, now)?;

        let number = |key: &str| pairs.get(key).copied().and_then(lenient_float);

        let mut obs = NormalizedObservation::new(station.id, observed_at);
        obs.temperature = map_opt(number(KEY_TEMPERATURE), |v| units::temperature(v, "c"))?;
        obs.humidity = map_opt(number(KEY_HUMIDITY), units::humidity)?;
        obs.pressure = map_opt(number(KEY_PRESSURE), |v| units::pressure(v, "hpa"))?;
        obs.wind_speed = map_opt(number(KEY_WIND_SPEED), |v| units::wind_speed(v, "km/h"))?;
        obs.wind_direction = match pairs.get(KEY_WIND_DIRECTION) {
            Some(token) => azimuth(token)?,
            None => None,
        };
        obs.rain_day = map_opt(number(KEY_RAIN_DAY), |v| units::precipitation(v, "mm"))?;
        obs.max_temperature = map_opt(number(KEY_MAX_TEMPERATURE), |v| {
            units::temperature(v, "c")
        })?;
        obs.min_temperature = map_opt(number(KEY_MIN_TEMPERATURE), |v| {
            units::temperature(v, "c")
        })?;
        obs.max_wind_gust = map_opt(number(KEY_MAX_WIND_GUST), |v| units::wind_speed(v, "km/h"))?;

        Self::warn_sentinel(station, "temperature", obs.temperature);
        Self::warn_sentinel(station, "humidity", obs.humidity);
        Self::warn_sentinel(station, "wind_speed", obs.wind_speed);
        Self::warn_sentinel(station, "rain_day", obs.rain_day);

        Ok(obs)
    }
}

#[async_trait]
impl WeatherReader for MeteoclimaticReader {
    fn provider(&self) -> Provider {
        Provider::Meteoclimatic
    }

    #[instrument(skip(self, station), fields(station = %station.id))]
    async fn fetch(&self, station: &StationConfig) -> Result<NormalizedObservation, ReadError> {
        let endpoint = require(&station.endpoint, "endpoint")?;
        let headers = [("User-Agent", BROWSER_USER_AGENT)];
        let body = self.http.get_text(endpoint, &[], &headers).await?;
        Self::parse(station, &body, Utc::now())
    }
}
