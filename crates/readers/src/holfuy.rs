//! Holfuy reader
//!
//! One live call with `daily=True`, which embeds the daily aggregates in
//! the live payload. Units are requested explicitly (°C, km/h), never
//! inferred. Holfuy stations report sparsely around midnight, so the
//! rollover discard window is wider than for the other providers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::units;
use domain::{NormalizedObservation, Provider, StationConfig};
use serde_json::Value;
use tracing::{instrument, warn};

use crate::error::ReadError;
use crate::http::HttpClient;
use crate::parse::{
    ensure_fresh, lenient_datetime, map_opt, naive_in_tz, pick_f64, require,
    within_daily_rollover,
};
use crate::reader::WeatherReader;

const ROLLOVER_WINDOW_MINUTES: u32 = 60;

#[derive(Debug)]
pub struct HolfuyReader {
    endpoint: String,
    http: HttpClient,
}

impl HolfuyReader {
    #[must_use]
    pub fn new(endpoint: String, http: HttpClient) -> Self {
        Self { endpoint, http }
    }

    fn parse(
        station: &StationConfig,
        body: &Value,
        now: DateTime<Utc>,
    ) -> Result<NormalizedObservation, ReadError> {
        let raw_time = body
            .get("dateTime")
            .and_then(Value::as_str)
            .ok_or_else(|| ReadError::parse("missing dateTime"))?;
        let naive = lenient_datetime(raw_time)
            .ok_or_else(|| ReadError::parse(format!("bad dateTime {raw_time:?}")))?;
        let observed_at = naive_in_tz(naive, station.timezone)?;
        ensure_fresh(observed_at, now)?;

        let mut obs = NormalizedObservation::new(station.id, observed_at);
        obs.temperature = map_opt(pick_f64(body, &["temperature"]), |v| {
            units::temperature(v, "c")
        })?;
        obs.humidity = map_opt(pick_f64(body, &["humidity"]), units::humidity)?;
        obs.pressure = map_opt(pick_f64(body, &["pressure"]), |v| {
            units::pressure(v, "hpa")
        })?;
        obs.wind_speed = map_opt(pick_f64(body, &["wind", "speed"]), |v| {
            units::wind_speed(v, "km/h")
        })?;
        obs.wind_gust = map_opt(pick_f64(body, &["wind", "gust"]), |v| {
            units::wind_speed(v, "km/h")
        })?;
        obs.wind_direction = map_opt(pick_f64(body, &["wind", "direction"]), units::direction)?;
        obs.rain_rate = map_opt(pick_f64(body, &["rain"]), |v| {
            units::precipitation(v, "mm")
        })?;

        obs.rain_day = map_opt(pick_f64(body, &["daily", "sum_rain"]), |v| {
            units::precipitation(v, "mm")
        })?;
        obs.max_temperature = map_opt(pick_f64(body, &["daily", "max_temp"]), |v| {
            units::temperature(v, "c")
        })?;
        obs.min_temperature = map_opt(pick_f64(body, &["daily", "min_temp"]), |v| {
            units::temperature(v, "c")
        })?;
        obs.max_wind_speed = map_opt(pick_f64(body, &["daily", "max_wind_speed"]), |v| {
            units::wind_speed(v, "km/h")
        })?;
        obs.max_wind_gust = map_opt(pick_f64(body, &["daily", "max_wind_gust"]), |v| {
            units::wind_speed(v, "km/h")
        })?;

        let local = observed_at.with_timezone(&station.timezone);
        if within_daily_rollover(&local, ROLLOVER_WINDOW_MINUTES) {
            warn!(station = %station.id, %local, "discarding daily aggregates around midnight rollover");
            obs.clear_daily();
        }

        Ok(obs)
    }
}

#[async_trait]
impl WeatherReader for HolfuyReader {
    fn provider(&self) -> Provider {
        Provider::Holfuy
    }

    #[instrument(skip(self, station), fields(station = %station.id))]
    async fn fetch(&self, station: &StationConfig) -> Result<NormalizedObservation, ReadError> {
        let station_key = require(&station.station_key, "station_key")?;
        let password = require(&station.api_secret, "api_secret")?;

        let query = [
            ("s", station_key.to_string()),
            ("pw", password.to_string()),
            ("m", "JSON".to_string()),
            ("tu", "C".to_string()),
            ("su", "km/h".to_string()),
            ("daily", "True".to_string()),
        ];
        let body = self.http.get_json(&self.endpoint, &query, &[]).await?;
        Self::parse(station, &body, Utc::now())
    }
}
