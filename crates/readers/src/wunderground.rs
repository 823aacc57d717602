//! Weather Underground PWS reader
//!
//! Two calls with the same credentials: current conditions and the 1-day
//! summary. Requested with `units=m`, so everything but pressure comes
//! back metric already (wind in km/h, pressure in hPa).

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

const ROLLOVER_WINDOW_MINUTES: u32 = 15;

#[derive(Debug)]
pub struct WundergroundReader {
    live_endpoint: String,
    daily_endpoint: String,
    http: HttpClient,
}

impl WundergroundReader {
    #[must_use]
    pub fn new(live_endpoint: String, daily_endpoint: String, http: HttpClient) -> Self {
        Self {
            live_endpoint,
            daily_endpoint,
            http,
        }
    }

    fn parse(
        station: &StationConfig,
        live: &Value,
        daily: &Value,
        now: DateTime<Utc>,
    ) -> Result<NormalizedObservation, ReadError> {
        let observation = live
            .get("observations")
            .and_then(Value::as_array)
            .and_then(|a| a.first())
            .ok_or_else(|| ReadError::parse("live payload has no observations"))?;

        let raw_time = observation
            .get("obsTimeLocal")
            .and_then(Value::as_str)
            .ok_or_else(|| ReadError::parse("missing obsTimeLocal"))?;
        let naive = lenient_datetime(raw_time)
            .ok_or_else(|| ReadError::parse(format!("bad obsTimeLocal {raw_time:?}")))?;
        let observed_at = naive_in_tz(naive, station.timezone)?;
        ensure_fresh(observed_at, now)?;

        let metric = observation
            .get("metric")
            .filter(|m| m.is_object())
            .ok_or_else(|| ReadError::parse("live observation has no metric block"))?;

        let mut obs = NormalizedObservation::new(station.id, observed_at);
        obs.temperature = map_opt(pick_f64(metric, &["temp"]), |v| units::temperature(v, "c"))?;
        obs.humidity = map_opt(pick_f64(observation, &["humidity"]), units::humidity)?;
        obs.pressure = map_opt(pick_f64(metric, &["pressure"]), |v| {
            units::pressure(v, "hpa")
        })?;
        obs.wind_speed = map_opt(pick_f64(metric, &["windSpeed"]), |v| {
            units::wind_speed(v, "km/h")
        })?;
        obs.wind_gust = map_opt(pick_f64(metric, &["windGust"]), |v| {
            units::wind_speed(v, "km/h")
        })?;
        obs.wind_direction = map_opt(pick_f64(observation, &["winddir"]), units::direction)?;
        obs.rain_rate = map_opt(pick_f64(metric, &["precipRate"]), |v| {
            units::precipitation(v, "mm")
        })?;
        obs.rain_day = map_opt(pick_f64(metric, &["precipTotal"]), |v| {
            units::precipitation(v, "mm")
        })?;

        // The newest summary describes today
        if let Some(summary_metric) = daily
            .get("summaries")
            .and_then(Value::as_array)
            .and_then(|a| a.last())
            .and_then(|s| s.get("metric"))
        {
            obs.max_wind_speed = map_opt(pick_f64(summary_metric, &["windspeedHigh"]), |v| {
                units::wind_speed(v, "km/h")
            })?;
            obs.max_wind_gust = map_opt(pick_f64(summary_metric, &["windgustHigh"]), |v| {
                units::wind_speed(v, "km/h")
            })?;
            obs.max_temperature = map_opt(pick_f64(summary_metric, &["tempHigh"]), |v| {
                units::temperature(v, "c")
            })?;
            obs.min_temperature = map_opt(pick_f64(summary_metric, &["tempLow"]), |v| {
                units::temperature(v, "c")
            })?;
        }

        let local = observed_at.with_timezone(&station.timezone);
        if within_daily_rollover(&local, ROLLOVER_WINDOW_MINUTES) {
            warn!(station = %station.id, %local, "discarding daily aggregates around midnight rollover");
            obs.clear_daily();
        }

        Ok(obs)
    }
}

#[async_trait]
impl WeatherReader for WundergroundReader {
    fn provider(&self) -> Provider {
        Provider::Wunderground
    }

    #[instrument(skip(self, station), fields(station = %station.id))]
    async fn fetch(&self, station: &StationConfig) -> Result<NormalizedObservation, ReadError> {
        let station_key = require(&station.station_key, "station_key")?;
        let api_key = require(&station.api_key, "api_key")?;

        let query = [
            ("stationId", station_key.to_string()),
            ("apiKey", api_key.to_string()),
            ("format", "json".to_string()),
            ("units", "m".to_string()),
            ("numericPrecision", "decimal".to_string()),
        ];
        let live = self.http.get_json(&self.live_endpoint, &query, &[]).await?;
        let daily = self
            .http
            .get_json(&self.daily_endpoint, &query, &[])
            .await?;

        Self::parse(station, &live, &daily, Utc::now())
    }
}
