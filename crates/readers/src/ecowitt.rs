//! Ecowitt cloud reader
//!
//! Real-time call for the live reading plus a same-day history call that
//! yields the daily extremes. Units are pinned through the `*_unitid`
//! query parameters (°C, hPa, km/h, mm). The history call is best-effort;
//! losing it degrades the record to live fields only.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use domain::units;
use domain::{NormalizedObservation, Provider, StationConfig};
use serde_json::Value;
use tracing::{instrument, warn};

use crate::error::ReadError;
use crate::http::HttpClient;
use crate::parse::{ensure_fresh, json_f64, map_opt, pick_f64, require, within_daily_rollover};
use crate::reader::WeatherReader;

const ROLLOVER_WINDOW_MINUTES: u32 = 15;

#[derive(Debug)]
pub struct EcowittReader {
    live_endpoint: String,
    daily_endpoint: String,
    http: HttpClient,
}

/// Extreme of a history series at `data.<path>.list`, a map of
/// timestamp to value.
fn series_extreme(body: &Value, path: &[&str], fold: fn(f64, f64) -> f64) -> Option<f64> {
    let mut node = body.get("data")?;
    for key in path {
        node = node.get(key)?;
    }
    node.get("list")?
        .as_object()?
        .values()
        .filter_map(json_f64)
        .reduce(fold)
}

impl EcowittReader {
    #[must_use]
    pub fn new(live_endpoint: String, daily_endpoint: String, http: HttpClient) -> Self {
        Self {
            live_endpoint,
            daily_endpoint,
            http,
        }
    }

    fn unit_query(station: &StationConfig) -> Result<Vec<(&'static str, String)>, ReadError> {
        let mac = require(&station.station_key, "station_key")?;
        let api_key = require(&station.api_key, "api_key")?;
        let application_key = require(&station.api_secret, "api_secret")?;
        Ok(vec![
            ("mac", mac.to_string()),
            ("api_key", api_key.to_string()),
            ("application_key", application_key.to_string()),
            ("temp_unitid", "1".to_string()),
            ("pressure_unitid", "3".to_string()),
            ("wind_speed_unitid", "7".to_string()),
            ("rainfall_unitid", "12".to_string()),
        ])
    }

    fn parse(
        station: &StationConfig,
        live: &Value,
        daily: Option<&Value>,
        now: DateTime<Utc>,
    ) -> Result<NormalizedObservation, ReadError> {
        let ts = pick_f64(live, &["data", "outdoor", "temperature", "time"])
            .ok_or_else(|| ReadError::parse("missing outdoor temperature timestamp"))?;
        #[allow(clippy::cast_possible_truncation)]
        let observed_at = Utc
            .timestamp_opt(ts as i64, 0)
            .single()
            .ok_or_else(|| ReadError::parse(format!("bad timestamp {ts}")))?;
        ensure_fresh(observed_at, now)?;

        let mut obs = NormalizedObservation::new(station.id, observed_at);
        obs.temperature = map_opt(
            pick_f64(live, &["data", "outdoor", "temperature", "value"]),
            |v| units::temperature(v, "c"),
        )?;
        obs.humidity = map_opt(
            pick_f64(live, &["data", "outdoor", "humidity", "value"]),
            units::humidity,
        )?;
        obs.pressure = map_opt(
            pick_f64(live, &["data", "pressure", "relative", "value"]),
            |v| units::pressure(v, "hpa"),
        )?;
        obs.wind_speed = map_opt(
            pick_f64(live, &["data", "wind", "wind_speed", "value"]),
            |v| units::wind_speed(v, "km/h"),
        )?;
        obs.wind_gust = map_opt(pick_f64(live, &["data", "wind", "wind_gust", "value"]), |v| {
            units::wind_speed(v, "km/h")
        })?;
        obs.wind_direction = map_opt(
            pick_f64(live, &["data", "wind", "wind_direction", "value"]),
            units::direction,
        )?;
        obs.rain_rate = map_opt(
            pick_f64(live, &["data", "rainfall", "rain_rate", "value"]),
            |v| units::precipitation(v, "mm"),
        )?;
        obs.rain_day = map_opt(
            pick_f64(live, &["data", "rainfall", "daily", "value"]),
            |v| units::precipitation(v, "mm"),
        )?;

        if let Some(daily) = daily {
            obs.max_temperature = map_opt(
                series_extreme(daily, &["outdoor", "temperature"], f64::max),
                |v| units::temperature(v, "c"),
            )?;
            obs.min_temperature = map_opt(
                series_extreme(daily, &["outdoor", "temperature"], f64::min),
                |v| units::temperature(v, "c"),
            )?;
            obs.max_wind_speed = map_opt(
                series_extreme(daily, &["wind", "wind_speed"], f64::max),
                |v| units::wind_speed(v, "km/h"),
            )?;
            obs.max_wind_gust = map_opt(
                series_extreme(daily, &["wind", "wind_gust"], f64::max),
                |v| units::wind_speed(v, "km/h"),
            )?;
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
impl WeatherReader for EcowittReader {
    fn provider(&self) -> Provider {
        Provider::Ecowitt
    }

    #[instrument(skip(self, station), fields(station = %station.id))]
    async fn fetch(&self, station: &StationConfig) -> Result<NormalizedObservation, ReadError> {
        let base_query = Self::unit_query(station)?;
        let live = self
            .http
            .get_json(&self.live_endpoint, &base_query, &[])
            .await?;

        let today = Utc::now().with_timezone(&station.timezone).date_naive();
        let mut daily_query = base_query;
        daily_query.push(("cycle_type", "auto".to_string()));
        daily_query.push(("start_date", format!("{today} 00:00:00")));
        daily_query.push(("end_date", format!("{today} 23:59:59")));
        daily_query.push((
            "call_back",
            "outdoor.temperature,outdoor.humidity,wind.wind_speed,wind.wind_gust".to_string(),
        ));
        let daily = match self
            .http
            .get_json(&self.daily_endpoint, &daily_query, &[])
            .await
        {
            Ok(body) => Some(body),
            Err(err) => {
                warn!(station = %station.id, error = %err, "history fetch failed, keeping live data only");
                None
            }
        };

        Self::parse(station, &live, daily.as_ref(), Utc::now())
    }
}
