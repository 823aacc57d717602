//! Cumulus `realtime.txt` reader
//!
//! Self-hosted stations publish a single space-separated line; fields are
//! positional. Only the columns this pipeline stores are read. The polling
//! URL comes from the station config and some of these hosts reject
//! non-browser user agents.

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use domain::units;
use domain::{NormalizedObservation, Provider, StationConfig};
use tracing::instrument;

use crate::error::ReadError;
use crate::http::{HttpClient, BROWSER_USER_AGENT};
use crate::parse::{ensure_fresh, lenient_date, lenient_float, map_opt, naive_in_tz, require};
use crate::reader::WeatherReader;

// Positional columns of the realtime.txt line
const COL_DATE: usize = 0;
const COL_TIME: usize = 1;
const COL_TEMPERATURE: usize = 2;
const COL_HUMIDITY: usize = 3;
const COL_WIND_SPEED: usize = 5;
const COL_WIND_DIRECTION: usize = 7;
const COL_RAIN_RATE: usize = 8;
const COL_RAIN_DAY: usize = 9;
const COL_PRESSURE: usize = 10;
const COL_MIN_TEMPERATURE: usize = 28;
const COL_MAX_TEMPERATURE: usize = 30;
const COL_MAX_WIND_SPEED: usize = 32;

#[derive(Debug)]
pub struct RealtimeReader {
    http: HttpClient,
}

fn column(tokens: &[&str], index: usize) -> Option<f64> {
    tokens.get(index).copied().and_then(lenient_float)
}

impl RealtimeReader {
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self { http }
    }

    fn parse(
        station: &StationConfig,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<NormalizedObservation, ReadError> {
        let tokens: Vec<&str> = body.split_whitespace().collect();

        let raw_date = tokens
            .get(COL_DATE)
            .ok_or_else(|| ReadError::parse("empty realtime line"))?;
        let raw_time = tokens
            .get(COL_TIME)
            .ok_or_else(|| ReadError::parse("realtime line has no time column"))?;
        let date = lenient_date(raw_date)
            .ok_or_else(|| ReadError::parse(format!("bad date {raw_date:?}")))?;
        let time = NaiveTime::parse_from_str(raw_time, "%H:%M:%S")
            .map_err(|e| ReadError::parse(format!("bad time {raw_time:?}: {e}")))?;
        let observed_at = naive_in_tz(date.and_time(time), station.timezone)?;
        ensure_fresh(observed_at, now)?;

        let mut obs = NormalizedObservation::new(station.id, observed_at);
        obs.temperature = map_opt(column(&tokens, COL_TEMPERATURE), |v| {
            units::temperature(v, "c")
        })?;
        obs.humidity = map_opt(column(&tokens, COL_HUMIDITY), units::humidity)?;
        obs.pressure = map_opt(column(&tokens, COL_PRESSURE), |v| units::pressure(v, "hpa"))?;
        obs.wind_speed = map_opt(column(&tokens, COL_WIND_SPEED), |v| {
            units::wind_speed(v, "km/h")
        })?;
        obs.wind_direction = map_opt(column(&tokens, COL_WIND_DIRECTION), units::direction)?;
        obs.rain_rate = map_opt(column(&tokens, COL_RAIN_RATE), |v| {
            units::precipitation(v, "mm")
        })?;
        obs.rain_day = map_opt(column(&tokens, COL_RAIN_DAY), |v| {
            units::precipitation(v, "mm")
        })?;
        obs.max_temperature = map_opt(column(&tokens, COL_MAX_TEMPERATURE), |v| {
            units::temperature(v, "c")
        })?;
        obs.min_temperature = map_opt(column(&tokens, COL_MIN_TEMPERATURE), |v| {
            units::temperature(v, "c")
        })?;
        obs.max_wind_speed = map_opt(column(&tokens, COL_MAX_WIND_SPEED), |v| {
            units::wind_speed(v, "km/h")
        })?;

        Ok(obs)
    }
}

#[async_trait]
impl WeatherReader for RealtimeReader {
    fn provider(&self) -> Provider {
        Provider::Realtime
    }

    #[instrument(skip(self, station), fields(station = %station.id))]
    async fn fetch(&self, station: &StationConfig) -> Result<NormalizedObservation, ReadError> {
        let endpoint = require(&station.endpoint, "endpoint")?;
        let url = if endpoint.ends_with("/realtime.txt") {
            endpoint.to_string()
        } else {
            format!("{}/realtime.txt", endpoint.trim_end_matches('/'))
        };

        let headers = [("User-Agent", BROWSER_USER_AGENT)];
        let body = self.http.get_text(&url, &[], &headers).await?;
        Self::parse(station, &body, Utc::now())
    }
}
