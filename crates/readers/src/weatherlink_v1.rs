//! WeatherLink legacy v1 reader
//!
//! Single `NoaaExt.json` call authenticated with user, password and API
//! token as query parameters. Live fields live at the top level; the Davis
//! daily aggregates sit under `davis_current_observation` in imperial units.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::units;
use domain::{NormalizedObservation, Provider, StationConfig};
use serde_json::Value;
use tracing::{instrument, warn};

use crate::error::ReadError;
use crate::http::HttpClient;
use crate::parse::{ensure_fresh, map_opt, pick_f64, require, within_daily_rollover};
use crate::reader::WeatherReader;

/// Minutes after local midnight during which the Davis daily aggregates
/// still describe the previous day.
const ROLLOVER_WINDOW_MINUTES: u32 = 15;

#[derive(Debug)]
pub struct WeatherlinkV1Reader {
    endpoint: String,
    http: HttpClient,
}

impl WeatherlinkV1Reader {
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
            .get("observation_time_rfc822")
            .and_then(Value::as_str)
            .ok_or_else(|| ReadError::parse("missing observation_time_rfc822"))?;
        let observed_at = DateTime::parse_from_rfc2822(raw_time)
            .map_err(|e| ReadError::parse(format!("bad observation time {raw_time:?}: {e}")))?
            .with_timezone(&Utc);
        ensure_fresh(observed_at, now)?;

        let mut obs = NormalizedObservation::new(station.id, observed_at);

        obs.temperature = map_opt(pick_f64(body, &["temp_c"]), |v| units::temperature(v, "c"))?;
        obs.humidity = map_opt(pick_f64(body, &["relative_humidity"]), units::humidity)?;
        obs.pressure = map_opt(pick_f64(body, &["pressure_mb"]), |v| {
            units::pressure(v, "mb")
        })?;
        obs.wind_speed = map_opt(pick_f64(body, &["wind_mph"]), |v| {
            units::wind_speed(v, "mph")
        })?;
        obs.wind_direction = map_opt(pick_f64(body, &["wind_degrees"]), units::direction)?;

        const DAVIS: &str = "davis_current_observation";
        obs.wind_gust = map_opt(pick_f64(body, &[DAVIS, "wind_ten_min_gust_mph"]), |v| {
            units::wind_speed(v, "mph")
        })?;
        obs.rain_rate = map_opt(pick_f64(body, &[DAVIS, "rain_rate_in_per_hr"]), |v| {
            units::precipitation(v, "in")
        })?;
        obs.rain_day = map_opt(pick_f64(body, &[DAVIS, "rain_day_in"]), |v| {
            units::precipitation(v, "in")
        })?;
        obs.max_wind_speed = map_opt(pick_f64(body, &[DAVIS, "wind_day_high_mph"]), |v| {
            units::wind_speed(v, "mph")
        })?;
        obs.max_temperature = map_opt(pick_f64(body, &[DAVIS, "temp_day_high_f"]), |v| {
            units::temperature(v, "f")
        })?;
        obs.min_temperature = map_opt(pick_f64(body, &[DAVIS, "temp_day_low_f"]), |v| {
            units::temperature(v, "f")
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
impl WeatherReader for WeatherlinkV1Reader {
    fn provider(&self) -> Provider {
        Provider::WeatherlinkV1
    }

    #[instrument(skip(self, station), fields(station = %station.id))]
    async fn fetch(&self, station: &StationConfig) -> Result<NormalizedObservation, ReadError> {
        let user = require(&station.station_key, "station_key")?;
        let token = require(&station.api_key, "api_key")?;
        let password = require(&station.api_secret, "api_secret")?;

        let query = [
            ("user", user.to_string()),
            ("pass", password.to_string()),
            ("apiToken", token.to_string()),
        ];
        let body = self.http.get_json(&self.endpoint, &query, &[]).await?;
        Self::parse(station, &body, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;
    use uuid::Uuid;

    fn midday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn sample_body(observed_at: DateTime<Utc>) -> Value {
        json!({
            "observation_time_rfc822": observed_at.to_rfc2822(),
            "temp_c": "12.8",
            "relative_humidity": "68",
            "pressure_mb": "1016.3",
            "wind_mph": "4.0",
            "wind_degrees": "225",
            "davis_current_observation": {
                "wind_ten_min_gust_mph": "9.0",
                "rain_rate_in_per_hr": "0.04",
                "rain_day_in": "0.12",
                "wind_day_high_mph": "15.0",
                "temp_day_high_f": "59.2",
                "temp_day_low_f": "41.0"
            }
        })
    }

    fn station() -> StationConfig {
        StationConfig::new(Uuid::new_v4(), Provider::WeatherlinkV1)
    }

    #[test]
    fn parses_live_and_daily_fields() {
        let now = midday();
        let obs = WeatherlinkV1Reader::parse(&station(), &sample_body(now), now).unwrap();

        assert_eq!(obs.temperature, Some(12.8));
        assert_eq!(obs.humidity, Some(68.0));
        assert_eq!(obs.pressure, Some(1016.3));
        assert!((obs.wind_speed.unwrap() - 4.0 * 0.447_04).abs() < 1e-9);
        assert_eq!(obs.wind_direction, Some(225.0));
        assert!((obs.rain_rate.unwrap() - 0.04 * 25.4).abs() < 1e-9);
        assert!((obs.min_temperature.unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn stale_observation_is_rejected() {
        let now = midday();
        let body = sample_body(now - Duration::hours(2));
        assert!(matches!(
            WeatherlinkV1Reader::parse(&station(), &body, now),
            Err(ReadError::Parse(_))
        ));
    }

    #[test]
    fn missing_timestamp_is_a_parse_error() {
        let now = midday();
        assert!(matches!(
            WeatherlinkV1Reader::parse(&station(), &json!({"temp_c": "10"}), now),
            Err(ReadError::Parse(_))
        ));
    }

    #[test]
    fn missing_measurements_stay_none() {
        let now = midday();
        let body = json!({"observation_time_rfc822": now.to_rfc2822()});
        let obs = WeatherlinkV1Reader::parse(&station(), &body, now).unwrap();
        assert!(obs.temperature.is_none());
        assert!(obs.rain_day.is_none());
    }
}
