//! WeatherLink v2 reader
//!
//! Two calls against the templated endpoint: `current` for the live
//! reading and `historic` for the daily aggregates. The historic mode
//! needs an active subscription, so its failure only degrades the record
//! instead of failing the station.
//!
//! Payloads carry one `data` array per sensor and the field names vary by
//! sensor generation, so each quantity is coalesced across a candidate
//! key list. Temperatures arrive in °F, wind in mph and pressure in inHg.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use domain::units;
use domain::{NormalizedObservation, Provider, StationConfig};
use serde_json::Value;
use tracing::{instrument, warn};

use crate::error::ReadError;
use crate::http::HttpClient;
use crate::parse::{ensure_fresh, json_f64, map_opt, require};
use crate::reader::WeatherReader;

/// How far back the historic query reaches, in seconds.
const HISTORIC_LOOKBACK_SECS: i64 = 15 * 60;

#[derive(Debug)]
pub struct WeatherlinkV2Reader {
    endpoint: String,
    http: HttpClient,
}

/// Every value for `key` across all sensors' data points.
fn collect(body: &Value, key: &str) -> Vec<f64> {
    let mut values = Vec::new();
    let Some(sensors) = body.get("sensors").and_then(Value::as_array) else {
        return values;
    };
    for sensor in sensors {
        let Some(points) = sensor.get("data").and_then(Value::as_array) else {
            continue;
        };
        for point in points {
            if let Some(value) = point.get(key).and_then(json_f64) {
                values.push(value);
            }
        }
    }
    values
}

fn first(body: &Value, key: &str) -> Option<f64> {
    collect(body, key).into_iter().next()
}

fn max_of(body: &Value, key: &str) -> Option<f64> {
    collect(body, key).into_iter().reduce(f64::max)
}

fn min_of(body: &Value, key: &str) -> Option<f64> {
    collect(body, key).into_iter().reduce(f64::min)
}

impl WeatherlinkV2Reader {
    #[must_use]
    pub fn new(endpoint: String, http: HttpClient) -> Self {
        Self { endpoint, http }
    }

    fn url(&self, mode: &str, station_id: &str) -> String {
        self.endpoint
            .replace("{mode}", mode)
            .replace("{station_id}", station_id)
    }

    fn parse(
        station: &StationConfig,
        live: &Value,
        daily: Option<&Value>,
        now: DateTime<Utc>,
    ) -> Result<NormalizedObservation, ReadError> {
        let ts = max_of(live, "ts").ok_or_else(|| ReadError::parse("no sensor timestamp"))?;
        #[allow(clippy::cast_possible_truncation)]
        let observed_at = Utc
            .timestamp_opt(ts as i64, 0)
            .single()
            .ok_or_else(|| ReadError::parse(format!("bad sensor timestamp {ts}")))?;
        ensure_fresh(observed_at, now)?;

        let mut obs = NormalizedObservation::new(station.id, observed_at);

        obs.temperature = map_opt(
            first(live, "temp").or_else(|| first(live, "temp_out")),
            |v| units::temperature(v, "f"),
        )?;
        obs.humidity = map_opt(
            first(live, "hum").or_else(|| first(live, "hum_out")),
            units::humidity,
        )?;
        obs.pressure = map_opt(
            first(live, "bar").or_else(|| first(live, "bar_sea_level")),
            |v| units::pressure(v, "inhg"),
        )?;
        obs.wind_speed = map_opt(
            first(live, "wind_speed").or_else(|| max_of(live, "wind_speed_last")),
            |v| units::wind_speed(v, "mph"),
        )?;
        obs.wind_gust = map_opt(
            max_of(live, "wind_speed_hi_last_10_min").or_else(|| first(live, "wind_gust")),
            |v| units::wind_speed(v, "mph"),
        )?;
        obs.wind_direction = map_opt(
            first(live, "wind_dir").or_else(|| max_of(live, "wind_dir_last")),
            units::direction,
        )?;
        obs.rain_rate = map_opt(
            first(live, "rain_rate_mm").or_else(|| first(live, "rain_rate_last_mm")),
            |v| units::precipitation(v, "mm"),
        )?;

        let live_rain_day =
            max_of(live, "rain_day_mm").or_else(|| max_of(live, "rainfall_daily_mm"));
        let mut historic_rain_day = None;
        if let Some(daily) = daily {
            obs.max_wind_speed = map_opt(max_of(daily, "wind_speed_hi"), |v| {
                units::wind_speed(v, "mph")
            })?;
            obs.max_temperature = map_opt(max_of(daily, "temp_hi"), |v| {
                units::temperature(v, "f")
            })?;
            obs.min_temperature = map_opt(min_of(daily, "temp_lo"), |v| {
                units::temperature(v, "f")
            })?;
            historic_rain_day = max_of(daily, "rainfall_mm");
        }
        obs.rain_day = map_opt(live_rain_day.or(historic_rain_day), |v| {
            units::precipitation(v, "mm")
        })?;

        Ok(obs)
    }
}

#[async_trait]
impl WeatherReader for WeatherlinkV2Reader {
    fn provider(&self) -> Provider {
        Provider::WeatherlinkV2
    }

    #[instrument(skip(self, station), fields(station = %station.id))]
    async fn fetch(&self, station: &StationConfig) -> Result<NormalizedObservation, ReadError> {
        let station_key = require(&station.station_key, "station_key")?;
        let api_key = require(&station.api_key, "api_key")?;
        let api_secret = require(&station.api_secret, "api_secret")?;

        let now = Utc::now();
        let headers = [("X-Api-Secret", api_secret)];

        let live_query = [
            ("api-key", api_key.to_string()),
            ("t", now.timestamp().to_string()),
        ];
        let live = self
            .http
            .get_json(&self.url("current", station_key), &live_query, &headers)
            .await?;

        let daily_query = [
            ("api-key", api_key.to_string()),
            ("t", now.timestamp().to_string()),
            (
                "start-timestamp",
                (now.timestamp() - HISTORIC_LOOKBACK_SECS).to_string(),
            ),
            ("end-timestamp", now.timestamp().to_string()),
        ];
        let daily = match self
            .http
            .get_json(&self.url("historic", station_key), &daily_query, &headers)
            .await
        {
            Ok(body) => Some(body),
            Err(err) => {
                warn!(station = %station.id, error = %err, "historic fetch failed, keeping live data only");
                None
            }
        };

        Self::parse(station, &live, daily.as_ref(), Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn station() -> StationConfig {
        StationConfig::new(Uuid::new_v4(), Provider::WeatherlinkV2)
    }

    fn live_body(ts: i64) -> Value {
        json!({
            "sensors": [
                {"data": [{"ts": ts, "temp": 68.0, "hum": 55.0, "wind_speed": 10.0,
                           "wind_dir": 90, "rain_rate_mm": 1.2, "rain_day_mm": 4.0,
                           "wind_speed_hi_last_10_min": 18.0}]},
                {"data": [{"ts": ts - 60, "bar_sea_level": 29.92}]}
            ]
        })
    }

    #[test]
    fn coalesces_fields_across_sensors() {
        let now = Utc::now();
        let obs =
            WeatherlinkV2Reader::parse(&station(), &live_body(now.timestamp()), None, now).unwrap();

        assert!((obs.temperature.unwrap() - 20.0).abs() < 1e-9);
        assert_eq!(obs.humidity, Some(55.0));
        assert!((obs.pressure.unwrap() - 29.92 * 33.863_886_666_667).abs() < 1e-6);
        assert!((obs.wind_gust.unwrap() - 18.0 * 0.447_04).abs() < 1e-9);
        assert_eq!(obs.rain_day, Some(4.0));
        // Newest sensor timestamp wins
        assert_eq!(obs.observed_at.timestamp(), now.timestamp());
    }

    #[test]
    fn historic_payload_fills_daily_aggregates() {
        let now = Utc::now();
        let daily = json!({
            "sensors": [{"data": [
                {"temp_hi": 77.0, "temp_lo": 50.0, "wind_speed_hi": 22.0, "rainfall_mm": 6.5},
                {"temp_hi": 75.2, "temp_lo": 51.8, "wind_speed_hi": 20.0, "rainfall_mm": 6.0}
            ]}]
        });
        let obs = WeatherlinkV2Reader::parse(
            &station(),
            &live_body(now.timestamp()),
            Some(&daily),
            now,
        )
        .unwrap();

        assert!((obs.max_temperature.unwrap() - 25.0).abs() < 1e-9);
        assert!((obs.min_temperature.unwrap() - 10.0).abs() < 1e-9);
        // Live daily rain wins over historic
        assert_eq!(obs.rain_day, Some(4.0));
    }

    #[test]
    fn missing_timestamp_is_a_parse_error() {
        let now = Utc::now();
        let body = json!({"sensors": [{"data": [{"temp": 68.0}]}]});
        assert!(matches!(
            WeatherlinkV2Reader::parse(&station(), &body, None, now),
            Err(ReadError::Parse(_))
        ));
    }

    #[test]
    fn url_template_substitutes_mode_and_station() {
        let http = HttpClient::new(std::time::Duration::from_secs(5)).unwrap();
        let reader = WeatherlinkV2Reader::new(
            "https://example.org/v2/{mode}/{station_id}".to_string(),
            http,
        );
        assert_eq!(
            reader.url("current", "12345"),
            "https://example.org/v2/current/12345"
        );
    }
}
