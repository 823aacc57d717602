//! ThingSpeak channel reader
//!
//! Public channels only: one call for the latest feed entry. The channel's
//! generic `fieldN` slots map to measurements by convention (field1
//! temperature in °C, field2 humidity, field4 pressure in hPa) and the
//! feed timestamp is UTC.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::units;
use domain::{NormalizedObservation, Provider, StationConfig};
use serde_json::Value;
use tracing::instrument;

use crate::error::ReadError;
use crate::http::HttpClient;
use crate::parse::{ensure_fresh, map_opt, pick_f64, require};
use crate::reader::WeatherReader;

#[derive(Debug)]
pub struct ThingspeakReader {
    endpoint: String,
    http: HttpClient,
}

impl ThingspeakReader {
    #[must_use]
    pub fn new(endpoint: String, http: HttpClient) -> Self {
        Self { endpoint, http }
    }

    fn parse(
        station: &StationConfig,
        body: &Value,
        now: DateTime<Utc>,
    ) -> Result<NormalizedObservation, ReadError> {
        let feed = body
            .get("feeds")
            .and_then(Value::as_array)
            .and_then(|a| a.first())
            .ok_or_else(|| ReadError::parse("channel has no feed entries"))?;

        let raw_time = feed
            .get("created_at")
            .and_then(Value::as_str)
            .ok_or_else(|| ReadError::parse("missing created_at"))?;
        let observed_at = DateTime::parse_from_rfc3339(raw_time)
            .map_err(|e| ReadError::parse(format!("bad created_at {raw_time:?}: {e}")))?
            .with_timezone(&Utc);
        ensure_fresh(observed_at, now)?;

        let mut obs = NormalizedObservation::new(station.id, observed_at);
        obs.temperature = map_opt(pick_f64(feed, &["field1"]), |v| units::temperature(v, "c"))?;
        obs.humidity = map_opt(pick_f64(feed, &["field2"]), units::humidity)?;
        obs.pressure = map_opt(pick_f64(feed, &["field4"]), |v| units::pressure(v, "hpa"))?;

        Ok(obs)
    }
}

#[async_trait]
impl WeatherReader for ThingspeakReader {
    fn provider(&self) -> Provider {
        Provider::Thingspeak
    }

    #[instrument(skip(self, station), fields(station = %station.id))]
    async fn fetch(&self, station: &StationConfig) -> Result<NormalizedObservation, ReadError> {
        let channel = require(&station.station_key, "station_key")?;

        let url = format!("{}/{channel}/feeds.json", self.endpoint);
        let query = [("results", "1".to_string())];
        let body = self.http.get_json(&url, &query, &[]).await?;
        Self::parse(station, &body, Utc::now())
    }
}
