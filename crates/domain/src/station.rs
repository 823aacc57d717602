//! Station configuration
//!
//! One [`StationConfig`] per physical station to poll. The credential slots
//! are provider-specific; each reader variant validates the ones its
//! protocol requires and ignores the rest.

use std::fmt;
use std::str::FromStr;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Supported weather data providers.
///
/// Closed set: adding a provider means a new variant here plus a reader
/// implementation; dispatch is an exhaustive match, never reflection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// WeatherLink legacy v1 API (user/password/token query auth)
    WeatherlinkV1,
    /// WeatherLink v2 API (api-key + secret header, live/historic modes)
    WeatherlinkV2,
    /// Weather Underground personal weather stations
    Wunderground,
    /// Holfuy wind/weather stations
    Holfuy,
    /// ThingSpeak public channels
    Thingspeak,
    /// Ecowitt cloud API
    Ecowitt,
    /// Self-hosted Cumulus-style realtime.txt page
    Realtime,
    /// Meteoclimatic network (scraped template page)
    Meteoclimatic,
}

impl Provider {
    /// All known providers, in display order.
    pub const ALL: [Self; 8] = [
        Self::WeatherlinkV1,
        Self::WeatherlinkV2,
        Self::Wunderground,
        Self::Holfuy,
        Self::Thingspeak,
        Self::Ecowitt,
        Self::Realtime,
        Self::Meteoclimatic,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WeatherlinkV1 => "weatherlink_v1",
            Self::WeatherlinkV2 => "weatherlink_v2",
            Self::Wunderground => "wunderground",
            Self::Holfuy => "holfuy",
            Self::Thingspeak => "thingspeak",
            Self::Ecowitt => "ecowitt",
            Self::Realtime => "realtime",
            Self::Meteoclimatic => "meteoclimatic",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a provider tag cannot be parsed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown provider `{0}`")]
pub struct ParseProviderError(String);

impl FromStr for Provider {
    type Err = ParseProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| ParseProviderError(s.to_string()))
    }
}

/// Configuration for one station to poll.
///
/// Immutable for the lifetime of a cycle; the gatherer borrows the list and
/// never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationConfig {
    /// Stable station identifier; observation rows key on it
    pub id: Uuid,

    /// Human-readable label, used only in logs
    #[serde(default)]
    pub name: String,

    /// Which reader variant handles this station
    pub provider: Provider,

    /// Primary identifier at the provider (station id, device MAC,
    /// channel id or account user, depending on the variant)
    #[serde(default)]
    pub station_key: Option<String>,

    /// API key / token, where the provider requires one
    #[serde(default)]
    pub api_key: Option<String>,

    /// API secret / password, where the provider requires one
    #[serde(default)]
    pub api_secret: Option<String>,

    /// Calibration offset added to the reported pressure, in hPa
    #[serde(default)]
    pub pressure_offset: Option<f64>,

    /// Timezone naive provider timestamps are declared in
    #[serde(default = "default_timezone")]
    pub timezone: Tz,

    /// Per-station endpoint override. For the realtime and meteoclimatic
    /// variants this is the polling URL itself and is required.
    #[serde(default)]
    pub endpoint: Option<String>,
}

fn default_timezone() -> Tz {
    Tz::UTC
}

impl StationConfig {
    /// Minimal config for a station, everything optional left empty.
    #[must_use]
    pub fn new(id: Uuid, provider: Provider) -> Self {
        Self {
            id,
            name: String::new(),
            provider,
            station_key: None,
            api_key: None,
            api_secret: None,
            pressure_offset: None,
            timezone: Tz::UTC,
            endpoint: None,
        }
    }
}
