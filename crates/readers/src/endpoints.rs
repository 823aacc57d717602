//! Provider endpoint configuration
//!
//! Base URLs for the hosted providers, overridable in config so tests and
//! self-hosted mirrors can point the readers elsewhere. The realtime and
//! meteoclimatic variants carry their URL per station instead.

use serde::{Deserialize, Serialize};

/// Base URLs for the hosted provider APIs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// WeatherLink v1 `NoaaExt.json` endpoint
    #[serde(default = "default_weatherlink_v1")]
    pub weatherlink_v1: String,

    /// WeatherLink v2 base; `{mode}` and `{station_id}` are substituted
    /// per request (`current` or `historic`)
    #[serde(default = "default_weatherlink_v2")]
    pub weatherlink_v2: String,

    /// Weather Underground current-conditions endpoint
    #[serde(default = "default_wunderground_live")]
    pub wunderground_live: String,

    /// Weather Underground daily-summary endpoint
    #[serde(default = "default_wunderground_daily")]
    pub wunderground_daily: String,

    /// Holfuy live endpoint (daily aggregates ride along in the same call)
    #[serde(default = "default_holfuy")]
    pub holfuy: String,

    /// ThingSpeak channels base; the channel id is appended per request
    #[serde(default = "default_thingspeak")]
    pub thingspeak: String,

    /// Ecowitt real-time endpoint
    #[serde(default = "default_ecowitt_live")]
    pub ecowitt_live: String,

    /// Ecowitt history endpoint, used for the daily aggregates
    #[serde(default = "default_ecowitt_daily")]
    pub ecowitt_daily: String,
}

fn default_weatherlink_v1() -> String {
    "https://api.weatherlink.com/v1/NoaaExt.json".to_string()
}

fn default_weatherlink_v2() -> String {
    "https://api.weatherlink.com/v2/{mode}/{station_id}".to_string()
}

fn default_wunderground_live() -> String {
    "https://api.weather.com/v2/pws/observations/current".to_string()
}

fn default_wunderground_daily() -> String {
    "https://api.weather.com/v2/pws/dailysummary/1day".to_string()
}

fn default_holfuy() -> String {
    "https://api.holfuy.com/live/live.php".to_string()
}

fn default_thingspeak() -> String {
    "https://api.thingspeak.com/channels".to_string()
}

fn default_ecowitt_live() -> String {
    "https://api.ecowitt.net/api/v3/device/real_time".to_string()
}

fn default_ecowitt_daily() -> String {
    "https://api.ecowitt.net/api/v3/device/history".to_string()
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            weatherlink_v1: default_weatherlink_v1(),
            weatherlink_v2: default_weatherlink_v2(),
            wunderground_live: default_wunderground_live(),
            wunderground_daily: default_wunderground_daily(),
            holfuy: default_holfuy(),
            thingspeak: default_thingspeak(),
            ecowitt_live: default_ecowitt_live(),
            ecowitt_daily: default_ecowitt_daily(),
        }
    }
}

impl EndpointConfig {
    /// Point every endpoint at one base URL. Test helper for mock servers.
    #[must_use]
    pub fn rooted_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            weatherlink_v1: format!("{base}/v1/NoaaExt.json"),
            weatherlink_v2: format!("{base}/v2/{{mode}}/{{station_id}}"),
            wunderground_live: format!("{base}/pws/observations/current"),
            wunderground_daily: format!("{base}/pws/dailysummary/1day"),
            holfuy: format!("{base}/live/live.php"),
            thingspeak: format!("{base}/channels"),
            ecowitt_live: format!("{base}/v3/device/real_time"),
            ecowitt_daily: format!("{base}/v3/device/history"),
        }
    }
}
