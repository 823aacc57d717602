//! The reader trait and the per-provider dispatch set

use async_trait::async_trait;
use domain::{NormalizedObservation, Provider, StationConfig};

use crate::ecowitt::EcowittReader;
use crate::endpoints::EndpointConfig;
use crate::error::ReadError;
use crate::holfuy::HolfuyReader;
use crate::http::HttpClient;
use crate::meteoclimatic::MeteoclimaticReader;
use crate::realtime::RealtimeReader;
use crate::thingspeak::ThingspeakReader;
use crate::weatherlink_v1::WeatherlinkV1Reader;
use crate::weatherlink_v2::WeatherlinkV2Reader;
use crate::wunderground::WundergroundReader;

/// One provider protocol.
///
/// Implementations are stateless beyond their HTTP client and endpoints;
/// the same reader instance serves every station of its provider.
#[async_trait]
pub trait WeatherReader: Send + Sync {
    /// The provider this reader speaks for.
    fn provider(&self) -> Provider;

    /// Fetch and normalize one observation for the given station.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] classifying what went wrong; the caller maps
    /// it into the cycle report.
    async fn fetch(&self, station: &StationConfig) -> Result<NormalizedObservation, ReadError>;
}

/// One reader instance per provider, dispatched by exhaustive match.
#[derive(Debug)]
pub struct ReaderSet {
    weatherlink_v1: WeatherlinkV1Reader,
    weatherlink_v2: WeatherlinkV2Reader,
    wunderground: WundergroundReader,
    holfuy: HolfuyReader,
    thingspeak: ThingspeakReader,
    ecowitt: EcowittReader,
    realtime: RealtimeReader,
    meteoclimatic: MeteoclimaticReader,
}

impl ReaderSet {
    #[must_use]
    pub fn new(endpoints: &EndpointConfig, http: HttpClient) -> Self {
        Self {
            weatherlink_v1: WeatherlinkV1Reader::new(
                endpoints.weatherlink_v1.clone(),
                http.clone(),
            ),
            weatherlink_v2: WeatherlinkV2Reader::new(
                endpoints.weatherlink_v2.clone(),
                http.clone(),
            ),
            wunderground: WundergroundReader::new(
                endpoints.wunderground_live.clone(),
                endpoints.wunderground_daily.clone(),
                http.clone(),
            ),
            holfuy: HolfuyReader::new(endpoints.holfuy.clone(), http.clone()),
            thingspeak: ThingspeakReader::new(endpoints.thingspeak.clone(), http.clone()),
            ecowitt: EcowittReader::new(
                endpoints.ecowitt_live.clone(),
                endpoints.ecowitt_daily.clone(),
                http.clone(),
            ),
            realtime: RealtimeReader::new(http.clone()),
            meteoclimatic: MeteoclimaticReader::new(http),
        }
    }

    /// Resolve the reader for a provider. Total over the enum.
    #[must_use]
    pub fn get(&self, provider: Provider) -> &dyn WeatherReader {
        match provider {
            Provider::WeatherlinkV1 => &self.weatherlink_v1,
            Provider::WeatherlinkV2 => &self.weatherlink_v2,
            Provider::Wunderground => &self.wunderground,
            Provider::Holfuy => &self.holfuy,
            Provider::Thingspeak => &self.thingspeak,
            Provider::Ecowitt => &self.ecowitt,
            Provider::Realtime => &self.realtime,
            Provider::Meteoclimatic => &self.meteoclimatic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn every_provider_resolves_to_its_own_reader() {
        let http = HttpClient::new(Duration::from_secs(5)).unwrap();
        let set = ReaderSet::new(&EndpointConfig::default(), http);
        for provider in Provider::ALL {
            assert_eq!(set.get(provider).provider(), provider);
        }
    }
}
