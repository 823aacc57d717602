//! Provider-specific weather station readers
//!
//! One reader per supported provider, all implementing [`WeatherReader`].
//! A reader speaks the provider's wire protocol, normalizes the payload to
//! the canonical units and returns a [`domain::NormalizedObservation`];
//! everything above this crate is provider-agnostic.

pub mod ecowitt;
pub mod endpoints;
pub mod error;
pub mod holfuy;
pub mod http;
pub mod meteoclimatic;
pub mod parse;
pub mod reader;
pub mod realtime;
pub mod thingspeak;
pub mod weatherlink_v1;
pub mod weatherlink_v2;
pub mod wunderground;

pub use ecowitt::EcowittReader;
pub use endpoints::EndpointConfig;
pub use error::ReadError;
pub use holfuy::HolfuyReader;
pub use http::HttpClient;
pub use meteoclimatic::MeteoclimaticReader;
pub use reader::{ReaderSet, WeatherReader};
pub use realtime::RealtimeReader;
pub use thingspeak::ThingspeakReader;
pub use weatherlink_v1::WeatherlinkV1Reader;
pub use weatherlink_v2::WeatherlinkV2Reader;
pub use wunderground::WundergroundReader;
