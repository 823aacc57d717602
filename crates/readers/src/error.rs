//! Reader errors
//!
//! One error type for every reader variant, with a lossy projection onto
//! [`FailureKind`] for cycle reporting. The split matters at the boundary:
//! `Auth` and `MissingField` point at configuration, the rest at the
//! provider or the network.

use domain::units::ConvertError;
use domain::FailureKind;
use thiserror::Error;

/// Error returned by a reader fetch
#[derive(Debug, Error)]
pub enum ReadError {
    /// The per-request timeout elapsed
    #[error("request timed out")]
    Timeout,

    /// Transport-level failure before an HTTP status arrived
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The provider answered with an unexpected HTTP status
    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),

    /// The provider rejected the configured credentials
    #[error("authentication rejected: {0}")]
    Auth(String),

    /// The station config lacks a field this provider requires
    #[error("station config is missing required field `{0}`")]
    MissingField(&'static str),

    /// The response body did not match the expected shape
    #[error("parse error: {0}")]
    Parse(String),

    /// A reported value failed unit conversion or its physical bounds
    #[error(transparent)]
    Convert(#[from] ConvertError),
}

impl ReadError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Project onto the report-level failure taxonomy.
    ///
    /// A missing config field counts as an auth-class failure: both mean
    /// the station entry needs operator attention, not a retry.
    #[must_use]
    pub const fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Timeout => FailureKind::Timeout,
            Self::ConnectionFailed(_) => FailureKind::ConnectionFailed,
            Self::HttpStatus(code) => FailureKind::HttpStatus(*code),
            Self::Auth(_) | Self::MissingField(_) => FailureKind::Auth,
            Self::Parse(_) | Self::Convert(_) => FailureKind::Parse,
        }
    }
}

impl From<reqwest::Error> for ReadError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::ConnectionFailed(err.to_string())
        }
    }
}
