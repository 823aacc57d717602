//! Range validation
//!
//! Each measurement is checked against a fixed plausibility range.
//! An out-of-range value is dropped to `None` and the observation is
//! marked `flagged`; in-range fields survive unchanged. Zero is inside
//! every range, so absent-vs-zero stays unambiguous.

use domain::NormalizedObservation;
use tracing::warn;

const TEMPERATURE_C: (f64, f64) = (-39.0, 50.0);
const WIND_MPS: (f64, f64) = (0.0, 139.0);
const HUMIDITY_PCT: (f64, f64) = (0.0, 100.0);
const PRESSURE_HPA: (f64, f64) = (800.0, 1100.0);
const DIRECTION_DEG: (f64, f64) = (0.0, 360.0);
const RAIN_RATE_MMH: (f64, f64) = (0.0, 500.0);
const RAIN_DAY_MM: (f64, f64) = (0.0, 15_000.0);

fn check(field: &mut Option<f64>, name: &str, range: (f64, f64), flagged: &mut bool) {
    if let Some(value) = *field {
        if value < range.0 || value > range.1 {
            warn!(field = name, value, "Implausible measurement dropped");
            *field = None;
            *flagged = true;
        }
    }
}

/// Null out-of-range measurements and flag the observation.
pub fn apply(observation: &mut NormalizedObservation) {
    let mut flagged = observation.flagged;

    check(
        &mut observation.temperature,
        "temperature",
        TEMPERATURE_C,
        &mut flagged,
    );
    check(
        &mut observation.humidity,
        "humidity",
        HUMIDITY_PCT,
        &mut flagged,
    );
    check(
        &mut observation.pressure,
        "pressure",
        PRESSURE_HPA,
        &mut flagged,
    );
    check(
        &mut observation.wind_speed,
        "wind_speed",
        WIND_MPS,
        &mut flagged,
    );
    check(
        &mut observation.wind_gust,
        "wind_gust",
        WIND_MPS,
        &mut flagged,
    );
    check(
        &mut observation.wind_direction,
        "wind_direction",
        DIRECTION_DEG,
        &mut flagged,
    );
    check(
        &mut observation.rain_rate,
        "rain_rate",
        RAIN_RATE_MMH,
        &mut flagged,
    );
    check(
        &mut observation.rain_day,
        "rain_day",
        RAIN_DAY_MM,
        &mut flagged,
    );
    check(
        &mut observation.max_temperature,
        "max_temperature",
        TEMPERATURE_C,
        &mut flagged,
    );
    check(
        &mut observation.min_temperature,
        "min_temperature",
        TEMPERATURE_C,
        &mut flagged,
    );
    check(
        &mut observation.max_wind_speed,
        "max_wind_speed",
        WIND_MPS,
        &mut flagged,
    );
    check(
        &mut observation.max_wind_gust,
        "max_wind_gust",
        WIND_MPS,
        &mut flagged,
    );

    observation.flagged = flagged;
}
