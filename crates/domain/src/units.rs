//! Canonical unit conversions
//!
//! Pure functions converting provider-declared units into the canonical
//! metric set: °C, hPa, m/s, mm, degrees, percent. Every conversion takes
//! the numeric value plus the unit token the provider documents; units are
//! never inferred from magnitude. Converted values are checked against hard
//! physical bounds so corrupt provider data is rejected at the boundary.

use thiserror::Error;

/// Error returned by a unit conversion
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvertError {
    /// The unit token is not one this converter knows about
    #[error("unrecognized {quantity} unit `{unit}`")]
    InvalidUnit {
        quantity: &'static str,
        unit: String,
    },

    /// The converted value falls outside the physically plausible range
    #[error("{quantity} value {value} outside plausible range {min}..={max}")]
    OutOfRange {
        quantity: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Hard physical bounds per quantity, in canonical units.
///
/// These are sanity limits for corrupt data, not climatological safe
/// ranges; the postprocessing validator applies the narrower ones.
const TEMPERATURE_BOUNDS: (f64, f64) = (-90.0, 60.0);
const PRESSURE_BOUNDS: (f64, f64) = (500.0, 1100.0);
const WIND_SPEED_BOUNDS: (f64, f64) = (0.0, 150.0);
const PRECIPITATION_BOUNDS: (f64, f64) = (0.0, 2000.0);

const INHG_PER_HPA: f64 = 33.863_886_666_667;
const MMHG_PER_HPA: f64 = 1.333_223_684;
const PSI_PER_HPA: f64 = 68.947_572_932;
const MPH_TO_MPS: f64 = 0.447_04;
const KNOT_TO_MPS: f64 = 0.514_444_444_444;
const KPH_TO_MPS: f64 = 1.0 / 3.6;
const INCH_TO_MM: f64 = 25.4;

fn invalid(quantity: &'static str, unit: &str) -> ConvertError {
    ConvertError::InvalidUnit {
        quantity,
        unit: unit.to_string(),
    }
}

fn bounded(
    quantity: &'static str,
    value: f64,
    (min, max): (f64, f64),
) -> Result<f64, ConvertError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ConvertError::OutOfRange {
            quantity,
            value,
            min,
            max,
        })
    }
}

fn normalize(unit: &str) -> String {
    unit.trim().to_ascii_lowercase()
}

/// Convert a temperature in the declared unit to degrees Celsius.
pub fn temperature(value: f64, unit: &str) -> Result<f64, ConvertError> {
    let celsius = match normalize(unit).as_str() {
        "c" | "°c" | "celsius" => value,
        "f" | "°f" | "fahrenheit" => (value - 32.0) * 5.0 / 9.0,
        "k" | "kelvin" => value - 273.15,
        _ => return Err(invalid("temperature", unit)),
    };
    bounded("temperature", celsius, TEMPERATURE_BOUNDS)
}

/// Inverse of [`temperature`]: express a Celsius value in the given unit.
pub fn temperature_from_celsius(celsius: f64, unit: &str) -> Result<f64, ConvertError> {
    match normalize(unit).as_str() {
        "c" | "°c" | "celsius" => Ok(celsius),
        "f" | "°f" | "fahrenheit" => Ok(celsius * 9.0 / 5.0 + 32.0),
        "k" | "kelvin" => Ok(celsius + 273.15),
        _ => Err(invalid("temperature", unit)),
    }
}

/// Convert a pressure in the declared unit to hectopascals.
pub fn pressure(value: f64, unit: &str) -> Result<f64, ConvertError> {
    let hpa = match normalize(unit).as_str() {
        "hpa" | "mb" | "mbar" | "millibar" => value,
        "inhg" => value * INHG_PER_HPA,
        "mmhg" => value * MMHG_PER_HPA,
        "psi" => value * PSI_PER_HPA,
        _ => return Err(invalid("pressure", unit)),
    };
    bounded("pressure", hpa, PRESSURE_BOUNDS)
}

/// Inverse of [`pressure`]: express an hPa value in the given unit.
pub fn pressure_from_hpa(hpa: f64, unit: &str) -> Result<f64, ConvertError> {
    match normalize(unit).as_str() {
        "hpa" | "mb" | "mbar" | "millibar" => Ok(hpa),
        "inhg" => Ok(hpa / INHG_PER_HPA),
        "mmhg" => Ok(hpa / MMHG_PER_HPA),
        "psi" => Ok(hpa / PSI_PER_HPA),
        _ => Err(invalid("pressure", unit)),
    }
}

/// Convert a wind speed in the declared unit to meters per second.
pub fn wind_speed(value: f64, unit: &str) -> Result<f64, ConvertError> {
    let mps = match normalize(unit).as_str() {
        "m/s" | "mps" => value,
        "km/h" | "kph" | "kmh" => value * KPH_TO_MPS,
        "mph" => value * MPH_TO_MPS,
        "kn" | "kt" | "kts" | "knots" => value * KNOT_TO_MPS,
        _ => return Err(invalid("wind speed", unit)),
    };
    bounded("wind speed", mps, WIND_SPEED_BOUNDS)
}

/// Inverse of [`wind_speed`]: express an m/s value in the given unit.
pub fn wind_speed_from_mps(mps: f64, unit: &str) -> Result<f64, ConvertError> {
    match normalize(unit).as_str() {
        "m/s" | "mps" => Ok(mps),
        "km/h" | "kph" | "kmh" => Ok(mps / KPH_TO_MPS),
        "mph" => Ok(mps / MPH_TO_MPS),
        "kn" | "kt" | "kts" | "knots" => Ok(mps / KNOT_TO_MPS),
        _ => Err(invalid("wind speed", unit)),
    }
}

/// Convert a precipitation amount in the declared unit to millimeters.
pub fn precipitation(value: f64, unit: &str) -> Result<f64, ConvertError> {
    let mm = match normalize(unit).as_str() {
        "mm" => value,
        "in" | "inch" | "inches" => value * INCH_TO_MM,
        _ => return Err(invalid("precipitation", unit)),
    };
    bounded("precipitation", mm, PRECIPITATION_BOUNDS)
}

/// Inverse of [`precipitation`]: express a millimeter value in the given unit.
pub fn precipitation_from_mm(mm: f64, unit: &str) -> Result<f64, ConvertError> {
    match normalize(unit).as_str() {
        "mm" => Ok(mm),
        "in" | "inch" | "inches" => Ok(mm / INCH_TO_MM),
        _ => Err(invalid("precipitation", unit)),
    }
}

/// Validate a relative humidity percentage.
pub fn humidity(value: f64) -> Result<f64, ConvertError> {
    bounded("humidity", value, (0.0, 100.0))
}

/// Validate a wind direction azimuth in degrees; 360 normalizes to 0.
pub fn direction(value: f64) -> Result<f64, ConvertError> {
    let degrees = bounded("wind direction", value, (0.0, 360.0))?;
    if (degrees - 360.0).abs() < f64::EPSILON {
        Ok(0.0)
    } else {
        Ok(degrees)
    }
}

/// Convert a 16-point compass token to degrees.
pub fn compass(token: &str) -> Result<f64, ConvertError> {
    let degrees = match normalize(token).as_str() {
        "n" => 0.0,
        "nne" => 22.5,
        "ne" => 45.0,
        "ene" => 67.5,
        "e" => 90.0,
        "ese" => 112.5,
        "se" => 135.0,
        "sse" => 157.5,
        "s" => 180.0,
        "ssw" => 202.5,
        "sw" => 225.0,
        "wsw" => 247.5,
        "w" => 270.0,
        "wnw" => 292.5,
        "nw" => 315.0,
        "nnw" => 337.5,
        _ => return Err(invalid("wind direction", token)),
    };
    Ok(degrees)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9 * b.abs().max(1.0), "{a} != {b}");
    }

    #[test]
    fn fahrenheit_to_celsius() {
        approx(temperature(32.0, "f").unwrap(), 0.0);
        approx(temperature(86.0, "F").unwrap(), 30.0);
    }

    #[test]
    fn fahrenheit_boiling_point_is_out_of_range() {
        // 212 °F is 100 °C, well past any surface observation
        assert!(matches!(
            temperature(212.0, "f"),
            Err(ConvertError::OutOfRange { .. })
        ));
    }

    #[test]
    fn kelvin_to_celsius() {
        approx(temperature(273.15, "k").unwrap(), 0.0);
    }

    #[test]
    fn inhg_to_hpa() {
        approx(pressure(29.92, "inhg").unwrap(), 29.92 * INHG_PER_HPA);
    }

    #[test]
    fn unknown_unit_is_rejected() {
        assert!(matches!(
            temperature(20.0, "furlongs"),
            Err(ConvertError::InvalidUnit { .. })
        ));
        assert!(matches!(
            pressure(1000.0, "bar "),
            Err(ConvertError::InvalidUnit { .. })
        ));
        assert!(matches!(
            wind_speed(3.0, ""),
            Err(ConvertError::InvalidUnit { .. })
        ));
    }

    #[test]
    fn humidity_bounds() {
        assert_eq!(humidity(0.0).unwrap(), 0.0);
        assert_eq!(humidity(100.0).unwrap(), 100.0);
        assert!(matches!(
            humidity(100.5),
            Err(ConvertError::OutOfRange { .. })
        ));
        assert!(matches!(
            humidity(-1.0),
            Err(ConvertError::OutOfRange { .. })
        ));
    }

    #[test]
    fn direction_normalizes_360() {
        assert_eq!(direction(360.0).unwrap(), 0.0);
        assert_eq!(direction(180.0).unwrap(), 180.0);
        assert!(direction(361.0).is_err());
        assert!(direction(-5.0).is_err());
    }

    #[test]
    fn compass_tokens() {
        assert_eq!(compass("N").unwrap(), 0.0);
        assert_eq!(compass("ssw").unwrap(), 202.5);
        assert_eq!(compass(" NE ").unwrap(), 45.0);
        assert!(compass("north-ish").is_err());
    }

    #[test]
    fn negative_wind_is_out_of_range() {
        assert!(matches!(
            wind_speed(-1.0, "m/s"),
            Err(ConvertError::OutOfRange { .. })
        ));
    }

    #[test]
    fn nan_is_out_of_range() {
        assert!(temperature(f64::NAN, "c").is_err());
    }

    proptest! {
        #[test]
        fn temperature_round_trip(celsius in -89.0f64..59.0, unit in prop::sample::select(vec!["f", "k", "c"])) {
            let provider_value = temperature_from_celsius(celsius, unit).unwrap();
            let back = temperature(provider_value, unit).unwrap();
            prop_assert!((back - celsius).abs() < 1e-9);
        }

        #[test]
        fn pressure_round_trip(hpa in 501.0f64..1099.0, unit in prop::sample::select(vec!["hpa", "inhg", "mmhg", "psi"])) {
            let provider_value = pressure_from_hpa(hpa, unit).unwrap();
            let back = pressure(provider_value, unit).unwrap();
            prop_assert!((back - hpa).abs() < 1e-9 * hpa);
        }

        #[test]
        fn wind_speed_round_trip(mps in 0.0f64..149.0, unit in prop::sample::select(vec!["m/s", "km/h", "mph", "kn"])) {
            let provider_value = wind_speed_from_mps(mps, unit).unwrap();
            let back = wind_speed(provider_value, unit).unwrap();
            prop_assert!((back - mps).abs() < 1e-9 * mps.max(1.0));
        }

        #[test]
        fn precipitation_round_trip(mm in 0.0f64..1999.0, unit in prop::sample::select(vec!["mm", "in"])) {
            let provider_value = precipitation_from_mm(mm, unit).unwrap();
            let back = precipitation(provider_value, unit).unwrap();
            prop_assert!((back - mm).abs() < 1e-9 * mm.max(1.0));
        }
    }
}
