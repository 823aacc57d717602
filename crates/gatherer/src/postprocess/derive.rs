//! Derived measurements
//!
//! Dew point via the Magnus approximation and heat index via the Rothfusz
//! regression, both from temperature + humidity. A missing input leaves the
//! derived field `None`.

use domain::NormalizedObservation;

use super::corrector::round1;

// Magnus coefficients over water, valid for -45..60 °C.
const MAGNUS_A: f64 = 17.62;
const MAGNUS_B: f64 = 243.12;

// The Rothfusz regression only models hot, humid conditions.
const HEAT_INDEX_MIN_TEMPERATURE: f64 = 27.0;
const HEAT_INDEX_MIN_HUMIDITY: f64 = 40.0;

/// Dew point in °C from temperature (°C) and relative humidity (%).
#[must_use]
pub fn dew_point(temperature: f64, humidity: f64) -> f64 {
    let gamma = (humidity / 100.0).ln() + MAGNUS_A * temperature / (MAGNUS_B + temperature);
    MAGNUS_B * gamma / (MAGNUS_A - gamma)
}

/// Heat index in °C, or `None` outside the regression's domain.
#[must_use]
pub fn heat_index(temperature: f64, humidity: f64) -> Option<f64> {
    if temperature < HEAT_INDEX_MIN_TEMPERATURE || humidity < HEAT_INDEX_MIN_HUMIDITY {
        return None;
    }

    let t = temperature.mul_add(1.8, 32.0);
    let rh = humidity;
    let hi_f = -42.379 + 2.049_015_23 * t + 10.143_331_27 * rh - 0.224_755_41 * t * rh
        - 6.837_83e-3 * t * t
        - 5.481_717e-2 * rh * rh
        + 1.228_74e-3 * t * t * rh
        + 8.528_2e-4 * t * rh * rh
        - 1.99e-6 * t * t * rh * rh;

    Some((hi_f - 32.0) / 1.8)
}

/// Fill `dew_point` and `heat_index` where the inputs allow.
pub fn apply(observation: &mut NormalizedObservation) {
    let (Some(temperature), Some(humidity)) = (observation.temperature, observation.humidity)
    else {
        return;
    };

    observation.dew_point = Some(round1(dew_point(temperature, humidity)));
    observation.heat_index = heat_index(temperature, humidity).map(round1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn dew_point_matches_reference_values() {
        assert!((dew_point(20.0, 50.0) - 9.26).abs() < 0.05);
        assert!((dew_point(30.0, 80.0) - 26.2).abs() < 0.1);
        // Saturated air: dew point equals the temperature.
        assert!((dew_point(15.0, 100.0) - 15.0).abs() < 0.01);
    }

    #[test]
    fn heat_index_exceeds_temperature_when_humid() {
        let hi = heat_index(32.0, 70.0).unwrap();
        assert!((hi - 40.4).abs() < 0.5);
    }

    #[test]
    fn heat_index_is_undefined_for_mild_conditions() {
        assert!(heat_index(26.9, 80.0).is_none());
        assert!(heat_index(35.0, 39.0).is_none());
    }

    #[test]
    fn missing_inputs_leave_derived_fields_empty() {
        let mut obs = NormalizedObservation::new(Uuid::new_v4(), Utc::now());
        obs.temperature = Some(22.0);
        apply(&mut obs);
        assert!(obs.dew_point.is_none());
        assert!(obs.heat_index.is_none());
    }

    #[test]
    fn apply_fills_both_fields_when_hot() {
        let mut obs = NormalizedObservation::new(Uuid::new_v4(), Utc::now());
        obs.temperature = Some(32.0);
        obs.humidity = Some(70.0);
        apply(&mut obs);
        assert!(obs.dew_point.is_some());
        assert!(obs.heat_index.is_some());
    }
}
