//! Station calibration and rounding

use domain::NormalizedObservation;

/// Round to one decimal place.
#[must_use]
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round_field(field: &mut Option<f64>) {
    if let Some(value) = *field {
        *field = Some(round1(value));
    }
}

/// Apply the station's pressure calibration offset, then round every
/// measurement to one decimal place.
pub fn apply(observation: &mut NormalizedObservation, pressure_offset: Option<f64>) {
    if let (Some(pressure), Some(offset)) = (observation.pressure, pressure_offset) {
        observation.pressure = Some(pressure + offset);
    }

    round_field(&mut observation.temperature);
    round_field(&mut observation.humidity);
    round_field(&mut observation.pressure);
    round_field(&mut observation.wind_speed);
    round_field(&mut observation.wind_gust);
    round_field(&mut observation.wind_direction);
    round_field(&mut observation.rain_rate);
    round_field(&mut observation.rain_day);
    round_field(&mut observation.max_temperature);
    round_field(&mut observation.min_temperature);
    round_field(&mut observation.max_wind_speed);
    round_field(&mut observation.max_wind_gust);
}
