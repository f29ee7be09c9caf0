//! Closed-form waveform generators.
//!
//! Every generator maps a timestamp in seconds to a single sample value.
//! The functions are pure: the same timestamp and parameters always give a
//! bit-identical result.
//!
//! The `shape_rate` parameter is a shape constant of the waveform. It is not
//! related to the rate at which a streaming session delivers samples; a
//! client asking for 10 samples per second still sees a sine whose period is
//! `shape_rate / frequency` seconds.

use std::f64::consts::PI;

/// Shape parameters shared by all generators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveParams {
    pub frequency: f64,
    pub amplitude: f64,
    /// Divisor applied to the timestamp before the waveform is evaluated.
    pub shape_rate: f64,
}

impl Default for WaveParams {
    fn default() -> Self {
        Self {
            frequency: 1.0,
            amplitude: 1.0,
            shape_rate: 60.0,
        }
    }
}

/// Waveform shape attached to a device at registry time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalType {
    Sine,
    Square,
}

impl SignalType {
    /// Raw sample at `t` using the default shape parameters.
    pub fn sample(self, t: f64) -> f64 {
        self.sample_with(t, &WaveParams::default())
    }

    /// Raw sample at `t` using explicit shape parameters.
    pub fn sample_with(self, t: f64, params: &WaveParams) -> f64 {
        match self {
            SignalType::Sine => sine(t, params),
            SignalType::Square => square(t, params),
        }
    }

    /// Sample as it is put on the wire.
    ///
    /// Sine output is rounded to millis; square output is already
    /// `±amplitude` and is left alone.
    pub fn emitted_sample(self, t: f64) -> f64 {
        match self {
            SignalType::Sine => round_millis(self.sample(t)),
            SignalType::Square => self.sample(t),
        }
    }
}

impl std::fmt::Display for SignalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalType::Sine => write!(f, "sine"),
            SignalType::Square => write!(f, "square"),
        }
    }
}

/// `amplitude * sin(2π * frequency * t / shape_rate)`
pub fn sine(t: f64, params: &WaveParams) -> f64 {
    params.amplitude * (2.0 * PI * params.frequency * t / params.shape_rate).sin()
}

/// `+amplitude` on even half-periods, `-amplitude` on odd ones.
///
/// The half-period index uses the floating point remainder, so a negative
/// odd index yields `-amplitude` as well.
pub fn square(t: f64, params: &WaveParams) -> f64 {
    let half_period = params.shape_rate / (2.0 * params.frequency);
    if (t / half_period).floor() % 2.0 == 0.0 {
        params.amplitude
    } else {
        -params.amplitude
    }
}

/// Round to three decimal places, half away from zero.
///
/// Negative zero is normalised so it never reaches the wire as `-0`.
pub fn round_millis(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0 + 0.0
}
