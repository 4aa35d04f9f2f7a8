//! Bitcoin price simulation.
//!
//! A slider position in `0..=400` maps onto a price multiplier spanning
//! 0.01x to 100x. The range is split into four log-interpolated bands, so
//! the curve jumps at 100/101, 200/201 and 300/301 instead of being one
//! smooth line.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const SLIDER_MIN: u16 = 0;
pub const SLIDER_MAX: u16 = 400;
pub const SLIDER_DEFAULT: u16 = 200;

/// Number of slider steps between the first and last position of a band.
const BAND_STEPS: f64 = 99.0;

struct Band {
    first: u16,
    last: u16,
    low: f64,
    high: f64,
}

const BANDS: [Band; 4] = [
    Band { first: 1, last: 100, low: 0.01, high: 0.1 },
    Band { first: 101, last: 200, low: 0.2, high: 1.0 },
    Band { first: 201, last: 300, low: 2.0, high: 10.0 },
    Band { first: 301, last: 400, low: 11.0, high: 100.0 },
];

impl Band {
    fn contains(&self, position: u16) -> bool {
        (self.first..=self.last).contains(&position)
    }

    fn interpolate(&self, position: u16) -> f64 {
        let t = f64::from(position - self.first) / BAND_STEPS;
        let exponent = t * (self.high / self.low).log10() + self.low.log10();
        10f64.powf(exponent)
    }
}

/// Price multiplier for a slider position.
///
/// Position 0 and anything above 400 fall outside every band and yield 0.
pub fn multiplier(position: u16) -> f64 {
    BANDS
        .iter()
        .find(|band| band.contains(position))
        .map(|band| band.interpolate(position))
        .unwrap_or(0.0)
}

/// Which part of the curve a slider position sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    Wipeout,
    Crash,
    Mild,
    Rally,
    Moonshot,
}

impl Regime {
    pub fn of(position: u16) -> Regime {
        match position {
            1..=100 => Regime::Crash,
            101..=200 => Regime::Mild,
            201..=300 => Regime::Rally,
            301..=400 => Regime::Moonshot,
            _ => Regime::Wipeout,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Regime::Wipeout => "Wipeout",
            Regime::Crash => "Crash",
            Regime::Mild => "Mild",
            Regime::Rally => "Rally",
            Regime::Moonshot => "Moonshot",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Slider position, always within `SLIDER_MIN..=SLIDER_MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u16", into = "u16")]
pub struct SliderPosition(u16);

impl SliderPosition {
    pub fn new(position: u16) -> SliderPosition {
        SliderPosition(position.min(SLIDER_MAX))
    }

    pub fn get(self) -> u16 {
        self.0
    }

    pub fn step(self, delta: i32) -> SliderPosition {
        let moved = (i32::from(self.0) + delta).clamp(i32::from(SLIDER_MIN), i32::from(SLIDER_MAX));
        // clamped into u16 range above
        SliderPosition(moved as u16)
    }

    pub fn multiplier(self) -> f64 {
        multiplier(self.0)
    }

    pub fn regime(self) -> Regime {
        Regime::of(self.0)
    }

    /// Slider position as a fraction of the full travel, for gauges.
    pub fn ratio(self) -> f64 {
        f64::from(self.0) / f64::from(SLIDER_MAX)
    }
}

impl Default for SliderPosition {
    fn default() -> Self {
        SliderPosition(SLIDER_DEFAULT)
    }
}

impl From<u16> for SliderPosition {
    fn from(position: u16) -> Self {
        SliderPosition::new(position)
    }
}

impl From<SliderPosition> for u16 {
    fn from(position: SliderPosition) -> Self {
        position.0
    }
}

/// Snapshot of the bitcoin position as seen through the slider.
///
/// The real holding is never touched; this only holds the copy taken when
/// the simulation was entered or last adjusted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    pub amount: f64,
    pub price: f64,
}

impl Simulation {
    pub fn snapshot(amount: f64, real_price: f64, slider: SliderPosition) -> Simulation {
        Simulation {
            amount,
            price: real_price * slider.multiplier(),
        }
    }

    pub fn value(&self) -> f64 {
        self.amount * self.price
    }
}
