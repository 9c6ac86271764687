//! Price Simulator
//!
//! One stochastic step per asset per tick. Each asset carries its own trend
//! run, so a burst of same-direction moves persists for several ticks before
//! the next direction is drawn against the current bias.

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::core::rng::DeterministicRng;
use crate::market::asset::Asset;

/// Largest per-tick fluctuation (exclusive).
pub const FLUCTUATION_MAX: f64 = 0.005;

/// Trend step bounds `[min, max)`.
pub const TREND_STEP_MIN: f64 = 0.01;
/// Upper trend step bound (exclusive).
pub const TREND_STEP_MAX: f64 = 0.03;

/// Trend run length bounds, in ticks (inclusive).
pub const TREND_RUN_MIN: u32 = 5;
/// Longest trend run.
pub const TREND_RUN_MAX: u32 = 15;

/// Per-tick spike probability.
pub const SPIKE_PROBABILITY: f64 = 0.005;
/// Spike magnitude bounds `[min, max)`.
pub const SPIKE_MIN: f64 = 0.05;
/// Upper spike bound (exclusive).
pub const SPIKE_MAX: f64 = 0.15;

/// Factor applied once a price crosses its damping threshold.
pub const DAMPING_FACTOR: f64 = 0.999;

/// Lowest price any simulated asset can reach.
pub const PRICE_FLOOR: f64 = 1e-13;

/// Band the stable asset is redrawn within `[min, max)`.
pub const STABLE_BAND: (f64, f64) = (0.999, 1.001);

/// Trend direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    /// Rising.
    Up,
    /// Falling.
    Down,
}

impl TrendDirection {
    /// `+1.0` or `-1.0`.
    pub fn sign(self) -> f64 {
        match self {
            TrendDirection::Up => 1.0,
            TrendDirection::Down => -1.0,
        }
    }
}

/// Remaining length and direction of the current trend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendRun {
    /// Ticks left in the run.
    pub remaining_ticks: u32,
    /// Direction of the run.
    pub direction: TrendDirection,
}

impl Default for TrendRun {
    fn default() -> Self {
        Self {
            remaining_ticks: 10,
            direction: TrendDirection::Up,
        }
    }
}

/// Per-asset simulation state.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetPriceState {
    /// Current price in USDT. Always positive.
    pub price: f64,
    /// Current trend run.
    pub trend: TrendRun,
}

impl AssetPriceState {
    /// State at the asset's opening price.
    pub fn opening(asset: Asset) -> Self {
        Self {
            price: asset.opening_price(),
            trend: TrendRun::default(),
        }
    }
}

/// One point of price history.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Price in USDT.
    pub price: f64,
    /// When the price was set.
    pub timestamp: DateTime<Utc>,
}

/// Advance `state` by one tick under bias `bias`. Returns the new price.
pub fn step_price(asset: Asset, state: &mut AssetPriceState, bias: f64, rng: &mut DeterministicRng) -> f64 {
    if asset.is_stable() {
        state.price = rng.next_f64_range(STABLE_BAND.0, STABLE_BAND.1);
        return state.price;
    }

    let fluctuation = rng.next_f64_range(0.0, FLUCTUATION_MAX) * rng.signed(bias);

    let mut change = if state.trend.remaining_ticks > 0 {
        state.trend.remaining_ticks -= 1;
        state.trend.direction.sign() * rng.next_f64_range(TREND_STEP_MIN, TREND_STEP_MAX)
    } else {
        state.trend = TrendRun {
            remaining_ticks: rng.next_int_range(TREND_RUN_MIN, TREND_RUN_MAX),
            direction: if rng.chance(bias) { TrendDirection::Up } else { TrendDirection::Down },
        };
        fluctuation
    };

    if rng.chance(SPIKE_PROBABILITY) {
        change += rng.next_f64_range(SPIKE_MIN, SPIKE_MAX) * rng.signed(bias);
    }

    let mut next = state.price * (1.0 + change);
    if let Some(threshold) = asset.damping_threshold() {
        if next >= threshold {
            next *= DAMPING_FACTOR;
        }
    }

    state.price = next.max(PRICE_FLOOR);
    state.price
}
