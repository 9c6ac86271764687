//! Market Tick
//!
//! The market's single mutation point. Each tick advances the probability
//! engine, then steps every tracked asset in a fixed order against the bias
//! it reports, then records the new prices.
//!
//! # Determinism
//!
//! Given the same seed and the same sequence of `now_ms` values, a market
//! produces the same price path:
//! - Assets are stepped in [`Asset::ALL`] order (BTreeMap iteration)
//! - All randomness comes from the market's own [`DeterministicRng`]
//! - Time is supplied by the caller

use std::collections::{BTreeMap, VecDeque};
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::core::rng::DeterministicRng;
use crate::market::asset::Asset;
use crate::market::price::{step_price, AssetPriceState, PricePoint};
use crate::market::probability::{HackDirection, HackOverride, ProbabilityEngine, ProbabilityState};

/// Default price history length: 24 hours at one tick per second.
pub const DEFAULT_PRICE_HISTORY: usize = 8640;

/// What a tick did.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    /// Ticks run so far, including this one.
    pub tick: u64,
    /// Bias the prices were stepped with.
    pub bias: f64,
    /// Prices after the tick.
    pub prices: BTreeMap<Asset, f64>,
}

/// Reported bias with the state behind it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiasSnapshot {
    /// Bias after any hack, clamped into `[0, 1]`.
    pub reported_bias: f64,
    /// Active hack, if any.
    pub hack: Option<HackOverride>,
    /// State machine snapshot.
    pub state: ProbabilityState,
}

/// The simulated market: bias engine, per-asset prices and their history.
#[derive(Debug)]
pub struct Market {
    rng: DeterministicRng,
    probability: ProbabilityEngine,
    assets: BTreeMap<Asset, AssetPriceState>,
    history: BTreeMap<Asset, VecDeque<PricePoint>>,
    history_capacity: usize,
    tick: u64,
}

impl Market {
    /// Open a market at `now_ms` with every asset at its opening price.
    pub fn new(seed: u64, history_capacity: usize, now_ms: u64) -> Self {
        let mut rng = DeterministicRng::new(seed);
        let probability = ProbabilityEngine::new(now_ms, &mut rng);
        let history_capacity = history_capacity.max(1);

        let assets = Asset::ALL
            .iter()
            .map(|&asset| (asset, AssetPriceState::opening(asset)))
            .collect();
        let history = Asset::ALL
            .iter()
            .map(|&asset| (asset, VecDeque::with_capacity(history_capacity.min(DEFAULT_PRICE_HISTORY))))
            .collect();

        Self {
            rng,
            probability,
            assets,
            history,
            history_capacity,
            tick: 0,
        }
    }

    /// Run one tick at monotonic time `now_ms`, stamping history with `at`.
    pub fn tick(&mut self, now_ms: u64, at: DateTime<Utc>) -> TickReport {
        // 1. Advance the bias state machine
        self.probability.advance(now_ms, &mut self.rng);
        let bias = self.probability.reported_bias(now_ms);

        // 2. Step every asset (BTreeMap order)
        let mut prices = BTreeMap::new();
        for (&asset, state) in self.assets.iter_mut() {
            let price = step_price(asset, state, bias, &mut self.rng);
            prices.insert(asset, price);
        }

        // 3. Record history
        for (&asset, &price) in &prices {
            let ring = self.history.entry(asset).or_default();
            if ring.len() == self.history_capacity {
                ring.pop_front();
            }
            ring.push_back(PricePoint { price, timestamp: at });
        }

        self.tick += 1;

        TickReport {
            tick: self.tick,
            bias,
            prices,
        }
    }

    /// Install a hack override on the bias.
    pub fn set_hack(&mut self, direction: HackDirection, duration_ms: u64, now_ms: u64) -> HackOverride {
        self.probability.set_hack(direction, duration_ms, now_ms)
    }

    /// Reported bias at `now_ms`, with the state behind it.
    pub fn bias(&self, now_ms: u64) -> BiasSnapshot {
        BiasSnapshot {
            reported_bias: self.probability.reported_bias(now_ms),
            hack: self.probability.hack(now_ms),
            state: self.probability.state().clone(),
        }
    }

    /// Current price of every asset.
    pub fn prices(&self) -> BTreeMap<Asset, f64> {
        self.assets.iter().map(|(&asset, state)| (asset, state.price)).collect()
    }

    /// Current price of one asset.
    pub fn price(&self, asset: Asset) -> Option<f64> {
        self.assets.get(&asset).map(|state| state.price)
    }

    /// Price history of one asset, oldest first.
    pub fn price_history(&self, asset: Asset) -> Vec<PricePoint> {
        self.history
            .get(&asset)
            .map(|ring| ring.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Per-asset simulation state.
    pub fn asset_state(&self, asset: Asset) -> Option<&AssetPriceState> {
        self.assets.get(&asset)
    }

    /// Ticks run so far.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::probability::{BEAR_BIAS, BULL_BIAS, HACK_UP_MULTIPLIER};

    fn run(market: &mut Market, ticks: u64) -> Vec<TickReport> {
        let start = Utc::now();
        (1..=ticks)
            .map(|t| market.tick(t * 1000, start + chrono::Duration::seconds(t as i64)))
            .collect()
    }

    #[test]
    fn test_tick_steps_every_asset() {
        let mut market = Market::new(42, DEFAULT_PRICE_HISTORY, 0);
        let report = market.tick(1000, Utc::now());
        assert_eq!(report.tick, 1);
        assert_eq!(report.prices.len(), Asset::ALL.len());
        assert_eq!(report.bias, BULL_BIAS);
        assert_eq!(market.prices(), report.prices);
    }

    #[test]
    fn test_same_seed_same_path() {
        let mut a = Market::new(42, 100, 0);
        let mut b = Market::new(42, 100, 0);
        let ra = run(&mut a, 200);
        let rb = run(&mut b, 200);
        for (x, y) in ra.iter().zip(&rb) {
            assert_eq!(x.prices, y.prices);
            assert_eq!(x.bias, y.bias);
        }
    }

    #[test]
    fn test_history_is_capped() {
        let mut market = Market::new(1, 30, 0);
        run(&mut market, 100);
        let history = market.price_history(Asset::Btc);
        assert_eq!(history.len(), 30);
        assert_eq!(history.last().map(|p| p.price), market.price(Asset::Btc));
        assert!(history.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn test_bias_stays_in_band_over_long_run() {
        let mut market = Market::new(8, 10, 0);
        for report in run(&mut market, 3600) {
            assert!((BEAR_BIAS..=BULL_BIAS).contains(&report.bias));
            assert!(report.prices.values().all(|&p| p > 0.0));
        }
    }

    #[test]
    fn test_hack_drives_reported_bias() {
        let mut market = Market::new(2, 10, 0);
        market.set_hack(HackDirection::Up, 60_000, 0);
        let report = market.tick(1000, Utc::now());
        assert!((report.bias - BULL_BIAS * HACK_UP_MULTIPLIER).abs() < 1e-12);

        let snapshot = market.bias(1000);
        assert!(snapshot.hack.is_some());
        assert_eq!(snapshot.state.current_bias, BULL_BIAS);

        let later = market.tick(61_000, Utc::now());
        assert!(later.bias <= BULL_BIAS);
        assert!(market.bias(61_000).hack.is_none());
    }
}
