//! Market Simulation
//!
//! Hidden bias process plus per-asset price paths, advanced one tick at a time.

pub mod asset;
pub mod price;
pub mod probability;
pub mod tick;

// Re-export key types
pub use asset::{Asset, UnknownAsset};
pub use price::{step_price, AssetPriceState, PricePoint, TrendDirection, TrendRun};
pub use probability::{HackDirection, HackOverride, Phase, ProbabilityEngine, ProbabilityState};
pub use tick::{BiasSnapshot, Market, TickReport, DEFAULT_PRICE_HISTORY};
