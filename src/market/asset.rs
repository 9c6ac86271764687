//! Tracked Assets
//!
//! The fixed asset universe of the simulation, with opening prices and the
//! thresholds above which each asset's growth is damped.

use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};

/// A tradable (simulated) asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Asset {
    /// Bitcoin
    Btc,
    /// Ether
    Eth,
    /// Dogecoin
    Doge,
    /// Shiba Inu
    Shib,
    /// Toncoin
    Ton,
    /// Tron
    Trx,
    /// Litecoin
    Ltc,
    /// Terra Luna
    Luna,
    /// House token
    Bc,
    /// Tether, the stable asset
    Usdt,
}

impl Asset {
    /// Every tracked asset, in display order.
    pub const ALL: [Asset; 10] = [
        Asset::Btc,
        Asset::Eth,
        Asset::Doge,
        Asset::Shib,
        Asset::Ton,
        Asset::Trx,
        Asset::Ltc,
        Asset::Luna,
        Asset::Bc,
        Asset::Usdt,
    ];

    /// Ticker symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Asset::Btc => "BTC",
            Asset::Eth => "ETH",
            Asset::Doge => "DOGE",
            Asset::Shib => "SHIB",
            Asset::Ton => "TON",
            Asset::Trx => "TRX",
            Asset::Ltc => "LTC",
            Asset::Luna => "LUNA",
            Asset::Bc => "BC",
            Asset::Usdt => "USDT",
        }
    }

    /// Price at simulation start (quoted in USDT).
    pub fn opening_price(self) -> f64 {
        match self {
            Asset::Btc => 0.00089,
            Asset::Eth => 0.32,
            Asset::Doge => 0.0000869,
            Asset::Shib => 0.000007,
            Asset::Ton => 0.39,
            Asset::Trx => 0.08,
            Asset::Ltc => 1.1,
            Asset::Luna => 1.35,
            Asset::Bc => 0.0001,
            Asset::Usdt => 1.0,
        }
    }

    /// Price above which further growth is decelerated.
    ///
    /// `None` for the stable asset, which never runs the stochastic process.
    pub fn damping_threshold(self) -> Option<f64> {
        match self {
            Asset::Eth => Some(3857.0),
            Asset::Doge => Some(5.75),
            Asset::Shib => Some(0.075),
            Asset::Ton => Some(15.12),
            Asset::Trx | Asset::Ltc | Asset::Luna => Some(315.12),
            Asset::Btc | Asset::Bc => Some(100_000.0),
            Asset::Usdt => None,
        }
    }

    /// Whether this asset is pinned near parity instead of simulated.
    pub fn is_stable(self) -> bool {
        matches!(self, Asset::Usdt)
    }

    /// Whether the casino bankroll accepts this asset.
    pub fn is_casino_currency(self) -> bool {
        matches!(self, Asset::Usdt | Asset::Bc)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Unknown ticker symbol.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown asset: {0}")]
pub struct UnknownAsset(pub String);

impl FromStr for Asset {
    type Err = UnknownAsset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Asset::ALL
            .iter()
            .copied()
            .find(|asset| asset.symbol().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownAsset(s.to_string()))
    }
}
