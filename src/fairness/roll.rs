//! Roll Derivation
//!
//! Turns a `(server seed, client seed, nonce)` triple into a dice roll in
//! `[0.00, 100.00]`. The function is pure: anyone holding the revealed
//! server seed can recompute every roll made under it.
//!
//! ```text
//! digest = HMAC-SHA256(key = server_seed_hex, msg = "{client_seed}:{nonce}")
//! d      = u32::from_be_bytes(digest[0..4])
//! roll   = (d mod 10001) / 100
//! ```

use std::fmt;
use rust_decimal::Decimal;
use serde::{Serialize, Deserialize};

use crate::core::hash::hmac_sha256;

/// Number of distinct roll outcomes (0.00 through 100.00).
pub const ROLL_OUTCOMES: u32 = 10_001;

/// Largest roll, in hundredths.
pub const ROLL_MAX_HUNDREDTHS: u16 = 10_000;

/// A dice roll with two-decimal resolution, stored as integer hundredths.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Roll(u16);

impl Roll {
    /// Lowest possible roll.
    pub const MIN: Roll = Roll(0);
    /// Highest possible roll.
    pub const MAX: Roll = Roll(ROLL_MAX_HUNDREDTHS);

    /// Build a roll from hundredths, rejecting values above 100.00.
    pub fn from_hundredths(hundredths: u16) -> Option<Self> {
        (hundredths <= ROLL_MAX_HUNDREDTHS).then_some(Self(hundredths))
    }

    /// Roll scaled to integer hundredths (`0..=10000`).
    #[inline]
    pub fn hundredths(self) -> u16 {
        self.0
    }

    /// Roll as an exact decimal (`12.03`).
    #[inline]
    pub fn as_decimal(self) -> Decimal {
        Decimal::new(self.0 as i64, 2)
    }
}

impl TryFrom<u16> for Roll {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Roll::from_hundredths(value).ok_or_else(|| format!("roll {} exceeds {}", value, ROLL_MAX_HUNDREDTHS))
    }
}

impl From<Roll> for u16 {
    fn from(roll: Roll) -> u16 {
        roll.0
    }
}

impl fmt::Display for Roll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Compute the roll for a bet.
///
/// `server_seed_hex` is the canonical (lowercase hex) form of the server seed;
/// it is used verbatim as the HMAC key so that third parties can verify with
/// the string that gets revealed on rotation.
pub fn compute_roll(server_seed_hex: &str, client_seed: &str, nonce: u64) -> Roll {
    let message = format!("{}:{}", client_seed, nonce);
    let digest = hmac_sha256(server_seed_hex.as_bytes(), message.as_bytes());

    let d = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    Roll((d % ROLL_OUTCOMES) as u16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ZERO_SEED: &str = "0000000000000000000000000000000000000000000000000000000000000000";

    #[test]
    fn test_regression_fixture() {
        // Pinned reference values; any reimplementation must reproduce them.
        assert_eq!(compute_roll(ZERO_SEED, "abc", 1).hundredths(), 1203);
        assert_eq!(compute_roll(ZERO_SEED, "abc", 2).hundredths(), 140);
        assert_eq!(compute_roll(ZERO_SEED, "abc", 3).hundredths(), 4201);
        assert_eq!(compute_roll(ZERO_SEED, "abc", 1).to_string(), "12.03");
    }

    #[test]
    fn test_nonce_changes_roll() {
        let a = compute_roll(ZERO_SEED, "abc", 1);
        let b = compute_roll(ZERO_SEED, "abc", 2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_roll_display() {
        assert_eq!(Roll::MIN.to_string(), "0.00");
        assert_eq!(Roll::MAX.to_string(), "100.00");
        assert_eq!(Roll::from_hundredths(140).unwrap().to_string(), "1.40");
        assert_eq!(Roll::from_hundredths(7000).unwrap().as_decimal(), Decimal::new(70, 0));
    }

    #[test]
    fn test_roll_rejects_out_of_range() {
        assert!(Roll::from_hundredths(10_001).is_none());
        assert!(serde_json::from_str::<Roll>("10001").is_err());
        assert_eq!(serde_json::from_str::<Roll>("1203").unwrap().hundredths(), 1203);
    }

    proptest! {
        #[test]
        fn prop_roll_is_deterministic(
            seed in proptest::collection::vec(any::<u8>(), 32),
            client in "[a-zA-Z0-9]{0,24}",
            nonce in any::<u64>(),
        ) {
            let seed_hex = hex::encode(&seed);
            let first = compute_roll(&seed_hex, &client, nonce);
            for _ in 0..3 {
                prop_assert_eq!(compute_roll(&seed_hex, &client, nonce), first);
            }
        }

        #[test]
        fn prop_roll_in_range_with_cent_resolution(
            seed in proptest::collection::vec(any::<u8>(), 32),
            client in ".{0,16}",
            nonce in any::<u64>(),
        ) {
            let roll = compute_roll(&hex::encode(&seed), &client, nonce);
            let value = roll.as_decimal();
            prop_assert!(value >= Decimal::ZERO);
            prop_assert!(value <= Decimal::ONE_HUNDRED);
            prop_assert!(value.scale() <= 2);
        }
    }
}
