//! Dice Game Modes
//!
//! Two mutually exclusive ways to bet on a roll:
//!
//! - **Classic**: pick a win chance, win when the roll lands at or above
//!   `100 - winChance`.
//! - **Ultimate**: pick a range on the `[0, 10000]` scale (roll × 100) and win
//!   when the roll lands inside it.
//!
//! Both price in a 1% house edge, so `P(win) × multiplier = 0.99`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Serialize, Deserialize};

use crate::casino::resolver::BetError;
use crate::fairness::roll::{Roll, ROLL_MAX_HUNDREDTHS};

/// Payout numerator for classic mode (100 − house edge).
pub const CLASSIC_PAYOUT: Decimal = dec!(99);

/// Payout numerator for ultimate mode, on the ×100 scale.
pub const ULTIMATE_PAYOUT: Decimal = dec!(9900);

/// Width of the ultimate-mode domain.
pub const ULTIMATE_DOMAIN: Decimal = dec!(10000);

/// Mode selection and its caller-supplied parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum GameMode {
    /// Roll over `100 - win_chance`.
    Classic {
        /// Win probability in percent, strictly inside `(0, 100)`.
        win_chance: Decimal,
    },
    /// Roll inside `[range_min, range_max]` on the ×100 scale.
    Ultimate {
        /// Lower bound (inclusive).
        range_min: Decimal,
        /// Upper bound (inclusive).
        range_max: Decimal,
    },
}

/// A validated mode with its derived payout terms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BetTerms {
    /// The mode the terms were derived from.
    pub mode: GameMode,
    /// Gross payout multiplier on a win.
    pub multiplier: Decimal,
    win_zone: WinZone,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WinZone {
    /// Roll (in percent) at or above this value wins.
    AtLeast(Decimal),
    /// Roll × 100 inside `[min, max]` wins.
    Within(Decimal, Decimal),
}

impl GameMode {
    /// Check parameters and derive payout terms.
    ///
    /// Nothing here touches session state, so a rejection costs no nonce.
    pub fn validate(&self) -> Result<BetTerms, BetError> {
        match *self {
            GameMode::Classic { win_chance } => {
                if win_chance <= Decimal::ZERO || win_chance >= Decimal::ONE_HUNDRED {
                    return Err(BetError::InvalidModeParameters(format!(
                        "win chance {} must lie strictly between 0 and 100",
                        win_chance
                    )));
                }
                let multiplier = CLASSIC_PAYOUT
                    .checked_div(win_chance)
                    .ok_or_else(|| BetError::InvalidModeParameters("win chance too small".into()))?;

                Ok(BetTerms {
                    mode: *self,
                    multiplier,
                    win_zone: WinZone::AtLeast(Decimal::ONE_HUNDRED - win_chance),
                })
            }
            GameMode::Ultimate { range_min, range_max } => {
                if range_min < Decimal::ZERO || range_max > ULTIMATE_DOMAIN {
                    return Err(BetError::InvalidModeParameters(format!(
                        "range [{}, {}] must lie within [0, {}]",
                        range_min, range_max, ROLL_MAX_HUNDREDTHS
                    )));
                }
                let size = range_max - range_min;
                if size <= Decimal::ZERO {
                    return Err(BetError::InvalidModeParameters(format!(
                        "range [{}, {}] is empty",
                        range_min, range_max
                    )));
                }
                let multiplier = ULTIMATE_PAYOUT
                    .checked_div(size)
                    .ok_or_else(|| BetError::InvalidModeParameters("range too narrow".into()))?;

                Ok(BetTerms {
                    mode: *self,
                    multiplier,
                    win_zone: WinZone::Within(range_min, range_max),
                })
            }
        }
    }
}

impl BetTerms {
    /// Whether `roll` wins under these terms.
    pub fn is_win(&self, roll: Roll) -> bool {
        match self.win_zone {
            WinZone::AtLeast(target) => roll.as_decimal() >= target,
            WinZone::Within(min, max) => {
                let scaled = Decimal::from(roll.hundredths());
                scaled >= min && scaled <= max
            }
        }
    }

    /// Classic-mode roll-over target, if this is a classic bet.
    pub fn target(&self) -> Option<Decimal> {
        match self.win_zone {
            WinZone::AtLeast(target) => Some(target),
            WinZone::Within(..) => None,
        }
    }

    /// Win probability as a fraction of the outcome space.
    pub fn win_probability(&self) -> Decimal {
        match self.mode {
            GameMode::Classic { win_chance } => win_chance / Decimal::ONE_HUNDRED,
            GameMode::Ultimate { range_min, range_max } => (range_max - range_min) / ULTIMATE_DOMAIN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn roll(hundredths: u16) -> Roll {
        Roll::from_hundredths(hundredths).unwrap()
    }

    fn assert_edge(terms: &BetTerms) {
        let expected = terms.win_probability() * terms.multiplier;
        let error = (expected - dec!(0.99)).abs();
        assert!(error < dec!(0.000000000000000000001), "EV {} drifted from 0.99", expected);
    }

    #[test]
    fn test_classic_even_money() {
        let terms = GameMode::Classic { win_chance: dec!(50) }.validate().unwrap();
        assert_eq!(terms.multiplier, dec!(1.98));
        assert_eq!(terms.target(), Some(dec!(50)));
        assert!(terms.is_win(roll(7000)));
        assert!(terms.is_win(roll(5000)));
        assert!(!terms.is_win(roll(4999)));
    }

    #[test]
    fn test_classic_rejects_bounds() {
        for chance in [dec!(0), dec!(100), dec!(-5), dec!(150)] {
            let result = GameMode::Classic { win_chance: chance }.validate();
            assert!(matches!(result, Err(BetError::InvalidModeParameters(_))), "{} accepted", chance);
        }
    }

    #[test]
    fn test_classic_extremes_stay_valid() {
        let tiny = GameMode::Classic { win_chance: dec!(0.01) }.validate().unwrap();
        assert_eq!(tiny.multiplier, dec!(9900));
        assert!(tiny.is_win(Roll::MAX));
        assert!(!tiny.is_win(roll(9998)));

        let huge = GameMode::Classic { win_chance: dec!(99.99) }.validate().unwrap();
        assert!(huge.is_win(roll(1)));
        assert!(!huge.is_win(Roll::MIN));
    }

    #[test]
    fn test_ultimate_half_range() {
        let terms = GameMode::Ultimate { range_min: dec!(2500), range_max: dec!(7500) }
            .validate()
            .unwrap();
        assert_eq!(terms.multiplier, dec!(1.98));
        assert_eq!(terms.target(), None);
        assert!(terms.is_win(roll(2500)));
        assert!(terms.is_win(roll(7500)));
        assert!(!terms.is_win(roll(2499)));
        assert!(!terms.is_win(roll(7501)));
    }

    #[test]
    fn test_ultimate_rejects_degenerate_and_out_of_domain() {
        let cases = [
            (dec!(5000), dec!(5000)),
            (dec!(6000), dec!(5000)),
            (dec!(-1), dec!(100)),
            (dec!(100), dec!(10001)),
        ];
        for (min, max) in cases {
            let result = GameMode::Ultimate { range_min: min, range_max: max }.validate();
            assert!(matches!(result, Err(BetError::InvalidModeParameters(_))), "[{}, {}] accepted", min, max);
        }
    }

    #[test]
    fn test_mode_wire_format() {
        let json = r#"{"mode":"ultimate","rangeMin":"2500","rangeMax":"7500"}"#;
        let mode: GameMode = serde_json::from_str(json).unwrap();
        assert_eq!(mode, GameMode::Ultimate { range_min: dec!(2500), range_max: dec!(7500) });

        let classic = serde_json::to_value(GameMode::Classic { win_chance: dec!(50) }).unwrap();
        assert_eq!(classic["mode"], "classic");
        assert_eq!(classic["winChance"], "50");
    }

    proptest! {
        #[test]
        fn prop_classic_house_edge(cents in 1u32..10_000) {
            let win_chance = Decimal::new(cents as i64, 2);
            let terms = GameMode::Classic { win_chance }.validate().unwrap();
            assert_edge(&terms);
        }

        #[test]
        fn prop_ultimate_house_edge(a in 0u32..=10_000, b in 0u32..=10_000) {
            prop_assume!(a != b);
            let (min, max) = if a < b { (a, b) } else { (b, a) };
            let terms = GameMode::Ultimate {
                range_min: Decimal::from(min),
                range_max: Decimal::from(max),
            }
            .validate()
            .unwrap();
            assert_edge(&terms);
        }
    }
}
