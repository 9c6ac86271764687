//! Bet Settlement
//!
//! Pure settlement math: given validated terms, a roll and a stake, decide
//! the outcome and the net balance change. Balance checks live here too so
//! the session can run every validation before it consumes a nonce.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Serialize, Deserialize};

use crate::casino::bet::BetOutcome;
use crate::casino::mode::BetTerms;
use crate::fairness::roll::Roll;
use crate::market::asset::Asset;

/// Decimal places kept on settled amounts.
pub const MONEY_SCALE: u32 = 8;

/// Reasons a bet is rejected. None of them change any state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BetError {
    /// Stake exceeds the casino balance for the currency.
    #[error("Insufficient balance: {available} {currency} available, {requested} requested")]
    InsufficientBalance {
        /// Currency of the bet.
        currency: Asset,
        /// Balance before the bet.
        available: Decimal,
        /// Stake requested.
        requested: Decimal,
    },

    /// Win chance or range is unusable.
    #[error("Invalid mode parameters: {0}")]
    InvalidModeParameters(String),

    /// Stake is zero or negative.
    #[error("Stake must be positive, got {0}")]
    InvalidStake(Decimal),

    /// The casino bankroll does not hold this currency.
    #[error("Currency {0} is not accepted by the casino")]
    UnsupportedCurrency(Asset),

    /// A win would not fit in a `Decimal`.
    #[error("Payout overflows: stake {stake} at multiplier {multiplier}")]
    PayoutOverflow {
        /// Stake requested.
        stake: Decimal,
        /// Gross multiplier offered by the terms.
        multiplier: Decimal,
    },
}

/// Outcome of applying a roll to a stake.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    /// Win or lose.
    pub outcome: BetOutcome,
    /// Gross multiplier offered by the terms.
    pub multiplier: Decimal,
    /// Net balance change.
    pub profit: Decimal,
}

/// Check that `stake` is positive, payable in `currency` and covered by `balance`.
pub fn check_stake(currency: Asset, balance: Decimal, stake: Decimal) -> Result<(), BetError> {
    if !currency.is_casino_currency() {
        return Err(BetError::UnsupportedCurrency(currency));
    }
    if stake <= Decimal::ZERO {
        return Err(BetError::InvalidStake(stake));
    }
    if balance < stake {
        return Err(BetError::InsufficientBalance {
            currency,
            available: balance,
            requested: stake,
        });
    }
    Ok(())
}

/// Both possible results of a bet, priced before the roll is drawn.
///
/// Building a quote is the last fallible step of placing a bet. Once it
/// exists, [`Quote::settle`] cannot fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quote {
    multiplier: Decimal,
    stake: Decimal,
    win_profit: Decimal,
    win_balance: Decimal,
    lose_balance: Decimal,
}

impl Quote {
    /// Run every check a bet needs: currency, stake, balance and payout size.
    pub fn new(terms: &BetTerms, currency: Asset, balance: Decimal, stake: Decimal) -> Result<Self, BetError> {
        check_stake(currency, balance, stake)?;
        let overflow = || BetError::PayoutOverflow { stake, multiplier: terms.multiplier };
        let win_profit = win_profit(terms, stake).ok_or_else(overflow)?;
        let win_balance = balance.checked_add(win_profit).ok_or_else(overflow)?;

        Ok(Self {
            multiplier: terms.multiplier,
            stake,
            win_profit,
            win_balance,
            lose_balance: balance - stake,
        })
    }

    /// Net profit if the bet wins.
    pub fn win_profit(&self) -> Decimal {
        self.win_profit
    }

    /// Settle against the outcome. Returns the settlement and the new balance.
    pub fn settle(&self, outcome: BetOutcome) -> (Settlement, Decimal) {
        match outcome {
            BetOutcome::Win => (
                Settlement { outcome, multiplier: self.multiplier, profit: self.win_profit },
                self.win_balance,
            ),
            BetOutcome::Lose => (
                Settlement { outcome, multiplier: self.multiplier, profit: -self.stake },
                self.lose_balance,
            ),
        }
    }
}

/// Settle a stake against a roll.
///
/// A win pays `stake × (multiplier − 1)` net; the fractional part beyond
/// [`MONEY_SCALE`] is truncated toward zero. A loss costs exactly the stake.
pub fn settle(terms: &BetTerms, roll: Roll, stake: Decimal) -> Result<Settlement, BetError> {
    if terms.is_win(roll) {
        let profit = win_profit(terms, stake).ok_or(BetError::PayoutOverflow {
            stake,
            multiplier: terms.multiplier,
        })?;
        Ok(Settlement {
            outcome: BetOutcome::Win,
            multiplier: terms.multiplier,
            profit,
        })
    } else {
        Ok(Settlement {
            outcome: BetOutcome::Lose,
            multiplier: terms.multiplier,
            profit: -stake,
        })
    }
}

fn win_profit(terms: &BetTerms, stake: Decimal) -> Option<Decimal> {
    let net = terms.multiplier.checked_sub(Decimal::ONE)?;
    stake
        .checked_mul(net)
        .map(|profit| profit.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::ToZero))
}
