//! Bet Records
//!
//! Immutable receipts of settled bets and the bounded per-session history
//! that keeps the most recent ones.

use std::collections::VecDeque;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::casino::mode::GameMode;
use crate::fairness::roll::Roll;
use crate::market::asset::Asset;

/// Default number of bets kept per session.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Win or lose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetOutcome {
    /// Roll landed in the winning zone.
    Win,
    /// Roll missed.
    Lose,
}

impl BetOutcome {
    /// Convenience for `BetOutcome::Win`.
    pub fn is_win(self) -> bool {
        matches!(self, BetOutcome::Win)
    }
}

/// A settled bet.
///
/// Carries everything needed to re-verify the roll once the server seed for
/// its epoch has been disclosed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetRecord {
    /// Unique bet identifier.
    pub id: Uuid,
    /// Settlement time.
    pub timestamp: DateTime<Utc>,
    /// Amount wagered.
    pub stake: Decimal,
    /// Currency of the stake.
    pub currency: Asset,
    /// Mode and its parameters.
    #[serde(flatten)]
    pub mode: GameMode,
    /// Roll-over target (classic mode only).
    pub target: Option<Decimal>,
    /// The roll.
    pub roll: Roll,
    /// Win or lose.
    pub outcome: BetOutcome,
    /// Gross payout multiplier offered.
    pub multiplier: Decimal,
    /// Net balance change (negative stake on a loss).
    pub profit: Decimal,
    /// Nonce consumed by this bet.
    pub nonce: u64,
    /// Client seed in effect.
    pub client_seed: String,
    /// Server seed commitment in effect.
    pub hashed_server_seed: String,
}

/// Most-recent-N ring of bet records, newest first.
#[derive(Clone, Debug)]
pub struct BetHistory {
    records: VecDeque<BetRecord>,
    capacity: usize,
}

impl BetHistory {
    /// Create an empty history keeping at most `capacity` records.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a record, evicting the oldest if full.
    pub fn push(&mut self, record: BetRecord) {
        if self.records.len() == self.capacity {
            self.records.pop_back();
        }
        self.records.push_front(record);
    }

    /// Records, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &BetRecord> {
        self.records.iter()
    }

    /// Most recent record.
    pub fn latest(&self) -> Option<&BetRecord> {
        self.records.front()
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no bets have been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Maximum number of records held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Owned copy, newest first.
    pub fn to_vec(&self) -> Vec<BetRecord> {
        self.records.iter().cloned().collect()
    }
}

impl Default for BetHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(nonce: u64) -> BetRecord {
        BetRecord {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            stake: dec!(1),
            currency: Asset::Bc,
            mode: GameMode::Classic { win_chance: dec!(50) },
            target: Some(dec!(50)),
            roll: Roll::from_hundredths(4200).unwrap(),
            outcome: BetOutcome::Lose,
            multiplier: dec!(1.98),
            profit: dec!(-1),
            nonce,
            client_seed: "abc".into(),
            hashed_server_seed: "00".into(),
        }
    }

    #[test]
    fn test_history_newest_first() {
        let mut history = BetHistory::new(10);
        for nonce in 1..=3 {
            history.push(record(nonce));
        }
        let nonces: Vec<u64> = history.iter().map(|r| r.nonce).collect();
        assert_eq!(nonces, vec![3, 2, 1]);
        assert_eq!(history.latest().map(|r| r.nonce), Some(3));
    }

    #[test]
    fn test_history_evicts_oldest() {
        let mut history = BetHistory::default();
        for nonce in 1..=60 {
            history.push(record(nonce));
        }
        assert_eq!(history.len(), DEFAULT_HISTORY_CAPACITY);
        assert_eq!(history.latest().map(|r| r.nonce), Some(60));
        assert_eq!(history.iter().last().map(|r| r.nonce), Some(11));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut history = BetHistory::new(0);
        history.push(record(1));
        history.push(record(2));
        assert_eq!(history.len(), 1);
        assert_eq!(history.capacity(), 1);
    }

    #[test]
    fn test_record_wire_format() {
        let value = serde_json::to_value(record(7)).unwrap();
        assert_eq!(value["mode"], "classic");
        assert_eq!(value["winChance"], "50");
        assert_eq!(value["outcome"], "lose");
        assert_eq!(value["roll"], 4200);
        assert_eq!(value["nonce"], 7);
        assert_eq!(value["hashedServerSeed"], "00");
    }
}
