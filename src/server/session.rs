//! User Session Management
//!
//! One session per user: seed commitment, casino balances and bet history.
//! Every mutation is a synchronous `&mut Session` transaction; the manager
//! hands out one mutex per session so a bet and a rotation can never
//! interleave.

use std::collections::BTreeMap;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Serialize, Deserialize};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::casino::bet::{BetHistory, BetOutcome, BetRecord};
use crate::casino::mode::GameMode;
use crate::casino::resolver::{BetError, Quote};
use crate::fairness::roll::Roll;
use crate::fairness::seed::{FairnessView, PeekedRoll, SeedCommitment, SeedRotation};
use crate::market::asset::Asset;

/// Unique user identifier (UUID as bytes).
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Uuid", into = "Uuid")]
pub struct UserId(pub [u8; 16]);

impl UserId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Fresh random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4().into_bytes())
    }

    /// Create from UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self::from)
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        Uuid::from_bytes(self.0).to_string()
    }
}

impl From<Uuid> for UserId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid.into_bytes())
    }
}

impl From<UserId> for Uuid {
    fn from(id: UserId) -> Self {
        Uuid::from_bytes(id.0)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Uuid::from_bytes(self.0))
    }
}

/// Result of a settled bet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetReceipt {
    /// Win or lose.
    pub outcome: BetOutcome,
    /// Gross multiplier offered.
    pub multiplier: Decimal,
    /// The roll.
    pub roll: Roll,
    /// Net balance change.
    pub profit: Decimal,
    /// Casino balance in the bet currency after settlement.
    pub new_balance: Decimal,
    /// The stored record.
    pub record: BetRecord,
}

/// Rejected transfer into or out of the casino bankroll.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    /// The casino bankroll does not hold this currency.
    #[error("Currency {0} is not accepted by the casino")]
    UnsupportedCurrency(Asset),

    /// Amount is zero or negative.
    #[error("Transfer amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    /// Withdrawal exceeds the casino balance.
    #[error("Insufficient balance: {available} {currency} available, {requested} requested")]
    InsufficientBalance {
        /// Currency of the withdrawal.
        currency: Asset,
        /// Balance before the withdrawal.
        available: Decimal,
        /// Amount requested.
        requested: Decimal,
    },

    /// Deposit would push the balance past `Decimal::MAX`.
    #[error("Balance overflow: {balance} {currency} plus {amount}")]
    Overflow {
        /// Currency of the deposit.
        currency: Asset,
        /// Balance before the deposit.
        balance: Decimal,
        /// Amount deposited.
        amount: Decimal,
    },
}

/// Per-user state.
#[derive(Debug)]
pub struct Session {
    user_id: UserId,
    seed: SeedCommitment,
    balances: BTreeMap<Asset, Decimal>,
    history: BetHistory,
    created_at: DateTime<Utc>,
}

impl Session {
    /// New session with a fresh server seed and empty balances.
    pub fn new(user_id: UserId, client_seed: String, history_capacity: usize) -> Self {
        Self::with_commitment(user_id, SeedCommitment::new(Some(client_seed)), history_capacity)
    }

    /// New session around an existing commitment.
    pub fn with_commitment(user_id: UserId, seed: SeedCommitment, history_capacity: usize) -> Self {
        let balances = Asset::ALL
            .iter()
            .filter(|asset| asset.is_casino_currency())
            .map(|&asset| (asset, Decimal::ZERO))
            .collect();

        Self {
            user_id,
            seed,
            balances,
            history: BetHistory::new(history_capacity),
            created_at: Utc::now(),
        }
    }

    /// Owner of the session.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// When the session was provisioned.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Place and settle a bet.
    ///
    /// All validation runs before anything changes: a rejected bet leaves the
    /// nonce, the balance and the history exactly as they were.
    pub fn place_bet(
        &mut self,
        stake: Decimal,
        currency: Asset,
        mode: GameMode,
        at: DateTime<Utc>,
    ) -> Result<BetReceipt, BetError> {
        let terms = mode.validate()?;
        let quote = Quote::new(&terms, currency, self.balance(currency), stake)?;

        // Point of no return
        let draw = self.seed.draw();
        let outcome = if terms.is_win(draw.roll) { BetOutcome::Win } else { BetOutcome::Lose };
        let (settlement, new_balance) = quote.settle(outcome);
        self.balances.insert(currency, new_balance);

        let record = BetRecord {
            id: Uuid::new_v4(),
            timestamp: at,
            stake,
            currency,
            mode,
            target: terms.target(),
            roll: draw.roll,
            outcome: settlement.outcome,
            multiplier: settlement.multiplier,
            profit: settlement.profit,
            nonce: draw.nonce,
            client_seed: draw.client_seed,
            hashed_server_seed: draw.hashed_server_seed,
        };
        self.history.push(record.clone());

        Ok(BetReceipt {
            outcome: settlement.outcome,
            multiplier: settlement.multiplier,
            roll: draw.roll,
            profit: settlement.profit,
            new_balance,
            record,
        })
    }

    /// Current commitment, client seed and nonce.
    pub fn reveal(&self) -> FairnessView {
        self.seed.reveal()
    }

    /// Disclose the current server seed and commit to a fresh one.
    pub fn rotate_seed(&mut self, new_client_seed: Option<String>) -> SeedRotation {
        self.seed.rotate(new_client_seed)
    }

    /// Replace the client seed. The nonce carries on.
    pub fn set_client_seed(&mut self, client_seed: String) -> FairnessView {
        self.seed.set_client_seed(client_seed);
        self.seed.reveal()
    }

    /// Raw server seed and the roll the next bet will get.
    pub fn peek_next_roll(&self) -> PeekedRoll {
        self.seed.peek_next()
    }

    /// Add `amount` to the casino balance. Returns the new balance.
    pub fn credit(&mut self, currency: Asset, amount: Decimal) -> Result<Decimal, TransferError> {
        check_transfer(currency, amount)?;
        let balance = self.balance(currency);
        let new_balance = balance.checked_add(amount).ok_or(TransferError::Overflow {
            currency,
            balance,
            amount,
        })?;
        self.balances.insert(currency, new_balance);
        Ok(new_balance)
    }

    /// Take `amount` out of the casino balance. Returns the new balance.
    pub fn debit(&mut self, currency: Asset, amount: Decimal) -> Result<Decimal, TransferError> {
        check_transfer(currency, amount)?;
        let balance = self.balance(currency);
        if balance < amount {
            return Err(TransferError::InsufficientBalance {
                currency,
                available: balance,
                requested: amount,
            });
        }
        let new_balance = balance - amount;
        self.balances.insert(currency, new_balance);
        Ok(new_balance)
    }

    /// Casino balance in `currency` (zero if never funded).
    pub fn balance(&self, currency: Asset) -> Decimal {
        self.balances.get(&currency).copied().unwrap_or(Decimal::ZERO)
    }

    /// All casino balances.
    pub fn balances(&self) -> &BTreeMap<Asset, Decimal> {
        &self.balances
    }

    /// Recent bets, newest first.
    pub fn history(&self) -> &BetHistory {
        &self.history
    }
}

fn check_transfer(currency: Asset, amount: Decimal) -> Result<(), TransferError> {
    if !currency.is_casino_currency() {
        return Err(TransferError::UnsupportedCurrency(currency));
    }
    if amount <= Decimal::ZERO {
        return Err(TransferError::InvalidAmount(amount));
    }
    Ok(())
}

/// Registry of user sessions.
pub struct SessionManager {
    /// Active sessions.
    sessions: RwLock<BTreeMap<UserId, Arc<Mutex<Session>>>>,
}

impl SessionManager {
    /// Create new session manager.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register a session. Returns `None` if the user already has one.
    pub async fn insert(&self, session: Session) -> Option<Arc<Mutex<Session>>> {
        let user_id = session.user_id();
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&user_id) {
            return None;
        }
        let handle = Arc::new(Mutex::new(session));
        sessions.insert(user_id, handle.clone());
        debug!(user = %user_id, "Session registered");
        Some(handle)
    }

    /// Get a session by user.
    pub async fn get(&self, user_id: &UserId) -> Option<Arc<Mutex<Session>>> {
        let sessions = self.sessions.read().await;
        sessions.get(user_id).cloned()
    }

    /// Remove a session.
    pub async fn remove(&self, user_id: &UserId) -> bool {
        let mut sessions = self.sessions.write().await;
        sessions.remove(user_id).is_some()
    }

    /// Get active session count.
    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
