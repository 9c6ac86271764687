//! Platform Facade
//!
//! The caller-facing surface of the engine. Owns the session registry and
//! the market, and turns each request into one short critical section.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use chrono::{DateTime, Utc};
use rand::RngCore;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use crate::casino::bet::BetRecord;
use crate::casino::mode::GameMode;
use crate::casino::resolver::BetError;
use crate::config::EngineConfig;
use crate::fairness::seed::{FairnessView, PeekedRoll, SeedRotation};
use crate::market::asset::Asset;
use crate::market::price::PricePoint;
use crate::market::probability::{HackDirection, HackOverride};
use crate::market::tick::{BiasSnapshot, Market, TickReport};
use crate::server::session::{BetReceipt, Session, SessionManager, TransferError, UserId};

/// Platform errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    /// No session for this user.
    #[error("Unknown session: {0}")]
    UnknownSession(UserId),

    /// The user already has a session.
    #[error("Session already provisioned: {0}")]
    AlreadyProvisioned(UserId),

    /// Diagnostics are switched off.
    #[error("Diagnostics are disabled")]
    DiagnosticsDisabled,

    /// Bet rejected.
    #[error("Bet rejected: {0}")]
    Bet(#[from] BetError),

    /// Transfer into or out of the casino rejected.
    #[error("Transfer rejected: {0}")]
    Transfer(#[from] TransferError),
}

/// The engine: sessions plus the shared market.
pub struct Platform {
    config: EngineConfig,
    sessions: SessionManager,
    market: RwLock<Market>,
    epoch: Instant,
}

impl Platform {
    /// Create a platform with a freshly opened market.
    pub fn new(config: EngineConfig) -> Self {
        let seed = config
            .market_seed
            .unwrap_or_else(|| rand::rngs::OsRng.next_u64());
        info!(seed, "Opening market");

        let market = Market::new(seed, config.price_history_capacity, 0);

        Self {
            config,
            sessions: SessionManager::new(),
            market: RwLock::new(market),
            epoch: Instant::now(),
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Milliseconds since the platform started, on a monotonic clock.
    pub fn now_ms(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    // =========================================================================
    // SESSIONS
    // =========================================================================

    /// Create a session for `user` and fund its casino balances.
    #[instrument(skip(self, opening_balances))]
    pub async fn provision(
        &self,
        user: UserId,
        client_seed: Option<String>,
        opening_balances: BTreeMap<Asset, Decimal>,
    ) -> Result<FairnessView, PlatformError> {
        let client_seed = client_seed.unwrap_or_else(|| self.config.default_client_seed.clone());
        let mut session = Session::new(user, client_seed, self.config.bet_history_capacity);
        for (currency, amount) in opening_balances {
            session.credit(currency, amount)?;
        }
        let view = session.reveal();

        self.sessions
            .insert(session)
            .await
            .ok_or(PlatformError::AlreadyProvisioned(user))?;

        info!(hashed_server_seed = %view.hashed_server_seed, "Session provisioned");
        Ok(view)
    }

    /// Published commitment, client seed and nonce.
    pub async fn get_fairness(&self, user: UserId) -> Result<FairnessView, PlatformError> {
        let session = self.session(user).await?;
        let s = session.lock().await;
        Ok(s.reveal())
    }

    /// Disclose the active server seed and commit to a fresh one.
    #[instrument(skip(self))]
    pub async fn rotate_seed(
        &self,
        user: UserId,
        new_client_seed: Option<String>,
    ) -> Result<SeedRotation, PlatformError> {
        let session = self.session(user).await?;
        let rotation = session.lock().await.rotate_seed(new_client_seed);
        info!(new_hashed_server_seed = %rotation.new_hashed_server_seed, "Server seed rotated");
        Ok(rotation)
    }

    /// Replace the client seed without rotating the server seed.
    pub async fn set_client_seed(&self, user: UserId, client_seed: String) -> Result<FairnessView, PlatformError> {
        let session = self.session(user).await?;
        let view = session.lock().await.set_client_seed(client_seed);
        Ok(view)
    }

    /// Place and settle a bet against the casino balance.
    #[instrument(skip(self, mode))]
    pub async fn place_bet(
        &self,
        user: UserId,
        stake: Decimal,
        currency: Asset,
        mode: GameMode,
    ) -> Result<BetReceipt, PlatformError> {
        let session = self.session(user).await?;
        let result = session.lock().await.place_bet(stake, currency, mode, Utc::now());

        match &result {
            Ok(receipt) => debug!(
                nonce = receipt.record.nonce,
                roll = %receipt.roll,
                outcome = ?receipt.outcome,
                profit = %receipt.profit,
                "Bet settled"
            ),
            Err(err) => debug!(error = %err, "Bet rejected"),
        }

        result.map_err(PlatformError::from)
    }

    /// Recent bets, newest first.
    pub async fn bet_history(&self, user: UserId) -> Result<Vec<BetRecord>, PlatformError> {
        let session = self.session(user).await?;
        let s = session.lock().await;
        Ok(s.history().to_vec())
    }

    /// Casino balances.
    pub async fn balances(&self, user: UserId) -> Result<BTreeMap<Asset, Decimal>, PlatformError> {
        let session = self.session(user).await?;
        let s = session.lock().await;
        Ok(s.balances().clone())
    }

    /// Move funds into the casino bankroll. Returns the new balance.
    #[instrument(skip(self))]
    pub async fn credit_casino(&self, user: UserId, currency: Asset, amount: Decimal) -> Result<Decimal, PlatformError> {
        let session = self.session(user).await?;
        let balance = session.lock().await.credit(currency, amount)?;
        Ok(balance)
    }

    /// Move funds out of the casino bankroll. Returns the new balance.
    #[instrument(skip(self))]
    pub async fn debit_casino(&self, user: UserId, currency: Asset, amount: Decimal) -> Result<Decimal, PlatformError> {
        let session = self.session(user).await?;
        let balance = session.lock().await.debit(currency, amount)?;
        Ok(balance)
    }

    /// Preview the next roll, disclosing the live server seed.
    ///
    /// Breaks the fairness commitment for this epoch. Refused unless
    /// diagnostics are enabled.
    #[instrument(skip(self))]
    pub async fn peek_next_roll(&self, user: UserId) -> Result<PeekedRoll, PlatformError> {
        if !self.config.diagnostics_enabled {
            return Err(PlatformError::DiagnosticsDisabled);
        }
        let session = self.session(user).await?;
        let peek = session.lock().await.peek_next_roll();
        warn!(next_nonce = peek.next_nonce, "Unrevealed server seed disclosed by diagnostics");
        Ok(peek)
    }

    async fn session(&self, user: UserId) -> Result<Arc<Mutex<Session>>, PlatformError> {
        self.sessions
            .get(&user)
            .await
            .ok_or(PlatformError::UnknownSession(user))
    }

    /// Number of provisioned sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.session_count().await
    }

    // =========================================================================
    // MARKET
    // =========================================================================

    /// Advance the market one tick at the current time.
    pub async fn tick(&self) -> TickReport {
        self.tick_at(self.now_ms(), Utc::now()).await
    }

    /// Advance the market one tick at monotonic time `now_ms`.
    pub async fn tick_at(&self, now_ms: u64, at: DateTime<Utc>) -> TickReport {
        let report = self.market.write().await.tick(now_ms, at);

        #[cfg(feature = "debug-tracing")]
        debug!(tick = report.tick, bias = report.bias, "Market tick");

        report
    }

    /// Scale the reported bias for the configured hack duration.
    pub async fn set_hack_multiplier(&self, direction: HackDirection, duration: Option<Duration>) -> HackOverride {
        self.set_hack_multiplier_at(direction, duration, self.now_ms()).await
    }

    /// Scale the reported bias starting at monotonic time `now_ms`.
    #[instrument(skip(self))]
    pub async fn set_hack_multiplier_at(
        &self,
        direction: HackDirection,
        duration: Option<Duration>,
        now_ms: u64,
    ) -> HackOverride {
        let duration = duration.unwrap_or(self.config.hack_duration);
        let duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        let hack = self.market.write().await.set_hack(direction, duration_ms, now_ms);
        info!(multiplier = hack.multiplier, expires_at_ms = hack.expires_at_ms, "Market hack installed");
        hack
    }

    /// Reported bias and the state behind it.
    pub async fn dynamic_probability(&self) -> BiasSnapshot {
        self.market.read().await.bias(self.now_ms())
    }

    /// Current price of every asset.
    pub async fn prices(&self) -> BTreeMap<Asset, f64> {
        self.market.read().await.prices()
    }

    /// Price history of one asset, oldest first.
    pub async fn price_history(&self, asset: Asset) -> Vec<PricePoint> {
        self.market.read().await.price_history(asset)
    }
}
