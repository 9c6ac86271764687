//! Protocol Messages
//!
//! Transport-neutral request and response shapes for every platform
//! operation. Messages are JSON with a `type` tag, so any transport (HTTP,
//! WebSocket, a queue) can carry them unchanged.
//!
//! Player traffic goes through [`handle`]. Operator and scheduler traffic
//! (ticks, hack overrides, next-roll diagnostics) has its own
//! [`AdminRequest`] type and [`handle_admin`] entry point, so a transport
//! that only wires up `handle` cannot reach it.

use std::collections::BTreeMap;
use std::time::Duration;
use rust_decimal::Decimal;
use serde::{Serialize, Deserialize};

use crate::casino::bet::BetRecord;
use crate::casino::mode::GameMode;
use crate::casino::resolver::BetError;
use crate::fairness::seed::{FairnessView, PeekedRoll, SeedRotation};
use crate::market::asset::Asset;
use crate::market::price::PricePoint;
use crate::market::probability::{HackDirection, HackOverride};
use crate::market::tick::{BiasSnapshot, TickReport};
use crate::server::platform::{Platform, PlatformError};
use crate::server::session::{BetReceipt, TransferError, UserId};

// =============================================================================
// REQUESTS
// =============================================================================

/// Requests a player may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Request {
    /// Create a session.
    Provision {
        /// User to provision.
        user: UserId,
        /// Client seed; the configured default if absent.
        #[serde(default)]
        client_seed: Option<String>,
        /// Opening casino balances.
        #[serde(default)]
        balances: BTreeMap<Asset, Decimal>,
    },

    /// Read the published commitment.
    GetFairness {
        /// Session owner.
        user: UserId,
    },

    /// Rotate the server seed.
    RotateSeed {
        /// Session owner.
        user: UserId,
        /// Client seed to adopt.
        #[serde(default)]
        new_client_seed: Option<String>,
    },

    /// Change the client seed.
    SetClientSeed {
        /// Session owner.
        user: UserId,
        /// New client seed.
        client_seed: String,
    },

    /// Place a bet.
    PlaceBet {
        /// Session owner.
        user: UserId,
        /// Amount wagered.
        stake: Decimal,
        /// Casino currency.
        currency: Asset,
        /// Mode and parameters.
        game: GameMode,
    },

    /// Recent bets.
    BetHistory {
        /// Session owner.
        user: UserId,
    },

    /// Casino balances.
    Balances {
        /// Session owner.
        user: UserId,
    },

    /// Fund the casino bankroll.
    CreditCasino {
        /// Session owner.
        user: UserId,
        /// Casino currency.
        currency: Asset,
        /// Amount to add.
        amount: Decimal,
    },

    /// Withdraw from the casino bankroll.
    DebitCasino {
        /// Session owner.
        user: UserId,
        /// Casino currency.
        currency: Asset,
        /// Amount to take out.
        amount: Decimal,
    },

    /// Reported bias and its state.
    DynamicProbability,

    /// Current prices.
    Prices,

    /// Price history of one asset.
    PriceHistory {
        /// Asset to read.
        asset: Asset,
    },
}

/// Requests reserved for operators and the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum AdminRequest {
    /// Advance the market one tick.
    Tick,

    /// Install a hack override.
    SetHackMultiplier {
        /// Push up or down.
        direction: HackDirection,
        /// Lifetime in milliseconds; the configured default if absent.
        #[serde(default)]
        duration_ms: Option<u64>,
    },

    /// Preview the next roll (diagnostics only).
    PeekNextRoll {
        /// Session owner.
        user: UserId,
    },
}

// =============================================================================
// RESPONSES
// =============================================================================

/// Responses produced by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Response {
    /// Commitment view (provision, get_fairness, set_client_seed).
    Fairness(FairnessView),
    /// Seed rotation result.
    Rotation(SeedRotation),
    /// Settled bet.
    Bet(BetReceipt),
    /// Bet history, newest first.
    History(Vec<BetRecord>),
    /// Casino balances.
    Balances(BTreeMap<Asset, Decimal>),
    /// Balance after a credit or debit.
    Balance(Decimal),
    /// Next-roll preview.
    Peek(PeekedRoll),
    /// Tick result.
    Tick(TickReport),
    /// Installed hack.
    Hack(HackOverride),
    /// Bias snapshot.
    Probability(BiasSnapshot),
    /// Current prices.
    Prices(BTreeMap<Asset, f64>),
    /// Price history.
    PriceHistory(Vec<PricePoint>),
    /// Request failed.
    Error(ErrorResponse),
}

/// Failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// No session for the user.
    UnknownSession,
    /// Session already exists.
    AlreadyProvisioned,
    /// Diagnostics disabled.
    DiagnosticsDisabled,
    /// Stake or withdrawal exceeds balance.
    InsufficientBalance,
    /// Payout or deposit would overflow the balance.
    BalanceOverflow,
    /// Bad mode parameters.
    InvalidModeParameters,
    /// Bad stake or transfer amount.
    InvalidAmount,
    /// Currency not accepted by the casino.
    UnsupportedCurrency,
    /// Malformed request.
    InvalidRequest,
}

impl From<&PlatformError> for ErrorCode {
    fn from(err: &PlatformError) -> Self {
        match err {
            PlatformError::UnknownSession(_) => ErrorCode::UnknownSession,
            PlatformError::AlreadyProvisioned(_) => ErrorCode::AlreadyProvisioned,
            PlatformError::DiagnosticsDisabled => ErrorCode::DiagnosticsDisabled,
            PlatformError::Bet(BetError::InsufficientBalance { .. }) => ErrorCode::InsufficientBalance,
            PlatformError::Bet(BetError::InvalidModeParameters(_)) => ErrorCode::InvalidModeParameters,
            PlatformError::Bet(BetError::InvalidStake(_)) => ErrorCode::InvalidAmount,
            PlatformError::Bet(BetError::UnsupportedCurrency(_)) => ErrorCode::UnsupportedCurrency,
            PlatformError::Bet(BetError::PayoutOverflow { .. }) => ErrorCode::BalanceOverflow,
            PlatformError::Transfer(TransferError::InvalidAmount(_)) => ErrorCode::InvalidAmount,
            PlatformError::Transfer(TransferError::UnsupportedCurrency(_)) => ErrorCode::UnsupportedCurrency,
            PlatformError::Transfer(TransferError::InsufficientBalance { .. }) => ErrorCode::InsufficientBalance,
            PlatformError::Transfer(TransferError::Overflow { .. }) => ErrorCode::BalanceOverflow,
        }
    }
}

impl From<PlatformError> for ErrorResponse {
    fn from(err: PlatformError) -> Self {
        Self {
            code: ErrorCode::from(&err),
            message: err.to_string(),
        }
    }
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl Request {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl AdminRequest {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl Response {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

// =============================================================================
// DISPATCH
// =============================================================================

fn respond<T>(result: Result<T, PlatformError>, wrap: impl FnOnce(T) -> Response) -> Response {
    match result {
        Ok(value) => wrap(value),
        Err(err) => Response::Error(err.into()),
    }
}

fn invalid_request(err: serde_json::Error) -> Response {
    Response::Error(ErrorResponse {
        code: ErrorCode::InvalidRequest,
        message: err.to_string(),
    })
}

/// Run one player request against the platform.
pub async fn handle(platform: &Platform, request: Request) -> Response {
    match request {
        Request::Provision { user, client_seed, balances } => {
            respond(platform.provision(user, client_seed, balances).await, Response::Fairness)
        }
        Request::GetFairness { user } => respond(platform.get_fairness(user).await, Response::Fairness),
        Request::RotateSeed { user, new_client_seed } => {
            respond(platform.rotate_seed(user, new_client_seed).await, Response::Rotation)
        }
        Request::SetClientSeed { user, client_seed } => {
            respond(platform.set_client_seed(user, client_seed).await, Response::Fairness)
        }
        Request::PlaceBet { user, stake, currency, game } => {
            respond(platform.place_bet(user, stake, currency, game).await, Response::Bet)
        }
        Request::BetHistory { user } => respond(platform.bet_history(user).await, Response::History),
        Request::Balances { user } => respond(platform.balances(user).await, Response::Balances),
        Request::CreditCasino { user, currency, amount } => {
            respond(platform.credit_casino(user, currency, amount).await, Response::Balance)
        }
        Request::DebitCasino { user, currency, amount } => {
            respond(platform.debit_casino(user, currency, amount).await, Response::Balance)
        }
        Request::DynamicProbability => Response::Probability(platform.dynamic_probability().await),
        Request::Prices => Response::Prices(platform.prices().await),
        Request::PriceHistory { asset } => Response::PriceHistory(platform.price_history(asset).await),
    }
}

/// Run one operator or scheduler request against the platform.
pub async fn handle_admin(platform: &Platform, request: AdminRequest) -> Response {
    match request {
        AdminRequest::Tick => Response::Tick(platform.tick().await),
        AdminRequest::SetHackMultiplier { direction, duration_ms } => {
            let duration = duration_ms.map(Duration::from_millis);
            Response::Hack(platform.set_hack_multiplier(direction, duration).await)
        }
        AdminRequest::PeekNextRoll { user } => respond(platform.peek_next_roll(user).await, Response::Peek),
    }
}

/// Parse a JSON player request, run it, and serialize the response.
pub async fn handle_json(platform: &Platform, json: &str) -> Result<String, serde_json::Error> {
    let response = match Request::from_json(json) {
        Ok(request) => handle(platform, request).await,
        Err(err) => invalid_request(err),
    };
    response.to_json()
}

/// Parse a JSON admin request, run it, and serialize the response.
pub async fn handle_admin_json(platform: &Platform, json: &str) -> Result<String, serde_json::Error> {
    let response = match AdminRequest::from_json(json) {
        Ok(request) => handle_admin(platform, request).await,
        Err(err) => invalid_request(err),
    };
    response.to_json()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::Value;
    use crate::config::EngineConfig;

    fn platform() -> Platform {
        Platform::new(EngineConfig {
            market_seed: Some(5),
            ..Default::default()
        })
    }

    async fn call(platform: &Platform, json: &str) -> Value {
        let out = handle_json(platform, json).await.unwrap();
        serde_json::from_str(&out).unwrap()
    }

    async fn call_admin(platform: &Platform, json: &str) -> Value {
        let out = handle_admin_json(platform, json).await.unwrap();
        serde_json::from_str(&out).unwrap()
    }

    #[test]
    fn test_place_bet_wire_format() {
        let json = r#"{
            "type": "place_bet",
            "user": "00000000-0000-0000-0000-000000000001",
            "stake": "2.5",
            "currency": "BC",
            "game": {"mode": "classic", "winChance": "49.5"}
        }"#;
        let request = Request::from_json(json).unwrap();
        let Request::PlaceBet { user, stake, currency, game } = request else {
            panic!("wrong variant");
        };
        assert_eq!(user.to_uuid_string(), "00000000-0000-0000-0000-000000000001");
        assert_eq!(stake, dec!(2.5));
        assert_eq!(currency, Asset::Bc);
        assert_eq!(game, GameMode::Classic { win_chance: dec!(49.5) });
    }

    #[test]
    fn test_admin_hack_duration_in_millis() {
        let request = AdminRequest::from_json(r#"{"type":"set_hack_multiplier","direction":"down","durationMs":500}"#).unwrap();
        assert_eq!(
            request,
            AdminRequest::SetHackMultiplier { direction: HackDirection::Down, duration_ms: Some(500) }
        );
    }

    #[test]
    fn test_error_codes() {
        let err = PlatformError::Bet(BetError::InvalidStake(dec!(0)));
        let response = ErrorResponse::from(err);
        assert_eq!(response.code, ErrorCode::InvalidAmount);
        let json = Response::Error(response).to_json().unwrap();
        assert!(json.contains("invalid_amount"));
    }

    #[tokio::test]
    async fn test_json_session_flow() {
        let platform = platform();
        let user = "6f1c2c9e-8d0a-4b7e-9a53-1f2b3c4d5e6f";

        let provisioned = call(
            &platform,
            &format!(r#"{{"type":"provision","user":"{user}","clientSeed":"abc","balances":{{"BC":"10"}}}}"#),
        )
        .await;
        assert_eq!(provisioned["type"], "fairness");
        assert_eq!(provisioned["data"]["nonce"], 0);

        let bet = call(
            &platform,
            &format!(r#"{{"type":"place_bet","user":"{user}","stake":"1","currency":"BC","game":{{"mode":"ultimate","rangeMin":"0","rangeMax":"9900"}}}}"#),
        )
        .await;
        assert_eq!(bet["type"], "bet");
        assert_eq!(bet["data"]["record"]["nonce"], 1);

        let rejected = call(
            &platform,
            &format!(r#"{{"type":"place_bet","user":"{user}","stake":"100","currency":"BC","game":{{"mode":"classic","winChance":"50"}}}}"#),
        )
        .await;
        assert_eq!(rejected["type"], "error");
        assert_eq!(rejected["data"]["code"], "insufficient_balance");

        let withdrawn = call(
            &platform,
            &format!(r#"{{"type":"debit_casino","user":"{user}","currency":"BC","amount":"1"}}"#),
        )
        .await;
        assert_eq!(withdrawn["type"], "balance");

        let overdrawn = call(
            &platform,
            &format!(r#"{{"type":"debit_casino","user":"{user}","currency":"BC","amount":"1000"}}"#),
        )
        .await;
        assert_eq!(overdrawn["data"]["code"], "insufficient_balance");

        let peek = call_admin(&platform, &format!(r#"{{"type":"peek_next_roll","user":"{user}"}}"#)).await;
        assert_eq!(peek["data"]["code"], "diagnostics_disabled");

        let rotation = call(&platform, &format!(r#"{{"type":"rotate_seed","user":"{user}"}}"#)).await;
        assert_eq!(rotation["type"], "rotation");
        assert_eq!(rotation["data"]["nonce"], 0);
        assert_eq!(rotation["data"]["previousServerSeed"].as_str().map(str::len), Some(64));
    }

    #[tokio::test]
    async fn test_json_market_flow() {
        let platform = platform();

        let tick = call_admin(&platform, r#"{"type":"tick"}"#).await;
        assert_eq!(tick["type"], "tick");
        assert_eq!(tick["data"]["tick"], 1);

        let prices = call(&platform, r#"{"type":"prices"}"#).await;
        assert!(prices["data"]["USDT"].as_f64().is_some());

        let hack = call_admin(&platform, r#"{"type":"set_hack_multiplier","direction":"up"}"#).await;
        assert_eq!(hack["data"]["multiplier"], 1.5);
        assert!(hack["data"]["expiresAtMs"].as_u64().is_some());

        let history = call(&platform, r#"{"type":"price_history","asset":"ETH"}"#).await;
        assert_eq!(history["data"].as_array().map(Vec::len), Some(1));

        let probability = call(&platform, r#"{"type":"dynamic_probability"}"#).await;
        assert!(probability["data"]["hack"].is_object());
    }

    #[tokio::test]
    async fn test_malformed_request() {
        let platform = platform();
        let response = call(&platform, r#"{"type":"launch_rocket"}"#).await;
        assert_eq!(response["data"]["code"], "invalid_request");
    }

    #[tokio::test]
    async fn test_admin_requests_refused_on_player_entry() {
        let platform = platform();
        let user = "6f1c2c9e-8d0a-4b7e-9a53-1f2b3c4d5e6f";
        let denied = [
            r#"{"type":"tick"}"#.to_string(),
            r#"{"type":"set_hack_multiplier","direction":"down"}"#.to_string(),
            format!(r#"{{"type":"peek_next_roll","user":"{user}"}}"#),
        ];
        for json in &denied {
            let response = call(&platform, json).await;
            assert_eq!(response["data"]["code"], "invalid_request", "{json}");
        }
        assert_eq!(platform.dynamic_probability().await.hack, None);
        assert!(platform.price_history(Asset::Btc).await.is_empty());

        // Player requests are not admin requests either.
        let response = call_admin(&platform, r#"{"type":"prices"}"#).await;
        assert_eq!(response["data"]["code"], "invalid_request");
    }

    #[test]
    fn test_overflow_error_code() {
        let err = PlatformError::Transfer(TransferError::Overflow {
            currency: Asset::Bc,
            balance: dec!(1),
            amount: Decimal::MAX,
        });
        assert_eq!(ErrorCode::from(&err), ErrorCode::BalanceOverflow);
    }
}
