//! # Bit The Market Server
//!
//! Provably-fair dice engine and market simulation core.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    BITMARKET SERVER                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Primitives                                │
//! │  ├── rng.rs      - Deterministic Xoroshiro128+ PRNG          │
//! │  └── hash.rs     - SHA-256 and HMAC-SHA256                   │
//! │                                                              │
//! │  fairness/       - Provably-fair pipeline                    │
//! │  ├── seed.rs     - Server seed commitment and rotation       │
//! │  ├── roll.rs     - Roll derivation                           │
//! │  └── verify.rs   - Post-reveal bet verification              │
//! │                                                              │
//! │  casino/         - Dice game                                 │
//! │  ├── mode.rs     - Classic and ultimate modes                │
//! │  ├── resolver.rs - Settlement math                           │
//! │  └── bet.rs      - Bet records and history                   │
//! │                                                              │
//! │  market/         - Market simulation                         │
//! │  ├── asset.rs    - Tracked assets                            │
//! │  ├── probability.rs - Hidden bias state machine              │
//! │  ├── price.rs    - Per-asset price step                      │
//! │  └── tick.rs     - Market tick                               │
//! │                                                              │
//! │  server/         - Caller-facing (non-deterministic)         │
//! │  ├── session.rs  - User sessions                             │
//! │  ├── platform.rs - Operation facade                          │
//! │  ├── scheduler.rs- 1 Hz tick loop                            │
//! │  └── protocol.rs - Request/response messages                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Fairness Guarantee
//!
//! Every roll is `HMAC-SHA256(serverSeed, "clientSeed:nonce")` reduced to
//! `[0.00, 100.00]`. The server publishes `sha256(serverSeed)` before any bet
//! and discloses the seed on rotation, after which
//! [`fairness::verify_bet`] re-derives every outcome of that epoch.
//!
//! ## Market Determinism
//!
//! Given the same seed and the same tick times, the market produces the same
//! bias path and the same prices: BTreeMap iteration, one seeded RNG, and
//! caller-supplied time.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod casino;
pub mod config;
pub mod core;
pub mod fairness;
pub mod market;
pub mod server;

// Re-export commonly used types
pub use casino::{BetError, BetOutcome, BetRecord, GameMode};
pub use config::{ConfigError, EngineConfig};
pub use crate::core::rng::DeterministicRng;
pub use fairness::{compute_roll, verify_bet, FairnessView, Roll, SeedCommitment, SeedRotation};
pub use market::{Asset, HackDirection, Market};
pub use server::{Platform, PlatformError, Scheduler, UserId};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Market tick rate (Hz)
pub const TICK_RATE_HZ: u32 = 1;
