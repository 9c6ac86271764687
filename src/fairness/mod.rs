//! Provably-Fair Pipeline
//!
//! Commit, roll, reveal, verify.
//!
//! ```text
//! ┌──────────────┐  sha256(seed)   ┌────────────┐
//! │ SeedCommit.  │ ──────────────> │  player    │  (before any bet)
//! │ seed, nonce  │                 └────────────┘
//! └──────┬───────┘
//!        │ nonce += 1
//!        v
//! ┌──────────────┐  HMAC(seed, "client:nonce") -> roll
//! │ compute_roll │
//! └──────┬───────┘
//!        │ rotate(): old seed disclosed, nonce = 0
//!        v
//! ┌──────────────┐
//! │  verify_bet  │  anyone, after rotation
//! └──────────────┘
//! ```

pub mod roll;
pub mod seed;
pub mod verify;

// Re-export key types
pub use roll::{Roll, compute_roll};
pub use seed::{
    FairnessView, PeekedRoll, SeedCommitment, SeedDraw, SeedError, SeedRotation, ServerSeed,
    DEFAULT_CLIENT_SEED,
};
pub use verify::{verify_bet, VerificationError};
