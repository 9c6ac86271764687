//! Core primitives.
//!
//! Hashing and deterministic randomness shared by the fairness and market
//! engines. Nothing here holds process state.

pub mod hash;
pub mod rng;

// Re-export core types
pub use hash::{Digest32, sha256, sha256_hex, hmac_sha256};
pub use rng::DeterministicRng;
