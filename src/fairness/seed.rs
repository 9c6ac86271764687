//! Server Seed Commitment
//!
//! Each session commits to a secret server seed by publishing only its
//! SHA-256 hash. Bets consume `(server seed, client seed, nonce)` triples;
//! rotating the seed discloses the old one so every bet made under it can be
//! re-verified, and resets the nonce.

use std::fmt;
use rand::RngCore;
use serde::{Serialize, Deserialize};

use crate::core::hash::sha256_hex;
use crate::fairness::roll::{compute_roll, Roll};

/// Client seed assigned when the caller does not supply one.
pub const DEFAULT_CLIENT_SEED: &str = "bitmarket";

/// Length of a server seed in bytes.
pub const SERVER_SEED_LEN: usize = 32;

/// A secret 256-bit server seed.
///
/// `Debug` is redacted so the raw value never lands in logs by accident.
#[derive(Clone, PartialEq, Eq)]
pub struct ServerSeed([u8; SERVER_SEED_LEN]);

impl ServerSeed {
    /// Draw a fresh seed from the operating system CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SERVER_SEED_LEN];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; SERVER_SEED_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse the canonical hex form.
    pub fn from_hex(s: &str) -> Result<Self, SeedError> {
        let bytes = hex::decode(s).map_err(|_| SeedError::InvalidHex)?;
        let bytes: [u8; SERVER_SEED_LEN] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| SeedError::InvalidLength(b.len()))?;
        Ok(Self(bytes))
    }

    /// Canonical textual form: 64 lowercase hex characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// The published commitment: SHA-256 over the canonical hex form.
    pub fn commitment(&self) -> String {
        sha256_hex(self.to_hex().as_bytes())
    }

    /// Roll for the given client seed and nonce under this seed.
    pub fn roll(&self, client_seed: &str, nonce: u64) -> Roll {
        compute_roll(&self.to_hex(), client_seed, nonce)
    }
}

impl fmt::Debug for ServerSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServerSeed(<redacted>)")
    }
}

/// Errors parsing a revealed server seed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeedError {
    /// Not valid hex.
    #[error("Server seed is not valid hex")]
    InvalidHex,

    /// Wrong number of bytes.
    #[error("Server seed must be 32 bytes, got {0}")]
    InvalidLength(usize),
}

/// Public view of a session's fairness state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FairnessView {
    /// SHA-256 of the active server seed.
    pub hashed_server_seed: String,
    /// Active client seed.
    pub client_seed: String,
    /// Nonce of the most recently settled bet (0 before the first bet).
    pub nonce: u64,
}

/// Result of rotating the server seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedRotation {
    /// The retired seed, now disclosed in full.
    pub previous_server_seed: String,
    /// Commitment to the newly drawn seed.
    pub new_hashed_server_seed: String,
    /// Client seed in effect after rotation.
    pub client_seed: String,
    /// Always 0.
    pub nonce: u64,
}

/// Diagnostic preview of the next roll.
///
/// Contains the undisclosed server seed. Anyone holding this can predict the
/// next outcome, so it must never reach an ordinary caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeekedRoll {
    /// Raw active server seed.
    pub raw_server_seed: String,
    /// Nonce the next bet will use.
    pub next_nonce: u64,
    /// Roll the next bet will receive.
    pub next_roll: Roll,
}

/// Everything a settlement needs from one nonce advance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedDraw {
    /// Nonce consumed by this draw.
    pub nonce: u64,
    /// Resulting roll.
    pub roll: Roll,
    /// Client seed at the time of the draw.
    pub client_seed: String,
    /// Commitment of the server seed at the time of the draw.
    pub hashed_server_seed: String,
}

/// The `(server seed, client seed, nonce)` triple owned by one session.
#[derive(Debug, Clone)]
pub struct SeedCommitment {
    server_seed: ServerSeed,
    hashed_server_seed: String,
    client_seed: String,
    nonce: u64,
}

impl SeedCommitment {
    /// Start a new epoch with a freshly generated server seed.
    pub fn new(client_seed: Option<String>) -> Self {
        Self::with_server_seed(ServerSeed::generate(), client_seed)
    }

    /// Start a new epoch with a known server seed.
    pub fn with_server_seed(server_seed: ServerSeed, client_seed: Option<String>) -> Self {
        let hashed_server_seed = server_seed.commitment();
        Self {
            server_seed,
            hashed_server_seed,
            client_seed: client_seed.unwrap_or_else(|| DEFAULT_CLIENT_SEED.to_string()),
            nonce: 0,
        }
    }

    /// Read-only view of the published commitment.
    pub fn reveal(&self) -> FairnessView {
        FairnessView {
            hashed_server_seed: self.hashed_server_seed.clone(),
            client_seed: self.client_seed.clone(),
            nonce: self.nonce,
        }
    }

    /// Retire the current seed and commit to a fresh one.
    pub fn rotate(&mut self, new_client_seed: Option<String>) -> SeedRotation {
        self.rotate_to(ServerSeed::generate(), new_client_seed)
    }

    /// Retire the current seed and commit to `next`.
    pub fn rotate_to(&mut self, next: ServerSeed, new_client_seed: Option<String>) -> SeedRotation {
        let previous = std::mem::replace(&mut self.server_seed, next);
        self.hashed_server_seed = self.server_seed.commitment();
        self.nonce = 0;

        if let Some(client_seed) = new_client_seed {
            self.client_seed = client_seed;
        }

        SeedRotation {
            previous_server_seed: previous.to_hex(),
            new_hashed_server_seed: self.hashed_server_seed.clone(),
            client_seed: self.client_seed.clone(),
            nonce: self.nonce,
        }
    }

    /// Replace the client seed. The nonce keeps counting.
    pub fn set_client_seed(&mut self, client_seed: String) {
        self.client_seed = client_seed;
    }

    /// Consume the next nonce and compute its roll.
    ///
    /// The nonce is incremented before rolling, so the first bet of an epoch
    /// uses nonce 1.
    pub fn draw(&mut self) -> SeedDraw {
        self.nonce += 1;
        SeedDraw {
            nonce: self.nonce,
            roll: self.server_seed.roll(&self.client_seed, self.nonce),
            client_seed: self.client_seed.clone(),
            hashed_server_seed: self.hashed_server_seed.clone(),
        }
    }

    /// Preview the next draw without consuming it.
    ///
    /// Discloses the live server seed. Diagnostic use only.
    pub fn peek_next(&self) -> PeekedRoll {
        let next_nonce = self.nonce + 1;
        PeekedRoll {
            raw_server_seed: self.server_seed.to_hex(),
            next_nonce,
            next_roll: self.server_seed.roll(&self.client_seed, next_nonce),
        }
    }

    /// Current nonce.
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Current client seed.
    pub fn client_seed(&self) -> &str {
        &self.client_seed
    }

    /// Commitment of the active server seed.
    pub fn hashed_server_seed(&self) -> &str {
        &self.hashed_server_seed
    }
}
