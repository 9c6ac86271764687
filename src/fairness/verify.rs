//! Bet Verification
//!
//! Independent re-check of a settled bet once its server seed has been
//! disclosed by a rotation. Needs nothing but the record and the revealed seed.

use rust_decimal::Decimal;

use crate::casino::bet::{BetOutcome, BetRecord};
use crate::casino::resolver::settle;
use crate::core::hash::sha256_hex;
use crate::fairness::roll::{compute_roll, Roll};
use crate::fairness::seed::{ServerSeed, SeedError};

/// Ways a bet record can fail verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    /// Revealed seed is not a well-formed server seed.
    #[error("Malformed server seed: {0}")]
    MalformedSeed(#[from] SeedError),

    /// Revealed seed does not hash to the commitment stored on the record.
    #[error("Server seed does not match commitment {expected}")]
    CommitmentMismatch {
        /// Commitment on the record.
        expected: String,
        /// Hash of the revealed seed.
        computed: String,
    },

    /// Recomputed roll differs from the recorded one.
    #[error("Roll mismatch: recorded {recorded}, computed {computed}")]
    RollMismatch {
        /// Roll on the record.
        recorded: Roll,
        /// Roll from the revealed seed.
        computed: Roll,
    },

    /// Mode parameters on the record no longer validate.
    #[error("Recorded mode parameters are invalid")]
    InvalidTerms,

    /// Multiplier on the record differs from the mode's terms.
    #[error("Multiplier mismatch")]
    MultiplierMismatch,

    /// Roll-over target on the record differs from the mode's terms.
    #[error("Target mismatch: recorded {recorded:?}, expected {expected:?}")]
    TargetMismatch {
        /// Target on the record.
        recorded: Option<Decimal>,
        /// Target implied by the mode.
        expected: Option<Decimal>,
    },

    /// Outcome on the record differs from what the roll implies.
    #[error("Outcome mismatch: recorded {recorded:?}")]
    OutcomeMismatch {
        /// Outcome on the record.
        recorded: BetOutcome,
    },

    /// Profit on the record differs from settling the stake against the roll.
    #[error("Profit mismatch: recorded {recorded}, expected {expected}")]
    ProfitMismatch {
        /// Profit on the record.
        recorded: Decimal,
        /// Profit from re-settling the bet.
        expected: Decimal,
    },
}

/// Verify a bet against a disclosed server seed.
///
/// Checks, in order: the seed is well formed, it hashes to the commitment the
/// bet was placed under, it reproduces the recorded roll, and the recorded
/// terms, outcome and profit follow from that roll and the stake.
pub fn verify_bet(record: &BetRecord, revealed_server_seed: &str) -> Result<(), VerificationError> {
    let seed = ServerSeed::from_hex(revealed_server_seed)?;
    let canonical = seed.to_hex();

    let computed_commitment = sha256_hex(canonical.as_bytes());
    if computed_commitment != record.hashed_server_seed {
        return Err(VerificationError::CommitmentMismatch {
            expected: record.hashed_server_seed.clone(),
            computed: computed_commitment,
        });
    }

    let computed_roll = compute_roll(&canonical, &record.client_seed, record.nonce);
    if computed_roll != record.roll {
        return Err(VerificationError::RollMismatch {
            recorded: record.roll,
            computed: computed_roll,
        });
    }

    let terms = record.mode.validate().map_err(|_| VerificationError::InvalidTerms)?;
    if terms.multiplier != record.multiplier {
        return Err(VerificationError::MultiplierMismatch);
    }

    let expected_target = terms.target();
    if expected_target != record.target {
        return Err(VerificationError::TargetMismatch {
            recorded: record.target,
            expected: expected_target,
        });
    }

    let expected = settle(&terms, computed_roll, record.stake).map_err(|_| VerificationError::InvalidTerms)?;
    if expected.outcome != record.outcome {
        return Err(VerificationError::OutcomeMismatch {
            recorded: record.outcome,
        });
    }
    if expected.profit != record.profit {
        return Err(VerificationError::ProfitMismatch {
            recorded: record.profit,
            expected: expected.profit,
        });
    }

    Ok(())
}
