//! Casino Dice Engine
//!
//! Mode validation, settlement math and bet records. Nothing in this module
//! owns session state; [`crate::server::session::Session`] sequences the
//! calls so that validation always precedes the nonce advance.
//!
//! ## Module Structure
//!
//! - `mode`: classic and ultimate modes, payout terms
//! - `resolver`: stake checks, pre-draw quotes and settlement
//! - `bet`: bet records and bounded history

pub mod bet;
pub mod mode;
pub mod resolver;

// Re-export key types
pub use bet::{BetHistory, BetOutcome, BetRecord};
pub use mode::{BetTerms, GameMode};
pub use resolver::{BetError, Quote, Settlement, check_stake, settle};
