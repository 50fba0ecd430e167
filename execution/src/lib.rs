//! MolliNalli deterministic core.
//!
//! This crate reproduces, off-chain, what the game contract derives from a player's seed:
//! which cards are visible on a given turn, whether ringing the bell is correct, and how the
//! seed is redrawn as the player acts. It also tracks the player's progress and the stage to
//! display while actions are still being confirmed.
//!
//! ## Determinism requirements
//! - Every derivation must match the contract bit for bit; the contract re-derives the same
//!   values when scoring.
//! - No I/O, wall-clock time or randomness. Collaborators (chain reads, submissions, events)
//!   live in the client crate and feed this one.
//!
//! ## Example
//! ```rust
//! use ethers::types::U256;
//! use mollinalli_execution::{decode, has_four_of_a_kind, RoundStateMachine};
//! use mollinalli_types::GameConfig;
//!
//! let seed = U256::from(0xff55u64);
//! let cards = decode(seed, 0);
//! assert_eq!(cards.cards.len(), 3);
//! let _ring = has_four_of_a_kind(seed, 0);
//!
//! let mut machine = RoundStateMachine::new(GameConfig::default());
//! machine.start_session(seed);
//! let outcome = machine.apply_action(false).unwrap();
//! assert_eq!(outcome.progress.turn, 1);
//! ```

pub mod bell;
pub mod cards;
pub mod round;
pub mod seed;
pub mod stage;

pub use bell::{bell_symbol, has_four_of_a_kind, symbol_tally};
pub use cards::{decode, pack, window};
pub use round::{same_deal, ActionOutcome, Progress, Rollback, RoundError, RoundStateMachine};
pub use seed::{advance_seed, next_seed, seed_bytes};
pub use stage::StageTracker;
