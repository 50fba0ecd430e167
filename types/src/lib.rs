//! MolliNalli domain types.
//!
//! Defines the card/symbol model, the contract-reported stage, player snapshots, game
//! configuration and contract events shared by the execution core and the client.

mod card;
mod codec;
mod config;
mod constants;
mod errors;
mod event;
mod player;
mod stage;

pub use card::*;
pub use codec::{address_encode_size, read_address, read_u256, write_address, write_u256};
pub use config::*;
pub use constants::*;
pub use errors::*;
pub use event::*;
pub use player::*;
pub use stage::*;

pub use ethers::types::{Address, U256};

#[cfg(test)]
mod tests;
