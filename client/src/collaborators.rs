//! Boundaries to the chain.
//!
//! The session never talks to a node directly. It reads through a [`ChainReader`] and writes
//! through an [`ActionSubmitter`]; gas, nonces, retries and wallet handling all live behind
//! these traits.

use ethers::types::Address;
use mollinalli_types::{ChainState, GameConfig};
use std::future::Future;

/// Read access to the game contract.
pub trait ChainReader: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read `MAX_ACTION` and the per-round action budget.
    fn read_config(&self) -> impl Future<Output = Result<GameConfig, Self::Error>> + Send;

    /// Read the contract stage and the player record of `address`.
    fn read_state(
        &self,
        address: Address,
    ) -> impl Future<Output = Result<ChainState, Self::Error>> + Send;
}

/// Write access to the game contract.
pub trait ActionSubmitter: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Submit a pass (`bell == false`) or a bell ring.
    fn submit_action(&self, bell: bool) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Join the lobby.
    fn join_game(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Start the game for everyone in the lobby.
    fn start_game(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
