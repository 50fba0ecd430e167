use serde::{Deserialize, Serialize};
use std::fmt;

/// Custom errors the contract reverts with.
///
/// Submitters decode a revert into one of these so failures can be shown by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractError {
    /// The game has already ended.
    Ended,
    /// The lobby is full.
    IsFull,
    /// The caller already joined.
    Joined,
    /// The caller is not a player of this game.
    NotPlayer,
    /// No game is in progress.
    NotPlaying,
    /// The caller has used up their actions.
    OutPlayer,
    /// The game already started.
    Started,
}

impl ContractError {
    pub const ALL: [ContractError; 7] = [
        ContractError::Ended,
        ContractError::IsFull,
        ContractError::Joined,
        ContractError::NotPlayer,
        ContractError::NotPlaying,
        ContractError::OutPlayer,
        ContractError::Started,
    ];

    /// Solidity error name as declared in the contract ABI.
    pub fn abi_name(self) -> &'static str {
        match self {
            ContractError::Ended => "ErrorEnded",
            ContractError::IsFull => "ErrorIsFull",
            ContractError::Joined => "ErrorJoined",
            ContractError::NotPlayer => "ErrorNotPlayer",
            ContractError::NotPlaying => "ErrorNotPlaying",
            ContractError::OutPlayer => "ErrorOutPlayer",
            ContractError::Started => "ErrorStarted",
        }
    }

    pub fn from_abi_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|err| err.abi_name() == name)
    }
}

impl fmt::Display for ContractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            ContractError::Ended => "game has ended",
            ContractError::IsFull => "game is full",
            ContractError::Joined => "already joined",
            ContractError::NotPlayer => "not a player",
            ContractError::NotPlaying => "game is not in progress",
            ContractError::OutPlayer => "player is out",
            ContractError::Started => "game already started",
        };
        write!(f, "{} ({reason})", self.abi_name())
    }
}

impl std::error::Error for ContractError {}
