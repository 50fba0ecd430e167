use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{PlayerSession, Stage, DEFAULT_MAX_ACTION};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_action must be greater than zero")]
    ZeroMaxAction,
    #[error("max_action_per_round must be greater than zero")]
    ZeroMaxActionPerRound,
    #[error("max_action_per_round ({per_round}) exceeds max_action ({max})")]
    RoundExceedsGame { per_round: u8, max: u8 },
}

/// Game limits read from the contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Actions accepted from one player before they are out (contract `MAX_ACTION`).
    pub max_action: u8,
    /// Actions after which the client stops offering controls and waits for the result.
    pub max_action_per_round: u8,
}

impl GameConfig {
    pub fn new(max_action: u8, max_action_per_round: u8) -> Self {
        Self {
            max_action,
            max_action_per_round,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_action == 0 {
            return Err(ConfigError::ZeroMaxAction);
        }
        if self.max_action_per_round == 0 {
            return Err(ConfigError::ZeroMaxActionPerRound);
        }
        if self.max_action_per_round > self.max_action {
            return Err(ConfigError::RoundExceedsGame {
                per_round: self.max_action_per_round,
                max: self.max_action,
            });
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ACTION, DEFAULT_MAX_ACTION)
    }
}

/// One read of the contract for a given address.
///
/// The stage is kept raw so that values this client does not know are ignored
/// instead of rejected.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainState {
    pub stage_raw: u8,
    pub player: PlayerSession,
}

impl ChainState {
    pub fn new(stage: Stage, player: PlayerSession) -> Self {
        Self {
            stage_raw: stage as u8,
            player,
        }
    }

    pub fn stage(&self) -> Option<Stage> {
        Stage::from_raw(self.stage_raw)
    }
}
