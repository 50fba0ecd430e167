use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use crate::{
    address_encode_size, read_address, read_u256, write_address, write_u256, RESEED_INTERVAL,
    SEED_BYTES,
};

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum PlayerInvariantError {
    #[error("turn out of range (got={got}, max={max})")]
    TurnOutOfRange { got: u8, max: u8 },
    #[error("turn {turn} does not follow action_count {action_count}")]
    TurnMismatch { turn: u8, action_count: u8 },
}

/// A player's progress through one game, as stored by the contract.
///
/// The contract keeps `{is_ready, out, score, action_count, seed}`; `turn` is the offset of the
/// visible window into `seed` and always equals `action_count % RESEED_INTERVAL` because it is
/// reset whenever the seed is redrawn.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSession {
    pub is_ready: bool,
    pub out: bool,
    pub score: u8,
    pub action_count: u8,
    pub seed: U256,
    pub turn: u8,
}

impl PlayerSession {
    /// Build a session from the contract's `Player` tuple, deriving the turn.
    pub fn from_contract(is_ready: bool, out: bool, score: u8, action_count: u8, seed: U256) -> Self {
        Self {
            is_ready,
            out,
            score,
            action_count,
            seed,
            turn: action_count % RESEED_INTERVAL,
        }
    }

    /// A zero seed means the contract has not dealt this player a deck yet.
    pub fn has_seed(&self) -> bool {
        !self.seed.is_zero()
    }

    pub fn validate_invariants(&self) -> Result<(), PlayerInvariantError> {
        if self.turn >= RESEED_INTERVAL {
            return Err(PlayerInvariantError::TurnOutOfRange {
                got: self.turn,
                max: RESEED_INTERVAL - 1,
            });
        }
        if self.turn != self.action_count % RESEED_INTERVAL {
            return Err(PlayerInvariantError::TurnMismatch {
                turn: self.turn,
                action_count: self.action_count,
            });
        }
        Ok(())
    }
}

impl Write for PlayerSession {
    fn write(&self, writer: &mut impl BufMut) {
        self.is_ready.write(writer);
        self.out.write(writer);
        self.score.write(writer);
        self.action_count.write(writer);
        write_u256(&self.seed, writer);
        self.turn.write(writer);
    }
}

impl Read for PlayerSession {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            is_ready: bool::read(reader)?,
            out: bool::read(reader)?,
            score: u8::read(reader)?,
            action_count: u8::read(reader)?,
            seed: read_u256(reader)?,
            turn: u8::read(reader)?,
        })
    }
}

impl EncodeSize for PlayerSession {
    fn encode_size(&self) -> usize {
        1 + 1 + 1 + 1 + SEED_BYTES + 1
    }
}

/// Final result of a player's game.
///
/// Captured once per game, either from a `GameEnded` event or, when the first snapshot
/// already shows the player as out, synthesized from that snapshot with `timestamp == 0`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndInfo {
    pub address: Address,
    pub player: PlayerSession,
    pub timestamp: u64,
}

impl EndInfo {
    /// EndInfo synthesized from a snapshot, before any `GameEnded` event was seen.
    pub fn provisional(address: Address, player: PlayerSession) -> Self {
        Self {
            address,
            player,
            timestamp: 0,
        }
    }

    /// Provisional entries carry no end time and have no result details worth showing.
    pub fn is_provisional(&self) -> bool {
        self.timestamp == 0
    }
}

impl Write for EndInfo {
    fn write(&self, writer: &mut impl BufMut) {
        write_address(&self.address, writer);
        self.player.write(writer);
        self.timestamp.write(writer);
    }
}

impl Read for EndInfo {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            address: read_address(reader)?,
            player: PlayerSession::read(reader)?,
            timestamp: u64::read(reader)?,
        })
    }
}

impl EncodeSize for EndInfo {
    fn encode_size(&self) -> usize {
        address_encode_size() + self.player.encode_size() + 8
    }
}
