use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::{
    address_encode_size, read_address, read_u256, write_address, write_u256, EndInfo,
    PlayerSession, MAX_PLAYERS, SEED_BYTES,
};

/// Events emitted by the game contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// A new game started: every listed player was dealt `seed`.
    GameStarted { players: Vec<Address>, seed: U256 },
    /// A player finished their game.
    GameEnded {
        address: Address,
        player: PlayerSession,
        end_time: u64,
    },
}

impl Event {
    /// Whether this event is relevant to `address`.
    ///
    /// `GameStarted` concerns everyone watching the table; `GameEnded` only the player it names.
    pub fn concerns(&self, address: &Address) -> bool {
        match self {
            Event::GameStarted { .. } => true,
            Event::GameEnded { address: ended, .. } => ended == address,
        }
    }

    /// The end-of-game record carried by a `GameEnded` event.
    pub fn end_info(&self) -> Option<EndInfo> {
        match self {
            Event::GameEnded {
                address,
                player,
                end_time,
            } => Some(EndInfo {
                address: *address,
                player: player.clone(),
                timestamp: *end_time,
            }),
            Event::GameStarted { .. } => None,
        }
    }
}

impl Write for Event {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Event::GameStarted { players, seed } => {
                debug_assert!(players.len() <= MAX_PLAYERS, "too many players");
                0u8.write(writer);
                (players.len() as u8).write(writer);
                for player in players {
                    write_address(player, writer);
                }
                write_u256(seed, writer);
            }
            Event::GameEnded {
                address,
                player,
                end_time,
            } => {
                1u8.write(writer);
                write_address(address, writer);
                player.write(writer);
                end_time.write(writer);
            }
        }
    }
}

impl Read for Event {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => {
                let len = u8::read(reader)? as usize;
                if len > MAX_PLAYERS {
                    return Err(Error::Invalid("Event", "too many players"));
                }
                let mut players = Vec::with_capacity(len);
                for _ in 0..len {
                    players.push(read_address(reader)?);
                }
                Ok(Event::GameStarted {
                    players,
                    seed: read_u256(reader)?,
                })
            }
            1 => Ok(Event::GameEnded {
                address: read_address(reader)?,
                player: PlayerSession::read(reader)?,
                end_time: u64::read(reader)?,
            }),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl EncodeSize for Event {
    fn encode_size(&self) -> usize {
        1 + match self {
            Event::GameStarted { players, .. } => {
                1 + players.len() * address_encode_size() + SEED_BYTES
            }
            Event::GameEnded { player, .. } => address_encode_size() + player.encode_size() + 8,
        }
    }
}
