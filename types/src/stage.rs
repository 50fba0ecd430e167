use bytes::{Buf, BufMut};
use commonware_codec::{Error, FixedSize, Read, ReadExt, Write};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Game stage as reported by the contract's `stage()` getter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Stage {
    #[default]
    NotStart = 0,
    Playing = 1,
    Ended = 2,
}

impl Stage {
    /// Interpret a raw stage value. Values outside the known range are `None` and
    /// should be ignored rather than treated as fatal.
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Stage::NotStart),
            1 => Some(Stage::Playing),
            2 => Some(Stage::Ended),
            _ => None,
        }
    }
}

impl Write for Stage {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for Stage {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = u8::read(reader)?;
        Stage::from_raw(value).ok_or(Error::InvalidEnum(value))
    }
}

impl FixedSize for Stage {
    const SIZE: usize = 1;
}

/// Stage shown to the player.
///
/// `WaitingEnd` is never reported by the contract: it is entered locally once the player
/// has used up their actions (or is observed as out) and bridges the gap until the
/// contract's end-of-game confirmation arrives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplayStage {
    NotStart,
    Playing,
    Ended,
    WaitingEnd,
}

impl DisplayStage {
    /// Whether action controls (pass / ring bell) should be offered.
    pub fn accepts_actions(self) -> bool {
        self == DisplayStage::Playing
    }
}

impl From<Stage> for DisplayStage {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::NotStart => DisplayStage::NotStart,
            Stage::Playing => DisplayStage::Playing,
            Stage::Ended => DisplayStage::Ended,
        }
    }
}

impl fmt::Display for DisplayStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DisplayStage::NotStart => "NOT_START",
            DisplayStage::Playing => "PLAYING",
            DisplayStage::Ended => "ENDED",
            DisplayStage::WaitingEnd => "WAITING_END",
        };
        f.write_str(name)
    }
}
