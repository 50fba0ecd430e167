use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{CARDS_PER_BATCH, SYMBOLS_PER_CARD, SYMBOL_MASK};

/// Content of a single card slot, encoded on-chain as a 2-bit code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Symbol {
    #[default]
    None = 0,
    Chog = 1,
    Moyaki = 2,
    Molandak = 3,
}

impl Symbol {
    /// All symbols in code order.
    pub const ALL: [Symbol; 4] = [Symbol::None, Symbol::Chog, Symbol::Moyaki, Symbol::Molandak];

    /// Map a symbol code to its symbol. Only the low two bits are considered.
    pub fn from_code(code: u8) -> Self {
        match code as u64 & SYMBOL_MASK {
            0 => Symbol::None,
            1 => Symbol::Chog,
            2 => Symbol::Moyaki,
            _ => Symbol::Molandak,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_none(self) -> bool {
        self == Symbol::None
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Symbol::None => "-",
            Symbol::Chog => "chog",
            Symbol::Moyaki => "moyaki",
            Symbol::Molandak => "molandak",
        };
        f.write_str(name)
    }
}

/// A card: four symbol slots in extraction order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card(pub [Symbol; SYMBOLS_PER_CARD]);

impl Card {
    pub fn from_codes(codes: [u8; SYMBOLS_PER_CARD]) -> Self {
        Self(codes.map(Symbol::from_code))
    }

    pub fn slots(&self) -> &[Symbol; SYMBOLS_PER_CARD] {
        &self.0
    }

    pub fn codes(&self) -> [u8; SYMBOLS_PER_CARD] {
        self.0.map(Symbol::code)
    }

    /// Symbols actually drawn on the card (empty slots skipped).
    pub fn visible(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.0.iter().copied().filter(|symbol| !symbol.is_none())
    }

    /// Occurrences of `symbol` on this card.
    pub fn count(&self, symbol: Symbol) -> usize {
        self.0.iter().filter(|slot| **slot == symbol).count()
    }

    pub fn is_blank(&self) -> bool {
        self.0.iter().all(|slot| slot.is_none())
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (idx, symbol) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{symbol}")?;
        }
        f.write_str("]")
    }
}

/// The visible cards produced by one decode.
///
/// `start` is the turn the batch was decoded at; card `i` sits at absolute index `start + i`,
/// which stays stable while the window slides and is used as a display key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardBatch {
    pub start: u64,
    pub cards: [Card; CARDS_PER_BATCH],
}

impl CardBatch {
    pub fn new(start: u64, cards: [Card; CARDS_PER_BATCH]) -> Self {
        Self { start, cards }
    }

    /// Cards paired with their absolute index.
    pub fn indexed(&self) -> impl Iterator<Item = (u64, &Card)> + '_ {
        self.cards
            .iter()
            .enumerate()
            .map(move |(offset, card)| (self.start.saturating_add(offset as u64), card))
    }

    /// All slots of the batch in extraction order.
    pub fn symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.cards.iter().flat_map(|card| card.0.iter().copied())
    }

    /// Occurrences of every symbol code across the batch, indexed by code.
    pub fn tally(&self) -> [u8; 4] {
        let mut tally = [0u8; 4];
        for symbol in self.symbols() {
            tally[symbol.code() as usize] += 1;
        }
        tally
    }

    pub fn is_blank(&self) -> bool {
        self.cards.iter().all(Card::is_blank)
    }
}

impl fmt::Display for CardBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, (index, card)) in self.indexed().enumerate() {
            if idx > 0 {
                f.write_str(" ")?;
            }
            write!(f, "#{index}{card}")?;
        }
        Ok(())
    }
}
