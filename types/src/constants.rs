/// Bits used to encode a single symbol slot.
pub const BITS_PER_SYMBOL: usize = 2;

/// Symbol slots on a single card.
pub const SYMBOLS_PER_CARD: usize = 4;

/// Cards produced by a single decode (the visible window).
pub const CARDS_PER_BATCH: usize = 3;

/// Bits consumed by one card.
pub const BITS_PER_CARD: usize = BITS_PER_SYMBOL * SYMBOLS_PER_CARD;

/// Mask selecting one symbol code.
pub const SYMBOL_MASK: u64 = 0b11;

/// Symbol slots examined by the bell rule (3 cards worth).
pub const BELL_WINDOW: usize = CARDS_PER_BATCH * SYMBOLS_PER_CARD;

/// Occurrences of a single symbol that make ringing the bell correct.
pub const BELL_TARGET: u8 = 4;

/// Number of non-empty symbol types.
pub const SYMBOL_TYPES: usize = 3;

/// Actions sharing one seed before the deck is redrawn.
pub const RESEED_INTERVAL: u8 = 6;

/// Width of the seed in bits.
pub const SEED_BITS: usize = 256;

/// Width of the seed in bytes (big-endian canonical encoding).
pub const SEED_BYTES: usize = SEED_BITS / 8;

/// Maximum players admitted to one game (contract `MAX_PLAYERS`).
pub const MAX_PLAYERS: usize = 4;

/// Default contract `MAX_ACTION`.
pub const DEFAULT_MAX_ACTION: u8 = 24;
