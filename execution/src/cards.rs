//! Seed-to-cards decoding.
//!
//! The seed is read as a little-end-first stream of 2-bit symbol codes. The visible window
//! for turn `t` starts `t * BITS_PER_CARD` bits into the seed (card-aligned), and one decode
//! consumes `CARDS_PER_BATCH * SYMBOLS_PER_CARD` codes from there.
//!
//! Shifting past the seed's width leaves nothing but zero bits, so far turns decode to
//! blank cards instead of failing.

use ethers::types::U256;
use mollinalli_types::{
    Card, CardBatch, BITS_PER_CARD, BITS_PER_SYMBOL, CARDS_PER_BATCH, SEED_BITS,
    SYMBOLS_PER_CARD, SYMBOL_MASK,
};

/// Bit offset of the window for `turn`, or `None` once it lies past the seed.
pub fn window_offset(turn: u64) -> Option<usize> {
    let shift = turn.saturating_mul(BITS_PER_CARD as u64);
    if shift >= SEED_BITS as u64 {
        return None;
    }
    Some(shift as usize)
}

/// The seed shifted so that the low bits hold the first code of `turn`'s window.
pub fn window(seed: U256, turn: u64) -> U256 {
    match window_offset(turn) {
        Some(shift) => seed >> shift,
        None => U256::zero(),
    }
}

/// Low symbol code of `value`.
pub(crate) fn low_code(value: &U256) -> u8 {
    (value.low_u64() & SYMBOL_MASK) as u8
}

/// Decode the three visible cards starting at `start`.
pub fn decode(seed: U256, start: u64) -> CardBatch {
    let mut value = window(seed, start);
    let mut cards = [Card::default(); CARDS_PER_BATCH];
    for card in cards.iter_mut() {
        let mut codes = [0u8; SYMBOLS_PER_CARD];
        for code in codes.iter_mut() {
            *code = low_code(&value);
            value = value >> BITS_PER_SYMBOL;
        }
        *card = Card::from_codes(codes);
    }
    CardBatch::new(start, cards)
}

/// Re-encode a batch into the bit window it was decoded from.
///
/// `pack(&decode(seed, t))` equals the low `CARDS_PER_BATCH * BITS_PER_CARD` bits of
/// `window(seed, t)`.
pub fn pack(batch: &CardBatch) -> U256 {
    batch
        .symbols()
        .enumerate()
        .fold(U256::zero(), |acc, (idx, symbol)| {
            acc | (U256::from(symbol.code()) << (idx * BITS_PER_SYMBOL))
        })
}

/// Bits a single decode consumes.
pub const BATCH_BITS: usize = CARDS_PER_BATCH * BITS_PER_CARD;
