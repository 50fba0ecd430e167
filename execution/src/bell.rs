//! Bell (four-of-a-kind) rule.
//!
//! Mirrors the contract's pure `checkCard(value, turn)`: tally the 12 codes of the visible
//! window and ring when any non-empty symbol occurs exactly `BELL_TARGET` times. The
//! extraction is done here directly on the seed rather than through [`crate::cards::decode`]
//! so it can be compared line for line with the contract.

use ethers::types::U256;
use mollinalli_types::{Symbol, BELL_TARGET, BELL_WINDOW, BITS_PER_SYMBOL, SYMBOL_TYPES};

use crate::cards::{low_code, window};

/// Occurrences of each symbol code in `turn`'s window, indexed by code.
pub fn symbol_tally(seed: U256, turn: u64) -> [u8; 4] {
    let mut tally = [0u8; 4];
    let mut value = window(seed, turn);
    for _ in 0..BELL_WINDOW {
        tally[low_code(&value) as usize] += 1;
        value = value >> BITS_PER_SYMBOL;
    }
    tally
}

/// The symbol that makes ringing correct in `turn`'s window, if any.
pub fn bell_symbol(seed: U256, turn: u64) -> Option<Symbol> {
    let tally = symbol_tally(seed, turn);
    (1..=SYMBOL_TYPES)
        .find(|code| tally[*code] == BELL_TARGET)
        .map(|code| Symbol::from_code(code as u8))
}

/// Whether ringing the bell is correct for `turn`'s window.
pub fn has_four_of_a_kind(seed: U256, turn: u64) -> bool {
    bell_symbol(seed, turn).is_some()
}
