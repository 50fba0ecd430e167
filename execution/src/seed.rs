//! Reseeding ("drawing a fresh deck").
//!
//! The contract redraws with `keccak256(abi.encode(seed))`, i.e. the hash of the seed's
//! 32-byte big-endian encoding. Any other encoding would desynchronize the client.

use ethers::{types::U256, utils::keccak256};
use mollinalli_types::SEED_BYTES;

/// Canonical encoding of a seed.
pub fn seed_bytes(seed: U256) -> [u8; SEED_BYTES] {
    let mut bytes = [0u8; SEED_BYTES];
    seed.to_big_endian(&mut bytes);
    bytes
}

/// The seed that follows `seed` after a full round.
pub fn next_seed(seed: U256) -> U256 {
    U256::from_big_endian(&keccak256(seed_bytes(seed)))
}

/// Apply [`next_seed`] `rounds` times.
pub fn advance_seed(seed: U256, rounds: usize) -> U256 {
    (0..rounds).fold(seed, |seed, _| next_seed(seed))
}
