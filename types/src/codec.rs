use bytes::{Buf, BufMut};
use commonware_codec::Error;
use ethers::types::{Address, U256};

use crate::SEED_BYTES;

const ADDRESS_BYTES: usize = 20;

/// Helper to write a 256-bit integer as fixed-width big-endian bytes.
pub fn write_u256(value: &U256, writer: &mut impl BufMut) {
    let mut bytes = [0u8; SEED_BYTES];
    value.to_big_endian(&mut bytes);
    writer.put_slice(&bytes);
}

/// Helper to read a 256-bit integer from fixed-width big-endian bytes.
pub fn read_u256(reader: &mut impl Buf) -> Result<U256, Error> {
    let bytes: [u8; SEED_BYTES] = read_fixed(reader)?;
    Ok(U256::from_big_endian(&bytes))
}

/// Helper to write an EVM address as its raw 20 bytes.
pub fn write_address(address: &Address, writer: &mut impl BufMut) {
    writer.put_slice(address.as_bytes());
}

/// Helper to read an EVM address from raw 20 bytes.
pub fn read_address(reader: &mut impl Buf) -> Result<Address, Error> {
    let bytes: [u8; ADDRESS_BYTES] = read_fixed(reader)?;
    Ok(Address::from(bytes))
}

fn read_fixed<const N: usize>(reader: &mut impl Buf) -> Result<[u8; N], Error> {
    if reader.remaining() < N {
        return Err(Error::EndOfBuffer);
    }
    let mut bytes = [0u8; N];
    reader.copy_to_slice(&mut bytes);
    Ok(bytes)
}

pub fn address_encode_size() -> usize {
    ADDRESS_BYTES
}
