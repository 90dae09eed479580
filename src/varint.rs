//! Variable length integer primitives.
//!
//! Varints store an integer in groups of 7 bits, least significant group first. The high bit of
//! each byte tells whether more bytes follow.

use snafu::Snafu;

/// Error decoding a varint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Snafu)]
pub enum VarintError
{
    /// There were no bytes to decode.
    #[snafu(display("No bytes left for a varint"))]
    Empty,

    /// The input ended while the continuation bit was still set.
    #[snafu(display("Varint did not terminate within {} bytes", length))]
    Unterminated
    {
        /// Number of bytes examined.
        length: usize,
    },
}

/// Decode one varint from the start of `data`.
///
/// Returns the value and the number of bytes it occupied. Groups beyond the 64th bit are
/// dropped instead of rejected, so overlong varints decode to their low 64 bits.
pub fn decode_varint(data: &[u8]) -> Result<(u64, usize), VarintError>
{
    if data.is_empty() {
        return Empty.fail();
    }

    let mut result = 0u64;
    for (idx, b) in data.iter().enumerate() {
        let shift = idx.saturating_mul(7);
        if shift < 64 {
            result |= u64::from(b & 0x7f) << shift;
        }

        if b & 0x80 == 0 {
            return Ok((result, idx + 1));
        }
    }

    Unterminated { length: data.len() }.fail()
}

/// Count the bytes of the varint at the start of `data` without decoding it.
pub fn varint_len(data: &[u8]) -> Result<usize, VarintError>
{
    if data.is_empty() {
        return Empty.fail();
    }

    match data.iter().position(|b| b & 0x80 == 0) {
        Some(idx) => Ok(idx + 1),
        None => Unterminated { length: data.len() }.fail(),
    }
}

/// Zig-zag encode a 32-bit signed integer.
pub fn encode_zigzag32(value: i32) -> u32
{
    ((value << 1) ^ (value >> 31)) as u32
}

/// Zig-zag decode a 32-bit value.
pub fn decode_zigzag32(value: u32) -> i32
{
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// Zig-zag encode a 64-bit signed integer.
pub fn encode_zigzag64(value: i64) -> u64
{
    ((value << 1) ^ (value >> 63)) as u64
}

/// Zig-zag decode a 64-bit value.
pub fn decode_zigzag64(value: u64) -> i64
{
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}
