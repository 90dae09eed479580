//! Encoding primitives.
//!
//! These write individual wire format values into a [`BufMut`]. They are enough to assemble test
//! payloads by hand, but there is no encoder for decoded [`Field`](crate::Field) trees.

use crate::varint::{encode_zigzag32, encode_zigzag64};
use crate::wire::{Tag, WireType};
use bytes::BufMut;

/// Number of bytes `value` takes when varint encoded.
pub fn encoded_len_varint(value: u64) -> usize
{
    // Every started group of 7 bits takes a byte, zero still takes one.
    let bits = 64 - (value | 1).leading_zeros() as usize;
    (bits + 6) / 7
}

/// Write a varint. Returns the number of bytes written.
pub fn put_varint(mut value: u64, buf: &mut impl BufMut) -> usize
{
    let len = encoded_len_varint(value);
    for _ in 1..len {
        buf.put_u8((value & 0x7f) as u8 | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
    len
}

/// Write a field tag. Returns the number of bytes written.
pub fn put_tag(number: u64, wire_type: WireType, buf: &mut impl BufMut) -> usize
{
    put_varint(Tag::new(number, wire_type).to_raw(), buf)
}

/// Write a varint field, such as `int64`, `uint64` or `bool`.
pub fn put_varint_field(number: u64, value: u64, buf: &mut impl BufMut)
{
    put_tag(number, WireType::Varint, buf);
    put_varint(value, buf);
}

/// Write a `sint32` field.
pub fn put_sint32_field(number: u64, value: i32, buf: &mut impl BufMut)
{
    put_varint_field(number, u64::from(encode_zigzag32(value)), buf);
}

/// Write a `sint64` field.
pub fn put_sint64_field(number: u64, value: i64, buf: &mut impl BufMut)
{
    put_varint_field(number, encode_zigzag64(value), buf);
}

/// Write a `fixed32` field.
pub fn put_fixed32_field(number: u64, value: u32, buf: &mut impl BufMut)
{
    put_tag(number, WireType::Fixed32, buf);
    buf.put_u32_le(value);
}

/// Write a `float` field.
pub fn put_float_field(number: u64, value: f32, buf: &mut impl BufMut)
{
    put_fixed32_field(number, value.to_bits(), buf);
}

/// Write a `fixed64` field.
pub fn put_fixed64_field(number: u64, value: u64, buf: &mut impl BufMut)
{
    put_tag(number, WireType::Fixed64, buf);
    buf.put_u64_le(value);
}

/// Write a `double` field.
pub fn put_double_field(number: u64, value: f64, buf: &mut impl BufMut)
{
    put_fixed64_field(number, value.to_bits(), buf);
}

/// Write a length delimited field: strings, bytes and embedded messages.
pub fn put_length_delimited_field(number: u64, payload: &[u8], buf: &mut impl BufMut)
{
    put_tag(number, WireType::LengthDelimited, buf);
    put_varint(payload.len() as u64, buf);
    buf.put_slice(payload);
}

#[cfg(test)]
mod test
{
    use super::*;

    #[test]
    fn varint_lengths()
    {
        assert_eq!(encoded_len_varint(0), 1);
        assert_eq!(encoded_len_varint(127), 1);
        assert_eq!(encoded_len_varint(128), 2);
        assert_eq!(encoded_len_varint(16_383), 2);
        assert_eq!(encoded_len_varint(16_384), 3);
        assert_eq!(encoded_len_varint(u64::MAX), 10);
    }

    #[test]
    fn field_encodings()
    {
        let mut buf = vec![];
        put_varint_field(1, 150, &mut buf);
        assert_eq!(buf, b"\x08\x96\x01");

        let mut buf = vec![];
        put_sint32_field(2, -1, &mut buf);
        assert_eq!(buf, b"\x10\x01");

        let mut buf = vec![];
        put_length_delimited_field(2, b"testing", &mut buf);
        assert_eq!(buf, b"\x12\x07testing");

        let mut buf = vec![];
        put_float_field(5, 1.0, &mut buf);
        assert_eq!(buf, b"\x2d\x00\x00\x80\x3f");
    }
}
