//! Wire types and field tags.

use crate::varint::{self, VarintError};
use std::fmt;

/// Number of tag bits reserved for the wire type.
pub const WIRE_TYPE_BITS: u32 = 3;

/// Mask selecting the wire type bits of a tag.
pub const WIRE_TYPE_MASK: u64 = 0x07;

/// Largest field number allowed by the protocol buffer language.
///
/// The decoder itself does not enforce this.
pub const MAX_FIELD_NUMBER: u64 = (1 << 29) - 1;

/// Wire type of an encoded field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType
{
    /// Variable length integer (wire type = 0).
    Varint,

    /// Little-endian 64-bit value (wire type = 1).
    Fixed64,

    /// Length prefixed payload (wire type = 2).
    LengthDelimited,

    /// Little-endian 32-bit value (wire type = 5).
    Fixed32,

    /// Any other wire type, including the deprecated group markers 3 and 4.
    ///
    /// The size of such values cannot be determined from the wire data alone.
    Unsupported(u8),
}

impl WireType
{
    /// Wire type from the three low bits of a tag.
    pub fn from_bits(bits: u8) -> Self
    {
        match bits & WIRE_TYPE_MASK as u8 {
            0 => WireType::Varint,
            1 => WireType::Fixed64,
            2 => WireType::LengthDelimited,
            5 => WireType::Fixed32,
            other => WireType::Unsupported(other),
        }
    }

    /// Numeric value of the wire type as it appears in a tag.
    pub fn bits(self) -> u8
    {
        match self {
            WireType::Varint => 0,
            WireType::Fixed64 => 1,
            WireType::LengthDelimited => 2,
            WireType::Fixed32 => 5,
            WireType::Unsupported(bits) => bits & WIRE_TYPE_MASK as u8,
        }
    }
}

impl fmt::Display for WireType
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            WireType::Varint => f.write_str("varint"),
            WireType::Fixed64 => f.write_str("64bit"),
            WireType::LengthDelimited => f.write_str("lengthDelimited"),
            WireType::Fixed32 => f.write_str("32bit"),
            WireType::Unsupported(bits) => write!(f, "unknown({})", bits),
        }
    }
}

/// Split a single tag byte into its wire type bits and the low bits of the field number.
///
/// Only complete for tags that fit in one byte, that is field numbers below 16.
pub fn split_tag_byte(b: u8) -> (u8, u8)
{
    (b & WIRE_TYPE_MASK as u8, (b & 0x7f) >> WIRE_TYPE_BITS)
}

/// Field tag: the field number and the wire type of the value following it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag
{
    /// Field number.
    pub number: u64,

    /// Wire type.
    pub wire_type: WireType,
}

impl Tag
{
    /// Create a new tag.
    pub fn new(number: u64, wire_type: WireType) -> Self
    {
        Tag { number, wire_type }
    }

    /// Split a decoded tag varint into the field number and the wire type.
    pub fn from_raw(raw: u64) -> Self
    {
        Tag {
            number: raw >> WIRE_TYPE_BITS,
            wire_type: WireType::from_bits((raw & WIRE_TYPE_MASK) as u8),
        }
    }

    /// The tag as the integer that is varint encoded on the wire.
    pub fn to_raw(self) -> u64
    {
        (self.number << WIRE_TYPE_BITS) | u64::from(self.wire_type.bits())
    }

    /// Decode the tag at the start of `data`.
    ///
    /// The whole tag varint is decoded so field numbers of 16 and above, which spill over to
    /// following bytes, come out intact. Returns the tag and the number of bytes it took.
    pub fn decode(data: &[u8]) -> Result<(Tag, usize), VarintError>
    {
        match data.first() {
            Some(&b) if b & 0x80 == 0 => {
                let (wire_type, number) = split_tag_byte(b);
                Ok((
                    Tag::new(u64::from(number), WireType::from_bits(wire_type)),
                    1,
                ))
            }
            _ => {
                let (raw, consumed) = varint::decode_varint(data)?;
                Ok((Tag::from_raw(raw), consumed))
            }
        }
    }
}

impl fmt::Display for Tag
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}:{}", self.number, self.wire_type)
    }
}

#[cfg(test)]
mod test
{
    use super::*;
    use crate::encode::put_tag;
    use proptest::prelude::*;

    fn wire_types() -> impl Strategy<Value = WireType>
    {
        prop_oneof![
            Just(WireType::Varint),
            Just(WireType::Fixed64),
            Just(WireType::LengthDelimited),
            Just(WireType::Fixed32),
        ]
    }

    proptest! {
        #[test]
        fn tag(number in 1..=MAX_FIELD_NUMBER, wire_type in wire_types()) {
            let mut buf = vec![];
            let written = put_tag(number, wire_type, &mut buf);
            prop_assert_eq!(Tag::decode(&buf), Ok((Tag::new(number, wire_type), written)));
        }
    }

    #[test]
    fn single_byte_tags()
    {
        assert_eq!(split_tag_byte(0x08), (0, 1));
        assert_eq!(split_tag_byte(0x2d), (5, 5));
        assert_eq!(split_tag_byte(0x7a), (2, 15));

        assert_eq!(
            Tag::decode(b"\x2d"),
            Ok((Tag::new(5, WireType::Fixed32), 1))
        );
    }

    #[test]
    fn multi_byte_tags()
    {
        // Field 16, varint.
        assert_eq!(
            Tag::decode(b"\x80\x01"),
            Ok((Tag::new(16, WireType::Varint), 2))
        );

        // Field 300, length delimited.
        assert_eq!(
            Tag::decode(b"\xe2\x12"),
            Ok((Tag::new(300, WireType::LengthDelimited), 2))
        );

        assert_eq!(
            Tag::decode(b"\x80"),
            Err(VarintError::Unterminated { length: 1 })
        );
        assert_eq!(Tag::decode(b""), Err(VarintError::Empty));
    }

    #[test]
    fn unsupported_wire_types()
    {
        assert_eq!(WireType::from_bits(3), WireType::Unsupported(3));
        assert_eq!(WireType::from_bits(4), WireType::Unsupported(4));
        assert_eq!(WireType::from_bits(7), WireType::Unsupported(7));
        assert_eq!(WireType::Unsupported(3).bits(), 3);
        assert_eq!(WireType::Unsupported(3).to_string(), "unknown(3)");
        assert_eq!(WireType::LengthDelimited.to_string(), "lengthDelimited");
    }
}
