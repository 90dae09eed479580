//! Schema-less protocol buffer payload decoding.
//!
//! Decoding splits a payload into [`Field`]s without knowing what the fields mean. Each field
//! borrows its payload from the input buffer. The payload can then be interpreted on demand
//! with the typed accessors, such as [`Field::as_int64`] or [`Field::as_embedded`]. An accessor
//! fails with [`DecodeError::TypeMismatch`] if the field has the wrong wire type for it.
//!
//! Decoding a message is all or nothing. The first malformed field aborts the whole message as
//! there is no reliable way to find where the next field would start.

use crate::varint::{self, decode_zigzag32, decode_zigzag64, VarintError};
use crate::wire::{Tag, WireType};
use snafu::{ensure, ResultExt, Snafu};
use std::convert::TryFrom;
use std::fmt;
use std::str::Utf8Error;

/// Default limit for nested embedded messages.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Decoding error.
///
/// Offsets are relative to the start of the buffer being decoded. For embedded messages that is
/// the start of the embedded payload.
#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DecodeError
{
    /// A tag, a length prefix or a varint value ran off the end of the buffer.
    #[snafu(display("Truncated varint at offset {}: {}", offset, source))]
    TruncatedVarint
    {
        /// Offset of the varint.
        offset: usize,

        /// Source error.
        source: VarintError,
    },

    /// Not enough bytes left for a fixed width value.
    #[snafu(display(
        "Truncated fixed width value at offset {}: expected {} bytes, {} available",
        offset,
        expected,
        available
    ))]
    TruncatedFixed
    {
        /// Offset of the value.
        offset: usize,

        /// Size of the value.
        expected: usize,

        /// Bytes remaining in the buffer.
        available: usize,
    },

    /// Not enough bytes left for the declared length of a length delimited value.
    #[snafu(display(
        "Truncated length delimited value at offset {}: declared {} bytes, {} available",
        offset,
        declared,
        available
    ))]
    TruncatedLengthDelimited
    {
        /// Offset of the length prefix.
        offset: usize,

        /// Length given by the prefix.
        declared: u64,

        /// Bytes remaining after the prefix.
        available: usize,
    },

    /// The tag had a wire type the decoder cannot size.
    #[snafu(display("Unsupported wire type {} at offset {}", wire_type, offset))]
    UnsupportedWireType
    {
        /// Offset of the tag.
        offset: usize,

        /// Wire type bits of the tag.
        wire_type: u8,
    },

    /// A typed accessor was used on a field of the wrong wire type.
    #[snafu(display("Expected a {} field, found {}", expected, actual))]
    TypeMismatch
    {
        /// Wire type the accessor reads.
        expected: WireType,

        /// Wire type of the field.
        actual: WireType,
    },

    /// The payload was not valid UTF-8.
    #[snafu(display("Invalid UTF-8 in string field: {}", source))]
    InvalidUtf8
    {
        /// Source error.
        source: Utf8Error,
    },

    /// Embedded messages were nested deeper than allowed.
    #[snafu(display("Embedded messages nested deeper than {} levels", max_depth))]
    MaxDepthExceeded
    {
        /// The configured limit.
        max_depth: usize,
    },
}

/// Result type for decoding.
pub type Result<T, E = DecodeError> = std::result::Result<T, E>;

/// Decoding options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions
{
    /// Maximum number of embedded message levels below the top level message.
    ///
    /// With `0` the top level message decodes normally but [`Field::as_embedded`] always fails.
    pub max_depth: usize,
}

impl Default for DecodeOptions
{
    fn default() -> Self
    {
        DecodeOptions {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl DecodeOptions
{
    /// Options with the default limits.
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Set the embedded message depth limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self
    {
        self.max_depth = max_depth;
        self
    }
}

/// One decoded field.
///
/// The payload borrows from the decoded buffer. For varints it holds the encoded varint bytes,
/// for length delimited values the bytes after the length prefix.
#[derive(Debug, Clone, Copy)]
pub struct Field<'a>
{
    /// Field number.
    pub number: u64,

    /// Wire type.
    pub wire_type: WireType,

    /// Raw payload bytes.
    pub payload: &'a [u8],

    depth: usize,
    options: DecodeOptions,
}

// The nesting bookkeeping does not take part in comparisons.
impl PartialEq for Field<'_>
{
    fn eq(&self, other: &Self) -> bool
    {
        self.number == other.number
            && self.wire_type == other.wire_type
            && self.payload == other.payload
    }
}

impl Eq for Field<'_> {}

impl fmt::Display for Field<'_>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(
            f,
            "FieldNum: {} WireType:{} DataLength:{}",
            self.number,
            self.wire_type,
            self.payload.len()
        )
    }
}

impl<'a> Field<'a>
{
    /// Create a top level field with default options.
    pub fn new(number: u64, wire_type: WireType, payload: &'a [u8]) -> Self
    {
        Field {
            number,
            wire_type,
            payload,
            depth: 0,
            options: DecodeOptions::default(),
        }
    }

    /// Number of payload bytes.
    pub fn payload_len(&self) -> usize
    {
        self.payload.len()
    }

    /// Nesting level of the message this field was decoded from. Top level fields are at `0`.
    pub fn depth(&self) -> usize
    {
        self.depth
    }

    /// `int64` value.
    pub fn as_int64(&self) -> Result<i64>
    {
        self.varint().map(|v| v as i64)
    }

    /// `uint64` value.
    pub fn as_uint64(&self) -> Result<u64>
    {
        self.varint()
    }

    /// `int32` value. Keeps the low 32 bits like protobuf does for `int32` fields.
    pub fn as_int32(&self) -> Result<i32>
    {
        self.varint().map(|v| v as i32)
    }

    /// `sint64` value.
    pub fn as_sint64(&self) -> Result<i64>
    {
        self.varint().map(decode_zigzag64)
    }

    /// `sint32` value.
    pub fn as_sint32(&self) -> Result<i32>
    {
        self.varint().map(|v| decode_zigzag32(v as u32))
    }

    /// `bool` value.
    pub fn as_bool(&self) -> Result<bool>
    {
        self.varint().map(|v| v != 0)
    }

    /// `float` value.
    pub fn as_float(&self) -> Result<f32>
    {
        self.fixed32().map(f32::from_le_bytes)
    }

    /// `double` value.
    pub fn as_double(&self) -> Result<f64>
    {
        self.fixed64().map(f64::from_le_bytes)
    }

    /// `fixed32` value.
    pub fn as_fixed32(&self) -> Result<u32>
    {
        self.fixed32().map(u32::from_le_bytes)
    }

    /// `fixed64` value.
    pub fn as_fixed64(&self) -> Result<u64>
    {
        self.fixed64().map(u64::from_le_bytes)
    }

    /// `sfixed32` value.
    pub fn as_sfixed32(&self) -> Result<i32>
    {
        self.fixed32().map(i32::from_le_bytes)
    }

    /// `sfixed64` value.
    pub fn as_sfixed64(&self) -> Result<i64>
    {
        self.fixed64().map(i64::from_le_bytes)
    }

    /// `bytes` value.
    pub fn as_bytes(&self) -> Result<&'a [u8]>
    {
        self.check_wire_type(WireType::LengthDelimited)?;
        Ok(self.payload)
    }

    /// `string` value.
    ///
    /// The payload is not validated. Invalid UTF-8 sequences are replaced with
    /// `U+FFFD REPLACEMENT CHARACTER`, as the field might well be `bytes` instead of `string`.
    pub fn as_string(&self) -> Result<String>
    {
        self.check_wire_type(WireType::LengthDelimited)?;
        Ok(String::from_utf8_lossy(self.payload).into_owned())
    }

    /// `string` value borrowed from the buffer, failing on invalid UTF-8.
    pub fn as_str(&self) -> Result<&'a str>
    {
        self.check_wire_type(WireType::LengthDelimited)?;
        std::str::from_utf8(self.payload).context(InvalidUtf8)
    }

    /// Decode the payload as an embedded message.
    pub fn as_embedded(&self) -> Result<Vec<Field<'a>>>
    {
        self.embedded_fields()?.collect()
    }

    /// Iterate the payload as an embedded message without collecting the fields.
    pub fn embedded_fields(&self) -> Result<Fields<'a>>
    {
        self.check_wire_type(WireType::LengthDelimited)?;
        if self.depth >= self.options.max_depth {
            log::debug!(
                "Field {} exceeds the embedded message depth limit of {}",
                self.number,
                self.options.max_depth
            );
            return MaxDepthExceeded {
                max_depth: self.options.max_depth,
            }
            .fail();
        }

        Ok(Fields::nested(self.payload, self.options, self.depth + 1))
    }

    fn check_wire_type(&self, expected: WireType) -> Result<()>
    {
        ensure!(
            self.wire_type == expected,
            TypeMismatch {
                expected,
                actual: self.wire_type
            }
        );
        Ok(())
    }

    fn varint(&self) -> Result<u64>
    {
        self.check_wire_type(WireType::Varint)?;
        let (value, _) =
            varint::decode_varint(self.payload).context(TruncatedVarint { offset: 0usize })?;
        Ok(value)
    }

    fn fixed32(&self) -> Result<[u8; 4]>
    {
        self.check_wire_type(WireType::Fixed32)?;
        fixed_bytes(self.payload)
    }

    fn fixed64(&self) -> Result<[u8; 8]>
    {
        self.check_wire_type(WireType::Fixed64)?;
        fixed_bytes(self.payload)
    }
}

fn fixed_bytes<'a, T>(payload: &'a [u8]) -> Result<T>
where
    T: TryFrom<&'a [u8]>,
{
    match T::try_from(payload) {
        Ok(bytes) => Ok(bytes),
        Err(_) => {
            let expected = std::mem::size_of::<T>();
            TruncatedFixed {
                offset: 0usize,
                expected,
                available: payload.len(),
            }
            .fail()
        }
    }
}

/// Lazily decoded fields of a message.
///
/// Yields fields in buffer order. After an error the iterator is exhausted.
#[derive(Debug, Clone)]
pub struct Fields<'a>
{
    data: &'a [u8],
    offset: usize,
    depth: usize,
    options: DecodeOptions,
    failed: bool,
}

impl<'a> Fields<'a>
{
    /// Iterate the fields of a top level message with default options.
    pub fn new(data: &'a [u8]) -> Self
    {
        Self::with_options(data, &DecodeOptions::default())
    }

    /// Iterate the fields of a top level message.
    pub fn with_options(data: &'a [u8], options: &DecodeOptions) -> Self
    {
        Self::nested(data, *options, 0)
    }

    fn nested(data: &'a [u8], options: DecodeOptions, depth: usize) -> Self
    {
        Fields {
            data,
            offset: 0,
            depth,
            options,
            failed: false,
        }
    }

    /// Number of bytes consumed so far.
    pub fn offset(&self) -> usize
    {
        self.offset
    }
}

impl<'a> Iterator for Fields<'a>
{
    type Item = Result<Field<'a>>;

    fn next(&mut self) -> Option<Self::Item>
    {
        if self.failed {
            return None;
        }

        match read_field_at(self.data, self.offset, self.depth, self.options) {
            Ok(Some((field, consumed))) => {
                log::trace!(
                    "Decoded {} at offset {} (depth {})",
                    field,
                    self.offset,
                    self.depth
                );
                self.offset += consumed;
                Some(Ok(field))
            }
            Ok(None) => None,
            Err(e) => {
                log::debug!("Message decoding aborted at depth {}: {}", self.depth, e);
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for Fields<'_> {}

/// Decode all fields of a message with default options.
///
/// An empty buffer is a valid, empty message.
pub fn decode_message(data: &[u8]) -> Result<Vec<Field<'_>>>
{
    Fields::new(data).collect()
}

/// Decode all fields of a message.
pub fn decode_message_with<'a>(data: &'a [u8], options: &DecodeOptions) -> Result<Vec<Field<'a>>>
{
    Fields::with_options(data, options).collect()
}

/// Decode the single field starting at `offset`.
///
/// Returns the field and the number of bytes it took, tag included, or `None` if there are no
/// bytes left at `offset`.
pub fn read_field<'a>(
    data: &'a [u8],
    offset: usize,
    options: &DecodeOptions,
) -> Result<Option<(Field<'a>, usize)>>
{
    read_field_at(data, offset, 0, *options)
}

fn read_field_at(
    data: &[u8],
    offset: usize,
    depth: usize,
    options: DecodeOptions,
) -> Result<Option<(Field<'_>, usize)>>
{
    let input = match data.get(offset..) {
        Some(input) if !input.is_empty() => input,
        _ => return Ok(None),
    };

    let (tag, tag_len) = Tag::decode(input).context(TruncatedVarint { offset })?;
    let rest = &input[tag_len..];
    let payload_offset = offset + tag_len;

    let (payload, prefix_len) = match tag.wire_type {
        WireType::Varint => {
            let len = varint::varint_len(rest).context(TruncatedVarint {
                offset: payload_offset,
            })?;
            (&rest[..len], 0)
        }
        WireType::Fixed64 => (take_fixed(rest, 8, payload_offset)?, 0),
        WireType::Fixed32 => (take_fixed(rest, 4, payload_offset)?, 0),
        WireType::LengthDelimited => {
            let (declared, prefix_len) = varint::decode_varint(rest).context(TruncatedVarint {
                offset: payload_offset,
            })?;
            let body = &rest[prefix_len..];
            match usize::try_from(declared) {
                Ok(len) if len <= body.len() => (&body[..len], prefix_len),
                _ => {
                    return TruncatedLengthDelimited {
                        offset: payload_offset,
                        declared,
                        available: body.len(),
                    }
                    .fail()
                }
            }
        }
        WireType::Unsupported(bits) => {
            return UnsupportedWireType {
                offset,
                wire_type: bits,
            }
            .fail()
        }
    };

    let field = Field {
        number: tag.number,
        wire_type: tag.wire_type,
        payload,
        depth,
        options,
    };

    Ok(Some((field, tag_len + prefix_len + payload.len())))
}

fn take_fixed(data: &[u8], len: usize, offset: usize) -> Result<&[u8]>
{
    ensure!(
        data.len() >= len,
        TruncatedFixed {
            offset,
            expected: len,
            available: data.len(),
        }
    );
    Ok(&data[..len])
}
