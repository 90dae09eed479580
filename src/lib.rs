//!
//! Rawfish decodes protocol buffer messages without a schema. Its primary use case is peeking
//! into payloads for which no .proto-files are at hand.
//!
//! Decoding recovers the field numbers and wire types and leaves the payload bytes as they are.
//! The caller decides how to interpret each field: as an integer, a zig-zag encoded integer, a
//! float, a string or as another embedded message.
//!
//! ```
//! use rawfish::{decode_message, WireType};
//!
//! let fields = decode_message(b"\x08\x96\x01\x12\x05Perch\x1a\x03\x08\xa9\x46").unwrap();
//! assert_eq!(fields[0].number, 1);
//! assert_eq!(fields[0].wire_type, WireType::Varint);
//! assert_eq!(fields[0].as_int64().unwrap(), 150);
//!
//! assert_eq!(fields[1].as_str().unwrap(), "Perch");
//!
//! // Without a schema the same bytes could be a string, bytes or an embedded message.
//! let embedded = fields[2].as_embedded().unwrap();
//! assert_eq!(embedded[0].number, 1);
//! assert_eq!(embedded[0].as_int32().unwrap(), 9001);
//! ```
#![warn(missing_docs)]

pub mod decode;
pub mod encode;
pub mod varint;
pub mod wire;

pub use decode::{
    decode_message, decode_message_with, read_field, DecodeError, DecodeOptions, Field, Fields,
};
pub use wire::{Tag, WireType};
