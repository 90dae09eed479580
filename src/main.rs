use rawfish::decode::{self, DecodeOptions, Field};
use rawfish::{encode, WireType};
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>>
{
    env_logger::init();

    let mut options = DecodeOptions::new();
    if let Ok(depth) = env::var("RAWFISH_MAX_DEPTH") {
        options = options.with_max_depth(depth.parse()?);
    }

    let mut hex_input = false;
    let mut inputs = vec![];
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--hex" => hex_input = true,
            _ => inputs.push(arg),
        }
    }

    let payloads: Vec<Vec<u8>> = if inputs.is_empty() {
        vec![demo_message()]
    } else {
        inputs
            .iter()
            .map(|input| -> Result<Vec<u8>, Box<dyn std::error::Error>> {
                if hex_input {
                    Ok(hex::decode(input.trim())?)
                } else {
                    Ok(std::fs::read(input)?)
                }
            })
            .collect::<Result<_, _>>()?
    };

    for data in &payloads {
        for b in data {
            println!("0b{:08b} {:02} 0x{:02X}", b, b, b);
        }

        match decode::decode_message_with(data, &options) {
            Ok(fields) => print_fields(&fields, 0)?,
            Err(e) => println!("parse error: {}", e),
        }
    }

    Ok(())
}

fn print_fields(fields: &[Field<'_>], indent: usize) -> decode::Result<()>
{
    let pad = "  ".repeat(indent);
    for field in fields {
        match field.wire_type {
            WireType::Varint => println!(
                "{}Field:{} AsInt64:{} AsSint64:{}",
                pad,
                field.number,
                field.as_int64()?,
                field.as_sint64()?
            ),
            WireType::Fixed64 => println!(
                "{}Field:{} AsDouble:{} AsFixed64:{}",
                pad,
                field.number,
                field.as_double()?,
                field.as_fixed64()?
            ),
            WireType::Fixed32 => println!(
                "{}Field:{} AsFloat:{} AsFixed32:{}",
                pad,
                field.number,
                field.as_float()?,
                field.as_fixed32()?
            ),
            WireType::LengthDelimited => {
                println!(
                    "{}Field:{} AsString:{:?} Length:{}",
                    pad,
                    field.number,
                    field.as_string()?,
                    field.payload_len()
                );

                // Anything that parses as a message is shown as one as well.
                if let Ok(embedded) = field.as_embedded() {
                    if !embedded.is_empty() {
                        println!("{}Embedded ({} fields):", pad, embedded.len());
                        print_fields(&embedded, indent + 1)?;
                    }
                }
            }
            WireType::Unsupported(_) => println!("{}{}", pad, field),
        }
    }

    Ok(())
}

/// Message used when no input is given.
///
/// ```proto
/// message Fields {
///   map<int32, int32> f1 = 1;
///   int64 f2 = 2;
///   sint64 f3 = 3;
///   float f4 = 4;
///   string f5 = 5;
///   double f6 = 6;
/// }
/// ```
fn demo_message() -> Vec<u8>
{
    let mut data = vec![];
    for (key, value) in &[(4, 5), (6, 7), (8, 9)] {
        let mut entry = vec![];
        encode::put_varint_field(1, *key, &mut entry);
        encode::put_varint_field(2, *value, &mut entry);
        encode::put_length_delimited_field(1, &entry, &mut data);
    }

    encode::put_varint_field(2, 9_999_999, &mut data);
    encode::put_sint64_field(3, -87_878_342, &mut data);
    encode::put_float_field(4, 88.88, &mut data);
    encode::put_length_delimited_field(5, b"Hello World", &mut data);
    encode::put_double_field(6, 66.66, &mut data);
    data
}
