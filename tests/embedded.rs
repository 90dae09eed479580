fn nest(levels: usize) -> Vec<u8>
{
    use rawfish::encode::{put_length_delimited_field, put_varint_field};

    let mut payload = vec![];
    put_varint_field(1, 42, &mut payload);
    for _ in 0..levels {
        let mut outer = vec![];
        put_length_delimited_field(2, &payload, &mut outer);
        payload = outer;
    }
    payload
}

#[test]
fn embedded_matches_independent_decode()
{
    use rawfish::decode_message;
    use rawfish::encode::{put_length_delimited_field, put_sint32_field, put_varint_field};

    let mut inner = vec![];
    put_length_delimited_field(1, b"child", &mut inner);
    put_sint32_field(4, -123, &mut inner);

    let mut payload = vec![];
    put_length_delimited_field(1, b"parent", &mut payload);
    put_varint_field(2, 123, &mut payload);
    put_length_delimited_field(10, &inner, &mut payload);

    let fields = decode_message(&payload).unwrap();
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[2].number, 10);

    let embedded = fields[2].as_embedded().unwrap();
    assert_eq!(embedded, decode_message(&inner).unwrap());
    assert_eq!(embedded[0].as_str().unwrap(), "child");
    assert_eq!(embedded[1].as_sint32().unwrap(), -123);
    assert_eq!(embedded[0].depth(), 1);
    assert_eq!(fields[2].depth(), 0);

    // Payloads borrow from the outer buffer.
    let start = payload.len() - inner.len();
    assert_eq!(embedded[0].payload.as_ptr(), payload[start + 2..].as_ptr());
}

#[test]
fn string_is_not_a_message()
{
    use rawfish::{decode_message, DecodeError};

    let fields = decode_message(b"\x2a\x0bHello World").unwrap();

    // 'H' reads as a varint field and 'l' carries wire type 4.
    assert_eq!(
        fields[0].as_embedded(),
        Err(DecodeError::UnsupportedWireType {
            offset: 2,
            wire_type: 4,
        })
    );
    assert_eq!(fields[0].as_string().unwrap(), "Hello World");
}

#[test]
fn empty_embedded_message()
{
    use rawfish::decode_message;

    let fields = decode_message(b"\x1a\x00").unwrap();
    assert!(fields[0].as_embedded().unwrap().is_empty());
    assert_eq!(fields[0].as_string().unwrap(), "");
}

#[test]
fn depth_limit()
{
    use rawfish::{decode_message_with, DecodeError, DecodeOptions, Field};

    fn descend(field: &Field) -> Result<(usize, i64), DecodeError>
    {
        let mut levels = 0;
        let mut current = *field;
        loop {
            let fields = current.as_embedded()?;
            levels += 1;
            if fields[0].number == 1 {
                return Ok((levels, fields[0].as_int64()?));
            }
            current = fields[0];
        }
    }

    let payload = nest(3);

    let options = DecodeOptions::new().with_max_depth(2);
    let fields = decode_message_with(&payload, &options).unwrap();
    assert_eq!(
        descend(&fields[0]),
        Err(DecodeError::MaxDepthExceeded { max_depth: 2 })
    );

    let options = DecodeOptions::new().with_max_depth(3);
    let fields = decode_message_with(&payload, &options).unwrap();
    assert_eq!(descend(&fields[0]), Ok((3, 42)));

    // The top level decodes even when no nesting is allowed.
    let options = DecodeOptions::new().with_max_depth(0);
    let fields = decode_message_with(&payload, &options).unwrap();
    assert_eq!(
        fields[0].as_embedded(),
        Err(DecodeError::MaxDepthExceeded { max_depth: 0 })
    );
}

#[test]
fn default_depth_limit()
{
    use rawfish::decode::DEFAULT_MAX_DEPTH;
    use rawfish::{decode_message, DecodeError};

    let payload = nest(DEFAULT_MAX_DEPTH + 20);
    let mut fields = decode_message(&payload).unwrap();

    let mut levels = 0;
    let err = loop {
        match fields[0].as_embedded() {
            Ok(embedded) => {
                levels += 1;
                fields = embedded;
            }
            Err(e) => break e,
        }
    };

    assert_eq!(levels, DEFAULT_MAX_DEPTH);
    assert_eq!(
        err,
        DecodeError::MaxDepthExceeded {
            max_depth: DEFAULT_MAX_DEPTH
        }
    );
}

#[test]
fn lazy_embedded_fields()
{
    use rawfish::{decode_message, DecodeError};

    // The second embedded field is truncated.
    let fields = decode_message(b"\x0a\x05\x08\x01\x10\x96\x99").unwrap();

    let mut embedded = fields[0].embedded_fields().unwrap();
    assert_eq!(embedded.next().unwrap().unwrap().as_int64().unwrap(), 1);
    match embedded.next() {
        Some(Err(DecodeError::TruncatedVarint { offset: 3, .. })) => {}
        other => panic!("Expected truncated varint, got {:?}", other),
    }
    assert!(embedded.next().is_none());

    assert!(fields[0].as_embedded().is_err());
}
