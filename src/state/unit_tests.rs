use super::{StateError, StateStream};

fn stream_fields(stream: &mut StateStream, a: &mut u8, b: &mut u16, c: &mut bool, d: &mut i16) {
    stream.stream(a).unwrap();
    stream.stream(b).unwrap();
    stream.stream(c).unwrap();
    stream.stream(d).unwrap();
}

#[test]
fn test_field_order_is_fixed() {
    let mut saver = StateStream::saver();
    stream_fields(&mut saver, &mut 0x12, &mut 0xBEEF, &mut true, &mut -2);
    let bytes = saver.finish().unwrap();

    assert_eq!(vec![0x12, 0xEF, 0xBE, 0x01, 0xFE, 0xFF], bytes);

    let (mut a, mut b, mut c, mut d) = (0, 0, false, 0);
    let mut loader = StateStream::loader(bytes);
    stream_fields(&mut loader, &mut a, &mut b, &mut c, &mut d);
    loader.finish().unwrap();

    assert_eq!((0x12, 0xBEEF, true, -2), (a, b, c, d));
}

#[test]
fn test_truncated_stream() {
    let mut loader = StateStream::loader(vec![0x01]);
    let mut value = 0u16;
    assert_eq!(
        Err(StateError::UnexpectedEnd {
            needed: 2,
            remaining: 1
        }),
        loader.stream(&mut value)
    );
    assert_eq!(0, value);
}

#[test]
fn test_block_length_must_match() {
    let mut saver = StateStream::saver();
    saver.stream_bytes(&mut [1, 2, 3]).unwrap();
    let bytes = saver.finish().unwrap();

    let mut loader = StateStream::loader(bytes.clone());
    let mut short = [0; 2];
    assert_eq!(
        Err(StateError::InvalidValue {
            field: "block length",
            value: 3
        }),
        loader.stream_bytes(&mut short)
    );

    let mut loader = StateStream::loader(bytes);
    let mut exact = [0; 3];
    loader.stream_bytes(&mut exact).unwrap();
    assert_eq!([1, 2, 3], exact);
}

#[test]
fn test_trailing_bytes_rejected() {
    let mut loader = StateStream::loader(vec![1, 2]);
    let mut value = 0u8;
    loader.stream(&mut value).unwrap();
    assert_eq!(Err(StateError::TrailingBytes(1)), loader.finish());
}
