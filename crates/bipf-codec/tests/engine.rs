use std::collections::{BTreeMap, HashMap};

use bipf_codec::{
    decode_from, from_bytes, from_bytes_with_config, to_bytes, AnyValue, BipfError, ByteBuf,
    Discriminant, Interface, Reader, ReaderConfig, Value, Writer,
};

#[test]
fn scalar_fixtures() {
    assert_eq!(to_bytes(&None::<i32>).unwrap(), vec![0x06]);
    assert_eq!(hex::encode(to_bytes(&100i32).unwrap()), "2264000000");
    assert_eq!(hex::encode(to_bytes(&Some(100u8)).unwrap()), "2264000000");
    assert_eq!(hex::encode(to_bytes(&Box::new(100i64)).unwrap()), "2264000000");
    assert_eq!(hex::encode(to_bytes(&"hello".to_string()).unwrap()), "2868656c6c6f");
    assert_eq!(hex::encode(to_bytes(&true).unwrap()), "0e01");
    assert_eq!(hex::encode(to_bytes(&ByteBuf(vec![0xde, 0xad])).unwrap()), "11dead");
    assert_eq!(hex::encode(to_bytes(&vec![0xbeu8, 0xef]).unwrap()), "11beef");
    assert_eq!(
        hex::encode(to_bytes(&1.5f32).unwrap()),
        hex::encode(to_bytes(&1.5f64).unwrap())
    );
}

#[test]
fn int_ceiling() {
    assert!(matches!(
        to_bytes(&u64::MAX).unwrap_err().root(),
        BipfError::Overflow { .. }
    ));
    assert!(matches!(
        to_bytes(&i64::MIN).unwrap_err().root(),
        BipfError::Underflow { .. }
    ));

    let mut narrow = 0u8;
    let err = from_bytes(&to_bytes(&300i32).unwrap(), &mut narrow).unwrap_err();
    assert!(matches!(err.root(), BipfError::Overflow { .. }));
    let err = from_bytes(&to_bytes(&-1i32).unwrap(), &mut narrow).unwrap_err();
    assert!(matches!(err.root(), BipfError::Underflow { .. }));
}

#[test]
fn f32_narrowing() {
    let mut target = 0f32;
    from_bytes(&to_bytes(&0.25f64).unwrap(), &mut target).unwrap();
    assert_eq!(target, 0.25);

    let err = from_bytes(&to_bytes(&1e300f64).unwrap(), &mut target).unwrap_err();
    assert!(matches!(err.root(), BipfError::Overflow { .. }));
    let err = from_bytes(&to_bytes(&-1e300f64).unwrap(), &mut target).unwrap_err();
    assert!(matches!(err.root(), BipfError::Underflow { .. }));
}

#[test]
fn trailing_bytes_are_rejected() {
    let mut target = 0i32;
    let err = from_bytes(&[0x22, 0x01, 0, 0, 0, 0x06], &mut target).unwrap_err();
    assert!(matches!(err.root(), BipfError::TrailingBytes(1)));
    assert_eq!(target, 1);
}

#[test]
fn decode_from_leaves_remaining_input() {
    let mut stream = to_bytes(&7i32).unwrap();
    stream.extend(to_bytes(&"next".to_string()).unwrap());

    let mut reader = Reader::new(&stream);
    let mut first = 0i32;
    decode_from(&mut reader, &mut first).unwrap();
    let mut second = String::new();
    decode_from(&mut reader, &mut second).unwrap();

    assert_eq!((first, second.as_str()), (7, "next"));
    assert!(reader.is_exhausted());
}

#[test]
fn errors_are_annotated_with_offset() {
    let mut target = String::new();
    let err = from_bytes(&[0x28, 0x68, 0x65], &mut target).unwrap_err();
    assert!(matches!(err.root(), BipfError::EndOfInput));
    let BipfError::Annotated { offset, .. } = &err else {
        panic!("expected annotation, got {err:?}");
    };
    assert_eq!(*offset, 1);
    assert!(err.to_string().contains("error found in #1 byte"));
}

#[test]
fn type_mismatch_at_typed_read() {
    let mut target = false;
    let err = from_bytes(&to_bytes(&1i32).unwrap(), &mut target).unwrap_err();
    assert!(matches!(
        err.root(),
        BipfError::TypeMismatch {
            expected: Discriminant::BoolNull,
            found: Discriminant::Int,
        }
    ));
}

/// Nested single-element arrays around a null.
fn nested_arrays(depth: usize) -> Vec<u8> {
    let mut tags = Vec::with_capacity(depth);
    let mut len = 1u64;
    for _ in 0..depth {
        let mut writer = Writer::new();
        writer.write_tag(Discriminant::Array, len);
        let tag = writer.into_vec();
        len += tag.len() as u64;
        tags.push(tag);
    }
    let mut out: Vec<u8> = tags.into_iter().rev().flatten().collect();
    out.push(0x06);
    out
}

#[test]
fn depth_guard() {
    let mut value = Value::Null;
    from_bytes(&nested_arrays(10_000), &mut value).unwrap();

    let err = from_bytes(&nested_arrays(10_001), &mut value).unwrap_err();
    assert!(matches!(err.root(), BipfError::MaxDepthExceeded(10_000)));
}

#[test]
fn depth_guard_applies_to_typed_targets() {
    let config = ReaderConfig {
        max_depth: 2,
        ..ReaderConfig::default()
    };
    let bytes = to_bytes(&vec![vec![vec![1i32]]]).unwrap();

    let mut target: Vec<Vec<Vec<i32>>> = Vec::new();
    let err = from_bytes_with_config(&bytes, &mut target, config.clone()).unwrap_err();
    assert!(matches!(err.root(), BipfError::MaxDepthExceeded(2)));

    // Empty composites do not count.
    let bytes = to_bytes(&vec![vec![Vec::<i32>::new()]]).unwrap();
    from_bytes_with_config(&bytes, &mut target, config).unwrap();
    assert_eq!(target, vec![vec![Vec::<i32>::new()]]);
}

#[test]
fn composite_length_is_enforced() {
    // ARRAY declares 3 bytes but its INT child spans 5.
    let mut target: Vec<i32> = Vec::new();
    let err = from_bytes(&[0x1c, 0x22, 0x01, 0, 0, 0], &mut target).unwrap_err();
    assert!(matches!(err.root(), BipfError::OutOfBounds { .. }));
}

#[test]
fn maps_of_scalars() {
    let map = HashMap::from([
        ("a".to_string(), vec![1i32, 2]),
        ("b".to_string(), Vec::new()),
    ]);
    let bytes = to_bytes(&map).unwrap();

    let mut decoded: HashMap<String, Vec<i32>> = HashMap::new();
    from_bytes(&bytes, &mut decoded).unwrap();
    assert_eq!(decoded, map);

    let mut keyed: BTreeMap<bool, f64> = BTreeMap::new();
    from_bytes(&to_bytes(&BTreeMap::from([(true, 1.5f64)])).unwrap(), &mut keyed).unwrap();
    assert_eq!(keyed.get(&true), Some(&1.5));
}

#[test]
fn unsupported_key_type() {
    let map: BTreeMap<Vec<u16>, i32> = BTreeMap::new();
    let err = to_bytes(&map).unwrap_err();
    assert!(matches!(err, BipfError::UnsupportedKeyType(_)));
}

#[test]
fn dynamic_values_through_the_engine() {
    let value = Value::Object(vec![
        (Value::from("list"), Value::Array(vec![Value::Int(1), Value::Null])),
        (Value::Int(7), Value::from("int key")),
    ]);
    let bytes = to_bytes(&value).unwrap();
    assert_eq!(bytes, value.to_bytes().unwrap());

    let mut decoded = Value::Null;
    from_bytes(&bytes, &mut decoded).unwrap();
    assert_eq!(decoded, value);
}

#[test]
fn interface_targets() {
    let mut holder = Interface::new(String::new());
    from_bytes(&to_bytes(&"held".to_string()).unwrap(), &mut holder).unwrap();
    assert_eq!(holder.downcast_ref::<String>().map(String::as_str), Some("held"));
    assert_eq!(to_bytes(&holder).unwrap(), to_bytes(&"held".to_string()).unwrap());

    let mut nil = Interface::nil();
    let err = from_bytes(&to_bytes(&1i32).unwrap(), &mut nil).unwrap_err();
    assert!(matches!(err.root(), BipfError::CannotUnmarshalIntoNil(_)));

    from_bytes(&[0x06], &mut holder).unwrap();
    assert!(holder.is_nil());
}

#[test]
fn any_value_fields() {
    #[derive(bipf_codec::Reflect, Default, Debug)]
    struct Envelope {
        kind: String,
        body: AnyValue,
    }

    #[derive(bipf_codec::Reflect, Default, Debug, PartialEq)]
    struct Ping {
        seq: u32,
    }

    let sent = Envelope {
        kind: "ping".into(),
        body: AnyValue::new(Ping { seq: 9 }),
    };
    let bytes = to_bytes(&sent).unwrap();

    let mut generic = Envelope::default();
    from_bytes(&bytes, &mut generic).unwrap();
    assert_eq!(
        generic.body.as_value().and_then(|body| body.get("seq")),
        Some(&Value::Int(9))
    );

    let mut typed = Envelope {
        body: AnyValue::new(Ping::default()),
        ..Envelope::default()
    };
    from_bytes(&bytes, &mut typed).unwrap();
    assert_eq!(typed.kind, "ping");
    assert_eq!(typed.body.downcast_ref::<Ping>(), Some(&Ping { seq: 9 }));
}

#[test]
fn concurrent_first_use_converges() {
    #[derive(bipf_codec::Reflect, Default, Debug, PartialEq)]
    struct Racy {
        items: Vec<Option<String>>,
    }

    let handles: Vec<_> = (0..8)
        .map(|i| {
            std::thread::spawn(move || {
                let value = Racy {
                    items: vec![Some(i.to_string()), None],
                };
                let bytes = to_bytes(&value).unwrap();
                let mut decoded = Racy::default();
                from_bytes(&bytes, &mut decoded).unwrap();
                decoded == value
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
