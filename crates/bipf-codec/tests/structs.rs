use std::time::Duration;

use bipf_codec::{descriptor_of, from_bytes, to_bytes, BipfError, Reflect, Value};

fn object(pairs: &[(&str, Value)]) -> Vec<u8> {
    Value::Object(
        pairs
            .iter()
            .map(|(k, v)| (Value::from(*k), v.clone()))
            .collect(),
    )
    .to_bytes()
    .unwrap()
}

#[derive(Reflect, Default, Debug, PartialEq)]
struct Point {
    x: i32,
    y: i32,
}

#[test]
fn struct_layout_follows_declaration_order() {
    let bytes = to_bytes(&Point { x: 1, y: 2 }).unwrap();
    assert_eq!(hex::encode(&bytes), "750878220100000008792202000000");

    let mut decoded = Point::default();
    from_bytes(&bytes, &mut decoded).unwrap();
    assert_eq!(decoded, Point { x: 1, y: 2 });
}

#[test]
fn keys_match_exactly_then_case_insensitively() {
    let bytes = object(&[("X", Value::Int(5)), ("y", Value::Int(6))]);
    let mut decoded = Point::default();
    from_bytes(&bytes, &mut decoded).unwrap();
    assert_eq!(decoded, Point { x: 5, y: 6 });
}

#[derive(Reflect, Default, Debug)]
struct Cased {
    #[bipf(rename = "Name")]
    upper: String,
    #[bipf(rename = "name")]
    lower: String,
}

#[test]
fn exact_match_wins_over_folded_match() {
    let bytes = object(&[("name", Value::from("a")), ("NAME", Value::from("b"))]);
    let mut decoded = Cased::default();
    from_bytes(&bytes, &mut decoded).unwrap();
    assert_eq!(decoded.lower, "a");
    assert_eq!(decoded.upper, "b");
}

#[test]
fn unknown_keys_are_skipped() {
    let bytes = object(&[
        ("z", Value::Array(vec![Value::Int(1), Value::from("two")])),
        ("y", Value::Int(3)),
        ("extra", Value::Null),
    ]);
    let mut decoded = Point { x: 9, y: 0 };
    from_bytes(&bytes, &mut decoded).unwrap();
    assert_eq!(decoded, Point { x: 9, y: 3 });
}

#[test]
fn null_leaves_struct_unchanged() {
    let mut decoded = Point { x: 1, y: 2 };
    from_bytes(&[0x06], &mut decoded).unwrap();
    assert_eq!(decoded, Point { x: 1, y: 2 });
}

#[test]
fn field_errors_name_the_field() {
    let bytes = object(&[("x", Value::from("not a number"))]);
    let mut decoded = Point::default();
    let err = from_bytes(&bytes, &mut decoded).unwrap_err();
    assert!(matches!(err.root(), BipfError::TypeMismatch { .. }));
    assert!(err.is_annotated());
    assert!(err.to_string().starts_with("field 'x': type mismatch"));
}

#[derive(Reflect, Default, Debug, PartialEq)]
struct Sparse {
    #[bipf(omit_empty)]
    name: String,
    #[bipf(omit_empty)]
    tags: Vec<String>,
    #[bipf(omit_empty)]
    parent: Option<i32>,
    #[bipf(omit_empty)]
    flag: bool,
    count: u8,
}

#[test]
fn omit_empty_drops_empty_fields() {
    let bytes = to_bytes(&Sparse::default()).unwrap();
    assert_eq!(hex::encode(&bytes), "5d28636f756e742200000000");

    let full = Sparse {
        name: "n".into(),
        tags: vec!["t".into()],
        parent: Some(0),
        flag: true,
        count: 1,
    };
    let bytes = to_bytes(&full).unwrap();
    let value = Value::from_bytes(&bytes).unwrap();
    for key in ["name", "tags", "parent", "flag", "count"] {
        assert!(value.get(key).is_some(), "missing {key}");
    }

    let mut decoded = Sparse::default();
    from_bytes(&bytes, &mut decoded).unwrap();
    assert_eq!(decoded, full);
}

#[derive(Reflect, Default)]
struct WithSkip {
    id: i32,
    #[bipf(skip)]
    elapsed: Duration,
    #[bipf(rename = "-")]
    dash: bool,
}

#[test]
fn skip_and_literal_dash() {
    let descriptor = descriptor_of::<WithSkip>().unwrap();
    assert_eq!(descriptor.names().collect::<Vec<_>>(), ["id", "-"]);

    let value = WithSkip {
        id: 1,
        elapsed: Duration::from_secs(3),
        dash: true,
    };
    let decoded = Value::from_bytes(&to_bytes(&value).unwrap()).unwrap();
    assert_eq!(decoded.get("-"), Some(&Value::Bool(true)));
    assert_eq!(decoded.get("elapsed"), None);
}

#[derive(Reflect, Default)]
struct Named {
    name: String,
    id: i32,
}

#[derive(Reflect, Default)]
struct Label {
    name: String,
}

#[derive(Reflect, Default)]
struct Shadowing {
    #[bipf(flatten)]
    named: Named,
    #[bipf(flatten)]
    label: Label,
    id: i32,
}

#[test]
fn shallower_field_wins_and_ambiguous_fields_drop() {
    let descriptor = descriptor_of::<Shadowing>().unwrap();
    let names: Vec<_> = descriptor.names().collect();
    assert_eq!(names, ["id"]);
    assert_eq!(descriptor.find("id").unwrap().path(), &[2]);
}

#[derive(Reflect, Default)]
struct TaggedLabel {
    #[bipf(rename = "name")]
    text: String,
}

#[derive(Reflect, Default)]
struct TagWins {
    #[bipf(flatten)]
    label: Label,
    #[bipf(flatten)]
    tagged: TaggedLabel,
}

#[derive(Reflect, Default)]
struct TwoTagged {
    #[bipf(flatten)]
    first: TaggedLabel,
    #[bipf(flatten)]
    second: TaggedLabel,
}

#[test]
fn tagged_field_breaks_ties_at_equal_depth() {
    let descriptor = descriptor_of::<TagWins>().unwrap();
    let binding = descriptor.find("name").unwrap();
    assert_eq!(binding.path(), &[1, 0]);
    assert!(binding.is_tagged());

    let descriptor = descriptor_of::<TwoTagged>().unwrap();
    assert_eq!(descriptor.names().count(), 0);
    assert_eq!(to_bytes(&TwoTagged::default()).unwrap(), vec![0x05]);
}

#[derive(Reflect, Default, Debug, PartialEq)]
struct Meta {
    version: i32,
}

#[derive(Reflect, Default, Debug, PartialEq)]
struct Envelope {
    kind: String,
    #[bipf(flatten)]
    meta: Option<Box<Meta>>,
}

#[test]
fn flatten_through_optional_box() {
    let descriptor = descriptor_of::<Envelope>().unwrap();
    assert_eq!(descriptor.names().collect::<Vec<_>>(), ["kind", "version"]);

    let bare = Envelope {
        kind: "k".into(),
        meta: None,
    };
    let value = Value::from_bytes(&to_bytes(&bare).unwrap()).unwrap();
    assert_eq!(value.get("version"), None);

    let bytes = object(&[("kind", Value::from("k")), ("version", Value::Int(3))]);
    let mut decoded = Envelope::default();
    from_bytes(&bytes, &mut decoded).unwrap();
    assert_eq!(
        decoded,
        Envelope {
            kind: "k".into(),
            meta: Some(Box::new(Meta { version: 3 })),
        }
    );
}

#[derive(Reflect, Default)]
struct Renamed {
    #[bipf(flatten, rename = "meta")]
    inner: Meta,
}

#[test]
fn renamed_flatten_is_a_plain_field() {
    let descriptor = descriptor_of::<Renamed>().unwrap();
    assert_eq!(descriptor.names().collect::<Vec<_>>(), ["meta"]);
}

#[derive(Reflect, Default)]
struct Chain {
    value: i32,
    #[bipf(flatten)]
    next: Option<Box<Chain>>,
}

#[test]
fn recursive_flatten_is_not_expanded() {
    let descriptor = descriptor_of::<Chain>().unwrap();
    assert_eq!(descriptor.names().collect::<Vec<_>>(), ["value"]);
}

#[derive(Reflect, Default, Debug, PartialEq)]
struct Node {
    value: i32,
    children: Vec<Node>,
    next: Option<Box<Node>>,
}

#[test]
fn cyclic_types_round_trip() {
    let tree = Node {
        value: 1,
        children: vec![
            Node {
                value: 2,
                ..Node::default()
            },
            Node {
                value: 3,
                children: vec![Node {
                    value: 4,
                    ..Node::default()
                }],
                next: None,
            },
        ],
        next: Some(Box::new(Node {
            value: 5,
            ..Node::default()
        })),
    };

    let bytes = to_bytes(&tree).unwrap();
    let mut decoded = Node::default();
    from_bytes(&bytes, &mut decoded).unwrap();
    assert_eq!(decoded, tree);
}

#[derive(Reflect, Default)]
struct Unit;

#[test]
fn fieldless_struct_is_empty_object() {
    assert_eq!(to_bytes(&Unit).unwrap(), vec![0x05]);
    let mut target = Unit;
    from_bytes(&object(&[("a", Value::Int(1))]), &mut target).unwrap();
}
