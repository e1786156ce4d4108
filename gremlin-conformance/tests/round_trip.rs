use std::collections::BTreeMap;

use gremlin::{Message, MessageReader};
use gremlin_conformance::proto::common::{Address, Status};
use gremlin_conformance::proto::example::{self, user, AllScalars, Level1, Level2, Level3, Level4, Node, User};
use gremlin_conformance::proto::legacy::{Legacy, LegacyReader, Level};
use proptest::prelude::*;

fn round_trip<M: Message>(value: &M) -> M {
    let bytes = value.marshal();
    assert_eq!(bytes.len(), value.encoded_len());
    M::Reader::unmarshal(bytes.into())
        .and_then(|reader| reader.materialize())
        .unwrap()
}

fn full_user() -> User {
    User {
        id: 42,
        name: "Ada".to_string(),
        nickname: Some(String::new()),
        address: Some(Address {
            city: "London".to_string(),
            street: "Baker".to_string(),
            zip: 221,
        }),
        scores: vec![1, -2, 300_000],
        legacy_scores: vec![7, 8],
        tags: vec!["a".to_string(), String::new(), "c".to_string()],
        counters: BTreeMap::from([("x".to_string(), 1), ("y".to_string(), -1)]),
        addresses_by_id: BTreeMap::from([(
            5,
            Address {
                city: "Paris".to_string(),
                ..Default::default()
            },
        )]),
        status: Status::StatusSuspended.into(),
        contact: Some(user::Contact::Office(Address {
            zip: 75_001,
            ..Default::default()
        })),
        avatar: vec![0, 1, 2, 255],
        profile: Some(user::Profile {
            bio: "hi".to_string(),
            settings: Some(user::profile::Settings {
                dark_mode: true,
                theme: user::profile::settings::Theme::ThemeDark.into(),
            }),
        }),
    }
}

#[test]
fn test_user_round_trip() {
    let user = full_user();
    assert_eq!(round_trip(&user), user);
}

#[test]
fn test_empty_message_encodes_to_nothing() {
    let user = User::default();
    assert!(user.marshal().is_empty());
    assert_eq!(round_trip(&user), user);
}

#[test]
fn test_present_but_empty_optionals_survive() {
    let user = User {
        nickname: Some(String::new()),
        address: Some(Address::default()),
        contact: Some(user::Contact::Phone(0)),
        ..Default::default()
    };
    let decoded = round_trip(&user);
    assert_eq!(decoded, user);

    let reader = example::UserReader::unmarshal(user.marshal()).unwrap();
    assert!(reader.has_nickname());
    assert!(reader.has_address());
    assert!(reader.has_phone());
    assert_eq!(reader.which_contact(), Some(user::ContactCase::Phone));
}

#[test]
fn test_depth_four_chain_round_trip() {
    let chain = Level1 {
        value: 1,
        next: Some(Level2 {
            value: 2,
            next: Some(Level3 {
                value: 3,
                next: Some(Level4 {
                    value: 4,
                    leaf: "leaf".to_string(),
                }),
            }),
        }),
    };
    assert_eq!(round_trip(&chain), chain);
}

#[test]
fn test_recursive_node_round_trip() {
    let node = Node {
        value: 1,
        next: Some(Box::new(Node {
            value: 2,
            next: Some(Box::new(Node {
                value: 3,
                ..Default::default()
            })),
            children: vec![Node {
                value: 20,
                ..Default::default()
            }],
        })),
        children: vec![Node::default(), Node {
            value: -10,
            ..Default::default()
        }],
    };
    assert_eq!(round_trip(&node), node);

    let reader = example::NodeReader::unmarshal(node.marshal()).unwrap();
    assert_eq!(reader.get_next().unwrap().get_next().unwrap().get_value().unwrap(), 3);
    assert_eq!(reader.get_children().unwrap()[1].get_value().unwrap(), -10);
}

#[test]
fn test_proto2_defaults_and_presence() {
    let reader = LegacyReader::unmarshal(Legacy::default().marshal()).unwrap();
    // Required fields are always written, optional ones only when set.
    assert!(reader.has_id());
    assert!(!reader.has_name());
    assert_eq!(reader.get_name().unwrap(), "anon");
    assert_eq!(reader.get_retries().unwrap(), 3);
    assert_eq!(reader.get_level().unwrap(), i32::from(Level::LevelHigh));
    assert_eq!(reader.get_ratio().unwrap(), -1.5);
    assert_eq!(reader.get_plain().unwrap(), 0);

    let legacy = reader.materialize().unwrap();
    assert_eq!(legacy.name, None);
    assert_eq!(legacy.level, None);
}

#[test]
fn test_proto2_explicit_default_values_are_written() {
    let legacy = Legacy {
        id: 9,
        name: Some("anon".to_string()),
        retries: Some(0),
        values: vec![1, 2, 3],
        raw: vec![4, 5],
        ..Default::default()
    };
    let reader = LegacyReader::unmarshal(legacy.marshal()).unwrap();
    assert!(reader.has_name());
    assert!(reader.has_retries());
    assert_eq!(reader.get_retries().unwrap(), 0);
    assert_eq!(reader.get_values().unwrap(), [1, 2, 3]);
    assert_eq!(reader.materialize().unwrap(), legacy);
}

fn finite_f64() -> impl Strategy<Value = f64> {
    prop::num::f64::NORMAL | prop::num::f64::ZERO | prop::num::f64::SUBNORMAL
}

fn finite_f32() -> impl Strategy<Value = f32> {
    prop::num::f32::NORMAL | prop::num::f32::ZERO | prop::num::f32::SUBNORMAL
}

prop_compose! {
    fn all_scalars()(
        numbers in (finite_f64(), finite_f32(), any::<i32>(), any::<i64>(), any::<u32>(), any::<u64>()),
        zigzag in (any::<i32>(), any::<i64>()),
        fixed in (any::<u32>(), any::<u64>(), any::<i32>(), any::<i64>()),
        f_bool in any::<bool>(),
        f_string in ".{0,16}",
        f_bytes in prop::collection::vec(any::<u8>(), 0..16),
        r_sint64 in prop::collection::vec(any::<i64>(), 0..8),
        r_fixed32 in prop::collection::vec(any::<u32>(), 0..8),
        r_double in prop::collection::vec(finite_f64(), 0..8),
        r_bool in prop::collection::vec(any::<bool>(), 0..8),
        r_bytes in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..4), 0..4),
    ) -> AllScalars {
        let (f_double, f_float, f_int32, f_int64, f_uint32, f_uint64) = numbers;
        let (f_sint32, f_sint64) = zigzag;
        let (f_fixed32, f_fixed64, f_sfixed32, f_sfixed64) = fixed;
        AllScalars {
            f_double,
            f_float,
            f_int32,
            f_int64,
            f_uint32,
            f_uint64,
            f_sint32,
            f_sint64,
            f_fixed32,
            f_fixed64,
            f_sfixed32,
            f_sfixed64,
            f_bool,
            f_string,
            f_bytes,
            r_sint64,
            r_fixed32,
            r_double,
            r_bool,
            r_bytes,
        }
    }
}

proptest! {
    #[test]
    fn proptest_all_scalars_round_trip(value in all_scalars()) {
        prop_assert_eq!(round_trip(&value), value);
    }
}
