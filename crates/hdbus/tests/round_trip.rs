// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Build-then-decode round trips through a full marshal/demarshal of the
// frame. Each case pushes a value with the builder and decodes it with a
// schema of the identical shape.

#![allow(clippy::float_cmp)]

use hdbus::{
    DBusStruct, Decoder, Limits, Message, MessageBuilder, OwnedVariant, Schema, Schematic, TypeRegistry, Value,
};
use std::collections::{BTreeMap, HashMap};

fn registry() -> TypeRegistry {
    let mut registry = TypeRegistry::with_builtins();
    registry.register::<Sample>().unwrap();
    registry
}

fn round_trip(registry: &TypeRegistry, f: impl FnOnce(&mut MessageBuilder<'_>)) -> Message {
    let mut msg = Message::method_call("/org/example/Test", "org.example.Test", "Echo").unwrap();
    msg.set_serial(1);
    let mut builder = MessageBuilder::new(msg, registry);
    f(&mut builder);
    let msg = builder.end_message().unwrap();
    let frame = msg.marshal().unwrap();
    let back = Message::demarshal(&frame, &Limits::default()).unwrap();
    assert_eq!(back, msg);
    back
}

fn decode_one<T: Schematic + Default>(registry: &TypeRegistry, msg: &Message) -> T {
    let mut value = T::default();
    let mut schema = Schema::new().field(&mut value);
    Decoder::new(registry).decode(msg, &mut schema).unwrap();
    drop(schema);
    value
}

#[derive(Debug, Clone, Default, PartialEq, DBusStruct)]
struct Sample {
    id: i32,
    name: String,
    ratio: f64,
}

#[test]
fn test_single_integer() {
    let registry = registry();
    let msg = round_trip(&registry, |b| {
        b.push(&-17i32).unwrap();
    });
    assert_eq!(msg.signature(), "i");
    assert_eq!(decode_one::<i32>(&registry, &msg), -17);
}

#[test]
fn test_string() {
    let registry = registry();
    let msg = round_trip(&registry, |b| {
        b.push("grüße").unwrap();
    });
    assert_eq!(decode_one::<String>(&registry, &msg), "grüße");
}

#[test]
fn test_nested_struct() {
    let registry = registry();
    let sample = Sample {
        id: 3,
        name: "probe".into(),
        ratio: 0.25,
    };
    let msg = round_trip(&registry, |b| {
        b.push_registered(&sample).unwrap();
    });
    assert_eq!(msg.signature(), "(isd)");
    let decoded: Sample = Decoder::new(&registry).decode_as(&msg).unwrap();
    assert_eq!(decoded, sample);
}

#[test]
fn test_byte_array() {
    let registry = registry();
    let bytes: Vec<u8> = (0..=255).collect();
    let msg = round_trip(&registry, |b| {
        b.push(&bytes).unwrap();
    });
    assert_eq!(msg.signature(), "ay");
    assert_eq!(decode_one::<Vec<u8>>(&registry, &msg), bytes);
}

#[test]
fn test_string_to_int_dictionary() {
    let registry = registry();
    let mut map = HashMap::new();
    map.insert("one".to_string(), 1i32);
    map.insert("two".to_string(), 2);
    map.insert("three".to_string(), 3);
    let msg = round_trip(&registry, |b| {
        b.push(&map).unwrap();
    });
    assert_eq!(msg.signature(), "a{si}");
    assert_eq!(decode_one::<HashMap<String, i32>>(&registry, &msg), map);
}

#[test]
fn test_variant_holding_int32() {
    let registry = registry();
    let msg = round_trip(&registry, |b| {
        b.push(&OwnedVariant::new(99i32)).unwrap();
    });
    assert_eq!(msg.signature(), "v");

    let mut seen = 0i32;
    let mut schema = Schema::new().variant(|reader| reader.decode_into(&mut seen).is_ok());
    Decoder::new(&registry).decode(&msg, &mut schema).unwrap();
    drop(schema);
    assert_eq!(seen, 99);

    let variant: OwnedVariant = decode_one(&registry, &msg);
    assert_eq!(variant.value().as_i32(), Some(99));
}

#[test]
fn test_array_of_structs() {
    let registry = registry();
    let samples: Vec<Sample> = (0..5)
        .map(|i| Sample {
            id: i,
            name: format!("s{i}"),
            ratio: f64::from(i) / 2.0,
        })
        .collect();
    let msg = round_trip(&registry, |b| {
        b.push(&samples).unwrap();
    });
    assert_eq!(msg.signature(), "a(isd)");
    assert_eq!(decode_one::<Vec<Sample>>(&registry, &msg), samples);
}

#[test]
fn test_variant_holding_nested_dict() {
    let registry = registry();
    let mut inner = BTreeMap::new();
    inner.insert("x".to_string(), 1i32);
    let mut outer = BTreeMap::new();
    outer.insert("first".to_string(), inner.clone());
    inner.insert("y".to_string(), 2);
    outer.insert("second".to_string(), inner);

    let msg = round_trip(&registry, |b| {
        b.with_variant(|b| {
            b.push(&outer)?;
            Ok(())
        })
        .unwrap();
    });
    assert_eq!(msg.signature(), "v");

    let mut decoded: BTreeMap<String, BTreeMap<String, i32>> = BTreeMap::new();
    let mut inner_signature = String::new();
    let mut schema = Schema::new().variant(|reader| {
        inner_signature = reader.signature().to_string();
        reader.decode_into(&mut decoded).is_ok()
    });
    Decoder::new(&registry).decode(&msg, &mut schema).unwrap();
    drop(schema);
    assert_eq!(inner_signature, "a{sa{si}}");
    assert_eq!(decoded, outer);

    let values = msg.values().unwrap();
    let dict = values[0].unwrap_variant();
    assert_eq!(dict.get("second").and_then(|d| d.get("y")), Some(&Value::from(2i32)));
}

#[test]
fn test_mixed_arguments_with_empty_containers() {
    let registry = registry();
    let msg = round_trip(&registry, |b| {
        b.push(&7u64)
            .unwrap()
            .with_array_of("s", |_| Ok(()))
            .unwrap()
            .push(&HashMap::<u32, String>::new())
            .unwrap()
            .push(&(1u8, (2i16, 3u16)))
            .unwrap();
    });
    assert_eq!(msg.signature(), "tasa{us}(y(nq))");

    let mut big = 0u64;
    let mut names: Vec<String> = vec!["stale".into()];
    let mut map: HashMap<u32, String> = HashMap::new();
    let mut tuple = (0u8, (0i16, 0u16));
    let mut schema = Schema::new()
        .field(&mut big)
        .field(&mut names)
        .field(&mut map)
        .field(&mut tuple);
    Decoder::new(&registry).decode(&msg, &mut schema).unwrap();
    drop(schema);
    assert_eq!(big, 7);
    assert!(names.is_empty());
    assert!(map.is_empty());
    assert_eq!(tuple, (1, (2, 3)));
}

#[test]
fn test_loopback_round_trip() {
    use hdbus::{LoopbackBus, Transport};
    use std::time::Duration;

    let mut bus = LoopbackBus::new().with_handler(|call| {
        let registry = registry();
        let sample: Sample = Decoder::new(&registry).decode_as(call).ok()?;
        let mut builder = MessageBuilder::new(Message::method_return(call), &registry);
        builder.push(&sample.name.to_uppercase()).ok()?;
        builder.end_message().ok()
    });

    let registry = registry();
    let msg = Message::method_call("/org/example/Test", "org.example.Test", "Shout").unwrap();
    let mut builder = MessageBuilder::new(msg, &registry);
    builder
        .push_registered(&Sample {
            id: 1,
            name: "quiet".into(),
            ratio: 1.0,
        })
        .unwrap();
    let reply = bus
        .send_with_reply_and_block(builder.end_message().unwrap(), Duration::from_secs(1))
        .unwrap();
    assert_eq!(decode_one::<String>(&registry, &reply), "QUIET");
}
