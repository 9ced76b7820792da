// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Build and Decode Benchmark
//!
//! Measures the append builder commit, the schema-driven decoder and the
//! frame round trip for a typical property-change signal:
//! - `a{sv}` dictionary of mixed variants
//! - bulk `ay` payload (fixed-array fast path)
//! - array of registered structs

#![allow(clippy::cast_precision_loss)]

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use hdbus::{DBusStruct, Decoder, Limits, Message, MessageBuilder, OwnedVariant, Schema, TypeRegistry};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, DBusStruct)]
struct Track {
    id: u32,
    title: String,
    length: f64,
}

fn properties() -> HashMap<String, OwnedVariant> {
    let mut props = HashMap::new();
    props.insert("Volume".to_string(), OwnedVariant::new(0.75f64));
    props.insert("Muted".to_string(), OwnedVariant::new(hdbus::DBusBool(false)));
    props.insert("Name".to_string(), OwnedVariant::new("sink-0"));
    props.insert("Index".to_string(), OwnedVariant::new(12u32));
    props
}

fn tracks() -> Vec<Track> {
    (0..64)
        .map(|i| Track {
            id: i,
            title: format!("track {i}"),
            length: f64::from(i) * 3.5,
        })
        .collect()
}

fn build(registry: &TypeRegistry, props: &HashMap<String, OwnedVariant>, payload: &[u8], tracks: &[Track]) -> Message {
    let mut msg = Message::signal("/org/example/Player", "org.example.Player", "Changed").unwrap();
    msg.set_serial(1);
    let mut builder = MessageBuilder::new(msg, registry);
    builder
        .push(props)
        .unwrap()
        .push(payload)
        .unwrap()
        .push(tracks)
        .unwrap();
    builder.end_message().unwrap()
}

fn bench_build(c: &mut Criterion) {
    let mut registry = TypeRegistry::with_builtins();
    registry.register::<Track>().unwrap();
    let props = properties();
    let payload = vec![0xa5u8; 4096];
    let tracks = tracks();

    let mut group = c.benchmark_group("builder");
    group.throughput(Throughput::Bytes(build(&registry, &props, &payload, &tracks).body().len() as u64));
    group.bench_function("commit_mixed_body", |b| {
        b.iter(|| black_box(build(&registry, &props, &payload, &tracks)));
    });
    group.bench_function("commit_fixed_array_4k", |b| {
        b.iter(|| {
            let msg = Message::signal("/a", "org.example.A", "Blob").unwrap();
            let mut builder = MessageBuilder::new(msg, &registry);
            builder.push(black_box(payload.as_slice())).unwrap();
            black_box(builder.end_message().unwrap())
        });
    });
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut registry = TypeRegistry::with_builtins();
    registry.register::<Track>().unwrap();
    let msg = build(&registry, &properties(), &vec![0xa5u8; 4096], &tracks());
    let decoder = Decoder::new(&registry);

    let mut group = c.benchmark_group("decoder");
    group.throughput(Throughput::Bytes(msg.body().len() as u64));
    group.bench_function("schema_walk", |b| {
        b.iter(|| {
            let mut props: HashMap<String, OwnedVariant> = HashMap::new();
            let mut payload: Vec<u8> = Vec::new();
            let mut tracks: Vec<Track> = Vec::new();
            let mut schema = Schema::new().field(&mut props).field(&mut payload).field(&mut tracks);
            decoder.decode(black_box(&msg), &mut schema).unwrap();
            drop(schema);
            black_box((props, payload, tracks))
        });
    });
    group.bench_function("dynamic_values", |b| {
        b.iter(|| black_box(msg.values().unwrap()));
    });
    group.finish();
}

fn bench_frame(c: &mut Criterion) {
    let mut registry = TypeRegistry::with_builtins();
    registry.register::<Track>().unwrap();
    let msg = build(&registry, &properties(), &vec![0xa5u8; 4096], &tracks());
    let frame = msg.marshal().unwrap();
    let limits = Limits::default();

    let mut group = c.benchmark_group("frame");
    group.throughput(Throughput::Bytes(frame.len() as u64));
    group.bench_function("marshal", |b| {
        b.iter(|| black_box(msg.marshal().unwrap()));
    });
    group.bench_function("demarshal", |b| {
        b.iter(|| black_box(Message::demarshal(black_box(&frame), &limits).unwrap()));
    });
    group.finish();
}

criterion_group!(benches, bench_build, bench_decode, bench_frame);
criterion_main!(benches);
