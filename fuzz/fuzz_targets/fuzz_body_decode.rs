// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use hdbus::{Body, Decoder, Limits, OwnedVariant, Schema, Signature, TypeRegistry, Value};
use libfuzzer_sys::fuzz_target;
use std::collections::HashMap;

// First byte picks the body signature, the rest is the body
const SIGNATURES: [&str; 6] = ["a{sv}aay", "as", "a{sv}", "(isd)", "av", "aay"];

fuzz_target!(|data: &[u8]| {
    let Some((&pick, bytes)) = data.split_first() else {
        return;
    };
    let Ok(signature) = Signature::new(SIGNATURES[usize::from(pick) % SIGNATURES.len()]) else {
        return;
    };
    let body = Body::from_parts(bytes.to_vec(), signature);

    let _ = Value::read_body(&body);

    let registry = TypeRegistry::with_builtins();
    let limits = Limits::new().max_array_bytes(1 << 16);
    let decoder = Decoder::new(&registry).with_limits(limits);
    let mut map: HashMap<String, OwnedVariant> = HashMap::new();
    let mut nested: Vec<Vec<u8>> = Vec::new();
    let mut schema = Schema::new().field(&mut map).field(&mut nested);
    let _ = decoder.decode_body(&body, &mut schema);
});
