// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;

fn write_is(body: &mut Body) {
    let mut root = AppendCursor::root();
    root.append_basic(body, &BasicValue::Int32(42)).unwrap();
    root.append_basic(body, &BasicValue::String("hi".into()))
        .unwrap();
}

#[test]
fn test_signature_validation() {
    assert!(Signature::new("").is_ok());
    assert!(Signature::new("is").is_ok());
    assert!(Signature::new("a{sv}").is_ok());
    assert!(Signature::new("(ia(sd))").is_ok());
    assert!(Signature::new("aai").is_ok());

    assert!(Signature::new("a").is_err());
    assert!(Signature::new("()").is_err());
    assert!(Signature::new("(i").is_err());
    assert!(Signature::new("{sv}").is_err());
    assert!(Signature::new("a{vs}").is_err());
    assert!(Signature::new("a{sii}").is_err());
    assert!(Signature::new("z").is_err());
    assert!(Signature::new("i)").is_err());
}

#[test]
fn test_signature_nesting_limits() {
    let deep_ok = format!("{}i", "a".repeat(MAX_ARRAY_NESTING));
    assert!(Signature::new(deep_ok).is_ok());
    let too_deep = format!("{}i", "a".repeat(MAX_ARRAY_NESTING + 1));
    assert!(Signature::new(too_deep).is_err());

    let too_long = "i".repeat(MAX_SIGNATURE_LEN + 1);
    assert!(Signature::new(too_long).is_err());
}

#[test]
fn test_complete_types_iteration() {
    let sig = Signature::new("ia{sv}(id)s").unwrap();
    let parts: Vec<&str> = sig.complete_types().collect();
    assert_eq!(parts, vec!["i", "a{sv}", "(id)", "s"]);
    assert!(!sig.is_single_complete_type());
    assert!(Signature::new("a(ii)").unwrap().is_single_complete_type());
}

#[test]
fn test_element_type_len_admits_dict_entries() {
    use super::signature::{complete_type_len, element_type_len};

    assert_eq!(element_type_len(b"{si}", 0, true).unwrap(), 4);
    assert_eq!(element_type_len(b"{sa{sv}}", 0, true).unwrap(), 8);
    assert!(element_type_len(b"{si}", 0, false).is_err());
    assert!(complete_type_len(b"{si}", 0).is_err());
    assert_eq!(element_type_len(b"(is)", 0, true).unwrap(), 4);
}

#[test]
fn test_dict_entry_mismatch_inside_array() {
    let mut body = Body::new();
    let mut root = AppendCursor::root();
    let mut dict = root
        .open_container(&mut body, WireType::Array, Some("{si}"))
        .unwrap();
    assert!(matches!(
        dict.open_container(&mut body, WireType::Struct, None),
        Err(WireError::SignatureMismatch { .. })
    ));
    let mut entry = dict
        .open_container(&mut body, WireType::DictEntry, None)
        .unwrap();
    assert!(entry.append_basic(&mut body, &BasicValue::Int32(1)).is_err());
}

#[test]
fn test_append_basic_layout() {
    let mut body = Body::new();
    write_is(&mut body);

    assert_eq!(body.signature(), "is");
    assert_eq!(
        body.bytes(),
        &[0x2a, 0, 0, 0, 2, 0, 0, 0, b'h', b'i', 0][..]
    );
}

#[test]
fn test_append_alignment_padding() {
    let mut body = Body::new();
    let mut root = AppendCursor::root();
    root.append_basic(&mut body, &BasicValue::Byte(7)).unwrap();
    root.append_basic(&mut body, &BasicValue::Int64(-1)).unwrap();

    assert_eq!(body.signature(), "yx");
    assert_eq!(body.len(), 16);
    assert_eq!(&body.bytes()[1..8], &[0; 7]);
    assert_eq!(&body.bytes()[8..], &[0xff; 8]);
}

#[test]
fn test_array_length_excludes_element_padding() {
    let mut body = Body::new();
    let mut root = AppendCursor::root();
    let mut array = root
        .open_container(&mut body, WireType::Array, Some("x"))
        .unwrap();
    array.append_basic(&mut body, &BasicValue::Int64(5)).unwrap();
    root.close_container(&mut body, array).unwrap();

    assert_eq!(body.signature(), "ax");
    // length word, 4 bytes of padding to 8, one int64
    assert_eq!(body.len(), 16);
    assert_eq!(&body.bytes()[0..4], &8u32.to_le_bytes());
}

#[test]
fn test_empty_array_still_pads() {
    let mut body = Body::new();
    let mut root = AppendCursor::root();
    let array = root
        .open_container(&mut body, WireType::Array, Some("(ii)"))
        .unwrap();
    root.close_container(&mut body, array).unwrap();

    assert_eq!(body.signature(), "a(ii)");
    assert_eq!(body.bytes(), &[0; 8][..]);
}

#[test]
fn test_array_rejects_wrong_element() {
    let mut body = Body::new();
    let mut root = AppendCursor::root();
    let mut array = root
        .open_container(&mut body, WireType::Array, Some("i"))
        .unwrap();
    let err = array
        .append_basic(&mut body, &BasicValue::String("x".into()))
        .unwrap_err();
    assert!(matches!(err, WireError::SignatureMismatch { .. }));
}

#[test]
fn test_struct_grows_root_signature() {
    let mut body = Body::new();
    let mut root = AppendCursor::root();
    let mut st = root
        .open_container(&mut body, WireType::Struct, None)
        .unwrap();
    st.append_basic(&mut body, &BasicValue::Int32(1)).unwrap();
    st.append_basic(&mut body, &BasicValue::Double(2.0)).unwrap();
    root.close_container(&mut body, st).unwrap();

    assert_eq!(body.signature(), "(id)");
    assert_eq!(body.len(), 16);
}

#[test]
fn test_empty_struct_rejected() {
    let mut body = Body::new();
    let mut root = AppendCursor::root();
    let st = root
        .open_container(&mut body, WireType::Struct, None)
        .unwrap();
    let err = root.close_container(&mut body, st).unwrap_err();
    assert_eq!(err, WireError::IncompleteContainer(WireType::Struct));
}

#[test]
fn test_inner_signature_rules() {
    let mut body = Body::new();
    let mut root = AppendCursor::root();
    assert_eq!(
        root.open_container(&mut body, WireType::Struct, Some("i"))
            .unwrap_err(),
        WireError::UnexpectedInnerSignature(WireType::Struct)
    );
    assert_eq!(
        root.open_container(&mut body, WireType::Array, None)
            .unwrap_err(),
        WireError::MissingInnerSignature(WireType::Array)
    );
    assert!(root
        .open_container(&mut body, WireType::Variant, Some("ii"))
        .is_err());
    assert!(root
        .open_container(&mut body, WireType::DictEntry, None)
        .is_err());
    assert!(root
        .open_container(&mut body, WireType::Int32, None)
        .is_err());
}

#[test]
fn test_variant_layout() {
    let mut body = Body::new();
    let mut root = AppendCursor::root();
    let mut variant = root
        .open_container(&mut body, WireType::Variant, Some("i"))
        .unwrap();
    variant
        .append_basic(&mut body, &BasicValue::Int32(42))
        .unwrap();
    root.close_container(&mut body, variant).unwrap();

    assert_eq!(body.signature(), "v");
    assert_eq!(
        body.bytes(),
        &[1, b'i', 0, 0, 0x2a, 0, 0, 0][..]
    );
}

#[test]
fn test_variant_left_empty_is_incomplete() {
    let mut body = Body::new();
    let mut root = AppendCursor::root();
    let variant = root
        .open_container(&mut body, WireType::Variant, Some("s"))
        .unwrap();
    assert_eq!(
        root.close_container(&mut body, variant).unwrap_err(),
        WireError::IncompleteContainer(WireType::Variant)
    );
}

#[test]
fn test_dict_writes_and_reads() {
    let mut body = Body::new();
    let mut root = AppendCursor::root();
    let mut dict = root
        .open_container(&mut body, WireType::Array, Some("{si}"))
        .unwrap();
    for (k, v) in [("a", 1), ("b", 2)] {
        let mut entry = dict
            .open_container(&mut body, WireType::DictEntry, None)
            .unwrap();
        entry
            .append_basic(&mut body, &BasicValue::String(k.into()))
            .unwrap();
        entry.append_basic(&mut body, &BasicValue::Int32(v)).unwrap();
        dict.close_container(&mut body, entry).unwrap();
    }
    root.close_container(&mut body, dict).unwrap();
    assert_eq!(body.signature(), "a{si}");

    let root = ReadCursor::root(body.bytes(), body.signature());
    assert_eq!(root.arg_type(), WireType::Array);
    assert_eq!(root.element_type(), WireType::DictEntry);
    assert_eq!(root.element_count().unwrap(), 2);

    let mut entries = root.recurse().unwrap();
    let mut seen = Vec::new();
    while entries.arg_type() == WireType::DictEntry {
        let mut entry = entries.recurse().unwrap();
        let key = entry.read_basic().unwrap();
        entry.next().unwrap();
        let value = entry.read_basic().unwrap();
        seen.push((key, value));
        entries.next().unwrap();
    }
    assert_eq!(
        seen,
        vec![
            (BasicValue::String("a".into()), BasicValue::Int32(1)),
            (BasicValue::String("b".into()), BasicValue::Int32(2)),
        ]
    );
}

#[test]
fn test_fixed_array_bulk() {
    let mut body = Body::new();
    let mut root = AppendCursor::root();
    let mut array = root
        .open_container(&mut body, WireType::Array, Some("q"))
        .unwrap();
    array
        .append_fixed_array(&mut body, &FixedArray::Uint16(vec![1, 2, 3]))
        .unwrap();
    root.close_container(&mut body, array).unwrap();
    assert_eq!(body.signature(), "aq");

    let root = ReadCursor::root(body.bytes(), body.signature());
    assert_eq!(root.element_count().unwrap(), 3);
    let mut child = root.recurse().unwrap();
    assert_eq!(
        child.read_fixed_array().unwrap(),
        FixedArray::Uint16(vec![1, 2, 3])
    );
    assert_eq!(child.arg_type(), WireType::Invalid);
}

#[test]
fn test_fixed_array_wrong_element() {
    let mut body = Body::new();
    let mut root = AppendCursor::root();
    let mut array = root
        .open_container(&mut body, WireType::Array, Some("i"))
        .unwrap();
    assert!(array
        .append_fixed_array(&mut body, &FixedArray::Byte(vec![1]))
        .is_err());
}

#[test]
fn test_read_cursor_walks_top_level() {
    let mut body = Body::new();
    write_is(&mut body);

    let mut cursor = ReadCursor::root(body.bytes(), body.signature());
    assert_eq!(cursor.arg_type(), WireType::Int32);
    assert_eq!(cursor.read_basic().unwrap(), BasicValue::Int32(42));
    assert!(cursor.next().unwrap());
    assert_eq!(cursor.signature(), "s");
    assert_eq!(
        cursor.read_basic().unwrap(),
        BasicValue::String("hi".into())
    );
    assert!(!cursor.next().unwrap());
    assert_eq!(cursor.arg_type(), WireType::Invalid);
    assert!(!cursor.next().unwrap());
}

#[test]
fn test_read_rejects_invalid_boolean() {
    let bytes = 2u32.to_le_bytes();
    let cursor = ReadCursor::root(&bytes, "b");
    assert_eq!(
        cursor.read_basic().unwrap_err(),
        WireError::InvalidBoolean(2)
    );
}

#[test]
fn test_read_rejects_nonzero_padding() {
    // byte then int32 with garbage in the padding
    let bytes = [1u8, 0xaa, 0, 0, 5, 0, 0, 0];
    let mut cursor = ReadCursor::root(&bytes, "yi");
    assert!(cursor.next().unwrap());
    assert!(matches!(
        cursor.read_basic(),
        Err(WireError::ReadFailed { .. })
    ));
}

#[test]
fn test_read_rejects_truncated_string() {
    let bytes = [10u8, 0, 0, 0, b'a', b'b'];
    let cursor = ReadCursor::root(&bytes, "s");
    assert!(matches!(
        cursor.read_basic(),
        Err(WireError::ReadFailed { .. })
    ));
}

#[test]
fn test_read_rejects_bad_utf8() {
    let bytes = [2u8, 0, 0, 0, 0xff, 0xfe, 0];
    let cursor = ReadCursor::root(&bytes, "s");
    assert_eq!(cursor.read_basic().unwrap_err(), WireError::InvalidUtf8);
}

#[test]
fn test_interior_nul_rejected_on_append() {
    let mut body = Body::new();
    let mut root = AppendCursor::root();
    assert_eq!(
        root.append_basic(&mut body, &BasicValue::String("a\0b".into()))
            .unwrap_err(),
        WireError::InteriorNul
    );
    assert!(body.is_empty());
    assert_eq!(body.signature(), "");
}

#[test]
fn test_array_length_overrun_rejected() {
    // declared length 100, only 4 bytes of content
    let bytes = [100u8, 0, 0, 0, 1, 0, 0, 0];
    let cursor = ReadCursor::root(&bytes, "ai");
    assert!(cursor.recurse().is_err());
}

#[test]
fn test_array_limit_enforced_on_read() {
    let mut body = Body::new();
    let mut root = AppendCursor::root();
    let mut array = root
        .open_container(&mut body, WireType::Array, Some("y"))
        .unwrap();
    array
        .append_fixed_array(&mut body, &FixedArray::Byte(vec![0; 16]))
        .unwrap();
    root.close_container(&mut body, array).unwrap();

    let cursor = ReadCursor::root(body.bytes(), body.signature()).with_array_limit(8);
    assert_eq!(
        cursor.recurse().unwrap_err(),
        WireError::ArrayTooLong { len: 16, limit: 8 }
    );
}

#[test]
fn test_variant_read_back() {
    let mut body = Body::new();
    let mut root = AppendCursor::root();
    let mut variant = root
        .open_container(&mut body, WireType::Variant, Some("(sd)"))
        .unwrap();
    let mut st = variant
        .open_container(&mut body, WireType::Struct, None)
        .unwrap();
    st.append_basic(&mut body, &BasicValue::String("pi".into()))
        .unwrap();
    st.append_basic(&mut body, &BasicValue::Double(3.5)).unwrap();
    variant.close_container(&mut body, st).unwrap();
    root.close_container(&mut body, variant).unwrap();

    let root = ReadCursor::root(body.bytes(), body.signature());
    assert_eq!(root.arg_type(), WireType::Variant);
    let inner = root.recurse().unwrap();
    assert_eq!(inner.signature(), "(sd)");
    let mut fields = inner.recurse().unwrap();
    assert_eq!(
        fields.read_basic().unwrap(),
        BasicValue::String("pi".into())
    );
    fields.next().unwrap();
    assert_eq!(fields.read_basic().unwrap(), BasicValue::Double(3.5));
}

#[test]
fn test_wire_type_codes() {
    for code in b"ybnqiuxtdsogav" {
        let ty = WireType::from_code(*code).unwrap();
        assert_eq!(ty.code(), *code);
    }
    assert_eq!(WireType::from_code(b'r'), Some(WireType::Struct));
    assert_eq!(WireType::from_code(b'e'), Some(WireType::DictEntry));
    assert_eq!(WireType::from_code(b'z'), None);
    assert!(WireType::Boolean.is_fixed());
    assert!(!WireType::String.is_fixed());
    assert_eq!(WireType::DictEntry.alignment(), 8);
}
