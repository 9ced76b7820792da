// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;

fn call() -> Message {
    Message::method_call("/org/example/Obj", "org.example.Iface", "Ping").unwrap()
}

#[test]
fn test_constructors() {
    let msg = call();
    assert_eq!(msg.kind(), MessageKind::MethodCall);
    assert_eq!(msg.path().map(ObjectPath::as_str), Some("/org/example/Obj"));
    assert_eq!(msg.interface(), Some("org.example.Iface"));
    assert_eq!(msg.member(), Some("Ping"));
    assert!(msg.is_method_call("org.example.Iface", "Ping"));
    assert!(!msg.is_signal("org.example.Iface", "Ping"));
    assert_eq!(msg.signature(), "");
    assert!(!msg.no_reply_expected());

    let sig = Message::signal("/", "org.example.Iface", "Changed").unwrap();
    assert!(sig.is_signal("org.example.Iface", "Changed"));
}

#[test]
fn test_replies_address_the_caller() {
    let mut msg = call();
    msg.set_serial(7);
    msg.set_sender(":1.5").unwrap();

    let ret = Message::method_return(&msg);
    assert_eq!(ret.kind(), MessageKind::MethodReturn);
    assert_eq!(ret.reply_serial(), Some(7));
    assert_eq!(ret.destination(), Some(":1.5"));
    assert!(ret.no_reply_expected());

    let err = Message::error(&msg, "org.example.Error.Busy", "try later").unwrap();
    assert_eq!(err.kind(), MessageKind::Error);
    assert_eq!(err.error_name(), Some("org.example.Error.Busy"));
    assert_eq!(err.signature(), "s");
    assert_eq!(err.values().unwrap()[0].as_str(), Some("try later"));
}

#[test]
fn test_name_validation() {
    assert!(matches!(
        Message::method_call("/a", "noDots", "M").unwrap_err(),
        WireError::InvalidName { kind: "interface name", .. }
    ));
    assert!(Message::method_call("/a", "org.1bad", "M").is_err());
    assert!(Message::method_call("/a", "org.example", "has.dot").is_err());
    assert!(Message::method_call("/a", "org.example", "9lives").is_err());
    assert!(Message::method_call("a/b", "org.example", "M").is_err());
    assert!(Message::error(&call(), "NoDots", "x").is_err());

    let mut msg = call();
    msg.set_destination("org.example-app.Service").unwrap();
    msg.set_sender(":1.42").unwrap();
    assert!(msg.set_destination("org..example").is_err());
    assert!(msg.set_sender("single").is_err());
    assert_eq!(msg.destination(), Some("org.example-app.Service"));
}

#[test]
fn test_append_args_and_array() {
    let mut msg = call();
    msg.append_args([BasicValue::Uint16(3), BasicValue::String("x".into())])
        .unwrap();
    msg.append_array(&FixedArray::Int64(vec![-1, 1])).unwrap();
    assert_eq!(msg.signature(), "qsax");
    assert_eq!(
        msg.body().bytes(),
        &[
            3, 0, 0, 0, 1, 0, 0, 0, b'x', 0, 0, 0, // q pad s
            16, 0, 0, 0, // array length
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 1, 0, 0, 0, 0, 0, 0, 0,
        ][..]
    );
}

#[test]
fn test_append_args_is_all_or_nothing() {
    let mut msg = call();
    let err = msg
        .append_args([BasicValue::Int32(1), BasicValue::String("a\0b".into())])
        .unwrap_err();
    assert_eq!(err, WireError::InteriorNul);
    assert!(msg.body().is_empty());
}

#[test]
fn test_body_writer() {
    let mut msg = call();
    {
        let mut writer = msg.writer();
        writer
            .open(WireType::Array, Some("i"))
            .unwrap()
            .append_basic(&BasicValue::Int32(5))
            .unwrap();
        assert_eq!(writer.depth(), 1);
        writer.close().unwrap();
        writer.finish().unwrap();
    }
    assert_eq!(msg.signature(), "ai");

    {
        let mut writer = msg.writer();
        writer.open(WireType::Struct, None).unwrap();
        writer.append_basic(&BasicValue::Byte(1)).unwrap();
        assert_eq!(
            writer.finish().unwrap_err(),
            WireError::IncompleteContainer(WireType::Struct)
        );
    }
    {
        let mut writer = msg.writer();
        writer.append_basic(&BasicValue::Byte(1)).unwrap();
    }
    assert_eq!(msg.signature(), "ai");
}

#[test]
fn test_frame_round_trip() {
    let mut msg = call();
    msg.set_serial(42);
    msg.set_flags(FLAG_NO_AUTO_START);
    msg.set_destination("org.example.Service").unwrap();
    msg.set_sender(":1.3").unwrap();
    msg.append_args([BasicValue::Int32(-3), BasicValue::String("hello".into())])
        .unwrap();

    let frame = msg.marshal().unwrap();
    assert_eq!(&frame[..4], &[b'l', 1, FLAG_NO_AUTO_START, PROTOCOL_VERSION]);
    assert_eq!(frame.len() % 8, msg.body().len() % 8);

    let back = Message::demarshal(&frame, &Limits::default()).unwrap();
    assert_eq!(back, msg);
}

#[test]
fn test_reply_frame_round_trip() {
    let mut msg = call();
    msg.set_serial(9);
    let mut err = Message::error(&msg, "org.example.Error.Failed", "boom").unwrap();
    err.set_serial(10);
    let back = Message::demarshal(&err.marshal().unwrap(), &Limits::default()).unwrap();
    assert_eq!(back.reply_serial(), Some(9));
    assert_eq!(back.error_name(), Some("org.example.Error.Failed"));
    assert_eq!(back.values().unwrap()[0].as_str(), Some("boom"));
}

#[test]
fn test_marshal_requires_serial() {
    assert_eq!(
        call().marshal().unwrap_err(),
        WireError::InvalidHeader("serial must be non-zero")
    );
}

#[test]
fn test_demarshal_rejects_bad_frames() {
    let mut msg = call();
    msg.set_serial(1);
    msg.append_args([BasicValue::Uint32(1)]).unwrap();
    let frame = msg.marshal().unwrap();
    let limits = Limits::default();

    let mut big_endian = frame.clone();
    big_endian[0] = b'B';
    assert_eq!(
        Message::demarshal(&big_endian, &limits).unwrap_err(),
        WireError::UnsupportedEndianness(b'B')
    );

    let mut trailing = frame.clone();
    trailing.push(0);
    assert_eq!(
        Message::demarshal(&trailing, &limits).unwrap_err(),
        WireError::InvalidHeader("trailing bytes after body")
    );

    let truncated = &frame[..frame.len() - 1];
    assert!(matches!(
        Message::demarshal(truncated, &limits).unwrap_err(),
        WireError::ReadFailed { .. }
    ));

    let mut zero_serial = frame.clone();
    zero_serial[8..12].copy_from_slice(&[0, 0, 0, 0]);
    assert_eq!(
        Message::demarshal(&zero_serial, &limits).unwrap_err(),
        WireError::InvalidHeader("serial must be non-zero")
    );

    let small = Limits::new().max_message_bytes(8);
    assert!(matches!(
        Message::demarshal(&frame, &small).unwrap_err(),
        WireError::MessageTooLong { .. }
    ));

    assert_eq!(
        Message::demarshal(&[], &limits).unwrap_err(),
        WireError::InvalidHeader("empty frame")
    );
}

#[test]
fn test_kind_codes() {
    for kind in [
        MessageKind::MethodCall,
        MessageKind::MethodReturn,
        MessageKind::Error,
        MessageKind::Signal,
    ] {
        assert_eq!(MessageKind::from_code(kind.code()), Some(kind));
    }
    assert_eq!(MessageKind::from_code(0), None);
    assert_eq!(MessageKind::Signal.to_string(), "signal");
}
