// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use crate::builder::MessageBuilder;
use crate::decode::{DecodeError, Decoder};
use crate::schema::Schema;
use crate::types::TypeRegistry;
use crate::wire::BasicValue;

const IFACE: &str = "org.example.Calc";

fn add_call(a: i32, b: i32) -> Message {
    let registry = TypeRegistry::with_builtins();
    let msg = Message::method_call("/org/example/Calc", IFACE, "Add").unwrap();
    let mut builder = MessageBuilder::new(msg, &registry);
    builder.push(&a).unwrap().push(&b).unwrap();
    builder.end_message().unwrap()
}

/// Peer that answers `Add` with the sum and anything else with an error.
fn calculator(call: &Message) -> Option<Message> {
    let registry = TypeRegistry::with_builtins();
    let (mut a, mut b) = (0i32, 0i32);
    let mut schema = Schema::new().field(&mut a).field(&mut b);
    match Decoder::new(&registry).decode_method_call(call, IFACE, "Add", &mut schema) {
        Ok(()) => {
            drop(schema);
            let mut reply = Message::method_return(call);
            reply.append_args([BasicValue::Int32(a + b)]).ok()?;
            Some(reply)
        }
        Err(DecodeError::NotCalled) => Message::error(call, ERROR_UNKNOWN_METHOD, "unknown").ok(),
        Err(e) => Message::error(call, ERROR_INVALID_ARGS, &e.to_string()).ok(),
    }
}

#[test]
fn test_blocking_call() {
    let mut bus = LoopbackBus::new().with_handler(calculator);
    let reply = bus
        .send_with_reply_and_block(add_call(40, 2), Duration::from_secs(1))
        .unwrap();
    assert_eq!(reply.kind(), MessageKind::MethodReturn);
    assert_eq!(reply.reply_serial(), Some(1));
    assert_eq!(reply.destination(), Some(bus.unique_name()));
    assert_eq!(reply.values().unwrap()[0].as_i32(), Some(42));
}

#[test]
fn test_error_reply_becomes_bus_error() {
    let mut bus = LoopbackBus::new().with_handler(calculator);
    let call = Message::method_call("/org/example/Calc", IFACE, "Divide").unwrap();
    let err = bus
        .send_with_reply_and_block(call, Duration::from_secs(1))
        .unwrap_err();
    assert!(err.has_name(ERROR_UNKNOWN_METHOD));
    assert_eq!(err.message(), "unknown");

    let registry = TypeRegistry::with_builtins();
    let call = Message::method_call("/org/example/Calc", IFACE, "Add").unwrap();
    let mut builder = MessageBuilder::new(call, &registry);
    builder.push("forty").unwrap().push(&2i32).unwrap();
    let err = bus
        .send_with_reply_and_block(builder.end_message().unwrap(), Duration::from_secs(1))
        .unwrap_err();
    assert!(err.has_name(ERROR_INVALID_ARGS));
}

#[test]
fn test_no_handler_answers_unknown_method() {
    let mut bus = LoopbackBus::new();
    let err = bus
        .send_with_reply_and_block(add_call(1, 1), Duration::from_millis(10))
        .unwrap_err();
    assert_eq!(err.name(), ERROR_UNKNOWN_METHOD);
}

#[test]
fn test_unanswered_call_times_out() {
    let mut bus = LoopbackBus::new().with_handler(|_| None);
    let err = bus
        .send_with_reply_and_block(add_call(1, 1), Duration::from_millis(10))
        .unwrap_err();
    assert_eq!(err.name(), ERROR_TIMEOUT);
}

#[test]
fn test_pending_call() {
    let mut bus = LoopbackBus::new().with_handler(calculator);
    let pending = bus.send_with_reply(add_call(2, 3)).unwrap();
    assert!(!pending.is_completed());
    assert_eq!(bus.queued(), 1);

    bus.flush().unwrap();
    assert!(pending.is_completed());
    let reply = pending.steal_reply().unwrap();
    assert_eq!(reply.reply_serial(), Some(pending.serial()));
    assert!(pending.steal_reply().is_none());
    assert!(bus.pop_message().is_none());
}

#[test]
fn test_cancelled_call_discards_reply() {
    let mut bus = LoopbackBus::new().with_handler(calculator);
    let pending = bus.send_with_reply(add_call(2, 3)).unwrap();
    pending.cancel();
    bus.flush().unwrap();
    assert!(pending.is_cancelled());
    assert!(!pending.is_completed());
    assert!(bus.pop_message().is_none());
    assert_eq!(pending.block(&mut bus).unwrap_err().name(), ERROR_NO_REPLY);
}

#[test]
fn test_plain_send_routes_reply_to_inbox() {
    let mut bus = LoopbackBus::new().with_handler(calculator);
    let serial = bus.send(add_call(5, 5)).unwrap();
    bus.flush().unwrap();
    let reply = bus.pop_message().unwrap();
    assert_eq!(reply.reply_serial(), Some(serial));

    let mut quiet = add_call(1, 2);
    quiet.set_flags(crate::message::FLAG_NO_REPLY_EXPECTED);
    bus.send(quiet).unwrap();
    bus.flush().unwrap();
    assert!(bus.pop_message().is_none());
}

#[test]
fn test_signals_reach_the_inbox() {
    let mut bus = LoopbackBus::new();
    let signal = Message::signal("/org/example/Calc", IFACE, "Overflow").unwrap();
    let first = bus.send(signal.clone()).unwrap();
    let second = bus.send(signal).unwrap();
    assert_eq!(second, first + 1);
    bus.flush().unwrap();

    let got = bus.pop_message().unwrap();
    assert!(got.is_signal(IFACE, "Overflow"));
    assert_eq!(got.sender(), Some(":1.0"));
    assert!(bus.pop_message().is_some());
    assert!(bus.pop_message().is_none());

    let signal = Message::signal("/org/example/Calc", IFACE, "Overflow").unwrap();
    assert_eq!(
        bus.send_with_reply(signal).unwrap_err().name(),
        ERROR_FAILED
    );
}

#[test]
fn test_inject() {
    let mut bus = LoopbackBus::new();
    let mut msg = Message::signal("/", IFACE, "Reset").unwrap();
    msg.set_sender(":1.99").unwrap();
    bus.inject(msg).unwrap();
    let got = bus.pop_message().unwrap();
    assert_eq!(got.sender(), Some(":1.99"));
    assert_ne!(got.serial(), 0);
}

#[test]
fn test_bus_error_state() {
    let mut err = BusError::default();
    assert!(!err.is_set());

    err = BusError::new(ERROR_FAILED, "broken");
    assert!(err.is_set());
    assert!(err.has_name(ERROR_FAILED));
    assert_eq!(err.to_string(), "org.freedesktop.DBus.Error.Failed: broken");

    err.clear();
    assert!(!err.is_set());
    assert_eq!(err, BusError::default());

    let call = add_call(0, 0);
    assert!(BusError::from_reply(&call).is_none());
}
