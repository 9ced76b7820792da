// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # hdbus - typed D-Bus message building and parsing
//!
//! Builds D-Bus message bodies from typed pushes and decodes them against
//! statically declared schemas, independent of any connection library.
//!
//! ## Quick Start
//!
//! ```rust
//! use hdbus::{DBusStruct, Decoder, Message, MessageBuilder, TypeRegistry};
//!
//! #[derive(DBusStruct, Debug, Default, PartialEq)]
//! struct Reading {
//!     sensor: String,
//!     value: f64,
//!     samples: Vec<u16>,
//! }
//!
//! let mut registry = TypeRegistry::with_builtins();
//! registry.register::<Reading>().unwrap();
//!
//! let reading = Reading { sensor: "t0".into(), value: 21.5, samples: vec![1, 2, 3] };
//! let msg = Message::signal("/org/example/Sensor", "org.example.Sensor", "Sample").unwrap();
//! let mut builder = MessageBuilder::new(msg, &registry);
//! builder.push_registered(&reading).unwrap();
//! let msg = builder.end_message().unwrap();
//! assert_eq!(msg.signature(), "(sdaq)");
//!
//! let decoded: Reading = Decoder::new(&registry).decode_as(&msg).unwrap();
//! assert_eq!(decoded, reading);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------+
//! |  MessageBuilder (append IR)      Decoder (schema walk)        |
//! +---------------------------------------------------------------+
//! |  TypeRegistry | Schema / Slot | Value                         |
//! +---------------------------------------------------------------+
//! |  IteratorStack -> ContainerIterator                           |
//! +---------------------------------------------------------------+
//! |  wire: AppendCursor / ReadCursor over a Body                  |
//! +---------------------------------------------------------------+
//! |  message framing | bus::Transport boundary                    |
//! +---------------------------------------------------------------+
//! ```
//!
//! ## Modules Overview
//!
//! - [`builder`] - signature-accumulating append builder
//! - [`decode`] - schema-driven decoder
//! - [`schema`] - schema descriptors
//! - [`types`] - static bindings and the type registry
//! - [`iter`] - container iterators
//! - [`wire`] - marshalling primitives
//! - [`message`] - messages and their frame format
//! - [`bus`] - transport boundary and the loopback transport
//! - [`config`] - resource limits

// Allow the derive macro to work inside this crate's tests
extern crate self as hdbus;

/// Transport trait, bus errors, pending calls and the loopback transport.
pub mod bus;
/// Append builder and its node tree.
pub mod builder;
/// Resource limits and their loading.
pub mod config;
/// Schema-driven decoder.
pub mod decode;
/// Container iterators over a message body.
pub mod iter;
/// Messages and frame marshalling.
pub mod message;
/// Schema descriptors.
pub mod schema;
/// Static type bindings and the type registry.
pub mod types;
/// Dynamic values.
pub mod value;
/// Wire format primitives.
pub mod wire;

pub use builder::{AppendNode, BuildError, BuildResult, MessageBuilder, NodeKind};
pub use bus::{BusError, LoopbackBus, PendingCall, Transport};
pub use config::{ConfigError, Limits};
pub use decode::{DecodeError, DecodeResult, Decoder, VariantReader};
pub use iter::{ContainerIterator, IteratorStack, Mode};
pub use message::{BodyWriter, Message, MessageKind};
pub use schema::{ArraySink, BasicSlot, DictSink, Schema, Schematic, Slot, VariantSlot};
pub use types::{
    Aggregate, AggregateKind, Append, Basic, DBusBool, DBusType, RegistryError, TypeEntry, TypeKey, TypeRegistry,
};
pub use value::{OwnedVariant, Value};
pub use wire::{BasicValue, Body, FixedArray, ObjectPath, Signature, WireError, WireResult, WireType};

// Derive macro (for #[derive(hdbus::DBusStruct)])
pub use hdbus_codegen::DBusStruct;

/// hdbus version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
