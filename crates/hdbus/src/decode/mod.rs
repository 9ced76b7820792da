// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema-driven decoder.
//!
//! The [`Decoder`] walks a message body in lock-step with a [`Schema`],
//! checking each wire value against its slot and storing it in the caller's
//! destination. The first mismatch aborts the walk.
//!
//! # Example
//!
//! ```
//! use hdbus::{Decoder, Message, MessageBuilder, Schema, TypeRegistry};
//!
//! let registry = TypeRegistry::with_builtins();
//! let msg = Message::method_call("/org/example", "org.example.Calc", "Add").unwrap();
//! let mut builder = MessageBuilder::new(msg, &registry);
//! builder.push(&40i32).unwrap().push(&2i32).unwrap();
//! let msg = builder.end_message().unwrap();
//!
//! let (mut a, mut b) = (0i32, 0i32);
//! let mut schema = Schema::new().field(&mut a).field(&mut b);
//! Decoder::new(&registry)
//!     .decode_method_call(&msg, "org.example.Calc", "Add", &mut schema)
//!     .unwrap();
//! drop(schema);
//! assert_eq!(a + b, 42);
//! ```

mod errors;
mod walk;

pub use errors::{DecodeError, DecodeResult};

use crate::config::Limits;
use crate::iter::IteratorStack;
use crate::message::Message;
use crate::schema::{Schema, Schematic, Slot};
use crate::types::{Aggregate, TypeKey, TypeRegistry};
use crate::value::Value;
use crate::wire::{BasicValue, Body, WireType};

/// Decodes message bodies against schemas.
///
/// A decoder holds no walk state between calls; each call owns a fresh
/// iterator stack. Not meant to be shared across threads mid-call.
#[derive(Debug, Clone, Copy)]
pub struct Decoder<'r> {
    registry: &'r TypeRegistry,
    limits: Limits,
}

impl<'r> Decoder<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            limits: Limits::default(),
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn registry(&self) -> &'r TypeRegistry {
        self.registry
    }

    /// Decode the body of `message` into `schema`.
    pub fn decode(&self, message: &Message, schema: &mut Schema<'_>) -> DecodeResult<()> {
        self.decode_body(message.body(), schema)
    }

    /// Decode a raw body into `schema`.
    pub fn decode_body(&self, body: &Body, schema: &mut Schema<'_>) -> DecodeResult<()> {
        self.walk_body(body, &mut schema.slots)
    }

    fn walk_body(&self, body: &Body, slots: &mut [Slot<'_>]) -> DecodeResult<()> {
        log::debug!(
            "[hdbus::decode] body {:?} ({} bytes) against {} slots",
            body.signature(),
            body.len(),
            slots.len()
        );
        let mut stack = IteratorStack::with_array_limit(self.limits.max_array_bytes);
        stack.open_root_read(body);
        let result = walk::walk(slots, &mut stack, &self.limits);
        stack.finish_read();
        if let Err(e) = &result {
            log::debug!("[hdbus::decode] failed: {}", e);
        }
        result
    }

    /// Decode only if `message` is a call to `interface.member`; otherwise
    /// [`DecodeError::NotCalled`].
    pub fn decode_method_call(
        &self,
        message: &Message,
        interface: &str,
        member: &str,
        schema: &mut Schema<'_>,
    ) -> DecodeResult<()> {
        if !message.is_method_call(interface, member) {
            return Err(DecodeError::NotCalled);
        }
        self.decode(message, schema)
    }

    fn check_registered<T: Aggregate>(&self) -> DecodeResult<()> {
        let key = TypeKey::of::<T>();
        self.registry
            .lookup(&key)
            .map(|_| ())
            .map_err(|_| DecodeError::UnknownType(key.name()))
    }

    /// Decode a body holding one registered aggregate.
    pub fn decode_as<T: Aggregate>(&self, message: &Message) -> DecodeResult<T> {
        self.check_registered::<T>()?;
        let mut value = T::default();
        self.walk_body(message.body(), &mut [value.slot()])?;
        Ok(value)
    }

    /// Decode the arguments of `message` as the members of a registered
    /// aggregate, in order.
    pub fn decode_args_as<T: Aggregate>(&self, message: &Message) -> DecodeResult<T> {
        self.check_registered::<T>()?;
        let mut value = T::default();
        match value.slot() {
            Slot::Struct(mut schema) => self.walk_body(message.body(), &mut schema.slots)?,
            other => self.walk_body(message.body(), &mut [other])?,
        }
        Ok(value)
    }
}

/// Access to a variant's content from inside a variant slot callback.
pub struct VariantReader<'s, 'm> {
    stack: &'s mut IteratorStack<'m>,
    limits: Limits,
    error: Option<DecodeError>,
}

impl<'s, 'm> VariantReader<'s, 'm> {
    pub(crate) fn new(stack: &'s mut IteratorStack<'m>, limits: Limits) -> Self {
        Self {
            stack,
            limits,
            error: None,
        }
    }

    fn record<T>(&mut self, result: DecodeResult<T>) -> DecodeResult<T> {
        if let Err(e) = &result {
            self.error = Some(e.clone());
        }
        result
    }

    /// Signature of the contained value.
    pub fn signature(&self) -> &str {
        self.stack.top().map_or("", |it| it.signature())
    }

    /// Type of the contained value.
    pub fn arg_type(&self) -> WireType {
        self.stack
            .top()
            .map_or(WireType::Invalid, |it| it.current_arg_type())
    }

    /// Decode the contained value with a one-slot schema.
    pub fn decode(&mut self, schema: &mut Schema<'_>) -> DecodeResult<()> {
        let result = walk::walk(&mut schema.slots, &mut *self.stack, &self.limits);
        self.record(result)
    }

    /// Decode the contained value into `dest`.
    pub fn decode_into<T: Schematic + ?Sized>(&mut self, dest: &mut T) -> DecodeResult<()> {
        let mut schema = Schema::new().field(dest);
        self.decode(&mut schema)
    }

    pub fn read_basic(&mut self) -> DecodeResult<BasicValue> {
        let result = match walk::top(&mut *self.stack) {
            Ok(it) => it.read_basic().map_err(DecodeError::from),
            Err(e) => Err(e),
        };
        self.record(result)
    }

    /// Read the contained value without a schema.
    pub fn read_value(&mut self) -> DecodeResult<Value> {
        let result = match walk::top(&mut *self.stack) {
            Ok(it) => Value::read(it).map_err(DecodeError::from),
            Err(e) => Err(e),
        };
        self.record(result)
    }

    /// Last error raised through this reader.
    pub fn error(&self) -> Option<&DecodeError> {
        self.error.as_ref()
    }
}
