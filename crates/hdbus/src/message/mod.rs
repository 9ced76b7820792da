// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Messages: header fields plus a marshalled body.
//!
//! A [`Message`] is created through one of the four constructors, filled by
//! a [`MessageBuilder`](crate::MessageBuilder), [`Message::append_args`] or a
//! [`BodyWriter`], and read back with a [`Decoder`](crate::Decoder) or
//! [`Message::values`]. [`Message::marshal`] and [`Message::demarshal`]
//! convert to and from the byte frame a transport carries.

mod marshal;

pub use marshal::{PROTOCOL_VERSION, HEADER_SIGNATURE};

use crate::config::Limits;
use crate::iter::{ContainerIterator, IteratorStack};
use crate::value::Value;
use crate::wire::{AppendCursor, BasicValue, Body, FixedArray, ObjectPath, WireError, WireResult, WireType};
use std::fmt;

/// Header flag: the sender does not want a reply.
pub const FLAG_NO_REPLY_EXPECTED: u8 = 0x1;
/// Header flag: the bus must not launch an owner for the destination.
pub const FLAG_NO_AUTO_START: u8 = 0x2;

const MAX_NAME_LEN: usize = 255;

/// Message type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageKind {
    MethodCall = 1,
    MethodReturn = 2,
    Error = 3,
    Signal = 4,
}

impl MessageKind {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::MethodCall),
            2 => Some(Self::MethodReturn),
            3 => Some(Self::Error),
            4 => Some(Self::Signal),
            _ => None,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MethodCall => "method_call",
            Self::MethodReturn => "method_return",
            Self::Error => "error",
            Self::Signal => "signal",
        })
    }
}

/// A D-Bus message.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    kind: MessageKind,
    flags: u8,
    serial: u32,
    path: Option<ObjectPath>,
    interface: Option<String>,
    member: Option<String>,
    error_name: Option<String>,
    reply_serial: Option<u32>,
    destination: Option<String>,
    sender: Option<String>,
    body: Body,
}

impl Message {
    fn bare(kind: MessageKind) -> Self {
        Self {
            kind,
            flags: 0,
            serial: 0,
            path: None,
            interface: None,
            member: None,
            error_name: None,
            reply_serial: None,
            destination: None,
            sender: None,
            body: Body::new(),
        }
    }

    fn addressed(kind: MessageKind, path: &str, interface: &str, member: &str) -> WireResult<Self> {
        validate_interface(interface)?;
        validate_member(member)?;
        let mut msg = Self::bare(kind);
        msg.path = Some(ObjectPath::new(path)?);
        msg.interface = Some(interface.to_string());
        msg.member = Some(member.to_string());
        Ok(msg)
    }

    /// A call of `interface.member` on the object at `path`.
    pub fn method_call(path: &str, interface: &str, member: &str) -> WireResult<Self> {
        Self::addressed(MessageKind::MethodCall, path, interface, member)
    }

    /// An emission of `interface.member` from the object at `path`.
    pub fn signal(path: &str, interface: &str, member: &str) -> WireResult<Self> {
        Self::addressed(MessageKind::Signal, path, interface, member)
    }

    /// A successful reply to `call`.
    pub fn method_return(call: &Message) -> Self {
        let mut msg = Self::bare(MessageKind::MethodReturn);
        msg.reply_serial = Some(call.serial);
        msg.destination = call.sender.clone();
        msg.flags = FLAG_NO_REPLY_EXPECTED;
        msg
    }

    /// An error reply to `call`, carrying `text` as its only argument.
    pub fn error(call: &Message, name: &str, text: &str) -> WireResult<Self> {
        validate_interface(name).map_err(|_| WireError::InvalidName {
            kind: "error name",
            name: name.to_string(),
        })?;
        let mut msg = Self::bare(MessageKind::Error);
        msg.error_name = Some(name.to_string());
        msg.reply_serial = Some(call.serial);
        msg.destination = call.sender.clone();
        msg.flags = FLAG_NO_REPLY_EXPECTED;
        msg.append_args([BasicValue::String(text.to_string())])?;
        Ok(msg)
    }

    // ------------------------------------------------------------------
    // Header
    // ------------------------------------------------------------------

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn flags(&self) -> u8 {
        self.flags
    }

    pub fn set_flags(&mut self, flags: u8) {
        self.flags = flags;
    }

    pub fn no_reply_expected(&self) -> bool {
        self.flags & FLAG_NO_REPLY_EXPECTED != 0
    }

    /// Serial assigned by the transport; 0 until sent.
    pub fn serial(&self) -> u32 {
        self.serial
    }

    pub fn set_serial(&mut self, serial: u32) {
        self.serial = serial;
    }

    pub fn path(&self) -> Option<&ObjectPath> {
        self.path.as_ref()
    }

    pub fn interface(&self) -> Option<&str> {
        self.interface.as_deref()
    }

    pub fn member(&self) -> Option<&str> {
        self.member.as_deref()
    }

    pub fn error_name(&self) -> Option<&str> {
        self.error_name.as_deref()
    }

    pub fn reply_serial(&self) -> Option<u32> {
        self.reply_serial
    }

    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }

    pub fn set_destination(&mut self, name: &str) -> WireResult<()> {
        validate_bus_name(name)?;
        self.destination = Some(name.to_string());
        Ok(())
    }

    pub fn sender(&self) -> Option<&str> {
        self.sender.as_deref()
    }

    pub fn set_sender(&mut self, name: &str) -> WireResult<()> {
        validate_bus_name(name)?;
        self.sender = Some(name.to_string());
        Ok(())
    }

    /// True for a call of `interface.member`.
    pub fn is_method_call(&self, interface: &str, member: &str) -> bool {
        self.kind == MessageKind::MethodCall
            && self.interface() == Some(interface)
            && self.member() == Some(member)
    }

    /// True for an emission of `interface.member`.
    pub fn is_signal(&self, interface: &str, member: &str) -> bool {
        self.kind == MessageKind::Signal
            && self.interface() == Some(interface)
            && self.member() == Some(member)
    }

    // ------------------------------------------------------------------
    // Body
    // ------------------------------------------------------------------

    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Signature of the body arguments.
    pub fn signature(&self) -> &str {
        self.body.signature()
    }

    pub(crate) fn set_body(&mut self, body: Body) {
        self.body = body;
    }

    /// Append basic arguments without a builder. Nothing is appended if any
    /// value is rejected.
    pub fn append_args<I>(&mut self, args: I) -> WireResult<()>
    where
        I: IntoIterator<Item = BasicValue>,
    {
        let mut body = self.body.clone();
        let mut root = AppendCursor::root();
        for arg in args {
            root.append_basic(&mut body, &arg)?;
        }
        self.body = body;
        Ok(())
    }

    /// Append one array of fixed-size elements.
    pub fn append_array(&mut self, array: &FixedArray) -> WireResult<()> {
        let mut body = self.body.clone();
        let mut root = AppendCursor::root();
        let element = (array.element_type().code() as char).to_string();
        let mut child = root.open_container(&mut body, WireType::Array, Some(&element))?;
        child.append_fixed_array(&mut body, array)?;
        root.close_container(&mut body, child)?;
        self.body = body;
        Ok(())
    }

    /// Low-level append access through an iterator stack.
    pub fn writer(&mut self) -> BodyWriter<'_> {
        BodyWriter {
            body: self.body.clone(),
            message: self,
            stack: IteratorStack::new(),
        }
    }

    /// Root read iterator over the body.
    pub fn reader(&self) -> ContainerIterator<'_> {
        ContainerIterator::read_root(&self.body)
    }

    /// Every body argument as a dynamic value.
    pub fn values(&self) -> WireResult<Vec<Value>> {
        Value::read_body(&self.body)
    }

    // ------------------------------------------------------------------
    // Framing
    // ------------------------------------------------------------------

    /// Serialize to a complete little-endian frame.
    pub fn marshal(&self) -> WireResult<Vec<u8>> {
        marshal::marshal(self)
    }

    /// Parse a complete frame.
    pub fn demarshal(bytes: &[u8], limits: &Limits) -> WireResult<Self> {
        marshal::demarshal(bytes, limits)
    }
}

/// Explicit-control body writer returned by [`Message::writer`].
///
/// Writes go to a copy of the body; [`finish`](Self::finish) installs it.
/// Dropping an unfinished writer leaves the message unchanged.
#[derive(Debug)]
pub struct BodyWriter<'a> {
    message: &'a mut Message,
    body: Body,
    stack: IteratorStack<'static>,
}

impl BodyWriter<'_> {
    pub fn open(&mut self, ty: WireType, inner: Option<&str>) -> WireResult<&mut Self> {
        self.stack.open_append(ty, inner, &mut self.body)?;
        Ok(self)
    }

    pub fn append_basic(&mut self, value: &BasicValue) -> WireResult<&mut Self> {
        self.stack.append_basic(&mut self.body, value)?;
        Ok(self)
    }

    pub fn append_fixed_array(&mut self, array: &FixedArray) -> WireResult<&mut Self> {
        self.stack.append_fixed_array(&mut self.body, array)?;
        Ok(self)
    }

    pub fn close(&mut self) -> WireResult<&mut Self> {
        self.stack.close(&mut self.body)?;
        Ok(self)
    }

    /// Number of containers still open.
    pub fn depth(&self) -> usize {
        self.stack.nesting()
    }

    /// Install the written body. Fails if a container is still open.
    pub fn finish(self) -> WireResult<()> {
        if let Some(top) = self.stack.top() {
            return Err(WireError::IncompleteContainer(top.container()));
        }
        self.message.body = self.body;
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Name validation
// ----------------------------------------------------------------------------

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Dotted name of at least two elements; elements do not start with a digit.
fn validate_interface(name: &str) -> WireResult<()> {
    let valid = !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && name.contains('.')
        && name.split('.').all(|element| {
            !element.is_empty()
                && !element.starts_with(|c: char| c.is_ascii_digit())
                && element.chars().all(is_name_char)
        });
    if valid {
        Ok(())
    } else {
        Err(WireError::InvalidName {
            kind: "interface name",
            name: name.to_string(),
        })
    }
}

fn validate_member(name: &str) -> WireResult<()> {
    let valid = !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(is_name_char);
    if valid {
        Ok(())
    } else {
        Err(WireError::InvalidName {
            kind: "member name",
            name: name.to_string(),
        })
    }
}

/// Well-known (`org.example.App`) or unique (`:1.42`) bus name.
fn validate_bus_name(name: &str) -> WireResult<()> {
    let (unique, rest) = match name.strip_prefix(':') {
        Some(rest) => (true, rest),
        None => (false, name),
    };
    let valid = !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && rest.contains('.')
        && rest.split('.').all(|element| {
            !element.is_empty()
                && (unique || !element.starts_with(|c: char| c.is_ascii_digit()))
                && element.chars().all(|c| is_name_char(c) || c == '-')
        });
    if valid {
        Ok(())
    } else {
        Err(WireError::InvalidName {
            kind: "bus name",
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests;
