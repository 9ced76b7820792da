// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Message frame layout.
//!
//! ```text
//! byte  0      'l' (little-endian)
//! byte  1      message type
//! byte  2      flags
//! byte  3      protocol version (1)
//! bytes 4..8   body length
//! bytes 8..12  serial
//! bytes 12..   header fields, a(yv)
//! padding      to 8 bytes
//! body
//! ```
//!
//! The header is itself marshalled with the body cursors, against the fixed
//! signature [`HEADER_SIGNATURE`].

use super::{validate_bus_name, validate_interface, validate_member, Message, MessageKind};
use crate::config::Limits;
use crate::wire::{
    pad_to, AppendCursor, BasicValue, Body, ReadCursor, Reader, Signature, WireError, WireResult,
    WireType,
};

pub const PROTOCOL_VERSION: u8 = 1;

/// Signature of the fixed header.
pub const HEADER_SIGNATURE: &str = "yyyyuua(yv)";

const LITTLE_ENDIAN: u8 = b'l';

const FIELD_PATH: u8 = 1;
const FIELD_INTERFACE: u8 = 2;
const FIELD_MEMBER: u8 = 3;
const FIELD_ERROR_NAME: u8 = 4;
const FIELD_REPLY_SERIAL: u8 = 5;
const FIELD_DESTINATION: u8 = 6;
const FIELD_SENDER: u8 = 7;
const FIELD_SIGNATURE: u8 = 8;

fn header_fields(message: &Message) -> WireResult<Vec<(u8, BasicValue)>> {
    let mut fields = Vec::new();
    if let Some(path) = &message.path {
        fields.push((FIELD_PATH, BasicValue::ObjectPath(path.clone())));
    }
    let strings = [
        (FIELD_INTERFACE, &message.interface),
        (FIELD_MEMBER, &message.member),
        (FIELD_ERROR_NAME, &message.error_name),
    ];
    for (code, value) in strings {
        if let Some(value) = value {
            fields.push((code, BasicValue::String(value.clone())));
        }
    }
    if let Some(serial) = message.reply_serial {
        fields.push((FIELD_REPLY_SERIAL, BasicValue::Uint32(serial)));
    }
    for (code, value) in [(FIELD_DESTINATION, &message.destination), (FIELD_SENDER, &message.sender)] {
        if let Some(value) = value {
            fields.push((code, BasicValue::String(value.clone())));
        }
    }
    if !message.body.signature().is_empty() {
        let signature = Signature::new(message.body.signature())?;
        fields.push((FIELD_SIGNATURE, BasicValue::Signature(signature)));
    }
    Ok(fields)
}

/// Serialize `message` into a frame.
pub(crate) fn marshal(message: &Message) -> WireResult<Vec<u8>> {
    if message.serial == 0 {
        return Err(WireError::InvalidHeader("serial must be non-zero"));
    }
    let body = &message.body;
    let mut header = Body::new();
    let mut root = AppendCursor::root();
    for byte in [LITTLE_ENDIAN, message.kind.code(), message.flags, PROTOCOL_VERSION] {
        root.append_basic(&mut header, &BasicValue::Byte(byte))?;
    }
    root.append_basic(&mut header, &BasicValue::Uint32(body.len() as u32))?;
    root.append_basic(&mut header, &BasicValue::Uint32(message.serial))?;

    let mut array = root.open_container(&mut header, WireType::Array, Some("(yv)"))?;
    for (code, value) in header_fields(message)? {
        let mut field = array.open_container(&mut header, WireType::Struct, None)?;
        field.append_basic(&mut header, &BasicValue::Byte(code))?;
        let content = (value.wire_type().code() as char).to_string();
        let mut variant = field.open_container(&mut header, WireType::Variant, Some(&content))?;
        variant.append_basic(&mut header, &value)?;
        field.close_container(&mut header, variant)?;
        array.close_container(&mut header, field)?;
    }
    root.close_container(&mut header, array)?;
    debug_assert_eq!(header.signature(), HEADER_SIGNATURE);

    let mut frame = header.bytes;
    pad_to(&mut frame, 8);
    frame.extend_from_slice(body.bytes());
    log::trace!(
        "[hdbus::marshal] {} serial {} -> {} bytes",
        message.kind,
        message.serial,
        frame.len()
    );
    Ok(frame)
}

fn byte_at(cursor: &ReadCursor<'_>) -> WireResult<u8> {
    match cursor.read_basic()? {
        BasicValue::Byte(b) => Ok(b),
        _ => Err(WireError::InvalidHeader("expected a byte")),
    }
}

fn u32_at(cursor: &ReadCursor<'_>) -> WireResult<u32> {
    match cursor.read_basic()? {
        BasicValue::Uint32(v) => Ok(v),
        _ => Err(WireError::InvalidHeader("expected a uint32")),
    }
}

fn string_field(value: BasicValue) -> WireResult<String> {
    match value {
        BasicValue::String(s) => Ok(s),
        _ => Err(WireError::InvalidHeader("header field has the wrong type")),
    }
}

/// Parse a frame produced by [`marshal`] or a peer.
pub(crate) fn demarshal(bytes: &[u8], limits: &Limits) -> WireResult<Message> {
    if bytes.len() > limits.max_message_bytes {
        return Err(WireError::MessageTooLong {
            len: bytes.len(),
            limit: limits.max_message_bytes,
        });
    }
    match bytes.first() {
        Some(&LITTLE_ENDIAN) => {}
        Some(&other) => return Err(WireError::UnsupportedEndianness(other)),
        None => return Err(WireError::InvalidHeader("empty frame")),
    }

    let mut cursor = ReadCursor::root(bytes, HEADER_SIGNATURE).with_array_limit(limits.max_array_bytes);
    cursor.next()?;
    let kind = MessageKind::from_code(byte_at(&cursor)?).ok_or(WireError::InvalidHeader("unknown message type"))?;
    cursor.next()?;
    let flags = byte_at(&cursor)?;
    cursor.next()?;
    if byte_at(&cursor)? != PROTOCOL_VERSION {
        return Err(WireError::InvalidHeader("unsupported protocol version"));
    }
    cursor.next()?;
    let body_len = u32_at(&cursor)? as usize;
    cursor.next()?;
    let serial = u32_at(&cursor)?;
    if serial == 0 {
        return Err(WireError::InvalidHeader("serial must be non-zero"));
    }
    cursor.next()?;

    let mut message = Message::bare(kind);
    message.flags = flags;
    message.serial = serial;
    let mut signature = String::new();

    let mut fields = cursor.recurse()?;
    while fields.arg_type() == WireType::Struct {
        let mut field = fields.recurse()?;
        let code = byte_at(&field)?;
        field.next()?;
        let content = field.recurse()?;
        if (FIELD_PATH..=FIELD_SIGNATURE).contains(&code) {
            let value = content.read_basic()?;
            match (code, value) {
                (FIELD_PATH, BasicValue::ObjectPath(path)) => message.path = Some(path),
                (FIELD_INTERFACE, value) => {
                    let name = string_field(value)?;
                    validate_interface(&name)?;
                    message.interface = Some(name);
                }
                (FIELD_MEMBER, value) => {
                    let name = string_field(value)?;
                    validate_member(&name)?;
                    message.member = Some(name);
                }
                (FIELD_ERROR_NAME, value) => {
                    let name = string_field(value)?;
                    validate_interface(&name)?;
                    message.error_name = Some(name);
                }
                (FIELD_REPLY_SERIAL, BasicValue::Uint32(serial)) => message.reply_serial = Some(serial),
                (FIELD_DESTINATION, value) => {
                    let name = string_field(value)?;
                    validate_bus_name(&name)?;
                    message.destination = Some(name);
                }
                (FIELD_SENDER, value) => {
                    let name = string_field(value)?;
                    validate_bus_name(&name)?;
                    message.sender = Some(name);
                }
                (FIELD_SIGNATURE, BasicValue::Signature(sig)) => signature = sig.into_string(),
                _ => return Err(WireError::InvalidHeader("header field has the wrong type")),
            }
        } else {
            log::trace!("[hdbus::marshal] skipping unknown header field {}", code);
        }
        fields.next()?;
    }
    cursor.next()?;

    let body_start = Reader::new(bytes).aligned(cursor.offset(), 8)?;
    let body_end = body_start
        .checked_add(body_len)
        .ok_or(WireError::InvalidHeader("body length overflows"))?;
    if body_end > bytes.len() {
        return Err(WireError::ReadFailed {
            offset: bytes.len(),
            reason: "frame shorter than its body length",
        });
    }
    if body_end < bytes.len() {
        return Err(WireError::InvalidHeader("trailing bytes after body"));
    }
    check_required(&message)?;

    let body = Body::from_parts(bytes[body_start..body_end].to_vec(), Signature::new(signature)?);
    validate_body(&body, limits)?;
    message.body = body;
    log::trace!(
        "[hdbus::marshal] {} bytes -> {} serial {} {:?}",
        bytes.len(),
        kind,
        serial,
        message.body.signature()
    );
    Ok(message)
}

fn check_required(message: &Message) -> WireResult<()> {
    let ok = match message.kind {
        MessageKind::MethodCall => message.path.is_some() && message.member.is_some(),
        MessageKind::Signal => message.path.is_some() && message.interface.is_some() && message.member.is_some(),
        MessageKind::Error => message.error_name.is_some() && message.reply_serial.is_some(),
        MessageKind::MethodReturn => message.reply_serial.is_some(),
    };
    if ok {
        Ok(())
    } else {
        Err(WireError::InvalidHeader("required header field missing"))
    }
}

/// Walk every body value so malformed content is rejected up front.
fn validate_body(body: &Body, limits: &Limits) -> WireResult<()> {
    let mut cursor = ReadCursor::root(body.bytes(), body.signature()).with_array_limit(limits.max_array_bytes);
    while cursor.arg_type() != WireType::Invalid {
        cursor.next()?;
    }
    if cursor.offset() != body.len() {
        return Err(WireError::InvalidHeader("body longer than its signature"));
    }
    Ok(())
}
