// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! D-Bus wire format primitives.
//!
//! This module is the positional layer everything else is built on:
//!
//! - [`WireType`]: the one-byte type codes of the D-Bus type system
//! - [`Signature`] / [`ObjectPath`]: validated string-like basic types
//! - [`BasicValue`] / [`FixedArray`]: owned scalar payloads
//! - [`AppendCursor`] / [`ReadCursor`]: one level of marshalling or
//!   unmarshalling over a [`Body`]
//!
//! All data is little-endian. Offsets are relative to the start of the body,
//! which the frame layout keeps 8-aligned, so alignment computed here matches
//! alignment relative to the whole message.

mod cursor;
mod path;
mod signature;
mod value;

pub use cursor::{AppendCursor, Body, ReadCursor};
pub use path::ObjectPath;
pub use signature::{Signature, MAX_ARRAY_NESTING, MAX_SIGNATURE_LEN, MAX_STRUCT_NESTING};
pub use value::{BasicValue, FixedArray};

pub(crate) use cursor::{pad_to, Reader};

use std::fmt;
use thiserror::Error;

/// Type codes of the D-Bus type system.
///
/// `Struct` and `DictEntry` appear in signatures as `(...)` and `{...}`;
/// [`WireType::code`] returns the opening delimiter for them. `Invalid` marks
/// the end of a container when reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    Byte,
    Boolean,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Double,
    String,
    ObjectPath,
    Signature,
    Struct,
    Array,
    Variant,
    DictEntry,
    Invalid,
}

impl WireType {
    /// Signature character for this type (`0` for `Invalid`).
    pub const fn code(self) -> u8 {
        match self {
            Self::Byte => b'y',
            Self::Boolean => b'b',
            Self::Int16 => b'n',
            Self::Uint16 => b'q',
            Self::Int32 => b'i',
            Self::Uint32 => b'u',
            Self::Int64 => b'x',
            Self::Uint64 => b't',
            Self::Double => b'd',
            Self::String => b's',
            Self::ObjectPath => b'o',
            Self::Signature => b'g',
            Self::Struct => b'(',
            Self::Array => b'a',
            Self::Variant => b'v',
            Self::DictEntry => b'{',
            Self::Invalid => 0,
        }
    }

    /// Parse a signature character. `r` and `e` are accepted as the
    /// abstract struct and dict-entry codes.
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            b'y' => Self::Byte,
            b'b' => Self::Boolean,
            b'n' => Self::Int16,
            b'q' => Self::Uint16,
            b'i' => Self::Int32,
            b'u' => Self::Uint32,
            b'x' => Self::Int64,
            b't' => Self::Uint64,
            b'd' => Self::Double,
            b's' => Self::String,
            b'o' => Self::ObjectPath,
            b'g' => Self::Signature,
            b'(' | b'r' => Self::Struct,
            b'a' => Self::Array,
            b'v' => Self::Variant,
            b'{' | b'e' => Self::DictEntry,
            _ => return None,
        })
    }

    /// Scalar types with no nested structure. Only these may be
    /// dictionary keys.
    pub const fn is_basic(self) -> bool {
        matches!(
            self,
            Self::Byte
                | Self::Boolean
                | Self::Int16
                | Self::Uint16
                | Self::Int32
                | Self::Uint32
                | Self::Int64
                | Self::Uint64
                | Self::Double
                | Self::String
                | Self::ObjectPath
                | Self::Signature
        )
    }

    /// Basic types with a fixed encoded size (eligible for bulk array I/O).
    pub const fn is_fixed(self) -> bool {
        self.fixed_size().is_some()
    }

    pub const fn is_container(self) -> bool {
        matches!(
            self,
            Self::Struct | Self::Array | Self::Variant | Self::DictEntry
        )
    }

    /// Encoded size in bytes for fixed-size types.
    pub const fn fixed_size(self) -> Option<usize> {
        match self {
            Self::Byte => Some(1),
            Self::Int16 | Self::Uint16 => Some(2),
            Self::Boolean | Self::Int32 | Self::Uint32 => Some(4),
            Self::Int64 | Self::Uint64 | Self::Double => Some(8),
            _ => None,
        }
    }

    /// Marshalling alignment.
    pub const fn alignment(self) -> usize {
        match self {
            Self::Byte | Self::Signature | Self::Variant | Self::Invalid => 1,
            Self::Int16 | Self::Uint16 => 2,
            Self::Boolean
            | Self::Int32
            | Self::Uint32
            | Self::String
            | Self::ObjectPath
            | Self::Array => 4,
            Self::Int64 | Self::Uint64 | Self::Double | Self::Struct | Self::DictEntry => 8,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::Boolean => "boolean",
            Self::Int16 => "int16",
            Self::Uint16 => "uint16",
            Self::Int32 => "int32",
            Self::Uint32 => "uint32",
            Self::Int64 => "int64",
            Self::Uint64 => "uint64",
            Self::Double => "double",
            Self::String => "string",
            Self::ObjectPath => "object path",
            Self::Signature => "signature",
            Self::Struct => "struct",
            Self::Array => "array",
            Self::Variant => "variant",
            Self::DictEntry => "dict entry",
            Self::Invalid => "invalid",
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Failures of the marshalling layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WireError {
    #[error("read failed at offset {offset}: {reason}")]
    ReadFailed { offset: usize, reason: &'static str },

    #[error("invalid signature {signature:?}: {reason}")]
    InvalidSignature {
        signature: String,
        reason: &'static str,
    },

    #[error("signature mismatch: expected {expected:?}, found {found:?}")]
    SignatureMismatch { expected: String, found: String },

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: WireType, found: WireType },

    #[error("iterator is not in append mode")]
    NotAppending,

    #[error("iterator is not in read mode")]
    NotReading,

    #[error("{0} container requires an inner signature")]
    MissingInnerSignature(WireType),

    #[error("{0} container does not take an inner signature")]
    UnexpectedInnerSignature(WireType),

    #[error("{0} is not a container type")]
    NotAContainer(WireType),

    #[error("a child container is already open on this iterator")]
    ChildOpen,

    #[error("{0} closed before its signature was satisfied")]
    IncompleteContainer(WireType),

    #[error("invalid boolean value {0}")]
    InvalidBoolean(u32),

    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    #[error("string contains an interior NUL byte")]
    InteriorNul,

    #[error("invalid object path {0:?}")]
    InvalidObjectPath(String),

    #[error("array of {len} bytes exceeds limit of {limit}")]
    ArrayTooLong { len: usize, limit: usize },

    #[error("message of {len} bytes exceeds limit of {limit}")]
    MessageTooLong { len: usize, limit: usize },

    #[error("unsupported endianness marker {0:#04x}")]
    UnsupportedEndianness(u8),

    #[error("invalid {kind} {name:?}")]
    InvalidName { kind: &'static str, name: String },

    #[error("invalid message header: {0}")]
    InvalidHeader(&'static str),
}

pub type WireResult<T> = Result<T, WireError>;

#[cfg(test)]
mod tests;
