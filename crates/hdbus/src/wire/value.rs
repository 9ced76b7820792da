// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Owned scalar payloads.

use super::{ObjectPath, Signature, WireType};

/// One basic-typed wire value.
#[derive(Debug, Clone, PartialEq)]
pub enum BasicValue {
    Byte(u8),
    /// Transmitted as a 4-byte 0/1 integer.
    Boolean(bool),
    Int16(i16),
    Uint16(u16),
    Int32(i32),
    Uint32(u32),
    Int64(i64),
    Uint64(u64),
    Double(f64),
    String(String),
    ObjectPath(ObjectPath),
    Signature(Signature),
}

impl BasicValue {
    pub fn wire_type(&self) -> WireType {
        match self {
            Self::Byte(_) => WireType::Byte,
            Self::Boolean(_) => WireType::Boolean,
            Self::Int16(_) => WireType::Int16,
            Self::Uint16(_) => WireType::Uint16,
            Self::Int32(_) => WireType::Int32,
            Self::Uint32(_) => WireType::Uint32,
            Self::Int64(_) => WireType::Int64,
            Self::Uint64(_) => WireType::Uint64,
            Self::Double(_) => WireType::Double,
            Self::String(_) => WireType::String,
            Self::ObjectPath(_) => WireType::ObjectPath,
            Self::Signature(_) => WireType::Signature,
        }
    }

    /// Textual content of string-like values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::ObjectPath(p) => Some(p.as_str()),
            Self::Signature(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// A homogeneous array of fixed-size elements, written and read in bulk.
#[derive(Debug, Clone, PartialEq)]
pub enum FixedArray {
    Byte(Vec<u8>),
    Boolean(Vec<bool>),
    Int16(Vec<i16>),
    Uint16(Vec<u16>),
    Int32(Vec<i32>),
    Uint32(Vec<u32>),
    Int64(Vec<i64>),
    Uint64(Vec<u64>),
    Double(Vec<f64>),
}

impl FixedArray {
    pub fn element_type(&self) -> WireType {
        match self {
            Self::Byte(_) => WireType::Byte,
            Self::Boolean(_) => WireType::Boolean,
            Self::Int16(_) => WireType::Int16,
            Self::Uint16(_) => WireType::Uint16,
            Self::Int32(_) => WireType::Int32,
            Self::Uint32(_) => WireType::Uint32,
            Self::Int64(_) => WireType::Int64,
            Self::Uint64(_) => WireType::Uint64,
            Self::Double(_) => WireType::Double,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Byte(v) => v.len(),
            Self::Boolean(v) => v.len(),
            Self::Int16(v) => v.len(),
            Self::Uint16(v) => v.len(),
            Self::Int32(v) => v.len(),
            Self::Uint32(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::Uint64(v) => v.len(),
            Self::Double(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Signature of the whole array, e.g. `ai`.
    pub fn signature(&self) -> Signature {
        Signature::array_of(&Signature::basic(self.element_type()))
    }

    /// Element `index` as a [`BasicValue`].
    pub fn get(&self, index: usize) -> Option<BasicValue> {
        Some(match self {
            Self::Byte(v) => BasicValue::Byte(*v.get(index)?),
            Self::Boolean(v) => BasicValue::Boolean(*v.get(index)?),
            Self::Int16(v) => BasicValue::Int16(*v.get(index)?),
            Self::Uint16(v) => BasicValue::Uint16(*v.get(index)?),
            Self::Int32(v) => BasicValue::Int32(*v.get(index)?),
            Self::Uint32(v) => BasicValue::Uint32(*v.get(index)?),
            Self::Int64(v) => BasicValue::Int64(*v.get(index)?),
            Self::Uint64(v) => BasicValue::Uint64(*v.get(index)?),
            Self::Double(v) => BasicValue::Double(*v.get(index)?),
        })
    }
}
