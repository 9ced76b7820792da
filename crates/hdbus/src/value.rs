// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic values.
//!
//! [`Value`] holds any wire value together with enough type information to
//! write it back. It is what variant payloads decode into when no static
//! schema is known, and what [`Message::values`](crate::Message::values)
//! returns for inspection.

use crate::builder::{BuildResult, MessageBuilder};
use crate::iter::ContainerIterator;
use crate::schema::{Schematic, Slot, VariantSlot};
use crate::types::{Append, Basic, DBusBool, DBusType};
use crate::wire::{BasicValue, Body, ObjectPath, ReadCursor, Signature, WireError, WireResult, WireType};

/// A self-describing wire value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Basic(BasicValue),
    /// Homogeneous array; `element` is kept so empty arrays round-trip.
    Array {
        element: Signature,
        items: Vec<Value>,
    },
    /// Array of dict entries.
    Dict {
        key: WireType,
        value: Signature,
        entries: Vec<(BasicValue, Value)>,
    },
    Struct(Vec<Value>),
    Variant(Box<Value>),
}

impl Value {
    /// Wire signature of this value.
    pub fn signature(&self) -> String {
        match self {
            Self::Basic(v) => (v.wire_type().code() as char).to_string(),
            Self::Array { element, .. } => format!("a{element}"),
            Self::Dict { key, value, .. } => format!("a{{{}{}}}", key.code() as char, value),
            Self::Struct(fields) => {
                let mut out = String::from("(");
                for field in fields {
                    out.push_str(&field.signature());
                }
                out.push(')');
                out
            }
            Self::Variant(_) => "v".to_string(),
        }
    }

    pub fn wire_type(&self) -> WireType {
        match self {
            Self::Basic(v) => v.wire_type(),
            Self::Array { .. } | Self::Dict { .. } => WireType::Array,
            Self::Struct(_) => WireType::Struct,
            Self::Variant(_) => WireType::Variant,
        }
    }

    pub fn as_basic(&self) -> Option<&BasicValue> {
        match self {
            Self::Basic(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Basic(BasicValue::Int32(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::Basic(BasicValue::Uint32(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Basic(BasicValue::Double(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_basic().and_then(BasicValue::as_str)
    }

    pub fn as_items(&self) -> Option<&[Value]> {
        match self {
            Self::Array { items, .. } => Some(items),
            Self::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    /// Look up a dict entry by string key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Dict { entries, .. } => entries
                .iter()
                .find(|(k, _)| k.as_str() == Some(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Content of a variant, or the value itself.
    pub fn unwrap_variant(&self) -> &Value {
        match self {
            Self::Variant(inner) => inner.unwrap_variant(),
            other => other,
        }
    }

    /// Read the current value of a read iterator.
    pub fn read(iter: &ContainerIterator<'_>) -> WireResult<Value> {
        read_cursor(iter.read_cursor()?)
    }

    /// Read every top-level value of a body.
    pub fn read_body(body: &Body) -> WireResult<Vec<Value>> {
        let mut cursor = ReadCursor::root(body.bytes(), body.signature());
        let mut values = Vec::new();
        while cursor.arg_type() != WireType::Invalid {
            values.push(read_cursor(&cursor)?);
            cursor.next()?;
        }
        Ok(values)
    }
}

fn read_cursor(cursor: &ReadCursor<'_>) -> WireResult<Value> {
    let ty = cursor.arg_type();
    if ty.is_basic() {
        return Ok(Value::Basic(cursor.read_basic()?));
    }
    match ty {
        WireType::Array => {
            let element = &cursor.signature()[1..];
            let mut child = cursor.recurse()?;
            if let Some(entry) = element.strip_prefix('{') {
                let key = WireType::from_code(entry.as_bytes()[0]).unwrap_or(WireType::Invalid);
                let value = Signature::new(&entry[1..entry.len() - 1])?;
                let mut entries = Vec::new();
                while child.arg_type() == WireType::DictEntry {
                    let mut pair = child.recurse()?;
                    let k = pair.read_basic()?;
                    pair.next()?;
                    entries.push((k, read_cursor(&pair)?));
                    child.next()?;
                }
                return Ok(Value::Dict {
                    key,
                    value,
                    entries,
                });
            }
            let element = Signature::new(element)?;
            let mut items = Vec::new();
            if element.len() == 1 && element.first_type().is_fixed() {
                let bulk = child.read_fixed_array()?;
                items.extend((0..bulk.len()).filter_map(|i| bulk.get(i)).map(Value::Basic));
            } else {
                while child.arg_type() != WireType::Invalid {
                    items.push(read_cursor(&child)?);
                    child.next()?;
                }
            }
            Ok(Value::Array { element, items })
        }
        WireType::Struct | WireType::DictEntry => {
            let mut child = cursor.recurse()?;
            let mut fields = Vec::new();
            while child.arg_type() != WireType::Invalid {
                fields.push(read_cursor(&child)?);
                child.next()?;
            }
            Ok(Value::Struct(fields))
        }
        WireType::Variant => {
            let child = cursor.recurse()?;
            Ok(Value::Variant(Box::new(read_cursor(&child)?)))
        }
        _ => Err(WireError::ReadFailed {
            offset: cursor.offset(),
            reason: "no value to read",
        }),
    }
}

impl Append for Value {
    fn append(&self, builder: &mut MessageBuilder<'_>) -> BuildResult<()> {
        match self {
            Self::Basic(v) => {
                builder.push_basic(v.clone())?;
            }
            Self::Array { element, items } => {
                builder.begin_array_of(element.as_str())?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        builder.next()?;
                    }
                    item.append(builder)?;
                }
                builder.end_array()?;
            }
            Self::Dict {
                key,
                value,
                entries,
            } => {
                builder.begin_array_of(&format!("{{{}{}}}", key.code() as char, value))?;
                for (k, v) in entries {
                    builder.begin_dict_entry()?;
                    builder.push_basic(k.clone())?;
                    v.append(builder)?;
                    builder.end_dict_entry()?;
                }
                builder.end_array()?;
            }
            Self::Struct(fields) => {
                builder.begin_struct()?;
                for field in fields {
                    field.append(builder)?;
                }
                builder.end_struct()?;
            }
            Self::Variant(inner) => {
                builder.begin_variant()?;
                inner.append(builder)?;
                builder.end_variant()?;
            }
        }
        Ok(())
    }
}

macro_rules! impl_from_basic {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::Basic(value.to_basic())
                }
            }
        )+
    };
}

impl_from_basic!(u8, DBusBool, i16, u16, i32, u32, i64, u64, f64, String, ObjectPath, Signature);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Basic(BasicValue::String(value.to_string()))
    }
}

impl From<BasicValue> for Value {
    fn from(value: BasicValue) -> Self {
        Self::Basic(value)
    }
}

/// A variant whose content is decoded dynamically.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedVariant(pub Value);

impl OwnedVariant {
    pub fn new(value: impl Into<Value>) -> Self {
        Self(value.into())
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl Default for OwnedVariant {
    /// Placeholder content until decoded.
    fn default() -> Self {
        Self(Value::Basic(BasicValue::Byte(0)))
    }
}

impl DBusType for OwnedVariant {
    fn signature() -> Signature {
        Signature::from_trusted("v".to_string())
    }
}

impl Append for OwnedVariant {
    fn append(&self, builder: &mut MessageBuilder<'_>) -> BuildResult<()> {
        builder.begin_variant()?;
        self.0.append(builder)?;
        builder.end_variant()?;
        Ok(())
    }
}

impl Schematic for OwnedVariant {
    fn slot(&mut self) -> Slot<'_> {
        let dest = &mut self.0;
        Slot::Variant(VariantSlot::new(move |reader| match reader.read_value() {
            Ok(value) => {
                *dest = value;
                true
            }
            Err(_) => false,
        }))
    }
}
