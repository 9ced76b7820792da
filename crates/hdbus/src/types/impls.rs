// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bindings for std types: scalars, strings, sequences, maps and tuples.

use super::{struct_signature, Append, Basic, DBusBool, DBusType};
use crate::builder::{BuildResult, MessageBuilder};
use crate::schema::{Schema, Schematic, Slot};
use crate::wire::{BasicValue, FixedArray, ObjectPath, Signature, WireType};
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

/// Fixed-size scalars: a basic wire type plus a bulk array form.
macro_rules! impl_fixed {
    ($($ty:ty => $wire:ident),+ $(,)?) => {
        $(
            impl DBusType for $ty {
                fn signature() -> Signature {
                    Signature::basic(WireType::$wire)
                }
            }

            impl Basic for $ty {
                const WIRE_TYPE: WireType = WireType::$wire;

                fn to_basic(&self) -> BasicValue {
                    BasicValue::$wire(*self)
                }

                fn from_basic(value: BasicValue) -> Option<Self> {
                    match value {
                        BasicValue::$wire(v) => Some(v),
                        _ => None,
                    }
                }
            }

            impl Append for $ty {
                fn append(&self, builder: &mut MessageBuilder<'_>) -> BuildResult<()> {
                    builder.push_basic(self.to_basic()).map(|_| ())
                }

                fn fixed_array(items: &[Self]) -> Option<FixedArray> {
                    Some(FixedArray::$wire(items.to_vec()))
                }
            }

            impl Schematic for $ty {
                const FIXED_ELEMENT: Option<WireType> = Some(WireType::$wire);

                fn slot(&mut self) -> Slot<'_> {
                    Slot::Basic(self)
                }

                fn extend_fixed(dest: &mut Vec<Self>, array: FixedArray) -> bool {
                    match array {
                        FixedArray::$wire(items) => {
                            dest.extend(items);
                            true
                        }
                        _ => false,
                    }
                }
            }
        )+
    };
}

impl_fixed!(
    u8 => Byte,
    i16 => Int16,
    u16 => Uint16,
    i32 => Int32,
    u32 => Uint32,
    i64 => Int64,
    u64 => Uint64,
    f64 => Double,
);

impl DBusType for DBusBool {
    fn signature() -> Signature {
        Signature::basic(WireType::Boolean)
    }
}

impl Basic for DBusBool {
    const WIRE_TYPE: WireType = WireType::Boolean;

    fn to_basic(&self) -> BasicValue {
        BasicValue::Boolean(self.0)
    }

    fn from_basic(value: BasicValue) -> Option<Self> {
        match value {
            BasicValue::Boolean(v) => Some(Self(v)),
            _ => None,
        }
    }
}

impl Append for DBusBool {
    fn append(&self, builder: &mut MessageBuilder<'_>) -> BuildResult<()> {
        builder.push_basic(self.to_basic()).map(|_| ())
    }

    fn fixed_array(items: &[Self]) -> Option<FixedArray> {
        Some(FixedArray::Boolean(items.iter().map(|b| b.0).collect()))
    }
}

impl Schematic for DBusBool {
    const FIXED_ELEMENT: Option<WireType> = Some(WireType::Boolean);

    fn slot(&mut self) -> Slot<'_> {
        Slot::Basic(self)
    }

    fn extend_fixed(dest: &mut Vec<Self>, array: FixedArray) -> bool {
        match array {
            FixedArray::Boolean(items) => {
                dest.extend(items.into_iter().map(Self));
                true
            }
            _ => false,
        }
    }
}

/// String-like scalars; variable length, so no bulk form.
macro_rules! impl_text {
    ($($ty:ident => $wire:ident),+ $(,)?) => {
        $(
            impl DBusType for $ty {
                fn signature() -> Signature {
                    Signature::basic(WireType::$wire)
                }
            }

            impl Append for $ty {
                fn append(&self, builder: &mut MessageBuilder<'_>) -> BuildResult<()> {
                    builder.push_basic(self.to_basic()).map(|_| ())
                }
            }

            impl Schematic for $ty {
                fn slot(&mut self) -> Slot<'_> {
                    Slot::Basic(self)
                }
            }
        )+
    };
}

impl_text!(String => String, ObjectPath => ObjectPath, Signature => Signature);

impl Basic for String {
    const WIRE_TYPE: WireType = WireType::String;

    fn to_basic(&self) -> BasicValue {
        BasicValue::String(self.clone())
    }

    /// Object paths are accepted where a string is expected.
    fn from_basic(value: BasicValue) -> Option<Self> {
        match value {
            BasicValue::String(s) => Some(s),
            BasicValue::ObjectPath(p) => Some(p.into_string()),
            _ => None,
        }
    }
}

impl Basic for ObjectPath {
    const WIRE_TYPE: WireType = WireType::ObjectPath;

    fn to_basic(&self) -> BasicValue {
        BasicValue::ObjectPath(self.clone())
    }

    fn from_basic(value: BasicValue) -> Option<Self> {
        match value {
            BasicValue::ObjectPath(p) => Some(p),
            _ => None,
        }
    }
}

impl Basic for Signature {
    const WIRE_TYPE: WireType = WireType::Signature;

    fn to_basic(&self) -> BasicValue {
        BasicValue::Signature(self.clone())
    }

    fn from_basic(value: BasicValue) -> Option<Self> {
        match value {
            BasicValue::Signature(s) => Some(s),
            _ => None,
        }
    }
}

impl DBusType for str {
    fn signature() -> Signature {
        Signature::basic(WireType::String)
    }
}

impl Append for str {
    fn append(&self, builder: &mut MessageBuilder<'_>) -> BuildResult<()> {
        builder
            .push_basic(BasicValue::String(self.to_string()))
            .map(|_| ())
    }
}

impl<T: DBusType + ?Sized> DBusType for &T {
    fn signature() -> Signature {
        T::signature()
    }
}

impl<T: Append + ?Sized> Append for &T {
    fn append(&self, builder: &mut MessageBuilder<'_>) -> BuildResult<()> {
        (**self).append(builder)
    }
}

// ----------------------------------------------------------------------------
// Sequences
// ----------------------------------------------------------------------------

fn append_slice<T: Append + DBusType>(items: &[T], builder: &mut MessageBuilder<'_>) -> BuildResult<()> {
    if let Some(array) = T::fixed_array(items) {
        builder.push_fixed_array(array)?;
        return Ok(());
    }
    builder.begin_array_of(T::signature().as_str())?;
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            builder.next()?;
        }
        item.append(builder)?;
    }
    builder.end_array()?;
    Ok(())
}

impl<T: DBusType> DBusType for [T] {
    fn signature() -> Signature {
        Signature::array_of(&T::signature())
    }
}

impl<T: Append + DBusType> Append for [T] {
    fn append(&self, builder: &mut MessageBuilder<'_>) -> BuildResult<()> {
        append_slice(self, builder)
    }
}

impl<T: DBusType> DBusType for Vec<T> {
    fn signature() -> Signature {
        Signature::array_of(&T::signature())
    }
}

impl<T: Append + DBusType> Append for Vec<T> {
    fn append(&self, builder: &mut MessageBuilder<'_>) -> BuildResult<()> {
        append_slice(self, builder)
    }
}

impl<T: Schematic + Default> Schematic for Vec<T> {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Array(self)
    }
}

// ----------------------------------------------------------------------------
// Maps
// ----------------------------------------------------------------------------

fn append_dict<'a, K, V>(
    entries: impl Iterator<Item = (&'a K, &'a V)>,
    builder: &mut MessageBuilder<'_>,
) -> BuildResult<()>
where
    K: Basic + 'a,
    V: Append + DBusType + 'a,
{
    let entry = format!("{{{}{}}}", K::WIRE_TYPE.code() as char, V::signature());
    builder.begin_array_of(&entry)?;
    for (key, value) in entries {
        builder.begin_dict_entry()?;
        builder.push_basic(key.to_basic())?;
        value.append(builder)?;
        builder.end_dict_entry()?;
    }
    builder.end_array()?;
    Ok(())
}

impl<K: Basic, V: DBusType, S> DBusType for HashMap<K, V, S> {
    fn signature() -> Signature {
        Signature::dict_of(K::WIRE_TYPE, &V::signature())
    }
}

impl<K, V, S> Append for HashMap<K, V, S>
where
    K: Basic,
    V: Append + DBusType,
{
    fn append(&self, builder: &mut MessageBuilder<'_>) -> BuildResult<()> {
        append_dict(self.iter(), builder)
    }
}

impl<K, V, S> Schematic for HashMap<K, V, S>
where
    K: Basic + Eq + Hash,
    V: Schematic + Default,
    S: BuildHasher,
{
    fn slot(&mut self) -> Slot<'_> {
        Slot::Dict(self)
    }
}

impl<K: Basic, V: DBusType> DBusType for BTreeMap<K, V> {
    fn signature() -> Signature {
        Signature::dict_of(K::WIRE_TYPE, &V::signature())
    }
}

impl<K, V> Append for BTreeMap<K, V>
where
    K: Basic,
    V: Append + DBusType,
{
    fn append(&self, builder: &mut MessageBuilder<'_>) -> BuildResult<()> {
        append_dict(self.iter(), builder)
    }
}

impl<K, V> Schematic for BTreeMap<K, V>
where
    K: Basic + Ord,
    V: Schematic + Default,
{
    fn slot(&mut self) -> Slot<'_> {
        Slot::Dict(self)
    }
}

// ----------------------------------------------------------------------------
// Tuples travel as structs
// ----------------------------------------------------------------------------

macro_rules! impl_tuple {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: DBusType),+> DBusType for ($($name,)+) {
            fn signature() -> Signature {
                struct_signature(&[$($name::signature()),+])
            }
        }

        impl<$($name: Append),+> Append for ($($name,)+) {
            fn append(&self, builder: &mut MessageBuilder<'_>) -> BuildResult<()> {
                builder.begin_struct()?;
                $(self.$idx.append(builder)?;)+
                builder.end_struct()?;
                Ok(())
            }
        }

        impl<$($name: Schematic),+> Schematic for ($($name,)+) {
            fn slot(&mut self) -> Slot<'_> {
                Slot::Struct(Schema::new()$(.field(&mut self.$idx))+)
            }
        }
    };
}

impl_tuple!(A: 0);
impl_tuple!(A: 0, B: 1);
impl_tuple!(A: 0, B: 1, C: 2);
impl_tuple!(A: 0, B: 1, C: 2, D: 3);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);
