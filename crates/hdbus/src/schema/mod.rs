// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema descriptors: the expected shape of an incoming body.
//!
//! A [`Schema`] is an ordered list of [`Slot`]s, each borrowing the caller's
//! destination for one wire value. It is used for the top-level argument
//! list and for nested structs alike.
//!
//! # Example
//!
//! ```
//! use hdbus::{Schema, Slot};
//!
//! let mut id = 0u32;
//! let mut names: Vec<String> = Vec::new();
//! let schema = Schema::new().field(&mut id).field(&mut names).ignore();
//! assert_eq!(schema.len(), 3);
//! assert!(matches!(schema.slots()[2], Slot::Ignore));
//! ```

use crate::decode::VariantReader;
use crate::types::Basic;
use crate::wire::{BasicValue, FixedArray, WireType};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hash};

/// One expected wire value.
pub enum Slot<'a> {
    /// A scalar destination.
    Basic(&'a mut dyn BasicSlot),
    /// A nested struct.
    Struct(Schema<'a>),
    /// A growable sequence; each element is decoded into fresh storage.
    Array(&'a mut dyn ArraySink),
    /// A map filled from an array of dict entries.
    Dict(&'a mut dyn DictSink),
    /// A variant handed to a caller callback.
    Variant(VariantSlot<'a>),
    /// Consume one value without checking its type.
    Ignore,
    /// Apply the previous slot to every remaining value at this level.
    Bump,
}

impl Slot<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Basic(_) => "basic",
            Self::Struct(_) => "struct",
            Self::Array(_) => "array",
            Self::Dict(_) => "dict",
            Self::Variant(_) => "variant",
            Self::Ignore => "ignore",
            Self::Bump => "bump",
        }
    }

    /// Wire type this slot accepts; `None` accepts any value.
    pub fn wire_type(&self) -> Option<WireType> {
        match self {
            Self::Basic(dest) => Some(dest.wire_type()),
            Self::Struct(_) => Some(WireType::Struct),
            Self::Array(_) | Self::Dict(_) => Some(WireType::Array),
            Self::Variant(_) => Some(WireType::Variant),
            Self::Ignore | Self::Bump => None,
        }
    }
}

impl fmt::Debug for Slot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic(slot) => write!(f, "Basic({})", slot.wire_type()),
            Self::Struct(schema) => f.debug_tuple("Struct").field(schema).finish(),
            other => f.write_str(other.name()),
        }
    }
}

/// Ordered slot list for a top-level body or a struct.
#[derive(Debug, Default)]
pub struct Schema<'a> {
    pub(crate) slots: Vec<Slot<'a>>,
}

impl<'a> Schema<'a> {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Decode the next value into `dest`.
    pub fn field<T: Schematic + ?Sized>(mut self, dest: &'a mut T) -> Self {
        self.slots.push(dest.slot());
        self
    }

    /// A nested struct described by its own schema.
    pub fn nested(mut self, schema: Schema<'a>) -> Self {
        self.slots.push(Slot::Struct(schema));
        self
    }

    /// A variant parsed by `parse`; returning false fails the decode.
    pub fn variant(mut self, parse: impl FnMut(&mut VariantReader<'_, '_>) -> bool + 'a) -> Self {
        self.slots.push(Slot::Variant(VariantSlot::new(parse)));
        self
    }

    pub fn ignore(mut self) -> Self {
        self.slots.push(Slot::Ignore);
        self
    }

    pub fn bump(mut self) -> Self {
        self.slots.push(Slot::Bump);
        self
    }

    pub fn slot(mut self, slot: Slot<'a>) -> Self {
        self.slots.push(slot);
        self
    }

    pub fn slots(&self) -> &[Slot<'a>] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Caller-supplied variant parser.
pub struct VariantSlot<'a> {
    pub(crate) parse: Box<dyn FnMut(&mut VariantReader<'_, '_>) -> bool + 'a>,
}

impl<'a> VariantSlot<'a> {
    pub fn new(parse: impl FnMut(&mut VariantReader<'_, '_>) -> bool + 'a) -> Self {
        Self {
            parse: Box::new(parse),
        }
    }
}

/// Destination for one basic value.
pub trait BasicSlot {
    fn wire_type(&self) -> WireType;

    /// Store `value`; false when it is not of this slot's type.
    fn store(&mut self, value: BasicValue) -> bool;
}

impl<T: Basic> BasicSlot for T {
    fn wire_type(&self) -> WireType {
        T::WIRE_TYPE
    }

    fn store(&mut self, value: BasicValue) -> bool {
        match T::from_basic(value) {
            Some(v) => {
                *self = v;
                true
            }
            None => false,
        }
    }
}

/// Destination for array elements.
pub trait ArraySink {
    fn clear(&mut self);

    /// Wire type every element must have; `None` accepts any.
    fn element_type(&self) -> Option<WireType> {
        None
    }

    /// Element type eligible for a bulk read, if any.
    fn fixed_element(&self) -> Option<WireType> {
        None
    }

    /// Append a bulk-read run; false when the element type does not match.
    fn extend_fixed(&mut self, array: FixedArray) -> bool {
        let _ = array;
        false
    }

    /// Append default storage for one element and return its slot.
    fn push_element(&mut self) -> Slot<'_>;
}

impl<T: Schematic + Default> ArraySink for Vec<T> {
    fn clear(&mut self) {
        Vec::clear(self);
    }

    fn element_type(&self) -> Option<WireType> {
        T::default().slot().wire_type()
    }

    fn fixed_element(&self) -> Option<WireType> {
        T::FIXED_ELEMENT
    }

    fn extend_fixed(&mut self, array: FixedArray) -> bool {
        T::extend_fixed(self, array)
    }

    fn push_element(&mut self) -> Slot<'_> {
        self.push(T::default());
        match self.last_mut() {
            Some(element) => element.slot(),
            None => Slot::Ignore,
        }
    }
}

/// Destination for dict entries.
pub trait DictSink {
    fn key_type(&self) -> WireType;

    fn clear(&mut self);

    /// Reset the value stored under `key` and return its slot; `None` when
    /// the key has the wrong type.
    fn entry_slot(&mut self, key: BasicValue) -> Option<Slot<'_>>;
}

impl<K, V, S> DictSink for HashMap<K, V, S>
where
    K: Basic + Eq + Hash,
    V: Schematic + Default,
    S: BuildHasher,
{
    fn key_type(&self) -> WireType {
        K::WIRE_TYPE
    }

    fn clear(&mut self) {
        HashMap::clear(self);
    }

    fn entry_slot(&mut self, key: BasicValue) -> Option<Slot<'_>> {
        let key = K::from_basic(key)?;
        let value = self.entry(key).or_default();
        *value = V::default();
        Some(value.slot())
    }
}

impl<K, V> DictSink for BTreeMap<K, V>
where
    K: Basic + Ord,
    V: Schematic + Default,
{
    fn key_type(&self) -> WireType {
        K::WIRE_TYPE
    }

    fn clear(&mut self) {
        BTreeMap::clear(self);
    }

    fn entry_slot(&mut self, key: BasicValue) -> Option<Slot<'_>> {
        let key = K::from_basic(key)?;
        let value = self.entry(key).or_default();
        *value = V::default();
        Some(value.slot())
    }
}

/// A type that can describe itself as a schema slot.
///
/// Dictionary keys must be [`Basic`], so a map keyed by a vector or a
/// struct is rejected at compile time:
///
/// ```compile_fail
/// use hdbus::Schema;
/// use std::collections::HashMap;
///
/// let mut bad: HashMap<Vec<u8>, i32> = HashMap::new();
/// let _ = Schema::new().field(&mut bad);
/// ```
pub trait Schematic {
    /// Bulk-readable element type when used inside a `Vec`.
    #[doc(hidden)]
    const FIXED_ELEMENT: Option<WireType> = None;

    fn slot(&mut self) -> Slot<'_>;

    #[doc(hidden)]
    fn extend_fixed(dest: &mut Vec<Self>, array: FixedArray) -> bool
    where
        Self: Sized,
    {
        let _ = (dest, array);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_slot_store() {
        let mut x = 0i32;
        assert!(BasicSlot::store(&mut x, BasicValue::Int32(9)));
        assert_eq!(x, 9);
        assert!(!BasicSlot::store(&mut x, BasicValue::Uint32(9)));
        assert_eq!(BasicSlot::wire_type(&x), WireType::Int32);
    }

    #[test]
    fn test_string_slot_accepts_object_path() {
        let mut s = String::new();
        let path = crate::wire::ObjectPath::new("/a/b").unwrap();
        assert!(BasicSlot::store(&mut s, BasicValue::ObjectPath(path)));
        assert_eq!(s, "/a/b");
    }

    #[test]
    fn test_array_sink_push() {
        let mut v: Vec<u16> = vec![1];
        ArraySink::clear(&mut v);
        assert_eq!(v.fixed_element(), Some(WireType::Uint16));
        assert!(v.extend_fixed(FixedArray::Uint16(vec![4, 5])));
        assert!(!v.extend_fixed(FixedArray::Byte(vec![4])));
        match v.push_element() {
            Slot::Basic(slot) => assert!(slot.store(BasicValue::Uint16(6))),
            other => panic!("unexpected slot {other:?}"),
        }
        assert_eq!(v, vec![4, 5, 6]);
    }

    #[test]
    fn test_dict_sink_resets_duplicate_keys() {
        let mut map: HashMap<String, Vec<i32>> = HashMap::new();
        map.insert("k".into(), vec![1, 2]);
        assert_eq!(map.key_type(), WireType::String);
        match map.entry_slot(BasicValue::String("k".into())) {
            Some(Slot::Array(_)) => {}
            other => panic!("unexpected slot {other:?}"),
        }
        assert_eq!(map["k"], Vec::<i32>::new());
        assert!(map.entry_slot(BasicValue::Int32(1)).is_none());
    }

    #[test]
    fn test_schema_builder() {
        let mut a = 0u8;
        let mut b = (0i32, String::new());
        let schema = Schema::new()
            .field(&mut a)
            .field(&mut b)
            .variant(|_| true)
            .bump();
        let names: Vec<_> = schema.slots().iter().map(Slot::name).collect();
        assert_eq!(names, vec!["basic", "struct", "variant", "bump"]);
    }
}
