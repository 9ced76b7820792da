// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Static type bindings between Rust values and D-Bus wire types.
//!
//! - [`Basic`]: scalar Rust types with a one-character wire type
//! - [`DBusType`]: types with a signature known at compile time
//! - [`Append`]: values the [`MessageBuilder`](crate::MessageBuilder) can push
//! - [`Aggregate`]: struct-like types registered in a [`TypeRegistry`]
//!
//! Native `bool` and `f32` have no binding. Booleans travel as four bytes,
//! so callers use [`DBusBool`]; pushing a `bool` does not compile:
//!
//! ```compile_fail
//! use hdbus::{Message, MessageBuilder, TypeRegistry};
//!
//! let registry = TypeRegistry::with_builtins();
//! let msg = Message::signal("/a", "org.example.A", "Changed").unwrap();
//! let mut builder = MessageBuilder::new(msg, &registry);
//! builder.push(&true).unwrap();
//! ```
//!
//! ```compile_fail
//! use hdbus::{Message, MessageBuilder, TypeRegistry};
//!
//! let registry = TypeRegistry::with_builtins();
//! let msg = Message::signal("/a", "org.example.A", "Changed").unwrap();
//! let mut builder = MessageBuilder::new(msg, &registry);
//! builder.push(&1.5f32).unwrap();
//! ```

mod impls;
mod registry;

pub use registry::{RegistryError, TypeEntry, TypeKey, TypeRegistry};

use crate::builder::{BuildResult, MessageBuilder};
use crate::schema::Schematic;
use crate::wire::{BasicValue, FixedArray, Signature, WireType};

/// A boolean as the wire carries it: a 4-byte 0/1 integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct DBusBool(pub bool);

impl From<bool> for DBusBool {
    fn from(value: bool) -> Self {
        Self(value)
    }
}

impl From<DBusBool> for bool {
    fn from(value: DBusBool) -> Self {
        value.0
    }
}

/// A type whose wire signature is fixed at compile time.
pub trait DBusType {
    fn signature() -> Signature;
}

/// A scalar with a one-character wire type. Only these may be dictionary
/// keys.
pub trait Basic: DBusType + Sized {
    const WIRE_TYPE: WireType;

    fn to_basic(&self) -> BasicValue;

    /// Convert a decoded value back; `None` when the variant does not match.
    fn from_basic(value: BasicValue) -> Option<Self>;
}

/// A value that knows how to push itself onto a builder.
pub trait Append {
    fn append(&self, builder: &mut MessageBuilder<'_>) -> BuildResult<()>;

    /// Bulk representation of a slice of this type, for fixed-size basics.
    #[doc(hidden)]
    fn fixed_array(items: &[Self]) -> Option<FixedArray>
    where
        Self: Sized,
    {
        let _ = items;
        None
    }
}

/// How an aggregate's members are delimited on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    /// `(...)`
    Struct,
    /// `{kv}`, only valid as an array element.
    DictEntry,
}

/// A user-defined struct-like type, usually through `#[derive(DBusStruct)]`.
pub trait Aggregate: DBusType + Append + Schematic + Default + 'static {
    const KIND: AggregateKind = AggregateKind::Struct;

    /// Registry keys of the members, in declaration order.
    fn member_keys() -> Vec<TypeKey>;

    /// Register the member types themselves, so that
    /// [`TypeRegistry::register`] can resolve them.
    fn register_members(registry: &mut TypeRegistry) -> Result<(), RegistryError> {
        let _ = registry;
        Ok(())
    }
}

/// Concatenate member signatures inside struct delimiters.
#[doc(hidden)]
pub fn struct_signature(members: &[Signature]) -> Signature {
    let mut out = String::from("(");
    for member in members {
        out.push_str(member.as_str());
    }
    out.push(')');
    Signature::from_trusted(out)
}
