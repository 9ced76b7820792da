// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type registry: type identity to wire signature.
//!
//! A registry is built once, usually with [`TypeRegistry::with_builtins`],
//! extended with the aggregates an application uses, and then shared by
//! reference with builders and decoders. Registering the same key twice with
//! the same signature is accepted; a different signature is a
//! [`RegistryError::Conflict`].

use super::{Aggregate, AggregateKind, DBusBool, DBusType};
use crate::wire::{ObjectPath, Signature, WireError, WireType};
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Stable identity of a Rust type.
#[derive(Debug, Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// One registered type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeEntry {
    signature: Signature,
    basic: bool,
    key: TypeKey,
}

impl TypeEntry {
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn is_basic(&self) -> bool {
        self.basic
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Wire type of the first signature character.
    pub fn wire_type(&self) -> WireType {
        self.signature.first_type()
    }
}

/// Registry failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("unknown type {0}")]
    UnknownType(&'static str),

    #[error("type {name} already registered as {existing:?}, not {requested:?}")]
    Conflict {
        name: &'static str,
        existing: String,
        requested: String,
    },

    #[error("{0} is not a basic type")]
    NotBasic(WireType),

    #[error("dict entry needs a basic key and one value, got {0} members")]
    DictEntryArity(usize),

    #[error("dict entry key {0} is not a basic type")]
    InvalidDictKey(&'static str),

    #[error(transparent)]
    Wire(#[from] WireError),
}

/// Mapping from [`TypeKey`] to [`TypeEntry`].
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    entries: HashMap<TypeKey, TypeEntry>,
}

macro_rules! register_builtin {
    ($registry:ident, $($ty:ty => $wire:ident),+ $(,)?) => {
        $(
            $registry.insert(TypeKey::of::<$ty>(), Signature::basic(WireType::$wire), true);
            $registry.insert(
                TypeKey::of::<Vec<$ty>>(),
                Signature::array_of(&Signature::basic(WireType::$wire)),
                false,
            );
        )+
    };
}

impl TypeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every basic type and arrays of them.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        register_builtin!(registry,
            u8 => Byte,
            DBusBool => Boolean,
            i16 => Int16,
            u16 => Uint16,
            i32 => Int32,
            u32 => Uint32,
            i64 => Int64,
            u64 => Uint64,
            f64 => Double,
            String => String,
            ObjectPath => ObjectPath,
            Signature => Signature,
        );
        log::debug!(
            "[hdbus::registry] built-in registry with {} types",
            registry.len()
        );
        registry
    }

    fn insert(&mut self, key: TypeKey, signature: Signature, basic: bool) {
        self.entries.insert(
            key,
            TypeEntry {
                signature,
                basic,
                key,
            },
        );
    }

    fn admit(&mut self, key: TypeKey, signature: Signature, basic: bool) -> Result<&TypeEntry, RegistryError> {
        if let Some(existing) = self.entries.get(&key) {
            if existing.signature != signature {
                return Err(RegistryError::Conflict {
                    name: key.name,
                    existing: existing.signature.to_string(),
                    requested: signature.into_string(),
                });
            }
        } else {
            log::trace!("[hdbus::registry] {} => {}", key, signature);
            self.insert(key, signature, basic);
        }
        self.lookup(&key)
    }

    /// Register `key` as the basic wire type `ty`.
    pub fn register_basic(&mut self, key: TypeKey, ty: WireType) -> Result<&TypeEntry, RegistryError> {
        if !ty.is_basic() {
            return Err(RegistryError::NotBasic(ty));
        }
        self.admit(key, Signature::basic(ty), true)
    }

    /// Register an aggregate from already-registered members and return its
    /// signature: `(...)` for structs, `{kv}` for dict entries.
    pub fn register_aggregate(
        &mut self,
        key: TypeKey,
        kind: AggregateKind,
        members: &[TypeKey],
    ) -> Result<Signature, RegistryError> {
        let mut inner = String::new();
        for (index, member) in members.iter().enumerate() {
            let entry = self.lookup(member)?;
            if kind == AggregateKind::DictEntry && index == 0 && !entry.basic {
                return Err(RegistryError::InvalidDictKey(member.name));
            }
            inner.push_str(entry.signature.as_str());
        }
        let signature = match kind {
            AggregateKind::Struct => Signature::new(format!("({inner})"))?,
            AggregateKind::DictEntry => {
                if members.len() != 2 {
                    return Err(RegistryError::DictEntryArity(members.len()));
                }
                // dict entries only validate as array elements
                let array = Signature::new(format!("a{{{inner}}}"))?;
                Signature::from_trusted_element(array.as_str()[1..].to_string())
            }
        };
        Ok(self.admit(key, signature, false)?.signature.clone())
    }

    /// Register any type with a static signature.
    pub fn register_dbus_type<T: DBusType + 'static>(&mut self) -> Result<&TypeEntry, RegistryError> {
        let signature = T::signature();
        let basic = signature.len() == 1 && signature.first_type().is_basic();
        self.admit(TypeKey::of::<T>(), signature, basic)
    }

    /// Register an aggregate from its declared members.
    pub fn register<T: Aggregate>(&mut self) -> Result<Signature, RegistryError> {
        T::register_members(self)?;
        self.register_aggregate(TypeKey::of::<T>(), T::KIND, &T::member_keys())
    }

    pub fn lookup(&self, key: &TypeKey) -> Result<&TypeEntry, RegistryError> {
        self.entries
            .get(key)
            .ok_or(RegistryError::UnknownType(key.name))
    }

    pub fn lookup_type<T: ?Sized + 'static>(&self) -> Result<&TypeEntry, RegistryError> {
        self.lookup(&TypeKey::of::<T>())
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
