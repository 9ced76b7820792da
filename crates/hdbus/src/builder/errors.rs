// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use crate::types::RegistryError;
use crate::wire::WireError;
use thiserror::Error;

/// Append builder failures.
///
/// Structural errors (`Unbalanced`, `UnclosedContainers`, arity errors) are
/// caller bugs; they are reported before any byte reaches the message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("end_{expected} called while the innermost open container is {found}")]
    Unbalanced {
        expected: &'static str,
        found: &'static str,
    },

    #[error("{0} containers still open at end_message")]
    UnclosedContainers(usize),

    #[error("empty array has no element signature; use begin_array_of")]
    EmptyArraySignature,

    #[error("array elements disagree: expected {expected:?}, found {found:?}")]
    HeterogeneousArray { expected: String, found: String },

    #[error("variant must hold exactly one value, got {0}")]
    VariantArity(usize),

    #[error("dict entry must hold a key and a value, got {0} values")]
    DictEntryArity(usize),

    #[error("dict entry key {0:?} is not a basic type")]
    InvalidDictKey(String),

    #[error("struct has no members")]
    EmptyStruct,

    #[error("{0} is only valid directly inside an array")]
    NotInArray(&'static str),

    #[error("containers nested deeper than {0} levels")]
    DepthExceeded(usize),

    #[error("registered signature {registered:?} differs from declared {declared:?}")]
    SignatureMismatch { registered: String, declared: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Wire(#[from] WireError),
}

pub type BuildResult<T> = Result<T, BuildError>;
