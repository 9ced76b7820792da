// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use crate::wire::{WireError, WireType};
use thiserror::Error;

/// Decode failures. The walk stops at the first one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// The message is not the call the schema was written for. A routing
    /// signal rather than a failure.
    #[error("message does not match the expected call")]
    NotCalled,

    #[error("message has more fields than the schema requires")]
    MoreFieldsThanRequired,

    #[error("message has fewer fields than the schema requires")]
    LessFieldsThanRequired,

    #[error("expected {expected}, found {found}")]
    InvalidBasicType { expected: WireType, found: WireType },

    #[error("expected struct, found {found}")]
    InvalidStructType { found: WireType },

    #[error("expected array, found {found}")]
    InvalidArrayType { found: WireType },

    #[error("expected dictionary, found {found}")]
    InvalidDictionaryType { found: WireType },

    #[error("dictionary key: expected {expected}, found {found}")]
    InvalidDictionaryKey { expected: WireType, found: WireType },

    #[error("expected variant, found {found}")]
    InvalidVariantType { found: WireType },

    #[error("variant holding {signature:?} rejected by its parser")]
    InvalidVariantParsing { signature: String },

    #[error("unknown type {0}")]
    UnknownType(&'static str),

    #[error("nesting deeper than {0} levels")]
    DepthExceeded(usize),

    #[error(transparent)]
    Wire(#[from] WireError),
}

pub type DecodeResult<T> = Result<T, DecodeError>;
