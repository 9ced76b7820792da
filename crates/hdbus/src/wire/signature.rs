// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type signatures.

use super::{WireError, WireResult, WireType};
use std::fmt;

/// Longest signature the protocol allows.
pub const MAX_SIGNATURE_LEN: usize = 255;
/// Maximum array nesting inside one signature.
pub const MAX_ARRAY_NESTING: usize = 32;
/// Maximum struct / dict-entry nesting inside one signature.
pub const MAX_STRUCT_NESTING: usize = 32;

/// A validated D-Bus type signature: zero or more complete types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Signature(String);

impl Signature {
    /// Validate and wrap a signature string.
    pub fn new(sig: impl Into<String>) -> WireResult<Self> {
        let sig = sig.into();
        validate(&sig)?;
        Ok(Self(sig))
    }

    /// The empty signature (a message with no arguments).
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Wrap a string already known to be valid (built from validated parts).
    pub(crate) fn from_trusted(sig: String) -> Self {
        debug_assert!(validate(&sig).is_ok(), "untrusted signature {sig:?}");
        Self(sig)
    }

    /// Wrap an array element signature known to be valid. Unlike
    /// [`Signature::from_trusted`] this admits a lone dict entry `{..}`.
    pub(crate) fn from_trusted_element(sig: String) -> Self {
        debug_assert!(validate(&format!("a{sig}")).is_ok(), "untrusted element signature {sig:?}");
        Self(sig)
    }

    /// Signature of a single basic type.
    pub fn basic(ty: WireType) -> Self {
        debug_assert!(ty.is_basic());
        Self::from_trusted((ty.code() as char).to_string())
    }

    /// `a` + `element`.
    pub fn array_of(element: &Signature) -> Self {
        Self::from_trusted(format!("a{}", element.0))
    }

    /// `a{` + `key` + `value` + `}`.
    pub fn dict_of(key: WireType, value: &Signature) -> Self {
        debug_assert!(key.is_basic());
        Self::from_trusted(format!("a{{{}{}}}", key.code() as char, value.0))
    }

    /// `(` + concatenated members + `)`.
    pub fn struct_of<'a>(members: impl IntoIterator<Item = &'a Signature>) -> WireResult<Self> {
        let mut out = String::from("(");
        for member in members {
            out.push_str(&member.0);
        }
        out.push(')');
        Self::new(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Type of the first complete type (`Invalid` when empty).
    pub fn first_type(&self) -> WireType {
        self.0
            .as_bytes()
            .first()
            .and_then(|c| WireType::from_code(*c))
            .unwrap_or(WireType::Invalid)
    }

    /// True when the signature holds exactly one complete type, which is
    /// what array elements and variant payloads require.
    pub fn is_single_complete_type(&self) -> bool {
        is_single_complete_type(&self.0)
    }

    /// Iterate over the complete types making up the signature.
    pub fn complete_types(&self) -> CompleteTypes<'_> {
        CompleteTypes { rest: &self.0 }
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Signature {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Signature {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Signature {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl TryFrom<&str> for Signature {
    type Error = WireError;

    fn try_from(value: &str) -> WireResult<Self> {
        Self::new(value)
    }
}

/// Iterator returned by [`Signature::complete_types`].
pub struct CompleteTypes<'a> {
    rest: &'a str,
}

impl<'a> Iterator for CompleteTypes<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        let len = complete_type_len(self.rest.as_bytes(), 0).ok()?;
        let (head, tail) = self.rest.split_at(len);
        self.rest = tail;
        Some(head)
    }
}

pub(crate) fn is_single_complete_type(sig: &str) -> bool {
    !sig.is_empty() && matches!(complete_type_len(sig.as_bytes(), 0), Ok(n) if n == sig.len())
}

fn validate(sig: &str) -> WireResult<()> {
    if sig.len() > MAX_SIGNATURE_LEN {
        return Err(invalid(sig, "longer than 255 bytes"));
    }
    let bytes = sig.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() {
        pos += parse_complete(bytes, pos, 0, 0, false).map_err(|reason| invalid(sig, reason))?;
    }
    Ok(())
}

fn invalid(sig: &str, reason: &'static str) -> WireError {
    WireError::InvalidSignature {
        signature: sig.to_string(),
        reason,
    }
}

/// Length in bytes of the complete type starting at `start`.
pub(crate) fn complete_type_len(sig: &[u8], start: usize) -> WireResult<usize> {
    element_type_len(sig, start, false)
}

/// Like [`complete_type_len`], but a dict entry is accepted at `start` when
/// `in_array` is set, i.e. `sig` is the element signature of an array.
pub(crate) fn element_type_len(sig: &[u8], start: usize, in_array: bool) -> WireResult<usize> {
    parse_complete(sig, start, 0, 0, in_array).map_err(|reason| WireError::InvalidSignature {
        signature: String::from_utf8_lossy(sig).into_owned(),
        reason,
    })
}

fn parse_complete(
    sig: &[u8],
    start: usize,
    arrays: usize,
    structs: usize,
    in_array: bool,
) -> Result<usize, &'static str> {
    let Some(&code) = sig.get(start) else {
        return Err("truncated complete type");
    };
    match code {
        b'y' | b'b' | b'n' | b'q' | b'i' | b'u' | b'x' | b't' | b'd' | b's' | b'o' | b'g'
        | b'v' => Ok(1),
        b'a' => {
            if arrays + 1 > MAX_ARRAY_NESTING {
                return Err("array nesting too deep");
            }
            Ok(1 + parse_complete(sig, start + 1, arrays + 1, structs, true)?)
        }
        b'(' => {
            if structs + 1 > MAX_STRUCT_NESTING {
                return Err("struct nesting too deep");
            }
            let mut pos = start + 1;
            let mut members = 0;
            loop {
                match sig.get(pos) {
                    None => return Err("unterminated struct"),
                    Some(b')') => break,
                    Some(_) => {
                        pos += parse_complete(sig, pos, arrays, structs + 1, false)?;
                        members += 1;
                    }
                }
            }
            if members == 0 {
                return Err("empty struct");
            }
            Ok(pos + 1 - start)
        }
        b'{' => {
            if !in_array {
                return Err("dict entry outside of an array");
            }
            if structs + 1 > MAX_STRUCT_NESTING {
                return Err("struct nesting too deep");
            }
            let key = *sig.get(start + 1).ok_or("truncated dict entry")?;
            if !WireType::from_code(key).is_some_and(WireType::is_basic) {
                return Err("dict entry key must be a basic type");
            }
            let value_len = parse_complete(sig, start + 2, arrays, structs + 1, false)?;
            let close = start + 2 + value_len;
            match sig.get(close) {
                Some(b'}') => Ok(close + 1 - start),
                _ => Err("dict entry must hold exactly two types"),
            }
        }
        b')' | b'}' => Err("unbalanced closing delimiter"),
        _ => Err("unknown type code"),
    }
}
