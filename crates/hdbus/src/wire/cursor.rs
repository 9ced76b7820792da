// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Positional cursors over a marshalled body.
//!
//! An [`AppendCursor`] writes one nesting level, a [`ReadCursor`] reads one.
//! Opening a container on a cursor yields the child cursor for the nested
//! level; closing it commits the container boundary (array length, struct
//! delimiter) back through the parent.

use super::signature::{
    complete_type_len, element_type_len, is_single_complete_type, MAX_ARRAY_NESTING, MAX_SIGNATURE_LEN, MAX_STRUCT_NESTING,
};
use super::{BasicValue, FixedArray, ObjectPath, Signature, WireError, WireResult, WireType};

/// Deepest container nesting a cursor will follow.
const MAX_DEPTH: usize = MAX_ARRAY_NESTING + MAX_STRUCT_NESTING;

/// Protocol limit on the byte length of one array.
pub(crate) const DEFAULT_MAX_ARRAY_BYTES: usize = 64 * 1024 * 1024;

/// Marshalled message body: payload bytes plus the signature describing them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body {
    pub(crate) bytes: Vec<u8>,
    pub(crate) signature: String,
}

impl Body {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap already-marshalled bytes. The signature is validated; the bytes
    /// are checked lazily as they are read.
    pub fn from_parts(bytes: Vec<u8>, signature: Signature) -> Self {
        Self {
            bytes,
            signature: signature.into_string(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// ============================================================================
// Write helpers
// ============================================================================

pub(crate) fn align_up(offset: usize, alignment: usize) -> usize {
    (offset + alignment - 1) & !(alignment - 1)
}

pub(crate) fn pad_to(buf: &mut Vec<u8>, alignment: usize) {
    let target = align_up(buf.len(), alignment);
    buf.resize(target, 0);
}

/// Generate aligned little-endian writers for fixed-size integers.
macro_rules! impl_put_le {
    ($name:ident, $type:ty) => {
        pub(crate) fn $name(buf: &mut Vec<u8>, value: $type) {
            pad_to(buf, std::mem::size_of::<$type>());
            buf.extend_from_slice(&value.to_le_bytes());
        }
    };
}

impl_put_le!(put_i16, i16);
impl_put_le!(put_u16, u16);
impl_put_le!(put_i32, i32);
impl_put_le!(put_u32, u32);
impl_put_le!(put_i64, i64);
impl_put_le!(put_u64, u64);

pub(crate) fn put_u8(buf: &mut Vec<u8>, value: u8) {
    buf.push(value);
}

fn put_string(buf: &mut Vec<u8>, s: &str) {
    put_u32(buf, s.len() as u32);
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
}

fn put_signature(buf: &mut Vec<u8>, s: &str) {
    buf.push(s.len() as u8);
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
}

fn check_basic(value: &BasicValue) -> WireResult<()> {
    match value {
        BasicValue::String(s) if s.as_bytes().contains(&0) => Err(WireError::InteriorNul),
        _ => Ok(()),
    }
}

/// Append one basic value with its alignment padding.
pub(crate) fn put_basic(buf: &mut Vec<u8>, value: &BasicValue) {
    match value {
        BasicValue::Byte(v) => put_u8(buf, *v),
        BasicValue::Boolean(v) => put_u32(buf, u32::from(*v)),
        BasicValue::Int16(v) => put_i16(buf, *v),
        BasicValue::Uint16(v) => put_u16(buf, *v),
        BasicValue::Int32(v) => put_i32(buf, *v),
        BasicValue::Uint32(v) => put_u32(buf, *v),
        BasicValue::Int64(v) => put_i64(buf, *v),
        BasicValue::Uint64(v) => put_u64(buf, *v),
        BasicValue::Double(v) => put_u64(buf, v.to_bits()),
        BasicValue::String(s) => put_string(buf, s),
        BasicValue::ObjectPath(p) => put_string(buf, p.as_str()),
        BasicValue::Signature(s) => put_signature(buf, s.as_str()),
    }
}

fn put_fixed(buf: &mut Vec<u8>, array: &FixedArray) {
    pad_to(buf, array.element_type().alignment());
    match array {
        FixedArray::Byte(v) => buf.extend_from_slice(v),
        FixedArray::Boolean(v) => v.iter().for_each(|b| put_u32(buf, u32::from(*b))),
        FixedArray::Int16(v) => v.iter().for_each(|x| put_i16(buf, *x)),
        FixedArray::Uint16(v) => v.iter().for_each(|x| put_u16(buf, *x)),
        FixedArray::Int32(v) => v.iter().for_each(|x| put_i32(buf, *x)),
        FixedArray::Uint32(v) => v.iter().for_each(|x| put_u32(buf, *x)),
        FixedArray::Int64(v) => v.iter().for_each(|x| put_i64(buf, *x)),
        FixedArray::Uint64(v) => v.iter().for_each(|x| put_u64(buf, *x)),
        FixedArray::Double(v) => v.iter().for_each(|x| put_u64(buf, x.to_bits())),
    }
}

// ============================================================================
// Append cursor
// ============================================================================

#[derive(Debug, Clone)]
enum SigCheck {
    /// Types written at this level extend the body signature.
    Grow,
    /// Types written at this level must follow `sig`; array levels repeat it.
    Expect {
        sig: String,
        pos: usize,
        repeat: bool,
    },
}

#[derive(Debug, Clone, Copy)]
struct ArrayMark {
    len_pos: usize,
    content_start: usize,
}

/// Write cursor for one nesting level of a [`Body`].
#[derive(Debug)]
pub struct AppendCursor {
    container: WireType,
    check: SigCheck,
    array: Option<ArrayMark>,
    values: usize,
    max_array_bytes: usize,
}

impl AppendCursor {
    /// Cursor over the top level of a body; appends extend its signature.
    pub fn root() -> Self {
        Self {
            container: WireType::Invalid,
            check: SigCheck::Grow,
            array: None,
            values: 0,
            max_array_bytes: DEFAULT_MAX_ARRAY_BYTES,
        }
    }

    pub(crate) fn with_array_limit(mut self, max_array_bytes: usize) -> Self {
        self.max_array_bytes = max_array_bytes;
        self
    }

    /// Container type this cursor writes into (`Invalid` for the root).
    pub fn container(&self) -> WireType {
        self.container
    }

    /// Number of complete values written at this level.
    pub fn values(&self) -> usize {
        self.values
    }

    fn child(&self, container: WireType, check: SigCheck, array: Option<ArrayMark>) -> Self {
        Self {
            container,
            check,
            array,
            values: 0,
            max_array_bytes: self.max_array_bytes,
        }
    }

    /// Next complete type expected at this level; `None` once exhausted.
    fn take_expected(&mut self) -> Option<String> {
        let in_array = self.container == WireType::Array;
        let SigCheck::Expect { sig, pos, repeat } = &mut self.check else {
            return None;
        };
        if *pos >= sig.len() {
            return None;
        }
        let len = element_type_len(sig.as_bytes(), *pos, in_array).ok()?;
        let ty = sig[*pos..*pos + len].to_string();
        *pos += len;
        if *repeat && *pos == sig.len() {
            *pos = 0;
        }
        Some(ty)
    }

    fn grow(body: &mut Body, text: &str) -> WireResult<()> {
        if body.signature.len() + text.len() > MAX_SIGNATURE_LEN {
            return Err(WireError::InvalidSignature {
                signature: format!("{}{}", body.signature, text),
                reason: "longer than 255 bytes",
            });
        }
        body.signature.push_str(text);
        Ok(())
    }

    /// Claim the next signature slot for a complete type written whole.
    fn claim_exact(&mut self, body: &mut Body, ty: &str) -> WireResult<()> {
        if matches!(self.check, SigCheck::Grow) {
            return Self::grow(body, ty);
        }
        match self.take_expected() {
            Some(expected) if expected == ty => Ok(()),
            Some(expected) => Err(WireError::SignatureMismatch {
                expected,
                found: ty.to_string(),
            }),
            None => Err(WireError::SignatureMismatch {
                expected: String::new(),
                found: ty.to_string(),
            }),
        }
    }

    /// Claim the next slot for a struct or dict entry whose members follow.
    fn claim_delimited(&mut self, body: &mut Body, ty: WireType) -> WireResult<SigCheck> {
        if matches!(self.check, SigCheck::Grow) {
            if ty == WireType::DictEntry {
                return Err(WireError::SignatureMismatch {
                    expected: "a{..}".to_string(),
                    found: "{".to_string(),
                });
            }
            Self::grow(body, "(")?;
            return Ok(SigCheck::Grow);
        }
        match self.take_expected() {
            Some(expected) if expected.as_bytes().first() == Some(&ty.code()) => {
                let inner = expected[1..expected.len() - 1].to_string();
                Ok(SigCheck::Expect {
                    sig: inner,
                    pos: 0,
                    repeat: false,
                })
            }
            other => Err(WireError::SignatureMismatch {
                expected: other.unwrap_or_default(),
                found: (ty.code() as char).to_string(),
            }),
        }
    }

    /// Write one basic value.
    pub fn append_basic(&mut self, body: &mut Body, value: &BasicValue) -> WireResult<()> {
        check_basic(value)?;
        let code = [value.wire_type().code()];
        let ty = std::str::from_utf8(&code).map_err(|_| WireError::InvalidUtf8)?;
        self.claim_exact(body, ty)?;
        put_basic(&mut body.bytes, value);
        self.values += 1;
        Ok(())
    }

    /// Write a run of fixed-size elements into an open array.
    pub fn append_fixed_array(&mut self, body: &mut Body, array: &FixedArray) -> WireResult<()> {
        let element = [array.element_type().code()];
        match &self.check {
            SigCheck::Expect { sig, pos: 0, .. }
                if self.container == WireType::Array && sig.as_bytes() == element => {}
            SigCheck::Expect { sig, .. } => {
                return Err(WireError::SignatureMismatch {
                    expected: sig.clone(),
                    found: (element[0] as char).to_string(),
                })
            }
            SigCheck::Grow => return Err(WireError::NotAContainer(self.container)),
        }
        put_fixed(&mut body.bytes, array);
        self.values += array.len();
        Ok(())
    }

    /// Open a nested container and return the cursor writing its content.
    ///
    /// `inner` is the element signature for arrays and the content signature
    /// for variants; structs and dict entries take none.
    pub fn open_container(
        &mut self,
        body: &mut Body,
        ty: WireType,
        inner: Option<&str>,
    ) -> WireResult<AppendCursor> {
        let child = match ty {
            WireType::Struct | WireType::DictEntry => {
                if inner.is_some() {
                    return Err(WireError::UnexpectedInnerSignature(ty));
                }
                let check = self.claim_delimited(body, ty)?;
                pad_to(&mut body.bytes, 8);
                self.child(ty, check, None)
            }
            WireType::Array => {
                let element = inner.ok_or(WireError::MissingInnerSignature(ty))?;
                let full = format!("a{element}");
                if !is_single_complete_type(&full) {
                    return Err(WireError::InvalidSignature {
                        signature: full,
                        reason: "array element must be one complete type",
                    });
                }
                self.claim_exact(body, &full)?;
                pad_to(&mut body.bytes, 4);
                let len_pos = body.bytes.len();
                body.bytes.extend_from_slice(&[0; 4]);
                let align = WireType::from_code(element.as_bytes()[0])
                    .map_or(1, WireType::alignment);
                pad_to(&mut body.bytes, align);
                let mark = ArrayMark {
                    len_pos,
                    content_start: body.bytes.len(),
                };
                let check = SigCheck::Expect {
                    sig: element.to_string(),
                    pos: 0,
                    repeat: true,
                };
                self.child(ty, check, Some(mark))
            }
            WireType::Variant => {
                let content = inner.ok_or(WireError::MissingInnerSignature(ty))?;
                if !is_single_complete_type(content) {
                    return Err(WireError::InvalidSignature {
                        signature: content.to_string(),
                        reason: "variant must hold one complete type",
                    });
                }
                self.claim_exact(body, "v")?;
                put_signature(&mut body.bytes, content);
                let check = SigCheck::Expect {
                    sig: content.to_string(),
                    pos: 0,
                    repeat: false,
                };
                self.child(ty, check, None)
            }
            other => return Err(WireError::NotAContainer(other)),
        };
        self.values += 1;
        Ok(child)
    }

    /// Commit the closing boundary of `child`, which must have been opened
    /// on this cursor.
    pub fn close_container(&mut self, body: &mut Body, child: AppendCursor) -> WireResult<()> {
        match (&child.check, child.container) {
            (SigCheck::Grow, WireType::Struct) => {
                if child.values == 0 {
                    return Err(WireError::IncompleteContainer(WireType::Struct));
                }
                Self::grow(body, ")")
            }
            (SigCheck::Expect { pos, .. }, WireType::Array) => {
                if *pos != 0 {
                    return Err(WireError::IncompleteContainer(WireType::Array));
                }
                let Some(mark) = child.array else {
                    return Err(WireError::IncompleteContainer(WireType::Array));
                };
                let len = body.bytes.len() - mark.content_start;
                if len > self.max_array_bytes {
                    return Err(WireError::ArrayTooLong {
                        len,
                        limit: self.max_array_bytes,
                    });
                }
                body.bytes[mark.len_pos..mark.len_pos + 4]
                    .copy_from_slice(&(len as u32).to_le_bytes());
                Ok(())
            }
            (SigCheck::Expect { sig, pos, .. }, ty) => {
                if *pos == sig.len() {
                    Ok(())
                } else {
                    Err(WireError::IncompleteContainer(ty))
                }
            }
            (SigCheck::Grow, ty) => Err(WireError::NotAContainer(ty)),
        }
    }
}

// ============================================================================
// Read helpers
// ============================================================================

/// Generate bounds-checked little-endian readers.
macro_rules! impl_get_le {
    ($name:ident, $type:ty, $size:expr) => {
        pub(crate) fn $name(&self, offset: usize) -> WireResult<$type> {
            let mut bytes = [0u8; $size];
            bytes.copy_from_slice(self.slice(offset, $size)?);
            Ok(<$type>::from_le_bytes(bytes))
        }
    };
}

/// Bounds-checked view over marshalled bytes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Reader<'m> {
    bytes: &'m [u8],
}

impl<'m> Reader<'m> {
    pub(crate) fn new(bytes: &'m [u8]) -> Self {
        Self { bytes }
    }

    pub(crate) fn len(&self) -> usize {
        self.bytes.len()
    }

    pub(crate) fn slice(&self, offset: usize, len: usize) -> WireResult<&'m [u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.bytes.get(offset..end))
            .ok_or(WireError::ReadFailed {
                offset,
                reason: "unexpected end of buffer",
            })
    }

    pub(crate) fn get_u8(&self, offset: usize) -> WireResult<u8> {
        Ok(self.slice(offset, 1)?[0])
    }

    impl_get_le!(get_i16, i16, 2);
    impl_get_le!(get_u16, u16, 2);
    impl_get_le!(get_i32, i32, 4);
    impl_get_le!(get_u32, u32, 4);
    impl_get_le!(get_i64, i64, 8);
    impl_get_le!(get_u64, u64, 8);

    /// Skip zero padding up to `alignment`.
    pub(crate) fn aligned(&self, offset: usize, alignment: usize) -> WireResult<usize> {
        let target = align_up(offset, alignment);
        let padding = self.slice(offset, target - offset).map_err(|_| WireError::ReadFailed {
            offset,
            reason: "padding past end of buffer",
        })?;
        if padding.iter().any(|b| *b != 0) {
            return Err(WireError::ReadFailed {
                offset,
                reason: "non-zero padding",
            });
        }
        Ok(target)
    }

    fn str_at(&self, offset: usize) -> WireResult<(&'m str, usize)> {
        let start = self.aligned(offset, 4)?;
        let len = self.get_u32(start)? as usize;
        let data = self.slice(start + 4, len)?;
        let nul = start + 4 + len;
        if self.get_u8(nul)? != 0 {
            return Err(WireError::ReadFailed {
                offset: nul,
                reason: "missing NUL terminator",
            });
        }
        if data.contains(&0) {
            return Err(WireError::InteriorNul);
        }
        let s = std::str::from_utf8(data).map_err(|_| WireError::InvalidUtf8)?;
        Ok((s, nul + 1))
    }

    pub(crate) fn sig_at(&self, offset: usize) -> WireResult<(&'m str, usize)> {
        let len = self.get_u8(offset)? as usize;
        let data = self.slice(offset + 1, len)?;
        let nul = offset + 1 + len;
        if self.get_u8(nul)? != 0 {
            return Err(WireError::ReadFailed {
                offset: nul,
                reason: "missing NUL terminator",
            });
        }
        let s = std::str::from_utf8(data).map_err(|_| WireError::InvalidUtf8)?;
        Ok((s, nul + 1))
    }

    /// Decode the basic value of type `ty` at `offset`; returns the value and
    /// the offset just past it.
    pub(crate) fn basic_at(&self, offset: usize, ty: WireType) -> WireResult<(BasicValue, usize)> {
        let aligned = self.aligned(offset, ty.alignment())?;
        let size = ty.fixed_size().unwrap_or(0);
        let value = match ty {
            WireType::Byte => BasicValue::Byte(self.get_u8(aligned)?),
            WireType::Boolean => match self.get_u32(aligned)? {
                0 => BasicValue::Boolean(false),
                1 => BasicValue::Boolean(true),
                other => return Err(WireError::InvalidBoolean(other)),
            },
            WireType::Int16 => BasicValue::Int16(self.get_i16(aligned)?),
            WireType::Uint16 => BasicValue::Uint16(self.get_u16(aligned)?),
            WireType::Int32 => BasicValue::Int32(self.get_i32(aligned)?),
            WireType::Uint32 => BasicValue::Uint32(self.get_u32(aligned)?),
            WireType::Int64 => BasicValue::Int64(self.get_i64(aligned)?),
            WireType::Uint64 => BasicValue::Uint64(self.get_u64(aligned)?),
            WireType::Double => BasicValue::Double(f64::from_bits(self.get_u64(aligned)?)),
            WireType::String => {
                let (s, next) = self.str_at(aligned)?;
                return Ok((BasicValue::String(s.to_owned()), next));
            }
            WireType::ObjectPath => {
                let (s, next) = self.str_at(aligned)?;
                return Ok((BasicValue::ObjectPath(ObjectPath::new(s)?), next));
            }
            WireType::Signature => {
                let (s, next) = self.sig_at(aligned)?;
                return Ok((BasicValue::Signature(Signature::new(s)?), next));
            }
            other => return Err(WireError::NotAContainer(other)),
        };
        Ok((value, aligned + size))
    }

    /// Offset just past the complete value of type `ty` starting at `offset`.
    pub(crate) fn skip(&self, offset: usize, ty: &str, depth: usize) -> WireResult<usize> {
        if depth > MAX_DEPTH {
            return Err(WireError::ReadFailed {
                offset,
                reason: "nesting too deep",
            });
        }
        let code = WireType::from_code(ty.as_bytes()[0]).unwrap_or(WireType::Invalid);
        match code {
            WireType::String | WireType::ObjectPath => Ok(self.str_at(offset)?.1),
            WireType::Signature => Ok(self.sig_at(offset)?.1),
            WireType::Boolean => self.basic_at(offset, code).map(|(_, next)| next),
            t if t.is_fixed() => {
                let start = self.aligned(offset, t.alignment())?;
                let size = t.fixed_size().unwrap_or(0);
                self.slice(start, size)?;
                Ok(start + size)
            }
            WireType::Array => {
                let start = self.aligned(offset, 4)?;
                let len = self.get_u32(start)? as usize;
                let element = &ty[1..];
                let align = WireType::from_code(element.as_bytes()[0]).map_or(1, WireType::alignment);
                let content = self.aligned(start + 4, align)?;
                let end = content + len;
                self.slice(content, len)?;
                let mut pos = content;
                while pos < end {
                    pos = self.skip(pos, element, depth + 1)?;
                }
                if pos != end {
                    return Err(WireError::ReadFailed {
                        offset: pos,
                        reason: "array element overruns array length",
                    });
                }
                Ok(end)
            }
            WireType::Struct | WireType::DictEntry => {
                let mut pos = self.aligned(offset, 8)?;
                let inner = &ty[1..ty.len() - 1];
                let mut sig_pos = 0;
                while sig_pos < inner.len() {
                    let len = complete_type_len(inner.as_bytes(), sig_pos)?;
                    pos = self.skip(pos, &inner[sig_pos..sig_pos + len], depth + 1)?;
                    sig_pos += len;
                }
                Ok(pos)
            }
            WireType::Variant => {
                let (content, pos) = self.sig_at(offset)?;
                if !is_single_complete_type(content) {
                    return Err(WireError::InvalidSignature {
                        signature: content.to_string(),
                        reason: "variant must hold one complete type",
                    });
                }
                self.skip(pos, content, depth + 1)
            }
            _ => Err(WireError::InvalidSignature {
                signature: ty.to_string(),
                reason: "unknown type code",
            }),
        }
    }
}

// ============================================================================
// Read cursor
// ============================================================================

/// Read cursor for one nesting level of a marshalled body.
#[derive(Debug, Clone)]
pub struct ReadCursor<'m> {
    reader: Reader<'m>,
    sig: &'m str,
    sig_pos: usize,
    pos: usize,
    end: usize,
    container: WireType,
    depth: usize,
    max_array_bytes: usize,
}

impl<'m> ReadCursor<'m> {
    /// Cursor over the top level of `bytes`, described by `signature`.
    pub fn root(bytes: &'m [u8], signature: &'m str) -> Self {
        Self {
            reader: Reader::new(bytes),
            sig: signature,
            sig_pos: 0,
            pos: 0,
            end: bytes.len(),
            container: WireType::Invalid,
            depth: 0,
            max_array_bytes: DEFAULT_MAX_ARRAY_BYTES,
        }
    }

    pub(crate) fn with_array_limit(mut self, max_array_bytes: usize) -> Self {
        self.max_array_bytes = max_array_bytes;
        self
    }

    /// Container type this cursor reads (`Invalid` for the root).
    pub fn container(&self) -> WireType {
        self.container
    }

    /// Byte offset of the current value.
    pub fn offset(&self) -> usize {
        self.pos
    }

    fn current(&self) -> Option<&'m str> {
        if self.container == WireType::Array {
            return (self.pos < self.end).then_some(self.sig);
        }
        if self.sig_pos >= self.sig.len() {
            return None;
        }
        let len = complete_type_len(self.sig.as_bytes(), self.sig_pos).ok()?;
        Some(&self.sig[self.sig_pos..self.sig_pos + len])
    }

    /// Type of the current value, `Invalid` at the end of the container.
    pub fn arg_type(&self) -> WireType {
        self.current()
            .and_then(|t| WireType::from_code(t.as_bytes()[0]))
            .unwrap_or(WireType::Invalid)
    }

    /// Element type when the current value is an array.
    pub fn element_type(&self) -> WireType {
        match self.current() {
            Some(t) if t.starts_with('a') => {
                WireType::from_code(t.as_bytes()[1]).unwrap_or(WireType::Invalid)
            }
            _ => WireType::Invalid,
        }
    }

    /// Signature of the current complete value (empty at the end).
    pub fn signature(&self) -> &'m str {
        self.current().unwrap_or("")
    }

    /// Move past the current value. Returns false when no value follows.
    pub fn next(&mut self) -> WireResult<bool> {
        let Some(ty) = self.current() else {
            return Ok(false);
        };
        let after = self.reader.skip(self.pos, ty, self.depth)?;
        if after > self.end {
            return Err(WireError::ReadFailed {
                offset: self.pos,
                reason: "value overruns its container",
            });
        }
        self.pos = after;
        if self.container != WireType::Array {
            self.sig_pos += ty.len();
        }
        Ok(self.current().is_some())
    }

    /// Cursor over the content of the current container value.
    pub fn recurse(&self) -> WireResult<ReadCursor<'m>> {
        let Some(ty) = self.current() else {
            return Err(WireError::ReadFailed {
                offset: self.pos,
                reason: "no value to recurse into",
            });
        };
        if self.depth + 1 > MAX_DEPTH {
            return Err(WireError::ReadFailed {
                offset: self.pos,
                reason: "nesting too deep",
            });
        }
        let code = WireType::from_code(ty.as_bytes()[0]).unwrap_or(WireType::Invalid);
        let mut child = Self {
            reader: self.reader,
            sig: "",
            sig_pos: 0,
            pos: self.pos,
            end: self.end,
            container: code,
            depth: self.depth + 1,
            max_array_bytes: self.max_array_bytes,
        };
        match code {
            WireType::Struct | WireType::DictEntry => {
                child.sig = &ty[1..ty.len() - 1];
                child.pos = self.reader.aligned(self.pos, 8)?;
            }
            WireType::Array => {
                let start = self.reader.aligned(self.pos, 4)?;
                let len = self.reader.get_u32(start)? as usize;
                if len > self.max_array_bytes {
                    return Err(WireError::ArrayTooLong {
                        len,
                        limit: self.max_array_bytes,
                    });
                }
                let element = &ty[1..];
                let align = WireType::from_code(element.as_bytes()[0]).map_or(1, WireType::alignment);
                let content = self.reader.aligned(start + 4, align)?;
                if content + len > self.end {
                    return Err(WireError::ReadFailed {
                        offset: start,
                        reason: "array length overruns its container",
                    });
                }
                child.sig = element;
                child.pos = content;
                child.end = content + len;
            }
            WireType::Variant => {
                let (content, pos) = self.reader.sig_at(self.pos)?;
                if !is_single_complete_type(content) {
                    return Err(WireError::InvalidSignature {
                        signature: content.to_string(),
                        reason: "variant must hold one complete type",
                    });
                }
                child.sig = content;
                child.pos = pos;
            }
            other => return Err(WireError::NotAContainer(other)),
        }
        Ok(child)
    }

    /// Decode the current value, which must be basic. Does not advance.
    pub fn read_basic(&self) -> WireResult<BasicValue> {
        let ty = self.arg_type();
        if !ty.is_basic() {
            return Err(WireError::NotAContainer(ty));
        }
        self.reader.basic_at(self.pos, ty).map(|(value, _)| value)
    }

    /// Read every remaining element of a fixed-element array level in bulk.
    pub fn read_fixed_array(&mut self) -> WireResult<FixedArray> {
        let element = WireType::from_code(self.sig.as_bytes().first().copied().unwrap_or(0))
            .unwrap_or(WireType::Invalid);
        let size = match element.fixed_size() {
            Some(size) if self.container == WireType::Array && self.sig.len() == 1 => size,
            _ => {
                return Err(WireError::TypeMismatch {
                    expected: WireType::Array,
                    found: self.container,
                })
            }
        };
        let data = self.reader.slice(self.pos, self.end - self.pos)?;
        if data.len() % size != 0 {
            return Err(WireError::ReadFailed {
                offset: self.pos,
                reason: "array length is not a multiple of its element size",
            });
        }
        let array = match element {
            WireType::Byte => FixedArray::Byte(data.to_vec()),
            WireType::Boolean => {
                let mut out = Vec::with_capacity(data.len() / 4);
                for chunk in data.chunks_exact(4) {
                    match u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) {
                        0 => out.push(false),
                        1 => out.push(true),
                        other => return Err(WireError::InvalidBoolean(other)),
                    }
                }
                FixedArray::Boolean(out)
            }
            WireType::Int16 => FixedArray::Int16(
                data.chunks_exact(2)
                    .map(|c| i16::from_le_bytes([c[0], c[1]]))
                    .collect(),
            ),
            WireType::Uint16 => FixedArray::Uint16(
                data.chunks_exact(2)
                    .map(|c| u16::from_le_bytes([c[0], c[1]]))
                    .collect(),
            ),
            WireType::Int32 => FixedArray::Int32(
                data.chunks_exact(4)
                    .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ),
            WireType::Uint32 => FixedArray::Uint32(
                data.chunks_exact(4)
                    .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ),
            WireType::Int64 => FixedArray::Int64(data.chunks_exact(8).map(le_i64).collect()),
            WireType::Uint64 => FixedArray::Uint64(data.chunks_exact(8).map(le_u64).collect()),
            WireType::Double => FixedArray::Double(
                data.chunks_exact(8)
                    .map(|c| f64::from_bits(le_u64(c)))
                    .collect(),
            ),
            other => return Err(WireError::NotAContainer(other)),
        };
        self.pos = self.end;
        Ok(array)
    }

    /// Number of elements in the current array value.
    pub fn element_count(&self) -> WireResult<usize> {
        let ty = self.arg_type();
        if ty != WireType::Array {
            return Err(WireError::TypeMismatch {
                expected: WireType::Array,
                found: ty,
            });
        }
        let mut child = self.recurse()?;
        if let Some(size) = WireType::from_code(child.sig.as_bytes()[0])
            .filter(|_| child.sig.len() == 1)
            .and_then(WireType::fixed_size)
        {
            return Ok((child.end - child.pos) / size);
        }
        let mut count = 0;
        while child.arg_type() != WireType::Invalid {
            count += 1;
            child.next()?;
        }
        Ok(count)
    }
}

fn le_u64(c: &[u8]) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(c);
    u64::from_le_bytes(bytes)
}

fn le_i64(c: &[u8]) -> i64 {
    le_u64(c) as i64
}
