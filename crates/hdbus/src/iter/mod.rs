// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Container iterators.
//!
//! A [`ContainerIterator`] is one level of nesting over a message body, in
//! append or read mode. Opening a nested container moves a fresh cursor into
//! the child iterator and records it as the parent's open child; closing
//! takes the child back by value and clears that record, so a container
//! boundary is committed at most once.
//!
//! [`IteratorStack`] keeps the live nesting path for one build or one
//! decode walk.

mod stack;

pub use stack::IteratorStack;

use crate::wire::{AppendCursor, BasicValue, Body, FixedArray, ReadCursor, WireError, WireResult, WireType};

/// Iterator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Append,
    Read,
    Empty,
}

#[derive(Debug)]
enum Cursor<'m> {
    Append(AppendCursor),
    Read(ReadCursor<'m>),
    Empty,
}

/// One level of positional cursor over a body.
#[derive(Debug)]
pub struct ContainerIterator<'m> {
    cursor: Cursor<'m>,
    open_child: Option<WireType>,
}

impl Default for ContainerIterator<'_> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'m> ContainerIterator<'m> {
    pub fn empty() -> Self {
        Self {
            cursor: Cursor::Empty,
            open_child: None,
        }
    }

    /// Root append iterator; writes at this level extend the body signature.
    pub fn append_root() -> Self {
        Self::from_append(AppendCursor::root())
    }

    pub(crate) fn append_root_with_limit(max_array_bytes: usize) -> Self {
        Self::from_append(AppendCursor::root().with_array_limit(max_array_bytes))
    }

    /// Root read iterator over the top-level values of `body`.
    pub fn read_root(body: &'m Body) -> Self {
        Self::from_read(ReadCursor::root(body.bytes(), body.signature()))
    }

    pub(crate) fn read_root_with_limit(body: &'m Body, max_array_bytes: usize) -> Self {
        Self::from_read(ReadCursor::root(body.bytes(), body.signature()).with_array_limit(max_array_bytes))
    }

    fn from_append(cursor: AppendCursor) -> Self {
        Self {
            cursor: Cursor::Append(cursor),
            open_child: None,
        }
    }

    fn from_read(cursor: ReadCursor<'m>) -> Self {
        Self {
            cursor: Cursor::Read(cursor),
            open_child: None,
        }
    }

    pub fn mode(&self) -> Mode {
        match self.cursor {
            Cursor::Append(_) => Mode::Append,
            Cursor::Read(_) => Mode::Read,
            Cursor::Empty => Mode::Empty,
        }
    }

    /// Container type of the currently open child, if any.
    pub fn open_child(&self) -> Option<WireType> {
        self.open_child
    }

    /// Container type this iterator walks (`Invalid` at the root or when empty).
    pub fn container(&self) -> WireType {
        match &self.cursor {
            Cursor::Append(c) => c.container(),
            Cursor::Read(c) => c.container(),
            Cursor::Empty => WireType::Invalid,
        }
    }

    fn appender(&mut self) -> WireResult<&mut AppendCursor> {
        match &mut self.cursor {
            Cursor::Append(c) => Ok(c),
            _ => Err(WireError::NotAppending),
        }
    }

    fn reader(&self) -> WireResult<&ReadCursor<'m>> {
        match &self.cursor {
            Cursor::Read(c) => Ok(c),
            _ => Err(WireError::NotReading),
        }
    }

    pub(crate) fn read_cursor(&self) -> WireResult<&ReadCursor<'m>> {
        self.reader()
    }

    fn reader_mut(&mut self) -> WireResult<&mut ReadCursor<'m>> {
        match &mut self.cursor {
            Cursor::Read(c) => Ok(c),
            _ => Err(WireError::NotReading),
        }
    }

    // ------------------------------------------------------------------
    // Append mode
    // ------------------------------------------------------------------

    /// Open a nested container of `ty` on this iterator, moving its cursor
    /// into `child`. With `is_root`, this iterator is first reset to a root
    /// append cursor over the whole body.
    pub fn open_append(
        &mut self,
        child: &mut ContainerIterator<'m>,
        ty: WireType,
        inner: Option<&str>,
        is_root: bool,
        body: &mut Body,
    ) -> WireResult<()> {
        if is_root {
            *self = Self::append_root();
        }
        if self.open_child.is_some() {
            return Err(WireError::ChildOpen);
        }
        let cursor = self.appender()?.open_container(body, ty, inner)?;
        *child = Self::from_append(cursor);
        self.open_child = Some(ty);
        log::trace!("[hdbus::iter] opened {} for append", ty);
        Ok(())
    }

    pub fn append_basic(&mut self, body: &mut Body, value: &BasicValue) -> WireResult<()> {
        if self.open_child.is_some() {
            return Err(WireError::ChildOpen);
        }
        self.appender()?.append_basic(body, value)
    }

    pub fn append_fixed_array(&mut self, body: &mut Body, array: &FixedArray) -> WireResult<()> {
        if self.open_child.is_some() {
            return Err(WireError::ChildOpen);
        }
        self.appender()?.append_fixed_array(body, array)
    }

    /// Close `child`, previously opened on this iterator.
    ///
    /// For append iterators this commits the container boundary. Closing an
    /// empty iterator, or closing when no child is recorded as open, does
    /// nothing.
    pub fn close(&mut self, child: ContainerIterator<'m>, body: &mut Body) -> WireResult<()> {
        match child.cursor {
            Cursor::Empty => Ok(()),
            Cursor::Read(_) => {
                self.open_child.take();
                Ok(())
            }
            Cursor::Append(cursor) => {
                let Some(ty) = self.open_child.take() else {
                    return Ok(());
                };
                self.appender()?.close_container(body, cursor)?;
                log::trace!("[hdbus::iter] closed {}", ty);
                Ok(())
            }
        }
    }

    // ------------------------------------------------------------------
    // Read mode
    // ------------------------------------------------------------------

    /// Recurse into the current container value, moving the nested cursor
    /// into `child`.
    pub fn open_read(&mut self, child: &mut ContainerIterator<'m>) -> WireResult<()> {
        if self.open_child.is_some() {
            return Err(WireError::ChildOpen);
        }
        let nested = self.reader()?.recurse()?;
        let ty = nested.container();
        *child = Self::from_read(nested);
        self.open_child = Some(ty);
        Ok(())
    }

    /// Close a read child. Read cursors leave nothing to commit.
    pub fn close_read(&mut self, child: ContainerIterator<'m>) {
        if child.mode() != Mode::Empty {
            self.open_child.take();
        }
    }

    /// Move to the next sibling. Returns false at the end of the container.
    pub fn advance(&mut self) -> WireResult<bool> {
        self.reader_mut()?.next()
    }

    /// Type of the current value; `Invalid` at the end or when not reading.
    pub fn current_arg_type(&self) -> WireType {
        self.reader().map_or(WireType::Invalid, ReadCursor::arg_type)
    }

    /// Element type of the current array value.
    pub fn current_element_type(&self) -> WireType {
        self.reader().map_or(WireType::Invalid, ReadCursor::element_type)
    }

    /// Signature of the current complete value.
    pub fn signature(&self) -> &'m str {
        self.reader().map_or("", ReadCursor::signature)
    }

    pub fn read_basic(&self) -> WireResult<BasicValue> {
        self.reader()?.read_basic()
    }

    /// Bulk-read the remaining elements of a fixed-element array level.
    pub fn read_fixed_array(&mut self) -> WireResult<FixedArray> {
        self.reader_mut()?.read_fixed_array()
    }

    /// Element count of the current array value.
    pub fn element_count(&self) -> WireResult<usize> {
        self.reader()?.element_count()
    }
}
