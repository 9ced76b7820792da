// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Live nesting path of container iterators.

use super::{ContainerIterator, Mode};
use crate::wire::{BasicValue, Body, FixedArray, WireResult, WireType};

/// Ordered stack of iterators: each child sits directly above its parent.
///
/// The root entry exists only while at least one container is open. Closing
/// pops the child, commits it against its parent, and pops the root once it
/// is the only entry left.
#[derive(Debug, Default)]
pub struct IteratorStack<'m> {
    frames: Vec<ContainerIterator<'m>>,
    max_array_bytes: Option<usize>,
}

impl<'m> IteratorStack<'m> {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_array_limit(max_array_bytes: usize) -> Self {
        Self {
            frames: Vec::new(),
            max_array_bytes: Some(max_array_bytes),
        }
    }

    /// Number of live iterators, root included.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Nesting depth of open containers (root excluded).
    pub fn nesting(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn top(&self) -> Option<&ContainerIterator<'m>> {
        self.frames.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut ContainerIterator<'m>> {
        self.frames.last_mut()
    }

    /// Drop every iterator. Used on error paths and between messages.
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    fn append_root(&self) -> ContainerIterator<'m> {
        match self.max_array_bytes {
            Some(limit) => ContainerIterator::append_root_with_limit(limit),
            None => ContainerIterator::append_root(),
        }
    }

    // ------------------------------------------------------------------
    // Append
    // ------------------------------------------------------------------

    /// Open a container on the top iterator, pushing the root first when the
    /// stack is empty.
    pub fn open_append(&mut self, ty: WireType, inner: Option<&str>, body: &mut Body) -> WireResult<()> {
        if self.frames.is_empty() {
            let root = self.append_root();
            self.frames.push(root);
        }
        let mut child = ContainerIterator::empty();
        if let Some(parent) = self.frames.last_mut() {
            parent.open_append(&mut child, ty, inner, false, body)?;
        }
        self.frames.push(child);
        Ok(())
    }

    /// Append on the top iterator, or on a transient root at top level.
    pub fn append_basic(&mut self, body: &mut Body, value: &BasicValue) -> WireResult<()> {
        match self.frames.last_mut() {
            Some(top) => top.append_basic(body, value),
            None => self.append_root().append_basic(body, value),
        }
    }

    pub fn append_fixed_array(&mut self, body: &mut Body, array: &FixedArray) -> WireResult<()> {
        match self.frames.last_mut() {
            Some(top) => top.append_fixed_array(body, array),
            None => self.append_root().append_fixed_array(body, array),
        }
    }

    /// Close the innermost open container. A no-op when none is open.
    pub fn close(&mut self, body: &mut Body) -> WireResult<()> {
        if self.frames.len() < 2 {
            return Ok(());
        }
        let Some(child) = self.frames.pop() else {
            return Ok(());
        };
        let result = match self.frames.last_mut() {
            Some(parent) if child.mode() == Mode::Read => {
                parent.close_read(child);
                Ok(())
            }
            Some(parent) => parent.close(child, body),
            None => Ok(()),
        };
        if self.frames.len() == 1 {
            self.frames.pop();
        }
        result
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Push the root read iterator over `body`.
    pub fn open_root_read(&mut self, body: &'m Body) {
        let root = match self.max_array_bytes {
            Some(limit) => ContainerIterator::read_root_with_limit(body, limit),
            None => ContainerIterator::read_root(body),
        };
        self.frames.clear();
        self.frames.push(root);
    }

    /// Recurse into the current value of the top iterator.
    pub fn open_read(&mut self) -> WireResult<()> {
        let mut child = ContainerIterator::empty();
        match self.frames.last_mut() {
            Some(parent) => parent.open_read(&mut child)?,
            None => return Err(crate::wire::WireError::NotReading),
        }
        self.frames.push(child);
        Ok(())
    }

    /// Close the innermost read container. Unlike [`close`](Self::close),
    /// the root stays until [`finish_read`](Self::finish_read).
    pub fn close_read(&mut self) {
        if self.frames.len() < 2 {
            return;
        }
        if let Some(child) = self.frames.pop() {
            if let Some(parent) = self.frames.last_mut() {
                parent.close_read(child);
            }
        }
    }

    /// Pop the root read iterator, leaving the stack empty.
    pub fn finish_read(&mut self) {
        self.frames.clear();
    }
}
