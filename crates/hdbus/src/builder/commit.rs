// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Depth-first commit of a resolved append tree.
//!
//! The walk keeps its own stack of child iterators, one per open container,
//! so nesting depth never grows the call stack.

use super::node::{AppendNode, NodeKind};
use super::BuildResult;
use crate::iter::IteratorStack;
use crate::wire::{Body, WireType};

/// Write every node under `root` onto `body`.
///
/// On error the iterator stack is cleared and `body` must be discarded.
pub(crate) fn commit(root: &AppendNode, body: &mut Body, max_array_bytes: usize) -> BuildResult<()> {
    let mut stack = IteratorStack::with_array_limit(max_array_bytes);
    let result = walk(root, body, &mut stack);
    if result.is_err() {
        stack.clear();
    }
    debug_assert!(result.is_err() || stack.is_empty());
    result
}

fn walk<'t>(root: &'t AppendNode, body: &mut Body, stack: &mut IteratorStack<'_>) -> BuildResult<()> {
    let mut pending: Vec<std::slice::Iter<'t, AppendNode>> = vec![root.children.iter()];
    loop {
        let next = match pending.last_mut() {
            Some(children) => children.next(),
            None => return Ok(()),
        };
        let Some(node) = next else {
            pending.pop();
            if !pending.is_empty() {
                stack.close(body)?;
            }
            continue;
        };
        log::trace!("[hdbus::commit] {} {:?}", node.kind.name(), node.signature);
        match &node.kind {
            NodeKind::Basic(value) => stack.append_basic(body, value)?,
            NodeKind::FixedArray(array) => {
                let element = (array.element_type().code() as char).to_string();
                stack.open_append(WireType::Array, Some(&element), body)?;
                stack.append_fixed_array(body, array)?;
                stack.close(body)?;
            }
            NodeKind::Root | NodeKind::Close => {}
            kind => {
                let Some(ty) = kind.container() else {
                    continue;
                };
                stack.open_append(ty, node.inner_signature.as_deref(), body)?;
                pending.push(node.children.iter());
            }
        }
    }
}
