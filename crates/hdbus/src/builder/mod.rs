// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Signature-accumulating append builder.
//!
//! A [`MessageBuilder`] records pushes and `begin_*`/`end_*` markers as a
//! tree of [`AppendNode`]s. The signature of an array or variant depends on
//! content that is not known when it is opened, so each `end_*` resolves
//! the signature of the node it closes from its children. Nothing is
//! written to the message until [`end_message`](MessageBuilder::end_message)
//! commits the whole tree in one depth-first pass; [`abort`](MessageBuilder::abort)
//! hands the message back untouched.
//!
//! # Example
//!
//! ```
//! use hdbus::{Message, MessageBuilder, TypeRegistry};
//!
//! let registry = TypeRegistry::with_builtins();
//! let msg = Message::signal("/org/example", "org.example.Sensor", "Reading").unwrap();
//! let mut builder = MessageBuilder::new(msg, &registry);
//! builder
//!     .push(&7u32).unwrap()
//!     .begin_array().unwrap()
//!     .push("a").unwrap()
//!     .next().unwrap()
//!     .push("b").unwrap()
//!     .end_array().unwrap();
//! let msg = builder.end_message().unwrap();
//! assert_eq!(msg.signature(), "uas");
//! ```
//!
//! A builder owns its message and is meant to be driven from one thread.

mod commit;
mod errors;
mod node;

pub use errors::{BuildError, BuildResult};
pub use node::{AppendNode, NodeKind};

use crate::config::Limits;
use crate::message::Message;
use crate::types::{Aggregate, Append, TypeRegistry};
use crate::value::Value;
use crate::wire::{BasicValue, FixedArray, Signature, WireError, WireType};

/// Typed append builder for one message body.
#[derive(Debug)]
pub struct MessageBuilder<'r> {
    registry: &'r TypeRegistry,
    limits: Limits,
    message: Message,
    root: AppendNode,
    open: Vec<AppendNode>,
}

impl<'r> MessageBuilder<'r> {
    /// Start appending to `message`. Arguments already in its body are kept.
    pub fn new(message: Message, registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            limits: Limits::default(),
            message,
            root: AppendNode::root(),
            open: Vec::new(),
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn registry(&self) -> &'r TypeRegistry {
        self.registry
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Root of the pending tree.
    pub fn nodes(&self) -> &AppendNode {
        &self.root
    }

    /// Number of containers currently open.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Signature of the arguments completed so far.
    pub fn pending_signature(&self) -> String {
        self.root.joined_signature()
    }

    fn open_name(&self) -> &'static str {
        self.open.last().map_or("message", |n| n.kind.name())
    }

    fn attach(&mut self, node: AppendNode) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root.children.push(node),
        }
    }

    fn top(&self, kind: NodeKind) -> BuildResult<&AppendNode> {
        match self.open.last() {
            Some(node) if node.kind == kind => Ok(node),
            _ => Err(BuildError::Unbalanced {
                expected: kind.name(),
                found: self.open_name(),
            }),
        }
    }

    fn begin(&mut self, kind: NodeKind, inner: Option<String>) -> BuildResult<&mut Self> {
        if self.open.len() >= self.limits.max_depth {
            return Err(BuildError::DepthExceeded(self.limits.max_depth));
        }
        log::trace!("[hdbus::builder] begin {}", kind.name());
        self.open.push(AppendNode::container(kind, inner));
        Ok(self)
    }

    /// Pop the innermost open node with its resolved signature and attach
    /// it to its parent.
    fn end(&mut self, signature: String, inner: Option<String>, delimited: bool) -> BuildResult<&mut Self> {
        let Some(mut node) = self.open.pop() else {
            return Err(BuildError::Unbalanced {
                expected: "container",
                found: "message",
            });
        };
        log::trace!("[hdbus::builder] end {} as {:?}", node.kind.name(), signature);
        node.signature = signature;
        if inner.is_some() {
            node.inner_signature = inner;
        }
        if delimited {
            node.children.push(AppendNode::close());
        }
        self.attach(node);
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------

    /// Push any value with a static binding.
    pub fn push<T: Append + ?Sized>(&mut self, value: &T) -> BuildResult<&mut Self> {
        value.append(self)?;
        Ok(self)
    }

    pub fn push_basic(&mut self, value: BasicValue) -> BuildResult<&mut Self> {
        if value.as_str().is_some_and(|s| s.contains('\0')) {
            return Err(WireError::InteriorNul.into());
        }
        self.attach(AppendNode::basic(value));
        Ok(self)
    }

    /// Push a whole array of fixed-size elements.
    pub fn push_fixed_array(&mut self, array: FixedArray) -> BuildResult<&mut Self> {
        self.attach(AppendNode::fixed_array(array));
        Ok(self)
    }

    pub fn push_value(&mut self, value: &Value) -> BuildResult<&mut Self> {
        value.append(self)?;
        Ok(self)
    }

    /// Push an aggregate after checking it against its registry entry.
    pub fn push_registered<T: Aggregate>(&mut self, value: &T) -> BuildResult<&mut Self> {
        let entry = self.registry.lookup_type::<T>()?;
        let declared = T::signature();
        if entry.signature() != &declared {
            return Err(BuildError::SignatureMismatch {
                registered: entry.signature().to_string(),
                declared: declared.into_string(),
            });
        }
        value.append(self)?;
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Containers
    // ------------------------------------------------------------------

    pub fn begin_struct(&mut self) -> BuildResult<&mut Self> {
        self.begin(NodeKind::Struct, None)
    }

    pub fn end_struct(&mut self) -> BuildResult<&mut Self> {
        let inner = self.top(NodeKind::Struct)?.joined_signature();
        if inner.is_empty() {
            return Err(BuildError::EmptyStruct);
        }
        self.end(format!("({inner})"), None, true)
    }

    /// Open a dict entry; only valid directly inside an array.
    pub fn begin_dict_entry(&mut self) -> BuildResult<&mut Self> {
        if !self.open.last().is_some_and(|n| n.kind == NodeKind::Array) {
            return Err(BuildError::NotInArray("begin_dict_entry"));
        }
        self.begin(NodeKind::DictEntry, None)
    }

    pub fn end_dict_entry(&mut self) -> BuildResult<&mut Self> {
        let node = self.top(NodeKind::DictEntry)?;
        let members: Vec<&str> = node.elements().map(AppendNode::signature).collect();
        if members.len() != 2 {
            return Err(BuildError::DictEntryArity(members.len()));
        }
        let key_is_basic = members[0].len() == 1
            && WireType::from_code(members[0].as_bytes()[0]).is_some_and(WireType::is_basic);
        if !key_is_basic {
            return Err(BuildError::InvalidDictKey(members[0].to_string()));
        }
        let signature = format!("{{{}{}}}", members[0], members[1]);
        self.end(signature, None, true)
    }

    /// Open an array whose element signature is taken from its first
    /// element.
    pub fn begin_array(&mut self) -> BuildResult<&mut Self> {
        self.begin(NodeKind::Array, None)
    }

    /// Open an array with a declared element signature, so it may be empty.
    pub fn begin_array_of(&mut self, element: &str) -> BuildResult<&mut Self> {
        let full = Signature::new(format!("a{element}"))?;
        if !full.is_single_complete_type() {
            return Err(WireError::InvalidSignature {
                signature: full.into_string(),
                reason: "array element must be one complete type",
            }
            .into());
        }
        self.begin(NodeKind::Array, Some(element.to_string()))
    }

    pub fn end_array(&mut self) -> BuildResult<&mut Self> {
        let element = element_signature(self.top(NodeKind::Array)?)?;
        let signature = format!("a{element}");
        self.end(signature, Some(element), false)
    }

    /// Element separator inside an array. Checks that the elements pushed
    /// so far agree.
    pub fn next(&mut self) -> BuildResult<&mut Self> {
        match self.open.last() {
            Some(node) if node.kind == NodeKind::Array => {
                if node.elements().next().is_some() {
                    element_signature(node)?;
                }
            }
            _ => return Err(BuildError::NotInArray("next")),
        }
        Ok(self)
    }

    pub fn begin_variant(&mut self) -> BuildResult<&mut Self> {
        self.begin(NodeKind::Variant, None)
    }

    /// Close a variant. Its content signature travels inside the value; the
    /// enclosing signature sees only `v`.
    pub fn end_variant(&mut self) -> BuildResult<&mut Self> {
        let node = self.top(NodeKind::Variant)?;
        let count = node.elements().count();
        if count != 1 {
            return Err(BuildError::VariantArity(count));
        }
        let inner = node.joined_signature();
        self.end("v".to_string(), Some(inner), false)
    }

    // ------------------------------------------------------------------
    // Scoped helpers
    // ------------------------------------------------------------------

    pub fn with_struct<F>(&mut self, f: F) -> BuildResult<&mut Self>
    where
        F: FnOnce(&mut Self) -> BuildResult<()>,
    {
        self.begin_struct()?;
        f(self)?;
        self.end_struct()
    }

    pub fn with_array<F>(&mut self, f: F) -> BuildResult<&mut Self>
    where
        F: FnOnce(&mut Self) -> BuildResult<()>,
    {
        self.begin_array()?;
        f(self)?;
        self.end_array()
    }

    pub fn with_array_of<F>(&mut self, element: &str, f: F) -> BuildResult<&mut Self>
    where
        F: FnOnce(&mut Self) -> BuildResult<()>,
    {
        self.begin_array_of(element)?;
        f(self)?;
        self.end_array()
    }

    pub fn with_variant<F>(&mut self, f: F) -> BuildResult<&mut Self>
    where
        F: FnOnce(&mut Self) -> BuildResult<()>,
    {
        self.begin_variant()?;
        f(self)?;
        self.end_variant()
    }

    pub fn with_dict_entry<F>(&mut self, f: F) -> BuildResult<&mut Self>
    where
        F: FnOnce(&mut Self) -> BuildResult<()>,
    {
        self.begin_dict_entry()?;
        f(self)?;
        self.end_dict_entry()
    }

    // ------------------------------------------------------------------
    // Finish
    // ------------------------------------------------------------------

    /// Commit the tree to the message body and return the message.
    pub fn end_message(mut self) -> BuildResult<Message> {
        if !self.open.is_empty() {
            return Err(BuildError::UnclosedContainers(self.open.len()));
        }
        let mut body = self.message.body().clone();
        commit::commit(&self.root, &mut body, self.limits.max_array_bytes)?;
        Signature::new(body.signature())?;
        if body.len() > self.limits.max_message_bytes {
            return Err(WireError::MessageTooLong {
                len: body.len(),
                limit: self.limits.max_message_bytes,
            }
            .into());
        }
        log::debug!(
            "[hdbus::builder] committed {} arguments, signature {:?}, {} bytes",
            self.root.elements().count(),
            body.signature(),
            body.len()
        );
        self.message.set_body(body);
        Ok(self.message)
    }

    /// Drop the pending tree and return the message unchanged.
    pub fn abort(self) -> Message {
        log::debug!(
            "[hdbus::builder] aborted with {} open containers",
            self.open.len()
        );
        self.message
    }
}

/// Common element signature of an array node: the declared one if any,
/// else the first element's.
fn element_signature(node: &AppendNode) -> BuildResult<String> {
    let expected = match node
        .inner_signature
        .clone()
        .or_else(|| node.elements().next().map(|e| e.signature.clone()))
    {
        Some(expected) => expected,
        None => return Err(BuildError::EmptyArraySignature),
    };
    if let Some(other) = node.elements().find(|e| e.signature != expected) {
        return Err(BuildError::HeterogeneousArray {
            expected,
            found: other.signature.clone(),
        });
    }
    Ok(expected)
}
