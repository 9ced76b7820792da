// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Append IR: one node per push or container.

use crate::wire::{BasicValue, FixedArray, WireType};

/// What a node writes at commit time.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Top of the tree; its children are the message arguments.
    Root,
    Basic(BasicValue),
    /// A whole fixed-element array written in one call.
    FixedArray(FixedArray),
    Struct,
    DictEntry,
    Array,
    Variant,
    /// Closing marker of a struct or dict entry; writes nothing.
    Close,
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Root => "message",
            Self::Basic(_) => "basic",
            Self::FixedArray(_) => "fixed array",
            Self::Struct => "struct",
            Self::DictEntry => "dict_entry",
            Self::Array => "array",
            Self::Variant => "variant",
            Self::Close => "close",
        }
    }

    /// Wire container opened for this node, if it has children.
    pub fn container(&self) -> Option<WireType> {
        match self {
            Self::Struct => Some(WireType::Struct),
            Self::DictEntry => Some(WireType::DictEntry),
            Self::Array => Some(WireType::Array),
            Self::Variant => Some(WireType::Variant),
            _ => None,
        }
    }
}

/// One node of the append tree.
///
/// `signature` is the fragment this node contributes to its parent. For
/// containers it is only known once the container is ended. Arrays and
/// variants also carry the `inner_signature` passed when opening them.
#[derive(Debug, Clone, PartialEq)]
pub struct AppendNode {
    pub(crate) kind: NodeKind,
    pub(crate) children: Vec<AppendNode>,
    pub(crate) signature: String,
    pub(crate) inner_signature: Option<String>,
    pub(crate) suppress_signature: bool,
}

impl AppendNode {
    pub(crate) fn root() -> Self {
        Self::container(NodeKind::Root, None)
    }

    pub(crate) fn container(kind: NodeKind, inner_signature: Option<String>) -> Self {
        Self {
            kind,
            children: Vec::new(),
            signature: String::new(),
            inner_signature,
            suppress_signature: false,
        }
    }

    pub(crate) fn basic(value: BasicValue) -> Self {
        let signature = (value.wire_type().code() as char).to_string();
        Self {
            kind: NodeKind::Basic(value),
            children: Vec::new(),
            signature,
            inner_signature: None,
            suppress_signature: false,
        }
    }

    pub(crate) fn fixed_array(array: FixedArray) -> Self {
        let code = array.element_type().code() as char;
        Self {
            kind: NodeKind::FixedArray(array),
            children: Vec::new(),
            signature: format!("a{code}"),
            inner_signature: Some(code.to_string()),
            suppress_signature: false,
        }
    }

    pub(crate) fn close() -> Self {
        Self {
            kind: NodeKind::Close,
            children: Vec::new(),
            signature: String::new(),
            inner_signature: None,
            suppress_signature: true,
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn children(&self) -> &[AppendNode] {
        &self.children
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn inner_signature(&self) -> Option<&str> {
        self.inner_signature.as_deref()
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppress_signature
    }

    /// Children that contribute a signature fragment (closing markers
    /// excluded).
    pub fn elements(&self) -> impl Iterator<Item = &AppendNode> + '_ {
        self.children.iter().filter(|c| !c.suppress_signature)
    }

    /// Concatenated signature of all elements.
    pub(crate) fn joined_signature(&self) -> String {
        self.elements().map(|c| c.signature.as_str()).collect()
    }
}
