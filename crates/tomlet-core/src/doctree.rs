// Tomlet - TOML toolchain with config schema validation
//
// Copyright (c) 2025 Tomlet contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The document tree: the in-memory representation of a parsed TOML file.
//!
//! Nodes live in an arena owned by [`DocTree`]; a [`NodeId`] is an index
//! into it. The arena realizes the ownership rules directly: a `Table` is
//! the unique owner of its `Key`s, a `Key` of its child node, an `Array`
//! of its elements. The back-reference from a `Key` to its parent `Table`
//! is a plain id and owns nothing, so no reference cycles can form. The
//! parser's token→key cross-reference map stores `NodeId`s and therefore
//! must not outlive the tree.
//!
//! Mutability: an inline array is sealed the moment its literal closes, an
//! inline table when its `}` closes. A table created by a `[header]` (and
//! the arrays extended by `[[header]]`) stay mutable while parsing
//! continues and are sealed when the document ends.

use crate::position::Region;
use crate::types::TypeTag;
use std::collections::BTreeMap;

/// Index of a node in a [`DocTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// A scalar value. Immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueNode {
    /// Scalar type tag.
    pub tag: TypeTag,
    /// Raw literal text as written in the source.
    pub text: String,
    /// Region of the literal.
    pub def_region: Region,
}

/// An ordered sequence of nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayNode {
    /// Element nodes, in source order.
    pub elems: Vec<NodeId>,
    /// `false` once sealed.
    pub is_mutable: bool,
    /// Region of the defining literal or first header.
    pub def_region: Region,
}

/// A key owning one child node, with a non-owning parent back-reference.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyNode {
    /// The key identifier (quoted keys keep their quotes in `id`).
    pub id: String,
    /// The owned child node, once assigned.
    pub value: Option<NodeId>,
    /// The table this key belongs to.
    pub parent: NodeId,
}

/// A mapping of identifiers to keys.
#[derive(Debug, Clone, PartialEq)]
pub struct TableNode {
    /// Keys by identifier.
    pub elems: BTreeMap<String, NodeId>,
    /// `false` once sealed.
    pub is_mutable: bool,
    /// Region of the defining header or inline literal.
    pub def_region: Region,
    /// `true` iff created by an explicit `[header]` or a closed inline
    /// table; implicit parents from dotted paths are `false`.
    pub is_explicit: bool,
}

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum DocNode {
    Value(ValueNode),
    Array(ArrayNode),
    Key(KeyNode),
    Table(TableNode),
}

/// Arena-owned document tree with a table at the root.
#[derive(Debug)]
pub struct DocTree {
    nodes: Vec<DocNode>,
    root: NodeId,
}

impl DocTree {
    /// Creates a tree holding only an empty, mutable, implicit root table.
    pub fn new() -> Self {
        let root_table = DocNode::Table(TableNode {
            elems: BTreeMap::new(),
            is_mutable: true,
            def_region: Region::default(),
            is_explicit: false,
        });
        Self {
            nodes: vec![root_table],
            root: NodeId(0),
        }
    }

    /// The root table id.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Allocates a node and returns its id.
    pub fn alloc(&mut self, node: DocNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// The node behind `id`.
    #[inline]
    pub fn node(&self, id: NodeId) -> &DocNode {
        &self.nodes[id.0]
    }

    /// Mutable access to the node behind `id`.
    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut DocNode {
        &mut self.nodes[id.0]
    }

    /// The node as a table, if it is one.
    pub fn as_table(&self, id: NodeId) -> Option<&TableNode> {
        match self.node(id) {
            DocNode::Table(table) => Some(table),
            _ => None,
        }
    }

    /// The node as a mutable table, if it is one.
    pub fn as_table_mut(&mut self, id: NodeId) -> Option<&mut TableNode> {
        match self.node_mut(id) {
            DocNode::Table(table) => Some(table),
            _ => None,
        }
    }

    /// The node as an array, if it is one.
    pub fn as_array(&self, id: NodeId) -> Option<&ArrayNode> {
        match self.node(id) {
            DocNode::Array(array) => Some(array),
            _ => None,
        }
    }

    /// The node as a mutable array, if it is one.
    pub fn as_array_mut(&mut self, id: NodeId) -> Option<&mut ArrayNode> {
        match self.node_mut(id) {
            DocNode::Array(array) => Some(array),
            _ => None,
        }
    }

    /// The node as a key, if it is one.
    pub fn as_key(&self, id: NodeId) -> Option<&KeyNode> {
        match self.node(id) {
            DocNode::Key(key) => Some(key),
            _ => None,
        }
    }

    /// The node as a mutable key, if it is one.
    pub fn as_key_mut(&mut self, id: NodeId) -> Option<&mut KeyNode> {
        match self.node_mut(id) {
            DocNode::Key(key) => Some(key),
            _ => None,
        }
    }

    /// The node as a value, if it is one.
    pub fn as_value(&self, id: NodeId) -> Option<&ValueNode> {
        match self.node(id) {
            DocNode::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Allocates a new key under `table` and registers it in the table's
    /// element map. Returns the key id.
    pub fn add_key(&mut self, table: NodeId, id: impl Into<String>, value: Option<NodeId>) -> NodeId {
        let id = id.into();
        let key = self.alloc(DocNode::Key(KeyNode {
            id: id.clone(),
            value,
            parent: table,
        }));
        if let Some(table) = self.as_table_mut(table) {
            table.elems.insert(id, key);
        }
        key
    }

    /// Looks up a key id by identifier within `table`.
    pub fn find_key(&self, table: NodeId, id: &str) -> Option<NodeId> {
        self.as_table(table)?.elems.get(id).copied()
    }

    /// Marks a table or array immutable.
    pub fn seal(&mut self, id: NodeId) {
        match self.node_mut(id) {
            DocNode::Table(table) => table.is_mutable = false,
            DocNode::Array(array) => array.is_mutable = false,
            _ => {}
        }
    }

    /// The definition region of a value, table, or array node; a key
    /// reports its child's region. Defaults for anything else.
    pub fn def_region(&self, id: NodeId) -> Region {
        match self.node(id) {
            DocNode::Value(value) => value.def_region,
            DocNode::Table(table) => table.def_region,
            DocNode::Array(array) => array.def_region,
            DocNode::Key(key) => key
                .value
                .map(|child| self.def_region(child))
                .unwrap_or_default(),
        }
    }

    /// Total number of nodes in the arena.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl Default for DocTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;
    use crate::types::TypeTag;

    #[test]
    fn test_new_tree_has_mutable_implicit_root() {
        let tree = DocTree::new();
        let root = tree.as_table(tree.root()).unwrap();
        assert!(root.is_mutable);
        assert!(!root.is_explicit);
        assert!(root.elems.is_empty());
    }

    #[test]
    fn test_add_and_find_key() {
        let mut tree = DocTree::new();
        let root = tree.root();
        let value = tree.alloc(DocNode::Value(ValueNode {
            tag: TypeTag::Integer,
            text: "1".to_string(),
            def_region: Region::default(),
        }));
        let key = tree.add_key(root, "x", Some(value));

        assert_eq!(tree.find_key(root, "x"), Some(key));
        assert_eq!(tree.find_key(root, "y"), None);

        let key_node = tree.as_key(key).unwrap();
        assert_eq!(key_node.id, "x");
        assert_eq!(key_node.parent, root);
        assert_eq!(key_node.value, Some(value));
    }

    #[test]
    fn test_seal_table_and_array() {
        let mut tree = DocTree::new();
        let table = tree.alloc(DocNode::Table(TableNode {
            elems: BTreeMap::new(),
            is_mutable: true,
            def_region: Region::default(),
            is_explicit: true,
        }));
        let array = tree.alloc(DocNode::Array(ArrayNode {
            elems: vec![],
            is_mutable: true,
            def_region: Region::default(),
        }));

        tree.seal(table);
        tree.seal(array);
        assert!(!tree.as_table(table).unwrap().is_mutable);
        assert!(!tree.as_array(array).unwrap().is_mutable);
    }

    #[test]
    fn test_def_region_through_key() {
        let mut tree = DocTree::new();
        let region = Region::new(Position::new(2, 4), Position::new(2, 9));
        let value = tree.alloc(DocNode::Value(ValueNode {
            tag: TypeTag::Boolean,
            text: "true".to_string(),
            def_region: region,
        }));
        let key = tree.add_key(tree.root(), "flag", Some(value));
        assert_eq!(tree.def_region(key), region);
        assert_eq!(tree.def_region(value), region);
    }

    #[test]
    fn test_kind_accessors_reject_wrong_kind() {
        let mut tree = DocTree::new();
        let value = tree.alloc(DocNode::Value(ValueNode {
            tag: TypeTag::Integer,
            text: "1".to_string(),
            def_region: Region::default(),
        }));
        assert!(tree.as_table(value).is_none());
        assert!(tree.as_array(value).is_none());
        assert!(tree.as_key(value).is_none());
        assert!(tree.as_value(value).is_some());
    }
}
