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

//! Canonical TOML re-emission.
//!
//! Keys are emitted in lexicographic order: scalars and arrays first, then
//! sub-tables as `[scope]` headers (arrays whose elements are all tables
//! become `[[scope]]` headers). Scalars keep their original literal text.
//! Formatting is idempotent; source ordering and spacing are not
//! preserved.

use crate::doctree::{DocNode, DocTree, NodeId};

/// Renders the document tree as canonical TOML.
pub fn to_toml(tree: &DocTree) -> String {
    let mut out = String::new();
    emit_table(tree, tree.root(), &mut out, "", 0);
    out
}

fn indent(level: usize) -> String {
    " ".repeat(level * 2)
}

/// A key as it appears on the left of `=` or inside a header: bare when
/// the identifier fits the bare-key charset, quoted otherwise.
fn format_key(id: &str) -> String {
    let bare = !id.is_empty()
        && id
            .chars()
            .all(|ch| ch == '-' || ch == '_' || ch.is_ascii_alphanumeric());
    if bare {
        return id.to_string();
    }
    let mut quoted = String::with_capacity(id.len() + 2);
    quoted.push('"');
    for ch in id.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\u{8}' => quoted.push_str("\\b"),
            '\t' => quoted.push_str("\\t"),
            '\n' => quoted.push_str("\\n"),
            '\u{c}' => quoted.push_str("\\f"),
            '\r' => quoted.push_str("\\r"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

fn scoped(scope: &str, key: &str) -> String {
    if scope.is_empty() {
        key.to_string()
    } else {
        format!("{scope}.{key}")
    }
}

fn emit_inline_value(tree: &DocTree, id: NodeId, out: &mut String) {
    match tree.node(id) {
        DocNode::Value(value) => out.push_str(&value.text),
        DocNode::Array(_) => emit_inline_array(tree, id, out),
        DocNode::Table(_) => emit_inline_table(tree, id, out),
        DocNode::Key(_) => {}
    }
}

fn emit_inline_array(tree: &DocTree, array: NodeId, out: &mut String) {
    let elems = match tree.as_array(array) {
        Some(node) => &node.elems,
        None => return,
    };
    if elems.is_empty() {
        out.push_str("[ ]");
        return;
    }
    out.push_str("[ ");
    for (index, elem) in elems.iter().enumerate() {
        if index > 0 {
            out.push_str(", ");
        }
        emit_inline_value(tree, *elem, out);
    }
    out.push_str(" ]");
}

fn emit_inline_table(tree: &DocTree, table: NodeId, out: &mut String) {
    let elems = match tree.as_table(table) {
        Some(node) => &node.elems,
        None => return,
    };
    if elems.is_empty() {
        out.push_str("{ }");
        return;
    }
    out.push_str("{ ");
    let mut first = true;
    for (id, key) in elems {
        let value = match tree.as_key(*key).and_then(|k| k.value) {
            Some(value) => value,
            None => continue,
        };
        if !first {
            out.push_str(", ");
        }
        first = false;
        out.push_str(&format_key(id));
        out.push_str(" = ");
        emit_inline_value(tree, value, out);
    }
    out.push_str(" }");
}

fn emit_array(
    tree: &DocTree,
    key: &str,
    array: NodeId,
    out: &mut String,
    scope: &str,
    level: usize,
) {
    let elems = match tree.as_array(array) {
        Some(node) => node.elems.clone(),
        None => return,
    };
    let all_tables = !elems.is_empty()
        && elems.iter().all(|elem| tree.as_table(*elem).is_some());

    if all_tables {
        let array_scope = scoped(scope, key);
        for elem in elems {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&indent(level));
            out.push_str(&format!("[[{array_scope}]]\n"));
            emit_table(tree, elem, out, &array_scope, level + 1);
        }
    } else {
        out.push_str(&indent(level));
        out.push_str(key);
        out.push_str(" = ");
        emit_inline_array(tree, array, out);
        out.push('\n');
    }
}

fn emit_table(tree: &DocTree, table: NodeId, out: &mut String, scope: &str, level: usize) {
    let elems = match tree.as_table(table) {
        Some(node) => node.elems.clone(),
        None => return,
    };

    // Scalars and arrays first.
    for (id, key) in &elems {
        let value = match tree.as_key(*key).and_then(|k| k.value) {
            Some(value) => value,
            None => continue,
        };
        match tree.node(value) {
            DocNode::Value(node) => {
                out.push_str(&indent(level));
                out.push_str(&format_key(id));
                out.push_str(" = ");
                out.push_str(&node.text);
                out.push('\n');
            }
            DocNode::Array(_) => {
                emit_array(tree, &format_key(id), value, out, scope, level);
            }
            _ => {}
        }
    }

    // Sub-tables last, as headers.
    for (id, key) in &elems {
        let value = match tree.as_key(*key).and_then(|k| k.value) {
            Some(value) => value,
            None => continue,
        };
        if tree.as_table(value).is_some() {
            let new_scope = scoped(scope, &format_key(id));
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&indent(level));
            out.push_str(&format!("[{new_scope}]\n"));
            emit_table(tree, value, out, &new_scope, level);
        }
    }
}
