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

//! Mapping document tables to their schema table types.
//!
//! Schema-aware completion needs the `TableType` that governs the table
//! under the cursor. The search walks the document tree and the schema in
//! lockstep, following explicit keys, the wildcard, and table members of
//! unions.

use tomlet_core::doctree::{DocTree, NodeId};
use tomlet_csl::ir::{ConfigSchema, CslType, TableType};

/// Finds the schema table type governing `target`, starting from the
/// document root and the schema's root table.
pub fn table_type_for(
    tree: &DocTree,
    target: NodeId,
    schema: &ConfigSchema,
) -> Option<TableType> {
    find_table_type(tree, tree.root(), target, &schema.root)
}

fn find_table_type(
    tree: &DocTree,
    current: NodeId,
    target: NodeId,
    current_type: &TableType,
) -> Option<TableType> {
    if current == target {
        return Some(current_type.clone());
    }

    let table = tree.as_table(current)?;
    for (name, key) in &table.elems {
        let Some(value) = tree.as_key(*key).and_then(|k| k.value) else {
            continue;
        };
        if tree.as_table(value).is_none() {
            continue;
        }

        let child_type = match current_type.explicit_key(name) {
            Some(key_def) => key_def.ty.clone(),
            None => match &current_type.wildcard_key {
                Some(wildcard) => wildcard.ty.clone(),
                None => continue,
            },
        };

        match &*child_type {
            CslType::Table(child_table) => {
                if let Some(found) = find_table_type(tree, value, target, child_table) {
                    return Some(found);
                }
            }
            CslType::Union { members, .. } => {
                for member in members {
                    if let CslType::Table(member_table) = &**member {
                        if let Some(found) =
                            find_table_type(tree, value, target, member_table)
                        {
                            return Some(found);
                        }
                    }
                }
            }
            _ => {}
        }
    }
    None
}
