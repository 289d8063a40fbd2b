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

//! The schema IR produced by the CSL parser.
//!
//! Ownership forms a DAG: subtrees referenced from unions and key
//! definitions are shared through `Arc`, which also lets the language
//! server hold schemas across async request handlers. Every node carries
//! its source region.

use std::sync::Arc;
use tomlet_core::{Region, TypeTag};

/// The primitive kinds of the schema language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    String,
    Number,
    Boolean,
    Datetime,
    Duration,
}

/// One key declaration inside a table type.
#[derive(Debug, Clone)]
pub struct KeyDefinition {
    /// Declared key name (`*` for the wildcard).
    pub name: String,
    /// `true` for the `*` wildcard entry.
    pub is_wildcard: bool,
    /// `true` when declared with `name?`.
    pub is_optional: bool,
    /// The declared type.
    pub ty: Arc<CslType>,
    /// Global annotations attached to the key (e.g. `@deprecated`).
    pub annotations: Vec<Arc<Annotation>>,
    /// Default literal when declared with `name = literal`.
    pub default_literal: Option<(String, TypeTag)>,
}

/// A table type: explicit keys, an optional wildcard, and constraints.
#[derive(Debug, Clone)]
pub struct TableType {
    pub explicit_keys: Vec<KeyDefinition>,
    pub wildcard_key: Option<Arc<KeyDefinition>>,
    pub constraints: Vec<Arc<Constraint>>,
    pub region: Region,
}

impl TableType {
    /// Looks up an explicit key definition by name.
    pub fn explicit_key(&self, name: &str) -> Option<&KeyDefinition> {
        self.explicit_keys.iter().find(|key| key.name == name)
    }
}

/// A CSL type.
#[derive(Debug, Clone)]
pub enum CslType {
    Primitive {
        primitive: Primitive,
        /// Literal set restricting the accepted values, possibly empty.
        allowed_values: Vec<(String, TypeTag)>,
        /// Local annotations attached to the primitive.
        annotations: Vec<Arc<Annotation>>,
        region: Region,
    },
    Table(TableType),
    Array {
        element: Arc<CslType>,
        region: Region,
    },
    Union {
        members: Vec<Arc<CslType>>,
        region: Region,
    },
    AnyTable {
        region: Region,
    },
    AnyArray {
        region: Region,
    },
    /// Placeholder produced when the type grammar fails; validating
    /// against it always errors.
    Invalid {
        region: Region,
    },
}

impl CslType {
    /// Source region of the type.
    pub fn region(&self) -> Region {
        match self {
            CslType::Primitive { region, .. }
            | CslType::Array { region, .. }
            | CslType::Union { region, .. }
            | CslType::AnyTable { region }
            | CslType::AnyArray { region }
            | CslType::Invalid { region } => *region,
            CslType::Table(table) => table.region,
        }
    }

    /// The contained table type, if this is a table.
    pub fn as_table(&self) -> Option<&TableType> {
        match self {
            CslType::Table(table) => Some(table),
            _ => None,
        }
    }
}

/// An `@name(args…)` annotation.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub name: String,
    pub args: Vec<Arc<Expr>>,
    pub region: Region,
}

/// A declarative constraint inside a `constraints { … }` block.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// `conflicts a with b;`
    Conflict {
        first: Arc<Expr>,
        second: Arc<Expr>,
        region: Region,
    },
    /// `requires a => b;`
    Dependency {
        dependent: Arc<Expr>,
        condition: Arc<Expr>,
        region: Region,
    },
    /// `validate expr;`
    Validate {
        expr: Arc<Expr>,
        region: Region,
    },
}

impl Constraint {
    pub fn region(&self) -> Region {
        match self {
            Constraint::Conflict { region, .. }
            | Constraint::Dependency { region, .. }
            | Constraint::Validate { region, .. } => *region,
        }
    }
}

/// The value of a function-call argument: a single expression or a
/// bracketed list.
#[derive(Debug, Clone)]
pub enum FunctionArgValue {
    Single(Arc<Expr>),
    List(Vec<Arc<Expr>>),
}

/// An expression in the constraint/annotation sub-language.
#[derive(Debug, Clone)]
pub enum Expr {
    Binary {
        op: String,
        lhs: Arc<Expr>,
        rhs: Arc<Expr>,
        region: Region,
    },
    Unary {
        op: String,
        operand: Arc<Expr>,
        region: Region,
    },
    Ternary {
        condition: Arc<Expr>,
        true_expr: Arc<Expr>,
        false_expr: Arc<Expr>,
        region: Region,
    },
    Literal {
        tag: Option<TypeTag>,
        value: String,
        region: Region,
    },
    Identifier {
        name: String,
        region: Region,
    },
    FunctionArg {
        value: FunctionArgValue,
        region: Region,
    },
    FunctionCall {
        name: String,
        args: Vec<Arc<Expr>>,
        region: Region,
    },
    Annotation {
        target: Arc<Expr>,
        annotation: Arc<Annotation>,
        region: Region,
    },
}

impl Expr {
    /// Source region of the expression.
    pub fn region(&self) -> Region {
        match self {
            Expr::Binary { region, .. }
            | Expr::Unary { region, .. }
            | Expr::Ternary { region, .. }
            | Expr::Literal { region, .. }
            | Expr::Identifier { region, .. }
            | Expr::FunctionArg { region, .. }
            | Expr::FunctionCall { region, .. }
            | Expr::Annotation { region, .. } => *region,
        }
    }

    /// Renders the expression back to source-ish text, used in
    /// diagnostics and for key-path resolution.
    pub fn to_expr_string(&self) -> String {
        match self {
            Expr::Identifier { name, .. } => name.clone(),
            Expr::Literal { value, .. } => value.clone(),
            Expr::Binary { op, lhs, rhs, .. } => {
                format!("{}{}{}", lhs.to_expr_string(), op, rhs.to_expr_string())
            }
            Expr::Unary { op, operand, .. } => format!("{}{}", op, operand.to_expr_string()),
            Expr::Ternary {
                condition,
                true_expr,
                false_expr,
                ..
            } => format!(
                "{} ? {} : {}",
                condition.to_expr_string(),
                true_expr.to_expr_string(),
                false_expr.to_expr_string()
            ),
            Expr::FunctionArg { value, .. } => match value {
                FunctionArgValue::Single(expr) => expr.to_expr_string(),
                FunctionArgValue::List(exprs) => {
                    let parts: Vec<String> =
                        exprs.iter().map(|e| e.to_expr_string()).collect();
                    format!("[{}]", parts.join(", "))
                }
            },
            Expr::FunctionCall { name, args, .. } => {
                let parts: Vec<String> = args.iter().map(|a| a.to_expr_string()).collect();
                format!("{}({})", name, parts.join(", "))
            }
            Expr::Annotation {
                target, annotation, ..
            } => {
                let parts: Vec<String> = annotation
                    .args
                    .iter()
                    .map(|a| a.to_expr_string())
                    .collect();
                format!(
                    "{}@{}({})",
                    target.to_expr_string(),
                    annotation.name,
                    parts.join(", ")
                )
            }
        }
    }

    /// `true` for a bare identifier or a dotted chain of identifiers,
    /// which resolve as key paths rather than evaluating.
    pub fn is_simple_key_path(&self) -> bool {
        match self {
            Expr::Identifier { .. } => true,
            Expr::Binary { op, lhs, rhs, .. } => {
                op == "." && lhs.is_simple_key_path() && rhs.is_simple_key_path()
            }
            _ => false,
        }
    }
}

/// A named `config` schema with its root table type.
#[derive(Debug, Clone)]
pub struct ConfigSchema {
    pub name: String,
    pub root: Arc<TableType>,
    pub region: Region,
}
