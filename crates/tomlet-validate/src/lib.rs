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

//! Validates a parsed TOML document tree against a CSL schema.
//!
//! The walk is recursive on schema type and document node: primitives
//! check allowed literals, annotations, and value kind; tables enforce
//! required keys, recurse, match wildcards, and evaluate constraints;
//! arrays recurse with indexed paths; unions accept the first matching
//! member. Problems become diagnostics, never errors.

pub mod annotations;
pub mod value;

use annotations::{check_annotation, AnnotationOutcome};
use std::sync::Arc;
use tomlet_core::diagnostics::{Diagnostic, DiagnosticList};
use tomlet_core::doctree::{DocNode, DocTree, NodeId};
use tomlet_core::position::Region;
use tomlet_core::types::TypeTag;
use tomlet_csl::ir::{
    Annotation, ConfigSchema, Constraint, CslType, Expr, FunctionArgValue, Primitive, TableType,
};
use value::{apply_binary_op, apply_unary_op, coerce, truthy, values_equal, EvalValue};

/// Validates `tree` against the named schema (or the sole schema when the
/// name is empty). Returns `(errors, warnings)`.
pub fn validate(
    schema_name: &str,
    schemas: &[Arc<ConfigSchema>],
    tree: &DocTree,
) -> (DiagnosticList, DiagnosticList) {
    let schema = if schema_name.is_empty() && schemas.len() == 1 {
        Some(&schemas[0])
    } else {
        schemas.iter().find(|s| s.name == schema_name)
    };
    let Some(schema) = schema else {
        return (
            vec![Diagnostic::new(
                format!("Cannot find config schema {schema_name}"),
                Region::default(),
            )],
            Vec::new(),
        );
    };

    let mut validator = Validator {
        tree,
        errors: Vec::new(),
        warnings: Vec::new(),
    };
    let path = schema.name.clone();
    validator.validate_table(&schema.root, tree.root(), &path);
    (validator.errors, validator.warnings)
}

/// An evaluated function-call argument.
enum FnArg {
    Node(Option<NodeId>),
    Names(Vec<String>),
}

/// What a function call produced: a plain value, or the key nodes from
/// `all_keys`.
enum FnResult {
    Value(EvalValue),
    KeyNodes(Vec<NodeId>),
}

struct Validator<'t> {
    tree: &'t DocTree,
    errors: DiagnosticList,
    warnings: DiagnosticList,
}

impl<'t> Validator<'t> {
    fn error(&mut self, message: impl Into<String>, region: Region) {
        self.errors.push(Diagnostic::new(message, region));
    }

    fn warning(&mut self, message: impl Into<String>, region: Region) {
        self.warnings.push(Diagnostic::new(message, region));
    }

    fn def_region(&self, node: Option<NodeId>) -> Region {
        node.map(|id| self.tree.def_region(id)).unwrap_or_default()
    }

    /// Resolves a dotted path against a table context. A non-table node
    /// reached mid-path is returned as-is; a missing segment is `None`.
    fn resolve_path(&self, path: &str, context: NodeId) -> Option<NodeId> {
        let mut current = context;
        for segment in path.split('.') {
            let key = self.tree.find_key(current, segment)?;
            let value = self.tree.as_key(key).and_then(|k| k.value)?;
            if self.tree.as_table(value).is_some() {
                current = value;
            } else {
                return Some(value);
            }
        }
        Some(current)
    }

    // ==================== type walk ====================

    fn validate_type(&mut self, ty: &CslType, node: NodeId, path: &str) -> bool {
        match ty {
            CslType::Primitive {
                primitive,
                allowed_values,
                annotations,
                ..
            } => {
                if self.tree.as_value(node).is_some() {
                    self.validate_primitive(*primitive, allowed_values, annotations, node)
                } else {
                    self.error(
                        format!("Expected {path} as a primitive value"),
                        self.def_region(Some(node)),
                    );
                    false
                }
            }
            CslType::Table(table) => {
                if self.tree.as_table(node).is_some() {
                    self.validate_table(table, node, path)
                } else {
                    self.error(
                        format!("Expected {path} as a table"),
                        self.def_region(Some(node)),
                    );
                    false
                }
            }
            CslType::Array { element, .. } => {
                if self.tree.as_array(node).is_some() {
                    self.validate_array(element, node, path)
                } else {
                    self.error(
                        format!("Expected {path} as an array"),
                        self.def_region(Some(node)),
                    );
                    false
                }
            }
            CslType::Union { members, .. } => {
                // Accept the first matching member; failed attempts leave
                // no diagnostics behind.
                for member in members {
                    let error_mark = self.errors.len();
                    let warning_mark = self.warnings.len();
                    if self.validate_type(member, node, path) {
                        return true;
                    }
                    self.errors.truncate(error_mark);
                    self.warnings.truncate(warning_mark);
                }
                self.error(
                    format!("Value of {path} doesn't match any union member type"),
                    self.def_region(Some(node)),
                );
                false
            }
            CslType::AnyTable { .. } => {
                if self.tree.as_table(node).is_some() {
                    true
                } else {
                    self.error(
                        format!("Expected {path} as an any table"),
                        self.def_region(Some(node)),
                    );
                    false
                }
            }
            CslType::AnyArray { .. } => {
                if self.tree.as_array(node).is_some() {
                    true
                } else {
                    self.error(
                        format!("Expected {path} as an any array"),
                        self.def_region(Some(node)),
                    );
                    false
                }
            }
            CslType::Invalid { region } => {
                self.error("Unsupported type kind", *region);
                false
            }
        }
    }

    fn validate_primitive(
        &mut self,
        primitive: Primitive,
        allowed_values: &[(String, TypeTag)],
        annotations: &[Arc<Annotation>],
        node: NodeId,
    ) -> bool {
        let Some(value) = self.tree.as_value(node) else {
            return false;
        };
        let region = value.def_region;
        let text = value.text.clone();
        let actual = coerce(value.tag, &value.text);
        let tag = value.tag;

        if !allowed_values.is_empty() {
            let matched = allowed_values
                .iter()
                .any(|(literal, literal_tag)| {
                    values_equal(&coerce(*literal_tag, literal), &actual)
                });
            if !matched {
                self.error(format!("Value '{text}' not in allowed values"), region);
                return false;
            }
        }

        for annotation in annotations {
            if !self.apply_annotation(annotation, &actual, self.tree.root()) {
                self.error(
                    format!(
                        "Failed to validate key against annotation '{}'.",
                        annotation.name
                    ),
                    region,
                );
                return false;
            }
        }

        let kind_ok = match primitive {
            Primitive::String => matches!(tag, TypeTag::String(_)),
            Primitive::Number => tag.is_numeric(),
            Primitive::Boolean => matches!(tag, TypeTag::Boolean),
            Primitive::Datetime => matches!(tag, TypeTag::DateTime(_)),
            // Durations are written as strings in the document.
            Primitive::Duration => matches!(tag, TypeTag::String(_)),
        };
        if !kind_ok {
            let expected = match primitive {
                Primitive::String => "Expected string value",
                Primitive::Number => "Expected numeric value",
                Primitive::Boolean => "Expected boolean value",
                Primitive::Datetime => "Expected datetime value",
                Primitive::Duration => "Expected duration value",
            };
            self.error(expected, region);
            return false;
        }
        true
    }

    fn validate_table(&mut self, table_type: &TableType, node: NodeId, path: &str) -> bool {
        let mut valid = true;
        let Some(table) = self.tree.as_table(node) else {
            return false;
        };
        let table_region = table.def_region;
        let elems: Vec<(String, NodeId)> = table
            .elems
            .iter()
            .map(|(name, key)| (name.clone(), *key))
            .collect();

        // Explicit keys: presence, type, then key-level annotations.
        for key_def in &table_type.explicit_keys {
            let new_path = format!("{path}.{}", key_def.name);
            let Some(key) = self.tree.find_key(node, &key_def.name) else {
                if !key_def.is_optional {
                    self.error(format!("Missing required key: {new_path}"), table_region);
                    valid = false;
                }
                continue;
            };
            let Some(key_value) = self.tree.as_key(key).and_then(|k| k.value) else {
                continue;
            };
            if !self.validate_type(&key_def.ty, key_value, &new_path) {
                valid = false;
            }
            for annotation in &key_def.annotations {
                let target = match self.tree.as_value(key_value) {
                    Some(value) => coerce(value.tag, &value.text),
                    None => EvalValue::Null,
                };
                if !self.apply_annotation(annotation, &target, node) {
                    self.error(
                        format!(
                            "Failed to validate key against annotation '{}'.",
                            annotation.name
                        ),
                        self.def_region(Some(key_value)),
                    );
                    valid = false;
                }
            }
        }

        // Keys not covered by explicit declarations.
        for (name, key) in &elems {
            if table_type.explicit_key(name).is_some() {
                continue;
            }
            let Some(key_value) = self.tree.as_key(*key).and_then(|k| k.value) else {
                continue;
            };
            match &table_type.wildcard_key {
                Some(wildcard) => {
                    let wildcard_path = format!("{path}.*");
                    if !self.validate_type(&wildcard.ty, key_value, &wildcard_path) {
                        self.error(
                            format!(
                                "Key '{path}.{name}' failed to match the type of the wildcard key"
                            ),
                            self.def_region(Some(key_value)),
                        );
                        valid = false;
                    }
                }
                None => {
                    self.warning(
                        format!("Key {path}.{name} is not in the schema"),
                        self.def_region(Some(key_value)),
                    );
                }
            }
        }

        for constraint in &table_type.constraints {
            if !self.check_constraint(constraint, node) {
                valid = false;
            }
        }
        valid
    }

    fn validate_array(&mut self, element: &CslType, node: NodeId, path: &str) -> bool {
        let Some(array) = self.tree.as_array(node) else {
            return false;
        };
        let elems = array.elems.clone();
        let mut valid = true;
        for (index, elem) in elems.iter().enumerate() {
            let elem_path = format!("{path}[{index}]");
            if !self.validate_type(element, *elem, &elem_path) {
                valid = false;
            }
        }
        valid
    }

    // ==================== constraints ====================

    fn check_constraint(&mut self, constraint: &Constraint, context: NodeId) -> bool {
        match constraint {
            Constraint::Conflict { first, second, .. } => {
                let has_first = self.eval_expr_bool(first, context);
                let has_second = self.eval_expr_bool(second, context);
                if has_first && has_second {
                    let message = format!(
                        "Conflicting keys: {} and {}",
                        first.to_expr_string(),
                        second.to_expr_string()
                    );
                    let first_region = self.key_path_region(first, context);
                    let second_region = self.key_path_region(second, context);
                    self.error(message.clone(), first_region);
                    self.error(message, second_region);
                    return false;
                }
                true
            }
            Constraint::Dependency {
                dependent,
                condition,
                ..
            } => {
                let has_dependent = self.eval_expr_bool(dependent, context);
                let has_condition = self.eval_expr_bool(condition, context);
                if has_dependent && !has_condition {
                    let region = self.key_path_region(dependent, context);
                    self.error(
                        format!(
                            "Dependency failed: {} requires {}",
                            dependent.to_expr_string(),
                            condition.to_expr_string()
                        ),
                        region,
                    );
                    return false;
                }
                true
            }
            Constraint::Validate { expr, region } => {
                let result = self.eval_expr_bool(expr, context);
                if !result {
                    self.error(
                        format!("Validation failed: {}", expr.to_expr_string()),
                        *region,
                    );
                }
                result
            }
        }
    }

    fn key_path_region(&self, expr: &Expr, context: NodeId) -> Region {
        if expr.is_simple_key_path() {
            let node = self.resolve_path(&expr.to_expr_string(), context);
            self.def_region(node)
        } else {
            Region::default()
        }
    }

    // ==================== expressions ====================

    fn resolve_key_value(&self, path: &str, context: NodeId) -> EvalValue {
        match self.resolve_path(path, context) {
            None => EvalValue::Null,
            Some(node) => match self.tree.as_value(node) {
                Some(value) => coerce(value.tag, &value.text),
                // Exists but is not a scalar.
                None => EvalValue::Bool(true),
            },
        }
    }

    fn eval_expr_bool(&mut self, expr: &Expr, context: NodeId) -> bool {
        if expr.is_simple_key_path() {
            return self.resolve_path(&expr.to_expr_string(), context).is_some();
        }
        let result = self.eval_expr_value(expr, context);
        truthy(&result)
    }

    fn eval_expr_value(&mut self, expr: &Expr, context: NodeId) -> EvalValue {
        match expr {
            Expr::Identifier { name, .. } => self.resolve_key_value(name, context),
            Expr::Binary { op, lhs, rhs, .. } => {
                if op == "." {
                    let path =
                        format!("{}.{}", lhs.to_expr_string(), rhs.to_expr_string());
                    return self.resolve_key_value(&path, context);
                }
                let lhs = self.eval_expr_value(lhs, context);
                let rhs = self.eval_expr_value(rhs, context);
                apply_binary_op(&lhs, &rhs, op)
            }
            Expr::Unary { op, operand, .. } => {
                let operand = self.eval_expr_value(operand, context);
                apply_unary_op(&operand, op)
            }
            Expr::Ternary {
                condition,
                true_expr,
                false_expr,
                ..
            } => {
                let cond = self.eval_expr_value(condition, context);
                if truthy(&cond) {
                    self.eval_expr_value(true_expr, context)
                } else {
                    self.eval_expr_value(false_expr, context)
                }
            }
            Expr::Literal { tag, value, .. } => match tag {
                Some(tag) => coerce(*tag, value),
                None => EvalValue::Null,
            },
            Expr::FunctionArg { value, .. } => match value {
                FunctionArgValue::Single(inner) => self.eval_expr_value(inner, context),
                FunctionArgValue::List(_) => EvalValue::Null,
            },
            Expr::FunctionCall { name, args, region } => {
                match self.eval_function_call(name, args, *region, context) {
                    FnResult::Value(value) => value,
                    FnResult::KeyNodes(_) => EvalValue::Null,
                }
            }
            Expr::Annotation {
                target, annotation, ..
            } => self.eval_annotation_expr(target, annotation, context),
        }
    }

    /// `target@annotation(args…)`: applies the annotation to each target
    /// value (`all_keys(path)` fans out over key names).
    fn eval_annotation_expr(
        &mut self,
        target: &Expr,
        annotation: &Annotation,
        context: NodeId,
    ) -> EvalValue {
        let mut targets: Vec<EvalValue> = Vec::new();
        match target {
            Expr::FunctionCall { name, args, region } => {
                match self.eval_function_call(name, args, *region, context) {
                    FnResult::KeyNodes(keys) => {
                        for key in keys {
                            if let Some(key_node) = self.tree.as_key(key) {
                                targets.push(EvalValue::Str(key_node.id.clone()));
                            }
                        }
                    }
                    FnResult::Value(value) => targets.push(value),
                }
            }
            other => targets.push(self.eval_expr_value(other, context)),
        }

        let mut all_pass = true;
        for target_value in &targets {
            if !self.apply_annotation(annotation, target_value, context) {
                all_pass = false;
            }
        }
        EvalValue::Bool(all_pass)
    }

    /// Evaluates an annotation against one target value. Deprecation
    /// warns and passes; unknown annotations error and pass; unknown
    /// formats error and fail.
    fn apply_annotation(
        &mut self,
        annotation: &Annotation,
        target: &EvalValue,
        context: NodeId,
    ) -> bool {
        let args: Vec<EvalValue> = annotation
            .args
            .iter()
            .map(|arg| self.eval_expr_value(arg, context))
            .collect();
        let format_id = annotation.args.first().and_then(|arg| match &**arg {
            Expr::Identifier { name, .. } => Some(name.clone()),
            _ => None,
        });

        match check_annotation(&annotation.name, &args, format_id.as_deref(), target) {
            AnnotationOutcome::Pass => true,
            AnnotationOutcome::Fail => false,
            AnnotationOutcome::Deprecated(message) => {
                self.warning(message, annotation.region);
                true
            }
            AnnotationOutcome::UnknownAnnotation => {
                self.error(
                    format!("Unknown annotation: {}", annotation.name),
                    annotation.region,
                );
                true
            }
            AnnotationOutcome::UnknownFormat(format) => {
                self.error(format!("Unknown format type: {format}"), annotation.region);
                false
            }
        }
    }

    // ==================== built-in functions ====================

    fn eval_function_call(
        &mut self,
        name: &str,
        args: &[Arc<Expr>],
        region: Region,
        context: NodeId,
    ) -> FnResult {
        let arg_values: Vec<FnArg> = args
            .iter()
            .map(|arg| match &**arg {
                Expr::FunctionArg {
                    value: FunctionArgValue::Single(inner),
                    ..
                } => FnArg::Node(self.resolve_path(&inner.to_expr_string(), context)),
                Expr::FunctionArg {
                    value: FunctionArgValue::List(elems),
                    ..
                } => FnArg::Names(elems.iter().map(|e| literal_text(e)).collect()),
                other => FnArg::Node(self.resolve_path(&other.to_expr_string(), context)),
            })
            .collect();

        match name {
            "exists" => {
                let found = matches!(arg_values.first(), Some(FnArg::Node(Some(_))));
                FnResult::Value(EvalValue::Bool(found))
            }
            "count_keys" => match arg_values.first() {
                Some(FnArg::Node(Some(node))) => match self.tree.as_table(*node) {
                    Some(table) => {
                        FnResult::Value(EvalValue::Number(table.elems.len() as f64))
                    }
                    None => FnResult::Value(EvalValue::Bool(false)),
                },
                _ => FnResult::Value(EvalValue::Bool(false)),
            },
            "all_keys" => match arg_values.first() {
                Some(FnArg::Node(Some(node))) => match self.tree.as_table(*node) {
                    Some(table) => {
                        FnResult::KeyNodes(table.elems.values().copied().collect())
                    }
                    None => FnResult::KeyNodes(Vec::new()),
                },
                _ => FnResult::KeyNodes(Vec::new()),
            },
            "subset" => FnResult::Value(EvalValue::Bool(
                self.eval_subset(&arg_values, region),
            )),
            other => {
                self.error(
                    format!("Function call error: unknown function '{other}'"),
                    region,
                );
                FnResult::Value(EvalValue::Bool(false))
            }
        }
    }

    /// `subset(a, b[, keys])`: every element of `a` must structurally
    /// match some element of `b`; with a key list, only those properties
    /// are compared.
    fn eval_subset(&mut self, args: &[FnArg], region: Region) -> bool {
        let source = match args.first() {
            Some(FnArg::Node(Some(node))) if self.tree.as_array(*node).is_some() => {
                self.tree.as_array(*node).map(|a| a.elems.clone()).unwrap_or_default()
            }
            Some(FnArg::Node(Some(node))) => {
                let node_region = self.def_region(Some(*node));
                self.error("First argument of subset must be an array", node_region);
                return false;
            }
            _ => {
                self.error("First argument of subset must be an array", region);
                return false;
            }
        };
        let target = match args.get(1) {
            Some(FnArg::Node(Some(node))) if self.tree.as_array(*node).is_some() => {
                self.tree.as_array(*node).map(|a| a.elems.clone()).unwrap_or_default()
            }
            Some(FnArg::Node(Some(node))) => {
                let node_region = self.def_region(Some(*node));
                self.error("Second argument of subset must be an array", node_region);
                return false;
            }
            _ => {
                self.error("Second argument of subset must be an array", region);
                return false;
            }
        };

        if source.is_empty() {
            return true;
        }

        let properties: Vec<String> = match args.get(2) {
            Some(FnArg::Names(names)) => names.clone(),
            Some(FnArg::Node(_)) => {
                self.error("Third argument of subset must be a key list", region);
                return false;
            }
            None => Vec::new(),
        };

        for source_elem in &source {
            let mut found = false;
            if properties.is_empty() {
                for target_elem in &target {
                    if self.deep_compare(*source_elem, *target_elem) {
                        found = true;
                        break;
                    }
                }
            } else {
                if self.tree.as_table(*source_elem).is_none() {
                    let elem_region = self.def_region(Some(*source_elem));
                    self.error("Source element is not an object", elem_region);
                    return false;
                }
                for target_elem in &target {
                    if self.tree.as_table(*target_elem).is_none() {
                        continue;
                    }
                    let mut matched = true;
                    for property in &properties {
                        let source_prop = self.resolve_path(property, *source_elem);
                        let Some(source_prop) = source_prop else {
                            let elem_region = self.def_region(Some(*source_elem));
                            self.error(
                                format!("Missing property '{property}' in source object"),
                                elem_region,
                            );
                            return false;
                        };
                        let target_prop = self.resolve_path(property, *target_elem);
                        match target_prop {
                            Some(target_prop)
                                if self.deep_compare(source_prop, target_prop) => {}
                            _ => {
                                matched = false;
                                break;
                            }
                        }
                    }
                    if matched {
                        found = true;
                        break;
                    }
                }
            }
            if !found {
                return false;
            }
        }
        true
    }

    /// Structural comparison of two document nodes.
    fn deep_compare(&self, a: NodeId, b: NodeId) -> bool {
        match (self.tree.node(a), self.tree.node(b)) {
            (DocNode::Value(left), DocNode::Value(right)) => values_equal(
                &coerce(left.tag, &left.text),
                &coerce(right.tag, &right.text),
            ),
            (DocNode::Table(left), DocNode::Table(right)) => {
                for (name, left_key) in &left.elems {
                    let Some(right_key) = right.elems.get(name) else {
                        return false;
                    };
                    let left_value = self.tree.as_key(*left_key).and_then(|k| k.value);
                    let right_value = self.tree.as_key(*right_key).and_then(|k| k.value);
                    match (left_value, right_value) {
                        (Some(lv), Some(rv)) if self.deep_compare(lv, rv) => {}
                        (None, None) => {}
                        _ => return false,
                    }
                }
                true
            }
            (DocNode::Array(left), DocNode::Array(right)) => {
                for left_elem in &left.elems {
                    let matched = right
                        .elems
                        .iter()
                        .any(|right_elem| self.deep_compare(*left_elem, *right_elem));
                    if !matched {
                        return false;
                    }
                }
                true
            }
            _ => false,
        }
    }
}

/// The comparable text of a list-argument element: string literals are
/// unquoted, identifiers use their name.
fn literal_text(expr: &Expr) -> String {
    match expr {
        Expr::Literal {
            tag: Some(TypeTag::String(kind)),
            value,
            ..
        } => tomlet_core::strings::extract_string_content(value, *kind)
            .unwrap_or_else(|_| value.clone()),
        other => other.to_expr_string(),
    }
}
