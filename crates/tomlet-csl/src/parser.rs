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

//! The CSL parser: `config NAME { body }` schemas with a Pratt expression
//! parser over the operator table.
//!
//! A body is a sequence of key definitions (`name[?] (:|=) type
//! [annotations] ;`), an optional wildcard (`*: type ;`), and a
//! `constraints { … }` block. Types parse as union over postfix (`[]`)
//! over primary. Like the TOML parser, problems become diagnostics and
//! parsing continues.

use crate::ir::{
    Annotation, ConfigSchema, Constraint, CslType, Expr, FunctionArgValue, KeyDefinition,
    Primitive, TableType,
};
use crate::ops;
use std::sync::Arc;
use tomlet_core::diagnostics::{Diagnostic, DiagnosticList};
use tomlet_core::position::Region;
use tomlet_core::token::{TokenCategory, TokenList};
use tomlet_core::types::TypeTag;

/// Result of parsing one schema source.
#[derive(Debug)]
pub struct ParseOutput {
    pub schemas: Vec<Arc<ConfigSchema>>,
    pub errors: DiagnosticList,
    pub warnings: DiagnosticList,
}

/// Parses every `config` schema in the token stream.
pub fn parse(tokens: &TokenList) -> ParseOutput {
    let mut parser = Parser::new(tokens);
    let schemas = parser.parse_schemas();
    ParseOutput {
        schemas,
        errors: parser.errors,
        warnings: parser.warnings,
    }
}

struct Parser<'t> {
    tokens: &'t TokenList,
    pos: usize,
    errors: DiagnosticList,
    warnings: DiagnosticList,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t TokenList) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    // ==================== cursor helpers ====================

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn text(&self) -> &str {
        self.tokens
            .get(self.pos)
            .map(|t| t.text.as_str())
            .unwrap_or("")
    }

    fn category(&self) -> Option<TokenCategory> {
        self.tokens.get(self.pos).map(|t| t.category)
    }

    fn payload(&self) -> Option<TypeTag> {
        self.tokens.get(self.pos).and_then(|t| t.payload)
    }

    fn region(&self) -> Region {
        self.tokens
            .get(self.pos)
            .map(|t| t.region)
            .unwrap_or_default()
    }

    fn prev_region(&self) -> Region {
        if self.pos == 0 {
            Region::default()
        } else {
            self.tokens
                .get(self.pos - 1)
                .map(|t| t.region)
                .unwrap_or_default()
        }
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn error(&mut self, message: impl Into<String>, region: Region) {
        self.errors.push(Diagnostic::new(message, region));
    }

    /// Reports `msg` unless the current token is `token`. Does not
    /// consume; callers advance separately.
    fn expect(&mut self, token: &str, msg: &str) {
        if self.text() != token {
            let found = if self.at_end() {
                "end of input".to_string()
            } else {
                self.text().to_string()
            };
            let region = if self.at_end() {
                self.prev_region()
            } else {
                self.region()
            };
            self.error(format!("{msg}. Found: {found}"), region);
        }
    }

    // ==================== schemas ====================

    fn parse_schemas(&mut self) -> Vec<Arc<ConfigSchema>> {
        let mut schemas = Vec::new();
        while !self.at_end() {
            if self.text() == "config" {
                schemas.push(Arc::new(self.parse_config_schema()));
            } else {
                self.advance();
            }
        }
        schemas
    }

    fn parse_config_schema(&mut self) -> ConfigSchema {
        self.advance(); // config
        if self.category() != Some(TokenCategory::Identifier) {
            let found = self.text().to_string();
            let region = self.region();
            self.error(
                format!("Expected schema name after 'config'. Found: {found}"),
                region,
            );
        }
        let name = self.text().to_string();
        let name_region = self.region();
        self.advance();
        let root = self.parse_table_type();
        ConfigSchema {
            name,
            root: Arc::new(root),
            region: name_region,
        }
    }

    fn parse_table_type(&mut self) -> TableType {
        self.expect("{", "Expected '{' to open table type");
        self.advance();

        let table_start = self.region().start;
        let mut explicit_keys = Vec::new();
        let mut wildcard_key = None;
        let mut constraints = Vec::new();

        while !self.at_end() && self.text() != "}" {
            if self.text() == "constraints" {
                constraints = self.parse_constraints();
            } else if self.text() == "*" {
                wildcard_key = Some(Arc::new(self.parse_wildcard_key()));
            } else {
                explicit_keys.push(self.parse_key_definition());
            }
        }

        self.expect("}", "Expected '}' to close table type");
        let table_end = self.region().end;
        self.advance(); // }

        TableType {
            explicit_keys,
            wildcard_key,
            constraints,
            region: Region::new(table_start, table_end),
        }
    }

    fn parse_key_definition(&mut self) -> KeyDefinition {
        let name = self.text().to_string();
        self.advance();

        let mut is_optional = false;
        if self.text() == "?" {
            is_optional = true;
            self.advance();
        }

        let mut default_literal = None;
        let ty;
        let mut annotations = Vec::new();
        if self.text() == ":" || self.text() == "=" {
            let with_default = self.text() == "=";
            self.advance();
            if with_default {
                // `name = literal;`: the literal constrains the type and
                // doubles as the key's default.
                if let Some(tag) = self.payload() {
                    default_literal = Some((self.text().to_string(), tag));
                }
            }
            ty = Arc::new(self.parse_type());
            annotations = self.parse_annotations(true);
        } else {
            let found = self.text().to_string();
            let region = self.region();
            self.error(
                format!("Expected ':' or '=' after key name. Found: {found}"),
                region,
            );
            self.advance();
            ty = Arc::new(CslType::Invalid { region });
        }

        self.expect(";", "Expected ';' after key definition");
        self.advance();

        KeyDefinition {
            name,
            is_wildcard: false,
            is_optional,
            ty,
            annotations,
            default_literal,
        }
    }

    fn parse_wildcard_key(&mut self) -> KeyDefinition {
        self.advance(); // *
        self.expect(":", "Expected ':' after wildcard");
        self.advance();

        let ty = Arc::new(self.parse_type());
        let annotations = self.parse_annotations(true);

        self.expect(";", "Expected ';' after wildcard key");
        self.advance();

        KeyDefinition {
            name: "*".to_string(),
            is_wildcard: true,
            is_optional: false,
            ty,
            annotations,
            default_literal: None,
        }
    }

    // ==================== types ====================

    /// Union over postfix over primary.
    fn parse_type(&mut self) -> CslType {
        let type_start = self.region().start;
        let first = self.parse_postfix_type();
        if self.text() != "|" {
            return first;
        }

        let mut members: Vec<Arc<CslType>> = match first {
            CslType::Union { members, .. } => members,
            other => vec![Arc::new(other)],
        };
        while self.text() == "|" {
            self.advance();
            match self.parse_postfix_type() {
                CslType::Union { members: inner, .. } => members.extend(inner),
                other => members.push(Arc::new(other)),
            }
        }
        CslType::Union {
            members,
            region: Region::new(type_start, self.prev_region().end),
        }
    }

    fn parse_postfix_type(&mut self) -> CslType {
        let mut ty = self.parse_primary_type();
        while self.text() == "[" {
            let type_start = self.region().start;
            self.advance();
            self.expect("]", "Expected ']' after array type");
            let type_end = self.region().end;
            self.advance();
            ty = CslType::Array {
                element: Arc::new(ty),
                region: Region::new(type_start, type_end),
            };
        }
        ty
    }

    fn parse_primary_type(&mut self) -> CslType {
        let region = self.region();
        match self.category() {
            Some(
                TokenCategory::Number
                | TokenCategory::Boolean
                | TokenCategory::String
                | TokenCategory::Datetime,
            ) => {
                return self.parse_literal_type();
            }
            _ => {}
        }
        match self.text() {
            "string" => self.parse_primitive(Primitive::String, region),
            "number" => self.parse_primitive(Primitive::Number, region),
            "boolean" => self.parse_primitive(Primitive::Boolean, region),
            "datetime" => self.parse_primitive(Primitive::Datetime, region),
            "duration" => self.parse_primitive(Primitive::Duration, region),
            "any{}" => {
                self.advance();
                CslType::AnyTable { region }
            }
            "any[]" => {
                self.advance();
                CslType::AnyArray { region }
            }
            "{" => CslType::Table(self.parse_table_type()),
            "(" => {
                self.advance();
                let ty = self.parse_type();
                self.expect(")", "Expected ')' after parenthesized type");
                self.advance();
                ty
            }
            other => {
                let found = other.to_string();
                self.error(format!("Unexpected token in type: {found}"), region);
                CslType::Invalid { region }
            }
        }
    }

    fn parse_primitive(&mut self, primitive: Primitive, region: Region) -> CslType {
        self.advance();
        let annotations = if self.at_end() {
            Vec::new()
        } else {
            self.parse_annotations(false)
        };
        CslType::Primitive {
            primitive,
            allowed_values: Vec::new(),
            annotations,
            region,
        }
    }

    /// A literal used as a type: the primitive kind of the literal with a
    /// single-element allowed set.
    fn parse_literal_type(&mut self) -> CslType {
        let region = self.region();
        let primitive = match self.category() {
            Some(TokenCategory::Number) => Primitive::Number,
            Some(TokenCategory::Boolean) => Primitive::Boolean,
            Some(TokenCategory::String) => Primitive::String,
            Some(TokenCategory::Datetime) => Primitive::Datetime,
            _ => {
                let found = self.text().to_string();
                self.error(format!("Unexpected literal type: {found}"), region);
                return CslType::Invalid { region };
            }
        };
        let allowed = match self.payload() {
            Some(tag) => vec![(self.text().to_string(), tag)],
            None => Vec::new(),
        };
        self.advance();
        CslType::Primitive {
            primitive,
            allowed_values: allowed,
            annotations: Vec::new(),
            region,
        }
    }

    // ==================== annotations ====================

    fn is_global_annotation(name: &str) -> bool {
        name == "deprecated"
    }

    fn parse_annotations(&mut self, parsing_global: bool) -> Vec<Arc<Annotation>> {
        let mut annotations = Vec::new();
        while self.text() == "@"
            && self.pos + 1 < self.tokens.len()
            && Self::is_global_annotation(self.tokens.get(self.pos + 1).map(|t| t.text.as_str()).unwrap_or(""))
                == parsing_global
        {
            annotations.push(Arc::new(self.parse_annotation(parsing_global)));
        }
        annotations
    }

    fn parse_annotation(&mut self, parsing_global: bool) -> Annotation {
        let start = self.region().start;
        self.advance(); // @
        let name = self.text().to_string();
        let name_region = self.region();
        if parsing_global {
            if !Self::is_global_annotation(&name) {
                self.error(
                    format!("Found local annotation {name} when parsing global annotations"),
                    name_region,
                );
            }
        } else if Self::is_global_annotation(&name) {
            self.error(
                format!("Found global annotation {name} when parsing local annotations"),
                name_region,
            );
        }
        self.advance();

        let mut args = Vec::new();
        if self.text() == "(" {
            self.advance();
            while !self.at_end() && self.text() != ")" {
                let before = self.pos;
                args.push(Arc::new(self.parse_expression(ops::LOWEST_PRECEDENCE)));
                if self.text() == "," {
                    self.advance();
                }
                if self.pos == before {
                    self.advance();
                }
            }
            self.advance(); // )
        }
        Annotation {
            name,
            args,
            region: Region::new(start, self.prev_region().end),
        }
    }

    // ==================== constraints ====================

    fn parse_constraints(&mut self) -> Vec<Arc<Constraint>> {
        let mut constraints = Vec::new();
        self.advance(); // constraints
        self.expect("{", "Expected '{' after constraints");
        self.advance();

        while !self.at_end() && self.text() != "}" {
            match self.text() {
                "conflicts" => constraints.push(Arc::new(self.parse_conflict_constraint())),
                "requires" => constraints.push(Arc::new(self.parse_dependency_constraint())),
                "validate" => constraints.push(Arc::new(self.parse_validate_constraint())),
                _ => self.advance(),
            }
        }

        self.advance(); // }
        if self.text() == ";" {
            self.advance();
        }
        constraints
    }

    fn parse_conflict_constraint(&mut self) -> Constraint {
        let start = self.region().start;
        self.advance(); // conflicts
        let first = Arc::new(self.parse_expression(ops::LOWEST_PRECEDENCE));
        self.expect("with", "Expected 'with' in conflict constraint");
        self.advance();
        let second = Arc::new(self.parse_expression(ops::LOWEST_PRECEDENCE));
        self.expect(";", "Expected ';' after conflict");
        let end = self.region().end;
        self.advance();
        Constraint::Conflict {
            first,
            second,
            region: Region::new(start, end),
        }
    }

    fn parse_dependency_constraint(&mut self) -> Constraint {
        let start = self.region().start;
        self.advance(); // requires
        let dependent = Arc::new(self.parse_expression(ops::LOWEST_PRECEDENCE));
        self.expect("=>", "Expected '=>' in dependency");
        self.advance();
        let condition = Arc::new(self.parse_expression(ops::LOWEST_PRECEDENCE));
        self.expect(";", "Expected ';' after dependency");
        let end = self.region().end;
        self.advance();
        Constraint::Dependency {
            dependent,
            condition,
            region: Region::new(start, end),
        }
    }

    fn parse_validate_constraint(&mut self) -> Constraint {
        let start = self.region().start;
        self.advance(); // validate
        let expr = Arc::new(self.parse_expression(ops::LOWEST_PRECEDENCE));
        self.expect(";", "Expected ';' after validate");
        let end = self.region().end;
        self.advance();
        Constraint::Validate {
            expr,
            region: Region::new(start, end),
        }
    }

    // ==================== expressions ====================

    fn parse_expression(&mut self, min_precedence: usize) -> Expr {
        let start = self.region().start;
        let mut lhs = self.parse_unary();

        loop {
            if self.at_end() {
                break;
            }
            let op_text = self.text().to_string();
            let Some(op) = ops::lookup(&op_text, 1) else {
                break;
            };
            if op.precedence >= min_precedence + usize::from(op.right_assoc) {
                break;
            }

            if op_text == "@" {
                let annotation = Arc::new(self.parse_annotation(false));
                let region = annotation.region;
                lhs = Expr::Annotation {
                    target: Arc::new(lhs),
                    annotation,
                    region,
                };
            } else if op_text == "?" {
                self.advance();
                let true_expr = self.parse_expression(ops::LOWEST_PRECEDENCE);
                self.expect(":", "Expected ':' in conditional expression");
                self.advance();
                let false_expr = self.parse_expression(op.precedence);
                lhs = Expr::Ternary {
                    condition: Arc::new(lhs),
                    true_expr: Arc::new(true_expr),
                    false_expr: Arc::new(false_expr),
                    region: Region::new(start, self.prev_region().end),
                };
            } else {
                self.advance();
                let rhs = self.parse_expression(op.precedence);
                lhs = Expr::Binary {
                    op: op_text,
                    lhs: Arc::new(lhs),
                    rhs: Arc::new(rhs),
                    region: Region::new(start, self.prev_region().end),
                };
            }
        }
        lhs
    }

    fn parse_unary(&mut self) -> Expr {
        let start = self.region().start;
        if let Some(op) = ops::lookup(self.text(), 0) {
            if op.operands == 1 {
                let op_text = self.text().to_string();
                self.advance();
                let operand = self.parse_expression(op.precedence);
                return Expr::Unary {
                    op: op_text,
                    operand: Arc::new(operand),
                    region: Region::new(start, self.prev_region().end),
                };
            }
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Expr {
        let region = self.region();
        match self.category() {
            Some(
                TokenCategory::String
                | TokenCategory::Number
                | TokenCategory::Boolean
                | TokenCategory::Datetime,
            ) => {
                let expr = Expr::Literal {
                    tag: self.payload(),
                    value: self.text().to_string(),
                    region,
                };
                self.advance();
                expr
            }
            Some(TokenCategory::Identifier) => {
                let expr = Expr::Identifier {
                    name: self.text().to_string(),
                    region,
                };
                self.advance();
                expr
            }
            Some(TokenCategory::Keyword) => self.parse_function_call(),
            _ if self.text() == "(" => {
                self.advance();
                let expr = self.parse_expression(ops::LOWEST_PRECEDENCE);
                self.expect(")", "Expected ')' after expression");
                self.advance();
                expr
            }
            _ => {
                let found = self.text().to_string();
                self.error(format!("Unexpected primary token: {found}"), region);
                Expr::Literal {
                    tag: None,
                    value: found,
                    region,
                }
            }
        }
    }

    fn parse_function_call(&mut self) -> Expr {
        let start = self.region().start;
        let name = self.text().to_string();
        self.advance();
        if self.text() != "(" {
            let found = self.text().to_string();
            let region = self.region();
            self.error(
                format!("Expected '(' after function name. Found: {found}"),
                region,
            );
            return Expr::FunctionCall {
                name,
                args: Vec::new(),
                region: Region::new(start, self.prev_region().end),
            };
        }
        self.advance(); // (

        let mut args: Vec<Arc<Expr>> = Vec::new();
        while !self.at_end() && self.text() != ")" {
            let before = self.pos;
            let arg_start = self.region().start;
            let arg = if self.text() == "[" {
                self.advance();
                let mut elems = Vec::new();
                while !self.at_end() && self.text() != "]" {
                    let elem_before = self.pos;
                    elems.push(Arc::new(self.parse_expression(ops::LOWEST_PRECEDENCE)));
                    if self.text() == "," {
                        self.advance();
                    }
                    if self.pos == elem_before {
                        self.advance();
                    }
                }
                self.advance(); // ]
                Expr::FunctionArg {
                    value: FunctionArgValue::List(elems),
                    region: Region::new(arg_start, self.prev_region().end),
                }
            } else {
                let expr = self.parse_expression(ops::LOWEST_PRECEDENCE);
                Expr::FunctionArg {
                    value: FunctionArgValue::Single(Arc::new(expr)),
                    region: Region::new(arg_start, self.prev_region().end),
                }
            };
            args.push(Arc::new(arg));
            if self.text() == "," {
                self.advance();
            }
            if self.pos == before {
                self.advance();
            }
        }
        self.advance(); // )
        Expr::FunctionCall {
            name,
            args,
            region: Region::new(start, self.prev_region().end),
        }
    }
}
