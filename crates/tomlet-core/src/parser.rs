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

//! Recursive-descent TOML parser.
//!
//! Consumes the token stream and produces the document tree, diagnostics,
//! and a cross-reference map from token index to the `Key` node the token
//! resolved. The map records one entry per path segment, including the
//! segments that create implicit parent tables; the language server uses
//! it for definition, hover, completion, references, and rename.
//!
//! The parser may rewrite the token stream in place: quoted, boolean, and
//! number tokens used as keys are retyped to identifiers, and a number
//! token that is lexically `a.b` is split into three tokens at the cursor.
//! Indices recorded before the cursor stay valid across these splices.

use crate::diagnostics::{Diagnostic, DiagnosticList};
use crate::doctree::{ArrayNode, DocNode, DocTree, NodeId, TableNode, ValueNode};
use crate::lex::scan::check_identifier;
use crate::position::Region;
use crate::strings::extract_string_content;
use crate::token::{Token, TokenCategory, TokenList};
use crate::types::{StringKind, TypeTag};
use std::collections::{BTreeMap, HashMap, HashSet};

/// What a key path introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParsedKeyType {
    /// `[path]` header.
    Table,
    /// `[[path]]` header.
    Array,
    /// `path = value` assignment.
    Key,
}

/// Result of parsing one document.
#[derive(Debug)]
pub struct ParseOutput {
    pub tree: DocTree,
    pub errors: DiagnosticList,
    pub warnings: DiagnosticList,
    /// Token index → `Key` node resolved by that token.
    pub key_map: HashMap<usize, NodeId>,
}

/// Parses the token stream into a document tree.
pub fn parse(tokens: &mut TokenList) -> ParseOutput {
    let mut parser = Parser::new(tokens);
    parser.parse_document();
    ParseOutput {
        tree: parser.tree,
        errors: parser.errors,
        warnings: parser.warnings,
        key_map: parser.key_map,
    }
}

struct Parser<'t> {
    tokens: &'t mut TokenList,
    pos: usize,
    tree: DocTree,
    last_defined_table: NodeId,
    header_defined_tables: HashSet<NodeId>,
    header_arrays: HashSet<NodeId>,
    errors: DiagnosticList,
    warnings: DiagnosticList,
    key_map: HashMap<usize, NodeId>,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t mut TokenList) -> Self {
        let tree = DocTree::new();
        let root = tree.root();
        Self {
            tokens,
            pos: 0,
            tree,
            last_defined_table: root,
            header_defined_tables: HashSet::new(),
            header_arrays: HashSet::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            key_map: HashMap::new(),
        }
    }

    // ==================== token helpers ====================

    fn len(&self) -> usize {
        self.tokens.len()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn text(&self, index: usize) -> &str {
        self.tokens
            .get(index)
            .map(|t| t.text.as_str())
            .unwrap_or("")
    }

    fn category(&self, index: usize) -> Option<TokenCategory> {
        self.tokens.get(index).map(|t| t.category)
    }

    fn region(&self, index: usize) -> Region {
        self.tokens.get(index).map(|t| t.region).unwrap_or_default()
    }

    fn prev_region(&self) -> Region {
        if self.pos == 0 {
            Region::default()
        } else {
            self.region(self.pos - 1)
        }
    }

    fn error(&mut self, message: impl Into<String>, region: Region) {
        self.errors.push(Diagnostic::new(message, region));
    }

    // ==================== key tokens ====================

    /// Returns `true` if the token at `index` can serve as a key,
    /// retyping or splitting it in place where needed. `index` may move
    /// when a number token splits around a dot.
    fn is_identifier_token(&mut self, gen_error_if_not: bool) -> bool {
        let index = self.pos;
        let mut is_identifier = false;
        match self.category(index) {
            Some(TokenCategory::Identifier) => {
                is_identifier = true;
            }
            Some(TokenCategory::String) => {
                let token = match self.tokens.get(index) {
                    Some(token) => token.clone(),
                    None => return false,
                };
                if matches!(
                    token.payload,
                    Some(TypeTag::String(
                        StringKind::MultiLineBasic | StringKind::MultiLineLiteral
                    ))
                ) {
                    self.error("Multi-line string cannot be used as a key.", token.region);
                }
                if token.text.len() <= 2 {
                    self.warnings.push(Diagnostic::new(
                        "Empty string key is not recommended.",
                        token.region,
                    ));
                }
                if let Some(token) = self.tokens.get_mut(index) {
                    token.category = TokenCategory::Identifier;
                }
                is_identifier = true;
            }
            Some(TokenCategory::Boolean) => {
                if let Some(token) = self.tokens.get_mut(index) {
                    token.category = TokenCategory::Identifier;
                }
                is_identifier = true;
            }
            Some(TokenCategory::Number) => {
                let token = match self.tokens.get(index) {
                    Some(token) => token.clone(),
                    None => return false,
                };
                let looks_like_key = matches!(token.payload, Some(TypeTag::SpecialNumber(_)))
                    || token
                        .text
                        .chars()
                        .next()
                        .map(|ch| ch.is_ascii_digit())
                        .unwrap_or(false);
                if looks_like_key {
                    if let Some(dot) = token.text.find('.') {
                        let before = &token.text[..dot];
                        let after = &token.text[dot + 1..];
                        let (_, before_id) = check_identifier(before);
                        let (_, after_id) = check_identifier(after);
                        if !before_id.is_empty() && !after_id.is_empty() {
                            self.split_dotted_number(index, dot);
                            is_identifier = true;
                        }
                    } else {
                        let (start, content) = check_identifier(&token.text);
                        if start == 0 && !content.is_empty() {
                            if let Some(token) = self.tokens.get_mut(index) {
                                token.category = TokenCategory::Identifier;
                            }
                            is_identifier = true;
                        }
                    }
                }
            }
            _ => {}
        }
        if gen_error_if_not && !is_identifier {
            let text = self.text(index).to_string();
            let region = self.region(index);
            self.error(format!("Expect key. Got {text}."), region);
        }
        is_identifier
    }

    /// Rewrites the number token at `index` into identifier, dot operator,
    /// identifier. The cursor ends on the first identifier.
    fn split_dotted_number(&mut self, index: usize, dot: usize) {
        let token = self.tokens.remove(index);
        let region = token.region;

        let mut before_region = region;
        before_region.end.column = before_region.start.column + dot as i64;
        let mut after_region = region;
        after_region.start.column = before_region.end.column + 1;
        let mut dot_region = region;
        dot_region.start.column = before_region.end.column;
        dot_region.end.column = after_region.start.column;

        let before = Token::new(
            token.text[..dot].to_string(),
            TokenCategory::Identifier,
            token.payload,
            before_region,
        );
        let dot_op = Token::new(".", TokenCategory::Operator, None, dot_region);
        let after = Token::new(
            token.text[dot + 1..].to_string(),
            TokenCategory::Identifier,
            token.payload,
            after_region,
        );
        self.tokens.insert(index, after);
        self.tokens.insert(index, dot_op);
        self.tokens.insert(index, before);
    }

    /// The identifier text for the key token at `index`: quoted keys use
    /// their decoded content, everything else its raw text.
    fn key_identifier(&mut self, index: usize) -> String {
        let token = match self.tokens.get(index) {
            Some(token) => token.clone(),
            None => return String::new(),
        };
        let quoted = token.text.starts_with('"') || token.text.starts_with('\'');
        if quoted {
            if let Some(TypeTag::String(kind)) = token.payload {
                match extract_string_content(&token.text, kind) {
                    Ok(content) => return content,
                    Err(err) => {
                        self.errors
                            .push(Diagnostic::new(err.to_string(), token.region));
                    }
                }
            }
            return token.text.trim_matches(['"', '\'']).to_string();
        }
        token.text
    }

    // ==================== key paths ====================

    fn parse_key(&mut self) -> (ParsedKeyType, Option<NodeId>) {
        let mut key_type = ParsedKeyType::Key;
        let mut target: Option<NodeId> = None;

        if !self.at_end() && self.text(self.pos) == "[" {
            if self.pos + 1 < self.len() && self.text(self.pos + 1) == "[" {
                let cur = self.region(self.pos);
                let next = self.region(self.pos + 1);
                if cur.end.line == next.start.line && cur.end.column == next.start.column {
                    key_type = ParsedKeyType::Array;
                    self.pos += 2;
                } else {
                    self.error(
                        "Operator [[ cannot be seperated by whitespace.",
                        Region::new(cur.start, next.end),
                    );
                }
            } else {
                key_type = ParsedKeyType::Table;
                self.pos += 1;
            }
        }

        if self.at_end() {
            let (message, region) = if self.pos > 0 {
                (
                    format!("Expect key after {}.", self.text(self.pos - 1)),
                    self.prev_region(),
                )
            } else {
                (
                    "Expect key at the end of the file.".to_string(),
                    Region::default(),
                )
            };
            self.error(message, region);
            return (key_type, None);
        }

        if !self.is_identifier_token(false) {
            let text = self.text(self.pos).to_string();
            let region = self.region(self.pos);
            self.error(format!("Expect key. Got {text}."), region);
            return (key_type, None);
        }

        let mut cur_table = if key_type == ParsedKeyType::Key {
            self.last_defined_table
        } else {
            self.tree.root()
        };

        loop {
            let token_region = self.region(self.pos);
            if !self
                .tree
                .as_table(cur_table)
                .map(|t| t.is_mutable)
                .unwrap_or(true)
            {
                let text = self.text(self.pos).to_string();
                self.error(format!("Key {text} is not mutable."), token_region);
            }
            let identifier = self.key_identifier(self.pos);
            let has_more_segments =
                self.pos + 1 < self.len() && self.text(self.pos + 1) == ".";

            if has_more_segments {
                match self.tree.find_key(cur_table, &identifier) {
                    None => {
                        if key_type == ParsedKeyType::Key
                            && self.header_defined_tables.contains(&cur_table)
                            && self.last_defined_table != cur_table
                        {
                            self.error("Parent table is already defined.", token_region);
                        }
                        let implicit = self.tree.alloc(DocNode::Table(TableNode {
                            elems: BTreeMap::new(),
                            is_mutable: true,
                            def_region: token_region,
                            is_explicit: false,
                        }));
                        let key = self.tree.add_key(cur_table, identifier, Some(implicit));
                        self.key_map.insert(self.pos, key);
                        cur_table = implicit;
                    }
                    Some(key) => {
                        self.key_map.insert(self.pos, key);
                        let value = self.tree.as_key(key).and_then(|k| k.value);
                        match value {
                            Some(table_id) if self.tree.as_table(table_id).is_some() => {
                                cur_table = table_id;
                            }
                            Some(array_id) if self.tree.as_array(array_id).is_some() => {
                                let last_elem = self
                                    .tree
                                    .as_array(array_id)
                                    .and_then(|a| a.elems.last().copied());
                                match last_elem {
                                    None => {
                                        self.error(
                                            format!("Array {identifier} is empty."),
                                            token_region,
                                        );
                                    }
                                    Some(elem) => {
                                        if key_type == ParsedKeyType::Key {
                                            self.error(
                                                "Cannot append to array with dotted keys.",
                                                token_region,
                                            );
                                        }
                                        if self.tree.as_table(elem).is_some() {
                                            cur_table = elem;
                                        } else {
                                            self.error(
                                                format!(
                                                    "Key {identifier} is defined as a bare key."
                                                ),
                                                token_region,
                                            );
                                        }
                                    }
                                }
                            }
                            _ => {
                                self.error(
                                    format!("Key {identifier} is defined as a bare key."),
                                    token_region,
                                );
                            }
                        }
                    }
                }
            } else {
                match self.tree.find_key(cur_table, &identifier) {
                    None => {
                        if key_type == ParsedKeyType::Key
                            && self.header_defined_tables.contains(&cur_table)
                            && self.last_defined_table != cur_table
                        {
                            self.error("Parent table is already defined.", token_region);
                        }
                        let key = self.tree.add_key(cur_table, identifier, None);
                        self.key_map.insert(self.pos, key);
                        match key_type {
                            ParsedKeyType::Array => {
                                let table = self.tree.alloc(DocNode::Table(TableNode {
                                    elems: BTreeMap::new(),
                                    is_mutable: true,
                                    def_region: token_region,
                                    is_explicit: true,
                                }));
                                let array = self.tree.alloc(DocNode::Array(ArrayNode {
                                    elems: vec![table],
                                    is_mutable: true,
                                    def_region: token_region,
                                }));
                                self.header_arrays.insert(array);
                                if let Some(key_node) = self.tree.as_key_mut(key) {
                                    key_node.value = Some(array);
                                }
                                self.last_defined_table = table;
                            }
                            ParsedKeyType::Table => {
                                let table = self.tree.alloc(DocNode::Table(TableNode {
                                    elems: BTreeMap::new(),
                                    is_mutable: true,
                                    def_region: token_region,
                                    is_explicit: true,
                                }));
                                if let Some(key_node) = self.tree.as_key_mut(key) {
                                    key_node.value = Some(table);
                                }
                                self.last_defined_table = table;
                                self.header_defined_tables.insert(table);
                            }
                            ParsedKeyType::Key => {}
                        }
                        target = Some(key);
                    }
                    Some(key) => {
                        self.key_map.insert(self.pos, key);
                        let value = self.tree.as_key(key).and_then(|k| k.value);
                        match key_type {
                            ParsedKeyType::Array => match value {
                                Some(array_id)
                                    if self.tree.as_array(array_id).is_some() =>
                                {
                                    let mutable = self
                                        .tree
                                        .as_array(array_id)
                                        .map(|a| a.is_mutable)
                                        .unwrap_or(false);
                                    if mutable {
                                        let table =
                                            self.tree.alloc(DocNode::Table(TableNode {
                                                elems: BTreeMap::new(),
                                                is_mutable: true,
                                                def_region: token_region,
                                                is_explicit: true,
                                            }));
                                        if let Some(array) = self.tree.as_array_mut(array_id)
                                        {
                                            array.elems.push(table);
                                        }
                                        self.last_defined_table = table;
                                        target = Some(array_id);
                                    } else {
                                        self.error(
                                            format!(
                                                "Static array {identifier} cannot be modified."
                                            ),
                                            token_region,
                                        );
                                    }
                                }
                                _ => {
                                    self.error(
                                        format!("Key {identifier} is not an array."),
                                        token_region,
                                    );
                                }
                            },
                            ParsedKeyType::Table => match value {
                                Some(table_id)
                                    if self.tree.as_table(table_id).is_some() =>
                                {
                                    let explicit = self
                                        .tree
                                        .as_table(table_id)
                                        .map(|t| t.is_explicit)
                                        .unwrap_or(false);
                                    if explicit {
                                        self.error(
                                            format!("Table {identifier} is already defined."),
                                            token_region,
                                        );
                                    } else {
                                        if let Some(table) = self.tree.as_table_mut(table_id)
                                        {
                                            table.is_explicit = true;
                                            table.def_region = token_region;
                                        }
                                        self.last_defined_table = table_id;
                                        target = Some(table_id);
                                    }
                                }
                                _ => {
                                    self.error(
                                        format!("Key {identifier} is not a table."),
                                        token_region,
                                    );
                                }
                            },
                            ParsedKeyType::Key => {
                                self.error(
                                    format!("Key {identifier} is already defined."),
                                    token_region,
                                );
                            }
                        }
                    }
                }
            }

            self.pos += 1;
            if self.at_end() || self.text(self.pos) != "." {
                break;
            }
            self.pos += 1;
            if self.at_end() || !self.is_identifier_token(true) {
                break;
            }
        }

        if key_type != ParsedKeyType::Key {
            self.expect_header_close(key_type);
        }
        (key_type, target)
    }

    fn expect_header_close(&mut self, key_type: ParsedKeyType) {
        let mut complete = false;
        if !self.at_end() && self.text(self.pos) == "]" {
            self.pos += 1;
            if key_type == ParsedKeyType::Table {
                complete = true;
            } else if !self.at_end() && self.text(self.pos) == "]" {
                let prev = self.region(self.pos - 1);
                let cur = self.region(self.pos);
                if prev.end.line == cur.start.line && prev.end.column == cur.start.column {
                    complete = true;
                } else {
                    self.error(
                        "Operator ]] cannot be seperated by whitespace.",
                        Region::new(prev.start, cur.end),
                    );
                }
                self.pos += 1;
            }
        }
        if !complete {
            let bracket = if key_type == ParsedKeyType::Table {
                "]"
            } else {
                "]]"
            };
            if self.at_end() {
                let (message, region) = if self.pos > 0 {
                    (
                        format!("Expect {bracket} after {}.", self.text(self.pos - 1)),
                        self.prev_region(),
                    )
                } else {
                    (
                        format!("Expect {bracket} at the end of the file."),
                        Region::default(),
                    )
                };
                self.error(message, region);
            } else {
                let region = self.region(self.pos);
                self.error(format!("Expect {bracket}."), region);
            }
        }
    }

    // ==================== recovery ====================

    /// Skips to the next token that could start a statement: a `[` or a
    /// token beginning a new line.
    fn skip_to_next_define(&mut self) {
        while !self.at_end() {
            if self.text(self.pos) == "[" {
                break;
            }
            if self.pos > 0
                && self.region(self.pos - 1).end.line < self.region(self.pos).start.line
            {
                break;
            }
            self.pos += 1;
        }
    }

    /// Skips a failed assignment: the `=` if present, then a
    /// bracket-balanced value, stopping once balanced at a line break.
    fn skip_assignment(&mut self) {
        if self.at_end() {
            let region = self.prev_region();
            self.error("Expect an assignment.", region);
            return;
        }
        if self.text(self.pos) != "=" {
            let text = self.text(self.pos).to_string();
            let region = self.region(self.pos);
            self.error(format!("Expect =. Got {text}."), region);
        } else {
            self.pos += 1;
        }
        if self.at_end() {
            let region = self.prev_region();
            self.error("Expect a value for the assignment.", region);
            return;
        }

        let mut squares: Vec<Region> = Vec::new();
        let mut curlies: Vec<Region> = Vec::new();
        loop {
            let text = self.text(self.pos).to_string();
            match text.as_str() {
                "[" => squares.push(self.region(self.pos)),
                "{" => curlies.push(self.region(self.pos)),
                "]" => {
                    if squares.pop().is_none() {
                        let region = self.region(self.pos);
                        self.error("Unbalanced [.", region);
                    }
                }
                "}" => {
                    if curlies.pop().is_none() {
                        let region = self.region(self.pos);
                        self.error("Unbalanced {.", region);
                    }
                }
                _ => {}
            }
            self.pos += 1;
            if self.at_end() {
                break;
            }
            let balanced = squares.is_empty() && curlies.is_empty();
            let new_line =
                self.region(self.pos - 1).end.line < self.region(self.pos).start.line;
            if balanced && new_line {
                break;
            }
        }
        for region in squares {
            self.error("Unbalanced [.", region);
        }
        for region in curlies {
            self.error("Unbalanced {.", region);
        }
    }

    // ==================== values ====================

    fn parse_value(&mut self) -> Option<NodeId> {
        if self.at_end() {
            let region = self.prev_region();
            self.error("Expect a value for the assignment.", region);
            return None;
        }
        let mut parsed: Option<NodeId> = None;
        let mut squares: Vec<Region> = Vec::new();
        let mut curlies: Vec<Region> = Vec::new();

        loop {
            let text = self.text(self.pos).to_string();
            if text == "[" {
                squares.push(self.region(self.pos));
                parsed = Some(self.parse_inline_array());
            } else if text == "{" {
                curlies.push(self.region(self.pos));
                parsed = Some(self.parse_inline_table());
            } else if text == "]" {
                if squares.pop().is_some() {
                    self.pos += 1;
                }
            } else if text == "}" {
                if curlies.pop().is_some() {
                    self.pos += 1;
                }
            } else if self.category(self.pos) == Some(TokenCategory::Comment) {
                self.pos += 1;
            } else {
                let token_region = self.region(self.pos);
                match self.tokens.get(self.pos).and_then(|t| t.payload) {
                    Some(tag) => {
                        parsed = Some(self.tree.alloc(DocNode::Value(ValueNode {
                            tag,
                            text,
                            def_region: token_region,
                        })));
                    }
                    None => {
                        self.error(
                            format!(
                                "Type of {text} is not string, integer, floating-point, NaN, infinity, boolean or date-time."
                            ),
                            token_region,
                        );
                    }
                }
                self.pos += 1;
            }

            let keep_going = !self.at_end()
                && (self.category(self.pos) == Some(TokenCategory::Comment)
                    || !(squares.is_empty() && curlies.is_empty()));
            if !keep_going {
                break;
            }
        }

        for region in squares {
            self.error("Unbalanced [.", region);
        }
        for region in curlies {
            self.error("Unbalanced {.", region);
        }
        parsed
    }

    /// Inline array: sealed from creation; elements are comma-separated
    /// values. Leaves the closing `]` for the caller's bracket stack.
    fn parse_inline_array(&mut self) -> NodeId {
        let start = self.region(self.pos).start;
        self.pos += 1;
        let array = self.tree.alloc(DocNode::Array(ArrayNode {
            elems: Vec::new(),
            is_mutable: false,
            def_region: Region::default(),
        }));

        while !self.at_end() && self.text(self.pos) != "]" {
            match self.parse_value() {
                Some(elem) => {
                    if let Some(node) = self.tree.as_array_mut(array) {
                        node.elems.push(elem);
                    }
                    if self.at_end() {
                        let region = self.prev_region();
                        self.error("Expect either a , or a ].", region);
                    } else if self.text(self.pos) == "," {
                        self.pos += 1;
                    } else if self.text(self.pos) != "]" {
                        let region = self.prev_region();
                        self.error("Expect either a , or a ].", region);
                    }
                }
                None => {
                    if self.pos > 0
                        && self.category(self.pos - 1) != Some(TokenCategory::Comment)
                    {
                        let region = self.prev_region();
                        self.error("Expect an array element.", region);
                    }
                }
            }
        }
        if !self.at_end() && self.text(self.pos) == "]" {
            let end = self.region(self.pos).end;
            if let Some(node) = self.tree.as_array_mut(array) {
                node.def_region = Region::new(start, end);
            }
        }
        array
    }

    /// Inline table: assignment-only statements scoped to the new table;
    /// sealed and marked explicit at `}`. Leaves the `}` for the caller's
    /// bracket stack.
    fn parse_inline_table(&mut self) -> NodeId {
        let start = self.region(self.pos).start;
        let mut allow_multi_line = false;
        self.pos += 1;
        let table = self.tree.alloc(DocNode::Table(TableNode {
            elems: BTreeMap::new(),
            is_mutable: true,
            def_region: Region::default(),
            is_explicit: false,
        }));

        while !self.at_end() && self.text(self.pos) != "}" {
            let saved_scope = self.last_defined_table;
            self.last_defined_table = table;
            let parsed_key = self.parse_statement(false, true);
            self.last_defined_table = saved_scope;
            match parsed_key {
                None => {
                    let region = self.prev_region();
                    self.error("Expect a key-value pair.", region);
                }
                Some(key) => {
                    let value = self.tree.as_key(key).and_then(|k| k.value);
                    match value.map(|v| self.tree.node(v)) {
                        Some(DocNode::Array(_) | DocNode::Table(_)) => {
                            allow_multi_line = true;
                        }
                        Some(DocNode::Value(value)) => {
                            if matches!(
                                value.tag,
                                TypeTag::String(
                                    StringKind::MultiLineBasic | StringKind::MultiLineLiteral
                                )
                            ) {
                                allow_multi_line = true;
                            }
                        }
                        _ => {}
                    }
                }
            }
            if self.at_end() {
                let region = self.prev_region();
                self.error("Expect either a , or a }.", region);
            } else if self.text(self.pos) == "," {
                self.pos += 1;
            } else if self.text(self.pos) != "}" {
                let region = self.prev_region();
                self.error("Expect either a , or a }.", region);
            }
        }

        self.tree.seal(table);
        if let Some(node) = self.tree.as_table_mut(table) {
            node.is_explicit = true;
        }
        if !self.at_end() && self.text(self.pos) == "}" {
            let end = self.region(self.pos).end;
            if self.pos > 0 && self.text(self.pos - 1) == "," {
                let region = self.prev_region();
                self.error(
                    "A terminating comma is not permitted after the last key-value pair in an inline table.",
                    region,
                );
            }
            let def_region = Region::new(start, end);
            if let Some(node) = self.tree.as_table_mut(table) {
                node.def_region = def_region;
            }
            if !allow_multi_line && end.line != start.line {
                self.error(
                    "All parts of the inline table definition should be in the same line.",
                    def_region,
                );
            }
        }
        table
    }

    // ==================== statements ====================

    fn parse_statement(
        &mut self,
        require_start_from_new_line: bool,
        assignment_only: bool,
    ) -> Option<NodeId> {
        while !self.at_end() && self.category(self.pos) == Some(TokenCategory::Comment) {
            self.pos += 1;
        }
        if require_start_from_new_line
            && !self.at_end()
            && self.pos > 0
            && self.region(self.pos).start.line == self.region(self.pos - 1).end.line
        {
            let region = Region::new(
                self.region(self.pos - 1).start,
                self.region(self.pos).end,
            );
            self.error("Each statement should start from a new line.", region);
        }
        if self.at_end() {
            return None;
        }

        let (key_type, target) = self.parse_key();
        match target {
            Some(target) => {
                if key_type == ParsedKeyType::Key {
                    self.parse_assignment(target);
                } else if assignment_only {
                    let region = self.prev_region();
                    self.error("Only assignment is allowed here.", region);
                }
                self.tree.as_key(target).map(|_| target)
            }
            None => {
                if key_type == ParsedKeyType::Key {
                    self.skip_assignment();
                } else {
                    self.skip_to_next_define();
                }
                None
            }
        }
    }

    fn parse_assignment(&mut self, key: NodeId) {
        if self.at_end() {
            let region = self.prev_region();
            self.error("Expect an assignment.", region);
            return;
        }
        if self.text(self.pos) != "=" {
            let text = self.text(self.pos).to_string();
            let region = self.region(self.pos);
            self.error(format!("Expect =. Got {text}."), region);
        } else if self.pos + 1 >= self.len() {
            let region = self.prev_region();
            self.error("Expect an assignment.", region);
        } else if self.region(self.pos).start.line != self.region(self.pos - 1).end.line
            || self.region(self.pos).end.line != self.region(self.pos + 1).start.line
        {
            let region = self.region(self.pos);
            self.error("All parts of the assignment must be in the same line.", region);
        } else {
            self.pos += 1;
        }
        match self.parse_value() {
            Some(value) => {
                if let Some(key_node) = self.tree.as_key_mut(key) {
                    key_node.value = Some(value);
                }
            }
            None => {
                let region = self.prev_region();
                self.error("Expect a value for the assignment.", region);
            }
        }
    }

    fn parse_document(&mut self) {
        while !self.at_end() {
            self.parse_statement(true, false);
        }
        // Arrays extended by [[header]] stay mutable only while the
        // document is still open.
        let header_arrays: Vec<NodeId> = self.header_arrays.iter().copied().collect();
        for array in header_arrays {
            self.tree.seal(array);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex;

    fn parse_source(input: &str) -> ParseOutput {
        let mut lexed = lex::lex(input, true);
        let mut out = parse(&mut lexed.tokens);
        out.errors.splice(0..0, lexed.errors);
        out.warnings.splice(0..0, lexed.warnings);
        out
    }

    fn error_messages(out: &ParseOutput) -> Vec<&str> {
        out.errors.iter().map(|e| e.message.as_str()).collect()
    }

    fn value_text(out: &ParseOutput, path: &[&str]) -> String {
        let mut table = out.tree.root();
        for (idx, segment) in path.iter().enumerate() {
            let key = out.tree.find_key(table, segment).expect("key present");
            let value = out.tree.as_key(key).unwrap().value.expect("value set");
            if idx + 1 == path.len() {
                return out.tree.as_value(value).expect("scalar").text.clone();
            }
            table = value;
        }
        unreachable!("empty path")
    }

    // ==================== basic structure ====================

    #[test]
    fn test_basic_parse() {
        let out = parse_source("x = 1\n[a]\ny = \"hi\"\n");
        assert!(out.errors.is_empty(), "errors: {:?}", out.errors);
        assert_eq!(value_text(&out, &["x"]), "1");
        assert_eq!(value_text(&out, &["a", "y"]), "\"hi\"");

        let a_key = out.tree.find_key(out.tree.root(), "a").unwrap();
        let a_table = out.tree.as_key(a_key).unwrap().value.unwrap();
        assert!(out.tree.as_table(a_table).unwrap().is_explicit);
    }

    #[test]
    fn test_dotted_keys_create_implicit_tables() {
        let out = parse_source("a.b.c = 1\n");
        assert!(out.errors.is_empty());
        assert_eq!(value_text(&out, &["a", "b", "c"]), "1");

        let a_key = out.tree.find_key(out.tree.root(), "a").unwrap();
        let a_table = out.tree.as_key(a_key).unwrap().value.unwrap();
        // Implicit parents created by dotted paths are not explicit.
        assert!(!out.tree.as_table(a_table).unwrap().is_explicit);
    }

    #[test]
    fn test_implicit_then_explicit_header() {
        let out = parse_source("[a.b]\nx = 1\n[a]\ny = 2\n");
        assert!(out.errors.is_empty(), "errors: {:?}", out.errors);
        assert_eq!(value_text(&out, &["a", "b", "x"]), "1");
        assert_eq!(value_text(&out, &["a", "y"]), "2");
    }

    #[test]
    fn test_array_of_tables() {
        let out = parse_source("[[srv]]\nhost = \"a\"\n[[srv]]\nhost = \"b\"\n");
        assert!(out.errors.is_empty(), "errors: {:?}", out.errors);
        let key = out.tree.find_key(out.tree.root(), "srv").unwrap();
        let array = out.tree.as_key(key).unwrap().value.unwrap();
        let array_node = out.tree.as_array(array).unwrap();
        assert_eq!(array_node.elems.len(), 2);
        // Sealed at document end.
        assert!(!array_node.is_mutable);
    }

    #[test]
    fn test_inline_table_and_array() {
        let out = parse_source("point = { x = 1, y = 2 }\nlist = [1, 2, 3]\n");
        assert!(out.errors.is_empty(), "errors: {:?}", out.errors);
        assert_eq!(value_text(&out, &["point", "x"]), "1");

        let list_key = out.tree.find_key(out.tree.root(), "list").unwrap();
        let list = out.tree.as_key(list_key).unwrap().value.unwrap();
        let list_node = out.tree.as_array(list).unwrap();
        assert_eq!(list_node.elems.len(), 3);
        assert!(!list_node.is_mutable);

        let point_key = out.tree.find_key(out.tree.root(), "point").unwrap();
        let point = out.tree.as_key(point_key).unwrap().value.unwrap();
        let point_node = out.tree.as_table(point).unwrap();
        assert!(!point_node.is_mutable);
        assert!(point_node.is_explicit);
    }

    #[test]
    fn test_trailing_comma_in_array_ok() {
        let out = parse_source("list = [1, 2,]\n");
        assert!(out.errors.is_empty(), "errors: {:?}", out.errors);
    }

    #[test]
    fn test_quoted_and_boolean_keys() {
        let out = parse_source("\"my key\" = 1\ntrue = 2\n1234 = 3\n");
        assert!(out.errors.is_empty(), "errors: {:?}", out.errors);
        assert_eq!(value_text(&out, &["my key"]), "1");
        assert_eq!(value_text(&out, &["true"]), "2");
        assert_eq!(value_text(&out, &["1234"]), "3");
    }

    #[test]
    fn test_dotted_number_key_splits_token() {
        let out = parse_source("3.14159 = \"pi\"\n");
        assert!(out.errors.is_empty(), "errors: {:?}", out.errors);
        assert_eq!(value_text(&out, &["3", "14159"]), "\"pi\"");
    }

    // ==================== rules and errors ====================

    #[test]
    fn test_header_redefinition() {
        let out = parse_source("[a]\n[a]\n");
        assert!(error_messages(&out).contains(&"Table a is already defined."));
        // The error is anchored to the second header's identifier.
        let err = out
            .errors
            .iter()
            .find(|e| e.message == "Table a is already defined.")
            .unwrap();
        assert_eq!(err.region.start.line, 1);
    }

    #[test]
    fn test_dotted_append_to_array_forbidden() {
        let out = parse_source("arr = [1]\narr.x = 2\n");
        assert!(error_messages(&out).contains(&"Key arr is defined as a bare key."));
    }

    #[test]
    fn test_dotted_append_to_array_of_tables_forbidden() {
        let out = parse_source("[[a.arr]]\nx = 1\n[a]\narr.y = 2\n");
        assert!(error_messages(&out)
            .contains(&"Cannot append to array with dotted keys."));
    }

    #[test]
    fn test_key_redefinition() {
        let out = parse_source("x = 1\nx = 2\n");
        assert!(error_messages(&out).contains(&"Key x is already defined."));
    }

    #[test]
    fn test_inline_table_sealed_against_headers() {
        let out = parse_source("t = { a = 1 }\n[t.b]\nx = 2\n");
        assert!(error_messages(&out).contains(&"Key b is not mutable."));
    }

    #[test]
    fn test_static_array_not_extensible() {
        let out = parse_source("arr = [{ a = 1 }]\n[[arr]]\n");
        assert!(error_messages(&out).contains(&"Static array arr cannot be modified."));
    }

    #[test]
    fn test_header_array_not_table() {
        let out = parse_source("x = 1\n[x]\n");
        assert!(error_messages(&out).contains(&"Key x is not a table."));
    }

    #[test]
    fn test_inline_table_trailing_comma() {
        let out = parse_source("t = { a = 1, }\n");
        assert!(error_messages(&out).iter().any(|m| m.starts_with(
            "A terminating comma is not permitted"
        )));
    }

    #[test]
    fn test_statement_on_same_line() {
        let out = parse_source("x = 1 y = 2\n");
        assert!(error_messages(&out)
            .contains(&"Each statement should start from a new line."));
    }

    #[test]
    fn test_assignment_split_across_lines() {
        let out = parse_source("x =\n1\n");
        assert!(error_messages(&out)
            .contains(&"All parts of the assignment must be in the same line."));
    }

    #[test]
    fn test_double_bracket_with_space() {
        let out = parse_source("[ [a]]\n");
        assert!(error_messages(&out)
            .contains(&"Operator [[ cannot be seperated by whitespace."));
    }

    #[test]
    fn test_missing_closing_bracket() {
        let out = parse_source("[a\nx = 1\n");
        assert!(error_messages(&out).iter().any(|m| m.starts_with("Expect ]")));
    }

    #[test]
    fn test_unbalanced_array_bracket() {
        let out = parse_source("x = [1, 2\n");
        assert!(error_messages(&out).contains(&"Unbalanced [."));
    }

    #[test]
    fn test_missing_equals() {
        let out = parse_source("x 1\n");
        assert!(error_messages(&out).contains(&"Expect =. Got 1."));
    }

    #[test]
    fn test_multiline_string_key_rejected() {
        let out = parse_source("\"\"\"k\"\"\" = 1\n");
        assert!(error_messages(&out)
            .contains(&"Multi-line string cannot be used as a key."));
    }

    #[test]
    fn test_empty_string_key_warns() {
        let out = parse_source("\"\" = 1\n");
        assert!(out
            .warnings
            .iter()
            .any(|w| w.message == "Empty string key is not recommended."));
        assert!(out.errors.is_empty(), "errors: {:?}", out.errors);
    }

    #[test]
    fn test_parent_table_already_defined() {
        // `[a.b]` is header-defined; extending it with dotted keys from the
        // scope of `[a]` is rejected.
        let out = parse_source("[a.b]\nx = 1\n[a]\nb.c = 1\n");
        assert!(error_messages(&out).contains(&"Parent table is already defined."));
    }

    #[test]
    fn test_recovery_continues_after_error() {
        let out = parse_source("x = = 1\ny = 2\n");
        assert!(!out.errors.is_empty());
        assert_eq!(value_text(&out, &["y"]), "2");
    }

    // ==================== cross-reference map ====================

    #[test]
    fn test_key_map_records_assignments_and_headers() {
        let mut lexed = lex::lex("x = 1\n[tbl]\ny = 2\n", true);
        let out = parse(&mut lexed.tokens);
        // Tokens: x = 1 [ tbl ] y = 2 → identifiers at 0, 4, 6.
        let x_key = out.key_map.get(&0).copied().expect("x mapped");
        assert_eq!(out.tree.as_key(x_key).unwrap().id, "x");
        let tbl_key = out.key_map.get(&4).copied().expect("tbl mapped");
        assert_eq!(out.tree.as_key(tbl_key).unwrap().id, "tbl");
        let y_key = out.key_map.get(&6).copied().expect("y mapped");
        assert_eq!(out.tree.as_key(y_key).unwrap().id, "y");
    }

    #[test]
    fn test_key_map_records_every_path_segment() {
        let mut lexed = lex::lex("a.b = 1\n", true);
        let out = parse(&mut lexed.tokens);
        // Tokens: a . b = 1 → segments at 0 and 2.
        let a_key = out.key_map.get(&0).copied().expect("a mapped");
        let b_key = out.key_map.get(&2).copied().expect("b mapped");
        assert_eq!(out.tree.as_key(a_key).unwrap().id, "a");
        assert_eq!(out.tree.as_key(b_key).unwrap().id, "b");
    }

    #[test]
    fn test_key_map_shares_key_across_mentions() {
        let mut lexed = lex::lex("[a]\nx = 1\n[a.b]\ny = 2\n", true);
        let out = parse(&mut lexed.tokens);
        // `a` appears at token 1 and token 7 ([ a ] x = 1 [ a . b ] ...).
        let first = out.key_map.get(&1).copied().expect("first a");
        let second = out.key_map.get(&7).copied().expect("second a");
        assert_eq!(first, second);
    }
}
