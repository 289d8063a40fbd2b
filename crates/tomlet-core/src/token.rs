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

//! Token stream shared by the TOML and CSL front ends.
//!
//! Tokens live in a [`TokenList`], an index-addressed sequence that supports
//! insertion and removal at arbitrary positions. The TOML parser relies on
//! this to split a number token that is lexically a dotted key (`1.2` used
//! as `a.b`) into three tokens in place. Indices recorded before a splice
//! at the cursor stay valid because splices never touch earlier positions.

use crate::position::{Position, Region};
use crate::types::TypeTag;

/// The closed set of token categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenCategory {
    Datetime,
    Number,
    Boolean,
    Identifier,
    Keyword,
    Type,
    Punctuator,
    Operator,
    Comment,
    String,
    Unknown,
}

impl TokenCategory {
    /// Stable lowercase name, used by the semantic-token legend.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenCategory::Datetime => "datetime",
            TokenCategory::Number => "number",
            TokenCategory::Boolean => "boolean",
            TokenCategory::Identifier => "identifier",
            TokenCategory::Keyword => "keyword",
            TokenCategory::Type => "type",
            TokenCategory::Punctuator => "punctuator",
            TokenCategory::Operator => "operator",
            TokenCategory::Comment => "comment",
            TokenCategory::String => "string",
            TokenCategory::Unknown => "unknown",
        }
    }
}

/// A single lexical token.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The raw text, exactly as it appears in the source.
    pub text: String,
    /// Token category.
    pub category: TokenCategory,
    /// Typed payload for scalar literals, held by value.
    pub payload: Option<TypeTag>,
    /// Source region (inclusive).
    pub region: Region,
}

impl Token {
    /// Creates a new token.
    pub fn new(
        text: impl Into<String>,
        category: TokenCategory,
        payload: Option<TypeTag>,
        region: Region,
    ) -> Self {
        Self {
            text: text.into(),
            category,
            payload,
            region,
        }
    }
}

/// Pending run of unrecognized characters, coalesced into one token.
#[derive(Debug, Default)]
struct UnknownRun {
    text: String,
    start: Position,
    end: Position,
}

/// An ordered, index-addressed token sequence with a buffered builder for
/// runs of unknown characters.
#[derive(Debug, Default)]
pub struct TokenList {
    tokens: Vec<Token>,
    pending: Option<UnknownRun>,
}

impl TokenList {
    /// Creates an empty token list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a token, flushing any buffered unknown run first so that
    /// token order matches source order.
    pub fn push(&mut self, token: Token) {
        self.flush_unknown();
        self.tokens.push(token);
    }

    /// Adds one unrecognized character to the buffered run, starting a new
    /// run at `start` if none is open. `end` is the position just past the
    /// character, which becomes the run's region end.
    pub fn append_unknown(&mut self, ch: char, start: Position, end: Position) {
        let run = self.pending.get_or_insert_with(|| UnknownRun {
            text: String::new(),
            start,
            end: start,
        });
        run.text.push(ch);
        run.end = end;
    }

    /// Returns `true` if an unknown run is currently buffered.
    pub fn has_pending_unknown(&self) -> bool {
        self.pending.is_some()
    }

    /// Emits the buffered unknown run as a token, if any.
    pub fn flush_unknown(&mut self) {
        if let Some(run) = self.pending.take() {
            self.tokens.push(Token::new(
                run.text,
                TokenCategory::Unknown,
                None,
                Region::new(run.start, run.end),
            ));
        }
    }

    /// Number of tokens in the list.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns `true` if the list holds no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Token at `index`.
    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// Mutable token at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Token> {
        self.tokens.get_mut(index)
    }

    /// Inserts a token at `index`, shifting later tokens.
    pub fn insert(&mut self, index: usize, token: Token) {
        self.tokens.insert(index, token);
    }

    /// Removes and returns the token at `index`.
    pub fn remove(&mut self, index: usize) -> Token {
        self.tokens.remove(index)
    }

    /// Iterates over the tokens in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    /// Borrow the tokens as a slice.
    pub fn as_slice(&self) -> &[Token] {
        &self.tokens
    }
}

impl<'a> IntoIterator for &'a TokenList {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(text: &str, category: TokenCategory) -> Token {
        Token::new(text, category, None, Region::default())
    }

    // ==================== TokenList tests ====================

    #[test]
    fn test_push_and_index() {
        let mut list = TokenList::new();
        list.push(tok("a", TokenCategory::Identifier));
        list.push(tok("=", TokenCategory::Operator));
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(0).unwrap().text, "a");
        assert_eq!(list.get(1).unwrap().category, TokenCategory::Operator);
    }

    #[test]
    fn test_insert_and_remove() {
        let mut list = TokenList::new();
        list.push(tok("a", TokenCategory::Identifier));
        list.push(tok("b", TokenCategory::Identifier));
        list.insert(1, tok(".", TokenCategory::Operator));
        assert_eq!(list.len(), 3);
        assert_eq!(list.get(1).unwrap().text, ".");

        let removed = list.remove(0);
        assert_eq!(removed.text, "a");
        assert_eq!(list.get(0).unwrap().text, ".");
    }

    #[test]
    fn test_unknown_run_coalesces() {
        let mut list = TokenList::new();
        list.append_unknown('$', Position::new(0, 0), Position::new(0, 1));
        list.append_unknown('%', Position::new(0, 1), Position::new(0, 2));
        assert!(list.has_pending_unknown());
        list.flush_unknown();
        assert_eq!(list.len(), 1);

        let unknown = list.get(0).unwrap();
        assert_eq!(unknown.text, "$%");
        assert_eq!(unknown.category, TokenCategory::Unknown);
        assert_eq!(unknown.region.start, Position::new(0, 0));
        assert_eq!(unknown.region.end, Position::new(0, 2));
    }

    #[test]
    fn test_push_flushes_pending_unknown() {
        let mut list = TokenList::new();
        list.append_unknown('$', Position::new(0, 0), Position::new(0, 1));
        list.push(tok("a", TokenCategory::Identifier));
        // The unknown run must precede the pushed token.
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(0).unwrap().category, TokenCategory::Unknown);
        assert_eq!(list.get(1).unwrap().text, "a");
    }

    #[test]
    fn test_flush_without_pending_is_noop() {
        let mut list = TokenList::new();
        list.flush_unknown();
        assert!(list.is_empty());
    }

    #[test]
    fn test_category_names() {
        assert_eq!(TokenCategory::Datetime.as_str(), "datetime");
        assert_eq!(TokenCategory::Unknown.as_str(), "unknown");
        assert_eq!(TokenCategory::Punctuator.as_str(), "punctuator");
    }
}
