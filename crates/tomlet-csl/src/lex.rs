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

//! The CSL lexer.
//!
//! Shares the token, position, and diagnostic model with the TOML lexer
//! but carries its own vocabulary: `//` comments, keywords, type words,
//! the operator table, `R"delim(…)delim"` raw strings, and unsigned
//! numeric literals (sign is an expression-level unary operator).
//! Recognizer order: comment → string → datetime → numeric → boolean →
//! keyword → type → operator → identifier → punctuator.

use crate::ops;
use tomlet_core::diagnostics::{Diagnostic, DiagnosticList};
use tomlet_core::lex::scan::{self, Match};
use tomlet_core::lex::{end_position, is_number_reasonably_grouped, is_string_content_valid};
use tomlet_core::position::{Position, Region};
use tomlet_core::token::{Token, TokenCategory, TokenList};
use tomlet_core::types::{SpecialKind, StringKind, TypeTag};

/// CSL keywords, including the wildcard star and the built-in constraint
/// functions.
pub const KEYWORDS: &[&str] = &[
    "config",
    "constraints",
    "requires",
    "conflicts",
    "with",
    "validate",
    "exists",
    "count_keys",
    "all_keys",
    "wildcard_keys",
    "subset",
    "*",
];

/// CSL type words.
pub const TYPE_WORDS: &[&str] = &[
    "any{}", "any[]", "string", "number", "boolean", "datetime", "duration",
];

const PUNCTUATORS: &[char] = &['{', '}', '[', ']', ',', ':', ';', '@'];

/// Result of lexing one schema source.
#[derive(Debug)]
pub struct LexOutput {
    pub tokens: TokenList,
    pub errors: DiagnosticList,
    pub warnings: DiagnosticList,
}

/// Lexes CSL source. `multiline_tokens = false` splits line-spanning
/// string tokens into one token per line.
pub fn lex(input: &str, multiline_tokens: bool) -> LexOutput {
    let mut output = Lexer::new(input).run();
    if !multiline_tokens {
        split_multiline_tokens(&mut output.tokens);
    }
    output
}

fn leading_ws(s: &str) -> usize {
    s.len() - s.trim_start().len()
}

fn is_word_char(ch: char) -> bool {
    ch == '-' || ch == '_' || ch.is_ascii_alphanumeric()
}

fn match_comment(s: &str) -> Option<Match> {
    let ws = leading_ws(s);
    let rest = &s[ws..];
    if !rest.starts_with("//") {
        return None;
    }
    let len = rest.find('\n').unwrap_or(rest.len());
    Some(Match { ws, len, tag: None })
}

/// CSL identifiers: `[A-Za-z_][A-Za-z0-9_]*`, never `true`/`false`.
fn match_identifier(s: &str) -> Option<Match> {
    let ws = leading_ws(s);
    let rest = &s[ws..];
    let mut chars = rest.char_indices();
    match chars.next() {
        Some((_, ch)) if ch == '_' || ch.is_ascii_alphabetic() => {}
        _ => return None,
    }
    let len = chars
        .find(|&(_, ch)| !(ch == '_' || ch.is_ascii_alphanumeric()))
        .map(|(idx, _)| idx)
        .unwrap_or(rest.len());
    let text = &rest[..len];
    if text == "true" || text == "false" {
        return None;
    }
    Some(Match { ws, len, tag: None })
}

fn identifier_len(s: &str) -> usize {
    match_identifier(s).map(|m| m.len).unwrap_or(0)
}

/// Unsigned numeric literal; a strictly longer identifier match wins.
fn match_numeric(s: &str) -> Option<Match> {
    let ws = leading_ws(s);
    let rest = &s[ws..];

    for (literal, kind) in [("nan", SpecialKind::NaN), ("inf", SpecialKind::Infinity)] {
        if let Some(after) = rest.strip_prefix(literal) {
            if after.chars().next().map(is_word_char) != Some(true) {
                return Some(Match {
                    ws,
                    len: literal.len(),
                    tag: Some(TypeTag::SpecialNumber(kind)),
                });
            }
        }
    }

    let (int_len, float_len) = scan::numeric_lengths(rest.as_bytes());
    let (len, tag) = if int_len == 0 && float_len == 0 {
        return None;
    } else if int_len >= float_len {
        (int_len, TypeTag::Integer)
    } else {
        (float_len, TypeTag::Float)
    };
    if len < identifier_len(rest) {
        return None;
    }
    Some(Match {
        ws,
        len,
        tag: Some(tag),
    })
}

fn match_word_from(s: &str, words: &[&str]) -> Option<Match> {
    let ws = leading_ws(s);
    let rest = &s[ws..];
    for word in words {
        if let Some(after) = rest.strip_prefix(word) {
            if after.chars().next().map(is_word_char) != Some(true) {
                return Some(Match {
                    ws,
                    len: word.len(),
                    tag: None,
                });
            }
        }
    }
    None
}

fn match_keyword(s: &str) -> Option<Match> {
    match_word_from(s, KEYWORDS)
}

fn match_type_word(s: &str) -> Option<Match> {
    match_word_from(s, TYPE_WORDS)
}

fn match_operator(s: &str) -> Option<Match> {
    let ws = leading_ws(s);
    let rest = &s[ws..];
    for candidate in ops::lexer_candidates() {
        if rest.starts_with(candidate) {
            return Some(Match {
                ws,
                len: candidate.len(),
                tag: None,
            });
        }
    }
    None
}

fn match_punctuator(s: &str) -> Option<Match> {
    let ws = leading_ws(s);
    let rest = &s[ws..];
    match rest.chars().next() {
        Some(ch) if PUNCTUATORS.contains(&ch) => Some(Match { ws, len: 1, tag: None }),
        _ => None,
    }
}

/// Basic `"…"` string (escape-aware, may span lines) or raw
/// `R"delim(…)delim"`. The kind records whether the literal spans lines.
fn match_string(s: &str) -> Option<Match> {
    let ws = leading_ws(s);
    let rest = &s[ws..];

    if rest.starts_with("R\"") {
        if let Some(len) = scan_raw_string(rest) {
            let kind = if rest[..len].contains('\n') {
                StringKind::MultiLineRaw
            } else {
                StringKind::Raw
            };
            return Some(Match {
                ws,
                len,
                tag: Some(TypeTag::String(kind)),
            });
        }
        return None;
    }
    if rest.starts_with('"') {
        if let Some(len) = scan_basic_string(rest) {
            let kind = if rest[..len].contains('\n') {
                StringKind::MultiLineBasic
            } else {
                StringKind::Basic
            };
            return Some(Match {
                ws,
                len,
                tag: Some(TypeTag::String(kind)),
            });
        }
    }
    None
}

/// Length of a `"…"` literal with escapes, spanning lines if needed.
fn scan_basic_string(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut idx = 1;
    while idx < bytes.len() {
        match bytes[idx] {
            b'\\' => idx += 2,
            b'"' => return Some(idx + 1),
            _ => idx += 1,
        }
    }
    None
}

/// Length of `R"delim(…)delim"`. The delimiter is at most 16 characters
/// and may not contain parentheses, backslashes, quotes, or newlines.
fn scan_raw_string(s: &str) -> Option<usize> {
    let after_quote = &s[2..];
    let open = after_quote.find('(')?;
    if open > 16 {
        return None;
    }
    let delim = &after_quote[..open];
    if delim.contains(['\\', ')', '"', '\n']) {
        return None;
    }
    let closer = format!("){delim}\"");
    let body = &after_quote[open + 1..];
    let close = body.find(&closer)?;
    Some(2 + open + 1 + close + closer.len())
}

/// Returns `true` while the buffer holds an unterminated string, so the
/// driver keeps appending lines.
fn has_incomplete_string(buffer: &str) -> bool {
    let bytes = buffer.as_bytes();
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] == b'/' && bytes.get(idx + 1) == Some(&b'/') {
            while idx < bytes.len() && bytes[idx] != b'\n' {
                idx += 1;
            }
        } else if bytes[idx] == b'R' && bytes.get(idx + 1) == Some(&b'"') {
            match scan_raw_string(&buffer[idx..]) {
                Some(len) => idx += len,
                None => return true,
            }
        } else if bytes[idx] == b'"' {
            match scan_basic_string(&buffer[idx..]) {
                Some(len) => idx += len,
                None => return true,
            }
        } else {
            idx += 1;
        }
    }
    false
}

struct Lexer<'a> {
    lines: Vec<&'a str>,
    errors: DiagnosticList,
    warnings: DiagnosticList,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        let mut lines: Vec<&str> = input
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();
        if lines.last() == Some(&"") {
            lines.pop();
        }
        Self {
            lines,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn run(mut self) -> LexOutput {
        let mut tokens = TokenList::new();
        let mut pos = Position::new(0, 0);
        let mut code = String::new();
        let mut continued = false;

        let line_count = self.lines.len();
        for index in 0..line_count {
            let cur_line = self.lines[index];
            let more_input = index + 1 < line_count;

            if !continued && cur_line.chars().all(char::is_whitespace) {
                if cur_line.contains('\r') {
                    self.errors.push(Diagnostic::new(
                        "Line ending is not valid.",
                        Region::new(
                            Position::new(pos.line, 0),
                            Position::new(pos.line, cur_line.chars().count() as i64),
                        ),
                    ));
                }
                pos.line += 1;
                pos.column = 0;
                continue;
            }

            if continued {
                code.push_str(cur_line);
            } else {
                code = cur_line.to_string();
            }

            if has_incomplete_string(&code) {
                continued = true;
                code.push('\n');
                if more_input {
                    continue;
                }
                let first_line_len = code.find('\n').unwrap_or(code.len());
                self.errors.push(Diagnostic::new(
                    "String literal is not closed.",
                    Region::new(
                        Position::new(pos.line, 0),
                        Position::new(pos.line, first_line_len as i64),
                    ),
                ));
            }
            continued = false;

            self.scan_buffer(&mut tokens, &mut code, &mut pos);

            tokens.flush_unknown();
            pos.line += 1;
            pos.column = 0;
        }

        for token in tokens.iter() {
            if token.category == TokenCategory::Unknown {
                self.errors.push(Diagnostic::new(
                    format!("Unknown token: {}.", token.text),
                    token.region,
                ));
            }
        }

        LexOutput {
            tokens,
            errors: self.errors,
            warnings: self.warnings,
        }
    }

    fn scan_buffer(&mut self, tokens: &mut TokenList, code: &mut String, pos: &mut Position) {
        while !code.is_empty() {
            if let Some(m) = match_comment(code) {
                // Comments are consumed for position tracking but carry no
                // token; the parser never sees them.
                let (text, region) = consume(code, pos, &m);
                if !is_string_content_valid(&text[2..], false) {
                    self.errors
                        .push(Diagnostic::new("Comment contains invalid content.", region));
                }
                continue;
            }
            if let Some(m) = match_string(code) {
                let (text, region) = consume(code, pos, &m);
                let multi_line = matches!(
                    m.tag,
                    Some(TypeTag::String(kind)) if kind.is_multi_line()
                );
                if !is_string_content_valid(&text, multi_line) {
                    self.errors.push(Diagnostic::new(
                        "String literal contains invalid content.",
                        region,
                    ));
                }
                tokens.push(Token::new(text, TokenCategory::String, m.tag, region));
                continue;
            }
            if let Some(m) = scan::match_datetime(code) {
                let (text, region) = consume(code, pos, &m);
                tokens.push(Token::new(text, TokenCategory::Datetime, m.tag, region));
                continue;
            }
            if let Some(m) = match_numeric(code) {
                let (text, region) = consume(code, pos, &m);
                if !is_number_reasonably_grouped(&text) {
                    self.warnings.push(Diagnostic::new(
                        "Number literal is not grouped reasonably.",
                        region,
                    ));
                }
                tokens.push(Token::new(text, TokenCategory::Number, m.tag, region));
                continue;
            }
            if let Some(m) = scan::match_boolean(code) {
                let (text, region) = consume(code, pos, &m);
                tokens.push(Token::new(text, TokenCategory::Boolean, m.tag, region));
                continue;
            }
            if let Some(m) = match_keyword(code) {
                let (text, region) = consume(code, pos, &m);
                tokens.push(Token::new(text, TokenCategory::Keyword, None, region));
                continue;
            }
            if let Some(m) = match_type_word(code) {
                let (text, region) = consume(code, pos, &m);
                tokens.push(Token::new(text, TokenCategory::Type, None, region));
                continue;
            }
            if let Some(m) = match_operator(code) {
                let (text, region) = consume(code, pos, &m);
                tokens.push(Token::new(text, TokenCategory::Operator, None, region));
                continue;
            }
            if let Some(m) = match_identifier(code) {
                let (text, region) = consume(code, pos, &m);
                tokens.push(Token::new(text, TokenCategory::Identifier, None, region));
                continue;
            }
            if let Some(m) = match_punctuator(code) {
                let (text, region) = consume(code, pos, &m);
                tokens.push(Token::new(text, TokenCategory::Punctuator, None, region));
                continue;
            }

            if code.chars().all(char::is_whitespace) {
                *pos = end_position(code, *pos);
                code.clear();
                continue;
            }

            let ch = match code.chars().next() {
                Some(ch) => ch,
                None => break,
            };
            let start = *pos;
            if ch == '\n' {
                pos.line += 1;
                pos.column = 0;
            } else {
                pos.column += 1;
            }
            tokens.append_unknown(ch, start, *pos);
            code.drain(..ch.len_utf8());
        }
    }
}

fn consume(code: &mut String, pos: &mut Position, m: &Match) -> (String, Region) {
    let start = end_position(&code[..m.ws], *pos);
    let text: String = code[m.ws..m.ws + m.len].to_string();
    let end = end_position(&text, start);
    *pos = end;
    code.drain(..m.ws + m.len);
    (text, Region::new(start, end))
}

fn split_multiline_tokens(tokens: &mut TokenList) {
    let mut index = 0;
    while index < tokens.len() {
        let needs_split = tokens
            .get(index)
            .map(|t| !t.region.is_single_line())
            .unwrap_or(false);
        if !needs_split {
            index += 1;
            continue;
        }
        let token = tokens.remove(index);
        let mut line = token.region.start.line;
        let mut column = token.region.start.column;
        for (piece_index, piece) in token.text.split('\n').enumerate() {
            if piece_index > 0 {
                line += 1;
                column = 0;
            }
            if piece.is_empty() && piece_index > 0 {
                continue;
            }
            let start = Position::new(line, column);
            let end = Position::new(line, column + piece.chars().count() as i64);
            tokens.insert(
                index,
                Token::new(piece, token.category, token.payload, Region::new(start, end)),
            );
            index += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_ok(input: &str) -> LexOutput {
        lex(input, true)
    }

    fn kinds(output: &LexOutput) -> Vec<(String, TokenCategory)> {
        output
            .tokens
            .iter()
            .map(|t| (t.text.clone(), t.category))
            .collect()
    }

    // ==================== vocabulary ====================

    #[test]
    fn test_schema_header() {
        let out = lex_ok("config Server {\n}\n");
        assert_eq!(
            kinds(&out),
            vec![
                ("config".to_string(), TokenCategory::Keyword),
                ("Server".to_string(), TokenCategory::Identifier),
                ("{".to_string(), TokenCategory::Punctuator),
                ("}".to_string(), TokenCategory::Punctuator),
            ]
        );
        assert!(out.errors.is_empty());
    }

    #[test]
    fn test_key_definition_tokens() {
        let out = lex_ok("port: number @min(1);\n");
        let texts: Vec<String> = out.tokens.iter().map(|t| t.text.clone()).collect();
        assert_eq!(texts, vec!["port", ":", "number", "@", "min", "(", "1", ")", ";"]);
        assert_eq!(out.tokens.get(2).unwrap().category, TokenCategory::Type);
        // `:` lexes as an operator (operator vocabulary runs first).
        assert_eq!(out.tokens.get(1).unwrap().category, TokenCategory::Operator);
    }

    #[test]
    fn test_wildcard_is_keyword() {
        let out = lex_ok("*: string;\n");
        assert_eq!(out.tokens.get(0).unwrap().category, TokenCategory::Keyword);
    }

    #[test]
    fn test_any_types() {
        let out = lex_ok("a: any{};\nb: any[];\n");
        let types: Vec<String> = out
            .tokens
            .iter()
            .filter(|t| t.category == TokenCategory::Type)
            .map(|t| t.text.clone())
            .collect();
        assert_eq!(types, vec!["any{}", "any[]"]);
    }

    #[test]
    fn test_keyword_boundary() {
        // `configuration` is an identifier, not the `config` keyword.
        let out = lex_ok("configuration\n");
        assert_eq!(
            out.tokens.get(0).unwrap().category,
            TokenCategory::Identifier
        );
    }

    // ==================== operators ====================

    #[test]
    fn test_multichar_operators() {
        let out = lex_ok("a <= b && c != d << 2\n");
        let ops: Vec<String> = out
            .tokens
            .iter()
            .filter(|t| t.category == TokenCategory::Operator)
            .map(|t| t.text.clone())
            .collect();
        assert_eq!(ops, vec!["<=", "&&", "!=", "<<"]);
    }

    #[test]
    fn test_dependency_arrow_is_single_token() {
        let out = lex_ok("requires a => b;\n");
        let texts: Vec<String> = out.tokens.iter().map(|t| t.text.clone()).collect();
        assert!(texts.contains(&"=>".to_string()));
    }

    #[test]
    fn test_unsigned_numbers() {
        // `-5` is a unary minus applied to `5`.
        let out = lex_ok("-5\n");
        assert_eq!(out.tokens.get(0).unwrap().text, "-");
        assert_eq!(out.tokens.get(1).unwrap().text, "5");
        assert_eq!(out.tokens.get(1).unwrap().payload, Some(TypeTag::Integer));
    }

    // ==================== comments and strings ====================

    #[test]
    fn test_comments_produce_no_tokens() {
        let out = lex_ok("// heading\nname: string; // tail\n");
        assert!(out
            .tokens
            .iter()
            .all(|t| t.category != TokenCategory::Comment));
        // Position tracking survives the comment.
        assert_eq!(out.tokens.get(0).unwrap().region.start.line, 1);
    }

    #[test]
    fn test_basic_string() {
        let out = lex_ok("@regex(\"^a+$\")\n");
        let string = out
            .tokens
            .iter()
            .find(|t| t.category == TokenCategory::String)
            .unwrap();
        assert_eq!(string.text, "\"^a+$\"");
        assert_eq!(string.payload, Some(TypeTag::String(StringKind::Basic)));
    }

    #[test]
    fn test_raw_string() {
        let out = lex_ok("@regex(R\"re(a\\d+)re\")\n");
        let string = out
            .tokens
            .iter()
            .find(|t| t.category == TokenCategory::String)
            .unwrap();
        assert_eq!(string.text, "R\"re(a\\d+)re\"");
        assert_eq!(string.payload, Some(TypeTag::String(StringKind::Raw)));
    }

    #[test]
    fn test_multiline_raw_string() {
        let out = lex_ok("x = R\"(line one\nline two)\"\n");
        let string = out
            .tokens
            .iter()
            .find(|t| t.category == TokenCategory::String)
            .unwrap();
        assert_eq!(string.payload, Some(TypeTag::String(StringKind::MultiLineRaw)));
        assert!(out.errors.is_empty());
    }

    #[test]
    fn test_unterminated_string() {
        let out = lex_ok("s = \"open\n");
        assert!(out
            .errors
            .iter()
            .any(|e| e.message == "String literal is not closed."));
    }

    // ==================== misc ====================

    #[test]
    fn test_grouping_warning_applies() {
        let out = lex_ok("x: 1_2_3;\n");
        assert!(out
            .warnings
            .iter()
            .any(|w| w.message == "Number literal is not grouped reasonably."));
    }

    #[test]
    fn test_unknown_character() {
        let out = lex_ok("name: §;\n");
        assert!(out
            .errors
            .iter()
            .any(|e| e.message.starts_with("Unknown token:")));
    }
}
