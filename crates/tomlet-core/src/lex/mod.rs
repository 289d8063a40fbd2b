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

//! The TOML lexer.
//!
//! Reads the source line by line, accumulating a pending buffer while an
//! unterminated triple-quoted string keeps a statement open across lines.
//! At the head of the buffer, recognizers run in a fixed priority order:
//! comment → string → datetime → numeric → boolean → punctuator →
//! operator → identifier. Unrecognized characters coalesce into `unknown`
//! tokens that surface as errors once lexing finishes.
//!
//! Lexing never fails: every problem is reported with a region and the
//! scan continues.

pub mod scan;

use crate::diagnostics::{Diagnostic, DiagnosticList};
use crate::position::{Position, Region};
use crate::token::{Token, TokenCategory, TokenList};
use crate::types::TypeTag;

/// Result of lexing one document.
#[derive(Debug)]
pub struct LexOutput {
    pub tokens: TokenList,
    pub errors: DiagnosticList,
    pub warnings: DiagnosticList,
}

/// Lexes TOML source. With `multiline_tokens` disabled, tokens that span
/// lines are re-emitted as one synthesized token per line, for editor
/// integrations that cannot render multi-line semantic tokens.
pub fn lex(input: &str, multiline_tokens: bool) -> LexOutput {
    let mut output = Lexer::new(input).run();
    if !multiline_tokens {
        split_multiline_tokens(&mut output.tokens);
    }
    output
}

/// Advances `start` over every character of `text`, counting newlines.
pub fn end_position(text: &str, start: Position) -> Position {
    let mut pos = start;
    for ch in text.chars() {
        if ch == '\n' {
            pos.line += 1;
            pos.column = 0;
        } else {
            pos.column += 1;
        }
    }
    pos
}

struct Lexer<'a> {
    lines: Vec<&'a str>,
    errors: DiagnosticList,
    warnings: DiagnosticList,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        // CRLF and LF both end a line; a '\r' not followed by '\n' stays in
        // the line content and is reported separately.
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

            if scan::has_incomplete_string(&code) {
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
            if let Some(m) = scan::match_comment(code) {
                let (text, region) = consume(code, pos, &m);
                if !is_string_content_valid(&text[1..], false) {
                    self.errors.push(Diagnostic::new(
                        "Comment contains invalid content.",
                        region,
                    ));
                }
                tokens.push(Token::new(text, TokenCategory::Comment, None, region));
                continue;
            }
            if let Some(m) = scan::match_string(code) {
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
            if let Some(m) = scan::match_numeric(code) {
                let (text, region) = consume(code, pos, &m);
                let bytes = text.as_bytes();
                if bytes.len() > 3
                    && matches!(bytes[0], b'+' | b'-')
                    && bytes[1] == b'0'
                    && matches!(bytes[2], b'b' | b'o' | b'x')
                {
                    self.errors.push(Diagnostic::new(
                        "Number literal in hexadecimal, octal or binary cannot have a positive or negative sign.",
                        region,
                    ));
                }
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
            if let Some(m) = scan::match_punctuator(code) {
                let (text, region) = consume(code, pos, &m);
                tokens.push(Token::new(text, TokenCategory::Punctuator, None, region));
                continue;
            }
            if let Some(m) = scan::match_operator(code) {
                let (text, region) = consume(code, pos, &m);
                tokens.push(Token::new(text, TokenCategory::Operator, None, region));
                continue;
            }
            if let Some(m) = scan::match_identifier(code) {
                let (text, region) = consume(code, pos, &m);
                tokens.push(Token::new(text, TokenCategory::Identifier, None, region));
                continue;
            }

            if code.chars().all(char::is_whitespace) {
                *pos = end_position(code, *pos);
                code.clear();
                continue;
            }

            // Unknown character: buffer it and move one char forward.
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

fn consume(code: &mut String, pos: &mut Position, m: &scan::Match) -> (String, Region) {
    let start = end_position(&code[..m.ws], *pos);
    let text: String = code[m.ws..m.ws + m.len].to_string();
    let end = end_position(&text, start);
    *pos = end;
    code.drain(..m.ws + m.len);
    (text, Region::new(start, end))
}

/// Control-character validation per string kind. Multi-line forms permit
/// `\n` and CRLF pairs; single-line forms reject all C0 controls except
/// tab. Input is already valid UTF-8 by construction.
pub fn is_string_content_valid(text: &str, multi_line: bool) -> bool {
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        let code = ch as u32;
        if !multi_line {
            if (0x00..=0x08).contains(&code)
                || (0x0A..=0x1F).contains(&code)
                || code == 0x7F
            {
                return false;
            }
        } else {
            if (0x00..=0x08).contains(&code)
                || code == 0x0B
                || code == 0x0C
                || (0x0E..=0x1F).contains(&code)
                || code == 0x7F
            {
                return false;
            }
            if code == 0x0D && chars.peek() != Some(&'\n') {
                return false;
            }
        }
    }
    true
}

/// Underscore-grouping heuristic. The integer part accepts uniform group
/// widths greater than one, or thousands-style grouping with a final group
/// of three; the fraction part accepts uniform widths greater than one.
pub fn is_number_reasonably_grouped(text: &str) -> bool {
    let (before_dot, after_dot) = match text.find('.') {
        Some(dot) => (&text[..dot], &text[dot + 1..]),
        None => (text, ""),
    };
    let before_dot = before_dot
        .strip_prefix(['+', '-'])
        .unwrap_or(before_dot);
    let before_dot = if before_dot.len() > 2 && before_dot.starts_with('0') {
        match &before_dot[1..2] {
            "b" | "o" | "x" => &before_dot[2..],
            _ => before_dot,
        }
    } else {
        before_dot
    };

    let Some(before_sizes) = split_group_sizes(before_dot) else {
        return false;
    };
    if before_sizes.len() > 1 {
        let uniform = before_sizes[1..].iter().all(|&s| s == before_sizes[1]);
        if uniform {
            if before_sizes[1] == 1 {
                return false;
            }
        } else {
            let middles_ok = before_sizes[1..before_sizes.len() - 1]
                .iter()
                .all(|&s| s == 2);
            if !middles_ok || *before_sizes.last().unwrap_or(&0) != 3 {
                return false;
            }
        }
    }

    let Some(after_sizes) = split_group_sizes(after_dot) else {
        return false;
    };
    if after_sizes.len() == 1 {
        return true;
    }
    let uniform = after_sizes[1..].iter().all(|&s| s == after_sizes[1]);
    uniform && after_sizes[1] != 1
}

/// Sizes of the `_`-separated groups, or `None` when a group is empty
/// (`1__000`). A string without underscores is a single group.
fn split_group_sizes(text: &str) -> Option<Vec<usize>> {
    let mut sizes = Vec::new();
    for (index, part) in text.split('_').enumerate() {
        if part.is_empty() && index > 0 {
            return None;
        }
        sizes.push(part.len());
    }
    Some(sizes)
}

/// Re-emits tokens spanning several lines as one token per line, keeping
/// category and payload.
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
                Token::new(
                    piece,
                    token.category,
                    token.payload,
                    Region::new(start, end),
                ),
            );
            index += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DateTimeKind, SpecialKind, StringKind};

    fn lex_ok(input: &str) -> LexOutput {
        lex(input, true)
    }

    fn texts(output: &LexOutput) -> Vec<&str> {
        output.tokens.iter().map(|t| t.text.as_str()).collect()
    }

    // ==================== basic lexing ====================

    #[test]
    fn test_simple_assignment() {
        let out = lex_ok("x = 1\n");
        assert_eq!(texts(&out), vec!["x", "=", "1"]);
        assert!(out.errors.is_empty());
        assert!(out.warnings.is_empty());

        let x = out.tokens.get(0).unwrap();
        assert_eq!(x.category, TokenCategory::Identifier);
        assert_eq!(x.region, Region::new(Position::new(0, 0), Position::new(0, 1)));

        let one = out.tokens.get(2).unwrap();
        assert_eq!(one.payload, Some(TypeTag::Integer));
        assert_eq!(one.region.start, Position::new(0, 4));
    }

    #[test]
    fn test_header_and_string() {
        let out = lex_ok("[a]\ny = \"hi\"\n");
        assert_eq!(texts(&out), vec!["[", "a", "]", "y", "=", "\"hi\""]);
        let s = out.tokens.get(5).unwrap();
        assert_eq!(s.category, TokenCategory::String);
        assert_eq!(s.payload, Some(TypeTag::String(StringKind::Basic)));
        assert_eq!(s.region.start, Position::new(1, 4));
    }

    #[test]
    fn test_token_coverage_property() {
        // Single-line tokens: text length == col_span - 1.
        let out = lex_ok("key = \"value\" # note\narr = [1, 2.5, true]\n");
        for token in out.tokens.iter() {
            assert!(token.region.is_single_line());
            assert_eq!(
                token.text.chars().count() as i64,
                token.region.col_span() - 1,
                "token {:?}",
                token.text
            );
        }
    }

    #[test]
    fn test_datetime_before_numeric() {
        let out = lex_ok("d = 1979-05-27\n");
        let d = out.tokens.get(2).unwrap();
        assert_eq!(d.category, TokenCategory::Datetime);
        assert_eq!(d.payload, Some(TypeTag::DateTime(DateTimeKind::LocalDate)));
    }

    #[test]
    fn test_special_number() {
        let out = lex_ok("x = -inf\n");
        let tok = out.tokens.get(2).unwrap();
        assert_eq!(tok.text, "-inf");
        assert_eq!(tok.payload, Some(TypeTag::SpecialNumber(SpecialKind::Infinity)));
    }

    #[test]
    fn test_comment_token() {
        let out = lex_ok("# top\nx = 1 # tail\n");
        assert_eq!(out.tokens.get(0).unwrap().category, TokenCategory::Comment);
        assert_eq!(out.tokens.get(4).unwrap().text, "# tail");
    }

    // ==================== multi-line strings ====================

    #[test]
    fn test_multiline_string_spans_lines() {
        let out = lex_ok("s = \"\"\"one\ntwo\"\"\"\nx = 1\n");
        let s = out.tokens.get(2).unwrap();
        assert_eq!(s.payload, Some(TypeTag::String(StringKind::MultiLineBasic)));
        assert_eq!(s.region.start, Position::new(0, 4));
        assert_eq!(s.region.end, Position::new(1, 6));
        // Tokens after the string continue on the right line.
        let x = out.tokens.get(3).unwrap();
        assert_eq!(x.region.start, Position::new(2, 0));
        assert!(out.errors.is_empty());
    }

    #[test]
    fn test_unterminated_multiline_string_at_eof() {
        let out = lex_ok("s = \"\"\"never closed\n");
        assert!(out
            .errors
            .iter()
            .any(|e| e.message == "String literal is not closed."));
    }

    #[test]
    fn test_lone_carriage_return_line() {
        let out = lex_ok("x = 1\n \r \ny = 2\n");
        assert!(out
            .errors
            .iter()
            .any(|e| e.message == "Line ending is not valid."));
    }

    #[test]
    fn test_crlf_line_endings() {
        let out = lex_ok("x = 1\r\ny = 2\r\n");
        assert_eq!(texts(&out), vec!["x", "=", "1", "y", "=", "2"]);
        assert!(out.errors.is_empty());
    }

    // ==================== diagnostics ====================

    #[test]
    fn test_unknown_token_reported() {
        let out = lex_ok("x = §§\n");
        assert!(out
            .errors
            .iter()
            .any(|e| e.message.starts_with("Unknown token:")));
    }

    #[test]
    fn test_signed_hex_error() {
        let out = lex_ok("x = -0x10\n");
        assert!(out.errors.iter().any(|e| e
            .message
            .starts_with("Number literal in hexadecimal, octal or binary")));
    }

    #[test]
    fn test_grouping_warning() {
        let out = lex_ok("x = 1_2_3\n");
        assert_eq!(out.errors.len(), 0);
        assert!(out
            .warnings
            .iter()
            .any(|w| w.message == "Number literal is not grouped reasonably."));
        // The token itself still lexes as a number.
        assert_eq!(out.tokens.get(2).unwrap().category, TokenCategory::Number);
    }

    #[test]
    fn test_reasonable_grouping_silent() {
        for input in ["x = 1_000_000\n", "x = 123_456\n", "x = 12_34_567.88\n"] {
            let out = lex_ok(input);
            assert!(out.warnings.is_empty(), "input {input:?}");
        }
    }

    // ==================== grouping heuristic ====================

    #[test]
    fn test_grouping_rules() {
        assert!(is_number_reasonably_grouped("1000"));
        assert!(is_number_reasonably_grouped("1_000"));
        assert!(is_number_reasonably_grouped("1_000_000"));
        assert!(is_number_reasonably_grouped("12_34_567"));
        assert!(!is_number_reasonably_grouped("1_2_3"));
        assert!(!is_number_reasonably_grouped("1__000"));
        assert!(!is_number_reasonably_grouped("3.1_4_1"));
        assert!(is_number_reasonably_grouped("3.14_15"));
        assert!(is_number_reasonably_grouped("0xdead_beef"));
    }

    // ==================== single-line token mode ====================

    #[test]
    fn test_single_line_mode_splits_multiline_tokens() {
        let out = lex("s = \"\"\"one\ntwo\"\"\"\n", false);
        for token in out.tokens.iter() {
            assert!(token.region.is_single_line(), "token {:?}", token.text);
        }
        let pieces: Vec<&str> = out
            .tokens
            .iter()
            .filter(|t| t.category == TokenCategory::String)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(pieces, vec!["\"\"\"one", "two\"\"\""]);
    }

    // ==================== string content validation ====================

    #[test]
    fn test_control_char_in_string() {
        let out = lex_ok("x = \"a\u{1}b\"\n");
        assert!(out
            .errors
            .iter()
            .any(|e| e.message == "String literal contains invalid content."));
    }

    #[test]
    fn test_tab_in_string_is_fine() {
        let out = lex_ok("x = \"a\tb\"\n");
        assert!(out.errors.is_empty());
    }
}
