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

//! Token recognizers for the TOML lexer.
//!
//! Each recognizer inspects the head of the remaining buffer (after
//! leading whitespace) and returns the whitespace width plus the matched
//! span. The driver tries them in a fixed priority order; the first match
//! wins. All lengths are byte offsets into the buffer.

use crate::types::{DateTimeKind, SpecialKind, StringKind, TypeTag};
use regex::Regex;
use std::sync::OnceLock;

/// A recognizer hit: leading-whitespace width and matched length, both in
/// bytes, plus the payload for typed literals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub ws: usize,
    pub len: usize,
    pub tag: Option<TypeTag>,
}

fn leading_ws(s: &str) -> usize {
    s.len() - s.trim_start().len()
}

fn is_word_char(ch: char) -> bool {
    ch == '-' || ch == '_' || ch.is_ascii_alphanumeric()
}

/// `#` to end of line.
pub fn match_comment(s: &str) -> Option<Match> {
    let ws = leading_ws(s);
    let rest = &s[ws..];
    if !rest.starts_with('#') {
        return None;
    }
    let len = rest.find('\n').unwrap_or(rest.len());
    Some(Match {
        ws,
        len,
        tag: None,
    })
}

/// Bare keys: `[-A-Za-z0-9_]+`, never `true`/`false`.
pub fn match_identifier(s: &str) -> Option<Match> {
    let ws = leading_ws(s);
    let rest = &s[ws..];
    let len = rest
        .char_indices()
        .find(|&(_, ch)| !is_word_char(ch))
        .map(|(idx, _)| idx)
        .unwrap_or(rest.len());
    if len == 0 {
        return None;
    }
    let text = &rest[..len];
    if text == "true" || text == "false" {
        return None;
    }
    Some(Match {
        ws,
        len,
        tag: None,
    })
}

/// The identifier run at the head of `s`, used by the parser to decide
/// whether a number token is really a bare key. Returns (start, text).
pub fn check_identifier(s: &str) -> (usize, &str) {
    match match_identifier(s) {
        Some(m) => (m.ws, &s[m.ws..m.ws + m.len]),
        None => (0, ""),
    }
}

/// `true` / `false` with a word boundary.
pub fn match_boolean(s: &str) -> Option<Match> {
    let ws = leading_ws(s);
    let rest = &s[ws..];
    for literal in ["true", "false"] {
        if let Some(after) = rest.strip_prefix(literal) {
            if after.chars().next().map(is_word_char) != Some(true) {
                return Some(Match {
                    ws,
                    len: literal.len(),
                    tag: Some(TypeTag::Boolean),
                });
            }
        }
    }
    None
}

/// One of `{ } [ ] ,`.
pub fn match_punctuator(s: &str) -> Option<Match> {
    let ws = leading_ws(s);
    match s[ws..].chars().next() {
        Some('{' | '}' | '[' | ']' | ',') => Some(Match {
            ws,
            len: 1,
            tag: None,
        }),
        _ => None,
    }
}

/// `.` or `=`.
pub fn match_operator(s: &str) -> Option<Match> {
    let ws = leading_ws(s);
    match s[ws..].chars().next() {
        Some('.' | '=') => Some(Match {
            ws,
            len: 1,
            tag: None,
        }),
        _ => None,
    }
}

// ==================== numeric ====================

fn scan_digit_run(bytes: &[u8], accept: impl Fn(u8) -> bool) -> usize {
    let mut idx = 0;
    while idx < bytes.len() && accept(bytes[idx]) {
        idx += 1;
    }
    idx
}

/// Digits of `radix` with single `_` separators; `_` must sit between
/// digits. Returns 0 if the run does not start with a digit.
fn scan_grouped_digits(bytes: &[u8], accept: impl Fn(u8) -> bool + Copy) -> usize {
    if bytes.is_empty() || !accept(bytes[0]) {
        return 0;
    }
    let mut idx = 1;
    while idx < bytes.len() {
        if accept(bytes[idx]) {
            idx += 1;
        } else if bytes[idx] == b'_' && idx + 1 < bytes.len() && accept(bytes[idx + 1]) {
            idx += 2;
        } else {
            break;
        }
    }
    idx
}

/// Decimal integer part: `0` alone (not before `x`/`o`/`b`) or a nonzero
/// digit followed by grouped digits. Returns 0 on no match.
fn scan_decimal_int_part(bytes: &[u8]) -> usize {
    match bytes.first() {
        Some(b'0') => {
            if matches!(bytes.get(1), Some(b'x' | b'o' | b'b')) {
                0
            } else {
                1
            }
        }
        Some(b'1'..=b'9') => scan_grouped_digits(bytes, |b| b.is_ascii_digit()),
        _ => 0,
    }
}

/// Integer literal after an optional sign: decimal, `0x`, `0o`, or `0b`.
fn scan_integer(bytes: &[u8]) -> usize {
    if bytes.first() == Some(&b'0') {
        let (accept, prefix): (fn(u8) -> bool, usize) = match bytes.get(1) {
            Some(b'x') => (|b: u8| b.is_ascii_hexdigit(), 2),
            Some(b'o') => (|b: u8| (b'0'..=b'7').contains(&b), 2),
            Some(b'b') => (|b: u8| b == b'0' || b == b'1', 2),
            _ => return scan_decimal_int_part(bytes),
        };
        let digits = scan_grouped_digits(&bytes[prefix..], accept);
        return if digits == 0 { 0 } else { prefix + digits };
    }
    scan_decimal_int_part(bytes)
}

/// Float literal after an optional sign: decimal integer part, optional
/// fraction, optional exponent.
fn scan_float(bytes: &[u8]) -> usize {
    let mut idx = scan_decimal_int_part(bytes);
    if idx == 0 {
        return 0;
    }
    if bytes.get(idx) == Some(&b'.') {
        let fraction = scan_grouped_digits(&bytes[idx + 1..], |b| b.is_ascii_digit());
        if fraction > 0 {
            idx += 1 + fraction;
        }
    }
    if matches!(bytes.get(idx), Some(b'e' | b'E')) {
        let mut exp = idx + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let digits = scan_grouped_digits(&bytes[exp..], |b| b.is_ascii_digit());
        if digits > 0 {
            idx = exp + digits;
        }
    }
    idx
}

/// Integer and float scan lengths at the head of `bytes`, for lexers that
/// layer their own sign and identifier rules on top of the shared numeric
/// grammar.
pub fn numeric_lengths(bytes: &[u8]) -> (usize, usize) {
    (scan_integer(bytes), scan_float(bytes))
}

/// Numeric literal: special numbers, then the longer of integer and float
/// (tie favors integer). A strictly longer identifier match at the same
/// point wins over the number, so `007` or `1f` lex as identifiers.
pub fn match_numeric(s: &str) -> Option<Match> {
    let ws = leading_ws(s);
    let rest = &s[ws..];
    let bytes = rest.as_bytes();
    let sign = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));

    // Special numbers carry their sign and require a word boundary.
    for (literal, kind) in [("nan", SpecialKind::NaN), ("inf", SpecialKind::Infinity)] {
        if let Some(after) = rest[sign..].strip_prefix(literal) {
            if after.chars().next().map(is_word_char) != Some(true) {
                return Some(Match {
                    ws,
                    len: sign + literal.len(),
                    tag: Some(TypeTag::SpecialNumber(kind)),
                });
            }
        }
    }

    let int_len = scan_integer(&bytes[sign..]);
    let float_len = scan_float(&bytes[sign..]);
    let (len, tag) = if int_len == 0 && float_len == 0 {
        return None;
    } else if int_len >= float_len {
        (sign + int_len, TypeTag::Integer)
    } else {
        (sign + float_len, TypeTag::Float)
    };

    let (_, identifier) = check_identifier(rest);
    if len < identifier.len() {
        return None;
    }
    Some(Match {
        ws,
        len,
        tag: Some(tag),
    })
}

// ==================== datetime ====================

fn offset_datetime_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(\d{4}-\d{2}-\d{2})[Tt ]([01]\d|2[0-3]):[0-5]\d:[0-5]\d(\.\d+)?([Zz]|[+-]([01]\d|2[0-3]):[0-5]\d)",
        )
        .expect("offset datetime pattern")
    })
}

fn local_datetime_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{4}-\d{2}-\d{2})[Tt ]([01]\d|2[0-3]):[0-5]\d:[0-5]\d(\.\d+)?")
            .expect("local datetime pattern")
    })
}

fn local_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").expect("local date pattern"))
}

fn local_time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([01]\d|2[0-3]):[0-5]\d:[0-5]\d(\.\d+)?").expect("local time pattern")
    })
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Calendar check for `YYYY-MM-DD`, including the leap-year rule.
pub fn is_valid_date(date: &str) -> bool {
    if date.len() != 10 || date.as_bytes()[4] != b'-' || date.as_bytes()[7] != b'-' {
        return false;
    }
    let year: i32 = match date[0..4].parse() {
        Ok(year) => year,
        Err(_) => return false,
    };
    let month: u32 = match date[5..7].parse() {
        Ok(month) => month,
        Err(_) => return false,
    };
    let day: u32 = match date[8..10].parse() {
        Ok(day) => day,
        Err(_) => return false,
    };
    if year < 1 || !(1..=12).contains(&month) {
        return false;
    }
    let days_in_month = [
        31,
        if is_leap_year(year) { 29 } else { 28 },
        31,
        30,
        31,
        30,
        31,
        31,
        30,
        31,
        30,
        31,
    ];
    (1..=days_in_month[(month - 1) as usize]).contains(&day)
}

/// Date-time literal. Runs before the numeric recognizer because date
/// prefixes would also match integers. An invalid calendar date fails the
/// date-bearing forms and falls through.
pub fn match_datetime(s: &str) -> Option<Match> {
    let ws = leading_ws(s);
    let rest = &s[ws..];

    if let Some(caps) = offset_datetime_re().captures(rest) {
        if is_valid_date(caps.get(1).map(|m| m.as_str()).unwrap_or_default()) {
            return Some(Match {
                ws,
                len: caps.get(0).map(|m| m.len()).unwrap_or_default(),
                tag: Some(TypeTag::DateTime(DateTimeKind::OffsetDateTime)),
            });
        }
    }
    if let Some(caps) = local_datetime_re().captures(rest) {
        if is_valid_date(caps.get(1).map(|m| m.as_str()).unwrap_or_default()) {
            return Some(Match {
                ws,
                len: caps.get(0).map(|m| m.len()).unwrap_or_default(),
                tag: Some(TypeTag::DateTime(DateTimeKind::LocalDateTime)),
            });
        }
    }
    if let Some(m) = local_date_re().find(rest) {
        if is_valid_date(m.as_str()) {
            return Some(Match {
                ws,
                len: m.len(),
                tag: Some(TypeTag::DateTime(DateTimeKind::LocalDate)),
            });
        }
    }
    local_time_re().find(rest).map(|m| Match {
        ws,
        len: m.len(),
        tag: Some(TypeTag::DateTime(DateTimeKind::LocalTime)),
    })
}

// ==================== strings ====================

/// Scans a single-line quoted string starting at `bytes[0] == quote`.
/// Escapes are honored for basic strings only. Returns the total length
/// including quotes, or `None` if the line ends before the closing quote.
fn scan_single_line_string(bytes: &[u8], quote: u8, escapes: bool) -> Option<usize> {
    let mut idx = 1;
    while idx < bytes.len() {
        match bytes[idx] {
            b'\n' => return None,
            b'\\' if escapes => idx += 2,
            b if b == quote => return Some(idx + 1),
            _ => idx += 1,
        }
    }
    None
}

/// Scans a multi-line string starting at a triple quote. The closing
/// delimiter may be followed by up to two extra quotes that belong to the
/// content.
fn scan_multi_line_string(bytes: &[u8], quote: u8, escapes: bool) -> Option<usize> {
    let mut idx = 3;
    while idx < bytes.len() {
        if escapes && bytes[idx] == b'\\' {
            idx += 2;
            continue;
        }
        if bytes[idx] == quote && bytes.get(idx + 1) == Some(&quote) && bytes.get(idx + 2) == Some(&quote)
        {
            let mut end = idx + 3;
            // Up to two additional quotes close with the delimiter.
            let mut extra = 0;
            while extra < 2 && bytes.get(end) == Some(&quote) {
                end += 1;
                extra += 1;
            }
            return Some(end);
        }
        idx += 1;
    }
    None
}

/// String literal in any of the four TOML forms. Multi-line forms win over
/// their single-line prefixes.
pub fn match_string(s: &str) -> Option<Match> {
    let ws = leading_ws(s);
    let rest = &s[ws..];
    let bytes = rest.as_bytes();

    let (quote, escapes, basic_kind, multi_kind) = match bytes.first() {
        Some(b'"') => (b'"', true, StringKind::Basic, StringKind::MultiLineBasic),
        Some(b'\'') => (
            b'\'',
            false,
            StringKind::Literal,
            StringKind::MultiLineLiteral,
        ),
        _ => return None,
    };

    if bytes.len() >= 3 && bytes[1] == quote && bytes[2] == quote {
        if let Some(len) = scan_multi_line_string(bytes, quote, escapes) {
            return Some(Match {
                ws,
                len,
                tag: Some(TypeTag::String(multi_kind)),
            });
        }
        // `""` / `''`: an empty single-line string followed by something
        // other than a third quote run.
    }
    scan_single_line_string(bytes, quote, escapes).map(|len| Match {
        ws,
        len,
        tag: Some(TypeTag::String(basic_kind)),
    })
}

/// Returns `true` while the buffer opens a triple-quoted string that has
/// not terminated yet, so the driver keeps appending lines.
pub fn has_incomplete_string(buffer: &str) -> bool {
    let bytes = buffer.as_bytes();
    let mut idx = 0;
    while idx < bytes.len() {
        match bytes[idx] {
            b'#' => {
                // Comment runs to end of line.
                while idx < bytes.len() && bytes[idx] != b'\n' {
                    idx += 1;
                }
            }
            quote @ (b'"' | b'\'') => {
                let escapes = quote == b'"';
                if bytes.get(idx + 1) == Some(&quote) && bytes.get(idx + 2) == Some(&quote) {
                    match scan_multi_line_string(&bytes[idx..], quote, escapes) {
                        Some(len) => idx += len,
                        None => return true,
                    }
                } else {
                    match scan_single_line_string(&bytes[idx..], quote, escapes) {
                        Some(len) => idx += len,
                        // A single-line string that does not close ends at
                        // the line break; it never continues.
                        None => {
                            while idx < bytes.len() && bytes[idx] != b'\n' {
                                idx += 1;
                            }
                        }
                    }
                }
            }
            _ => idx += 1,
        }
    }
    false
}
