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

//! String-literal decoding and numeric normalization helpers.

use crate::error::Error;
use crate::types::StringKind;

/// Strips one level of quoting from a string literal and decodes its
/// content according to `kind`: escape sequences for basic strings, line
/// continuations and leading-newline trimming for multi-line forms, raw
/// passthrough for literal and raw strings.
pub fn extract_string_content(literal: &str, kind: StringKind) -> Result<String, Error> {
    match kind {
        StringKind::Basic => unescape_basic(strip_quotes(literal, 1), false),
        StringKind::MultiLineBasic => {
            let content = trim_leading_newline(strip_quotes(literal, 3));
            unescape_basic(content, true)
        }
        StringKind::Literal => Ok(strip_quotes(literal, 1).to_string()),
        StringKind::MultiLineLiteral => {
            Ok(trim_leading_newline(strip_quotes(literal, 3)).to_string())
        }
        StringKind::Raw | StringKind::MultiLineRaw => extract_raw_content(literal),
    }
}

fn strip_quotes(literal: &str, width: usize) -> &str {
    if literal.len() >= width * 2 {
        &literal[width..literal.len() - width]
    } else {
        ""
    }
}

fn trim_leading_newline(content: &str) -> &str {
    content.strip_prefix('\n').unwrap_or(content)
}

/// Content of `R"delim(...)delim"`.
fn extract_raw_content(literal: &str) -> Result<String, Error> {
    let open = literal
        .find('(')
        .ok_or_else(|| Error::InvalidString(literal.to_string()))?;
    let delim_len = open.saturating_sub(2);
    // Closing form is `)delim"`.
    let close = literal
        .len()
        .checked_sub(delim_len + 2)
        .filter(|&close| close >= open + 1)
        .ok_or_else(|| Error::InvalidString(literal.to_string()))?;
    Ok(literal[open + 1..close].to_string())
}

/// Joins lines ending in a backslash line-continuation, stripping the
/// continued line's leading whitespace.
fn remove_line_continuations(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut continuing = false;

    for line in input.split_inclusive('\n') {
        let (content, newline) = match line.strip_suffix('\n') {
            Some(content) => (content.strip_suffix('\r').unwrap_or(content), true),
            None => (line, false),
        };

        let content = if continuing {
            let trimmed = content.trim_start_matches([' ', '\t', '\u{c}', '\r', '\u{b}']);
            if trimmed.is_empty() {
                continue;
            }
            trimmed
        } else {
            content
        };

        // A continuation is an odd run of trailing backslashes, possibly
        // followed by whitespace.
        let meaningful = content.trim_end_matches([' ', '\t', '\u{c}', '\r', '\u{b}']);
        let backslashes = meaningful.len() - meaningful.trim_end_matches('\\').len();
        if backslashes % 2 == 1 {
            result.push_str(&meaningful[..meaningful.len() - 1]);
            continuing = true;
        } else {
            result.push_str(content);
            if newline {
                result.push('\n');
            }
            continuing = false;
        }
    }

    result
}

fn unescape_basic(content: &str, is_multi_line: bool) -> Result<String, Error> {
    let processed = if is_multi_line {
        remove_line_continuations(content)
    } else {
        content.to_string()
    };

    let mut result = String::with_capacity(processed.len());
    let mut chars = processed.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        let escape = chars
            .next()
            .ok_or_else(|| Error::InvalidString("dangling backslash".to_string()))?;
        match escape {
            'b' => result.push('\u{8}'),
            't' => result.push('\t'),
            'n' => result.push('\n'),
            'f' => result.push('\u{c}'),
            'r' => result.push('\r'),
            '"' => result.push('"'),
            '\\' => result.push('\\'),
            'u' => result.push(read_unicode_escape(&mut chars, 4)?),
            'U' => result.push(read_unicode_escape(&mut chars, 8)?),
            other => {
                return Err(Error::InvalidString(format!(
                    "invalid escape sequence: \\{other}"
                )))
            }
        }
    }
    Ok(result)
}

fn read_unicode_escape(chars: &mut std::str::Chars<'_>, width: usize) -> Result<char, Error> {
    let mut hex = String::with_capacity(width);
    for _ in 0..width {
        hex.push(
            chars
                .next()
                .ok_or_else(|| Error::InvalidString("truncated unicode escape".to_string()))?,
        );
    }
    let code = u32::from_str_radix(&hex, 16)
        .map_err(|_| Error::InvalidString(format!("invalid unicode escape: {hex}")))?;
    char::from_u32(code)
        .ok_or_else(|| Error::InvalidString(format!("invalid unicode code point: {code:#x}")))
}

/// Normalizes an integer literal (underscores already stripped, optional
/// leading `-`, optional `0x`/`0o`/`0b` prefix) to a decimal string.
pub fn convert_to_decimal_string(input: &str) -> Result<String, Error> {
    if input.is_empty() {
        return Err(Error::InvalidNumber("empty literal".to_string()));
    }
    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };
    let (base, number) = if let Some(rest) = digits.strip_prefix("0x") {
        (16, rest)
    } else if let Some(rest) = digits.strip_prefix("0o") {
        (8, rest)
    } else if let Some(rest) = digits.strip_prefix("0b") {
        (2, rest)
    } else {
        (10, digits)
    };

    let value = u64::from_str_radix(number, base)
        .map_err(|_| Error::InvalidNumber(input.to_string()))?;
    if negative && value != 0 {
        Ok(format!("-{value}"))
    } else {
        Ok(value.to_string())
    }
}

/// Strips underscores and a leading `+` from a numeric literal, the shared
/// first step of every numeric coercion.
pub fn clean_numeric_literal(input: &str) -> String {
    let cleaned: String = input.chars().filter(|&ch| ch != '_').collect();
    cleaned
        .strip_prefix('+')
        .map(str::to_string)
        .unwrap_or(cleaned)
}
