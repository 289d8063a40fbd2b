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

//! Scalar type tags attached to tokens and document-tree values.

/// The lexical form of a string literal.
///
/// `Raw` and `MultiLineRaw` are produced only by the CSL lexer
/// (`R"delim(...)delim"` literals); the TOML lexer emits the other four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringKind {
    /// `"..."` with escape sequences.
    Basic,
    /// `"""..."""`, may span lines.
    MultiLineBasic,
    /// `'...'`, no escape processing.
    Literal,
    /// `'''...'''`, may span lines.
    MultiLineLiteral,
    /// `R"delim(...)delim"` on one line.
    Raw,
    /// `R"delim(...)delim"` spanning lines.
    MultiLineRaw,
}

/// The kind of a special (non-finite) number literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialKind {
    /// `nan`, `+nan`, `-nan`.
    NaN,
    /// `inf`, `+inf`, `-inf`.
    Infinity,
}

/// The kind of a date-time literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateTimeKind {
    /// Date, time, and offset: `1979-05-27T07:32:00Z`.
    OffsetDateTime,
    /// Date and time without offset.
    LocalDateTime,
    /// Date only.
    LocalDate,
    /// Time only.
    LocalTime,
}

/// Typed payload carried by scalar tokens and `Value` nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    String(StringKind),
    Integer,
    Float,
    SpecialNumber(SpecialKind),
    Boolean,
    DateTime(DateTimeKind),
}

impl TypeTag {
    /// Returns `true` for any of the numeric tags.
    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TypeTag::Integer | TypeTag::Float | TypeTag::SpecialNumber(_)
        )
    }

    /// Returns the string kind if this is a string tag.
    #[inline]
    pub fn string_kind(&self) -> Option<StringKind> {
        match self {
            TypeTag::String(kind) => Some(*kind),
            _ => None,
        }
    }
}

impl StringKind {
    /// Returns `true` for the kinds whose literals may span lines.
    #[inline]
    pub fn is_multi_line(&self) -> bool {
        matches!(
            self,
            StringKind::MultiLineBasic | StringKind::MultiLineLiteral | StringKind::MultiLineRaw
        )
    }
}
