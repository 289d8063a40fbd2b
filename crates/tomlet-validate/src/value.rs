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

//! The runtime value model of constraint evaluation.
//!
//! Document scalars and schema literals coerce into a four-variant sum:
//! numbers (IEEE doubles), booleans, strings, and null. Comparisons are
//! strict on the variant; mismatched operand types evaluate to null.

use tomlet_core::strings::{clean_numeric_literal, convert_to_decimal_string, extract_string_content};
use tomlet_core::types::{SpecialKind, TypeTag};

/// A coerced runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalValue {
    Number(f64),
    Bool(bool),
    Str(String),
    Null,
}

impl EvalValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            EvalValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            EvalValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Coerces a literal to a runtime value: integers through the normalized
/// base parser, floats through the cleaner, booleans textually, datetimes
/// as strings, special numbers to IEEE NaN/±infinity. Failures coerce to
/// null.
pub fn coerce(tag: TypeTag, text: &str) -> EvalValue {
    match tag {
        TypeTag::String(kind) => match extract_string_content(text, kind) {
            Ok(content) => EvalValue::Str(content),
            Err(_) => EvalValue::Str(text.to_string()),
        },
        TypeTag::Integer => {
            let cleaned = clean_numeric_literal(text);
            if cleaned.is_empty() {
                return EvalValue::Number(0.0);
            }
            match convert_to_decimal_string(&cleaned)
                .ok()
                .and_then(|decimal| decimal.parse::<i64>().ok())
            {
                Some(value) => EvalValue::Number(value as f64),
                None => EvalValue::Null,
            }
        }
        TypeTag::Float => {
            let cleaned = clean_numeric_literal(text);
            if cleaned.is_empty() {
                return EvalValue::Number(0.0);
            }
            match cleaned.parse::<f64>() {
                Ok(value) => EvalValue::Number(value),
                Err(_) => EvalValue::Null,
            }
        }
        TypeTag::Boolean => EvalValue::Bool(text == "true"),
        TypeTag::DateTime(_) => EvalValue::Str(text.to_string()),
        TypeTag::SpecialNumber(kind) => match (kind, text.starts_with('-')) {
            (SpecialKind::NaN, false) => EvalValue::Number(f64::NAN),
            (SpecialKind::NaN, true) => EvalValue::Number(-f64::NAN),
            (SpecialKind::Infinity, false) => EvalValue::Number(f64::INFINITY),
            (SpecialKind::Infinity, true) => EvalValue::Number(f64::NEG_INFINITY),
        },
    }
}

/// Strict equality: null equals only null; otherwise same variant and
/// equal payload (NaN is unequal to itself, as IEEE demands).
pub fn values_equal(a: &EvalValue, b: &EvalValue) -> bool {
    match (a, b) {
        (EvalValue::Null, EvalValue::Null) => true,
        (EvalValue::Number(x), EvalValue::Number(y)) => x == y,
        (EvalValue::Bool(x), EvalValue::Bool(y)) => x == y,
        (EvalValue::Str(x), EvalValue::Str(y)) => x == y,
        _ => false,
    }
}

/// Boolean interpretation: non-zero numbers, `true`, and non-empty
/// strings are truthy; null is falsy.
pub fn truthy(value: &EvalValue) -> bool {
    match value {
        EvalValue::Bool(b) => *b,
        EvalValue::Number(n) => *n != 0.0,
        EvalValue::Str(s) => !s.is_empty(),
        EvalValue::Null => false,
    }
}

fn integral(n: f64) -> Option<i64> {
    if n.is_finite() && n.floor() == n {
        Some(n as i64)
    } else {
        None
    }
}

/// Binary operator semantics. Equality and logical operators work across
/// variants; everything else requires matching variants and yields null
/// on mismatch. Bitwise and shift operators additionally require
/// integral operands.
pub fn apply_binary_op(lhs: &EvalValue, rhs: &EvalValue, op: &str) -> EvalValue {
    match op {
        "==" => return EvalValue::Bool(values_equal(lhs, rhs)),
        "!=" => return EvalValue::Bool(!values_equal(lhs, rhs)),
        "&&" => return EvalValue::Bool(truthy(lhs) && truthy(rhs)),
        "||" => return EvalValue::Bool(truthy(lhs) || truthy(rhs)),
        _ => {}
    }

    match (lhs, rhs) {
        (EvalValue::Number(l), EvalValue::Number(r)) => {
            let (l, r) = (*l, *r);
            match op {
                "+" => EvalValue::Number(l + r),
                "-" => EvalValue::Number(l - r),
                "*" => EvalValue::Number(l * r),
                "/" => EvalValue::Number(l / r),
                "<" => EvalValue::Bool(l < r),
                ">" => EvalValue::Bool(l > r),
                "<=" => EvalValue::Bool(l <= r),
                ">=" => EvalValue::Bool(l >= r),
                "%" | "<<" | ">>" | "&" | "|" | "^" => {
                    match (integral(l), integral(r)) {
                        (Some(li), Some(ri)) => {
                            let value = match op {
                                "%" => {
                                    if ri == 0 {
                                        return EvalValue::Null;
                                    }
                                    li % ri
                                }
                                "<<" => li.wrapping_shl(ri as u32),
                                ">>" => li.wrapping_shr(ri as u32),
                                "&" => li & ri,
                                "|" => li | ri,
                                "^" => li ^ ri,
                                _ => unreachable!(),
                            };
                            EvalValue::Number(value as f64)
                        }
                        _ => EvalValue::Null,
                    }
                }
                _ => EvalValue::Null,
            }
        }
        (EvalValue::Str(l), EvalValue::Str(r)) => match op {
            "+" => EvalValue::Str(format!("{l}{r}")),
            "<" => EvalValue::Bool(l < r),
            ">" => EvalValue::Bool(l > r),
            "<=" => EvalValue::Bool(l <= r),
            ">=" => EvalValue::Bool(l >= r),
            _ => EvalValue::Null,
        },
        _ => EvalValue::Null,
    }
}

/// Unary operator semantics over the value sum.
pub fn apply_unary_op(operand: &EvalValue, op: &str) -> EvalValue {
    match op {
        "!" => EvalValue::Bool(!truthy(operand)),
        "~" => match operand {
            EvalValue::Number(n) => match integral(*n) {
                Some(i) => EvalValue::Number(!i as f64),
                None => EvalValue::Null,
            },
            EvalValue::Bool(b) => EvalValue::Number(!(*b as i64) as f64),
            _ => EvalValue::Null,
        },
        "+" => match operand {
            EvalValue::Number(n) => EvalValue::Number(*n),
            EvalValue::Bool(b) => EvalValue::Number(*b as i64 as f64),
            _ => EvalValue::Null,
        },
        "-" => match operand {
            EvalValue::Number(n) => EvalValue::Number(-n),
            EvalValue::Bool(b) => EvalValue::Number(-(*b as i64 as f64)),
            _ => EvalValue::Null,
        },
        _ => EvalValue::Null,
    }
}
