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

//! The CSL operator table.
//!
//! Operators are keyed by their text plus the number of operands that
//! appear *before* the operator, which distinguishes unary `-` (0 before)
//! from binary `-` (1 before). Lower precedence binds tighter. Closing
//! tokens (`)`, `]`, `:`) sit at the lowest precedence so the expression
//! parser never binds across them.

/// Properties of one operator entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorProp {
    /// Closing token for paired operators (`[`→`]`, `(`→`)`, `?`→`:`).
    pub paired: &'static str,
    /// Operation name, for diagnostics.
    pub name: &'static str,
    /// Total operand count (0 for closing tokens).
    pub operands: usize,
    /// Precedence; lower binds tighter.
    pub precedence: usize,
    /// `true` for right-associative operators.
    pub right_assoc: bool,
}

/// Precedence assigned to anything absent from the table.
pub const LOWEST_PRECEDENCE: usize = 17;

type Entry = (&'static str, usize, OperatorProp);

const fn prop(
    paired: &'static str,
    name: &'static str,
    operands: usize,
    precedence: usize,
    right_assoc: bool,
) -> OperatorProp {
    OperatorProp {
        paired,
        name,
        operands,
        precedence,
        right_assoc,
    }
}

/// `(text, operands-before-operator, properties)`.
const OPERATORS: &[Entry] = &[
    (".", 1, prop("", "Member", 2, 1, false)),
    ("@", 1, prop("", "Annotation", 2, 1, false)),
    ("[", 1, prop("]", "Subscript", 2, 2, false)),
    ("]", 0, prop("", "", 0, LOWEST_PRECEDENCE, false)),
    ("(", 1, prop(")", "FunctionCall", 2, 2, false)),
    (")", 0, prop("", "", 0, LOWEST_PRECEDENCE, false)),
    ("~", 0, prop("", "Complement", 1, 3, true)),
    ("!", 0, prop("", "LogicalNot", 1, 3, true)),
    ("+", 0, prop("", "UnaryPlus", 1, 3, true)),
    ("-", 0, prop("", "UnaryNegation", 1, 3, true)),
    ("*", 1, prop("", "Multiplication", 2, 5, false)),
    ("/", 1, prop("", "Division", 2, 5, false)),
    ("%", 1, prop("", "Modulus", 2, 5, false)),
    ("+", 1, prop("", "Addition", 2, 6, false)),
    ("-", 1, prop("", "Subtraction", 2, 6, false)),
    ("<<", 1, prop("", "LeftShift", 2, 7, false)),
    (">>", 1, prop("", "RightShift", 2, 7, false)),
    ("<", 1, prop("", "LessThan", 2, 8, false)),
    (">", 1, prop("", "GreaterThan", 2, 8, false)),
    ("<=", 1, prop("", "LessThanOrEqualTo", 2, 8, false)),
    (">=", 1, prop("", "GreaterThanOrEqualTo", 2, 8, false)),
    ("==", 1, prop("", "Equality", 2, 9, false)),
    ("!=", 1, prop("", "Inequality", 2, 9, false)),
    ("&", 1, prop("", "BitwiseAnd", 2, 10, false)),
    ("^", 1, prop("", "BitwiseExclusiveOr", 2, 11, false)),
    ("|", 1, prop("", "BitwiseInclusiveOr", 2, 12, false)),
    ("&&", 1, prop("", "LogicalAnd", 2, 13, false)),
    ("||", 1, prop("", "LogicalOr", 2, 14, false)),
    ("?", 1, prop(":", "Conditional", 3, 15, true)),
    (":", 0, prop("", "", 0, LOWEST_PRECEDENCE, false)),
    ("=", 1, prop("", "Assignment", 2, 15, true)),
];

/// Looks up an operator by text and operand-before count.
pub fn lookup(text: &str, operands_before: usize) -> Option<&'static OperatorProp> {
    OPERATORS
        .iter()
        .find(|(t, n, _)| *t == text && *n == operands_before)
        .map(|(_, _, prop)| prop)
}

/// Precedence for a token; non-operators get [`LOWEST_PRECEDENCE`].
pub fn precedence(text: &str, operands_before: usize) -> usize {
    lookup(text, operands_before)
        .map(|prop| prop.precedence)
        .unwrap_or(LOWEST_PRECEDENCE)
}

/// Distinct operator texts, longest first, as the lexer matches them. The
/// dependency arrow `=>` is included so it lexes as one token.
pub fn lexer_candidates() -> &'static [&'static str] {
    &[
        "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "=>", ".", "@", "[", "]", "(", ")",
        "~", "!", "+", "-", "*", "/", "%", "<", ">", "&", "^", "|", "?", ":", "=",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unary_vs_binary_minus() {
        let unary = lookup("-", 0).unwrap();
        let binary = lookup("-", 1).unwrap();
        assert_eq!(unary.operands, 1);
        assert_eq!(unary.precedence, 3);
        assert!(unary.right_assoc);
        assert_eq!(binary.operands, 2);
        assert_eq!(binary.precedence, 6);
        assert!(!binary.right_assoc);
    }

    #[test]
    fn test_precedence_ladder() {
        assert!(precedence(".", 1) < precedence("*", 1));
        assert!(precedence("*", 1) < precedence("+", 1));
        assert!(precedence("+", 1) < precedence("<<", 1));
        assert!(precedence("<<", 1) < precedence("<", 1));
        assert!(precedence("<", 1) < precedence("==", 1));
        assert!(precedence("==", 1) < precedence("&", 1));
        assert!(precedence("&", 1) < precedence("^", 1));
        assert!(precedence("^", 1) < precedence("|", 1));
        assert!(precedence("|", 1) < precedence("&&", 1));
        assert!(precedence("&&", 1) < precedence("||", 1));
        assert!(precedence("||", 1) < precedence("?", 1));
    }

    #[test]
    fn test_non_operator_gets_lowest_precedence() {
        assert_eq!(precedence("identifier", 1), LOWEST_PRECEDENCE);
        assert_eq!(precedence(")", 0), LOWEST_PRECEDENCE);
        assert_eq!(precedence(":", 0), LOWEST_PRECEDENCE);
    }

    #[test]
    fn test_ternary_is_paired_and_right_assoc() {
        let ternary = lookup("?", 1).unwrap();
        assert_eq!(ternary.paired, ":");
        assert_eq!(ternary.operands, 3);
        assert!(ternary.right_assoc);
    }

    #[test]
    fn test_lexer_candidates_longest_first() {
        let candidates = lexer_candidates();
        for window in candidates.windows(2) {
            assert!(window[0].len() >= window[1].len());
        }
    }
}
