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

//! Semantic-token encoding.
//!
//! Tokens are emitted as delta-encoded 5-tuples `(Δline, Δchar, length,
//! typeIndex, modifiers=0)` against a fixed legend. Categories outside
//! the legend map to `unknown`.

use tomlet_core::token::{TokenCategory, TokenList};
use tower_lsp::lsp_types::{SemanticToken, SemanticTokenType};

/// Legend order advertised in the server capabilities.
pub const LEGEND: &[&str] = &[
    "datetime",
    "number",
    "boolean",
    "identifier",
    "punctuator",
    "operator",
    "comment",
    "string",
    "unknown",
];

/// The legend as LSP token types.
pub fn legend_types() -> Vec<SemanticTokenType> {
    LEGEND
        .iter()
        .map(|&name| SemanticTokenType::new(name))
        .collect()
}

fn type_index(category: TokenCategory) -> u32 {
    LEGEND
        .iter()
        .position(|name| *name == category.as_str())
        .unwrap_or(LEGEND.len() - 1) as u32
}

/// Delta-encodes the token stream.
pub fn encode(tokens: &TokenList) -> Vec<SemanticToken> {
    let mut data = Vec::with_capacity(tokens.len());
    let mut prev_line = 0i64;
    let mut prev_char = 0i64;

    for token in tokens.iter() {
        let line = token.region.start.line;
        let character = token.region.start.column;
        let delta_line = line - prev_line;
        let delta_start = if delta_line == 0 {
            character - prev_char
        } else {
            character
        };

        data.push(SemanticToken {
            delta_line: delta_line.max(0) as u32,
            delta_start: delta_start.max(0) as u32,
            length: token.text.chars().count() as u32,
            token_type: type_index(token.category),
            token_modifiers_bitset: 0,
        });

        prev_line = line;
        prev_char = character;
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use tomlet_core::lex;

    #[test]
    fn test_first_tuple_is_absolute() {
        let lexed = lex::lex("a = 1\n b = 2\n", true);
        let data = encode(&lexed.tokens);
        // Identifier `a`, length 1, type index 3 (identifier).
        assert_eq!(data[0].delta_line, 0);
        assert_eq!(data[0].delta_start, 0);
        assert_eq!(data[0].length, 1);
        assert_eq!(data[0].token_type, 3);
        assert_eq!(data[0].token_modifiers_bitset, 0);
    }

    #[test]
    fn test_deltas_relative_to_previous_token() {
        let lexed = lex::lex("a = 1\n b = 2\n", true);
        let data = encode(&lexed.tokens);
        // `=` at column 2, relative to `a` at column 0.
        assert_eq!(data[1].delta_line, 0);
        assert_eq!(data[1].delta_start, 2);
        // `b` on the next line at column 1.
        assert_eq!(data[3].delta_line, 1);
        assert_eq!(data[3].delta_start, 1);
    }

    #[test]
    fn test_type_indices_follow_legend() {
        let lexed = lex::lex("d = 1979-05-27\ns = \"x\"\n# c\n", true);
        let data = encode(&lexed.tokens);
        let lexed_cats: Vec<u32> = data.iter().map(|t| t.token_type).collect();
        // identifier, operator, datetime, identifier, operator, string, comment
        assert_eq!(lexed_cats, vec![3, 5, 0, 3, 5, 7, 6]);
    }

    #[test]
    fn test_legend_order() {
        assert_eq!(LEGEND[0], "datetime");
        assert_eq!(LEGEND[3], "identifier");
        assert_eq!(LEGEND[8], "unknown");
        assert_eq!(legend_types().len(), 9);
    }
}
