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

//! Property tests for the lexer/parser/formatter pipeline.

use proptest::prelude::*;
use tomlet_core::{format, lex, parser};

fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,6}".prop_filter("booleans are not bare keys", |k| {
        k != "true" && k != "false" && k != "inf" && k != "nan"
    })
}

fn scalar_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (-1_000_000i64..1_000_000).prop_map(|n| n.to_string()),
        "[a-z ]{0,12}".prop_map(|s| format!("\"{s}\"")),
        any::<bool>().prop_map(|b| b.to_string()),
        (0.0f64..1000.0).prop_map(|f| format!("{f:.3}")),
    ]
}

fn document_strategy() -> impl Strategy<Value = String> {
    (
        prop::collection::btree_set(key_strategy(), 1..6),
        prop::collection::vec(scalar_strategy(), 6),
        prop::option::of((key_strategy(), key_strategy())),
    )
        .prop_map(|(keys, values, section)| {
            let mut source = String::new();
            for (key, value) in keys.iter().zip(values.iter()) {
                source.push_str(&format!("{key} = {value}\n"));
            }
            if let Some((table, key)) = section {
                source.push_str(&format!("[section-{table}]\n{key} = 1\n"));
            }
            source
        })
}

fn format_source(input: &str) -> (String, usize) {
    let mut lexed = lex::lex(input, true);
    let parsed = parser::parse(&mut lexed.tokens);
    (
        format::to_toml(&parsed.tree),
        lexed.errors.len() + parsed.errors.len(),
    )
}

proptest! {
    /// Generated documents parse cleanly and formatting is idempotent.
    #[test]
    fn formatting_is_idempotent(source in document_strategy()) {
        let (once, errors) = format_source(&source);
        prop_assert_eq!(errors, 0, "input {:?}", source);
        let (twice, reparse_errors) = format_source(&once);
        prop_assert_eq!(reparse_errors, 0, "formatted {:?}", once);
        prop_assert_eq!(once, twice);
    }

    /// Single-line tokens satisfy `len == col_span - 1`.
    #[test]
    fn token_regions_cover_text(source in document_strategy()) {
        let lexed = lex::lex(&source, true);
        for token in lexed.tokens.iter() {
            if token.region.is_single_line() {
                prop_assert_eq!(
                    token.text.chars().count() as i64,
                    token.region.col_span() - 1
                );
            }
        }
    }
}
