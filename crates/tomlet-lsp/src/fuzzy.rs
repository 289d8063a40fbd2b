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

//! Character-subset completion matching.
//!
//! A candidate key matches the typed input when the characters it shares
//! with the input (each input character usable once) form a subsequence
//! of the input. This is deliberately looser than prefix matching, so
//! `prt` still offers `port`.

/// Filters `pairs` to the candidates matching `input`.
pub fn find_pairs<V: Clone>(pairs: &[(String, V)], input: &str) -> Vec<(String, V)> {
    let mut result = Vec::new();
    for (key, value) in pairs {
        let mut available: Vec<char> = input.chars().collect();
        let mut common = Vec::new();
        for ch in key.chars() {
            if let Some(index) = available.iter().position(|&c| c == ch) {
                common.push(ch);
                available.remove(index);
            }
        }
        if common.is_empty() {
            continue;
        }
        // `common` must appear in `input` in order.
        let mut cursor = 0;
        let mut is_subsequence = true;
        for ch in common {
            match input[cursor..].find(ch) {
                Some(offset) => cursor += offset + ch.len_utf8(),
                None => {
                    is_subsequence = false;
                    break;
                }
            }
        }
        if is_subsequence {
            result.push((key.clone(), value.clone()));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(pairs: Vec<(String, ())>) -> Vec<String> {
        pairs.into_iter().map(|(k, _)| k).collect()
    }

    fn pairs(names: &[&str]) -> Vec<(String, ())> {
        names.iter().map(|n| (n.to_string(), ())).collect()
    }

    #[test]
    fn test_subset_match() {
        let candidates = pairs(&["port", "host", "path"]);
        let matched = keys(find_pairs(&candidates, "prt"));
        assert!(matched.contains(&"port".to_string()));
        assert!(!matched.contains(&"host".to_string()));
    }

    #[test]
    fn test_order_matters() {
        let candidates = pairs(&["abc"]);
        // Shared characters must follow the input's order.
        assert_eq!(keys(find_pairs(&candidates, "ab")).len(), 1);
        assert_eq!(keys(find_pairs(&candidates, "cab")).len(), 0);
    }

    #[test]
    fn test_no_shared_characters() {
        let candidates = pairs(&["xyz"]);
        assert!(find_pairs(&candidates, "abc").is_empty());
    }

    #[test]
    fn test_each_input_char_used_once() {
        let candidates = pairs(&["aa"]);
        let matched = keys(find_pairs(&candidates, "a"));
        // Only one `a` available in the input; still a match on the
        // single shared character.
        assert_eq!(matched.len(), 1);
    }
}
