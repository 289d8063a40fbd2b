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

//! Document tree to JSON.
//!
//! Two modes:
//!
//! - **untagged**: canonical JSON values (strings decoded, integers as
//!   numbers when they fit `i64`, non-finite floats as null);
//! - **tagged**: each scalar becomes `{"type": <tag>, "value": <string>}`
//!   with tags `string`, `integer`, `float`, `bool`, `datetime`,
//!   `datetime-local`, `date-local`, `time-local`. Integers are
//!   normalized to decimal strings.

use serde_json::{Map, Number, Value as JsonValue};
use tomlet_core::doctree::{DocNode, DocTree, NodeId};
use tomlet_core::strings::{clean_numeric_literal, convert_to_decimal_string, extract_string_content};
use tomlet_core::types::{DateTimeKind, SpecialKind, TypeTag};
use tomlet_core::{Error, Result};

/// Converts the tree rooted at `tree.root()` to a JSON value.
pub fn to_json(tree: &DocTree, tagged: bool) -> Result<JsonValue> {
    node_to_json(tree, tree.root(), tagged)
}

/// Converts the tree to a pretty-printed JSON string.
pub fn to_json_string(tree: &DocTree, tagged: bool) -> Result<String> {
    let value = to_json(tree, tagged)?;
    serde_json::to_string_pretty(&value)
        .map_err(|err| Error::InvalidString(err.to_string()))
}

fn node_to_json(tree: &DocTree, node: NodeId, tagged: bool) -> Result<JsonValue> {
    match tree.node(node) {
        DocNode::Value(value) => scalar_to_json(value.tag, &value.text, tagged),
        DocNode::Array(array) => {
            let mut items = Vec::with_capacity(array.elems.len());
            for elem in &array.elems {
                items.push(node_to_json(tree, *elem, tagged)?);
            }
            Ok(JsonValue::Array(items))
        }
        DocNode::Table(table) => {
            let mut map = Map::with_capacity(table.elems.len());
            for (id, key) in &table.elems {
                let value = match tree.as_key(*key).and_then(|k| k.value) {
                    Some(value) => node_to_json(tree, value, tagged)?,
                    None => JsonValue::Null,
                };
                map.insert(id.clone(), value);
            }
            Ok(JsonValue::Object(map))
        }
        DocNode::Key(key) => {
            let mut map = Map::with_capacity(1);
            let value = match key.value {
                Some(value) => node_to_json(tree, value, tagged)?,
                None => JsonValue::Null,
            };
            map.insert(key.id.clone(), value);
            Ok(JsonValue::Object(map))
        }
    }
}

fn tagged_scalar(tag: &str, value: impl Into<String>) -> JsonValue {
    let mut map = Map::with_capacity(2);
    map.insert("type".to_string(), JsonValue::String(tag.to_string()));
    map.insert("value".to_string(), JsonValue::String(value.into()));
    JsonValue::Object(map)
}

fn scalar_to_json(tag: TypeTag, text: &str, tagged: bool) -> Result<JsonValue> {
    match tag {
        TypeTag::String(kind) => {
            let content = extract_string_content(text, kind)?;
            if tagged {
                Ok(tagged_scalar("string", content))
            } else {
                Ok(JsonValue::String(content))
            }
        }
        TypeTag::Integer => {
            let cleaned = clean_numeric_literal(text);
            let decimal = convert_to_decimal_string(&cleaned)?;
            if tagged {
                Ok(tagged_scalar("integer", decimal))
            } else {
                // Canonical JSON number when it fits; decimal string
                // otherwise.
                match decimal.parse::<i64>() {
                    Ok(value) => Ok(JsonValue::Number(Number::from(value))),
                    Err(_) => Ok(JsonValue::String(decimal)),
                }
            }
        }
        TypeTag::Float => {
            let cleaned = clean_numeric_literal(text);
            if tagged {
                Ok(tagged_scalar("float", cleaned))
            } else {
                let value: f64 = cleaned
                    .parse()
                    .map_err(|_| Error::InvalidNumber(text.to_string()))?;
                Ok(Number::from_f64(value)
                    .map(JsonValue::Number)
                    .unwrap_or(JsonValue::Null))
            }
        }
        TypeTag::Boolean => {
            if tagged {
                Ok(tagged_scalar("bool", text))
            } else {
                Ok(JsonValue::Bool(text == "true"))
            }
        }
        TypeTag::DateTime(kind) => {
            let tag_name = match kind {
                DateTimeKind::OffsetDateTime => "datetime",
                DateTimeKind::LocalDateTime => "datetime-local",
                DateTimeKind::LocalDate => "date-local",
                DateTimeKind::LocalTime => "time-local",
            };
            if tagged {
                Ok(tagged_scalar(tag_name, text))
            } else {
                Ok(JsonValue::String(text.to_string()))
            }
        }
        TypeTag::SpecialNumber(kind) => {
            if tagged {
                let value = if kind == SpecialKind::NaN { "nan" } else { text };
                Ok(tagged_scalar("float", value))
            } else {
                let value = match (kind, text.starts_with('-')) {
                    (SpecialKind::NaN, false) => f64::NAN,
                    (SpecialKind::NaN, true) => -f64::NAN,
                    (SpecialKind::Infinity, false) => f64::INFINITY,
                    (SpecialKind::Infinity, true) => f64::NEG_INFINITY,
                };
                // Non-finite doubles have no JSON representation.
                Ok(Number::from_f64(value)
                    .map(JsonValue::Number)
                    .unwrap_or(JsonValue::Null))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tomlet_core::{lex, parser};

    fn convert(input: &str, tagged: bool) -> JsonValue {
        let mut lexed = lex::lex(input, true);
        assert!(lexed.errors.is_empty(), "lex errors: {:?}", lexed.errors);
        let parsed = parser::parse(&mut lexed.tokens);
        assert!(parsed.errors.is_empty(), "parse errors: {:?}", parsed.errors);
        to_json(&parsed.tree, tagged).expect("conversion")
    }

    // ==================== tagged mode ====================

    #[test]
    fn test_basic_parse_tagged() {
        let value = convert("x = 1\n[a]\ny = \"hi\"\n", true);
        assert_eq!(
            value,
            json!({
                "x": {"type": "integer", "value": "1"},
                "a": {"y": {"type": "string", "value": "hi"}}
            })
        );
    }

    #[test]
    fn test_tagged_integers_normalize_to_decimal() {
        let value = convert("a = 0xff\nb = 0o17\nc = 0b101\nd = +1_000\n", true);
        assert_eq!(value["a"]["value"], "255");
        assert_eq!(value["b"]["value"], "15");
        assert_eq!(value["c"]["value"], "5");
        assert_eq!(value["d"]["value"], "1000");
    }

    #[test]
    fn test_tagged_datetime_kinds() {
        let value = convert(
            "a = 1979-05-27T07:32:00Z\nb = 1979-05-27T07:32:00\nc = 1979-05-27\nd = 07:32:00\n",
            true,
        );
        assert_eq!(value["a"]["type"], "datetime");
        assert_eq!(value["b"]["type"], "datetime-local");
        assert_eq!(value["c"]["type"], "date-local");
        assert_eq!(value["d"]["type"], "time-local");
    }

    #[test]
    fn test_tagged_specials() {
        let value = convert("a = nan\nb = -nan\nc = inf\nd = -inf\n", true);
        assert_eq!(value["a"], json!({"type": "float", "value": "nan"}));
        assert_eq!(value["b"], json!({"type": "float", "value": "nan"}));
        assert_eq!(value["c"], json!({"type": "float", "value": "inf"}));
        assert_eq!(value["d"], json!({"type": "float", "value": "-inf"}));
    }

    #[test]
    fn test_tagged_bool() {
        let value = convert("on = true\n", true);
        assert_eq!(value["on"], json!({"type": "bool", "value": "true"}));
    }

    // ==================== untagged mode ====================

    #[test]
    fn test_untagged_values() {
        let value = convert("i = 42\nf = 2.5\nb = false\ns = \"txt\"\n", false);
        assert_eq!(value, json!({"i": 42, "f": 2.5, "b": false, "s": "txt"}));
    }

    #[test]
    fn test_untagged_specials_are_null() {
        let value = convert("x = inf\ny = nan\n", false);
        assert_eq!(value["x"], JsonValue::Null);
        assert_eq!(value["y"], JsonValue::Null);
    }

    #[test]
    fn test_untagged_arrays_and_inline_tables() {
        let value = convert("arr = [1, 2]\npoint = { x = 1, y = 2 }\n", false);
        assert_eq!(value, json!({"arr": [1, 2], "point": {"x": 1, "y": 2}}));
    }

    #[test]
    fn test_untagged_array_of_tables() {
        let value = convert("[[srv]]\nh = \"a\"\n[[srv]]\nh = \"b\"\n", false);
        assert_eq!(value, json!({"srv": [{"h": "a"}, {"h": "b"}]}));
    }

    #[test]
    fn test_string_escapes_decoded() {
        let value = convert("s = \"a\\tb\\u00e9\"\n", false);
        assert_eq!(value["s"], "a\tbé");
    }

    #[test]
    fn test_huge_integer_falls_back_to_string() {
        let value = convert("x = 0xffffffffffffffff\n", false);
        assert_eq!(value["x"], "18446744073709551615");
    }
}
