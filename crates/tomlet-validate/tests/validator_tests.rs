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

//! End-to-end validator tests: TOML source + CSL source → diagnostics.

use tomlet_core::{lex, parser, DiagnosticList, DocTree};
use tomlet_validate::validate;

fn run(schema_source: &str, toml_source: &str) -> (DiagnosticList, DiagnosticList, DocTree) {
    let schemas = tomlet_csl::parse_schemas(schema_source);
    assert!(
        schemas.errors.is_empty(),
        "schema errors: {:?}",
        schemas.errors
    );
    let mut lexed = lex::lex(toml_source, true);
    assert!(lexed.errors.is_empty(), "lex errors: {:?}", lexed.errors);
    let parsed = parser::parse(&mut lexed.tokens);
    assert!(parsed.errors.is_empty(), "parse errors: {:?}", parsed.errors);
    let (errors, warnings) = validate("", &schemas.schemas, &parsed.tree);
    (errors, warnings, parsed.tree)
}

fn messages(list: &DiagnosticList) -> Vec<&str> {
    list.iter().map(|d| d.message.as_str()).collect()
}

// ==================== type checking ====================

#[test]
fn test_valid_document_passes() {
    let (errors, warnings, _) = run(
        "config S {\n  name: string;\n  port: number;\n}\n",
        "name = \"api\"\nport = 8080\n",
    );
    assert!(errors.is_empty(), "errors: {errors:?}");
    assert!(warnings.is_empty(), "warnings: {warnings:?}");
}

#[test]
fn test_type_mismatch() {
    let (errors, _, _) = run("config S {\n  port: number;\n}\n", "port = \"eighty\"\n");
    assert!(messages(&errors).contains(&"Expected numeric value"));
}

#[test]
fn test_missing_required_key() {
    let (errors, _, _) = run(
        "config S {\n  name: string;\n  port: number;\n}\n",
        "name = \"api\"\n",
    );
    assert!(messages(&errors).contains(&"Missing required key: S.port"));
}

#[test]
fn test_optional_key_absent_is_fine() {
    let (errors, _, _) = run("config S {\n  debug?: boolean;\n}\n", "");
    assert!(errors.is_empty(), "errors: {errors:?}");
}

#[test]
fn test_annotation_bounds_failure() {
    // Scenario from the toolchain test plan: port beyond @max.
    let (errors, _, tree) = run(
        "config S {\n  name: string;\n  port: number @min(1) @max(65535);\n}\n",
        "name = \"a\"\nport = 70000\n",
    );
    let failure = errors
        .iter()
        .find(|e| e.message == "Failed to validate key against annotation 'max'.")
        .expect("bound failure reported");
    // Anchored to the value region of `port`.
    let port_key = tree.find_key(tree.root(), "port").unwrap();
    assert_eq!(failure.region, tree.def_region(port_key));
}

#[test]
fn test_allowed_literal_values() {
    let schema = "config S {\n  level: \"low\" | \"high\";\n}\n";
    let (errors, _, _) = run(schema, "level = \"low\"\n");
    assert!(errors.is_empty(), "errors: {errors:?}");

    let (errors, _, _) = run(schema, "level = \"medium\"\n");
    assert!(messages(&errors)
        .iter()
        .any(|m| m.contains("doesn't match any union member type")
            || m.contains("not in allowed values")));
}

#[test]
fn test_integer_literal_allowed_value_coerces() {
    // 0x50 and 80 coerce to the same number.
    let (errors, _, _) = run("config S {\n  port: 80;\n}\n", "port = 0x50\n");
    assert!(errors.is_empty(), "errors: {errors:?}");
}

#[test]
fn test_array_elements_checked_with_index_paths() {
    let (errors, _, _) = run(
        "config S {\n  ports: number[];\n}\n",
        "ports = [1, \"two\", 3]\n",
    );
    assert!(errors
        .iter()
        .any(|e| e.message.contains("S.ports[1]") || e.message == "Expected numeric value"));
}

#[test]
fn test_nested_table() {
    let (errors, _, _) = run(
        "config S {\n  server: {\n    host: string;\n  };\n}\n",
        "[server]\nhost = \"h\"\n",
    );
    assert!(errors.is_empty(), "errors: {errors:?}");
}

#[test]
fn test_union_accepts_first_match_without_noise() {
    let (errors, warnings, _) = run(
        "config S {\n  id: string | number;\n}\n",
        "id = 42\n",
    );
    assert!(errors.is_empty(), "errors: {errors:?}");
    assert!(warnings.is_empty());
}

#[test]
fn test_any_table_shape_check() {
    let schema = "config S {\n  extra: any{};\n}\n";
    let (errors, _, _) = run(schema, "[extra]\nanything = 1\n");
    assert!(errors.is_empty(), "errors: {errors:?}");

    let (errors, _, _) = run(schema, "extra = 1\n");
    assert!(messages(&errors).contains(&"Expected S.extra as an any table"));
}

// ==================== wildcard ====================

#[test]
fn test_wildcard_matches_undeclared_keys() {
    let (errors, warnings, _) = run(
        "config S {\n  name: string;\n  *: number;\n}\n",
        "name = \"x\"\nretries = 3\n",
    );
    assert!(errors.is_empty(), "errors: {errors:?}");
    assert!(warnings.is_empty());
}

#[test]
fn test_wildcard_type_mismatch() {
    let (errors, _, _) = run(
        "config S {\n  *: number;\n}\n",
        "name = \"x\"\n",
    );
    assert!(messages(&errors)
        .contains(&"Key 'S.name' failed to match the type of the wildcard key"));
}

#[test]
fn test_unknown_key_warns_without_wildcard() {
    let (errors, warnings, _) = run(
        "config S {\n  name: string;\n}\n",
        "name = \"x\"\nstray = 1\n",
    );
    assert!(errors.is_empty(), "errors: {errors:?}");
    assert!(messages(&warnings).contains(&"Key S.stray is not in the schema"));
}

// ==================== constraints ====================

#[test]
fn test_conflict_constraint() {
    let schema = "config S {\n  a?: number;\n  b?: number;\n  constraints {\n    conflicts a with b;\n  }\n}\n";
    let (errors, _, _) = run(schema, "a = 1\n");
    assert!(errors.is_empty(), "errors: {errors:?}");

    let (errors, _, _) = run(schema, "a = 1\nb = 2\n");
    let conflicts: Vec<&str> = messages(&errors)
        .into_iter()
        .filter(|m| *m == "Conflicting keys: a and b")
        .collect();
    // Reported at both offending keys.
    assert_eq!(conflicts.len(), 2);
}

#[test]
fn test_dependency_constraint() {
    let schema = "config S {\n  tls?: boolean;\n  cert?: string;\n  constraints {\n    requires tls => exists(cert);\n  }\n}\n";
    let (errors, _, _) = run(schema, "tls = true\ncert = \"/etc/cert\"\n");
    assert!(errors.is_empty(), "errors: {errors:?}");

    let (errors, _, _) = run(schema, "tls = true\n");
    assert!(messages(&errors).contains(&"Dependency failed: tls requires exists(cert)"));
}

#[test]
fn test_validate_constraint_expression() {
    let schema = "config S {\n  lo: number;\n  hi: number;\n  constraints {\n    validate lo < hi;\n  }\n}\n";
    let (errors, _, _) = run(schema, "lo = 1\nhi = 2\n");
    assert!(errors.is_empty(), "errors: {errors:?}");

    let (errors, _, _) = run(schema, "lo = 5\nhi = 2\n");
    assert!(messages(&errors).contains(&"Validation failed: lo<hi"));
}

#[test]
fn test_validate_arithmetic() {
    let schema = "config S {\n  workers: number;\n  constraints {\n    validate workers * 2 <= 32;\n  }\n}\n";
    let (errors, _, _) = run(schema, "workers = 4\n");
    assert!(errors.is_empty(), "errors: {errors:?}");

    let (errors, _, _) = run(schema, "workers = 64\n");
    assert!(!errors.is_empty());
}

#[test]
fn test_count_keys_function() {
    let schema = "config S {\n  limits: any{};\n  constraints {\n    validate count_keys(limits) >= 1;\n  }\n}\n";
    let (errors, _, _) = run(schema, "[limits]\ncpu = 1\n");
    assert!(errors.is_empty(), "errors: {errors:?}");

    let (errors, _, _) = run(schema, "[limits]\n");
    assert!(!errors.is_empty());
}

#[test]
fn test_exists_dotted_path() {
    let schema = "config S {\n  server: {\n    host: string;\n  };\n  constraints {\n    validate exists(server.host);\n  }\n}\n";
    let (errors, _, _) = run(schema, "[server]\nhost = \"h\"\n");
    assert!(errors.is_empty(), "errors: {errors:?}");
}

#[test]
fn test_subset_function() {
    let schema = "config S {\n  enabled: any[];\n  known: any[];\n  constraints {\n    validate subset(enabled, known);\n  }\n}\n";
    let (errors, _, _) = run(schema, "enabled = [1, 2]\nknown = [1, 2, 3]\n");
    assert!(errors.is_empty(), "errors: {errors:?}");

    let (errors, _, _) = run(schema, "enabled = [9]\nknown = [1, 2, 3]\n");
    assert!(messages(&errors)
        .iter()
        .any(|m| m.starts_with("Validation failed: subset")));
}

#[test]
fn test_subset_with_property_list() {
    let schema = "config S {\n  wanted: any[];\n  catalog: any[];\n  constraints {\n    validate subset(wanted, catalog, [\"id\"]);\n  }\n}\n";
    let doc = "wanted = [{ id = 1, note = \"x\" }]\ncatalog = [{ id = 1 }, { id = 2 }]\n";
    let (errors, _, _) = run(schema, doc);
    assert!(errors.is_empty(), "errors: {errors:?}");

    let doc = "wanted = [{ id = 9 }]\ncatalog = [{ id = 1 }]\n";
    let (errors, _, _) = run(schema, doc);
    assert!(!errors.is_empty());
}

// ==================== annotations ====================

#[test]
fn test_deprecated_warns_never_fails() {
    let (errors, warnings, _) = run(
        "config S {\n  old: string @deprecated(\"use new_name\");\n}\n",
        "old = \"v\"\n",
    );
    assert!(errors.is_empty(), "errors: {errors:?}");
    assert!(messages(&warnings).contains(&"use new_name"));
}

#[test]
fn test_unknown_annotation_is_error() {
    let (errors, _, _) = run(
        "config S {\n  x: number @sparkles(1);\n}\n",
        "x = 1\n",
    );
    assert!(messages(&errors).contains(&"Unknown annotation: sparkles"));
}

#[test]
fn test_regex_annotation() {
    let schema = "config S {\n  code: string @regex(\"^[A-Z]{3}$\");\n}\n";
    let (errors, _, _) = run(schema, "code = \"ABC\"\n");
    assert!(errors.is_empty(), "errors: {errors:?}");

    let (errors, _, _) = run(schema, "code = \"abc\"\n");
    assert!(messages(&errors)
        .contains(&"Failed to validate key against annotation 'regex'."));
}

#[test]
fn test_format_annotation() {
    let schema = "config S {\n  contact: string @format(email);\n}\n";
    let (errors, _, _) = run(schema, "contact = \"ops@example.com\"\n");
    assert!(errors.is_empty(), "errors: {errors:?}");

    let (errors, _, _) = run(schema, "contact = \"nope\"\n");
    assert!(messages(&errors)
        .contains(&"Failed to validate key against annotation 'format'."));
}

#[test]
fn test_string_length_annotations() {
    let schema = "config S {\n  id: string @min_length(3) @max_length(5);\n}\n";
    let (errors, _, _) = run(schema, "id = \"abcd\"\n");
    assert!(errors.is_empty(), "errors: {errors:?}");

    let (errors, _, _) = run(schema, "id = \"ab\"\n");
    assert!(messages(&errors)
        .contains(&"Failed to validate key against annotation 'min_length'."));
}

// ==================== schema selection ====================

#[test]
fn test_missing_schema_name() {
    let schemas = tomlet_csl::parse_schemas("config A { x: number; }\nconfig B { y: number; }\n");
    let mut lexed = lex::lex("x = 1\n", true);
    let parsed = parser::parse(&mut lexed.tokens);
    let (errors, _) = validate("C", &schemas.schemas, &parsed.tree);
    assert!(messages(&errors).contains(&"Cannot find config schema C"));
}

#[test]
fn test_named_schema_selected() {
    let schemas = tomlet_csl::parse_schemas("config A { x: number; }\nconfig B { y: number; }\n");
    let mut lexed = lex::lex("x = 1\n", true);
    let parsed = parser::parse(&mut lexed.tokens);
    let (errors, _) = validate("A", &schemas.schemas, &parsed.tree);
    assert!(errors.is_empty(), "errors: {errors:?}");
    let (errors, _) = validate("B", &schemas.schemas, &parsed.tree);
    assert!(!errors.is_empty());
}
