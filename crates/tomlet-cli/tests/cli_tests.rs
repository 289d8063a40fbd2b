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

//! Integration tests for the `toml` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::TempDir;

fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write fixture");
    path
}

// ==================== --parse ====================

#[test]
fn test_parse_clean_document() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "ok.toml", "x = 1\n[a]\ny = \"hi\"\n");

    Command::cargo_bin("toml")
        .unwrap()
        .arg("--parse")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("JSON:"))
        .stdout(predicate::str::contains("\"x\": 1"));
}

#[test]
fn test_parse_with_errors_exits_one() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "bad.toml", "[a]\n[a]\n");

    Command::cargo_bin("toml")
        .unwrap()
        .arg("--parse")
        .arg(&input)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Table a is already defined."));
}

#[test]
fn test_parse_warning_exits_one() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "warn.toml", "x = 1_2_3\n");

    Command::cargo_bin("toml")
        .unwrap()
        .arg("--parse")
        .arg(&input)
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Number literal is not grouped reasonably.",
        ));
}

#[test]
fn test_parse_missing_file_exits_one() {
    Command::cargo_bin("toml")
        .unwrap()
        .args(["--parse", "/nonexistent/path.toml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unable to open"));
}

#[test]
fn test_parse_output_file() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "in.toml", "x = 1\n");
    let output = dir.path().join("out.json");

    Command::cargo_bin("toml")
        .unwrap()
        .arg("--parse")
        .arg(&input)
        .arg(format!("--output={}", output.display()))
        .assert()
        .success();

    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.contains("\"x\": 1"));
}

// ==================== --validate ====================

#[test]
fn test_validate_passing_schema() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "in.toml", "name = \"api\"\nport = 8080\n");
    let schema = write_file(
        &dir,
        "schema.csl",
        "config S {\n  name: string;\n  port: number @min(1) @max(65535);\n}\n",
    );

    Command::cargo_bin("toml")
        .unwrap()
        .arg("--parse")
        .arg(&input)
        .arg("--validate")
        .arg(&schema)
        .assert()
        .success();
}

#[test]
fn test_validate_failing_schema() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "in.toml", "name = \"a\"\nport = 70000\n");
    let schema = write_file(
        &dir,
        "schema.csl",
        "config S {\n  name: string;\n  port: number @min(1) @max(65535);\n}\n",
    );

    Command::cargo_bin("toml")
        .unwrap()
        .arg("--parse")
        .arg(&input)
        .arg("--validate")
        .arg(&schema)
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Failed to validate key against annotation 'max'.",
        ));
}

#[test]
fn test_validate_with_schema_name() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "in.toml", "x = 1\n");
    let schema = write_file(
        &dir,
        "schema.csl",
        "config A { x: number; }\nconfig B { y: number; }\n",
    );

    Command::cargo_bin("toml")
        .unwrap()
        .arg("--parse")
        .arg(&input)
        .arg("--validate")
        .arg(&schema)
        .args(["--schema", "A"])
        .assert()
        .success();

    Command::cargo_bin("toml")
        .unwrap()
        .arg("--parse")
        .arg(&input)
        .arg("--validate")
        .arg(&schema)
        .args(["--schema", "B"])
        .assert()
        .code(1);
}

// ==================== argument handling ====================

#[test]
fn test_bad_arguments_exit_two() {
    Command::cargo_bin("toml")
        .unwrap()
        .args(["--validate", "x.csl"])
        .assert()
        .code(2);

    Command::cargo_bin("toml")
        .unwrap()
        .args(["--parse", "a.toml", "--langsvr"])
        .assert()
        .code(2);
}

#[test]
fn test_help() {
    Command::cargo_bin("toml")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--parse"))
        .stdout(predicate::str::contains("--langsvr"));
}

// ==================== --langsvr ====================

/// Frames a JSON-RPC body for the wire.
fn frame(body: &str) -> Vec<u8> {
    format!("Content-Length: {}\r\n\r\n{}", body.len(), body).into_bytes()
}

#[test]
fn test_langsvr_stdio_lifecycle() {
    let binary = assert_cmd::cargo::cargo_bin("toml");
    let mut child = std::process::Command::new(binary)
        .args(["--langsvr", "--stdio"])
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::null())
        .spawn()
        .expect("spawn language server");

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        stdin
            .write_all(&frame(
                r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"capabilities":{}}}"#,
            ))
            .unwrap();
        stdin
            .write_all(&frame(r#"{"jsonrpc":"2.0","method":"initialized","params":{}}"#))
            .unwrap();
        stdin
            .write_all(&frame(r#"{"jsonrpc":"2.0","id":2,"method":"shutdown","params":null}"#))
            .unwrap();
        stdin
            .write_all(&frame(r#"{"jsonrpc":"2.0","method":"exit","params":null}"#))
            .unwrap();
        stdin.flush().unwrap();
    }

    let output = child.wait_with_output().expect("server exit");
    // Shutdown preceded exit: code 0.
    assert!(output.status.success(), "status: {:?}", output.status);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("capabilities"), "stdout: {stdout}");
    assert!(stdout.contains("semanticTokensProvider"), "stdout: {stdout}");
}

#[test]
fn test_langsvr_exit_without_shutdown_is_abnormal() {
    let binary = assert_cmd::cargo::cargo_bin("toml");
    let mut child = std::process::Command::new(binary)
        .args(["--langsvr", "--stdio"])
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::null())
        .spawn()
        .expect("spawn language server");

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        stdin
            .write_all(&frame(
                r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"capabilities":{}}}"#,
            ))
            .unwrap();
        stdin
            .write_all(&frame(r#"{"jsonrpc":"2.0","method":"initialized","params":{}}"#))
            .unwrap();
        stdin
            .write_all(&frame(r#"{"jsonrpc":"2.0","method":"exit","params":null}"#))
            .unwrap();
        stdin.flush().unwrap();
    }

    let output = child.wait_with_output().expect("server exit");
    assert_eq!(output.status.code(), Some(1));
}
