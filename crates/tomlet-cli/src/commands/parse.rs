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

//! `toml --parse`: parse (and optionally validate) one document, report
//! diagnostics to stderr grouped by file, and emit JSON.

use crate::error::{CliError, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use tomlet_core::diagnostics::DiagnosticList;
use tomlet_core::{lex, parser};
use tracing::debug;

pub struct ParseArgs<'a> {
    pub input: &'a Path,
    pub validate: Option<&'a Path>,
    pub schema: Option<&'a str>,
    pub output: Option<&'a Path>,
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| CliError::File {
        path: path.display().to_string(),
        source,
    })
}

fn report(stream: &mut dyn Write, label: &str, path: &Path, diagnostics: &DiagnosticList) {
    if diagnostics.is_empty() {
        return;
    }
    let _ = writeln!(stream, "\n{label}s in {}:", path.display());
    for diag in diagnostics {
        let _ = writeln!(
            stream,
            "{label} (line {}, col {}): {}",
            diag.region.start.line, diag.region.start.column, diag.message
        );
    }
}

pub fn run(args: ParseArgs<'_>) -> Result<ExitCode> {
    println!("toml {} - TOML toolchain", env!("CARGO_PKG_VERSION"));

    let source = read_file(args.input)?;

    let mut errors: DiagnosticList = Vec::new();
    let mut warnings: DiagnosticList = Vec::new();

    let lexed = lex::lex(&source, true);
    let mut tokens = lexed.tokens;
    errors.extend(lexed.errors);
    warnings.extend(lexed.warnings);

    let parsed = parser::parse(&mut tokens);
    errors.extend(parsed.errors);
    warnings.extend(parsed.warnings);
    debug!(nodes = parsed.tree.node_count(), "parsed document");

    if let Some(schema_path) = args.validate {
        let schema_source = read_file(schema_path)?;
        // Schemas lex in single-line token mode.
        let schema_lexed = tomlet_csl::lex::lex(&schema_source, false);
        let schemas = tomlet_csl::parser::parse(&schema_lexed.tokens);
        errors.extend(schema_lexed.errors);
        errors.extend(schemas.errors);
        warnings.extend(schema_lexed.warnings);
        warnings.extend(schemas.warnings);
        let (validation_errors, validation_warnings) = tomlet_validate::validate(
            args.schema.unwrap_or(""),
            &schemas.schemas,
            &parsed.tree,
        );
        errors.extend(validation_errors);
        warnings.extend(validation_warnings);
    }

    let mut stderr = std::io::stderr().lock();
    report(&mut stderr, "Error", args.input, &errors);
    report(&mut stderr, "Warning", args.input, &warnings);
    let _ = stderr.flush();

    let json = tomlet_json::to_json_string(&parsed.tree, false)?;
    match args.output {
        Some(path) => {
            fs::write(path, json + "\n").map_err(|source| CliError::File {
                path: path.display().to_string(),
                source,
            })?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            let _ = writeln!(stdout, "\nJSON:\n{json}");
            let _ = stdout.flush();
        }
    }

    if errors.is_empty() && warnings.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
