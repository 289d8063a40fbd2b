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

//! The config schema language (CSL) front end.
//!
//! CSL declares typed key sets that constrain TOML documents:
//!
//! ```text
//! config Server {
//!     name: string;
//!     port: number @min(1) @max(65535);
//!     debug?: boolean;
//!     *: string;
//!     constraints {
//!         requires debug => exists(name);
//!     }
//! }
//! ```
//!
//! The pipeline is `source text → [`lex::lex`] → [`parser::parse`] →
//! [`ir::ConfigSchema`]`, sharing the token and diagnostic model with
//! `tomlet-core`.

pub mod ir;
pub mod lex;
pub mod ops;
pub mod parser;

pub use ir::{
    Annotation, ConfigSchema, Constraint, CslType, Expr, FunctionArgValue, KeyDefinition,
    Primitive, TableType,
};

/// Lexes and parses CSL source in one step.
pub fn parse_schemas(source: &str) -> parser::ParseOutput {
    let lexed = lex::lex(source, true);
    let mut output = parser::parse(&lexed.tokens);
    output.errors.splice(0..0, lexed.errors);
    output.warnings.splice(0..0, lexed.warnings);
    output
}
