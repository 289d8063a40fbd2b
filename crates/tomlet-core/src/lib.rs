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

//! Core TOML engine: position model, token stream, lexer, parser,
//! document tree, and canonical formatter.
//!
//! The pipeline is `source text → [`lex::lex`] → [`parser::parse`] →
//! [`doctree::DocTree`]`. Both stages accumulate diagnostics instead of
//! failing; the parser additionally emits a token-index→key map that the
//! language server uses for navigation features.
//!
//! # Examples
//!
//! ```
//! use tomlet_core::{lex, parser};
//!
//! let mut lexed = lex::lex("x = 1\n[table]\ny = \"hi\"\n", true);
//! assert!(lexed.errors.is_empty());
//!
//! let parsed = parser::parse(&mut lexed.tokens);
//! assert!(parsed.errors.is_empty());
//! let root = parsed.tree.root();
//! assert!(parsed.tree.find_key(root, "x").is_some());
//! ```

pub mod diagnostics;
pub mod doctree;
pub mod error;
pub mod format;
pub mod lex;
pub mod parser;
pub mod position;
pub mod strings;
pub mod token;
pub mod types;

pub use diagnostics::{Diagnostic, DiagnosticList};
pub use doctree::{DocNode, DocTree, NodeId};
pub use error::{Error, Result};
pub use position::{Position, Region};
pub use token::{Token, TokenCategory, TokenList};
pub use types::{DateTimeKind, SpecialKind, StringKind, TypeTag};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
