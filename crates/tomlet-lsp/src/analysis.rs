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

//! Per-request document analysis.
//!
//! Every feature request lexes and parses the cached document text from
//! scratch; the analysis (tokens, tree, cross-reference map, diagnostics)
//! is scoped to the request and dropped at its end. Only raw text is
//! cached between requests.

use std::collections::HashMap;
use tomlet_core::diagnostics::DiagnosticList;
use tomlet_core::doctree::{DocTree, NodeId};
use tomlet_core::position::Position as CorePosition;
use tomlet_core::token::TokenList;
use tomlet_core::{lex, parser, Region};
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, Position, Range};

/// Tokens, tree, cross-references, and diagnostics for one document.
pub struct DocumentAnalysis {
    pub tokens: TokenList,
    pub tree: DocTree,
    pub key_map: HashMap<usize, NodeId>,
    pub errors: DiagnosticList,
    pub warnings: DiagnosticList,
}

impl DocumentAnalysis {
    /// Runs the lexer and parser over `text`.
    pub fn analyze(text: &str, multiline_tokens: bool) -> Self {
        let lexed = lex::lex(text, multiline_tokens);
        let mut tokens = lexed.tokens;
        let parsed = parser::parse(&mut tokens);

        let mut errors = lexed.errors;
        errors.extend(parsed.errors);
        let mut warnings = lexed.warnings;
        warnings.extend(parsed.warnings);

        Self {
            tokens,
            tree: parsed.tree,
            key_map: parsed.key_map,
            errors,
            warnings,
        }
    }

    /// Index of the token whose region contains `pos` and that resolves a
    /// key in the cross-reference map.
    pub fn mapped_token_at(&self, pos: CorePosition) -> Option<usize> {
        self.tokens
            .iter()
            .enumerate()
            .find(|(index, token)| {
                token.region.contains_position(pos) && self.key_map.contains_key(index)
            })
            .map(|(index, _)| index)
    }

    /// Index of any token whose region contains `pos`.
    pub fn token_at(&self, pos: CorePosition) -> Option<usize> {
        self.tokens
            .iter()
            .enumerate()
            .find(|(_, token)| token.region.contains_position(pos))
            .map(|(index, _)| index)
    }

    /// LSP diagnostics: own errors/warnings plus any extra lists (the
    /// validator output), severity 1 for errors and 2 for warnings.
    pub fn lsp_diagnostics(
        &self,
        extra_errors: &DiagnosticList,
        extra_warnings: &DiagnosticList,
    ) -> Vec<Diagnostic> {
        let mut items = Vec::new();
        for diag in self.errors.iter().chain(extra_errors.iter()) {
            items.push(to_lsp_diagnostic(diag, DiagnosticSeverity::ERROR));
        }
        for diag in self.warnings.iter().chain(extra_warnings.iter()) {
            items.push(to_lsp_diagnostic(diag, DiagnosticSeverity::WARNING));
        }
        items
    }
}

fn to_lsp_diagnostic(
    diag: &tomlet_core::Diagnostic,
    severity: DiagnosticSeverity,
) -> Diagnostic {
    Diagnostic {
        range: region_to_range(diag.region),
        severity: Some(severity),
        message: diag.message.clone(),
        ..Diagnostic::default()
    }
}

/// Converts a core region (inclusive, zero-based) to an LSP range.
pub fn region_to_range(region: Region) -> Range {
    Range {
        start: Position::new(
            region.start.line.max(0) as u32,
            region.start.column.max(0) as u32,
        ),
        end: Position::new(
            region.end.line.max(0) as u32,
            region.end.column.max(0) as u32,
        ),
    }
}

/// Converts an LSP position to a core position.
pub fn position_from_lsp(pos: Position) -> CorePosition {
    CorePosition::new(pos.line as i64, pos.character as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_produces_tree_and_map() {
        let analysis = DocumentAnalysis::analyze("x = 1\n[a]\ny = 2\n", true);
        assert!(analysis.errors.is_empty());
        assert!(analysis
            .tree
            .find_key(analysis.tree.root(), "x")
            .is_some());
        assert!(analysis.mapped_token_at(CorePosition::new(0, 0)).is_some());
    }

    #[test]
    fn test_mapped_token_requires_cross_reference() {
        let analysis = DocumentAnalysis::analyze("x = 1\n", true);
        // Position inside the `1` token: contained, but not a key.
        assert!(analysis.token_at(CorePosition::new(0, 4)).is_some());
        assert!(analysis.mapped_token_at(CorePosition::new(0, 4)).is_none());
    }

    #[test]
    fn test_diagnostics_carry_severity() {
        let analysis = DocumentAnalysis::analyze("x = 1\nx = 2\n", true);
        let diags = analysis.lsp_diagnostics(&Vec::new(), &Vec::new());
        assert!(diags
            .iter()
            .any(|d| d.severity == Some(DiagnosticSeverity::ERROR)));
    }
}
