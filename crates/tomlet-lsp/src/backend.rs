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

//! The language-server backend.
//!
//! One request runs to completion before the next is dispatched; the only
//! state kept between requests is the uri→text document cache, the parsed
//! CSL schemas, and the active schema name. Every feature re-analyzes the
//! document it touches and drops the analysis at the end of the request.

use crate::analysis::{position_from_lsp, region_to_range, DocumentAnalysis};
use crate::edits::compute_edits;
use crate::fuzzy::find_pairs;
use crate::schema_nav::table_type_for;
use crate::semantic;
use dashmap::DashMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tomlet_core::doctree::NodeId;
use tomlet_core::format;
use tomlet_core::position::Position as CorePosition;
use tomlet_core::token::TokenCategory;
use tomlet_csl::ir::{ConfigSchema, KeyDefinition};
use tower_lsp::jsonrpc::{Error as RpcError, Result};
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, info};

/// `configSchemaLanguage/setSchemas` parameters.
#[derive(Debug, Deserialize)]
pub struct SetSchemasParams {
    /// CSL source holding zero or more `config` schemas.
    pub schemas: String,
    /// Optional active schema name.
    pub schema: Option<String>,
}

/// `configSchemaLanguage/setSchema` parameters.
#[derive(Debug, Deserialize)]
pub struct SetSchemaParams {
    pub schema: String,
}

/// The TOML language server.
pub struct TomlLanguageServer {
    client: Client,
    /// uri → raw document text; the only cross-request document state.
    documents: DashMap<Url, String>,
    schemas: RwLock<Vec<Arc<ConfigSchema>>>,
    current_schema: RwLock<String>,
    trace_value: RwLock<String>,
    multiline_tokens: AtomicBool,
    shutdown_received: Arc<AtomicBool>,
}

impl TomlLanguageServer {
    /// Creates a backend. `shutdown_received` is set once `shutdown`
    /// arrives, which drives the process exit code.
    pub fn new(client: Client, shutdown_received: Arc<AtomicBool>) -> Self {
        Self {
            client,
            documents: DashMap::new(),
            schemas: RwLock::new(Vec::new()),
            current_schema: RwLock::new(String::new()),
            trace_value: RwLock::new(String::new()),
            multiline_tokens: AtomicBool::new(true),
            shutdown_received,
        }
    }

    fn document_text(&self, uri: &Url) -> Result<String> {
        self.documents
            .get(uri)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| RpcError {
                code: tower_lsp::jsonrpc::ErrorCode::InternalError,
                message: "Document not found".into(),
                data: None,
            })
    }

    fn analyze(&self, text: &str) -> DocumentAnalysis {
        DocumentAnalysis::analyze(text, self.multiline_tokens.load(Ordering::Relaxed))
    }

    fn active_schema(&self) -> Option<Arc<ConfigSchema>> {
        let schemas = self.schemas.read().ok()?;
        let name = self.current_schema.read().ok()?;
        if name.is_empty() && schemas.len() == 1 {
            return Some(schemas[0].clone());
        }
        schemas.iter().find(|s| s.name == *name).cloned()
    }

    fn schemas_loaded(&self) -> bool {
        self.schemas
            .read()
            .map(|schemas| !schemas.is_empty())
            .unwrap_or(false)
    }

    fn full_diagnostics(&self, analysis: &DocumentAnalysis) -> Vec<Diagnostic> {
        let (extra_errors, extra_warnings) = if self.schemas_loaded() {
            let schemas = self
                .schemas
                .read()
                .map(|s| s.clone())
                .unwrap_or_default();
            let name = self
                .current_schema
                .read()
                .map(|n| n.clone())
                .unwrap_or_default();
            tomlet_validate::validate(&name, &schemas, &analysis.tree)
        } else {
            (Vec::new(), Vec::new())
        };
        analysis.lsp_diagnostics(&extra_errors, &extra_warnings)
    }

    /// `configSchemaLanguage/setSchemas`: replace the schema collection
    /// and refresh workspace diagnostics.
    pub async fn set_schemas(&self, params: SetSchemasParams) -> Result<()> {
        if let Some(name) = params.schema {
            if let Ok(mut current) = self.current_schema.write() {
                *current = name;
            }
        }
        // Schemas lex in single-line token mode.
        let lexed = tomlet_csl::lex::lex(&params.schemas, false);
        let parsed = tomlet_csl::parser::parse(&lexed.tokens);
        info!(
            schemas = parsed.schemas.len(),
            errors = lexed.errors.len() + parsed.errors.len(),
            "loaded CSL schemas"
        );
        if let Ok(mut schemas) = self.schemas.write() {
            *schemas = parsed.schemas;
        }
        self.refresh_diagnostics().await;
        Ok(())
    }

    /// `configSchemaLanguage/setSchema`: switch the active schema.
    pub async fn set_schema(&self, params: SetSchemaParams) -> Result<()> {
        if let Ok(mut current) = self.current_schema.write() {
            *current = params.schema;
        }
        self.refresh_diagnostics().await;
        Ok(())
    }

    /// Asks the client to re-pull diagnostics after a schema change. The
    /// response is matched by id inside the client plumbing; failures
    /// (e.g. a client without refresh support) are ignored.
    async fn refresh_diagnostics(&self) {
        let _ = self
            .client
            .send_request::<request::WorkspaceDiagnosticRefresh>(())
            .await;
    }

    /// `$/setTrace`.
    pub async fn set_trace_value(&self, params: SetTraceParams) {
        if let Ok(mut trace) = self.trace_value.write() {
            *trace = format!("{:?}", params.value);
        }
    }

    // ==================== completion helpers ====================

    fn table_member_pairs(
        &self,
        analysis: &DocumentAnalysis,
        table: NodeId,
    ) -> Vec<(String, NodeId)> {
        analysis
            .tree
            .as_table(table)
            .map(|node| {
                node.elems
                    .iter()
                    .map(|(name, key)| (name.clone(), *key))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Completion items for keys whose values are tables or arrays, with
    /// a definition-position detail.
    fn doc_completion_items(
        &self,
        analysis: &DocumentAnalysis,
        pairs: &[(String, NodeId)],
    ) -> Vec<CompletionItem> {
        let tree = &analysis.tree;
        let mut items = Vec::new();
        for (label, key) in pairs {
            let Some(value) = tree.as_key(*key).and_then(|k| k.value) else {
                continue;
            };
            let kind_name = if tree.as_table(value).is_some() {
                "Table"
            } else if tree.as_array(value).is_some() {
                "Array"
            } else {
                continue;
            };
            let region = tree.def_region(value);
            items.push(CompletionItem {
                label: label.clone(),
                kind: Some(CompletionItemKind::VARIABLE),
                detail: Some(format!(
                    "{} defined at ln {}, col {}",
                    kind_name,
                    region.start.line + 1,
                    region.start.column + 1
                )),
                insert_text: Some(label.clone()),
                ..CompletionItem::default()
            });
        }
        items
    }

    fn schema_completion_items(&self, pairs: &[(String, KeyDefinition)]) -> Vec<CompletionItem> {
        pairs
            .iter()
            .map(|(label, key_def)| CompletionItem {
                label: label.clone(),
                kind: Some(CompletionItemKind::VARIABLE),
                detail: Some(format!(
                    "{} key in schema",
                    if key_def.is_optional {
                        "Optional"
                    } else {
                        "Mandatory"
                    }
                )),
                insert_text: Some(label.clone()),
                ..CompletionItem::default()
            })
            .collect()
    }

    fn schema_keys_for_table(
        &self,
        analysis: &DocumentAnalysis,
        table: NodeId,
    ) -> Vec<(String, KeyDefinition)> {
        let Some(schema) = self.active_schema() else {
            return Vec::new();
        };
        table_type_for(&analysis.tree, table, &schema)
            .map(|table_type| {
                table_type
                    .explicit_keys
                    .iter()
                    .map(|key_def| (key_def.name.clone(), key_def.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The table a key's value reaches: the table itself, or the last
    /// element of an array of tables.
    fn value_table(&self, analysis: &DocumentAnalysis, key: NodeId) -> Option<NodeId> {
        let tree = &analysis.tree;
        let value = tree.as_key(key).and_then(|k| k.value)?;
        if tree.as_table(value).is_some() {
            return Some(value);
        }
        tree.as_array(value)
            .and_then(|array| array.elems.last().copied())
            .filter(|elem| tree.as_table(*elem).is_some())
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for TomlLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let multiline = params
            .capabilities
            .text_document
            .as_ref()
            .and_then(|td| td.semantic_tokens.as_ref())
            .and_then(|st| st.multiline_token_support)
            .unwrap_or(false);
        self.multiline_tokens.store(multiline, Ordering::Relaxed);
        if let Some(trace) = params.trace {
            if let Ok(mut value) = self.trace_value.write() {
                *value = format!("{trace:?}");
            }
        }

        Ok(InitializeResult {
            server_info: Some(ServerInfo {
                name: "tomlet".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                references_provider: Some(OneOf::Left(true)),
                rename_provider: Some(OneOf::Left(true)),
                folding_range_provider: Some(FoldingRangeProviderCapability::Simple(true)),
                semantic_tokens_provider: Some(
                    SemanticTokensServerCapabilities::SemanticTokensOptions(
                        SemanticTokensOptions {
                            legend: SemanticTokensLegend {
                                token_types: semantic::legend_types(),
                                token_modifiers: Vec::new(),
                            },
                            full: Some(SemanticTokensFullOptions::Bool(true)),
                            ..SemanticTokensOptions::default()
                        },
                    ),
                ),
                document_formatting_provider: Some(OneOf::Left(true)),
                definition_provider: Some(OneOf::Left(true)),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![".".to_string(), "-".to_string()]),
                    all_commit_characters: Some(
                        [".", "=", " ", "\"", "'", "]", "}"]
                            .iter()
                            .map(|s| s.to_string())
                            .collect(),
                    ),
                    ..CompletionOptions::default()
                }),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                diagnostic_provider: Some(DiagnosticServerCapabilities::Options(
                    DiagnosticOptions {
                        identifier: None,
                        inter_file_dependencies: true,
                        workspace_diagnostics: false,
                        work_done_progress_options: WorkDoneProgressOptions::default(),
                    },
                )),
                ..ServerCapabilities::default()
            },
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        info!("client initialized");
    }

    async fn shutdown(&self) -> Result<()> {
        self.shutdown_received.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        debug!(uri = %params.text_document.uri, "didOpen");
        self.documents
            .insert(params.text_document.uri, params.text_document.text);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // Full sync: the last change carries the complete text.
        if let Some(change) = params.content_changes.into_iter().last() {
            self.documents.insert(params.text_document.uri, change.text);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.documents.remove(&params.text_document.uri);
    }

    async fn diagnostic(
        &self,
        params: DocumentDiagnosticParams,
    ) -> Result<DocumentDiagnosticReportResult> {
        let text = self.document_text(&params.text_document.uri)?;
        let analysis = self.analyze(&text);
        let items = self.full_diagnostics(&analysis);
        Ok(DocumentDiagnosticReportResult::Report(
            DocumentDiagnosticReport::Full(RelatedFullDocumentDiagnosticReport {
                related_documents: None,
                full_document_diagnostic_report: FullDocumentDiagnosticReport {
                    result_id: None,
                    items,
                },
            }),
        ))
    }

    async fn semantic_tokens_full(
        &self,
        params: SemanticTokensParams,
    ) -> Result<Option<SemanticTokensResult>> {
        let text = self.document_text(&params.text_document.uri)?;
        let analysis = self.analyze(&text);
        let data = semantic::encode(&analysis.tokens);
        Ok(Some(SemanticTokensResult::Tokens(SemanticTokens {
            result_id: None,
            data,
        })))
    }

    async fn formatting(&self, params: DocumentFormattingParams) -> Result<Option<Vec<TextEdit>>> {
        let text = self.document_text(&params.text_document.uri)?;
        let analysis = self.analyze(&text);
        let formatted = format::to_toml(&analysis.tree);
        let edits = compute_edits(&text, &formatted);
        if edits.is_empty() {
            Ok(None)
        } else {
            Ok(Some(edits))
        }
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let text = self.document_text(&uri)?;
        let pos = position_from_lsp(params.text_document_position_params.position);
        let analysis = self.analyze(&text);

        let mut definition = None;
        if let Some(index) = analysis.mapped_token_at(pos) {
            if let Some(&key) = analysis.key_map.get(&index) {
                let tree = &analysis.tree;
                if let Some(value) = tree.as_key(key).and_then(|k| k.value) {
                    // Definition targets the value of the key: the table
                    // or array it introduces.
                    if tree.as_table(value).is_some() || tree.as_array(value).is_some() {
                        definition = Some(Location {
                            uri: uri.clone(),
                            range: region_to_range(tree.def_region(value)),
                        });
                    }
                }
            }
        }
        Ok(definition.map(GotoDefinitionResponse::Scalar))
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let text = self.document_text(&uri)?;
        let pos = position_from_lsp(params.text_document_position.position);
        let analysis = self.analyze(&text);
        let tree = &analysis.tree;

        let mut completions: Vec<CompletionItem> = Vec::new();
        let mut last_defined_table: Option<NodeId> = Some(tree.root());
        let token_count = analysis.tokens.len();

        for index in 0..token_count {
            let token = match analysis.tokens.get(index) {
                Some(token) => token.clone(),
                None => break,
            };

            // Track the table introduced by the most recent header.
            if token.category == TokenCategory::Identifier
                && analysis
                    .tokens
                    .get(index + 1)
                    .map(|t| t.text == "]")
                    .unwrap_or(false)
            {
                last_defined_table = match analysis.key_map.get(&index) {
                    Some(&key) => self.value_table(&analysis, key).or(last_defined_table),
                    None => None,
                };
            }

            if token.region.contains_position(pos) {
                let mapped = analysis.key_map.contains_key(&index);
                if !mapped && token.text != "." {
                    continue;
                }
                let mut doc_pairs: Vec<(String, NodeId)> = Vec::new();
                let mut schema_pairs: Vec<(String, KeyDefinition)> = Vec::new();

                if token.text == "." {
                    // Member completion: the table reached by the
                    // preceding identifier.
                    if index > 0 {
                        if let Some(&target) = analysis.key_map.get(&(index - 1)) {
                            if let Some(table) = self.value_table(&analysis, target) {
                                doc_pairs = self.table_member_pairs(&analysis, table);
                                schema_pairs = self.schema_keys_for_table(&analysis, table);
                            }
                        }
                    }
                } else if let Some(&target) = analysis.key_map.get(&index) {
                    // Sibling completion under the parent table, fuzzy
                    // matched against the typed identifier.
                    if let Some(key_node) = tree.as_key(target) {
                        let parent = key_node.parent;
                        let input = key_node.id.clone();
                        let pairs = self.table_member_pairs(&analysis, parent);
                        doc_pairs = find_pairs(&pairs, &input);
                        doc_pairs.retain(|(_, key)| *key != target);

                        let schema_candidates = self.schema_keys_for_table(&analysis, parent);
                        schema_pairs = find_pairs(&schema_candidates, &input);
                    }
                }

                completions.extend(self.doc_completion_items(&analysis, &doc_pairs));
                completions.extend(self.schema_completion_items(&schema_pairs));
            } else if last_defined_table.is_some()
                && token.region.end.line > pos.line
                && (index + 1 >= token_count
                    || analysis
                        .tokens
                        .get(index + 1)
                        .map(|t| t.region.start < pos)
                        .unwrap_or(false))
            {
                // Cursor sits past the current header section's tokens:
                // offer the section's keys and its schema keys.
                if let Some(table) = last_defined_table {
                    let pairs = self.table_member_pairs(&analysis, table);
                    completions.extend(self.doc_completion_items(&analysis, &pairs));
                    let schema_pairs = self.schema_keys_for_table(&analysis, table);
                    completions.extend(self.schema_completion_items(&schema_pairs));
                }
            }
        }

        if completions.is_empty() {
            Ok(None)
        } else {
            Ok(Some(CompletionResponse::List(CompletionList {
                is_incomplete: false,
                items: completions,
            })))
        }
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let text = self.document_text(&uri)?;
        let pos = position_from_lsp(params.text_document_position_params.position);
        let analysis = self.analyze(&text);
        let tree = &analysis.tree;

        let Some(index) = analysis.mapped_token_at(pos) else {
            return Ok(None);
        };
        let Some(&key) = analysis.key_map.get(&index) else {
            return Ok(None);
        };
        let token_region = analysis
            .tokens
            .get(index)
            .map(|t| t.region)
            .unwrap_or_default();
        let key_id = tree.as_key(key).map(|k| k.id.clone()).unwrap_or_default();
        let Some(value) = tree.as_key(key).and_then(|k| k.value) else {
            return Ok(None);
        };

        let markdown = if let Some(table) = tree.as_table(value) {
            format!(
                "## **Table** {key_id}\n- **Mutability**: {}\n- **Explicitly Defined**: {}\n- **Entries**: {}\n- **Defined At**: ln {}, col {}",
                if table.is_mutable { "mutable" } else { "immutable" },
                if table.is_explicit { "Yes" } else { "No" },
                table.elems.len(),
                table.def_region.start.line + 1,
                table.def_region.start.column + 1,
            )
        } else if let Some(array) = tree.as_array(value) {
            format!(
                "## **Array** {key_id}\n- **Mutability**: {}\n- **Entries**: {}\n- **Defined At**: ln {}, col {}",
                if array.is_mutable { "mutable" } else { "immutable" },
                array.elems.len(),
                array.def_region.start.line + 1,
                array.def_region.start.column + 1,
            )
        } else {
            return Ok(None);
        };

        Ok(Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: markdown,
            }),
            range: Some(region_to_range(token_region)),
        }))
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let uri = params.text_document_position.text_document.uri;
        let text = self.document_text(&uri)?;
        let pos = position_from_lsp(params.text_document_position.position);
        let include_declaration = params.context.include_declaration;
        let analysis = self.analyze(&text);

        let mut references_map: HashMap<NodeId, Vec<tomlet_core::Region>> = HashMap::new();
        let mut target: Option<NodeId> = None;
        for (index, token) in analysis.tokens.iter().enumerate() {
            let Some(&key) = analysis.key_map.get(&index) else {
                continue;
            };
            references_map.entry(key).or_default().push(token.region);
            if token.region.contains_position(pos) {
                target = Some(key);
            }
        }

        let Some(target) = target else {
            return Ok(None);
        };
        let declaration_region = analysis
            .tree
            .as_key(target)
            .and_then(|k| k.value)
            .map(|value| analysis.tree.def_region(value));

        let mut locations = Vec::new();
        for region in references_map.get(&target).into_iter().flatten() {
            if !include_declaration && Some(*region) == declaration_region {
                continue;
            }
            locations.push(Location {
                uri: uri.clone(),
                range: region_to_range(*region),
            });
        }
        Ok(Some(locations))
    }

    async fn rename(&self, params: RenameParams) -> Result<Option<WorkspaceEdit>> {
        let uri = params.text_document_position.text_document.uri;
        let text = self.document_text(&uri)?;
        let pos = position_from_lsp(params.text_document_position.position);
        let new_name = params.new_name;
        let analysis = self.analyze(&text);

        let mut references_map: HashMap<NodeId, Vec<tomlet_core::Region>> = HashMap::new();
        let mut target: Option<NodeId> = None;
        for (index, token) in analysis.tokens.iter().enumerate() {
            let Some(&key) = analysis.key_map.get(&index) else {
                continue;
            };
            references_map.entry(key).or_default().push(token.region);
            if token.region.contains_position(pos) {
                target = Some(key);
            }
        }

        let Some(target) = target else {
            return Ok(None);
        };
        let edits: Vec<TextEdit> = references_map
            .get(&target)
            .into_iter()
            .flatten()
            .map(|region| TextEdit {
                range: region_to_range(*region),
                new_text: new_name.clone(),
            })
            .collect();

        let mut changes = HashMap::new();
        changes.insert(uri, edits);
        Ok(Some(WorkspaceEdit {
            changes: Some(changes),
            ..WorkspaceEdit::default()
        }))
    }

    async fn folding_range(&self, params: FoldingRangeParams) -> Result<Option<Vec<FoldingRange>>> {
        let text = self.document_text(&params.text_document.uri)?;
        let analysis = self.analyze(&text);
        let tokens = analysis.tokens.as_slice();
        let mut ranges = Vec::new();

        let push_range =
            |ranges: &mut Vec<FoldingRange>, start: CorePosition, end: CorePosition, kind| {
                if start.line == end.line {
                    return;
                }
                ranges.push(FoldingRange {
                    start_line: start.line.max(0) as u32,
                    start_character: Some(start.column.max(0) as u32),
                    end_line: end.line.max(0) as u32,
                    end_character: Some(end.column.max(0) as u32),
                    kind,
                    collapsed_text: None,
                });
            };

        // Inline tables.
        let mut index = 0;
        while index + 1 < tokens.len() {
            if tokens[index].text == "{" {
                let start = tokens[index].region.start;
                let mut close = index + 1;
                while close < tokens.len() && tokens[close].text != "}" {
                    close += 1;
                }
                if close >= tokens.len() {
                    break;
                }
                push_range(
                    &mut ranges,
                    start,
                    tokens[close].region.end,
                    Some(FoldingRangeKind::Region),
                );
                index = close;
            }
            index += 1;
        }

        // Header sections and inline arrays.
        let is_table_header = |at: usize| {
            tokens[at].text == "["
                && at + 1 < tokens.len()
                && tokens[at + 1].category == TokenCategory::Identifier
                && analysis.key_map.contains_key(&(at + 1))
        };
        let is_array_header = |at: usize| {
            tokens[at].text == "["
                && at + 1 < tokens.len()
                && tokens[at + 1].text == "["
                && at + 2 < tokens.len()
                && tokens[at + 2].category == TokenCategory::Identifier
                && analysis.key_map.contains_key(&(at + 2))
        };
        let is_header = |at: usize| is_array_header(at) || is_table_header(at);

        let mut index = 0;
        while index + 1 < tokens.len() {
            if tokens[index].text == "[" {
                let start = tokens[index].region.start;
                let last = if is_header(index) {
                    // Extend to the token before the next header (or EOF).
                    let mut scan = index + 1;
                    while scan < tokens.len() {
                        if scan + 1 >= tokens.len() || is_header(scan + 1) {
                            break;
                        }
                        scan += 1;
                    }
                    scan.min(tokens.len() - 1)
                } else {
                    let mut scan = index + 1;
                    while scan < tokens.len() && tokens[scan].text != "]" {
                        scan += 1;
                    }
                    if scan >= tokens.len() {
                        break;
                    }
                    scan
                };
                push_range(
                    &mut ranges,
                    start,
                    tokens[last].region.end,
                    Some(FoldingRangeKind::Region),
                );
                index = last;
            }
            index += 1;
        }

        // Contiguous comment blocks.
        let mut index = 0;
        while index + 1 < tokens.len() {
            if tokens[index].category == TokenCategory::Comment {
                let start = tokens[index].region.start;
                let mut last = index;
                while last + 1 < tokens.len()
                    && tokens[last + 1].category == TokenCategory::Comment
                {
                    last += 1;
                }
                push_range(
                    &mut ranges,
                    start,
                    tokens[last].region.end,
                    Some(FoldingRangeKind::Comment),
                );
                index = last;
            }
            index += 1;
        }

        if ranges.is_empty() {
            Ok(None)
        } else {
            Ok(Some(ranges))
        }
    }
}
