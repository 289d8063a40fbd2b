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

//! TOML language server over the Language Server Protocol.
//!
//! Features: pull diagnostics (TOML lex/parse plus CSL validation when a
//! schema is bound), semantic tokens, formatting, definition, completion,
//! hover, references, rename, and folding ranges. Schemas are bound
//! through the custom `configSchemaLanguage/setSchemas` and
//! `configSchemaLanguage/setSchema` requests, which trigger a workspace
//! diagnostic refresh.
//!
//! The server is single-threaded cooperative: each request runs to
//! completion before the next message is dispatched, and nothing but raw
//! document text survives between requests.

pub mod analysis;
pub mod backend;
pub mod edits;
pub mod fuzzy;
pub mod schema_nav;
pub mod semantic;

pub use backend::{SetSchemaParams, SetSchemasParams, TomlLanguageServer};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tower_lsp::{LspService, Server};

/// Crate version, as reported in the initialize response.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Serves the language server over the given byte channels until the
/// client sends `exit`. Returns the process exit code: 0 when `shutdown`
/// preceded `exit`, 1 otherwise.
pub async fn run_server<I, O>(input: I, output: O) -> i32
where
    I: AsyncRead + Unpin,
    O: AsyncWrite,
{
    let shutdown_received = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown_received);

    let (service, socket) = LspService::build(move |client| {
        TomlLanguageServer::new(client, Arc::clone(&flag))
    })
    .custom_method(
        "configSchemaLanguage/setSchemas",
        TomlLanguageServer::set_schemas,
    )
    .custom_method(
        "configSchemaLanguage/setSchema",
        TomlLanguageServer::set_schema,
    )
    .custom_method("$/setTrace", TomlLanguageServer::set_trace_value)
    .finish();

    Server::new(input, output, socket).serve(service).await;

    if shutdown_received.load(Ordering::SeqCst) {
        0
    } else {
        1
    }
}
