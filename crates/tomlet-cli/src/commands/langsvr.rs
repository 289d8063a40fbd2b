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

//! `toml --langsvr`: run the language server over the chosen transport.
//!
//! The transports are opaque byte channels carrying the framed JSON-RPC
//! protocol. TCP and pipe transports connect as a client, matching how
//! editors hand a pre-opened endpoint to the server process.

use crate::cli::Transport;
use crate::error::{CliError, Result};
use std::process::ExitCode;
use tracing::info;

pub fn run(transport: Transport) -> Result<ExitCode> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Transport)?;

    let code = runtime.block_on(async move {
        match transport {
            Transport::Stdio => {
                info!("serving LSP over stdio");
                Ok::<i32, CliError>(tomlet_lsp::run_server(tokio::io::stdin(), tokio::io::stdout()).await)
            }
            Transport::Tcp(port) => {
                info!(port, "connecting LSP over TCP");
                let stream = tokio::net::TcpStream::connect(("127.0.0.1", port))
                    .await
                    .map_err(CliError::Transport)?;
                let (read, write) = stream.into_split();
                Ok::<i32, CliError>(tomlet_lsp::run_server(read, write).await)
            }
            Transport::Pipe(name) => {
                #[cfg(unix)]
                {
                    info!(name = %name, "connecting LSP over pipe");
                    let stream = tokio::net::UnixStream::connect(&name)
                        .await
                        .map_err(CliError::Transport)?;
                    let (read, write) = stream.into_split();
                    Ok(tomlet_lsp::run_server(read, write).await)
                }
                #[cfg(not(unix))]
                {
                    Err(CliError::Unsupported(format!(
                        "pipe transport is not supported on this platform: {name}"
                    )))
                }
            }
        }
    })?;

    Ok(if code == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
