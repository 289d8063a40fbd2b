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

//! Command-line surface of the `toml` binary.
//!
//! ```text
//! toml --parse <path> [--validate <path>] [--schema <name>] [--output <path>]
//! toml --langsvr --stdio
//! toml --langsvr (--port|--socket) <port>
//! toml --langsvr --pipe <name>
//! ```

use clap::Parser;
use std::path::PathBuf;

/// TOML toolchain: parser, schema validator, and language server.
#[derive(Debug, Parser)]
#[command(
    name = "toml",
    version,
    about = "TOML toolchain: parse to JSON, validate against CSL schemas, serve LSP",
    arg_required_else_help = true
)]
pub struct Cli {
    /// Parse a TOML file and print its JSON form.
    #[arg(long, value_name = "PATH", conflicts_with = "langsvr")]
    pub parse: Option<PathBuf>,

    /// Validate the parsed document against a CSL schema file.
    #[arg(long, value_name = "PATH", requires = "parse")]
    pub validate: Option<PathBuf>,

    /// Schema name to validate against (defaults to the sole schema).
    #[arg(long, value_name = "NAME", requires = "validate")]
    pub schema: Option<String>,

    /// Write the JSON output to a file instead of stdout.
    #[arg(long, value_name = "PATH", requires = "parse")]
    pub output: Option<PathBuf>,

    /// Run the language server.
    #[arg(long)]
    pub langsvr: bool,

    /// Serve over standard input/output.
    #[arg(long, requires = "langsvr", conflicts_with_all = ["port", "socket", "pipe"])]
    pub stdio: bool,

    /// Connect to a TCP port on 127.0.0.1.
    #[arg(long, value_name = "PORT", requires = "langsvr", conflicts_with_all = ["socket", "pipe"])]
    pub port: Option<u16>,

    /// Alias of --port.
    #[arg(long, value_name = "PORT", requires = "langsvr", conflicts_with = "pipe")]
    pub socket: Option<u16>,

    /// Connect to a named pipe.
    #[arg(long, value_name = "NAME", requires = "langsvr")]
    pub pipe: Option<String>,
}

/// Language-server transport selected on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    Stdio,
    Tcp(u16),
    Pipe(String),
}

impl Cli {
    /// The transport, when `--langsvr` is given with a valid selection.
    pub fn transport(&self) -> Option<Transport> {
        if !self.langsvr {
            return None;
        }
        if self.stdio {
            return Some(Transport::Stdio);
        }
        if let Some(port) = self.port.or(self.socket) {
            return Some(Transport::Tcp(port));
        }
        self.pipe.clone().map(Transport::Pipe)
    }
}
