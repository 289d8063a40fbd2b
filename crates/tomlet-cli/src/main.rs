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

//! The `toml` command line driver.
//!
//! Exit codes: 0 on a clean parse/validate, 1 on diagnostics, file I/O
//! failure, or abnormal server exit, 2 on argument errors.

mod cli;
mod commands;
mod error;

use clap::Parser;
use cli::Cli;
use commands::parse::ParseArgs;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();

    let result = if let Some(input) = args.parse.as_deref() {
        commands::parse::run(ParseArgs {
            input,
            validate: args.validate.as_deref(),
            schema: args.schema.as_deref(),
            output: args.output.as_deref(),
        })
    } else if let Some(transport) = args.transport() {
        commands::langsvr::run(transport)
    } else {
        // --langsvr without a transport selection.
        eprintln!("--langsvr requires one of --stdio, --port, --socket, or --pipe");
        return ExitCode::from(2);
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
