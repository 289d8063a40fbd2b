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

//! CLI error type.
//!
//! Fatal conditions only: file I/O, transport setup, internal failures.
//! Document-level problems are diagnostics and influence the exit code
//! without becoming errors.

use thiserror::Error;

/// A fatal CLI error; maps to exit code 1 with a single stderr line.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("unable to open {path}: {source}")]
    File {
        path: String,
        source: std::io::Error,
    },

    #[error("{0}")]
    Core(#[from] tomlet_core::Error),

    #[error("transport error: {0}")]
    Transport(std::io::Error),

    #[error("{0}")]
    Unsupported(String),
}

/// Result alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;
