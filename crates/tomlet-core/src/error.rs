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

//! Fatal error type for the core crate.
//!
//! Input-level problems (bad tokens, grammar violations) are reported as
//! diagnostics, not errors. `Error` covers the unrecoverable cases only:
//! malformed literals reaching a conversion that cannot proceed, and I/O.

use thiserror::Error;

/// An unrecoverable core error.
#[derive(Debug, Error)]
pub enum Error {
    /// A string literal could not be decoded.
    #[error("invalid string literal: {0}")]
    InvalidString(String),

    /// A numeric literal could not be converted.
    #[error("invalid number literal: {0}")]
    InvalidNumber(String),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
