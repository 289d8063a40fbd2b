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

//! Accumulated diagnostics.
//!
//! The front ends never fail on bad input; they collect `(message, region)`
//! pairs and keep going with best-effort recovery. Severity is carried by
//! which list a diagnostic lands in (errors vs warnings), matching how the
//! CLI and language server report them.

use crate::position::Region;
use std::fmt;

/// A single diagnostic: a message anchored to a source region.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Human-readable message.
    pub message: String,
    /// Source region the message refers to.
    pub region: Region,
}

impl Diagnostic {
    /// Creates a new diagnostic.
    pub fn new(message: impl Into<String>, region: Region) -> Self {
        Self {
            message: message.into(),
            region,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(line {}, col {}): {}",
            self.region.start.line, self.region.start.column, self.message
        )
    }
}

/// Ordered list of diagnostics of one severity.
pub type DiagnosticList = Vec<Diagnostic>;
