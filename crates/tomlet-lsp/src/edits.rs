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

//! Line-wise minimal text edits.
//!
//! Formatting re-emits the whole document; the edits sent to the client
//! are the line ranges that actually changed, computed with a simple
//! two-pointer diff over the line lists.

use tower_lsp::lsp_types::{Position, Range, TextEdit};

fn split_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.split('\n').collect();
    // `split` already yields a final empty segment for trailing newlines,
    // which models the cursor line after the last `\n`.
    if text.is_empty() {
        lines = vec![""];
    }
    lines
}

fn offset_to_position(mut offset: usize, lines: &[&str]) -> Position {
    for (index, line) in lines.iter().enumerate() {
        let line_length = line.len() + 1;
        if offset < line_length {
            return Position::new(index as u32, offset as u32);
        }
        offset -= line_length;
    }
    Position::new(lines.len() as u32, 0)
}

/// Computes line-range edits that transform `original` into `modified`.
pub fn compute_edits(original: &str, modified: &str) -> Vec<TextEdit> {
    let orig_lines = split_lines(original);
    let mod_lines = split_lines(modified);
    let mut edits = Vec::new();

    let mut o = 0;
    let mut m = 0;
    while o < orig_lines.len() || m < mod_lines.len() {
        if o < orig_lines.len() && m < mod_lines.len() && orig_lines[o] == mod_lines[m] {
            o += 1;
            m += 1;
            continue;
        }

        let orig_start = o;
        let mod_start = m;
        while o < orig_lines.len() && (m >= mod_lines.len() || orig_lines[o] != mod_lines[m]) {
            o += 1;
        }
        while m < mod_lines.len() && (o >= orig_lines.len() || mod_lines[m] != orig_lines[o]) {
            m += 1;
        }

        let mut start_offset = 0;
        for line in &orig_lines[..orig_start] {
            start_offset += line.len() + 1;
        }
        let mut end_offset = start_offset;
        for line in &orig_lines[orig_start..o] {
            end_offset += line.len() + 1;
        }

        let mut new_text = String::new();
        for (index, line) in mod_lines[mod_start..m].iter().enumerate() {
            if index > 0 {
                new_text.push('\n');
            }
            new_text.push_str(line);
        }

        edits.push(TextEdit {
            range: Range {
                start: offset_to_position(start_offset, &orig_lines),
                end: offset_to_position(end_offset, &orig_lines),
            },
            new_text,
        });
    }
    edits
}
