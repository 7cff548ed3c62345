// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Inline source map generation
//!
//! The transformer keeps source lines in place, so the map is a v3
//! line-identity map: every generated line points at the same line of
//! the original file, column zero.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

const BASE64_VLQ: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Encode one signed value as base64 VLQ
fn vlq_encode(value: i64, out: &mut String) {
    // Sign bit lives in the lowest bit of the first digit
    let mut rest = if value < 0 {
        ((-value as u64) << 1) | 1
    } else {
        (value as u64) << 1
    };

    loop {
        let mut digit = (rest & 0x1f) as usize;
        rest >>= 5;
        if rest > 0 {
            digit |= 0x20;
        }
        out.push(BASE64_VLQ[digit] as char);
        if rest == 0 {
            break;
        }
    }
}

/// Build the `mappings` string for a line-identity map over `lines` lines
fn identity_mappings(lines: usize) -> String {
    let mut mappings = String::new();
    for line in 0..lines {
        if line > 0 {
            mappings.push(';');
        }
        // [generated column, source index, source line delta, source column]
        vlq_encode(0, &mut mappings);
        vlq_encode(0, &mut mappings);
        vlq_encode(if line == 0 { 0 } else { 1 }, &mut mappings);
        vlq_encode(0, &mut mappings);
    }
    mappings
}

/// Build a v3 source map for `source` attributed to `file`
pub fn identity_map(source: &str, file: &str) -> serde_json::Value {
    serde_json::json!({
        "version": 3,
        "sources": [file],
        "sourcesContent": [source],
        "names": [],
        "mappings": identity_mappings(source.lines().count().max(1)),
    })
}

/// Render a source map as an inline `sourceMappingURL` comment
pub fn inline_directive(map: &serde_json::Value) -> String {
    format!(
        "//# sourceMappingURL=data:application/json;charset=utf-8;base64,{}",
        STANDARD.encode(map.to_string())
    )
}
