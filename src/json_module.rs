// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! JSON to ES module conversion
//!
//! Turns a parsed JSON document into compact module source. Each
//! top-level key of an object becomes a named `const` export when the
//! key is a legal identifier; the whole document is always available as
//! the default export. Keys are emitted in document order and never
//! renamed: a key that cannot be an identifier only appears as a quoted
//! property of the default export.

use serde_json::Value;

/// ECMAScript reserved words that cannot be export names
const RESERVED_WORDS: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "if", "implements", "import", "in", "instanceof", "interface", "let", "new", "null",
    "package", "private", "protected", "public", "return", "static", "super", "switch", "this",
    "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// Serialize a JSON value to ES module source text.
///
/// Output is compact: one statement per export, no extraneous
/// whitespace. The default export references the named bindings rather
/// than repeating their values.
pub fn data_to_module(data: &Value) -> String {
    let Value::Object(map) = data else {
        return format!("export default {};", literal(data));
    };

    let mut out = String::new();
    for (key, value) in map {
        if is_legal_identifier(key) {
            out.push_str(&format!("export const {} = {};", key, literal(value)));
            out.push('\n');
        }
    }

    out.push_str("export default {");
    let mut first = true;
    for (key, value) in map {
        if !first {
            out.push(',');
        }
        first = false;
        if is_legal_identifier(key) {
            // Shorthand reference to the named binding
            out.push_str(key);
        } else {
            out.push_str(&format!("{}: {}", quote(key), literal(value)));
        }
    }
    out.push_str("};");
    out
}

/// Check whether a key can be used verbatim as an export name
pub fn is_legal_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_' || first == '$') {
        return false;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$') {
        return false;
    }
    !RESERVED_WORDS.contains(&key)
}

/// Serialize a JSON value as a JavaScript expression
fn literal(value: &Value) -> String {
    // JSON is almost a subset of JavaScript; the exceptions are the
    // line separators U+2028/U+2029, legal raw in JSON strings but not
    // in pre-ES2019 string literals.
    escape_line_terminators(&value.to_string())
}

fn quote(key: &str) -> String {
    escape_line_terminators(&Value::String(key.to_string()).to_string())
}

fn escape_line_terminators(text: &str) -> String {
    if !text.contains(['\u{2028}', '\u{2029}']) {
        return text.to_string();
    }
    text.replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}
