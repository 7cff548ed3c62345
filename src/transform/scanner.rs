// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Heuristic source scanner
//!
//! A single comment/string/template-aware pass that finds `await` used
//! at module top level and rejects sources with unterminated strings or
//! comments. This is a loader-side scan, not a parse: function bodies
//! are recognized by their braces (a `function` header or an arrow `=>`
//! directly before `{`), so concise arrow bodies and class methods are
//! not tracked. Full scope analysis is the engine's job.

use crate::error::{LoaderError, Result};

/// What the scan found
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// Line of the first `await` outside any function body
    pub top_level_await: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    /// A plain `{ ... }` block or object literal
    Plain,
    /// A function body; `await` inside is not top-level
    Function,
    /// A `${ ... }` substitution inside a template literal
    TemplateSubst,
}

/// Scan `source`, attributing any error to `file`
pub fn scan(source: &str, file: &str) -> Result<ScanResult> {
    let mut result = ScanResult::default();
    let mut blocks: Vec<Block> = Vec::new();

    let mut line = 1usize;
    // Set once a `function` header or `=>` makes the next `{` a body
    let mut pending_body = false;
    // Inside a `function` header, before the parameter list closes
    let mut header_parens = 0usize;
    let mut in_header = false;
    let mut word = String::new();
    let mut prev_significant = '\0';

    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        // Flush a pending identifier at its boundary
        if !is_word_char(c) && !word.is_empty() {
            let token = std::mem::take(&mut word);
            if prev_significant != '.' {
                match token.as_str() {
                    "function" => {
                        in_header = true;
                        header_parens = 0;
                    }
                    "await" => {
                        if !blocks.contains(&Block::Function)
                            && result.top_level_await.is_none()
                        {
                            result.top_level_await = Some(line);
                        }
                    }
                    _ => {}
                }
            }
            prev_significant = 'a';
        }

        if c == '\n' {
            line += 1;
        }

        match c {
            '/' => match chars.peek() {
                Some('/') => {
                    chars.next();
                    for c in chars.by_ref() {
                        if c == '\n' {
                            line += 1;
                            break;
                        }
                    }
                }
                Some('*') => {
                    chars.next();
                    let start = line;
                    let mut closed = false;
                    let mut prev = '\0';
                    for c in chars.by_ref() {
                        if c == '\n' {
                            line += 1;
                        }
                        if prev == '*' && c == '/' {
                            closed = true;
                            break;
                        }
                        prev = c;
                    }
                    if !closed {
                        return Err(LoaderError::syntax(file, start, "Unterminated comment"));
                    }
                }
                _ => prev_significant = '/',
            },
            '\'' | '"' => {
                skip_string(&mut chars, c, &mut line, file)?;
                prev_significant = '"';
            }
            '`' => {
                skip_template(&mut chars, &mut blocks, &mut line, file)?;
                prev_significant = '`';
            }
            '{' => {
                let kind = if pending_body { Block::Function } else { Block::Plain };
                pending_body = false;
                blocks.push(kind);
                prev_significant = '{';
            }
            '}' => {
                if blocks.pop() == Some(Block::TemplateSubst) {
                    skip_template(&mut chars, &mut blocks, &mut line, file)?;
                }
                prev_significant = '}';
            }
            '(' => {
                if in_header {
                    header_parens += 1;
                }
                prev_significant = '(';
            }
            ')' => {
                if in_header {
                    header_parens = header_parens.saturating_sub(1);
                    if header_parens == 0 {
                        in_header = false;
                        pending_body = true;
                    }
                }
                prev_significant = ')';
            }
            '>' if prev_significant == '=' => {
                // Arrow: only a brace body counts as a function block
                pending_body = matches!(peek_significant(&mut chars), Some('{'));
                prev_significant = '>';
            }
            c if is_word_char(c) => {
                word.push(c);
            }
            c if !c.is_whitespace() => {
                prev_significant = c;
            }
            _ => {}
        }
    }

    if word == "await"
        && prev_significant != '.'
        && !blocks.contains(&Block::Function)
        && result.top_level_await.is_none()
    {
        result.top_level_await = Some(line);
    }

    Ok(result)
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Peek past whitespace without consuming non-whitespace
fn peek_significant(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<char> {
    // Peekable only looks one ahead; clone the iterator for a deeper look
    chars.clone().find(|c| !c.is_whitespace())
}

fn skip_string(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    quote: char,
    line: &mut usize,
    file: &str,
) -> Result<()> {
    let start = *line;
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    if escaped == '\n' {
                        *line += 1;
                    }
                }
            }
            '\n' => {
                return Err(LoaderError::syntax(file, start, "Unterminated string constant"));
            }
            c if c == quote => return Ok(()),
            _ => {}
        }
    }
    Err(LoaderError::syntax(file, start, "Unterminated string constant"))
}

/// Skip template literal content.
///
/// A `${` pushes a substitution marker and returns control to the code
/// scan; the matching `}` re-enters here.
fn skip_template(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    blocks: &mut Vec<Block>,
    line: &mut usize,
    file: &str,
) -> Result<()> {
    let start = *line;
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '\n' => *line += 1,
            '`' => return Ok(()),
            '$' if chars.peek() == Some(&'{') => {
                chars.next();
                blocks.push(Block::TemplateSubst);
                return Ok(());
            }
            _ => {}
        }
    }
    Err(LoaderError::syntax(file, start, "Unterminated template"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_ok(source: &str) -> ScanResult {
        scan(source, "test.js").unwrap()
    }

    #[test]
    fn test_top_level_await_detected() {
        assert_eq!(scan_ok("const x = await fetch(url);").top_level_await, Some(1));
        assert_eq!(scan_ok("await init();\nexport {};").top_level_await, Some(1));
    }

    #[test]
    fn test_await_in_function_not_top_level() {
        assert!(scan_ok("async function f() { await g(); }").top_level_await.is_none());
        assert!(scan_ok("const f = async () => { await g(); };").top_level_await.is_none());
    }

    #[test]
    fn test_await_in_strings_and_comments_ignored() {
        assert!(scan_ok(r#"const s = "await x";"#).top_level_await.is_none());
        assert!(scan_ok("// await x\nlet y = 1;").top_level_await.is_none());
        assert!(scan_ok("/* await x */ let y = 1;").top_level_await.is_none());
        assert!(scan_ok("const t = `await ${y}`;").top_level_await.is_none());
    }

    #[test]
    fn test_await_property_access_ignored() {
        assert!(scan_ok("obj.await;").top_level_await.is_none());
    }

    #[test]
    fn test_await_in_template_substitution() {
        assert_eq!(scan_ok("const t = `v: ${await get()}`;").top_level_await, Some(1));
    }

    #[test]
    fn test_nested_function_then_top_level() {
        let src = "function f() { return 1; }\nawait f();";
        assert_eq!(scan_ok(src).top_level_await, Some(2));
    }

    #[test]
    fn test_unterminated_comment() {
        let err = scan("let x = 1; /* oops", "bad.js").unwrap_err();
        assert!(err.to_string().contains("Unterminated comment"));
    }

    #[test]
    fn test_unterminated_string() {
        let err = scan("const s = \"oops\nlet y = 1;", "bad.js").unwrap_err();
        assert!(err.to_string().contains("Unterminated string"));
    }

    #[test]
    fn test_unterminated_template() {
        let err = scan("const t = `oops", "bad.js").unwrap_err();
        assert!(err.to_string().contains("Unterminated template"));
    }

    #[test]
    fn test_plain_source_clean() {
        let src = "import { a } from './a.js';\nexport const b = a + 1;\n";
        assert_eq!(scan_ok(src), ScanResult::default());
    }
}
