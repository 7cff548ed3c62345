// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Source transformation
//!
//! The transformer leaves source lines untouched and appends an inline
//! source map, so stack traces point back at the original file. Its
//! real job is the acceptance decision: constructs outside the base
//! grammar (today, top-level `await`) are rejected unless a matching
//! [`SyntaxExtension`] is installed.

mod scanner;
mod sourcemap;

pub use scanner::{ScanResult, scan};

use crate::error::{LoaderError, Result};
use std::path::Path;

/// A syntax construct the base grammar does not accept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Construct {
    /// `await` outside any function body
    TopLevelAwait,
}

/// An opt-in extension to the accepted grammar
pub trait SyntaxExtension: Send + Sync {
    /// Extension name, for diagnostics
    fn name(&self) -> &'static str;

    /// Whether this extension permits `construct`
    fn permits(&self, construct: Construct) -> bool;
}

/// Permits `await` at module top level
pub struct TopLevelAwait;

impl SyntaxExtension for TopLevelAwait {
    fn name(&self) -> &'static str {
        "top-level-await"
    }

    fn permits(&self, construct: Construct) -> bool {
        construct == Construct::TopLevelAwait
    }
}

/// Result of a transform
#[derive(Debug, Clone)]
pub struct Transformed {
    /// Source text with the inline source-map directive appended
    pub code: String,
    /// The module uses `await` at top level and needs async evaluation
    pub top_level_await: bool,
}

/// Source transformer with a configurable extension set
pub struct SourceTransformer {
    extensions: Vec<Box<dyn SyntaxExtension>>,
}

impl SourceTransformer {
    /// Create a transformer with no extensions (base grammar only)
    pub fn new() -> Self {
        Self {
            extensions: Vec::new(),
        }
    }

    /// Add a syntax extension
    pub fn with_extension(mut self, extension: impl SyntaxExtension + 'static) -> Self {
        self.extensions.push(Box::new(extension));
        self
    }

    fn permits(&self, construct: Construct) -> bool {
        self.extensions.iter().any(|e| e.permits(construct))
    }

    /// Transform `source`, attributing diagnostics to `file`.
    ///
    /// Fails on unterminated strings or comments, and on top-level
    /// `await` when no installed extension permits it.
    pub fn transform(&self, source: &str, file: &Path) -> Result<Transformed> {
        let file_name = file.display().to_string();
        let scanned = scan(source, &file_name)?;

        if let Some(line) = scanned.top_level_await {
            if !self.permits(Construct::TopLevelAwait) {
                return Err(LoaderError::syntax(
                    file_name,
                    line,
                    "await is only valid in async functions and at the top level of modules \
                     with the top-level-await extension",
                ));
            }
        }

        let map = sourcemap::identity_map(source, &file_name);
        let mut code = source.to_string();
        if !code.ends_with('\n') {
            code.push('\n');
        }
        code.push_str(&sourcemap::inline_directive(&map));
        code.push('\n');

        Ok(Transformed {
            code,
            top_level_await: scanned.top_level_await.is_some(),
        })
    }
}

impl Default for SourceTransformer {
    fn default() -> Self {
        Self::new()
    }
}
