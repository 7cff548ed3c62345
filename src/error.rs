// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the loader pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type for loader operations
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Errors that can occur while loading a module
#[derive(Debug, Error)]
pub enum LoaderError {
    /// Module not found
    #[error("Cannot find module '{0}'")]
    ModuleNotFound(String),

    /// Module resolution error
    #[error("Error resolving module '{module}': {reason}")]
    Resolve {
        /// Module specifier
        module: String,
        /// Reason for failure
        reason: String,
    },

    /// File system error
    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    /// Path error
    #[error("Invalid path: {0}")]
    InvalidPath(PathBuf),

    /// URL error
    #[error("Invalid module URL: {0}")]
    InvalidUrl(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Source is not valid UTF-8
    #[error("Source is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// Syntax error
    #[error("SyntaxError: {message} ({file}:{line})")]
    Syntax {
        /// File the error was found in
        file: String,
        /// Line number (1-based)
        line: usize,
        /// What went wrong
        message: String,
    },
}

impl LoaderError {
    /// Create a module not found error
    pub fn module_not_found(module: impl Into<String>) -> Self {
        Self::ModuleNotFound(module.into())
    }

    /// Create a syntax error
    pub fn syntax(file: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            file: file.into(),
            line,
            message: message.into(),
        }
    }
}
