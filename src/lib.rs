// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # skyhook
//!
//! A module-loader hook pipeline. Skyhook sits in front of a host
//! runtime's default module loading and intercepts three stages:
//!
//! - **resolve** — relative specifiers are probed with a fixed
//!   extension list, and the alias prefixes `~/` and `@/` map onto the
//!   project source root (`./src` if it exists, else the working
//!   directory)
//! - **format** — project-owned files are classified as ES modules
//! - **transform** — JSON files become modules with named constant
//!   exports; other project sources get an inline source map and may
//!   use top-level `await`
//!
//! Files under `node_modules` and non-`file:` URLs are never touched:
//! every stage falls through to a default handler that models the
//! host's own behavior.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use skyhook::{GraphLoader, Loader, LoaderConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = LoaderConfig::discover(&std::env::current_dir()?);
//!     let graph = GraphLoader::new(Arc::new(Loader::new(config)));
//!     graph.load_entry(std::path::Path::new("src/main.js")).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! # Load a program under the hook set
//! skyhook src/main.js
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod graph;
pub mod hooks;
pub mod json_module;
pub mod resolver;
pub mod transform;

// Re-exports
pub use config::LoaderConfig;
pub use error::{LoaderError, Result};
pub use graph::{GraphLoader, LoadedModule};
pub use hooks::{Loader, ModuleFormat, Resolution, file_url, url_to_path};

/// Version of the skyhook loader
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
