// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module graph loading
//!
//! Drives the hook chains over a module graph: resolve each specifier,
//! classify the format, transform the source, recurse into local
//! dependencies. Evaluation is the host engine's job; the graph's
//! output is the transformed source a host would execute.

use crate::error::Result;
use crate::hooks::{Loader, ModuleFormat, file_url, url_to_path};
use bytes::Bytes;
use dashmap::DashMap;
use regex::Regex;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing::{debug, trace};
use url::Url;

/// A module loaded through the hook pipeline
#[derive(Debug, Clone)]
pub struct LoadedModule {
    /// The module's resolved URL
    pub url: Url,
    /// Classified format
    pub format: ModuleFormat,
    /// Transformed source text
    pub source: String,
    /// Resolved URLs of this module's dependencies
    pub dependencies: Vec<Url>,
}

/// Graph loader with a cycle-safe module cache
pub struct GraphLoader {
    loader: Arc<Loader>,
    /// Modules already loaded, keyed by URL
    cache: DashMap<Url, Arc<LoadedModule>>,
    /// Modules currently loading, for circular import detection
    loading: DashMap<Url, ()>,
}

impl GraphLoader {
    /// Create a graph loader over a hook pipeline
    pub fn new(loader: Arc<Loader>) -> Self {
        Self {
            loader,
            cache: DashMap::new(),
            loading: DashMap::new(),
        }
    }

    /// Load the module graph rooted at the entry file.
    ///
    /// Returns every module reached from the entry.
    pub async fn load_entry(&self, entry: &Path) -> Result<Vec<Arc<LoadedModule>>> {
        let path = entry.canonicalize()?;
        let url = file_url(&path)?;
        self.load_module(&url).await?;

        Ok(self.cache.iter().map(|e| Arc::clone(e.value())).collect())
    }

    /// Load one module and its dependency subtree
    fn load_module<'a>(
        &'a self,
        url: &'a Url,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            if self.cache.contains_key(url) {
                return Ok(());
            }

            // A module already on the loading path is a cycle; the
            // partially-loaded module satisfies the import, as in any
            // cyclic ESM graph.
            if self.loading.contains_key(url) {
                trace!(%url, "circular import");
                return Ok(());
            }
            self.loading.insert(url.clone(), ());

            let result = self.load_module_inner(url).await;
            self.loading.remove(url);
            result
        })
    }

    async fn load_module_inner(&self, url: &Url) -> Result<()> {
        let format = self.loader.format(url).await?;

        // Nothing to read or transform for built-ins and native addons
        if matches!(format, ModuleFormat::Builtin | ModuleFormat::Native) {
            self.cache.insert(
                url.clone(),
                Arc::new(LoadedModule {
                    url: url.clone(),
                    format,
                    source: String::new(),
                    dependencies: Vec::new(),
                }),
            );
            return Ok(());
        }

        let path = url_to_path(url)?;
        let raw = Bytes::from(tokio::fs::read(&path).await?);
        let transformed = self.loader.transform(raw, url, format).await?;

        let mut dependencies = Vec::new();
        if format == ModuleFormat::Module {
            for specifier in import_specifiers(&transformed.source) {
                let resolution = self.loader.resolve(&specifier, Some(url)).await?;
                self.load_module(&resolution.url).await?;
                dependencies.push(resolution.url);
            }
        }

        debug!(%url, %format, deps = dependencies.len(), "module loaded");
        self.cache.insert(
            url.clone(),
            Arc::new(LoadedModule {
                url: url.clone(),
                format,
                source: transformed.source,
                dependencies,
            }),
        );
        Ok(())
    }

    /// Number of modules loaded so far
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether nothing has been loaded yet
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Get a loaded module by URL
    pub fn get(&self, url: &Url) -> Option<Arc<LoadedModule>> {
        self.cache.get(url).map(|m| Arc::clone(m.value()))
    }
}

/// Extract import specifiers from module source.
///
/// A heuristic scan over `import`/`export ... from` declarations and
/// side-effect imports; a full parse is the engine's job.
fn import_specifiers(source: &str) -> Vec<String> {
    static FROM_RE: OnceLock<Regex> = OnceLock::new();
    static BARE_RE: OnceLock<Regex> = OnceLock::new();

    let from_re = FROM_RE.get_or_init(|| {
        Regex::new(r#"(?m)^\s*(?:import|export)\s[^;'"]*?from\s*['"]([^'"]+)['"]"#).unwrap()
    });
    let bare_re =
        BARE_RE.get_or_init(|| Regex::new(r#"(?m)^\s*import\s*['"]([^'"]+)['"]"#).unwrap());

    let mut specifiers: Vec<String> = Vec::new();
    for captures in from_re.captures_iter(source).chain(bare_re.captures_iter(source)) {
        let specifier = captures[1].to_string();
        if !specifiers.contains(&specifier) {
            specifiers.push(specifier);
        }
    }
    specifiers
}
