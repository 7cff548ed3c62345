// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Loader hook chains
//!
//! Each load stage (resolve, format, transform) is an ordered chain of
//! handlers. A handler either produces a result or passes the request
//! to the next handler via its `Next*` cursor; the terminal handler of
//! every chain models the host runtime's default behavior. Hooks hold
//! no mutable state, so a chain can serve any number of in-flight loads.

mod format;
mod resolve;
mod transform;

pub use format::{DefaultFormat, ProjectFormat};
pub use resolve::{AliasResolve, BUILTIN_MODULES, DefaultResolve};
pub use transform::{DefaultTransform, ProjectTransform};

use crate::config::LoaderConfig;
use crate::error::{LoaderError, Result};
use crate::resolver::FileResolver;
use crate::transform::{SourceTransformer, TopLevelAwait};
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

/// Module format labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleFormat {
    /// ECMAScript module
    Module,
    /// CommonJS module
    CommonJs,
    /// JSON module
    Json,
    /// Native addon
    Native,
    /// Runtime built-in
    Builtin,
}

impl fmt::Display for ModuleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ModuleFormat::Module => "module",
            ModuleFormat::CommonJs => "commonjs",
            ModuleFormat::Json => "json",
            ModuleFormat::Native => "native",
            ModuleFormat::Builtin => "builtin",
        };
        f.write_str(label)
    }
}

/// A specifier to be resolved against a parent module
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    /// The import specifier as written
    pub specifier: String,
    /// URL of the importing module, if any
    pub parent: Option<Url>,
    /// Accepted condition names
    pub conditions: Vec<String>,
}

/// A successful resolution
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The resolved module URL
    pub url: Url,
}

/// A module URL to be classified
#[derive(Debug, Clone)]
pub struct FormatRequest {
    /// The module URL
    pub url: Url,
    /// Format declared upstream, if any
    pub declared: Option<ModuleFormat>,
}

/// Raw module source to be transformed
#[derive(Debug, Clone)]
pub struct TransformRequest {
    /// The module URL
    pub url: Url,
    /// The module's classified format
    pub format: ModuleFormat,
    /// Raw source bytes
    pub source: Bytes,
}

/// Transformed module source
#[derive(Debug, Clone)]
pub struct TransformedSource {
    /// Source text, with embedded source-map data where applicable
    pub source: String,
}

/// A resolve-stage handler
#[async_trait]
pub trait ResolveHook: Send + Sync {
    /// Resolve `request` or delegate to `next`
    async fn resolve(&self, request: &ResolveRequest, next: NextResolve<'_>)
    -> Result<Resolution>;
}

/// A format-stage handler
#[async_trait]
pub trait FormatHook: Send + Sync {
    /// Classify `request` or delegate to `next`
    async fn format(&self, request: &FormatRequest, next: NextFormat<'_>)
    -> Result<ModuleFormat>;
}

/// A transform-stage handler
#[async_trait]
pub trait TransformHook: Send + Sync {
    /// Transform `request` or delegate to `next`
    async fn transform(
        &self,
        request: &TransformRequest,
        next: NextTransform<'_>,
    ) -> Result<TransformedSource>;
}

/// Cursor over the remaining resolve handlers
pub struct NextResolve<'a> {
    hooks: &'a [Arc<dyn ResolveHook>],
}

impl NextResolve<'_> {
    /// Invoke the rest of the chain
    pub async fn run(self, request: &ResolveRequest) -> Result<Resolution> {
        match self.hooks.split_first() {
            Some((head, rest)) => head.resolve(request, NextResolve { hooks: rest }).await,
            None => Err(LoaderError::module_not_found(&request.specifier)),
        }
    }
}

/// Cursor over the remaining format handlers
pub struct NextFormat<'a> {
    hooks: &'a [Arc<dyn FormatHook>],
}

impl NextFormat<'_> {
    /// Invoke the rest of the chain
    pub async fn run(self, request: &FormatRequest) -> Result<ModuleFormat> {
        match self.hooks.split_first() {
            Some((head, rest)) => head.format(request, NextFormat { hooks: rest }).await,
            None => Err(LoaderError::InvalidUrl(request.url.to_string())),
        }
    }
}

/// Cursor over the remaining transform handlers
pub struct NextTransform<'a> {
    hooks: &'a [Arc<dyn TransformHook>],
}

impl NextTransform<'_> {
    /// Invoke the rest of the chain
    pub async fn run(self, request: &TransformRequest) -> Result<TransformedSource> {
        match self.hooks.split_first() {
            Some((head, rest)) => head.transform(request, NextTransform { hooks: rest }).await,
            None => Err(LoaderError::InvalidUrl(request.url.to_string())),
        }
    }
}

/// The assembled hook pipeline.
///
/// Custom hooks sit in front of the default handlers in each chain;
/// the configuration is computed once and shared by value.
pub struct Loader {
    config: Arc<LoaderConfig>,
    resolve_hooks: Vec<Arc<dyn ResolveHook>>,
    format_hooks: Vec<Arc<dyn FormatHook>>,
    transform_hooks: Vec<Arc<dyn TransformHook>>,
}

impl Loader {
    /// Build the standard pipeline for `config`
    pub fn new(config: LoaderConfig) -> Self {
        let config = Arc::new(config);
        let resolver = Arc::new(FileResolver::new(
            config.conditions.clone(),
            config.extensions.clone(),
        ));
        let transformer = Arc::new(SourceTransformer::new().with_extension(TopLevelAwait));

        Self {
            resolve_hooks: vec![
                Arc::new(AliasResolve::new(Arc::clone(&config), Arc::clone(&resolver))),
                Arc::new(DefaultResolve::new(resolver)),
            ],
            format_hooks: vec![
                Arc::new(ProjectFormat::new(Arc::clone(&config))),
                Arc::new(DefaultFormat),
            ],
            transform_hooks: vec![
                Arc::new(ProjectTransform::new(Arc::clone(&config), transformer)),
                Arc::new(DefaultTransform),
            ],
            config,
        }
    }

    /// The loader's configuration
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Resolve a specifier against an optional parent module
    pub async fn resolve(&self, specifier: &str, parent: Option<&Url>) -> Result<Resolution> {
        let request = ResolveRequest {
            specifier: specifier.to_string(),
            parent: parent.cloned(),
            conditions: self.config.conditions.clone(),
        };
        NextResolve {
            hooks: &self.resolve_hooks,
        }
        .run(&request)
        .await
    }

    /// Classify the format of a module URL
    pub async fn format(&self, url: &Url) -> Result<ModuleFormat> {
        let request = FormatRequest {
            url: url.clone(),
            declared: None,
        };
        NextFormat {
            hooks: &self.format_hooks,
        }
        .run(&request)
        .await
    }

    /// Transform raw module source
    pub async fn transform(
        &self,
        source: Bytes,
        url: &Url,
        format: ModuleFormat,
    ) -> Result<TransformedSource> {
        let request = TransformRequest {
            url: url.clone(),
            format,
            source,
        };
        NextTransform {
            hooks: &self.transform_hooks,
        }
        .run(&request)
        .await
    }
}

/// Convert a filesystem path to a `file://` URL
pub fn file_url(path: &Path) -> Result<Url> {
    Url::from_file_path(path).map_err(|_| LoaderError::InvalidPath(path.to_path_buf()))
}

/// Convert a `file://` URL back to a filesystem path
pub fn url_to_path(url: &Url) -> Result<PathBuf> {
    url.to_file_path()
        .map_err(|_| LoaderError::InvalidUrl(url.to_string()))
}
