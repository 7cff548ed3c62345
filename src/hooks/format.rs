// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Format-stage handlers

use crate::config::LoaderConfig;
use crate::error::Result;
use crate::hooks::{FormatHook, FormatRequest, ModuleFormat, NextFormat, url_to_path};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Classifies project-owned files as ES modules.
///
/// Applies to `file:` URLs whose path has no dependency-directory
/// segment; everything else is delegated.
pub struct ProjectFormat {
    config: Arc<LoaderConfig>,
}

impl ProjectFormat {
    /// Create the hook
    pub fn new(config: Arc<LoaderConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl FormatHook for ProjectFormat {
    async fn format(&self, request: &FormatRequest, next: NextFormat<'_>) -> Result<ModuleFormat> {
        if request.url.scheme() == "file" {
            if let Ok(path) = url_to_path(&request.url) {
                if !self.config.is_dependency_path(&path) {
                    debug!(url = %request.url, "project file classified as module");
                    return Ok(ModuleFormat::Module);
                }
            }
        }
        next.run(request).await
    }
}

/// Terminal format handler, modeling the host's default classification.
///
/// `node:` URLs are built-ins. For files, the extension decides;
/// extensionless and `.js` files follow the nearest package.json
/// `"type"` field, defaulting to CommonJS.
pub struct DefaultFormat;

#[async_trait]
impl FormatHook for DefaultFormat {
    async fn format(&self, request: &FormatRequest, _next: NextFormat<'_>) -> Result<ModuleFormat> {
        if let Some(declared) = request.declared {
            return Ok(declared);
        }

        if request.url.scheme() == "node" {
            return Ok(ModuleFormat::Builtin);
        }

        let path = url_to_path(&request.url)?;
        let format = match path.extension().and_then(|e| e.to_str()) {
            Some("mjs") => ModuleFormat::Module,
            Some("cjs") => ModuleFormat::CommonJs,
            Some("json") => ModuleFormat::Json,
            Some("node") => ModuleFormat::Native,
            _ => package_type(&path).unwrap_or(ModuleFormat::CommonJs),
        };
        Ok(format)
    }
}

/// Walk up from `path` for a package.json `"type"` field
fn package_type(path: &Path) -> Option<ModuleFormat> {
    let mut current = path.parent();
    while let Some(dir) = current {
        let manifest = dir.join("package.json");
        if manifest.is_file() {
            let content = std::fs::read_to_string(&manifest).ok()?;
            let manifest: TypeManifest = serde_json::from_str(&content).ok()?;
            return match manifest.type_field.as_deref() {
                Some("module") => Some(ModuleFormat::Module),
                _ => Some(ModuleFormat::CommonJs),
            };
        }
        current = dir.parent();
    }
    None
}

/// Minimal package.json structure for type detection
#[derive(Debug, Deserialize)]
struct TypeManifest {
    #[serde(rename = "type")]
    type_field: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{Loader, file_url};
    use std::fs;

    #[tokio::test]
    async fn test_project_file_is_module() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("plain.cjs"), "").unwrap();

        let loader = Loader::new(LoaderConfig::discover(dir.path()));
        let url = file_url(&dir.path().join("plain.cjs")).unwrap();

        // Even a .cjs extension: project files are classified as
        // modules unconditionally.
        assert_eq!(loader.format(&url).await.unwrap(), ModuleFormat::Module);
    }

    #[tokio::test]
    async fn test_dependency_file_uses_default_rules() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("node_modules/dep");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("a.cjs"), "").unwrap();
        fs::write(pkg.join("b.mjs"), "").unwrap();
        fs::write(pkg.join("c.json"), "{}").unwrap();
        fs::write(pkg.join("package.json"), r#"{"type": "module"}"#).unwrap();
        fs::write(pkg.join("d.js"), "").unwrap();

        let loader = Loader::new(LoaderConfig::discover(dir.path()));
        let format = |name: &str| {
            let url = file_url(&pkg.join(name)).unwrap();
            let loader = &loader;
            async move { loader.format(&url).await.unwrap() }
        };

        assert_eq!(format("a.cjs").await, ModuleFormat::CommonJs);
        assert_eq!(format("b.mjs").await, ModuleFormat::Module);
        assert_eq!(format("c.json").await, ModuleFormat::Json);
        // .js follows the package.json "type" field
        assert_eq!(format("d.js").await, ModuleFormat::Module);
    }

    #[tokio::test]
    async fn test_builtin_url() {
        let dir = tempfile::tempdir().unwrap();
        let loader = Loader::new(LoaderConfig::discover(dir.path()));
        let url = url::Url::parse("node:fs").unwrap();
        assert_eq!(loader.format(&url).await.unwrap(), ModuleFormat::Builtin);
    }
}
