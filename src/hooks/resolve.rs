// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Resolve-stage handlers

use crate::config::LoaderConfig;
use crate::error::{LoaderError, Result};
use crate::hooks::{NextResolve, Resolution, ResolveHook, ResolveRequest, file_url, url_to_path};
use crate::resolver::FileResolver;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Built-in module names the default resolver recognizes
pub const BUILTIN_MODULES: &[&str] = &[
    "assert", "buffer", "child_process", "console", "crypto", "dns", "events", "fs", "http",
    "https", "module", "net", "os", "path", "process", "querystring", "readline", "stream",
    "timers", "tls", "tty", "url", "util", "vm", "zlib",
];

/// Resolves relative specifiers and alias prefixes by probing.
///
/// A miss never fails the load: the request falls through to the next
/// handler unchanged.
pub struct AliasResolve {
    config: Arc<LoaderConfig>,
    resolver: Arc<FileResolver>,
}

impl AliasResolve {
    /// Create the hook over a shared resolver
    pub fn new(config: Arc<LoaderConfig>, resolver: Arc<FileResolver>) -> Self {
        Self { config, resolver }
    }
}

#[async_trait]
impl ResolveHook for AliasResolve {
    async fn resolve(
        &self,
        request: &ResolveRequest,
        next: NextResolve<'_>,
    ) -> Result<Resolution> {
        let specifier = request.specifier.as_str();

        if specifier.starts_with('.') {
            if let Some(dir) = parent_dir(request.parent.as_ref()) {
                if let Some(path) = self.resolver.resolve(&dir, specifier) {
                    debug!(specifier, resolved = %path.display(), "relative specifier intercepted");
                    return Ok(Resolution {
                        url: file_url(&path)?,
                    });
                }
            }
        } else if let Some(rest) = self.config.strip_alias(specifier) {
            if let Some(path) = self.resolver.resolve(&self.config.base_dir, rest) {
                debug!(specifier, resolved = %path.display(), "alias specifier intercepted");
                return Ok(Resolution {
                    url: file_url(&path)?,
                });
            }
        }

        next.run(request).await
    }
}

/// Terminal resolve handler, modeling the host's default resolution.
///
/// Recognizes built-in module names, absolute URLs, exact relative
/// paths, and packages under the dependency directory (walking up from
/// the parent module).
pub struct DefaultResolve {
    resolver: Arc<FileResolver>,
}

impl DefaultResolve {
    /// Create the terminal handler over a shared resolver
    pub fn new(resolver: Arc<FileResolver>) -> Self {
        Self { resolver }
    }

    fn resolve_node_modules(&self, specifier: &str, from: &PathBuf) -> Option<PathBuf> {
        let mut current = Some(from.as_path());
        while let Some(dir) = current {
            let node_modules = dir.join("node_modules");
            if node_modules.is_dir() {
                if let Some(path) = self.resolver.resolve(&node_modules, specifier) {
                    return Some(path);
                }
            }
            current = dir.parent();
        }
        None
    }
}

#[async_trait]
impl ResolveHook for DefaultResolve {
    async fn resolve(
        &self,
        request: &ResolveRequest,
        _next: NextResolve<'_>,
    ) -> Result<Resolution> {
        let specifier = request.specifier.as_str();

        // Built-in modules, with or without the scheme prefix
        let bare = specifier.strip_prefix("node:").unwrap_or(specifier);
        if BUILTIN_MODULES.contains(&bare) {
            let url = Url::parse(&format!("node:{bare}"))
                .map_err(|_| LoaderError::InvalidUrl(specifier.to_string()))?;
            return Ok(Resolution { url });
        }

        // Already a URL
        if let Ok(url) = Url::parse(specifier) {
            return Ok(Resolution { url });
        }

        let dir = parent_dir(request.parent.as_ref()).ok_or_else(|| LoaderError::Resolve {
            module: specifier.to_string(),
            reason: "no parent module and no working directory".to_string(),
        })?;

        // Exact relative or absolute path; the default never probes
        // extensions
        if specifier.starts_with('.') || specifier.starts_with('/') {
            let path = dir.join(specifier);
            if path.is_file() {
                return Ok(Resolution {
                    url: file_url(&path.canonicalize()?)?,
                });
            }
            return Err(LoaderError::module_not_found(specifier));
        }

        // Bare specifier: dependency-directory walk-up
        if let Some(path) = self.resolve_node_modules(specifier, &dir) {
            debug!(specifier, resolved = %path.display(), "resolved from node_modules");
            return Ok(Resolution {
                url: file_url(&path)?,
            });
        }

        Err(LoaderError::module_not_found(specifier))
    }
}

/// Directory of the parent module, falling back to the working
/// directory when there is no parent (the entry point).
fn parent_dir(parent: Option<&Url>) -> Option<PathBuf> {
    match parent {
        Some(url) => {
            let path = url_to_path(url).ok()?;
            path.parent().map(|p| p.to_path_buf())
        }
        None => std::env::current_dir().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::Loader;
    use std::fs;

    fn loader_for(dir: &std::path::Path) -> Loader {
        Loader::new(LoaderConfig::discover(dir))
    }

    fn parent_url(dir: &std::path::Path, name: &str) -> Url {
        file_url(&dir.join(name)).unwrap()
    }

    #[tokio::test]
    async fn test_relative_specifier_probes_extensions() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("dep.ts"), "export {};").unwrap();
        fs::write(dir.path().join("main.js"), "").unwrap();

        let loader = loader_for(dir.path());
        let parent = parent_url(dir.path(), "main.js");
        let resolution = loader.resolve("./dep", Some(&parent)).await.unwrap();
        assert!(resolution.url.path().ends_with("dep.ts"));
    }

    #[tokio::test]
    async fn test_alias_prefixes_agree() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/util.js"), "export {};").unwrap();
        fs::write(dir.path().join("src/main.js"), "").unwrap();

        let loader = loader_for(dir.path());
        let parent = parent_url(&dir.path().join("src"), "main.js");

        let tilde = loader.resolve("~/util", Some(&parent)).await.unwrap();
        let at = loader.resolve("@/util", Some(&parent)).await.unwrap();
        assert_eq!(tilde.url, at.url);
        assert!(tilde.url.path().ends_with("src/util.js"));
    }

    #[tokio::test]
    async fn test_unresolvable_alias_falls_through() {
        let dir = tempfile::tempdir().unwrap();
        let loader = loader_for(dir.path());

        // The alias misses, and the default resolver cannot find it
        // either: the error is the default handler's, not the alias
        // hook's.
        let err = loader.resolve("~/missing", None).await.unwrap_err();
        assert!(matches!(err, LoaderError::ModuleNotFound(_)));
    }

    #[tokio::test]
    async fn test_builtin_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let loader = loader_for(dir.path());

        let fs_mod = loader.resolve("fs", None).await.unwrap();
        assert_eq!(fs_mod.url.as_str(), "node:fs");

        let prefixed = loader.resolve("node:path", None).await.unwrap();
        assert_eq!(prefixed.url.as_str(), "node:path");
    }

    #[tokio::test]
    async fn test_node_modules_walk_up() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("node_modules/leftpad");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("package.json"), r#"{"main": "index.js"}"#).unwrap();
        fs::write(pkg.join("index.js"), "module.exports = {};").unwrap();

        let nested = dir.path().join("src/deep");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("mod.js"), "").unwrap();

        let loader = loader_for(dir.path());
        let parent = parent_url(&nested, "mod.js");
        let resolution = loader.resolve("leftpad", Some(&parent)).await.unwrap();
        assert!(resolution.url.path().ends_with("leftpad/index.js"));
    }

    #[tokio::test]
    async fn test_default_does_not_probe_extensions() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.js"), "").unwrap();

        let loader = loader_for(dir.path());
        let parent = parent_url(dir.path(), "main.js");

        // The alias hook misses ./nope.js; the default requires an
        // exact file and errors instead of probing.
        let err = loader.resolve("./nope.js", Some(&parent)).await.unwrap_err();
        assert!(matches!(err, LoaderError::ModuleNotFound(_)));
    }
}
