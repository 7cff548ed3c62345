// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Loader configuration
//!
//! All knobs the hooks consult are computed once at startup and passed
//! by value into the pipeline. Nothing here is global or mutable.

use std::path::{Path, PathBuf};

/// Alias prefixes that remap to the project base directory
pub const ALIAS_PREFIXES: &[&str] = &["~/", "@/"];

/// Condition names accepted during resolution, in match order
pub const DEFAULT_CONDITIONS: &[&str] = &["import", "require", "default"];

/// File extensions probed during resolution, in probe order
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".tsx", ".ts", ".jsx", ".mjs", ".js", ".cjs", ".json", ".node",
];

/// Directory segment marking third-party code, excluded from interception
pub const DEPENDENCY_DIR: &str = "node_modules";

/// Configuration for a loader instance
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Base directory that alias prefixes resolve against
    pub base_dir: PathBuf,
    /// Condition names accepted during resolution
    pub conditions: Vec<String>,
    /// File extensions to probe, in order
    pub extensions: Vec<String>,
    /// Directory segment excluded from interception
    pub dependency_dir: String,
}

impl LoaderConfig {
    /// Discover configuration for a project rooted at `cwd`.
    ///
    /// The alias base is `<cwd>/src` if that directory exists, else
    /// `cwd` itself.
    pub fn discover(cwd: &Path) -> Self {
        let src = cwd.join("src");
        let base_dir = if src.is_dir() { src } else { cwd.to_path_buf() };

        Self {
            base_dir,
            conditions: DEFAULT_CONDITIONS.iter().map(|s| s.to_string()).collect(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            dependency_dir: DEPENDENCY_DIR.to_string(),
        }
    }

    /// Check whether a path passes through the dependency directory
    pub fn is_dependency_path(&self, path: &Path) -> bool {
        path.components()
            .any(|c| c.as_os_str() == self.dependency_dir.as_str())
    }

    /// Strip a recognized alias prefix from a specifier.
    ///
    /// Returns the remainder if `specifier` starts with `~/` or `@/`.
    pub fn strip_alias<'a>(&self, specifier: &'a str) -> Option<&'a str> {
        ALIAS_PREFIXES
            .iter()
            .find_map(|prefix| specifier.strip_prefix(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_prefers_src() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoaderConfig::discover(dir.path());
        assert_eq!(config.base_dir, dir.path());

        std::fs::create_dir(dir.path().join("src")).unwrap();
        let config = LoaderConfig::discover(dir.path());
        assert_eq!(config.base_dir, dir.path().join("src"));
    }

    #[test]
    fn test_strip_alias() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoaderConfig::discover(dir.path());

        assert_eq!(config.strip_alias("~/foo"), Some("foo"));
        assert_eq!(config.strip_alias("@/foo/bar"), Some("foo/bar"));
        assert_eq!(config.strip_alias("./foo"), None);
        assert_eq!(config.strip_alias("lodash"), None);
        // A bare `@scope/pkg` specifier is not an alias
        assert_eq!(config.strip_alias("@scope/pkg"), None);
    }

    #[test]
    fn test_is_dependency_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoaderConfig::discover(dir.path());

        assert!(config.is_dependency_path(Path::new("/app/node_modules/lodash/index.js")));
        assert!(!config.is_dependency_path(Path::new("/app/src/index.js")));
        // Only whole path segments count
        assert!(!config.is_dependency_path(Path::new("/app/node_modules_backup/a.js")));
    }
}
