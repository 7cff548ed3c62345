// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! File resolution by extension and condition probing
//!
//! A miss is a `None`, never an error: the hooks treat unresolvable
//! specifiers as an invitation to fall through, and filesystem trouble
//! during probing counts as a miss.

use dashmap::DashMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Probing resolver with per-`(directory, request)` memoization.
///
/// Probe order for `resolve(dir, request)`:
/// 1. the joined path as-is,
/// 2. the joined path with each configured extension appended,
/// 3. if the joined path is a directory: its `package.json` (`exports`
///    root entry against the condition list, then `main`), then
///    `index` with each extension.
pub struct FileResolver {
    /// Condition names accepted when matching `exports` entries
    conditions: Vec<String>,
    /// Extensions to probe, in order
    extensions: Vec<String>,
    /// Memoized results
    cache: DashMap<(PathBuf, String), Option<PathBuf>>,
}

impl FileResolver {
    /// Create a resolver with the given condition and extension lists
    pub fn new(conditions: Vec<String>, extensions: Vec<String>) -> Self {
        Self {
            conditions,
            extensions,
            cache: DashMap::new(),
        }
    }

    /// Resolve `request` against `dir`.
    ///
    /// `request` may be relative (`./x`, `../x`), a bare name, or
    /// absolute; it is joined onto `dir` before probing.
    pub fn resolve(&self, dir: &Path, request: &str) -> Option<PathBuf> {
        let key = (dir.to_path_buf(), request.to_string());
        if let Some(hit) = self.cache.get(&key) {
            return hit.clone();
        }

        let result = self.resolve_uncached(dir, request);
        trace!(?dir, request, resolved = ?result, "probe");
        self.cache.insert(key, result.clone());
        result
    }

    fn resolve_uncached(&self, dir: &Path, request: &str) -> Option<PathBuf> {
        let path = dir.join(request);

        if let Some(file) = self.probe(&path) {
            return Some(file);
        }

        if path.is_dir() {
            return self.resolve_directory(&path);
        }

        None
    }

    /// Probe a path as-is, then with each extension appended
    fn probe(&self, path: &Path) -> Option<PathBuf> {
        if path.is_file() {
            return Some(canonical(path));
        }

        for ext in &self.extensions {
            let mut candidate = path.as_os_str().to_os_string();
            candidate.push(ext);
            let with_ext = Path::new(&candidate);
            if with_ext.is_file() {
                return Some(canonical(with_ext));
            }
        }

        None
    }

    /// Resolve a directory: package.json entry points, then index files
    fn resolve_directory(&self, dir: &Path) -> Option<PathBuf> {
        let manifest_path = dir.join("package.json");
        if manifest_path.is_file() {
            if let Some(manifest) = read_manifest(&manifest_path) {
                // "exports" takes precedence over "main"
                if let Some(exports) = &manifest.exports {
                    if let Some(target) = self.match_exports(root_entry(exports)) {
                        if let Some(file) = self.probe(&dir.join(target.trim_start_matches("./")))
                        {
                            return Some(file);
                        }
                    }
                }
                if let Some(main) = &manifest.main {
                    if let Some(file) = self.probe(&dir.join(main)) {
                        return Some(file);
                    }
                }
            }
        }

        for ext in &self.extensions {
            let index = dir.join(format!("index{ext}"));
            if index.is_file() {
                return Some(canonical(&index));
            }
        }

        None
    }

    /// Match an `exports` value against the accepted conditions.
    ///
    /// A string is a direct target. An object is scanned in declaration
    /// order; keys naming an accepted condition (or `default`) recurse
    /// into their value.
    fn match_exports<'a>(&self, value: Option<&'a serde_json::Value>) -> Option<&'a str> {
        match value? {
            serde_json::Value::String(target) => Some(target),
            serde_json::Value::Object(map) => map.iter().find_map(|(key, value)| {
                let accepted =
                    key == "default" || self.conditions.iter().any(|c| c == key);
                if accepted {
                    self.match_exports(Some(value))
                } else {
                    None
                }
            }),
            _ => None,
        }
    }
}

/// Pick the root entry of an `exports` field.
///
/// `exports` may be a direct target or a subpath map keyed by `"."`.
fn root_entry(exports: &serde_json::Value) -> Option<&serde_json::Value> {
    match exports {
        serde_json::Value::Object(map) if map.keys().any(|k| k.starts_with('.')) => map.get("."),
        other => Some(other),
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn read_manifest(path: &Path) -> Option<PackageManifest> {
    let content = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

/// Minimal package.json structure for resolution
#[derive(Debug, Deserialize)]
struct PackageManifest {
    main: Option<String>,
    #[serde(default)]
    exports: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn resolver() -> FileResolver {
        FileResolver::new(
            crate::config::DEFAULT_CONDITIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            crate::config::DEFAULT_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }

    #[test]
    fn test_probe_extensions_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("foo.js"), "export {};").unwrap();
        fs::write(dir.path().join("foo.ts"), "export {};").unwrap();

        // .ts comes before .js in the probe order
        let resolved = resolver().resolve(dir.path(), "./foo").unwrap();
        assert_eq!(resolved.file_name().unwrap(), "foo.ts");
    }

    #[test]
    fn test_exact_file_wins_over_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("foo"), "").unwrap();
        fs::write(dir.path().join("foo.ts"), "").unwrap();

        let resolved = resolver().resolve(dir.path(), "./foo").unwrap();
        assert_eq!(resolved.file_name().unwrap(), "foo");
    }

    #[test]
    fn test_miss_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolver().resolve(dir.path(), "./missing"), None);
    }

    #[test]
    fn test_directory_index() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("lib")).unwrap();
        fs::write(dir.path().join("lib/index.js"), "").unwrap();

        let resolved = resolver().resolve(dir.path(), "./lib").unwrap();
        assert_eq!(resolved.file_name().unwrap(), "index.js");
    }

    #[test]
    fn test_directory_main_field() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("pkg")).unwrap();
        fs::write(dir.path().join("pkg/package.json"), r#"{"main": "entry.js"}"#).unwrap();
        fs::write(dir.path().join("pkg/entry.js"), "").unwrap();
        fs::write(dir.path().join("pkg/index.js"), "").unwrap();

        let resolved = resolver().resolve(dir.path(), "./pkg").unwrap();
        assert_eq!(resolved.file_name().unwrap(), "entry.js");
    }

    #[test]
    fn test_exports_conditions() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("pkg")).unwrap();
        fs::write(
            dir.path().join("pkg/package.json"),
            r#"{"exports": {".": {"browser": "./browser.js", "import": "./esm.js", "default": "./cjs.js"}}, "main": "cjs.js"}"#,
        )
        .unwrap();
        fs::write(dir.path().join("pkg/browser.js"), "").unwrap();
        fs::write(dir.path().join("pkg/esm.js"), "").unwrap();
        fs::write(dir.path().join("pkg/cjs.js"), "").unwrap();

        // "browser" is not an accepted condition; "import" is
        let resolved = resolver().resolve(dir.path(), "./pkg").unwrap();
        assert_eq!(resolved.file_name().unwrap(), "esm.js");
    }

    #[test]
    fn test_exports_string_form() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("pkg")).unwrap();
        fs::write(
            dir.path().join("pkg/package.json"),
            r#"{"exports": "./only.js"}"#,
        )
        .unwrap();
        fs::write(dir.path().join("pkg/only.js"), "").unwrap();

        let resolved = resolver().resolve(dir.path(), "./pkg").unwrap();
        assert_eq!(resolved.file_name().unwrap(), "only.js");
    }

    #[test]
    fn test_memoization_survives_deletion() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("foo.js"), "").unwrap();

        let resolver = resolver();
        let first = resolver.resolve(dir.path(), "./foo");
        assert!(first.is_some());

        fs::remove_file(dir.path().join("foo.js")).unwrap();
        assert_eq!(resolver.resolve(dir.path(), "./foo"), first);
    }
}
