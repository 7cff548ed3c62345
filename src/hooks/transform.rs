// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Transform-stage handlers

use crate::config::LoaderConfig;
use crate::error::Result;
use crate::hooks::{NextTransform, TransformHook, TransformRequest, TransformedSource, url_to_path};
use crate::json_module::data_to_module;
use crate::transform::SourceTransformer;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Transforms project-owned sources.
///
/// JSON files become module source with named constant exports; other
/// sources pass through the transformer, which appends an inline source
/// map and accepts top-level `await`. Parse failures propagate and fail
/// that module's load. Files under the dependency directory and
/// non-`file:` URLs are delegated untouched.
pub struct ProjectTransform {
    config: Arc<LoaderConfig>,
    transformer: Arc<SourceTransformer>,
}

impl ProjectTransform {
    /// Create the hook over a shared transformer
    pub fn new(config: Arc<LoaderConfig>, transformer: Arc<SourceTransformer>) -> Self {
        Self {
            config,
            transformer,
        }
    }
}

#[async_trait]
impl TransformHook for ProjectTransform {
    async fn transform(
        &self,
        request: &TransformRequest,
        next: NextTransform<'_>,
    ) -> Result<TransformedSource> {
        if request.url.scheme() == "file" {
            if let Ok(path) = url_to_path(&request.url) {
                if !self.config.is_dependency_path(&path) {
                    if path.extension().and_then(|e| e.to_str()) == Some("json") {
                        let data: serde_json::Value = serde_json::from_slice(&request.source)?;
                        debug!(url = %request.url, "json converted to module source");
                        return Ok(TransformedSource {
                            source: data_to_module(&data),
                        });
                    }

                    let text = std::str::from_utf8(&request.source)?;
                    let transformed = self.transformer.transform(text, &path)?;
                    debug!(
                        url = %request.url,
                        top_level_await = transformed.top_level_await,
                        "source transformed"
                    );
                    return Ok(TransformedSource {
                        source: transformed.code,
                    });
                }
            }
        }

        next.run(request).await
    }
}

/// Terminal transform handler: the source passes through unchanged
pub struct DefaultTransform;

#[async_trait]
impl TransformHook for DefaultTransform {
    async fn transform(
        &self,
        request: &TransformRequest,
        _next: NextTransform<'_>,
    ) -> Result<TransformedSource> {
        Ok(TransformedSource {
            source: String::from_utf8_lossy(&request.source).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoaderError;
    use crate::hooks::{Loader, ModuleFormat, file_url};
    use bytes::Bytes;
    use std::fs;

    fn loader_for(dir: &std::path::Path) -> Loader {
        Loader::new(LoaderConfig::discover(dir))
    }

    #[tokio::test]
    async fn test_json_becomes_module_source() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("data.json"), r#"{"a":1}"#).unwrap();

        let loader = loader_for(dir.path());
        let url = file_url(&dir.path().join("data.json")).unwrap();
        let out = loader
            .transform(Bytes::from_static(br#"{"a":1}"#), &url, ModuleFormat::Json)
            .await
            .unwrap();

        assert!(out.source.contains("export const a = 1;"));
        assert!(out.source.contains("export default {a};"));
    }

    #[tokio::test]
    async fn test_malformed_json_fails_the_load() {
        let dir = tempfile::tempdir().unwrap();
        let loader = loader_for(dir.path());
        let url = file_url(&dir.path().join("bad.json")).unwrap();

        let err = loader
            .transform(Bytes::from_static(b"{oops"), &url, ModuleFormat::Json)
            .await
            .unwrap_err();
        assert!(matches!(err, LoaderError::JsonParse(_)));
    }

    #[tokio::test]
    async fn test_source_gets_inline_map() {
        let dir = tempfile::tempdir().unwrap();
        let loader = loader_for(dir.path());
        let url = file_url(&dir.path().join("mod.js")).unwrap();

        let out = loader
            .transform(
                Bytes::from_static(b"await ready();\n"),
                &url,
                ModuleFormat::Module,
            )
            .await
            .unwrap();
        assert!(out.source.starts_with("await ready();\n"));
        assert!(out.source.contains("//# sourceMappingURL=data:application/json"));
    }

    #[tokio::test]
    async fn test_dependency_source_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let dep = dir.path().join("node_modules/dep/index.js");
        fs::create_dir_all(dep.parent().unwrap()).unwrap();

        let loader = loader_for(dir.path());
        let url = file_url(&dep).unwrap();
        let source = b"module.exports = 1; /* unterminated";
        let out = loader
            .transform(Bytes::from_static(source), &url, ModuleFormat::CommonJs)
            .await
            .unwrap();

        // Delegated: not transformed, not even scanned
        assert_eq!(out.source.as_bytes(), source);
    }

    #[tokio::test]
    async fn test_non_file_url_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let loader = loader_for(dir.path());
        let url = url::Url::parse("https://example.com/mod.js").unwrap();

        let out = loader
            .transform(Bytes::from_static(b"await x;"), &url, ModuleFormat::Module)
            .await
            .unwrap();
        assert_eq!(out.source, "await x;");
    }
}
