use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;
use thiserror::Error;

pub const INDEX_FILE: &str = "index.html";

pub const CACHE_IMMUTABLE: &str = "public, max-age=31536000, immutable";
pub const CACHE_REVALIDATE: &str = "no-cache";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("path is not valid percent-encoded UTF-8")]
    Encoding,

    #[error("path escapes the asset root")]
    Traversal,

    #[error("path contains a forbidden character")]
    ForbiddenCharacter,
}

/// A request path mapped onto the asset root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Normalized request path, always starting with `/`.
    pub request_path: String,
    pub file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    /// Decodes and normalizes `raw` (the URI path, without query) and maps it
    /// under the root. Any `..` segment is rejected outright, so a resolved
    /// file can never sit outside the root.
    pub fn resolve(&self, raw: &str) -> Result<Resolved, PathError> {
        let decoded = percent_decode_str(raw)
            .decode_utf8()
            .map_err(|_| PathError::Encoding)?;

        if decoded.contains(|c| c == '\\' || c == '\0') {
            return Err(PathError::ForbiddenCharacter);
        }

        let mut segments = Vec::new();
        for segment in decoded.split('/') {
            match segment {
                "" | "." => {}
                ".." => return Err(PathError::Traversal),
                s => segments.push(s),
            }
        }
        if segments.is_empty() {
            segments.push(INDEX_FILE);
        }

        let file = segments
            .iter()
            .fold(self.root.clone(), |path, segment| path.join(segment));
        Ok(Resolved {
            request_path: format!("/{}", segments.join("/")),
            file,
        })
    }
}

pub fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        _ => "application/octet-stream",
    }
}

/// Fingerprinted bundles under `/assets/` never change; everything else is
/// revalidated.
pub fn cache_policy(request_path: &str) -> &'static str {
    if request_path.starts_with("/assets/") {
        CACHE_IMMUTABLE
    } else {
        CACHE_REVALIDATE
    }
}
