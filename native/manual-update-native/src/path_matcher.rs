//! Path-derived component identifiers and closest-match lookup.

use std::collections::HashMap;

use crate::options::PathMatcherOptions;

pub const DEFAULT_BASE_DIR: &str = "src/components";
pub const DEFAULT_EXTENSIONS: [&str; 4] = [".vue", ".tsx", ".ts", ".js"];
pub const DEFAULT_PATH_SEPARATOR: &str = "/";

/// Identifier returned for a base directory itself, and the last-resort match.
pub const INDEX_ID: &str = "index";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatcher {
    base_dirs: Vec<String>,
    extensions: Vec<String>,
    path_separator: String,
}

impl Default for PathMatcher {
    fn default() -> Self {
        Self::new(&PathMatcherOptions::default())
    }
}

impl PathMatcher {
    pub fn new(options: &PathMatcherOptions) -> Self {
        let base_dirs = options
            .base_dir
            .as_ref()
            .map(|dirs| dirs.to_vec())
            .unwrap_or_else(|| vec![DEFAULT_BASE_DIR.to_string()]);
        let extensions = options
            .extensions
            .clone()
            .unwrap_or_else(|| DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect());
        let path_separator = options
            .path_separator
            .clone()
            .filter(|sep| !sep.is_empty())
            .unwrap_or_else(|| DEFAULT_PATH_SEPARATOR.to_string());

        Self {
            base_dirs,
            extensions,
            path_separator,
        }
    }

    pub fn path_separator(&self) -> &str {
        &self.path_separator
    }

    /// Strips the first matching extension, then rewrites `/` and `\` to the
    /// configured separator.
    pub fn normalize_path(&self, path: &str) -> String {
        let stem = self
            .extensions
            .iter()
            .find_map(|ext| path.strip_suffix(ext.as_str()))
            .unwrap_or(path);
        stem.replace(['/', '\\'], self.path_separator.as_str())
    }

    pub fn generate_component_id(&self, file_path: &str) -> String {
        let normalized = self.normalize_path(file_path);

        for base_dir in &self.base_dirs {
            let base = self.normalize_path(base_dir);
            if let Some(relative) = normalized.strip_prefix(base.as_str()) {
                let relative = relative
                    .strip_prefix(self.path_separator.as_str())
                    .unwrap_or(relative);
                if relative.is_empty() {
                    return INDEX_ID.to_string();
                }
                return relative.to_string();
            }
        }

        normalized
    }

    /// Finds the registered id closest to any of `targets`.
    ///
    /// Exact matches across all targets win over ancestor matches; ancestors
    /// are tried per target from the longest prefix down. `index` is the
    /// fallback when registered.
    pub fn match_closest<V>(&self, registry: &HashMap<String, V>, targets: &[&str]) -> Option<String> {
        let normalized: Vec<String> = targets.iter().map(|t| self.normalize_path(t)).collect();

        if let Some(exact) = normalized.iter().find(|t| registry.contains_key(t.as_str())) {
            return Some(exact.clone());
        }

        for target in &normalized {
            let segments: Vec<&str> = target.split(self.path_separator.as_str()).collect();
            for len in (1..segments.len()).rev() {
                let partial = segments[..len].join(self.path_separator.as_str());
                if !partial.is_empty() && registry.contains_key(&partial) {
                    return Some(partial);
                }
            }
        }

        registry
            .contains_key(INDEX_ID)
            .then(|| INDEX_ID.to_string())
    }
}
