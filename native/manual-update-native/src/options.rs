//! Plugin and registry configuration.
//!
//! Both option sets deserialize from the camelCase JSON objects a host build
//! tool hands over, with every field optional.

use serde::{Deserialize, Serialize};

use crate::outcome::TransformError;

pub const DEFAULT_MARKER_ATTRIBUTE: &str = "__manualUpdateMarker";
pub const DEFAULT_UPDATE_FUNCTION_NAME: &str = "triggerUpdate";
pub const DEFAULT_TRIGGER_REF_NAME: &str = "__manualUpdateTrigger";

// ═══════════════════════════════════════════════════════════════════════════════
// FILTER RULES
// ═══════════════════════════════════════════════════════════════════════════════

/// A single inclusion or exclusion rule.
///
/// Plain strings are globs (`**/*.vue`); objects carry a regular expression
/// (`{ "regex": "\\.tsx$" }`) tested anywhere in the identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterRule {
    Glob(String),
    Pattern { regex: String },
}

impl FilterRule {
    pub fn glob(pattern: &str) -> Self {
        FilterRule::Glob(pattern.to_string())
    }

    pub fn regex(pattern: &str) -> Self {
        FilterRule::Pattern {
            regex: pattern.to_string(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRANSFORM CONFIG
// ═══════════════════════════════════════════════════════════════════════════════

/// Immutable configuration for one plugin instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformConfig {
    pub include: Vec<FilterRule>,
    pub exclude: Vec<FilterRule>,
    /// Synthetic prop added to render nodes.
    pub marker_attribute: String,
    /// Exported function that bumps the trigger.
    pub update_function_name: String,
    /// Module-level binding holding the trigger counter.
    pub trigger_ref_name: String,
    pub log_errors: bool,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
            marker_attribute: DEFAULT_MARKER_ATTRIBUTE.to_string(),
            update_function_name: DEFAULT_UPDATE_FUNCTION_NAME.to_string(),
            trigger_ref_name: DEFAULT_TRIGGER_REF_NAME.to_string(),
            log_errors: true,
        }
    }
}

impl TransformConfig {
    pub fn from_json(json: &str) -> Result<Self, TransformError> {
        serde_json::from_str(json).map_err(|e| TransformError::Config {
            message: format!("invalid plugin options: {}", e),
        })
    }

    pub fn with_include(mut self, rules: Vec<FilterRule>) -> Self {
        self.include = rules;
        self
    }

    pub fn with_exclude(mut self, rules: Vec<FilterRule>) -> Self {
        self.exclude = rules;
        self
    }

    pub fn with_log_errors(mut self, log_errors: bool) -> Self {
        self.log_errors = log_errors;
        self
    }

    /// The read expression every rewritten render site carries, e.g.
    /// `__manualUpdateTrigger.value`.
    pub fn trigger_value_access(&self) -> String {
        format!("{}.value", self.trigger_ref_name)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REGISTRY PATH OPTIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BaseDirs {
    One(String),
    Many(Vec<String>),
}

impl BaseDirs {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            BaseDirs::One(dir) => vec![dir.clone()],
            BaseDirs::Many(dirs) => dirs.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PathMatcherOptions {
    pub base_dir: Option<BaseDirs>,
    pub extensions: Option<Vec<String>>,
    pub path_separator: Option<String>,
}

impl PathMatcherOptions {
    pub fn from_json(json: &str) -> Result<Self, TransformError> {
        serde_json::from_str(json).map_err(|e| TransformError::Config {
            message: format!("invalid path matcher options: {}", e),
        })
    }

    pub fn with_base_dirs(mut self, dirs: &[&str]) -> Self {
        self.base_dir = Some(BaseDirs::Many(
            dirs.iter().map(|d| d.to_string()).collect(),
        ));
        self
    }
}
