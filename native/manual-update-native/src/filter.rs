//! Inclusion/exclusion predicate over module identifiers.
//!
//! ## Semantics
//!
//! 1. Identifiers containing a NUL byte (virtual modules) never match
//! 2. Backslashes are normalized to `/` before any rule is tested
//! 3. Exclusions win over inclusions
//! 4. An empty inclusion list includes everything not excluded

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use regex::Regex;

use crate::options::FilterRule;
use crate::outcome::TransformError;

/// Compiled form of one rule list: globs share a set, regexes are kept apart.
#[derive(Debug)]
struct RuleSet {
    globs: GlobSet,
    patterns: Vec<Regex>,
    len: usize,
}

impl RuleSet {
    fn build(rules: &[FilterRule]) -> Result<Self, TransformError> {
        let mut builder = GlobSetBuilder::new();
        let mut patterns = Vec::new();

        for rule in rules {
            match rule {
                FilterRule::Glob(pattern) => {
                    let glob = GlobBuilder::new(&normalize_id(pattern))
                        .literal_separator(true)
                        .build()
                        .map_err(|e| TransformError::Config {
                            message: format!("invalid glob pattern '{}': {}", pattern, e),
                        })?;
                    builder.add(glob);
                }
                FilterRule::Pattern { regex } => {
                    let compiled = Regex::new(regex).map_err(|e| TransformError::Config {
                        message: format!("invalid regex pattern '{}': {}", regex, e),
                    })?;
                    patterns.push(compiled);
                }
            }
        }

        let globs = builder.build().map_err(|e| TransformError::Config {
            message: format!("failed to build glob set: {}", e),
        })?;

        Ok(Self {
            globs,
            patterns,
            len: rules.len(),
        })
    }

    fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn matches(&self, id: &str) -> bool {
        self.globs.is_match(id) || self.patterns.iter().any(|re| re.is_match(id))
    }
}

#[derive(Debug)]
pub struct FileFilter {
    include: RuleSet,
    exclude: RuleSet,
}

impl FileFilter {
    pub fn new(include: &[FilterRule], exclude: &[FilterRule]) -> Result<Self, TransformError> {
        Ok(Self {
            include: RuleSet::build(include)?,
            exclude: RuleSet::build(exclude)?,
        })
    }

    pub fn matches(&self, id: &str) -> bool {
        if id.contains('\0') {
            return false;
        }

        let id = normalize_id(id);
        if self.exclude.matches(&id) {
            return false;
        }

        self.include.is_empty() || self.include.matches(&id)
    }
}

fn normalize_id(id: &str) -> String {
    id.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(include: &[FilterRule], exclude: &[FilterRule]) -> FileFilter {
        FileFilter::new(include, exclude).unwrap()
    }

    #[test]
    fn test_double_star_matches_bare_file_name() {
        let f = filter(&[FilterRule::glob("**/*.vue")], &[]);
        assert!(f.matches("Test.vue"));
        assert!(f.matches("src/components/Test.vue"));
        assert!(!f.matches("src/components/Test.tsx"));
    }

    #[test]
    fn test_single_star_does_not_cross_separator() {
        let f = filter(&[FilterRule::glob("src/*.ts")], &[]);
        assert!(f.matches("src/main.ts"));
        assert!(!f.matches("src/nested/main.ts"));
    }

    #[test]
    fn test_exclude_wins_on_overlap() {
        let f = filter(
            &[FilterRule::glob("**/*.ts")],
            &[FilterRule::glob("**/node_modules/**")],
        );
        assert!(f.matches("src/render.ts"));
        assert!(!f.matches("app/node_modules/vue/index.ts"));
    }

    #[test]
    fn test_regex_rules() {
        let f = filter(&[FilterRule::regex(r"\.tsx$")], &[FilterRule::regex("legacy")]);
        assert!(f.matches("src/App.tsx"));
        assert!(!f.matches("src/legacy/App.tsx"));
        assert!(!f.matches("src/App.vue"));
    }

    #[test]
    fn test_empty_include_matches_everything() {
        let f = filter(&[], &[FilterRule::glob("**/*.css")]);
        assert!(f.matches("src/App.vue"));
        assert!(!f.matches("src/style.css"));
    }

    #[test]
    fn test_virtual_and_windows_ids() {
        let f = filter(&[FilterRule::glob("src/**/*.vue")], &[]);
        assert!(!f.matches("\0src/virtual.vue"));
        assert!(f.matches("src\\components\\Card.vue"));
    }

    #[test]
    fn test_invalid_rules_are_config_errors() {
        assert!(matches!(
            FileFilter::new(&[FilterRule::glob("src/[a.vue")], &[]),
            Err(TransformError::Config { .. })
        ));
        assert!(matches!(
            FileFilter::new(&[], &[FilterRule::regex("(unclosed")]),
            Err(TransformError::Config { .. })
        ));
    }
}
