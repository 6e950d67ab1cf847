//! Component registry keyed by path-derived identifiers.
//!
//! Registration happens once, before lookups begin; the registry is an owned
//! value handed to whatever installs components into the host framework.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::component_resolver::{ComponentKind, ComponentValue, RegistryError};
use crate::options::PathMatcherOptions;
use crate::path_matcher::PathMatcher;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedComponent {
    pub component: ComponentValue,
    pub kind: ComponentKind,
    /// Path the component was registered from, before normalization.
    pub path: String,
}

/// Framework integration point that receives registered components.
pub trait ComponentHost {
    fn component(&mut self, id: &str, component: &ComponentValue);
}

#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    matcher: PathMatcher,
    components: HashMap<String, ResolvedComponent>,
}

impl ComponentRegistry {
    pub fn new(options: &PathMatcherOptions) -> Self {
        Self {
            matcher: PathMatcher::new(options),
            components: HashMap::new(),
        }
    }

    pub fn matcher(&self) -> &PathMatcher {
        &self.matcher
    }

    /// Registers `value` under the id derived from `file_path`, replacing any
    /// previous entry. Unclassifiable values are rejected.
    pub fn register(&mut self, file_path: &str, value: ComponentValue) -> Result<String, RegistryError> {
        let id = self.matcher.generate_component_id(file_path);
        let kind = ComponentKind::classify(&value, file_path)?;
        debug!(id = %id, kind = ?kind, path = file_path, "registered component");

        self.components.insert(
            id.clone(),
            ResolvedComponent {
                component: value,
                kind,
                path: file_path.to_string(),
            },
        );
        Ok(id)
    }

    /// Registers `(file name, value)` pairs, prefixing each name with
    /// `base_path/` when `base_path` is non-empty. Stops at the first failure.
    pub fn register_all<I, S>(&mut self, entries: I, base_path: &str) -> Result<Vec<String>, RegistryError>
    where
        I: IntoIterator<Item = (S, ComponentValue)>,
        S: AsRef<str>,
    {
        let mut ids = Vec::new();
        for (file_name, value) in entries {
            let full_path = if base_path.is_empty() {
                file_name.as_ref().to_string()
            } else {
                format!("{}/{}", base_path, file_name.as_ref())
            };
            ids.push(self.register(&full_path, value)?);
        }
        Ok(ids)
    }

    pub fn resolve(&self, candidates: &[&str]) -> Option<String> {
        self.matcher.match_closest(&self.components, candidates)
    }

    pub fn get_component_by_path(&self, candidates: &[&str]) -> Option<&ResolvedComponent> {
        self.resolve(candidates)
            .and_then(|id| self.components.get(&id))
    }

    pub fn get(&self, id: &str) -> Option<&ResolvedComponent> {
        self.components.get(id)
    }

    pub fn components(&self) -> &HashMap<String, ResolvedComponent> {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Hands every registered component to `host` under its id.
    pub fn install(&self, host: &mut impl ComponentHost) {
        let mut ids: Vec<&String> = self.components.keys().collect();
        ids.sort();
        for id in ids {
            host.component(id, &self.components[id].component);
        }
    }
}
