//! Closed classification of runtime component values.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rewriter::FACTORY_NAMES;

/// Keys whose presence marks an object as a component definition.
const DEFINITION_KEYS: [&str; 3] = ["name", "setup", "render"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Unsupported component type at path: {path}")]
    UnsupportedComponent { path: String },
}

/// Shape of a component value as reported by the host runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ComponentValue {
    /// Plain object; only its own keys matter for classification.
    Object { keys: Vec<String> },
    /// Callable value with its printed source.
    #[serde(rename_all = "camelCase")]
    Function { source: String, has_prototype: bool },
    /// Anything else (strings, numbers, null).
    Other { description: String },
}

impl ComponentValue {
    pub fn object(keys: &[&str]) -> Self {
        ComponentValue::Object {
            keys: keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Arrow functions and other callables without a constructor prototype.
    pub fn arrow(source: &str) -> Self {
        ComponentValue::Function {
            source: source.to_string(),
            has_prototype: false,
        }
    }

    pub fn function(source: &str) -> Self {
        ComponentValue::Function {
            source: source.to_string(),
            has_prototype: true,
        }
    }

    pub fn other(description: &str) -> Self {
        ComponentValue::Other {
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentKind {
    /// Definition object carrying a name, setup or render entry.
    Definition,
    /// Function component without a constructor prototype.
    Functional,
    /// Function whose body builds its tree through `h(` or `createVNode(`.
    FactoryRender,
}

impl ComponentKind {
    /// Predicates are checked in declaration order; the first match wins.
    pub fn classify(value: &ComponentValue, path: &str) -> Result<Self, RegistryError> {
        match value {
            ComponentValue::Object { keys }
                if keys.iter().any(|k| DEFINITION_KEYS.contains(&k.as_str())) =>
            {
                Ok(ComponentKind::Definition)
            }
            ComponentValue::Function {
                has_prototype: false,
                ..
            } => Ok(ComponentKind::Functional),
            ComponentValue::Function { source, .. } if calls_factory(source) => {
                Ok(ComponentKind::FactoryRender)
            }
            _ => Err(RegistryError::UnsupportedComponent {
                path: path.to_string(),
            }),
        }
    }
}

fn calls_factory(source: &str) -> bool {
    FACTORY_NAMES
        .iter()
        .any(|name| source.contains(&format!("{}(", name)))
}
