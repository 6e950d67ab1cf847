//! Transform results and the error taxonomy shared by every pipeline stage.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Collaborator stage that rejected a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    JsxPrePass,
    JsxPostPass,
    SfcParse,
    ScriptCompile,
    TemplateCompile,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::JsxPrePass => "jsx pre-pass",
            Stage::JsxPostPass => "jsx post-pass",
            Stage::SfcParse => "sfc parse",
            Stage::ScriptCompile => "script compile",
            Stage::TemplateCompile => "template compile",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// The script could not be parsed into a syntax tree.
    #[error("failed to parse {file}: {}", .diagnostics.join("; "))]
    Parse {
        file: String,
        diagnostics: Vec<String>,
    },

    /// An external compiler rejected the unit.
    #[error("{stage} failed for {file}: {message}")]
    Collaborator {
        stage: Stage,
        file: String,
        message: String,
    },

    /// The unit needs a compiler this plugin instance was not given.
    #[error("no {collaborator} configured to handle {file}")]
    MissingCollaborator {
        collaborator: &'static str,
        file: String,
    },

    #[error("configuration error: {message}")]
    Config { message: String },
}

impl TransformError {
    pub fn collaborator(stage: Stage, file: &str, message: impl Into<String>) -> Self {
        TransformError::Collaborator {
            stage,
            file: file.to_string(),
            message: message.into(),
        }
    }

    /// Re-attribute a collaborator rejection to the pipeline stage that made the call.
    pub fn at_stage(self, stage: Stage) -> Self {
        match self {
            TransformError::Collaborator { file, message, .. } => TransformError::Collaborator {
                stage,
                file,
                message,
            },
            other => other,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// OUTCOMES
// ═══════════════════════════════════════════════════════════════════════════════

/// Rewritten module text handed back to the host build pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOutput {
    pub code: String,
    /// JSON source map, when the producing stage emitted one.
    pub map: Option<String>,
}

impl TransformOutput {
    pub fn new(code: String) -> Self {
        Self { code, map: None }
    }

    pub fn with_map(code: String, map: Option<String>) -> Self {
        Self { code, map }
    }
}

/// Result of transforming one code unit.
///
/// `Failed` never aborts the build; hosts see it as "no change" through
/// [`TransformOutcome::into_output`], while tests can assert on the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformOutcome {
    Unchanged,
    Transformed(TransformOutput),
    Failed(TransformError),
}

impl TransformOutcome {
    pub fn transformed(code: String) -> Self {
        TransformOutcome::Transformed(TransformOutput::new(code))
    }

    /// `Transformed` unless `code` is identical to `original`.
    pub fn unless_same(code: String, original: &str) -> Self {
        if code == original {
            TransformOutcome::Unchanged
        } else {
            TransformOutcome::transformed(code)
        }
    }

    pub fn is_transformed(&self) -> bool {
        matches!(self, TransformOutcome::Transformed(_))
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, TransformOutcome::Unchanged)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TransformOutcome::Failed(_))
    }

    pub fn output(&self) -> Option<&TransformOutput> {
        match self {
            TransformOutcome::Transformed(output) => Some(output),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&TransformError> {
        match self {
            TransformOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Host-facing view: `None` means "use the original unit".
    pub fn into_output(self) -> Option<TransformOutput> {
        match self {
            TransformOutcome::Transformed(output) => Some(output),
            TransformOutcome::Unchanged | TransformOutcome::Failed(_) => None,
        }
    }
}

impl From<Result<TransformOutcome, TransformError>> for TransformOutcome {
    fn from(result: Result<TransformOutcome, TransformError>) -> Self {
        result.unwrap_or_else(TransformOutcome::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_maps_to_no_change() {
        let outcome = TransformOutcome::Failed(TransformError::collaborator(
            Stage::JsxPrePass,
            "App.tsx",
            "rejected",
        ));
        assert!(outcome.is_failed());
        assert_eq!(outcome.into_output(), None);
    }

    #[test]
    fn test_at_stage_only_retags_collaborator_errors() {
        let err = TransformError::collaborator(Stage::JsxPrePass, "A.tsx", "boom")
            .at_stage(Stage::JsxPostPass);
        assert_eq!(err.to_string(), "jsx post-pass failed for A.tsx: boom");

        let config = TransformError::Config {
            message: "bad".to_string(),
        };
        assert_eq!(config.clone().at_stage(Stage::SfcParse), config);
    }

    #[test]
    fn test_unless_same() {
        assert!(TransformOutcome::unless_same("a".to_string(), "a").is_unchanged());
        let changed = TransformOutcome::unless_same("b".to_string(), "a");
        assert_eq!(changed.output().map(|o| o.code.as_str()), Some("b"));
    }

    #[test]
    fn test_parse_error_message_lists_diagnostics() {
        let err = TransformError::Parse {
            file: "Card.ts".to_string(),
            diagnostics: vec!["Unexpected token".to_string(), "Expected `}`".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "failed to parse Card.ts: Unexpected token; Expected `}`"
        );
    }
}
