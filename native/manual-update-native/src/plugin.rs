//! Unit classification and dispatch.
//!
//! [`ManualUpdatePlugin::transform`] is the single entry point the host build
//! pipeline calls per module. Units are filtered, classified by identifier
//! suffix and routed through the matching pipeline:
//!
//! | Kind | Pipeline |
//! |---|---|
//! | `.vue` | [`SfcSplitter`] |
//! | `.tsx` | inject, JSX pre-pass, rewrite, JSX post-pass |
//! | `.ts` with a factory call | inject, rewrite |
//!
//! Every failure is captured as [`TransformOutcome::Failed`]; nothing escapes
//! a single unit's transform.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::filter::FileFilter;
use crate::injector::TriggerInjector;
use crate::jsx::{JsxCompiler, OxcJsxCompiler};
use crate::options::TransformConfig;
use crate::outcome::{Stage, TransformError, TransformOutcome, TransformOutput};
use crate::rewriter::{RenderSiteRewriter, FACTORY_NAMES};
use crate::sfc::{strip_query, SfcCompiler, SfcSplitter};

pub const PLUGIN_NAME: &str = "vite-plugin-vue-manual-update";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitKind {
    /// Markup and script in one file.
    Composite,
    /// Script with embedded element syntax.
    Jsx,
    /// Plain script building its tree through factory calls.
    FactoryScript,
    Unsupported,
}

impl UnitKind {
    /// Suffix checks run against the raw identifier, so `?query` sub-requests
    /// such as `App.vue?vue&type=template` fall through to `Unsupported`.
    pub fn classify(id: &str, code: &str) -> Self {
        if id.ends_with(".vue") {
            UnitKind::Composite
        } else if id.ends_with(".tsx") {
            UnitKind::Jsx
        } else if id.ends_with(".ts") && mentions_factory_call(code) {
            UnitKind::FactoryScript
        } else {
            UnitKind::Unsupported
        }
    }
}

fn mentions_factory_call(code: &str) -> bool {
    FACTORY_NAMES
        .iter()
        .any(|name| code.contains(&format!("{}(", name)))
}

/// One module submitted for transformation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeUnit {
    pub id: String,
    pub code: String,
}

impl CodeUnit {
    pub fn new(id: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
        }
    }
}

pub struct ManualUpdatePlugin {
    config: TransformConfig,
    filter: FileFilter,
    injector: TriggerInjector,
    rewriter: RenderSiteRewriter,
    jsx: Box<dyn JsxCompiler>,
    sfc: Option<Box<dyn SfcCompiler>>,
}

impl ManualUpdatePlugin {
    /// Builds the plugin; invalid include/exclude rules are rejected here.
    pub fn new(config: TransformConfig) -> Result<Self, TransformError> {
        let filter = FileFilter::new(&config.include, &config.exclude)?;
        Ok(Self {
            injector: TriggerInjector::new(&config),
            rewriter: RenderSiteRewriter::new(&config),
            filter,
            config,
            jsx: Box::new(OxcJsxCompiler::new()),
            sfc: None,
        })
    }

    pub fn with_jsx_compiler(mut self, compiler: impl JsxCompiler + 'static) -> Self {
        self.jsx = Box::new(compiler);
        self
    }

    pub fn with_sfc_compiler(mut self, compiler: impl SfcCompiler + 'static) -> Self {
        self.sfc = Some(Box::new(compiler));
        self
    }

    pub fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    pub fn transform(&self, code: &str, id: &str) -> TransformOutcome {
        if !self.filter.matches(id) {
            debug!(file = id, "filtered out");
            return TransformOutcome::Unchanged;
        }

        let kind = UnitKind::classify(id, code);
        debug!(file = id, kind = ?kind, "classified unit");

        let result = match kind {
            UnitKind::Composite => self.transform_composite(code, id),
            UnitKind::Jsx => self.transform_jsx(code, id),
            UnitKind::FactoryScript => self.transform_factory_script(code, id),
            UnitKind::Unsupported => Ok(TransformOutcome::Unchanged),
        };

        match result {
            Ok(outcome) => outcome,
            Err(err) => {
                if self.config.log_errors {
                    error!(file = id, kind = ?kind, error = %err, "transform failed, keeping original");
                }
                TransformOutcome::Failed(err)
            }
        }
    }

    /// Transforms independent units in parallel; results keep input order.
    pub fn transform_all(&self, units: &[CodeUnit]) -> Vec<TransformOutcome> {
        units
            .par_iter()
            .map(|unit| self.transform(&unit.code, &unit.id))
            .collect()
    }

    fn transform_composite(&self, code: &str, id: &str) -> Result<TransformOutcome, TransformError> {
        let compiler = self
            .sfc
            .as_deref()
            .ok_or_else(|| TransformError::MissingCollaborator {
                collaborator: "single-file component compiler",
                file: id.to_string(),
            })?;
        SfcSplitter::new(&self.injector, &self.rewriter).split_and_transform(compiler, code, id)
    }

    fn transform_jsx(&self, code: &str, id: &str) -> Result<TransformOutcome, TransformError> {
        let filename = strip_query(id);
        let injected = self.injector.inject(code);

        let pre = self
            .jsx
            .compile_down(&injected, filename)
            .map_err(|e| e.at_stage(Stage::JsxPrePass))?;
        if pre.code.trim().is_empty() {
            debug!(file = filename, "pre-pass produced no code");
            return Ok(TransformOutcome::Unchanged);
        }

        let rewritten = self.rewriter.try_rewrite(&pre.code, filename)?;
        if rewritten == pre.code {
            return Ok(TransformOutcome::Unchanged);
        }

        let post = self
            .jsx
            .compile_down(&rewritten, filename)
            .map_err(|e| e.at_stage(Stage::JsxPostPass))?;
        let output = if post.code.trim().is_empty() {
            TransformOutput::new(rewritten)
        } else {
            TransformOutput::with_map(post.code, post.map)
        };
        Ok(TransformOutcome::Transformed(output))
    }

    fn transform_factory_script(
        &self,
        code: &str,
        id: &str,
    ) -> Result<TransformOutcome, TransformError> {
        let filename = strip_query(id);
        let injected = self.injector.inject(code);
        let rewritten = self.rewriter.try_rewrite(&injected, filename)?;
        Ok(TransformOutcome::unless_same(rewritten, code))
    }
}
