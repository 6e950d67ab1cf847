//! Composite-File Splitter
//!
//! Splits a single-file component into its `<script>` / `<script setup>` and
//! `<template>` blocks, compiles each through an [`SfcCompiler`], injects the
//! trigger into the script, rewrites the template's render function and
//! recombines the result.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use crate::injector::TriggerInjector;
use crate::jsx::CompiledModule;
use crate::outcome::{Stage, TransformError, TransformOutcome};
use crate::rewriter::RenderSiteRewriter;

lazy_static! {
    static ref SCRIPT_REGEX: Regex =
        Regex::new(r"(?is)<script\b([^>]*)>([\s\S]*?)</script\s*>").unwrap();
    static ref TEMPLATE_TAG_REGEX: Regex =
        Regex::new(r"(?i)<template\b([^>]*)>|</template\s*>").unwrap();
    static ref ATTR_REGEX: Regex =
        Regex::new(r#"(?i)([a-z0-9:@#.-]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^>\s]+)))?"#)
            .unwrap();
}

/// Query suffix under which the host pipeline compiles the template module.
pub const TEMPLATE_QUERY: &str = "?vue&type=template";

// ═══════════════════════════════════════════════════════════════════════════════
// DESCRIPTOR
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SfcBlock {
    pub content: String,
    pub attributes: HashMap<String, String>,
}

impl SfcBlock {
    pub fn lang(&self) -> Option<&str> {
        self.attributes.get("lang").map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SfcDescriptor {
    pub filename: String,
    pub source: String,
    pub template: Option<SfcBlock>,
    pub script: Option<SfcBlock>,
    pub script_setup: Option<SfcBlock>,
}

impl SfcDescriptor {
    pub fn has_script(&self) -> bool {
        self.script.is_some() || self.script_setup.is_some()
    }
}

fn parse_attributes(attr_string: &str) -> HashMap<String, String> {
    let mut attributes = HashMap::new();
    for caps in ATTR_REGEX.captures_iter(attr_string) {
        if let Some(name) = caps.get(1) {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| "true".to_string());
            attributes.insert(name.as_str().to_string(), value);
        }
    }
    attributes
}

/// Locate the outermost `<template>` block, balancing nested `<template>` tags.
fn find_template_block(source: &str) -> Result<Option<SfcBlock>, String> {
    let mut depth = 0usize;
    let mut open: Option<(usize, String)> = None;

    for caps in TEMPLATE_TAG_REGEX.captures_iter(source) {
        let Some(tag) = caps.get(0) else {
            continue;
        };
        let is_close = tag.as_str().starts_with("</");

        if !is_close {
            if depth == 0 {
                let attrs = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                open = Some((tag.end(), attrs.to_string()));
            }
            // `<template />` never opens a block.
            if !tag.as_str().trim_end_matches('>').trim_end().ends_with('/') {
                depth += 1;
            }
            continue;
        }

        if depth == 0 {
            return Err("unexpected </template>".to_string());
        }
        depth -= 1;
        if depth == 0 {
            if let Some((start, attrs)) = open.take() {
                return Ok(Some(SfcBlock {
                    content: source[start..tag.start()].to_string(),
                    attributes: parse_attributes(&attrs),
                }));
            }
        }
    }

    if depth > 0 {
        return Err("unclosed <template> block".to_string());
    }
    Ok(None)
}

/// Split a single-file component into its top-level blocks.
pub fn parse_descriptor(source: &str, filename: &str) -> Result<SfcDescriptor, TransformError> {
    let mut script = None;
    let mut script_setup = None;
    // Script bodies are blanked out before template scanning so that markup
    // inside string literals cannot open a block.
    let mut masked = source.to_string();

    for caps in SCRIPT_REGEX.captures_iter(source) {
        let attributes = parse_attributes(caps.get(1).map(|m| m.as_str()).unwrap_or(""));
        let content = caps.get(2).map(|m| m.as_str()).unwrap_or("").to_string();

        if let Some(whole) = caps.get(0) {
            masked.replace_range(whole.range(), &" ".repeat(whole.len()));
        }

        let slot = if attributes.contains_key("setup") {
            &mut script_setup
        } else {
            &mut script
        };
        if slot.is_some() {
            return Err(TransformError::collaborator(
                Stage::SfcParse,
                filename,
                "a component may contain at most one <script> and one <script setup> block",
            ));
        }
        *slot = Some(SfcBlock {
            content,
            attributes,
        });
    }

    let template = find_template_block(&masked)
        .map_err(|message| TransformError::collaborator(Stage::SfcParse, filename, message))?;

    Ok(SfcDescriptor {
        filename: filename.to_string(),
        source: source.to_string(),
        template,
        script,
        script_setup,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// MARKUP COMPILER CONTRACT
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptCompileOptions {
    pub id: String,
    pub filename: String,
    pub source_map: bool,
    pub parser_plugins: Vec<String>,
}

impl ScriptCompileOptions {
    pub fn new(id: &str, filename: &str) -> Self {
        Self {
            id: id.to_string(),
            filename: filename.to_string(),
            source_map: true,
            parser_plugins: vec!["typescript".to_string(), "jsx".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateMode {
    Module,
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateCompileOptions {
    pub id: String,
    pub filename: String,
    pub mode: TemplateMode,
    pub source_map: bool,
}

impl TemplateCompileOptions {
    pub fn new(id: &str, filename: &str) -> Self {
        Self {
            id: id.to_string(),
            filename: filename.to_string(),
            mode: TemplateMode::Module,
            source_map: true,
        }
    }
}

/// Markup compiler the host supplies for single-file components.
///
/// Template compilation is deliberately not implemented here; the compiled
/// render function is treated as opaque script text.
pub trait SfcCompiler: Send + Sync {
    fn parse(&self, source: &str, filename: &str) -> Result<SfcDescriptor, TransformError> {
        parse_descriptor(source, filename)
    }

    fn compile_script(
        &self,
        descriptor: &SfcDescriptor,
        options: &ScriptCompileOptions,
    ) -> Result<CompiledModule, TransformError>;

    fn compile_template(
        &self,
        source: &str,
        options: &TemplateCompileOptions,
    ) -> Result<CompiledModule, TransformError>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// SPLITTER
// ═══════════════════════════════════════════════════════════════════════════════

/// Intermediate products of splitting one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitComponent {
    /// Compiled script with the trigger injected.
    pub script: Option<String>,
    /// Compiled and rewritten render function. Not embedded in `code`: the
    /// host compiles the template module separately.
    pub template_render: Option<String>,
    pub code: String,
}

pub struct SfcSplitter<'p> {
    injector: &'p TriggerInjector,
    rewriter: &'p RenderSiteRewriter,
}

impl<'p> SfcSplitter<'p> {
    pub fn new(injector: &'p TriggerInjector, rewriter: &'p RenderSiteRewriter) -> Self {
        Self { injector, rewriter }
    }

    pub fn split_and_transform(
        &self,
        compiler: &dyn SfcCompiler,
        code: &str,
        id: &str,
    ) -> Result<TransformOutcome, TransformError> {
        let split = self.split(compiler, code, id)?;
        // Style-only components have nothing to recombine.
        if split.script.is_none() && split.template_render.is_none() {
            return Ok(TransformOutcome::Unchanged);
        }
        Ok(TransformOutcome::unless_same(split.code, code))
    }

    pub fn split(
        &self,
        compiler: &dyn SfcCompiler,
        code: &str,
        id: &str,
    ) -> Result<SplitComponent, TransformError> {
        let filename = strip_query(id);
        let descriptor = compiler.parse(code, filename)?;

        let script = if descriptor.has_script() {
            let compiled =
                compiler.compile_script(&descriptor, &ScriptCompileOptions::new(id, filename))?;
            Some(self.injector.inject(&compiled.code))
        } else {
            None
        };

        let template_render = match &descriptor.template {
            Some(template) => {
                let compiled = compiler.compile_template(
                    &template.content,
                    &TemplateCompileOptions::new(id, filename),
                )?;
                Some(self.rewriter.rewrite(&compiled.code, filename))
            }
            None => None,
        };

        let mut code = script.clone().unwrap_or_default();
        if template_render.as_deref().is_some_and(|render| !render.is_empty()) {
            code.push_str(&template_import(filename));
        }

        debug!(
            file = filename,
            has_script = script.is_some(),
            has_template = template_render.is_some(),
            "split single-file component"
        );

        Ok(SplitComponent {
            script,
            template_render,
            code,
        })
    }
}

/// Module identifier without its `?query` suffix.
pub fn strip_query(id: &str) -> &str {
    id.split('?').next().unwrap_or(id)
}

fn template_import(filename: &str) -> String {
    let name = Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| filename.to_string());
    format!(
        "\nimport {{ render as __render }} from './{}{}';\n",
        name, TEMPLATE_QUERY
    )
}
