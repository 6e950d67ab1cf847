//! JSX compile-down collaborator.
//!
//! The dispatcher runs TSX units through a compile-down pass before and after
//! the render-site rewrite. [`OxcJsxCompiler`] is the built-in implementation:
//! TypeScript syntax is stripped and JSX is lowered with the classic runtime
//! onto the `h` factory, which the rewriter recognizes. Pragmas the module
//! does not bind itself are imported from the framework runtime.

use std::path::{Path, PathBuf};

use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast::{AstBuilder, NONE};
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_parser::Parser;
use oxc_semantic::{Scoping, SemanticBuilder};
use oxc_span::{SourceType, SPAN};
use oxc_transformer::{JsxRuntime, TransformOptions, Transformer};

use crate::injector::REACTIVE_RUNTIME_MODULE;

use crate::outcome::{Stage, TransformError};

/// Output of an external compile step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledModule {
    pub code: String,
    pub map: Option<String>,
}

pub trait JsxCompiler: Send + Sync {
    fn compile_down(&self, code: &str, filename: &str) -> Result<CompiledModule, TransformError>;
}

#[derive(Debug, Clone)]
pub struct OxcJsxCompiler {
    pragma: String,
    pragma_frag: String,
    source_maps: bool,
}

impl Default for OxcJsxCompiler {
    fn default() -> Self {
        Self {
            pragma: "h".to_string(),
            pragma_frag: "Fragment".to_string(),
            source_maps: true,
        }
    }
}

impl OxcJsxCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source_maps(mut self, enabled: bool) -> Self {
        self.source_maps = enabled;
        self
    }

    fn transform_options(&self) -> TransformOptions {
        let mut options = TransformOptions::default();
        options.jsx.runtime = JsxRuntime::Classic;
        options.jsx.pragma = Some(self.pragma.clone());
        options.jsx.pragma_frag = Some(self.pragma_frag.clone());
        // Keeps the pragma imports alive through type-only import elision.
        options.typescript.jsx_pragma = self.pragma.clone().into();
        options.typescript.jsx_pragma_frag = self.pragma_frag.clone().into();
        options
    }

    /// Pragmas with no top-level binding in the module.
    fn unbound_pragmas(&self, scoping: &Scoping) -> Vec<&str> {
        [self.pragma.as_str(), self.pragma_frag.as_str()]
            .into_iter()
            .filter(|name| scoping.get_root_binding(name).is_none())
            .collect()
    }
}

/// `import { h, Fragment } from 'vue';`
fn runtime_import<'a>(allocator: &'a Allocator, names: &[&str]) -> Statement<'a> {
    let ast = AstBuilder::new(allocator);
    let specifiers = ast.vec_from_iter(names.iter().map(|name| {
        let name = allocator.alloc_str(name);
        ast.import_declaration_specifier_import_specifier(
            SPAN,
            ast.module_export_name_identifier_name(SPAN, name),
            ast.binding_identifier(SPAN, name),
            ImportOrExportKind::Value,
        )
    }));

    Statement::from(ast.module_declaration_import_declaration(
        SPAN,
        Some(specifiers),
        ast.string_literal(SPAN, REACTIVE_RUNTIME_MODULE, None),
        None,
        NONE,
        ImportOrExportKind::Value,
    ))
}

impl JsxCompiler for OxcJsxCompiler {
    fn compile_down(&self, code: &str, filename: &str) -> Result<CompiledModule, TransformError> {
        let allocator = Allocator::default();
        let source_type = SourceType::from_path(filename).unwrap_or_else(|_| SourceType::tsx());

        let mut parsed = Parser::new(&allocator, code, source_type).parse();
        if !parsed.errors.is_empty() {
            return Err(TransformError::Parse {
                file: filename.to_string(),
                diagnostics: parsed.errors.iter().map(|e| e.to_string()).collect(),
            });
        }

        let mut scoping = SemanticBuilder::new()
            .with_excess_capacity(0.0)
            .build(&parsed.program)
            .semantic
            .into_scoping();

        let unbound = self.unbound_pragmas(&scoping);
        if !unbound.is_empty() {
            parsed
                .program
                .body
                .insert(0, runtime_import(&allocator, &unbound));
            scoping = SemanticBuilder::new()
                .with_excess_capacity(0.0)
                .build(&parsed.program)
                .semantic
                .into_scoping();
        }

        let options = self.transform_options();
        let transformer = Transformer::new(&allocator, Path::new(filename), &options);
        let transformed =
            transformer.build_with_scoping(scoping, &mut parsed.program);
        if !transformed.errors.is_empty() {
            let message = transformed
                .errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(TransformError::collaborator(
                Stage::JsxPrePass,
                filename,
                message,
            ));
        }

        let codegen_options = CodegenOptions {
            source_map_path: self.source_maps.then(|| PathBuf::from(filename)),
            ..CodegenOptions::default()
        };
        let generated = Codegen::new()
            .with_options(codegen_options)
            .build(&parsed.program);

        Ok(CompiledModule {
            code: generated.code,
            map: generated.map.map(|map| map.to_json_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowers_jsx_onto_h() {
        let out = OxcJsxCompiler::new()
            .compile_down(
                "const C = () => { return <div id=\"a\">hi</div>; };",
                "component.tsx",
            )
            .unwrap();
        assert!(out.code.contains("h(\"div\""));
        assert!(!out.code.contains("<div"));
    }

    #[test]
    fn test_imports_pragma_from_runtime() {
        let out = OxcJsxCompiler::new()
            .compile_down(
                "export default function C() { return <div>Hi</div>; }",
                "component.tsx",
            )
            .unwrap();
        assert!(out.code.contains("import { h } from \"vue\";"));
        // No fragment in the module, so its import is elided.
        assert!(!out.code.contains("Fragment"));
    }

    #[test]
    fn test_imports_fragment_when_used() {
        let out = OxcJsxCompiler::new()
            .compile_down("export const L = () => <><i /><b /></>;", "component.tsx")
            .unwrap();
        assert!(out.code.contains("import { h, Fragment } from \"vue\";"));
        assert!(out.code.contains("h(Fragment"));
    }

    #[test]
    fn test_existing_pragma_binding_is_respected() {
        let out = OxcJsxCompiler::new()
            .compile_down(
                "import { h } from 'preact';\nexport const C = () => <p />;",
                "component.tsx",
            )
            .unwrap();
        assert!(out.code.contains("from \"preact\""));
        assert!(!out.code.contains("from \"vue\""));
    }

    #[test]
    fn test_lowering_twice_imports_once() {
        let compiler = OxcJsxCompiler::new();
        let first = compiler
            .compile_down("export const C = () => <p />;", "component.tsx")
            .unwrap();
        let second = compiler.compile_down(&first.code, "component.tsx").unwrap();
        assert_eq!(second.code.matches("import { h }").count(), 1);
    }

    #[test]
    fn test_strips_types() {
        let out = OxcJsxCompiler::new()
            .compile_down(
                "interface P { n: number }\nexport function f(p: P): number { return p.n; }",
                "component.tsx",
            )
            .unwrap();
        assert!(!out.code.contains("interface"));
        assert!(!out.code.contains(": number"));
        assert!(out.code.contains("return p.n"));
    }

    #[test]
    fn test_emits_source_map_on_request() {
        let with_map = OxcJsxCompiler::new()
            .compile_down("const a = <b />;", "component.tsx")
            .unwrap();
        assert!(with_map.map.is_some());

        let without_map = OxcJsxCompiler::new()
            .with_source_maps(false)
            .compile_down("const a = <b />;", "component.tsx")
            .unwrap();
        assert!(without_map.map.is_none());
    }

    #[test]
    fn test_rejects_malformed_input() {
        let err = OxcJsxCompiler::new()
            .compile_down("const a = <b>;", "component.tsx")
            .unwrap_err();
        assert!(matches!(err, TransformError::Parse { .. }));
    }
}
