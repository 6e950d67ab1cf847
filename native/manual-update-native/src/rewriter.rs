//! Render-Site Rewriter
//!
//! Parses a module, visits every `return` statement and makes the returned
//! render output read `<trigger>.value`, so that bumping the trigger
//! re-runs the render. The rewrite depends on the shape of the returned
//! expression:
//!
//! | Shape | Rewrite |
//! |---|---|
//! | `[a, b]` | `[a, b, trigger.value]` |
//! | `<div ...>` | `<div ... marker={trigger.value}>` |
//! | `h(tag, props?, children?)` | marker prop merged into / inserted as the second argument |
//! | anything else | `[expr, trigger.value]` |

use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast::AstBuilder;
use oxc_ast_visit::walk_mut::walk_statement;
use oxc_ast_visit::VisitMut;
use oxc_codegen::Codegen;
use oxc_parser::{ParseOptions, Parser};
use oxc_span::{SourceType, SPAN};
use tracing::{debug, error};

use crate::options::TransformConfig;
use crate::outcome::TransformError;

/// Callee names recognized as render-node factories.
pub const FACTORY_NAMES: [&str; 2] = ["h", "createVNode"];

// ═══════════════════════════════════════════════════════════════════════════════
// RENDER SHAPES
// ═══════════════════════════════════════════════════════════════════════════════

/// Shape of a returned expression, in dispatch precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderShape {
    /// Array literal: a multi-root render.
    Sequence,
    /// JSX element literal.
    Element,
    /// Call to one of [`FACTORY_NAMES`].
    FactoryCall,
    Other,
}

impl RenderShape {
    pub fn of(expr: &Expression<'_>) -> Self {
        match expr {
            Expression::ArrayExpression(_) => RenderShape::Sequence,
            Expression::JSXElement(_) => RenderShape::Element,
            Expression::CallExpression(call) if is_factory_call(call) => RenderShape::FactoryCall,
            _ => RenderShape::Other,
        }
    }
}

fn is_factory_call(call: &CallExpression<'_>) -> bool {
    match &call.callee {
        Expression::Identifier(id) => FACTORY_NAMES.iter().any(|name| id.name == *name),
        _ => false,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REWRITER
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct RenderSiteRewriter {
    marker_attribute: String,
    trigger_ref_name: String,
    trigger_value_access: String,
    log_errors: bool,
}

impl RenderSiteRewriter {
    pub fn new(config: &TransformConfig) -> Self {
        Self {
            marker_attribute: config.marker_attribute.clone(),
            trigger_ref_name: config.trigger_ref_name.clone(),
            trigger_value_access: config.trigger_value_access(),
            log_errors: config.log_errors,
        }
    }

    /// Soft variant of [`Self::try_rewrite`]: on failure the input comes back
    /// unchanged and the error is logged when `logErrors` is set.
    pub fn rewrite(&self, code: &str, file: &str) -> String {
        match self.try_rewrite(code, file) {
            Ok(rewritten) => rewritten,
            Err(err) => {
                if self.log_errors {
                    error!(file, error = %err, "error modifying render function");
                }
                code.to_string()
            }
        }
    }

    pub fn try_rewrite(&self, code: &str, file: &str) -> Result<String, TransformError> {
        if self.mentions_trigger_value(code) {
            debug!(file, "trigger value already referenced, skipping");
            return Ok(code.to_string());
        }

        let allocator = Allocator::default();
        let source_type = SourceType::default()
            .with_typescript(true)
            .with_jsx(true)
            .with_module(true);
        // Parentheses are dropped so `return (<div/>)` is seen as the element itself.
        let options = ParseOptions {
            preserve_parens: false,
            ..ParseOptions::default()
        };

        let ret = Parser::new(&allocator, code, source_type)
            .with_options(options)
            .parse();
        if !ret.errors.is_empty() {
            return Err(TransformError::Parse {
                file: file.to_string(),
                diagnostics: ret.errors.iter().map(|e| e.to_string()).collect(),
            });
        }

        let mut program = ret.program;
        let mut marker = RenderSiteMarker::new(
            &allocator,
            &self.marker_attribute,
            &self.trigger_ref_name,
        );
        marker.visit_program(&mut program);

        debug!(file, sites = marker.rewritten, "rewrote render sites");
        if marker.rewritten == 0 {
            return Ok(code.to_string());
        }

        let generated = Codegen::new().build(&program).code;
        if generated.trim().is_empty() {
            return Ok(code.to_string());
        }
        Ok(generated)
    }

    /// Textual idempotence guard: true when `<trigger>.value` occurs anywhere,
    /// including the increment inside an injected mutator.
    pub fn mentions_trigger_value(&self, code: &str) -> bool {
        code.contains(self.trigger_value_access.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RETURN-SITE VISITOR
// ═══════════════════════════════════════════════════════════════════════════════

struct RenderSiteMarker<'a> {
    ast: AstBuilder<'a>,
    marker_attribute: &'a str,
    trigger_ref_name: &'a str,
    rewritten: usize,
}

impl<'a> RenderSiteMarker<'a> {
    fn new(allocator: &'a Allocator, marker_attribute: &str, trigger_ref_name: &str) -> Self {
        let marker_attribute: &'a str = allocator.alloc_str(marker_attribute);
        let trigger_ref_name: &'a str = allocator.alloc_str(trigger_ref_name);
        Self {
            ast: AstBuilder::new(allocator),
            marker_attribute,
            trigger_ref_name,
            rewritten: 0,
        }
    }

    fn mark_return(&mut self, ret: &mut ReturnStatement<'a>) {
        let Some(argument) = ret.argument.as_mut() else {
            return;
        };

        match RenderShape::of(argument) {
            RenderShape::Sequence => {
                if let Expression::ArrayExpression(array) = argument {
                    array
                        .elements
                        .push(ArrayExpressionElement::from(self.trigger_value()));
                }
            }
            RenderShape::Element => {
                if let Expression::JSXElement(element) = argument {
                    let attribute = self.marker_jsx_attribute();
                    element.opening_element.attributes.push(attribute);
                }
            }
            RenderShape::FactoryCall => {
                if let Expression::CallExpression(call) = argument {
                    if !self.mark_factory_arguments(&mut call.arguments) {
                        return;
                    }
                }
            }
            RenderShape::Other => {
                if let Some(original) = ret.argument.take() {
                    let mut elements = self.ast.vec();
                    elements.push(ArrayExpressionElement::from(original));
                    elements.push(ArrayExpressionElement::from(self.trigger_value()));
                    ret.argument = Some(self.ast.expression_array(SPAN, elements));
                }
            }
        }

        self.rewritten += 1;
    }

    /// `h(tag, { ... })` gains the marker prop; any other second argument
    /// (or none) gets a fresh props object inserted in front of it.
    /// A call without arguments is left alone.
    fn mark_factory_arguments(&self, arguments: &mut oxc_allocator::Vec<'a, Argument<'a>>) -> bool {
        if arguments.is_empty() {
            return false;
        }

        if matches!(arguments.get(1), Some(Argument::ObjectExpression(_))) {
            if let Some(Argument::ObjectExpression(props)) = arguments.get_mut(1) {
                props.properties.push(self.marker_property());
            }
        } else {
            arguments.insert(1, Argument::from(self.marker_object()));
        }
        true
    }

    fn trigger_value(&self) -> Expression<'a> {
        Expression::from(self.ast.member_expression_static(
            SPAN,
            self.ast.expression_identifier(SPAN, self.trigger_ref_name),
            self.ast.identifier_name(SPAN, "value"),
            false,
        ))
    }

    fn marker_property(&self) -> ObjectPropertyKind<'a> {
        self.ast.object_property_kind_object_property(
            SPAN,
            PropertyKind::Init,
            PropertyKey::StaticIdentifier(
                self.ast
                    .alloc(self.ast.identifier_name(SPAN, self.marker_attribute)),
            ),
            self.trigger_value(),
            false,
            false,
            false,
        )
    }

    fn marker_object(&self) -> Expression<'a> {
        let mut properties = self.ast.vec();
        properties.push(self.marker_property());
        self.ast.expression_object(SPAN, properties)
    }

    fn marker_jsx_attribute(&self) -> JSXAttributeItem<'a> {
        let value = self.ast.jsx_attribute_value_expression_container(
            SPAN,
            JSXExpression::from(self.trigger_value()),
        );
        self.ast.jsx_attribute_item_attribute(
            SPAN,
            self.ast
                .jsx_attribute_name_identifier(SPAN, self.marker_attribute),
            Some(value),
        )
    }
}

impl<'a> VisitMut<'a> for RenderSiteMarker<'a> {
    fn visit_statement(&mut self, stmt: &mut Statement<'a>) {
        if let Statement::ReturnStatement(ret) = stmt {
            self.mark_return(ret);
        }
        walk_statement(self, stmt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewriter() -> RenderSiteRewriter {
        RenderSiteRewriter::new(&TransformConfig::default().with_log_errors(false))
    }

    /// Drops whitespace and unifies quotes so assertions ignore printer layout.
    fn compact(code: &str) -> String {
        code.chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == '\'' { '"' } else { c })
            .collect()
    }

    fn trigger_reads(code: &str) -> usize {
        code.matches("__manualUpdateTrigger.value").count()
    }

    #[test]
    fn test_shape_precedence() {
        let allocator = Allocator::default();
        let source_type = SourceType::tsx();
        let shape_of = |src: &str| {
            let src: &str = allocator.alloc_str(src);
            let ret = Parser::new(&allocator, src, source_type).parse();
            match ret.program.body.first() {
                Some(Statement::ExpressionStatement(stmt)) => RenderShape::of(&stmt.expression),
                _ => panic!("expected an expression statement"),
            }
        };

        assert_eq!(shape_of("[a, b];"), RenderShape::Sequence);
        assert_eq!(shape_of("<div />;"), RenderShape::Element);
        assert_eq!(shape_of("h('div');"), RenderShape::FactoryCall);
        assert_eq!(shape_of("createVNode('div');"), RenderShape::FactoryCall);
        assert_eq!(shape_of("_createVNode('div');"), RenderShape::Other);
        assert_eq!(shape_of("<>text</>;"), RenderShape::Other);
        assert_eq!(shape_of("a ? b : c;"), RenderShape::Other);
    }

    #[test]
    fn test_array_return_gains_trailing_read() {
        let out = rewriter()
            .try_rewrite("function render() { return [a, b]; }", "r.ts")
            .unwrap();
        assert!(compact(&out).contains("return[a,b,__manualUpdateTrigger.value]"));
        assert_eq!(trigger_reads(&out), 1);
    }

    #[test]
    fn test_jsx_return_gains_marker_attribute() {
        let out = rewriter()
            .try_rewrite(
                "export function Card() { return <div class=\"card\">hi</div>; }",
                "Card.tsx",
            )
            .unwrap();
        assert!(compact(&out).contains("__manualUpdateMarker={__manualUpdateTrigger.value}"));
        assert_eq!(trigger_reads(&out), 1);
    }

    #[test]
    fn test_parenthesized_jsx_is_an_element() {
        let out = rewriter()
            .try_rewrite("const C = () => { return (<span />); };", "C.tsx")
            .unwrap();
        assert!(compact(&out).contains("<span__manualUpdateMarker={__manualUpdateTrigger.value}"));
    }

    #[test]
    fn test_factory_props_object_is_extended() {
        let out = rewriter()
            .try_rewrite("function r() { return h('div', { id: 'x' }); }", "r.ts")
            .unwrap();
        assert!(compact(&out)
            .contains(r#"h("div",{id:"x",__manualUpdateMarker:__manualUpdateTrigger.value})"#));
    }

    #[test]
    fn test_factory_single_argument_gets_props() {
        let out = rewriter()
            .try_rewrite("function r() { return createVNode(Comp); }", "r.ts")
            .unwrap();
        assert!(compact(&out)
            .contains("createVNode(Comp,{__manualUpdateMarker:__manualUpdateTrigger.value})"));
    }

    #[test]
    fn test_factory_children_shift_right() {
        let out = rewriter()
            .try_rewrite("function r() { return h('p', 'text'); }", "r.ts")
            .unwrap();
        assert!(compact(&out)
            .contains(r#"h("p",{__manualUpdateMarker:__manualUpdateTrigger.value},"text")"#));

        let out = rewriter()
            .try_rewrite("function r() { return h('ul', [h('li')]); }", "r.ts")
            .unwrap();
        assert!(compact(&out).contains(
            r#"h("ul",{__manualUpdateMarker:__manualUpdateTrigger.value},[h("li")])"#
        ));
        assert_eq!(trigger_reads(&out), 1);
    }

    #[test]
    fn test_factory_without_arguments_is_left_alone() {
        let code = "function r() { return h(); }";
        assert_eq!(rewriter().try_rewrite(code, "r.ts").unwrap(), code);
    }

    #[test]
    fn test_other_expressions_are_wrapped() {
        let out = rewriter()
            .try_rewrite("function r(ok) { return ok ? a : b; }", "r.ts")
            .unwrap();
        assert!(compact(&out).contains("return[ok?a:b,__manualUpdateTrigger.value]"));
    }

    #[test]
    fn test_every_return_is_visited() {
        let code = r#"
            export default {
                setup() {
                    const inner = () => { return h('span'); };
                    return function render() {
                        if (loading) { return null; }
                        return [inner()];
                    };
                }
            };
        "#;
        let out = rewriter().try_rewrite(code, "multi.ts").unwrap();
        let compacted = compact(&out);
        assert!(compacted.contains(r#"h("span",{__manualUpdateMarker:__manualUpdateTrigger.value})"#));
        assert!(compacted.contains("return[null,__manualUpdateTrigger.value]"));
        assert!(compacted.contains("return[inner(),__manualUpdateTrigger.value]"));
        // The outer `return function render` is wrapped as well.
        assert_eq!(trigger_reads(&out), 4);
    }

    #[test]
    fn test_bare_return_and_no_returns_are_untouched() {
        let code = "function f() { return; }\nconst x = 1;\n";
        assert_eq!(rewriter().try_rewrite(code, "f.ts").unwrap(), code);
    }

    #[test]
    fn test_typescript_annotations_survive() {
        let out = rewriter()
            .try_rewrite(
                "function r(props: { n: number }): VNode { return h('b', String(props.n)); }",
                "r.ts",
            )
            .unwrap();
        let compacted = compact(&out);
        assert!(compacted.contains("props:{n:number;}") || compacted.contains("props:{n:number}"));
        assert!(compacted.contains("__manualUpdateMarker:__manualUpdateTrigger.value"));
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let r = rewriter();
        let once = r.rewrite("function r() { return h('div', 'x'); }", "r.ts");
        let twice = r.rewrite(&once, "r.ts");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_injected_module_is_left_alone() {
        let r = rewriter();
        let code = "const __manualUpdateTrigger = ref(0);\nexport const triggerUpdate = () => { __manualUpdateTrigger.value++; };\nexport default { setup() { return () => h('div', null, 'H'); } };\n";
        assert!(r.mentions_trigger_value(code));
        assert_eq!(r.try_rewrite(code, "HComponent.ts").unwrap(), code);
        assert!(r.mentions_trigger_value("x.__manualUpdateTrigger.value += 1"));
    }

    #[test]
    fn test_declared_but_unread_trigger_is_rewritten() {
        let code = "import { __manualUpdateTrigger } from './trigger';\nfunction r() { return [a]; }\n";
        let out = rewriter().try_rewrite(code, "r.ts").unwrap();
        assert!(compact(&out).contains("return[a,__manualUpdateTrigger.value]"));
    }

    #[test]
    fn test_parse_failure_is_reported_and_soft_fails() {
        let code = "function broken( { return <div>; }";
        let err = rewriter().try_rewrite(code, "broken.tsx").unwrap_err();
        assert!(matches!(err, TransformError::Parse { ref file, .. } if file == "broken.tsx"));
        assert_eq!(rewriter().rewrite(code, "broken.tsx"), code);
    }

    #[test]
    fn test_custom_names_flow_through() {
        let config = TransformConfig {
            marker_attribute: "data-tick".to_string(),
            trigger_ref_name: "__tick".to_string(),
            ..TransformConfig::default()
        };
        let out = RenderSiteRewriter::new(&config)
            .try_rewrite("const C = () => { return <p />; };", "C.tsx")
            .unwrap();
        assert!(compact(&out).contains("data-tick={__tick.value}"));
    }
}
