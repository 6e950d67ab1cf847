//! # Manual-Update Transform
//!
//! Build-time rewriting that lets application code force a component to
//! re-render by calling an exported `triggerUpdate()`.
//!
//! ## Pipeline Invariants
//!
//! 1. **Trigger**: every transformed module owns one reactive counter,
//!    `__manualUpdateTrigger = ref(0)`, and exports a mutator that increments it.
//!
//! 2. **Render Dependency**: every `return` that produces render output reads
//!    `__manualUpdateTrigger.value`, so the framework tracks the counter as a
//!    render dependency. Exactly one read is added per return site.
//!
//! 3. **Idempotence**: injection is skipped when the trigger name already
//!    occurs in the module; rewriting is skipped when `__manualUpdateTrigger.value`
//!    occurs anywhere in it, including the injected mutator.
//!
//! 4. **Soft Failure**: a unit that cannot be transformed is reported as
//!    [`TransformOutcome::Failed`] and the host keeps the original text. No
//!    partial output is ever produced.
//!
//! 5. **Registry**: component registration is fail-fast; an unclassifiable
//!    value stops registration with [`RegistryError::UnsupportedComponent`].

pub mod component_resolver;
pub mod filter;
pub mod injector;
pub mod jsx;
pub mod options;
pub mod outcome;
pub mod path_matcher;
pub mod plugin;
pub mod registry;
pub mod rewriter;
pub mod sfc;

#[cfg(feature = "napi")]
mod binding;


#[cfg(feature = "napi")]
pub use binding::*;

pub use component_resolver::{ComponentKind, ComponentValue, RegistryError};
pub use filter::FileFilter;
pub use injector::TriggerInjector;
pub use jsx::{CompiledModule, JsxCompiler, OxcJsxCompiler};
pub use options::{FilterRule, PathMatcherOptions, TransformConfig};
pub use outcome::{Stage, TransformError, TransformOutcome, TransformOutput};
pub use path_matcher::PathMatcher;
pub use plugin::{CodeUnit, ManualUpdatePlugin, UnitKind, PLUGIN_NAME};
pub use registry::{ComponentHost, ComponentRegistry, ResolvedComponent};
pub use rewriter::RenderSiteRewriter;
pub use sfc::{SfcCompiler, SfcDescriptor, SfcSplitter};
