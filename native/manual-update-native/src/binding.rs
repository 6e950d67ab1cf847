//! Node-API surface for the JavaScript build plugin.
//!
//! Options arrive as optional JSON strings in the same camelCase shape the
//! JavaScript plugin accepts. Single-file components need a host-side markup
//! compiler, so `.vue` units always come back as `null` here.

use std::collections::HashMap;

use napi_derive::napi;
use tracing_subscriber::EnvFilter;

use crate::injector::TriggerInjector;
use crate::options::{PathMatcherOptions, TransformConfig};
use crate::path_matcher::PathMatcher;
use crate::plugin::ManualUpdatePlugin;
use crate::rewriter::RenderSiteRewriter;

#[napi(object)]
pub struct NativeTransformResult {
    pub code: String,
    pub map: Option<String>,
}

fn transform_config(options_json: Option<String>) -> napi::Result<TransformConfig> {
    match options_json {
        Some(json) => {
            TransformConfig::from_json(&json).map_err(|e| napi::Error::from_reason(e.to_string()))
        }
        None => Ok(TransformConfig::default()),
    }
}

fn path_matcher(options_json: Option<String>) -> napi::Result<PathMatcher> {
    let options = match options_json {
        Some(json) => PathMatcherOptions::from_json(&json)
            .map_err(|e| napi::Error::from_reason(e.to_string()))?,
        None => PathMatcherOptions::default(),
    };
    Ok(PathMatcher::new(&options))
}

fn to_native(plugin: &ManualUpdatePlugin, code: &str, id: &str) -> Option<NativeTransformResult> {
    plugin
        .transform(code, id)
        .into_output()
        .map(|output| NativeTransformResult {
            code: output.code,
            map: output.map,
        })
}

fn build_plugin(options_json: Option<String>) -> napi::Result<ManualUpdatePlugin> {
    ManualUpdatePlugin::new(transform_config(options_json)?)
        .map_err(|e| napi::Error::from_reason(e.to_string()))
}

/// A plugin built once from its options and reused for every module of a build.
#[napi]
pub struct ManualUpdateTransformer {
    plugin: ManualUpdatePlugin,
}

#[napi]
impl ManualUpdateTransformer {
    #[napi(constructor)]
    pub fn new(options_json: Option<String>) -> napi::Result<Self> {
        Ok(Self {
            plugin: build_plugin(options_json)?,
        })
    }

    /// Returns `null` when the host should keep the original module.
    #[napi]
    pub fn transform(&self, code: String, id: String) -> Option<NativeTransformResult> {
        to_native(&self.plugin, &code, &id)
    }

    #[napi(getter)]
    pub fn name(&self) -> String {
        self.plugin.name().to_string()
    }
}

/// One-shot form of [`ManualUpdateTransformer::transform`]; parses the options on every call.
#[napi]
pub fn transform_native(
    code: String,
    id: String,
    options_json: Option<String>,
) -> napi::Result<Option<NativeTransformResult>> {
    Ok(to_native(&build_plugin(options_json)?, &code, &id))
}

#[napi]
pub fn inject_trigger_native(code: String, options_json: Option<String>) -> napi::Result<String> {
    let config = transform_config(options_json)?;
    Ok(TriggerInjector::new(&config).inject(&code))
}

#[napi]
pub fn rewrite_render_native(
    code: String,
    filename: String,
    options_json: Option<String>,
) -> napi::Result<String> {
    let config = transform_config(options_json)?;
    Ok(RenderSiteRewriter::new(&config).rewrite(&code, &filename))
}

#[napi]
pub fn generate_component_id_native(
    file_path: String,
    options_json: Option<String>,
) -> napi::Result<String> {
    Ok(path_matcher(options_json)?.generate_component_id(&file_path))
}

#[napi]
pub fn match_closest_native(
    registered_ids: Vec<String>,
    targets: Vec<String>,
    options_json: Option<String>,
) -> napi::Result<Option<String>> {
    let matcher = path_matcher(options_json)?;
    let registry: HashMap<String, ()> = registered_ids.into_iter().map(|id| (id, ())).collect();
    let targets: Vec<&str> = targets.iter().map(String::as_str).collect();
    Ok(matcher.match_closest(&registry, &targets))
}

/// Installs a stderr subscriber filtered by `RUST_LOG` (default `warn`).
/// Later calls are no-ops.
#[napi]
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
