//! Trigger injection.
//!
//! Prepends the reactive counter and its exported mutator to a module:
//!
//! ```text
//! import { ref } from 'vue';
//! const __manualUpdateTrigger = ref(0);
//! export const triggerUpdate = () => { __manualUpdateTrigger.value++; };
//! ```

use crate::options::TransformConfig;

/// Module the reactive counter constructor is imported from.
pub const REACTIVE_RUNTIME_MODULE: &str = "vue";

#[derive(Debug, Clone)]
pub struct TriggerInjector {
    trigger_ref_name: String,
    update_function_name: String,
}

impl TriggerInjector {
    pub fn new(config: &TransformConfig) -> Self {
        Self {
            trigger_ref_name: config.trigger_ref_name.clone(),
            update_function_name: config.update_function_name.clone(),
        }
    }

    /// Returns `code` untouched when the trigger name already occurs anywhere in it.
    pub fn inject(&self, code: &str) -> String {
        if code.contains(&self.trigger_ref_name) {
            return code.to_string();
        }

        format!("{}{}", self.prelude(), code)
    }

    pub fn prelude(&self) -> String {
        format!(
            "import {{ ref }} from '{runtime}';\nconst {trigger} = ref(0);\nexport const {update} = () => {{ {trigger}.value++; }};\n",
            runtime = REACTIVE_RUNTIME_MODULE,
            trigger = self.trigger_ref_name,
            update = self.update_function_name,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn injector() -> TriggerInjector {
        TriggerInjector::new(&TransformConfig::default())
    }

    #[test]
    fn test_inject_prepends_prelude() {
        let out = injector().inject("export default { name: 'Card' };");
        assert!(out.starts_with("import { ref } from 'vue';\n"));
        assert!(out.contains("const __manualUpdateTrigger = ref(0);"));
        assert!(
            out.contains("export const triggerUpdate = () => { __manualUpdateTrigger.value++; };")
        );
        assert!(out.ends_with("export default { name: 'Card' };"));
    }

    #[test]
    fn test_inject_is_idempotent() {
        let once = injector().inject("const a = 1;");
        let twice = injector().inject(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_existing_name_short_circuits() {
        let code = "// mentions __manualUpdateTrigger already";
        assert_eq!(injector().inject(code), code);
    }

    #[test]
    fn test_custom_names() {
        let config = TransformConfig {
            trigger_ref_name: "__tick".to_string(),
            update_function_name: "refresh".to_string(),
            ..TransformConfig::default()
        };
        let out = TriggerInjector::new(&config).inject("");
        assert!(out.contains("const __tick = ref(0);"));
        assert!(out.contains("export const refresh = () => { __tick.value++; };"));
    }
}
