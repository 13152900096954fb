//! Validated invocation of registered tools.
//!
//! `execute` never fails: unknown tools, schema violations, plugin errors and
//! plugin panics all come back as `{"status": "error", "msg": ...}`.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use serde_json::{Map, Value, json};
use tracing::instrument;

use crate::registry::SkillRegistry;

pub const STATUS_ERROR: &str = "error";

/// Build a uniform error result.
pub fn error_result(msg: impl Into<String>) -> Value {
    json!({"status": STATUS_ERROR, "msg": msg.into()})
}

/// Whether a dispatch result reports an error.
pub fn is_error(result: &Value) -> bool {
    result.get("status").and_then(Value::as_str) == Some(STATUS_ERROR)
}

impl SkillRegistry {
    /// Validate `args` and run the tool bound to `tool`.
    #[instrument(name = "dispatcher.execute", skip(self, args))]
    pub async fn execute(&self, tool: &str, args: &Map<String, Value>) -> Value {
        let Some(entry) = self.get(tool) else {
            log::error!("Tool not found: {}", tool);
            return error_result(format!("tool `{}` not found", tool));
        };

        if let Err(e) = self.validate(tool, args) {
            log::error!("Argument validation failed for '{}': {}", tool, e);
            return error_result(e.to_string());
        }

        log::info!("Executing tool: {}", tool);
        match AssertUnwindSafe(entry.plugin.execute(tool, args))
            .catch_unwind()
            .await
        {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                log::warn!("Tool '{}' failed: {}", tool, e);
                error_result(e.to_string())
            }
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                log::error!("Tool '{}' panicked: {}", tool, reason);
                error_result(format!("tool `{}` panicked: {}", tool, reason))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::SkillDefinition;
    use crate::error::SkillError;
    use crate::registry::tests::{catalog, write_skill};
    use crate::skill::SkillPlugin;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn loaded() -> (TempDir, SkillRegistry) {
        let root = TempDir::new().unwrap();
        write_skill(
            root.path(),
            "greeter",
            r#"{"name": "greet", "description": "say hello",
                "parameters": {"type": "object",
                               "properties": {"who": {"type": "string"}, "fail": {"type": "boolean"}},
                               "required": ["who"]}}"#,
            r#"implementations = ["GreeterSkill"]"#,
        );
        std::fs::write(root.path().join("greeter/config.json"), r#"{"greeting": "ahoy"}"#).unwrap();
        let registry = SkillRegistry::load(root.path(), catalog());
        (root, registry)
    }

    #[tokio::test]
    async fn test_unknown_tool_is_structured_error() {
        let (_root, registry) = loaded();
        let result = registry.execute("nonexistent_tool", &Map::new()).await;
        assert_eq!(result["status"], "error");
        assert!(result["msg"].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_success_passes_plugin_result_through() {
        let (_root, registry) = loaded();
        let result = registry.execute("greet", &args(json!({"who": "bob"}))).await;
        assert_eq!(result, json!({"status": "success", "msg": "ahoy from greet"}));
        assert!(!is_error(&result));
    }

    #[tokio::test]
    async fn test_invalid_args_fail_closed() {
        let (_root, registry) = loaded();
        let result = registry.execute("greet", &Map::new()).await;
        assert!(is_error(&result));
        assert_eq!(result["msg"], "missing required parameters: [who]");

        let result = registry.execute("greet", &args(json!({"who": 3}))).await;
        assert_eq!(result["msg"], "param who must be a string");
    }

    #[tokio::test]
    async fn test_plugin_error_is_wrapped() {
        let (_root, registry) = loaded();
        let result = registry
            .execute("greet", &args(json!({"who": "bob", "fail": true})))
            .await;
        assert_eq!(result, error_result("execution failed: asked to fail"));
    }

    struct Panicky;

    #[async_trait]
    impl SkillPlugin for Panicky {
        async fn execute(&self, _tool: &str, _args: &Map<String, Value>) -> Result<Value, SkillError> {
            panic!("boom");
        }
    }

    #[tokio::test]
    async fn test_plugin_panic_is_caught() {
        let mut registry = SkillRegistry::new(catalog());
        registry.register(
            SkillDefinition {
                name: "explode".into(),
                description: String::new(),
                parameters: None,
            },
            Arc::new(Panicky),
            "Panicky",
        );
        let result = registry.execute("explode", &Map::new()).await;
        assert!(is_error(&result));
        assert!(result["msg"].as_str().unwrap().contains("boom"));
    }

    struct Counting(AtomicUsize);

    #[async_trait]
    impl SkillPlugin for Counting {
        async fn execute(&self, _tool: &str, _args: &Map<String, Value>) -> Result<Value, SkillError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(json!({"status": "success"}))
        }
    }

    #[tokio::test]
    async fn test_plugin_not_invoked_when_validation_fails() {
        let mut registry = SkillRegistry::new(catalog());
        let plugin = Arc::new(Counting(AtomicUsize::new(0)));
        registry.register(
            serde_json::from_value(json!({
                "name": "count",
                "parameters": {"properties": {"n": {"type": "integer"}}, "required": ["n"]}
            }))
            .unwrap(),
            plugin.clone(),
            "Counting",
        );

        registry.execute("count", &Map::new()).await;
        assert_eq!(plugin.0.load(Ordering::SeqCst), 0);
        registry.execute("count", &args(json!({"n": 1}))).await;
        assert_eq!(plugin.0.load(Ordering::SeqCst), 1);
    }
}
