//! The contract every skill implementation satisfies, and the compiled-in
//! catalog the registry resolves implementations from.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::SkillError;

/// An instantiated skill. Executes one of the operations its factory
/// declared, with keyword arguments.
///
/// By convention a successful result is an object with at least a `status`
/// field; the dispatcher passes it through unmodified.
#[async_trait]
pub trait SkillPlugin: Send + Sync {
    async fn execute(&self, tool: &str, args: &Map<String, Value>) -> Result<Value, SkillError>;
}

/// Builds [`SkillPlugin`]s. Referenced by name from a skill directory's
/// `skill.toml`.
pub trait SkillFactory: Send + Sync {
    /// Implementation name, as listed in `implementations = [...]`.
    fn name(&self) -> &str;

    /// Tool names this implementation exposes. Only these can be bound.
    fn operations(&self) -> &[&str];

    /// Construct an instance. `config_path` points at the skill's optional
    /// `config.json`; a missing file means empty configuration.
    fn create(&self, config_path: Option<&Path>) -> Result<Arc<dyn SkillPlugin>, SkillError>;

    fn provides(&self, tool: &str) -> bool {
        self.operations().contains(&tool)
    }
}

/// Name → factory map of every implementation compiled into the binary.
#[derive(Clone, Default)]
pub struct SkillCatalog {
    factories: HashMap<String, Arc<dyn SkillFactory>>,
}

impl SkillCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, factory: Arc<dyn SkillFactory>) -> &mut Self {
        let name = factory.name().to_string();
        if self.factories.insert(name.clone(), factory).is_some() {
            log::warn!("Skill factory '{}' registered twice, keeping the latest", name);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn SkillFactory>> {
        self.factories.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for SkillCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkillCatalog")
            .field("factories", &self.names())
            .finish()
    }
}

/// Private configuration of a skill, read once at construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillConfig(pub Map<String, Value>);

impl SkillConfig {
    /// Read a JSON object from `path`. `None` or a missing file yields an
    /// empty configuration; unreadable or non-object content is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, SkillError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(Self(map)),
            other => Err(SkillError::Config(format!(
                "{} must contain a JSON object, found {}",
                path.display(),
                json_kind(&other)
            ))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct Echo;

    #[async_trait]
    impl SkillPlugin for Echo {
        async fn execute(&self, _tool: &str, args: &Map<String, Value>) -> Result<Value, SkillError> {
            Ok(Value::Object(args.clone()))
        }
    }

    struct EchoFactory;

    impl SkillFactory for EchoFactory {
        fn name(&self) -> &str {
            "EchoSkill"
        }

        fn operations(&self) -> &[&str] {
            &["echo"]
        }

        fn create(&self, _config_path: Option<&Path>) -> Result<Arc<dyn SkillPlugin>, SkillError> {
            Ok(Arc::new(Echo))
        }
    }

    #[test]
    fn test_catalog_lookup() {
        let mut catalog = SkillCatalog::new();
        catalog.register(Arc::new(EchoFactory));
        assert!(catalog.get("EchoSkill").is_some());
        assert!(catalog.get("Missing").is_none());
        assert_eq!(catalog.names(), vec!["EchoSkill"]);
    }

    #[test]
    fn test_factory_provides_only_declared_operations() {
        let factory = EchoFactory;
        assert!(factory.provides("echo"));
        assert!(!factory.provides("create"));
    }

    #[test]
    fn test_config_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let config = SkillConfig::load(Some(&dir.path().join("config.json"))).unwrap();
        assert!(config.is_empty());
        assert!(SkillConfig::load(None).unwrap().is_empty());
    }

    #[test]
    fn test_config_reads_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"blacksmith": {"asset_path": "/Game/Blacksmith"}}"#).unwrap();
        let config = SkillConfig::load(Some(&path)).unwrap();
        assert_eq!(config.get("blacksmith").unwrap()["asset_path"], "/Game/Blacksmith");
    }

    #[test]
    fn test_config_rejects_non_object_and_bad_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(SkillConfig::load(Some(&path)), Err(SkillError::Config(_))));
        fs::write(&path, "{oops").unwrap();
        assert!(matches!(SkillConfig::load(Some(&path)), Err(SkillError::Json(_))));
    }
}
