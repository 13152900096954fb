//! Agent configuration file support.
//!
//! The file format is picked by extension (`.toml`, `.json`, `.yaml`/`.yml`).
//! Every field has a default, so an empty file is a valid configuration.
//! `${VAR}` and `${VAR:-default}` references are expanded from the
//! environment before parsing.
//!
//! ```toml
//! skills_root = "./skills"
//! top_k = 3
//!
//! [llm]
//! model = "deepseek-chat"
//! api_key = "${DEEPSEEK_API_KEY}"
//!
//! [fallback]
//! mode = "keywords"
//!
//! [bridge]
//! kind = "remote_control"
//! base_url = "http://127.0.0.1:30010"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use regex::{Captures, Regex};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::fallback::FallbackConfig;

pub const DEFAULT_PREAMBLE: &str = "You are a UE5 editor assistant. Answer with one ```json fenced block \
holding {\"tool\": <tool name>, \"args\": {...}} chosen from the tool definitions below.\n\n";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    /// Directory scanned for skill plugins.
    pub skills_root: PathBuf,
    /// Number of tool definitions retrieved into the prompt.
    pub top_k: usize,
    /// Leading part of the system prompt.
    pub preamble: String,
    pub llm: LlmSettings,
    pub fallback: FallbackConfig,
    pub bridge: BridgeSettings,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            skills_root: PathBuf::from("./skills"),
            top_k: 3,
            preamble: DEFAULT_PREAMBLE.to_string(),
            llm: LlmSettings::default(),
            fallback: FallbackConfig::default(),
            bridge: BridgeSettings::default(),
        }
    }
}

/// Chat-completion endpoint settings. Unset values are taken from the
/// `DEEPSEEK_*` environment variables when the client is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct LlmSettings {
    pub enabled: bool,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
            model: None,
            api_key: None,
            timeout_secs: 15,
            max_tokens: 1024,
            temperature: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BridgeKind {
    #[default]
    Mock,
    RemoteControl,
}

/// Which editor bridge the built-in skills spawn through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeSettings {
    pub kind: BridgeKind,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            kind: BridgeKind::Mock,
            base_url: "http://127.0.0.1:30010".to_string(),
            timeout_secs: 10,
        }
    }
}

impl AgentConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        if !p.exists() {
            return Err(anyhow!("Config file not found at: {}", p.display()));
        }
        let content = fs::read_to_string(p)
            .with_context(|| format!("Failed to read config file at {}", p.display()))?;
        let content = interpolate_env_vars(&content)
            .with_context(|| format!("Failed to expand {}", p.display()))?;

        let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::parse(&content, ext).with_context(|| format!("Invalid config file {}", p.display()))
    }

    /// Parse `content` in the format named by `ext`.
    pub fn parse(content: &str, ext: &str) -> Result<Self> {
        let config = match ext {
            "json" => serde_json::from_str(content)?,
            "yaml" | "yml" => {
                if content.trim().is_empty() {
                    Self::default()
                } else {
                    serde_yaml::from_str(content)?
                }
            }
            "toml" => toml::from_str(content)?,
            _ => return Err(anyhow!("Unsupported config format: {}", ext)),
        };
        Ok(config)
    }

    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AgentConfig)
    }
}

/// Expand `${VAR}` and `${VAR:-default}`. Unset variables without a default
/// are reported together.
pub fn interpolate_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}")
        .context("Failed to compile env var regex")?;

    let mut missing = Vec::new();
    let expanded = re.replace_all(content, |caps: &Captures| {
        match (std::env::var(&caps[1]), caps.get(2)) {
            (Ok(value), _) => value,
            (Err(_), Some(default)) => default.as_str().to_string(),
            (Err(_), None) => {
                missing.push(caps[1].to_string());
                String::new()
            }
        }
    });

    if !missing.is_empty() {
        return Err(anyhow!(
            "Required environment variables not set: {}",
            missing.join(", ")
        ));
    }
    Ok(expanded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::FallbackMode;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AgentConfig::parse("", "toml").unwrap();
        assert_eq!(config, AgentConfig::default());
        assert_eq!(config.top_k, 3);
        assert_eq!(config.llm.max_tokens, 1024);
        assert_eq!(config.llm.timeout_secs, 15);
        assert_eq!(config.bridge.kind, BridgeKind::Mock);
        assert_eq!(config.fallback.mode, FallbackMode::Disabled);
    }

    #[test]
    fn test_toml_sections() {
        let config = AgentConfig::parse(
            r#"
skills_root = "/opt/skills"
top_k = 5

[llm]
enabled = false
model = "deepseek-reasoner"

[fallback]
mode = "keywords"

[bridge]
kind = "remote_control"
"#,
            "toml",
        )
        .unwrap();
        assert_eq!(config.skills_root, PathBuf::from("/opt/skills"));
        assert_eq!(config.top_k, 5);
        assert!(!config.llm.enabled);
        assert_eq!(config.llm.model.as_deref(), Some("deepseek-reasoner"));
        assert_eq!(config.llm.temperature, 0.2);
        assert_eq!(config.fallback.mode, FallbackMode::Keywords);
        assert_eq!(config.bridge.kind, BridgeKind::RemoteControl);
    }

    #[test]
    fn test_json_and_yaml() {
        let json = AgentConfig::parse(r#"{"top_k": 1}"#, "json").unwrap();
        assert_eq!(json.top_k, 1);
        let yaml = AgentConfig::parse("top_k: 2\nllm:\n  max_tokens: 64\n", "yml").unwrap();
        assert_eq!(yaml.top_k, 2);
        assert_eq!(yaml.llm.max_tokens, 64);
    }

    #[test]
    fn test_rejects_unknown_fields_and_formats() {
        assert!(AgentConfig::parse("topk = 3", "toml").is_err());
        assert!(AgentConfig::parse("", "ini").is_err());
    }

    #[test]
    fn test_from_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("smt.toml");
        fs::write(&path, "top_k = 4\n[llm]\nmodel = \"${SMT_TEST_UNSET_MODEL:-deepseek-chat}\"\n")
            .unwrap();
        let config = AgentConfig::from_path(&path).unwrap();
        assert_eq!(config.top_k, 4);
        assert_eq!(config.llm.model.as_deref(), Some("deepseek-chat"));

        assert!(AgentConfig::from_path(dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_interpolate_env_vars() {
        unsafe {
            std::env::set_var("SMT_TEST_KEY", "sk-123");
        }
        let out = interpolate_env_vars("api_key = \"${SMT_TEST_KEY}\"").unwrap();
        assert_eq!(out, "api_key = \"sk-123\"");
        assert!(interpolate_env_vars("x = \"${SMT_TEST_NOT_SET_ANYWHERE}\"").is_err());
    }

    #[test]
    fn test_schema_lists_sections() {
        let schema = serde_json::to_value(AgentConfig::schema()).unwrap();
        let props = &schema["properties"];
        for key in ["skills_root", "top_k", "llm", "fallback", "bridge"] {
            assert!(props.get(key).is_some(), "missing {}", key);
        }
    }
}
