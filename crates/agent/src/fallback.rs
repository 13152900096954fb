//! Local stand-in for the LLM when it cannot be reached.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

pub const NOT_UNDERSTOOD: &str = "无法理解指令";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FallbackMode {
    /// Produce a response with no tool call.
    #[default]
    Disabled,
    /// Match the instruction against [`FallbackRule`]s.
    Keywords,
}

/// Fires when any of `keywords` occurs in the instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FallbackRule {
    pub keywords: Vec<String>,
    pub tool: String,
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl FallbackRule {
    fn matches(&self, instruction: &str) -> bool {
        self.keywords.iter().any(|k| instruction.contains(k.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct FallbackConfig {
    pub mode: FallbackMode,
    /// Checked in order; the first match wins.
    pub rules: Vec<FallbackRule>,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            mode: FallbackMode::Disabled,
            rules: default_rules(),
        }
    }
}

fn default_rules() -> Vec<FallbackRule> {
    let args = json!({
        "building_type": "blacksmith",
        "location": [0, 0, 0],
        "rotation_yaw": 90,
    });
    vec![FallbackRule {
        keywords: vec!["铁匠铺".to_string(), "blacksmith".to_string()],
        tool: "spawn_medieval_building".to_string(),
        args: args.as_object().cloned().unwrap_or_default(),
    }]
}

/// Deterministic response generator used in place of the LLM.
#[derive(Debug, Clone, Default)]
pub struct Fallback {
    config: FallbackConfig,
}

impl Fallback {
    pub fn new(config: FallbackConfig) -> Self {
        Self { config }
    }

    pub fn mode(&self) -> FallbackMode {
        self.config.mode
    }

    /// Response text in the same shape an LLM would produce: a fenced JSON
    /// tool call, or plain text when nothing applies.
    pub fn respond(&self, instruction: &str) -> String {
        if self.config.mode == FallbackMode::Disabled {
            return NOT_UNDERSTOOD.to_string();
        }
        match self.config.rules.iter().find(|r| r.matches(instruction)) {
            Some(rule) => {
                let call = json!({"tool": rule.tool, "args": rule.args});
                let body = serde_json::to_string_pretty(&call).unwrap_or_else(|_| call.to_string());
                format!("```json\n{}\n```", body)
            }
            None => NOT_UNDERSTOOD.to_string(),
        }
    }
}
