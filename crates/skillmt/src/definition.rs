//! Declarative tool definitions as read from `tool_def.json`.

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// The JSON types understood by the argument validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    String,
    Number,
    Integer,
    Array,
    Boolean,
    Object,
}

impl PropertyType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "string" => Some(PropertyType::String),
            "number" => Some(PropertyType::Number),
            "integer" => Some(PropertyType::Integer),
            "array" => Some(PropertyType::Array),
            "boolean" => Some(PropertyType::Boolean),
            "object" => Some(PropertyType::Object),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::String => "string",
            PropertyType::Number => "number",
            PropertyType::Integer => "integer",
            PropertyType::Array => "array",
            PropertyType::Boolean => "boolean",
            PropertyType::Object => "object",
        }
    }
}

/// Schema of a single named argument.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PropertySpec {
    /// JSON type name ("string", "number", "array", ...). Unions such as
    /// `["string", "null"]`, unknown names and an absent type are accepted
    /// without checks.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "minItems", default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    #[serde(rename = "maxItems", default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<PropertySpec>>,
    /// Any other schema keywords, kept so the definition round-trips into prompts.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl PropertySpec {
    pub fn kind(&self) -> Option<PropertyType> {
        self.property_type
            .as_ref()
            .and_then(Value::as_str)
            .and_then(PropertyType::parse)
    }
}

/// Object schema describing a tool's keyword arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ParameterSchema {
    #[serde(rename = "type", default = "ParameterSchema::object_type")]
    pub schema_type: String,
    #[serde(default)]
    pub properties: IndexMap<String, PropertySpec>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl ParameterSchema {
    fn object_type() -> String {
        "object".to_string()
    }
}

impl Default for ParameterSchema {
    fn default() -> Self {
        Self {
            schema_type: Self::object_type(),
            properties: IndexMap::new(),
            required: Vec::new(),
        }
    }
}

/// A tool as declared by a skill directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SkillDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<ParameterSchema>,
}

impl SkillDefinition {
    /// Render as an OpenAI-style function tool.
    pub fn to_tool_json(&self) -> Value {
        let parameters = match &self.parameters {
            Some(p) => serde_json::to_value(p).unwrap_or_else(|_| json!({"type": "object"})),
            None => json!({"type": "object", "properties": {}}),
        };
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": parameters,
            }
        })
    }
}

/// JSON schema of one tool entry in `tool_def.json`.
pub fn tool_def_schema() -> schemars::schema::RootSchema {
    schemars::schema_for!(SkillDefinition)
}

/// Normalize the contents of a definition file into zero or more definitions.
///
/// Accepts either a single tool object or `{"tools": [...]}`. Entries without
/// a non-empty `name`, or that do not deserialize, are dropped with a warning.
pub fn parse_tool_defs(text: &str) -> Result<Vec<SkillDefinition>, serde_json::Error> {
    let root: Value = serde_json::from_str(text)?;

    let candidates = match root {
        Value::Object(mut map) if matches!(map.get("tools"), Some(Value::Array(_))) => {
            match map.remove("tools") {
                Some(Value::Array(tools)) => tools,
                _ => Vec::new(),
            }
        }
        other => vec![other],
    };

    let mut defs = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let named = candidate
            .get("name")
            .and_then(Value::as_str)
            .is_some_and(|n| !n.trim().is_empty());
        if !named {
            log::warn!("Skipping tool definition without a name");
            continue;
        }
        match serde_json::from_value::<SkillDefinition>(candidate) {
            Ok(def) => defs.push(def),
            Err(e) => log::warn!("Skipping malformed tool definition: {}", e),
        }
    }
    Ok(defs)
}
