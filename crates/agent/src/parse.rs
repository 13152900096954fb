//! Extraction of the tool call from a model response.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A tool name plus keyword arguments, as requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub tool: String,
    #[serde(default)]
    pub args: Map<String, Value>,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no ```json block in response")]
    MissingBlock,
    #[error("tool call is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("tool call has an empty tool name")]
    EmptyTool,
}

fn json_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| match Regex::new(r"(?s)```json[ \t]*\r?\n(.*?)```") {
        Ok(re) => re,
        Err(_) => unreachable!("static regex pattern is valid"),
    })
}

/// Parse the first ```` ```json ```` fenced block of `response` as
/// `{"tool": .., "args": {..}}`. Text outside the block is ignored.
pub fn parse_tool_call(response: &str) -> Result<ToolInvocation, ParseError> {
    let block = json_block_regex()
        .captures(response)
        .and_then(|c| c.get(1))
        .ok_or(ParseError::MissingBlock)?;
    let call: ToolInvocation = serde_json::from_str(block.as_str().trim())?;
    if call.tool.trim().is_empty() {
        return Err(ParseError::EmptyTool);
    }
    Ok(call)
}
