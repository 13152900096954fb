//! Instruction agent over a [`skillmt::SkillRegistry`].
//!
//! One [`Agent::run`] retrieves the tools relevant to an instruction, asks
//! the LLM for a tool call, and dispatches it. When the LLM cannot be
//! reached the configured [`Fallback`] answers instead.

pub mod agent;
pub mod config;
pub mod fallback;
pub mod llm;
pub mod parse;

pub use agent::{Agent, AgentOutcome, NOT_UNDERSTOOD_MSG, ResponseSource};
pub use config::{AgentConfig, BridgeKind, BridgeSettings, LlmSettings};
pub use fallback::{Fallback, FallbackConfig, FallbackMode, FallbackRule};
pub use llm::{DeepseekClient, GenerateRequest, LlmClient, LlmError};
pub use parse::{ParseError, ToolInvocation, parse_tool_call};
