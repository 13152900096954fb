use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use skillmt::{SkillCatalog, SkillRegistry, error_result};
use tracing::instrument;

use crate::config::AgentConfig;
use crate::fallback::Fallback;
use crate::llm::{DeepseekClient, GenerateRequest, LlmClient, LlmError};
use crate::parse::parse_tool_call;

pub const NOT_UNDERSTOOD_MSG: &str = "could not understand instruction";

/// Where the text that was parsed for a tool call came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Llm,
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentOutcome {
    /// Tool the response asked for, if one could be parsed.
    pub tool: Option<String>,
    pub response_source: ResponseSource,
    /// Raw response text.
    pub response: String,
    pub result: Value,
}

/// Turns one natural-language instruction into at most one validated tool
/// call: retrieve, prompt, parse, dispatch.
pub struct Agent {
    registry: SkillRegistry,
    llm: Option<Arc<dyn LlmClient>>,
    fallback: Fallback,
    preamble: String,
    top_k: usize,
    max_tokens: u32,
    temperature: f32,
}

impl Agent {
    /// An agent over `registry` with no LLM client; every instruction goes
    /// through the fallback until [`Agent::with_llm`] is called.
    pub fn new(registry: SkillRegistry, config: &AgentConfig) -> Self {
        Self {
            registry,
            llm: None,
            fallback: Fallback::new(config.fallback.clone()),
            preamble: config.preamble.clone(),
            top_k: config.top_k,
            max_tokens: config.llm.max_tokens,
            temperature: config.llm.temperature,
        }
    }

    /// Load the registry from `config.skills_root` and connect the
    /// configured LLM. A client that cannot be built is logged and left out.
    pub fn from_config(config: &AgentConfig, catalog: SkillCatalog) -> Self {
        let registry = SkillRegistry::load(&config.skills_root, catalog);
        let agent = Self::new(registry, config);
        if !config.llm.enabled {
            log::info!("LLM disabled in configuration, using fallback only");
            return agent;
        }
        match DeepseekClient::from_settings(&config.llm) {
            Ok(client) => {
                log::debug!("LLM endpoint {} model {}", client.endpoint(), client.model());
                agent.with_llm(Arc::new(client))
            }
            Err(e) => {
                log::warn!("LLM client unavailable: {}", e);
                agent
            }
        }
    }

    pub fn with_llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn registry(&self) -> &SkillRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SkillRegistry {
        &mut self.registry
    }

    /// Preamble, every skill prompt, then the retrieved tool definitions.
    pub fn system_prompt(&self, instruction: &str) -> String {
        let mut prompt = self.preamble.clone();
        for section in self.registry.prompts() {
            prompt.push_str(section);
            prompt.push('\n');
        }

        let tools: Vec<Value> = self
            .registry
            .retrieve(instruction, self.top_k)
            .into_iter()
            .map(|d| d.to_tool_json())
            .collect();
        if !tools.is_empty() {
            let json = serde_json::to_string_pretty(&tools).unwrap_or_default();
            prompt.push_str("--- Relevant tools ---\n");
            prompt.push_str(&json);
            prompt.push('\n');
        }
        prompt
    }

    async fn ask_llm(&self, system: String, instruction: &str) -> Result<String, LlmError> {
        let llm = self.llm.as_ref().ok_or(LlmError::NotConfigured)?;
        let request = GenerateRequest {
            system,
            user: instruction.to_string(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        llm.generate(&request).await
    }

    #[instrument(name = "agent.run", skip_all)]
    pub async fn run(&self, instruction: &str) -> AgentOutcome {
        let system = self.system_prompt(instruction);
        let (response, response_source) = match self.ask_llm(system, instruction).await {
            Ok(text) => (text, ResponseSource::Llm),
            Err(e) => {
                log::warn!(
                    "LLM unavailable ({}), answering with {:?} fallback",
                    e,
                    self.fallback.mode()
                );
                (self.fallback.respond(instruction), ResponseSource::Fallback)
            }
        };

        match parse_tool_call(&response) {
            Ok(call) => {
                log::info!("Dispatching {} from {:?} response", call.tool, response_source);
                let result = self.registry.execute(&call.tool, &call.args).await;
                AgentOutcome {
                    tool: Some(call.tool),
                    response_source,
                    response,
                    result,
                }
            }
            Err(e) => {
                log::info!("No tool call in response: {}", e);
                AgentOutcome {
                    tool: None,
                    response_source,
                    response,
                    result: error_result(NOT_UNDERSTOOD_MSG),
                }
            }
        }
    }
}
