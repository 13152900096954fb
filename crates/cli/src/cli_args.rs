use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

/// Command line arguments for the skill runner
#[derive(Parser, Debug)]
#[clap(
    name = "smt",
    about = "Turn natural-language editor instructions into validated skill calls"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    /// Agent config file (.toml, .json, .yaml). Defaults to ./smt.toml when present.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Skills directory, overriding `skills_root` from the config
    #[arg(long, global = true)]
    pub skills: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an instruction: retrieve, ask the LLM, dispatch
    Run {
        instruction: String,
        /// Skip the LLM and answer with the configured fallback
        #[arg(long)]
        no_llm: bool,
    },
    /// List registered tools
    List,
    /// Rank tools against a query
    Retrieve {
        query: String,
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
    /// Validate and execute a tool directly
    Exec {
        tool: String,
        /// Arguments as a JSON object
        #[arg(short, long, value_parser = parse_json_object)]
        args: Option<Map<String, Value>>,
    },
    /// Check arguments against a tool's schema without executing
    Validate {
        tool: String,
        #[arg(short, long, value_parser = parse_json_object)]
        args: Option<Map<String, Value>>,
    },
    /// Print the system prompt that would be sent for an instruction
    Prompt {
        #[arg(default_value = "")]
        instruction: String,
    },
    /// Print the JSON schema of the config file
    Schema {
        /// Print the schema of a `tool_def.json` entry instead
        #[arg(long)]
        tool_def: bool,
    },
}

pub fn parse_json_object(s: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(s) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("expected a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON: {}", e)),
    }
}
