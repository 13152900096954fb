use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde_json::{Value, json};
use skillmt::{SkillCatalog, SkillRegistry, is_error, tool_def_schema};
use skillmt_agent::{Agent, AgentConfig, BridgeKind, BridgeSettings};
use skillmt_medieval::{MedievalBuilderFactory, MockBridge, RemoteControlBridge, SpawnBridge};
use url::Url;

mod cli_args;
mod tracing;

use cli_args::{CliArgs, Commands};
use tracing::setup_logging;

const DEFAULT_CONFIG: &str = "smt.toml";

fn load_config(args: &CliArgs) -> Result<AgentConfig> {
    let mut config = match &args.config {
        Some(path) => AgentConfig::from_path(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => AgentConfig::from_path(DEFAULT_CONFIG)?,
        None => AgentConfig::default(),
    };
    if let Some(skills) = &args.skills {
        config.skills_root = skills.clone();
    }
    Ok(config)
}

fn spawn_bridge(settings: &BridgeSettings) -> Result<Arc<dyn SpawnBridge>> {
    match settings.kind {
        BridgeKind::Mock => Ok(Arc::new(MockBridge)),
        BridgeKind::RemoteControl => {
            let base = Url::parse(&settings.base_url)
                .with_context(|| format!("Invalid bridge base_url '{}'", settings.base_url))?;
            let bridge =
                RemoteControlBridge::new(&base, Duration::from_secs(settings.timeout_secs))?;
            log::info!("Spawning through Remote Control API at {}", base);
            Ok(Arc::new(bridge))
        }
    }
}

/// Every skill implementation compiled into this binary.
fn catalog(config: &AgentConfig) -> Result<SkillCatalog> {
    let mut catalog = SkillCatalog::new();
    catalog.register(Arc::new(MedievalBuilderFactory::new(spawn_bridge(
        &config.bridge,
    )?)));
    Ok(catalog)
}

fn registry(config: &AgentConfig) -> Result<SkillRegistry> {
    Ok(SkillRegistry::load(&config.skills_root, catalog(config)?))
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    setup_logging()?;
    let mut config = load_config(&args)?;

    match args.command {
        Commands::Run {
            instruction,
            no_llm,
        } => {
            if no_llm {
                config.llm.enabled = false;
            }
            let agent = Agent::from_config(&config, catalog(&config)?);
            let outcome = agent.run(&instruction).await;
            print_json(&serde_json::to_value(&outcome)?)?;
        }
        Commands::List => {
            let registry = registry(&config)?;
            let tools: Vec<Value> = registry
                .names()
                .into_iter()
                .filter_map(|name| registry.get(name))
                .map(|entry| {
                    json!({
                        "name": entry.definition.name,
                        "description": entry.definition.description,
                        "implementation": entry.implementation,
                        "source": entry.source.as_ref().map(|p| p.display().to_string()),
                    })
                })
                .collect();
            print_json(&Value::Array(tools))?;
        }
        Commands::Retrieve { query, top_k } => {
            let registry = registry(&config)?;
            let ranked: Vec<Value> = registry
                .rank(&query)
                .into_iter()
                .take(top_k.unwrap_or(config.top_k))
                .map(|hit| json!({"name": hit.name, "score": hit.score}))
                .collect();
            print_json(&Value::Array(ranked))?;
        }
        Commands::Exec { tool, args } => {
            let registry = registry(&config)?;
            let result = registry.execute(&tool, &args.unwrap_or_default()).await;
            print_json(&result)?;
            if is_error(&result) {
                std::process::exit(1);
            }
        }
        Commands::Validate { tool, args } => {
            let registry = registry(&config)?;
            if !registry.contains(&tool) {
                bail!("Tool '{}' is not registered", tool);
            }
            match registry.validate(&tool, &args.unwrap_or_default()) {
                Ok(()) => print_json(&json!({"valid": true}))?,
                Err(e) => {
                    print_json(&json!({"valid": false, "error": e.to_string()}))?;
                    std::process::exit(1);
                }
            }
        }
        Commands::Prompt { instruction } => {
            let agent = Agent::new(registry(&config)?, &config);
            print!("{}", agent.system_prompt(&instruction));
        }
        Commands::Schema { tool_def: true } => {
            print_json(&serde_json::to_value(tool_def_schema())?)?;
        }
        Commands::Schema { tool_def: false } => {
            print_json(&serde_json::to_value(AgentConfig::schema())?)?;
        }
    }

    Ok(())
}
