//! ai-flow-cli: run, inspect and compile block flows from the command line.
//!
//! Usage:
//!   ai-flow-cli run <flow> [--config <path>] [--dry-run]   Execute every block in order
//!   ai-flow-cli resolve <flow> <index>                      Show a block's resolved prompt
//!   ai-flow-cli compile <schema.json>                       Show the compiled request schema

use ai_flow_rust::flow::{FlowDefinition, FlowEngine, FlowStore};
use ai_flow_rust::gateway::GenerationGateway;
use ai_flow_rust::provider::{GenerationProvider, InMemoryProvider, OpenAiProvider};
use ai_flow_rust::structured::compile;
use ai_flow_rust::template::{resolve_detailed, stringify_result};
use ai_flow_rust::types::SchemaDescription;
use ai_flow_rust::FlowConfig;
use anyhow::{bail, Context};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let outcome = match args[1].as_str() {
        "run" => cmd_run(&args[2..]).await,
        "resolve" => cmd_resolve(&args[2..]),
        "compile" => cmd_compile(&args[2..]),
        "version" | "--version" | "-V" => {
            cmd_version();
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"ai-flow-cli: linear LLM block flows

USAGE:
    ai-flow-cli <COMMAND> [OPTIONS]

COMMANDS:
    run <flow> [--config <path>] [--dry-run]
                                Execute every block in order and print results
    resolve <flow> <index>      Print the resolved prompt of block <index> (no provider call)
    compile <schema.json>       Print the compiled request schema for a schema description
    version                     Show version information
    help                        Show this help message

FLOW FILES:
    YAML (.yaml/.yml) or JSON (.json) with a `blocks` list.

ENVIRONMENT:
    AI_FLOW_BASE_URL            Provider base URL (default https://api.openai.com/v1)
    AI_FLOW_MODEL               Model name
    OPENAI_API_KEY              API key (checked after the OS keyring, service "ai-flow")
    AI_FLOW_TEMPERATURE         Default temperature for blocks that omit it
    AI_FLOW_MAX_TOKENS          Default max tokens for blocks that omit it
    RUST_LOG                    Log filter (default "info")"#
    );
}

fn cmd_version() {
    println!("ai-flow-cli {}", env!("CARGO_PKG_VERSION"));
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn load_flow(path: &Path, config: &FlowConfig) -> anyhow::Result<FlowStore> {
    let definition = FlowDefinition::from_file(path)
        .with_context(|| format!("loading flow {}", path.display()))?;
    Ok(FlowStore::from_blocks(
        definition.into_blocks(&config.defaults),
    ))
}

async fn cmd_run(args: &[String]) -> anyhow::Result<()> {
    let Some(flow_path) = args.first().filter(|a| !a.starts_with("--")) else {
        bail!("missing flow file; usage: ai-flow-cli run <flow>");
    };
    let config_path = flag_value(args, "--config").map(PathBuf::from);
    let config = FlowConfig::load(config_path.as_deref())?;
    let store = Arc::new(load_flow(Path::new(flow_path), &config)?);

    let provider: Arc<dyn GenerationProvider> = if args.iter().any(|a| a == "--dry-run") {
        Arc::new(InMemoryProvider::new())
    } else {
        Arc::new(OpenAiProvider::new(&config.provider)?)
    };
    let gateway = GenerationGateway::new(provider);
    println!("Provider: {}", gateway.provider_name());
    println!();

    let engine = FlowEngine::new(Arc::clone(&store), gateway);
    let outcomes = engine.execute_flow().await;

    let snapshot = store.snapshot();
    let mut failures = 0usize;
    for outcome in &outcomes {
        let name = snapshot
            .get(&outcome.block_id)
            .map(|b| b.name.as_str())
            .unwrap_or("?");
        println!("=== [{}] {} ===", outcome.index, name);
        if let Some(prompt) = &outcome.resolved_prompt {
            println!("prompt: {prompt}");
        }
        match &outcome.result {
            Some(result) if result.is_failure() => {
                failures += 1;
                println!("FAILED: {result:?}");
            }
            Some(result) => println!("{}", stringify_result(result)),
            None => println!("(no result)"),
        }
        println!();
    }

    println!("{}/{} blocks succeeded", outcomes.len() - failures, outcomes.len());
    if failures > 0 {
        std::process::exit(2);
    }
    Ok(())
}

fn cmd_resolve(args: &[String]) -> anyhow::Result<()> {
    let (Some(flow_path), Some(index)) = (args.first(), args.get(1)) else {
        bail!("usage: ai-flow-cli resolve <flow> <index>");
    };
    let index: usize = index
        .parse()
        .with_context(|| format!("invalid block index: {index}"))?;
    let config = FlowConfig::load(None)?;
    let store = load_flow(Path::new(flow_path), &config)?;
    let snapshot = store.snapshot();

    let Some(block) = snapshot.blocks.get(index) else {
        bail!("flow has {} blocks; index {} is out of range", snapshot.len(), index);
    };
    let template = block.settings.prompt.as_deref().unwrap_or_default();
    let resolution = resolve_detailed(template, &snapshot.blocks, index);

    println!("{}", resolution.text);
    for (mention, reason) in resolution.unresolved() {
        eprintln!("unresolved @[{}]({}): {:?}", mention.display, mention.identifier, reason);
    }
    Ok(())
}

fn cmd_compile(args: &[String]) -> anyhow::Result<()> {
    let Some(path) = args.first() else {
        bail!("usage: ai-flow-cli compile <schema.json>");
    };
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let description: SchemaDescription =
        serde_json::from_str(&raw).with_context(|| format!("parsing {path}"))?;
    let compiled = compile(&description)?;

    println!("{}", serde_json::to_string_pretty(&compiled.request_schema())?);
    for field in compiled.fallback_fields() {
        eprintln!("field '{field}' has an unknown type; compiled as string");
    }
    Ok(())
}
