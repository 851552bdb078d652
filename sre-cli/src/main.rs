//! # SRE CLI
//!
//! Command-line interface for running the reasoning agent.
//!
//! Usage:
//!   sre solve [INCIDENT]
//!   sre replay <FILE.json>
//!   sre tools
//!
//! Examples:
//!   OPENROUTER_API_KEY=sk-or-... sre solve
//!   sre solve "ALERT: /var is at 97% on db-2"
//!   sre --base-url http://localhost:11434/v1 --model llama3.1 solve
//!   sre replay demos/disk_full.json

use clap::parser::ValueSource;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use sre_agent::{Agent, AgentConfig, Error, Guardrail, ModelAdapter, Registry, Result};
use sre_core::{OpenAIProvider, ProviderAdapter, ProviderConfig, ScriptedModel, SimulatedBash};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_INCIDENT: &str = "ALERT: Disk usage is at 100% on /dev/sda1. Fix it immediately.";

#[derive(Parser)]
#[command(name = "sre")]
#[command(author, version, about = "SRE Reasoning Core - an agent that reasons through incidents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Maximum model calls per run
    #[arg(long, global = true, env = "SRE_MAX_LOOPS", default_value_t = 10)]
    max_loops: usize,

    /// API key for the model provider. The OPENROUTER_API_KEY fallback is
    /// only sent to OpenRouter, never to a --base-url endpoint.
    #[arg(long, global = true, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Set when `api_key` came from the environment rather than the flag
    #[arg(skip)]
    api_key_from_env: bool,

    /// Model to request (defaults to the provider's default)
    #[arg(long, global = true, env = "SRE_MODEL")]
    model: Option<String>,

    /// OpenAI-compatible endpoint to use instead of OpenRouter
    #[arg(long, global = true, env = "SRE_BASE_URL")]
    base_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode - only show the final answer
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Reason through an incident against a live model
    Solve {
        /// The incident description
        #[arg(default_value = DEFAULT_INCIDENT)]
        incident: String,
    },
    /// Replay a scripted run from a JSON array of raw model responses
    Replay {
        /// Path to the script file
        #[arg(required = true)]
        file: String,

        /// Incident to replay against
        #[arg(short, long, default_value = DEFAULT_INCIDENT)]
        incident: String,
    },
    /// Show the tools available to the agent
    Tools,
}

fn parse_cli() -> Cli {
    let matches = Cli::command().get_matches();
    let mut cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
    cli.api_key_from_env = matches.value_source("api_key") == Some(ValueSource::EnvVariable);
    cli
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default = if verbose {
        "sre=debug"
    } else if quiet {
        "sre=error"
    } else {
        "sre=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn default_registry() -> Registry {
    Registry::new().with_tool(SimulatedBash::new())
}

fn truncate(s: &str, max_len: usize) -> String {
    match s.char_indices().nth(max_len) {
        None => s.to_string(),
        Some((idx, _)) => format!("{}…", &s[..idx]),
    }
}

/// Build the provider config from flags; no network access happens here
fn provider_config(cli: &Cli) -> Result<ProviderConfig> {
    let api_key = cli.api_key.clone().filter(|key| !key.trim().is_empty());

    let config = match (&cli.base_url, api_key) {
        (Some(base_url), key) => {
            let key = match key {
                Some(_) if cli.api_key_from_env => {
                    tracing::warn!(
                        base_url = %base_url,
                        "not sending OPENROUTER_API_KEY to a custom endpoint; pass --api-key explicitly"
                    );
                    None
                }
                key => key,
            };
            ProviderConfig::openai_compatible(base_url.clone(), key)
        }
        (None, Some(key)) => ProviderConfig::openrouter(key),
        (None, None) => {
            return Err(Error::config_invalid(
                "no API key: set OPENROUTER_API_KEY or pass --api-key (or --base-url for a local endpoint)",
            )
            .with_operation("cli::solve"));
        }
    };

    Ok(match &cli.model {
        Some(model) => config.with_model(model.clone()),
        None => config,
    })
}

/// Parse a replay script: a JSON array whose items are raw response strings
/// or step objects.
fn load_script(content: &str) -> Result<Vec<String>> {
    let items: Vec<serde_json::Value> = serde_json::from_str(content).map_err(|e| {
        Error::parse_failed("replay script must be a JSON array")
            .with_operation("cli::replay")
            .set_source(e)
    })?;

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            serde_json::Value::String(raw) => Ok(raw),
            serde_json::Value::Object(_) => Ok(item.to_string()),
            other => Err(Error::invalid_argument(format!(
                "script item {} must be a string or an object, got {}",
                i, other
            ))
            .with_operation("cli::replay")),
        })
        .collect()
}

/// Drive a run to completion, printing the transcript as it goes
async fn drive<M: ModelAdapter>(agent: &Agent<M>, incident: &str, quiet: bool) -> Result<String> {
    if !quiet {
        println!("Incident: {}\n", incident);
    }

    let mut run = agent.run(incident);
    let mut seen = 0;

    while let Some(step) = run.next_step().await {
        let observations: Vec<String> = run
            .history()
            .observations()
            .skip(seen)
            .map(|obs| obs.text().to_string())
            .collect();
        seen += observations.len();
        if !quiet {
            for text in observations {
                println!("   {}\n", truncate(&text, 400));
            }
        }

        let step = step?;
        if quiet {
            continue;
        }

        println!("[{}] Thought: {}", run.iterations() + 1, step.thought());
        if let Some(action) = step.action() {
            if !step.is_final() {
                println!(
                    "    Action: {} {}",
                    action.name,
                    serde_json::Value::Object(action.arguments.clone())
                );
            }
        }
    }

    let answer = run
        .final_answer()
        .map(str::to_string)
        .ok_or_else(|| Error::unexpected("run ended without a final answer"))?;

    if !quiet {
        println!("\n--- FINAL ANSWER ({} iterations) ---\n", run.iterations() + 1);
    }
    println!("{}", answer);
    Ok(answer)
}

async fn solve(cli: &Cli, incident: &str) -> Result<String> {
    let config = provider_config(cli)?;
    tracing::info!(
        provider = %config.name,
        model = %config.default_model,
        max_loops = cli.max_loops,
        "starting live run"
    );

    let provider = OpenAIProvider::new(config)?;
    let agent = Agent::new(
        AgentConfig::default().with_max_loops(cli.max_loops),
        ProviderAdapter::new(provider),
        default_registry(),
        Guardrail::default(),
    );

    drive(&agent, incident, cli.quiet).await
}

async fn replay(cli: &Cli, file: &str, incident: &str) -> Result<String> {
    let content = std::fs::read_to_string(file)
        .map_err(|e| Error::from(e).with_operation("cli::replay").with_context("file", file))?;
    let script = load_script(&content)?;

    tracing::info!(file, responses = script.len(), "replaying script");

    let agent = Agent::new(
        AgentConfig::default().with_max_loops(cli.max_loops),
        ScriptedModel::new(script),
        default_registry(),
        Guardrail::default(),
    );

    drive(&agent, incident, cli.quiet).await
}

#[tokio::main]
async fn main() {
    let cli = parse_cli();
    init_tracing(cli.verbose, cli.quiet);

    let outcome = match &cli.command {
        Commands::Tools => {
            println!("{}", default_registry().tools_prompt());
            return;
        }
        Commands::Solve { incident } => solve(&cli, incident).await,
        Commands::Replay { file, incident } => replay(&cli, file, incident).await,
    };

    if let Err(e) = outcome {
        eprintln!("\n=== RUN FAILED ===\n");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sre_agent::ErrorKind;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("sre").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_load_script_mixed_items() {
        let script = load_script(r#"["{\"thought\":\"t\"}", {"thought": "x", "finalAnswer": "y"}]"#).unwrap();
        assert_eq!(script.len(), 2);
        assert_eq!(script[0], r#"{"thought":"t"}"#);
        assert!(script[1].contains("\"finalAnswer\":\"y\""));
    }

    #[test]
    fn test_load_script_rejects_other_items() {
        let err = load_script("[1]").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = load_script("{}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseFailed);
    }

    #[test]
    fn test_solve_defaults() {
        let cli = cli(&["--max-loops", "4", "solve"]);
        assert_eq!(cli.max_loops, 4);
        match cli.command {
            Commands::Solve { incident } => assert_eq!(incident, DEFAULT_INCIDENT),
            _ => panic!("expected solve"),
        }
    }

    #[test]
    fn test_provider_config_selection() {
        let mut base = cli(&["tools"]);
        base.api_key = None;
        base.base_url = None;
        base.model = None;
        let err = provider_config(&base).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);

        base.api_key = Some("sk-or-test".into());
        base.model = Some("gpt-4o-mini".into());
        let config = provider_config(&base).unwrap();
        assert_eq!(config.base_url, sre_core::provider::OPENROUTER_BASE_URL);
        assert_eq!(config.default_model, "gpt-4o-mini");

        base.api_key = None;
        base.base_url = Some("http://localhost:11434/v1".into());
        let config = provider_config(&base).unwrap();
        assert_eq!(config.base_url, "http://localhost:11434/v1");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_env_key_not_sent_to_custom_endpoint() {
        let mut base = cli(&["tools"]);
        base.base_url = Some("https://llm.example.internal/v1".into());
        base.api_key = Some("sk-or-secret".into());
        base.model = None;

        base.api_key_from_env = true;
        let config = provider_config(&base).unwrap();
        assert!(config.api_key.is_none());

        base.api_key_from_env = false;
        let config = provider_config(&base).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-or-secret"));

        base.base_url = None;
        base.api_key_from_env = true;
        let config = provider_config(&base).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-or-secret"));
        assert_eq!(config.name, "openrouter");
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("ééééé", 2), "éé…");
    }
}
