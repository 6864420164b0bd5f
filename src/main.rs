//! agent-forge CLI entry point.

use std::path::PathBuf;
use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use agent_forge::actions::{ActionContext, ActionRegistry};
use agent_forge::cli::{expand_path, init_tracing, payload_arg, DEFAULT_CONFIG_PATH};
use agent_forge::config::{AppConfig, ProviderKind};
use agent_forge::logging::{normalize, FileLogSink, LogEntry, LogSink};
use agent_forge::prompts::SystemPrompt;

/// Web search actions, system prompts and call tracing for LLM agents.
#[derive(Parser)]
#[command(name = "agent-forge")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, env = "AGENT_FORGE_CONFIG")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the web
    Search {
        /// Search query
        query: String,

        /// Provider to use instead of the configured one
        #[arg(short, long, value_enum)]
        provider: Option<ProviderKind>,

        /// Number of results (1-10)
        #[arg(short, long)]
        num_results: Option<usize>,

        /// Task id recorded in the trace log
        #[arg(long)]
        task_id: Option<String>,

        /// Do not write a trace entry
        #[arg(long)]
        no_trace: bool,
    },

    /// Print the normalized form of a payload ("-" reads stdin)
    Format {
        payload: String,
    },

    /// Append an entry to a trace log file
    Log {
        /// Trace log file
        #[arg(short, long)]
        file: PathBuf,

        #[arg(long)]
        task_id: Option<String>,

        #[arg(long)]
        step_id: Option<String>,

        #[arg(long)]
        question: Option<String>,

        #[arg(long)]
        answer: Option<String>,

        /// JSON or free text ("-" reads stdin)
        #[arg(long)]
        payload: Option<String>,
    },

    /// Print the agent system prompt
    Prompt,

    /// Overwrite an existing file
    Write {
        path: PathBuf,
        data: String,
    },

    /// List available actions
    Actions,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current config
    Show,

    /// Validate config
    Validate,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = expand_path(&cli.config);

    let mut config = AppConfig::load_or_default(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    config.apply_env();

    init_tracing(&config.logging, cli.verbose);

    match cli.command {
        Commands::Search { query, provider, num_results, task_id, no_trace } => {
            if let Some(provider) = provider {
                config.search.provider = provider;
            }
            if let Some(n) = num_results {
                config.search.max_results = n;
            }
            if no_trace {
                config.trace.enabled = false;
            }
            config.validate()?;

            let registry = ActionRegistry::with_builtins(&config)?;
            let ctx = match task_id {
                Some(id) => ActionContext::new(id),
                None => ActionContext::generated(),
            };
            let output = registry
                .execute("web_search", &ctx, json!({ "query": query }))
                .await?;
            println!("{}", output);
        }

        Commands::Format { payload } => {
            println!("{}", normalize(&payload_arg(&payload)?));
        }

        Commands::Log { file, task_id, step_id, question, answer, payload } => {
            let mut entry = LogEntry::new();
            if let Some(task_id) = task_id {
                entry = entry.with_task_id(task_id);
            }
            if let Some(step_id) = step_id {
                entry = entry.with_step_id(step_id);
            }
            if let Some(question) = question {
                entry = entry.with_question(question);
            }
            if let Some(answer) = answer {
                entry = entry.with_answer(answer);
            }
            if let Some(payload) = payload {
                entry = entry.with_payload(payload_arg(&payload)?);
            }

            let sink = FileLogSink::new(expand_path(&file));
            sink.append(&entry).await?;
            println!("Appended entry to {}", sink.path().display());
        }

        Commands::Prompt => {
            print!("{}", SystemPrompt::new().render());
        }

        Commands::Write { path, data } => {
            let written = agent_forge::files::write_to_file(&path, &data)?;
            println!("Wrote {} bytes to {}", data.len(), written.display());
        }

        Commands::Actions => {
            let registry = ActionRegistry::with_builtins(&config)?;
            for action in registry.actions() {
                println!("{} -> {}: {}", action.name(), action.output_type(), action.description());
                for param in action.parameters() {
                    println!(
                        "    {} ({}{})",
                        param.name,
                        serde_json::to_value(param.param_type)?.as_str().unwrap_or_default(),
                        if param.required { ", required" } else { "" }
                    );
                }
            }
        }

        Commands::Config { action } => match action {
            ConfigCommands::Show => {
                println!("Config path: {}", config_path.display());
                println!("{}", serde_json::to_string_pretty(&redacted(&config))?);
            }
            ConfigCommands::Validate => {
                config.validate()?;
                println!("Config is valid");
            }
            ConfigCommands::Init { force } => {
                if config_path.exists() && !force {
                    anyhow::bail!(
                        "{} already exists (use --force to overwrite)",
                        config_path.display()
                    );
                }
                AppConfig::default().save(&config_path)?;
                println!("Wrote default config to {}", config_path.display());
            }
        },
    }

    Ok(())
}

/// Copy of `config` safe to print.
fn redacted(config: &AppConfig) -> AppConfig {
    let mut shown = config.clone();
    let mask = |secret: &mut Option<agent_forge::config::Secret>| {
        if secret.is_some() {
            *secret = Some(agent_forge::config::Secret::new("***"));
        }
    };
    mask(&mut shown.search.google_api_key);
    mask(&mut shown.search.google_custom_search_engine_id);
    shown
}
