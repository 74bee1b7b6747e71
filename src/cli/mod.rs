//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod chat;
pub mod config;
pub mod say;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::chat::run_chat;
use crate::cli::config::{run_config, ConfigAction};
use crate::cli::say::run_say;
use crate::core::config::data::Config;
use crate::core::config::defaults::ChatSettings;
use crate::core::config::env::{load_dotenv, EnvOverrides};
use crate::core::conversation::load_prompt_override;
use crate::logging::init_tracing;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_DESCRIBE"),
    ")"
);

#[derive(Parser)]
#[command(name = "gotcha", version = VERSION)]
#[command(about = "A terminal chat client for the OpenAI Responses API")]
#[command(
    long_about = "Gotcha streams answers from the OpenAI Responses API into your terminal, \
showing web search activity and reasoning summaries as they happen.\n\n\
Environment Variables:\n\
  OPENAI_API_KEY    Your OpenAI API key (required)\n\
  OPENAI_BASE_URL   Custom API base URL (optional, defaults to https://api.openai.com)\n\
  LLM_MODEL         Model to use (overrides the config file)\n\
  LLM_MAX_TOKENS    Output token budget per turn\n\
  LLM_TEMPERATURE   Sampling temperature (ignored by reasoning models)\n\
  PROXY_URL         Explicit HTTP(S) proxy\n\
  GOTCHA_LOG        Log filter, e.g. 'gotcha=debug' (default: warn)\n\n\
A .env file in the working directory is loaded when present, and prompt.md in \
the working directory replaces the built-in system prompt."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use for this session
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Write diagnostic logs to this file instead of stderr
    #[arg(short = 'l', long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat (default)
    Chat,
    /// Send a single prompt and print the answer
    Say {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// Show or edit the configuration file
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    if let Err(err) = init_tracing(args.log_file.as_deref()) {
        eprintln!("⚠️  Logging disabled: {err}");
    }
    load_dotenv();

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    match args.command.unwrap_or(Commands::Chat) {
        Commands::Config { action } => run_config(action),
        Commands::Say { prompt } => {
            let settings = load_settings(args.model)?;
            run_say(settings, prompt.join(" ")).await
        }
        Commands::Chat => {
            let settings = load_settings(args.model)?;
            run_chat(settings).await
        }
    }
}

/// Loads the config file, layers environment overrides and the `--model`
/// flag on top, and resolves defaults.
pub fn load_settings(model: Option<String>) -> Result<ChatSettings, Box<dyn Error>> {
    let mut config = Config::load()?;
    let overrides = EnvOverrides::from_env();
    config.apply_env(&overrides);
    if let Some(model) = model.filter(|model| !model.trim().is_empty()) {
        config.model = Some(model);
    }
    if let Ok(cwd) = std::env::current_dir() {
        if let Some(prompt) = load_prompt_override(&cwd) {
            config.system_prompt = Some(prompt);
        }
    }
    Ok(config.resolve(overrides.api_key))
}
