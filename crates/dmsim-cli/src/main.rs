use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;

use dmsim_application::presets::default_threads;
use dmsim_application::{ActivityFeedManager, ConversationSessionManager, SessionConfig};
use dmsim_core::agent::ChatAgent;
use dmsim_core::config::AppConfig;
use dmsim_core::secret::SecretService;
use dmsim_infrastructure::{ConfigService, SecretServiceImpl};
use dmsim_interaction::GeminiChatAgent;

mod app;
mod command;
mod helper;
mod render;

use app::{App, Flow};
use command::Command;
use helper::CliHelper;

#[derive(Parser)]
#[command(name = "dmsim")]
#[command(about = "DMSIM - Simulated social-media direct messages backed by a generative AI agent", long_about = None)]
struct Cli {
    /// Path to config.toml (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Gemini model name
    #[arg(long)]
    model: Option<String>,

    /// Log filter, e.g. "info" or "dmsim_interaction=debug" (RUST_LOG wins)
    #[arg(long)]
    log_level: Option<String>,

    /// Print replies fragment by fragment as they arrive
    #[arg(long)]
    stream: bool,
}

/// Installs the global subscriber. Logs go to stderr so they never mix
/// with the chat transcript.
fn init_logging(level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .init();
}

async fn load_config(cli: &Cli) -> Result<AppConfig> {
    let service = match &cli.config {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new()?,
    };
    let mut config = service.load().await?;
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    config.stream_replies |= cli.stream;
    Ok(config)
}

/// Builds the single agent shared by every thread.
async fn build_agent(cli: &Cli, config: &AppConfig) -> Result<Arc<dyn ChatAgent>> {
    let secrets = SecretServiceImpl::new()?;
    let api_key = secrets.gemini_api_key().await;
    let secret_model = secrets
        .load_secrets()
        .await
        .ok()
        .and_then(|s| s.gemini)
        .and_then(|g| g.model_name);

    let mut agent = GeminiChatAgent::from_config(config, api_key);
    if let Some(model) = cli.model.clone().or(secret_model) {
        agent = agent.with_model(model);
    }
    tracing::info!(model = %agent.model(), "chat agent ready");
    Ok(Arc::new(agent))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli).await?;
    init_logging(&config.log_level);

    // ===== Backend Initialization =====
    let agent = build_agent(&cli, &config).await?;
    let sessions =
        ConversationSessionManager::new(agent, default_threads(), SessionConfig::from(&config))?;
    let mut app = App::new(sessions, ActivityFeedManager::default(), config.stream_replies);

    // ===== REPL Setup =====
    let mut rl: Editor<CliHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(CliHelper));

    println!("{}", "=== dmsim ===".bright_magenta().bold());
    println!(
        "{}",
        "Type /help for commands, or /quit to exit.".bright_black()
    );
    println!();
    app.render().await?;

    // ===== Main REPL Loop =====
    loop {
        let prompt = app.prompt().await;
        match rl.readline(&prompt) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());

                let flow = match Command::parse(&line) {
                    Ok(command) => app.handle(command).await,
                    Err(err) => Err(err.into()),
                };
                match flow {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Quit) => {
                        println!("{}", "Goodbye!".bright_green());
                        break;
                    }
                    Err(err) => eprintln!("{}", format!("Error: {err}").red()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type /quit to exit.".yellow());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        }
    }

    Ok(())
}
