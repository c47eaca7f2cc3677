//! GitGPT CLI - ask an LLM to drive git for you
//!
//! Each invocation runs exactly one agent turn: the instruction is appended to
//! the persisted chat log, the model works through the git tools, and the log
//! is saved (or deleted, when the session was restarted) before exiting.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use clap::{CommandFactory, Parser};
use console::style;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use gitgpt_core::config::{Config, ConfigManager};
use gitgpt_core::provider::{create_provider_from_config, ProviderType};
use gitgpt_core::session::{join_instruction, AgentLoop, ChatLog, SessionOutput, SystemPrompt};
use gitgpt_core::tools::ToolRegistry;
use gitgpt_core::vcs::GitCli;

#[derive(Parser)]
#[command(name = "gitgpt")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tell an LLM what to do with your git repository", long_about = None)]
struct Cli {
    /// Reset the chat session. Use this if the model refuses to respond or run commands.
    #[arg(long, conflicts_with = "instruction")]
    reset: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// LLM Provider (openai, anthropic, gemini, etc.) - defaults to config setting
    #[arg(short, long)]
    provider: Option<ProviderType>,

    /// Model to use (defaults to the configured or provider's default)
    #[arg(short, long)]
    model: Option<String>,

    /// What you want done, in plain words
    #[arg(trailing_var_arg = true)]
    instruction: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    if std::env::args_os().len() <= 1 {
        Cli::command().print_help()?;
        println!();
        return Ok(ExitCode::SUCCESS);
    }

    let cli = Cli::parse();

    let config_manager = ConfigManager::new().context("Failed to load configuration")?;
    init_logging(cli.verbose, config_manager.config());

    let chat_log_path = config_manager.chat_log_path()?;
    execute(&cli, config_manager.config(), &chat_log_path).await
}

/// Handle a parsed command line against the chat log at `chat_log_path`
async fn execute(cli: &Cli, config: &Config, chat_log_path: &Path) -> anyhow::Result<ExitCode> {
    if cli.reset {
        ChatLog::delete(chat_log_path)
            .await
            .context("Failed to delete chat log")?;
        println!("The session was restarted.");
        return Ok(ExitCode::SUCCESS);
    }

    // Nothing to send; leave the log alone
    let Some(instruction) = join_instruction(&cli.instruction) else {
        return Ok(ExitCode::FAILURE);
    };

    run_turn(cli, config, chat_log_path, &instruction).await?;
    Ok(ExitCode::SUCCESS)
}

/// `RUST_LOG` wins, then `--verbose`, then the configured level
fn init_logging(verbose: bool, config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("info,gitgpt_core=debug")
        } else {
            EnvFilter::new(&config.general.log_level)
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_turn(
    cli: &Cli,
    config: &Config,
    chat_log_path: &Path,
    instruction: &str,
) -> anyhow::Result<()> {
    let provider = create_provider_from_config(&config.provider, cli.provider, cli.model.as_deref())?;
    tracing::info!(
        provider = %provider.provider_type(),
        model = provider.model(),
        "Using completion provider"
    );

    let workdir = std::env::current_dir().context("Failed to read the current directory")?;
    let registry = ToolRegistry::new(Arc::new(GitCli::new(workdir)));

    let (output_tx, output_rx) = mpsc::unbounded_channel();
    let mut agent = AgentLoop::new(Arc::new(provider), registry)
        .with_temperature(config.provider.temperature)
        .with_output_channel(output_tx);
    if let Some(max_rounds) = config.general.max_rounds {
        agent = agent.with_max_rounds(max_rounds);
    }

    let log = ChatLog::load(chat_log_path, &SystemPrompt::from_environment(), Local::now())
        .await
        .with_context(|| format!("Failed to load chat log from {}", chat_log_path.display()))?;
    let log = log.add_user_message(instruction, Local::now());

    // Ctrl-C cancels the in-flight completion request
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let printer = tokio::spawn(print_outputs(output_rx));
    let result = agent.run_turn(log, &cancel).await;
    drop(agent);
    let _ = printer.await;

    // Transport errors end the run without touching the log
    let outcome = result?;

    if outcome.is_cancelled() {
        println!("Cancelled by user.");
    }

    ChatLog::persist_outcome(&outcome, chat_log_path)
        .await
        .context("Failed to persist chat log")?;

    Ok(())
}

/// Render agent progress until the loop drops its sender
async fn print_outputs(mut rx: mpsc::UnboundedReceiver<SessionOutput>) {
    while let Some(output) = rx.recv().await {
        match output {
            SessionOutput::AssistantMessage { content } => {
                println!("{}", content);
            }
            SessionOutput::ToolStart { name, .. } => {
                println!("  {} {}", style("[Executing:").dim(), style(&name).yellow());
            }
            SessionOutput::ToolDone { name, success, .. } => {
                if success {
                    println!("  {} {}", style("✓").green(), style(format!("{} completed", name)).dim());
                } else {
                    println!("  {} {}", style("✗").red(), style(format!("{} failed", name)).dim());
                }
            }
            SessionOutput::Cancelled => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn existing_log(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("chatlog.json");
        std::fs::write(&path, "[{\"role\":\"system\",\"content\":\"kept\"}]").unwrap();
        path
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_words_after_flags_form_instruction() {
        let cli = Cli::try_parse_from(["gitgpt", "-p", "anthropic", "stage", "all", "docs"]).unwrap();
        assert_eq!(cli.provider, Some(ProviderType::Anthropic));
        assert_eq!(
            join_instruction(&cli.instruction).as_deref(),
            Some("stage all docs")
        );
    }

    #[test]
    fn test_reset_conflicts_with_instruction() {
        assert!(Cli::try_parse_from(["gitgpt", "--reset", "commit"]).is_err());
        assert!(Cli::try_parse_from(["gitgpt", "--reset"]).unwrap().reset);
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        assert!(Cli::try_parse_from(["gitgpt", "-p", "carrier-pigeon", "hi"]).is_err());
    }

    #[tokio::test]
    async fn test_empty_instruction_leaves_log_untouched() {
        let dir = TempDir::new().unwrap();
        let path = existing_log(&dir);
        let before = std::fs::read(&path).unwrap();

        for args in [vec!["gitgpt", "-v"], vec!["gitgpt", "  ", "\t"]] {
            let cli = Cli::try_parse_from(args).unwrap();
            let code = execute(&cli, &Config::default(), &path).await.unwrap();
            assert_eq!(code, ExitCode::FAILURE);
        }

        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_reset_deletes_log() {
        let dir = TempDir::new().unwrap();
        let path = existing_log(&dir);

        let cli = Cli::try_parse_from(["gitgpt", "--reset"]).unwrap();
        let code = execute(&cli, &Config::default(), &path).await.unwrap();

        assert_eq!(code, ExitCode::SUCCESS);
        assert!(!path.exists());
    }
}
