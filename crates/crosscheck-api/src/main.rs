//! Crosscheck CLI entry point.
//!
//! Binary name: `xcheck`
//!
//! Parses CLI arguments, installs tracing, loads application state, then
//! dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use crosscheck_observe::tracing_setup::{LogFormat, init_tracing, shutdown_tracing};

use cli::{Cli, Commands, SessionCommand};
use state::AppState;

/// Default log directive for the given verbosity flags.
fn log_directive(verbose: u8, quiet: bool) -> &'static str {
    match verbose {
        0 if quiet => "error",
        0 => "warn",
        1 => "info,crosscheck=debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let format = if cli.json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_tracing(log_directive(cli.verbose, cli.quiet), format, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "xcheck", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init().await?;

    match cli.command {
        Commands::Ask {
            question,
            role,
            doc,
            session,
        } => {
            cli::ask::ask(
                &state,
                question,
                role,
                doc.as_deref(),
                session,
                cli.json,
                cli.quiet,
            )
            .await?;
        }

        Commands::Chat { role, doc } => {
            cli::chat::loop_runner::run_chat_loop(&state, role, doc.as_deref()).await?;
        }

        Commands::Sessions { action } => match action {
            SessionCommand::List => cli::session::list_sessions(&state, cli.json).await?,
            SessionCommand::Show { number } => {
                cli::session::show_session(&state, number, cli.json).await?
            }
            SessionCommand::New => cli::session::new_session(&state, cli.json).await?,
            SessionCommand::Rename { number, title } => {
                cli::session::rename_session(&state, number, &title, cli.json).await?
            }
            SessionCommand::Delete { number, force } => {
                cli::session::delete_session(&state, number, force, cli.json).await?
            }
            SessionCommand::Clear { force } => {
                cli::session::clear_sessions(&state, force, cli.json).await?
            }
        },

        Commands::Models => cli::models::list_models(&state, cli.json).await?,

        Commands::Doctor => cli::doctor::doctor(&state, cli.json).await?,

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_directive() {
        assert_eq!(log_directive(0, true), "error");
        assert_eq!(log_directive(0, false), "warn");
        assert_eq!(log_directive(1, true), "info,crosscheck=debug");
        assert_eq!(log_directive(3, false), "trace");
    }
}
