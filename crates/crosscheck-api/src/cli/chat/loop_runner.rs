//! Main chat loop.
//!
//! Resolves credentials, wires the chat service, prints the banner, then
//! runs each submitted line through the pipeline until the user exits.

use std::path::Path;

use console::style;
use tracing::info;

use crosscheck_core::event::EventBus;
use crosscheck_core::pipeline::TurnInput;
use crosscheck_infra::document::load_reference_document;
use crosscheck_types::document::ReferenceDocument;
use crosscheck_types::llm::Backend;

use crate::cli::access::require_access;
use crate::cli::ask::load_document;
use crate::cli::progress::TurnProgress;
use crate::cli::session::print_session;
use crate::cli::turn_view::{preview, print_turn};
use crate::state::{AppState, ConcreteChatService};

use super::banner::print_welcome_banner;
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use super::renderer::ChatRenderer;

/// Settings that apply to every turn of this chat until changed.
struct ChatSettings {
    role: Option<String>,
    reference: Option<ReferenceDocument>,
}

/// Run the interactive chat loop on the most recent session.
pub async fn run_chat_loop(
    state: &AppState,
    role: Option<String>,
    doc: Option<&Path>,
) -> anyhow::Result<()> {
    let credentials = state.credentials()?;
    require_access(&credentials)?;

    let events = EventBus::default();
    let mut chat = state.chat_service(&credentials, events.clone()).await?;
    let mut settings = ChatSettings {
        role,
        reference: load_document(state, doc).await?,
    };

    let model_a = chat.orchestrator().gateway(Backend::A).active_model().await;
    let model_b = chat.orchestrator().gateway(Backend::B).active_model().await;
    {
        let book = chat.book();
        print_welcome_banner(
            &model_a,
            &model_b,
            book.active_index() + 1,
            book.active().title(),
            book.active().len(),
        );
    }
    print_settings(&settings);

    let renderer = ChatRenderer::new(None);
    let (mut chat_input, _writer) = ChatInput::new(prompt_for(&chat))
        .map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    loop {
        match chat_input.read_line().await {
            InputEvent::Eof => {
                println!("\n  {}", style("Chat ended.").dim());
                break;
            }
            InputEvent::Interrupted => {
                println!("\n  {}", style("Press Ctrl+D to exit, or keep asking.").dim());
                continue;
            }
            InputEvent::Message(text) => {
                if text.is_empty() {
                    continue;
                }

                if let Some(cmd) = commands::parse(&text) {
                    if matches!(cmd, ChatCommand::Exit) {
                        println!("\n  {}", style("Chat ended.").dim());
                        break;
                    }
                    if matches!(cmd, ChatCommand::Clear) {
                        chat_input.clear();
                        continue;
                    }
                    handle_command(state, &mut chat, &mut settings, cmd).await;
                    chat_input.update_prompt(&prompt_for(&chat));
                    continue;
                }

                let input = TurnInput::new(text)
                    .with_role(settings.role.clone())
                    .with_reference(settings.reference.clone());

                let progress = TurnProgress::start(&events, false);
                let result = chat.ask(&input).await;
                progress.finish();

                match result {
                    Ok(turn) => print_turn(&renderer, &turn),
                    Err(e) => {
                        eprintln!("\n  {} Turn not saved: {e}", style("!").red().bold());
                        eprintln!("  {}", style("Type the question again to retry, /exit to quit.").dim());
                    }
                }
                chat_input.update_prompt(&prompt_for(&chat));
            }
        }
    }

    chat_input.flush();
    info!(turns = chat.book().active().len(), "chat finished");
    Ok(())
}

fn prompt_for(chat: &ConcreteChatService) -> String {
    format!(
        "  {} ",
        style(format!("[{}] You >", chat.book().active_index() + 1))
            .green()
            .bold()
    )
}

fn print_settings(settings: &ChatSettings) {
    if let Some(role) = &settings.role {
        println!("  {} {}", style("Role:").bold(), style(role).dim());
    }
    if let Some(doc) = &settings.reference {
        println!(
            "  {} {}{}",
            style("Document:").bold(),
            style(&doc.name).dim(),
            if doc.truncated {
                style(" (truncated)").yellow().to_string()
            } else {
                String::new()
            }
        );
    }
    if settings.role.is_some() || settings.reference.is_some() {
        println!();
    }
}

/// Execute a slash command. Errors are printed, never propagated, so a bad
/// command does not end the chat.
async fn handle_command(
    state: &AppState,
    chat: &mut ConcreteChatService,
    settings: &mut ChatSettings,
    cmd: ChatCommand,
) {
    if let Err(e) = run_command(state, chat, settings, cmd).await {
        println!("\n  {} {e:#}\n", style("!").red().bold());
    }
}

async fn run_command(
    state: &AppState,
    chat: &mut ConcreteChatService,
    settings: &mut ChatSettings,
    cmd: ChatCommand,
) -> anyhow::Result<()> {
    match cmd {
        ChatCommand::Help => commands::print_help(),
        ChatCommand::New => {
            let index = chat.book_mut().new_session().await?;
            println!("\n  {} Session {} ready.\n", style("+").green().bold(), index + 1);
        }
        ChatCommand::Sessions => {
            let book = chat.book();
            println!();
            for (i, session) in book.sessions().iter().enumerate() {
                let marker = if i == book.active_index() { "*" } else { " " };
                println!(
                    "  {}{:>3}  {}  {}",
                    style(marker).green().bold(),
                    i + 1,
                    style(preview(session.title(), 40)).cyan(),
                    style(format!("{} turn(s)", session.len())).dim()
                );
            }
            println!();
        }
        ChatCommand::Switch(number) => {
            let session = chat.book_mut().select(number - 1)?;
            println!(
                "\n  {} Now in session {} \"{}\".\n",
                style(">").green().bold(),
                number,
                session.title()
            );
        }
        ChatCommand::Rename(title) => {
            let index = chat.book().active_index();
            chat.book_mut().rename(index, &title).await?;
            println!("\n  {} Renamed to '{}'.\n", style("~").cyan().bold(), chat.book().active().title());
        }
        ChatCommand::Role(role) => {
            settings.role = role;
            match &settings.role {
                Some(role) => println!("\n  {} Role set: {}\n", style("*").cyan().bold(), style(role).dim()),
                None => println!("\n  {} Role cleared.\n", style("*").cyan().bold()),
            }
        }
        ChatCommand::Doc(path) => {
            settings.reference = match path {
                Some(path) => Some(
                    load_reference_document(
                        Path::new(&path),
                        state.config.pipeline.document_char_limit,
                    )
                    .await?,
                ),
                None => None,
            };
            match &settings.reference {
                Some(doc) => println!(
                    "\n  {} Attached {} ({} chars{}).\n",
                    style("*").cyan().bold(),
                    doc.name,
                    doc.text.chars().count(),
                    if doc.truncated { ", truncated" } else { "" }
                ),
                None => println!("\n  {} Document detached.\n", style("*").cyan().bold()),
            }
        }
        ChatCommand::History => print_session(chat.book().active()),
        ChatCommand::Unknown(msg) => {
            println!(
                "\n  {} Unknown command: {}. Type /help for available commands.\n",
                style("?").yellow().bold(),
                style(msg).dim()
            );
        }
        ChatCommand::Clear | ChatCommand::Exit => {}
    }
    Ok(())
}
