//! One-shot `xcheck ask` command.

use std::path::Path;

use anyhow::Result;
use console::style;

use crosscheck_core::event::EventBus;
use crosscheck_core::pipeline::TurnInput;
use crosscheck_infra::document::load_reference_document;
use crosscheck_types::document::ReferenceDocument;

use crate::state::AppState;

use super::access::require_access;
use super::chat::renderer::ChatRenderer;
use super::progress::TurnProgress;
use super::turn_view::{print_turn, turn_json};

/// Load an optional reference document with the configured size limit.
pub async fn load_document(
    state: &AppState,
    path: Option<&Path>,
) -> Result<Option<ReferenceDocument>> {
    match path {
        Some(path) => {
            let document =
                load_reference_document(path, state.config.pipeline.document_char_limit).await?;
            Ok(Some(document))
        }
        None => Ok(None),
    }
}

/// Run one turn and print the five sections.
///
/// # Examples
///
/// ```bash
/// xcheck ask "Should I refinance at 6%?"
/// xcheck ask "Summarize the risks" --doc contract.txt --role "You are a lawyer"
/// xcheck ask "Follow-up question" --session 2 --json
/// ```
pub async fn ask(
    state: &AppState,
    question: String,
    role: Option<String>,
    doc: Option<&Path>,
    session: Option<usize>,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let credentials = state.credentials()?;
    require_access(&credentials)?;

    let events = EventBus::default();
    let mut chat = state.chat_service(&credentials, events.clone()).await?;
    if let Some(number) = session {
        chat.book_mut().select(super::session_index(number)?)?;
    }

    let reference = load_document(state, doc).await?;
    if let Some(document) = reference.as_ref().filter(|d| d.truncated) {
        if !json && !quiet {
            eprintln!(
                "  {} {} was truncated to {} characters",
                style("!").yellow().bold(),
                document.name,
                state.config.pipeline.document_char_limit
            );
        }
    }

    let input = TurnInput::new(question)
        .with_role(role)
        .with_reference(reference);

    let progress = TurnProgress::start(&events, json || quiet);
    let result = chat.ask(&input).await;
    progress.finish();
    let turn = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&turn_json(&turn))?);
        return Ok(());
    }
    if quiet {
        println!("{}", turn.synthesis);
        return Ok(());
    }

    let renderer = ChatRenderer::new(None);
    print_turn(&renderer, &turn);
    println!(
        "  {}",
        style(format!(
            "Saved to session {} \"{}\"",
            chat.book().active_index() + 1,
            chat.book().active().title()
        ))
        .dim()
    );
    println!();
    Ok(())
}
