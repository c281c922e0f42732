//! Session management CLI commands: list, show, new, rename, delete, clear.
//!
//! Provides session browsing with rich tables and deletion with a
//! confirmation prompt.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;

use crosscheck_types::session::Session;

use crate::state::AppState;

use super::chat::renderer::ChatRenderer;
use super::session_index;
use super::turn_view::{preview, print_turn};

/// List every session with its turn count and last activity.
///
/// # Examples
///
/// ```bash
/// xcheck sessions list
/// xcheck sessions list --json
/// ```
pub async fn list_sessions(state: &AppState, json: bool) -> Result<()> {
    let book = state.open_book().await?;

    if json {
        let sessions: Vec<_> = book
            .sessions()
            .iter()
            .enumerate()
            .map(|(i, s)| {
                serde_json::json!({
                    "number": i + 1,
                    "title": s.title(),
                    "turns": s.len(),
                    "last_activity": s.turns().last().map(|t| t.created_at),
                    "active": i == book.active_index(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("#").fg(Color::White),
        Cell::new("Title").fg(Color::White),
        Cell::new("Turns").fg(Color::White),
        Cell::new("Last activity").fg(Color::White),
        Cell::new("Last question").fg(Color::White),
    ]);

    for (i, session) in book.sessions().iter().enumerate() {
        let marker = if i == book.active_index() { "*" } else { "" };
        let last = session.turns().last();
        let last_activity = last
            .map(|t| t.created_at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let last_question = last
            .map(|t| preview(&t.question, 40))
            .unwrap_or_default();

        table.add_row(vec![
            Cell::new(format!("{}{marker}", i + 1)).fg(Color::White),
            Cell::new(preview(session.title(), 40)).fg(Color::Cyan),
            Cell::new(session.len().to_string()).fg(Color::White),
            Cell::new(last_activity).fg(Color::DarkGrey),
            Cell::new(last_question).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} session{}  {}",
        style(book.len()).bold(),
        if book.len() == 1 { "" } else { "s" },
        style("(* = most recent)").dim()
    );
    println!();

    Ok(())
}

/// Print every turn of a session.
///
/// # Examples
///
/// ```bash
/// xcheck sessions show 1
/// xcheck sessions show 1 --json
/// ```
pub async fn show_session(state: &AppState, number: usize, json: bool) -> Result<()> {
    let book = state.open_book().await?;
    let session = book.get(session_index(number)?)?;

    if json {
        println!("{}", serde_json::to_string_pretty(session)?);
        return Ok(());
    }

    print_session(session);
    Ok(())
}

pub fn print_session(session: &Session) {
    println!();
    println!("  {}", style(session.title()).cyan().bold());
    if session.is_empty() {
        println!();
        println!(
            "  {} No turns yet. Ask something with: {}",
            style("i").blue().bold(),
            style("xcheck ask \"...\"").yellow()
        );
        println!();
        return;
    }

    let renderer = ChatRenderer::new(None);
    for (i, turn) in session.turns().iter().enumerate() {
        println!();
        println!(
            "  {} {} {}",
            style(format!("Q{}", i + 1)).green().bold(),
            style(turn.created_at.format("%Y-%m-%d %H:%M UTC")).dim(),
            turn.question
        );
        if let Some(role) = &turn.role_instruction {
            println!("  {} {}", style("Role:").dim(), style(role).dim());
        }
        if let Some(reference) = &turn.reference_name {
            println!("  {} {}", style("Document:").dim(), style(reference).dim());
        }
        print_turn(&renderer, turn);
    }
}

/// Start a new session (or reuse the latest one if it is still empty).
pub async fn new_session(state: &AppState, json: bool) -> Result<()> {
    let mut book = state.open_book().await?;
    let index = book.new_session().await?;

    if json {
        println!("{}", serde_json::json!({"number": index + 1}));
    } else {
        println!(
            "  {} Session {} ready.",
            style("+").green().bold(),
            index + 1
        );
    }
    Ok(())
}

/// Rename a session.
///
/// # Examples
///
/// ```bash
/// xcheck sessions rename 2 "Mortgage questions"
/// ```
pub async fn rename_session(state: &AppState, number: usize, title: &str, json: bool) -> Result<()> {
    let mut book = state.open_book().await?;
    let index = session_index(number)?;
    book.rename(index, title).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"number": number, "title": book.get(index)?.title()})
        );
    } else {
        println!(
            "  {} Session {} renamed to '{}'.",
            style("~").cyan().bold(),
            number,
            book.get(index)?.title()
        );
    }
    Ok(())
}

/// Delete a session with confirmation.
///
/// # Examples
///
/// ```bash
/// xcheck sessions delete 2
/// xcheck sessions delete 2 --force
/// ```
pub async fn delete_session(state: &AppState, number: usize, force: bool, json: bool) -> Result<()> {
    let mut book = state.open_book().await?;
    let index = session_index(number)?;
    let session = book.get(index)?;
    let title = session.title().to_string();

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete session '{}' ({} turns)?",
                style(&title).red().bold(),
                session.len()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    book.delete(index).await?;

    if json {
        println!("{}", serde_json::json!({"deleted": true, "number": number}));
    } else {
        println!(
            "  {} Session '{}' deleted.",
            style("x").red().bold(),
            title
        );
    }
    Ok(())
}

/// Delete every session, leaving one empty session behind.
pub async fn clear_sessions(state: &AppState, force: bool, json: bool) -> Result<()> {
    let mut book = state.open_book().await?;
    let total_turns: usize = book.sessions().iter().map(Session::len).sum();

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete all {} sessions ({} turns)?",
                style(book.len()).red().bold(),
                total_turns
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    book.clear().await?;

    if json {
        println!("{}", serde_json::json!({"cleared": true}));
    } else {
        println!("  {} All sessions cleared.", style("x").red().bold());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosscheck_core::session::SessionStore;
    use crosscheck_types::config::GlobalConfig;
    use tempfile::TempDir;

    fn state(tmp: &TempDir) -> AppState {
        AppState::with_parts(tmp.path().to_path_buf(), GlobalConfig::default())
    }

    #[tokio::test]
    async fn test_rename_and_delete_persist() {
        let tmp = TempDir::new().unwrap();
        let state = state(&tmp);

        rename_session(&state, 1, "Budget", true).await.unwrap();
        let sessions = state.session_store().load().await.unwrap();
        assert_eq!(sessions[0].title(), "Budget");

        // Still empty, so no second session is created.
        new_session(&state, true).await.unwrap();
        assert_eq!(state.session_store().load().await.unwrap().len(), 1);

        delete_session(&state, 1, true, true).await.unwrap();
        let sessions = state.session_store().load().await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_ne!(sessions[0].title(), "Budget");
    }

    #[tokio::test]
    async fn test_out_of_range_numbers_fail() {
        let tmp = TempDir::new().unwrap();
        let state = state(&tmp);
        assert!(show_session(&state, 5, true).await.is_err());
        assert!(rename_session(&state, 0, "x", true).await.is_err());
        assert!(delete_session(&state, 2, true, true).await.is_err());
    }

    #[tokio::test]
    async fn test_clear_leaves_one_session() {
        let tmp = TempDir::new().unwrap();
        let state = state(&tmp);
        rename_session(&state, 1, "Old", true).await.unwrap();
        clear_sessions(&state, true, true).await.unwrap();

        let sessions = state.session_store().load().await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].title(), crosscheck_types::session::DEFAULT_SESSION_TITLE);
    }
}
